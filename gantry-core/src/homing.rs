//! Limit-switch homing sequence
//!
//! Homing runs in two phases, each polled from the control loop:
//!
//! 1. **SeekX**: both motors turn the same way (`-speed, -speed`), moving the
//!    carriage along X until the X switch triggers.
//! 2. **SeekY**: the motors turn opposite ways (`-speed, +speed`), moving the
//!    carriage along Y until the Y switch triggers.
//!
//! On completion both motors stop and both step counters are zeroed. Each
//! phase has its own timeout so a dead switch cannot run the motors forever.

use crate::config::HomingConfig;
use crate::motion::{Axes, StepTarget};
use crate::traits::{LimitSwitch, StepActuator};

/// Homing phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingPhase {
    /// Driving toward the X switch
    SeekX,
    /// Driving toward the Y switch
    SeekY,
}

/// Homing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingState {
    /// Not started, or aborted
    #[default]
    Idle,
    /// Seeking a switch
    Seeking(HomingPhase),
    /// Both switches found, counters zeroed
    Homed,
    /// Homing gave up
    Failed(HomingError),
}

/// Homing failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingError {
    /// Switch did not trigger within the phase timeout
    Timeout { phase: HomingPhase },
}

/// Result of one homing poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingStatus {
    /// Homing is not running
    Idle,
    /// Still seeking
    Running(HomingPhase),
    /// X switch found, now seeking Y
    PhaseChanged(HomingPhase),
    /// Homing finished this poll
    Complete,
    /// Homing failed this poll
    Failed(HomingError),
}

/// Two-phase homing state machine
#[derive(Debug, Clone)]
pub struct HomingSequencer {
    speed: f32,
    timeout_ms: u64,
    state: HomingState,
    phase_started_ms: u64,
}

impl HomingSequencer {
    /// Create an idle sequencer
    pub fn new(config: &HomingConfig) -> Self {
        Self {
            speed: config.speed,
            timeout_ms: u64::from(config.timeout_ms),
            state: HomingState::Idle,
            phase_started_ms: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> HomingState {
        self.state
    }

    /// Check if a phase is in progress
    pub fn is_running(&self) -> bool {
        matches!(self.state, HomingState::Seeking(_))
    }

    /// Start seeking the X switch
    ///
    /// Restarts from the first phase if homing was already running.
    pub fn start<M: StepActuator>(&mut self, now_ms: u64, axes: &mut Axes<M>) {
        self.enter(HomingPhase::SeekX, now_ms, axes);
    }

    /// Advance the sequence by one tick
    ///
    /// Each tick reads the active phase's switch once, then either moves on
    /// or steps both motors at the homing speed.
    pub fn poll<M, S>(
        &mut self,
        now_ms: u64,
        axes: &mut Axes<M>,
        limit_x: &mut S,
        limit_y: &mut S,
    ) -> HomingStatus
    where
        M: StepActuator,
        S: LimitSwitch,
    {
        let HomingState::Seeking(phase) = self.state else {
            return HomingStatus::Idle;
        };

        let switch = match phase {
            HomingPhase::SeekX => limit_x,
            HomingPhase::SeekY => limit_y,
        };

        if switch.is_triggered() {
            return match phase {
                HomingPhase::SeekX => {
                    axes.stop();
                    self.enter(HomingPhase::SeekY, now_ms, axes);
                    HomingStatus::PhaseChanged(HomingPhase::SeekY)
                }
                HomingPhase::SeekY => {
                    axes.stop();
                    axes.set_current(StepTarget::default());
                    self.state = HomingState::Homed;
                    HomingStatus::Complete
                }
            };
        }

        if now_ms.saturating_sub(self.phase_started_ms) >= self.timeout_ms {
            axes.stop();
            let error = HomingError::Timeout { phase };
            self.state = HomingState::Failed(error);
            return HomingStatus::Failed(error);
        }

        axes.run_speed();
        HomingStatus::Running(phase)
    }

    /// Stop both motors and abandon homing
    ///
    /// Returns `true` if homing was running.
    pub fn abort<M: StepActuator>(&mut self, axes: &mut Axes<M>) -> bool {
        if !self.is_running() {
            return false;
        }
        axes.stop();
        self.state = HomingState::Idle;
        true
    }

    fn enter<M: StepActuator>(&mut self, phase: HomingPhase, now_ms: u64, axes: &mut Axes<M>) {
        match phase {
            HomingPhase::SeekX => axes.set_speeds(-self.speed, -self.speed),
            HomingPhase::SeekY => axes.set_speeds(-self.speed, self.speed),
        }
        self.state = HomingState::Seeking(phase);
        self.phase_started_ms = now_ms;
    }
}
