//! Gantry controller
//!
//! A single owned context holding the configuration, both motors, both
//! limit switches, the motion coordinator and the homing sequencer. The
//! control loop feeds it commands with [`Controller::dispatch`] and advances
//! it with [`Controller::tick`]; nothing else touches the hardware.

use gantry_protocol::{Command, ErrorCode, Response};

use crate::config::{ConfigError, DoneReport, ExecutionMode, MachineConfig};
use crate::dispatch::{Action, Dispatcher};
use crate::homing::{HomingError, HomingSequencer, HomingState, HomingStatus};
use crate::kinematics::CoreXy;
use crate::motion::{ActiveMove, Axes, MotionCoordinator, MotionStatus, Position, PositionTrust};
use crate::traits::{LimitSwitch, StepActuator};

/// What the controller is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Activity {
    /// Waiting for a command
    #[default]
    Idle,
    /// Synchronized move in progress
    Moving,
    /// Homing sequence in progress
    Homing,
}

/// Something the controller did in response to a command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerEvent {
    /// Move issued to both motors
    MoveStarted(ActiveMove),
    /// Homing sequence started
    HomingStarted,
    /// Both motors halted
    Stopped {
        /// A move or homing was cut short
        interrupted: bool,
    },
    /// Command accepted without effect on motion
    Ignored,
}

/// Commands refused by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    /// Motion in progress
    Busy,
    /// Move refused until the machine has been homed
    NotHomed,
    /// Verb not recognised (already stopped or ignored per policy)
    UnknownCommand,
}

impl From<DispatchError> for ErrorCode {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Busy => ErrorCode::Busy,
            DispatchError::NotHomed => ErrorCode::NotHomed,
            DispatchError::UnknownCommand => ErrorCode::UnknownCommand,
        }
    }
}

impl From<HomingError> for ErrorCode {
    fn from(e: HomingError) -> Self {
        match e {
            HomingError::Timeout { .. } => ErrorCode::HomingTimeout,
        }
    }
}

/// CoreXY gantry controller
pub struct Controller<M, S> {
    config: MachineConfig,
    dispatcher: Dispatcher,
    coordinator: MotionCoordinator,
    homing: HomingSequencer,
    axes: Axes<M>,
    limit_x: S,
    limit_y: S,
    activity: Activity,
    done_pending: bool,
}

impl<M, S> Controller<M, S>
where
    M: StepActuator,
    S: LimitSwitch,
{
    /// Validate the configuration and take ownership of the hardware
    pub fn new(
        config: MachineConfig,
        axes: Axes<M>,
        limit_x: S,
        limit_y: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let kinematics = CoreXy::new(&config.geometry)?;

        Ok(Self {
            dispatcher: Dispatcher::new(&config),
            coordinator: MotionCoordinator::new(kinematics, &config.motion),
            homing: HomingSequencer::new(&config.homing),
            config,
            axes,
            limit_x,
            limit_y,
            activity: Activity::Idle,
            done_pending: false,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Dispatcher matching this controller's configuration
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Current activity
    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Check if a move or homing is in progress
    pub fn is_busy(&self) -> bool {
        self.activity != Activity::Idle
    }

    /// Check if the next command should be read now
    ///
    /// In run-to-completion mode input waits until motion has finished.
    pub fn accepts_input(&self) -> bool {
        match self.config.protocol.mode {
            ExecutionMode::RunToCompletion => !self.is_busy(),
            ExecutionMode::Preemptible => true,
        }
    }

    /// Last committed carriage position
    pub fn position(&self) -> Position {
        self.coordinator.position()
    }

    /// Confidence in [`position`](Self::position)
    pub fn trust(&self) -> PositionTrust {
        self.coordinator.trust()
    }

    /// Check if homing has completed and nothing has invalidated it since
    pub fn is_homed(&self) -> bool {
        self.coordinator.trust().is_trusted()
    }

    /// Current homing state
    pub fn homing_state(&self) -> HomingState {
        self.homing.state()
    }

    /// The motor pair
    pub fn axes(&self) -> &Axes<M> {
        &self.axes
    }

    /// The X and Y limit switches
    pub fn limits(&self) -> (&S, &S) {
        (&self.limit_x, &self.limit_y)
    }

    /// Act on a command
    ///
    /// While busy, run-to-completion mode refuses everything and preemptible
    /// mode accepts only halting commands.
    pub fn dispatch(
        &mut self,
        command: Command,
        now_ms: u64,
    ) -> Result<ControllerEvent, DispatchError> {
        let route = self.dispatcher.route(command);

        if self.is_busy() {
            let halting = matches!(route.action, Action::Stop | Action::Ignore);
            if self.config.protocol.mode == ExecutionMode::RunToCompletion || !halting {
                return Err(DispatchError::Busy);
            }
        }

        let event = match route.action {
            Action::Move(request) => {
                if self.config.motion.require_homing && !self.is_homed() {
                    return Err(DispatchError::NotHomed);
                }
                let active = self.coordinator.begin(request, &mut self.axes);
                self.activity = Activity::Moving;
                ControllerEvent::MoveStarted(active)
            }
            Action::Home => {
                self.homing.start(now_ms, &mut self.axes);
                self.activity = Activity::Homing;
                ControllerEvent::HomingStarted
            }
            Action::Stop => {
                let interrupted = self.halt();
                self.done_pending = true;
                ControllerEvent::Stopped { interrupted }
            }
            Action::Ignore => {
                self.done_pending = !self.is_busy();
                ControllerEvent::Ignored
            }
        };

        match route.report {
            Some(ErrorCode::UnknownCommand) => Err(DispatchError::UnknownCommand),
            _ => Ok(event),
        }
    }

    /// Advance motion or homing by one control-loop pass
    ///
    /// Returns the status line to send, if any.
    pub fn tick(&mut self, now_ms: u64) -> Option<Response> {
        match self.activity {
            Activity::Moving => match self.coordinator.poll(&mut self.axes) {
                MotionStatus::Moving => None,
                MotionStatus::Complete(_) | MotionStatus::Idle => {
                    self.activity = Activity::Idle;
                    self.done_pending = false;
                    Some(Response::Done)
                }
            },
            Activity::Homing => {
                let status = self.homing.poll(
                    now_ms,
                    &mut self.axes,
                    &mut self.limit_x,
                    &mut self.limit_y,
                );
                match status {
                    HomingStatus::Running(_) | HomingStatus::PhaseChanged(_) => None,
                    HomingStatus::Complete => {
                        self.coordinator.reset_origin();
                        self.activity = Activity::Idle;
                        Some(Response::Homed)
                    }
                    HomingStatus::Failed(error) => {
                        self.coordinator.invalidate();
                        self.activity = Activity::Idle;
                        Some(Response::Error(error.into()))
                    }
                    HomingStatus::Idle => {
                        self.activity = Activity::Idle;
                        None
                    }
                }
            }
            Activity::Idle => {
                let report = self.done_pending
                    || self.config.protocol.done == DoneReport::EveryIdleTick;
                self.done_pending = false;
                report.then_some(Response::Done)
            }
        }
    }

    /// Tick until no move or homing is in progress
    ///
    /// Returns the response of the final tick. `now_ms` is sampled once per
    /// tick.
    pub fn run_until_idle(&mut self, mut now_ms: impl FnMut() -> u64) -> Option<Response> {
        loop {
            let response = self.tick(now_ms());
            if !self.is_busy() {
                return response;
            }
        }
    }

    /// Halt whatever is running
    fn halt(&mut self) -> bool {
        match self.activity {
            Activity::Moving => {
                self.activity = Activity::Idle;
                self.coordinator.halt(&mut self.axes)
            }
            Activity::Homing => {
                self.activity = Activity::Idle;
                self.coordinator.invalidate();
                self.homing.abort(&mut self.axes)
            }
            Activity::Idle => {
                self.axes.stop();
                false
            }
        }
    }
}
