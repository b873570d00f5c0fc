//! Motion coordinator
//!
//! Owns the Cartesian carriage position and turns move requests into a
//! synchronized pair of absolute step targets. The position is committed
//! only once both motors have arrived; an interrupted move leaves it as it
//! was and marks it stale.

use crate::config::MotionConfig;
use crate::kinematics::CoreXy;
use crate::traits::StepActuator;

use super::axes::Axes;
use super::position::{Position, PositionTrust, StepDelta, StepTarget};

/// A move request
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveRequest {
    /// Cartesian target in mm, converted through the kinematic transform
    Position(Position),
    /// Raw absolute step targets, bypassing the transform
    Steps(StepTarget),
}

/// Result of one coordinator poll
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionStatus {
    /// No move in progress
    Idle,
    /// Motors still running
    Moving,
    /// Both motors arrived; position committed
    Complete(Position),
}

/// A move that has been issued but not yet completed
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActiveMove {
    /// Absolute step target issued to the motors
    pub target: StepTarget,
    /// Step displacement from where the motors were
    pub delta: StepDelta,
    /// Position committed on arrival
    pub position: Position,
}

/// Synchronized dual-motor move coordination
#[derive(Debug, Clone)]
pub struct MotionCoordinator {
    kinematics: CoreXy,
    max_speed: f32,
    acceleration: f32,
    position: Position,
    trust: PositionTrust,
    active: Option<ActiveMove>,
}

impl MotionCoordinator {
    /// Create a coordinator at the power-on origin
    pub fn new(kinematics: CoreXy, motion: &MotionConfig) -> Self {
        Self {
            kinematics,
            max_speed: motion.max_speed,
            acceleration: motion.acceleration,
            position: Position::ORIGIN,
            trust: PositionTrust::Assumed,
            active: None,
        }
    }

    /// Last committed position
    pub fn position(&self) -> Position {
        self.position
    }

    /// Confidence in the committed position
    pub fn trust(&self) -> PositionTrust {
        self.trust
    }

    /// Move in progress, if any
    pub fn active(&self) -> Option<&ActiveMove> {
        self.active.as_ref()
    }

    /// Check if a move is in progress
    pub fn is_moving(&self) -> bool {
        self.active.is_some()
    }

    /// Kinematic transform used for Cartesian requests
    pub fn kinematics(&self) -> &CoreXy {
        &self.kinematics
    }

    /// Issue a move to both motors
    ///
    /// Replaces any move still in progress.
    pub fn begin<M: StepActuator>(
        &mut self,
        request: MoveRequest,
        axes: &mut Axes<M>,
    ) -> ActiveMove {
        let (target, position) = match request {
            MoveRequest::Position(position) => (self.kinematics.step_target(position), position),
            MoveRequest::Steps(target) => (target, self.kinematics.position_for(target)),
        };

        let delta = axes.move_synchronized(target, self.max_speed, self.acceleration);
        let active = ActiveMove {
            target,
            delta,
            position,
        };
        self.active = Some(active);
        active
    }

    /// Advance both motors by one tick
    pub fn poll<M: StepActuator>(&mut self, axes: &mut Axes<M>) -> MotionStatus {
        let Some(active) = self.active else {
            return MotionStatus::Idle;
        };

        axes.run();
        if !axes.is_idle() {
            return MotionStatus::Moving;
        }

        self.active = None;
        self.position = active.position;
        MotionStatus::Complete(self.position)
    }

    /// Poll until the current move has finished
    ///
    /// Returns the committed position.
    pub fn run_to_completion<M: StepActuator>(&mut self, axes: &mut Axes<M>) -> Position {
        loop {
            match self.poll(axes) {
                MotionStatus::Moving => continue,
                MotionStatus::Idle | MotionStatus::Complete(_) => return self.position,
            }
        }
    }

    /// Stop both motors immediately
    ///
    /// An interrupted move leaves the position uncommitted and stale.
    /// Returns `true` if a move was interrupted.
    pub fn halt<M: StepActuator>(&mut self, axes: &mut Axes<M>) -> bool {
        axes.stop();
        let interrupted = self.active.take().is_some();
        if interrupted {
            self.trust = PositionTrust::Stale;
        }
        interrupted
    }

    /// Mark the position untrustworthy without moving
    pub fn invalidate(&mut self) {
        self.trust = PositionTrust::Stale;
    }

    /// Set the position to the home origin and trust it
    pub fn reset_origin(&mut self) {
        self.active = None;
        self.position = Position::ORIGIN;
        self.trust = PositionTrust::Homed;
    }
}
