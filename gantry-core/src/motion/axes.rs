//! Motor pair
//!
//! Motors A and B are always commanded together. A synchronized move scales
//! each motor's speed and acceleration by its share of the longer travel,
//! so both trapezoidal profiles have the same duration and the carriage
//! follows a straight line.

use crate::traits::StepActuator;

use super::position::{StepDelta, StepTarget};

/// The two CoreXY motors
#[derive(Debug)]
pub struct Axes<M> {
    /// Motor A
    pub a: M,
    /// Motor B
    pub b: M,
}

impl<M: StepActuator> Axes<M> {
    /// Pair two motors
    pub fn new(a: M, b: M) -> Self {
        Self { a, b }
    }

    /// Current absolute step counts
    pub fn current(&self) -> StepTarget {
        StepTarget {
            a: self.a.current_position(),
            b: self.b.current_position(),
        }
    }

    /// Redefine both step counts without moving
    pub fn set_current(&mut self, position: StepTarget) {
        self.a.set_current_position(position.a);
        self.b.set_current_position(position.b);
    }

    /// Start a synchronized move to an absolute target
    ///
    /// Returns the step displacement of each motor.
    pub fn move_synchronized(
        &mut self,
        target: StepTarget,
        max_speed: f32,
        acceleration: f32,
    ) -> StepDelta {
        let delta = StepDelta::between(self.current(), target);
        let (share_a, share_b) = travel_shares(delta);

        self.a.set_max_speed(max_speed * share_a);
        self.a.set_acceleration(acceleration * share_a);
        self.b.set_max_speed(max_speed * share_b);
        self.b.set_acceleration(acceleration * share_b);

        self.a.move_to(target.a);
        self.b.move_to(target.b);
        delta
    }

    /// Advance both motors toward their targets
    ///
    /// Returns `true` while either is still moving.
    pub fn run(&mut self) -> bool {
        // Both must be run every pass, no short-circuit
        let a = self.a.run();
        let b = self.b.run();
        a | b
    }

    /// Set the constant speeds used by [`run_speed`](Self::run_speed)
    pub fn set_speeds(&mut self, speed_a: f32, speed_b: f32) {
        self.a.set_speed(speed_a);
        self.b.set_speed(speed_b);
    }

    /// Advance both motors at their constant speeds
    pub fn run_speed(&mut self) {
        self.a.run_speed();
        self.b.run_speed();
    }

    /// Halt both motors immediately
    pub fn stop(&mut self) {
        self.a.stop();
        self.b.stop();
    }

    /// Check both motors have reached their targets
    pub fn is_idle(&self) -> bool {
        self.a.is_idle() && self.b.is_idle()
    }
}

/// Fraction of the longer travel covered by each motor
///
/// A motor that does not move keeps the full rate so its profile stays
/// well-defined.
fn travel_shares(delta: StepDelta) -> (f32, f32) {
    let a = delta.a.unsigned_abs();
    let b = delta.b.unsigned_abs();
    let longer = a.max(b);

    let share = |d: u32| {
        if d == 0 {
            1.0
        } else {
            d as f32 / longer as f32
        }
    };
    (share(a), share(b))
}
