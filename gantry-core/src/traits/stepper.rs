//! Step actuator trait
//!
//! A position-tracking stepper with a trapezoidal speed profile, polled
//! from the control loop. Implementations own the per-axis state (current
//! position, target, speed); the core only issues requests and polls.

/// Trait for a polled, position-tracking stepper motor
///
/// Positions and speeds are in steps and steps/s. Nothing here blocks:
/// [`run`](Self::run) and [`run_speed`](Self::run_speed) emit at most the
/// step that is due at the time of the call and return immediately.
pub trait StepActuator {
    /// Set the speed ceiling used by [`run`](Self::run)
    fn set_max_speed(&mut self, steps_per_sec: f32);

    /// Set the acceleration and deceleration rate used by [`run`](Self::run)
    fn set_acceleration(&mut self, steps_per_sec2: f32);

    /// Set a new absolute target position
    ///
    /// Motion toward it happens in subsequent [`run`](Self::run) calls.
    fn move_to(&mut self, position: i32);

    /// Set the constant speed used by [`run_speed`](Self::run_speed)
    ///
    /// The sign selects the direction.
    fn set_speed(&mut self, steps_per_sec: f32);

    /// Advance toward the target with acceleration, at most one step
    ///
    /// Returns `true` while the motor is still moving toward its target.
    fn run(&mut self) -> bool;

    /// Advance at the constant speed, ignoring the target, at most one step
    ///
    /// Returns `true` if a step was taken.
    fn run_speed(&mut self) -> bool;

    /// Halt immediately
    ///
    /// The target becomes the current position and the speed drops to zero,
    /// so [`distance_to_go`](Self::distance_to_go) is zero afterwards.
    fn stop(&mut self);

    /// Steps remaining to the target (signed)
    fn distance_to_go(&self) -> i32;

    /// Current absolute position in steps
    fn current_position(&self) -> i32;

    /// Redefine the current position without moving
    ///
    /// Also clears the target and the speed.
    fn set_current_position(&mut self, position: i32);

    /// Check if there is no remaining distance
    fn is_idle(&self) -> bool {
        self.distance_to_go() == 0
    }
}
