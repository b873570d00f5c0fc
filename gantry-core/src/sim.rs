//! Simulated hardware
//!
//! Deterministic stand-ins for the motor and switch traits: every `run` or
//! `run_speed` call takes exactly one step, and a switch triggers after a
//! fixed number of reads.

use crate::traits::{LimitSwitch, StepActuator};

/// A stepper that takes one step per poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimActuator {
    position: i32,
    target: i32,
    speed: f32,
    max_speed: f32,
    acceleration: f32,
    steps_taken: u32,
}

impl SimActuator {
    /// Create an actuator at position zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Last speed set for constant-speed running
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Last speed ceiling set
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Last acceleration set
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Total steps taken in either direction
    pub fn steps_taken(&self) -> u32 {
        self.steps_taken
    }

    fn step(&mut self, direction: i32) {
        self.position = self.position.saturating_add(direction);
        self.steps_taken = self.steps_taken.saturating_add(1);
    }
}

impl StepActuator for SimActuator {
    fn set_max_speed(&mut self, steps_per_sec: f32) {
        self.max_speed = steps_per_sec;
    }

    fn set_acceleration(&mut self, steps_per_sec2: f32) {
        self.acceleration = steps_per_sec2;
    }

    fn move_to(&mut self, position: i32) {
        self.target = position;
    }

    fn set_speed(&mut self, steps_per_sec: f32) {
        self.speed = steps_per_sec;
    }

    fn run(&mut self) -> bool {
        let remaining = self.distance_to_go();
        if remaining != 0 {
            self.step(remaining.signum());
        }
        self.distance_to_go() != 0
    }

    fn run_speed(&mut self) -> bool {
        if self.speed > 0.0 {
            self.step(1);
            true
        } else if self.speed < 0.0 {
            self.step(-1);
            true
        } else {
            false
        }
    }

    fn stop(&mut self) {
        self.target = self.position;
        self.speed = 0.0;
    }

    fn distance_to_go(&self) -> i32 {
        self.target.saturating_sub(self.position)
    }

    fn current_position(&self) -> i32 {
        self.position
    }

    fn set_current_position(&mut self, position: i32) {
        self.position = position;
        self.target = position;
        self.speed = 0.0;
    }
}

/// A switch that triggers after a fixed number of reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimSwitch {
    untriggered_reads: Option<u32>,
    reads: u32,
}

impl SimSwitch {
    /// Report not triggered for the first `reads` reads, then triggered
    pub fn after(reads: u32) -> Self {
        Self {
            untriggered_reads: Some(reads),
            reads: 0,
        }
    }

    /// Triggered from the first read
    pub fn triggered() -> Self {
        Self::after(0)
    }

    /// Never triggers
    pub fn never() -> Self {
        Self {
            untriggered_reads: None,
            reads: 0,
        }
    }

    /// Number of reads so far
    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl LimitSwitch for SimSwitch {
    fn is_triggered(&mut self) -> bool {
        let triggered = self
            .untriggered_reads
            .is_some_and(|limit| self.reads >= limit);
        self.reads = self.reads.saturating_add(1);
        triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actuator_runs_to_target() {
        let mut motor = SimActuator::new();
        motor.move_to(-2);
        assert!(motor.run());
        assert!(!motor.run());
        assert!(!motor.run());
        assert_eq!(motor.current_position(), -2);
        assert_eq!(motor.steps_taken(), 2);
    }

    #[test]
    fn test_run_speed_ignores_target() {
        let mut motor = SimActuator::new();
        motor.set_speed(-200.0);
        assert!(motor.run_speed());
        assert!(motor.run_speed());
        assert_eq!(motor.current_position(), -2);
        assert_eq!(motor.distance_to_go(), 2);

        motor.stop();
        assert!(!motor.run_speed());
        assert_eq!(motor.distance_to_go(), 0);
    }

    #[test]
    fn test_switch_counts_reads() {
        let mut switch = SimSwitch::after(2);
        assert!(!switch.is_triggered());
        assert!(!switch.is_triggered());
        assert!(switch.is_triggered());
        assert!(switch.is_triggered());
        assert_eq!(switch.reads(), 4);

        assert!(SimSwitch::triggered().is_triggered());

        let mut never = SimSwitch::never();
        for _ in 0..100 {
            assert!(!never.is_triggered());
        }
    }
}
