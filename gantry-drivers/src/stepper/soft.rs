//! Software step generator
//!
//! Drives a STEP/DIR stepper driver (A4988, DRV8825, TMC2209 in standalone
//! mode) from two GPIO outputs. Each call to [`StepActuator::run`] integrates
//! the speed from the time elapsed since the previous call and emits at most
//! one step, so the caller must poll faster than the highest step rate.
//!
//! # Profile
//!
//! - Accelerate at `acceleration` up to `max_speed`
//! - Brake once the stopping distance `v² / 2a` reaches the remaining distance
//! - Never drop below the crawl speed while a target is pending, so the last
//!   few steps always arrive
//!
//! [`StepActuator::run_speed`] ignores the profile and steps at a constant
//! speed, which is what homing uses.

use embedded_hal::digital::OutputPin;
use gantry_core::traits::StepActuator;

/// Microsecond time source
pub trait Clock {
    /// Monotonic time in microseconds
    fn now_us(&self) -> u64;

    /// Busy-wait for a short interval
    fn delay_us(&mut self, us: u32);
}

/// Lowest speed of a profiled move, in steps/s
pub const DEFAULT_CRAWL_SPEED: f32 = 50.0;

/// Step pulse width accepted by common STEP/DIR drivers
pub const DEFAULT_PULSE_WIDTH_US: u32 = 2;

const MICROS_PER_SEC: f32 = 1_000_000.0;

/// Software stepper configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SoftStepperConfig {
    /// STEP pulses are active-low
    pub invert_step: bool,
    /// DIR low means positive steps
    pub invert_dir: bool,
    /// STEP pulse high time in microseconds
    pub pulse_width_us: u32,
    /// Lowest speed while a target is pending, in steps/s
    pub crawl_speed: f32,
}

impl Default for SoftStepperConfig {
    fn default() -> Self {
        Self {
            invert_step: false,
            invert_dir: false,
            pulse_width_us: DEFAULT_PULSE_WIDTH_US,
            crawl_speed: DEFAULT_CRAWL_SPEED,
        }
    }
}

/// Direction of travel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    fn of(value: i32) -> Self {
        if value < 0 {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }

    fn of_speed(speed: f32) -> Self {
        if speed < 0.0 {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }

    fn step(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Stepper driven by GPIO STEP and DIR pins
pub struct SoftStepper<STEP, DIR, C> {
    step_pin: STEP,
    dir_pin: DIR,
    clock: C,
    config: SoftStepperConfig,
    position: i32,
    target: i32,
    /// Profiled speed magnitude in steps/s
    speed: f32,
    /// Signed speed for `run_speed`
    constant_speed: f32,
    max_speed: f32,
    acceleration: f32,
    direction: Direction,
    last_update_us: u64,
    last_step_us: u64,
    pin_faults: u32,
}

impl<STEP, DIR, C> SoftStepper<STEP, DIR, C>
where
    STEP: OutputPin,
    DIR: OutputPin,
    C: Clock,
{
    /// Create a stepper at position zero
    pub fn new(step_pin: STEP, dir_pin: DIR, clock: C, config: SoftStepperConfig) -> Self {
        let now = clock.now_us();
        let mut stepper = Self {
            step_pin,
            dir_pin,
            clock,
            config,
            position: 0,
            target: 0,
            speed: 0.0,
            constant_speed: 0.0,
            max_speed: 1.0,
            acceleration: 1.0,
            direction: Direction::Forward,
            last_update_us: now,
            last_step_us: now,
            pin_faults: 0,
        };
        stepper.write_step(false);
        stepper.write_dir(Direction::Forward);
        stepper
    }

    /// Current profiled speed magnitude in steps/s
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Number of failed pin writes since creation
    pub fn pin_faults(&self) -> u32 {
        self.pin_faults
    }

    fn crawl_speed(&self) -> f32 {
        self.config.crawl_speed.min(self.max_speed)
    }

    /// Emit one step pulse if the step interval at `speed` has elapsed
    fn step_if_due(&mut self, now: u64, speed: f32) -> bool {
        let elapsed = now.saturating_sub(self.last_step_us) as f32;
        if speed <= 0.0 || elapsed * speed < MICROS_PER_SEC {
            return false;
        }

        self.write_step(true);
        self.clock.delay_us(self.config.pulse_width_us);
        self.write_step(false);

        self.position = self.position.saturating_add(self.direction.step());

        // Keep the nominal cadence under polling jitter, but resync after a stall
        let interval = (MICROS_PER_SEC / speed) as u64;
        let next = self.last_step_us.saturating_add(interval);
        self.last_step_us = if now.saturating_sub(next) >= interval {
            now
        } else {
            next
        };
        true
    }

    fn set_direction(&mut self, direction: Direction) {
        if direction != self.direction {
            self.direction = direction;
            self.write_dir(direction);
        }
    }

    fn write_step(&mut self, active: bool) {
        let result = if active != self.config.invert_step {
            self.step_pin.set_high()
        } else {
            self.step_pin.set_low()
        };
        if result.is_err() {
            self.pin_faults = self.pin_faults.saturating_add(1);
        }
    }

    fn write_dir(&mut self, direction: Direction) {
        let forward = direction == Direction::Forward;
        let result = if forward != self.config.invert_dir {
            self.dir_pin.set_high()
        } else {
            self.dir_pin.set_low()
        };
        if result.is_err() {
            self.pin_faults = self.pin_faults.saturating_add(1);
        }
    }

    /// Update the profiled speed for the time elapsed since the last call
    fn update_speed(&mut self, now: u64, remaining: i32) {
        let dt = now.saturating_sub(self.last_update_us) as f32 / MICROS_PER_SEC;
        self.last_update_us = now;

        let crawl = self.crawl_speed();
        let wanted = Direction::of(remaining);

        if wanted != self.direction {
            // Only reached when `move_to` retargets behind a running motor.
            // The controller never does this: it refuses MOVE until idle.
            // Brake along the old direction before reversing
            self.speed -= self.acceleration * dt;
            if self.speed <= crawl {
                self.speed = crawl;
                self.set_direction(wanted);
            }
            return;
        }

        let stopping = self.speed * self.speed / (2.0 * self.acceleration);
        if stopping >= remaining.unsigned_abs() as f32 {
            self.speed = (self.speed - self.acceleration * dt).max(crawl);
        } else {
            self.speed = (self.speed + self.acceleration * dt).min(self.max_speed);
        }
    }
}

impl<STEP, DIR, C> StepActuator for SoftStepper<STEP, DIR, C>
where
    STEP: OutputPin,
    DIR: OutputPin,
    C: Clock,
{
    fn set_max_speed(&mut self, steps_per_sec: f32) {
        let speed = steps_per_sec.abs();
        if speed.is_finite() && speed > 0.0 {
            self.max_speed = speed;
            self.speed = self.speed.min(speed);
        }
    }

    fn set_acceleration(&mut self, steps_per_sec2: f32) {
        let acceleration = steps_per_sec2.abs();
        if acceleration.is_finite() && acceleration > 0.0 {
            self.acceleration = acceleration;
        }
    }

    fn move_to(&mut self, position: i32) {
        self.target = position;
    }

    fn set_speed(&mut self, steps_per_sec: f32) {
        self.constant_speed = if steps_per_sec.is_finite() {
            steps_per_sec
        } else {
            0.0
        };
    }

    fn run(&mut self) -> bool {
        let now = self.clock.now_us();
        let remaining = self.distance_to_go();

        if remaining == 0 {
            self.speed = 0.0;
            return false;
        }

        if self.speed == 0.0 {
            // Starting from rest
            self.set_direction(Direction::of(remaining));
            self.speed = self.crawl_speed();
            self.last_update_us = now;
            self.last_step_us = now;
            return true;
        }

        self.update_speed(now, remaining);
        self.step_if_due(now, self.speed);

        if self.distance_to_go() == 0 {
            self.speed = 0.0;
            return false;
        }
        true
    }

    fn run_speed(&mut self) -> bool {
        if self.constant_speed == 0.0 {
            return false;
        }
        let now = self.clock.now_us();
        self.set_direction(Direction::of_speed(self.constant_speed));
        self.step_if_due(now, self.constant_speed.abs())
    }

    fn stop(&mut self) {
        self.target = self.position;
        self.speed = 0.0;
        self.constant_speed = 0.0;
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
        self.constant_speed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};
    use std::rc::Rc;

    /// Mock output pin counting rising edges
    #[derive(Clone, Default)]
    struct MockPin {
        high: Rc<Cell<bool>>,
        rising: Rc<Cell<u32>>,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            if !self.high.get() {
                self.rising.set(self.rising.get() + 1);
            }
            self.high.set(true);
            Ok(())
        }
    }

    /// Pin whose writes always fail
    struct BrokenPin;

    #[derive(Debug)]
    struct PinFault;

    impl embedded_hal::digital::Error for PinFault {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    impl ErrorType for BrokenPin {
        type Error = PinFault;
    }

    impl OutputPin for BrokenPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Err(PinFault)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Err(PinFault)
        }
    }

    /// Manually advanced clock; delays advance it too
    #[derive(Clone, Default)]
    struct MockClock(Rc<Cell<u64>>);

    impl MockClock {
        fn advance(&self, us: u64) {
            self.0.set(self.0.get() + us);
        }
    }

    impl Clock for MockClock {
        fn now_us(&self) -> u64 {
            self.0.get()
        }

        fn delay_us(&mut self, us: u32) {
            self.advance(u64::from(us));
        }
    }

    struct Rig {
        stepper: SoftStepper<MockPin, MockPin, MockClock>,
        step: MockPin,
        dir: MockPin,
        clock: MockClock,
    }

    fn rig(config: SoftStepperConfig) -> Rig {
        let step = MockPin::default();
        let dir = MockPin::default();
        let clock = MockClock::default();
        let stepper = SoftStepper::new(step.clone(), dir.clone(), clock.clone(), config);
        Rig {
            stepper,
            step,
            dir,
            clock,
        }
    }

    /// Poll `run` every `period_us` until it reports completion
    fn run_to_target(rig: &mut Rig, period_us: u64) -> u32 {
        let mut polls = 0;
        while rig.stepper.run() {
            rig.clock.advance(period_us);
            polls += 1;
            assert!(polls < 1_000_000, "move never finished");
        }
        polls
    }

    #[test]
    fn test_profiled_move_forward() {
        let mut rig = rig(SoftStepperConfig::default());
        rig.stepper.set_max_speed(1000.0);
        rig.stepper.set_acceleration(500.0);
        rig.stepper.move_to(100);

        run_to_target(&mut rig, 100);

        assert_eq!(rig.stepper.current_position(), 100);
        assert_eq!(rig.stepper.distance_to_go(), 0);
        assert_eq!(rig.step.rising.get(), 100);
        assert!(rig.dir.high.get());
        assert!(!rig.step.high.get());
        assert_eq!(rig.stepper.speed(), 0.0);
    }

    #[test]
    fn test_profiled_move_reverse() {
        let mut rig = rig(SoftStepperConfig::default());
        rig.stepper.set_max_speed(800.0);
        rig.stepper.set_acceleration(4000.0);
        rig.stepper.move_to(-40);

        run_to_target(&mut rig, 50);

        assert_eq!(rig.stepper.current_position(), -40);
        assert_eq!(rig.step.rising.get(), 40);
        assert!(!rig.dir.high.get());
    }

    #[test]
    fn test_inverted_direction_pin() {
        let mut rig = rig(SoftStepperConfig {
            invert_dir: true,
            ..Default::default()
        });
        rig.stepper.set_max_speed(500.0);
        rig.stepper.set_acceleration(5000.0);
        rig.stepper.move_to(5);

        run_to_target(&mut rig, 50);
        assert_eq!(rig.stepper.current_position(), 5);
        assert!(!rig.dir.high.get());
    }

    #[test]
    fn test_speed_never_exceeds_max() {
        let mut rig = rig(SoftStepperConfig::default());
        rig.stepper.set_max_speed(300.0);
        rig.stepper.set_acceleration(10_000.0);
        rig.stepper.move_to(2000);

        for _ in 0..20_000 {
            rig.stepper.run();
            assert!(rig.stepper.speed() <= 300.0);
            rig.clock.advance(100);
        }
    }

    #[test]
    fn test_braking_reaches_target_without_overshoot() {
        let mut rig = rig(SoftStepperConfig::default());
        rig.stepper.set_max_speed(2000.0);
        rig.stepper.set_acceleration(1000.0);
        rig.stepper.move_to(500);

        let mut furthest = 0;
        while rig.stepper.run() {
            furthest = furthest.max(rig.stepper.current_position());
            rig.clock.advance(50);
        }
        assert_eq!(furthest, 500);
        assert_eq!(rig.stepper.current_position(), 500);
    }

    #[test]
    fn test_retarget_reverses_direction() {
        let mut rig = rig(SoftStepperConfig::default());
        rig.stepper.set_max_speed(1000.0);
        rig.stepper.set_acceleration(2000.0);
        rig.stepper.move_to(200);
        for _ in 0..2_000 {
            rig.stepper.run();
            rig.clock.advance(100);
        }
        assert!(rig.stepper.current_position() > 0);

        let before = rig.stepper.current_position();
        rig.stepper.move_to(-10);
        rig.stepper.run();
        // Still travelling forward while braking
        assert!(rig.stepper.current_position() >= before);

        run_to_target(&mut rig, 100);
        assert_eq!(rig.stepper.current_position(), -10);
        assert!(!rig.dir.high.get());
    }

    #[test]
    fn test_stop_is_immediate() {
        let mut rig = rig(SoftStepperConfig::default());
        rig.stepper.set_max_speed(1000.0);
        rig.stepper.set_acceleration(5000.0);
        rig.stepper.move_to(1000);
        for _ in 0..500 {
            rig.stepper.run();
            rig.clock.advance(100);
        }
        let stopped_at = rig.stepper.current_position();
        assert!(stopped_at > 0);

        rig.stepper.stop();
        assert_eq!(rig.stepper.distance_to_go(), 0);
        assert_eq!(rig.stepper.speed(), 0.0);

        rig.clock.advance(10_000);
        assert!(!rig.stepper.run());
        assert_eq!(rig.stepper.current_position(), stopped_at);
    }

    #[test]
    fn test_run_speed_constant_rate() {
        let mut rig = rig(SoftStepperConfig::default());
        rig.stepper.set_speed(-200.0);

        // 200 steps/s is one step every 5 ms
        rig.clock.advance(5_000);
        assert!(rig.stepper.run_speed());
        rig.clock.advance(1_000);
        assert!(!rig.stepper.run_speed());
        rig.clock.advance(4_000);
        assert!(rig.stepper.run_speed());

        assert_eq!(rig.stepper.current_position(), -2);
        assert!(!rig.dir.high.get());
        // Constant-speed steps do not move the target
        assert_eq!(rig.stepper.distance_to_go(), 2);
    }

    #[test]
    fn test_run_speed_holds_rate_with_coarse_polling() {
        let mut rig = rig(SoftStepperConfig::default());
        rig.stepper.set_speed(200.0);

        // 700 us polls never land on the 5 ms step boundary
        while rig.clock.now_us() < 1_000_000 {
            rig.clock.advance(700);
            rig.stepper.run_speed();
        }
        let steps = rig.step.rising.get();
        assert!((198..=200).contains(&steps), "{} steps in 1 s", steps);
    }

    #[test]
    fn test_run_speed_does_not_burst_after_stall() {
        let mut rig = rig(SoftStepperConfig::default());
        rig.stepper.set_speed(200.0);

        rig.clock.advance(50_000);
        assert!(rig.stepper.run_speed());
        rig.clock.advance(1_000);
        assert!(!rig.stepper.run_speed());
        rig.clock.advance(4_000);
        assert!(rig.stepper.run_speed());
        assert_eq!(rig.stepper.current_position(), 2);
    }

    #[test]
    fn test_run_speed_zero_does_nothing() {
        let mut rig = rig(SoftStepperConfig::default());
        rig.clock.advance(1_000_000);
        assert!(!rig.stepper.run_speed());
        assert_eq!(rig.step.rising.get(), 0);
    }

    #[test]
    fn test_set_current_position() {
        let mut rig = rig(SoftStepperConfig::default());
        rig.stepper.set_speed(100.0);
        rig.stepper.set_current_position(42);

        assert_eq!(rig.stepper.current_position(), 42);
        assert_eq!(rig.stepper.distance_to_go(), 0);
        rig.clock.advance(1_000_000);
        assert!(!rig.stepper.run_speed());
    }

    #[test]
    fn test_ignores_invalid_rates() {
        let mut rig = rig(SoftStepperConfig::default());
        rig.stepper.set_max_speed(400.0);
        rig.stepper.set_max_speed(0.0);
        rig.stepper.set_max_speed(f32::NAN);
        rig.stepper.set_acceleration(f32::INFINITY);
        // Negative rates use their magnitude
        rig.stepper.set_acceleration(-1000.0);
        rig.stepper.move_to(3);

        run_to_target(&mut rig, 100);
        assert_eq!(rig.stepper.current_position(), 3);
    }

    #[test]
    fn test_pin_faults_are_counted() {
        let clock = MockClock::default();
        let mut stepper =
            SoftStepper::new(BrokenPin, BrokenPin, clock.clone(), SoftStepperConfig::default());
        // Initial STEP and DIR writes
        assert_eq!(stepper.pin_faults(), 2);

        stepper.set_speed(1000.0);
        clock.advance(1_000);
        assert!(stepper.run_speed());
        assert_eq!(stepper.current_position(), 1);
        assert_eq!(stepper.pin_faults(), 4);
    }
}
