//! CoreXY kinematic transform
//!
//! Both motors drive one continuous belt, so each motor's rotation depends
//! on both Cartesian axes:
//!
//! ```text
//! rot_a = -k (dx + dy)
//! rot_b = -(2 k dx + rot_a)          = -k (dx - dy)
//! k     = 360 / (C * sqrt(2))        degrees per mm
//! steps = rot / (step_angle / microsteps), truncated toward zero
//! ```
//!
//! A pure X move turns both motors the same way by the same amount; a pure
//! Y move turns them by the same amount in opposite directions.

use crate::config::{ConfigError, GeometryConfig};
use crate::motion::{Position, StepDelta, StepTarget};

/// CoreXY transform for one belt geometry
///
/// Holds only derived constants; every method is pure.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoreXy {
    /// Motor degrees per mm of axis travel (`k`)
    degrees_per_mm: f32,
    /// Degrees per (micro)step (`s`)
    step_angle: f32,
}

impl CoreXy {
    /// Build the transform, rejecting unusable geometry
    pub fn new(geometry: &GeometryConfig) -> Result<Self, ConfigError> {
        geometry.validate()?;
        Ok(Self {
            degrees_per_mm: geometry.degrees_per_mm(),
            step_angle: geometry.effective_step_angle(),
        })
    }

    /// Step displacement that carries the carriage from `current` to `target`
    pub fn delta(&self, current: Position, target: Position) -> StepDelta {
        let u = self.degrees_per_mm * (target.x - current.x);
        let w = self.degrees_per_mm * (target.y - current.y);

        // Keep this evaluation order: with w == 0, `2u - u` is exact, so
        // pure X moves give identical counts on both motors.
        let rot_a = -(u + w);
        let rot_b = -(2.0 * u + rot_a);

        StepDelta {
            a: self.to_steps(rot_a),
            b: self.to_steps(rot_b),
        }
    }

    /// Absolute step target of `position`, measured from the home origin
    pub fn step_target(&self, position: Position) -> StepTarget {
        let delta = self.delta(Position::ORIGIN, position);
        StepTarget {
            a: delta.a,
            b: delta.b,
        }
    }

    /// Cartesian position reached at an absolute step target
    ///
    /// Inverse of [`step_target`](Self::step_target) up to truncation.
    pub fn position_for(&self, target: StepTarget) -> Position {
        let rot_a = target.a as f32 * self.step_angle;
        let rot_b = target.b as f32 * self.step_angle;
        let two_k = 2.0 * self.degrees_per_mm;

        Position {
            x: -(rot_a + rot_b) / two_k,
            y: -(rot_a - rot_b) / two_k,
        }
    }

    /// Carriage travel in mm of a single motor step
    pub fn mm_per_step(&self) -> f32 {
        self.step_angle / self.degrees_per_mm
    }

    fn to_steps(&self, degrees: f32) -> i32 {
        // `as` truncates toward zero and saturates out of range
        (degrees / self.step_angle) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn default_transform() -> CoreXy {
        CoreXy::new(&GeometryConfig::default()).unwrap()
    }

    #[test]
    fn test_one_square_in_x() {
        // 50.8 mm is one chess square on the reference board
        let kin = default_transform();
        let delta = kin.delta(Position::ORIGIN, Position::new(50.8, 0.0));
        assert_eq!(delta, StepDelta::new(-190, -190));
    }

    #[test]
    fn test_one_square_in_y() {
        let kin = default_transform();
        let delta = kin.delta(Position::ORIGIN, Position::new(0.0, 50.8));
        assert_eq!(delta, StepDelta::new(-190, 190));
    }

    #[test]
    fn test_diagonal_moves_one_motor() {
        let kin = default_transform();
        let delta = kin.delta(Position::ORIGIN, Position::new(50.8, 50.8));
        assert_eq!(delta.b, 0);
        assert_eq!(delta.a, -381);
    }

    #[test]
    fn test_microstepping_scales_steps() {
        let kin = CoreXy::new(&GeometryConfig {
            microsteps: 16,
            ..Default::default()
        })
        .unwrap();
        let delta = kin.delta(Position::ORIGIN, Position::new(50.8, 0.0));
        assert_eq!(delta.a, delta.b);
        assert!((delta.a + 3049).abs() <= 1);
    }

    #[test]
    fn test_rejects_invalid_geometry() {
        let bad = GeometryConfig {
            pulley_circumference_mm: 0.0,
            ..Default::default()
        };
        assert_eq!(CoreXy::new(&bad), Err(ConfigError::InvalidCircumference));

        let bad = GeometryConfig {
            microsteps: 0,
            ..Default::default()
        };
        assert_eq!(CoreXy::new(&bad), Err(ConfigError::InvalidMicrosteps));
    }

    #[test]
    fn test_position_for_inverts_exact_targets() {
        let kin = default_transform();
        let p = kin.position_for(StepTarget::new(-190, -190));
        assert!((p.x - 50.8).abs() < kin.mm_per_step());
        assert!(p.y.abs() < 1e-4);

        assert_eq!(kin.position_for(StepTarget::default()), Position::ORIGIN);
    }

    #[test]
    fn test_huge_targets_saturate() {
        let kin = default_transform();
        let t = kin.step_target(Position::new(1e30, 0.0));
        assert_eq!(t, StepTarget::new(i32::MIN, i32::MIN));
    }

    fn coord() -> impl Strategy<Value = f32> {
        -2000.0f32..2000.0
    }

    proptest! {
        #[test]
        fn prop_delta_negates_when_reversed(
            x0 in coord(), y0 in coord(), x1 in coord(), y1 in coord()
        ) {
            let kin = default_transform();
            let p0 = Position::new(x0, y0);
            let p1 = Position::new(x1, y1);
            prop_assert_eq!(kin.delta(p0, p1), -kin.delta(p1, p0));
        }

        #[test]
        fn prop_delta_to_self_is_zero(x in coord(), y in coord()) {
            let kin = default_transform();
            let p = Position::new(x, y);
            prop_assert_eq!(kin.delta(p, p), StepDelta::ZERO);
        }

        #[test]
        fn prop_pure_x_same_sign(x0 in coord(), x1 in coord(), y in coord()) {
            let kin = default_transform();
            let d = kin.delta(Position::new(x0, y), Position::new(x1, y));
            prop_assert_eq!(d.a, d.b);
        }

        #[test]
        fn prop_pure_y_opposite_sign(x in coord(), y0 in coord(), y1 in coord()) {
            let kin = default_transform();
            let d = kin.delta(Position::new(x, y0), Position::new(x, y1));
            prop_assert_eq!(d.a, -d.b);
        }

        #[test]
        fn prop_inverse_within_one_step(x in coord(), y in coord()) {
            let kin = default_transform();
            let p = kin.position_for(kin.step_target(Position::new(x, y)));
            // Truncation loses under one step on each motor
            let tolerance = kin.mm_per_step() + 1e-3;
            prop_assert!((p.x - x).abs() <= tolerance);
            prop_assert!((p.y - y).abs() <= tolerance);
        }
    }
}
