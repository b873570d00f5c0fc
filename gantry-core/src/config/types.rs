//! Configuration type definitions
//!
//! Geometry, motion, homing and protocol settings. Every constant the
//! controller depends on lives here rather than in code.

use core::f32::consts::{PI, SQRT_2};

use gantry_protocol::{MoveUnits, NumericPolicy};

use super::hardware::ConfigError;

/// Diameter of the stock GT2 pulley in millimetres
pub const DEFAULT_PULLEY_DIAMETER_MM: f32 = 12.0;

/// Step angle of a 200 step/rev motor
pub const DEFAULT_STEP_ANGLE_DEG: f32 = 1.8;

/// Default homing phase timeout
pub const DEFAULT_HOMING_TIMEOUT_MS: u32 = 30_000;

/// Belt and motor geometry used by the CoreXY transform
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GeometryConfig {
    /// Pulley circumference in mm (belt travel per motor revolution)
    pub pulley_circumference_mm: f32,
    /// Full-step angle in degrees
    pub step_angle_deg: f32,
    /// Microstepping multiplier
    pub microsteps: u16,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            pulley_circumference_mm: PI * DEFAULT_PULLEY_DIAMETER_MM,
            step_angle_deg: DEFAULT_STEP_ANGLE_DEG,
            microsteps: 1,
        }
    }
}

impl GeometryConfig {
    /// Angle turned by one (micro)step in degrees
    pub fn effective_step_angle(&self) -> f32 {
        self.step_angle_deg / self.microsteps as f32
    }

    /// Motor rotation in degrees per millimetre of diagonal belt travel
    ///
    /// This is `360 / (C * sqrt(2))`, the CoreXY belt factor.
    pub fn degrees_per_mm(&self) -> f32 {
        360.0 / (self.pulley_circumference_mm * SQRT_2)
    }

    /// Check the geometry can be used by the kinematic transform
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.pulley_circumference_mm) {
            return Err(ConfigError::InvalidCircumference);
        }
        if !is_positive(self.step_angle_deg) {
            return Err(ConfigError::InvalidStepAngle);
        }
        if self.microsteps == 0 {
            return Err(ConfigError::InvalidMicrosteps);
        }
        // Extreme but finite inputs can still overflow or underflow
        if !is_positive(self.effective_step_angle())
            || !is_positive(self.degrees_per_mm() / self.effective_step_angle())
        {
            return Err(ConfigError::NonFiniteScale);
        }
        Ok(())
    }
}

/// Finite and strictly positive
pub(crate) fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

/// Motion profile settings for coordinated moves
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionConfig {
    /// Maximum speed of the longer axis in steps/s
    pub max_speed: f32,
    /// Acceleration of the longer axis in steps/s²
    pub acceleration: f32,
    /// Units of `MOVE` arguments
    pub units: MoveUnits,
    /// Refuse moves until the machine has been homed
    pub require_homing: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_speed: 1000.0,
            acceleration: 500.0,
            units: MoveUnits::Steps,
            require_homing: false,
        }
    }
}

/// Homing sequence settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomingConfig {
    /// Constant motor speed while seeking a switch, in steps/s
    pub speed: f32,
    /// Maximum duration of each homing phase
    pub timeout_ms: u32,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            speed: 200.0,
            timeout_ms: DEFAULT_HOMING_TIMEOUT_MS,
        }
    }
}

/// Routing of commands with an unrecognised verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UnknownPolicy {
    /// Halt both motors, as a `STOP` would
    #[default]
    Stop,
    /// Leave motion untouched
    Ignore,
}

/// When `DONE` is reported
///
/// The serial protocol this firmware replaces printed `DONE` on every pass
/// of its idle loop, so a host saw a continuous stream of `DONE` lines while
/// the machine sat still. `EveryIdleTick` reproduces that stream for hosts
/// that poll for it; `OnTransition` sends one line per finished move or
/// `STOP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DoneReport {
    /// Once each time the machine becomes idle
    #[default]
    OnTransition,
    /// On every control-loop pass without motion, like the old firmware
    EveryIdleTick,
}

/// Whether commands are accepted while motion is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExecutionMode {
    /// Moves and homing finish before the next command is read
    #[default]
    RunToCompletion,
    /// Commands are read between ticks; `STOP` interrupts motion
    Preemptible,
}

/// Command protocol settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProtocolConfig {
    /// Numeric token policy
    pub numeric: NumericPolicy,
    /// Unknown verb handling
    pub unknown: UnknownPolicy,
    /// `DONE` reporting
    pub done: DoneReport,
    /// Command intake during motion
    pub mode: ExecutionMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let geometry = GeometryConfig::default();
        assert!((geometry.pulley_circumference_mm - 37.699_112).abs() < 1e-4);
        assert_eq!(geometry.effective_step_angle(), 1.8);
    }

    #[test]
    fn test_microstepping_divides_step_angle() {
        let geometry = GeometryConfig {
            microsteps: 16,
            ..Default::default()
        };
        assert!((geometry.effective_step_angle() - 0.1125).abs() < 1e-6);
    }

    #[test]
    fn test_geometry_validation() {
        assert_eq!(GeometryConfig::default().validate(), Ok(()));

        let tiny = GeometryConfig {
            pulley_circumference_mm: 1e-38,
            ..Default::default()
        };
        assert_eq!(tiny.validate(), Err(ConfigError::NonFiniteScale));

        let huge = GeometryConfig {
            pulley_circumference_mm: f32::MAX,
            ..Default::default()
        };
        assert_eq!(huge.validate(), Err(ConfigError::NonFiniteScale));
    }

    #[test]
    fn test_defaults_match_source_firmware() {
        let motion = MotionConfig::default();
        assert_eq!(motion.max_speed, 1000.0);
        assert_eq!(motion.acceleration, 500.0);
        assert_eq!(motion.units, MoveUnits::Steps);

        let homing = HomingConfig::default();
        assert_eq!(homing.speed, 200.0);
        assert!(homing.timeout_ms > 0);

        let protocol = ProtocolConfig::default();
        assert_eq!(protocol.numeric, NumericPolicy::BestEffort);
        assert_eq!(protocol.unknown, UnknownPolicy::Stop);
        assert_eq!(protocol.mode, ExecutionMode::RunToCompletion);
    }
}
