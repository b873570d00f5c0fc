//! Hardware configuration types
//!
//! Pin assignments and the top-level machine configuration, plus the
//! startup validation that rejects unusable settings before any motion.

use gantry_protocol::ParseOptions;

use super::types::{is_positive, GeometryConfig, HomingConfig, MotionConfig, ProtocolConfig};

/// Number of GPIO pins on the RP2040
pub const GPIO_COUNT: u8 = 30;

/// Current configuration layout version
pub const CONFIG_VERSION: u8 = 1;

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
    /// Enable internal pull-up
    pub pull_up: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
            pull_up: false,
        }
    }

    /// Create a pin with pull-up enabled
    pub const fn with_pullup(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: true,
        }
    }
}

/// Pin assignments for both motors and both limit switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinsConfig {
    /// Motor A step pulse
    pub step_a: PinConfig,
    /// Motor A direction
    pub dir_a: PinConfig,
    /// Motor B step pulse
    pub step_b: PinConfig,
    /// Motor B direction
    pub dir_b: PinConfig,
    /// X limit switch (active-high unless inverted)
    pub limit_x: PinConfig,
    /// Y limit switch (active-high unless inverted)
    pub limit_y: PinConfig,
}

impl Default for PinsConfig {
    fn default() -> Self {
        Self {
            step_a: PinConfig::new(2),
            dir_a: PinConfig::new(3),
            step_b: PinConfig::new(4),
            dir_b: PinConfig::new(5),
            limit_x: PinConfig::new(8),
            limit_y: PinConfig::new(9),
        }
    }
}

impl PinsConfig {
    /// All assigned pins
    pub fn all(&self) -> [PinConfig; 6] {
        [
            self.step_a,
            self.dir_a,
            self.step_b,
            self.dir_b,
            self.limit_x,
            self.limit_y,
        ]
    }
}

/// Configuration errors detected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pulley circumference is zero, negative or not finite
    InvalidCircumference,
    /// Step angle is zero, negative or not finite
    InvalidStepAngle,
    /// Microstepping multiplier is zero
    InvalidMicrosteps,
    /// Derived steps-per-millimetre scale is not finite or not positive
    NonFiniteScale,
    /// Max speed is zero, negative or not finite
    InvalidSpeed,
    /// Acceleration is zero, negative or not finite
    InvalidAcceleration,
    /// Homing speed is zero, negative or not finite
    InvalidHomingSpeed,
    /// Homing timeout is zero
    InvalidHomingTimeout,
    /// Pin number outside the GPIO range
    InvalidPin(u8),
    /// Same pin assigned twice
    PinConflict(u8),
    /// Unsupported configuration version
    VersionMismatch,
}

/// Complete machine configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachineConfig {
    /// Configuration version for compatibility checks
    pub version: u8,
    /// CoreXY belt geometry
    pub geometry: GeometryConfig,
    /// Coordinated move settings
    pub motion: MotionConfig,
    /// Homing sequence settings
    pub homing: HomingConfig,
    /// Serial protocol settings
    pub protocol: ProtocolConfig,
    /// Pin assignments
    pub pins: PinsConfig,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            geometry: GeometryConfig::default(),
            motion: MotionConfig::default(),
            homing: HomingConfig::default(),
            protocol: ProtocolConfig::default(),
            pins: PinsConfig::default(),
        }
    }
}

impl MachineConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser options derived from the motion and protocol settings
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            units: self.motion.units,
            numeric: self.protocol.numeric,
        }
    }

    /// Check every setting the controller relies on
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch);
        }

        self.geometry.validate()?;

        if !is_positive(self.motion.max_speed) {
            return Err(ConfigError::InvalidSpeed);
        }
        if !is_positive(self.motion.acceleration) {
            return Err(ConfigError::InvalidAcceleration);
        }

        if !is_positive(self.homing.speed) {
            return Err(ConfigError::InvalidHomingSpeed);
        }
        if self.homing.timeout_ms == 0 {
            return Err(ConfigError::InvalidHomingTimeout);
        }

        let pins = self.pins.all();
        for (i, pin) in pins.iter().enumerate() {
            if pin.pin >= GPIO_COUNT {
                return Err(ConfigError::InvalidPin(pin.pin));
            }
            if pins[i + 1..].iter().any(|other| other.pin == pin.pin) {
                return Err(ConfigError::PinConflict(pin.pin));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_config() {
        let pin = PinConfig::new(10);
        assert_eq!(pin.pin, 10);
        assert!(!pin.inverted);
        assert!(!pin.pull_up);

        let inverted = PinConfig::inverted(12);
        assert!(inverted.inverted);

        let pullup = PinConfig::with_pullup(4);
        assert!(pullup.pull_up);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(MachineConfig::new().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_circumference() {
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let mut config = MachineConfig::new();
            config.geometry.pulley_circumference_mm = bad;
            assert_eq!(config.validate(), Err(ConfigError::InvalidCircumference));
        }
    }

    #[test]
    fn test_rejects_bad_step_angle() {
        let mut config = MachineConfig::new();
        config.geometry.step_angle_deg = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidStepAngle));

        config.geometry.step_angle_deg = -1.8;
        assert_eq!(config.validate(), Err(ConfigError::InvalidStepAngle));
    }

    #[test]
    fn test_rejects_zero_microsteps() {
        let mut config = MachineConfig::new();
        config.geometry.microsteps = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMicrosteps));
    }

    #[test]
    fn test_rejects_bad_motion_settings() {
        let mut config = MachineConfig::new();
        config.motion.max_speed = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidSpeed));

        let mut config = MachineConfig::new();
        config.motion.acceleration = f32::NAN;
        assert_eq!(config.validate(), Err(ConfigError::InvalidAcceleration));

        let mut config = MachineConfig::new();
        config.homing.speed = -200.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidHomingSpeed));

        let mut config = MachineConfig::new();
        config.homing.timeout_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidHomingTimeout));
    }

    #[test]
    fn test_rejects_pin_problems() {
        let mut config = MachineConfig::new();
        config.pins.limit_y = PinConfig::new(2);
        assert_eq!(config.validate(), Err(ConfigError::PinConflict(2)));

        let mut config = MachineConfig::new();
        config.pins.dir_b = PinConfig::new(30);
        assert_eq!(config.validate(), Err(ConfigError::InvalidPin(30)));
    }

    #[test]
    fn test_rejects_version_mismatch() {
        let mut config = MachineConfig::new();
        config.version = 2;
        assert_eq!(config.validate(), Err(ConfigError::VersionMismatch));
    }

    #[test]
    fn test_parse_options_follow_config() {
        let mut config = MachineConfig::new();
        config.motion.units = gantry_protocol::MoveUnits::Millimeters;
        config.protocol.numeric = gantry_protocol::NumericPolicy::Strict;

        let options = config.parse_options();
        assert_eq!(options.units, gantry_protocol::MoveUnits::Millimeters);
        assert_eq!(options.numeric, gantry_protocol::NumericPolicy::Strict);
    }
}
