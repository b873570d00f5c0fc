//! Simple TOML parser for machine configuration
//!
//! Handles only the subset used by `machine.toml`. It does NOT support the
//! full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, float, boolean)
//! - [section] headers
//! - Comments (# ...)
//!
//! Keys missing from the file keep their defaults. Unknown sections and
//! unknown keys are errors so that typos do not silently fall back.

use gantry_protocol::{MoveUnits, NumericPolicy};

use super::hardware::{MachineConfig, PinConfig};
use super::types::{DoneReport, ExecutionMode, UnknownPolicy};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in the current section
    UnknownKey,
    /// Line is neither a header nor `key = value`
    InvalidLine,
    /// Invalid value type
    InvalidValue,
    /// Invalid pin string
    InvalidPin,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Geometry,
    Motion,
    Homing,
    Protocol,
    Pins,
}

/// Parse TOML configuration into MachineConfig
///
/// The result is not validated; call [`MachineConfig::validate`] on it.
pub fn parse_config(input: &str) -> Result<MachineConfig, ParseError> {
    let mut config = MachineConfig::new();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = strip_comment(line);
            if !header.ends_with(']') {
                return Err(ParseError::InvalidSection);
            }
            section = parse_section_header(&header[1..header.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        apply_value(section, key, value, &mut config)?;
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "geometry" => Ok(Section::Geometry),
        "motion" => Ok(Section::Motion),
        "homing" => Ok(Section::Homing),
        "protocol" => Ok(Section::Protocol),
        "pins" => Ok(Section::Pins),
        _ => Err(ParseError::InvalidSection),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut MachineConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Root => match key {
            "version" => config.version = parse_int(value)?,
            _ => return Err(ParseError::UnknownKey),
        },
        Section::Geometry => {
            let geometry = &mut config.geometry;
            match key {
                "pulley_circumference_mm" => geometry.pulley_circumference_mm = parse_float(value)?,
                "pulley_diameter_mm" => {
                    geometry.pulley_circumference_mm = core::f32::consts::PI * parse_float(value)?
                }
                "step_angle_deg" => geometry.step_angle_deg = parse_float(value)?,
                "microsteps" => geometry.microsteps = parse_int(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Motion => {
            let motion = &mut config.motion;
            match key {
                "max_speed" => motion.max_speed = parse_float(value)?,
                "acceleration" => motion.acceleration = parse_float(value)?,
                "units" => motion.units = parse_units(value)?,
                "require_homing" => motion.require_homing = parse_bool(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Homing => match key {
            "speed" => config.homing.speed = parse_float(value)?,
            "timeout_ms" => config.homing.timeout_ms = parse_int(value)?,
            _ => return Err(ParseError::UnknownKey),
        },
        Section::Protocol => {
            let protocol = &mut config.protocol;
            match key {
                "numeric" => protocol.numeric = parse_numeric(value)?,
                "unknown" => protocol.unknown = parse_unknown(value)?,
                "done" => protocol.done = parse_done(value)?,
                "mode" => protocol.mode = parse_mode(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Pins => {
            let pins = &mut config.pins;
            let pin = parse_pin(value)?;
            match key {
                "step_a" => pins.step_a = pin,
                "dir_a" => pins.dir_a = pin,
                "step_b" => pins.step_b = pin,
                "dir_b" => pins.dir_b = pin,
                "limit_x" => pins.limit_x = pin,
                "limit_y" => pins.limit_y = pin,
                _ => return Err(ParseError::UnknownKey),
            }
        }
    }
    Ok(())
}

/// Drop an inline comment that is not inside a string
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(hash_pos) if line[..hash_pos].matches('"').count() % 2 == 0 => {
            line[..hash_pos].trim()
        }
        _ => line,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = strip_comment(value.trim());

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a float, accepting integer literals too
fn parse_float(value: &str) -> Result<f32, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a pin string like "gpio11", "!gpio12", "^gpio4"
fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    let mut s = parse_string(value);
    let mut inverted = false;
    let mut pull_up = false;

    // Modifiers may appear in either order
    loop {
        if let Some(rest) = s.strip_prefix('!') {
            inverted = true;
            s = rest;
        } else if let Some(rest) = s.strip_prefix('^') {
            pull_up = true;
            s = rest;
        } else {
            break;
        }
    }

    let digits = s.strip_prefix("gpio").ok_or(ParseError::InvalidPin)?;
    let pin: u8 = digits.parse().map_err(|_| ParseError::InvalidPin)?;

    Ok(PinConfig {
        pin,
        inverted,
        pull_up,
    })
}

fn parse_units(value: &str) -> Result<MoveUnits, ParseError> {
    match parse_string(value) {
        "steps" => Ok(MoveUnits::Steps),
        "mm" | "millimeters" => Ok(MoveUnits::Millimeters),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_numeric(value: &str) -> Result<NumericPolicy, ParseError> {
    match parse_string(value) {
        "best_effort" => Ok(NumericPolicy::BestEffort),
        "strict" => Ok(NumericPolicy::Strict),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_unknown(value: &str) -> Result<UnknownPolicy, ParseError> {
    match parse_string(value) {
        "stop" => Ok(UnknownPolicy::Stop),
        "ignore" => Ok(UnknownPolicy::Ignore),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_done(value: &str) -> Result<DoneReport, ParseError> {
    match parse_string(value) {
        "on_transition" => Ok(DoneReport::OnTransition),
        "every_idle_tick" => Ok(DoneReport::EveryIdleTick),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_mode(value: &str) -> Result<ExecutionMode, ParseError> {
    match parse_string(value) {
        "run_to_completion" => Ok(ExecutionMode::RunToCompletion),
        "preemptible" => Ok(ExecutionMode::Preemptible),
        _ => Err(ParseError::InvalidValue),
    }
}
