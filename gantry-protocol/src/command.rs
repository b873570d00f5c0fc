//! Command parsing
//!
//! Grammar: whitespace-separated tokens, the first token selects the verb.
//!
//! ```text
//! MOVE <a|x> <b|y>
//! HOME
//! STOP
//! ```
//!
//! Verbs are matched case-sensitively. `MOVE` arguments are raw step
//! targets or millimetre coordinates depending on [`MoveUnits`].

/// Verb for a synchronized move
pub const VERB_MOVE: &str = "MOVE";
/// Verb for the homing sequence
pub const VERB_HOME: &str = "HOME";
/// Verb for an immediate stop
pub const VERB_STOP: &str = "STOP";

/// Interpretation of `MOVE` arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveUnits {
    /// Absolute step targets for motor A and motor B
    #[default]
    Steps,
    /// Cartesian X/Y coordinates in millimetres
    Millimeters,
}

/// How malformed or missing numeric tokens are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NumericPolicy {
    /// Read the leading numeric prefix of each token, `0` when there is none
    #[default]
    BestEffort,
    /// Reject missing, malformed or surplus tokens
    Strict,
}

/// Parser options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseOptions {
    /// Units of `MOVE` arguments
    pub units: MoveUnits,
    /// Numeric token policy
    pub numeric: NumericPolicy,
}

/// Arguments of a `MOVE` command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveArgs {
    /// Raw absolute step targets
    Steps { a: i32, b: i32 },
    /// Cartesian target in millimetres
    Millimeters { x: f32, y: f32 },
}

/// A parsed command line
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Synchronized dual-axis move
    Move(MoveArgs),
    /// Run the homing sequence
    Home,
    /// Halt both motors immediately
    Stop,
    /// Verb not recognised
    Unknown,
}

/// Errors from strict parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Line had no tokens
    Empty,
    /// Required argument missing
    MissingArgument,
    /// Argument is not a number
    InvalidNumber,
    /// More tokens than the verb takes
    UnexpectedArgument,
}

/// Parse one line into a [`Command`]
///
/// Empty (or whitespace-only) lines are always [`ParseError::Empty`].
/// Under [`NumericPolicy::BestEffort`] this is the only error.
pub fn parse_command(line: &str, options: &ParseOptions) -> Result<Command, ParseError> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next().ok_or(ParseError::Empty)?;

    let command = match verb {
        VERB_MOVE => {
            let first = tokens.next();
            let second = tokens.next();
            let args = match options.units {
                MoveUnits::Steps => MoveArgs::Steps {
                    a: int_arg(first, options.numeric)?,
                    b: int_arg(second, options.numeric)?,
                },
                MoveUnits::Millimeters => MoveArgs::Millimeters {
                    x: float_arg(first, options.numeric)?,
                    y: float_arg(second, options.numeric)?,
                },
            };
            Command::Move(args)
        }
        VERB_HOME => Command::Home,
        VERB_STOP => Command::Stop,
        _ => return Ok(Command::Unknown),
    };

    if options.numeric == NumericPolicy::Strict && tokens.next().is_some() {
        return Err(ParseError::UnexpectedArgument);
    }

    Ok(command)
}

fn int_arg(token: Option<&str>, policy: NumericPolicy) -> Result<i32, ParseError> {
    match (token, policy) {
        (None, NumericPolicy::Strict) => Err(ParseError::MissingArgument),
        (None, NumericPolicy::BestEffort) => Ok(0),
        (Some(t), NumericPolicy::Strict) => t.parse().map_err(|_| ParseError::InvalidNumber),
        (Some(t), NumericPolicy::BestEffort) => {
            Ok(t[..int_prefix_len(t)].parse().unwrap_or(0))
        }
    }
}

fn float_arg(token: Option<&str>, policy: NumericPolicy) -> Result<f32, ParseError> {
    match (token, policy) {
        (None, NumericPolicy::Strict) => Err(ParseError::MissingArgument),
        (None, NumericPolicy::BestEffort) => Ok(0.0),
        (Some(t), NumericPolicy::Strict) => {
            let value: f32 = t.parse().map_err(|_| ParseError::InvalidNumber)?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(ParseError::InvalidNumber)
            }
        }
        (Some(t), NumericPolicy::BestEffort) => {
            let value: f32 = t[..float_prefix_len(t)].parse().unwrap_or(0.0);
            Ok(if value.is_finite() { value } else { 0.0 })
        }
    }
}

/// Length of the `[+-]?[0-9]*` prefix
fn int_prefix_len(token: &str) -> usize {
    let bytes = token.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    sign + bytes[sign..].iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Length of the `[+-]?[0-9]*(\.[0-9]*)?` prefix
fn float_prefix_len(token: &str) -> usize {
    let int_len = int_prefix_len(token);
    let bytes = token.as_bytes();
    if bytes.get(int_len) == Some(&b'.') {
        int_len + 1 + bytes[int_len + 1..].iter().take_while(|b| b.is_ascii_digit()).count()
    } else {
        int_len
    }
}
