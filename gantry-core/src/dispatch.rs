//! Command dispatch
//!
//! Parses lines with the configured [`ParseOptions`] and maps each
//! [`Command`] onto the action the controller should take. Routing is
//! stateless: busy and homing checks belong to the controller.

use gantry_protocol::{parse_command, Command, ErrorCode, MoveArgs, ParseError, ParseOptions};

use crate::config::{MachineConfig, UnknownPolicy};
use crate::motion::{MoveRequest, Position, StepTarget};

/// What the controller should do for a command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Start a synchronized move
    Move(MoveRequest),
    /// Start the homing sequence
    Home,
    /// Halt both motors
    Stop,
    /// Leave motion untouched
    Ignore,
}

/// A routed command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Route {
    /// Action to perform
    pub action: Action,
    /// Error to report alongside the action
    pub report: Option<ErrorCode>,
}

impl Route {
    fn action(action: Action) -> Self {
        Self {
            action,
            report: None,
        }
    }
}

/// Line parser and command router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dispatcher {
    options: ParseOptions,
    unknown: UnknownPolicy,
}

impl Dispatcher {
    /// Create a dispatcher for a machine configuration
    pub fn new(config: &MachineConfig) -> Self {
        Self {
            options: config.parse_options(),
            unknown: config.protocol.unknown,
        }
    }

    /// Parse a line
    ///
    /// Blank lines yield `Ok(None)`.
    pub fn parse(&self, line: &str) -> Result<Option<Command>, ParseError> {
        match parse_command(line, &self.options) {
            Ok(command) => Ok(Some(command)),
            Err(ParseError::Empty) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Decide what a command does
    pub fn route(&self, command: Command) -> Route {
        match command {
            Command::Move(args) => Route::action(Action::Move(move_request(args))),
            Command::Home => Route::action(Action::Home),
            Command::Stop => Route::action(Action::Stop),
            Command::Unknown => Route {
                action: match self.unknown {
                    UnknownPolicy::Stop => Action::Stop,
                    UnknownPolicy::Ignore => Action::Ignore,
                },
                report: Some(ErrorCode::UnknownCommand),
            },
        }
    }
}

fn move_request(args: MoveArgs) -> MoveRequest {
    match args {
        MoveArgs::Steps { a, b } => MoveRequest::Steps(StepTarget::new(a, b)),
        MoveArgs::Millimeters { x, y } => MoveRequest::Position(Position::new(x, y)),
    }
}
