//! Response lines sent back to the host
//!
//! The host waits for `DONE` after a move and `HOMED` after homing; any
//! other line is an error report of the form `ERR <CODE>`.

use core::fmt::Write;

use heapless::String;

use crate::command::ParseError;
use crate::line::LineError;

/// Line terminator appended to every response (Arduino `println` style)
pub const RESPONSE_END: &str = "\r\n";

/// Maximum encoded response length including the terminator
pub const MAX_RESPONSE_LEN: usize = 32;

/// Error codes reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    /// Command arrived while motion was in progress
    Busy,
    /// Arguments rejected under strict parsing
    Parse,
    /// Verb not recognised
    UnknownCommand,
    /// A limit switch never triggered during homing
    HomingTimeout,
    /// Move refused because the machine has not been homed
    NotHomed,
    /// Input line exceeded the maximum length
    LineTooLong,
    /// Input line was not valid UTF-8
    InvalidUtf8,
}

impl ErrorCode {
    /// Wire representation of this code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Busy => "BUSY",
            ErrorCode::Parse => "PARSE",
            ErrorCode::UnknownCommand => "UNKNOWN_COMMAND",
            ErrorCode::HomingTimeout => "HOMING_TIMEOUT",
            ErrorCode::NotHomed => "NOT_HOMED",
            ErrorCode::LineTooLong => "LINE_TOO_LONG",
            ErrorCode::InvalidUtf8 => "INVALID_UTF8",
        }
    }
}

impl From<LineError> for ErrorCode {
    fn from(e: LineError) -> Self {
        match e {
            LineError::TooLong => ErrorCode::LineTooLong,
            LineError::InvalidUtf8 => ErrorCode::InvalidUtf8,
        }
    }
}

impl From<ParseError> for ErrorCode {
    fn from(_: ParseError) -> Self {
        ErrorCode::Parse
    }
}

/// A status line for the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// No motion in progress
    Done,
    /// Homing sequence finished
    Homed,
    /// Something went wrong
    Error(ErrorCode),
}

impl Response {
    /// Encode this response as a terminated line
    pub fn encode(&self) -> String<MAX_RESPONSE_LEN> {
        let mut line = String::new();
        // Longest line is "ERR HOMING_TIMEOUT\r\n", well within capacity
        let _ = match self {
            Response::Done => write!(line, "DONE{}", RESPONSE_END),
            Response::Homed => write!(line, "HOMED{}", RESPONSE_END),
            Response::Error(code) => write!(line, "ERR {}{}", code.as_str(), RESPONSE_END),
        };
        line
    }
}
