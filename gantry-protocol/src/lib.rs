//! Gantry serial command protocol
//!
//! This crate defines the text protocol between the host (the chess
//! engine PC) and the gantry controller. It is deliberately the same
//! protocol an Arduino sketch would speak over a USB serial port.
//!
//! # Protocol Overview
//!
//! Host to controller, one command per newline-terminated line:
//! ```text
//! MOVE <a> <b>     step targets, or X/Y millimetres in coordinate mode
//! HOME             run the limit-switch homing sequence
//! STOP             halt both motors immediately
//! ```
//!
//! Controller to host:
//! ```text
//! DONE             no motion in progress
//! HOMED            homing finished
//! ERR <CODE>       command rejected or failed
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod line;
pub mod response;

pub use command::{
    parse_command, Command, MoveArgs, MoveUnits, NumericPolicy, ParseError, ParseOptions,
};
pub use line::{Line, LineError, LineParser, MAX_LINE_LEN};
pub use response::{ErrorCode, Response, MAX_RESPONSE_LEN};
