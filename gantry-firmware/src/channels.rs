//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use gantry_protocol::{Command, Response};

/// A single slot: while the controller is busy the serial reader blocks on
/// this channel and further input stays in the UART buffer.
const COMMAND_CHANNEL_SIZE: usize = 1;

/// Channel capacity for status lines
const RESPONSE_CHANNEL_SIZE: usize = 4;

/// Parsed commands from the serial reader
pub static COMMAND: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Status lines from the control task and the serial reader
pub static RESPONSE: Channel<CriticalSectionRawMutex, Response, RESPONSE_CHANNEL_SIZE> =
    Channel::new();
