//! Serial receive task
//!
//! Splits the UART byte stream into lines and hands parsed commands to the
//! control task.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use gantry_core::dispatch::Dispatcher;
use gantry_protocol::{ErrorCode, LineParser, Response};

use crate::channels::{COMMAND, RESPONSE};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Serial RX task - receives command lines from the host
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx, dispatcher: Dispatcher) {
    info!("Serial RX task started");

    let mut parser = LineParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                let mut rest = &buf[..n];
                while !rest.is_empty() {
                    let (used, result) = parser.feed_bytes(rest);
                    rest = &rest[used..];

                    match result {
                        Ok(Some(line)) => handle_line(&dispatcher, &line).await,
                        Ok(None) => {
                            // Need more bytes
                        }
                        Err(e) => {
                            warn!("Line framing error: {:?}", e);
                            RESPONSE.send(Response::Error(ErrorCode::from(e))).await;
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

/// Parse a complete line and queue the command
///
/// Blocks while a previous command is still waiting for the control task.
async fn handle_line(dispatcher: &Dispatcher, line: &str) {
    trace!("Line: {=str}", line);

    match dispatcher.parse(line) {
        Ok(Some(command)) => {
            debug!("Parsed {:?}", command);
            COMMAND.send(command).await;
        }
        Ok(None) => {}
        Err(e) => {
            warn!("Rejected line: {:?}", e);
            RESPONSE.send(Response::Error(ErrorCode::from(e))).await;
        }
    }
}
