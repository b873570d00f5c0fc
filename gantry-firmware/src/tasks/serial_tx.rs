//! Serial transmit task
//!
//! Writes status lines (`DONE`, `HOMED`, `ERR ...`) back to the host.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::RESPONSE;

/// Serial TX task - drains the response channel to the UART
#[embassy_executor::task]
pub async fn serial_tx_task(mut tx: BufferedUartTx) {
    info!("Serial TX task started");

    loop {
        let response = RESPONSE.receive().await;
        let line = response.encode();

        if let Err(e) = tx.write_all(line.as_bytes()).await {
            warn!("Failed to send {:?}: {:?}", response, e);
        } else {
            trace!("TX: {=str}", line.as_str());
        }
    }
}
