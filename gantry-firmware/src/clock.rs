//! Embassy time source for the step generators

use embassy_time::{block_for, Duration, Instant};

use gantry_drivers::Clock;

/// [`Clock`] backed by the embassy time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }

    fn delay_us(&mut self, us: u32) {
        block_for(Duration::from_micros(u64::from(us)));
    }
}

/// Milliseconds since boot, the time base of the controller
pub fn now_ms() -> u64 {
    Instant::now().as_millis()
}
