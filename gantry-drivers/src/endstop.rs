//! GPIO limit switch
//!
//! Reads a mechanical or optical endstop on a digital input. Switches are
//! active-high by default; active-low switches (normally-open contacts to
//! ground with a pull-up) set `active_low`.

use embedded_hal::digital::InputPin;
use gantry_core::config::PinConfig;
use gantry_core::traits::LimitSwitch;

/// Limit switch on a GPIO input
pub struct Endstop<P> {
    pin: P,
    /// If true, triggered = pin LOW
    active_low: bool,
    read_faults: u32,
}

impl<P: InputPin> Endstop<P> {
    /// Create a new endstop
    pub fn new(pin: P, active_low: bool) -> Self {
        Self {
            pin,
            active_low,
            read_faults: 0,
        }
    }

    /// Create an endstop with the polarity from a pin assignment
    pub fn from_config(pin: P, config: &PinConfig) -> Self {
        Self::new(pin, config.inverted)
    }

    /// Number of failed reads since creation
    pub fn read_faults(&self) -> u32 {
        self.read_faults
    }
}

impl<P: InputPin> LimitSwitch for Endstop<P> {
    fn is_triggered(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high != self.active_low,
            Err(_) => {
                // An unreadable switch must not end homing early
                self.read_faults = self.read_faults.saturating_add(1);
                false
            }
        }
    }
}
