//! GPIO assignment from `[pins]`
//!
//! The RP2040 exposes GPIO0-29 as distinct peripheral types. The bank type-erases
//! the free ones so the configured pin numbers can pick them at runtime.
//! GPIO0/1 are held back for the command UART.

use embassy_rp::gpio::{AnyPin, Input, Level, Output, Pull};
use embassy_rp::Peri;

use gantry_core::config::{PinConfig, GPIO_COUNT};

pub(crate) const BANK_SIZE: usize = GPIO_COUNT as usize;

/// Free GPIOs, each handed out at most once
pub struct GpioBank {
    pub(crate) pins: [Option<Peri<'static, AnyPin>>; BANK_SIZE],
}

/// Errors while claiming pins
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum BoardError {
    /// Pin is reserved for the UART or was already claimed
    Unavailable(u8),
}

/// Move every GPIO except the UART pins out of `Peripherals` into a bank
macro_rules! take_gpio_bank {
    ($p:ident) => {
        $crate::board::take_gpio_bank!(@bank $p,
            2 => PIN_2, 3 => PIN_3, 4 => PIN_4, 5 => PIN_5,
            6 => PIN_6, 7 => PIN_7, 8 => PIN_8, 9 => PIN_9,
            10 => PIN_10, 11 => PIN_11, 12 => PIN_12, 13 => PIN_13,
            14 => PIN_14, 15 => PIN_15, 16 => PIN_16, 17 => PIN_17,
            18 => PIN_18, 19 => PIN_19, 20 => PIN_20, 21 => PIN_21,
            22 => PIN_22, 23 => PIN_23, 24 => PIN_24, 25 => PIN_25,
            26 => PIN_26, 27 => PIN_27, 28 => PIN_28, 29 => PIN_29
        )
    };
    (@bank $p:ident, $($n:literal => $pin:ident),*) => {{
        let mut pins: [Option<embassy_rp::Peri<'static, embassy_rp::gpio::AnyPin>>;
            $crate::board::BANK_SIZE] = [const { None }; $crate::board::BANK_SIZE];
        $( pins[$n] = Some(embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.$pin)); )*
        $crate::board::GpioBank { pins }
    }};
}

pub(crate) use take_gpio_bank;

impl GpioBank {
    fn take(&mut self, pin: u8) -> Result<Peri<'static, AnyPin>, BoardError> {
        self.pins
            .get_mut(usize::from(pin))
            .and_then(Option::take)
            .ok_or(BoardError::Unavailable(pin))
    }

    /// Claim a STEP or DIR output, driven low
    ///
    /// Polarity is handled by the step generator, not the pin.
    pub fn output(&mut self, config: &PinConfig) -> Result<Output<'static>, BoardError> {
        Ok(Output::new(self.take(config.pin)?, Level::Low))
    }

    /// Claim a limit switch input with the configured pull
    pub fn input(&mut self, config: &PinConfig) -> Result<Input<'static>, BoardError> {
        let pull = if config.pull_up { Pull::Up } else { Pull::None };
        Ok(Input::new(self.take(config.pin)?, pull))
    }
}
