//! Gantry - CoreXY Controller Firmware
//!
//! Main firmware binary for an RP2040 driving a two-motor CoreXY carriage
//! from newline-terminated text commands on UART0.
//!
//! Pin assignments and motion parameters come from `machine.toml`, embedded
//! at build time and checked by `build.rs`.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Timer;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use gantry_core::config::toml::parse_config;
use gantry_core::config::{ConfigError, MachineConfig, PinConfig};
use gantry_core::motion::Axes;
use gantry_core::Controller;
use gantry_drivers::{Endstop, SoftStepper, SoftStepperConfig};

use crate::board::{BoardError, GpioBank};
use crate::clock::EmbassyClock;
use crate::tasks::{MachineController, Stepper};

mod board;
mod channels;
mod clock;
mod tasks;

/// Embedded configuration (compiled into firmware)
/// Edit machine.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../machine.toml");

/// Command UART baud rate
const UART_BAUD: u32 = 115_200;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Reasons the controller could not be brought up
#[derive(Debug, Clone, Copy, Format)]
enum StartupError {
    Config(ConfigError),
    Board(BoardError),
}

impl From<ConfigError> for StartupError {
    fn from(e: ConfigError) -> Self {
        StartupError::Config(e)
    }
}

impl From<BoardError> for StartupError {
    fn from(e: BoardError) -> Self {
        StartupError::Board(e)
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Gantry firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = UART_BAUD;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", UART_BAUD);

    let mut bank = board::take_gpio_bank!(p);

    let controller = match build_controller(config, &mut bank) {
        Ok(controller) => controller,
        Err(e) => {
            // Never enable motion with a bad configuration
            error!("Controller setup failed: {:?}", e);
            loop {
                Timer::after_secs(10).await;
                warn!("Motion disabled: {:?}", e);
            }
        }
    };

    info!(
        "Controller ready: {} deg/mm, {} mm/step",
        controller.config().geometry.degrees_per_mm(),
        controller.config().geometry.effective_step_angle()
            / controller.config().geometry.degrees_per_mm()
    );

    let dispatcher = *controller.dispatcher();

    spawner.spawn(unwrap!(tasks::serial_tx_task(tx)));
    spawner.spawn(unwrap!(tasks::serial_rx_task(rx, dispatcher)));
    spawner.spawn(unwrap!(tasks::control_task(controller)));

    info!("All tasks spawned, firmware running");

    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded configuration
///
/// A syntax error falls back to the built-in defaults; validation happens
/// when the controller is built.
fn load_config() -> MachineConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            // build.rs rejects a broken machine.toml, so this is a parser mismatch
            error!("Failed to parse embedded config: {:?}", e);
            warn!("Using default configuration");
            MachineConfig::default()
        }
    }
}

/// Claim the configured pins and assemble the controller
fn build_controller(
    config: MachineConfig,
    bank: &mut GpioBank,
) -> Result<MachineController, StartupError> {
    config.validate()?;

    let pins = &config.pins;
    let a = stepper(bank, &pins.step_a, &pins.dir_a)?;
    let b = stepper(bank, &pins.step_b, &pins.dir_b)?;
    let limit_x = Endstop::from_config(bank.input(&pins.limit_x)?, &pins.limit_x);
    let limit_y = Endstop::from_config(bank.input(&pins.limit_y)?, &pins.limit_y);

    Ok(Controller::new(config, Axes::new(a, b), limit_x, limit_y)?)
}

fn stepper(
    bank: &mut GpioBank,
    step: &PinConfig,
    dir: &PinConfig,
) -> Result<Stepper, BoardError> {
    let config = SoftStepperConfig {
        invert_step: step.inverted,
        invert_dir: dir.inverted,
        ..SoftStepperConfig::default()
    };
    Ok(SoftStepper::new(
        bank.output(step)?,
        bank.output(dir)?,
        EmbassyClock,
        config,
    ))
}
