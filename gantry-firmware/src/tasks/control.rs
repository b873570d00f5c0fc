//! Control task
//!
//! Owns the [`Controller`] and drives it: one pass per scheduler turn,
//! taking a command when the controller is ready for one and advancing motion
//! or homing. The step generators are polled from here, so the loop must
//! never await anything slow while motors are running.

use defmt::*;
use embassy_futures::yield_now;
use embassy_rp::gpio::{Input, Output};

use gantry_core::homing::HomingState;
use gantry_core::{Controller, ControllerEvent};
use gantry_drivers::{Endstop, SoftStepper};
use gantry_protocol::{Command, Response};

use crate::channels::{COMMAND, RESPONSE};
use crate::clock::{now_ms, EmbassyClock};

/// STEP/DIR motor on GPIO outputs
pub type Stepper = SoftStepper<Output<'static>, Output<'static>, EmbassyClock>;

/// Limit switch on a GPIO input
pub type Limit = Endstop<Input<'static>>;

/// Controller as wired on the board
pub type MachineController = Controller<Stepper, Limit>;

/// Control task - dispatches commands and runs the motion loop
#[embassy_executor::task]
pub async fn control_task(mut controller: MachineController) {
    info!("Control task started");

    let mut homing = controller.homing_state();

    loop {
        if controller.accepts_input() {
            if let Ok(command) = COMMAND.try_receive() {
                handle_command(&mut controller, command).await;
            }
        }

        if let Some(response) = controller.tick(now_ms()) {
            report(&controller, response);
            RESPONSE.send(response).await;
        }

        if controller.homing_state() != homing {
            homing = controller.homing_state();
            if let HomingState::Seeking(phase) = homing {
                debug!("Homing phase {:?}", phase);
            }
        }

        yield_now().await;
    }
}

/// Dispatch one command and queue any error line
async fn handle_command(controller: &mut MachineController, command: Command) {
    info!("Command {:?}", command);

    match controller.dispatch(command, now_ms()) {
        Ok(event) => log_event(event),
        Err(e) => {
            warn!("Command refused: {:?}", e);
            RESPONSE.send(Response::Error(e.into())).await;
        }
    }
}

fn log_event(event: ControllerEvent) {
    match event {
        ControllerEvent::MoveStarted(active) => {
            debug!(
                "Move to ({}, {}) mm, delta a={} b={}",
                active.position.x, active.position.y, active.delta.a, active.delta.b
            );
        }
        ControllerEvent::HomingStarted => debug!("Homing started"),
        ControllerEvent::Stopped { interrupted: true } => info!("Motion interrupted"),
        ControllerEvent::Stopped { interrupted: false } => debug!("Stop while idle"),
        ControllerEvent::Ignored => debug!("Command ignored"),
    }
}

/// Log the outcome behind a status line
fn report(controller: &MachineController, response: Response) {
    match response {
        Response::Homed => info!("Homed"),
        Response::Error(code) => {
            if let HomingState::Failed(e) = controller.homing_state() {
                error!("Homing failed: {:?}", e);
                let (x, y) = controller.limits();
                if x.read_faults() > 0 || y.read_faults() > 0 {
                    warn!(
                        "Limit switch read faults: x={} y={}",
                        x.read_faults(),
                        y.read_faults()
                    );
                }
            } else {
                warn!("Error: {=str}", code.as_str());
            }
        }
        Response::Done => {
            let position = controller.position();
            trace!("Idle at ({}, {}) mm", position.x, position.y);

            let axes = controller.axes();
            if axes.a.pin_faults() > 0 || axes.b.pin_faults() > 0 {
                warn!(
                    "Step pin faults: a={} b={}",
                    axes.a.pin_faults(),
                    axes.b.pin_faults()
                );
            }
        }
    }
}
