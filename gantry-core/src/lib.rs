//! Board-agnostic core logic for the CoreXY gantry controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (step actuator, limit switch)
//! - CoreXY kinematic transform
//! - Synchronized motion coordination
//! - Limit-switch homing sequence
//! - Command routing and the controller state machine
//! - Configuration type definitions and the `machine.toml` parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod homing;
pub mod kinematics;
pub mod motion;
#[cfg(test)]
mod sim;
pub mod traits;

pub use controller::{Activity, Controller, ControllerEvent, DispatchError};
pub use kinematics::CoreXy;
