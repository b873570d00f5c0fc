//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in gantry-core over `embedded-hal` 1.0 pins:
//!
//! - Software STEP/DIR step generator with a trapezoidal profile
//! - GPIO limit switches

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod endstop;
pub mod stepper;

pub use endstop::Endstop;
pub use stepper::{Clock, SoftStepper, SoftStepperConfig};
