//! Stepper driver implementations

pub mod soft;
// pub mod pio;  // Future: PIO step generation for higher step rates

pub use soft::{Clock, SoftStepper, SoftStepperConfig};
