//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod endstop;
pub mod stepper;

pub use endstop::LimitSwitch;
pub use stepper::StepActuator;
