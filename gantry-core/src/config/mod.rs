//! Configuration types
//!
//! Board-agnostic configuration structures, loaded from `machine.toml`
//! and validated once at startup.

pub mod hardware;
pub mod toml;
pub mod types;

pub use hardware::*;
pub use types::*;
