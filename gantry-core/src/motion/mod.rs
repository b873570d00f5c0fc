//! Motion coordination
//!
//! Position types, the motor pair and the coordinator that drives
//! synchronized moves.

pub mod axes;
pub mod coordinator;
pub mod position;

pub use axes::Axes;
pub use coordinator::{ActiveMove, MotionCoordinator, MotionStatus, MoveRequest};
pub use position::{Position, PositionTrust, StepDelta, StepTarget};
