//! Position and step types
//!
//! [`Position`] is the Cartesian carriage position in millimetres.
//! [`StepTarget`] and [`StepDelta`] are per-motor step counts: the first is
//! absolute from the home origin, the second is a displacement.

use core::ops::Neg;

/// Cartesian carriage position in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// The home origin
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    /// Create a position
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Check both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Absolute step counts for motors A and B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepTarget {
    pub a: i32,
    pub b: i32,
}

impl StepTarget {
    /// Create a step target
    pub const fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }
}

/// Step displacement for motors A and B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepDelta {
    pub a: i32,
    pub b: i32,
}

impl StepDelta {
    /// No displacement
    pub const ZERO: StepDelta = StepDelta { a: 0, b: 0 };

    /// Create a step delta
    pub const fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// Displacement between two absolute targets
    pub fn between(from: StepTarget, to: StepTarget) -> Self {
        Self {
            a: to.a.saturating_sub(from.a),
            b: to.b.saturating_sub(from.b),
        }
    }
}

impl Neg for StepDelta {
    type Output = StepDelta;

    fn neg(self) -> StepDelta {
        StepDelta {
            a: self.a.saturating_neg(),
            b: self.b.saturating_neg(),
        }
    }
}

/// How far the tracked position can be believed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PositionTrust {
    /// Power-on origin, never homed
    #[default]
    Assumed,
    /// Homed, and every move since has completed
    Homed,
    /// A move was interrupted or homing did not finish
    Stale,
}

impl PositionTrust {
    /// Check if the position is known to match the machine
    pub fn is_trusted(&self) -> bool {
        matches!(self, PositionTrust::Homed)
    }
}
