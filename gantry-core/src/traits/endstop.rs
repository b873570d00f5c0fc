//! Limit switch trait

/// A limit switch read once per poll
///
/// Implementations apply their own polarity: `true` always means the
/// carriage is at the switch.
pub trait LimitSwitch {
    /// Check if the switch is currently triggered
    fn is_triggered(&mut self) -> bool;
}
