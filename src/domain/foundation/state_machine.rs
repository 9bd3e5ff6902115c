//! Status enums as explicit transition tables.

use std::fmt::Debug;

use super::ValidationError;

/// A status whose legal moves are a fixed table.
///
/// Implementors only list [`successors`](Self::successors); a state with
/// none is terminal.
///
/// ```ignore
/// let next = PaymentStatus::Pending.transition_to(PaymentStatus::Completed)?;
/// assert!(next.is_terminal());
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + Debug + 'static {
    /// States reachable in one move.
    fn successors(&self) -> &'static [Self];

    fn can_transition_to(&self, target: &Self) -> bool {
        self.successors().contains(target)
    }

    /// `target` if the move is in the table, an error naming both ends otherwise.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            return Ok(target);
        }
        Err(ValidationError::invalid_format(
            "state_transition",
            format!("Cannot transition from {:?} to {:?}", self, target),
        ))
    }

    fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }
}
