//! State machine trait for status enums.
//!
//! Provides a consistent interface for querying and validating state
//! transitions. The conversation states derive their answers from the
//! guarded rule table rather than a hand-written match.

use super::ValidationError;

/// Trait for status enums that represent state machines.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if some rule allows moving from self to target.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all reachable target states from the current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_transition(self, target))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
