//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic input and lifecycle-rule failures.
/// Lookups and storage failures belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or missing required input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A status change that the entity's transition table does not permit.
    #[error("invalid {entity} status transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// An identifier was invalid (e.g. blank).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_transition(
        entity: &'static str,
        from: impl core::fmt::Display,
        to: impl core::fmt::Display,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_message_names_both_statuses() {
        let err = DomainError::invalid_transition("shift", "open", "in_progress");
        assert_eq!(
            err.to_string(),
            "invalid shift status transition from open to in_progress"
        );
    }

    #[test]
    fn blank_id_is_reported_as_invalid_id() {
        let err = DomainError::invalid_id("worker id must not be blank");
        assert_eq!(err.to_string(), "invalid identifier: worker id must not be blank");
    }
}
