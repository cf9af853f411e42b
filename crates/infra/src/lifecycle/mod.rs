//! Lifecycle engines (application-level orchestration).
//!
//! Every write follows the same pipeline:
//!
//! ```text
//! request
//!   ↓
//! 1. Validate input (pure, `sitesecurity-shifts`)
//!   ↓
//! 2. Read the current record from the store
//!   ↓
//! 3. Check the transition table
//!   ↓
//! 4. Compare-and-swap the status in the store
//!   ↓
//! 5. On a failed swap, re-read: missing row → NotFound, moved status → Conflict
//! ```
//!
//! Engines hold no state of their own and take no locks; concurrent writers are
//! arbitrated by the store's compare-and-swap.

pub mod assignment;
pub mod shift;

use thiserror::Error;

use sitesecurity_core::DomainError;

use crate::store::StoreError;

pub use assignment::AssignmentLifecycle;
pub use shift::ShiftLifecycle;

/// Error returned by every lifecycle operation.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Malformed or missing input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced shift or assignment does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The requested status change is not in the transition table.
    #[error("invalid {entity} status transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// The record's status changed between our read and our write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence failed. Never retried.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LifecycleError {
    /// Stable machine-readable code for the routing layer.
    pub fn code(&self) -> &'static str {
        match self {
            LifecycleError::Validation(_) => "validation_error",
            LifecycleError::NotFound(_) => "not_found",
            LifecycleError::InvalidTransition { .. } => "invalid_transition",
            LifecycleError::Conflict(_) => "conflict",
            LifecycleError::Store(_) => "store_error",
        }
    }

    pub(crate) fn not_found(entity: &str) -> Self {
        LifecycleError::NotFound(entity.to_string())
    }
}

impl From<DomainError> for LifecycleError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => LifecycleError::Validation(msg),
            DomainError::InvalidTransition { entity, from, to } => {
                LifecycleError::InvalidTransition { entity, from, to }
            }
            DomainError::InvalidId(msg) => LifecycleError::Validation(msg),
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
