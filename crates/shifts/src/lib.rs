//! Shift scheduling domain module.
//!
//! This crate contains the business rules for shifts and the offers (assignments)
//! that link workers to them, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage). The lifecycle engines in `sitesecurity-infra`
//! consult these rules before every write.

pub mod assignment;
pub mod shift;

pub use assignment::{AssignmentId, AssignmentStatus, NewAssignment, ShiftAssignment};
pub use shift::{NewShift, Shift, ShiftId, ShiftStatus, ShiftWindow};
