//! Persistence boundary for shifts and assignments.
//!
//! Engines only talk to these traits. Two backends exist: `in_memory` (tests/dev)
//! and `postgres` (production). Status writes are compare-and-swap: they take the
//! status the caller last read and only apply when the stored row still has it.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use sitesecurity_core::{WorkerId, WorksiteId};
use sitesecurity_shifts::{
    AssignmentId, AssignmentStatus, NewAssignment, NewShift, Shift, ShiftAssignment, ShiftId,
    ShiftStatus,
};

pub use in_memory::{InMemoryAssignmentStore, InMemoryShiftStore};
pub use postgres::{PostgresAssignmentStore, PostgresShiftStore};

/// Persistence failure. Propagated to callers unmodified; never retried.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached (pool closed, IO, timeout).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the write (unique/check/foreign key constraint).
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// A stored row could not be mapped back into a domain record.
    #[error("failed to decode row: {0}")]
    Decode(String),

    /// Any other backend failure.
    #[error("storage error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Shift persistence.
#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// All shifts, newest start time first.
    async fn list(&self, limit: u32, offset: u64) -> StoreResult<Vec<Shift>>;

    async fn list_by_worksite(
        &self,
        worksite_id: &WorksiteId,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Shift>>;

    async fn list_by_status(
        &self,
        status: ShiftStatus,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Shift>>;

    async fn get_by_id(&self, id: &ShiftId) -> StoreResult<Option<Shift>>;

    /// Insert a shift, assigning its id and timestamps.
    async fn create(&self, shift: NewShift) -> StoreResult<Shift>;

    /// Replace every mutable field. `None` when no row has `shift.id`.
    async fn update(&self, shift: &Shift) -> StoreResult<Option<Shift>>;

    /// Set `status = next` only where the row currently has `expected`.
    ///
    /// `None` means nothing was written: the row is gone or its status moved on.
    async fn update_status(
        &self,
        id: &ShiftId,
        expected: ShiftStatus,
        next: ShiftStatus,
    ) -> StoreResult<Option<Shift>>;

    /// Remove a shift. `false` when no row had that id.
    async fn delete(&self, id: &ShiftId) -> StoreResult<bool>;
}

/// Assignment persistence.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Assignments for a shift, most recently assigned first.
    async fn list_by_shift(&self, shift_id: &ShiftId) -> StoreResult<Vec<ShiftAssignment>>;

    /// Assignments for a worker, most recently assigned first.
    async fn list_by_worker(&self, worker_id: &WorkerId) -> StoreResult<Vec<ShiftAssignment>>;

    async fn get_by_id(&self, id: &AssignmentId) -> StoreResult<Option<ShiftAssignment>>;

    /// Most recent assignment for a (shift, worker) pair.
    async fn get(
        &self,
        shift_id: &ShiftId,
        worker_id: &WorkerId,
    ) -> StoreResult<Option<ShiftAssignment>>;

    /// Insert an assignment, assigning its id and `assigned_at`.
    async fn create(&self, assignment: NewAssignment) -> StoreResult<ShiftAssignment>;

    /// Compare-and-swap status update. A successful write stamps
    /// `responded_at` with the current time.
    async fn update_status(
        &self,
        id: &AssignmentId,
        expected: AssignmentStatus,
        next: AssignmentStatus,
    ) -> StoreResult<Option<ShiftAssignment>>;

    async fn delete(&self, id: &AssignmentId) -> StoreResult<bool>;
}

#[async_trait]
impl<S> ShiftStore for Arc<S>
where
    S: ShiftStore + ?Sized,
{
    async fn list(&self, limit: u32, offset: u64) -> StoreResult<Vec<Shift>> {
        (**self).list(limit, offset).await
    }

    async fn list_by_worksite(
        &self,
        worksite_id: &WorksiteId,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Shift>> {
        (**self).list_by_worksite(worksite_id, limit, offset).await
    }

    async fn list_by_status(
        &self,
        status: ShiftStatus,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Shift>> {
        (**self).list_by_status(status, limit, offset).await
    }

    async fn get_by_id(&self, id: &ShiftId) -> StoreResult<Option<Shift>> {
        (**self).get_by_id(id).await
    }

    async fn create(&self, shift: NewShift) -> StoreResult<Shift> {
        (**self).create(shift).await
    }

    async fn update(&self, shift: &Shift) -> StoreResult<Option<Shift>> {
        (**self).update(shift).await
    }

    async fn update_status(
        &self,
        id: &ShiftId,
        expected: ShiftStatus,
        next: ShiftStatus,
    ) -> StoreResult<Option<Shift>> {
        (**self).update_status(id, expected, next).await
    }

    async fn delete(&self, id: &ShiftId) -> StoreResult<bool> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> AssignmentStore for Arc<S>
where
    S: AssignmentStore + ?Sized,
{
    async fn list_by_shift(&self, shift_id: &ShiftId) -> StoreResult<Vec<ShiftAssignment>> {
        (**self).list_by_shift(shift_id).await
    }

    async fn list_by_worker(&self, worker_id: &WorkerId) -> StoreResult<Vec<ShiftAssignment>> {
        (**self).list_by_worker(worker_id).await
    }

    async fn get_by_id(&self, id: &AssignmentId) -> StoreResult<Option<ShiftAssignment>> {
        (**self).get_by_id(id).await
    }

    async fn get(
        &self,
        shift_id: &ShiftId,
        worker_id: &WorkerId,
    ) -> StoreResult<Option<ShiftAssignment>> {
        (**self).get(shift_id, worker_id).await
    }

    async fn create(&self, assignment: NewAssignment) -> StoreResult<ShiftAssignment> {
        (**self).create(assignment).await
    }

    async fn update_status(
        &self,
        id: &AssignmentId,
        expected: AssignmentStatus,
        next: AssignmentStatus,
    ) -> StoreResult<Option<ShiftAssignment>> {
        (**self).update_status(id, expected, next).await
    }

    async fn delete(&self, id: &AssignmentId) -> StoreResult<bool> {
        (**self).delete(id).await
    }
}
