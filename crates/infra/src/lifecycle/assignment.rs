//! Assignment (shift offer) lifecycle engine.

use tracing::{debug, info, instrument, warn};

use sitesecurity_core::{Entity, WorkerId};
use sitesecurity_shifts::{
    AssignmentId, AssignmentStatus, NewAssignment, Shift, ShiftAssignment, ShiftId,
};

use super::{LifecycleError, LifecycleResult};
use crate::store::{AssignmentStore, ShiftStore};

/// Orchestrates offers of shifts to workers.
///
/// Needs the shift store only to check that an offered shift exists.
#[derive(Debug, Clone)]
pub struct AssignmentLifecycle<S, A> {
    shifts: S,
    assignments: A,
}

impl<S, A> AssignmentLifecycle<S, A>
where
    S: ShiftStore,
    A: AssignmentStore,
{
    pub fn new(shifts: S, assignments: A) -> Self {
        Self {
            shifts,
            assignments,
        }
    }

    pub fn assignments(&self) -> &A {
        &self.assignments
    }

    /// Offer a shift to a worker. Status defaults to `offered`.
    ///
    /// Fails with `NotFound` before touching the assignment store when the shift
    /// does not exist.
    #[instrument(
        skip(self, assignment),
        fields(shift_id = %assignment.shift_id, worker_id = %assignment.worker_id),
        err
    )]
    pub async fn create_assignment(
        &self,
        assignment: NewAssignment,
    ) -> LifecycleResult<ShiftAssignment> {
        assignment.validate()?;

        if self.shifts.get_by_id(&assignment.shift_id).await?.is_none() {
            return Err(LifecycleError::not_found(Shift::NAME));
        }

        let created = self.assignments.create(assignment).await?;
        info!(assignment_id = %created.id, status = %created.status, "assignment created");
        Ok(created)
    }

    /// Worker takes the offer. Only valid from `offered`.
    #[instrument(skip(self), fields(assignment_id = %id), err)]
    pub async fn accept_assignment(&self, id: &AssignmentId) -> LifecycleResult<ShiftAssignment> {
        self.transition(id, AssignmentStatus::Accepted).await
    }

    /// Worker turns the offer down. Only valid from `offered`.
    #[instrument(skip(self), fields(assignment_id = %id), err)]
    pub async fn decline_assignment(&self, id: &AssignmentId) -> LifecycleResult<ShiftAssignment> {
        self.transition(id, AssignmentStatus::Declined).await
    }

    /// Mark accepted work as done. `responded_at` moves to the completion time.
    #[instrument(skip(self), fields(assignment_id = %id), err)]
    pub async fn complete_assignment(&self, id: &AssignmentId) -> LifecycleResult<ShiftAssignment> {
        self.transition(id, AssignmentStatus::Completed).await
    }

    /// Every assignment for a shift, most recently assigned first.
    #[instrument(skip(self), fields(shift_id = %shift_id), err)]
    pub async fn list_assignments_by_shift(
        &self,
        shift_id: &ShiftId,
    ) -> LifecycleResult<Vec<ShiftAssignment>> {
        let assignments = self.assignments.list_by_shift(shift_id).await?;
        debug!(count = assignments.len(), "listed assignments for shift");
        Ok(assignments)
    }

    /// Every assignment for a worker, most recently assigned first.
    #[instrument(skip(self), fields(worker_id = %worker_id), err)]
    pub async fn list_assignments_by_worker(
        &self,
        worker_id: &WorkerId,
    ) -> LifecycleResult<Vec<ShiftAssignment>> {
        let assignments = self.assignments.list_by_worker(worker_id).await?;
        debug!(count = assignments.len(), "listed assignments for worker");
        Ok(assignments)
    }

    #[instrument(skip(self), fields(assignment_id = %id), err)]
    pub async fn get_assignment(&self, id: &AssignmentId) -> LifecycleResult<ShiftAssignment> {
        self.assignments
            .get_by_id(id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(ShiftAssignment::NAME))
    }

    /// Most recent assignment of `shift_id` to `worker_id`.
    #[instrument(skip(self), fields(shift_id = %shift_id, worker_id = %worker_id), err)]
    pub async fn find_assignment(
        &self,
        shift_id: &ShiftId,
        worker_id: &WorkerId,
    ) -> LifecycleResult<ShiftAssignment> {
        self.assignments
            .get(shift_id, worker_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(ShiftAssignment::NAME))
    }

    #[instrument(skip(self), fields(assignment_id = %id), err)]
    pub async fn delete_assignment(&self, id: &AssignmentId) -> LifecycleResult<()> {
        if !self.assignments.delete(id).await? {
            return Err(LifecycleError::not_found(ShiftAssignment::NAME));
        }
        info!("assignment deleted");
        Ok(())
    }

    async fn transition(
        &self,
        id: &AssignmentId,
        next: AssignmentStatus,
    ) -> LifecycleResult<ShiftAssignment> {
        let current = self.get_assignment(id).await?;
        current.status.transition_to(next)?;

        let written = self
            .assignments
            .update_status(id, current.status, next)
            .await?;

        match written {
            Some(updated) => {
                info!(from = %current.status, to = %updated.status, "assignment status changed");
                Ok(updated)
            }
            None => Err(self.lost_swap(id, current.status).await),
        }
    }

    async fn lost_swap(&self, id: &AssignmentId, expected: AssignmentStatus) -> LifecycleError {
        match self.assignments.get_by_id(id).await {
            Ok(Some(actual)) => {
                warn!(expected = %expected, actual = %actual.status, "assignment status changed concurrently");
                LifecycleError::Conflict(format!(
                    "assignment {id} was {expected} when read but is now {}",
                    actual.status
                ))
            }
            Ok(None) => LifecycleError::not_found(ShiftAssignment::NAME),
            Err(err) => err.into(),
        }
    }
}
