//! Shift lifecycle engine.

use tracing::{debug, info, instrument, warn};

use sitesecurity_core::{Entity, PageRequest, WorksiteId};
use sitesecurity_shifts::{NewShift, Shift, ShiftId, ShiftStatus};

use super::{LifecycleError, LifecycleResult};
use crate::store::ShiftStore;

/// Orchestrates shift reads and writes over a [`ShiftStore`].
///
/// Status changes go through the transition table; full updates do not (see
/// [`ShiftLifecycle::update`]).
#[derive(Debug, Clone)]
pub struct ShiftLifecycle<S> {
    store: S,
}

impl<S> ShiftLifecycle<S>
where
    S: ShiftStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// One page of shifts, newest start time first.
    #[instrument(skip(self), err)]
    pub async fn list(&self, page: i64, per_page: i64) -> LifecycleResult<Vec<Shift>> {
        let paging = PageRequest::new(page, per_page);
        let shifts = self.store.list(paging.limit(), paging.offset()).await?;
        debug!(count = shifts.len(), page = paging.page(), "listed shifts");
        Ok(shifts)
    }

    #[instrument(skip(self), fields(worksite_id = %worksite_id), err)]
    pub async fn list_by_worksite(
        &self,
        worksite_id: &WorksiteId,
        page: i64,
        per_page: i64,
    ) -> LifecycleResult<Vec<Shift>> {
        let paging = PageRequest::new(page, per_page);
        let shifts = self
            .store
            .list_by_worksite(worksite_id, paging.limit(), paging.offset())
            .await?;
        debug!(count = shifts.len(), page = paging.page(), "listed shifts for worksite");
        Ok(shifts)
    }

    #[instrument(skip(self), fields(status = %status), err)]
    pub async fn list_by_status(
        &self,
        status: ShiftStatus,
        page: i64,
        per_page: i64,
    ) -> LifecycleResult<Vec<Shift>> {
        let paging = PageRequest::new(page, per_page);
        let shifts = self
            .store
            .list_by_status(status, paging.limit(), paging.offset())
            .await?;
        debug!(count = shifts.len(), page = paging.page(), "listed shifts by status");
        Ok(shifts)
    }

    #[instrument(skip(self), fields(shift_id = %id), err)]
    pub async fn get_by_id(&self, id: &ShiftId) -> LifecycleResult<Shift> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(Shift::NAME))
    }

    /// Validate and store a new shift. Status defaults to `open`.
    #[instrument(skip(self, shift), fields(worksite_id = %shift.worksite_id), err)]
    pub async fn create(&self, shift: NewShift) -> LifecycleResult<Shift> {
        shift.validate()?;

        let created = self.store.create(shift).await?;
        info!(shift_id = %created.id, status = %created.status, "shift created");
        Ok(created)
    }

    /// Replace every mutable field of an existing shift.
    ///
    /// This is the administrative path: `status` is written as given without
    /// consulting the transition table.
    #[instrument(skip(self, shift), fields(shift_id = %shift.id), err)]
    pub async fn update(&self, shift: Shift) -> LifecycleResult<Shift> {
        shift.validate()?;

        let current = self.get_by_id(&shift.id).await?;
        if current.status != shift.status {
            warn!(
                from = %current.status,
                to = %shift.status,
                "shift status overridden by full update"
            );
        }

        let updated = self
            .store
            .update(&shift)
            .await?
            .ok_or_else(|| LifecycleError::not_found(Shift::NAME))?;
        info!(status = %updated.status, "shift updated");
        Ok(updated)
    }

    /// Move a shift to `next` if the transition table allows it.
    #[instrument(skip(self), fields(shift_id = %id, next = %next), err)]
    pub async fn update_status(&self, id: &ShiftId, next: ShiftStatus) -> LifecycleResult<Shift> {
        let current = self.get_by_id(id).await?;
        current.status.transition_to(next)?;

        if current.status == ShiftStatus::Completed && next == ShiftStatus::Cancelled {
            warn!("cancelling a completed shift");
        }

        match self.store.update_status(id, current.status, next).await? {
            Some(updated) => {
                info!(from = %current.status, to = %updated.status, "shift status changed");
                Ok(updated)
            }
            None => self.lost_swap(id, current.status, next).await,
        }
    }

    #[instrument(skip(self), fields(shift_id = %id), err)]
    pub async fn delete(&self, id: &ShiftId) -> LifecycleResult<()> {
        if !self.store.delete(id).await? {
            return Err(LifecycleError::not_found(Shift::NAME));
        }
        info!("shift deleted");
        Ok(())
    }

    /// Explain a compare-and-swap that wrote nothing.
    ///
    /// A rival writer that already reached `next` by an allowed move (only
    /// `cancelled → cancelled`) leaves nothing to report; the row is returned.
    async fn lost_swap(
        &self,
        id: &ShiftId,
        expected: ShiftStatus,
        next: ShiftStatus,
    ) -> LifecycleResult<Shift> {
        let Some(actual) = self.store.get_by_id(id).await? else {
            return Err(LifecycleError::not_found(Shift::NAME));
        };
        if actual.status == next && actual.status.can_transition_to(next) {
            debug!(status = %actual.status, "shift already moved to the requested status");
            return Ok(actual);
        }
        warn!(expected = %expected, actual = %actual.status, "shift status changed concurrently");
        Err(LifecycleError::Conflict(format!(
            "shift {id} was {expected} when read but is now {}",
            actual.status
        )))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::*;
    use crate::store::InMemoryShiftStore;

    fn engine() -> ShiftLifecycle<InMemoryShiftStore> {
        ShiftLifecycle::new(InMemoryShiftStore::new())
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T22:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn shift_at(worksite: &str, hours_from_t0: i64) -> NewShift {
        let start = t0() + Duration::hours(hours_from_t0);
        NewShift::new(WorksiteId::new(worksite), "Patrol", start, start + Duration::hours(4))
    }

    #[tokio::test]
    async fn create_rejects_invalid_input_without_storing() {
        let engine = engine();

        let mut backwards = shift_at("ws-1", 0);
        backwards.end_time = backwards.start_time;
        let err = engine.create(backwards).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));

        let mut untitled = shift_at("ws-1", 0);
        untitled.title = String::new();
        assert_eq!(engine.create(untitled).await.unwrap_err().code(), "validation_error");

        let no_site = shift_at("", 0);
        assert_eq!(engine.create(no_site).await.unwrap_err().code(), "validation_error");

        assert!(engine.store().is_empty());
    }

    #[tokio::test]
    async fn create_honours_a_supplied_status() {
        let engine = engine();
        let mut shift = shift_at("ws-1", 0);
        shift.status = Some(ShiftStatus::Assigned);

        let created = engine.create(shift).await.unwrap();
        assert_eq!(created.status, ShiftStatus::Assigned);
    }

    #[tokio::test]
    async fn get_and_delete_report_missing_shifts() {
        let engine = engine();
        let missing = ShiftId::new("nope");

        assert!(matches!(
            engine.get_by_id(&missing).await,
            Err(LifecycleError::NotFound(entity)) if entity == "shift"
        ));
        assert!(matches!(engine.delete(&missing).await, Err(LifecycleError::NotFound(_))));

        let created = engine.create(shift_at("ws-1", 0)).await.unwrap();
        engine.delete(&created.id).await.unwrap();
        assert!(engine.get_by_id(&created.id).await.is_err());
    }

    #[tokio::test]
    async fn update_status_walks_the_table() {
        let engine = engine();
        let shift = engine.create(shift_at("ws-1", 0)).await.unwrap();

        for next in [ShiftStatus::Assigned, ShiftStatus::InProgress, ShiftStatus::Completed] {
            let updated = engine.update_status(&shift.id, next).await.unwrap();
            assert_eq!(updated.status, next);
        }

        let cancelled = engine
            .update_status(&shift.id, ShiftStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, ShiftStatus::Cancelled);

        // idempotent
        engine
            .update_status(&shift.id, ShiftStatus::Cancelled)
            .await
            .unwrap();

        let err = engine
            .update_status(&shift.id, ShiftStatus::Open)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid shift status transition from cancelled to open"
        );
    }

    #[tokio::test]
    async fn update_status_cannot_skip_steps() {
        let engine = engine();
        let shift = engine.create(shift_at("ws-1", 0)).await.unwrap();

        let err = engine
            .update_status(&shift.id, ShiftStatus::InProgress)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidTransition { entity: "shift", ref from, ref to }
                if from == "open" && to == "in_progress"
        ));
        assert_eq!(
            engine.get_by_id(&shift.id).await.unwrap().status,
            ShiftStatus::Open
        );
    }

    #[tokio::test]
    async fn assigned_shift_cannot_jump_to_completed() {
        let engine = engine();
        let shift = engine.create(shift_at("ws-1", 0)).await.unwrap();
        engine
            .update_status(&shift.id, ShiftStatus::Assigned)
            .await
            .unwrap();

        let err = engine
            .update_status(&shift.id, ShiftStatus::Completed)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid shift status transition from assigned to completed"
        );
        assert_eq!(
            engine.get_by_id(&shift.id).await.unwrap().status,
            ShiftStatus::Assigned
        );
    }

    #[tokio::test]
    async fn update_status_of_missing_shift_is_not_found() {
        let err = engine()
            .update_status(&ShiftId::new("missing"), ShiftStatus::Cancelled)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn listings_are_paged_and_filtered() {
        let engine = engine();
        for hour in 0..3 {
            engine.create(shift_at("ws-1", hour)).await.unwrap();
        }
        let other = engine.create(shift_at("ws-2", 10)).await.unwrap();
        engine
            .update_status(&other.id, ShiftStatus::Cancelled)
            .await
            .unwrap();

        let first = engine.list(1, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, other.id);
        assert_eq!(engine.list(2, 2).await.unwrap().len(), 2);
        assert!(engine.list(3, 2).await.unwrap().is_empty());

        let site = engine
            .list_by_worksite(&WorksiteId::new("ws-1"), 1, 25)
            .await
            .unwrap();
        assert_eq!(site.len(), 3);
        assert!(site.windows(2).all(|w| w[0].start_time >= w[1].start_time));

        let cancelled = engine
            .list_by_status(ShiftStatus::Cancelled, 0, 0)
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);
        assert!(engine
            .list_by_status(ShiftStatus::InProgress, 1, 25)
            .await
            .unwrap()
            .is_empty());
    }
}
