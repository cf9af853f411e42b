//! In-memory stores for tests/dev.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use sitesecurity_core::{Entity, WorkerId, WorksiteId};
use sitesecurity_shifts::{
    AssignmentId, AssignmentStatus, NewAssignment, NewShift, Shift, ShiftAssignment, ShiftId,
    ShiftStatus,
};

use super::{AssignmentStore, ShiftStore, StoreError, StoreResult};

/// A stored record plus its insertion sequence (tie-breaker for equal timestamps).
#[derive(Debug, Clone)]
struct Row<E> {
    seq: u64,
    record: E,
}

#[derive(Debug)]
struct TableInner<E: Entity> {
    rows: HashMap<E::Id, Row<E>>,
    next_seq: u64,
}

/// Entity table keyed by `Entity::id`, guarded by a single `RwLock`.
#[derive(Debug)]
struct Table<E: Entity> {
    inner: RwLock<TableInner<E>>,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(TableInner {
                rows: HashMap::new(),
                next_seq: 0,
            }),
        }
    }
}

impl<E> Table<E>
where
    E: Entity + Clone,
{
    fn read(&self) -> StoreResult<RwLockReadGuard<'_, TableInner<E>>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, TableInner<E>>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn insert(&self, record: E) -> StoreResult<E> {
        let mut table = self.write()?;
        if table.rows.contains_key(record.id()) {
            return Err(StoreError::Constraint(format!(
                "duplicate {} id {:?}",
                E::NAME,
                record.id()
            )));
        }
        table.next_seq += 1;
        let seq = table.next_seq;
        table.rows.insert(
            record.id().clone(),
            Row {
                seq,
                record: record.clone(),
            },
        );
        Ok(record)
    }

    fn get(&self, id: &E::Id) -> StoreResult<Option<E>> {
        Ok(self.read()?.rows.get(id).map(|row| row.record.clone()))
    }

    /// Matching rows, unordered.
    fn select(&self, filter: impl Fn(&E) -> bool) -> StoreResult<Vec<Row<E>>> {
        Ok(self
            .read()?
            .rows
            .values()
            .filter(|row| filter(&row.record))
            .cloned()
            .collect())
    }

    /// Apply `change` under the write lock; it returns `false` to leave the row alone.
    fn modify(&self, id: &E::Id, change: impl FnOnce(&mut E) -> bool) -> StoreResult<Option<E>> {
        let mut table = self.write()?;
        let Some(row) = table.rows.get_mut(id) else {
            return Ok(None);
        };
        let mut candidate = row.record.clone();
        if !change(&mut candidate) {
            return Ok(None);
        }
        row.record = candidate.clone();
        Ok(Some(candidate))
    }

    fn remove(&self, id: &E::Id) -> StoreResult<bool> {
        Ok(self.write()?.rows.remove(id).is_some())
    }

    fn len(&self) -> usize {
        self.read().map(|t| t.rows.len()).unwrap_or(0)
    }
}

/// In-memory shift store.
#[derive(Debug, Default)]
pub struct InMemoryShiftStore {
    shifts: Table<Shift>,
}

impl InMemoryShiftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn page(&self, filter: impl Fn(&Shift) -> bool, limit: u32, offset: u64) -> StoreResult<Vec<Shift>> {
        let mut rows = self.shifts.select(filter)?;
        rows.sort_by(|a, b| {
            b.record
                .start_time
                .cmp(&a.record.start_time)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .map(|row| row.record)
            .collect())
    }
}

#[async_trait]
impl ShiftStore for InMemoryShiftStore {
    async fn list(&self, limit: u32, offset: u64) -> StoreResult<Vec<Shift>> {
        self.page(|_| true, limit, offset)
    }

    async fn list_by_worksite(
        &self,
        worksite_id: &WorksiteId,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Shift>> {
        self.page(|s| &s.worksite_id == worksite_id, limit, offset)
    }

    async fn list_by_status(
        &self,
        status: ShiftStatus,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Shift>> {
        self.page(|s| s.status == status, limit, offset)
    }

    async fn get_by_id(&self, id: &ShiftId) -> StoreResult<Option<Shift>> {
        self.shifts.get(id)
    }

    async fn create(&self, shift: NewShift) -> StoreResult<Shift> {
        let now = Utc::now();
        let status = shift.initial_status();
        self.shifts.insert(Shift {
            id: ShiftId::generate(),
            worksite_id: shift.worksite_id,
            created_by: shift.created_by,
            title: shift.title,
            description: shift.description,
            start_time: shift.start_time,
            end_time: shift.end_time,
            status,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, shift: &Shift) -> StoreResult<Option<Shift>> {
        self.shifts.modify(&shift.id, |stored| {
            stored.worksite_id = shift.worksite_id.clone();
            stored.title = shift.title.clone();
            stored.description = shift.description.clone();
            stored.start_time = shift.start_time;
            stored.end_time = shift.end_time;
            stored.status = shift.status;
            stored.updated_at = Utc::now();
            true
        })
    }

    async fn update_status(
        &self,
        id: &ShiftId,
        expected: ShiftStatus,
        next: ShiftStatus,
    ) -> StoreResult<Option<Shift>> {
        self.shifts.modify(id, |stored| {
            if stored.status != expected {
                return false;
            }
            stored.status = next;
            stored.updated_at = Utc::now();
            true
        })
    }

    async fn delete(&self, id: &ShiftId) -> StoreResult<bool> {
        self.shifts.remove(id)
    }
}

/// In-memory assignment store.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    assignments: Table<ShiftAssignment>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn newest_first(&self, filter: impl Fn(&ShiftAssignment) -> bool) -> StoreResult<Vec<ShiftAssignment>> {
        let mut rows = self.assignments.select(filter)?;
        rows.sort_by(|a, b| {
            b.record
                .assigned_at
                .cmp(&a.record.assigned_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(rows.into_iter().map(|row| row.record).collect())
    }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn list_by_shift(&self, shift_id: &ShiftId) -> StoreResult<Vec<ShiftAssignment>> {
        self.newest_first(|a| &a.shift_id == shift_id)
    }

    async fn list_by_worker(&self, worker_id: &WorkerId) -> StoreResult<Vec<ShiftAssignment>> {
        self.newest_first(|a| &a.worker_id == worker_id)
    }

    async fn get_by_id(&self, id: &AssignmentId) -> StoreResult<Option<ShiftAssignment>> {
        self.assignments.get(id)
    }

    async fn get(
        &self,
        shift_id: &ShiftId,
        worker_id: &WorkerId,
    ) -> StoreResult<Option<ShiftAssignment>> {
        Ok(self
            .newest_first(|a| &a.shift_id == shift_id && &a.worker_id == worker_id)?
            .into_iter()
            .next())
    }

    async fn create(&self, assignment: NewAssignment) -> StoreResult<ShiftAssignment> {
        let status = assignment.initial_status();
        self.assignments.insert(ShiftAssignment {
            id: AssignmentId::generate(),
            shift_id: assignment.shift_id,
            worker_id: assignment.worker_id,
            status,
            assigned_at: Utc::now(),
            responded_at: None,
        })
    }

    async fn update_status(
        &self,
        id: &AssignmentId,
        expected: AssignmentStatus,
        next: AssignmentStatus,
    ) -> StoreResult<Option<ShiftAssignment>> {
        self.assignments.modify(id, |stored| {
            if stored.status != expected {
                return false;
            }
            stored.status = next;
            stored.responded_at = Some(Utc::now());
            true
        })
    }

    async fn delete(&self, id: &AssignmentId) -> StoreResult<bool> {
        self.assignments.remove(id)
    }
}
