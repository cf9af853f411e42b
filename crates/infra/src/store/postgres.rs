//! Postgres-backed stores.
//!
//! Schema lives in `crates/infra/migrations`. Identifiers are UUID columns; ids
//! that do not parse as UUIDs cannot exist in the table, so lookups with them
//! report "absent" rather than failing.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique / FK / check violation) | `23505` / `23503` / `23514` | `Constraint` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / PoolTimedOut / Io / Tls | N/A | `Unavailable` |
//! | ColumnDecode / Decode / ColumnNotFound | N/A | `Decode` |
//! | Other | N/A | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use sitesecurity_core::{UserId, WorkerId, WorksiteId};
use sitesecurity_shifts::{
    AssignmentId, AssignmentStatus, NewAssignment, NewShift, Shift, ShiftAssignment, ShiftId,
    ShiftStatus,
};

use super::{AssignmentStore, ShiftStore, StoreError, StoreResult};

const SHIFT_COLUMNS: &str = "id, worksite_id, created_by, title, description, start_time, end_time, status, created_at, updated_at";

const ASSIGNMENT_COLUMNS: &str = "id, shift_id, worker_id, status, assigned_at, responded_at";

/// Postgres-backed shift store.
#[derive(Debug, Clone)]
pub struct PostgresShiftStore {
    pool: Arc<PgPool>,
}

impl PostgresShiftStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn fetch_page(
        &self,
        operation: &str,
        sql: &str,
        filter: Option<FilterValue<'_>>,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Shift>> {
        let mut query = sqlx::query(sql);
        match filter {
            Some(FilterValue::Uuid(id)) => query = query.bind(id),
            Some(FilterValue::Text(text)) => query = query.bind(text),
            None => {}
        }
        let rows = query
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        decode_rows::<ShiftRow, Shift>(&rows)
    }
}

enum FilterValue<'a> {
    Uuid(Uuid),
    Text(&'a str),
}

#[async_trait]
impl ShiftStore for PostgresShiftStore {
    #[instrument(skip(self), err)]
    async fn list(&self, limit: u32, offset: u64) -> StoreResult<Vec<Shift>> {
        let sql = format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts ORDER BY start_time DESC, id DESC LIMIT $1 OFFSET $2"
        );
        self.fetch_page("list_shifts", &sql, None, limit, offset).await
    }

    #[instrument(skip(self), fields(worksite_id = %worksite_id), err)]
    async fn list_by_worksite(
        &self,
        worksite_id: &WorksiteId,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Shift>> {
        let Some(worksite_uuid) = parse_uuid(worksite_id.as_str()) else {
            return Ok(vec![]);
        };
        let sql = format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE worksite_id = $1 \
             ORDER BY start_time DESC, id DESC LIMIT $2 OFFSET $3"
        );
        self.fetch_page(
            "list_shifts_by_worksite",
            &sql,
            Some(FilterValue::Uuid(worksite_uuid)),
            limit,
            offset,
        )
        .await
    }

    #[instrument(skip(self), fields(status = %status), err)]
    async fn list_by_status(
        &self,
        status: ShiftStatus,
        limit: u32,
        offset: u64,
    ) -> StoreResult<Vec<Shift>> {
        let sql = format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE status = $1 \
             ORDER BY start_time DESC, id DESC LIMIT $2 OFFSET $3"
        );
        self.fetch_page(
            "list_shifts_by_status",
            &sql,
            Some(FilterValue::Text(status.as_str())),
            limit,
            offset,
        )
        .await
    }

    #[instrument(skip(self), fields(shift_id = %id), err)]
    async fn get_by_id(&self, id: &ShiftId) -> StoreResult<Option<Shift>> {
        let Some(uuid) = parse_uuid(id.as_str()) else {
            return Ok(None);
        };
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(uuid)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_shift", e))?;

        row.as_ref().map(decode_row::<ShiftRow, Shift>).transpose()
    }

    #[instrument(skip(self, shift), fields(worksite_id = %shift.worksite_id), err)]
    async fn create(&self, shift: NewShift) -> StoreResult<Shift> {
        let worksite_uuid = require_uuid("worksite_id", shift.worksite_id.as_str())?;
        let created_by = shift
            .created_by
            .as_ref()
            .map(|u| require_uuid("created_by", u.as_str()))
            .transpose()?;
        let status = shift.initial_status();

        let sql = format!(
            "INSERT INTO shifts (id, worksite_id, created_by, title, description, start_time, end_time, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {SHIFT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::now_v7())
            .bind(worksite_uuid)
            .bind(created_by)
            .bind(&shift.title)
            .bind(&shift.description)
            .bind(shift.start_time)
            .bind(shift.end_time)
            .bind(status.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_shift", e))?;

        decode_row::<ShiftRow, Shift>(&row)
    }

    #[instrument(skip(self, shift), fields(shift_id = %shift.id), err)]
    async fn update(&self, shift: &Shift) -> StoreResult<Option<Shift>> {
        let Some(uuid) = parse_uuid(shift.id.as_str()) else {
            return Ok(None);
        };
        let worksite_uuid = require_uuid("worksite_id", shift.worksite_id.as_str())?;

        let sql = format!(
            "UPDATE shifts SET worksite_id = $2, title = $3, description = $4, start_time = $5, \
             end_time = $6, status = $7, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {SHIFT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(uuid)
            .bind(worksite_uuid)
            .bind(&shift.title)
            .bind(&shift.description)
            .bind(shift.start_time)
            .bind(shift.end_time)
            .bind(shift.status.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_shift", e))?;

        row.as_ref().map(decode_row::<ShiftRow, Shift>).transpose()
    }

    #[instrument(skip(self), fields(shift_id = %id, expected = %expected, next = %next), err)]
    async fn update_status(
        &self,
        id: &ShiftId,
        expected: ShiftStatus,
        next: ShiftStatus,
    ) -> StoreResult<Option<Shift>> {
        let Some(uuid) = parse_uuid(id.as_str()) else {
            return Ok(None);
        };
        let sql = format!(
            "UPDATE shifts SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {SHIFT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(uuid)
            .bind(expected.as_str())
            .bind(next.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_shift_status", e))?;

        row.as_ref().map(decode_row::<ShiftRow, Shift>).transpose()
    }

    #[instrument(skip(self), fields(shift_id = %id), err)]
    async fn delete(&self, id: &ShiftId) -> StoreResult<bool> {
        let Some(uuid) = parse_uuid(id.as_str()) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM shifts WHERE id = $1")
            .bind(uuid)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_shift", e))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Postgres-backed assignment store.
#[derive(Debug, Clone)]
pub struct PostgresAssignmentStore {
    pool: Arc<PgPool>,
}

impl PostgresAssignmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn fetch_by(&self, operation: &str, column: &str, id: Uuid) -> StoreResult<Vec<ShiftAssignment>> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments WHERE {column} = $1 \
             ORDER BY assigned_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        decode_rows::<AssignmentRow, ShiftAssignment>(&rows)
    }
}

#[async_trait]
impl AssignmentStore for PostgresAssignmentStore {
    #[instrument(skip(self), fields(shift_id = %shift_id), err)]
    async fn list_by_shift(&self, shift_id: &ShiftId) -> StoreResult<Vec<ShiftAssignment>> {
        match parse_uuid(shift_id.as_str()) {
            Some(uuid) => self.fetch_by("list_assignments_by_shift", "shift_id", uuid).await,
            None => Ok(vec![]),
        }
    }

    #[instrument(skip(self), fields(worker_id = %worker_id), err)]
    async fn list_by_worker(&self, worker_id: &WorkerId) -> StoreResult<Vec<ShiftAssignment>> {
        match parse_uuid(worker_id.as_str()) {
            Some(uuid) => self.fetch_by("list_assignments_by_worker", "worker_id", uuid).await,
            None => Ok(vec![]),
        }
    }

    #[instrument(skip(self), fields(assignment_id = %id), err)]
    async fn get_by_id(&self, id: &AssignmentId) -> StoreResult<Option<ShiftAssignment>> {
        let Some(uuid) = parse_uuid(id.as_str()) else {
            return Ok(None);
        };
        let sql = format!("SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(uuid)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_assignment", e))?;

        row.as_ref()
            .map(decode_row::<AssignmentRow, ShiftAssignment>)
            .transpose()
    }

    #[instrument(skip(self), fields(shift_id = %shift_id, worker_id = %worker_id), err)]
    async fn get(
        &self,
        shift_id: &ShiftId,
        worker_id: &WorkerId,
    ) -> StoreResult<Option<ShiftAssignment>> {
        let (Some(shift_uuid), Some(worker_uuid)) =
            (parse_uuid(shift_id.as_str()), parse_uuid(worker_id.as_str()))
        else {
            return Ok(None);
        };
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM shift_assignments \
             WHERE shift_id = $1 AND worker_id = $2 \
             ORDER BY assigned_at DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(shift_uuid)
            .bind(worker_uuid)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_assignment_for_worker", e))?;

        row.as_ref()
            .map(decode_row::<AssignmentRow, ShiftAssignment>)
            .transpose()
    }

    #[instrument(skip(self, assignment), fields(shift_id = %assignment.shift_id, worker_id = %assignment.worker_id), err)]
    async fn create(&self, assignment: NewAssignment) -> StoreResult<ShiftAssignment> {
        let shift_uuid = require_uuid("shift_id", assignment.shift_id.as_str())?;
        let worker_uuid = require_uuid("worker_id", assignment.worker_id.as_str())?;
        let status = assignment.initial_status();

        let sql = format!(
            "INSERT INTO shift_assignments (id, shift_id, worker_id, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::now_v7())
            .bind(shift_uuid)
            .bind(worker_uuid)
            .bind(status.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_assignment", e))?;

        decode_row::<AssignmentRow, ShiftAssignment>(&row)
    }

    #[instrument(skip(self), fields(assignment_id = %id, expected = %expected, next = %next), err)]
    async fn update_status(
        &self,
        id: &AssignmentId,
        expected: AssignmentStatus,
        next: AssignmentStatus,
    ) -> StoreResult<Option<ShiftAssignment>> {
        let Some(uuid) = parse_uuid(id.as_str()) else {
            return Ok(None);
        };
        let sql = format!(
            "UPDATE shift_assignments \
             SET status = $3, responded_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(uuid)
            .bind(expected.as_str())
            .bind(next.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_assignment_status", e))?;

        row.as_ref()
            .map(decode_row::<AssignmentRow, ShiftAssignment>)
            .transpose()
    }

    #[instrument(skip(self), fields(assignment_id = %id), err)]
    async fn delete(&self, id: &AssignmentId) -> StoreResult<bool> {
        let Some(uuid) = parse_uuid(id.as_str()) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM shift_assignments WHERE id = $1")
            .bind(uuid)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_assignment", e))?;

        Ok(result.rows_affected() > 0)
    }
}

fn parse_uuid(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}

/// Reference columns must hold UUIDs; anything else can never satisfy the schema.
fn require_uuid(column: &str, id: &str) -> StoreResult<Uuid> {
    parse_uuid(id).ok_or_else(|| StoreError::Constraint(format!("{column} '{id}' is not a valid uuid")))
}

fn decode_row<R, T>(row: &PgRow) -> StoreResult<T>
where
    R: for<'r> FromRow<'r, PgRow>,
    T: TryFrom<R, Error = StoreError>,
{
    let raw = R::from_row(row).map_err(|e| StoreError::Decode(e.to_string()))?;
    T::try_from(raw)
}

fn decode_rows<R, T>(rows: &[PgRow]) -> StoreResult<Vec<T>>
where
    R: for<'r> FromRow<'r, PgRow>,
    T: TryFrom<R, Error = StoreError>,
{
    rows.iter().map(decode_row::<R, T>).collect()
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // unique, foreign key, check
                Some("23505") | Some("23503") | Some("23514") => StoreError::Constraint(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}: {err}"))
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            StoreError::Unavailable(format!("connection failed in {operation}: {err}"))
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Decode(format!("{operation}: {err}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

// SQLx row types

#[derive(Debug)]
struct ShiftRow {
    id: Uuid,
    worksite_id: Uuid,
    created_by: Option<Uuid>,
    title: String,
    description: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ShiftRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ShiftRow {
            id: row.try_get("id")?,
            worksite_id: row.try_get("worksite_id")?,
            created_by: row.try_get("created_by")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ShiftRow> for Shift {
    type Error = StoreError;

    fn try_from(row: ShiftRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ShiftStatus>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(Shift {
            id: ShiftId::new(row.id.to_string()),
            worksite_id: WorksiteId::new(row.worksite_id.to_string()),
            created_by: row.created_by.map(|u| UserId::new(u.to_string())),
            title: row.title,
            description: row.description,
            start_time: row.start_time,
            end_time: row.end_time,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct AssignmentRow {
    id: Uuid,
    shift_id: Uuid,
    worker_id: Uuid,
    status: String,
    assigned_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, PgRow> for AssignmentRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AssignmentRow {
            id: row.try_get("id")?,
            shift_id: row.try_get("shift_id")?,
            worker_id: row.try_get("worker_id")?,
            status: row.try_get("status")?,
            assigned_at: row.try_get("assigned_at")?,
            responded_at: row.try_get("responded_at")?,
        })
    }
}

impl TryFrom<AssignmentRow> for ShiftAssignment {
    type Error = StoreError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<AssignmentStatus>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(ShiftAssignment {
            id: AssignmentId::new(row.id.to_string()),
            shift_id: ShiftId::new(row.shift_id.to_string()),
            worker_id: WorkerId::new(row.worker_id.to_string()),
            status,
            assigned_at: row.assigned_at,
            responded_at: row.responded_at,
        })
    }
}
