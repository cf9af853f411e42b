use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use sitesecurity_core::{DomainError, DomainResult, Entity, UserId, ValueObject, WorksiteId, opaque_id};

opaque_id!(
    /// Shift identifier (assigned by the store on create).
    ShiftId,
    "ShiftId"
);

/// Shift status lifecycle.
///
/// Progression is strictly single-step `open → assigned → in_progress → completed`.
/// `cancelled` is reachable from every state, including itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    #[default]
    Open,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl ShiftStatus {
    pub const ALL: [ShiftStatus; 5] = [
        ShiftStatus::Open,
        ShiftStatus::Assigned,
        ShiftStatus::InProgress,
        ShiftStatus::Completed,
        ShiftStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Open => "open",
            ShiftStatus::Assigned => "assigned",
            ShiftStatus::InProgress => "in_progress",
            ShiftStatus::Completed => "completed",
            ShiftStatus::Cancelled => "cancelled",
        }
    }

    /// The transition table: every status reachable in one step from `self`.
    pub fn allowed_next(self) -> &'static [ShiftStatus] {
        match self {
            ShiftStatus::Open => &[ShiftStatus::Assigned, ShiftStatus::Cancelled],
            ShiftStatus::Assigned => &[ShiftStatus::InProgress, ShiftStatus::Cancelled],
            ShiftStatus::InProgress => &[ShiftStatus::Completed, ShiftStatus::Cancelled],
            ShiftStatus::Completed => &[ShiftStatus::Cancelled],
            ShiftStatus::Cancelled => &[ShiftStatus::Cancelled],
        }
    }

    pub fn can_transition_to(self, next: ShiftStatus) -> bool {
        // Cancellation is the global escape transition.
        next == ShiftStatus::Cancelled || self.allowed_next().contains(&next)
    }

    /// Check `self → next` against the transition table.
    pub fn transition_to(self, next: ShiftStatus) -> DomainResult<ShiftStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::invalid_transition(Shift::NAME, self, next))
        }
    }
}

impl core::fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ShiftStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(ShiftStatus::Open),
            "assigned" => Ok(ShiftStatus::Assigned),
            "in_progress" => Ok(ShiftStatus::InProgress),
            "completed" => Ok(ShiftStatus::Completed),
            "cancelled" => Ok(ShiftStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown shift status '{other}' (expected one of: open, assigned, in_progress, completed, cancelled)"
            ))),
        }
    }
}

/// The scheduled period of a shift. Start strictly precedes end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ValueObject for ShiftWindow {}

impl ShiftWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Self> {
        if start >= end {
            return Err(DomainError::validation("start_time must be before end_time"));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Field rules shared by create and full update.
fn validate_details(
    title: &str,
    worksite_id: &WorksiteId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> DomainResult<ShiftWindow> {
    if title.is_empty() {
        return Err(DomainError::validation("shift title is required"));
    }
    if worksite_id.is_blank() {
        return Err(DomainError::validation("worksite_id is required"));
    }
    ShiftWindow::new(start_time, end_time)
}

/// A stored shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub worksite_id: WorksiteId,
    pub created_by: Option<UserId>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ShiftStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Shift {
    const NAME: &'static str = "shift";

    type Id = ShiftId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Shift {
    /// Validate the mutable fields (title, worksite, time range).
    pub fn validate(&self) -> DomainResult<ShiftWindow> {
        validate_details(&self.title, &self.worksite_id, self.start_time, self.end_time)
    }
}

/// Input for creating a shift. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShift {
    pub worksite_id: WorksiteId,
    #[serde(default)]
    pub created_by: Option<UserId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Unset means `open`.
    #[serde(default)]
    pub status: Option<ShiftStatus>,
}

impl NewShift {
    pub fn new(
        worksite_id: WorksiteId,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            worksite_id,
            created_by: None,
            title: title.into(),
            description: None,
            start_time,
            end_time,
            status: None,
        }
    }

    pub fn validate(&self) -> DomainResult<ShiftWindow> {
        validate_details(&self.title, &self.worksite_id, self.start_time, self.end_time)
    }

    /// The status the shift is created with.
    pub fn initial_status(&self) -> ShiftStatus {
        self.status.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T22:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn night_watch() -> NewShift {
        NewShift::new(WorksiteId::new("ws-1"), "Night Watch", t0(), t0() + Duration::hours(8))
    }

    fn any_status() -> impl Strategy<Value = ShiftStatus> {
        prop::sample::select(ShiftStatus::ALL.to_vec())
    }

    #[test]
    fn forward_progression_is_single_step() {
        use ShiftStatus::*;
        assert!(Open.can_transition_to(Assigned));
        assert!(Assigned.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));

        assert!(!Open.can_transition_to(InProgress));
        assert!(!Open.can_transition_to(Completed));
        assert!(!Assigned.can_transition_to(Completed));
    }

    #[test]
    fn backward_moves_are_rejected() {
        use ShiftStatus::*;
        assert!(!Assigned.can_transition_to(Open));
        assert!(!InProgress.can_transition_to(Assigned));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Cancelled.can_transition_to(Open));
    }

    #[test]
    fn cancelled_is_idempotent_and_final() {
        assert_eq!(
            ShiftStatus::Cancelled.allowed_next(),
            &[ShiftStatus::Cancelled]
        );
        assert!(ShiftStatus::Completed.can_transition_to(ShiftStatus::Cancelled));
    }

    #[test]
    fn transition_error_carries_both_statuses() {
        let err = ShiftStatus::Open
            .transition_to(ShiftStatus::InProgress)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                entity: "shift",
                from: "open".to_string(),
                to: "in_progress".to_string(),
            }
        );
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in ShiftStatus::ALL {
            assert_eq!(status.as_str().parse::<ShiftStatus>().unwrap(), status);
        }
        assert!("done".parse::<ShiftStatus>().is_err());
    }

    #[test]
    fn new_shift_defaults_to_open() {
        assert_eq!(night_watch().initial_status(), ShiftStatus::Open);

        let mut supplied = night_watch();
        supplied.status = Some(ShiftStatus::Assigned);
        assert_eq!(supplied.initial_status(), ShiftStatus::Assigned);
    }

    #[test]
    fn validation_rejects_empty_title_and_worksite() {
        let mut shift = night_watch();
        shift.title = String::new();
        assert_eq!(
            shift.validate().unwrap_err(),
            DomainError::validation("shift title is required")
        );

        let mut shift = night_watch();
        shift.worksite_id = WorksiteId::new("");
        assert_eq!(
            shift.validate().unwrap_err(),
            DomainError::validation("worksite_id is required")
        );
    }

    #[test]
    fn whitespace_title_is_kept_as_given() {
        let mut shift = night_watch();
        shift.title = "  ".to_string();
        assert!(shift.validate().is_ok());
        assert_eq!(shift.title, "  ");
    }

    #[test]
    fn window_requires_start_before_end() {
        assert!(ShiftWindow::new(t0(), t0()).is_err());
        assert!(ShiftWindow::new(t0() + Duration::minutes(1), t0()).is_err());

        let window = night_watch().validate().unwrap();
        assert_eq!(window.duration(), Duration::hours(8));
    }

    #[test]
    fn new_shift_deserializes_from_camel_case_json() {
        let json = serde_json::json!({
            "worksiteId": "ws-1",
            "title": "Night Watch",
            "startTime": "2026-03-01T22:00:00Z",
            "endTime": "2026-03-02T06:00:00Z"
        });
        let shift: NewShift = serde_json::from_value(json).unwrap();
        assert_eq!(shift, night_watch());
    }

    proptest! {
        #[test]
        fn cancelled_is_reachable_from_every_status(from in any_status()) {
            prop_assert_eq!(from.transition_to(ShiftStatus::Cancelled), Ok(ShiftStatus::Cancelled));
        }

        #[test]
        fn transition_succeeds_iff_listed_in_table(from in any_status(), to in any_status()) {
            let listed = from.allowed_next().contains(&to);
            prop_assert_eq!(from.transition_to(to).is_ok(), listed || to == ShiftStatus::Cancelled);
        }

        #[test]
        fn non_chronological_windows_never_validate(
            start_offset in 0i64..100_000,
            back in 0i64..100_000,
        ) {
            let start = t0() + Duration::seconds(start_offset);
            let end = start - Duration::seconds(back);
            let mut shift = night_watch();
            shift.start_time = start;
            shift.end_time = end;
            prop_assert!(matches!(shift.validate(), Err(DomainError::Validation(_))));
        }
    }
}
