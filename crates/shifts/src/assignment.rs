use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sitesecurity_core::{DomainError, DomainResult, Entity, WorkerId, opaque_id};

use crate::shift::ShiftId;

opaque_id!(
    /// Assignment (offer) identifier.
    AssignmentId,
    "AssignmentId"
);

/// Offer lifecycle: `offered → accepted → completed`, or `offered → declined`.
///
/// A declined offer is never reopened; offering the shift again creates a new
/// assignment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    Offered,
    Accepted,
    Declined,
    Completed,
}

impl AssignmentStatus {
    pub const ALL: [AssignmentStatus; 4] = [
        AssignmentStatus::Offered,
        AssignmentStatus::Accepted,
        AssignmentStatus::Declined,
        AssignmentStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Offered => "offered",
            AssignmentStatus::Accepted => "accepted",
            AssignmentStatus::Declined => "declined",
            AssignmentStatus::Completed => "completed",
        }
    }

    pub fn allowed_next(self) -> &'static [AssignmentStatus] {
        match self {
            AssignmentStatus::Offered => &[AssignmentStatus::Accepted, AssignmentStatus::Declined],
            AssignmentStatus::Accepted => &[AssignmentStatus::Completed],
            AssignmentStatus::Declined | AssignmentStatus::Completed => &[],
        }
    }

    pub fn can_transition_to(self, next: AssignmentStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn transition_to(self, next: AssignmentStatus) -> DomainResult<AssignmentStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::invalid_transition(ShiftAssignment::NAME, self, next))
        }
    }
}

impl core::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AssignmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offered" => Ok(AssignmentStatus::Offered),
            "accepted" => Ok(AssignmentStatus::Accepted),
            "declined" => Ok(AssignmentStatus::Declined),
            "completed" => Ok(AssignmentStatus::Completed),
            other => Err(DomainError::validation(format!(
                "unknown assignment status '{other}' (expected one of: offered, accepted, declined, completed)"
            ))),
        }
    }
}

/// A stored offer of one shift to one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftAssignment {
    pub id: AssignmentId,
    pub shift_id: ShiftId,
    pub worker_id: WorkerId,
    pub status: AssignmentStatus,
    pub assigned_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

impl Entity for ShiftAssignment {
    const NAME: &'static str = "assignment";

    type Id = AssignmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for offering a shift to a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignment {
    pub shift_id: ShiftId,
    pub worker_id: WorkerId,
    /// Unset means `offered`.
    #[serde(default)]
    pub status: Option<AssignmentStatus>,
}

impl NewAssignment {
    pub fn offer(shift_id: ShiftId, worker_id: WorkerId) -> Self {
        Self {
            shift_id,
            worker_id,
            status: None,
        }
    }

    /// Only the worker is checked here; an unknown (or blank) shift is the
    /// engine's `NotFound`.
    pub fn validate(&self) -> DomainResult<()> {
        if self.worker_id.is_blank() {
            return Err(DomainError::validation("worker_id is required"));
        }
        Ok(())
    }

    pub fn initial_status(&self) -> AssignmentStatus {
        self.status.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = AssignmentStatus> {
        prop::sample::select(AssignmentStatus::ALL.to_vec())
    }

    #[test]
    fn only_offered_can_be_answered() {
        use AssignmentStatus::*;
        for response in [Accepted, Declined] {
            assert!(Offered.can_transition_to(response));
            for from in [Accepted, Declined, Completed] {
                assert!(!from.can_transition_to(response), "{from} -> {response}");
            }
        }
    }

    #[test]
    fn only_accepted_can_complete() {
        use AssignmentStatus::*;
        assert!(Accepted.can_transition_to(Completed));
        assert!(!Offered.can_transition_to(Completed));
        assert!(!Declined.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Completed));
    }

    #[test]
    fn declined_and_completed_allow_nothing_further() {
        assert!(AssignmentStatus::Declined.allowed_next().is_empty());
        assert!(AssignmentStatus::Completed.allowed_next().is_empty());
        assert!(!AssignmentStatus::Accepted.allowed_next().is_empty());
    }

    #[test]
    fn declined_offer_cannot_be_reopened() {
        let err = AssignmentStatus::Declined
            .transition_to(AssignmentStatus::Offered)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { entity: "assignment", .. }));
    }

    #[test]
    fn new_assignment_defaults_to_offered_and_requires_worker() {
        let offer = NewAssignment::offer(ShiftId::new("s-1"), WorkerId::new("w-1"));
        assert_eq!(offer.initial_status(), AssignmentStatus::Offered);
        assert!(offer.validate().is_ok());

        let blank = NewAssignment::offer(ShiftId::new("s-1"), WorkerId::new(""));
        assert_eq!(
            blank.validate().unwrap_err(),
            DomainError::validation("worker_id is required")
        );
    }

    #[test]
    fn assignment_serializes_with_camel_case_fields() {
        let assignment = ShiftAssignment {
            id: AssignmentId::new("a-1"),
            shift_id: ShiftId::new("s-1"),
            worker_id: WorkerId::new("w-1"),
            status: AssignmentStatus::Offered,
            assigned_at: DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            responded_at: None,
        };
        let json = serde_json::to_value(&assignment).unwrap();
        assert_eq!(json["shiftId"], "s-1");
        assert_eq!(json["status"], "offered");
        assert!(json.get("respondedAt").is_none());
    }

    proptest! {
        #[test]
        fn transition_succeeds_iff_listed_in_table(from in any_status(), to in any_status()) {
            prop_assert_eq!(from.transition_to(to).is_ok(), from.allowed_next().contains(&to));
        }

        #[test]
        fn terminal_states_reject_everything(to in any_status()) {
            prop_assert!(AssignmentStatus::Declined.transition_to(to).is_err());
            prop_assert!(AssignmentStatus::Completed.transition_to(to).is_err());
        }
    }
}
