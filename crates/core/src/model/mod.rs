//! Canonical case records.
//!
//! One shape per entity: every case store adapter normalises its rows into these types, and
//! every API surface renders them.

pub mod action;
pub mod appointment;
pub mod report;
pub mod submission;

str_enum!(
    /// Urgency tier assigned to a submission.
    TriageLevel {
        Green => "green",
        Amber => "amber",
        Red => "red",
    }
);

str_enum!(
    /// Review state of a submission.
    SubmissionStatus {
        PendingReview => "pending-review",
        Reviewed => "reviewed",
    }
);

str_enum!(
    /// Kind of clinical activity recorded against a submission.
    ActionType {
        Review => "review",
        Note => "note",
        Prescribe => "prescribe",
        Refer => "refer",
        FollowUp => "follow-up",
        Discharge => "discharge",
    }
);

str_enum!(
    AppointmentStatus {
        Confirmed => "confirmed",
        Cancelled => "cancelled",
    }
);

impl ActionType {
    /// Status transition this action type drives on its submission, as `(from, to)`.
    ///
    /// Only `review` moves a case; every other action is a plain log entry.
    pub fn status_transition(&self) -> Option<(SubmissionStatus, SubmissionStatus)> {
        match self {
            ActionType::Review => Some((SubmissionStatus::PendingReview, SubmissionStatus::Reviewed)),
            ActionType::Note
            | ActionType::Prescribe
            | ActionType::Refer
            | ActionType::FollowUp
            | ActionType::Discharge => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriageError;

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for action in ActionType::ALL {
            assert_eq!(action.as_str().parse::<ActionType>().unwrap(), *action);
        }
        assert_eq!(
            "pending-review".parse::<SubmissionStatus>().unwrap(),
            SubmissionStatus::PendingReview
        );
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&ActionType::FollowUp).unwrap();
        assert_eq!(json, "\"follow-up\"");
        let status: SubmissionStatus = serde_json::from_str("\"reviewed\"").unwrap();
        assert_eq!(status, SubmissionStatus::Reviewed);
    }

    #[test]
    fn unknown_value_is_a_validation_error() {
        let err = "escalate".parse::<ActionType>().expect_err("unknown action");
        assert!(matches!(err, TriageError::Validation(msg) if msg.contains("ActionType")));
    }

    #[test]
    fn only_review_has_a_status_transition() {
        assert_eq!(
            ActionType::Review.status_transition(),
            Some((SubmissionStatus::PendingReview, SubmissionStatus::Reviewed))
        );
        for action in ActionType::ALL.iter().filter(|a| **a != ActionType::Review) {
            assert_eq!(action.status_transition(), None, "{action} must not transition");
        }
    }
}
