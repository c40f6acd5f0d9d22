use super::ActionType;
use crate::ids::{ActionId, ActorId, SubmissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only audit entry of clinical activity on a submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpAction {
    pub id: ActionId,
    pub submission_id: SubmissionId,
    /// `None` for legacy or system-generated entries.
    pub actor_id: Option<ActorId>,
    pub action_type: ActionType,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl GpAction {
    pub(crate) fn new(
        submission_id: SubmissionId,
        actor_id: Option<ActorId>,
        action_type: ActionType,
        notes: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActionId::generate(),
            submission_id,
            actor_id,
            action_type,
            notes: notes.into(),
            created_at,
        }
    }
}
