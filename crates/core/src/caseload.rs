//! Clinician views over the submission list: filtering and dashboard counts.

use crate::ids::PatientId;
use crate::model::submission::Submission;
use crate::model::{SubmissionStatus, TriageLevel};
use serde::{Deserialize, Serialize};

/// Filters applied to a submission listing.
///
/// All criteria are optional and combine with AND.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionQuery {
    pub patient_id: Option<PatientId>,
    /// Case-insensitive substring match over `"<first> <last> <id>"`.
    pub search: Option<String>,
    pub triage: Option<TriageLevel>,
    pub status: Option<SubmissionStatus>,
}

impl SubmissionQuery {
    pub fn for_patient(patient_id: PatientId) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Self::default()
        }
    }

    /// Whether `submission` passes the search, triage and status criteria.
    ///
    /// `patient_id` is not checked here; it is pushed down to the case store.
    pub fn matches(&self, submission: &Submission) -> bool {
        if let Some(level) = self.triage {
            if submission.triage_level != level {
                return false;
            }
        }
        if let Some(status) = self.status {
            if submission.status != status {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let haystack = format!(
                    "{} {} {}",
                    submission.first_name, submission.last_name, submission.id
                )
                .to_lowercase();
                haystack.contains(&needle.to_lowercase())
            }
        }
    }
}

/// Dashboard counts over a set of submissions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseloadSummary {
    pub total: usize,
    pub pending_review: usize,
    pub reviewed: usize,
    /// Submissions triaged red, whatever their status.
    pub urgent: usize,
}

impl CaseloadSummary {
    pub fn from_submissions<'a>(submissions: impl IntoIterator<Item = &'a Submission>) -> Self {
        submissions
            .into_iter()
            .fold(Self::default(), |mut summary, submission| {
                summary.total += 1;
                match submission.status {
                    SubmissionStatus::PendingReview => summary.pending_review += 1,
                    SubmissionStatus::Reviewed => summary.reviewed += 1,
                }
                if submission.triage_level == TriageLevel::Red {
                    summary.urgent += 1;
                }
                summary
            })
    }
}
