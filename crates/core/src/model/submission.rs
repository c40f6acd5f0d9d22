use super::report::{Severity, SymptomDuration, ValidatedReport};
use super::{SubmissionStatus, TriageLevel};
use crate::ids::{PatientId, SubmissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use triage_types::NonEmptyText;

/// A patient's triage case.
///
/// Everything except `status` is a snapshot of what the patient reported and how it was
/// classified at the time; no store operation rewrites those fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    /// `None` for anonymous use.
    pub patient_id: Option<PatientId>,
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub age: u32,
    pub gender: NonEmptyText,
    pub body_areas: Vec<String>,
    pub symptoms: Vec<String>,
    pub duration: SymptomDuration,
    pub severity: Severity,
    pub additional_info: String,
    pub triage_level: TriageLevel,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Builds a new, unreviewed submission from a validated report.
    pub(crate) fn from_report(
        patient_id: Option<PatientId>,
        report: ValidatedReport,
        triage_level: TriageLevel,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SubmissionId::generate(),
            patient_id,
            first_name: report.first_name,
            last_name: report.last_name,
            age: report.age,
            gender: report.gender,
            body_areas: report.body_areas,
            symptoms: report.symptoms,
            duration: report.duration,
            severity: report.severity,
            additional_info: report.additional_info,
            triage_level,
            status: SubmissionStatus::PendingReview,
            created_at,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_pending_review(&self) -> bool {
        self.status == SubmissionStatus::PendingReview
    }
}
