//! Wire types for the triage APIs.
//!
//! Requests carry raw strings so that parsing failures surface as validation errors from the
//! core rather than as opaque deserialisation rejections.

use serde::{Deserialize, Serialize};
use triage_core::catalogue::BODY_AREAS;
use triage_core::guidance::TriageGuidance;
use triage_core::model::appointment::{DATE_FORMAT, TIME_FORMAT};
use triage_core::{
    ActorId, Appointment, AppointmentPatch, BookingRequest, CaseloadSummary, GpAction, PatientId,
    Submission, SubmissionId, SymptomDuration, SymptomReport, TriageLevel, TriageResult,
};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

/// Symptom form as submitted by a patient.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateSubmissionReq {
    /// Overridden by the caller identity when a patient is signed in.
    pub patient_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i64>,
    pub gender: String,
    pub body_areas: Vec<String>,
    pub symptoms: Vec<String>,
    /// A duration label such as `1 – 3 days`, or a short code such as `1-3d`.
    pub duration: String,
    pub severity: Option<i64>,
    pub additional_info: String,
}

impl CreateSubmissionReq {
    /// Splits the request into the optional patient id and the symptom report.
    pub fn into_parts(self) -> TriageResult<(Option<PatientId>, SymptomReport)> {
        let patient_id = self
            .patient_id
            .filter(|p| !p.trim().is_empty())
            .map(PatientId::parse)
            .transpose()?;
        let report = SymptomReport {
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
            gender: self.gender,
            body_areas: self.body_areas,
            symptoms: self.symptoms,
            duration: self.duration,
            severity: self.severity,
            additional_info: self.additional_info,
        };
        Ok((patient_id, report))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionRes {
    pub id: String,
    pub patient_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub gender: String,
    pub body_areas: Vec<String>,
    pub symptoms: Vec<String>,
    pub duration: String,
    pub severity: u8,
    pub additional_info: String,
    pub triage_level: String,
    pub status: String,
    pub created_at: String,
}

impl From<&Submission> for SubmissionRes {
    fn from(s: &Submission) -> Self {
        Self {
            id: s.id.to_string(),
            patient_id: s.patient_id.as_ref().map(ToString::to_string),
            first_name: s.first_name.to_string(),
            last_name: s.last_name.to_string(),
            age: s.age,
            gender: s.gender.to_string(),
            body_areas: s.body_areas.clone(),
            symptoms: s.symptoms.clone(),
            duration: s.duration.label().into(),
            severity: s.severity.value(),
            additional_info: s.additional_info.clone(),
            triage_level: s.triage_level.to_string(),
            status: s.status.to_string(),
            created_at: s.created_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GuidanceRes {
    pub triage_level: String,
    pub label: String,
    pub title: String,
    pub description: String,
    pub next_steps: Vec<String>,
}

impl GuidanceRes {
    pub fn for_level(level: TriageLevel) -> Self {
        let guidance: &TriageGuidance = level.guidance();
        Self {
            triage_level: level.to_string(),
            label: guidance.label.into(),
            title: guidance.title.into(),
            description: guidance.description.into(),
            next_steps: guidance.next_steps.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A newly created submission and the advice shown to the patient.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSubmissionRes {
    pub submission: SubmissionRes,
    pub guidance: GuidanceRes,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    /// `pending-review` or `reviewed`.
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryRes {
    pub total: usize,
    pub pending_review: usize,
    pub reviewed: usize,
    pub urgent: usize,
}

impl From<CaseloadSummary> for SummaryRes {
    fn from(s: CaseloadSummary) -> Self {
        Self {
            total: s.total,
            pending_review: s.pending_review,
            reviewed: s.reviewed,
            urgent: s.urgent,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RecordActionReq {
    pub submission_id: String,
    /// Ignored when the caller identity headers are present.
    pub actor_id: Option<String>,
    /// One of `review`, `note`, `prescribe`, `refer`, `follow-up`, `discharge`.
    pub action_type: String,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionRes {
    pub id: String,
    pub submission_id: String,
    pub actor_id: Option<String>,
    pub action_type: String,
    pub notes: String,
    pub created_at: String,
}

impl From<&GpAction> for ActionRes {
    fn from(a: &GpAction) -> Self {
        Self {
            id: a.id.to_string(),
            submission_id: a.submission_id.to_string(),
            actor_id: a.actor_id.as_ref().map(ToString::to_string),
            action_type: a.action_type.to_string(),
            notes: a.notes.clone(),
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BookAppointmentReq {
    pub submission_id: Option<String>,
    pub patient_id: Option<String>,
    /// Ignored when the caller identity headers are present.
    pub actor_id: Option<String>,
    pub hospital: String,
    pub department: Option<String>,
    pub doctor: Option<String>,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`.
    pub time: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl BookAppointmentReq {
    pub fn into_booking(self) -> TriageResult<BookingRequest> {
        Ok(BookingRequest {
            submission_id: optional_id::<SubmissionId>(self.submission_id)?,
            patient_id: optional_id::<PatientId>(self.patient_id)?,
            actor_id: optional_id::<ActorId>(self.actor_id)?,
            hospital: self.hospital,
            department: self.department,
            doctor: self.doctor,
            date: self.date,
            time: self.time,
            reason: self.reason,
            notes: self.notes,
        })
    }
}

/// Blank ids are treated as absent.
fn optional_id<T>(value: Option<String>) -> TriageResult<Option<T>>
where
    T: std::str::FromStr<Err = triage_core::TriageError>,
{
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.parse::<T>())
        .transpose()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateAppointmentReq {
    /// Written as given unless a date and time are supplied, which reschedule and confirm.
    pub status: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl UpdateAppointmentReq {
    pub fn into_patch(self) -> TriageResult<AppointmentPatch> {
        let status = self
            .status
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().parse())
            .transpose()?;
        Ok(AppointmentPatch {
            status,
            date: self.date,
            time: self.time,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AppointmentRes {
    pub id: String,
    pub submission_id: Option<String>,
    pub patient_id: Option<String>,
    pub actor_id: Option<String>,
    pub hospital: String,
    pub department: Option<String>,
    pub doctor: Option<String>,
    pub date: String,
    pub time: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Appointment> for AppointmentRes {
    fn from(a: &Appointment) -> Self {
        Self {
            id: a.id.to_string(),
            submission_id: a.submission_id.as_ref().map(ToString::to_string),
            patient_id: a.patient_id.as_ref().map(ToString::to_string),
            actor_id: a.actor_id.as_ref().map(ToString::to_string),
            hospital: a.hospital.to_string(),
            department: a.department.clone(),
            doctor: a.doctor.clone(),
            date: a.date.format(DATE_FORMAT).to_string(),
            time: a.time.format(TIME_FORMAT).to_string(),
            reason: a.reason.clone(),
            notes: a.notes.clone(),
            status: a.status.to_string(),
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ClassifyReq {
    pub severity: i64,
    pub duration: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ClassifyRes {
    pub triage_level: String,
    pub guidance: GuidanceRes,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BodyAreaRes {
    pub name: String,
    pub common_symptoms: Vec<String>,
}

/// Options offered by the symptom form.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CatalogueRes {
    pub body_areas: Vec<BodyAreaRes>,
    pub durations: Vec<String>,
    pub severities: Vec<u8>,
}

impl CatalogueRes {
    pub fn current() -> Self {
        Self {
            body_areas: BODY_AREAS
                .iter()
                .map(|(name, symptoms)| BodyAreaRes {
                    name: name.to_string(),
                    common_symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
            durations: SymptomDuration::ALL
                .iter()
                .map(|d| d.label().to_string())
                .collect(),
            severities: (triage_core::Severity::MIN..=triage_core::Severity::MAX).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{AppointmentStatus, TriageError};

    #[test]
    fn test_blank_ids_are_absent() {
        let booking = BookAppointmentReq {
            submission_id: Some("  ".into()),
            actor_id: Some("gp-1".into()),
            hospital: "Mater".into(),
            date: "2026-03-01".into(),
            time: "09:00".into(),
            ..BookAppointmentReq::default()
        }
        .into_booking()
        .expect("valid booking");
        assert!(booking.submission_id.is_none());
        assert_eq!(booking.actor_id.unwrap().as_str(), "gp-1");
    }

    #[test]
    fn test_update_request_parses_status() {
        let patch = UpdateAppointmentReq {
            status: Some("cancelled".into()),
            ..UpdateAppointmentReq::default()
        }
        .into_patch()
        .unwrap();
        assert_eq!(patch.status, Some(AppointmentStatus::Cancelled));

        let err = UpdateAppointmentReq {
            status: Some("postponed".into()),
            ..UpdateAppointmentReq::default()
        }
        .into_patch()
        .expect_err("unknown status");
        assert!(matches!(err, TriageError::Validation(_)));
    }

    #[test]
    fn test_catalogue_lists_form_options() {
        let catalogue = CatalogueRes::current();
        assert_eq!(catalogue.durations.len(), 5);
        assert_eq!(catalogue.severities, vec![1, 2, 3, 4]);
        assert!(catalogue
            .body_areas
            .iter()
            .any(|a| a.name == "Skin" && a.common_symptoms.contains(&"Rash".to_string())));
    }

    #[test]
    fn test_create_request_deserialises_with_defaults() {
        let req: CreateSubmissionReq = serde_json::from_value(serde_json::json!({
            "first_name": "Niamh",
            "severity": 2
        }))
        .unwrap();
        let (patient, report) = req.into_parts().unwrap();
        assert!(patient.is_none());
        assert_eq!(report.severity, Some(2));
        assert!(report.symptoms.is_empty());
    }
}
