//! Hospital and specialist bookings.

use super::AppointmentStatus;
use crate::error::{TriageError, TriageResult};
use crate::ids::{ActorId, AppointmentId, PatientId, SubmissionId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use triage_types::{trimmed_or_none, NonEmptyText};

/// Wire format for appointment dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire format for appointment times.
pub const TIME_FORMAT: &str = "%H:%M";

/// A booking, optionally tied to the submission it arose from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub submission_id: Option<SubmissionId>,
    pub patient_id: Option<PatientId>,
    /// The booking clinician.
    pub actor_id: Option<ActorId>,
    pub hospital: NonEmptyText,
    pub department: Option<String>,
    pub doctor: Option<String>,
    pub date: NaiveDate,
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for booking an appointment, as received from a clinician.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingRequest {
    pub submission_id: Option<SubmissionId>,
    pub patient_id: Option<PatientId>,
    pub actor_id: Option<ActorId>,
    pub hospital: String,
    pub department: Option<String>,
    pub doctor: Option<String>,
    pub date: String,
    pub time: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// A single mutation of an existing appointment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppointmentChange {
    /// Overwrite the status.
    Status(AppointmentStatus),
    /// Move the booking; a moved booking is always confirmed again.
    Reschedule { date: NaiveDate, time: NaiveTime },
}

impl AppointmentChange {
    /// Applies the change and refreshes `updated_at`.
    pub fn apply_to(&self, appointment: &mut Appointment, at: DateTime<Utc>) {
        match *self {
            AppointmentChange::Status(status) => appointment.status = status,
            AppointmentChange::Reschedule { date, time } => {
                appointment.date = date;
                appointment.time = time;
                appointment.status = AppointmentStatus::Confirmed;
            }
        }
        appointment.updated_at = at;
    }
}

/// Partial update of an appointment as received from a client.
///
/// A new date and time reschedules, whatever `status` says. Otherwise `status` is written as
/// given, so a cancelled booking can be confirmed again in place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentPatch {
    pub status: Option<AppointmentStatus>,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl AppointmentPatch {
    pub fn into_change(self) -> TriageResult<AppointmentChange> {
        let date = trimmed_or_none(self.date);
        let time = trimmed_or_none(self.time);
        match (date, time, self.status) {
            (Some(date), Some(time), _) => Ok(AppointmentChange::Reschedule {
                date: parse_date(&date)?,
                time: parse_time(&time)?,
            }),
            (Some(_), None, _) | (None, Some(_), _) => Err(TriageError::Validation(
                "date and time must be supplied together to reschedule".into(),
            )),
            (None, None, Some(status)) => Ok(AppointmentChange::Status(status)),
            (None, None, None) => Err(TriageError::Validation(
                "appointment update needs a status or a date and time".into(),
            )),
        }
    }
}

/// Selects which appointments to list, and in which order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AppointmentFilter {
    /// Every appointment, soonest first.
    #[default]
    All,
    /// A patient's appointments, soonest first.
    Patient(PatientId),
    /// Appointments booked from a submission, most recently booked first.
    Submission(SubmissionId),
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        match self {
            AppointmentFilter::All => true,
            AppointmentFilter::Patient(id) => appointment.patient_id.as_ref() == Some(id),
            AppointmentFilter::Submission(id) => appointment.submission_id.as_ref() == Some(id),
        }
    }

    /// Orders already-filtered appointments for this filter.
    ///
    /// Input is expected in insertion order; ties keep the most recently inserted first for the
    /// submission view and the earliest inserted first for the calendar views.
    pub fn sort(&self, appointments: &mut [Appointment]) {
        match self {
            AppointmentFilter::Submission(_) => {
                appointments.reverse();
                appointments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
            AppointmentFilter::All | AppointmentFilter::Patient(_) => {
                appointments.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));
            }
        }
    }
}

/// Parses a `YYYY-MM-DD` appointment date.
pub fn parse_date(value: &str) -> TriageResult<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TriageError::Validation("appointment date is required".into()));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        TriageError::Validation(format!("appointment date must be YYYY-MM-DD, got {value}"))
    })
}

/// Parses an `HH:MM` (or `HH:MM:SS`) appointment time.
pub fn parse_time(value: &str) -> TriageResult<NaiveTime> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TriageError::Validation("appointment time is required".into()));
    }
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| {
            TriageError::Validation(format!("appointment time must be HH:MM, got {value}"))
        })
}

/// Validated form of a [`BookingRequest`].
#[derive(Clone, Debug)]
pub(crate) struct ValidatedBooking {
    pub submission_id: Option<SubmissionId>,
    pub patient_id: Option<PatientId>,
    pub actor_id: Option<ActorId>,
    pub hospital: NonEmptyText,
    pub department: Option<String>,
    pub doctor: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl BookingRequest {
    pub(crate) fn validate(self) -> TriageResult<ValidatedBooking> {
        let hospital = NonEmptyText::new(&self.hospital)
            .map_err(|_| TriageError::Validation("hospital is required".into()))?;
        let date = parse_date(&self.date)?;
        let time = parse_time(&self.time)?;

        Ok(ValidatedBooking {
            submission_id: self.submission_id,
            patient_id: self.patient_id,
            actor_id: self.actor_id,
            hospital,
            department: trimmed_or_none(self.department),
            doctor: trimmed_or_none(self.doctor),
            date,
            time,
            reason: trimmed_or_none(self.reason),
            notes: trimmed_or_none(self.notes),
        })
    }
}

impl ValidatedBooking {
    pub(crate) fn into_appointment(self, at: DateTime<Utc>) -> Appointment {
        Appointment {
            id: AppointmentId::generate(),
            submission_id: self.submission_id,
            patient_id: self.patient_id,
            actor_id: self.actor_id,
            hospital: self.hospital,
            department: self.department,
            doctor: self.doctor,
            date: self.date,
            time: self.time,
            reason: self.reason,
            notes: self.notes,
            status: AppointmentStatus::Confirmed,
            created_at: at,
            updated_at: at,
        }
    }
}

impl Appointment {
    /// Audit note recorded when this booking is logged as a referral.
    pub fn referral_note(&self) -> String {
        let mut note = format!("Referred to {}", self.hospital);
        if let Some(department) = &self.department {
            note.push_str(" – ");
            note.push_str(department);
        }
        note.push_str(&format!(
            ". Appointment: {} at {}.",
            self.date.format(DATE_FORMAT),
            self.time.format(TIME_FORMAT)
        ));
        if let Some(reason) = &self.reason {
            note.push_str(" Reason: ");
            note.push_str(reason);
        }
        note
    }
}

/// Serialises appointment times as `HH:MM`.
pub(crate) mod hh_mm {
    use super::{parse_time, TIME_FORMAT};
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_time(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking() -> BookingRequest {
        BookingRequest {
            hospital: "St. James's".into(),
            date: "2026-03-01".into(),
            time: "09:00".into(),
            ..BookingRequest::default()
        }
    }

    #[test]
    fn referral_note_without_optional_parts() {
        let appointment = booking().validate().unwrap().into_appointment(Utc::now());
        assert_eq!(
            appointment.referral_note(),
            "Referred to St. James's. Appointment: 2026-03-01 at 09:00."
        );
    }

    #[test]
    fn referral_note_with_department_and_reason() {
        let mut request = booking();
        request.department = Some("Cardiology".into());
        request.reason = Some("Suspected angina".into());
        let appointment = request.validate().unwrap().into_appointment(Utc::now());
        assert_eq!(
            appointment.referral_note(),
            "Referred to St. James's – Cardiology. Appointment: 2026-03-01 at 09:00. Reason: Suspected angina"
        );
    }

    #[test]
    fn blank_optional_fields_are_dropped() {
        let mut request = booking();
        request.department = Some("  ".into());
        let validated = request.validate().unwrap();
        assert_eq!(validated.department, None);
    }

    #[test]
    fn validate_requires_hospital_date_and_time() {
        let mut request = booking();
        request.hospital = " ".into();
        assert!(matches!(request.validate(), Err(TriageError::Validation(m)) if m.contains("hospital")));

        let mut request = booking();
        request.date.clear();
        assert!(matches!(request.validate(), Err(TriageError::Validation(m)) if m.contains("date")));

        let mut request = booking();
        request.time = "9 o'clock".into();
        assert!(matches!(request.validate(), Err(TriageError::Validation(m)) if m.contains("time")));
    }

    #[test]
    fn reschedule_reconfirms_and_touches_updated_at() {
        let created = Utc::now();
        let mut appointment = booking().validate().unwrap().into_appointment(created);
        AppointmentChange::Status(AppointmentStatus::Cancelled).apply_to(&mut appointment, created);

        let later = created + chrono::Duration::minutes(5);
        AppointmentChange::Reschedule {
            date: parse_date("2026-03-08").unwrap(),
            time: parse_time("14:30").unwrap(),
        }
        .apply_to(&mut appointment, later);

        assert_eq!(appointment.status, AppointmentStatus::Confirmed);
        assert_eq!(appointment.updated_at, later);
        assert_eq!(appointment.created_at, created);
        assert_eq!(appointment.time.format(TIME_FORMAT).to_string(), "14:30");
    }

    #[test]
    fn patch_with_date_and_time_reschedules_whatever_the_status() {
        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Cancelled),
            date: Some("2026-04-02".into()),
            time: Some("15:30".into()),
        };
        assert_eq!(
            patch.into_change().unwrap(),
            AppointmentChange::Reschedule {
                date: NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
                time: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            }
        );
    }

    #[test]
    fn patch_status_alone_only_cancels() {
        let cancel = AppointmentPatch {
            status: Some(AppointmentStatus::Cancelled),
            ..AppointmentPatch::default()
        };
        assert_eq!(
            cancel.into_change().unwrap(),
            AppointmentChange::Status(AppointmentStatus::Cancelled)
        );

        let confirm = AppointmentPatch {
            status: Some(AppointmentStatus::Confirmed),
            ..AppointmentPatch::default()
        };
        assert_eq!(
            confirm.into_change().unwrap(),
            AppointmentChange::Status(AppointmentStatus::Confirmed)
        );
        assert!(matches!(
            AppointmentPatch::default().into_change(),
            Err(TriageError::Validation(_))
        ));
    }

    #[test]
    fn patch_with_half_a_reschedule_is_rejected() {
        let patch = AppointmentPatch {
            date: Some("2026-04-02".into()),
            ..AppointmentPatch::default()
        };
        assert!(matches!(patch.into_change(), Err(TriageError::Validation(_))));
    }

    #[test]
    fn time_serialises_as_hours_and_minutes() {
        let appointment = booking().validate().unwrap().into_appointment(Utc::now());
        let json = serde_json::to_value(&appointment).unwrap();
        assert_eq!(json["time"], "09:00");
        assert_eq!(json["date"], "2026-03-01");
    }
}
