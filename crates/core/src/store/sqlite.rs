//! SQLite-backed case store.
//!
//! Lists are stored as JSON text and timestamps as RFC 3339 text with a fixed microsecond
//! precision, so lexical order on `created_at` is chronological order. `submission_id` columns
//! carry no foreign keys.

use super::{CaseStore, CaseWrite, CommitOutcome, TransitionOutcome};
use crate::error::{TriageError, TriageResult};
use crate::ids::{ActionId, ActorId, AppointmentId, PatientId, SubmissionId};
use crate::model::action::GpAction;
use crate::model::appointment::{
    parse_date, parse_time, Appointment, AppointmentChange, AppointmentFilter, DATE_FORMAT,
    TIME_FORMAT,
};
use crate::model::report::{Severity, SymptomDuration};
use crate::model::submission::Submission;
use crate::model::{SubmissionStatus, TriageLevel};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use triage_types::NonEmptyText;

const SCHEMA: &str = "
-- Populated by the identity provider, not by the case store.
CREATE TABLE IF NOT EXISTS users (
    id         TEXT PRIMARY KEY,
    role       TEXT NOT NULL,
    email      TEXT,
    full_name  TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS submissions (
    id              TEXT PRIMARY KEY,
    patient_id      TEXT,
    first_name      TEXT NOT NULL,
    last_name       TEXT NOT NULL,
    age             INTEGER NOT NULL,
    gender          TEXT NOT NULL,
    body_areas      TEXT NOT NULL,
    symptoms        TEXT NOT NULL,
    duration        TEXT NOT NULL,
    severity        INTEGER NOT NULL,
    additional_info TEXT NOT NULL DEFAULT '',
    triage_level    TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'pending-review',
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_submissions_patient ON submissions (patient_id);

CREATE TABLE IF NOT EXISTS gp_actions (
    id            TEXT PRIMARY KEY,
    submission_id TEXT NOT NULL,
    actor_id      TEXT,
    action_type   TEXT NOT NULL,
    notes         TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_gp_actions_submission ON gp_actions (submission_id);

CREATE TABLE IF NOT EXISTS appointments (
    id            TEXT PRIMARY KEY,
    submission_id TEXT,
    patient_id    TEXT,
    actor_id      TEXT,
    hospital      TEXT NOT NULL,
    department    TEXT,
    doctor        TEXT,
    date          TEXT NOT NULL,
    time          TEXT NOT NULL,
    reason        TEXT,
    notes         TEXT,
    status        TEXT NOT NULL DEFAULT 'confirmed',
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments (patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_submission ON appointments (submission_id);
";

const SUBMISSION_COLUMNS: &str = "id, patient_id, first_name, last_name, age, gender, body_areas, \
     symptoms, duration, severity, additional_info, triage_level, status, created_at";

const ACTION_COLUMNS: &str = "id, submission_id, actor_id, action_type, notes, created_at";

const APPOINTMENT_COLUMNS: &str = "id, submission_id, patient_id, actor_id, hospital, department, \
     doctor, date, time, reason, notes, status, created_at, updated_at";

/// Only lock contention and I/O failures are transient. Everything else is a bad statement or
/// a row that does not decode, and retrying cannot clear it.
impl From<rusqlite::Error> for TriageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                ErrorCode::ConstraintViolation => TriageError::Validation(err.to_string()),
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull => TriageError::StoreUnavailable(err.to_string()),
                _ => TriageError::InvalidInput(err.to_string()),
            },
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::InvalidColumnIndex(_)
            | rusqlite::Error::InvalidColumnName(_) => corrupt("row", "in case store", &err),
            _ => TriageError::InvalidInput(err.to_string()),
        }
    }
}

/// Case store persisted in a single SQLite database.
pub struct SqliteCaseStore {
    conn: Mutex<Connection>,
}

impl SqliteCaseStore {
    /// Opens (creating if needed) the database at `path`.
    ///
    /// `busy_timeout` bounds how long a write waits for a competing writer before the call fails
    /// with `TriageError::StoreUnavailable`.
    pub fn open(path: &Path, busy_timeout: Duration) -> TriageResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        tracing::info!(path = %path.display(), "opened sqlite case store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> TriageResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> TriageResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> TriageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TriageError::StoreUnavailable("sqlite connection lock poisoned".into()))
    }
}

impl CaseStore for SqliteCaseStore {
    fn commit(&self, writes: Vec<CaseWrite>) -> TriageResult<CommitOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut outcome = CommitOutcome::default();
        for write in writes {
            apply(&tx, write, &mut outcome)?;
        }
        tx.commit()?;
        Ok(outcome)
    }

    fn get_submission(&self, id: &SubmissionId) -> TriageResult<Submission> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"),
                params![id.as_str()],
                SubmissionRow::read,
            )
            .optional()?;
        row.ok_or_else(|| TriageError::not_found("submission", id))?
            .into_submission()
    }

    fn list_submissions(&self, patient_id: Option<&PatientId>) -> TriageResult<Vec<Submission>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions
             WHERE ?1 IS NULL OR patient_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map(
            params![patient_id.map(PatientId::as_str)],
            SubmissionRow::read,
        )?;
        rows.map(|row| row?.into_submission()).collect()
    }

    fn list_actions(&self, submission_id: &SubmissionId) -> TriageResult<Vec<GpAction>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACTION_COLUMNS} FROM gp_actions
             WHERE submission_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map(params![submission_id.as_str()], ActionRow::read)?;
        rows.map(|row| row?.into_action()).collect()
    }

    fn get_appointment(&self, id: &AppointmentId) -> TriageResult<Appointment> {
        let conn = self.lock()?;
        find_appointment(&conn, id)
    }

    fn list_appointments(&self, filter: &AppointmentFilter) -> TriageResult<Vec<Appointment>> {
        let (clause, key, order) = match filter {
            AppointmentFilter::All => ("1 = 1", None, "date ASC, time ASC, rowid ASC"),
            AppointmentFilter::Patient(id) => (
                "patient_id = ?1",
                Some(id.as_str()),
                "date ASC, time ASC, rowid ASC",
            ),
            AppointmentFilter::Submission(id) => (
                "submission_id = ?1",
                Some(id.as_str()),
                "created_at DESC, rowid DESC",
            ),
        };
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE {clause} ORDER BY {order}"
        ))?;
        let rows = match key {
            Some(key) => stmt.query_map(params![key], AppointmentRow::read)?,
            None => stmt.query_map([], AppointmentRow::read)?,
        };
        rows.map(|row| row?.into_appointment()).collect()
    }

    fn update_appointment(
        &self,
        id: &AppointmentId,
        change: AppointmentChange,
        at: DateTime<Utc>,
    ) -> TriageResult<Appointment> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut appointment = find_appointment(&tx, id)?;
        change.apply_to(&mut appointment, at);
        tx.execute(
            "UPDATE appointments SET date = ?2, time = ?3, status = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                appointment.id.as_str(),
                appointment.date.format(DATE_FORMAT).to_string(),
                appointment.time.format(TIME_FORMAT).to_string(),
                appointment.status.as_str(),
                timestamp(&appointment.updated_at),
            ],
        )?;
        tx.commit()?;
        Ok(appointment)
    }
}

fn apply(conn: &Connection, write: CaseWrite, outcome: &mut CommitOutcome) -> TriageResult<()> {
    match write {
        CaseWrite::InsertSubmission(s) => {
            conn.execute(
                &format!(
                    "INSERT INTO submissions ({SUBMISSION_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
                ),
                params![
                    s.id.as_str(),
                    s.patient_id.as_ref().map(PatientId::as_str),
                    s.first_name.as_str(),
                    s.last_name.as_str(),
                    s.age,
                    s.gender.as_str(),
                    to_json(&s.body_areas)?,
                    to_json(&s.symptoms)?,
                    s.duration.label(),
                    s.severity.value(),
                    s.additional_info,
                    s.triage_level.as_str(),
                    s.status.as_str(),
                    timestamp(&s.created_at),
                ],
            )?;
        }
        CaseWrite::InsertAction(a) => {
            conn.execute(
                &format!("INSERT INTO gp_actions ({ACTION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    a.id.as_str(),
                    a.submission_id.as_str(),
                    a.actor_id.as_ref().map(ActorId::as_str),
                    a.action_type.as_str(),
                    a.notes,
                    timestamp(&a.created_at),
                ],
            )?;
        }
        CaseWrite::InsertAppointment(a) => {
            conn.execute(
                &format!(
                    "INSERT INTO appointments ({APPOINTMENT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
                ),
                params![
                    a.id.as_str(),
                    a.submission_id.as_ref().map(SubmissionId::as_str),
                    a.patient_id.as_ref().map(PatientId::as_str),
                    a.actor_id.as_ref().map(ActorId::as_str),
                    a.hospital.as_str(),
                    a.department,
                    a.doctor,
                    a.date.format(DATE_FORMAT).to_string(),
                    a.time.format(TIME_FORMAT).to_string(),
                    a.reason,
                    a.notes,
                    a.status.as_str(),
                    timestamp(&a.created_at),
                    timestamp(&a.updated_at),
                ],
            )?;
        }
        CaseWrite::SetStatus { id, status } => {
            let changed = conn.execute(
                "UPDATE submissions SET status = ?2 WHERE id = ?1",
                params![id.as_str(), status.as_str()],
            )?;
            if changed == 0 {
                return Err(TriageError::not_found("submission", &id));
            }
        }
        CaseWrite::TransitionStatus { id, from, to } => {
            let changed = conn.execute(
                "UPDATE submissions SET status = ?3 WHERE id = ?1 AND status = ?2",
                params![id.as_str(), from.as_str(), to.as_str()],
            )?;
            let transition = if changed > 0 {
                TransitionOutcome::Applied
            } else {
                let current: Option<String> = conn
                    .query_row(
                        "SELECT status FROM submissions WHERE id = ?1",
                        params![id.as_str()],
                        |row| row.get(0),
                    )
                    .optional()?;
                match current {
                    None => TransitionOutcome::MissingSubmission,
                    Some(status) => TransitionOutcome::Skipped {
                        current: status
                            .parse::<SubmissionStatus>()
                            .map_err(|e| corrupt("submission", id.as_str(), e))?,
                    },
                }
            };
            outcome.transitions.push(transition);
        }
    }
    Ok(())
}

fn find_appointment(conn: &Connection, id: &AppointmentId) -> TriageResult<Appointment> {
    let row = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id.as_str()],
            AppointmentRow::read,
        )
        .optional()?;
    row.ok_or_else(|| TriageError::not_found("appointment", id))?
        .into_appointment()
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_json(values: &[String]) -> TriageResult<String> {
    serde_json::to_string(values).map_err(|e| TriageError::InvalidInput(e.to_string()))
}

/// A stored row that no longer maps onto the domain types.
fn corrupt(entity: &str, id: &str, reason: impl std::fmt::Display) -> TriageError {
    TriageError::InvalidInput(format!("stored {entity} {id} is malformed: {reason}"))
}

fn parse_timestamp(entity: &str, id: &str, value: &str) -> TriageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| corrupt(entity, id, e))
}

fn parse_id<T: std::str::FromStr<Err = TriageError>>(
    entity: &str,
    id: &str,
    value: &str,
) -> TriageResult<T> {
    value.parse().map_err(|e| corrupt(entity, id, e))
}

fn parse_optional_id<T: std::str::FromStr<Err = TriageError>>(
    entity: &str,
    id: &str,
    value: Option<String>,
) -> TriageResult<Option<T>> {
    value.map(|v| parse_id(entity, id, &v)).transpose()
}

fn required_text(entity: &str, id: &str, value: &str) -> TriageResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|e| corrupt(entity, id, e))
}

struct SubmissionRow {
    id: String,
    patient_id: Option<String>,
    first_name: String,
    last_name: String,
    age: i64,
    gender: String,
    body_areas: String,
    symptoms: String,
    duration: String,
    severity: i64,
    additional_info: String,
    triage_level: String,
    status: String,
    created_at: String,
}

impl SubmissionRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            age: row.get(4)?,
            gender: row.get(5)?,
            body_areas: row.get(6)?,
            symptoms: row.get(7)?,
            duration: row.get(8)?,
            severity: row.get(9)?,
            additional_info: row.get(10)?,
            triage_level: row.get(11)?,
            status: row.get(12)?,
            created_at: row.get(13)?,
        })
    }

    fn into_submission(self) -> TriageResult<Submission> {
        let id = self.id.as_str();
        let bad = |e: &dyn std::fmt::Display| corrupt("submission", id, e);

        let severity = u8::try_from(self.severity)
            .map_err(|e| bad(&e))
            .and_then(|v| Severity::new(v).map_err(|e| bad(&e)))?;

        Ok(Submission {
            id: parse_id("submission", id, id)?,
            patient_id: parse_optional_id("submission", id, self.patient_id)?,
            first_name: required_text("submission", id, &self.first_name)?,
            last_name: required_text("submission", id, &self.last_name)?,
            age: u32::try_from(self.age).map_err(|e| bad(&e))?,
            gender: required_text("submission", id, &self.gender)?,
            body_areas: serde_json::from_str(&self.body_areas).map_err(|e| bad(&e))?,
            symptoms: serde_json::from_str(&self.symptoms).map_err(|e| bad(&e))?,
            duration: self
                .duration
                .parse::<SymptomDuration>()
                .map_err(|e| bad(&e))?,
            severity,
            additional_info: self.additional_info,
            triage_level: self
                .triage_level
                .parse::<TriageLevel>()
                .map_err(|e| bad(&e))?,
            status: self
                .status
                .parse::<SubmissionStatus>()
                .map_err(|e| bad(&e))?,
            created_at: parse_timestamp("submission", id, &self.created_at)?,
        })
    }
}

struct ActionRow {
    id: String,
    submission_id: String,
    actor_id: Option<String>,
    action_type: String,
    notes: String,
    created_at: String,
}

impl ActionRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            submission_id: row.get(1)?,
            actor_id: row.get(2)?,
            action_type: row.get(3)?,
            notes: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_action(self) -> TriageResult<GpAction> {
        let id = self.id.as_str();
        Ok(GpAction {
            id: parse_id::<ActionId>("action", id, id)?,
            submission_id: parse_id("action", id, &self.submission_id)?,
            actor_id: parse_optional_id("action", id, self.actor_id)?,
            action_type: parse_id("action", id, &self.action_type)?,
            notes: self.notes,
            created_at: parse_timestamp("action", id, &self.created_at)?,
        })
    }
}

struct AppointmentRow {
    id: String,
    submission_id: Option<String>,
    patient_id: Option<String>,
    actor_id: Option<String>,
    hospital: String,
    department: Option<String>,
    doctor: Option<String>,
    date: String,
    time: String,
    reason: Option<String>,
    notes: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl AppointmentRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            submission_id: row.get(1)?,
            patient_id: row.get(2)?,
            actor_id: row.get(3)?,
            hospital: row.get(4)?,
            department: row.get(5)?,
            doctor: row.get(6)?,
            date: row.get(7)?,
            time: row.get(8)?,
            reason: row.get(9)?,
            notes: row.get(10)?,
            status: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    fn into_appointment(self) -> TriageResult<Appointment> {
        let id = self.id.as_str();
        Ok(Appointment {
            id: parse_id::<AppointmentId>("appointment", id, id)?,
            submission_id: parse_optional_id("appointment", id, self.submission_id)?,
            patient_id: parse_optional_id("appointment", id, self.patient_id)?,
            actor_id: parse_optional_id("appointment", id, self.actor_id)?,
            hospital: required_text("appointment", id, &self.hospital)?,
            department: self.department,
            doctor: self.doctor,
            date: parse_date(&self.date).map_err(|e| corrupt("appointment", id, e))?,
            time: parse_time(&self.time).map_err(|e| corrupt("appointment", id, e))?,
            reason: self.reason,
            notes: self.notes,
            status: parse_id("appointment", id, &self.status)?,
            created_at: parse_timestamp("appointment", id, &self.created_at)?,
            updated_at: parse_timestamp("appointment", id, &self.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionType, AppointmentStatus};
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use tempfile::TempDir;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap()
    }

    fn submission(patient: Option<&str>, created_at: DateTime<Utc>) -> Submission {
        Submission {
            id: SubmissionId::generate(),
            patient_id: patient.map(|p| PatientId::parse(p).unwrap()),
            first_name: NonEmptyText::new("Patrick").unwrap(),
            last_name: NonEmptyText::new("Gallagher").unwrap(),
            age: 67,
            gender: NonEmptyText::new("Male").unwrap(),
            body_areas: vec!["Chest".into(), "Abdomen".into()],
            symptoms: vec!["Chest pain".into(), "Nausea".into()],
            duration: SymptomDuration::LessThan24Hours,
            severity: Severity::new(4).unwrap(),
            additional_info: "Started after lunch".into(),
            triage_level: TriageLevel::Red,
            status: SubmissionStatus::PendingReview,
            created_at,
        }
    }

    fn appointment(
        patient: Option<&str>,
        submission: Option<&SubmissionId>,
        date: &str,
        time: (u32, u32),
        created_at: DateTime<Utc>,
    ) -> Appointment {
        Appointment {
            id: AppointmentId::generate(),
            submission_id: submission.cloned(),
            patient_id: patient.map(|p| PatientId::parse(p).unwrap()),
            actor_id: Some(ActorId::parse("gp-1").unwrap()),
            hospital: NonEmptyText::new("Beaumont Hospital").unwrap(),
            department: Some("Cardiology".into()),
            doctor: None,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: NaiveTime::from_hms_opt(time.0, time.1, 0).unwrap(),
            reason: Some("Chest pain".into()),
            notes: None,
            status: AppointmentStatus::Confirmed,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_submission_round_trips_through_sqlite() {
        let store = SqliteCaseStore::open_in_memory().expect("open store");
        let s = submission(Some("p1"), at(0));
        store.insert_submission(&s).expect("insert");

        let loaded = store.get_submission(&s.id).expect("load");
        assert_eq!(loaded, s);
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("triage.db");
        let s = submission(None, at(0));
        {
            let store = SqliteCaseStore::open(&path, Duration::from_millis(100)).unwrap();
            store.insert_submission(&s).unwrap();
        }
        let store = SqliteCaseStore::open(&path, Duration::from_millis(100)).unwrap();
        assert_eq!(store.get_submission(&s.id).unwrap().id, s.id);
    }

    #[test]
    fn test_missing_records_are_not_found() {
        let store = SqliteCaseStore::open_in_memory().unwrap();
        assert!(matches!(
            store.get_submission(&SubmissionId::generate()),
            Err(TriageError::NotFound { entity: "submission", .. })
        ));
        assert!(matches!(
            store.get_appointment(&AppointmentId::generate()),
            Err(TriageError::NotFound { entity: "appointment", .. })
        ));
    }

    #[test]
    fn test_failed_commit_rolls_back() {
        let store = SqliteCaseStore::open_in_memory().unwrap();
        let s = submission(None, at(0));
        let err = store
            .commit(vec![
                CaseWrite::InsertSubmission(s.clone()),
                CaseWrite::SetStatus {
                    id: SubmissionId::generate(),
                    status: SubmissionStatus::Reviewed,
                },
            ])
            .expect_err("unknown id");
        assert!(matches!(err, TriageError::NotFound { .. }));
        assert!(store.list_submissions(None).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_id_is_a_validation_error() {
        let store = SqliteCaseStore::open_in_memory().unwrap();
        let s = submission(None, at(0));
        store.insert_submission(&s).unwrap();
        assert!(matches!(
            store.insert_submission(&s),
            Err(TriageError::Validation(_))
        ));
    }

    #[test]
    fn test_transition_reports_each_outcome() {
        let store = SqliteCaseStore::open_in_memory().unwrap();
        let s = submission(None, at(0));
        store.insert_submission(&s).unwrap();
        let review = |id: &SubmissionId| CaseWrite::TransitionStatus {
            id: id.clone(),
            from: SubmissionStatus::PendingReview,
            to: SubmissionStatus::Reviewed,
        };

        let outcome = store
            .commit(vec![
                review(&s.id),
                review(&s.id),
                review(&SubmissionId::generate()),
            ])
            .unwrap();

        assert_eq!(
            outcome.transitions,
            vec![
                TransitionOutcome::Applied,
                TransitionOutcome::Skipped {
                    current: SubmissionStatus::Reviewed
                },
                TransitionOutcome::MissingSubmission,
            ]
        );
        assert_eq!(
            store.get_submission(&s.id).unwrap().status,
            SubmissionStatus::Reviewed
        );
    }

    #[test]
    fn test_listings_are_newest_first() {
        let store = SqliteCaseStore::open_in_memory().unwrap();
        let first = submission(Some("p1"), at(0));
        let second = submission(Some("p1"), at(0));
        let third = submission(Some("p2"), at(10));
        for s in [&first, &second, &third] {
            store.insert_submission(s).unwrap();
        }

        let all = store.list_submissions(None).unwrap();
        let ids: Vec<_> = all.iter().map(|s| &s.id).collect();
        assert_eq!(ids, vec![&third.id, &second.id, &first.id]);

        let p1 = PatientId::parse("p1").unwrap();
        assert_eq!(store.list_submissions(Some(&p1)).unwrap().len(), 2);

        let sid = first.id.clone();
        let older = GpAction::new(sid.clone(), None, ActionType::Note, "older", at(1));
        let newer = GpAction::new(sid.clone(), None, ActionType::Prescribe, "newer", at(2));
        store.insert_action(&older).unwrap();
        store.insert_action(&newer).unwrap();
        let actions = store.list_actions(&sid).unwrap();
        assert_eq!(actions, vec![newer, older]);
    }

    #[test]
    fn test_appointment_filters_and_orderings() {
        let store = SqliteCaseStore::open_in_memory().unwrap();
        let sid = SubmissionId::generate();
        let late = appointment(Some("p1"), Some(&sid), "2026-06-10", (9, 30), at(0));
        let early = appointment(Some("p1"), Some(&sid), "2026-06-01", (14, 0), at(1));
        let other = appointment(Some("p2"), None, "2026-05-20", (8, 0), at(2));
        for a in [&late, &early, &other] {
            store.insert_appointment(a).unwrap();
        }

        let all = store.list_appointments(&AppointmentFilter::All).unwrap();
        assert_eq!(all, vec![other.clone(), early.clone(), late.clone()]);

        let p1 = PatientId::parse("p1").unwrap();
        let mine = store
            .list_appointments(&AppointmentFilter::Patient(p1))
            .unwrap();
        assert_eq!(mine, vec![early.clone(), late.clone()]);

        let booked = store
            .list_appointments(&AppointmentFilter::Submission(sid))
            .unwrap();
        assert_eq!(booked, vec![early, late]);
    }

    #[test]
    fn test_update_appointment_persists_reschedule() {
        let store = SqliteCaseStore::open_in_memory().unwrap();
        let mut appt = appointment(None, None, "2026-06-10", (9, 30), at(0));
        appt.status = AppointmentStatus::Cancelled;
        store.insert_appointment(&appt).unwrap();

        let change = AppointmentChange::Reschedule {
            date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            time: NaiveTime::from_hms_opt(11, 15, 0).unwrap(),
        };
        let updated = store.update_appointment(&appt.id, change, at(30)).unwrap();

        assert_eq!(updated.status, AppointmentStatus::Confirmed);
        assert_eq!(updated.updated_at, at(30));
        assert_eq!(store.get_appointment(&appt.id).unwrap(), updated);
    }

    #[test]
    fn test_undecodable_row_is_not_an_outage() {
        let store = SqliteCaseStore::open_in_memory().expect("open store");
        let s = submission(None, at(0));
        store.insert_submission(&s).unwrap();
        store
            .conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE submissions SET severity = 'severe' WHERE id = ?1",
                params![s.id.as_str()],
            )
            .unwrap();

        let err = store.get_submission(&s.id).expect_err("severity is not an integer");
        assert!(matches!(err, TriageError::InvalidInput(_)), "got {err:?}");
    }

    #[test]
    fn test_sqlite_error_kinds() {
        let conn = Connection::open_in_memory().unwrap();
        let syntax = conn.execute_batch("SELEC 1").expect_err("bad statement");
        assert!(matches!(TriageError::from(syntax), TriageError::InvalidInput(_)));

        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(TriageError::from(busy), TriageError::StoreUnavailable(_)));
    }

    #[test]
    fn test_competing_writer_surfaces_as_store_unavailable() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("triage.db");
        let store = SqliteCaseStore::open(&path, Duration::ZERO).unwrap();

        let blocker = Connection::open(&path).unwrap();
        blocker.execute_batch("BEGIN IMMEDIATE").unwrap();

        let err = store
            .insert_submission(&submission(None, at(0)))
            .expect_err("database is locked by another writer");
        assert!(matches!(err, TriageError::StoreUnavailable(_)));

        blocker.execute_batch("ROLLBACK").unwrap();
        store.insert_submission(&submission(None, at(1))).unwrap();
    }
}
