//! In-process case store.
//!
//! Used for tests, demos and deployments without a database path. A commit works on a copy of
//! the tables and swaps it in only when every write has applied, so a failing write leaves the
//! store untouched.

use super::{newest_first, CaseStore, CaseWrite, CommitOutcome, TransitionOutcome};
use crate::error::{TriageError, TriageResult};
use crate::ids::{AppointmentId, PatientId, SubmissionId};
use crate::model::action::GpAction;
use crate::model::appointment::{Appointment, AppointmentChange, AppointmentFilter};
use crate::model::submission::Submission;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

#[derive(Clone, Debug, Default)]
struct Tables {
    submissions: Vec<Submission>,
    actions: Vec<GpAction>,
    appointments: Vec<Appointment>,
}

impl Tables {
    fn submission_mut(&mut self, id: &SubmissionId) -> Option<&mut Submission> {
        self.submissions.iter_mut().find(|s| &s.id == id)
    }

    fn apply(&mut self, write: CaseWrite, outcome: &mut CommitOutcome) -> TriageResult<()> {
        match write {
            CaseWrite::InsertSubmission(submission) => {
                if self.submissions.iter().any(|s| s.id == submission.id) {
                    return Err(duplicate("submission", &submission.id));
                }
                self.submissions.push(submission);
            }
            CaseWrite::InsertAction(action) => {
                if self.actions.iter().any(|a| a.id == action.id) {
                    return Err(duplicate("action", &action.id));
                }
                self.actions.push(action);
            }
            CaseWrite::InsertAppointment(appointment) => {
                if self.appointments.iter().any(|a| a.id == appointment.id) {
                    return Err(duplicate("appointment", &appointment.id));
                }
                self.appointments.push(appointment);
            }
            CaseWrite::SetStatus { id, status } => match self.submission_mut(&id) {
                Some(submission) => submission.status = status,
                None => return Err(TriageError::not_found("submission", &id)),
            },
            CaseWrite::TransitionStatus { id, from, to } => {
                let transition = match self.submission_mut(&id) {
                    None => TransitionOutcome::MissingSubmission,
                    Some(submission) if submission.status == from => {
                        submission.status = to;
                        TransitionOutcome::Applied
                    }
                    Some(submission) => TransitionOutcome::Skipped {
                        current: submission.status,
                    },
                };
                outcome.transitions.push(transition);
            }
        }
        Ok(())
    }
}

fn duplicate(entity: &str, id: impl std::fmt::Display) -> TriageError {
    TriageError::Validation(format!("{entity} {id} already exists"))
}

/// Case store holding every record in process memory.
#[derive(Debug, Default)]
pub struct MemoryCaseStore {
    tables: Mutex<Tables>,
}

impl MemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> TriageResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| TriageError::StoreUnavailable("in-memory case store lock poisoned".into()))
    }
}

impl CaseStore for MemoryCaseStore {
    fn commit(&self, writes: Vec<CaseWrite>) -> TriageResult<CommitOutcome> {
        let mut tables = self.lock()?;
        let mut staged = tables.clone();
        let mut outcome = CommitOutcome::default();
        for write in writes {
            staged.apply(write, &mut outcome)?;
        }
        *tables = staged;
        Ok(outcome)
    }

    fn get_submission(&self, id: &SubmissionId) -> TriageResult<Submission> {
        self.lock()?
            .submissions
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| TriageError::not_found("submission", id))
    }

    fn list_submissions(&self, patient_id: Option<&PatientId>) -> TriageResult<Vec<Submission>> {
        let mut submissions: Vec<Submission> = self
            .lock()?
            .submissions
            .iter()
            .filter(|s| patient_id.is_none() || s.patient_id.as_ref() == patient_id)
            .cloned()
            .collect();
        newest_first(&mut submissions, |s| s.created_at);
        Ok(submissions)
    }

    fn list_actions(&self, submission_id: &SubmissionId) -> TriageResult<Vec<GpAction>> {
        let mut actions: Vec<GpAction> = self
            .lock()?
            .actions
            .iter()
            .filter(|a| &a.submission_id == submission_id)
            .cloned()
            .collect();
        newest_first(&mut actions, |a| a.created_at);
        Ok(actions)
    }

    fn get_appointment(&self, id: &AppointmentId) -> TriageResult<Appointment> {
        self.lock()?
            .appointments
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .ok_or_else(|| TriageError::not_found("appointment", id))
    }

    fn list_appointments(&self, filter: &AppointmentFilter) -> TriageResult<Vec<Appointment>> {
        let mut appointments: Vec<Appointment> = self
            .lock()?
            .appointments
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        filter.sort(&mut appointments);
        Ok(appointments)
    }

    fn update_appointment(
        &self,
        id: &AppointmentId,
        change: AppointmentChange,
        at: DateTime<Utc>,
    ) -> TriageResult<Appointment> {
        let mut tables = self.lock()?;
        let appointment = tables
            .appointments
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| TriageError::not_found("appointment", id))?;
        change.apply_to(appointment, at);
        Ok(appointment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::report::{Severity, SymptomDuration};
    use crate::model::{ActionType, AppointmentStatus, SubmissionStatus, TriageLevel};
    use chrono::{Duration, NaiveDate, NaiveTime, TimeZone};
    use triage_types::NonEmptyText;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap()
    }

    fn submission(patient: Option<&str>, created_at: DateTime<Utc>) -> Submission {
        Submission {
            id: SubmissionId::generate(),
            patient_id: patient.map(|p| PatientId::parse(p).unwrap()),
            first_name: NonEmptyText::new("Ciara").unwrap(),
            last_name: NonEmptyText::new("Byrne").unwrap(),
            age: 29,
            gender: NonEmptyText::new("Female").unwrap(),
            body_areas: vec!["Head".into()],
            symptoms: vec!["Headache".into()],
            duration: SymptomDuration::FourToSevenDays,
            severity: Severity::new(2).unwrap(),
            additional_info: String::new(),
            triage_level: TriageLevel::Amber,
            status: SubmissionStatus::PendingReview,
            created_at,
        }
    }

    fn appointment(submission: Option<&SubmissionId>, date: &str, created_at: DateTime<Utc>) -> Appointment {
        Appointment {
            id: AppointmentId::generate(),
            submission_id: submission.cloned(),
            patient_id: None,
            actor_id: None,
            hospital: NonEmptyText::new("St. James's Hospital").unwrap(),
            department: None,
            doctor: None,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            reason: None,
            notes: None,
            status: AppointmentStatus::Confirmed,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_failed_commit_leaves_store_untouched() {
        let store = MemoryCaseStore::new();
        let existing = submission(None, at(0));
        store.insert_submission(&existing).expect("insert");

        let fresh = submission(None, at(1));
        let err = store
            .commit(vec![
                CaseWrite::InsertSubmission(fresh.clone()),
                CaseWrite::SetStatus {
                    id: SubmissionId::parse("missing").unwrap(),
                    status: SubmissionStatus::Reviewed,
                },
            ])
            .expect_err("unknown id fails the commit");

        assert!(matches!(err, TriageError::NotFound { .. }));
        assert!(store.get_submission(&fresh.id).is_err());
        assert_eq!(store.list_submissions(None).unwrap().len(), 1);
    }

    #[test]
    fn test_transition_status_is_compare_and_set() {
        let store = MemoryCaseStore::new();
        let s = submission(None, at(0));
        store.insert_submission(&s).unwrap();
        let review = || CaseWrite::TransitionStatus {
            id: s.id.clone(),
            from: SubmissionStatus::PendingReview,
            to: SubmissionStatus::Reviewed,
        };

        let first = store.commit(vec![review()]).unwrap();
        let second = store.commit(vec![review()]).unwrap();

        assert_eq!(first.transitions, vec![TransitionOutcome::Applied]);
        assert_eq!(
            second.transitions,
            vec![TransitionOutcome::Skipped {
                current: SubmissionStatus::Reviewed
            }]
        );
    }

    #[test]
    fn test_transition_on_missing_submission_still_commits_other_writes() {
        let store = MemoryCaseStore::new();
        let orphan = SubmissionId::parse("no-such-case").unwrap();
        let action = GpAction::new(orphan.clone(), None, ActionType::Review, "", at(0));

        let outcome = store
            .commit(vec![
                CaseWrite::InsertAction(action),
                CaseWrite::TransitionStatus {
                    id: orphan.clone(),
                    from: SubmissionStatus::PendingReview,
                    to: SubmissionStatus::Reviewed,
                },
            ])
            .unwrap();

        assert_eq!(outcome.transitions, vec![TransitionOutcome::MissingSubmission]);
        assert_eq!(store.list_actions(&orphan).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let store = MemoryCaseStore::new();
        let s = submission(None, at(0));
        store.insert_submission(&s).unwrap();
        assert!(matches!(
            store.insert_submission(&s),
            Err(TriageError::Validation(_))
        ));
    }

    #[test]
    fn test_submissions_list_newest_first_with_patient_filter() {
        let store = MemoryCaseStore::new();
        let older = submission(Some("p1"), at(0));
        let newer = submission(Some("p1"), at(5));
        let other = submission(Some("p2"), at(3));
        for s in [&older, &newer, &other] {
            store.insert_submission(s).unwrap();
        }

        let all: Vec<_> = store.list_submissions(None).unwrap();
        assert_eq!(
            all.iter().map(|s| &s.id).collect::<Vec<_>>(),
            vec![&newer.id, &other.id, &older.id]
        );

        let p1 = PatientId::parse("p1").unwrap();
        let mine = store.list_submissions(Some(&p1)).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, newer.id);
    }

    #[test]
    fn test_actions_with_equal_timestamps_list_latest_insert_first() {
        let store = MemoryCaseStore::new();
        let sid = SubmissionId::generate();
        let first = GpAction::new(sid.clone(), None, ActionType::Note, "first", at(0));
        let second = GpAction::new(sid.clone(), None, ActionType::Note, "second", at(0));
        store.insert_action(&first).unwrap();
        store.insert_action(&second).unwrap();

        let actions = store.list_actions(&sid).unwrap();
        assert_eq!(actions[0].notes, "second");
        assert_eq!(actions[1].notes, "first");
    }

    #[test]
    fn test_appointment_orderings_follow_filter() {
        let store = MemoryCaseStore::new();
        let sid = SubmissionId::generate();
        let later_date = appointment(Some(&sid), "2026-05-02", at(0));
        let earlier_date = appointment(Some(&sid), "2026-05-01", at(1));
        store.insert_appointment(&later_date).unwrap();
        store.insert_appointment(&earlier_date).unwrap();

        let calendar = store.list_appointments(&AppointmentFilter::All).unwrap();
        assert_eq!(calendar[0].id, earlier_date.id);

        let booked = store
            .list_appointments(&AppointmentFilter::Submission(sid))
            .unwrap();
        assert_eq!(booked[0].id, earlier_date.id);
        assert_eq!(booked[1].id, later_date.id);
    }

    #[test]
    fn test_update_appointment_applies_change() {
        let store = MemoryCaseStore::new();
        let appt = appointment(None, "2026-05-01", at(0));
        store.insert_appointment(&appt).unwrap();

        let updated = store
            .update_appointment(
                &appt.id,
                AppointmentChange::Status(AppointmentStatus::Cancelled),
                at(0) + Duration::minutes(30),
            )
            .unwrap();
        assert_eq!(updated.status, AppointmentStatus::Cancelled);
        assert_eq!(store.get_appointment(&appt.id).unwrap(), updated);

        let missing = AppointmentId::generate();
        assert!(matches!(
            store.update_appointment(
                &missing,
                AppointmentChange::Status(AppointmentStatus::Cancelled),
                at(1)
            ),
            Err(TriageError::NotFound { .. })
        ));
    }
}
