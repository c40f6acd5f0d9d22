//! # Workflow Engine
//!
//! Orchestrates the lifecycle of triage cases on top of a [`CaseStore`]:
//! - submission intake (validate, classify, persist as `pending-review`)
//! - GP actions, including the review transition `pending-review -> reviewed`
//! - appointment booking, with the referral audit entry it implies
//! - appointment cancellation and rescheduling
//!
//! Every change that touches more than one record is a single [`CaseStore::commit`], so readers
//! never see a review action without its status change or a linked booking without its
//! referral entry.
//!
//! The engine records which actor did what but performs no authorisation. Store failures are
//! propagated as-is; retrying is the store adapter's job.

use crate::caseload::{CaseloadSummary, SubmissionQuery};
use crate::classifier;
use crate::error::TriageResult;
use crate::ids::{ActorId, AppointmentId, PatientId, SubmissionId};
use crate::model::action::GpAction;
use crate::model::appointment::{
    parse_date, parse_time, Appointment, AppointmentChange, AppointmentFilter, AppointmentPatch,
    BookingRequest,
};
use crate::model::report::SymptomReport;
use crate::model::submission::Submission;
use crate::model::{ActionType, AppointmentStatus, SubmissionStatus};
use crate::store::{CaseStore, CaseWrite, MemoryCaseStore, TransitionOutcome};
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;

/// Triage case workflow over a shared case store.
#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn CaseStore>,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn CaseStore>) -> Self {
        Self { store }
    }

    /// An engine over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCaseStore::new()))
    }

    /// Validates and classifies `report`, then persists it as a new `pending-review` case.
    ///
    /// # Errors
    ///
    /// `TriageError::Validation` when demographics are missing, body areas or symptoms are empty,
    /// or duration/severity are absent or unrecognised.
    pub fn create_submission(
        &self,
        patient_id: Option<PatientId>,
        report: &SymptomReport,
    ) -> TriageResult<Submission> {
        let report = report.validate()?;
        let triage_level = classifier::classify_checked(report.severity, report.duration);
        let submission = Submission::from_report(patient_id, report, triage_level, now());

        self.store.insert_submission(&submission)?;
        tracing::info!(
            submission_id = %submission.id,
            triage_level = %submission.triage_level,
            "submission created"
        );
        Ok(submission)
    }

    pub fn get_submission(&self, id: &SubmissionId) -> TriageResult<Submission> {
        self.store.get_submission(id)
    }

    /// Submissions, newest first, optionally for one patient.
    pub fn list_submissions(&self, patient_id: Option<&PatientId>) -> TriageResult<Vec<Submission>> {
        self.store.list_submissions(patient_id)
    }

    /// Submissions matching `query`, newest first.
    pub fn query_submissions(&self, query: &SubmissionQuery) -> TriageResult<Vec<Submission>> {
        let mut submissions = self.store.list_submissions(query.patient_id.as_ref())?;
        submissions.retain(|s| query.matches(s));
        Ok(submissions)
    }

    pub fn summary(&self, patient_id: Option<&PatientId>) -> TriageResult<CaseloadSummary> {
        let submissions = self.store.list_submissions(patient_id)?;
        Ok(CaseloadSummary::from_submissions(&submissions))
    }

    /// Overwrites a submission's status without consulting its current state.
    ///
    /// This is the manual override path; review actions go through [`Self::record_action`].
    pub fn update_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
    ) -> TriageResult<Submission> {
        self.store.update_submission_status(id, status)?;
        tracing::info!(submission_id = %id, %status, "submission status overwritten");
        self.store.get_submission(id)
    }

    /// Appends a GP action and applies the status transition its type drives, atomically.
    ///
    /// A `review` on a `pending-review` case marks it `reviewed`; repeating it changes nothing
    /// further. The action is recorded even when `submission_id` names no known submission.
    pub fn record_action(
        &self,
        submission_id: SubmissionId,
        actor_id: Option<ActorId>,
        action_type: ActionType,
        notes: Option<String>,
    ) -> TriageResult<GpAction> {
        let action = GpAction::new(
            submission_id,
            actor_id,
            action_type,
            notes.unwrap_or_default(),
            now(),
        );

        let mut writes = vec![CaseWrite::InsertAction(action.clone())];
        if let Some((from, to)) = action_type.status_transition() {
            writes.push(CaseWrite::TransitionStatus {
                id: action.submission_id.clone(),
                from,
                to,
            });
        }
        let outcome = self.store.commit(writes)?;

        match outcome.transitions.first() {
            Some(TransitionOutcome::Applied) => tracing::info!(
                submission_id = %action.submission_id,
                %action_type,
                "submission marked reviewed"
            ),
            Some(TransitionOutcome::MissingSubmission) => tracing::warn!(
                submission_id = %action.submission_id,
                %action_type,
                "action recorded against unknown submission"
            ),
            Some(TransitionOutcome::Skipped { current }) => tracing::debug!(
                submission_id = %action.submission_id,
                %current,
                "review transition not applicable"
            ),
            None => {}
        }
        tracing::info!(action_id = %action.id, %action_type, "gp action recorded");
        Ok(action)
    }

    /// Actions on a submission, newest first.
    pub fn list_actions(&self, submission_id: &SubmissionId) -> TriageResult<Vec<GpAction>> {
        self.store.list_actions(submission_id)
    }

    /// Books an appointment as `confirmed`.
    ///
    /// When the booking names both a submission and an actor, a `refer` action summarising it is
    /// recorded in the same commit. That action never moves the submission's status.
    pub fn book_appointment(&self, request: BookingRequest) -> TriageResult<Appointment> {
        let now = now();
        let appointment = request.validate()?.into_appointment(now);

        let mut writes = vec![CaseWrite::InsertAppointment(appointment.clone())];
        if let (Some(submission_id), Some(actor_id)) =
            (&appointment.submission_id, &appointment.actor_id)
        {
            writes.push(CaseWrite::InsertAction(GpAction::new(
                submission_id.clone(),
                Some(actor_id.clone()),
                ActionType::Refer,
                appointment.referral_note(),
                now,
            )));
        }
        let referral_logged = writes.len() > 1;
        self.store.commit(writes)?;

        tracing::info!(
            appointment_id = %appointment.id,
            hospital = %appointment.hospital,
            referral_logged,
            "appointment booked"
        );
        Ok(appointment)
    }

    /// Cancels an appointment. Cancelling twice is not an error.
    pub fn cancel_appointment(&self, id: &AppointmentId) -> TriageResult<Appointment> {
        let appointment = self.store.update_appointment(
            id,
            AppointmentChange::Status(AppointmentStatus::Cancelled),
            now(),
        )?;
        tracing::info!(appointment_id = %id, "appointment cancelled");
        Ok(appointment)
    }

    /// Moves an appointment and confirms it again, whatever its previous status.
    pub fn reschedule_appointment(
        &self,
        id: &AppointmentId,
        date: &str,
        time: &str,
    ) -> TriageResult<Appointment> {
        let change = AppointmentChange::Reschedule {
            date: parse_date(date)?,
            time: parse_time(time)?,
        };
        self.apply_change(id, change)
    }

    /// Applies a client patch: a date and time reschedule, otherwise a status may cancel.
    pub fn update_appointment(
        &self,
        id: &AppointmentId,
        patch: AppointmentPatch,
    ) -> TriageResult<Appointment> {
        let change = patch.into_change()?;
        self.apply_change(id, change)
    }

    pub fn get_appointment(&self, id: &AppointmentId) -> TriageResult<Appointment> {
        self.store.get_appointment(id)
    }

    pub fn list_appointments(&self, filter: &AppointmentFilter) -> TriageResult<Vec<Appointment>> {
        self.store.list_appointments(filter)
    }

    fn apply_change(
        &self,
        id: &AppointmentId,
        change: AppointmentChange,
    ) -> TriageResult<Appointment> {
        match change {
            AppointmentChange::Status(AppointmentStatus::Cancelled) => self.cancel_appointment(id),
            _ => {
                let appointment = self.store.update_appointment(id, change, now())?;
                tracing::info!(
                    appointment_id = %id,
                    date = %appointment.date,
                    time = %appointment.time,
                    status = %appointment.status,
                    "appointment updated"
                );
                Ok(appointment)
            }
        }
    }
}

/// Current time at the microsecond precision every store keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
