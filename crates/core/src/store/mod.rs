//! Case store contract and adapters.
//!
//! The workflow engine only sees [`CaseStore`]. Adapters normalise their backing storage into
//! the canonical [`Submission`], [`GpAction`] and [`Appointment`] types.
//!
//! ## Atomicity
//!
//! Multi-record changes go through [`CaseStore::commit`], which applies a list of
//! [`CaseWrite`]s as one unit: either every write is visible afterwards or none is. The
//! conditional [`CaseWrite::TransitionStatus`] is evaluated inside that unit, so two concurrent
//! review actions on the same submission cannot both observe `pending-review`.
//!
//! ## Soft references
//!
//! `submission_id` on actions and appointments is not checked against the submissions table.
//! An action or appointment may reference a submission that does not exist.

pub mod memory;
pub mod retry;
pub mod sqlite;

pub use memory::MemoryCaseStore;
pub use retry::RetryingStore;
pub use sqlite::SqliteCaseStore;

use crate::error::TriageResult;
use crate::ids::{ActionId, AppointmentId, PatientId, SubmissionId};
use crate::model::action::GpAction;
use crate::model::appointment::{Appointment, AppointmentChange, AppointmentFilter};
use crate::model::submission::Submission;
use crate::model::SubmissionStatus;
use chrono::{DateTime, Utc};

/// One write inside an atomic [`CaseStore::commit`].
#[derive(Clone, Debug, PartialEq)]
pub enum CaseWrite {
    InsertSubmission(Submission),
    InsertAction(GpAction),
    InsertAppointment(Appointment),
    /// Unconditional status overwrite. Fails the commit with `NotFound` for an unknown id.
    SetStatus {
        id: SubmissionId,
        status: SubmissionStatus,
    },
    /// Compare-and-set: moves `id` to `to` only if its current status is `from`.
    ///
    /// Never fails the commit; the result is reported in [`CommitOutcome::transitions`].
    TransitionStatus {
        id: SubmissionId,
        from: SubmissionStatus,
        to: SubmissionStatus,
    },
}

/// Result of evaluating a [`CaseWrite::TransitionStatus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    /// The submission was not in the `from` state; nothing changed.
    Skipped { current: SubmissionStatus },
    /// No submission with that id exists.
    MissingSubmission,
}

/// What a commit did, in write order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    pub transitions: Vec<TransitionOutcome>,
}

/// Persistence contract consumed by the workflow engine.
///
/// Implementations must be safe to share across request handlers. Every method may fail with
/// `TriageError::StoreUnavailable`; lookups of a missing record fail with
/// `TriageError::NotFound`.
pub trait CaseStore: Send + Sync {
    /// Applies `writes` atomically.
    fn commit(&self, writes: Vec<CaseWrite>) -> TriageResult<CommitOutcome>;

    fn get_submission(&self, id: &SubmissionId) -> TriageResult<Submission>;

    /// Submissions, newest `created_at` first, optionally restricted to one patient.
    fn list_submissions(&self, patient_id: Option<&PatientId>) -> TriageResult<Vec<Submission>>;

    /// Actions recorded against a submission, newest first.
    fn list_actions(&self, submission_id: &SubmissionId) -> TriageResult<Vec<GpAction>>;

    fn get_appointment(&self, id: &AppointmentId) -> TriageResult<Appointment>;

    /// Appointments selected and ordered by `filter`.
    fn list_appointments(&self, filter: &AppointmentFilter) -> TriageResult<Vec<Appointment>>;

    /// Applies `change` to one appointment and returns the updated record.
    fn update_appointment(
        &self,
        id: &AppointmentId,
        change: AppointmentChange,
        at: DateTime<Utc>,
    ) -> TriageResult<Appointment>;

    fn insert_submission(&self, submission: &Submission) -> TriageResult<SubmissionId> {
        self.commit(vec![CaseWrite::InsertSubmission(submission.clone())])?;
        Ok(submission.id.clone())
    }

    fn update_submission_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
    ) -> TriageResult<()> {
        self.commit(vec![CaseWrite::SetStatus {
            id: id.clone(),
            status,
        }])?;
        Ok(())
    }

    fn insert_action(&self, action: &GpAction) -> TriageResult<ActionId> {
        self.commit(vec![CaseWrite::InsertAction(action.clone())])?;
        Ok(action.id.clone())
    }

    fn insert_appointment(&self, appointment: &Appointment) -> TriageResult<AppointmentId> {
        self.commit(vec![CaseWrite::InsertAppointment(appointment.clone())])?;
        Ok(appointment.id.clone())
    }
}

impl<S: CaseStore + ?Sized> CaseStore for std::sync::Arc<S> {
    fn commit(&self, writes: Vec<CaseWrite>) -> TriageResult<CommitOutcome> {
        (**self).commit(writes)
    }

    fn get_submission(&self, id: &SubmissionId) -> TriageResult<Submission> {
        (**self).get_submission(id)
    }

    fn list_submissions(&self, patient_id: Option<&PatientId>) -> TriageResult<Vec<Submission>> {
        (**self).list_submissions(patient_id)
    }

    fn list_actions(&self, submission_id: &SubmissionId) -> TriageResult<Vec<GpAction>> {
        (**self).list_actions(submission_id)
    }

    fn get_appointment(&self, id: &AppointmentId) -> TriageResult<Appointment> {
        (**self).get_appointment(id)
    }

    fn list_appointments(&self, filter: &AppointmentFilter) -> TriageResult<Vec<Appointment>> {
        (**self).list_appointments(filter)
    }

    fn update_appointment(
        &self,
        id: &AppointmentId,
        change: AppointmentChange,
        at: DateTime<Utc>,
    ) -> TriageResult<Appointment> {
        (**self).update_appointment(id, change, at)
    }
}

/// Newest-first ordering shared by adapters that sort in memory.
///
/// `records` must be in insertion order; equal timestamps keep the later insert first.
pub(crate) fn newest_first<T>(records: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    records.reverse();
    records.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}
