//! Retry adapter for case stores.
//!
//! Wraps any [`CaseStore`] and re-issues calls that fail with
//! `TriageError::StoreUnavailable`, up to the configured number of attempts. Validation and
//! not-found failures are returned immediately. Commits are all-or-nothing, so a failed attempt
//! leaves nothing behind to double-apply.

use super::{CaseStore, CaseWrite, CommitOutcome};
use crate::config::RetryPolicy;
use crate::error::{TriageError, TriageResult};
use crate::ids::{AppointmentId, PatientId, SubmissionId};
use crate::model::action::GpAction;
use crate::model::appointment::{Appointment, AppointmentChange, AppointmentFilter};
use crate::model::submission::Submission;
use chrono::{DateTime, Utc};

pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: CaseStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn run<T>(&self, operation: &str, mut call: impl FnMut(&S) -> TriageResult<T>) -> TriageResult<T> {
        let mut attempt = 1;
        loop {
            match call(&self.inner) {
                Err(TriageError::StoreUnavailable(reason)) if attempt < self.policy.max_attempts() => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts = self.policy.max_attempts(),
                        ?delay,
                        "case store unavailable, retrying: {reason}"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

impl<S: CaseStore> CaseStore for RetryingStore<S> {
    fn commit(&self, writes: Vec<CaseWrite>) -> TriageResult<CommitOutcome> {
        self.run("commit", |store| store.commit(writes.clone()))
    }

    fn get_submission(&self, id: &SubmissionId) -> TriageResult<Submission> {
        self.run("get_submission", |store| store.get_submission(id))
    }

    fn list_submissions(&self, patient_id: Option<&PatientId>) -> TriageResult<Vec<Submission>> {
        self.run("list_submissions", |store| store.list_submissions(patient_id))
    }

    fn list_actions(&self, submission_id: &SubmissionId) -> TriageResult<Vec<GpAction>> {
        self.run("list_actions", |store| store.list_actions(submission_id))
    }

    fn get_appointment(&self, id: &AppointmentId) -> TriageResult<Appointment> {
        self.run("get_appointment", |store| store.get_appointment(id))
    }

    fn list_appointments(&self, filter: &AppointmentFilter) -> TriageResult<Vec<Appointment>> {
        self.run("list_appointments", |store| store.list_appointments(filter))
    }

    fn update_appointment(
        &self,
        id: &AppointmentId,
        change: AppointmentChange,
        at: DateTime<Utc>,
    ) -> TriageResult<Appointment> {
        self.run("update_appointment", |store| {
            store.update_appointment(id, change, at)
        })
    }
}
