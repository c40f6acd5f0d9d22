//! # Triage Core
//!
//! Core business logic for the symptom triage service.
//!
//! This crate contains the decision logic and case-state workflow:
//! - Rule-based triage classification of patient symptom reports
//! - Submission, GP action and appointment records and their lifecycle
//! - The case store contract with in-memory, SQLite and retrying adapters
//! - Caseload queries, demo seeding and runtime configuration
//!
//! **No API concerns**: authentication, HTTP servers and service interfaces belong in
//! `api-rest` or `api-shared`.

#[macro_use]
mod macros;

pub mod caseload;
pub mod catalogue;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod error;
pub mod guidance;
pub mod identity;
pub mod ids;
pub mod model;
pub mod seed;
pub mod store;
pub mod workflow;

use std::sync::Arc;

pub use caseload::{CaseloadSummary, SubmissionQuery};
pub use config::{CoreConfig, RawConfig, RetryPolicy};
pub use error::{ErrorKind, TriageError, TriageResult};
pub use identity::{Actor, Role};
pub use ids::{ActionId, ActorId, AppointmentId, PatientId, SubmissionId};
pub use model::action::GpAction;
pub use model::appointment::{Appointment, AppointmentFilter, AppointmentPatch, BookingRequest};
pub use model::report::{Severity, SymptomDuration, SymptomReport};
pub use model::submission::Submission;
pub use model::{ActionType, AppointmentStatus, SubmissionStatus, TriageLevel};
pub use store::{CaseStore, MemoryCaseStore, RetryingStore, SqliteCaseStore};
pub use workflow::WorkflowEngine;

/// Opens the case store selected by `cfg`, wrapped in its retry policy.
///
/// A configured database path selects SQLite; otherwise records live in memory.
pub fn open_store(cfg: &CoreConfig) -> TriageResult<Arc<dyn CaseStore>> {
    let store: Arc<dyn CaseStore> = match cfg.database_path() {
        Some(path) => Arc::new(RetryingStore::new(
            SqliteCaseStore::open(path, cfg.busy_timeout())?,
            cfg.retry(),
        )),
        None => {
            tracing::info!("no database path configured, using in-memory case store");
            Arc::new(RetryingStore::new(MemoryCaseStore::new(), cfg.retry()))
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_open_store_uses_sqlite_when_path_configured() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("cases.db");
        let cfg = CoreConfig::new(Some(path.clone()), RetryPolicy::no_retry(), Duration::from_secs(1))
            .expect("valid config");

        let engine = WorkflowEngine::new(open_store(&cfg).expect("store opens"));
        seed::seed_demo(&engine).expect("seeded");

        assert!(path.exists());
        let reopened = WorkflowEngine::new(open_store(&cfg).unwrap());
        assert_eq!(reopened.list_submissions(None).unwrap().len(), 6);
    }

    #[test]
    fn test_open_store_defaults_to_memory() {
        let engine = WorkflowEngine::new(open_store(&CoreConfig::default()).unwrap());
        assert!(engine.list_submissions(None).unwrap().is_empty());
    }
}
