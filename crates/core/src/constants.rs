//! Constants used throughout the triage core crate.

/// Maximum characters accepted for names and gender.
pub const MAX_NAME_CHARS: usize = 100;

/// Maximum characters accepted for free-text report fields.
pub const MAX_FREE_TEXT_CHARS: usize = 5_000;

/// Oldest age accepted on a symptom report.
pub const MAX_AGE: u32 = 150;

/// Default number of attempts a case store adapter makes before surfacing an outage.
pub const DEFAULT_STORE_MAX_ATTEMPTS: u32 = 3;

/// Default linear backoff step between case store attempts, in milliseconds.
pub const DEFAULT_STORE_BACKOFF_MS: u64 = 50;

/// Default time SQLite waits on a locked database before reporting it busy, in milliseconds.
pub const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;
