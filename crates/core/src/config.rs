//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Nothing in this crate reads process-wide environment variables while handling a request;
//! binaries collect the raw values and hand them to the parsing helpers here.

use crate::constants::{
    DEFAULT_STORE_BACKOFF_MS, DEFAULT_STORE_BUSY_TIMEOUT_MS, DEFAULT_STORE_MAX_ATTEMPTS,
};
use crate::error::{TriageError, TriageResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How a case store adapter retries transient failures.
///
/// Backoff is linear: attempt `n` (1-based) waits `backoff * n` before retrying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> TriageResult<Self> {
        if max_attempts == 0 {
            return Err(TriageError::Config(
                "store retry max_attempts must be at least 1".into(),
            ));
        }
        Ok(Self {
            max_attempts,
            backoff,
        })
    }

    /// A policy that surfaces the first failure.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_STORE_MAX_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_STORE_BACKOFF_MS),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: Option<PathBuf>,
    retry: RetryPolicy,
    busy_timeout: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`. `database_path = None` selects the in-memory case store.
    pub fn new(
        database_path: Option<PathBuf>,
        retry: RetryPolicy,
        busy_timeout: Duration,
    ) -> TriageResult<Self> {
        if let Some(path) = &database_path {
            if path.as_os_str().is_empty() {
                return Err(TriageError::Config("database path cannot be empty".into()));
            }
            if path.is_dir() {
                return Err(TriageError::Config(format!(
                    "database path is a directory: {}",
                    path.display()
                )));
            }
        }

        Ok(Self {
            database_path,
            retry,
            busy_timeout,
        })
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            retry: RetryPolicy::default(),
            busy_timeout: Duration::from_millis(DEFAULT_STORE_BUSY_TIMEOUT_MS),
        }
    }
}

/// Raw configuration values as read from the environment by a binary.
#[derive(Clone, Debug, Default)]
pub struct RawConfig {
    pub database_path: Option<String>,
    pub store_max_attempts: Option<String>,
    pub store_backoff_ms: Option<String>,
    pub store_busy_timeout_ms: Option<String>,
}

impl RawConfig {
    /// Parse raw values into a [`CoreConfig`]. Missing or blank values take defaults.
    pub fn resolve(self) -> TriageResult<CoreConfig> {
        let database_path = non_blank(self.database_path).map(PathBuf::from);
        let max_attempts = parse_or(
            "TRIAGE_STORE_MAX_ATTEMPTS",
            self.store_max_attempts,
            DEFAULT_STORE_MAX_ATTEMPTS,
        )?;
        let backoff_ms = parse_or(
            "TRIAGE_STORE_BACKOFF_MS",
            self.store_backoff_ms,
            DEFAULT_STORE_BACKOFF_MS,
        )?;
        let busy_timeout_ms = parse_or(
            "TRIAGE_STORE_BUSY_TIMEOUT_MS",
            self.store_busy_timeout_ms,
            DEFAULT_STORE_BUSY_TIMEOUT_MS,
        )?;

        CoreConfig::new(
            database_path,
            RetryPolicy::new(max_attempts, Duration::from_millis(backoff_ms))?,
            Duration::from_millis(busy_timeout_ms),
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr>(name: &str, value: Option<String>, default: T) -> TriageResult<T> {
    match non_blank(value) {
        None => Ok(default),
        Some(v) => v
            .parse::<T>()
            .map_err(|_| TriageError::Config(format!("{name} is not a valid number: {v}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_uses_defaults_for_missing_values() {
        let cfg = RawConfig::default().resolve().expect("defaults are valid");
        assert!(cfg.database_path().is_none());
        assert_eq!(cfg.retry(), RetryPolicy::default());
        assert_eq!(
            cfg.busy_timeout(),
            Duration::from_millis(DEFAULT_STORE_BUSY_TIMEOUT_MS)
        );
    }

    #[test]
    fn resolve_parses_supplied_values() {
        let cfg = RawConfig {
            database_path: Some(" triage.db ".into()),
            store_max_attempts: Some("5".into()),
            store_backoff_ms: Some("10".into()),
            store_busy_timeout_ms: Some("250".into()),
        }
        .resolve()
        .expect("valid config");

        assert_eq!(cfg.database_path(), Some(Path::new("triage.db")));
        assert_eq!(cfg.retry().max_attempts(), 5);
        assert_eq!(cfg.retry().delay_after(2), Duration::from_millis(20));
        assert_eq!(cfg.busy_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn resolve_rejects_non_numeric_values() {
        let err = RawConfig {
            store_backoff_ms: Some("soon".into()),
            ..RawConfig::default()
        }
        .resolve()
        .expect_err("invalid backoff");
        assert!(matches!(err, TriageError::Config(msg) if msg.contains("TRIAGE_STORE_BACKOFF_MS")));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        assert!(matches!(
            RetryPolicy::new(0, Duration::ZERO),
            Err(TriageError::Config(_))
        ));
    }

    #[test]
    fn directory_database_path_is_rejected() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let err = CoreConfig::new(
            Some(dir.path().to_path_buf()),
            RetryPolicy::default(),
            Duration::from_secs(1),
        )
        .expect_err("directory path");
        assert!(matches!(err, TriageError::Config(_)));
    }
}
