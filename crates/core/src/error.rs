/// Coarse classification of a [`TriageError`], used by API adapters to choose a response
/// without matching on messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    StoreUnavailable,
    InvalidInput,
    Config,
}

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    /// Malformed or missing caller input. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    /// Transient infrastructure failure reported by a case store.
    #[error("case store unavailable: {0}")]
    StoreUnavailable(String),
    /// A programming-contract violation, e.g. classifying outside the severity domain.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TriageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TriageError::Validation(_) => ErrorKind::Validation,
            TriageError::NotFound { .. } => ErrorKind::NotFound,
            TriageError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            TriageError::InvalidInput(_) => ErrorKind::InvalidInput,
            TriageError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        TriageError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<triage_types::TextError> for TriageError {
    fn from(err: triage_types::TextError) -> Self {
        TriageError::Validation(err.to_string())
    }
}

pub type TriageResult<T> = std::result::Result<T, TriageError>;
