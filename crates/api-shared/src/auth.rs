//! Request authentication shared by the API front-ends.
//!
//! Two independent checks: a static API key guarding the whole surface, and the caller identity
//! asserted by the upstream identity provider through request headers.

use triage_core::{Actor, Role};

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Header carrying the authenticated caller's id.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the authenticated caller's role (`patient` or `gp`).
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("invalid caller identity: {0}")]
    InvalidActor(String),
}

/// Validates the provided API key against the configured one.
///
/// With no key configured every request passes.
pub fn validate_api_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), AuthError> {
    match expected {
        None => Ok(()),
        Some(expected) if provided == Some(expected) => Ok(()),
        Some(_) => Err(AuthError::InvalidApiKey),
    }
}

/// Builds the caller identity from the identity headers.
///
/// Returns `Ok(None)` when neither header is present. Supplying only one of them is an error.
pub fn actor_from_headers(
    actor_id: Option<&str>,
    actor_role: Option<&str>,
) -> Result<Option<Actor>, AuthError> {
    match (actor_id, actor_role) {
        (None, None) => Ok(None),
        (Some(id), Some(role)) => {
            let role = role
                .trim()
                .parse::<Role>()
                .map_err(|e| AuthError::InvalidActor(e.to_string()))?;
            Actor::new(id, role)
                .map(Some)
                .map_err(|e| AuthError::InvalidActor(e.to_string()))
        }
        _ => Err(AuthError::InvalidActor(format!(
            "{ACTOR_ID_HEADER} and {ACTOR_ROLE_HEADER} must be supplied together"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_disabled_when_not_configured() {
        assert_eq!(validate_api_key(None, None), Ok(()));
        assert_eq!(validate_api_key(None, Some("anything")), Ok(()));
    }

    #[test]
    fn test_api_key_must_match() {
        assert_eq!(validate_api_key(Some("s3cret"), Some("s3cret")), Ok(()));
        assert_eq!(
            validate_api_key(Some("s3cret"), Some("guess")),
            Err(AuthError::InvalidApiKey)
        );
        assert_eq!(
            validate_api_key(Some("s3cret"), None),
            Err(AuthError::InvalidApiKey)
        );
    }

    #[test]
    fn test_actor_headers() {
        assert_eq!(actor_from_headers(None, None), Ok(None));

        let actor = actor_from_headers(Some("gp-7"), Some("gp"))
            .expect("valid headers")
            .expect("actor present");
        assert!(actor.is_clinician());
        assert_eq!(actor.id.as_str(), "gp-7");

        assert!(matches!(
            actor_from_headers(Some("gp-7"), None),
            Err(AuthError::InvalidActor(_))
        ));
        assert!(matches!(
            actor_from_headers(Some("gp-7"), Some("admin")),
            Err(AuthError::InvalidActor(_))
        ));
        assert!(matches!(
            actor_from_headers(Some("  "), Some("patient")),
            Err(AuthError::InvalidActor(_))
        ));
    }
}
