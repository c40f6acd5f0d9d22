//! Identity of the caller, as supplied by the external identity provider.
//!
//! The workflow engine records who did what but does not authorise anything; `role` travels
//! with the actor so adapters can apply their own access rules.

use crate::error::{TriageError, TriageResult};
use crate::ids::{ActorId, PatientId};
use serde::{Deserialize, Serialize};

str_enum!(
    Role {
        Patient => "patient",
        Gp => "gp",
    }
);

/// Authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl AsRef<str>, role: Role) -> TriageResult<Self> {
        Ok(Self {
            id: ActorId::parse(id)?,
            role,
        })
    }

    pub fn is_clinician(&self) -> bool {
        self.role == Role::Gp
    }

    /// The patient identity for a patient actor.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::Validation` when the actor is not a patient.
    pub fn as_patient(&self) -> TriageResult<PatientId> {
        match self.role {
            Role::Patient => PatientId::parse(self.id.as_str()),
            Role::Gp => Err(TriageError::Validation(
                "only patient actors own submissions".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_actor_maps_to_patient_id() {
        let actor = Actor::new("42", Role::Patient).unwrap();
        assert_eq!(actor.as_patient().unwrap().as_str(), "42");
        assert!(!actor.is_clinician());
    }

    #[test]
    fn clinician_is_not_a_patient() {
        let actor = Actor::new("7", Role::Gp).unwrap();
        assert!(actor.is_clinician());
        assert!(matches!(actor.as_patient(), Err(TriageError::Validation(_))));
    }

    #[test]
    fn role_parses_wire_names() {
        assert_eq!("gp".parse::<Role>().unwrap(), Role::Gp);
        assert!("admin".parse::<Role>().is_err());
    }
}
