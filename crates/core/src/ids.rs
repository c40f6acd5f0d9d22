//! Opaque identifiers.
//!
//! Identifiers are strings on the wire and in storage. Locally generated ids use the canonical
//! simple UUID form (32 lowercase hex characters); ids supplied from outside only need to be
//! non-blank, since submissions and identities may originate in other systems.

use crate::error::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a fresh identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }

            /// Parses an externally supplied identifier.
            ///
            /// # Errors
            ///
            /// Returns `TriageError::Validation` if the value is blank.
            pub fn parse(value: impl AsRef<str>) -> TriageResult<Self> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(TriageError::Validation(format!(
                        "{} cannot be empty",
                        $label
                    )));
                }
                Ok(Self(trimmed.to_owned()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = TriageError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a [`Submission`](crate::Submission).
    SubmissionId,
    "submission id"
);
opaque_id!(
    /// Identifier of a [`GpAction`](crate::GpAction).
    ActionId,
    "action id"
);
opaque_id!(
    /// Identifier of an [`Appointment`](crate::Appointment).
    AppointmentId,
    "appointment id"
);
opaque_id!(
    /// Identity of a patient, as issued by the identity provider.
    PatientId,
    "patient id"
);
opaque_id!(
    /// Identity of a clinician or system actor, as issued by the identity provider.
    ActorId,
    "actor id"
);
