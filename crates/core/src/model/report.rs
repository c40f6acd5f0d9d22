//! Patient symptom input.
//!
//! [`SymptomReport`] is the loosely-typed form payload as a patient submits it. It is turned into
//! a [`ValidatedReport`] before anything is classified or stored, so that a blank name, an empty
//! symptom list or an out-of-range severity never reach the case store.

use crate::constants::{MAX_AGE, MAX_FREE_TEXT_CHARS, MAX_NAME_CHARS};
use crate::error::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};
use triage_types::NonEmptyText;

/// How long the patient has had the reported symptoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymptomDuration {
    LessThan24Hours,
    OneToThreeDays,
    FourToSevenDays,
    OneToTwoWeeks,
    MoreThanTwoWeeks,
}

impl SymptomDuration {
    pub const ALL: &'static [SymptomDuration] = &[
        SymptomDuration::LessThan24Hours,
        SymptomDuration::OneToThreeDays,
        SymptomDuration::FourToSevenDays,
        SymptomDuration::OneToTwoWeeks,
        SymptomDuration::MoreThanTwoWeeks,
    ];

    /// Label shown to patients and stored on the submission.
    pub fn label(&self) -> &'static str {
        match self {
            SymptomDuration::LessThan24Hours => "Less than 24 hours",
            SymptomDuration::OneToThreeDays => "1 – 3 days",
            SymptomDuration::FourToSevenDays => "4 – 7 days",
            SymptomDuration::OneToTwoWeeks => "1 – 2 weeks",
            SymptomDuration::MoreThanTwoWeeks => "More than 2 weeks",
        }
    }

    /// Short code accepted on the command line.
    pub fn code(&self) -> &'static str {
        match self {
            SymptomDuration::LessThan24Hours => "<24h",
            SymptomDuration::OneToThreeDays => "1-3d",
            SymptomDuration::FourToSevenDays => "4-7d",
            SymptomDuration::OneToTwoWeeks => "1-2w",
            SymptomDuration::MoreThanTwoWeeks => ">2w",
        }
    }

    /// Onset within the last three days.
    pub fn is_recent_onset(&self) -> bool {
        matches!(
            self,
            SymptomDuration::LessThan24Hours | SymptomDuration::OneToThreeDays
        )
    }
}

impl std::fmt::Display for SymptomDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for SymptomDuration {
    type Err = TriageError;

    /// Accepts the patient-facing label (en dash or hyphen, any case) or the short code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s
            .trim()
            .replace(['–', '—'], "-")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        SymptomDuration::ALL
            .iter()
            .copied()
            .find(|d| {
                d.code() == normalised || d.label().replace('–', "-").to_lowercase() == normalised
            })
            .ok_or_else(|| TriageError::Validation(format!("unrecognised duration: {}", s.trim())))
    }
}

impl Serialize for SymptomDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for SymptomDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Patient-rated severity, 1 (mild) to 4 (very severe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(value: u8) -> TriageResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TriageError::Validation(format!(
                "severity must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            1 => "Mild",
            2 => "Moderate",
            3 => "Severe",
            _ => "Very Severe",
        }
    }
}

impl TryFrom<u8> for Severity {
    type Error = TriageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Severity::new(value)
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.0
    }
}

/// Symptom form payload as submitted by a patient.
///
/// Every field is optional or free text at this level; [`SymptomReport::validate`] enforces
/// the required fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymptomReport {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i64>,
    pub gender: String,
    pub body_areas: Vec<String>,
    pub symptoms: Vec<String>,
    pub duration: String,
    pub severity: Option<i64>,
    pub additional_info: String,
}

/// A symptom report whose invariants have been checked.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedReport {
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub age: u32,
    pub gender: NonEmptyText,
    pub body_areas: Vec<String>,
    pub symptoms: Vec<String>,
    pub duration: SymptomDuration,
    pub severity: Severity,
    pub additional_info: String,
}

impl SymptomReport {
    /// Checks the report invariants and produces typed fields.
    ///
    /// Body areas and symptoms are trimmed and de-duplicated (first occurrence wins) before the
    /// non-empty check, so a list of blanks counts as empty.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::Validation` naming the first offending field.
    pub fn validate(&self) -> TriageResult<ValidatedReport> {
        let first_name = required_text("first name", &self.first_name, MAX_NAME_CHARS)?;
        let last_name = required_text("last name", &self.last_name, MAX_NAME_CHARS)?;
        let gender = required_text("gender", &self.gender, MAX_NAME_CHARS)?;

        let age = match self.age {
            None => return Err(TriageError::Validation("age is required".into())),
            Some(age) if !(0..=i64::from(MAX_AGE)).contains(&age) => {
                return Err(TriageError::Validation(format!(
                    "age must be between 0 and {MAX_AGE}, got {age}"
                )))
            }
            Some(age) => age as u32,
        };

        let body_areas = distinct_entries(&self.body_areas);
        if body_areas.is_empty() {
            return Err(TriageError::Validation(
                "at least one body area is required".into(),
            ));
        }
        let symptoms = distinct_entries(&self.symptoms);
        if symptoms.is_empty() {
            return Err(TriageError::Validation(
                "at least one symptom is required".into(),
            ));
        }

        if self.duration.trim().is_empty() {
            return Err(TriageError::Validation("duration is required".into()));
        }
        let duration = self.duration.parse::<SymptomDuration>()?;

        let severity = match self.severity {
            None => return Err(TriageError::Validation("severity is required".into())),
            Some(value) => u8::try_from(value)
                .map_err(|_| {
                    TriageError::Validation(format!(
                        "severity must be between {} and {}, got {value}",
                        Severity::MIN,
                        Severity::MAX
                    ))
                })
                .and_then(Severity::new)?,
        };

        let additional_info = self.additional_info.trim().to_owned();
        if additional_info.chars().count() > MAX_FREE_TEXT_CHARS {
            return Err(TriageError::Validation(format!(
                "additional info exceeds maximum length of {MAX_FREE_TEXT_CHARS} characters"
            )));
        }

        Ok(ValidatedReport {
            first_name,
            last_name,
            age,
            gender,
            body_areas,
            symptoms,
            duration,
            severity,
            additional_info,
        })
    }
}

fn required_text(field: &str, value: &str, max: usize) -> TriageResult<NonEmptyText> {
    NonEmptyText::bounded(value, max).map_err(|e| TriageError::Validation(format!("{field}: {e}")))
}

fn distinct_entries(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let trimmed = value.trim();
        if !trimmed.is_empty() && !out.iter().any(|v| v == trimmed) {
            out.push(trimmed.to_owned());
        }
    }
    out
}
