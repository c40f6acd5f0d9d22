//! Rule-based triage classification.
//!
//! Rules, applied in order with later rules overriding earlier ones:
//!
//! 1. default `green`;
//! 2. severity ≥ 3 **or** symptoms lasting more than two weeks ⇒ `amber`;
//! 3. severity 4 **and** onset within three days ⇒ `red`.
//!
//! Severity 4 with a chronic (> 2 weeks) duration therefore stays `amber`: the red tier needs
//! recent onset.

use crate::error::{TriageError, TriageResult};
use crate::model::report::{Severity, SymptomDuration};
use crate::model::TriageLevel;

/// Classifies a severity/duration pair.
///
/// # Errors
///
/// Returns `TriageError::InvalidInput` if `severity` is outside `1..=4`.
pub fn classify(severity: u8, duration: SymptomDuration) -> TriageResult<TriageLevel> {
    if !(Severity::MIN..=Severity::MAX).contains(&severity) {
        return Err(TriageError::InvalidInput(format!(
            "severity {severity} is outside {}..={}",
            Severity::MIN,
            Severity::MAX
        )));
    }
    Ok(classify_checked(Severity::new(severity)?, duration))
}

/// Classifies an already range-checked severity. Total over its domain.
pub fn classify_checked(severity: Severity, duration: SymptomDuration) -> TriageLevel {
    let mut level = TriageLevel::Green;
    if severity.value() >= 3 || duration == SymptomDuration::MoreThanTwoWeeks {
        level = TriageLevel::Amber;
    }
    if severity.value() == Severity::MAX && duration.is_recent_onset() {
        level = TriageLevel::Red;
    }
    level
}

/// Classifies raw boundary values, e.g. from a command line.
///
/// # Errors
///
/// Returns `TriageError::InvalidInput` if the severity is out of range or the duration is not a
/// recognised label or code.
pub fn classify_raw(severity: i64, duration: &str) -> TriageResult<TriageLevel> {
    let duration = duration
        .parse::<SymptomDuration>()
        .map_err(|_| TriageError::InvalidInput(format!("unrecognised duration: {duration}")))?;
    let severity = u8::try_from(severity)
        .map_err(|_| TriageError::InvalidInput(format!("severity {severity} is out of range")))?;
    classify(severity, duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use SymptomDuration::*;

    #[test]
    fn chronic_duration_is_amber_below_max_severity() {
        for severity in 1..=3 {
            assert_eq!(
                classify(severity, MoreThanTwoWeeks).unwrap(),
                TriageLevel::Amber,
                "severity {severity}"
            );
        }
    }

    #[test]
    fn max_severity_with_recent_onset_is_red() {
        assert_eq!(classify(4, LessThan24Hours).unwrap(), TriageLevel::Red);
        assert_eq!(classify(4, OneToThreeDays).unwrap(), TriageLevel::Red);
    }

    #[test]
    fn max_severity_with_chronic_duration_stays_amber() {
        assert_eq!(classify(4, MoreThanTwoWeeks).unwrap(), TriageLevel::Amber);
        assert_eq!(classify(4, FourToSevenDays).unwrap(), TriageLevel::Amber);
        assert_eq!(classify(4, OneToTwoWeeks).unwrap(), TriageLevel::Amber);
    }

    #[test]
    fn mild_recent_symptoms_are_green() {
        assert_eq!(classify(1, OneToThreeDays).unwrap(), TriageLevel::Green);
        assert_eq!(classify(2, OneToTwoWeeks).unwrap(), TriageLevel::Green);
    }

    #[test]
    fn severity_three_is_amber_for_any_duration() {
        for duration in SymptomDuration::ALL {
            assert_eq!(classify(3, *duration).unwrap(), TriageLevel::Amber);
        }
    }

    #[test]
    fn full_table_is_deterministic() {
        for severity in 1..=4 {
            for duration in SymptomDuration::ALL {
                assert_eq!(
                    classify(severity, *duration).unwrap(),
                    classify(severity, *duration).unwrap()
                );
            }
        }
    }

    #[test]
    fn out_of_range_severity_is_invalid_input() {
        assert!(matches!(
            classify(0, LessThan24Hours),
            Err(TriageError::InvalidInput(_))
        ));
        assert!(matches!(
            classify(5, LessThan24Hours),
            Err(TriageError::InvalidInput(_))
        ));
    }

    #[test]
    fn classify_raw_rejects_unknown_duration() {
        assert!(matches!(
            classify_raw(2, "forever"),
            Err(TriageError::InvalidInput(msg)) if msg.contains("forever")
        ));
        assert!(matches!(
            classify_raw(-1, "1 – 3 days"),
            Err(TriageError::InvalidInput(_))
        ));
        assert_eq!(classify_raw(4, "1 – 3 days").unwrap(), TriageLevel::Red);
    }
}
