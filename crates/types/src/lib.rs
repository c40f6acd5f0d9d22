//! # Triage Types
//!
//! Small validated text primitives shared by the triage crates.
//!
//! Patient-entered free text arrives untrimmed and frequently blank. These types make the
//! "required and non-blank" rule a property of the value rather than something every caller
//! re-checks.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
    /// The trimmed input exceeded the permitted number of characters
    #[error("text exceeds maximum length of {max} characters")]
    TooLong { max: usize },
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction, so
/// `"  St. James's  "` and `"St. James's"` produce equal values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Creates a new `NonEmptyText` that is at most `max` characters long after trimming.
    pub fn bounded(input: impl AsRef<str>, max: usize) -> Result<Self, TextError> {
        let text = Self::new(input)?;
        if text.0.chars().count() > max {
            return Err(TextError::TooLong { max });
        }
        Ok(text)
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Trims optional text, collapsing blank values to `None`.
///
/// Forms submit optional fields as empty strings; storing them as `None` keeps
/// "not provided" distinct from content.
pub fn trimmed_or_none(input: Option<impl AsRef<str>>) -> Option<String> {
    input.and_then(|value| {
        let trimmed = value.as_ref().trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_surrounding_whitespace() {
        let text = NonEmptyText::new("  St. James's \n").expect("non-empty text");
        assert_eq!(text.as_str(), "St. James's");
    }

    #[test]
    fn new_rejects_whitespace_only() {
        assert_eq!(NonEmptyText::new("   \t"), Err(TextError::Empty));
    }

    #[test]
    fn bounded_counts_characters_not_bytes() {
        // "Seán" is 4 characters but 5 bytes
        NonEmptyText::bounded("Seán", 4).expect("within bound");
        assert_eq!(
            NonEmptyText::bounded("Seán", 3),
            Err(TextError::TooLong { max: 3 })
        );
    }

    #[test]
    fn trimmed_or_none_collapses_blank_values() {
        assert_eq!(trimmed_or_none(Some("  ")), None);
        assert_eq!(trimmed_or_none(None::<&str>), None);
        assert_eq!(
            trimmed_or_none(Some(" Cardiology ")),
            Some("Cardiology".to_string())
        );
    }

    #[test]
    fn deserialize_rejects_blank_json_string() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"").expect_err("blank rejected");
        assert!(err.to_string().contains("text cannot be empty"));
    }
}
