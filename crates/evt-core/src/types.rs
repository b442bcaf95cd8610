//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// An enumerated wire value was not recognized.
    #[error("invalid {field}: {value}")]
    UnknownVariant { field: &'static str, value: String },
}

/// Identifier as it appears on the wire: the server mixes strings and numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            ///
            /// Surrounding whitespace is trimmed before the emptiness check.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                if trimmed.len() == id.len() {
                    Ok(Self(id))
                } else {
                    Ok(Self(trimmed.to_string()))
                }
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = RawId::deserialize(deserializer)?;
                Self::new(String::from(raw)).map_err(serde::de::Error::custom)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

define_string_id!(
    /// A validated event identifier.
    ///
    /// Either the server-assigned id or the event's folder name; both address
    /// the same resource on the events server.
    EventId, "event ID"
);

define_string_id!(
    /// A validated race entry label.
    ///
    /// Entry ids are display labels (usually a bib or finish sequence number),
    /// not positional indices. They stay stable when other entries are deleted.
    EntryId, "entry ID"
);

define_string_id!(
    /// A validated participant identifier assigned by the server.
    ParticipantId, "participant ID"
);

impl EntryId {
    /// Builds the label for the `n`th finisher of a session.
    pub fn sequence(n: u64) -> Self {
        Self(n.to_string())
    }

    /// Numeric part of the label, ignoring any non-digit prefix.
    ///
    /// `"#12"` and `"12"` both yield 12. Returns `None` when the label has
    /// no digits. Digit runs of any length are accepted.
    pub fn numeric_value(&self) -> Option<LabelNumber<'_>> {
        let rest = self.0.trim_start_matches(|c: char| !c.is_ascii_digit());
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let digits = &rest[..end];
        if digits.is_empty() {
            return None;
        }
        let significant = digits.trim_start_matches('0');
        if significant.is_empty() {
            Some(LabelNumber(&digits[digits.len() - 1..]))
        } else {
            Some(LabelNumber(significant))
        }
    }
}

/// Unsigned decimal taken from an entry label, ordered by value.
///
/// Holds the digits without leading zeros, so longer means larger and equal
/// lengths compare digit by digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelNumber<'a>(&'a str);

impl<'a> LabelNumber<'a> {
    pub const fn digits(&self) -> &'a str {
        self.0
    }
}

impl Ord for LabelNumber<'_> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(other.0))
    }
}

impl PartialOrd for LabelNumber<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_rejects_empty() {
        assert!(EventId::new("").is_err());
        assert!(EventId::new("   ").is_err());
        assert!(EventId::new("20250601_cityrun").is_ok());
    }

    #[test]
    fn ids_are_trimmed() {
        let id = EntryId::new("  7 ").unwrap();
        assert_eq!(id.as_str(), "7");
    }

    #[test]
    fn entry_id_accepts_numbers_on_the_wire() {
        let parsed: EntryId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed.as_str(), "42");

        let parsed: EntryId = serde_json::from_str("\"#3\"").unwrap();
        assert_eq!(parsed.as_str(), "#3");
    }

    #[test]
    fn entry_id_serializes_as_string() {
        let id = EntryId::sequence(5);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"5\"");
    }

    #[test]
    fn entry_id_serde_rejects_empty() {
        let result: Result<EntryId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn numeric_value_strips_prefix() {
        let digits = |label: &str| {
            EntryId::new(label)
                .unwrap()
                .numeric_value()
                .map(|n| n.digits().to_string())
        };
        assert_eq!(digits("#12").as_deref(), Some("12"));
        assert_eq!(digits("12").as_deref(), Some("12"));
        assert_eq!(digits("bib-007x").as_deref(), Some("7"));
        assert_eq!(digits("000").as_deref(), Some("0"));
        assert_eq!(digits("abc"), None);
    }

    #[test]
    fn numeric_value_orders_digit_runs_of_any_length() {
        let huge = EntryId::new("99999999999999999999999").unwrap();
        let five = EntryId::new("#5").unwrap();
        let padded = EntryId::new("0005").unwrap();
        let ten = EntryId::new("10").unwrap();
        assert!(huge.numeric_value() > five.numeric_value());
        assert_eq!(five.numeric_value(), padded.numeric_value());
        assert!(ten.numeric_value() > five.numeric_value());
        assert!(EntryId::new("0").unwrap().numeric_value() < five.numeric_value());
    }

    #[test]
    fn participant_id_as_ref() {
        let id = ParticipantId::new("p-1").unwrap();
        let s: &str = id.as_ref();
        assert_eq!(s, "p-1");
    }
}
