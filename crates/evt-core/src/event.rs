//! Events and the registration restrictions they carry.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;
use crate::wire;

/// Age bracket an event admits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeLimit {
    /// Any age within the general bounds.
    #[default]
    #[serde(rename = "none", alias = "")]
    None,
    /// Adults only.
    #[serde(rename = "18+")]
    Adult,
    /// Children up to `maxChildAge`.
    #[serde(rename = "children")]
    Children,
}

impl AgeLimit {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Adult => "18+",
            Self::Children => "children",
        }
    }
}

impl fmt::Display for AgeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgeLimit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(Self::None),
            "18+" => Ok(Self::Adult),
            "children" => Ok(Self::Children),
            other => Err(ValidationError::UnknownVariant {
                field: "age limit",
                value: other.to_string(),
            }),
        }
    }
}

/// Gender an event admits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderRestriction {
    #[default]
    #[serde(alias = "")]
    Any,
    Male,
    Female,
}

impl GenderRestriction {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for GenderRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GenderRestriction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "any" => Ok(Self::Any),
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(ValidationError::UnknownVariant {
                field: "gender restriction",
                value: other.to_string(),
            }),
        }
    }
}

/// Registration rules defined by an event.
///
/// Read-only input to [`crate::validate`]. `medical_required` and
/// `team_event` are informational; no registration rule depends on them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRestrictions {
    #[serde(default, deserialize_with = "wire::flag")]
    pub is_race: bool,
    #[serde(default)]
    pub age_limit: AgeLimit,
    #[serde(
        default,
        deserialize_with = "wire::opt_positive_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_child_age: Option<u32>,
    #[serde(default, deserialize_with = "wire::flag")]
    pub medical_required: bool,
    #[serde(default, deserialize_with = "wire::flag")]
    pub team_event: bool,
    #[serde(default)]
    pub gender_restriction: GenderRestriction,
}

/// An event as served by the events API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(flatten)]
    pub restrictions: EventRestrictions,
}

impl Event {
    /// Storage folder the server keys registrations by.
    ///
    /// Uses the explicit folder when the server supplied one, otherwise
    /// derives `YYYYMMDD_name` with the name lower-cased and whitespace removed.
    pub fn folder_name(&self) -> String {
        if let Some(folder) = self.folder.as_deref().filter(|f| !f.trim().is_empty()) {
            return folder.to_string();
        }
        let date: String = self.date.chars().filter(|c| *c != '-').collect();
        let name: String = self
            .name
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        format!("{date}_{name}")
    }
}
