//! Participant eligibility validation.
//!
//! [`validate`] is a pure function from a raw registration form and the
//! event's [`EventRestrictions`] to a [`Validation`]: per-field error messages
//! plus the normalized form. Normalization always runs, so callers can show
//! corrected values next to the errors.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::event::{AgeLimit, EventRestrictions, GenderRestriction};
use crate::types::ValidationError;

/// Oldest accepted participant age.
pub const MAX_AGE: u32 = 150;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?[0-9]{7,15}$").unwrap());

/// Participant gender as entered on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            other => Err(ValidationError::UnknownVariant {
                field: "gender",
                value: other.to_string(),
            }),
        }
    }
}

/// Role a participant takes in a race event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceRole {
    Spectator,
    #[serde(alias = "runner")]
    Participant,
}

impl RaceRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Spectator => "spectator",
            Self::Participant => "participant",
        }
    }
}

impl fmt::Display for RaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RaceRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spectator" => Ok(Self::Spectator),
            "participant" | "runner" => Ok(Self::Participant),
            other => Err(ValidationError::UnknownVariant {
                field: "race role",
                value: other.to_string(),
            }),
        }
    }
}

/// Raw registration form, exactly as the user typed it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub race_role: Option<RaceRole>,
}

/// Form fields that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Surname,
    Age,
    Email,
    Phone,
    Gender,
    RaceRole,
}

impl Field {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Surname => "surname",
            Self::Age => "age",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Gender => "gender",
            Self::RaceRole => "raceRole",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-scoped validation messages. At most one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    fn set(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    /// Message for `field`, if any.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(String::is_empty)
    }

    pub fn len(&self) -> usize {
        self.0.values().filter(|m| !m.is_empty()).count()
    }

    /// Errors in field order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Form after trimming and capitalization, valid or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedForm {
    pub name: String,
    pub surname: String,
    /// Trimmed age text, kept so the form can be re-rendered as typed.
    pub age_text: String,
    /// Parsed age, when the text is an integer.
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub email: String,
    pub phone: String,
    pub race_role: Option<RaceRole>,
}

/// A participant that passed validation.
///
/// `age` is within `1..=MAX_AGE`, `email` and `phone` are empty or well
/// formed, and `race_role` is set exactly when the event is a race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedParticipant {
    pub name: String,
    pub surname: String,
    pub age: u32,
    pub gender: Option<Gender>,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race_role: Option<RaceRole>,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub errors: FieldErrors,
    pub normalized: NormalizedForm,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts into a submittable participant, or returns the field errors.
    pub fn into_participant(self) -> Result<NormalizedParticipant, FieldErrors> {
        if !self.is_valid() {
            return Err(self.errors);
        }
        let form = self.normalized;
        let age = form
            .age
            .and_then(|a| u32::try_from(a).ok())
            .filter(|a| (1..=MAX_AGE).contains(a));
        let Some(age) = age else {
            let mut errors = FieldErrors::default();
            errors.set(Field::Age, "Age must be a positive number");
            return Err(errors);
        };
        Ok(NormalizedParticipant {
            name: form.name,
            surname: form.surname,
            age,
            gender: form.gender,
            email: form.email,
            phone: form.phone,
            race_role: form.race_role,
        })
    }
}

/// Upper-cases the first character and lower-cases the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

/// Result of reading the age field.
enum AgeInput {
    /// Not an integer at all.
    Unparsed,
    /// An integer; all-digit values too large for `i64` saturate.
    Parsed(i64),
}

fn parse_age(text: &str) -> AgeInput {
    if let Ok(n) = text.parse::<i64>() {
        return AgeInput::Parsed(n);
    }
    let digits = text.strip_prefix('+').unwrap_or(text);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        AgeInput::Parsed(i64::MAX)
    } else {
        AgeInput::Unparsed
    }
}

fn normalize(form: &ParticipantForm, restrictions: &EventRestrictions) -> NormalizedForm {
    let age_text = form.age.trim().to_string();
    let age = match parse_age(&age_text) {
        AgeInput::Parsed(n) => Some(n),
        AgeInput::Unparsed => None,
    };
    NormalizedForm {
        name: capitalize(form.name.trim()),
        surname: capitalize(form.surname.trim()),
        age_text,
        age,
        gender: form.gender,
        email: form.email.trim().to_string(),
        phone: form.phone.trim().to_string(),
        race_role: form.race_role.filter(|_| restrictions.is_race),
    }
}

/// Validates a registration form against an event's restrictions.
///
/// Rules are independent except for age, where an event bound replaces the
/// general age message rather than adding to it.
pub fn validate(form: &ParticipantForm, restrictions: &EventRestrictions) -> Validation {
    let normalized = normalize(form, restrictions);
    let mut errors = FieldErrors::default();

    if normalized.name.is_empty() {
        errors.set(Field::Name, "Name is required");
    }
    if normalized.surname.is_empty() {
        errors.set(Field::Surname, "Surname is required");
    }

    match normalized.age {
        None => errors.set(Field::Age, "Age must be a positive number"),
        Some(age) => {
            if age < 1 {
                errors.set(Field::Age, "Age must be a positive number");
            } else if age > i64::from(MAX_AGE) {
                errors.set(Field::Age, format!("Age must not exceed {MAX_AGE}"));
            }
            match restrictions.age_limit {
                AgeLimit::Adult if age < 18 => {
                    errors.set(Field::Age, "Sorry, this event is 18+ only");
                }
                AgeLimit::Children => {
                    if let Some(max) = restrictions.max_child_age {
                        if age > i64::from(max) {
                            errors.set(
                                Field::Age,
                                format!("Sorry, only children up to {max} years can participate"),
                            );
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if !normalized.email.is_empty() && !EMAIL_RE.is_match(&normalized.email) {
        errors.set(Field::Email, "Invalid email format");
    }
    if !normalized.phone.is_empty() && !PHONE_RE.is_match(&normalized.phone) {
        errors.set(Field::Phone, "Invalid phone number format");
    }

    let required_gender = match restrictions.gender_restriction {
        GenderRestriction::Any => None,
        GenderRestriction::Male => Some(Gender::Male),
        GenderRestriction::Female => Some(Gender::Female),
    };
    if let Some(required) = required_gender {
        if normalized.gender != Some(required) {
            errors.set(
                Field::Gender,
                format!("Sorry, this event is for {required} only"),
            );
        }
    }

    if restrictions.is_race && normalized.race_role.is_none() {
        errors.set(Field::RaceRole, "Please select your race role");
    }

    tracing::debug!(
        errors = errors.len(),
        is_race = restrictions.is_race,
        age_limit = %restrictions.age_limit,
        "validated participant form"
    );

    Validation { errors, normalized }
}
