//! Offline registration check.

use std::io::Write;

use anyhow::Result;
use evt_core::{EventRestrictions, FieldErrors, NormalizedParticipant, ParticipantForm, validate};
use serde::Serialize;

use super::util::{write_field_errors, write_participant};

#[derive(Serialize)]
struct Report<'a> {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    participant: Option<&'a NormalizedParticipant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

/// Validates `form` and reports the outcome. Returns whether it is valid.
pub fn run<W: Write>(
    writer: &mut W,
    form: &ParticipantForm,
    restrictions: &EventRestrictions,
    json: bool,
) -> Result<bool> {
    let outcome = validate(form, restrictions).into_participant();
    let valid = outcome.is_ok();

    if json {
        let report = Report {
            valid,
            participant: outcome.as_ref().ok(),
            errors: outcome.as_ref().err(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(valid);
    }

    match outcome {
        Ok(participant) => {
            writeln!(writer, "Registration is valid")?;
            write_participant(writer, &participant)?;
        }
        Err(errors) => {
            writeln!(writer, "Registration is invalid")?;
            write_field_errors(writer, &errors)?;
        }
    }
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    use evt_core::{AgeLimit, Gender, RaceRole};
    use insta::assert_snapshot;

    fn form() -> ParticipantForm {
        ParticipantForm {
            name: " anna ".to_string(),
            surname: "KOWALSKA".to_string(),
            age: "30".to_string(),
            gender: Some(Gender::Female),
            email: "anna@example.com".to_string(),
            phone: String::new(),
            race_role: Some(RaceRole::Participant),
        }
    }

    fn render(form: &ParticipantForm, restrictions: &EventRestrictions, json: bool) -> (bool, String) {
        let mut output = Vec::new();
        let valid = run(&mut output, form, restrictions, json).unwrap();
        (valid, String::from_utf8(output).unwrap())
    }

    #[test]
    fn valid_race_registration() {
        let restrictions = EventRestrictions {
            is_race: true,
            ..EventRestrictions::default()
        };
        let (valid, output) = render(&form(), &restrictions, false);
        assert!(valid);
        assert_snapshot!(output, @r"
        Registration is valid
          name:      Anna
          surname:   Kowalska
          age:       30
          gender:    female
          email:     anna@example.com
          phone:     -
          race role: participant
        ");
    }

    #[test]
    fn role_is_dropped_outside_races() {
        let (valid, output) = render(&form(), &EventRestrictions::default(), false);
        assert!(valid);
        assert!(!output.contains("race role"));
    }

    #[test]
    fn invalid_registration_lists_errors_in_form_order() {
        let form = ParticipantForm {
            name: String::new(),
            age: "16".to_string(),
            email: "not-an-email".to_string(),
            ..form()
        };
        let restrictions = EventRestrictions {
            age_limit: AgeLimit::Adult,
            ..EventRestrictions::default()
        };
        let (valid, output) = render(&form, &restrictions, false);
        assert!(!valid);
        assert_snapshot!(output, @r"
        Registration is invalid
          name: Name is required
          age: Sorry, this event is 18+ only
          email: Invalid email format
        ");
    }

    #[test]
    fn json_report_for_invalid_form() {
        let form = ParticipantForm {
            name: String::new(),
            age: "200".to_string(),
            ..form()
        };
        let (valid, output) = render(&form, &EventRestrictions::default(), true);
        assert!(!valid);
        assert_snapshot!(output, @r#"
        {
          "valid": false,
          "errors": {
            "name": "Name is required",
            "age": "Age must not exceed 150"
          }
        }
        "#);
    }
}
