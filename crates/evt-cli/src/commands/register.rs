//! Participant registration.

use std::io::Write;

use anyhow::{Context, Result};
use evt_core::{Event, NormalizedParticipant, ParticipantForm, validate};

use super::util::{write_field_errors, write_participant};

/// Validates the form against the event's restrictions. Prints the errors
/// and returns `None` when it is rejected.
pub fn prepare<W: Write>(
    writer: &mut W,
    event: &Event,
    form: &ParticipantForm,
) -> Result<Option<NormalizedParticipant>> {
    match validate(form, &event.restrictions).into_participant() {
        Ok(participant) => Ok(Some(participant)),
        Err(errors) => {
            writeln!(writer, "Registration for {} is invalid", event.name)?;
            write_field_errors(writer, &errors)?;
            Ok(None)
        }
    }
}

/// Registers a participant. Nothing is sent unless the form is valid.
/// Returns whether the server accepted the registration.
pub async fn run<W: Write>(
    writer: &mut W,
    client: &evt_api::Client,
    event_id: &str,
    form: &ParticipantForm,
) -> Result<bool> {
    let event = client
        .get_event(event_id)
        .await
        .with_context(|| format!("failed to load event {event_id}"))?;

    let Some(participant) = prepare(writer, &event, form)? else {
        return Ok(false);
    };

    let folder = event.folder_name();
    let receipt = client
        .register(&folder, &participant)
        .await
        .with_context(|| format!("failed to register for {}", event.name))?;
    tracing::debug!(%folder, "registration accepted");

    writeln!(
        writer,
        "{}",
        receipt.message.as_deref().unwrap_or("Registration successful!")
    )?;
    write_participant(writer, &participant)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    use evt_core::{EventRestrictions, Gender, GenderRestriction, RaceRole};
    use insta::assert_snapshot;

    fn race() -> Event {
        Event {
            name: "City Run".to_string(),
            date: "2025-06-01".to_string(),
            restrictions: EventRestrictions {
                is_race: true,
                gender_restriction: GenderRestriction::Female,
                ..EventRestrictions::default()
            },
            ..Event::default()
        }
    }

    #[test]
    fn prepare_rejects_form_that_breaks_event_rules() {
        let form = ParticipantForm {
            name: "Tom".to_string(),
            surname: "Nowak".to_string(),
            age: "40".to_string(),
            gender: Some(Gender::Male),
            ..ParticipantForm::default()
        };
        let mut output = Vec::new();
        let prepared = prepare(&mut output, &race(), &form).unwrap();
        assert_eq!(prepared, None);
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Registration for City Run is invalid
          gender: Sorry, this event is for female only
          raceRole: Please select your race role
        ");
    }

    #[test]
    fn prepare_returns_normalized_participant() {
        let form = ParticipantForm {
            name: "ola".to_string(),
            surname: "nowak".to_string(),
            age: "40".to_string(),
            gender: Some(Gender::Female),
            race_role: Some(RaceRole::Spectator),
            ..ParticipantForm::default()
        };
        let mut output = Vec::new();
        let participant = prepare(&mut output, &race(), &form).unwrap().unwrap();
        assert!(output.is_empty());
        assert_eq!(participant.name, "Ola");
        assert_eq!(participant.race_role, Some(RaceRole::Spectator));
        assert_eq!(
            serde_json::to_string(&participant).unwrap(),
            r#"{"name":"Ola","surname":"Nowak","age":40,"gender":"female","email":"","phone":"","raceRole":"spectator"}"#
        );
    }
}
