//! Registration management for one event folder.

use std::io::Write;

use anyhow::{Context, Result};
use evt_api::Participant;
use evt_core::{EventRestrictions, ExportTable, FieldErrors, NormalizedParticipant, ParticipantId, validate};

use super::util::{or_dash, write_field_errors};
use crate::cli::{ExportFormat, FormArgs};
use crate::render;

pub async fn list<W: Write>(
    writer: &mut W,
    client: &evt_api::Client,
    folder: &str,
    json: bool,
) -> Result<()> {
    let participants = client
        .list_participants(folder)
        .await
        .with_context(|| format!("failed to list participants of {folder}"))?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&participants)?)?;
    } else {
        write!(writer, "{}", render_participants(folder, &participants))?;
    }
    Ok(())
}

pub fn render_participants(folder: &str, participants: &[Participant]) -> String {
    if participants.is_empty() {
        return format!("No participants registered for {folder}.\n");
    }
    let rows = participants
        .iter()
        .map(|p| {
            let gender = p.gender.map(|g| g.to_string()).unwrap_or_default();
            let role = p.race_role.map(|r| r.to_string()).unwrap_or_default();
            vec![
                p.id.to_string(),
                format!("{} {}", p.name, p.surname).trim().to_string(),
                or_dash(&p.age).to_string(),
                or_dash(&gender).to_string(),
                or_dash(&p.email).to_string(),
                or_dash(&p.phone).to_string(),
                or_dash(&role).to_string(),
            ]
        })
        .collect();
    let table = ExportTable {
        title: format!("Participants of {folder}"),
        subtitle: Some(format!("{} registered", participants.len())),
        headers: ["ID", "Name", "Age", "Gender", "Email", "Phone", "Role"]
            .map(String::from)
            .to_vec(),
        rows,
    };
    render::export(ExportFormat::Text, &table)
}

/// Deletes a registration. Reports success only after the server confirms.
pub async fn delete<W: Write>(
    writer: &mut W,
    client: &evt_api::Client,
    folder: &str,
    id: &str,
) -> Result<()> {
    let id = ParticipantId::new(id)?;
    client
        .delete_participant(folder, &id)
        .await
        .with_context(|| format!("failed to delete participant {id}"))?;
    writeln!(writer, "Deleted participant {id}")?;
    Ok(())
}

/// Why an update cannot be sent.
#[derive(Debug)]
pub enum UpdateRejected {
    UnknownParticipant,
    Invalid(FieldErrors),
}

/// Applies `changes` to the stored registration and re-validates it.
pub fn prepare_update(
    participants: &[Participant],
    id: &ParticipantId,
    changes: &FormArgs,
    restrictions: &EventRestrictions,
) -> Result<NormalizedParticipant, UpdateRejected> {
    let current = participants
        .iter()
        .find(|p| &p.id == id)
        .ok_or(UpdateRejected::UnknownParticipant)?;
    let mut form = current.to_form();
    changes.apply(&mut form);
    validate(&form, restrictions)
        .into_participant()
        .map_err(UpdateRejected::Invalid)
}

/// Edits a registration. The edited form must pass the event's rules
/// before anything is sent. Returns whether the update was stored.
pub async fn update<W: Write>(
    writer: &mut W,
    client: &evt_api::Client,
    event_id: &str,
    id: &str,
    changes: &FormArgs,
) -> Result<bool> {
    let id = ParticipantId::new(id)?;
    let event = client
        .get_event(event_id)
        .await
        .with_context(|| format!("failed to load event {event_id}"))?;
    let folder = event.folder_name();
    let participants = client
        .list_participants(&folder)
        .await
        .with_context(|| format!("failed to list participants of {folder}"))?;

    let participant = match prepare_update(&participants, &id, changes, &event.restrictions) {
        Ok(participant) => participant,
        Err(UpdateRejected::UnknownParticipant) => {
            anyhow::bail!("no participant {id} in {folder}");
        }
        Err(UpdateRejected::Invalid(errors)) => {
            writeln!(writer, "Update for participant {id} is invalid")?;
            write_field_errors(writer, &errors)?;
            return Ok(false);
        }
    };

    client
        .update_participant(&folder, &id, &participant)
        .await
        .with_context(|| format!("failed to update participant {id}"))?;
    writeln!(writer, "Updated participant {id}")?;
    Ok(true)
}
