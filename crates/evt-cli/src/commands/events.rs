//! Event listing.

use std::io::Write;

use anyhow::{Context, Result};
use evt_core::{Event, ExportTable};

use crate::cli::ExportFormat;
use crate::render;

pub async fn run<W: Write>(writer: &mut W, client: &evt_api::Client, json: bool) -> Result<()> {
    let events = client.list_events().await.context("failed to list events")?;
    tracing::debug!(count = events.len(), "fetched events");
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&events)?)?;
    } else {
        write!(writer, "{}", render_events(&events))?;
    }
    Ok(())
}

/// Events as an aligned table, with the folder each one stores registrations under.
pub fn render_events(events: &[Event]) -> String {
    if events.is_empty() {
        return "No events found.\n".to_string();
    }
    let rows = events
        .iter()
        .map(|event| {
            vec![
                event.date.clone(),
                event.time.clone().unwrap_or_default(),
                event.name.clone(),
                event.place.clone().unwrap_or_default(),
                event.folder_name(),
                if event.restrictions.is_race { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    let table = ExportTable {
        title: "Events".to_string(),
        subtitle: None,
        headers: ["Date", "Time", "Name", "Place", "Folder", "Race"]
            .map(String::from)
            .to_vec(),
        rows,
    };
    render::export(ExportFormat::Text, &table)
}
