//! Saved results: grouped listing, export and group deletion.

use std::fmt;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::TimeZone;
use evt_core::{EntryId, EventId, GroupDeleteError, ResultsAggregator, ResultsRepository};

use crate::cli::ExportFormat;
use crate::render;

/// Fetches an event's results and groups them by session in `tz`.
pub async fn load<R, Tz>(repo: &R, event: &EventId, tz: &Tz) -> Result<ResultsAggregator>
where
    R: ResultsRepository,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let entries = repo
        .fetch_results(event)
        .await
        .with_context(|| format!("failed to fetch results for {event}"))?;
    tracing::debug!(%event, count = entries.len(), "fetched results");
    Ok(ResultsAggregator::group(entries, tz))
}

pub async fn list<W, R, Tz>(
    writer: &mut W,
    repo: &R,
    event: &EventId,
    tz: &Tz,
    json: bool,
) -> Result<()>
where
    W: Write,
    R: ResultsRepository,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let results = load(repo, event, tz).await?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(results.groups())?)?;
    } else {
        write!(writer, "{}", render_groups(event, &results))?;
    }
    Ok(())
}

/// Sessions in first-seen order, each with its `ID  Time` rows.
pub fn render_groups(event: &EventId, results: &ResultsAggregator) -> String {
    if results.is_empty() {
        return format!("No results saved for {event}.\n");
    }
    let mut lines = Vec::new();
    for (i, group) in results.groups().iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        let count = group.entries.len();
        let noun = if count == 1 { "entry" } else { "entries" };
        lines.push(format!("{} ({count} {noun})", group.key));
        let width = group
            .entries
            .iter()
            .map(|e| e.id.as_str().chars().count())
            .max()
            .unwrap_or(0);
        lines.extend(group.entries.iter().map(|entry| {
            format!("  {:<width$}  {}", entry.id.as_str(), entry.elapsed_display())
        }));
    }
    lines.join("\n") + "\n"
}

/// Renders one session and writes it to `output`, or to `writer` when no
/// path is given.
pub async fn export<W, R, Tz>(
    writer: &mut W,
    repo: &R,
    event: &EventId,
    tz: &Tz,
    group: &str,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()>
where
    W: Write,
    R: ResultsRepository,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let results = load(repo, event, tz).await?;
    let table = results
        .export_rows(group)
        .with_context(|| format!("no result group {group:?} for {event}"))?;
    let document = render::export(format, &table);

    match output {
        Some(path) => {
            std::fs::write(path, &document)
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(writer, "Exported {} entries to {}", table.rows.len(), path.display())?;
        }
        None => write!(writer, "{document}")?,
    }
    Ok(())
}

/// Deletes a whole session from the server, one entry at a time.
pub async fn delete_group<W, R, Tz>(
    writer: &mut W,
    repo: &R,
    event: &EventId,
    tz: &Tz,
    group: &str,
) -> Result<()>
where
    W: Write,
    R: ResultsRepository,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut results = load(repo, event, tz).await?;
    match results.delete_group(group, event, repo).await {
        Ok(deleted) => {
            writeln!(writer, "Deleted {deleted} entries from {group}")?;
            Ok(())
        }
        Err(err) => {
            if let GroupDeleteError::Partial {
                deleted, remaining, ..
            } = &err
            {
                let total = deleted.len().saturating_add(remaining.len());
                let still: Vec<&str> = remaining.iter().map(EntryId::as_str).collect();
                writeln!(
                    writer,
                    "Deleted {} of {total} entries from {group}",
                    deleted.len()
                )?;
                writeln!(writer, "Still on the server: {}", still.join(", "))?;
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use evt_core::RaceEntry;
    use insta::assert_snapshot;

    use crate::testing::FakeRepo;

    // 2024-06-01T10:00:00Z
    const SESSION_A: i64 = 1_717_236_000_000;
    // 2024-06-01T14:30:00Z
    const SESSION_B: i64 = 1_717_252_200_000;

    const GROUP_A: &str = "01/06/2024 at 10:00";

    fn entry(id: &str, start: i64, elapsed_secs: i64) -> RaceEntry {
        RaceEntry::new(EntryId::new(id).unwrap(), start, start + elapsed_secs * 1000)
    }

    fn repo() -> FakeRepo {
        FakeRepo::with(vec![
            entry("1", SESSION_A, 330),
            entry("12", SESSION_A, 190),
            entry("1", SESSION_B, 100),
        ])
    }

    fn event() -> EventId {
        EventId::new("evt-1").unwrap()
    }

    #[tokio::test]
    async fn list_groups_by_session() {
        let mut output = Vec::new();
        list(&mut output, &repo(), &event(), &Utc, false).await.unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        01/06/2024 at 10:00 (2 entries)
          1   00:05:30
          12  00:03:10

        01/06/2024 at 14:30 (1 entry)
          1  00:01:40
        ");
    }

    #[tokio::test]
    async fn list_json_keeps_wire_shape() {
        let mut output = Vec::new();
        list(&mut output, &FakeRepo::with(vec![entry("1", SESSION_B, 100)]), &event(), &Utc, true)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value[0]["key"], "01/06/2024 at 14:30");
        assert_eq!(value[0]["entries"][0]["startTime"], SESSION_B);
    }

    #[tokio::test]
    async fn list_reports_no_results() {
        let mut output = Vec::new();
        list(&mut output, &FakeRepo::default(), &event(), &Utc, false)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "No results saved for evt-1.\n");
    }

    #[tokio::test]
    async fn export_csv_to_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("results.csv");
        let mut output = Vec::new();
        export(
            &mut output,
            &repo(),
            &event(),
            &Utc,
            GROUP_A,
            ExportFormat::Csv,
            Some(&path),
        )
        .await
        .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "ID,Time\r\n1,00:05:30\r\n12,00:03:10\r\n");
        let message = String::from_utf8(output).unwrap();
        assert!(message.starts_with("Exported 2 entries to "));
    }

    #[tokio::test]
    async fn export_unknown_group_fails() {
        let mut output = Vec::new();
        let err = export(
            &mut output,
            &repo(),
            &event(),
            &Utc,
            "02/06/2024 at 10:00",
            ExportFormat::Text,
            None,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no result group"));
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn delete_group_removes_session_only() {
        let repo = repo();
        let mut output = Vec::new();
        delete_group(&mut output, &repo, &event(), &Utc, GROUP_A)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            format!("Deleted 2 entries from {GROUP_A}\n")
        );
        let left = repo.stored();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].start_time, SESSION_B);
    }

    #[tokio::test]
    async fn delete_group_reports_what_is_left() {
        let repo = FakeRepo {
            fail_delete_at: Some(1),
            ..repo()
        };
        let mut output = Vec::new();
        let err = delete_group(&mut output, &repo, &event(), &Utc, GROUP_A)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("deleted 1 of 2 entries in {GROUP_A}"));
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Deleted 1 of 2 entries from 01/06/2024 at 10:00
        Still on the server: 12
        ");
        assert_eq!(repo.stored().len(), 2);
    }
}
