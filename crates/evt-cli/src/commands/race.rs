//! Interactive race console.
//!
//! Reads one command per line and drives a [`StopwatchController`]. Entry
//! indices are 1-based as shown by `list`. Command mistakes are reported and
//! the console keeps running; only I/O failures end it.

use std::fmt;
use std::io::Write;

use anyhow::Result;
use chrono::{Local, TimeZone};
use clap::ValueEnum;
use evt_core::{
    Clock, EntryError, EntryStore, EventId, ExportTable, GroupKey, ResultsRepository, SortColumn,
    StopwatchController, SystemClock, format_elapsed,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::ExportFormat;
use crate::render;

const HELP: &str = "Commands:
  start                     start the clock (clears the current entries)
  finish | f                record a finisher now
  edit <n> <id> <HH:MM:SS>  change entry n
  delete <n>                remove entry n
  sort id|time              sort entries; repeat to flip the order
  list                      show entries
  status                    show the clock
  export text|csv|html      print the entries as a document
  save                      upload the entries to the server
  new                       reset the clock and entries
  quit                      leave the console";

/// Whether the console should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Start,
    Finish,
    Edit {
        index: usize,
        id: String,
        elapsed: String,
    },
    Delete {
        index: usize,
    },
    Sort(SortColumn),
    List,
    Status,
    Export(ExportFormat),
    Save,
    New,
    Help,
    Quit,
}

fn parse_index(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("invalid entry number: {text}")),
    }
}

/// Parses one console line. Blank lines yield `None`.
fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, args)) = words.split_first() else {
        return Ok(None);
    };
    let command = match (name.to_lowercase().as_str(), args) {
        ("start", []) => Command::Start,
        ("finish" | "f", []) => Command::Finish,
        ("edit", [index, id, elapsed]) => Command::Edit {
            index: parse_index(index)?,
            id: (*id).to_string(),
            elapsed: (*elapsed).to_string(),
        },
        ("edit", _) => return Err("usage: edit <n> <id> <HH:MM:SS>".to_string()),
        ("delete", [index]) => Command::Delete {
            index: parse_index(index)?,
        },
        ("delete", _) => return Err("usage: delete <n>".to_string()),
        ("sort", [column]) => Command::Sort(column.parse().map_err(|_| "usage: sort id|time")?),
        ("sort", _) => return Err("usage: sort id|time".to_string()),
        ("list", []) => Command::List,
        ("status", []) => Command::Status,
        ("export", [format]) => Command::Export(
            ExportFormat::from_str(format, true).map_err(|_| "usage: export text|csv|html")?,
        ),
        ("export", _) => return Err("usage: export text|csv|html".to_string()),
        ("save", []) => Command::Save,
        ("new", []) => Command::New,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", []) => Command::Quit,
        (other, _) => return Err(format!("unknown command: {other} (type help)")),
    };
    Ok(Some(command))
}

/// A timing session bound to one event's results.
pub struct RaceConsole<R, C: Clock = SystemClock, Tz: TimeZone = Local> {
    event: EventId,
    repo: R,
    stopwatch: StopwatchController<C>,
    tz: Tz,
}

impl<R> RaceConsole<R> {
    /// A console on the system clock, showing session dates in local time.
    pub fn new(event: EventId, repo: R) -> Self {
        Self::with_clock(event, repo, StopwatchController::default(), Local)
    }
}

impl<R, C, Tz> RaceConsole<R, C, Tz>
where
    C: Clock,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    pub fn with_clock(
        event: EventId,
        repo: R,
        stopwatch: StopwatchController<C>,
        tz: Tz,
    ) -> Self {
        Self {
            event,
            repo,
            stopwatch,
            tz,
        }
    }

    pub const fn event(&self) -> &EventId {
        &self.event
    }

    pub const fn stopwatch(&self) -> &StopwatchController<C> {
        &self.stopwatch
    }

    pub const fn repo(&self) -> &R {
        &self.repo
    }

    fn session_key(&self) -> Option<GroupKey> {
        self.stopwatch
            .session_start()
            .map(|start| GroupKey::from_start(start, &self.tz))
    }

    /// Runs one console line, writing any response to `out`.
    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow>
    where
        R: ResultsRepository,
    {
        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(message) => {
                writeln!(out, "error: {message}")?;
                return Ok(Flow::Continue);
            }
        };
        tracing::debug!(?command, "console command");

        match command {
            Command::Start => {
                let discarded = self.stopwatch.store().len();
                match self.stopwatch.start() {
                    Ok(_) => {
                        if discarded > 0 {
                            writeln!(out, "Discarded {discarded} entries")?;
                        }
                        if let Some(key) = self.session_key() {
                            writeln!(out, "Race started: {key}")?;
                        }
                    }
                    Err(err) => writeln!(out, "error: {err}")?,
                }
            }
            Command::Finish => match self.stopwatch.finish() {
                Ok(entry) => writeln!(out, "Finisher {}: {}", entry.id, entry.elapsed_display())?,
                Err(err) => writeln!(out, "error: {err}")?,
            },
            Command::Edit { index, id, elapsed } => {
                match self.stopwatch.store_mut().edit(index, &id, &elapsed) {
                    Ok(entry) => writeln!(
                        out,
                        "Entry {}: {} {}",
                        index + 1,
                        entry.id,
                        entry.elapsed_display()
                    )?,
                    Err(err) => write_entry_error(out, index, &err)?,
                }
            }
            Command::Delete { index } => match self.stopwatch.store_mut().delete(index) {
                Ok(entry) => writeln!(out, "Deleted entry {} ({})", index + 1, entry.id)?,
                Err(err) => write_entry_error(out, index, &err)?,
            },
            Command::Sort(column) => {
                self.stopwatch.store_mut().sort(column);
                write!(out, "{}", render_entries(self.stopwatch.store()))?;
            }
            Command::List => write!(out, "{}", render_entries(self.stopwatch.store()))?,
            Command::Status => {
                let count = self.stopwatch.store().len();
                match self.stopwatch.running_elapsed_ms() {
                    Some(elapsed) => writeln!(
                        out,
                        "Running {}, {count} entries",
                        format_elapsed(elapsed)
                    )?,
                    None => writeln!(out, "Clock stopped, {count} entries")?,
                }
            }
            Command::Export(format) => {
                let subtitle = self.session_key().map(|key| format!("Date: {key}"));
                let table = ExportTable::race_results(subtitle, self.stopwatch.store().entries());
                write!(out, "{}", render::export(format, &table))?;
            }
            Command::Save => self.save(out).await?,
            Command::New => {
                self.stopwatch.reset();
                writeln!(out, "Race reset")?;
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Uploads the live entries. They stay in the console either way.
    async fn save<W: Write>(&self, out: &mut W) -> Result<()>
    where
        R: ResultsRepository,
    {
        let entries = self.stopwatch.store().entries();
        if entries.is_empty() {
            writeln!(out, "Nothing to save")?;
            return Ok(());
        }
        match self.repo.save_results(&self.event, entries).await {
            Ok(()) => writeln!(out, "Saved {} entries to {}", entries.len(), self.event)?,
            Err(err) => {
                tracing::warn!(event = %self.event, error = %err, "saving results failed");
                writeln!(out, "error: failed to save results: {err}")?;
            }
        }
        Ok(())
    }
}

/// Reports an entry error using the 1-based numbering the console shows.
fn write_entry_error<W: Write>(out: &mut W, index: usize, err: &EntryError) -> std::io::Result<()> {
    match err {
        EntryError::IndexOutOfRange { len, .. } => {
            writeln!(out, "error: no entry {} (session has {len})", index + 1)
        }
        other => writeln!(out, "error: {other}"),
    }
}

/// Live entries with 1-based numbers and the active sort marked in the header.
fn render_entries(store: &EntryStore) -> String {
    if store.is_empty() {
        return "No entries yet.\n".to_string();
    }
    let header = |label: &str, column: SortColumn| match store.sort_state() {
        Some((sorted, order)) if sorted == column => format!("{label} {}", order.arrow()),
        _ => label.to_string(),
    };
    let rows: Vec<[String; 3]> = store
        .entries()
        .iter()
        .enumerate()
        .map(|(i, e)| [(i + 1).to_string(), e.id.to_string(), e.elapsed_display()])
        .collect();
    let headers = [
        "#".to_string(),
        header("ID", SortColumn::Id),
        header("Time", SortColumn::Time),
    ];

    let mut widths = headers.clone().map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let line = |cells: &[String; 3]| {
        format!(
            "{:>w0$}  {:<w1$}  {}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1]
        )
        .trim_end()
        .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(&headers));
    out.push('\n');
    for row in &rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run<R, C, Tz>(console: &mut RaceConsole<R, C, Tz>) -> Result<()>
where
    R: ResultsRepository,
    C: Clock,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();
    writeln!(
        stdout,
        "Race console for {}. Type help for commands.",
        console.event()
    )?;
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if console.handle_line(&line, &mut stdout).await? == Flow::Quit {
            break;
        }
    }
    let unsaved = console.stopwatch().store().len();
    if unsaved > 0 {
        tracing::debug!(unsaved, "console closed with entries in memory");
    }
    Ok(())
}
