//! Race entries and the `HH:MM:SS` elapsed-time codec.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::EntryId;
use crate::wire;

static ELAPSED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d):([0-5]\d)$").unwrap());

/// The elapsed text did not match `HH:MM:SS`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Time must be in HH:MM:SS format")]
pub struct ElapsedFormatError {
    pub input: String,
}

/// Formats a duration as zero-padded `HH:MM:SS`.
///
/// Sub-second remainders are dropped. Hours are not wrapped at 24, and
/// negative durations render as `00:00:00`.
pub fn format_elapsed(ms: i64) -> String {
    let total = ms.max(0) / 1000;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Parses strict `HH:MM:SS` (hours 00-23, minutes and seconds 00-59) into
/// milliseconds.
pub fn parse_elapsed(text: &str) -> Result<i64, ElapsedFormatError> {
    let err = || ElapsedFormatError {
        input: text.to_string(),
    };
    let caps = ELAPSED_RE.captures(text).ok_or_else(err)?;
    let field = |i: usize| caps[i].parse::<i64>().map_err(|_| err());
    let (hours, minutes, seconds) = (field(1)?, field(2)?, field(3)?);
    Ok((hours * 3600 + minutes * 60 + seconds) * 1000)
}

/// One recorded finish.
///
/// Timestamps are epoch milliseconds. `start_time` is the session start shared
/// by every finisher of that session and never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceEntry {
    pub id: EntryId,
    #[serde(deserialize_with = "wire::epoch_ms")]
    pub start_time: i64,
    #[serde(default, deserialize_with = "wire::opt_epoch_ms")]
    pub finish_time: Option<i64>,
}

impl RaceEntry {
    pub const fn new(id: EntryId, start_time: i64, finish_time: i64) -> Self {
        Self {
            id,
            start_time,
            finish_time: Some(finish_time),
        }
    }

    /// Finish minus start, when both are set and the difference fits in `i64`.
    pub fn elapsed_ms(&self) -> Option<i64> {
        self.finish_time
            .and_then(|finish| finish.checked_sub(self.start_time))
    }

    /// Elapsed time as `HH:MM:SS`; `00:00:00` when no finish is recorded
    /// or the timestamps cannot be subtracted.
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_ms().unwrap_or(0))
    }
}
