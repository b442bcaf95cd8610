//! Live-session entry list: edit, delete and sort.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timing::{ElapsedFormatError, RaceEntry, parse_elapsed};
use crate::types::EntryId;

/// Errors from entry store mutations. The store is unchanged when one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("no entry at index {index} (session has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("entry id cannot be empty")]
    EmptyId,
    #[error("entry id {id} is already used in this session")]
    DuplicateId { id: String },
    #[error(transparent)]
    InvalidTime(#[from] ElapsedFormatError),
    #[error("finish time is out of range for this entry's start time")]
    TimeOutOfRange,
}

/// Column the entry table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    Id,
    Time,
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Id => "id",
            Self::Time => "time",
        })
    }
}

impl std::str::FromStr for SortColumn {
    type Err = crate::types::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" => Ok(Self::Id),
            "time" => Ok(Self::Time),
            other => Err(crate::types::ValidationError::UnknownVariant {
                field: "sort column",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Header indicator: up for ascending, down for descending.
    #[must_use]
    pub const fn arrow(self) -> char {
        match self {
            Self::Asc => '↑',
            Self::Desc => '↓',
        }
    }
}

/// Compares optional keys in `order`, keeping `None` after every `Some`.
fn compare_keys<T: Ord>(a: Option<T>, b: Option<T>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Asc => a.cmp(&b),
            SortOrder::Desc => b.cmp(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Entries recorded during the current session.
///
/// Exclusively owned by the stopwatch; every mutation is synchronous and
/// leaves the list in a consistent state.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    entries: Vec<RaceEntry>,
    sort: Option<(SortColumn, SortOrder)>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[RaceEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&RaceEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current sort column and order, if a sort has been applied.
    pub const fn sort_state(&self) -> Option<(SortColumn, SortOrder)> {
        self.sort
    }

    pub(crate) fn push(&mut self, entry: RaceEntry) -> &RaceEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Removes all entries and forgets the sort state.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.sort = None;
    }

    fn check_index(&self, index: usize) -> Result<(), EntryError> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(EntryError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
        }
    }

    /// Replaces the id and re-expresses the finish time from an elapsed
    /// `HH:MM:SS` text. The start time is kept.
    pub fn edit(
        &mut self,
        index: usize,
        new_id: &str,
        new_elapsed: &str,
    ) -> Result<&RaceEntry, EntryError> {
        self.check_index(index)?;
        let id = EntryId::new(new_id).map_err(|_| EntryError::EmptyId)?;
        let elapsed = parse_elapsed(new_elapsed)?;

        let clash = self
            .entries
            .iter()
            .enumerate()
            .any(|(i, e)| i != index && e.id == id);
        if clash {
            return Err(EntryError::DuplicateId {
                id: id.into(),
            });
        }

        let finish = self.entries[index]
            .start_time
            .checked_add(elapsed)
            .ok_or(EntryError::TimeOutOfRange)?;

        let entry = &mut self.entries[index];
        tracing::debug!(
            index,
            old_id = %entry.id,
            new_id = %id,
            elapsed_ms = elapsed,
            "edited entry"
        );
        entry.id = id;
        entry.finish_time = Some(finish);
        Ok(&self.entries[index])
    }

    /// Removes one entry. Remaining ids are left untouched.
    pub fn delete(&mut self, index: usize) -> Result<RaceEntry, EntryError> {
        self.check_index(index)?;
        let removed = self.entries.remove(index);
        tracing::debug!(index, id = %removed.id, "deleted entry");
        Ok(removed)
    }

    /// Sorts by `column` using the table-header toggle rule.
    ///
    /// Choosing a different column sorts ascending; choosing the current
    /// column again flips the order. Returns the order applied.
    pub fn sort(&mut self, column: SortColumn) -> SortOrder {
        let order = match self.sort {
            Some((current, order)) if current == column => order.flipped(),
            _ => SortOrder::Asc,
        };
        self.sort_by(column, order);
        order
    }

    /// Sorts by `column` in an explicit order.
    ///
    /// Ids compare by numeric value with any non-digit prefix ignored; times
    /// compare by elapsed duration. Entries without a comparable key go last.
    pub fn sort_by(&mut self, column: SortColumn, order: SortOrder) {
        match column {
            SortColumn::Id => self.entries.sort_by(|a, b| {
                compare_keys(a.id.numeric_value(), b.id.numeric_value(), order)
            }),
            SortColumn::Time => self
                .entries
                .sort_by(|a, b| compare_keys(a.elapsed_ms(), b.elapsed_ms(), order)),
        }
        self.sort = Some((column, order));
        tracing::debug!(%column, ?order, "sorted entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: i64 = 1_717_236_000_000;

    fn entry(id: &str, elapsed_secs: i64) -> RaceEntry {
        RaceEntry::new(EntryId::new(id).unwrap(), START, START + elapsed_secs * 1000)
    }

    fn store(entries: Vec<RaceEntry>) -> EntryStore {
        let mut store = EntryStore::new();
        for e in entries {
            store.push(e);
        }
        store
    }

    fn ids(store: &EntryStore) -> Vec<&str> {
        store.entries().iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn sort_by_time_ascending() {
        let mut s = store(vec![entry("1", 330), entry("2", 190)]);
        assert_eq!(s.sort(SortColumn::Time), SortOrder::Asc);
        assert_eq!(ids(&s), ["2", "1"]);
    }

    #[test]
    fn same_column_flips_and_new_column_resets() {
        let mut s = store(vec![entry("2", 10), entry("10", 30), entry("1", 20)]);

        assert_eq!(s.sort(SortColumn::Id), SortOrder::Asc);
        assert_eq!(ids(&s), ["1", "2", "10"]);

        assert_eq!(s.sort(SortColumn::Id), SortOrder::Desc);
        assert_eq!(ids(&s), ["10", "2", "1"]);

        assert_eq!(s.sort(SortColumn::Time), SortOrder::Asc);
        assert_eq!(ids(&s), ["2", "1", "10"]);
        assert_eq!(s.sort_state(), Some((SortColumn::Time, SortOrder::Asc)));
    }

    #[test]
    fn id_sort_ignores_prefix_and_is_numeric() {
        let mut s = store(vec![entry("#10", 1), entry("#9", 2), entry("bib", 3)]);
        s.sort_by(SortColumn::Id, SortOrder::Asc);
        assert_eq!(ids(&s), ["#9", "#10", "bib"]);

        s.sort_by(SortColumn::Id, SortOrder::Desc);
        assert_eq!(ids(&s), ["#10", "#9", "bib"]);
    }

    #[test]
    fn id_sort_handles_ids_wider_than_u64() {
        let mut s = store(vec![
            entry("99999999999999999999999", 1),
            entry("5", 2),
            entry("bib", 3),
        ]);
        s.sort_by(SortColumn::Id, SortOrder::Desc);
        assert_eq!(ids(&s), ["99999999999999999999999", "5", "bib"]);

        s.sort_by(SortColumn::Id, SortOrder::Asc);
        assert_eq!(ids(&s), ["5", "99999999999999999999999", "bib"]);
    }

    #[test]
    fn time_sort_is_numeric_beyond_two_digit_hours() {
        let mut s = store(vec![entry("1", 100 * 3600), entry("2", 99 * 3600)]);
        s.sort_by(SortColumn::Time, SortOrder::Asc);
        assert_eq!(ids(&s), ["2", "1"]);
    }

    #[test]
    fn edit_recomputes_finish_from_start() {
        let mut s = store(vec![entry("1", 330)]);
        let edited = s.edit(0, "42", "00:03:10").unwrap();
        assert_eq!(edited.id.as_str(), "42");
        assert_eq!(edited.start_time, START);
        assert_eq!(edited.finish_time, Some(START + 190_000));
    }

    #[test]
    fn edit_rejects_bad_time_and_leaves_entry() {
        let mut s = store(vec![entry("1", 330)]);
        let before = s.entries().to_vec();

        let err = s.edit(0, "5", "24:00:00").unwrap_err();
        assert_eq!(err.to_string(), "Time must be in HH:MM:SS format");
        assert_eq!(s.entries(), before.as_slice());

        assert_eq!(s.edit(0, " ", "00:01:00").unwrap_err(), EntryError::EmptyId);
        assert_eq!(
            s.edit(3, "5", "00:01:00").unwrap_err(),
            EntryError::IndexOutOfRange { index: 3, len: 1 }
        );
        assert_eq!(s.entries(), before.as_slice());
    }

    #[test]
    fn edit_rejects_finish_past_the_end_of_time() {
        let mut s = store(vec![RaceEntry::new(
            EntryId::new("1").unwrap(),
            i64::MAX - 500,
            i64::MAX,
        )]);
        let err = s.edit(0, "2", "00:00:01").unwrap_err();
        assert_eq!(err, EntryError::TimeOutOfRange);
        assert_eq!(ids(&s), ["1"]);
        assert_eq!(s.entries()[0].finish_time, Some(i64::MAX));
    }

    #[test]
    fn edit_rejects_duplicate_id_but_allows_keeping_own() {
        let mut s = store(vec![entry("1", 10), entry("2", 20)]);
        assert_eq!(
            s.edit(1, "1", "00:00:30").unwrap_err(),
            EntryError::DuplicateId {
                id: "1".to_string()
            }
        );
        assert!(s.edit(1, "2", "00:00:30").is_ok());
    }

    #[test]
    fn delete_keeps_remaining_ids() {
        let mut s = store(vec![entry("1", 10), entry("2", 20), entry("3", 30)]);
        let removed = s.delete(1).unwrap();
        assert_eq!(removed.id.as_str(), "2");
        assert_eq!(ids(&s), ["1", "3"]);
        assert!(s.delete(5).is_err());
    }

    #[test]
    fn clear_forgets_sort() {
        let mut s = store(vec![entry("1", 10)]);
        s.sort(SortColumn::Id);
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.sort_state(), None);
        s.push(entry("1", 10));
        assert_eq!(s.sort(SortColumn::Id), SortOrder::Asc);
    }
}
