//! Historical results grouped by race session.
//!
//! Persisted entries are flat; entries of one session share a start time.
//! [`ResultsAggregator`] rebuilds the per-session view, tracks which groups
//! are expanded, and deletes whole groups through a [`ResultsRepository`].

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use thiserror::Error;

use crate::export::ExportTable;
use crate::repository::ResultsRepository;
use crate::timing::RaceEntry;
use crate::types::{EntryId, EventId};

/// Key used for entries whose start time is out of the representable range.
pub const UNKNOWN_DATE_KEY: &str = "Unknown date";

/// Session key: start time as `DD/MM/YYYY at HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    /// Derives the key for a session start in `tz`.
    pub fn from_start<Tz>(start_ms: i64, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        DateTime::from_timestamp_millis(start_ms).map_or_else(
            || Self(UNKNOWN_DATE_KEY.to_string()),
            |utc| Self(utc.with_timezone(tz).format("%d/%m/%Y at %H:%M").to_string()),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for GroupKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted entries of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultGroup {
    pub key: GroupKey,
    pub entries: Vec<RaceEntry>,
}

/// Group deletion failed part-way.
#[derive(Debug, Error)]
pub enum GroupDeleteError<E>
where
    E: std::error::Error + 'static,
{
    #[error("no result group {key}")]
    UnknownGroup { key: String },
    /// Some deletes were confirmed before one failed. The group now holds
    /// exactly the entries that were not deleted.
    #[error("deleted {} of {} entries in {key}", .deleted.len(), .deleted.len().saturating_add(.remaining.len()))]
    Partial {
        key: String,
        deleted: Vec<EntryId>,
        remaining: Vec<EntryId>,
        #[source]
        source: E,
    },
}

/// Grouped view over one event's persisted results.
#[derive(Debug, Clone, Default)]
pub struct ResultsAggregator {
    groups: Vec<ResultGroup>,
    expanded: HashMap<GroupKey, bool>,
}

impl ResultsAggregator {
    /// Buckets entries by session key in `tz`.
    ///
    /// Groups appear in order of their first entry; entries keep their input
    /// order within a group. Every group starts expanded.
    pub fn group<Tz>(entries: impl IntoIterator<Item = RaceEntry>, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut groups: Vec<ResultGroup> = Vec::new();
        let mut index: HashMap<GroupKey, usize> = HashMap::new();
        for entry in entries {
            let key = GroupKey::from_start(entry.start_time, tz);
            if let Some(&i) = index.get(&key) {
                groups[i].entries.push(entry);
            } else {
                index.insert(key.clone(), groups.len());
                groups.push(ResultGroup {
                    key,
                    entries: vec![entry],
                });
            }
        }
        let expanded = groups.iter().map(|g| (g.key.clone(), true)).collect();
        tracing::debug!(groups = groups.len(), "grouped results");
        Self { groups, expanded }
    }

    pub fn groups(&self) -> &[ResultGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ResultGroup> {
        self.groups.iter().find(|g| g.key.as_str() == key)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.key.as_str() == key)
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.get(key).copied().unwrap_or(false)
    }

    /// Flips a group between expanded and collapsed. Returns the new state,
    /// or `None` for an unknown key.
    pub fn toggle_expand(&mut self, key: &str) -> Option<bool> {
        let group_key = self.get(key)?.key.clone();
        let open = self.expanded.entry(group_key).or_insert(true);
        *open = !*open;
        Some(*open)
    }

    /// `ID | Time` rows for one group.
    pub fn export_rows(&self, key: &str) -> Option<ExportTable> {
        let group = self.get(key)?;
        Some(ExportTable::race_results(
            Some(format!("Date: {}", group.key)),
            &group.entries,
        ))
    }

    /// Deletes every entry of a group, one request per entry.
    ///
    /// Entries are removed locally only after the repository confirms each
    /// delete. The first failure stops the run and is reported together with
    /// the ids already deleted and those that remain. Returns the number of
    /// entries deleted when the whole group is gone.
    pub async fn delete_group<R>(
        &mut self,
        key: &str,
        event: &EventId,
        repo: &R,
    ) -> Result<usize, GroupDeleteError<R::Error>>
    where
        R: ResultsRepository,
    {
        let Some(pos) = self.position(key) else {
            return Err(GroupDeleteError::UnknownGroup {
                key: key.to_string(),
            });
        };

        let mut deleted = Vec::new();
        while let Some(entry) = self.groups[pos].entries.first().cloned() {
            if let Err(source) = repo.delete_result(event, &entry).await {
                let remaining: Vec<EntryId> = self.groups[pos]
                    .entries
                    .iter()
                    .map(|e| e.id.clone())
                    .collect();
                tracing::warn!(
                    group = %key,
                    deleted = deleted.len(),
                    remaining = remaining.len(),
                    error = %source,
                    "group delete stopped part-way"
                );
                return Err(GroupDeleteError::Partial {
                    key: key.to_string(),
                    deleted,
                    remaining,
                    source,
                });
            }
            self.groups[pos].entries.remove(0);
            deleted.push(entry.id);
        }

        let group = self.groups.remove(pos);
        self.expanded.remove(&group.key);
        tracing::debug!(group = %key, deleted = deleted.len(), "deleted result group");
        Ok(deleted.len())
    }
}
