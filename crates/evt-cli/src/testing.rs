//! In-memory results repository for command tests.

use std::fmt;
use std::sync::Mutex;

use evt_core::{EventId, RaceEntry, ResultsRepository};

#[derive(Debug)]
pub struct Refused;

impl fmt::Display for Refused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("server refused the request")
    }
}

impl std::error::Error for Refused {}

/// Behaves like the events server: saves append, deletes remove by id and
/// start time. Failures can be injected per operation.
#[derive(Default)]
pub struct FakeRepo {
    pub stored: Mutex<Vec<RaceEntry>>,
    pub saves: Mutex<usize>,
    pub fail_save: bool,
    /// Refuse the n-th delete (0-based).
    pub fail_delete_at: Option<usize>,
    pub deletes: Mutex<usize>,
}

impl FakeRepo {
    pub fn with(entries: Vec<RaceEntry>) -> Self {
        Self {
            stored: Mutex::new(entries),
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Vec<RaceEntry> {
        self.stored.lock().unwrap().clone()
    }
}

impl ResultsRepository for FakeRepo {
    type Error = Refused;

    async fn fetch_results(&self, _event: &EventId) -> Result<Vec<RaceEntry>, Refused> {
        Ok(self.stored())
    }

    async fn save_results(&self, _event: &EventId, entries: &[RaceEntry]) -> Result<(), Refused> {
        if self.fail_save {
            return Err(Refused);
        }
        self.stored.lock().unwrap().extend_from_slice(entries);
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    async fn delete_result(&self, _event: &EventId, entry: &RaceEntry) -> Result<(), Refused> {
        let mut deletes = self.deletes.lock().unwrap();
        if self.fail_delete_at == Some(*deletes) {
            return Err(Refused);
        }
        *deletes += 1;
        self.stored
            .lock()
            .unwrap()
            .retain(|e| !(e.id == entry.id && e.start_time == entry.start_time));
        Ok(())
    }
}
