//! Remote persistence seam for race results.

use std::future::Future;

use crate::timing::RaceEntry;
use crate::types::EventId;

/// Where race results are stored.
///
/// Implementations must only report success once the write is confirmed;
/// callers update local state after `Ok` and never before.
pub trait ResultsRepository {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All persisted entries for an event, in storage order.
    fn fetch_results(
        &self,
        event: &EventId,
    ) -> impl Future<Output = Result<Vec<RaceEntry>, Self::Error>> + Send;

    /// Persists a whole live session.
    fn save_results(
        &self,
        event: &EventId,
        entries: &[RaceEntry],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Removes one persisted entry, addressed by its id and session start.
    fn delete_result(
        &self,
        event: &EventId,
        entry: &RaceEntry,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
