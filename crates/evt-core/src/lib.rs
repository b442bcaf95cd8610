//! Core domain logic for event registration and race timing.
//!
//! This crate contains the fundamental types and logic for:
//! - Eligibility: validating and normalizing participant registrations
//! - Timing: the continuous race clock and the live entry list
//! - Results: regrouping persisted entries by session for review and export

pub mod eligibility;
pub mod entries;
pub mod event;
pub mod export;
pub mod repository;
pub mod results;
pub mod stopwatch;
pub mod timing;
pub mod types;
mod wire;

pub use eligibility::{
    Field, FieldErrors, Gender, MAX_AGE, NormalizedForm, NormalizedParticipant, ParticipantForm,
    RaceRole, Validation, validate,
};
pub use entries::{EntryError, EntryStore, SortColumn, SortOrder};
pub use event::{AgeLimit, Event, EventRestrictions, GenderRestriction};
pub use export::{ExportTable, Exporter};
pub use repository::ResultsRepository;
pub use results::{GroupDeleteError, GroupKey, ResultGroup, ResultsAggregator};
pub use stopwatch::{
    Clock, ManualClock, StopwatchController, StopwatchError, StopwatchState, SystemClock, TickTask,
};
pub use timing::{ElapsedFormatError, RaceEntry, format_elapsed, parse_elapsed};
pub use types::{EntryId, EventId, LabelNumber, ParticipantId, ValidationError};
