//! Continuous race clock.
//!
//! One `start()` anchors a session; every `finish()` records a finisher
//! against that anchor without stopping the clock. A once-per-second tick
//! drives the on-screen counter and is owned by a [`TickTask`] that is
//! cancelled on reset, restart and drop.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::entries::EntryStore;
use crate::timing::RaceEntry;
use crate::types::EntryId;

/// Default display refresh period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self(Arc::new(AtomicI64::new(now_ms)))
    }

    pub fn set(&self, now_ms: i64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let ms = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StopwatchError {
    /// `finish()` was called before `start()`.
    #[error("the race clock is not running")]
    NotRunning,
    /// The periodic tick needs a tokio runtime.
    #[error("no async runtime available to drive the race clock")]
    NoRuntime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopwatchState {
    Idle,
    Running { session_start: i64 },
}

/// Handle to the periodic display tick.
///
/// Cancelling is idempotent; dropping the handle cancels the task.
#[derive(Debug)]
pub struct TickTask {
    handle: Option<JoinHandle<()>>,
}

impl TickTask {
    fn spawn(runtime: &Handle, period: Duration, display: Arc<watch::Sender<u64>>) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        let handle = runtime.spawn(async move {
            loop {
                interval.tick().await;
                display.send_modify(|seconds| *seconds += 1);
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Stops the tick. Returns `false` if it was already cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub const fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for TickTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Owns the timing session: state, session anchor, id counter, display
/// counter and the live [`EntryStore`].
#[derive(Debug)]
pub struct StopwatchController<C: Clock = SystemClock> {
    clock: C,
    state: StopwatchState,
    store: EntryStore,
    next_id: u64,
    display: Arc<watch::Sender<u64>>,
    tick: Option<TickTask>,
    tick_period: Duration,
}

impl Default for StopwatchController<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> StopwatchController<C> {
    pub fn new(clock: C) -> Self {
        let (display, _) = watch::channel(0);
        Self {
            clock,
            state: StopwatchState::Idle,
            store: EntryStore::new(),
            next_id: 1,
            display: Arc::new(display),
            tick: None,
            tick_period: TICK_PERIOD,
        }
    }

    /// Overrides the display refresh period.
    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub const fn state(&self) -> StopwatchState {
        self.state
    }

    pub const fn is_running(&self) -> bool {
        matches!(self.state, StopwatchState::Running { .. })
    }

    pub const fn session_start(&self) -> Option<i64> {
        match self.state {
            StopwatchState::Running { session_start } => Some(session_start),
            StopwatchState::Idle => None,
        }
    }

    pub const fn store(&self) -> &EntryStore {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut EntryStore {
        &mut self.store
    }

    /// Seconds shown on the running clock.
    pub fn display_seconds(&self) -> u64 {
        *self.display.borrow()
    }

    /// Receives every display counter change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.display.subscribe()
    }

    /// Wall-clock time since the session started.
    pub fn running_elapsed_ms(&self) -> Option<i64> {
        self.session_start()
            .and_then(|start| self.clock.now_ms().checked_sub(start))
    }

    pub fn tick_active(&self) -> bool {
        self.tick.as_ref().is_some_and(TickTask::is_active)
    }

    fn cancel_tick(&mut self) {
        if let Some(mut tick) = self.tick.take() {
            tick.cancel();
        }
    }

    /// Begins a new session, discarding any entries of the previous one.
    ///
    /// Returns the session start in epoch milliseconds.
    pub fn start(&mut self) -> Result<i64, StopwatchError> {
        let runtime = Handle::try_current().map_err(|_| StopwatchError::NoRuntime)?;
        if self.is_running() {
            tracing::debug!(discarded = self.store.len(), "restarting race clock");
        }
        self.cancel_tick();
        self.store.clear();
        self.next_id = 1;
        self.display.send_replace(0);

        let session_start = self.clock.now_ms();
        self.state = StopwatchState::Running { session_start };
        self.tick = Some(TickTask::spawn(
            &runtime,
            self.tick_period,
            Arc::clone(&self.display),
        ));
        tracing::debug!(session_start, "race clock started");
        Ok(session_start)
    }

    /// Records a finisher at the current time.
    ///
    /// Ids come from a counter incremented here, so back-to-back calls always
    /// get distinct, consecutive ids.
    pub fn finish(&mut self) -> Result<&RaceEntry, StopwatchError> {
        let StopwatchState::Running { session_start } = self.state else {
            return Err(StopwatchError::NotRunning);
        };
        let now = self.clock.now_ms().max(session_start);
        let id = EntryId::sequence(self.next_id);
        self.next_id += 1;
        tracing::debug!(%id, elapsed_ms = now.saturating_sub(session_start), "finisher recorded");
        Ok(self.store.push(RaceEntry::new(id, session_start, now)))
    }

    /// Starts a new race: clears entries, zeroes the display, cancels the
    /// tick and returns to idle.
    pub fn reset(&mut self) {
        self.cancel_tick();
        self.store.clear();
        self.next_id = 1;
        self.display.send_replace(0);
        self.state = StopwatchState::Idle;
        tracing::debug!("race clock reset");
    }
}
