//! Primary fetch with retry, then best-effort history backfill.
//!
//! [`run`] is the whole sequence as one async function: it requests the
//! current entry, retries transient failures with exponential backoff, gives
//! up immediately on rate limiting, and once the primary entry is in hand
//! walks back one day at a time from that entry's date to fill the history
//! window.  Progress is reported as [`FetchEvent`]s over a channel;
//! [`crate::state::FetchState`] turns those into what the UI shows.
//!
//! [`FetchHandle`] owns one running sequence on a tokio runtime and cancels
//! it on [`dispose`](FetchHandle::dispose) or drop.
//!
//! ## Ordering
//!
//! History requests are issued one at a time in increasing day offset, so
//! `History` events always arrive newest-to-oldest and a failed day never
//! delays or reorders the ones after it.
//!
//! ## Cancellation
//!
//! Every await point (request or backoff sleep) is raced against a
//! [`CancellationToken`], and every event send checks the token first.
//! Once cancelled, the task emits nothing and issues no further requests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::EndpointConfig;
use crate::error::{FetchError, SourceError};
use crate::source::{ApodSource, RemoteItem};

/// Progress messages sent from the fetch task to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    /// A primary request is about to be issued (`attempt` starts at 0).
    Attempt { attempt: u32 },
    /// Attempt `attempt` failed transiently; the next one starts after `delay`.
    Retrying {
        attempt: u32,
        delay: Duration,
        reason: String,
    },
    /// The primary entry arrived.  Always the first item of the window.
    Primary(RemoteItem),
    /// One older entry, in increasing day offset order.
    History(RemoteItem),
    /// Backfill finished; no further events follow.
    HistoryComplete { fetched: usize, attempted: usize },
    /// The primary fetch failed for good; no further events follow.
    Failed(FetchError),
}

/// Retry and window parameters for one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub history_days: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from(&EndpointConfig::default())
    }
}

impl From<&EndpointConfig> for FetchSettings {
    fn from(ep: &EndpointConfig) -> Self {
        Self {
            max_retries: ep.max_retries,
            base_delay: ep.base_delay(),
            history_days: ep.history_days,
        }
    }
}

/// How a sequence ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The primary entry was fetched and backfill ran to the end.
    Ready { history_fetched: usize },
    Failed(FetchError),
    Cancelled,
}

/// `base * 2^attempt`, saturating instead of overflowing.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(Duration::MAX)
}

/// The dates to backfill: `anchor - 1` down to `anchor - (days - 1)`.
///
/// `anchor` is the primary entry's own date, so the window never repeats it.
pub fn history_dates(anchor: NaiveDate, days: u32) -> impl Iterator<Item = NaiveDate> {
    (1..days).map_while(move |offset| anchor.checked_sub_days(Days::new(u64::from(offset))))
}

/// Sends events unless the sequence has been cancelled.
struct Emitter<'a> {
    tx: &'a UnboundedSender<FetchEvent>,
    cancel: &'a CancellationToken,
}

impl Emitter<'_> {
    /// Returns `false` when the sequence should stop: cancelled, or the
    /// receiver is gone.
    fn emit(&self, event: FetchEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.tx.send(event).is_ok()
    }
}

/// Run one complete fetch sequence.
///
/// The primary request carries no date, so the endpoint decides what "today"
/// is; history dates count back from the date it returns.
pub async fn run<S>(
    source: &S,
    settings: FetchSettings,
    tx: &UnboundedSender<FetchEvent>,
    cancel: &CancellationToken,
) -> Outcome
where
    S: ApodSource + ?Sized,
{
    let events = Emitter { tx, cancel };

    // -- primary fetch with retry ----------------------------------------------
    let mut attempt: u32 = 0;
    let primary = loop {
        if !events.emit(FetchEvent::Attempt { attempt }) {
            return Outcome::Cancelled;
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Cancelled,
            r = source.fetch(None) => r,
        };

        let err = match result {
            Ok(item) => break item,
            Err(err) => err,
        };

        if err.is_rate_limited() {
            tracing::warn!(source = source.name(), attempt, "rate limited; not retrying");
            return fail(&events, FetchError::RateLimited);
        }

        if attempt >= settings.max_retries {
            tracing::error!(
                source = source.name(),
                attempts = attempt + 1,
                error = %err,
                "giving up on primary fetch"
            );
            return fail(
                &events,
                FetchError::Exhausted {
                    attempts: attempt + 1,
                },
            );
        }

        let delay = backoff_delay(settings.base_delay, attempt);
        tracing::warn!(
            source = source.name(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "primary fetch failed; retrying"
        );
        if !events.emit(FetchEvent::Retrying {
            attempt,
            delay,
            reason: err.to_string(),
        }) {
            return Outcome::Cancelled;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Cancelled,
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    };

    tracing::info!(date = %primary.date, title = %primary.title, attempts = attempt + 1, "primary entry fetched");
    let anchor = primary.date;
    if !events.emit(FetchEvent::Primary(primary)) {
        return Outcome::Cancelled;
    }

    // -- history backfill ------------------------------------------------------
    let mut attempted = 0;
    let mut fetched = 0;

    for date in history_dates(anchor, settings.history_days) {
        attempted += 1;
        let result: Result<RemoteItem, SourceError> = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Outcome::Cancelled,
            r = source.fetch(Some(date)) => r,
        };

        match result {
            Ok(item) => {
                if !events.emit(FetchEvent::History(item)) {
                    return Outcome::Cancelled;
                }
                fetched += 1;
            }
            // A sparse window is acceptable.
            Err(err) => tracing::warn!(%date, error = %err, "history fetch failed; skipping"),
        }
    }

    tracing::debug!(fetched, attempted, "history backfill complete");
    if !events.emit(FetchEvent::HistoryComplete { fetched, attempted }) {
        return Outcome::Cancelled;
    }
    Outcome::Ready {
        history_fetched: fetched,
    }
}

fn fail(events: &Emitter<'_>, err: FetchError) -> Outcome {
    if events.emit(FetchEvent::Failed(err.clone())) {
        Outcome::Failed(err)
    } else {
        Outcome::Cancelled
    }
}

// ---------------------------------------------------------------------------
// Handle: one sequence at a time on a runtime
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("a fetch is already in progress")]
    InFlight,
}

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<Outcome>,
}

/// Owns the fetch task for one view.
///
/// Each [`start`](Self::start) gets a fresh channel, so events from a
/// disposed sequence can never reach the receiver of a newer one.
pub struct FetchHandle {
    source: Arc<dyn ApodSource>,
    settings: FetchSettings,
    runtime: tokio::runtime::Handle,
    running: Option<Running>,
    events: Option<UnboundedReceiver<FetchEvent>>,
}

impl FetchHandle {
    pub fn new(
        source: Arc<dyn ApodSource>,
        settings: FetchSettings,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            source,
            settings,
            runtime,
            running: None,
            events: None,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// `true` while a sequence has been started and has not yet finished.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }

    /// Start a new sequence.  Rejected while one is still running.
    pub fn start(&mut self) -> Result<(), StartError> {
        if self.is_running() {
            return Err(StartError::InFlight);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let source = Arc::clone(&self.source);
        let settings = self.settings;
        let token = cancel.clone();

        let task = self.runtime.spawn(async move {
            let outcome = run(source.as_ref(), settings, &tx, &token).await;
            tracing::debug!(?outcome, "fetch sequence finished");
            outcome
        });

        self.running = Some(Running { cancel, task });
        self.events = Some(rx);
        Ok(())
    }

    /// Next pending event, without blocking.
    pub fn try_recv(&mut self) -> Option<FetchEvent> {
        self.events.as_mut()?.try_recv().ok()
    }

    /// Wait for the next event.  `None` once the sequence is over or disposed.
    #[cfg(test)]
    pub async fn recv(&mut self) -> Option<FetchEvent> {
        self.events.as_mut()?.recv().await
    }

    /// Abandon the running sequence.  No event is delivered afterwards.
    pub fn dispose(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
        }
        self.events = None;
    }
}

impl Drop for FetchHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
