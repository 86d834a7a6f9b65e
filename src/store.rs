//! Remote room store: the polling side of state reconciliation.
//!
//! The backend offers no push channel, so a background task fetches the full
//! room snapshot on a fixed interval (2s by default) and publishes it on a
//! [`watch`] channel — an atomic whole-snapshot replacement with a single
//! writer. Consumers (the mapper, the phase monitors, the UI) read the latest
//! value; every one of them must tolerate a snapshot up to one poll interval
//! old.
//!
//! A fetch failure keeps the last good snapshot and logs a warning — polling
//! self-heals on the next tick, and a blocking error for a background
//! refresh would be worse than brief staleness.
//!
//! Mutating actions call [`StoreHandle::invalidate`] so the effect shows up
//! without waiting out the full interval. Invalidations arriving inside the
//! freshness window (1s by default) are deduplicated; this only affects
//! latency, never correctness.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch, Notify};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::event::{emit_event, MasqueradeEvent};
use crate::protocol::{RoomCode, RoomStateView};

/// Owning handle for a room's poll task. Dropping the handle aborts the task.
#[derive(Debug)]
pub(crate) struct StoreHandle {
    rx: watch::Receiver<Option<RoomStateView>>,
    refetch: Arc<Notify>,
    fetched_at: Arc<Mutex<Option<Instant>>>,
    task: tokio::task::JoinHandle<()>,
}

impl StoreHandle {
    /// Spawn the poll task for `room_code`.
    pub(crate) fn spawn(
        backend: Arc<dyn Backend>,
        room_code: RoomCode,
        poll_interval: Duration,
        stale_after: Duration,
        events: mpsc::Sender<MasqueradeEvent>,
    ) -> Self {
        let (tx, rx) = watch::channel(None);
        let refetch = Arc::new(Notify::new());
        let fetched_at = Arc::new(Mutex::new(None));
        let task = tokio::spawn(poll_loop(
            backend,
            room_code,
            tx,
            Arc::clone(&refetch),
            Arc::clone(&fetched_at),
            poll_interval,
            stale_after,
            events,
        ));
        Self {
            rx,
            refetch,
            fetched_at,
            task,
        }
    }

    /// Latest known snapshot, if any poll has succeeded yet.
    pub(crate) fn latest(&self) -> Option<RoomStateView> {
        self.rx.borrow().clone()
    }

    /// Age of the latest good snapshot; `None` before the first success.
    pub(crate) fn freshness(&self) -> Option<Duration> {
        last_fetch(&self.fetched_at).map(|at| at.elapsed())
    }

    /// A fresh receiver for tasks that react to snapshot changes.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<RoomStateView>> {
        self.rx.clone()
    }

    /// Mark the cached snapshot stale and nudge the poller to refetch.
    /// Called after every mutating action.
    pub(crate) fn invalidate(&self) {
        self.refetch.notify_one();
    }

    /// Shared refetch handle for tasks that invalidate on their own (the
    /// phase monitors, after a successful advancement request).
    pub(crate) fn refetch_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.refetch)
    }
}

impl Drop for StoreHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn last_fetch(fetched_at: &Mutex<Option<Instant>>) -> Option<Instant> {
    match fetched_at.lock() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

/// Background poll loop. Runs until aborted by the owning [`StoreHandle`].
#[allow(clippy::too_many_arguments)]
async fn poll_loop(
    backend: Arc<dyn Backend>,
    room_code: RoomCode,
    tx: watch::Sender<Option<RoomStateView>>,
    refetch: Arc<Notify>,
    fetched_at: Arc<Mutex<Option<Instant>>>,
    poll_interval: Duration,
    stale_after: Duration,
    events: mpsc::Sender<MasqueradeEvent>,
) {
    debug!(room = %room_code, "room poll loop started");

    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = refetch.notified() => {
                // Deduplicate invalidations inside the freshness window.
                if last_fetch(&fetched_at).is_some_and(|at| at.elapsed() < stale_after) {
                    continue;
                }
            }
        }

        match backend.get_room_state(&room_code).await {
            Ok(state) => {
                if let Ok(mut guard) = fetched_at.lock() {
                    *guard = Some(Instant::now());
                }
                let changed = tx.send_if_modified(|current| {
                    if current.as_ref() == Some(&state) {
                        false
                    } else {
                        *current = Some(state.clone());
                        true
                    }
                });
                if changed {
                    emit_event(&events, MasqueradeEvent::RoomStateUpdated(Box::new(state)));
                }
            }
            // Transient failure: keep the last good snapshot, retry next tick.
            Err(e) => {
                warn!(room = %room_code, "room state fetch failed: {e}");
            }
        }
    }
}
