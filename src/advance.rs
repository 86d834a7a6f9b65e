//! Phase-advancement trigger.
//!
//! The server only evaluates a phase's exit condition when something calls
//! `checkAndAdvancePhase`, and there is no push channel to tell clients the
//! deadline passed. Each governed phase therefore gets a monitor task that
//! samples the latest polled snapshot on a fast cadence, and — when the
//! trigger condition transitions from unmet to met while the room is still in
//! that phase — fires an advancement request immediately, then keeps
//! re-firing on a slower cadence until a poll observes a different phase.
//!
//! Redundant requests are the design, not an accident: every client in the
//! room fires them, the call is an idempotent no-op on the server when no
//! transition is due, and the retries cover a first request lost in transit
//! or a deadline race on the server side. Failures are logged and retried,
//! never surfaced — advancement is background housekeeping, not a
//! user-initiated action.
//!
//! The retry loop re-reads the shared snapshot on every tick. It must never
//! close over the phase captured at expiry time, or it would keep firing
//! against a world that has already moved on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use crate::backend::Backend;
use crate::countdown::{Countdown, CHAT_DURATION, TOPIC_SELECTION_DURATION};
use crate::event::{emit_event, MasqueradeEvent};
use crate::protocol::{Phase, RoomCode, RoomStateView, Timestamp};

/// What a monitor watches: the governing phase, its countdown parameters, and
/// an optional quota that can meet the trigger condition before the clock
/// runs out.
pub(crate) struct MonitorSpec {
    pub phase: Phase,
    pub duration: Duration,
    pub start_time: fn(&RoomStateView) -> Option<Timestamp>,
    pub quota: Option<fn(&RoomStateView) -> bool>,
}

/// Monitor for the topic-selection phase: 20s countdown, or every player
/// has voted.
pub(crate) fn topic_selection_monitor() -> MonitorSpec {
    MonitorSpec {
        phase: Phase::TopicSelection,
        duration: TOPIC_SELECTION_DURATION,
        start_time: |s| s.topic_selection_start_time,
        quota: Some(RoomStateView::all_voted),
    }
}

/// Monitor for the chatting phase: 180s countdown only.
pub(crate) fn chat_monitor() -> MonitorSpec {
    MonitorSpec {
        phase: Phase::Chatting,
        duration: CHAT_DURATION,
        start_time: |s| s.chat_countdown_start_time,
        quota: None,
    }
}

/// Run one phase monitor until the task is aborted by its owning room scope.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_phase_monitor(
    spec: MonitorSpec,
    mut rx: watch::Receiver<Option<RoomStateView>>,
    backend: Arc<dyn Backend>,
    room_code: RoomCode,
    refetch: Arc<Notify>,
    sample_cadence: Duration,
    retry_cadence: Duration,
    events: mpsc::Sender<MasqueradeEvent>,
) {
    debug!(phase = ?spec.phase, "phase monitor started");

    let mut sampler = tokio::time::interval(sample_cadence);
    sampler.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Displayed whole-second value at the previous sample; drives tick events.
    let mut last_remaining: Option<u64> = None;
    // Whether the current activation of the governing phase already fired.
    let mut fired = false;

    loop {
        sampler.tick().await;

        let Some(state) = rx.borrow().clone() else {
            last_remaining = None;
            fired = false;
            continue;
        };
        if state.phase != spec.phase {
            last_remaining = None;
            fired = false;
            continue;
        }

        let countdown = Countdown::new((spec.start_time)(&state), spec.duration);
        let remaining = countdown.remaining();
        if let Some(secs) = remaining {
            if last_remaining != Some(secs) {
                last_remaining = Some(secs);
                emit_event(
                    &events,
                    MasqueradeEvent::CountdownTick {
                        phase: spec.phase,
                        remaining_seconds: secs,
                    },
                );
            }
        } else {
            last_remaining = None;
        }

        let expired = remaining == Some(0);
        let quota_met = spec.quota.is_some_and(|quota| quota(&state));
        if (expired || quota_met) && !fired {
            fired = true;
            if expired {
                emit_event(&events, MasqueradeEvent::CountdownExpired { phase: spec.phase });
            }
            fire_until_phase_changes(&spec, &mut rx, &backend, &room_code, &refetch, retry_cadence)
                .await;
            // Control returns once a poll observed a different phase; the
            // next sample resets the activation state.
        }
    }
}

/// Fire `check_and_advance_phase` immediately, then on the retry cadence,
/// re-reading the latest polled phase before every attempt. Returns when the
/// observed phase no longer matches the governing one.
async fn fire_until_phase_changes(
    spec: &MonitorSpec,
    rx: &mut watch::Receiver<Option<RoomStateView>>,
    backend: &Arc<dyn Backend>,
    room_code: &str,
    refetch: &Notify,
    retry_cadence: Duration,
) {
    let mut retry = tokio::time::interval(retry_cadence);
    retry.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // First tick completes immediately, so the initial request goes out
        // the moment expiry is detected.
        retry.tick().await;

        let observed = rx.borrow().as_ref().map(|s| s.phase);
        if observed != Some(spec.phase) {
            debug!(
                governing = ?spec.phase,
                ?observed,
                "phase changed, advancement retries stop"
            );
            break;
        }

        match backend.check_and_advance_phase(room_code).await {
            // Nudge the poller so a server-side transition shows up promptly.
            Ok(()) => refetch.notify_one(),
            // Silent by contract: log and let the next cadence tick retry.
            Err(e) => error!(phase = ?spec.phase, "phase advance request failed: {e}"),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
