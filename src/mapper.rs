//! Phase-to-screen mapping.
//!
//! The mapping is one-directional: the remote phase determines the local
//! screen, never the other way around. The server stays the single source of
//! truth, and no amount of local navigation can desynchronize the client —
//! the next snapshot simply maps the screen back.

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::event::{emit_event, MasqueradeEvent};
use crate::protocol::{Phase, RoomStateView};
use crate::session::{Screen, SessionStore};

/// The screen that should be displayed for `phase`, given the currently
/// displayed `current` screen.
///
/// Total over all phases and idempotent: applying it twice with the same
/// phase yields the same screen. `current` participates only in the
/// caller-side "no-op when unchanged" contract; the target screen depends on
/// the phase alone.
pub fn screen_for_phase(phase: Phase, _current: Screen) -> Screen {
    match phase {
        Phase::Waiting => Screen::Lobby,
        Phase::TopicSelection => Screen::TopicSelection,
        Phase::Chatting => Screen::Chat,
        Phase::Guessing => Screen::Guessing,
        Phase::Results => Screen::Results,
    }
}

/// Reactor task: re-map the screen whenever a new snapshot arrives.
///
/// Bypassed entirely while the session lacks a room code or player id — the
/// rendering entry point shows the home screen regardless of fetched state,
/// and a session that left its room must not be yanked back by a late poll.
pub(crate) async fn run_mapper(
    mut rx: watch::Receiver<Option<RoomStateView>>,
    session: std::sync::Arc<SessionStore>,
    events: mpsc::Sender<MasqueradeEvent>,
) {
    debug!("mapper task started");

    while rx.changed().await.is_ok() {
        let Some(phase) = rx.borrow_and_update().as_ref().map(|s| s.phase) else {
            continue;
        };

        let snapshot = session.snapshot();
        if snapshot.room_code.is_none() || snapshot.player_id.is_none() {
            continue;
        }

        let next = screen_for_phase(phase, snapshot.screen);
        if session.set_screen(next) {
            emit_event(&events, MasqueradeEvent::ScreenChanged { screen: next });
        }
    }

    debug!("mapper task exited");
}

// ── Tests ───────────────────────────────────────────────────────────
