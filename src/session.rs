//! Process-wide session state.
//!
//! [`SessionStore`] holds the client-owned side of the world: who the local
//! player is, which room they are affiliated with, and which screen should be
//! displayed. It is created once at client start, seeded from the persisted
//! identity, mutated through its methods, and reset — never destroyed — by an
//! explicit leave/reset. It is passed to the poller, mapper, and action
//! handlers as an injected dependency rather than living as an ambient
//! singleton.
//!
//! # Lifecycle
//!
//! - `player_id` / `username`: survive restarts (via
//!   [`IdentityStore`](crate::identity::IdentityStore)).
//! - `room_code` / `is_host` / `screen`: ephemeral; reset to defaults by
//!   [`SessionStore::reset`] and absent on a fresh start.
//!
//! All mutation happens through `&self` methods over an internal mutex that
//! is never held across an await point; background tasks are pure readers of
//! everything except `screen`, which only the mapper writes.

use std::sync::Mutex;

use tracing::debug;

use crate::protocol::{PlayerId, RoomCode};

/// Local screen tag.
///
/// Screens are derived from the remote phase by the mapper — never the other
/// way around — so user navigation alone can never desynchronize the client
/// from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Entry screen: identity display, create/join controls.
    #[default]
    Home,
    /// Waiting for players; host can start the game.
    Lobby,
    /// Voting on a conversation topic.
    TopicSelection,
    /// Timed group chat.
    Chat,
    /// The Anchor picks suspects.
    Guessing,
    /// Round results and play-again.
    Results,
}

/// Snapshot of the session fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub player_id: Option<PlayerId>,
    pub username: Option<String>,
    pub room_code: Option<RoomCode>,
    pub is_host: bool,
    pub screen: Screen,
}

/// Shared, process-wide [`Session`] container.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the identity fields (at startup, from the identity store).
    pub fn seed_identity(&self, player_id: PlayerId, username: String) {
        let mut session = self.lock();
        session.player_id = Some(player_id);
        session.username = Some(username);
    }

    /// Replace the username (e.g. after the player rerolls it).
    pub fn set_username(&self, username: String) {
        self.lock().username = Some(username);
    }

    /// Record room affiliation after a successful create/join.
    pub fn enter_room(&self, room_code: RoomCode, is_host: bool) {
        let mut session = self.lock();
        debug!(room = %room_code, is_host, "session: entered room");
        session.room_code = Some(room_code);
        session.is_host = is_host;
        session.screen = Screen::Lobby;
    }

    /// Set the displayed screen. Returns `true` when the value changed.
    pub fn set_screen(&self, screen: Screen) -> bool {
        let mut session = self.lock();
        if session.screen == screen {
            return false;
        }
        debug!(?screen, "session: screen changed");
        session.screen = screen;
        true
    }

    /// Clear all ephemeral fields, keeping identity. The explicit
    /// leave/reset action of the session lifecycle.
    pub fn reset(&self) {
        let mut session = self.lock();
        debug!("session: reset");
        session.room_code = None;
        session.is_host = false;
        session.screen = Screen::Home;
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Clone the full session.
    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.lock().player_id.clone()
    }

    pub fn username(&self) -> Option<String> {
        self.lock().username.clone()
    }

    pub fn room_code(&self) -> Option<RoomCode> {
        self.lock().room_code.clone()
    }

    pub fn is_host(&self) -> bool {
        self.lock().is_host
    }

    /// The raw stored screen, without the home-screen guard.
    pub fn screen(&self) -> Screen {
        self.lock().screen
    }

    /// The screen a renderer should display: the stored screen, except that
    /// a session without both a room code and a player id always renders
    /// [`Screen::Home`], regardless of any fetched state.
    ///
    /// This is the rendering entry point that enforces the invariant
    /// "non-home screen implies room and identity are set" — the store
    /// itself does not.
    pub fn effective_screen(&self) -> Screen {
        let session = self.lock();
        if session.room_code.is_none() || session.player_id.is_none() {
            Screen::Home
        } else {
            session.screen
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        // Lock poisoning would require a panic inside one of the short
        // critical sections above; recover with the inner value rather than
        // propagating poison through every accessor.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
