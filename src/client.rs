//! Async client for the Masquerade party-game protocol.
//!
//! [`MasqueradeClient`] owns the session store and, while a room is joined,
//! an arena of background tasks: the room poller, the phase-to-screen mapper,
//! and one phase monitor per governed countdown. Entering a room arms the
//! arena; leaving, resetting, or dropping the client aborts it. Events are
//! emitted on a bounded channel ([`tokio::sync::mpsc::Receiver<MasqueradeEvent>`])
//! returned from [`MasqueradeClient::start`].
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = Arc::new(connect_somehow().await);
//! let identity = Arc::new(FileIdentityStore::new("~/.masquerade/identity.json"));
//! let (mut client, mut events) = MasqueradeClient::start(
//!     backend,
//!     identity,
//!     MasqueradeConfig::default(),
//! )?;
//!
//! let code = client.create_room().await?;
//! println!("room code: {code}");
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         MasqueradeEvent::ScreenChanged { screen } => { /* re-render */ }
//!         MasqueradeEvent::CountdownTick { remaining_seconds, .. } => { /* … */ }
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::advance::{chat_monitor, run_phase_monitor, topic_selection_monitor};
use crate::backend::Backend;
use crate::countdown::{Countdown, CHAT_DURATION, TOPIC_SELECTION_DURATION};
use crate::error::{MasqueradeError, Result};
use crate::event::MasqueradeEvent;
use crate::identity::{self, IdentityStore, StoredIdentity};
use crate::mapper::run_mapper;
use crate::protocol::{Guess, GuessingResult, Phase, PlayerId, RoomCode, RoomStateView, WEIRD_GUESS};
use crate::session::{Screen, SessionStore};
use crate::store::StoreHandle;

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default room poll interval.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default freshness window within which invalidations are deduplicated.
const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(1);

/// Default countdown sampling cadence.
const DEFAULT_COUNTDOWN_SAMPLE: Duration = Duration::from_millis(100);

/// Default advancement retry cadence.
const DEFAULT_ADVANCE_RETRY: Duration = Duration::from_secs(3);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`MasqueradeClient`].
///
/// The defaults are the protocol's operating parameters; tuning exists for
/// tests and unusual deployments, not as a gameplay knob.
///
/// # Example
///
/// ```
/// use masquerade_client::MasqueradeConfig;
/// use std::time::Duration;
///
/// let config = MasqueradeConfig::default()
///     .with_poll_interval(Duration::from_millis(500))
///     .with_event_channel_capacity(512);
/// assert_eq!(config.poll_interval, Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct MasqueradeConfig {
    /// How often the room poller refetches the snapshot.
    pub poll_interval: Duration,
    /// Window within which a just-fetched snapshot is considered fresh and
    /// invalidations are deduplicated. Affects latency only.
    pub stale_after: Duration,
    /// How often countdown monitors resample remaining time. Much faster
    /// than the poll interval so displayed time stays smooth between polls.
    pub countdown_sample: Duration,
    /// Cadence of redundant advancement requests after expiry.
    pub advance_retry: Duration,
    /// Capacity of the bounded event channel.
    ///
    /// When the consumer cannot keep up, events are dropped (with a warning
    /// logged) to avoid blocking background tasks.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
}

impl Default for MasqueradeConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            stale_after: DEFAULT_STALE_AFTER,
            countdown_sample: DEFAULT_COUNTDOWN_SAMPLE,
            advance_retry: DEFAULT_ADVANCE_RETRY,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl MasqueradeConfig {
    /// Set the room poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the freshness window.
    #[must_use]
    pub fn with_stale_after(mut self, window: Duration) -> Self {
        self.stale_after = window;
        self
    }

    /// Set the countdown sampling cadence.
    #[must_use]
    pub fn with_countdown_sample(mut self, cadence: Duration) -> Self {
        self.countdown_sample = cadence;
        self
    }

    /// Set the advancement retry cadence.
    #[must_use]
    pub fn with_advance_retry(mut self, cadence: Duration) -> Self {
        self.advance_retry = cadence;
        self
    }

    /// Set the capacity of the bounded event channel.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }
}

// ── Room task arena ─────────────────────────────────────────────────

/// Background tasks scoped to one room affiliation. The arena owns every
/// cancellation handle; dropping it stops the poller, the mapper, and both
/// phase monitors deterministically.
struct RoomTasks {
    store: StoreHandle,
    mapper: tokio::task::JoinHandle<()>,
    monitors: Vec<tokio::task::JoinHandle<()>>,
}

impl Drop for RoomTasks {
    fn drop(&mut self) {
        // StoreHandle aborts its own poll task on drop.
        self.mapper.abort();
        for monitor in &self.monitors {
            monitor.abort();
        }
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// Client handle for the Masquerade party-game protocol.
///
/// Created via [`MasqueradeClient::start`], which loads (or generates and
/// persists) the local identity and returns the handle together with an
/// event receiver. Room-scoped background work starts when a room is
/// created or joined and stops when it is left.
pub struct MasqueradeClient {
    backend: Arc<dyn Backend>,
    identity_store: Arc<dyn IdentityStore>,
    session: Arc<SessionStore>,
    config: MasqueradeConfig,
    event_tx: mpsc::Sender<MasqueradeEvent>,
    room: Mutex<Option<RoomTasks>>,
}

impl MasqueradeClient {
    /// Start the client: load or generate the persisted identity, seed the
    /// session, and return the handle plus event receiver.
    ///
    /// # Errors
    ///
    /// Returns an error when the identity store fails to load or save.
    #[must_use = "the event receiver must be consumed for screen/countdown updates"]
    pub fn start(
        backend: Arc<dyn Backend>,
        identity_store: Arc<dyn IdentityStore>,
        config: MasqueradeConfig,
    ) -> Result<(Self, mpsc::Receiver<MasqueradeEvent>)> {
        let session = Arc::new(SessionStore::new());

        let stored = match identity_store.load()? {
            Some(identity) => identity,
            None => {
                let identity = StoredIdentity {
                    player_id: identity::generate_player_id(),
                    username: identity::generate_username(),
                };
                identity_store.save(&identity)?;
                debug!(username = %identity.username, "generated fresh identity");
                identity
            }
        };
        session.seed_identity(stored.player_id, stored.username);

        // Clamp capacity to at least 1 (tokio panics on 0).
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<MasqueradeEvent>(capacity);

        let client = Self {
            backend,
            identity_store,
            session,
            config,
            event_tx,
            room: Mutex::new(None),
        };
        Ok((client, event_rx))
    }

    // ── Room entry / exit ───────────────────────────────────────────

    /// Create a room with a freshly generated code and enter it as host.
    ///
    /// # Errors
    ///
    /// [`MasqueradeError::MissingIdentity`] without a local identity, or the
    /// refined backend error.
    pub async fn create_room(&self) -> Result<RoomCode> {
        let (player_id, username) = self.require_identity()?;
        let room_code = identity::generate_room_code();

        self.backend
            .create_room(&player_id, &username, &room_code)
            .await
            .map_err(MasqueradeError::refine_room)?;

        self.session.enter_room(room_code.clone(), true);
        self.arm_room_tasks(room_code.clone());
        Ok(room_code)
    }

    /// Join an existing room by code.
    ///
    /// # Errors
    ///
    /// [`MasqueradeError::RoomNotFound`] / [`MasqueradeError::RoomFull`] for
    /// the well-known rejections; the session is left untouched on failure.
    pub async fn join_room(&self, room_code: impl Into<RoomCode>) -> Result<()> {
        let (player_id, username) = self.require_identity()?;
        let room_code = room_code.into();

        self.backend
            .join_room(&room_code, &player_id, &username)
            .await
            .map_err(MasqueradeError::refine_room)?;

        self.session.enter_room(room_code.clone(), false);
        self.arm_room_tasks(room_code);
        Ok(())
    }

    /// Leave the current room: clears the ephemeral session fields and stops
    /// every room-scoped background task. Identity is kept.
    pub fn leave_room(&self) {
        debug!("leaving room");
        self.disarm_room_tasks();
        self.session.reset();
    }

    /// Stop all background work. The session (including identity) survives,
    /// but no further polling, mapping, or advancement happens until a room
    /// is entered again.
    pub fn shutdown(&mut self) {
        debug!("MasqueradeClient: shutdown requested");
        self.disarm_room_tasks();
    }

    // ── User actions ────────────────────────────────────────────────

    /// Start the game (host only, needs at least three players).
    pub async fn start_game(&self) -> Result<()> {
        let (player_id, _) = self.require_identity()?;
        let room_code = self.require_room()?;

        self.backend
            .start_game(&room_code, &player_id)
            .await
            .map_err(MasqueradeError::refine_start)?;

        self.invalidate_room_state();
        Ok(())
    }

    /// Send a chat message as the local player.
    pub async fn send_chat_message(&self, message: impl AsRef<str>) -> Result<()> {
        let (_, username) = self.require_identity()?;
        let room_code = self.require_room()?;

        self.backend
            .send_message(&room_code, &username, message.as_ref())
            .await?;

        self.invalidate_room_state();
        Ok(())
    }

    /// Vote for the generated topic at `topic_index`. Re-voting overwrites
    /// per server contract; the client does not suppress it. Once every
    /// player has voted, further votes are rejected before dispatch with
    /// [`MasqueradeError::VotingClosed`] — the server stays the final
    /// arbiter either way.
    pub async fn vote_for_topic(&self, topic_index: u32) -> Result<()> {
        let (player_id, _) = self.require_identity()?;
        let room_code = self.require_room()?;

        if self.room_state().is_some_and(|s| s.all_voted()) {
            return Err(MasqueradeError::VotingClosed);
        }

        self.backend
            .vote_for_topic(&room_code, &player_id, topic_index)
            .await?;

        self.invalidate_room_state();
        Ok(())
    }

    /// Submit the local player's guesses as one batch: every selected target
    /// is marked as suspected of playing a personality card. An empty
    /// selection is permitted and means "no one selected".
    ///
    /// Grading is entirely server-side; the returned
    /// [`GuessingResult::correct_count`] is the only score the client knows.
    pub async fn submit_guesses(
        &self,
        target_ids: impl IntoIterator<Item = PlayerId>,
    ) -> Result<GuessingResult> {
        let (player_id, _) = self.require_identity()?;
        let room_code = self.require_room()?;

        let guesses: Vec<Guess> = target_ids
            .into_iter()
            .map(|target_id| Guess {
                guesser_id: player_id.clone(),
                target_id,
                guess: WEIRD_GUESS.to_string(),
            })
            .collect();

        let result = self.backend.submit_guesses(&room_code, guesses).await?;
        self.invalidate_room_state();
        Ok(result)
    }

    /// Request another round (back to the waiting phase).
    pub async fn play_again(&self) -> Result<()> {
        let room_code = self.require_room()?;
        self.backend.play_again(&room_code).await?;
        self.invalidate_room_state();
        Ok(())
    }

    /// Replace the generated username and persist the new identity.
    pub fn regenerate_username(&self) -> Result<String> {
        let (player_id, _) = self.require_identity()?;
        let username = identity::generate_username();
        self.identity_store.save(&StoredIdentity {
            player_id,
            username: username.clone(),
        })?;
        self.session.set_username(username.clone());
        Ok(username)
    }

    // ── State accessors ─────────────────────────────────────────────

    /// The shared session store.
    pub fn session(&self) -> Arc<SessionStore> {
        Arc::clone(&self.session)
    }

    /// The screen a renderer should display right now (home-screen guard
    /// applied).
    pub fn current_screen(&self) -> Screen {
        self.session.effective_screen()
    }

    /// Latest polled room snapshot, if any poll has succeeded.
    pub fn room_state(&self) -> Option<RoomStateView> {
        self.with_room(|tasks| tasks.store.latest()).flatten()
    }

    /// Age of the latest good snapshot; `None` before the first successful
    /// poll or outside a room. Consumers must tolerate up to one poll
    /// interval of staleness — this is informational, not a correctness
    /// signal.
    pub fn room_state_age(&self) -> Option<Duration> {
        self.with_room(|tasks| tasks.store.freshness()).flatten()
    }

    /// Point-in-time phase probe — a live backend round-trip, cheaper than a
    /// full snapshot. Background logic never uses this; it observes the
    /// polled snapshot instead.
    pub async fn probe_phase(&self) -> Result<Phase> {
        let room_code = self.require_room()?;
        self.backend.get_room_phase(&room_code).await
    }

    /// The chat countdown derived from the latest snapshot. Sample
    /// [`Countdown::remaining`] as often as the display needs.
    pub fn chat_countdown(&self) -> Countdown {
        Countdown::new(
            self.room_state().and_then(|s| s.chat_countdown_start_time),
            CHAT_DURATION,
        )
    }

    /// The topic-selection countdown derived from the latest snapshot.
    pub fn topic_selection_countdown(&self) -> Countdown {
        Countdown::new(
            self.room_state().and_then(|s| s.topic_selection_start_time),
            TOPIC_SELECTION_DURATION,
        )
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn require_identity(&self) -> Result<(PlayerId, String)> {
        let snapshot = self.session.snapshot();
        match (snapshot.player_id, snapshot.username) {
            (Some(id), Some(name)) => Ok((id, name)),
            _ => Err(MasqueradeError::MissingIdentity),
        }
    }

    fn require_room(&self) -> Result<RoomCode> {
        self.session.room_code().ok_or(MasqueradeError::NotInRoom)
    }

    /// Spawn the room-scoped task arena, replacing (and thereby aborting)
    /// any previous one.
    fn arm_room_tasks(&self, room_code: RoomCode) {
        let store = StoreHandle::spawn(
            Arc::clone(&self.backend),
            room_code.clone(),
            self.config.poll_interval,
            self.config.stale_after,
            self.event_tx.clone(),
        );

        let mapper = tokio::spawn(run_mapper(
            store.subscribe(),
            Arc::clone(&self.session),
            self.event_tx.clone(),
        ));

        let monitors = [topic_selection_monitor(), chat_monitor()]
            .into_iter()
            .map(|spec| {
                tokio::spawn(run_phase_monitor(
                    spec,
                    store.subscribe(),
                    Arc::clone(&self.backend),
                    room_code.clone(),
                    store.refetch_handle(),
                    self.config.countdown_sample,
                    self.config.advance_retry,
                    self.event_tx.clone(),
                ))
            })
            .collect();

        *self.lock_room() = Some(RoomTasks {
            store,
            mapper,
            monitors,
        });
    }

    fn disarm_room_tasks(&self) {
        // Dropping the arena aborts every task it owns.
        *self.lock_room() = None;
    }

    fn invalidate_room_state(&self) {
        self.with_room(|tasks| tasks.store.invalidate());
    }

    fn with_room<T>(&self, f: impl FnOnce(&RoomTasks) -> T) -> Option<T> {
        self.lock_room().as_ref().map(f)
    }

    fn lock_room(&self) -> std::sync::MutexGuard<'_, Option<RoomTasks>> {
        match self.room.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for MasqueradeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasqueradeClient")
            .field("session", &self.session.snapshot())
            .field("in_room", &self.lock_room().is_some())
            .finish()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
