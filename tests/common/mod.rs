#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for Masquerade client integration tests.
//!
//! Provides a scriptable [`MockBackend`] whose room state the test mutates
//! directly (standing in for the server's own phase machine), plus builders
//! for common room snapshots.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use masquerade_client::error::{MasqueradeError, Result};
use masquerade_client::protocol::{
    Guess, GuessingResult, Phase, Player, RoomStateView, Topic, Vote, ANCHOR_ROLE,
};
use masquerade_client::{Backend, MasqueradeConfig};

// ── MockBackend ─────────────────────────────────────────────────────

/// A scriptable backend double.
///
/// The test owns the room state through [`MockBackend::set_state`] /
/// [`MockBackend::update_state`]; every `get_room_state` serves a clone of
/// the current value (full snapshot, never a delta). Call counters and
/// recorded arguments allow asserting on what the client sent.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<Option<RoomStateView>>,
    /// When set, `get_room_state` fails with this text instead of answering.
    pub fail_get_state: AtomicBool,
    /// Scripted error text for the next `join_room` call.
    pub join_error: Mutex<Option<String>>,
    /// Scripted error text for the next `start_game` call.
    pub start_error: Mutex<Option<String>>,
    /// Scripted grading result for `submit_guesses`.
    pub guess_result: Mutex<Option<GuessingResult>>,
    /// After this many advancement calls, the phase flips to `advance_to`.
    pub advance_after: Mutex<Option<(usize, Phase)>>,

    pub state_fetches: AtomicUsize,
    pub advance_calls: AtomicUsize,
    pub created_rooms: Mutex<Vec<(String, String, String)>>,
    pub joined_rooms: Mutex<Vec<(String, String, String)>>,
    pub sent_messages: Mutex<Vec<(String, String)>>,
    pub votes_cast: Mutex<Vec<(String, u32)>>,
    pub submitted_guesses: Mutex<Vec<Guess>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replace the served room state wholesale.
    pub fn set_state(&self, state: RoomStateView) {
        *self.state.lock().unwrap() = Some(state);
    }

    /// Mutate the served room state in place.
    pub fn update_state(&self, f: impl FnOnce(&mut RoomStateView)) {
        if let Some(state) = self.state.lock().unwrap().as_mut() {
            f(state);
        }
    }

    /// Current phase of the served state.
    pub fn phase(&self) -> Option<Phase> {
        self.state.lock().unwrap().as_ref().map(|s| s.phase)
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn create_room(&self, host_id: &str, host_name: &str, room_code: &str) -> Result<()> {
        self.created_rooms.lock().unwrap().push((
            host_id.to_string(),
            host_name.to_string(),
            room_code.to_string(),
        ));
        Ok(())
    }

    async fn join_room(&self, room_code: &str, player_id: &str, player_name: &str) -> Result<()> {
        if let Some(text) = self.join_error.lock().unwrap().take() {
            return Err(MasqueradeError::Backend(text));
        }
        self.joined_rooms.lock().unwrap().push((
            room_code.to_string(),
            player_id.to_string(),
            player_name.to_string(),
        ));
        Ok(())
    }

    async fn get_room_state(&self, _room_code: &str) -> Result<RoomStateView> {
        self.state_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_get_state.load(Ordering::SeqCst) {
            return Err(MasqueradeError::Backend("network unreachable".into()));
        }
        self.state
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| MasqueradeError::Backend("room not found".into()))
    }

    async fn get_room_phase(&self, _room_code: &str) -> Result<Phase> {
        self.phase()
            .ok_or_else(|| MasqueradeError::Backend("room not found".into()))
    }

    async fn start_game(&self, _room_code: &str, _host_id: &str) -> Result<()> {
        if let Some(text) = self.start_error.lock().unwrap().take() {
            return Err(MasqueradeError::Backend(text));
        }
        Ok(())
    }

    async fn vote_for_topic(&self, _room_code: &str, player_id: &str, topic_index: u32) -> Result<()> {
        self.votes_cast
            .lock()
            .unwrap()
            .push((player_id.to_string(), topic_index));
        Ok(())
    }

    async fn send_message(&self, _room_code: &str, sender: &str, message: &str) -> Result<()> {
        self.sent_messages
            .lock()
            .unwrap()
            .push((sender.to_string(), message.to_string()));
        Ok(())
    }

    async fn check_and_advance_phase(&self, _room_code: &str) -> Result<()> {
        let calls = self.advance_calls.fetch_add(1, Ordering::SeqCst) + 1;
        // Emulate the server's deadline evaluation: after enough nudges the
        // phase machine transitions.
        let flip = self.advance_after.lock().unwrap().as_ref().copied();
        if let Some((after, target)) = flip {
            if calls >= after {
                self.update_state(|s| s.phase = target);
            }
        }
        Ok(())
    }

    async fn submit_guesses(&self, _room_code: &str, guesses: Vec<Guess>) -> Result<GuessingResult> {
        self.submitted_guesses.lock().unwrap().extend(guesses.clone());
        Ok(self.guess_result.lock().unwrap().clone().unwrap_or(GuessingResult {
            correct_count: 0,
            guesses,
        }))
    }

    async fn play_again(&self, _room_code: &str) -> Result<()> {
        self.update_state(|s| s.phase = Phase::Waiting);
        Ok(())
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

/// Local wall clock in the server's nanosecond representation.
pub fn now_nanos() -> i64 {
    let ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;
    ms * 1_000_000
}

pub fn player(id: &str, name: &str, role: &str) -> Player {
    Player {
        id: id.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        personality_card: None,
        is_anchor: role == ANCHOR_ROLE,
    }
}

/// A waiting-phase room with the given players, hosted by the first.
pub fn waiting_room(room_code: &str, players: Vec<Player>) -> RoomStateView {
    let host_id = players.first().map(|p| p.id.clone()).unwrap_or_default();
    RoomStateView {
        phase: Phase::Waiting,
        players,
        host_id,
        room_code: room_code.to_string(),
        round_number: 1,
        chat_messages: vec![],
        chat_countdown_start_time: None,
        generated_topics: vec![],
        votes: vec![],
        selected_topic: None,
        topic_selection_start_time: None,
        guesses: vec![],
    }
}

/// A chatting-phase room whose countdown started `elapsed` ago.
pub fn chatting_room(room_code: &str, players: Vec<Player>, elapsed: Duration) -> RoomStateView {
    let mut state = waiting_room(room_code, players);
    state.phase = Phase::Chatting;
    state.chat_countdown_start_time = Some(now_nanos() - elapsed.as_nanos() as i64);
    state.selected_topic = Some(Topic {
        question: "Cats or dogs?".into(),
    });
    state
}

/// A topic-selection room whose countdown started `elapsed` ago.
pub fn topic_selection_room(
    room_code: &str,
    players: Vec<Player>,
    elapsed: Duration,
) -> RoomStateView {
    let mut state = waiting_room(room_code, players);
    state.phase = Phase::TopicSelection;
    state.topic_selection_start_time = Some(now_nanos() - elapsed.as_nanos() as i64);
    state.generated_topics = vec![
        Topic { question: "Cats or dogs?".into() },
        Topic { question: "Is cereal a soup?".into() },
        Topic { question: "Best pizza topping?".into() },
    ];
    state
}

pub fn vote(player_id: &str, topic_index: u32) -> Vote {
    Vote {
        player_id: player_id.to_string(),
        topic_index,
    }
}

/// Five-player roster with `p1` as Anchor.
pub fn five_players() -> Vec<Player> {
    vec![
        player("p1", "BlueTiger42", ANCHOR_ROLE),
        player("p2", "SwiftFox7", "Overly Poetic"),
        player("p3", "IceOwl3", "Conspiracy Theorist"),
        player("p4", "StormBear9", "Rhyming Pirate"),
        player("p5", "RoyalLynx1", "Whisperer"),
    ]
}

/// Cadences fast enough that integration tests finish in tens of
/// milliseconds of wall time while keeping every ratio of the defaults
/// (poll > stale, retry > sample).
pub fn fast_config() -> MasqueradeConfig {
    MasqueradeConfig::default()
        .with_poll_interval(Duration::from_millis(20))
        .with_stale_after(Duration::from_millis(5))
        .with_countdown_sample(Duration::from_millis(5))
        .with_advance_retry(Duration::from_millis(30))
}

/// Initialize tracing once for the whole test binary. `RUST_LOG` controls
/// verbosity.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .try_init();
    });
}
