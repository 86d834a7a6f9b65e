//! Backend abstraction for the Masquerade game protocol.
//!
//! The [`Backend`] trait defines the async request/response contract between
//! the client and the game server. The client core depends only on this
//! behavioral contract — how calls reach the server (HTTP, canister agent,
//! in-process test double) is the implementor's concern.
//!
//! # Connection Setup
//!
//! Connection setup is intentionally NOT part of this trait — different
//! backends have fundamentally different bootstrap paths. Construct a
//! connected backend externally, then pass it to
//! [`MasqueradeClient::start`](crate::MasqueradeClient::start).
//!
//! # Idempotency
//!
//! [`check_and_advance_phase`](Backend::check_and_advance_phase) is an
//! idempotent no-op when the current phase's exit condition is not met. The
//! client leans on this: advancement requests are fired redundantly on a
//! retry cadence and the server alone decides whether a transition happens.

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{Guess, GuessingResult, Phase, RoomStateView};

/// Async request/response contract with the Masquerade game server.
///
/// All methods take `&self`; implementations are shared across the client's
/// background tasks behind an `Arc`, so interior state must be `Sync`.
///
/// # Object Safety
///
/// This trait is object-safe; the client stores it as `Arc<dyn Backend>`.
///
/// # Errors
///
/// Implementations should surface server-side rejections as
/// [`MasqueradeError::Backend`](crate::MasqueradeError::Backend) carrying the
/// server's error text — the client refines well-known texts ("room not
/// found", "room is full", …) into specific variants for the caller.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Create a new room with the given host and room code.
    async fn create_room(&self, host_id: &str, host_name: &str, room_code: &str) -> Result<()>;

    /// Join an existing room.
    ///
    /// Fails when the room does not exist or is already full.
    async fn join_room(&self, room_code: &str, player_id: &str, player_name: &str) -> Result<()>;

    /// Fetch the complete current room snapshot.
    async fn get_room_state(&self, room_code: &str) -> Result<RoomStateView>;

    /// Fetch only the current phase — cheaper than a full snapshot when a
    /// consumer needs a point-in-time phase check.
    async fn get_room_phase(&self, room_code: &str) -> Result<Phase>;

    /// Start the game. Fails with fewer than three players or when the
    /// caller is not the host.
    async fn start_game(&self, room_code: &str, host_id: &str) -> Result<()>;

    /// Cast (or re-cast) a vote for a generated topic. Re-voting overwrites
    /// per server contract; the client does not suppress it locally.
    async fn vote_for_topic(&self, room_code: &str, player_id: &str, topic_index: u32)
        -> Result<()>;

    /// Append a chat message to the room transcript.
    async fn send_message(&self, room_code: &str, sender: &str, message: &str) -> Result<()>;

    /// Ask the server to evaluate the current phase's exit condition and
    /// transition if it is met. Idempotent no-op otherwise.
    async fn check_and_advance_phase(&self, room_code: &str) -> Result<()>;

    /// Submit the Anchor's guesses as a single batch and receive the
    /// server-graded result. An empty batch is permitted and means
    /// "no one selected".
    async fn submit_guesses(&self, room_code: &str, guesses: Vec<Guess>)
        -> Result<GuessingResult>;

    /// Reset the room for another round (back to the waiting phase).
    async fn play_again(&self, room_code: &str) -> Result<()>;
}
