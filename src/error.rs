//! Error types for the Masquerade client.

use thiserror::Error;

/// Errors that can occur when using the Masquerade client.
///
/// The `Display` strings of the room/game variants are the human-readable
/// causes shown to players after a failed user action; background activities
/// (polling, phase advancement) log their failures and never surface them.
#[derive(Debug, Error)]
pub enum MasqueradeError {
    /// The backend rejected or failed a call; carries the raw error text.
    #[error("backend error: {0}")]
    Backend(String),

    /// No room with the requested code exists.
    #[error("room not found")]
    RoomNotFound,

    /// The room has reached its player limit.
    #[error("room is full (max 6 players)")]
    RoomFull,

    /// The game cannot start with fewer than three players.
    #[error("need at least 3 players to start")]
    NotEnoughPlayers,

    /// A non-host player attempted a host-only action.
    #[error("only the host can start the game")]
    NotHost,

    /// Every player has already voted; the vote window is closed locally.
    /// The server remains the final arbiter of vote acceptance.
    #[error("voting has closed")]
    VotingClosed,

    /// The session has no player id or username yet.
    #[error("no local identity (player id / username) available")]
    MissingIdentity,

    /// A room operation was attempted while no room code is set.
    #[error("not in a room")]
    NotInRoom,

    /// Failed to serialize or deserialize a protocol value.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred (identity persistence).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for Masquerade client operations.
pub type Result<T> = std::result::Result<T, MasqueradeError>;

impl MasqueradeError {
    /// Refine a raw [`Backend`](MasqueradeError::Backend) error from a join
    /// or create call into a specific cause, based on the server's error text.
    ///
    /// Unrecognized texts pass through unchanged so the raw message is still
    /// available to the caller.
    pub(crate) fn refine_room(self) -> Self {
        match self {
            Self::Backend(msg) => {
                let lower = msg.to_lowercase();
                if lower.contains("not found") {
                    Self::RoomNotFound
                } else if lower.contains("full") {
                    Self::RoomFull
                } else {
                    Self::Backend(msg)
                }
            }
            other => other,
        }
    }

    /// Refine a raw [`Backend`](MasqueradeError::Backend) error from a
    /// start-game call into a specific cause.
    pub(crate) fn refine_start(self) -> Self {
        match self {
            Self::Backend(msg) => {
                let lower = msg.to_lowercase();
                if lower.contains("at least 3") {
                    Self::NotEnoughPlayers
                } else if lower.contains("host") {
                    Self::NotHost
                } else {
                    Self::Backend(msg)
                }
            }
            other => other,
        }
    }
}
