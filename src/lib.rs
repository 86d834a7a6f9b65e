//! # Masquerade Client
//!
//! Backend-agnostic Rust client for the Masquerade party-game protocol.
//!
//! The game server is authoritative for everything that matters — the phase
//! machine, player roles, topics, scoring — and offers no push channel. This
//! crate keeps a client in lockstep with it anyway: a poller mirrors the room
//! snapshot, a pure mapper derives the local screen from the remote phase,
//! wall-clock countdowns anchor to server-issued start instants, and phase
//! monitors fire idempotent advancement requests (with redundant retries)
//! when a countdown expires.
//!
//! ## Features
//!
//! - **Backend-agnostic** — implement the [`Backend`] trait for any transport
//! - **Server-authoritative** — the client only ever *requests* phase
//!   advancement; screens are derived from polled state, never the reverse
//! - **Deterministic cancellation** — all room-scoped timers and retries stop
//!   when the room is left or the client is dropped
//! - **Event-driven consumption** — receive typed [`MasqueradeEvent`]s via a
//!   channel, or read the session/snapshot directly
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let backend: Arc<dyn Backend> = Arc::new(my_backend);
//! let identity = Arc::new(FileIdentityStore::new("identity.json"));
//! let (client, mut events) =
//!     MasqueradeClient::start(backend, identity, MasqueradeConfig::default())?;
//!
//! client.join_room("AB3456").await?;
//! while let Some(event) = events.recv().await {
//!     // react to ScreenChanged / CountdownTick / RoomStateUpdated …
//! }
//! ```

pub mod backend;
pub mod countdown;
pub mod error;
pub mod event;
pub mod identity;
pub mod protocol;
pub mod session;

mod advance;
mod client;
mod mapper;
mod store;

// Re-export primary types for ergonomic imports.
pub use backend::Backend;
pub use client::{MasqueradeClient, MasqueradeConfig};
pub use countdown::{format_remaining, Countdown, CHAT_DURATION, TOPIC_SELECTION_DURATION};
pub use error::{MasqueradeError, Result};
pub use event::MasqueradeEvent;
pub use identity::{FileIdentityStore, IdentityStore, MemoryIdentityStore, StoredIdentity};
pub use mapper::screen_for_phase;
pub use protocol::{Phase, RoomStateView};
pub use session::{Screen, Session, SessionStore};
