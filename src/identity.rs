//! Local identity: generation and persistence.
//!
//! A player's identity (`player_id` + `username`) is the only client-owned
//! state that survives process restarts. Everything else in the session is
//! ephemeral by design. Persistence goes through the [`IdentityStore`] trait
//! so the storage location is the integrator's choice;
//! [`FileIdentityStore`] covers the common case with a small JSON file.

use std::path::PathBuf;
use std::sync::Mutex;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::protocol::PlayerId;

/// Adjective half of generated usernames.
const ADJECTIVES: &[&str] = &[
    "Blue", "Red", "Green", "Golden", "Silver", "Cosmic", "Swift", "Brave",
    "Clever", "Mighty", "Silent", "Wild", "Fierce", "Noble", "Mystic", "Bright",
    "Dark", "Storm", "Fire", "Ice", "Thunder", "Shadow", "Crystal", "Royal",
];

/// Animal half of generated usernames.
const ANIMALS: &[&str] = &[
    "Tiger", "Eagle", "Wolf", "Dragon", "Phoenix", "Lion", "Bear", "Hawk",
    "Panther", "Falcon", "Raven", "Fox", "Shark", "Cobra", "Lynx", "Jaguar",
    "Owl", "Viper", "Leopard", "Puma", "Orca", "Rhino", "Bison", "Stallion",
];

/// Room-code alphabet. Excludes 0/O and 1/I so codes can be read aloud.
const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of generated room codes.
const ROOM_CODE_LEN: usize = 6;

// ── Generation ──────────────────────────────────────────────────────

/// Generate a fresh opaque player id.
pub fn generate_player_id() -> PlayerId {
    format!("player_{}", uuid::Uuid::new_v4().simple())
}

/// Generate a display name of the shape `AdjectiveAnimalNN` (e.g. `BlueTiger42`).
pub fn generate_username() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Blue");
    let animal = ANIMALS.choose(&mut rng).copied().unwrap_or("Tiger");
    let number: u8 = rng.random_range(0..100);
    format!("{adjective}{animal}{number}")
}

/// Check that a username has the generated `AdjectiveAnimalNN` shape:
/// two capitalized words followed by one or two digits.
pub fn validate_username(username: &str) -> bool {
    let mut chars = username.chars().peekable();

    // Two capitalized lowercase-tail words.
    for _ in 0..2 {
        match chars.next() {
            Some(c) if c.is_ascii_uppercase() => {}
            _ => return false,
        }
        let mut tail = 0;
        while chars.peek().is_some_and(|c| c.is_ascii_lowercase()) {
            chars.next();
            tail += 1;
        }
        if tail == 0 {
            return false;
        }
    }

    // One or two trailing digits, nothing after.
    let digits: Vec<char> = chars.collect();
    !digits.is_empty() && digits.len() <= 2 && digits.iter().all(char::is_ascii_digit)
}

/// Generate a six-character room code from the ambiguity-free alphabet.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| char::from(ROOM_CODE_CHARS.choose(&mut rng).copied().unwrap_or(b'A')))
        .collect()
}

// ── Persistence ─────────────────────────────────────────────────────

/// The identity fields that survive restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredIdentity {
    pub player_id: PlayerId,
    pub username: String,
}

/// Persistence seam for the local identity.
///
/// Implementations must tolerate being called from any task; both methods
/// are synchronous because identity I/O is tiny and happens only at startup
/// and on explicit identity changes.
pub trait IdentityStore: Send + Sync + 'static {
    /// Load the stored identity, or `None` when none has been saved yet.
    fn load(&self) -> Result<Option<StoredIdentity>>;

    /// Persist the identity, replacing any previous value.
    fn save(&self, identity: &StoredIdentity) -> Result<()>;
}

/// JSON-file-backed [`IdentityStore`].
#[derive(Debug)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    /// Create a store reading and writing the given file path. Parent
    /// directories are created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Result<Option<StoredIdentity>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let identity = serde_json::from_str(&contents)?;
                Ok(Some(identity))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, identity: &StoredIdentity) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(identity)?;
        std::fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), "identity saved");
        Ok(())
    }
}

/// In-memory [`IdentityStore`] for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    identity: Mutex<Option<StoredIdentity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the store, as if an identity had been saved in a previous run.
    pub fn with_identity(identity: StoredIdentity) -> Self {
        Self {
            identity: Mutex::new(Some(identity)),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Result<Option<StoredIdentity>> {
        Ok(self
            .identity
            .lock()
            .map_err(|_| std::io::Error::other("identity store poisoned"))?
            .clone())
    }

    fn save(&self, identity: &StoredIdentity) -> Result<()> {
        *self
            .identity
            .lock()
            .map_err(|_| std::io::Error::other("identity store poisoned"))? =
            Some(identity.clone());
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
