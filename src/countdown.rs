//! Wall-clock countdowns anchored to server-issued start instants.
//!
//! The server stamps a phase's start time (nanoseconds since epoch, on its
//! own clock) into the room snapshot; the client derives remaining time from
//! the *local* wall clock minus that instant. No attempt is made to correct
//! for clock skew between client and server — the resulting imprecision is an
//! accepted property of the protocol, and "fixing" it here would change
//! observable timing relative to every other client.
//!
//! A [`Countdown`] is a pure value: construct one from the snapshot's start
//! field and the phase duration, then sample [`remaining`](Countdown::remaining)
//! as often as needed (the monitors sample at ~100ms so displayed time stays
//! smooth between 2s polls). Expiry is the derived condition
//! `remaining == Some(0)`, not an event.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::protocol::Timestamp;

/// Topic-selection voting window.
pub const TOPIC_SELECTION_DURATION: Duration = Duration::from_secs(20);

/// Group-chat window.
pub const CHAT_DURATION: Duration = Duration::from_secs(180);

/// Current local wall clock as milliseconds since the Unix epoch.
pub(crate) fn wall_clock_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as i64,
        // Clock before 1970: treat as epoch so countdowns read as expired
        // rather than panicking.
        Err(_) => 0,
    }
}

/// A fixed-duration countdown anchored to an optional absolute start instant.
///
/// `start` of `None` means "timer not running" — remaining time is `None`
/// and the countdown can never be expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    start: Option<Timestamp>,
    duration: Duration,
}

impl Countdown {
    /// Build a countdown from a snapshot's start field (server nanoseconds)
    /// and the governing phase's duration.
    pub fn new(start: Option<Timestamp>, duration: Duration) -> Self {
        Self { start, duration }
    }

    /// Remaining whole seconds at the given local time (ms since epoch).
    ///
    /// Rounds up, so the display holds `1` until the final instant and the
    /// value is `0` exactly when the full duration has elapsed. Clamped to
    /// zero; `None` while the timer is not running.
    pub fn remaining_at(&self, now_ms: i64) -> Option<u64> {
        let start = self.start?;
        let start_ms = start / 1_000_000;
        let elapsed_ms = now_ms.saturating_sub(start_ms);
        let remaining_ms = (self.duration.as_millis() as i64).saturating_sub(elapsed_ms);
        if remaining_ms <= 0 {
            Some(0)
        } else {
            // Ceiling division keeps the displayed value in step with the
            // original millisecond countdown.
            Some((remaining_ms as u64).div_ceil(1000))
        }
    }

    /// Remaining whole seconds at the current wall-clock time.
    pub fn remaining(&self) -> Option<u64> {
        self.remaining_at(wall_clock_ms())
    }

    /// Whether the countdown has run out at the given local time.
    ///
    /// A countdown without a start instant is never expired.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.remaining_at(now_ms) == Some(0)
    }

    /// Whether the countdown has run out at the current wall-clock time.
    pub fn is_expired(&self) -> bool {
        self.remaining() == Some(0)
    }
}

/// Format remaining seconds as `m:ss` for display; `--:--` when the timer is
/// not running.
pub fn format_remaining(remaining_seconds: Option<u64>) -> String {
    match remaining_seconds {
        None => "--:--".to_string(),
        Some(secs) => format!("{}:{:02}", secs / 60, secs % 60),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
