//! Events emitted to the consumer of a [`MasqueradeClient`](crate::MasqueradeClient).
//!
//! Events are delivered on a bounded channel returned from
//! [`MasqueradeClient::start`](crate::MasqueradeClient::start). When the
//! consumer cannot keep up, events are dropped (with a warning logged) rather
//! than blocking the background tasks; every event is also derivable from the
//! session store and the latest snapshot, so a dropped event never loses
//! state.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::protocol::{Phase, RoomStateView};
use crate::session::Screen;

/// Events emitted by the client's background tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum MasqueradeEvent {
    /// A poll produced a snapshot that differs from the previous one.
    /// Boxed to keep the enum small.
    RoomStateUpdated(Box<RoomStateView>),
    /// The mapper moved the session to a new screen.
    ScreenChanged { screen: Screen },
    /// A countdown's displayed whole-second value changed.
    CountdownTick {
        phase: Phase,
        remaining_seconds: u64,
    },
    /// A countdown crossed from running to expired.
    CountdownExpired { phase: Phase },
}

/// Emit an event without blocking. A full channel drops the event and logs a
/// warning; a closed channel (receiver dropped) is quietly ignored.
pub(crate) fn emit_event(tx: &mpsc::Sender<MasqueradeEvent>, event: MasqueradeEvent) {
    match tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                "event channel full, dropping event: {:?}",
                std::mem::discriminant(&dropped)
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}
