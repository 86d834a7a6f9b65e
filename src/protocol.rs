//! Wire-compatible protocol types for the Masquerade game backend.
//!
//! Every type in this module produces identical JSON to the backend's room
//! state shape. Key conventions:
//!
//! - Field names are `camelCase` on the wire (`#[serde(rename_all = "camelCase")]`)
//! - Timestamps are nanoseconds since the Unix epoch, as issued by the
//!   server's clock (see [`Timestamp`])
//! - Every fetched [`RoomStateView`] is a complete snapshot, never a delta;
//!   the client never mutates one

use serde::{Deserialize, Serialize};
use tracing::warn;

// ── Type aliases ────────────────────────────────────────────────────

/// Unique identifier for players (opaque string issued by the client,
/// e.g. `"player_5f2c…"`).
pub type PlayerId = String;

/// Six-character room code (e.g. `"AB3456"`).
pub type RoomCode = String;

/// Nanoseconds since the Unix epoch, on the server's clock.
///
/// Countdowns subtract this from the *local* wall clock with no skew
/// correction; the imprecision is an accepted property of the protocol.
pub type Timestamp = i64;

/// Role string the server assigns to the round's Anchor.
pub const ANCHOR_ROLE: &str = "Anchor";

/// Guess label meaning "this player is acting on a personality card".
/// The only guess value the protocol currently defines.
pub const WEIRD_GUESS: &str = "Weird";

// ── Enums ───────────────────────────────────────────────────────────

/// Server-authoritative stage of a game round.
///
/// The server is the only writer; the client observes phases through polling
/// and may only *request* advancement via
/// [`Backend::check_and_advance_phase`](crate::Backend::check_and_advance_phase).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Players are gathering in the lobby.
    #[default]
    Waiting,
    /// Players vote on a conversation topic (20 second window).
    TopicSelection,
    /// Timed group chat (180 second window).
    Chatting,
    /// The Anchor picks who they think was acting weird.
    Guessing,
    /// Scores are shown; "play again" returns to `Waiting`.
    Results,
}

// ── Structs ─────────────────────────────────────────────────────────

/// A player as reported by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Asserted identity for the round: either [`ANCHOR_ROLE`] or the name
    /// of the assigned personality trait.
    pub role: String,
    /// Trait card handed to non-Anchor players.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality_card: Option<PersonalityCard>,
    /// Denormalized convenience flag; must agree with `role == "Anchor"`.
    pub is_anchor: bool,
}

impl Player {
    /// Whether this player is the round's Anchor.
    ///
    /// `role` is the asserted identity. A disagreeing `is_anchor` flag is a
    /// data-quality signal — logged, never escalated.
    pub fn is_round_anchor(&self) -> bool {
        let by_role = self.role == ANCHOR_ROLE;
        if by_role != self.is_anchor {
            warn!(
                player = %self.id,
                role = %self.role,
                is_anchor = self.is_anchor,
                "role and isAnchor flag disagree; trusting role"
            );
        }
        by_role
    }
}

/// A personality trait assigned to a non-Anchor player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalityCard {
    #[serde(rename = "trait")]
    pub trait_name: String,
}

/// One chat message in the room transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender: String,
    pub message: String,
    pub timestamp: Timestamp,
}

/// A generated conversation topic candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Topic {
    pub question: String,
}

/// A player's vote for one of the generated topics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub player_id: PlayerId,
    pub topic_index: u32,
}

/// One guess in a batch submission: the guesser believes `target_id` was
/// playing a personality card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Guess {
    pub guesser_id: PlayerId,
    pub target_id: PlayerId,
    pub guess: String,
}

/// Server-graded outcome of a guess batch. Scoring happens server-side only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuessingResult {
    pub correct_count: u32,
    pub guesses: Vec<Guess>,
}

/// Complete server-owned room snapshot, produced by every poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomStateView {
    pub phase: Phase,
    pub players: Vec<Player>,
    pub host_id: PlayerId,
    pub room_code: RoomCode,
    #[serde(default)]
    pub round_number: u32,
    #[serde(default)]
    pub chat_messages: Vec<ChatMessage>,
    /// Absolute start of the chat countdown; absent until chatting begins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_countdown_start_time: Option<Timestamp>,
    #[serde(default)]
    pub generated_topics: Vec<Topic>,
    #[serde(default)]
    pub votes: Vec<Vote>,
    /// Topic that won the vote; absent until topic selection resolves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_topic: Option<Topic>,
    /// Absolute start of the topic-selection countdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_selection_start_time: Option<Timestamp>,
    #[serde(default)]
    pub guesses: Vec<Guess>,
}

impl RoomStateView {
    /// Look up a player by id.
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Look up a player by display name.
    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    /// The round's Anchor, if one is assigned.
    pub fn anchor(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_round_anchor())
    }

    /// The vote cast by `player_id`, if any.
    ///
    /// Well-formed state has at most one vote per player, but the server is
    /// not assumed to enforce that; the first match wins.
    pub fn vote_for(&self, player_id: &str) -> Option<&Vote> {
        self.votes.iter().find(|v| v.player_id == player_id)
    }

    /// Number of votes cast for the topic at `topic_index`.
    pub fn vote_count(&self, topic_index: u32) -> usize {
        self.votes
            .iter()
            .filter(|v| v.topic_index == topic_index)
            .count()
    }

    /// Whether every current player has cast at least one vote.
    ///
    /// Counted over distinct voters rather than raw vote rows, so duplicate
    /// or stale vote entries cannot fake completion.
    pub fn all_voted(&self) -> bool {
        !self.players.is_empty()
            && self
                .players
                .iter()
                .all(|p| self.votes.iter().any(|v| v.player_id == p.id))
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn player(id: &str, role: &str, is_anchor: bool) -> Player {
        Player {
            id: id.into(),
            name: format!("name-{id}"),
            role: role.into(),
            personality_card: None,
            is_anchor,
        }
    }

    fn room(players: Vec<Player>, votes: Vec<Vote>) -> RoomStateView {
        RoomStateView {
            phase: Phase::TopicSelection,
            players,
            host_id: "p1".into(),
            room_code: "AB3456".into(),
            round_number: 1,
            chat_messages: vec![],
            chat_countdown_start_time: None,
            generated_topics: vec![],
            votes,
            selected_topic: None,
            topic_selection_start_time: None,
            guesses: vec![],
        }
    }

    #[test]
    fn phase_serializes_camel_case() {
        assert_eq!(
            serde_json::to_string(&Phase::TopicSelection).unwrap(),
            "\"topicSelection\""
        );
        assert_eq!(serde_json::to_string(&Phase::Waiting).unwrap(), "\"waiting\"");
        let p: Phase = serde_json::from_str("\"guessing\"").unwrap();
        assert_eq!(p, Phase::Guessing);
    }

    #[test]
    fn anchor_role_wins_over_flag() {
        // Flag says anchor, role says otherwise: role is asserted identity.
        let p = player("p1", "Overly Dramatic", true);
        assert!(!p.is_round_anchor());

        let p = player("p2", ANCHOR_ROLE, false);
        assert!(p.is_round_anchor());
    }

    #[test]
    fn anchor_lookup_uses_role() {
        let state = room(
            vec![
                player("p1", "Conspiracy Theorist", false),
                player("p2", ANCHOR_ROLE, true),
            ],
            vec![],
        );
        assert_eq!(state.anchor().map(|p| p.id.as_str()), Some("p2"));
    }

    #[test]
    fn all_voted_counts_distinct_voters() {
        let players = vec![
            player("p1", ANCHOR_ROLE, true),
            player("p2", "Rhymes", false),
            player("p3", "Whispers", false),
            player("p4", "Questions", false),
        ];

        // Four distinct votes: complete.
        let votes = (1..=4)
            .map(|i| Vote {
                player_id: format!("p{i}"),
                topic_index: 0,
            })
            .collect();
        assert!(room(players.clone(), votes).all_voted());

        // Four rows but only three voters: not complete.
        let votes = vec![
            Vote { player_id: "p1".into(), topic_index: 0 },
            Vote { player_id: "p1".into(), topic_index: 1 },
            Vote { player_id: "p2".into(), topic_index: 0 },
            Vote { player_id: "p3".into(), topic_index: 2 },
        ];
        assert!(!room(players, votes).all_voted());
    }

    #[test]
    fn all_voted_is_false_for_empty_room() {
        assert!(!room(vec![], vec![]).all_voted());
    }

    #[test]
    fn vote_count_filters_rather_than_indexes() {
        let state = room(
            vec![player("p1", ANCHOR_ROLE, true)],
            vec![
                Vote { player_id: "p1".into(), topic_index: 2 },
                Vote { player_id: "p2".into(), topic_index: 2 },
                // Out-of-range index must not panic anything.
                Vote { player_id: "p3".into(), topic_index: 99 },
            ],
        );
        assert_eq!(state.vote_count(2), 2);
        assert_eq!(state.vote_count(0), 0);
        assert_eq!(state.vote_count(99), 1);
    }

    #[test]
    fn room_state_parses_real_backend_json() {
        let json = r#"{
            "phase": "chatting",
            "players": [
                {"id": "p1", "name": "BlueTiger42", "role": "Anchor", "isAnchor": true},
                {"id": "p2", "name": "SwiftFox7", "role": "Overly Poetic",
                 "personalityCard": {"trait": "Overly Poetic"}, "isAnchor": false}
            ],
            "hostId": "p1",
            "roomCode": "AB3456",
            "roundNumber": 2,
            "chatMessages": [
                {"sender": "SwiftFox7", "message": "hello", "timestamp": 1754400000000000000}
            ],
            "chatCountdownStartTime": 1754400000000000000,
            "generatedTopics": [{"question": "Cats or dogs?"}],
            "votes": [{"playerId": "p2", "topicIndex": 0}],
            "selectedTopic": {"question": "Cats or dogs?"},
            "guesses": []
        }"#;
        let state: RoomStateView = serde_json::from_str(json).unwrap();
        assert_eq!(state.phase, Phase::Chatting);
        assert_eq!(state.round_number, 2);
        assert_eq!(state.chat_countdown_start_time, Some(1_754_400_000_000_000_000));
        assert!(state.topic_selection_start_time.is_none());
        assert_eq!(
            state.player("p2").unwrap().personality_card.as_ref().unwrap().trait_name,
            "Overly Poetic"
        );
        assert_eq!(state.anchor().map(|p| p.name.as_str()), Some("BlueTiger42"));
    }

    #[test]
    fn missing_optional_collections_default_to_empty() {
        // A minimal waiting-room snapshot from an older backend build.
        let json = r#"{
            "phase": "waiting",
            "players": [],
            "hostId": "p1",
            "roomCode": "XYZW23"
        }"#;
        let state: RoomStateView = serde_json::from_str(json).unwrap();
        assert!(state.chat_messages.is_empty());
        assert!(state.votes.is_empty());
        assert!(state.guesses.is_empty());
        assert_eq!(state.round_number, 0);
    }
}
