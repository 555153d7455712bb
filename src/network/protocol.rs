//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are JSON objects tagged with a `type` field.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::game::engine::GameError;
use crate::game::events::{GameEvent, MatchOutcome};
use crate::game::mode::{GameMode, ModeError};
use crate::game::state::{MatchId, MatchStatus, MatchView, PlayerId, VisibleNumber};
use crate::network::session::SessionError;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Identify the connection. A fresh id is assigned when none is given.
    Hello {
        /// Player's identifier.
        #[serde(default)]
        player_id: Option<PlayerId>,
    },

    /// Open a new battle.
    CreateBattle(CreateBattleRequest),

    /// Take the opponent seat of a waiting battle.
    JoinBattle {
        /// Battle to join.
        match_id: MatchId,
    },

    /// Browse battles, optionally by status.
    ListBattles {
        /// Status filter.
        #[serde(default)]
        status: Option<MatchStatus>,
    },

    /// Fetch a snapshot and follow a battle's updates.
    GetBattle {
        /// Battle to watch.
        match_id: MatchId,
    },

    /// Play a turn.
    SubmitMove {
        /// Target battle.
        match_id: MatchId,
        /// Amount to subtract.
        amount: u64,
    },

    /// Give up a battle.
    Resign {
        /// Target battle.
        match_id: MatchId,
    },

    /// Ping for latency measurement.
    Ping { timestamp: u64 },
}

/// Battle creation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBattleRequest {
    /// Mode name, e.g. `quick_draw` or `hardcore-mystery`.
    pub mode: String,
    /// Starting number; mode default when absent.
    #[serde(default)]
    pub starting_number: Option<u64>,
    /// Turn length override in seconds.
    #[serde(default)]
    pub turn_duration_secs: Option<u32>,
    /// Display-only round cap.
    #[serde(default)]
    pub max_rounds: Option<u32>,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection identified.
    Welcome {
        /// Identifier bound to this connection.
        player_id: PlayerId,
        /// Server version.
        server_version: String,
    },

    /// Battle opened.
    BattleCreated(BattleSummary),

    /// Battle listing.
    Battles {
        /// Matching battles, newest first.
        battles: Vec<BattleSummary>,
    },

    /// Full battle snapshot.
    Snapshot(MatchView),

    /// Engine event.
    Event {
        /// Source battle.
        match_id: MatchId,
        /// The event.
        event: GameEvent,
    },

    /// Turn clock update.
    Clock {
        /// Source battle.
        match_id: MatchId,
        /// Seconds left in the current turn.
        time_left: u32,
    },

    /// Battle finished.
    MatchEnd(MatchOutcome),

    /// Pong response.
    Pong { timestamp: u64, server_time: u64 },

    /// Error message.
    Error(ServerError),

    /// Server is shutting down.
    Shutdown { reason: String },
}

/// One line of the battle browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSummary {
    /// Battle identifier.
    pub match_id: MatchId,
    /// Game mode.
    pub mode: GameMode,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Creator.
    pub creator: PlayerId,
    /// Opponent, once joined.
    pub opponent: Option<PlayerId>,
    /// Current number as players may see it.
    pub current_number: VisibleNumber,
    /// Current round.
    pub round: u32,
    /// Seconds per turn.
    pub turn_duration_secs: u32,
    /// Winner, once completed.
    pub winner: Option<PlayerId>,
    /// When the battle was opened.
    pub created_at: DateTime<Utc>,
}

/// Server error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Connection has not sent `hello`.
    NotIdentified,
    /// Another live connection holds the claimed player id.
    PlayerIdTaken,
    /// Unparseable message.
    InvalidInput,
    /// Unknown game mode.
    UnknownMode,
    /// Unusable battle parameters.
    InvalidConfig,
    /// Battle not found.
    BattleNotFound,
    /// Battle already has two players.
    BattleFull,
    /// Creator tried to join their own battle.
    OwnBattle,
    /// Not the caller's turn.
    NotYourTurn,
    /// Battle is not active.
    MatchNotActive,
    /// Move outside the legal range.
    IllegalMove,
    /// Caller is not in the battle.
    NotAParticipant,
    /// Server overloaded.
    ServerOverloaded,
    /// Internal error.
    InternalError,
}

impl From<&SessionError> for ErrorCode {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::BattleNotFound => ErrorCode::BattleNotFound,
            SessionError::BattleFull => ErrorCode::BattleFull,
            SessionError::CannotJoinOwnBattle => ErrorCode::OwnBattle,
            SessionError::Game(game) => match game {
                GameError::Configuration(ModeError::UnknownMode(_)) => ErrorCode::UnknownMode,
                GameError::Configuration(_) => ErrorCode::InvalidConfig,
                GameError::NotYourTurn => ErrorCode::NotYourTurn,
                GameError::MatchNotActive => ErrorCode::MatchNotActive,
                GameError::IllegalMove { .. } => ErrorCode::IllegalMove,
                GameError::NotAParticipant => ErrorCode::NotAParticipant,
                GameError::AlreadyStarted => ErrorCode::BattleFull,
                GameError::SelfMatch => ErrorCode::OwnBattle,
                GameError::MatchMismatch => ErrorCode::InternalError,
            },
        }
    }
}

impl ServerMessage {
    /// Build an error message.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error(ServerError {
            code,
            message: message.into(),
        })
    }

    /// Error message for a failed session operation.
    pub fn from_session_error(err: &SessionError) -> Self {
        Self::error(ErrorCode::from(err), err.to_string())
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
