//! Game Events
//!
//! Events produced by the engine for the presentation layer, and the
//! terminal [`MatchOutcome`] handed to settlement.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHash;
use crate::game::mode::GameMode;
use crate::game::state::{MatchId, MoveAmount, MoveRecord, PlayerId, VisibleNumber};

/// Why a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// The number reached zero.
    ReachedZero,
    /// Illegal move under an instant-loss policy.
    IllegalMove,
    /// A player ran out the clock too many times.
    TimeoutLimit,
    /// A player resigned or left.
    Forfeit,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEventData {
    /// Opponent joined, first turn begins
    MatchStarted {
        creator: PlayerId,
        opponent: PlayerId,
        mode: GameMode,
        starting_number: VisibleNumber,
    },

    /// A turn was played
    MoveApplied {
        player: PlayerId,
        amount: MoveAmount,
        resulting_number: VisibleNumber,
    },

    /// A player let the clock run out
    TurnTimedOut {
        player: PlayerId,
        timeouts: u32,
    },

    /// The next turn started
    TurnStarted {
        player: PlayerId,
        time_left: u32,
    },

    /// Battle finished
    MatchCompleted {
        winner: PlayerId,
        loser: PlayerId,
        reason: CompletionReason,
        final_number: u64,
    },
}

/// A game event with logical timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Round the event belongs to
    pub round: u32,

    /// Logical match time in seconds
    pub timestamp: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(round: u32, timestamp: u32, data: GameEventData) -> Self {
        Self { round, timestamp, data }
    }

    /// Whether this event closes the battle.
    pub fn is_terminal(&self) -> bool {
        matches!(self.data, GameEventData::MatchCompleted { .. })
    }
}

// =============================================================================
// MATCH OUTCOME
// =============================================================================

/// Terminal event for settlement and results pages.
///
/// Built once when a battle completes and stored on the match; asking again
/// returns the same value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Battle identifier.
    pub match_id: MatchId,
    /// Game mode.
    pub mode: GameMode,
    /// Winner.
    pub winner: PlayerId,
    /// Loser.
    pub loser: PlayerId,
    /// Why it ended.
    pub reason: CompletionReason,
    /// Number the battle started from (revealed even in Mystery modes).
    pub starting_number: u64,
    /// Number at the end (revealed even in Mystery modes).
    pub final_number: u64,
    /// Round counter at completion.
    pub rounds: u32,
    /// Full move history.
    pub moves: Vec<MoveRecord>,
    /// Hash of the final state, for reconciliation.
    pub final_state_hash: StateHash,
}

impl MatchOutcome {
    /// Serialize to compact binary for settlement submission.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }

    /// Final state hash as hex.
    pub fn state_hash_hex(&self) -> String {
        hex::encode(self.final_state_hash)
    }
}
