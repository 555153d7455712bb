//! Match State Definitions
//!
//! All state types for one subtraction battle. The fields that carry game
//! progress are crate-private: only the engine (`game::engine`) mutates
//! them, everything else reads through accessors or a [`MatchView`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Deserialize, Serializer, Deserializer};

use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::rng::{random_seed, DeterministicRng};
use crate::game::clock::TurnClock;
use crate::game::engine::{GameError, MatchConfig};
use crate::game::events::{GameEvent, MatchOutcome};
use crate::game::mode::{GameMode, ModePolicy};

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub [u8; 16]);

        impl $name {
            /// Create from raw bytes.
            pub const fn new(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }

            /// Fresh random identifier (UUID v4).
            pub fn random() -> Self {
                Self(uuid::Uuid::new_v4().into_bytes())
            }

            /// Create from UUID string.
            pub fn from_uuid_str(s: &str) -> Option<Self> {
                uuid::Uuid::parse_str(s).ok().map(|u| Self(*u.as_bytes()))
            }

            /// Convert to UUID string.
            pub fn to_uuid_string(&self) -> String {
                uuid::Uuid::from_bytes(self.0).to_string()
            }

            /// Get raw bytes.
            pub fn as_bytes(&self) -> &[u8; 16] {
                &self.0
            }

            /// First four bytes as hex, for log lines.
            pub fn short(&self) -> String {
                hex::encode(&self.0[..4])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_uuid_string())
            }
        }

        // UUID strings on the wire, raw bytes in binary formats.
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                uuid::Uuid::from_bytes(self.0).serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                uuid::Uuid::deserialize(deserializer).map(|u| Self(*u.as_bytes()))
            }
        }
    };
}

uuid_id! {
    /// Unique player identifier (UUID as bytes).
    ///
    /// Implements Ord for deterministic BTreeMap ordering.
    PlayerId
}

uuid_id! {
    /// Unique battle identifier (UUID as bytes).
    MatchId
}

// =============================================================================
// STATUS & MOVES
// =============================================================================

/// Battle lifecycle. Only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum MatchStatus {
    /// Created, waiting for an opponent.
    #[default]
    Waiting,
    /// Both players bound, turns in progress.
    Active,
    /// Finished; no further mutation.
    Completed,
}

/// What a move record holds in place of a plain number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveAmount {
    /// A legal subtraction.
    Subtract(u64),
    /// The turn clock ran out.
    Timeout,
    /// An illegal amount that cost the battle (instant-loss modes).
    Illegal(u64),
}

/// One elapsed turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Who acted (or failed to act).
    pub player: PlayerId,
    /// What they did.
    pub amount: MoveAmount,
    /// Number after the turn.
    pub resulting_number: u64,
    /// Logical match time in seconds.
    pub timestamp: u32,
    /// Round this turn closed.
    pub round: u32,
}

/// A number as players are allowed to see it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibleNumber {
    /// Visible value.
    Shown(u64),
    /// Mystery modes keep the number secret until the end.
    Hidden,
}

impl VisibleNumber {
    /// Mask `value` according to `hidden`.
    pub fn mask(value: u64, hidden: bool) -> Self {
        if hidden {
            VisibleNumber::Hidden
        } else {
            VisibleNumber::Shown(value)
        }
    }
}

/// Move record as shown to players.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveView {
    /// Who acted.
    pub player: PlayerId,
    /// What they did.
    pub amount: MoveAmount,
    /// Number after the turn, masked in Mystery modes.
    pub resulting_number: VisibleNumber,
    /// Logical match time in seconds.
    pub timestamp: u32,
    /// Round this turn closed.
    pub round: u32,
}

/// Read-only snapshot for rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchView {
    /// Battle identifier.
    pub match_id: MatchId,
    /// Game mode.
    pub mode: GameMode,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Battle creator.
    pub creator: PlayerId,
    /// Opponent, once joined.
    pub opponent: Option<PlayerId>,
    /// Whose turn it is.
    pub current_player: PlayerId,
    /// Current number, masked in Mystery modes while the battle runs.
    pub current_number: VisibleNumber,
    /// Current round.
    pub round: u32,
    /// Optional display-only round cap.
    pub max_rounds: Option<u32>,
    /// Seconds left in the current turn.
    pub time_left: u32,
    /// Full turn length in seconds.
    pub turn_duration: u32,
    /// Elapsed turns.
    pub moves: Vec<MoveView>,
    /// Winner, once completed.
    pub winner: Option<PlayerId>,
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete state of one battle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchState {
    /// Battle identifier
    pub match_id: MatchId,

    /// Rule set, fixed at creation
    pub policy: ModePolicy,

    /// Creation parameters
    pub config: MatchConfig,

    /// Creator (moves first)
    pub creator: PlayerId,

    /// Opponent, bound on join
    pub(crate) opponent: Option<PlayerId>,

    pub(crate) status: MatchStatus,
    pub(crate) current_player: PlayerId,
    pub(crate) starting_number: u64,
    pub(crate) current_number: u64,
    pub(crate) initial_round: u32,
    pub(crate) round: u32,
    pub(crate) moves: Vec<MoveRecord>,

    /// Timeouts per player across the whole battle
    pub(crate) timeouts: BTreeMap<PlayerId, u32>,

    /// Logical time in seconds since activation
    pub(crate) elapsed_secs: u32,

    pub(crate) clock: TurnClock,

    /// Terminal event, stored once completed
    pub(crate) outcome: Option<MatchOutcome>,

    /// Events generated by the last operation
    #[serde(skip)]
    pub(crate) pending_events: Vec<GameEvent>,
}

impl MatchState {
    /// Create a battle in `Waiting` with only the creator bound.
    pub fn new(
        match_id: MatchId,
        creator: PlayerId,
        mode: GameMode,
        mut config: MatchConfig,
    ) -> Result<Self, GameError> {
        config.validate()?;

        let starting_number = match config.starting_number {
            Some(n) => n,
            None => {
                let seed = *config.seed.get_or_insert_with(random_seed);
                let mut rng = DeterministicRng::new(seed);
                MatchConfig::default_starting_number(mode, &mut rng)
            }
        };

        Ok(Self {
            match_id,
            policy: mode.policy(),
            creator,
            opponent: None,
            status: MatchStatus::Waiting,
            current_player: creator,
            starting_number,
            current_number: starting_number,
            initial_round: config.initial_round,
            round: config.initial_round,
            moves: Vec::new(),
            timeouts: BTreeMap::new(),
            elapsed_secs: 0,
            clock: TurnClock::new(config.turn_duration_secs),
            outcome: None,
            pending_events: Vec::new(),
            config,
        })
    }

    /// Game mode.
    pub fn mode(&self) -> GameMode {
        self.policy.mode
    }

    /// Lifecycle status.
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Opponent, once joined.
    pub fn opponent(&self) -> Option<PlayerId> {
        self.opponent
    }

    /// Whose turn it is.
    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    /// True current number. Not for display in hidden modes.
    pub fn current_number(&self) -> u64 {
        self.current_number
    }

    /// Number the battle started from.
    pub fn starting_number(&self) -> u64 {
        self.starting_number
    }

    /// Current number as players may see it.
    pub fn visible_number(&self) -> VisibleNumber {
        let hidden = self.policy.is_hidden() && self.status != MatchStatus::Completed;
        VisibleNumber::mask(self.current_number, hidden)
    }

    /// Current round.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Round the battle started at.
    pub fn initial_round(&self) -> u32 {
        self.initial_round
    }

    /// Seconds left in the current turn.
    pub fn time_left(&self) -> u32 {
        self.clock.time_left()
    }

    /// The turn clock.
    pub fn clock(&self) -> &TurnClock {
        &self.clock
    }

    /// All elapsed turns, oldest first.
    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    /// Timeouts charged to `player`.
    pub fn timeouts_of(&self, player: &PlayerId) -> u32 {
        self.timeouts.get(player).copied().unwrap_or(0)
    }

    /// Logical seconds since activation.
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// Terminal event, if completed.
    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    /// Whether the battle is over.
    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Whether `player` is one of the two participants.
    pub fn is_participant(&self, player: &PlayerId) -> bool {
        *player == self.creator || Some(*player) == self.opponent
    }

    /// The other participant.
    pub fn other_player(&self, player: &PlayerId) -> Option<PlayerId> {
        if *player == self.creator {
            self.opponent
        } else if Some(*player) == self.opponent {
            Some(self.creator)
        } else {
            None
        }
    }

    /// Move history as players may see it.
    pub fn move_views(&self) -> Vec<MoveView> {
        let hidden = self.policy.is_hidden() && self.status != MatchStatus::Completed;
        self.moves
            .iter()
            .map(|m| MoveView {
                player: m.player,
                amount: m.amount,
                resulting_number: VisibleNumber::mask(m.resulting_number, hidden),
                timestamp: m.timestamp,
                round: m.round,
            })
            .collect()
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> MatchView {
        MatchView {
            match_id: self.match_id,
            mode: self.mode(),
            status: self.status,
            creator: self.creator,
            opponent: self.opponent,
            current_player: self.current_player,
            current_number: self.visible_number(),
            round: self.round,
            max_rounds: self.config.max_rounds,
            time_left: self.clock.time_left(),
            turn_duration: self.clock.turn_duration(),
            moves: self.move_views(),
            winner: self.outcome.as_ref().map(|o| o.winner),
        }
    }

    /// Compute hash of current state.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.match_id.as_bytes(), self.round, |hasher| {
            hasher.update_u8(self.mode() as u8);
            hasher.update_u8(self.status as u8);
            hasher.update_uuid(self.creator.as_bytes());
            match &self.opponent {
                Some(id) => {
                    hasher.update_bool(true);
                    hasher.update_uuid(id.as_bytes());
                }
                None => hasher.update_bool(false),
            }
            hasher.update_uuid(self.current_player.as_bytes());
            hasher.update_u64(self.starting_number);
            hasher.update_u64(self.current_number);

            hasher.update_u32(self.moves.len() as u32);
            for record in &self.moves {
                hasher.update_uuid(record.player.as_bytes());
                match record.amount {
                    MoveAmount::Subtract(n) => {
                        hasher.update_u8(0);
                        hasher.update_u64(n);
                    }
                    MoveAmount::Timeout => hasher.update_u8(1),
                    MoveAmount::Illegal(n) => {
                        hasher.update_u8(2);
                        hasher.update_u64(n);
                    }
                }
                hasher.update_u64(record.resulting_number);
                hasher.update_u32(record.round);
            }

            // BTreeMap iterates in sorted order
            for (player, count) in &self.timeouts {
                hasher.update_uuid(player.as_bytes());
                hasher.update_u32(*count);
            }
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================
