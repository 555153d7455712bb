//! Move Validator & Applier
//!
//! The only code allowed to change a battle's number, turn, round, history
//! or status. Every operation either fails without touching the state or
//! applies one whole transition and returns the events it produced.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::rng::DeterministicRng;
use crate::game::clock::ClockTick;
use crate::game::events::{CompletionReason, GameEvent, GameEventData, MatchOutcome};
use crate::game::input::MatchCommand;
use crate::game::mode::{FailurePolicy, GameMode, ModeError, WinnerSide};
use crate::game::state::{
    MatchId, MatchState, MatchStatus, MoveAmount, MoveRecord, PlayerId, VisibleNumber,
};

/// Quick Draw starting number when none is given.
pub const DEFAULT_QUICK_DRAW_START: u64 = 21;

/// Strategic starting number when none is given.
pub const DEFAULT_STRATEGIC_START: u64 = 100;

/// Inclusive range Mystery battles draw their hidden start from.
pub const MYSTERY_START_RANGE: (u64, u64) = (50, 150);

/// Default turn length in seconds.
pub const DEFAULT_TURN_SECS: u32 = 30;

/// Default number of timeouts that loses a battle.
pub const DEFAULT_TIMEOUT_LIMIT: u32 = 2;

/// Parameters fixed at battle creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Starting number; `None` picks the mode default.
    pub starting_number: Option<u64>,
    /// Seconds per turn.
    pub turn_duration_secs: u32,
    /// Timeouts by one player that end the battle.
    pub timeout_limit: u32,
    /// First round number.
    pub initial_round: u32,
    /// Display-only round cap.
    pub max_rounds: Option<u32>,
    /// Secret seed for the default starting number; fresh entropy when
    /// `None`. Never sent to clients while the battle runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            starting_number: None,
            turn_duration_secs: DEFAULT_TURN_SECS,
            timeout_limit: DEFAULT_TIMEOUT_LIMIT,
            initial_round: 1,
            max_rounds: None,
            seed: None,
        }
    }
}

impl MatchConfig {
    /// Reject configurations no battle can be played with.
    pub fn validate(&self) -> Result<(), ModeError> {
        if self.starting_number == Some(0) {
            return Err(ModeError::ZeroStartingNumber);
        }
        if self.turn_duration_secs == 0 {
            return Err(ModeError::ZeroTurnDuration);
        }
        if self.timeout_limit == 0 {
            return Err(ModeError::ZeroTimeoutLimit);
        }
        Ok(())
    }

    /// Starting number used when the creator did not pick one.
    pub fn default_starting_number(mode: GameMode, rng: &mut DeterministicRng) -> u64 {
        match mode {
            GameMode::QuickDraw => DEFAULT_QUICK_DRAW_START,
            GameMode::Strategic => DEFAULT_STRATEGIC_START,
            GameMode::PureMystery | GameMode::HardcoreMystery => {
                rng.next_in_range(MYSTERY_START_RANGE.0, MYSTERY_START_RANGE.1)
            }
        }
    }
}

/// Rejected operation. The battle is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Misconfigured battle.
    #[error("configuration error: {0}")]
    Configuration(#[from] ModeError),

    /// A participant acted out of turn.
    #[error("not your turn")]
    NotYourTurn,

    /// Battle is waiting or already completed.
    #[error("match is not active")]
    MatchNotActive,

    /// Amount outside the mode's legal range.
    #[error("illegal move: {amount}")]
    IllegalMove {
        /// Rejected amount.
        amount: u64,
    },

    /// Acting player is not in this battle.
    #[error("player is not part of this match")]
    NotAParticipant,

    /// Opponent already bound.
    #[error("match already started")]
    AlreadyStarted,

    /// Creator tried to join their own battle.
    #[error("cannot play against yourself")]
    SelfMatch,

    /// Command addressed to a different battle.
    #[error("command addressed to another match")]
    MatchMismatch,
}

/// Result of one engine operation.
#[derive(Debug, Default)]
pub struct TurnResult {
    /// Events generated by the operation
    pub events: Vec<GameEvent>,
    /// Whether the battle is completed after the operation
    pub match_ended: bool,
    /// Terminal event (if the battle is completed)
    pub outcome: Option<MatchOutcome>,
}

impl MatchState {
    /// Bind the opponent and start the first turn (`Waiting -> Active`).
    pub fn activate(&mut self, opponent: PlayerId) -> Result<TurnResult, GameError> {
        if self.status != MatchStatus::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if opponent == self.creator {
            return Err(GameError::SelfMatch);
        }

        self.opponent = Some(opponent);
        self.status = MatchStatus::Active;
        self.current_player = self.creator;
        self.clock.start();

        self.push_event(GameEvent::new(
            self.round,
            self.elapsed_secs,
            GameEventData::MatchStarted {
                creator: self.creator,
                opponent,
                mode: self.mode(),
                starting_number: self.visible_number(),
            },
        ));
        self.push_turn_started();

        Ok(self.finish_operation())
    }

    /// Subtract `amount` on behalf of `player`.
    pub fn submit_move(&mut self, player: PlayerId, amount: u64) -> Result<TurnResult, GameError> {
        if self.status != MatchStatus::Active {
            return Err(GameError::MatchNotActive);
        }
        if player != self.current_player {
            return Err(if self.is_participant(&player) {
                GameError::NotYourTurn
            } else {
                GameError::NotAParticipant
            });
        }

        let current = self.current_number;
        let opponent = self.other_player(&player).ok_or(GameError::NotAParticipant)?;

        if !self.policy.is_legal_move(current, amount) {
            return match self.policy.failure_policy {
                FailurePolicy::Forgiving => Err(GameError::IllegalMove { amount }),
                FailurePolicy::InstantLoss => {
                    self.record(player, MoveAmount::Illegal(amount), current);
                    self.complete(opponent, player, CompletionReason::IllegalMove);
                    Ok(self.finish_operation())
                }
            };
        }

        let next = self.policy.compute_next(current, amount);
        self.current_number = next;
        self.record(player, MoveAmount::Subtract(amount), next);

        match self.policy.check_win(next) {
            Some(WinnerSide::Mover) => self.complete(player, opponent, CompletionReason::ReachedZero),
            Some(WinnerSide::Opponent) => self.complete(opponent, player, CompletionReason::ReachedZero),
            None => self.advance_turn(opponent),
        }

        Ok(self.finish_operation())
    }

    /// Charge the current player with a timeout and pass the turn.
    pub fn apply_timeout(&mut self) -> Result<TurnResult, GameError> {
        if self.status != MatchStatus::Active {
            return Err(GameError::MatchNotActive);
        }

        let player = self.current_player;
        let opponent = self.other_player(&player).ok_or(GameError::NotAParticipant)?;

        let count = {
            let entry = self.timeouts.entry(player).or_insert(0);
            *entry += 1;
            *entry
        };
        self.record(player, MoveAmount::Timeout, self.current_number);

        if count >= self.config.timeout_limit {
            self.complete(opponent, player, CompletionReason::TimeoutLimit);
        } else {
            self.advance_turn(opponent);
        }

        Ok(self.finish_operation())
    }

    /// Advance logical time by one second.
    ///
    /// Returns the timeout transition when the turn clock expires on this
    /// tick, `None` otherwise (including when the battle is not active).
    pub fn tick(&mut self) -> Option<TurnResult> {
        if self.status != MatchStatus::Active {
            return None;
        }

        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        match self.clock.tick() {
            ClockTick::Expired => self.apply_timeout().ok(),
            ClockTick::Counting(_) | ClockTick::Idle => None,
        }
    }

    /// `player` resigns. Completing twice returns the stored outcome.
    pub fn forfeit(&mut self, player: PlayerId) -> Result<TurnResult, GameError> {
        if !self.is_participant(&player) {
            return Err(GameError::NotAParticipant);
        }

        match self.status {
            MatchStatus::Waiting => Err(GameError::MatchNotActive),
            MatchStatus::Completed => Ok(TurnResult {
                events: Vec::new(),
                match_ended: true,
                outcome: self.outcome.clone(),
            }),
            MatchStatus::Active => {
                let opponent = self.other_player(&player).ok_or(GameError::NotAParticipant)?;
                self.complete(opponent, player, CompletionReason::Forfeit);
                Ok(self.finish_operation())
            }
        }
    }

    /// Apply a command from the input boundary.
    pub fn apply_command(&mut self, command: MatchCommand) -> Result<TurnResult, GameError> {
        if command.match_id() != self.match_id {
            return Err(GameError::MatchMismatch);
        }

        match command {
            MatchCommand::SubmitMove(submission) => {
                self.submit_move(submission.player, submission.amount)
            }
            MatchCommand::Timeout(_) => self.apply_timeout(),
            MatchCommand::Forfeit { player, .. } => self.forfeit(player),
        }
    }

    /// Append a record for the current turn and close the round.
    fn record(&mut self, player: PlayerId, amount: MoveAmount, resulting_number: u64) {
        self.moves.push(MoveRecord {
            player,
            amount,
            resulting_number,
            timestamp: self.elapsed_secs,
            round: self.round,
        });

        let event = match amount {
            MoveAmount::Timeout => GameEventData::TurnTimedOut {
                player,
                timeouts: self.timeouts_of(&player),
            },
            MoveAmount::Subtract(_) | MoveAmount::Illegal(_) => GameEventData::MoveApplied {
                player,
                amount,
                resulting_number: VisibleNumber::mask(resulting_number, self.policy.is_hidden()),
            },
        };
        self.push_event(GameEvent::new(self.round, self.elapsed_secs, event));

        self.round += 1;
    }

    fn advance_turn(&mut self, next_player: PlayerId) {
        self.current_player = next_player;
        self.clock.reset();
        self.push_turn_started();
    }

    fn push_turn_started(&mut self) {
        self.push_event(GameEvent::new(
            self.round,
            self.elapsed_secs,
            GameEventData::TurnStarted {
                player: self.current_player,
                time_left: self.clock.time_left(),
            },
        ));
    }

    /// Terminal transition. Callers guarantee the battle is active.
    fn complete(&mut self, winner: PlayerId, loser: PlayerId, reason: CompletionReason) {
        self.status = MatchStatus::Completed;
        self.clock.stop();

        let outcome = MatchOutcome {
            match_id: self.match_id,
            mode: self.mode(),
            winner,
            loser,
            reason,
            starting_number: self.starting_number,
            final_number: self.current_number,
            rounds: self.round,
            moves: self.moves.clone(),
            final_state_hash: self.compute_hash(),
        };
        self.outcome = Some(outcome);

        self.push_event(GameEvent::new(
            self.round,
            self.elapsed_secs,
            GameEventData::MatchCompleted {
                winner,
                loser,
                reason,
                final_number: self.current_number,
            },
        ));
    }

    fn finish_operation(&mut self) -> TurnResult {
        let match_ended = self.is_completed();
        TurnResult {
            events: self.take_events(),
            match_ended,
            outcome: if match_ended { self.outcome.clone() } else { None },
        }
    }
}

/// Rebuild a battle from its recorded history.
///
/// Used to check a settled outcome: the replayed state hash must equal
/// `MatchOutcome::final_state_hash` for battles that ended on a move or a
/// timeout. Forfeits leave no record and are not replayable.
pub fn replay_moves(
    match_id: MatchId,
    creator: PlayerId,
    opponent: PlayerId,
    mode: GameMode,
    config: MatchConfig,
    moves: &[MoveRecord],
) -> Result<MatchState, GameError> {
    let mut state = MatchState::new(match_id, creator, mode, config)?;
    state.activate(opponent)?;

    for record in moves {
        match record.amount {
            MoveAmount::Subtract(amount) | MoveAmount::Illegal(amount) => {
                state.submit_move(record.player, amount)?;
            }
            MoveAmount::Timeout => {
                if record.player != state.current_player {
                    return Err(GameError::NotYourTurn);
                }
                state.apply_timeout()?;
            }
        }
    }

    Ok(state)
}

// =============================================================================
// TESTS
// =============================================================================
