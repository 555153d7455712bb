//! Game Logic Module
//!
//! The subtraction game engine. Deterministic: no system time, no I/O,
//! no locking. The arena service in `network/` drives it.
//!
//! ## Module Structure
//!
//! - `mode`: Game modes and their rule policies
//! - `state`: Match state, identifiers, move records, views
//! - `clock`: Per-turn countdown
//! - `engine`: Move validator & applier, replay
//! - `input`: Commands accepted by the engine
//! - `events`: Game events and the terminal match outcome

pub mod mode;
pub mod state;
pub mod clock;
pub mod engine;
pub mod input;
pub mod events;

// Re-export key types
pub use mode::{GameMode, ModePolicy, ModeError, FailurePolicy, WinRule, WinnerSide};
pub use state::{MatchState, MatchStatus, MatchId, PlayerId, MoveRecord, MoveAmount, MatchView, VisibleNumber};
pub use clock::{TurnClock, ClockState, ClockTick};
pub use engine::{GameError, MatchConfig, TurnResult, replay_moves};
pub use input::{MatchCommand, MoveSubmission, TimeoutSignal};
pub use events::{GameEvent, GameEventData, MatchOutcome, CompletionReason};
