//! Turn Clock
//!
//! Per-match countdown for the active turn. The clock is driven by whole
//! second ticks and reports expiry exactly once per turn; the engine resets
//! it whenever the turn changes and stops it when the match completes.

use serde::{Serialize, Deserialize};

/// Clock lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum ClockState {
    /// Counting down the current turn.
    Running,
    /// Reached zero; waiting for the engine to start the next turn.
    Expired,
    /// Not bound to an active turn.
    #[default]
    Stopped,
}

/// Result of a single tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockTick {
    /// Still running with this many seconds left.
    Counting(u32),
    /// Time ran out on this tick.
    Expired,
    /// Clock not running; nothing happened.
    Idle,
}

/// Countdown for one player's turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnClock {
    turn_duration: u32,
    time_left: u32,
    state: ClockState,
}

impl TurnClock {
    /// Create a stopped clock for turns of `turn_duration` seconds.
    pub fn new(turn_duration: u32) -> Self {
        Self {
            turn_duration,
            time_left: turn_duration,
            state: ClockState::Stopped,
        }
    }

    /// Begin a new turn with the full duration.
    pub fn start(&mut self) {
        self.time_left = self.turn_duration;
        self.state = ClockState::Running;
    }

    /// Alias of [`TurnClock::start`], used on turn changes.
    pub fn reset(&mut self) {
        self.start();
    }

    /// Advance one second.
    pub fn tick(&mut self) -> ClockTick {
        if self.state != ClockState::Running {
            return ClockTick::Idle;
        }

        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.state = ClockState::Expired;
            ClockTick::Expired
        } else {
            ClockTick::Counting(self.time_left)
        }
    }

    /// Stop for good; further ticks are no-ops until restarted.
    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
    }

    /// Seconds left in the current turn.
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// Full turn length in seconds.
    pub fn turn_duration(&self) -> u32 {
        self.turn_duration
    }

    /// Current clock state.
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Whether the clock is counting.
    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }
}
