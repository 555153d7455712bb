//! Game Modes and Their Rules
//!
//! Each battle picks one [`GameMode`] at creation. The mode resolves once
//! into an immutable [`ModePolicy`]; everything downstream asks the policy
//! instead of branching on the mode again.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use thiserror::Error;

// =============================================================================
// GAME MODE
// =============================================================================

/// The four battle variants offered by the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GameMode {
    /// Subtract exactly one per turn; whoever reaches zero wins.
    QuickDraw = 0,
    /// Subtract 10%-30% of the number; whoever reaches zero loses.
    Strategic = 1,
    /// Hidden number, any amount up to it.
    PureMystery = 2,
    /// Hidden number, and an illegal move loses the battle on the spot.
    HardcoreMystery = 3,
}

impl GameMode {
    /// All modes, in wire order.
    pub const ALL: [GameMode; 4] = [
        GameMode::QuickDraw,
        GameMode::Strategic,
        GameMode::PureMystery,
        GameMode::HardcoreMystery,
    ];

    /// Canonical snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::QuickDraw => "quick_draw",
            GameMode::Strategic => "strategic",
            GameMode::PureMystery => "pure_mystery",
            GameMode::HardcoreMystery => "hardcore_mystery",
        }
    }

    /// Rule set for this mode.
    pub fn policy(self) -> ModePolicy {
        ModePolicy::for_mode(self)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = ModeError;

    /// Accepts `quick_draw`, `quick-draw`, `quickdraw` and `QuickDraw` style names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "quickdraw" => Ok(GameMode::QuickDraw),
            "strategic" => Ok(GameMode::Strategic),
            "puremystery" => Ok(GameMode::PureMystery),
            "hardcoremystery" => Ok(GameMode::HardcoreMystery),
            _ => Err(ModeError::UnknownMode(s.to_string())),
        }
    }
}

/// Misconfigured battle. Creation is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    /// Mode name not recognised.
    #[error("unknown game mode: {0:?}")]
    UnknownMode(String),

    /// Battles must start above zero.
    #[error("starting number must be greater than zero")]
    ZeroStartingNumber,

    /// Turns must last at least one second.
    #[error("turn duration must be at least one second")]
    ZeroTurnDuration,

    /// A timeout limit of zero would end the battle before it starts.
    #[error("timeout limit must be at least one")]
    ZeroTimeoutLimit,

    /// Hidden modes draw their own secret starting number.
    #[error("starting number cannot be chosen in hidden modes")]
    HiddenStartingNumber,
}

// =============================================================================
// POLICY
// =============================================================================

/// What happens to an illegal move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Reject the move; the player may try again.
    Forgiving,
    /// The mover loses immediately.
    InstantLoss,
}

/// Who wins when the number reaches zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinRule {
    /// Normal play: reaching zero wins.
    MoverWins,
    /// Misère play: reaching zero loses.
    MoverLoses,
}

/// Side that won, relative to the player who just moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WinnerSide {
    /// The player who made the move.
    Mover,
    /// The other player.
    Opponent,
}

/// Legal subtraction amounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveRange {
    /// Exactly this amount.
    Exactly(u64),
    /// Between `min_percent` (rounded up) and `max_percent` (rounded down)
    /// of the current number, strictly below it.
    Fraction {
        /// Lower bound in percent.
        min_percent: u64,
        /// Upper bound in percent.
        max_percent: u64,
    },
    /// Any amount from 1 up to the current number.
    UpToCurrent,
}

/// Immutable rule set for one mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModePolicy {
    /// Mode this policy was built for.
    pub mode: GameMode,
    /// Legal move amounts.
    pub range: MoveRange,
    /// Whether players see the current number.
    pub hidden: bool,
    /// Handling of illegal moves.
    pub failure_policy: FailurePolicy,
    /// Zero condition.
    pub win_rule: WinRule,
}

impl ModePolicy {
    /// Build the policy for a mode.
    pub const fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::QuickDraw => Self {
                mode,
                range: MoveRange::Exactly(1),
                hidden: false,
                failure_policy: FailurePolicy::Forgiving,
                win_rule: WinRule::MoverWins,
            },
            GameMode::Strategic => Self {
                mode,
                range: MoveRange::Fraction { min_percent: 10, max_percent: 30 },
                hidden: false,
                failure_policy: FailurePolicy::Forgiving,
                win_rule: WinRule::MoverLoses,
            },
            GameMode::PureMystery => Self {
                mode,
                range: MoveRange::UpToCurrent,
                hidden: true,
                failure_policy: FailurePolicy::Forgiving,
                win_rule: WinRule::MoverWins,
            },
            GameMode::HardcoreMystery => Self {
                mode,
                range: MoveRange::UpToCurrent,
                hidden: true,
                failure_policy: FailurePolicy::InstantLoss,
                win_rule: WinRule::MoverWins,
            },
        }
    }

    /// Resolve a policy from a mode name.
    pub fn for_mode_name(name: &str) -> Result<Self, ModeError> {
        Ok(Self::for_mode(name.parse()?))
    }

    /// Whether the current number is hidden from players.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Inclusive bounds of legal amounts at `current`, or `None` when no
    /// amount is legal (only at zero).
    pub fn legal_bounds(&self, current: u64) -> Option<(u64, u64)> {
        if current == 0 {
            return None;
        }

        match self.range {
            MoveRange::Exactly(amount) => (amount <= current).then_some((amount, amount)),
            MoveRange::Fraction { min_percent, max_percent } => {
                let min = percent_of(current, min_percent, true).max(1);
                let max = percent_of(current, max_percent, false).min(current - 1);
                if min <= max {
                    Some((min, max))
                } else {
                    // Endgame: the window has closed, players take one at a time.
                    Some((1, 1))
                }
            }
            MoveRange::UpToCurrent => Some((1, current)),
        }
    }

    /// Whether subtracting `amount` from `current` is allowed.
    pub fn is_legal_move(&self, current: u64, amount: u64) -> bool {
        self.legal_bounds(current)
            .map(|(min, max)| (min..=max).contains(&amount))
            .unwrap_or(false)
    }

    /// Number after a move. Never below zero.
    pub fn compute_next(&self, current: u64, amount: u64) -> u64 {
        current.saturating_sub(amount)
    }

    /// Winner side if `next` ends the battle.
    pub fn check_win(&self, next: u64) -> Option<WinnerSide> {
        if next != 0 {
            return None;
        }
        match self.win_rule {
            WinRule::MoverWins => Some(WinnerSide::Mover),
            WinRule::MoverLoses => Some(WinnerSide::Opponent),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

/// `percent`% of `current`, rounded up or down. Exact for every `u64`.
fn percent_of(current: u64, percent: u64, round_up: bool) -> u64 {
    let scaled = current as u128 * percent as u128;
    let share = if round_up { scaled.div_ceil(100) } else { scaled / 100 };
    u64::try_from(share).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mode_names() {
        assert_eq!("quick_draw".parse::<GameMode>(), Ok(GameMode::QuickDraw));
        assert_eq!("QuickDraw".parse::<GameMode>(), Ok(GameMode::QuickDraw));
        assert_eq!("hardcore-mystery".parse::<GameMode>(), Ok(GameMode::HardcoreMystery));
        assert_eq!("Pure Mystery".parse::<GameMode>(), Ok(GameMode::PureMystery));
        assert_eq!("STRATEGIC".parse::<GameMode>(), Ok(GameMode::Strategic));

        for mode in GameMode::ALL {
            assert_eq!(mode.as_str().parse::<GameMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_unknown_mode_is_configuration_error() {
        let err = ModePolicy::for_mode_name("blitz").unwrap_err();
        assert_eq!(err, ModeError::UnknownMode("blitz".to_string()));
    }

    #[test]
    fn test_quick_draw_rules() {
        let policy = GameMode::QuickDraw.policy();
        assert!(!policy.is_hidden());
        assert!(policy.is_legal_move(23, 1));
        assert!(!policy.is_legal_move(23, 2));
        assert!(!policy.is_legal_move(23, 0));
        assert_eq!(policy.compute_next(23, 1), 22);
        assert_eq!(policy.check_win(0), Some(WinnerSide::Mover));
        assert_eq!(policy.check_win(1), None);
    }

    #[test]
    fn test_strategic_window() {
        let policy = GameMode::Strategic.policy();

        // 10%..30% of 100
        assert_eq!(policy.legal_bounds(100), Some((10, 30)));
        assert!(policy.is_legal_move(100, 10));
        assert!(policy.is_legal_move(100, 30));
        assert!(!policy.is_legal_move(100, 9));
        assert!(!policy.is_legal_move(100, 31));

        // ceil(2.5) = 3, floor(7.5) = 7
        assert_eq!(policy.legal_bounds(25), Some((3, 7)));
    }

    #[test]
    fn test_strategic_window_at_huge_numbers() {
        let policy = GameMode::Strategic.policy();

        let n = u64::MAX / 5;
        let (min, max) = policy.legal_bounds(n).unwrap();
        assert_eq!(min as u128, (n as u128).div_ceil(10));
        assert_eq!(max as u128, n as u128 * 3 / 10);

        let (min, max) = policy.legal_bounds(u64::MAX).unwrap();
        assert_eq!(min, u64::MAX / 10 + 1);
        assert_eq!(max as u128, u64::MAX as u128 * 3 / 10);
    }

    #[test]
    fn test_strategic_endgame_window() {
        let policy = GameMode::Strategic.policy();

        assert_eq!(policy.legal_bounds(4), Some((1, 1)));
        assert_eq!(policy.legal_bounds(3), Some((1, 1)));
        assert_eq!(policy.legal_bounds(1), Some((1, 1)));
        assert!(!policy.is_legal_move(3, 2));
        assert!(policy.is_legal_move(1, 1));
        assert_eq!(policy.legal_bounds(0), None);
    }

    #[test]
    fn test_strategic_is_misere() {
        let policy = GameMode::Strategic.policy();
        assert_eq!(policy.check_win(0), Some(WinnerSide::Opponent));
    }

    #[test]
    fn test_mystery_rules() {
        for mode in [GameMode::PureMystery, GameMode::HardcoreMystery] {
            let policy = mode.policy();
            assert!(policy.is_hidden());
            assert!(policy.is_legal_move(40, 1));
            assert!(policy.is_legal_move(40, 40));
            assert!(!policy.is_legal_move(40, 41));
            assert!(!policy.is_legal_move(40, 0));
            assert_eq!(policy.check_win(0), Some(WinnerSide::Mover));
        }

        assert_eq!(GameMode::PureMystery.policy().failure_policy, FailurePolicy::Forgiving);
        assert_eq!(GameMode::HardcoreMystery.policy().failure_policy, FailurePolicy::InstantLoss);
    }

    proptest! {
        #[test]
        fn prop_quick_draw_only_accepts_one(current in 1u64..10_000, amount in 0u64..10_000) {
            let policy = GameMode::QuickDraw.policy();
            prop_assert_eq!(policy.is_legal_move(current, amount), amount == 1);
        }

        #[test]
        fn prop_strategic_amounts_within_percent_window(current in 4u64..1_000_000, amount in 0u64..1_000_000) {
            let policy = GameMode::Strategic.policy();
            if policy.is_legal_move(current, amount) {
                prop_assert!(amount * 10 >= current);
                prop_assert!(amount * 10 <= current * 3);
                prop_assert!(amount < current);
            }
        }

        #[test]
        fn prop_strategic_window_exact_over_full_range(current in 4u64..=u64::MAX) {
            let policy = GameMode::Strategic.policy();
            let (min, max) = policy.legal_bounds(current).unwrap();
            let wide = current as u128;

            prop_assert!(min >= 1);
            prop_assert!(max < current);
            prop_assert!(min as u128 * 10 >= wide);
            prop_assert!((min as u128 - 1) * 10 < wide);
            prop_assert!(min <= max);
            prop_assert_eq!(max as u128, wide * 30 / 100);
        }

        #[test]
        fn prop_legal_moves_never_go_negative(current in 1u64..100_000, amount in 0u64..100_000) {
            for mode in GameMode::ALL {
                let policy = mode.policy();
                if policy.is_legal_move(current, amount) {
                    prop_assert_eq!(policy.compute_next(current, amount), current - amount);
                }
            }
        }
    }
}
