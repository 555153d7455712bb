//! Engine Inputs
//!
//! Commands arriving from outside the engine: player moves from the UI,
//! timeout signals from the clock task or an external settlement feed,
//! and resignations.

use serde::{Serialize, Deserialize};

use crate::game::state::{MatchId, PlayerId};

/// A player's move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSubmission {
    /// Target battle.
    pub match_id: MatchId,
    /// Acting player.
    pub player: PlayerId,
    /// Amount to subtract.
    pub amount: u64,
}

/// The current turn ran out of time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutSignal {
    /// Target battle.
    pub match_id: MatchId,
}

/// Any command the engine accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MatchCommand {
    /// Subtract from the number.
    SubmitMove(MoveSubmission),
    /// Charge a timeout to the current player.
    Timeout(TimeoutSignal),
    /// Resign.
    Forfeit {
        /// Target battle.
        match_id: MatchId,
        /// Resigning player.
        player: PlayerId,
    },
}

impl MatchCommand {
    /// Battle this command is addressed to.
    pub fn match_id(&self) -> MatchId {
        match self {
            MatchCommand::SubmitMove(submission) => submission.match_id,
            MatchCommand::Timeout(signal) => signal.match_id,
            MatchCommand::Forfeit { match_id, .. } => *match_id,
        }
    }
}

impl From<MoveSubmission> for MatchCommand {
    fn from(submission: MoveSubmission) -> Self {
        MatchCommand::SubmitMove(submission)
    }
}

impl From<TimeoutSignal> for MatchCommand {
    fn from(signal: TimeoutSignal) -> Self {
        MatchCommand::Timeout(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_match_id() {
        let id = MatchId::new([4; 16]);
        let player = PlayerId::new([1; 16]);

        let commands: [MatchCommand; 3] = [
            MoveSubmission { match_id: id, player, amount: 1 }.into(),
            TimeoutSignal { match_id: id }.into(),
            MatchCommand::Forfeit { match_id: id, player },
        ];

        for command in commands {
            assert_eq!(command.match_id(), id);
        }
    }

    #[test]
    fn test_command_json() {
        let json = r#"{
            "command": "submit_move",
            "match_id": "04040404-0404-0404-0404-040404040404",
            "player": "01010101-0101-0101-0101-010101010101",
            "amount": 3
        }"#;

        let command: MatchCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            command,
            MatchCommand::SubmitMove(MoveSubmission {
                match_id: MatchId::new([4; 16]),
                player: PlayerId::new([1; 16]),
                amount: 3,
            })
        );
    }
}
