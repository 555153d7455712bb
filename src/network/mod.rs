//! Network Layer
//!
//! The arena service: battle registry, turn clock tasks, and the WebSocket
//! server. This layer is **non-deterministic**; all rules run through `game/`.

pub mod protocol;
pub mod session;
pub mod server;

pub use protocol::{
    ClientMessage, ServerMessage, CreateBattleRequest, BattleSummary, ErrorCode, ServerError,
};
pub use session::{MatchSession, SessionConfig, SessionError, SessionManager};
pub use server::{GameServer, ServerConfig, GameServerError};
