//! # Subtraction Arena
//!
//! Turn-based two-player subtraction battles: players alternately subtract
//! from a shared number under one of four rule modes, each turn bounded by
//! a countdown clock.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SUBTRACTION ARENA                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for settlement              │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── mode.rs     - Modes and rule policies                   │
//! │  ├── state.rs    - Match state, ids, move history            │
//! │  ├── clock.rs    - Per-turn countdown                        │
//! │  ├── engine.rs   - Move validator & applier, replay          │
//! │  ├── input.rs    - Commands from the outside                 │
//! │  └── events.rs   - Events and the match outcome              │
//! │                                                              │
//! │  network/        - Arena service (non-deterministic)         │
//! │  ├── server.rs   - WebSocket server                          │
//! │  ├── protocol.rs - Message types                             │
//! │  └── session.rs  - Battle registry and clock tasks           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules never read the system clock or do I/O.
//! Time advances only through [`MatchState::tick`], so a battle's move
//! history replays to the same state hash on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::mode::{GameMode, ModePolicy};
pub use game::state::{MatchId, MatchState, MatchStatus, PlayerId};
pub use game::engine::{GameError, MatchConfig, TurnResult};
pub use game::events::MatchOutcome;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
