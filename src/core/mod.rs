//! Core Deterministic Primitives
//!
//! Building blocks shared by the game engine and the arena service.
//!
//! - `hash`: SHA-256 state hashing with domain separation
//! - `rng`: Xorshift128+ PRNG with entropy seeds

pub mod hash;
pub mod rng;

pub use hash::{StateHash, StateHasher, compute_state_hash};
pub use rng::{DeterministicRng, random_seed};
