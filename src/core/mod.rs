//! Core types: entities, players, state, RNG, configuration.
//!
//! Everything here is plain data. The resolution machinery in the other
//! modules reads and mutates `GameState` through explicit `&mut` borrows.

pub mod entity;
pub mod player;
pub mod rng;
pub mod config;
pub mod state;

pub use entity::{EntityAllocator, EntityId};
pub use player::{PlayerId, PlayerMap};
pub use rng::{GameRng, GameRngState};
pub use config::{EngineConfig, Phase, PhaseDurationPolicy};
pub use state::{GameSetup, GameState, PlayerState};
