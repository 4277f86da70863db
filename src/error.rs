//! Crate-wide error type.
//!
//! Only effect application surfaces errors to callers. Predicate and
//! condition faults are folded into `false` at their call sites, and
//! structural misuse (unknown choice ids, missing actions) is reported
//! through `bool`/`Option` returns.

use thiserror::Error;

use crate::core::{EntityId, PlayerId};
use crate::zones::Zone;

/// Errors raised while resolving rules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("{entity} is not in {expected:?}")]
    NotInZone { entity: EntityId, expected: Zone },

    #[error("effect '{effect}' cannot target {target}")]
    InvalidTarget { effect: String, target: String },

    #[error("{player} needs {needed} ink but has {available}")]
    InsufficientInk { player: PlayerId, needed: i64, available: i64 },

    #[error("{0} has no cards left to draw")]
    EmptyDeck(PlayerId),

    #[error("predicate failed: {0}")]
    Predicate(String),

    #[error("no ability named '{0}' is registered")]
    UnknownAbility(String),
}

impl RulesError {
    /// Shorthand for a predicate fault with a message.
    pub fn predicate(message: impl Into<String>) -> Self {
        Self::Predicate(message.into())
    }
}

pub type Result<T> = std::result::Result<T, RulesError>;
