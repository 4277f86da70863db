//! Engine configuration and turn-structure types.
//!
//! - `Phase`: the four steps of a turn (ready, set, draw, main)
//! - `PhaseDurationPolicy`: how `phases`-kind durations expire
//! - `EngineConfig`: tunables shared by the queue, selectors, and timing

use serde::{Deserialize, Serialize};

/// A phase of a turn.
///
/// Phases run in declaration order. `Main` is where players act.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Ready all exerted cards.
    #[default]
    Ready,
    /// Start-of-turn effects resolve.
    Set,
    /// Draw a card.
    Draw,
    /// Main phase: play cards, quest, challenge.
    Main,
}

impl Phase {
    /// All phases in turn order.
    pub const ALL: [Phase; 4] = [Phase::Ready, Phase::Set, Phase::Draw, Phase::Main];

    /// The phase after this one, or `None` after `Main`.
    #[must_use]
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Ready => Some(Phase::Set),
            Phase::Set => Some(Phase::Draw),
            Phase::Draw => Some(Phase::Main),
            Phase::Main => None,
        }
    }

    /// Lowercase display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Ready => "ready",
            Phase::Set => "set",
            Phase::Draw => "draw",
            Phase::Main => "main",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a duration registered with the `phases` kind expires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseDurationPolicy {
    /// Expire exactly like `until_end_of_turn`.
    #[default]
    SameAsEndOfTurn,
    /// Expire once the requested number of phase starts has been observed
    /// since registration, across turn boundaries.
    CountPhases,
}

/// Engine-wide tunables.
///
/// ## Example
///
/// ```
/// use ccg_rules::core::{EngineConfig, PhaseDurationPolicy};
///
/// let config = EngineConfig::default()
///     .with_history_limit(16)
///     .with_phase_duration(PhaseDurationPolicy::CountPhases);
///
/// assert_eq!(config.history_limit, 16);
/// assert_eq!(config.select_all, EngineConfig::SELECT_ALL);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of results kept in the action queue's history.
    pub history_limit: usize,

    /// Selector count meaning "every candidate".
    pub select_all: usize,

    /// Expiry policy for `phases` durations.
    pub phase_duration: PhaseDurationPolicy,

    /// Drawing from an empty deck is an error rather than a no-op.
    pub strict_draw: bool,
}

impl EngineConfig {
    /// Default "select all" sentinel.
    pub const SELECT_ALL: usize = 999;

    /// Default bound on execution history.
    pub const HISTORY_LIMIT: usize = 100;

    /// Set the history bound.
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set the "select all" sentinel.
    #[must_use]
    pub fn with_select_all(mut self, sentinel: usize) -> Self {
        self.select_all = sentinel;
        self
    }

    /// Set the `phases` duration policy.
    #[must_use]
    pub fn with_phase_duration(mut self, policy: PhaseDurationPolicy) -> Self {
        self.phase_duration = policy;
        self
    }

    /// Make empty-deck draws an error.
    #[must_use]
    pub fn strict_draw(mut self) -> Self {
        self.strict_draw = true;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: Self::HISTORY_LIMIT,
            select_all: Self::SELECT_ALL,
            phase_duration: PhaseDurationPolicy::default(),
            strict_draw: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        assert_eq!(Phase::Ready.next(), Some(Phase::Set));
        assert_eq!(Phase::Draw.next(), Some(Phase::Main));
        assert_eq!(Phase::Main.next(), None);
        assert!(Phase::Ready < Phase::Main);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Main.to_string(), "main");
    }

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.select_all, 999);
        assert_eq!(config.phase_duration, PhaseDurationPolicy::SameAsEndOfTurn);
        assert!(!config.strict_draw);
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"history_limit": 5}"#).unwrap();
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.select_all, EngineConfig::SELECT_ALL);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = EngineConfig::default()
            .with_select_all(50)
            .with_phase_duration(PhaseDurationPolicy::CountPhases)
            .strict_draw();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
