//! Action priority levels.

use serde::{Deserialize, Serialize};

/// Queue priority, strict to loose.
///
/// Lower discriminants dequeue first. Within a level, actions dequeue in
/// the order they were enqueued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionPriority {
    /// Ahead of everything already queued.
    Immediate = 0,
    /// Triggered abilities and choice continuations.
    High = 1,
    #[default]
    Normal = 2,
    Low = 3,
    /// Behind everything, including later non-cleanup work.
    Cleanup = 4,
}

impl ActionPriority {
    pub const ALL: [ActionPriority; 5] = [
        ActionPriority::Immediate,
        ActionPriority::High,
        ActionPriority::Normal,
        ActionPriority::Low,
        ActionPriority::Cleanup,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ActionPriority::Immediate => "immediate",
            ActionPriority::High => "high",
            ActionPriority::Normal => "normal",
            ActionPriority::Low => "low",
            ActionPriority::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for ActionPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
