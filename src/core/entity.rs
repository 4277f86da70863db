//! Entity identification.
//!
//! Every card in a game has a unique `EntityId`. Entities never hold
//! references to each other or to their controller; relationships are
//! looked up through [`GameState`](super::GameState) by id.
//!
//! ## Usage
//!
//! ```
//! use ccg_rules::core::{EntityAllocator, EntityId};
//!
//! let mut ids = EntityAllocator::default();
//! let first = ids.allocate();
//! let second = ids.allocate();
//!
//! assert_eq!(first, EntityId(1));
//! assert_eq!(second, EntityId(2));
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a card or other game entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create an entity ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Monotonic allocator for entity ids.
///
/// Ids start at 1 so that a zeroed id never aliases a live entity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAllocator {
    last: u32,
}

impl EntityAllocator {
    /// Hand out the next unused id.
    pub fn allocate(&mut self) -> EntityId {
        self.last += 1;
        EntityId(self.last)
    }

    /// Number of ids handed out so far.
    #[must_use]
    pub fn allocated(&self) -> u32 {
        self.last
    }
}
