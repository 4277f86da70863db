//! What an effect acts on.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};

/// The target of an effect, and the result an effect hands to the next
/// step of a composite.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// Nothing targeted. Player-scoped effects fall back to the acting player.
    #[default]
    None,
    Card(EntityId),
    Player(PlayerId),
    Cards(Vec<EntityId>),
}

impl Target {
    /// Collapse a candidate list into the tightest variant.
    ///
    /// ```
    /// use ccg_rules::core::EntityId;
    /// use ccg_rules::effects::Target;
    ///
    /// assert_eq!(Target::from_cards(vec![]), Target::None);
    /// assert_eq!(Target::from_cards(vec![EntityId(3)]), Target::Card(EntityId(3)));
    /// ```
    #[must_use]
    pub fn from_cards(mut cards: Vec<EntityId>) -> Self {
        match cards.len() {
            0 => Target::None,
            1 => Target::Card(cards.remove(0)),
            _ => Target::Cards(cards),
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Target::None)
    }

    /// Every card named by this target.
    #[must_use]
    pub fn cards(&self) -> Vec<EntityId> {
        match self {
            Target::Card(id) => vec![*id],
            Target::Cards(ids) => ids.clone(),
            Target::None | Target::Player(_) => Vec::new(),
        }
    }

    /// The single card, if this targets exactly one.
    #[must_use]
    pub fn card(&self) -> Option<EntityId> {
        match self {
            Target::Card(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<EntityId> for Target {
    fn from(id: EntityId) -> Self {
        Target::Card(id)
    }
}

impl From<PlayerId> for Target {
    fn from(player: PlayerId) -> Self {
        Target::Player(player)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::None => f.write_str("nothing"),
            Target::Card(id) => write!(f, "{id}"),
            Target::Player(p) => write!(f, "{p}"),
            Target::Cards(ids) => {
                let names: Vec<String> = ids.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", names.join(", "))
            }
        }
    }
}
