//! Card instances: runtime card state.
//!
//! `CardInstance` represents a specific card in a game. It tracks mutable
//! state such as damage, exertion, and temporary stat bonuses. The current
//! zone is tracked by the zone manager, not the instance.
//!
//! ## State Values (i64 only)
//!
//! Granted properties and counters live in `state: FxHashMap<String, i64>`.
//! Booleans use 0/1.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::definition::CardDefinition;
use crate::core::entity::EntityId;
use crate::core::player::PlayerId;

/// A modifiable character stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Strength,
    Willpower,
    Lore,
    /// Damage counters. Negative modifications heal.
    Damage,
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stat::Strength => "strength",
            Stat::Willpower => "willpower",
            Stat::Lore => "lore",
            Stat::Damage => "damage",
        };
        f.write_str(name)
    }
}

/// A stat bonus applied by an effect. Removed by id when it expires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBonus {
    pub id: u32,
    pub stat: Stat,
    pub amount: i64,
}

/// A card instance in a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInstance {
    /// Unique entity ID for this instance.
    pub entity_id: EntityId,

    /// Printed card data.
    pub definition: CardDefinition,

    /// Owner (who started with this card).
    pub owner: PlayerId,

    /// Controller (who currently controls it).
    pub controller: PlayerId,

    pub exerted: bool,

    /// Damage counters on the card.
    pub damage: i64,

    /// Active stat bonuses.
    #[serde(default)]
    pub bonuses: SmallVec<[StatBonus; 4]>,

    /// Granted properties and counters.
    #[serde(default)]
    pub state: FxHashMap<String, i64>,
}

impl CardInstance {
    /// Create a card instance controlled by its owner.
    #[must_use]
    pub fn new(entity_id: EntityId, definition: CardDefinition, owner: PlayerId) -> Self {
        Self {
            entity_id,
            definition,
            owner,
            controller: owner,
            exerted: false,
            damage: 0,
            bonuses: SmallVec::new(),
            state: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Base value plus every active bonus for a stat.
    ///
    /// For `Stat::Damage` this is the damage counter.
    #[must_use]
    pub fn stat(&self, stat: Stat) -> i64 {
        let base = match stat {
            Stat::Strength => self.definition.strength,
            Stat::Willpower => self.definition.willpower,
            Stat::Lore => self.definition.lore,
            Stat::Damage => return self.damage,
        };
        let bonus: i64 = self
            .bonuses
            .iter()
            .filter(|b| b.stat == stat)
            .map(|b| b.amount)
            .sum();
        (base + bonus).max(0)
    }

    #[must_use]
    pub fn strength(&self) -> i64 {
        self.stat(Stat::Strength)
    }

    #[must_use]
    pub fn willpower(&self) -> i64 {
        self.stat(Stat::Willpower)
    }

    #[must_use]
    pub fn lore(&self) -> i64 {
        self.stat(Stat::Lore)
    }

    #[must_use]
    pub fn is_damaged(&self) -> bool {
        self.damage > 0
    }

    /// Has this card taken damage equal to or above its willpower?
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.willpower() > 0 && self.damage >= self.willpower()
    }

    /// Add damage counters. Returns the amount actually added.
    pub fn deal_damage(&mut self, amount: i64) -> i64 {
        let applied = amount.max(0);
        self.damage += applied;
        applied
    }

    /// Remove up to `amount` damage. Returns the amount actually removed.
    pub fn heal(&mut self, amount: i64) -> i64 {
        let removed = amount.max(0).min(self.damage);
        self.damage -= removed;
        removed
    }

    /// Add a stat bonus.
    pub fn add_bonus(&mut self, bonus: StatBonus) {
        self.bonuses.push(bonus);
    }

    /// Remove a bonus by id. Returns `true` if it was present.
    pub fn remove_bonus(&mut self, id: u32) -> bool {
        let before = self.bonuses.len();
        self.bonuses.retain(|b| b.id != id);
        self.bonuses.len() != before
    }

    /// Get a state value with a default.
    #[must_use]
    pub fn get_state(&self, key: &str, default: i64) -> i64 {
        self.state.get(key).copied().unwrap_or(default)
    }

    /// Set a state value.
    pub fn set_state(&mut self, key: impl Into<String>, value: i64) {
        self.state.insert(key.into(), value);
    }

    /// Check if a state flag is set (non-zero).
    #[must_use]
    pub fn has_flag(&self, key: &str) -> bool {
        self.get_state(key, 0) != 0
    }

    /// Reset everything that does not survive leaving play.
    pub fn reset_for_zone_change(&mut self) {
        self.exerted = false;
        self.damage = 0;
        self.bonuses.clear();
        self.state.clear();
        self.controller = self.owner;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character() -> CardInstance {
        CardInstance::new(
            EntityId(10),
            CardDefinition::character("Simba", 2, 2, 3, 1),
            PlayerId::new(0),
        )
    }

    #[test]
    fn test_new_instance_is_controlled_by_owner() {
        let card = character();
        assert_eq!(card.controller, PlayerId::new(0));
        assert!(!card.exerted);
        assert_eq!(card.name(), "Simba");
    }

    #[test]
    fn test_bonuses_stack_and_remove() {
        let mut card = character();
        card.add_bonus(StatBonus { id: 1, stat: Stat::Strength, amount: 2 });
        card.add_bonus(StatBonus { id: 2, stat: Stat::Strength, amount: 1 });
        assert_eq!(card.strength(), 5);

        assert!(card.remove_bonus(1));
        assert!(!card.remove_bonus(1));
        assert_eq!(card.strength(), 3);
    }

    #[test]
    fn test_stat_never_negative() {
        let mut card = character();
        card.add_bonus(StatBonus { id: 1, stat: Stat::Lore, amount: -5 });
        assert_eq!(card.lore(), 0);
    }

    #[test]
    fn test_heal_is_capped() {
        let mut card = character();
        assert_eq!(card.deal_damage(2), 2);
        assert_eq!(card.heal(5), 2);
        assert_eq!(card.damage, 0);
        assert!(!card.is_damaged());
    }

    #[test]
    fn test_defeated_at_willpower() {
        let mut card = character();
        card.deal_damage(3);
        assert!(card.is_defeated());
    }

    #[test]
    fn test_reset_for_zone_change() {
        let mut card = character();
        card.exerted = true;
        card.deal_damage(1);
        card.set_state("evasive", 1);
        card.controller = PlayerId::new(1);

        card.reset_for_zone_change();

        assert!(!card.exerted);
        assert_eq!(card.damage, 0);
        assert!(!card.has_flag("evasive"));
        assert_eq!(card.controller, PlayerId::new(0));
    }
}
