//! Zone manager for card locations and movement.
//!
//! The `ZoneManager` tracks which player's zone each card occupies and
//! keeps every zone in a stable order. Zones are ordered bottom to top:
//! index 0 is the bottom of a deck, the last entry is its top card.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::Zone;
use crate::core::entity::EntityId;
use crate::core::player::PlayerId;
use crate::core::rng::GameRng;

/// Position for inserting a card into a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    /// Add to top of zone (e.g., top of deck).
    Top,
    /// Add to bottom of zone.
    Bottom,
    /// Insert at specific index (0 = bottom).
    Index(usize),
}

/// Where a card currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneLocation {
    /// Player whose zone holds the card.
    pub player: PlayerId,
    /// The zone itself.
    pub zone: Zone,
}

/// Manages card locations across every player's zones.
///
/// ## Usage
///
/// ```
/// use ccg_rules::core::{EntityId, PlayerId};
/// use ccg_rules::zones::{Zone, ZoneManager, ZonePosition};
///
/// let mut manager = ZoneManager::new();
/// let p0 = PlayerId::new(0);
///
/// manager.add_to_zone(EntityId(10), p0, Zone::Deck, ZonePosition::Top);
/// manager.add_to_zone(EntityId(11), p0, Zone::Deck, ZonePosition::Bottom);
///
/// assert_eq!(manager.top_card(p0, Zone::Deck), Some(EntityId(10)));
/// assert_eq!(manager.cards_in(p0, Zone::Deck), vec![EntityId(11), EntityId(10)]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ZoneManager {
    /// Card locations: entity_id -> (player, zone)
    locations: FxHashMap<EntityId, ZoneLocation>,

    /// Ordered card lists, bottom to top.
    zone_order: FxHashMap<ZoneLocation, Vector<EntityId>>,
}

impl ZoneManager {
    /// Create a new empty zone manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card to a zone.
    ///
    /// Returns `false` (and changes nothing) if the card is already tracked.
    pub fn add_to_zone(
        &mut self,
        entity: EntityId,
        player: PlayerId,
        zone: Zone,
        position: ZonePosition,
    ) -> bool {
        if self.locations.contains_key(&entity) {
            return false;
        }
        let location = ZoneLocation { player, zone };
        self.locations.insert(entity, location);
        Self::insert_at(self.zone_order.entry(location).or_default(), entity, position);
        true
    }

    /// Move a card to another zone.
    ///
    /// Returns the old location, or `None` if the card wasn't found.
    pub fn move_to_zone(
        &mut self,
        entity: EntityId,
        player: PlayerId,
        zone: Zone,
        position: ZonePosition,
    ) -> Option<ZoneLocation> {
        let old = self.locations.get(&entity).copied()?;
        let new = ZoneLocation { player, zone };

        if old == new {
            return Some(old);
        }

        if let Some(order) = self.zone_order.get_mut(&old) {
            order.retain(|&e| e != entity);
        }
        self.locations.insert(entity, new);
        Self::insert_at(self.zone_order.entry(new).or_default(), entity, position);

        Some(old)
    }

    fn insert_at(order: &mut Vector<EntityId>, entity: EntityId, position: ZonePosition) {
        match position {
            ZonePosition::Top => order.push_back(entity),
            ZonePosition::Bottom => order.push_front(entity),
            ZonePosition::Index(i) => {
                let idx = i.min(order.len());
                order.insert(idx, entity);
            }
        }
    }

    /// Remove a card from the manager entirely.
    ///
    /// Returns the location it was in, or `None` if not found.
    pub fn remove(&mut self, entity: EntityId) -> Option<ZoneLocation> {
        let location = self.locations.remove(&entity)?;
        if let Some(order) = self.zone_order.get_mut(&location) {
            order.retain(|&e| e != entity);
        }
        Some(location)
    }

    /// Get the location of a card.
    #[must_use]
    pub fn location(&self, entity: EntityId) -> Option<ZoneLocation> {
        self.locations.get(&entity).copied()
    }

    /// Get the zone a card is in, regardless of which player holds it.
    #[must_use]
    pub fn zone_of(&self, entity: EntityId) -> Option<Zone> {
        self.locations.get(&entity).map(|l| l.zone)
    }

    /// Check if a card is in a specific zone of any player.
    #[must_use]
    pub fn is_in_zone(&self, entity: EntityId, zone: Zone) -> bool {
        self.zone_of(entity) == Some(zone)
    }

    /// Cards in one player's zone, bottom to top.
    #[must_use]
    pub fn cards_in(&self, player: PlayerId, zone: Zone) -> Vec<EntityId> {
        self.zone_order
            .get(&ZoneLocation { player, zone })
            .map(|order| order.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of cards in one player's zone.
    #[must_use]
    pub fn zone_size(&self, player: PlayerId, zone: Zone) -> usize {
        self.zone_order
            .get(&ZoneLocation { player, zone })
            .map_or(0, Vector::len)
    }

    /// Get the top card of a zone.
    #[must_use]
    pub fn top_card(&self, player: PlayerId, zone: Zone) -> Option<EntityId> {
        self.zone_order
            .get(&ZoneLocation { player, zone })?
            .last()
            .copied()
    }

    /// Remove and return the top card of a zone.
    pub fn pop_top(&mut self, player: PlayerId, zone: Zone) -> Option<EntityId> {
        let entity = self
            .zone_order
            .get_mut(&ZoneLocation { player, zone })?
            .pop_back()?;
        self.locations.remove(&entity);
        Some(entity)
    }

    /// Shuffle one player's zone.
    pub fn shuffle_zone(&mut self, player: PlayerId, zone: Zone, rng: &mut GameRng) {
        if let Some(order) = self.zone_order.get_mut(&ZoneLocation { player, zone }) {
            let mut cards: Vec<EntityId> = order.iter().copied().collect();
            rng.shuffle(&mut cards);
            *order = cards.into_iter().collect();
        }
    }

    /// Get total number of cards tracked.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.locations.len()
    }

    /// Check if the manager contains an entity.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.locations.contains_key(&entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P0: PlayerId = PlayerId(0);
    const P1: PlayerId = PlayerId(1);

    #[test]
    fn test_add_and_locate() {
        let mut manager = ZoneManager::new();

        assert!(manager.add_to_zone(EntityId(10), P0, Zone::Hand, ZonePosition::Top));
        assert!(manager.add_to_zone(EntityId(11), P1, Zone::Play, ZonePosition::Top));

        assert_eq!(
            manager.location(EntityId(10)),
            Some(ZoneLocation { player: P0, zone: Zone::Hand })
        );
        assert_eq!(manager.zone_of(EntityId(11)), Some(Zone::Play));
        assert_eq!(manager.zone_of(EntityId(99)), None);
        assert!(manager.is_in_zone(EntityId(10), Zone::Hand));
    }

    #[test]
    fn test_duplicate_add_is_rejected() {
        let mut manager = ZoneManager::new();

        assert!(manager.add_to_zone(EntityId(10), P0, Zone::Hand, ZonePosition::Top));
        assert!(!manager.add_to_zone(EntityId(10), P0, Zone::Play, ZonePosition::Top));
        assert_eq!(manager.zone_of(EntityId(10)), Some(Zone::Hand));
    }

    #[test]
    fn test_deck_order() {
        let mut manager = ZoneManager::new();

        manager.add_to_zone(EntityId(10), P0, Zone::Deck, ZonePosition::Top);
        manager.add_to_zone(EntityId(11), P0, Zone::Deck, ZonePosition::Bottom);
        manager.add_to_zone(EntityId(12), P0, Zone::Deck, ZonePosition::Top);
        manager.add_to_zone(EntityId(13), P0, Zone::Deck, ZonePosition::Index(1));

        assert_eq!(
            manager.cards_in(P0, Zone::Deck),
            vec![EntityId(11), EntityId(13), EntityId(10), EntityId(12)]
        );
        assert_eq!(manager.top_card(P0, Zone::Deck), Some(EntityId(12)));
    }

    #[test]
    fn test_move_between_players_zones() {
        let mut manager = ZoneManager::new();
        manager.add_to_zone(EntityId(10), P0, Zone::Play, ZonePosition::Top);

        let old = manager.move_to_zone(EntityId(10), P1, Zone::Discard, ZonePosition::Top);

        assert_eq!(old, Some(ZoneLocation { player: P0, zone: Zone::Play }));
        assert_eq!(manager.zone_size(P0, Zone::Play), 0);
        assert_eq!(manager.cards_in(P1, Zone::Discard), vec![EntityId(10)]);
    }

    #[test]
    fn test_move_unknown_card() {
        let mut manager = ZoneManager::new();
        assert_eq!(manager.move_to_zone(EntityId(1), P0, Zone::Hand, ZonePosition::Top), None);
    }

    #[test]
    fn test_pop_top() {
        let mut manager = ZoneManager::new();
        manager.add_to_zone(EntityId(10), P0, Zone::Deck, ZonePosition::Top);
        manager.add_to_zone(EntityId(11), P0, Zone::Deck, ZonePosition::Top);

        assert_eq!(manager.pop_top(P0, Zone::Deck), Some(EntityId(11)));
        assert!(!manager.contains(EntityId(11)));
        assert_eq!(manager.pop_top(P0, Zone::Deck), Some(EntityId(10)));
        assert_eq!(manager.pop_top(P0, Zone::Deck), None);
    }

    #[test]
    fn test_remove() {
        let mut manager = ZoneManager::new();
        manager.add_to_zone(EntityId(10), P0, Zone::Inkwell, ZonePosition::Top);

        assert_eq!(manager.remove(EntityId(10)).map(|l| l.zone), Some(Zone::Inkwell));
        assert!(!manager.contains(EntityId(10)));
        assert_eq!(manager.total_cards(), 0);
    }

    #[test]
    fn test_shuffle() {
        let mut manager = ZoneManager::new();
        for i in 0..20 {
            manager.add_to_zone(EntityId(i), P0, Zone::Deck, ZonePosition::Top);
        }
        let before = manager.cards_in(P0, Zone::Deck);

        let mut rng = GameRng::new(42);
        manager.shuffle_zone(P0, Zone::Deck, &mut rng);

        let mut after = manager.cards_in(P0, Zone::Deck);
        assert_ne!(before, after);
        after.sort();
        assert_eq!(before, after);
    }
}
