//! Game state arena.
//!
//! `GameState` owns every card instance and per-player record. Nothing in
//! the state holds a reference to anything else: cards name their owner and
//! controller by `PlayerId`, zones list cards by `EntityId`, and all lookups
//! go through the arena.
//!
//! ## Example
//!
//! ```
//! use ccg_rules::cards::CardDefinition;
//! use ccg_rules::core::{GameSetup, PlayerId};
//! use ccg_rules::zones::Zone;
//!
//! let mut state = GameSetup::new(2).with_seed(7).build();
//! let p0 = PlayerId::new(0);
//!
//! let hero = state.add_card(CardDefinition::character("Hero", 3, 2, 3, 1), p0, Zone::Play);
//! state.damage(hero, 2).unwrap();
//!
//! assert_eq!(state.card(hero).unwrap().damage, 2);
//! assert_eq!(state.characters_in_play(p0), vec![hero]);
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::config::Phase;
use super::entity::{EntityAllocator, EntityId};
use super::player::{PlayerId, PlayerMap};
use super::rng::GameRng;
use crate::cards::{CardDefinition, CardInstance, CardKind};
use crate::error::{Result, RulesError};
use crate::zones::{Zone, ZoneLocation, ZoneManager, ZonePosition};

/// Per-player public record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub name: String,
    pub lore: i64,
    /// Ink available to spend this turn.
    pub ink_available: i64,
}

/// Builder for a fresh game state.
#[derive(Clone, Debug)]
pub struct GameSetup {
    player_count: usize,
    seed: u64,
    names: Vec<(PlayerId, String)>,
}

impl GameSetup {
    /// Start a setup for `player_count` players (seed 0).
    #[must_use]
    pub fn new(player_count: usize) -> Self {
        Self {
            player_count,
            seed: 0,
            names: Vec::new(),
        }
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Name a player.
    #[must_use]
    pub fn with_player_name(mut self, player: PlayerId, name: impl Into<String>) -> Self {
        self.names.push((player, name.into()));
        self
    }

    /// Build the state. Unnamed players are called "Player N".
    #[must_use]
    pub fn build(self) -> GameState {
        let mut state = GameState::new(self.player_count, self.seed);
        for (player, name) in self.names {
            if player.index() < self.player_count {
                state.players[player].name = name;
            }
        }
        state
    }
}

/// Full mutable game state.
#[derive(Clone, Debug)]
pub struct GameState {
    player_count: usize,

    // === Turn Structure ===
    /// Turn number (starts at 1).
    pub turn_number: u32,

    pub current_phase: Phase,

    /// Whose turn it is.
    pub active_player: PlayerId,

    // === Players & Cards ===
    pub players: PlayerMap<PlayerState>,

    /// Card instances by entity ID.
    cards: FxHashMap<EntityId, CardInstance>,

    /// Zone manager for card locations.
    pub zones: ZoneManager,

    /// Deterministic RNG.
    pub rng: GameRng,

    ids: EntityAllocator,
    next_bonus_id: u32,
}

impl GameState {
    /// Create a new game state.
    #[must_use]
    pub fn new(player_count: usize, seed: u64) -> Self {
        Self {
            player_count,
            turn_number: 1,
            current_phase: Phase::default(),
            active_player: PlayerId::new(0),
            players: PlayerMap::new(player_count, |p| PlayerState {
                name: p.to_string(),
                ..PlayerState::default()
            }),
            cards: FxHashMap::default(),
            zones: ZoneManager::new(),
            rng: GameRng::new(seed),
            ids: EntityAllocator::default(),
            next_bonus_id: 0,
        }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Iterate over all player IDs.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        PlayerId::all(self.player_count)
    }

    /// Every player other than `player`, in turn order.
    pub fn opponents(&self, player: PlayerId) -> impl Iterator<Item = PlayerId> {
        player.opponents(self.player_count)
    }

    /// Check that a player exists.
    pub fn check_player(&self, player: PlayerId) -> Result<()> {
        if player.index() < self.player_count {
            Ok(())
        } else {
            Err(RulesError::UnknownPlayer(player))
        }
    }

    /// Get a player's record.
    pub fn player(&self, player: PlayerId) -> Result<&PlayerState> {
        self.check_player(player)?;
        Ok(&self.players[player])
    }

    // === Cards ===

    /// Create a card instance in `owner`'s zone and return its id.
    pub fn add_card(&mut self, definition: CardDefinition, owner: PlayerId, zone: Zone) -> EntityId {
        let id = self.ids.allocate();
        self.cards.insert(id, CardInstance::new(id, definition, owner));
        self.zones.add_to_zone(id, owner, zone, ZonePosition::Top);
        id
    }

    /// Look up a card.
    #[must_use]
    pub fn get_card(&self, id: EntityId) -> Option<&CardInstance> {
        self.cards.get(&id)
    }

    /// Look up a card, failing with `UnknownEntity`.
    pub fn card(&self, id: EntityId) -> Result<&CardInstance> {
        self.cards.get(&id).ok_or(RulesError::UnknownEntity(id))
    }

    /// Look up a card mutably, failing with `UnknownEntity`.
    pub fn card_mut(&mut self, id: EntityId) -> Result<&mut CardInstance> {
        self.cards.get_mut(&id).ok_or(RulesError::UnknownEntity(id))
    }

    /// Iterate over every card instance.
    pub fn cards(&self) -> impl Iterator<Item = &CardInstance> {
        self.cards.values()
    }

    /// Controller of a card.
    pub fn controller_of(&self, id: EntityId) -> Result<PlayerId> {
        self.card(id).map(|c| c.controller)
    }

    /// Zone a card currently occupies.
    #[must_use]
    pub fn zone_of(&self, id: EntityId) -> Option<Zone> {
        self.zones.zone_of(id)
    }

    /// Fresh id for a stat bonus.
    pub fn next_bonus_id(&mut self) -> u32 {
        self.next_bonus_id += 1;
        self.next_bonus_id
    }

    // === Zone Queries ===

    /// Characters a player has in play, in the order they entered.
    #[must_use]
    pub fn characters_in_play(&self, player: PlayerId) -> Vec<EntityId> {
        self.zones
            .cards_in(player, Zone::Play)
            .into_iter()
            .filter(|id| {
                self.cards
                    .get(id)
                    .is_some_and(|c| c.definition.kind == CardKind::Character)
            })
            .collect()
    }

    /// Every character in play, player by player in turn order.
    #[must_use]
    pub fn all_characters_in_play(&self) -> Vec<EntityId> {
        self.player_ids()
            .flat_map(|p| self.characters_in_play(p))
            .collect()
    }

    #[must_use]
    pub fn hand(&self, player: PlayerId) -> Vec<EntityId> {
        self.zones.cards_in(player, Zone::Hand)
    }

    #[must_use]
    pub fn discard(&self, player: PlayerId) -> Vec<EntityId> {
        self.zones.cards_in(player, Zone::Discard)
    }

    #[must_use]
    pub fn deck_size(&self, player: PlayerId) -> usize {
        self.zones.zone_size(player, Zone::Deck)
    }

    // === Mutation ===

    /// Move a card to a zone of its owner.
    ///
    /// Leaving play clears damage, exertion, bonuses, and granted properties.
    pub fn move_card(&mut self, id: EntityId, zone: Zone, position: ZonePosition) -> Result<ZoneLocation> {
        let owner = self.card(id)?.owner;
        let old = self
            .zones
            .move_to_zone(id, owner, zone, position)
            .ok_or(RulesError::UnknownEntity(id))?;
        if old.zone == Zone::Play && zone != Zone::Play {
            self.card_mut(id)?.reset_for_zone_change();
        }
        Ok(old)
    }

    /// Draw up to `count` cards. Returns the cards drawn.
    ///
    /// With `strict`, running out of cards is an error.
    pub fn draw(&mut self, player: PlayerId, count: usize, strict: bool) -> Result<Vec<EntityId>> {
        self.check_player(player)?;
        let mut drawn = Vec::with_capacity(count);
        for _ in 0..count {
            match self.zones.top_card(player, Zone::Deck) {
                Some(card) => {
                    self.zones.move_to_zone(card, player, Zone::Hand, ZonePosition::Top);
                    drawn.push(card);
                }
                None if strict => return Err(RulesError::EmptyDeck(player)),
                None => break,
            }
        }
        Ok(drawn)
    }

    /// Shuffle a player's deck.
    pub fn shuffle_deck(&mut self, player: PlayerId) {
        self.zones.shuffle_zone(player, Zone::Deck, &mut self.rng);
    }

    /// Exert a card. Returns `true` if it was ready before.
    pub fn exert(&mut self, id: EntityId) -> Result<bool> {
        let card = self.card_mut(id)?;
        let changed = !card.exerted;
        card.exerted = true;
        Ok(changed)
    }

    /// Ready a card. Returns `true` if it was exerted before.
    pub fn ready(&mut self, id: EntityId) -> Result<bool> {
        let card = self.card_mut(id)?;
        let changed = card.exerted;
        card.exerted = false;
        Ok(changed)
    }

    /// Put damage on a card. Returns the damage actually dealt.
    pub fn damage(&mut self, id: EntityId, amount: i64) -> Result<i64> {
        Ok(self.card_mut(id)?.deal_damage(amount))
    }

    /// Remove damage from a card. Returns the damage actually removed.
    pub fn heal(&mut self, id: EntityId, amount: i64) -> Result<i64> {
        Ok(self.card_mut(id)?.heal(amount))
    }

    /// Banish a card to its owner's discard.
    pub fn banish(&mut self, id: EntityId) -> Result<ZoneLocation> {
        self.move_card(id, Zone::Discard, ZonePosition::Top)
    }

    /// Return a card to its owner's hand.
    pub fn return_to_hand(&mut self, id: EntityId) -> Result<ZoneLocation> {
        self.move_card(id, Zone::Hand, ZonePosition::Top)
    }

    /// Discard a card from hand.
    pub fn discard_from_hand(&mut self, id: EntityId) -> Result<()> {
        if self.zone_of(id) != Some(Zone::Hand) {
            return Err(RulesError::NotInZone {
                entity: id,
                expected: Zone::Hand,
            });
        }
        self.move_card(id, Zone::Discard, ZonePosition::Top)?;
        Ok(())
    }

    /// Add lore to a player. Returns the new total.
    pub fn gain_lore(&mut self, player: PlayerId, amount: i64) -> Result<i64> {
        self.check_player(player)?;
        let record = &mut self.players[player];
        record.lore = (record.lore + amount).max(0);
        Ok(record.lore)
    }
}
