//! Name → factory table for named card abilities.
//!
//! The table is an ordinary value built at startup and handed to the
//! engine. [`AbilityFactoryRegistry::with_defaults`] carries a small set of
//! reference abilities; card sets register their own on top.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::ability::{AbilityBuilder, ComposableAbility};
use crate::cards::{CardInstance, Stat};
use crate::choice::ChoiceEffect;
use crate::core::EntityId;
use crate::effects::{CardFilter, Effect, TargetSelector};
use crate::error::{Result, RulesError};
use crate::triggers::{when_banished, when_challenges, when_enters_play};
use crate::zones::Zone;

/// Builds an ability for a card from its ability data.
pub type AbilityFactory = Rc<dyn Fn(EntityId, &FxHashMap<String, i64>) -> ComposableAbility>;

/// Injected table of named-ability factories.
#[derive(Clone, Default)]
pub struct AbilityFactoryRegistry {
    factories: FxHashMap<String, AbilityFactory>,
}

impl AbilityFactoryRegistry {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the reference abilities.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("CRYSTALLIZE", crystallize);
        registry.register("HORSE KICK", horse_kick);
        registry.register("AND TWO FOR TEA!", and_two_for_tea);
        registry.register("DANCE-OFF", dance_off);
        registry.register("PARTING GIFT", parting_gift);
        registry
    }

    /// Register (or replace) the factory for `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(EntityId, &FxHashMap<String, i64>) -> ComposableAbility + 'static,
    ) {
        self.factories.insert(name.into(), Rc::new(factory));
    }

    pub fn create_ability(&self, name: &str, owner: EntityId, data: &FxHashMap<String, i64>) -> Result<ComposableAbility> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RulesError::UnknownAbility(name.to_string()))?;
        Ok(factory(owner, data))
    }

    /// One result per named ability on the card, in card order.
    #[must_use]
    pub fn abilities_for(&self, card: &CardInstance) -> Vec<Result<ComposableAbility>> {
        card.definition
            .abilities
            .iter()
            .map(|spec| self.create_ability(&spec.name, card.entity_id, &spec.data))
            .collect()
    }

    #[must_use]
    pub fn is_implemented(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for AbilityFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityFactoryRegistry")
            .field("names", &self.registered_names())
            .finish()
    }
}

// === Reference Abilities ===

/// When you play this character, exert chosen opposing character.
fn crystallize(owner: EntityId, _: &FxHashMap<String, i64>) -> ComposableAbility {
    AbilityBuilder::new("CRYSTALLIZE", owner)
        .when(when_enters_play(owner))
        .target(TargetSelector::enemy_character())
        .apply(Effect::Exert)
        .build()
}

/// When you play this character, chosen character gets -N strength this turn.
fn horse_kick(owner: EntityId, data: &FxHashMap<String, i64>) -> ComposableAbility {
    let amount = data.get("amount").copied().unwrap_or(2);
    AbilityBuilder::new("HORSE KICK", owner)
        .when(when_enters_play(owner))
        .target(TargetSelector::character(CardFilter::Any))
        .apply(Effect::stat_this_turn(Stat::Strength, -amount))
        .build()
}

/// When you play this character, remove up to 2 damage from each of your
/// Musketeer characters.
fn and_two_for_tea(owner: EntityId, data: &FxHashMap<String, i64>) -> ComposableAbility {
    let amount = data.get("amount").copied().unwrap_or(2);
    AbilityBuilder::new("AND TWO FOR TEA!", owner)
        .when(when_enters_play(owner))
        .target(TargetSelector::all_characters(
            CardFilter::Friendly.and(CardFilter::Subtype("Musketeer".into())),
        ))
        .apply(Effect::RemoveDamage(amount))
        .build()
}

/// Whenever this character challenges another character, gain 1 lore.
fn dance_off(owner: EntityId, _: &FxHashMap<String, i64>) -> ComposableAbility {
    AbilityBuilder::new("DANCE-OFF", owner)
        .when(when_challenges(owner))
        .apply(Effect::GainLore(1))
        .build()
}

/// When this character is banished, you may draw a card.
fn parting_gift(owner: EntityId, _: &FxHashMap<String, i64>) -> ComposableAbility {
    AbilityBuilder::new("PARTING GIFT", owner)
        .when(when_banished(Some(owner)))
        .target(TargetSelector::NoTarget)
        .apply(ChoiceEffect::may("draw a card", Effect::Draw(1)).with_ability_name("PARTING GIFT").into())
        .build()
        .active_in([Zone::Play, Zone::Discard])
}
