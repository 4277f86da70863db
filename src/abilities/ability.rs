//! Composable abilities.
//!
//! An ability is an ordered set of listeners owned by one card. It is
//! registered with the event bus as a unit and only listens while its
//! owner sits in one of its active zones.

use std::fmt;

use rustc_hash::FxHashSet;

use super::listener::ComposableListener;
use crate::core::{EngineConfig, EntityId, GameState};
use crate::effects::{ActionContext, Effect, TargetSelector};
use crate::events::{EventContext, EventKind};
use crate::queue::ActionRequest;
use crate::triggers::TriggerCondition;
use crate::zones::Zone;

/// A named, multi-trigger ability of one card.
#[derive(Clone, Debug)]
pub struct ComposableAbility {
    pub name: String,
    pub owner: EntityId,
    pub listeners: Vec<ComposableListener>,
    /// Zones the owner must be in for the ability to listen.
    pub active_zones: FxHashSet<Zone>,
}

impl ComposableAbility {
    pub fn new(name: impl Into<String>, owner: EntityId) -> Self {
        let mut active_zones = FxHashSet::default();
        active_zones.insert(Zone::Play);
        Self {
            name: name.into(),
            owner,
            listeners: Vec::new(),
            active_zones,
        }
    }

    /// Add a listener (fluent interface). An empty name becomes `TriggerN`.
    #[must_use]
    pub fn add_trigger(
        mut self,
        condition: TriggerCondition,
        selector: TargetSelector,
        effect: Effect,
        priority: i32,
        name: &str,
    ) -> Self {
        let name = if name.is_empty() {
            format!("Trigger{}", self.listeners.len() + 1)
        } else {
            name.to_string()
        };
        self.listeners
            .push(ComposableListener::new(name, condition, selector, effect).with_priority(priority));
        self
    }

    /// Add a prebuilt listener (builder pattern).
    #[must_use]
    pub fn with_listener(mut self, listener: ComposableListener) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Replace the active zones (builder pattern).
    #[must_use]
    pub fn active_in(mut self, zones: impl IntoIterator<Item = Zone>) -> Self {
        self.active_zones = zones.into_iter().collect();
        self
    }

    /// Registry key: owner plus name.
    #[must_use]
    pub fn key(&self) -> (EntityId, &str) {
        (self.owner, self.name.as_str())
    }

    /// Union of every listener's event kinds, in first-seen order.
    #[must_use]
    pub fn relevant_events(&self) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        for listener in &self.listeners {
            for kind in listener.condition.relevant_events() {
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        kinds
    }

    #[must_use]
    pub fn is_active(&self, state: &GameState) -> bool {
        state
            .zone_of(self.owner)
            .is_some_and(|zone| self.active_zones.contains(&zone))
    }

    /// Does any listener rewrite events rather than queue work?
    #[must_use]
    pub fn modifies_game_rules(&self) -> bool {
        self.listeners.iter().any(|l| l.effect.modifies_event())
    }

    /// React to one event.
    ///
    /// Listeners run by descending priority, ties in insertion order.
    /// Event-rewriting effects apply to the live event on the spot; all
    /// other effects come back as requests. Once the event is prevented
    /// the remaining listeners are skipped.
    pub fn handle_event(&self, event: &mut EventContext, state: &GameState, config: &EngineConfig) -> Vec<ActionRequest> {
        let mut requests = Vec::new();
        if !self.is_active(state) {
            return requests;
        }

        let mut ordered: Vec<&ComposableListener> = self.listeners.iter().collect();
        ordered.sort_by_key(|l| std::cmp::Reverse(l.priority));

        for listener in ordered {
            if !listener.should_trigger(event, state, self.owner) {
                continue;
            }
            tracing::debug!(ability = %self.name, listener = %listener.name, event = %event.kind, "triggered");

            if listener.effect.modifies_event() {
                let context = ActionContext::for_ability(self.owner, &self.name).with_event(event.clone());
                listener.effect.apply_to_event(event, &context, state, config);
            } else {
                requests.push(listener.request(&self.name, self.owner, event, state, config));
            }

            if event.is_prevented() {
                break;
            }
        }
        requests
    }
}

impl fmt::Display for ComposableAbility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} triggers)", self.name, self.listeners.len())
    }
}

/// Fluent builder: `AbilityBuilder::new(name).when(..).target(..).apply(..)`.
#[derive(Debug)]
pub struct AbilityBuilder {
    ability: ComposableAbility,
    pending: Option<ComposableListener>,
}

impl AbilityBuilder {
    pub fn new(name: impl Into<String>, owner: EntityId) -> Self {
        Self {
            ability: ComposableAbility::new(name, owner),
            pending: None,
        }
    }

    fn flush(&mut self) {
        if let Some(listener) = self.pending.take() {
            self.ability.listeners.push(listener);
        }
    }

    /// Start a new trigger. Defaults: targets the owner, does nothing.
    #[must_use]
    pub fn when(mut self, condition: TriggerCondition) -> Self {
        self.flush();
        let name = format!("Trigger{}", self.ability.listeners.len() + 1);
        self.pending = Some(ComposableListener::new(
            name,
            condition,
            TargetSelector::SelfCard,
            Effect::NoEffect,
        ));
        self
    }

    #[must_use]
    pub fn target(mut self, selector: TargetSelector) -> Self {
        if let Some(listener) = self.pending.as_mut() {
            listener.selector = selector;
        }
        self
    }

    #[must_use]
    pub fn apply(mut self, effect: Effect) -> Self {
        if let Some(listener) = self.pending.as_mut() {
            listener.effect = effect;
        }
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        if let Some(listener) = self.pending.as_mut() {
            listener.priority = priority;
        }
        self
    }

    #[must_use]
    pub fn queue_priority(mut self, priority: crate::queue::ActionPriority) -> Self {
        if let Some(listener) = self.pending.as_mut() {
            listener.action_priority = priority;
        }
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let Some(listener) = self.pending.as_mut() {
            listener.name = name.into();
        }
        self
    }

    #[must_use]
    pub fn build(mut self) -> ComposableAbility {
        self.flush();
        self.ability
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardDefinition;
    use crate::core::PlayerId;
    use crate::effects::Target;
    use crate::queue::ActionPriority;
    use crate::triggers::{when_any_takes_damage, when_quests, when_takes_damage};

    fn setup() -> (GameState, EntityId, EntityId) {
        let mut state = GameState::new(2, 0);
        let hero = state.add_card(CardDefinition::character("Hero", 3, 2, 4, 1), PlayerId::new(0), Zone::Play);
        let foe = state.add_card(CardDefinition::character("Foe", 2, 1, 2, 1), PlayerId::new(1), Zone::Play);
        (state, hero, foe)
    }

    #[test]
    fn test_listeners_by_priority_stable() {
        let (state, hero, _) = setup();
        let ability = ComposableAbility::new("ORDER", hero)
            .add_trigger(when_quests(hero), TargetSelector::SelfCard, Effect::Exert, 0, "low a")
            .add_trigger(when_quests(hero), TargetSelector::SelfCard, Effect::Ready, 5, "high")
            .add_trigger(when_quests(hero), TargetSelector::SelfCard, Effect::Draw(1), 0, "low b");
        let mut event = EventContext::new(EventKind::CharacterQuests).with_source(hero);

        let requests = ability.handle_event(&mut event, &state, &EngineConfig::default());
        let order: Vec<&str> = requests
            .iter()
            .map(|r| match &r.effect {
                Effect::AbilityTrigger(t) => t.listener.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(order, vec!["high", "low a", "low b"]);
        assert!(requests.iter().all(|r| r.priority == ActionPriority::High));
        assert!(requests.iter().all(|r| r.target == Target::Card(hero)));
    }

    #[test]
    fn test_prevention_stops_remaining_listeners() {
        let (state, hero, foe) = setup();
        let ability = AbilityBuilder::new("SHIELD", hero)
            .when(when_takes_damage(hero))
            .target(TargetSelector::NoTarget)
            .apply(Effect::PreventEvent)
            .priority(10)
            .when(when_any_takes_damage())
            .apply(Effect::Draw(1))
            .build();
        let mut event = EventContext::damage_taken(Some(foe), hero, 2, 2);

        let requests = ability.handle_event(&mut event, &state, &EngineConfig::default());

        assert!(event.is_prevented());
        assert!(requests.is_empty());
        assert!(ability.modifies_game_rules());
    }

    #[test]
    fn test_modify_damage_rewrites_live_event() {
        let (state, hero, foe) = setup();
        let ability = AbilityBuilder::new("TOUGH", hero)
            .when(when_takes_damage(hero))
            .apply(Effect::ModifyDamage(1))
            .build();
        let mut event = EventContext::damage_taken(Some(foe), hero, 3, 3);

        let requests = ability.handle_event(&mut event, &state, &EngineConfig::default());

        assert!(requests.is_empty());
        assert_eq!(event.data.amount, Some(2));
        assert!(!event.is_prevented());
    }

    #[test]
    fn test_inactive_outside_zones() {
        let (mut state, hero, _) = setup();
        let ability = AbilityBuilder::new("ONLY IN PLAY", hero)
            .when(when_quests(hero))
            .apply(Effect::Draw(1))
            .build();
        state.banish(hero).unwrap();
        let mut event = EventContext::new(EventKind::CharacterQuests).with_source(hero);

        assert!(!ability.is_active(&state));
        assert!(ability.handle_event(&mut event, &state, &EngineConfig::default()).is_empty());

        let anywhere = ability.active_in([Zone::Play, Zone::Discard]);
        assert_eq!(anywhere.handle_event(&mut event, &state, &EngineConfig::default()).len(), 1);
    }

    #[test]
    fn test_builder_names_and_events() {
        let (_, hero, _) = setup();
        let ability = AbilityBuilder::new("MULTI", hero)
            .when(when_quests(hero))
            .apply(Effect::GainLore(1))
            .when(when_takes_damage(hero))
            .named("hurt")
            .apply(Effect::Draw(1))
            .build();

        assert_eq!(ability.listeners[0].name, "Trigger1");
        assert_eq!(ability.listeners[1].name, "hurt");
        assert_eq!(
            ability.relevant_events(),
            vec![EventKind::CharacterQuests, EventKind::CharacterTakesDamage]
        );
        assert_eq!(ability.to_string(), "MULTI (2 triggers)");
    }
}
