//! Event bus.
//!
//! The bus indexes composable abilities by the event kinds they declare and
//! offers each dispatched event to the matching abilities in registration
//! order. Dispatch only reads game state: everything the abilities want to
//! do comes back as [`ActionRequest`]s for the action queue.

use rustc_hash::FxHashMap;

use super::event::{EventContext, EventKind};
use crate::abilities::{AbilityFactoryRegistry, ComposableAbility};
use crate::core::{EngineConfig, EntityId, GameState};
use crate::error::RulesError;
use crate::queue::ActionRequest;

/// Registration handle, increasing in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Slot(u32);

/// Routes events to composable abilities.
#[derive(Debug, Default)]
pub struct EventBus {
    abilities: FxHashMap<Slot, ComposableAbility>,
    by_kind: FxHashMap<EventKind, Vec<Slot>>,
    next_slot: u32,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ability under every event kind its listeners declare.
    ///
    /// An ability with the same owner and name is replaced.
    pub fn register(&mut self, ability: ComposableAbility) {
        self.unregister(ability.owner, &ability.name);

        let slot = Slot(self.next_slot);
        self.next_slot += 1;

        let kinds = ability.relevant_events();
        if kinds.is_empty() {
            tracing::warn!(ability = %ability.name, owner = %ability.owner, "ability declares no events");
        }
        for kind in kinds {
            self.by_kind.entry(kind).or_default().push(slot);
        }
        tracing::debug!(ability = %ability.name, owner = %ability.owner, "ability registered");
        self.abilities.insert(slot, ability);
    }

    /// Remove an ability by owner and name.
    pub fn unregister(&mut self, owner: EntityId, name: &str) -> Option<ComposableAbility> {
        let slot = self
            .abilities
            .iter()
            .find(|(_, a)| a.key() == (owner, name))
            .map(|(slot, _)| *slot)?;
        self.remove_slot(slot)
    }

    /// Remove every ability owned by `owner`. Returns how many were removed.
    pub fn unregister_owner(&mut self, owner: EntityId) -> usize {
        let slots: Vec<Slot> = self
            .abilities
            .iter()
            .filter(|(_, a)| a.owner == owner)
            .map(|(slot, _)| *slot)
            .collect();
        for slot in &slots {
            self.remove_slot(*slot);
        }
        slots.len()
    }

    fn remove_slot(&mut self, slot: Slot) -> Option<ComposableAbility> {
        let ability = self.abilities.remove(&slot)?;
        self.by_kind.retain(|_, slots| {
            slots.retain(|s| *s != slot);
            !slots.is_empty()
        });
        Some(ability)
    }

    /// Offer `event` to every ability listening for its kind.
    ///
    /// Abilities may rewrite the event (prevent, reduce, retarget). Once it
    /// is prevented no further ability sees it.
    pub fn dispatch(&self, event: &mut EventContext, state: &GameState, config: &EngineConfig) -> Vec<ActionRequest> {
        let mut requests = Vec::new();
        let Some(slots) = self.by_kind.get(&event.kind) else {
            return requests;
        };

        for slot in slots {
            if event.is_prevented() {
                tracing::debug!(event = %event.kind, "event prevented");
                break;
            }
            if let Some(ability) = self.abilities.get(slot) {
                requests.extend(ability.handle_event(event, state, config));
            }
        }
        requests
    }

    /// Number of abilities listening for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.by_kind.get(&kind).map_or(0, Vec::len)
    }

    /// Listener counts per event kind, busiest first.
    #[must_use]
    pub fn listener_counts(&self) -> Vec<(EventKind, usize)> {
        let mut counts: Vec<(EventKind, usize)> = self
            .by_kind
            .iter()
            .map(|(kind, slots)| (*kind, slots.len()))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name().cmp(b.0.name())));
        counts
    }

    /// Abilities in registration order.
    #[must_use]
    pub fn abilities(&self) -> Vec<&ComposableAbility> {
        let mut slots: Vec<&Slot> = self.abilities.keys().collect();
        slots.sort();
        slots.into_iter().filter_map(|s| self.abilities.get(s)).collect()
    }

    #[must_use]
    pub fn abilities_of(&self, owner: EntityId) -> Vec<&ComposableAbility> {
        self.abilities().into_iter().filter(|a| a.owner == owner).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    pub fn clear(&mut self) {
        self.abilities.clear();
        self.by_kind.clear();
    }

    /// Drop everything and re-register the named abilities of every
    /// character in play. Unknown ability names are returned, not fatal.
    pub fn rebuild(&mut self, state: &GameState, factories: &AbilityFactoryRegistry) -> Vec<RulesError> {
        self.clear();
        let mut errors = Vec::new();
        for id in state.all_characters_in_play() {
            let Some(card) = state.get_card(id) else { continue };
            for result in factories.abilities_for(card) {
                match result {
                    Ok(ability) => self.register(ability),
                    Err(err) => {
                        tracing::warn!(card = %card.name(), %err, "ability not materialized");
                        errors.push(err);
                    }
                }
            }
        }
        errors
    }
}
