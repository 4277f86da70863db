//! Conditional (continuous) effects.
//!
//! A conditional effect is "while X, Y": it is applied when its condition
//! becomes true while its source sits in an activation zone, and removed
//! when either stops holding. Transitions are idempotent, so an effect
//! never applies twice without a removal in between.
//!
//! ## Evaluation
//!
//! `should_evaluate` gates re-computation of the condition:
//!
//! - always on the first check
//! - when the turn number or phase changed since the last check
//! - on every check for `Timing` conditions
//!
//! Leaving the activation zones removes an active effect regardless.

use std::fmt;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::core::{EntityId, GameState, Phase, PlayerId};
use crate::error::Result;
use crate::events::{EventContext, EventKind};
use crate::zones::Zone;

/// What a condition depends on. Only `Timing` changes evaluation frequency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionType {
    #[default]
    TurnBased,
    ZoneBased,
    StatBased,
    GameState,
    Timing,
}

pub type ConditionalCheck = Rc<dyn Fn(&GameState, EntityId) -> Result<bool>>;

/// Applies the effect. The returned map is attached to the applied event.
pub type ConditionalApply = Rc<dyn Fn(&mut GameState, EntityId) -> Result<FxHashMap<String, i64>>>;

/// Undoes the effect. Returned data is merged into the removed event.
pub type ConditionalRemove = Rc<dyn Fn(&mut GameState, EntityId) -> Result<Option<FxHashMap<String, i64>>>>;

#[derive(Clone)]
pub struct ConditionalEffect {
    pub id: String,
    pub source: EntityId,
    pub ability_name: String,
    pub activation_zones: FxHashSet<Zone>,
    /// Higher applies first within one evaluation pass.
    pub priority: i32,
    pub condition_type: ConditionType,
    condition: ConditionalCheck,
    apply: ConditionalApply,
    remove: Option<ConditionalRemove>,
    active: bool,
    last_turn: Option<u32>,
    last_phase: Option<Phase>,
}

impl ConditionalEffect {
    pub fn new(
        id: impl Into<String>,
        source: EntityId,
        condition: impl Fn(&GameState, EntityId) -> Result<bool> + 'static,
        apply: impl Fn(&mut GameState, EntityId) -> Result<FxHashMap<String, i64>> + 'static,
    ) -> Self {
        let mut zones = FxHashSet::default();
        zones.insert(Zone::Play);
        Self {
            id: id.into(),
            source,
            ability_name: String::new(),
            activation_zones: zones,
            priority: 0,
            condition_type: ConditionType::default(),
            condition: Rc::new(condition),
            apply: Rc::new(apply),
            remove: None,
            active: false,
            last_turn: None,
            last_phase: None,
        }
    }

    #[must_use]
    pub fn with_removal(
        mut self,
        remove: impl Fn(&mut GameState, EntityId) -> Result<Option<FxHashMap<String, i64>>> + 'static,
    ) -> Self {
        self.remove = Some(Rc::new(remove));
        self
    }

    #[must_use]
    pub fn with_ability_name(mut self, name: impl Into<String>) -> Self {
        self.ability_name = name.into();
        self
    }

    #[must_use]
    pub fn with_condition_type(mut self, condition_type: ConditionType) -> Self {
        self.condition_type = condition_type;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn active_in(mut self, zones: impl IntoIterator<Item = Zone>) -> Self {
        self.activation_zones = zones.into_iter().collect();
        self
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn should_evaluate(&self, state: &GameState) -> bool {
        match self.last_turn {
            None => true,
            Some(turn) => {
                turn != state.turn_number
                    || self.last_phase != Some(state.current_phase)
                    || self.condition_type == ConditionType::Timing
            }
        }
    }

    /// Evaluate the condition. Faults count as not met and are retried on
    /// the next pass; only a clean evaluation records the turn and phase.
    pub fn evaluate_condition(&mut self, state: &GameState) -> bool {
        match (self.condition)(state, self.source) {
            Ok(met) => {
                self.last_turn = Some(state.turn_number);
                self.last_phase = Some(state.current_phase);
                met
            }
            Err(err) => {
                tracing::warn!(effect = %self.id, %err, "conditional effect condition failed");
                false
            }
        }
    }

    #[must_use]
    pub fn is_in_valid_zone(&self, state: &GameState) -> bool {
        state
            .zone_of(self.source)
            .is_some_and(|zone| self.activation_zones.contains(&zone))
    }

    /// Apply if inactive. Returns the applied event, or `None` when already
    /// active or the apply function failed.
    pub fn apply_effect(&mut self, state: &mut GameState, timestamp: u64) -> Option<EventContext> {
        if self.active {
            return None;
        }
        match (self.apply)(state, self.source) {
            Ok(details) => {
                self.active = true;
                tracing::debug!(effect = %self.id, "conditional effect applied");
                let mut event = self.event(EventKind::ConditionalEffectApplied, timestamp);
                event.data.extra.extend(details);
                Some(event)
            }
            Err(err) => {
                tracing::warn!(effect = %self.id, %err, "conditional effect failed to apply");
                None
            }
        }
    }

    /// Remove if active. Returns the removed event, or `None` when inactive
    /// or the removal function failed.
    pub fn remove_effect(&mut self, state: &mut GameState, timestamp: u64) -> Option<EventContext> {
        if !self.active {
            return None;
        }
        let details = match &self.remove {
            Some(remove) => match remove(state, self.source) {
                Ok(details) => details,
                Err(err) => {
                    tracing::warn!(effect = %self.id, %err, "conditional effect failed to remove");
                    return None;
                }
            },
            None => None,
        };
        self.active = false;
        tracing::debug!(effect = %self.id, "conditional effect removed");
        let mut event = self.event(EventKind::ConditionalEffectRemoved, timestamp);
        if let Some(details) = details {
            event.data.extra.extend(details);
        }
        Some(event)
    }

    /// One evaluation step: apply, remove, or nothing.
    pub fn update(&mut self, state: &mut GameState, timestamp: u64) -> Option<EventContext> {
        if !self.is_in_valid_zone(state) {
            self.last_turn = None;
            return self.remove_effect(state, timestamp);
        }
        if !self.should_evaluate(state) {
            return None;
        }
        if self.evaluate_condition(state) {
            self.apply_effect(state, timestamp)
        } else {
            self.remove_effect(state, timestamp)
        }
    }

    fn event(&self, kind: EventKind, timestamp: u64) -> EventContext {
        let mut event = EventContext::new(kind).with_source(self.source);
        if !self.ability_name.is_empty() {
            event = event.with_ability_name(self.ability_name.clone());
        }
        event.data.effect_id = Some(self.id.clone());
        event.data.timestamp = Some(timestamp);
        event
    }
}

impl fmt::Debug for ConditionalEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalEffect")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("condition_type", &self.condition_type)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

// === Tracker ===

/// Every registered conditional effect, evaluated together.
#[derive(Debug, Default)]
pub struct ConditionalEffectTracker {
    effects: Vec<ConditionalEffect>,
    counter: u64,
}

impl ConditionalEffectTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an effect, replacing one with the same id and source.
    pub fn register(&mut self, effect: ConditionalEffect) {
        self.effects
            .retain(|e| !(e.id == effect.id && e.source == effect.source));
        self.effects.push(effect);
        self.effects.sort_by_key(|e| std::cmp::Reverse(e.priority));
    }

    /// Remove by id. An active effect is removed without running its removal.
    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.id != id);
        self.effects.len() != before
    }

    pub fn unregister_by_source(&mut self, source: EntityId) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| e.source != source);
        before - self.effects.len()
    }

    /// Update every effect. Returns the applied/removed events in order.
    pub fn evaluate_all(&mut self, state: &mut GameState) -> Vec<EventContext> {
        let mut events = Vec::new();
        for effect in &mut self.effects {
            let timestamp = u64::from(state.turn_number) * 1000 + self.counter;
            if let Some(event) = effect.update(state, timestamp) {
                self.counter += 1;
                events.push(event);
            }
        }
        events
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ConditionalEffect> {
        self.effects.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn active_effects(&self) -> Vec<&ConditionalEffect> {
        self.effects.iter().filter(|e| e.is_active()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

// === Condition Helpers ===

fn controller(state: &GameState, source: EntityId) -> Option<PlayerId> {
    state.get_card(source).map(|c| c.controller)
}

pub fn during_controllers_turn(state: &GameState, source: EntityId) -> Result<bool> {
    Ok(controller(state, source) == Some(state.active_player))
}

pub fn during_opponents_turn(state: &GameState, source: EntityId) -> Result<bool> {
    Ok(controller(state, source).is_some_and(|p| p != state.active_player))
}

/// A character whose name contains `name` (case-insensitive) is in play.
pub fn character_in_play(name: impl Into<String>) -> impl Fn(&GameState, EntityId) -> Result<bool> {
    let name = name.into().to_lowercase();
    move |state, _| {
        Ok(state
            .all_characters_in_play()
            .into_iter()
            .filter_map(|id| state.get_card(id))
            .any(|card| card.name().to_lowercase().contains(&name)))
    }
}

pub fn controller_has_character_with_subtype(subtype: impl Into<String>) -> impl Fn(&GameState, EntityId) -> Result<bool> {
    let subtype = subtype.into();
    move |state, source| {
        let Some(player) = controller(state, source) else {
            return Ok(false);
        };
        Ok(state
            .characters_in_play(player)
            .into_iter()
            .filter_map(|id| state.get_card(id))
            .any(|card| card.definition.has_subtype(&subtype)))
    }
}

pub fn during_phase(phase: Phase) -> impl Fn(&GameState, EntityId) -> Result<bool> {
    move |state, _| Ok(state.current_phase == phase)
}
