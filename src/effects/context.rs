//! Per-action context and the environment effects run in.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::effect::Effect;
use super::target::Target;
use crate::choice::ChoiceManager;
use crate::core::{EngineConfig, EntityId, GameState, PlayerId};
use crate::events::EventContext;
use crate::timing::TurnTiming;
use crate::zones::Zone;

/// Mutable context owned by one queued action.
///
/// Built when an ability triggers (or a driver enqueues work) and handed
/// to the effect when the action runs. Choice resolution writes the
/// selected target back into a copy that travels with the continuation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionContext {
    /// The card whose ability produced this action.
    pub source: Option<EntityId>,

    /// The player making decisions for this action.
    pub player: Option<PlayerId>,

    pub ability_name: Option<String>,

    /// The event that triggered the ability, if any.
    pub event: Option<EventContext>,

    /// Target chosen by a player, written back on choice resolution.
    pub selected_target: Option<Target>,

    /// The choice this action continues, if any.
    pub choice_id: Option<String>,

    /// Why the action exists when it is engine-generated
    /// (e.g. `"duration_expired"`).
    pub reason: Option<String>,

    #[serde(default)]
    pub extra: FxHashMap<String, i64>,
}

impl ActionContext {
    /// Context for an ability of `source`.
    #[must_use]
    pub fn for_ability(source: EntityId, ability_name: impl Into<String>) -> Self {
        Self {
            source: Some(source),
            ability_name: Some(ability_name.into()),
            ..Self::default()
        }
    }

    /// Set the deciding player (builder pattern).
    #[must_use]
    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    /// Attach the triggering event (builder pattern).
    #[must_use]
    pub fn with_event(mut self, event: EventContext) -> Self {
        self.event = Some(event);
        self
    }

    /// Set the reason (builder pattern).
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// The ability owner: the explicit source, else the triggering event's
    /// owner or source.
    #[must_use]
    pub fn ability_owner(&self) -> Option<EntityId> {
        self.source
            .or_else(|| self.event.as_ref().and_then(EventContext::owner_or_source))
    }

    /// The deciding player, falling back to the owner's controller.
    #[must_use]
    pub fn acting_player(&self, state: &GameState) -> Option<PlayerId> {
        self.player.or_else(|| {
            self.ability_owner()
                .and_then(|id| state.get_card(id))
                .map(|card| card.controller)
        })
    }

    /// Label for logs and step descriptions.
    #[must_use]
    pub fn label(&self) -> &str {
        self.ability_name.as_deref().unwrap_or("effect")
    }
}

/// Everything an effect may touch while it applies.
///
/// Collaborators other than the state are optional. Effects that need a
/// missing one degrade instead of failing.
pub struct EffectEnv<'a> {
    pub state: &'a mut GameState,
    pub context: &'a mut ActionContext,
    pub config: &'a EngineConfig,
    pub choices: Option<&'a mut ChoiceManager>,
    pub timing: Option<&'a mut TurnTiming>,
}

impl<'a> EffectEnv<'a> {
    /// Environment with only state and context.
    pub fn new(state: &'a mut GameState, context: &'a mut ActionContext, config: &'a EngineConfig) -> Self {
        Self {
            state,
            context,
            config,
            choices: None,
            timing: None,
        }
    }

    /// Attach a choice manager (builder pattern).
    #[must_use]
    pub fn with_choices(mut self, choices: &'a mut ChoiceManager) -> Self {
        self.choices = Some(choices);
        self
    }

    /// Attach a turn-timing tracker (builder pattern).
    #[must_use]
    pub fn with_timing(mut self, timing: &'a mut TurnTiming) -> Self {
        self.timing = Some(timing);
        self
    }

    /// The choice manager, if one is reachable.
    pub fn choices(&mut self) -> Option<&mut ChoiceManager> {
        self.choices.as_deref_mut()
    }

    /// The turn-timing tracker, if one is reachable.
    pub fn timing(&mut self) -> Option<&mut TurnTiming> {
        self.timing.as_deref_mut()
    }

    /// Is a choice currently pausing the game?
    #[must_use]
    pub fn choice_pending(&self) -> bool {
        self.choices.as_ref().is_some_and(|c| c.is_paused())
    }
}

/// What an effect did.
///
/// Atomic effects fill in the measured fields. Composite and repeated
/// effects record one `EffectStep` per sub-application so that events are
/// computed from each step's own outcome.
#[derive(Clone, Debug, Default)]
pub struct EffectOutcome {
    /// Handed to the next step of a composite as its target.
    pub result: Target,

    /// Magnitude actually applied.
    pub amount: Option<i64>,

    /// Resulting value after this step.
    pub total: Option<i64>,

    /// Player affected (drawer, lore gainer, card controller).
    pub player: Option<PlayerId>,

    /// Cards moved or touched (drawn, discarded).
    pub cards: Vec<EntityId>,

    /// Zone a moved card left.
    pub from_zone: Option<Zone>,

    pub steps: Vec<EffectStep>,
}

impl EffectOutcome {
    /// Outcome that only passes a target through.
    #[must_use]
    pub fn unchanged(target: Target) -> Self {
        Self {
            result: target,
            ..Self::default()
        }
    }

    /// Set amount (builder pattern).
    #[must_use]
    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set total (builder pattern).
    #[must_use]
    pub fn with_total(mut self, total: i64) -> Self {
        self.total = Some(total);
        self
    }

    /// Set player (builder pattern).
    #[must_use]
    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }
}

/// One sub-application inside a composite, repeated, or multi-target effect.
#[derive(Clone, Debug)]
pub struct EffectStep {
    pub effect: Effect,
    pub input: Target,
    pub outcome: EffectOutcome,
}
