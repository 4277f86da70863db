//! # ccg-rules
//!
//! A rules engine for a collectible card game where characters quest for
//! lore and challenge each other.
//!
//! ## Design Principles
//!
//! 1. **Two-stage triggers**: dispatching an event never mutates state.
//!    Abilities answer with action requests; the action queue applies them
//!    in priority order.
//!
//! 2. **Effects are data**: an [`Effect`] is an immutable value. Applying it
//!    is the only way card abilities touch [`GameState`], and every
//!    application reports the events it caused.
//!
//! 3. **Choices pause, never block**: a player decision parks the queue
//!    until the choice is answered through [`RulesEngine::provide_choice`].
//!
//! ## Modules
//!
//! - `core`: entity IDs, players, state arena, RNG, configuration
//! - `zones`: per-player ordered zones
//! - `cards`: card definitions and runtime instances
//! - `events`: event contexts and the event bus
//! - `triggers`: trigger conditions and `when_*` helpers
//! - `effects`: effects, targets, and target selectors
//! - `abilities`: composable abilities and the named-ability factories
//! - `queue`: the prioritized action queue
//! - `choice`: player choices and the choice manager
//! - `modifiers`: conditional effects and cost modifiers
//! - `timing`: turn history, durations, automatic effects
//! - `rules`: the engine that drives all of the above

pub mod abilities;
pub mod cards;
pub mod choice;
pub mod core;
pub mod effects;
pub mod error;
pub mod events;
pub mod modifiers;
pub mod queue;
pub mod rules;
pub mod timing;
pub mod triggers;
pub mod zones;

// Re-export commonly used types
pub use crate::core::{EngineConfig, EntityId, GameRng, GameState, Phase, PlayerId, PlayerMap};

pub use crate::zones::{Zone, ZoneManager, ZonePosition};

pub use crate::cards::{AbilitySpec, CardDefinition, CardInstance, CardKind, Keyword, Stat};

pub use crate::events::{EventBus, EventContext, EventKind};

pub use crate::triggers::{TriggerCondition, TriggerContext};

pub use crate::effects::{ActionContext, CardFilter, Effect, Target, TargetSelector};

pub use crate::abilities::{AbilityBuilder, AbilityFactoryRegistry, ComposableAbility, ComposableListener};

pub use crate::queue::{ActionPriority, ActionQueue, ActionRequest, ActionResult};

pub use crate::choice::{ChoiceContext, ChoiceEffect, ChoiceManager};

pub use crate::modifiers::{ConditionalEffect, ConditionalEffectTracker, CostModifier, CostModifierManager};

pub use crate::timing::{AutomaticEffectRegistry, Duration, TurnTiming};

pub use crate::rules::RulesEngine;

pub use crate::error::{Result, RulesError};
