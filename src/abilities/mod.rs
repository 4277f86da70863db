//! Composable abilities.
//!
//! ## Key Components
//!
//! - [`ComposableListener`]: trigger condition + target selector + effect
//! - [`ComposableAbility`]: a card's ordered listeners and the zones it is
//!   active in
//! - [`AbilityBuilder`]: fluent construction
//! - [`AbilityFactoryRegistry`]: name → factory table for card loading
//!
//! ## Two-Stage Triggers
//!
//! Listeners never resolve their effects while an event is being
//! dispatched. They freeze targets and return [`ActionRequest`]s, and the
//! action queue applies them in global priority order. Only event-rewriting
//! effects (prevent, reduce damage, retarget) act during dispatch.
//!
//! ```
//! use ccg_rules::abilities::AbilityBuilder;
//! use ccg_rules::cards::CardDefinition;
//! use ccg_rules::core::{EngineConfig, GameState, PlayerId};
//! use ccg_rules::effects::Effect;
//! use ccg_rules::events::{EventContext, EventKind};
//! use ccg_rules::queue::ActionPriority;
//! use ccg_rules::triggers::when_quests;
//! use ccg_rules::zones::Zone;
//!
//! let mut state = GameState::new(2, 7);
//! let hero = state.add_card(CardDefinition::character("Hero", 3, 2, 4, 1), PlayerId::new(0), Zone::Play);
//!
//! let ability = AbilityBuilder::new("INSPIRING", hero)
//!     .when(when_quests(hero))
//!     .apply(Effect::GainLore(1))
//!     .build();
//!
//! let mut event = EventContext::new(EventKind::CharacterQuests).with_source(hero);
//! let requests = ability.handle_event(&mut event, &state, &EngineConfig::default());
//! assert_eq!(requests.len(), 1);
//! assert_eq!(requests[0].priority, ActionPriority::High);
//! ```
//!
//! [`ActionRequest`]: crate::queue::ActionRequest

mod ability;
mod factory;
mod listener;

pub use ability::{AbilityBuilder, ComposableAbility};
pub use factory::{AbilityFactory, AbilityFactoryRegistry};
pub use listener::ComposableListener;
