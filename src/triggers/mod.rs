//! Trigger conditions for event-driven abilities.
//!
//! ## Key Components
//!
//! - [`TriggerCondition`]: when a listener reacts, plus the event kinds it
//!   declares so the bus can index it
//! - [`TriggerContext`]: the event, the state, and the listening card
//! - `when_*` helpers for the common cases
//!
//! ## Example Usage
//!
//! ```
//! use ccg_rules::cards::CardDefinition;
//! use ccg_rules::core::{GameState, PlayerId};
//! use ccg_rules::events::{EventContext, EventKind};
//! use ccg_rules::triggers::{when_any_quests, when_quests, TriggerContext};
//! use ccg_rules::zones::Zone;
//!
//! let mut state = GameState::new(2, 42);
//! let hero = state.add_card(CardDefinition::character("Hero", 3, 2, 4, 2), PlayerId::new(0), Zone::Play);
//!
//! // "Whenever this character quests" or "whenever anyone quests".
//! let trigger = when_quests(hero).or(when_any_quests());
//! assert_eq!(trigger.relevant_events(), vec![EventKind::CharacterQuests]);
//!
//! let event = EventContext::new(EventKind::CharacterQuests).with_source(hero);
//! assert!(trigger.check(&TriggerContext::new(&event, &state)));
//! ```

mod condition;
mod helpers;

pub use condition::{CustomTrigger, TriggerCondition, TriggerContext, TriggerFn};
pub use helpers::{
    when_action_played, when_any_enters_play, when_any_quests, when_any_takes_damage, when_banished,
    when_banished_in_challenge, when_card_drawn, when_challenged, when_challenges, when_deals_damage,
    when_enters_play, when_event, when_ink_played, when_item_played, when_leaves_play, when_lore_gained,
    when_quests, when_song_played, when_song_sung, when_subtype_enters_play, when_takes_damage,
    when_turn_begins, when_turn_ends,
};
