//! Composable listeners.
//!
//! A listener binds a trigger condition, a target selector and an effect.
//! When it fires it does not run its effect: it freezes its targets and
//! hands back an [`ActionRequest`] for the queue.

use std::fmt;

use crate::core::{EngineConfig, EntityId, GameState};
use crate::effects::{ActionContext, Effect, SelectionContext, Target, TargetSelector};
use crate::events::EventContext;
use crate::queue::{ActionPriority, ActionRequest};
use crate::triggers::{TriggerCondition, TriggerContext};

/// One trigger of a composable ability.
#[derive(Clone, Debug)]
pub struct ComposableListener {
    pub name: String,
    pub condition: TriggerCondition,
    pub selector: TargetSelector,
    pub effect: Effect,
    /// Order among listeners of the same ability (higher first).
    pub priority: i32,
    /// Queue priority of the work this listener produces.
    pub action_priority: ActionPriority,
}

impl ComposableListener {
    pub fn new(name: impl Into<String>, condition: TriggerCondition, selector: TargetSelector, effect: Effect) -> Self {
        Self {
            name: name.into(),
            condition,
            selector,
            effect,
            priority: 0,
            action_priority: ActionPriority::High,
        }
    }

    /// Set the listener priority (builder pattern).
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the queue priority of produced work (builder pattern).
    #[must_use]
    pub fn with_action_priority(mut self, priority: ActionPriority) -> Self {
        self.action_priority = priority;
        self
    }

    /// Does this listener react to `event`? Condition faults count as no.
    #[must_use]
    pub fn should_trigger(&self, event: &EventContext, state: &GameState, owner: EntityId) -> bool {
        self.condition
            .check(&TriggerContext::new(event, state).with_owner(owner))
    }

    /// Turn a trigger into queued work.
    ///
    /// Targets are frozen now. A selector that needs a player decision is
    /// deferred instead: the effect is wrapped so the target choice is made
    /// when the action runs, in queue order.
    pub(crate) fn request(
        &self,
        ability: &str,
        owner: EntityId,
        event: &EventContext,
        state: &GameState,
        config: &EngineConfig,
    ) -> ActionRequest {
        let mut event = event.clone();
        event.data.ability_owner = Some(owner);
        let context = ActionContext::for_ability(owner, ability).with_event(event);

        let (effect, target) = {
            let sel = SelectionContext::new(state, &context, config.select_all);
            if self.selector.requires_choice(&sel) {
                (Effect::targeted(self.selector.clone(), self.effect.clone()), Target::None)
            } else {
                (self.effect.clone(), Target::from_cards(self.selector.select(&sel)))
            }
        };

        let description = format!("{ability}: {}", effect.describe());
        ActionRequest::new(Effect::ability_trigger(ability, &self.name, effect), target, context)
            .with_priority(self.action_priority)
            .with_description(description)
    }
}

impl fmt::Display for ComposableListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.name, self.selector, self.effect.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardDefinition;
    use crate::core::PlayerId;
    use crate::effects::CardFilter;
    use crate::events::EventKind;
    use crate::triggers::when_quests;
    use crate::zones::Zone;

    fn setup() -> (GameState, EntityId, Vec<EntityId>) {
        let mut state = GameState::new(2, 0);
        let hero = state.add_card(CardDefinition::character("Hero", 3, 2, 4, 1), PlayerId::new(0), Zone::Play);
        let foes = vec![
            state.add_card(CardDefinition::character("Foe A", 2, 1, 2, 1), PlayerId::new(1), Zone::Play),
            state.add_card(CardDefinition::character("Foe B", 2, 1, 2, 1), PlayerId::new(1), Zone::Play),
        ];
        (state, hero, foes)
    }

    #[test]
    fn test_request_freezes_targets() {
        let (state, hero, foes) = setup();
        let listener = ComposableListener::new(
            "exert foes",
            when_quests(hero),
            TargetSelector::all_enemy_characters(),
            Effect::Exert,
        );
        let event = EventContext::new(EventKind::CharacterQuests).with_source(hero);

        assert!(listener.should_trigger(&event, &state, hero));
        let request = listener.request("RALLY", hero, &event, &state, &EngineConfig::default());

        assert_eq!(request.priority, ActionPriority::High);
        assert_eq!(request.target, Target::Cards(foes));
        assert_eq!(request.context.source, Some(hero));
        assert_eq!(request.context.ability_name.as_deref(), Some("RALLY"));
        let carried = request.context.event.as_ref().unwrap();
        assert_eq!(carried.data.ability_owner, Some(hero));
        assert!(matches!(request.effect, Effect::AbilityTrigger(_)));
    }

    #[test]
    fn test_ambiguous_selector_defers_targeting() {
        let (state, hero, _) = setup();
        let listener = ComposableListener::new(
            "exert one",
            when_quests(hero),
            TargetSelector::character(CardFilter::Enemy),
            Effect::Exert,
        )
        .with_action_priority(ActionPriority::Normal);
        let event = EventContext::new(EventKind::CharacterQuests).with_source(hero);

        let request = listener.request("PICK", hero, &event, &state, &EngineConfig::default());

        assert_eq!(request.target, Target::None);
        assert_eq!(request.priority, ActionPriority::Normal);
        assert!(request.effect.as_targeted().is_some());
        assert!(request.effect.is_choice_producing());
    }

    #[test]
    fn test_other_card_does_not_trigger() {
        let (state, hero, foes) = setup();
        let listener = ComposableListener::new("x", when_quests(hero), TargetSelector::SelfCard, Effect::Ready);
        let event = EventContext::new(EventKind::CharacterQuests).with_source(foes[0]);
        assert!(!listener.should_trigger(&event, &state, hero));
    }
}
