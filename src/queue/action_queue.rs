//! Priority-ordered action queue.
//!
//! Every state change in the engine passes through here: an effect is
//! wrapped in a `QueuedAction`, dequeued in priority order, applied, and
//! its declared events are dispatched through the bus. Listener responses
//! come back as `ActionRequest`s and are enqueued in turn.
//!
//! ## Ordering
//!
//! Actions dequeue by `ActionPriority` (Immediate first, Cleanup last).
//! Within one level, insertion order is preserved.
//!
//! ## Pausing
//!
//! When a targeted effect hands its target decision to a player, the
//! action goes back to the head of the queue marked with the choice id
//! and the queue pauses. Nothing is dequeued until
//! [`ActionQueue::resume_after_choice`] is called.
//!
//! ## Preview
//!
//! `process_next_action(env, false)` runs without mutating state: a
//! composite is split into sub-actions at the head, and a single effect
//! has its events computed against its original target and returned as
//! deferred instead of dispatched.

use std::collections::VecDeque;

use super::action::{ActionRequest, ActionResult, QueuedAction};
use super::priority::ActionPriority;
use crate::choice::ChoiceManager;
use crate::core::{EngineConfig, GameState};
use crate::effects::{Effect, EffectEnv, EffectOutcome};
use crate::error::Result;
use crate::events::EventBus;
use crate::timing::TurnTiming;

/// Borrowed engine parts the queue needs to process an action.
pub struct QueueEnv<'a> {
    pub state: &'a mut GameState,
    pub config: &'a EngineConfig,
    pub bus: Option<&'a EventBus>,
    pub choices: Option<&'a mut ChoiceManager>,
    pub timing: Option<&'a mut TurnTiming>,
}

impl<'a> QueueEnv<'a> {
    /// An environment with no bus, choices, or timing attached.
    #[must_use]
    pub fn new(state: &'a mut GameState, config: &'a EngineConfig) -> Self {
        Self {
            state,
            config,
            bus: None,
            choices: None,
            timing: None,
        }
    }

    #[must_use]
    pub fn with_bus(mut self, bus: &'a EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    #[must_use]
    pub fn with_choices(mut self, choices: &'a mut ChoiceManager) -> Self {
        self.choices = Some(choices);
        self
    }

    #[must_use]
    pub fn with_timing(mut self, timing: &'a mut TurnTiming) -> Self {
        self.timing = Some(timing);
        self
    }

    fn choice_paused(&self) -> bool {
        self.choices.as_ref().is_some_and(|c| c.is_paused())
    }
}

/// The engine's action queue.
///
/// ## Example
///
/// ```
/// use ccg_rules::core::{EngineConfig, GameState};
/// use ccg_rules::effects::{ActionContext, Effect, Target};
/// use ccg_rules::queue::{ActionPriority, ActionQueue, ActionRequest, QueueEnv};
///
/// let mut state = GameState::new(2, 0);
/// let config = EngineConfig::default();
/// let mut queue = ActionQueue::new();
///
/// queue.enqueue(ActionRequest::new(Effect::NoEffect, Target::None, ActionContext::default()));
/// queue.enqueue(
///     ActionRequest::new(Effect::NoEffect, Target::None, ActionContext::default())
///         .with_priority(ActionPriority::Immediate),
/// );
/// assert_eq!(queue.peek_next_action().unwrap().priority, ActionPriority::Immediate);
///
/// let results = queue.process_all_actions(&mut QueueEnv::new(&mut state, &config)).unwrap();
/// assert_eq!(results.len(), 2);
/// assert!(queue.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct ActionQueue {
    pending: VecDeque<QueuedAction>,
    history: VecDeque<ActionResult>,
    current: Option<QueuedAction>,
    paused: bool,
    next_id: u64,
    history_limit: usize,
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionQueue {
    /// An empty queue with the default history bound.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_limit(EngineConfig::HISTORY_LIMIT)
    }

    /// An empty queue sized from `config`.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_history_limit(config.history_limit)
    }

    #[must_use]
    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            history: VecDeque::new(),
            current: None,
            paused: false,
            next_id: 0,
            history_limit,
        }
    }

    // === Enqueue ===

    /// Queue a request, returning the new action's id.
    pub fn enqueue(&mut self, request: ActionRequest) -> String {
        self.next_id += 1;
        let id = format!("action_{}", self.next_id);
        tracing::debug!(%id, priority = %request.priority, description = %request.description, "enqueue");
        self.insert(QueuedAction {
            id: id.clone(),
            effect: request.effect,
            target: request.target,
            context: request.context,
            priority: request.priority,
            description: request.description,
            waiting_choice: None,
        });
        id
    }

    /// Queue several requests in order.
    pub fn enqueue_multiple(&mut self, requests: impl IntoIterator<Item = ActionRequest>) -> Vec<String> {
        requests.into_iter().map(|r| self.enqueue(r)).collect()
    }

    fn insert(&mut self, action: QueuedAction) {
        if action.priority == ActionPriority::Cleanup {
            self.pending.push_back(action);
            return;
        }
        // Before the first entry of strictly lower priority.
        match self.pending.iter().position(|queued| queued.priority > action.priority) {
            Some(index) => self.pending.insert(index, action),
            None => self.pending.push_back(action),
        }
    }

    // === Processing ===

    /// Dequeue and process the next action.
    ///
    /// Returns `Ok(None)` when the queue is paused, a choice is pending,
    /// the queue is empty, or the action was held back for a target
    /// choice. An error from the effect is recorded as a failed result in
    /// the history and then returned.
    pub fn process_next_action(&mut self, env: &mut QueueEnv<'_>, apply_effect: bool) -> Result<Option<ActionResult>> {
        if self.paused || env.choice_paused() {
            return Ok(None);
        }
        let Some(mut action) = self.pending.pop_front() else {
            return Ok(None);
        };

        if !apply_effect {
            return Ok(Some(self.preview(action)));
        }

        self.current = Some(action.clone());
        tracing::debug!(id = %action.id, effect = action.effect.kind_name(), "process action");

        let applied = {
            let mut effect_env = EffectEnv {
                state: &mut *env.state,
                context: &mut action.context,
                config: env.config,
                choices: env.choices.as_deref_mut(),
                timing: env.timing.as_deref_mut(),
            };
            action.effect.apply(&action.target, &mut effect_env)
        };

        let outcome = match applied {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(id = %action.id, %err, "action failed");
                self.current = None;
                self.push_history(ActionResult::failure(action.id.clone(), err.to_string()).for_action(&action));
                return Err(err);
            }
        };

        if self.holds_for_choice(&action, &outcome, env) {
            action.waiting_choice = env.choices.as_ref().and_then(|c| c.latest_choice_id()).map(str::to_owned);
            tracing::debug!(id = %action.id, choice = ?action.waiting_choice, "action waiting on choice");
            self.pending.push_front(action);
            self.paused = true;
            self.current = None;
            return Ok(None);
        }

        let mut result = ActionResult::success(action.id.clone(), outcome.result.clone()).for_action(&action);
        for mut event in action.effect.events(&action.target, &outcome, &action.context) {
            if let Some(timing) = env.timing.as_deref_mut() {
                timing.record_event(&event);
            }
            if let Some(bus) = env.bus {
                let responses = bus.dispatch(&mut event, &*env.state, env.config);
                self.enqueue_multiple(responses);
            }
            result.events_emitted.push(event);
        }

        self.current = None;
        self.push_history(result.clone());
        Ok(Some(result))
    }

    /// A targeted effect that changed nothing while a choice is pending
    /// handed its decision to a player.
    fn holds_for_choice(&self, action: &QueuedAction, outcome: &EffectOutcome, env: &QueueEnv<'_>) -> bool {
        action.effect.as_targeted().is_some() && outcome.result == action.target && env.choice_paused()
    }

    fn preview(&mut self, action: QueuedAction) -> ActionResult {
        if let Effect::Composite(steps) = &action.effect {
            // Split at the head, keeping the original order.
            for (i, step) in steps.iter().enumerate().rev() {
                self.pending.push_front(QueuedAction {
                    id: format!("{}_sub_{i}", action.id),
                    effect: step.clone(),
                    target: action.target.clone(),
                    context: action.context.clone(),
                    priority: action.priority,
                    description: step.describe(),
                    waiting_choice: None,
                });
            }
            tracing::debug!(id = %action.id, parts = steps.len(), "composite split for preview");
            return match self.pending.pop_front() {
                Some(first) => self.preview(first),
                None => ActionResult::success(action.id.clone(), action.target.clone()).for_action(&action),
            };
        }

        let declared = EffectOutcome::unchanged(action.target.clone());
        let mut result = ActionResult::success(action.id.clone(), action.target.clone()).for_action(&action);
        result.deferred_events = action.effect.events(&action.target, &declared, &action.context);
        result.deferred_action = Some(action);
        result
    }

    /// Process actions until the queue empties, pauses, or a choice is pending.
    pub fn process_all_actions(&mut self, env: &mut QueueEnv<'_>) -> Result<Vec<ActionResult>> {
        let mut results = Vec::new();
        while !self.pending.is_empty() {
            match self.process_next_action(env, true)? {
                Some(result) => results.push(result),
                None => break,
            }
        }
        Ok(results)
    }

    fn push_history(&mut self, result: ActionResult) {
        self.history.push_back(result);
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
    }

    // === Pause / Resume ===

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Remove the action waiting on `choice_id` and unpause.
    ///
    /// The pause is cleared even when no action waits on the id.
    pub fn resume_after_choice(&mut self, choice_id: &str) -> Option<QueuedAction> {
        self.paused = false;
        let index = self
            .pending
            .iter()
            .position(|a| a.waiting_choice.as_deref() == Some(choice_id))?;
        self.pending.remove(index)
    }

    // === Inspection ===

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Pending actions in dequeue order.
    #[must_use]
    pub fn pending_actions(&self) -> Vec<&QueuedAction> {
        self.pending.iter().collect()
    }

    #[must_use]
    pub fn peek_next_action(&self) -> Option<&QueuedAction> {
        self.pending.front()
    }

    /// The action being processed, if any.
    #[must_use]
    pub fn current_action(&self) -> Option<&QueuedAction> {
        self.current.as_ref()
    }

    /// Results in execution order; with `limit`, only the most recent.
    #[must_use]
    pub fn execution_history(&self, limit: Option<usize>) -> Vec<&ActionResult> {
        let skip = limit.map_or(0, |n| self.history.len().saturating_sub(n));
        self.history.iter().skip(skip).collect()
    }

    /// Remove a pending action by id.
    pub fn remove_action(&mut self, id: &str) -> bool {
        match self.pending.iter().position(|a| a.id == id) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop pending actions and history, and unpause.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.history.clear();
        self.current = None;
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardDefinition;
    use crate::core::{EntityId, PlayerId};
    use crate::effects::{ActionContext, Target, TargetSelector};
    use crate::error::RulesError;
    use crate::events::EventKind;
    use crate::zones::Zone;

    fn request(effect: Effect, priority: ActionPriority) -> ActionRequest {
        ActionRequest::new(effect, Target::None, ActionContext::default()).with_priority(priority)
    }

    fn setup() -> (GameState, EntityId) {
        let mut state = GameState::new(2, 0);
        let card = state.add_card(CardDefinition::character("Hero", 2, 1, 4, 1), PlayerId::new(0), Zone::Play);
        (state, card)
    }

    #[test]
    fn test_priority_ordering() {
        let mut queue = ActionQueue::new();
        let low = queue.enqueue(request(Effect::NoEffect, ActionPriority::Low));
        let cleanup = queue.enqueue(request(Effect::NoEffect, ActionPriority::Cleanup));
        let normal = queue.enqueue(request(Effect::NoEffect, ActionPriority::Normal));
        let immediate = queue.enqueue(request(Effect::NoEffect, ActionPriority::Immediate));
        let high = queue.enqueue(request(Effect::NoEffect, ActionPriority::High));

        let order: Vec<&str> = queue.pending_actions().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(order, vec![&immediate, &high, &normal, &low, &cleanup]);
    }

    #[test]
    fn test_ties_preserve_insertion_order() {
        let mut queue = ActionQueue::new();
        let a = queue.enqueue(request(Effect::NoEffect, ActionPriority::High));
        let b = queue.enqueue(request(Effect::NoEffect, ActionPriority::High));
        let c = queue.enqueue(request(Effect::NoEffect, ActionPriority::Immediate));
        let d = queue.enqueue(request(Effect::NoEffect, ActionPriority::Immediate));

        let order: Vec<&str> = queue.pending_actions().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(order, vec![&c, &d, &a, &b]);
    }

    #[test]
    fn test_process_applies_and_records_events() {
        let (mut state, card) = setup();
        let config = EngineConfig::default();
        let mut queue = ActionQueue::new();
        queue.enqueue(ActionRequest::new(Effect::damage(2), Target::Card(card), ActionContext::default()));

        let result = queue
            .process_next_action(&mut QueueEnv::new(&mut state, &config), true)
            .unwrap()
            .unwrap();
        assert!(result.success);
        assert_eq!(state.card(card).unwrap().damage, 2);
        assert_eq!(result.events_emitted.len(), 1);
        assert_eq!(result.events_emitted[0].kind, EventKind::CharacterTakesDamage);
        assert_eq!(queue.execution_history(None).len(), 1);
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let (mut state, card) = setup();
        let config = EngineConfig::default();
        let mut queue = ActionQueue::new();
        queue.enqueue(ActionRequest::new(Effect::damage(2), Target::Card(card), ActionContext::default()));

        let result = queue
            .process_next_action(&mut QueueEnv::new(&mut state, &config), false)
            .unwrap()
            .unwrap();
        assert_eq!(state.card(card).unwrap().damage, 0);
        assert!(result.events_emitted.is_empty());
        assert_eq!(result.deferred_events.len(), 1);
        assert_eq!(result.deferred_events[0].data.amount, Some(2));
        assert!(result.deferred_action.is_some());
    }

    #[test]
    fn test_preview_splits_composite() {
        let (mut state, card) = setup();
        let config = EngineConfig::default();
        let mut queue = ActionQueue::new();
        let id = queue.enqueue(ActionRequest::new(
            Effect::damage(1).then(Effect::Exert).then(Effect::GainLore(1)),
            Target::Card(card),
            ActionContext::default(),
        ));

        let result = queue
            .process_next_action(&mut QueueEnv::new(&mut state, &config), false)
            .unwrap()
            .unwrap();
        assert_eq!(result.action_id, format!("{id}_sub_0"));
        let remaining: Vec<&str> = queue.pending_actions().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(remaining, vec![format!("{id}_sub_1"), format!("{id}_sub_2")]);
    }

    #[test]
    fn test_paused_queue_does_nothing() {
        let (mut state, _) = setup();
        let config = EngineConfig::default();
        let mut queue = ActionQueue::new();
        queue.enqueue(request(Effect::GainLore(1), ActionPriority::Normal));
        queue.pause();

        let mut env = QueueEnv::new(&mut state, &config);
        assert!(queue.process_next_action(&mut env, true).unwrap().is_none());
        assert_eq!(queue.pending_count(), 1);

        queue.resume();
        assert!(queue.process_next_action(&mut env, true).unwrap().is_some());
    }

    #[test]
    fn test_failure_is_recorded_and_returned() {
        let mut state = GameState::new(2, 0);
        let config = EngineConfig::default();
        let mut queue = ActionQueue::new();
        queue.enqueue(ActionRequest::new(
            Effect::damage(1),
            Target::Card(EntityId::new(404)),
            ActionContext::default(),
        ));

        let err = queue
            .process_next_action(&mut QueueEnv::new(&mut state, &config), true)
            .unwrap_err();
        assert!(matches!(err, RulesError::UnknownEntity(_)));

        let history = queue.execution_history(None);
        assert_eq!(history.len(), 1);
        assert!(!history[0].success);
        assert!(history[0].error.is_some());
        assert!(queue.current_action().is_none());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut state = GameState::new(2, 0);
        let config = EngineConfig::default();
        let mut queue = ActionQueue::with_history_limit(3);
        for _ in 0..5 {
            queue.enqueue(request(Effect::NoEffect, ActionPriority::Normal));
        }
        queue.process_all_actions(&mut QueueEnv::new(&mut state, &config)).unwrap();

        let history = queue.execution_history(None);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].action_id, "action_3");
        assert_eq!(queue.execution_history(Some(1))[0].action_id, "action_5");
    }

    #[test]
    fn test_remove_and_clear() {
        let mut queue = ActionQueue::new();
        let id = queue.enqueue(request(Effect::NoEffect, ActionPriority::Normal));
        queue.enqueue(request(Effect::NoEffect, ActionPriority::Normal));

        assert!(queue.remove_action(&id));
        assert!(!queue.remove_action(&id));
        assert_eq!(queue.pending_count(), 1);

        queue.pause();
        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.is_paused());
    }

    #[test]
    fn test_resume_after_unknown_choice_clears_pause() {
        let mut queue = ActionQueue::new();
        queue.pause();
        assert!(queue.resume_after_choice("choice_9").is_none());
        assert!(!queue.is_paused());
    }

    #[test]
    fn test_targeted_action_holds_at_head_while_choice_pending() {
        let (mut state, me) = setup();
        let foes = [
            state.add_card(CardDefinition::character("Foe A", 1, 1, 3, 1), PlayerId::new(1), Zone::Play),
            state.add_card(CardDefinition::character("Foe B", 1, 1, 3, 1), PlayerId::new(1), Zone::Play),
        ];
        let config = EngineConfig::default();
        let mut choices = ChoiceManager::new();
        let mut queue = ActionQueue::new();
        let id = queue.enqueue(ActionRequest::new(
            Effect::targeted(TargetSelector::enemy_character(), Effect::Exert),
            Target::None,
            ActionContext::for_ability(me, "TEST"),
        ));

        {
            let mut env = QueueEnv::new(&mut state, &config).with_choices(&mut choices);
            assert!(queue.process_next_action(&mut env, true).unwrap().is_none());
            assert!(queue.process_next_action(&mut env, true).unwrap().is_none());
        }

        let choice_id = choices.latest_choice_id().unwrap().to_owned();
        let head = queue.peek_next_action().unwrap();
        assert_eq!(head.id, id);
        assert_eq!(head.waiting_choice.as_deref(), Some(choice_id.as_str()));
        assert!(queue.is_paused());
        assert_eq!(queue.pending_count(), 1);
        assert!(queue.execution_history(None).is_empty());
        assert!(foes.iter().all(|f| !state.card(*f).unwrap().exerted));

        let held = queue.resume_after_choice(&choice_id).unwrap();
        assert_eq!(held.id, id);
        assert!(queue.is_empty());
    }
}
