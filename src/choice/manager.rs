//! Pause points for player decisions.
//!
//! A choice-producing effect builds a [`ChoiceContext`] and hands it to
//! [`ChoiceManager::queue_choice`], which pauses the game. Choices resolve
//! strictly in the order they were queued. Resolving one never runs its
//! effect inline: the chosen option's effect is enqueued at High priority
//! on the action queue, so it is ordered against everything else like any
//! other action.
//!
//! ## Example
//!
//! ```
//! use ccg_rules::choice::{ChoiceContext, ChoiceManager, ChoiceOption, ChoiceType};
//! use ccg_rules::core::PlayerId;
//! use ccg_rules::effects::Effect;
//! use ccg_rules::queue::ActionQueue;
//!
//! let mut choices = ChoiceManager::new();
//! let mut queue = ActionQueue::new();
//!
//! let id = choices.queue_choice(
//!     ChoiceContext::new(PlayerId::new(0), "Draw a card?", ChoiceType::YesNo)
//!         .with_option(ChoiceOption::new("yes", "Yes", Effect::Draw(1)))
//!         .with_option(ChoiceOption::none("No"))
//!         .with_default("none"),
//! );
//! assert!(choices.is_paused());
//!
//! assert!(choices.provide_choice(&id, "yes", Some(&mut queue)));
//! assert!(!choices.is_paused());
//! assert_eq!(queue.pending_count(), 1);
//!
//! // A choice resolves once.
//! assert!(!choices.provide_choice(&id, "yes", Some(&mut queue)));
//! ```

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::context::{ChoiceContext, ChoiceResult};
use crate::effects::{Effect, Target};
use crate::events::{EventContext, EventKind};
use crate::queue::{ActionPriority, ActionQueue, ActionRequest};

/// FIFO of pending choices plus the results of resolved ones.
#[derive(Clone, Debug, Default)]
pub struct ChoiceManager {
    pending: VecDeque<ChoiceContext>,
    results: FxHashMap<String, ChoiceResult>,
    counter: u64,
    paused: bool,
    latest: Option<String>,
}

impl ChoiceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an id, queue the choice, and pause the game.
    pub fn queue_choice(&mut self, mut choice: ChoiceContext) -> String {
        self.counter += 1;
        let id = format!("choice_{}", self.counter);
        choice.choice_id = id.clone();
        choice.trigger_context.choice_id = Some(id.clone());
        tracing::debug!(%id, player = %choice.player, prompt = %choice.prompt, "choice queued");

        self.pending.push_back(choice);
        self.paused = true;
        self.latest = Some(id.clone());
        id
    }

    /// Id of the most recently queued choice.
    #[must_use]
    pub fn latest_choice_id(&self) -> Option<&str> {
        self.latest.as_deref()
    }

    /// The choice awaiting an answer: the oldest pending one.
    #[must_use]
    pub fn get_current_choice(&self) -> Option<&ChoiceContext> {
        self.pending.front()
    }

    #[must_use]
    pub fn has_pending_choices(&self) -> bool {
        !self.pending.is_empty()
    }

    #[must_use]
    pub fn pending_choices(&self) -> Vec<&ChoiceContext> {
        self.pending.iter().collect()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Resolve the current choice with `option_id`.
    ///
    /// Returns `false`, changing nothing, when `choice_id` is not the
    /// current choice or the option does not exist. On success the chosen
    /// effect is enqueued at High priority against the option's target (or
    /// the choice's original target). Without a queue the effect is
    /// dropped with a warning and the choice still resolves.
    pub fn provide_choice(&mut self, choice_id: &str, option_id: &str, queue: Option<&mut ActionQueue>) -> bool {
        let Some(current) = self.pending.front() else {
            tracing::warn!(choice_id, "no pending choice to resolve");
            return false;
        };
        if current.choice_id != choice_id {
            tracing::warn!(choice_id, current = %current.choice_id, "choice is not current");
            return false;
        }
        let Some(option) = current.option(option_id) else {
            tracing::warn!(choice_id, option_id, "unknown choice option");
            return false;
        };

        let target = option.target.clone().unwrap_or_else(|| current.original_target.clone());
        let mut context = current.trigger_context.clone();
        if option.target.is_some() {
            context.selected_target = Some(target.clone());
        }

        if !matches!(option.effect, Effect::NoEffect) {
            match queue {
                Some(queue) => {
                    queue.enqueue(
                        ActionRequest::new(option.effect.clone(), target.clone(), context)
                            .with_priority(ActionPriority::High)
                            .with_description(format!("Choice: {}", current.label())),
                    );
                }
                None => tracing::warn!(choice_id, "no action queue for choice resolution; effect not executed"),
            }
        }

        let result = ChoiceResult {
            choice_id: choice_id.to_owned(),
            option_id: option_id.to_owned(),
            player: current.player,
            target,
            ability_name: current.ability_name.clone(),
        };
        tracing::debug!(choice_id, option_id, "choice resolved");
        self.results.insert(result.choice_id.clone(), result);

        self.pending.pop_front();
        if self.pending.is_empty() {
            self.paused = false;
        }
        true
    }

    /// Resolve every pending choice with its default option, dropping
    /// those without one. Always unpauses. Returns the number resolved.
    pub fn auto_resolve_with_defaults(&mut self, mut queue: Option<&mut ActionQueue>) -> usize {
        let mut resolved = 0;
        while let Some(current) = self.pending.front() {
            let id = current.choice_id.clone();
            let resolved_now = match current.default_option.clone() {
                Some(default) => self.provide_choice(&id, &default, queue.as_deref_mut()),
                None => false,
            };
            if resolved_now {
                resolved += 1;
            } else {
                tracing::debug!(choice_id = %id, "choice dropped without default");
                self.pending.pop_front();
            }
        }
        self.paused = false;
        resolved
    }

    /// Drop all pending choices and unpause. Results are kept.
    pub fn clear_all_choices(&mut self) {
        self.pending.clear();
        self.paused = false;
    }

    #[must_use]
    pub fn choice_result(&self, choice_id: &str) -> Option<&ChoiceResult> {
        self.results.get(choice_id)
    }

    /// The Choice Made event for a resolved choice.
    #[must_use]
    pub fn choice_made_event(&self, choice_id: &str) -> Option<EventContext> {
        let result = self.results.get(choice_id)?;
        let mut event = EventContext::new(EventKind::ChoiceMade).with_player(result.player);
        if let Target::Card(card) = result.target {
            event = event.with_target(card);
        }
        if let Some(name) = &result.ability_name {
            event = event.with_ability_name(name.clone());
        }
        event.data.choice_id = Some(result.choice_id.clone());
        Some(event)
    }
}
