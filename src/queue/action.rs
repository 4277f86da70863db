//! Queued actions and their results.

use super::priority::ActionPriority;
use crate::effects::{ActionContext, Effect, Target};
use crate::events::EventContext;

/// Work to be enqueued: an effect, its target, and its context.
///
/// Listeners, choice resolution, and turn timing all produce requests;
/// only the queue turns them into `QueuedAction`s.
#[derive(Clone, Debug)]
pub struct ActionRequest {
    pub effect: Effect,
    pub target: Target,
    pub context: ActionContext,
    pub priority: ActionPriority,
    pub description: String,
}

impl ActionRequest {
    /// A Normal-priority request described by its effect.
    #[must_use]
    pub fn new(effect: Effect, target: Target, context: ActionContext) -> Self {
        let description = effect.describe();
        Self {
            effect,
            target,
            context,
            priority: ActionPriority::Normal,
            description,
        }
    }

    /// Set the priority (builder pattern).
    #[must_use]
    pub fn with_priority(mut self, priority: ActionPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the description (builder pattern).
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An action waiting in (or taken from) the queue.
#[derive(Clone, Debug)]
pub struct QueuedAction {
    /// `action_{n}`, or `{parent}_sub_{i}` for preview sub-actions.
    pub id: String,
    pub effect: Effect,
    pub target: Target,
    /// Owned by this action while it executes.
    pub context: ActionContext,
    pub priority: ActionPriority,
    pub description: String,
    /// Set when the action is held at the head for a target choice.
    pub waiting_choice: Option<String>,
}

/// What processing one action produced.
#[derive(Clone, Debug)]
pub struct ActionResult {
    pub action_id: String,
    /// The processed action's description.
    pub description: String,
    /// `Effect::kind_name` of the processed effect.
    pub effect_kind: &'static str,
    /// The target the action was queued against.
    pub target: Target,
    pub success: bool,
    /// The effect's result target.
    pub result: Target,
    /// Events dispatched through the bus.
    pub events_emitted: Vec<EventContext>,
    pub error: Option<String>,

    // === Preview ===
    /// Events declared but not dispatched (preview mode only).
    pub deferred_events: Vec<EventContext>,
    /// The action that was previewed instead of applied.
    pub deferred_action: Option<QueuedAction>,
}

impl ActionResult {
    /// A successful result.
    #[must_use]
    pub fn success(action_id: impl Into<String>, result: Target) -> Self {
        Self {
            action_id: action_id.into(),
            description: String::new(),
            effect_kind: "",
            target: Target::None,
            success: true,
            result,
            events_emitted: Vec::new(),
            error: None,
            deferred_events: Vec::new(),
            deferred_action: None,
        }
    }

    /// A failed result.
    #[must_use]
    pub fn failure(action_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::success(action_id, Target::None)
        }
    }

    /// Copy the action's description, effect kind, and target.
    #[must_use]
    pub fn for_action(mut self, action: &QueuedAction) -> Self {
        self.description = action.description.clone();
        self.effect_kind = action.effect.kind_name();
        self.target = action.target.clone();
        self
    }
}
