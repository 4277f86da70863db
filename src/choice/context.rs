//! Pending-choice records.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::effects::{ActionContext, Effect, Target};

/// What kind of decision a choice asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceType {
    YesNo,
    SelectFromList,
    SelectTargets,
    Custom,
}

/// One selectable answer.
#[derive(Clone, Debug)]
pub struct ChoiceOption {
    pub id: String,
    pub description: String,
    /// Enqueued when this option is chosen.
    pub effect: Effect,
    /// Overrides the choice's original target when set.
    pub target: Option<Target>,
    pub data: FxHashMap<String, i64>,
}

impl ChoiceOption {
    pub fn new(id: impl Into<String>, description: impl Into<String>, effect: Effect) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            effect,
            target: None,
            data: FxHashMap::default(),
        }
    }

    /// The "choose nothing" option, id `none`.
    pub fn none(description: impl Into<String>) -> Self {
        Self::new("none", description, Effect::NoEffect)
    }

    #[must_use]
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: i64) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// A decision the game is waiting on.
///
/// The id is assigned by [`ChoiceManager::queue_choice`](super::ChoiceManager::queue_choice).
/// `trigger_context` and `original_target` are what the chosen option's
/// effect runs with, unless the option overrides the target.
#[derive(Clone, Debug)]
pub struct ChoiceContext {
    pub choice_id: String,
    pub player: PlayerId,
    pub ability_name: Option<String>,
    pub prompt: String,
    pub choice_type: ChoiceType,
    pub options: Vec<ChoiceOption>,
    pub trigger_context: ActionContext,
    pub original_target: Target,

    // === Defaults ===
    /// Advisory only; nothing enforces it.
    pub timeout_seconds: Option<u32>,
    /// Option taken by `auto_resolve_with_defaults`.
    pub default_option: Option<String>,
}

impl ChoiceContext {
    pub fn new(player: PlayerId, prompt: impl Into<String>, choice_type: ChoiceType) -> Self {
        Self {
            choice_id: String::new(),
            player,
            ability_name: None,
            prompt: prompt.into(),
            choice_type,
            options: Vec::new(),
            trigger_context: ActionContext::default(),
            original_target: Target::None,
            timeout_seconds: None,
            default_option: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<ChoiceOption>) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_option(mut self, option: ChoiceOption) -> Self {
        self.options.push(option);
        self
    }

    #[must_use]
    pub fn with_trigger_context(mut self, context: ActionContext) -> Self {
        self.trigger_context = context;
        self
    }

    #[must_use]
    pub fn with_original_target(mut self, target: Target) -> Self {
        self.original_target = target;
        self
    }

    #[must_use]
    pub fn with_default(mut self, option_id: impl Into<String>) -> Self {
        self.default_option = Some(option_id.into());
        self
    }

    #[must_use]
    pub fn with_ability_name(mut self, name: impl Into<String>) -> Self {
        self.ability_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub fn option(&self, option_id: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Ability name, falling back to the prompt.
    #[must_use]
    pub fn label(&self) -> &str {
        self.ability_name.as_deref().unwrap_or(&self.prompt)
    }
}

/// How a choice was resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceResult {
    pub choice_id: String,
    pub option_id: String,
    pub player: PlayerId,
    /// The target the chosen effect was enqueued against.
    pub target: Target,
    pub ability_name: Option<String>,
}
