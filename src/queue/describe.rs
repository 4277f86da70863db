//! Human-readable step descriptions for processed actions.

use serde::Serialize;

use super::action::ActionResult;
use crate::core::GameState;
use crate::effects::Target;
use crate::events::EventKind;

/// One processed action, summarized for a presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepDescription {
    /// The action's description, or its id when it has none.
    pub step: String,
    pub effect: &'static str,
    pub target: String,
    pub success: bool,
    pub error: Option<String>,
    pub events: Vec<EventKind>,
}

impl std::fmt::Display for StepDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.step, self.target)?;
        if let Some(error) = &self.error {
            return write!(f, " (failed: {error})");
        }
        if !self.events.is_empty() {
            let names: Vec<&str> = self.events.iter().map(|k| k.name()).collect();
            write!(f, " [{}]", names.join(", "))?;
        }
        Ok(())
    }
}

/// Summarize a processed action, naming cards through `state`.
///
/// Deferred (preview) events are listed when nothing was dispatched.
#[must_use]
pub fn describe_step(result: &ActionResult, state: &GameState) -> StepDescription {
    let step = if result.description.is_empty() {
        result.action_id.clone()
    } else {
        result.description.clone()
    };
    let events = if result.events_emitted.is_empty() {
        &result.deferred_events
    } else {
        &result.events_emitted
    };
    StepDescription {
        step,
        effect: result.effect_kind,
        target: target_label(&result.target, state),
        success: result.success,
        error: result.error.clone(),
        events: events.iter().map(|e| e.kind).collect(),
    }
}

fn target_label(target: &Target, state: &GameState) -> String {
    let name = |id| state.get_card(id).map_or_else(|| id.to_string(), |c| c.definition.name.clone());
    match target {
        Target::Card(id) => name(*id),
        Target::Cards(ids) => ids.iter().map(|id| name(*id)).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
