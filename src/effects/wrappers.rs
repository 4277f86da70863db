//! Scheduling wrappers.
//!
//! - `AbilityTrigger` marks work a listener produced, so the queue and the
//!   step formatter can name the ability behind an action.
//! - `TargetedEffect` defers target resolution to apply time. When the
//!   selector needs a decision and a choice manager is reachable, it queues
//!   a target choice and reports its target unchanged; the queue takes that
//!   as the signal to hold the action at its head. A target choice picks
//!   one card; a selector asking for several resolves one target per
//!   choice.

use super::context::{EffectEnv, EffectOutcome};
use super::effect::{record_step, Effect};
use super::target::Target;
use super::targeting::{SelectionContext, TargetSelector};
use crate::choice::{ChoiceContext, ChoiceOption, ChoiceType};
use crate::core::EntityId;
use crate::error::Result;

/// Marker around the effect a triggered listener enqueued.
#[derive(Clone, Debug)]
pub struct AbilityTrigger {
    pub ability: String,
    pub listener: String,
    pub effect: Effect,
}

/// An effect whose targets are selected when it applies.
#[derive(Clone, Debug)]
pub struct TargetedEffect {
    pub selector: TargetSelector,
    pub effect: Effect,
}

impl TargetedEffect {
    pub fn apply(&self, target: &Target, env: &mut EffectEnv<'_>) -> Result<EffectOutcome> {
        let mut outcome = EffectOutcome::unchanged(target.clone());

        if let Some(selected) = env.context.selected_target.clone() {
            outcome.result = record_step(&mut outcome, &self.effect, selected, env)?;
            return Ok(outcome);
        }

        let (candidates, picked, needs_choice) = {
            let sel = SelectionContext::new(env.state, env.context, env.config.select_all);
            (
                self.selector.candidates(&sel),
                self.selector.select(&sel),
                self.selector.requires_choice(&sel),
            )
        };

        if needs_choice && candidates.is_empty() {
            tracing::debug!(selector = %self.selector, "choice has no candidates");
            return Ok(outcome);
        }

        if needs_choice && env.choices.is_some() {
            let choice = self.target_choice(target, &candidates, env);
            if let Some(choices) = env.choices() {
                choices.queue_choice(choice);
            }
            return Ok(outcome);
        }

        if picked.is_empty() {
            tracing::debug!(selector = %self.selector, "no targets");
            return Ok(outcome);
        }
        outcome.result = record_step(&mut outcome, &self.effect, Target::from_cards(picked), env)?;
        Ok(outcome)
    }

    /// One option per candidate, each overriding the target with a single
    /// card.
    fn target_choice(&self, target: &Target, candidates: &[EntityId], env: &EffectEnv<'_>) -> ChoiceContext {
        let player = env
            .context
            .acting_player(env.state)
            .unwrap_or(env.state.active_player);

        let options: Vec<ChoiceOption> = candidates
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let name = env.state.get_card(*id).map_or("unknown", |c| c.name());
                ChoiceOption::new(format!("target_{i}"), format!("{name} ({id})"), self.effect.clone())
                    .with_target(Target::Card(*id))
            })
            .collect();

        let mut choice = ChoiceContext::new(
            player,
            format!("Choose a target: {}", self.effect.describe()),
            ChoiceType::SelectTargets,
        )
        .with_trigger_context(env.context.clone())
        .with_original_target(target.clone());
        if let Some(first) = options.first() {
            choice = choice.with_default(first.id.clone());
        }
        choice.with_options(options)
    }
}
