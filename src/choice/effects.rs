//! Effects that ask a player to decide.
//!
//! Each variant builds a [`ChoiceContext`] when it applies and queues it
//! with the choice manager, leaving its target unchanged. The chosen
//! option's effect runs later as its own action. Without a manager the
//! decision is made on the spot: `may` takes "yes", the others take their
//! first option unless choosing nothing is allowed.

use super::context::{ChoiceContext, ChoiceOption, ChoiceType};
use crate::core::{EntityId, PlayerId};
use crate::effects::{
    record_step, CardFilter, Effect, EffectEnv, EffectOutcome, SelectionContext, Target, TargetSelector, Whose,
};
use crate::error::Result;
use crate::zones::Zone;

/// What a choice effect offers.
#[derive(Clone, Debug)]
pub enum ChoiceKind {
    /// Apply `yes` or `no`. Defaults to "no".
    May { yes: Effect, no: Effect },
    /// Pick one of a fixed list.
    ChooseOne(Vec<ChoiceOption>),
    /// Pick a character in play matching `filter`.
    SelectCharacter { filter: CardFilter, effect: Effect },
    /// Pick one of the acting player's cards in `zones`.
    SelectCard {
        filter: CardFilter,
        zones: Vec<Zone>,
        effect: Effect,
    },
}

/// A choice-producing effect.
///
/// ## Example
///
/// ```
/// use ccg_rules::choice::ChoiceEffect;
/// use ccg_rules::effects::{CardFilter, Effect};
///
/// let may_draw: Effect = ChoiceEffect::may("Draw a card?", Effect::Draw(1)).into();
/// assert!(may_draw.is_choice_producing());
///
/// let heal = ChoiceEffect::select_character("Heal whom?", CardFilter::Damaged, Effect::heal(2))
///     .optional()
///     .with_ability_name("HEALING TOUCH");
/// assert_eq!(heal.describe(), "choose a character: heal 2 damage");
/// ```
#[derive(Clone, Debug)]
pub struct ChoiceEffect {
    pub prompt: String,
    pub ability_name: Option<String>,
    pub kind: ChoiceKind,
    /// Offer a "none" option (and make it the default).
    pub allow_none: bool,
}

impl ChoiceEffect {
    fn build(prompt: impl Into<String>, kind: ChoiceKind, allow_none: bool) -> Self {
        Self {
            prompt: prompt.into(),
            ability_name: None,
            kind,
            allow_none,
        }
    }

    pub fn may(prompt: impl Into<String>, effect: Effect) -> Self {
        Self::may_or(prompt, effect, Effect::NoEffect)
    }

    pub fn may_or(prompt: impl Into<String>, yes: Effect, no: Effect) -> Self {
        Self::build(prompt, ChoiceKind::May { yes, no }, false)
    }

    pub fn choose_one(prompt: impl Into<String>, options: Vec<ChoiceOption>) -> Self {
        Self::build(prompt, ChoiceKind::ChooseOne(options), false)
    }

    pub fn may_choose_one(prompt: impl Into<String>, options: Vec<ChoiceOption>) -> Self {
        Self::build(prompt, ChoiceKind::ChooseOne(options), true)
    }

    pub fn select_character(prompt: impl Into<String>, filter: CardFilter, effect: Effect) -> Self {
        Self::build(prompt, ChoiceKind::SelectCharacter { filter, effect }, false)
    }

    /// Pick a card from the acting player's hand.
    pub fn select_card(prompt: impl Into<String>, filter: CardFilter, effect: Effect) -> Self {
        let kind = ChoiceKind::SelectCard {
            filter,
            zones: vec![Zone::Hand],
            effect,
        };
        Self::build(prompt, kind, false)
    }

    /// Allow choosing nothing.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.allow_none = true;
        self
    }

    /// Zones searched by `select_card`. No effect on other kinds.
    #[must_use]
    pub fn from_zones(mut self, from: Vec<Zone>) -> Self {
        if let ChoiceKind::SelectCard { zones, .. } = &mut self.kind {
            *zones = from;
        }
        self
    }

    #[must_use]
    pub fn with_ability_name(mut self, name: impl Into<String>) -> Self {
        self.ability_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn choice_type(&self) -> ChoiceType {
        match self.kind {
            ChoiceKind::May { .. } => ChoiceType::YesNo,
            ChoiceKind::ChooseOne(_) | ChoiceKind::SelectCard { .. } => ChoiceType::SelectFromList,
            ChoiceKind::SelectCharacter { .. } => ChoiceType::SelectTargets,
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match &self.kind {
            ChoiceKind::May { yes, .. } => format!("may {}", yes.describe()),
            ChoiceKind::ChooseOne(options) => {
                let names: Vec<&str> = options.iter().map(|o| o.description.as_str()).collect();
                format!("choose one: {}", names.join(" / "))
            }
            ChoiceKind::SelectCharacter { effect, .. } => format!("choose a character: {}", effect.describe()),
            ChoiceKind::SelectCard { effect, .. } => format!("choose a card: {}", effect.describe()),
        }
    }

    // === Application ===

    pub fn apply(&self, target: &Target, env: &mut EffectEnv<'_>) -> Result<EffectOutcome> {
        let mut outcome = EffectOutcome::unchanged(target.clone());
        let mut options = self.options(env);

        if options.is_empty() {
            tracing::debug!(prompt = %self.prompt, "choice has no options");
            return Ok(outcome);
        }

        if env.choices.is_none() {
            if self.allow_none {
                return Ok(outcome);
            }
            // "yes" for may, otherwise the first option.
            let first = options.swap_remove(0);
            let input = first.target.unwrap_or_else(|| target.clone());
            outcome.result = record_step(&mut outcome, &first.effect, input, env)?;
            return Ok(outcome);
        }

        let default = match (&self.kind, self.allow_none) {
            (ChoiceKind::May { .. }, _) => Some("no"),
            (_, true) => Some("none"),
            (_, false) => None,
        };
        if self.allow_none {
            options.push(ChoiceOption::none("Choose nothing"));
        }

        let mut choice = ChoiceContext::new(self.deciding_player(target, env), self.prompt.clone(), self.choice_type())
            .with_trigger_context(env.context.clone())
            .with_original_target(target.clone())
            .with_options(options);
        if let Some(default) = default {
            choice = choice.with_default(default);
        }
        if let Some(name) = self.ability_name.clone().or_else(|| env.context.ability_name.clone()) {
            choice = choice.with_ability_name(name);
        }
        if let Some(choices) = env.choices() {
            choices.queue_choice(choice);
        }
        Ok(outcome)
    }

    fn deciding_player(&self, target: &Target, env: &EffectEnv<'_>) -> PlayerId {
        env.context
            .acting_player(env.state)
            .or_else(|| target.card().and_then(|id| env.state.get_card(id)).map(|c| c.controller))
            .unwrap_or(env.state.active_player)
    }

    /// Options offered, without the "none" option.
    fn options(&self, env: &EffectEnv<'_>) -> Vec<ChoiceOption> {
        match &self.kind {
            ChoiceKind::May { yes, no } => vec![
                ChoiceOption::new("yes", "Yes", yes.clone()),
                ChoiceOption::new("no", "No", no.clone()),
            ],
            ChoiceKind::ChooseOne(options) => options.clone(),
            ChoiceKind::SelectCharacter { filter, effect } => {
                let candidates = self.candidates(&TargetSelector::all_characters(filter.clone()), env);
                candidates
                    .iter()
                    .enumerate()
                    .filter_map(|(i, id)| {
                        let card = env.state.get_card(*id)?;
                        let mut label = format!("{} ({}/{})", card.name(), card.strength(), card.willpower());
                        if card.is_damaged() {
                            label.push_str(&format!(" [-{}]", card.damage));
                        }
                        Some(ChoiceOption::new(format!("char_{i}"), label, effect.clone()).with_target(Target::Card(*id)))
                    })
                    .collect()
            }
            ChoiceKind::SelectCard { filter, zones, effect } => {
                let selector = TargetSelector::Union(
                    zones
                        .iter()
                        .map(|zone| TargetSelector::card_in(*zone, Whose::Own, filter.clone()))
                        .collect(),
                );
                self.candidates(&selector, env)
                    .iter()
                    .enumerate()
                    .filter_map(|(i, id)| {
                        let card = env.state.get_card(*id)?;
                        let label = format!("{} ({} ink)", card.name(), card.definition.cost);
                        Some(ChoiceOption::new(format!("card_{i}"), label, effect.clone()).with_target(Target::Card(*id)))
                    })
                    .collect()
            }
        }
    }

    fn candidates(&self, selector: &TargetSelector, env: &EffectEnv<'_>) -> Vec<EntityId> {
        let sel = SelectionContext::new(env.state, env.context, env.config.select_all);
        selector.candidates(&sel)
    }
}

impl From<ChoiceEffect> for Effect {
    fn from(choice: ChoiceEffect) -> Self {
        Effect::Choice(Box::new(choice))
    }
}
