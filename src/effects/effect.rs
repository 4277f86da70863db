//! Effect definitions.
//!
//! Effects are immutable values. Applying one mutates game state through
//! an [`EffectEnv`] and returns an [`EffectOutcome`]; the events an effect
//! declares are computed afterwards from that outcome.
//!
//! ## Atomic Effects
//!
//! Act on a single card, a player, or the triggering event:
//! - `Stat`: strength/willpower/lore bonus, or damage (negative heals)
//! - `Draw`, `GainLore`, `Discard`: player-scoped
//! - `Banish`, `ReturnToHand`, `Exert`, `Ready`, `RemoveDamage`,
//!   `GrantProperty`: card-scoped
//! - `PreventEvent`, `ModifyDamage`, `ForceRetarget`: rewrite the event in
//!   the action context
//!
//! ## Structural Effects
//!
//! - `Composite`: a sequence, threading each result into the next step
//! - `Repeated`: one effect N times
//! - `Conditional`: exactly one of two branches
//! - `ChoiceBetween`: placeholder that always takes the first branch
//!
//! ## Scheduling Wrappers
//!
//! - `AbilityTrigger`: marks work produced by a triggered ability
//! - `Targeted`: resolves a selector at apply time, asking a player when
//!   the selector needs a decision
//!
//! Structural effects and wrappers record one [`EffectStep`] per
//! sub-application, so `events` reports each step against its own result.
//!
//! ## Example
//!
//! ```
//! use ccg_rules::cards::CardDefinition;
//! use ccg_rules::core::{EngineConfig, GameState, PlayerId};
//! use ccg_rules::effects::{ActionContext, Effect, EffectEnv, Target};
//! use ccg_rules::events::EventKind;
//! use ccg_rules::zones::Zone;
//!
//! let mut state = GameState::new(2, 0);
//! let card = state.add_card(CardDefinition::character("Hero", 2, 2, 5, 1), PlayerId::new(0), Zone::Play);
//! let config = EngineConfig::default();
//! let mut ctx = ActionContext::default();
//!
//! let effect = Effect::damage(2).then(Effect::heal(1));
//! let target = Target::Card(card);
//! let outcome = effect.apply(&target, &mut EffectEnv::new(&mut state, &mut ctx, &config)).unwrap();
//!
//! let kinds: Vec<EventKind> = effect.events(&target, &outcome, &ctx).iter().map(|e| e.kind).collect();
//! assert_eq!(kinds, vec![EventKind::CharacterTakesDamage, EventKind::CharacterHealed]);
//! assert_eq!(state.card(card).unwrap().damage, 1);
//! ```

use std::fmt;
use std::rc::Rc;

use super::atomic::{self, Scope};
use super::condition::EffectCondition;
use super::context::{ActionContext, EffectEnv, EffectOutcome, EffectStep};
use super::target::Target;
use super::targeting::{SelectionContext, TargetSelector};
use super::wrappers::{AbilityTrigger, TargetedEffect};
use crate::cards::Stat;
use crate::choice::ChoiceEffect;
use crate::core::{EngineConfig, GameState};
use crate::error::{Result, RulesError};
use crate::events::EventContext;
use crate::timing::{Duration, TemporaryEffect};

/// Extension point for effects the closed set does not cover.
pub trait CustomEffect: fmt::Debug {
    /// Mutate state and report what happened.
    fn apply(&self, target: &Target, env: &mut EffectEnv<'_>) -> Result<EffectOutcome>;

    /// Events declared for an application.
    fn events(&self, _target: &Target, _outcome: &EffectOutcome, _context: &ActionContext) -> Vec<EventContext> {
        Vec::new()
    }

    /// Human-readable description for step logs.
    fn describe(&self) -> String;

    /// Does applying this queue a player choice?
    fn is_choice_producing(&self) -> bool {
        false
    }
}

/// A two-way branch on a condition.
#[derive(Clone, Debug)]
pub struct Branch {
    pub condition: EffectCondition,
    pub then: Effect,
    pub otherwise: Option<Effect>,
}

/// A game effect.
#[derive(Clone, Debug)]
pub enum Effect {
    // === Card Stats ===
    /// Modify a stat. `Stat::Damage` deals damage (negative heals) and
    /// ignores the duration.
    Stat {
        stat: Stat,
        amount: i64,
        duration: Duration,
    },

    /// Remove up to this much damage.
    RemoveDamage(i64),

    /// Set a granted property on the card.
    GrantProperty { name: String, value: i64 },

    /// Remove a stat bonus by id. Produced by duration cleanup.
    RemoveBonus(u32),

    // === Card Movement ===
    Banish,
    ReturnToHand,

    // === Card State ===
    Exert,
    Ready,

    // === Player ===
    /// Draw cards (the target's controller, or the target player).
    Draw(usize),

    /// Gain lore (the target's controller, or the target player).
    GainLore(i64),

    /// Discard a random card from hand.
    Discard,

    // === Event Rewrites ===
    /// Veto the event in the action context.
    PreventEvent,

    /// Lower the pending amount of the event in the action context.
    ModifyDamage(i64),

    /// Redirect the event in the action context to the selector's first
    /// pick, or to the ability owner.
    ForceRetarget(Option<TargetSelector>),

    NoEffect,

    /// Cleanup for an expired temporary effect.
    ExpireTemporary(Box<TemporaryEffect>),

    // === Structure ===
    Composite(Vec<Effect>),
    Repeated(Box<Effect>, u32),
    Conditional(Box<Branch>),
    /// Always takes the first branch. Real decisions go through the
    /// choice manager.
    ChoiceBetween(Vec<Effect>),

    // === Scheduling ===
    AbilityTrigger(Box<AbilityTrigger>),
    Targeted(Box<TargetedEffect>),
    Choice(Box<ChoiceEffect>),

    Custom(Rc<dyn CustomEffect>),
}

// === Constructors ===

impl Effect {
    #[must_use]
    pub fn damage(amount: i64) -> Self {
        Effect::Stat {
            stat: Stat::Damage,
            amount,
            duration: Duration::Permanent,
        }
    }

    /// Negative damage.
    #[must_use]
    pub fn heal(amount: i64) -> Self {
        Self::damage(-amount)
    }

    #[must_use]
    pub fn modify_stat(stat: Stat, amount: i64, duration: Duration) -> Self {
        Effect::Stat { stat, amount, duration }
    }

    /// A stat bonus that lasts until the end of the turn.
    #[must_use]
    pub fn stat_this_turn(stat: Stat, amount: i64) -> Self {
        Self::modify_stat(stat, amount, Duration::UntilEndOfTurn)
    }

    #[must_use]
    pub fn grant(name: impl Into<String>, value: i64) -> Self {
        Effect::GrantProperty {
            name: name.into(),
            value,
        }
    }

    /// Resolve `selector` when applied.
    #[must_use]
    pub fn targeted(selector: TargetSelector, effect: Effect) -> Self {
        Effect::Targeted(Box::new(TargetedEffect { selector, effect }))
    }

    /// Mark `effect` as produced by a listener of `ability`.
    #[must_use]
    pub fn ability_trigger(ability: impl Into<String>, listener: impl Into<String>, effect: Effect) -> Self {
        Effect::AbilityTrigger(Box::new(AbilityTrigger {
            ability: ability.into(),
            listener: listener.into(),
            effect,
        }))
    }

    #[must_use]
    pub fn if_else(condition: EffectCondition, then: Effect, otherwise: Effect) -> Self {
        Effect::Conditional(Box::new(Branch {
            condition,
            then,
            otherwise: Some(otherwise),
        }))
    }

    pub fn custom(effect: impl CustomEffect + 'static) -> Self {
        Effect::Custom(Rc::new(effect))
    }
}

// === Combinators ===

impl Effect {
    /// Run `next` after this, on this effect's result.
    #[must_use]
    pub fn then(self, next: Effect) -> Self {
        match self {
            Effect::Composite(mut steps) => {
                steps.push(next);
                Effect::Composite(steps)
            }
            first => Effect::Composite(vec![first, next]),
        }
    }

    /// Apply this `count` times.
    #[must_use]
    pub fn times(self, count: u32) -> Self {
        Effect::Repeated(Box::new(self), count)
    }

    /// Branch placeholder: this, or `other`.
    #[must_use]
    pub fn or_else(self, other: Effect) -> Self {
        match self {
            Effect::ChoiceBetween(mut options) => {
                options.push(other);
                Effect::ChoiceBetween(options)
            }
            first => Effect::ChoiceBetween(vec![first, other]),
        }
    }

    /// Apply only when `condition` holds.
    #[must_use]
    pub fn when(self, condition: EffectCondition) -> Self {
        Effect::Conditional(Box::new(Branch {
            condition,
            then: self,
            otherwise: None,
        }))
    }
}

// === Queries ===

impl Effect {
    /// Short type name for step descriptions.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Effect::Stat { .. } => "StatModification",
            Effect::RemoveDamage(_) => "RemoveDamage",
            Effect::GrantProperty { .. } => "GrantProperty",
            Effect::RemoveBonus(_) => "RemoveBonus",
            Effect::Banish => "Banish",
            Effect::ReturnToHand => "ReturnToHand",
            Effect::Exert => "Exert",
            Effect::Ready => "Ready",
            Effect::Draw(_) => "DrawCards",
            Effect::GainLore(_) => "GainLore",
            Effect::Discard => "DiscardCard",
            Effect::PreventEvent => "PreventEvent",
            Effect::ModifyDamage(_) => "ModifyDamage",
            Effect::ForceRetarget(_) => "ForceRetarget",
            Effect::NoEffect => "NoEffect",
            Effect::ExpireTemporary(_) => "ExpireTemporary",
            Effect::Composite(_) => "Composite",
            Effect::Repeated(..) => "Repeated",
            Effect::Conditional(_) => "Conditional",
            Effect::ChoiceBetween(_) => "ChoiceBetween",
            Effect::AbilityTrigger(_) => "AbilityTrigger",
            Effect::Targeted(_) => "Targeted",
            Effect::Choice(_) => "Choice",
            Effect::Custom(_) => "Custom",
        }
    }

    #[must_use]
    pub fn modifies_event(&self) -> bool {
        matches!(self, Effect::PreventEvent | Effect::ModifyDamage(_) | Effect::ForceRetarget(_))
    }

    /// Rewrite a live event for an event-scoped effect
    /// (`PreventEvent`, `ModifyDamage`, `ForceRetarget`). Other effects
    /// leave it untouched.
    pub fn apply_to_event(&self, event: &mut EventContext, context: &ActionContext, state: &GameState, config: &EngineConfig) {
        let sel = SelectionContext::new(state, context, config.select_all);
        atomic::modify_event(self, event, &sel);
    }

    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, Effect::Composite(_))
    }

    /// The targeted wrapper, looking through an ability-trigger marker.
    #[must_use]
    pub fn as_targeted(&self) -> Option<&TargetedEffect> {
        match self {
            Effect::Targeted(targeted) => Some(targeted),
            Effect::AbilityTrigger(trigger) => trigger.effect.as_targeted(),
            _ => None,
        }
    }

    /// Does applying this (or any part of it) queue a player choice?
    #[must_use]
    pub fn is_choice_producing(&self) -> bool {
        match self {
            Effect::Choice(_) | Effect::Targeted(_) => true,
            Effect::Custom(custom) => custom.is_choice_producing(),
            Effect::AbilityTrigger(trigger) => trigger.effect.is_choice_producing(),
            Effect::Composite(steps) | Effect::ChoiceBetween(steps) => steps.iter().any(Effect::is_choice_producing),
            Effect::Repeated(inner, _) => inner.is_choice_producing(),
            Effect::Conditional(branch) => {
                branch.then.is_choice_producing()
                    || branch.otherwise.as_ref().is_some_and(Effect::is_choice_producing)
            }
            _ => false,
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Effect::Stat {
                stat: Stat::Damage,
                amount,
                ..
            } if *amount < 0 => format!("heal {} damage", -amount),
            Effect::Stat {
                stat: Stat::Damage,
                amount,
                ..
            } => format!("deal {amount} damage"),
            Effect::Stat { stat, amount, duration } => format!("{amount:+} {stat}{}", duration.suffix()),
            Effect::RemoveDamage(up_to) => format!("remove up to {up_to} damage"),
            Effect::GrantProperty { name, .. } => format!("gain {name}"),
            Effect::RemoveBonus(id) => format!("remove bonus {id}"),
            Effect::Banish => "banish".to_string(),
            Effect::ReturnToHand => "return to hand".to_string(),
            Effect::Exert => "exert".to_string(),
            Effect::Ready => "ready".to_string(),
            Effect::Draw(count) => format!("draw {count} card(s)"),
            Effect::GainLore(amount) => format!("gain {amount} lore"),
            Effect::Discard => "discard a card".to_string(),
            Effect::PreventEvent => "prevent".to_string(),
            Effect::ModifyDamage(reduction) => format!("reduce damage by {reduction}"),
            Effect::ForceRetarget(_) => "retarget".to_string(),
            Effect::NoEffect => "no effect".to_string(),
            Effect::ExpireTemporary(record) => format!("expire {}", record.description),
            Effect::Composite(steps) => join(steps, " then "),
            Effect::Repeated(inner, count) => format!("{} x{count}", inner.describe()),
            Effect::Conditional(branch) => match &branch.otherwise {
                Some(otherwise) => format!(
                    "if {}: {} else {}",
                    branch.condition,
                    branch.then.describe(),
                    otherwise.describe()
                ),
                None => format!("if {}: {}", branch.condition, branch.then.describe()),
            },
            Effect::ChoiceBetween(options) => join(options, " or "),
            Effect::AbilityTrigger(trigger) => format!("{}: {}", trigger.ability, trigger.effect.describe()),
            Effect::Targeted(targeted) => format!("{} ({})", targeted.effect.describe(), targeted.selector),
            Effect::Choice(choice) => choice.describe(),
            Effect::Custom(custom) => custom.describe(),
        }
    }
}

fn join(effects: &[Effect], separator: &str) -> String {
    effects.iter().map(Effect::describe).collect::<Vec<_>>().join(separator)
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

// === Application ===

impl Effect {
    /// Apply to `target`, mutating state through `env`.
    ///
    /// Errors are fatal to the current resolution.
    pub fn apply(&self, target: &Target, env: &mut EffectEnv<'_>) -> Result<EffectOutcome> {
        match self {
            Effect::Composite(steps) => {
                let mut outcome = EffectOutcome::default();
                let mut current = target.clone();
                for step in steps {
                    current = record_step(&mut outcome, step, current, env)?;
                }
                outcome.result = current;
                Ok(outcome)
            }
            Effect::Repeated(inner, count) => {
                let mut outcome = EffectOutcome::default();
                let mut current = target.clone();
                for _ in 0..*count {
                    current = record_step(&mut outcome, inner, current, env)?;
                }
                outcome.result = current;
                Ok(outcome)
            }
            Effect::Conditional(branch) => {
                let holds = branch.condition.check(target, env.context, env.state);
                let chosen = if holds { Some(&branch.then) } else { branch.otherwise.as_ref() };
                let mut outcome = EffectOutcome::unchanged(target.clone());
                if let Some(effect) = chosen {
                    outcome.result = record_step(&mut outcome, effect, target.clone(), env)?;
                }
                Ok(outcome)
            }
            Effect::ChoiceBetween(options) => {
                let mut outcome = EffectOutcome::unchanged(target.clone());
                if let Some(first) = options.first() {
                    outcome.result = record_step(&mut outcome, first, target.clone(), env)?;
                }
                Ok(outcome)
            }
            Effect::AbilityTrigger(trigger) => {
                let mut outcome = EffectOutcome::default();
                outcome.result = record_step(&mut outcome, &trigger.effect, target.clone(), env)?;
                Ok(outcome)
            }
            Effect::Targeted(targeted) => targeted.apply(target, env),
            Effect::Choice(choice) => choice.apply(target, env),
            Effect::Custom(custom) => custom.apply(target, env),
            Effect::ExpireTemporary(expiring) => {
                tracing::debug!(effect_id = %expiring.id, "temporary effect expired");
                let mut outcome = EffectOutcome::default();
                outcome.result = record_step(&mut outcome, &expiring.removal, target.clone(), env)?;
                Ok(outcome)
            }
            _ => self.apply_atomic(target, env),
        }
    }

    fn apply_atomic(&self, target: &Target, env: &mut EffectEnv<'_>) -> Result<EffectOutcome> {
        match atomic::scope(self) {
            Scope::Context => atomic::apply_to_context(self, target, env),
            scope => match target {
                Target::Cards(ids) => {
                    let mut outcome = EffectOutcome::unchanged(target.clone());
                    for id in ids {
                        record_step(&mut outcome, self, Target::Card(*id), env)?;
                    }
                    Ok(outcome)
                }
                Target::Card(id) if scope == Scope::Card => atomic::apply_to_card(self, *id, env),
                Target::None if scope == Scope::Card => Ok(EffectOutcome::unchanged(Target::None)),
                Target::Player(_) if scope == Scope::Card => Err(self.invalid(target)),
                _ => {
                    let player = match target {
                        Target::Player(p) => Some(*p),
                        Target::Card(id) => Some(env.state.controller_of(*id)?),
                        _ => env.context.acting_player(env.state),
                    };
                    let player = player.ok_or_else(|| self.invalid(target))?;
                    env.state.check_player(player)?;
                    atomic::apply_to_player(self, player, target, env)
                }
            },
        }
    }

    fn invalid(&self, target: &Target) -> RulesError {
        RulesError::InvalidTarget {
            effect: self.describe(),
            target: target.to_string(),
        }
    }

    /// Events declared for an application of this effect.
    ///
    /// Effects that recorded steps report each step against its own
    /// input and outcome.
    pub fn events(&self, target: &Target, outcome: &EffectOutcome, context: &ActionContext) -> Vec<EventContext> {
        let mut events = match self {
            Effect::ExpireTemporary(expiring) => vec![expiring.expired_event(target, context)],
            Effect::Custom(custom) => return custom.events(target, outcome, context),
            _ => Vec::new(),
        };
        if outcome.steps.is_empty() {
            events.extend(atomic::events(self, target, outcome, context));
        } else {
            for step in &outcome.steps {
                events.extend(step.effect.events(&step.input, &step.outcome, context));
            }
        }
        events
    }
}

/// Apply `effect` as one step of `outcome`, returning the step's result.
pub(crate) fn record_step(outcome: &mut EffectOutcome, effect: &Effect, input: Target, env: &mut EffectEnv<'_>) -> Result<Target> {
    let step = effect.apply(&input, env)?;
    let result = step.result.clone();
    outcome.steps.push(EffectStep {
        effect: effect.clone(),
        input,
        outcome: step,
    });
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardDefinition;
    use crate::core::{EngineConfig, EntityId, GameState, PlayerId};
    use crate::events::EventKind;
    use crate::zones::Zone;

    fn setup() -> (GameState, EntityId, EngineConfig) {
        let mut state = GameState::new(2, 0);
        let id = state.add_card(CardDefinition::character("Hero", 3, 2, 5, 1), PlayerId::new(0), Zone::Play);
        (state, id, EngineConfig::default())
    }

    fn run(effect: &Effect, target: &Target, state: &mut GameState, config: &EngineConfig) -> (EffectOutcome, Vec<EventKind>) {
        let mut ctx = ActionContext::default();
        let outcome = effect.apply(target, &mut EffectEnv::new(state, &mut ctx, config)).unwrap();
        let kinds = effect.events(target, &outcome, &ctx).iter().map(|e| e.kind).collect();
        (outcome, kinds)
    }

    #[test]
    fn test_composite_events_follow_each_step() {
        let (mut state, id, config) = setup();
        let effect = Effect::damage(2).then(Effect::heal(1));
        let target = Target::Card(id);

        let mut ctx = ActionContext::default();
        let outcome = effect.apply(&target, &mut EffectEnv::new(&mut state, &mut ctx, &config)).unwrap();
        let events = effect.events(&target, &outcome, &ctx);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::CharacterTakesDamage);
        assert_eq!(events[0].data.amount, Some(2));
        assert_eq!(events[0].data.total, Some(2));
        assert_eq!(events[1].kind, EventKind::CharacterHealed);
        assert_eq!(events[1].data.amount, Some(1));
        assert_eq!(events[1].data.total, Some(1));
    }

    #[test]
    fn test_repeated_reports_every_iteration() {
        let (mut state, id, config) = setup();
        let (_, kinds) = run(&Effect::damage(1).times(3), &Target::Card(id), &mut state, &config);

        assert_eq!(kinds, vec![EventKind::CharacterTakesDamage; 3]);
        assert_eq!(state.card(id).unwrap().damage, 3);
    }

    #[test]
    fn test_conditional_takes_one_branch() {
        let (mut state, id, config) = setup();
        let effect = Effect::if_else(EffectCondition::TargetDamaged, Effect::Banish, Effect::damage(1));

        run(&effect, &Target::Card(id), &mut state, &config);
        assert_eq!(state.card(id).unwrap().damage, 1);
        assert_eq!(state.zone_of(id), Some(Zone::Play));

        run(&effect, &Target::Card(id), &mut state, &config);
        assert_eq!(state.zone_of(id), Some(Zone::Discard));
    }

    #[test]
    fn test_conditional_without_else_is_noop() {
        let (mut state, id, config) = setup();
        let (outcome, kinds) = run(&Effect::Exert.when(EffectCondition::TargetDamaged), &Target::Card(id), &mut state, &config);

        assert!(kinds.is_empty());
        assert!(outcome.steps.is_empty());
        assert!(!state.card(id).unwrap().exerted);
    }

    #[test]
    fn test_choice_between_takes_first() {
        let (mut state, id, config) = setup();
        run(&Effect::Exert.or_else(Effect::Banish), &Target::Card(id), &mut state, &config);

        assert!(state.card(id).unwrap().exerted);
        assert_eq!(state.zone_of(id), Some(Zone::Play));
    }

    #[test]
    fn test_multi_card_target_applies_per_card() {
        let (mut state, a, config) = setup();
        let b = state.add_card(CardDefinition::character("B", 1, 1, 3, 1), PlayerId::new(1), Zone::Play);

        let (_, kinds) = run(&Effect::Exert, &Target::Cards(vec![a, b]), &mut state, &config);

        assert_eq!(kinds, vec![EventKind::CharacterExerted; 2]);
        assert!(state.card(a).unwrap().exerted);
        assert!(state.card(b).unwrap().exerted);
    }

    #[test]
    fn test_card_effect_rejects_player_target() {
        let (mut state, _, config) = setup();
        let mut ctx = ActionContext::default();
        let result = Effect::Banish.apply(
            &Target::Player(PlayerId::new(0)),
            &mut EffectEnv::new(&mut state, &mut ctx, &config),
        );

        assert!(matches!(result, Err(RulesError::InvalidTarget { .. })));
    }

    #[test]
    fn test_combinators_flatten() {
        let effect = Effect::Exert.then(Effect::Ready).then(Effect::Banish);
        assert!(matches!(&effect, Effect::Composite(steps) if steps.len() == 3));
        assert_eq!(effect.describe(), "exert then ready then banish");
        assert!(effect.is_composite());
        assert!(!effect.is_choice_producing());
    }

    #[test]
    fn test_as_targeted_looks_through_trigger() {
        let effect = Effect::ability_trigger(
            "HEROISM",
            "Trigger0",
            Effect::targeted(TargetSelector::enemy_character(), Effect::Exert),
        );

        assert!(effect.as_targeted().is_some());
        assert!(effect.is_choice_producing());
        assert!(Effect::Exert.as_targeted().is_none());
    }

    #[test]
    fn test_describe_stats() {
        assert_eq!(Effect::damage(2).describe(), "deal 2 damage");
        assert_eq!(Effect::heal(1).describe(), "heal 1 damage");
        assert_eq!(Effect::stat_this_turn(Stat::Strength, 2).describe(), "+2 strength this turn");
    }
}
