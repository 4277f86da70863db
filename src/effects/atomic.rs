//! Atomic effect application and event declaration.

use super::context::{ActionContext, EffectEnv, EffectOutcome};
use super::effect::Effect;
use super::target::Target;
use super::targeting::SelectionContext;
use crate::cards::{Stat, StatBonus};
use crate::core::{EntityId, PlayerId};
use crate::error::Result;
use crate::events::{EventContext, EventKind};
use crate::timing::TemporaryEffect;
use crate::zones::Zone;

/// What an atomic effect acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    Card,
    Player,
    /// The event carried in the action context.
    Context,
}

pub(crate) fn scope(effect: &Effect) -> Scope {
    match effect {
        Effect::Draw(_) | Effect::GainLore(_) | Effect::Discard => Scope::Player,
        Effect::PreventEvent | Effect::ModifyDamage(_) | Effect::ForceRetarget(_) | Effect::NoEffect => {
            Scope::Context
        }
        _ => Scope::Card,
    }
}

pub(crate) fn apply_to_card(effect: &Effect, id: EntityId, env: &mut EffectEnv<'_>) -> Result<EffectOutcome> {
    let controller = env.state.controller_of(id)?;
    let outcome = EffectOutcome::unchanged(Target::Card(id)).with_player(controller);

    match effect {
        Effect::Stat {
            stat: Stat::Damage,
            amount,
            ..
        } => {
            let applied = if *amount >= 0 {
                env.state.damage(id, *amount)?
            } else {
                env.state.heal(id, -amount)?
            };
            let total = env.state.card(id)?.damage;
            Ok(outcome.with_amount(applied).with_total(total))
        }
        Effect::Stat { stat, amount, duration } => {
            let bonus_id = env.state.next_bonus_id();
            let card = env.state.card_mut(id)?;
            card.add_bonus(StatBonus {
                id: bonus_id,
                stat: *stat,
                amount: *amount,
            });
            let total = card.stat(*stat);

            if !duration.is_permanent() {
                let record = TemporaryEffect::new(
                    format!("{amount:+} {stat} on {id}"),
                    Target::Card(id),
                    Effect::RemoveBonus(bonus_id),
                    duration.clone(),
                )
                .with_source(env.context.source);
                match env.timing() {
                    Some(timing) => {
                        timing.register_temporary_effect(record);
                    }
                    None => tracing::debug!(%id, bonus_id, "no turn timing, bonus will not expire"),
                }
            }
            Ok(outcome.with_amount(*amount).with_total(total))
        }
        Effect::RemoveBonus(bonus_id) => {
            let removed = env.state.card_mut(id)?.remove_bonus(*bonus_id);
            Ok(outcome.with_amount(i64::from(removed)))
        }
        Effect::RemoveDamage(up_to) => {
            let removed = env.state.heal(id, *up_to)?;
            let total = env.state.card(id)?.damage;
            Ok(outcome.with_amount(removed).with_total(total))
        }
        Effect::GrantProperty { name, value } => {
            env.state.card_mut(id)?.set_state(name.as_str(), *value);
            Ok(outcome.with_amount(*value))
        }
        Effect::Banish => {
            let old = env.state.banish(id)?;
            Ok(EffectOutcome {
                from_zone: Some(old.zone),
                ..outcome
            })
        }
        Effect::ReturnToHand => {
            let old = env.state.return_to_hand(id)?;
            Ok(EffectOutcome {
                from_zone: Some(old.zone),
                ..outcome
            })
        }
        Effect::Exert => {
            let changed = env.state.exert(id)?;
            Ok(outcome.with_amount(i64::from(changed)))
        }
        Effect::Ready => {
            let changed = env.state.ready(id)?;
            Ok(outcome.with_amount(i64::from(changed)))
        }
        _ => Ok(outcome),
    }
}

pub(crate) fn apply_to_player(
    effect: &Effect,
    player: PlayerId,
    target: &Target,
    env: &mut EffectEnv<'_>,
) -> Result<EffectOutcome> {
    let mut outcome = EffectOutcome::unchanged(target.clone()).with_player(player);

    match effect {
        Effect::Draw(count) => {
            let drawn = env.state.draw(player, *count, env.config.strict_draw)?;
            outcome.amount = Some(drawn.len() as i64);
            outcome.total = Some(env.state.hand(player).len() as i64);
            outcome.cards = drawn;
        }
        Effect::GainLore(amount) => {
            let total = env.state.gain_lore(player, *amount)?;
            outcome = outcome.with_amount(*amount).with_total(total);
        }
        Effect::Discard => {
            let hand = env.state.hand(player);
            match env.state.rng.pick_index(hand.len()).map(|i| hand[i]) {
                Some(card) => {
                    env.state.discard_from_hand(card)?;
                    outcome.amount = Some(1);
                    outcome.cards = vec![card];
                }
                None => outcome.amount = Some(0),
            }
        }
        _ => {}
    }
    Ok(outcome)
}

pub(crate) fn apply_to_context(effect: &Effect, target: &Target, env: &mut EffectEnv<'_>) -> Result<EffectOutcome> {
    let mut outcome = EffectOutcome::unchanged(target.clone());
    let Some(mut event) = env.context.event.clone() else {
        return Ok(outcome);
    };
    let change = {
        let sel = SelectionContext::new(env.state, env.context, env.config.select_all);
        modify_event(effect, &mut event, &sel)
    };
    env.context.event = Some(event);

    outcome.amount = change.amount;
    if let Some(id) = change.retarget {
        outcome.result = Target::Card(id);
    }
    Ok(outcome)
}

/// What rewriting an event changed.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct EventChange {
    /// Damage removed by `ModifyDamage`.
    pub amount: Option<i64>,
    /// New target chosen by `ForceRetarget`.
    pub retarget: Option<EntityId>,
}

/// Rewrite `event` in place for an event-scoped effect.
pub(crate) fn modify_event(effect: &Effect, event: &mut EventContext, sel: &SelectionContext<'_>) -> EventChange {
    let mut change = EventChange::default();
    match effect {
        Effect::PreventEvent => event.prevent(),
        Effect::ModifyDamage(reduction) => {
            if let Some(amount) = event.data.amount {
                let reduced = (amount - reduction).max(0);
                event.data.amount = Some(reduced);
                change.amount = Some(amount - reduced);
            }
        }
        Effect::ForceRetarget(selector) => {
            let picked = selector.as_ref().and_then(|s| s.select(sel).first().copied());
            if let Some(id) = picked.or_else(|| sel.context.ability_owner()) {
                event.target = Some(id);
                event.data.retargeted = true;
                change.retarget = Some(id);
            }
        }
        _ => {}
    }
    change
}

/// The magnitude an effect asks for, used when it was declared but not applied.
fn nominal_amount(effect: &Effect) -> i64 {
    match effect {
        Effect::Stat { amount, .. } => amount.abs(),
        Effect::RemoveDamage(amount) | Effect::GainLore(amount) => *amount,
        Effect::Draw(count) => *count as i64,
        Effect::Exert | Effect::Ready => 1,
        _ => 0,
    }
}

/// Events for one atomic application.
pub(crate) fn events(effect: &Effect, target: &Target, outcome: &EffectOutcome, context: &ActionContext) -> Vec<EventContext> {
    let source = context.source;
    let amount = outcome.amount.unwrap_or_else(|| nominal_amount(effect));

    if let Some(card) = target.card() {
        let on_card = |kind: EventKind| {
            EventContext::new(kind)
                .with_source_opt(source)
                .with_target(card)
                .with_player_opt(outcome.player)
        };
        let moved = |kind: EventKind, to: Zone| {
            let mut events = Vec::with_capacity(2);
            let mut event = on_card(kind);
            if let Some(from) = outcome.from_zone {
                event = event.with_zones(from, to);
            }
            events.push(event);
            if outcome.from_zone == Some(Zone::Play) {
                events.push(on_card(EventKind::CharacterLeavesPlay).with_zones(Zone::Play, to));
            }
            events
        };

        match effect {
            Effect::Stat {
                stat: Stat::Damage,
                amount: requested,
                ..
            } if amount > 0 => {
                let kind = if *requested >= 0 {
                    EventKind::CharacterTakesDamage
                } else {
                    EventKind::CharacterHealed
                };
                let mut event = on_card(kind).with_amount(amount);
                if let Some(total) = outcome.total {
                    event = event.with_total(total);
                }
                return vec![event];
            }
            Effect::Stat {
                stat: Stat::Damage, ..
            } => return Vec::new(),
            Effect::Stat { .. } => {
                let mut event = on_card(EventKind::StatModified).with_amount(amount);
                if let Some(total) = outcome.total {
                    event = event.with_total(total);
                }
                return vec![event];
            }
            Effect::RemoveDamage(_) if amount > 0 => {
                return vec![on_card(EventKind::CharacterHealed)
                    .with_amount(amount)
                    .with_total(outcome.total.unwrap_or(0))];
            }
            Effect::Banish => return moved(EventKind::CharacterBanished, Zone::Discard),
            Effect::ReturnToHand => return moved(EventKind::CardReturnedToHand, Zone::Hand),
            Effect::Exert if amount > 0 => return vec![on_card(EventKind::CharacterExerted)],
            Effect::Ready if amount > 0 => return vec![on_card(EventKind::CharacterReadied)],
            _ => {}
        }
    }

    match effect {
        Effect::Draw(_) if amount > 0 => vec![EventContext::new(EventKind::CardDrawn)
            .with_source_opt(source)
            .with_player_opt(outcome.player)
            .with_amount(amount)],
        Effect::GainLore(_) => vec![EventContext::new(EventKind::LoreGained)
            .with_source_opt(source)
            .with_player_opt(outcome.player)
            .with_amount(amount)
            .with_total(outcome.total.unwrap_or(0))],
        Effect::Discard => outcome
            .cards
            .iter()
            .map(|card| {
                EventContext::new(EventKind::CardDiscarded)
                    .with_source_opt(source)
                    .with_target(*card)
                    .with_player_opt(outcome.player)
                    .with_zones(Zone::Hand, Zone::Discard)
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardDefinition;
    use crate::core::{EngineConfig, GameState};
    use crate::effects::TargetSelector;
    use crate::timing::{Duration, TurnTiming};

    fn setup() -> (GameState, EntityId, EntityId, EngineConfig) {
        let mut state = GameState::new(2, 3);
        let mine = state.add_card(CardDefinition::character("Mine", 2, 2, 4, 1), PlayerId::new(0), Zone::Play);
        let theirs = state.add_card(CardDefinition::character("Theirs", 2, 3, 3, 1), PlayerId::new(1), Zone::Play);
        (state, mine, theirs, EngineConfig::default())
    }

    #[test]
    fn test_damage_and_heal() {
        let (mut state, mine, _, config) = setup();
        let mut ctx = ActionContext::default();
        let mut env = EffectEnv::new(&mut state, &mut ctx, &config);

        let hit = Effect::damage(3).apply(&Target::Card(mine), &mut env).unwrap();
        assert_eq!((hit.amount, hit.total), (Some(3), Some(3)));

        let healed = Effect::heal(5).apply(&Target::Card(mine), &mut env).unwrap();
        assert_eq!((healed.amount, healed.total), (Some(3), Some(0)));
    }

    #[test]
    fn test_temporary_bonus_registers_cleanup() {
        let (mut state, mine, _, config) = setup();
        let mut timing = TurnTiming::new();
        timing.start_turn(1, PlayerId::new(0));
        let mut ctx = ActionContext::for_ability(mine, "TEST");

        let effect = Effect::stat_this_turn(Stat::Strength, 2);
        let mut env = EffectEnv::new(&mut state, &mut ctx, &config).with_timing(&mut timing);
        effect.apply(&Target::Card(mine), &mut env).unwrap();

        assert_eq!(state.card(mine).unwrap().strength(), 4);
        assert_eq!(timing.temporary_effect_count(), 1);
    }

    #[test]
    fn test_permanent_bonus_has_no_cleanup() {
        let (mut state, mine, _, config) = setup();
        let mut timing = TurnTiming::new();
        let mut ctx = ActionContext::default();

        let effect = Effect::modify_stat(Stat::Lore, 1, Duration::Permanent);
        let mut env = EffectEnv::new(&mut state, &mut ctx, &config).with_timing(&mut timing);
        effect.apply(&Target::Card(mine), &mut env).unwrap();

        assert_eq!(state.card(mine).unwrap().lore(), 2);
        assert_eq!(timing.temporary_effect_count(), 0);
    }

    #[test]
    fn test_banish_from_play_also_leaves_play() {
        let (mut state, mine, _, config) = setup();
        let mut ctx = ActionContext::default();
        let target = Target::Card(mine);
        let outcome = Effect::Banish
            .apply(&target, &mut EffectEnv::new(&mut state, &mut ctx, &config))
            .unwrap();

        let kinds: Vec<EventKind> = Effect::Banish.events(&target, &outcome, &ctx).iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::CharacterBanished, EventKind::CharacterLeavesPlay]);
    }

    #[test]
    fn test_exert_twice_emits_once() {
        let (mut state, mine, _, config) = setup();
        let mut ctx = ActionContext::default();
        let target = Target::Card(mine);

        let first = Effect::Exert.apply(&target, &mut EffectEnv::new(&mut state, &mut ctx, &config)).unwrap();
        let second = Effect::Exert.apply(&target, &mut EffectEnv::new(&mut state, &mut ctx, &config)).unwrap();

        assert_eq!(Effect::Exert.events(&target, &first, &ctx).len(), 1);
        assert!(Effect::Exert.events(&target, &second, &ctx).is_empty());
    }

    #[test]
    fn test_player_effects_use_controller() {
        let (mut state, _, theirs, config) = setup();
        let p1 = PlayerId::new(1);
        state.add_card(CardDefinition::character("Deck", 1, 1, 1, 1), p1, Zone::Deck);
        let mut ctx = ActionContext::default();
        let mut env = EffectEnv::new(&mut state, &mut ctx, &config);

        let drew = Effect::Draw(2).apply(&Target::Card(theirs), &mut env).unwrap();
        assert_eq!(drew.amount, Some(1));
        assert_eq!(drew.player, Some(p1));

        let lore = Effect::GainLore(2).apply(&Target::Player(p1), &mut env).unwrap();
        assert_eq!(lore.total, Some(2));

        let discarded = Effect::Discard.apply(&Target::Player(p1), &mut env).unwrap();
        assert_eq!(discarded.cards.len(), 1);
        assert!(state.hand(p1).is_empty());
        assert_eq!(state.discard(p1).len(), 1);
    }

    #[test]
    fn test_player_effect_falls_back_to_acting_player() {
        let (mut state, mine, _, config) = setup();
        let mut ctx = ActionContext::for_ability(mine, "TEST");
        Effect::GainLore(1)
            .apply(&Target::None, &mut EffectEnv::new(&mut state, &mut ctx, &config))
            .unwrap();

        assert_eq!(state.player(PlayerId::new(0)).unwrap().lore, 1);
    }

    #[test]
    fn test_context_rewrites() {
        let (mut state, mine, theirs, config) = setup();
        let event = EventContext::damage_taken(Some(theirs), mine, 3, 3);
        let mut ctx = ActionContext::for_ability(mine, "TEST").with_event(event);
        let mut env = EffectEnv::new(&mut state, &mut ctx, &config);

        let reduced = Effect::ModifyDamage(1).apply(&Target::None, &mut env).unwrap();
        assert_eq!(reduced.amount, Some(1));

        let retargeted = Effect::ForceRetarget(Some(TargetSelector::all_enemy_characters()))
            .apply(&Target::None, &mut env)
            .unwrap();
        assert_eq!(retargeted.result, Target::Card(theirs));

        Effect::PreventEvent.apply(&Target::None, &mut env).unwrap();

        let event = ctx.event.unwrap();
        assert_eq!(event.data.amount, Some(2));
        assert_eq!(event.target, Some(theirs));
        assert!(event.data.retargeted);
        assert!(event.is_prevented());
    }
}
