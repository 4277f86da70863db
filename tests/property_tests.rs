//! Property tests for ordering and folding rules.

use std::cell::Cell;
use std::rc::Rc;

use ccg_rules::cards::CardDefinition;
use ccg_rules::core::{EngineConfig, EntityId, GameState, PlayerId};
use ccg_rules::effects::{ActionContext, Effect, Target};
use ccg_rules::modifiers::{
    during_controllers_turn, ConditionalEffect, CostFilter, CostModifier, CostModifierKind, CostModifierManager,
};
use ccg_rules::queue::{ActionPriority, ActionQueue, ActionRequest, QueueEnv};
use ccg_rules::rules::RulesEngine;
use ccg_rules::zones::Zone;
use proptest::prelude::*;
use rustc_hash::FxHashMap;

fn priority() -> impl Strategy<Value = ActionPriority> {
    prop::sample::select(ActionPriority::ALL.to_vec())
}

fn reductions_cost(amounts: &[i64], base: i64, free: bool) -> i64 {
    let mut state = GameState::new(2, 0);
    let source = state.add_card(CardDefinition::character("Source", 1, 1, 1, 1), PlayerId::new(0), Zone::Play);
    let card = state.add_card(CardDefinition::character("Card", base, 1, 1, 1), PlayerId::new(0), Zone::Hand);

    let mut manager = CostModifierManager::new();
    for (i, amount) in amounts.iter().enumerate() {
        manager.register(CostModifier::reduction(format!("r{i}"), source, *amount, CostFilter::Any).activated());
    }
    if free {
        manager.register(CostModifier::free_play("free", source, CostFilter::Any).activated());
    }
    manager.get_modified_cost(state.card(card).unwrap(), &state)
}

/// Fold `base` through reductions and increases, each `(increase, amount,
/// priority)`, plus the overriding modifier `make` builds.
fn mixed_cost(base: i64, steps: &[(bool, i64, i32)], make: impl FnOnce(EntityId) -> CostModifier) -> i64 {
    let mut state = GameState::new(2, 0);
    let source = state.add_card(CardDefinition::character("Source", 1, 1, 1, 1), PlayerId::new(0), Zone::Play);
    let card = state.add_card(CardDefinition::character("Card", base, 1, 1, 1), PlayerId::new(0), Zone::Hand);

    let mut manager = CostModifierManager::new();
    for (i, (increase, amount, priority)) in steps.iter().enumerate() {
        let kind = if *increase { CostModifierKind::Increase } else { CostModifierKind::Reduction };
        manager.register(CostModifier::new(format!("m{i}"), source, kind, *amount).with_priority(*priority).activated());
    }
    manager.register(make(source).activated());
    manager.get_modified_cost(state.card(card).unwrap(), &state)
}

fn steps() -> impl Strategy<Value = Vec<(bool, i64, i32)>> {
    prop::collection::vec((any::<bool>(), 0i64..5, -5i32..5), 0..6)
}

proptest! {
    // =========================================================================
    // Queue Ordering
    // =========================================================================

    /// Results come out sorted by priority, FIFO within a level.
    #[test]
    fn prop_queue_orders_by_priority_then_insertion(priorities in prop::collection::vec(priority(), 0..24)) {
        let mut state = GameState::new(2, 0);
        let config = EngineConfig::default();
        let mut queue = ActionQueue::new();

        let ids: Vec<String> = priorities
            .iter()
            .map(|p| {
                queue.enqueue(
                    ActionRequest::new(Effect::NoEffect, Target::None, ActionContext::default()).with_priority(*p),
                )
            })
            .collect();

        let results = queue.process_all_actions(&mut QueueEnv::new(&mut state, &config)).unwrap();

        let mut expected: Vec<(ActionPriority, usize)> = priorities.iter().copied().zip(0..).collect();
        expected.sort_by_key(|(p, i)| (*p, *i));
        let expected: Vec<&str> = expected.iter().map(|(_, i)| ids[*i].as_str()).collect();
        let actual: Vec<&str> = results.iter().map(|r| r.action_id.as_str()).collect();
        prop_assert_eq!(actual, expected);
        prop_assert!(queue.is_empty());
    }

    // =========================================================================
    // Cost Folding
    // =========================================================================

    /// Stacking reductions subtract their sum and never go below zero.
    #[test]
    fn prop_reductions_floor_at_zero(base in 0i64..12, amounts in prop::collection::vec(0i64..5, 0..6)) {
        let cost = reductions_cost(&amounts, base, false);
        prop_assert_eq!(cost, (base - amounts.iter().sum::<i64>()).max(0));
    }

    /// One more reduction never makes a card more expensive.
    #[test]
    fn prop_extra_reduction_never_raises_cost(
        base in 0i64..12,
        amounts in prop::collection::vec(0i64..5, 0..6),
        extra in 0i64..5,
    ) {
        let before = reductions_cost(&amounts, base, false);
        let mut more = amounts.clone();
        more.push(extra);
        prop_assert!(reductions_cost(&more, base, false) <= before);
    }

    #[test]
    fn prop_free_play_dominates(base in 0i64..12, amounts in prop::collection::vec(0i64..5, 0..6)) {
        prop_assert_eq!(reductions_cost(&amounts, base, true), 0);
    }

    /// Free play wins wherever it sits among increases and reductions.
    #[test]
    fn prop_free_play_wins_at_any_priority(base in 0i64..12, steps in steps(), priority in -5i32..5) {
        let cost = mixed_cost(base, &steps, |source| {
            CostModifier::free_play("free", source, CostFilter::Any).with_priority(priority)
        });
        prop_assert_eq!(cost, 0);
    }

    /// An alternative cost replaces the fold, clamped at zero.
    #[test]
    fn prop_alternative_cost_wins_at_any_priority(
        base in 0i64..12,
        steps in steps(),
        fixed in -3i64..8,
        priority in -5i32..5,
    ) {
        let cost = mixed_cost(base, &steps, |source| {
            CostModifier::alternative("alt", source, fixed, CostFilter::Any).with_priority(priority)
        });
        prop_assert_eq!(cost, fixed.max(0));
    }

    // =========================================================================
    // Conditional Effects
    // =========================================================================

    /// Applications and removals alternate and track the active player.
    #[test]
    fn prop_conditional_tracks_turns(turns in prop::collection::vec(0u8..2, 1..12)) {
        let mut state = GameState::new(2, 0);
        let guard = state.add_card(CardDefinition::character("Guard", 1, 1, 3, 1), PlayerId::new(0), Zone::Play);
        let mut engine = RulesEngine::new(state);

        let applied = Rc::new(Cell::new(0i64));
        let removed = Rc::new(Cell::new(0i64));
        let (a, r) = (Rc::clone(&applied), Rc::clone(&removed));
        engine.conditionals_mut().register(
            ConditionalEffect::new("watch", guard, during_controllers_turn, move |_, _| {
                a.set(a.get() + 1);
                Ok(FxHashMap::default())
            })
            .with_removal(move |_, _| {
                r.set(r.get() + 1);
                Ok(None)
            }),
        );

        for player in turns {
            engine.begin_turn(PlayerId::new(player)).unwrap();
            let active = engine.conditionals().get("watch").is_some_and(|e| e.is_active());
            prop_assert_eq!(active, player == 0);
            prop_assert_eq!(applied.get() - removed.get(), i64::from(active));
            engine.end_turn().unwrap();
        }
    }
}
