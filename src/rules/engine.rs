//! The rules engine.
//!
//! `RulesEngine` owns the game state and every rules subsystem, and drives
//! them to a fixed point after each game action:
//!
//! 1. Game actions (play, quest, challenge, turn and phase boundaries)
//!    mutate state or enqueue their core effects, then dispatch an event.
//! 2. The event bus hands the event to abilities, which answer with
//!    [`ActionRequest`]s. Event-modifying effects rewrite the event in place.
//! 3. [`run_until_stable`](RulesEngine::run_until_stable) drains the queue,
//!    banishes defeated characters, and re-evaluates conditional effects
//!    until nothing is left to do or a player choice is pending.
//!
//! ## Example
//!
//! ```
//! use ccg_rules::cards::{AbilitySpec, CardDefinition};
//! use ccg_rules::core::{GameState, PlayerId};
//! use ccg_rules::rules::RulesEngine;
//! use ccg_rules::zones::Zone;
//!
//! let mut state = GameState::new(2, 1);
//! let p0 = PlayerId::new(0);
//! let p1 = PlayerId::new(1);
//! let dancer = state.add_card(
//!     CardDefinition::character("Dancer", 2, 3, 4, 1).with_ability(AbilitySpec::named("DANCE-OFF")),
//!     p0,
//!     Zone::Play,
//! );
//! let rival = state.add_card(CardDefinition::character("Rival", 2, 1, 2, 1), p1, Zone::Play);
//! state.exert(rival).unwrap();
//!
//! let mut engine = RulesEngine::new(state);
//! engine.register_card_abilities(dancer).unwrap();
//! engine.challenge(dancer, rival).unwrap();
//!
//! // DANCE-OFF gains a lore whenever its owner challenges.
//! assert_eq!(engine.state().players[p0].lore, 1);
//! assert_eq!(engine.state().zone_of(rival), Some(Zone::Discard));
//! ```

use rustc_hash::FxHashSet;

use crate::abilities::AbilityFactoryRegistry;
use crate::cards::CardKind;
use crate::choice::{ChoiceContext, ChoiceManager};
use crate::core::{EngineConfig, EntityId, GameState, Phase, PlayerId};
use crate::effects::{ActionContext, Effect, Target};
use crate::error::{Result, RulesError};
use crate::events::{EventBus, EventContext, EventKind};
use crate::modifiers::{ConditionalEffectTracker, CostModifierManager};
use crate::queue::{describe_step, ActionPriority, ActionQueue, ActionRequest, ActionResult, QueueEnv, StepDescription};
use crate::timing::{AutomaticContext, AutomaticEffectRegistry, AutomaticTrigger, TurnTiming};
use crate::zones::{Zone, ZonePosition};

/// Upper bound on settle passes per game action.
const MAX_PASSES: usize = 64;

const DEFEATED: &str = "defeated";

/// Owns the game state and every rules subsystem.
#[derive(Debug)]
pub struct RulesEngine {
    state: GameState,
    config: EngineConfig,
    queue: ActionQueue,
    bus: EventBus,
    choices: ChoiceManager,
    timing: TurnTiming,
    automatic: AutomaticEffectRegistry,
    conditionals: ConditionalEffectTracker,
    costs: CostModifierManager,
    factories: AbilityFactoryRegistry,
    /// Attacker and defender of the challenge being resolved.
    challenge: Option<(EntityId, EntityId)>,
    turn_started: bool,
}

impl RulesEngine {
    /// Engine with the default configuration and reference abilities.
    #[must_use]
    pub fn new(state: GameState) -> Self {
        Self::with_config(state, EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(state: GameState, config: EngineConfig) -> Self {
        Self {
            state,
            queue: ActionQueue::from_config(&config),
            timing: TurnTiming::new().with_phase_policy(config.phase_duration),
            config,
            bus: EventBus::new(),
            choices: ChoiceManager::new(),
            automatic: AutomaticEffectRegistry::new(),
            conditionals: ConditionalEffectTracker::new(),
            costs: CostModifierManager::new(),
            factories: AbilityFactoryRegistry::with_defaults(),
            challenge: None,
            turn_started: false,
        }
    }

    /// Replace the ability factories (builder pattern).
    #[must_use]
    pub fn with_factories(mut self, factories: AbilityFactoryRegistry) -> Self {
        self.factories = factories;
        self
    }

    // === Accessors ===

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct state access for setup and tests. Changes made here dispatch
    /// no events.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    #[must_use]
    pub fn choices(&self) -> &ChoiceManager {
        &self.choices
    }

    #[must_use]
    pub fn timing(&self) -> &TurnTiming {
        &self.timing
    }

    pub fn automatic_mut(&mut self) -> &mut AutomaticEffectRegistry {
        &mut self.automatic
    }

    #[must_use]
    pub fn conditionals(&self) -> &ConditionalEffectTracker {
        &self.conditionals
    }

    pub fn conditionals_mut(&mut self) -> &mut ConditionalEffectTracker {
        &mut self.conditionals
    }

    #[must_use]
    pub fn costs(&self) -> &CostModifierManager {
        &self.costs
    }

    pub fn costs_mut(&mut self) -> &mut CostModifierManager {
        &mut self.costs
    }

    #[must_use]
    pub fn factories(&self) -> &AbilityFactoryRegistry {
        &self.factories
    }

    /// The choice players must answer before the engine can continue.
    #[must_use]
    pub fn current_choice(&self) -> Option<&ChoiceContext> {
        self.choices.get_current_choice()
    }

    #[must_use]
    pub fn is_waiting_for_choice(&self) -> bool {
        self.choices.has_pending_choices()
    }

    /// Human-readable view of the most recent executed actions.
    #[must_use]
    pub fn describe_history(&self, limit: Option<usize>) -> Vec<StepDescription> {
        self.queue
            .execution_history(limit)
            .into_iter()
            .map(|result| describe_step(result, &self.state))
            .collect()
    }

    /// Ink cost of `card` after cost modifiers.
    pub fn modified_cost(&self, card: EntityId) -> Result<i64> {
        let instance = self.state.card(card)?;
        Ok(self.costs.get_modified_cost(instance, &self.state))
    }

    // === Abilities ===

    /// Materialize and register every named ability printed on `card`.
    ///
    /// Known abilities are registered even when another name is unknown;
    /// the first unknown name is then returned as an error.
    pub fn register_card_abilities(&mut self, card: EntityId) -> Result<usize> {
        let (registered, mut errors) = self.materialize(card)?;
        if errors.is_empty() {
            Ok(registered)
        } else {
            Err(errors.swap_remove(0))
        }
    }

    /// Remove `card`'s abilities from the bus and switch off its cost
    /// modifiers. Returns how many abilities were removed.
    pub fn unregister_card_abilities(&mut self, card: EntityId) -> usize {
        self.costs.deactivate_modifiers_by_source(card);
        self.bus.unregister_owner(card)
    }

    fn materialize(&mut self, card: EntityId) -> Result<(usize, Vec<RulesError>)> {
        let instance = self.state.card(card)?;
        let mut registered = 0;
        let mut errors = Vec::new();
        for result in self.factories.abilities_for(instance) {
            match result {
                Ok(ability) => {
                    self.bus.register(ability);
                    registered += 1;
                }
                Err(err) => {
                    tracing::warn!(card = %instance.name(), %err, "ability not materialized");
                    errors.push(err);
                }
            }
        }
        Ok((registered, errors))
    }

    // === Event Flow ===

    /// Enqueue an action without running the queue.
    pub fn enqueue(&mut self, request: ActionRequest) -> String {
        self.queue.enqueue(request)
    }

    /// Dispatch `event` to abilities and automatic triggers, then settle.
    pub fn emit_event(&mut self, event: EventContext) -> Result<Vec<ActionResult>> {
        self.dispatch(event);
        self.run_until_stable()
    }

    /// Record and dispatch one event, enqueueing whatever it triggers.
    /// Returns the number of actions enqueued.
    fn dispatch(&mut self, mut event: EventContext) -> usize {
        self.timing.record_event(&event);
        let requests = self.bus.dispatch(&mut event, &self.state, &self.config);
        let count = requests.len();
        self.queue.enqueue_multiple(requests);
        count + self.queue_conditional_triggers(&event)
    }

    fn queue_conditional_triggers(&mut self, event: &EventContext) -> usize {
        if event.is_prevented() {
            return 0;
        }
        let player = event.player.unwrap_or(self.state.active_player);
        let ctx = AutomaticContext {
            state: &self.state,
            player,
            phase: Some(self.state.current_phase),
            event: Some(event),
        };
        let effects = self.automatic.get_conditional_effects(event, &ctx);
        let target = event.target.map_or(Target::Player(player), Target::Card);
        let count = effects.len();
        for effect in effects {
            let context = ActionContext::default()
                .with_player(player)
                .with_event(event.clone())
                .with_reason(event.kind.name());
            self.queue.enqueue(ActionRequest::new(effect, target.clone(), context));
        }
        count
    }

    fn queue_automatic(&mut self, trigger: AutomaticTrigger, phase: Option<Phase>, reason: &str) -> usize {
        let player = self.state.active_player;
        let ctx = AutomaticContext {
            state: &self.state,
            player,
            phase,
            event: None,
        };
        let effects = self.automatic.get_automatic_effects(trigger, &ctx);
        let count = effects.len();
        for effect in effects {
            let context = ActionContext::default().with_player(player).with_reason(reason);
            self.queue.enqueue(ActionRequest::new(effect, Target::Player(player), context));
        }
        count
    }

    /// Process queued actions until nothing changes or a choice is pending.
    ///
    /// Each pass drains the queue, runs automatic triggers on the events it
    /// emitted, banishes defeated characters, and re-evaluates conditional
    /// effects.
    pub fn run_until_stable(&mut self) -> Result<Vec<ActionResult>> {
        let mut results = Vec::new();
        for _ in 0..MAX_PASSES {
            let batch = {
                let mut env = QueueEnv::new(&mut self.state, &self.config)
                    .with_bus(&self.bus)
                    .with_choices(&mut self.choices)
                    .with_timing(&mut self.timing);
                self.queue.process_all_actions(&mut env)?
            };
            for result in &batch {
                for event in &result.events_emitted {
                    self.queue_conditional_triggers(event);
                }
            }
            results.extend(batch);

            self.queue_defeated();
            for event in self.conditionals.evaluate_all(&mut self.state) {
                self.dispatch(event);
            }

            if self.is_waiting_for_choice() || self.queue.is_paused() {
                return Ok(results);
            }
            if self.queue.is_empty() {
                self.challenge = None;
                return Ok(results);
            }
        }
        tracing::warn!(passes = MAX_PASSES, pending = self.queue.pending_count(), "rules engine did not settle");
        Ok(results)
    }

    /// Enqueue an Immediate banish for every defeated character in play.
    fn queue_defeated(&mut self) {
        let already: FxHashSet<EntityId> = self
            .queue
            .pending_actions()
            .into_iter()
            .filter(|a| matches!(a.effect, Effect::Banish) && a.context.reason.as_deref() == Some(DEFEATED))
            .filter_map(|a| match a.target {
                Target::Card(id) => Some(id),
                _ => None,
            })
            .collect();

        let defeated: Vec<EntityId> = self
            .state
            .all_characters_in_play()
            .into_iter()
            .filter(|id| !already.contains(id))
            .filter(|id| self.state.get_card(*id).is_some_and(|c| c.is_defeated()))
            .collect();

        for id in defeated {
            tracing::debug!(card = %id, "character defeated");
            let mut context = ActionContext::default().with_reason(DEFEATED);
            context.player = self.state.controller_of(id).ok();
            self.queue.enqueue(
                ActionRequest::new(Effect::Banish, Target::Card(id), context)
                    .with_priority(ActionPriority::Immediate)
                    .with_description(format!("{id} is banished")),
            );

            let opponent = match self.challenge {
                Some((attacker, defender)) if attacker == id => Some(defender),
                Some((attacker, defender)) if defender == id => Some(attacker),
                _ => None,
            };
            if let Some(other) = opponent {
                let event = EventContext::new(EventKind::CharacterBanishedInChallenge)
                    .with_target(id)
                    .with_source(other)
                    .with_player_opt(self.state.controller_of(id).ok());
                self.dispatch(event);
            }
        }
    }

    // === Choices ===

    /// Answer the current choice and continue processing.
    ///
    /// Returns `Ok(false)` when the choice id or option is not valid; the
    /// engine state is unchanged in that case.
    pub fn provide_choice(&mut self, choice_id: &str, option_id: &str) -> Result<bool> {
        if !self.choices.provide_choice(choice_id, option_id, Some(&mut self.queue)) {
            return Ok(false);
        }
        self.queue.resume_after_choice(choice_id);
        if let Some(event) = self.choices.choice_made_event(choice_id) {
            self.dispatch(event);
        }
        self.run_until_stable()?;
        Ok(true)
    }

    /// Resolve every pending choice with its default option, then continue.
    pub fn auto_resolve_with_defaults(&mut self) -> Result<usize> {
        let ids: Vec<String> = self
            .choices
            .pending_choices()
            .into_iter()
            .map(|c| c.choice_id.clone())
            .collect();
        let resolved = self.choices.auto_resolve_with_defaults(Some(&mut self.queue));
        for id in &ids {
            self.queue.resume_after_choice(id);
            if let Some(event) = self.choices.choice_made_event(id) {
                self.dispatch(event);
            }
        }
        self.run_until_stable()?;
        Ok(resolved)
    }

    // === Turn Structure ===

    /// Start `player`'s turn: refresh ink, expire effects, run start-of-turn
    /// effects, and dispatch `TurnBegins`.
    pub fn begin_turn(&mut self, player: PlayerId) -> Result<Vec<ActionResult>> {
        self.state.check_player(player)?;
        if self.turn_started {
            self.state.turn_number += 1;
        }
        self.turn_started = true;
        self.state.active_player = player;
        self.state.current_phase = Phase::Ready;
        self.state.players[player].ink_available = self.state.zones.zone_size(player, Zone::Inkwell) as i64;

        self.timing.start_turn(self.state.turn_number, player);
        self.timing.check_and_queue_expired_effects(&mut self.queue, &self.state);
        self.queue_automatic(AutomaticTrigger::StartOfTurn, None, "start_of_turn");

        tracing::debug!(turn = self.state.turn_number, %player, "turn begins");
        self.dispatch(EventContext::turn_begins(player, self.state.turn_number));
        self.run_until_stable()
    }

    /// End the active player's turn: run end-of-turn effects, dispatch
    /// `TurnEnds`, and expire this-turn effects.
    pub fn end_turn(&mut self) -> Result<Vec<ActionResult>> {
        let player = self.state.active_player;
        self.queue_automatic(AutomaticTrigger::EndOfTurn, None, "end_of_turn");
        self.dispatch(
            EventContext::new(EventKind::TurnEnds)
                .with_player(player)
                .with_amount(i64::from(self.state.turn_number)),
        );
        let mut results = self.run_until_stable()?;

        self.timing.end_turn();
        self.timing.check_and_queue_expired_effects(&mut self.queue, &self.state);
        results.extend(self.run_until_stable()?);
        tracing::debug!(turn = self.state.turn_number, %player, "turn ends");
        Ok(results)
    }

    /// Enter `phase`, running phase-start effects and dispatching
    /// `PhaseChanges`.
    pub fn begin_phase(&mut self, phase: Phase) -> Result<Vec<ActionResult>> {
        self.state.current_phase = phase;
        self.timing.start_phase(phase);
        self.timing.check_and_queue_expired_effects(&mut self.queue, &self.state);
        self.queue_automatic(AutomaticTrigger::PhaseStart(phase), Some(phase), "phase_start");
        self.dispatch(EventContext::phase_changes(self.state.active_player, phase));
        self.run_until_stable()
    }

    /// Leave `phase`, running phase-end effects.
    pub fn end_phase(&mut self, phase: Phase) -> Result<Vec<ActionResult>> {
        self.queue_automatic(AutomaticTrigger::PhaseEnd(phase), Some(phase), "phase_end");
        let mut results = self.run_until_stable()?;
        self.timing.end_phase(phase);
        self.timing.check_and_queue_expired_effects(&mut self.queue, &self.state);
        results.extend(self.run_until_stable()?);
        Ok(results)
    }

    // === Game Actions ===

    /// Pay for and play `card` from its controller's hand.
    ///
    /// Characters, items, and locations enter play and have their abilities
    /// registered; actions and songs resolve to the discard.
    pub fn play_card(&mut self, card: EntityId) -> Result<Vec<ActionResult>> {
        if self.state.zone_of(card) != Some(Zone::Hand) {
            return Err(RulesError::NotInZone {
                entity: card,
                expected: Zone::Hand,
            });
        }
        let player = self.state.controller_of(card)?;
        let cost = self.modified_cost(card)?;
        let available = self.state.player(player)?.ink_available;
        if cost > available {
            return Err(RulesError::InsufficientInk {
                player,
                needed: cost,
                available,
            });
        }
        self.state.players[player].ink_available -= cost;

        let kind = self.state.card(card)?.definition.kind;
        let destination = match kind {
            CardKind::Character | CardKind::Item | CardKind::Location => Zone::Play,
            CardKind::Action | CardKind::Song => Zone::Discard,
        };
        self.state.move_card(card, destination, ZonePosition::Top)?;
        tracing::debug!(%card, %player, cost, "card played");

        if destination == Zone::Play {
            let (_, errors) = self.materialize(card)?;
            if !errors.is_empty() {
                tracing::warn!(%card, unknown = errors.len(), "card entered play with unimplemented abilities");
            }
            self.costs.activate_modifiers_by_source(card);
        }

        let played = |kind: EventKind| {
            EventContext::new(kind)
                .with_source(card)
                .with_player(player)
                .with_amount(cost)
        };
        match kind {
            CardKind::Character => {
                self.dispatch(played(EventKind::CharacterPlayed));
                self.dispatch(played(EventKind::CharacterEntersPlay).with_zones(Zone::Hand, Zone::Play));
            }
            CardKind::Action => {
                self.dispatch(played(EventKind::ActionPlayed));
            }
            CardKind::Song => {
                self.dispatch(played(EventKind::SongPlayed));
            }
            CardKind::Item | CardKind::Location => {
                self.dispatch(played(EventKind::ItemPlayed));
            }
        }
        self.run_until_stable()
    }

    /// Put an inkable card from hand into its controller's inkwell.
    pub fn ink_card(&mut self, card: EntityId) -> Result<Vec<ActionResult>> {
        if self.state.zone_of(card) != Some(Zone::Hand) {
            return Err(RulesError::NotInZone {
                entity: card,
                expected: Zone::Hand,
            });
        }
        let instance = self.state.card(card)?;
        if !instance.definition.inkable {
            return Err(RulesError::InvalidTarget {
                effect: "ink".into(),
                target: instance.name().to_owned(),
            });
        }
        let player = instance.controller;
        self.state.move_card(card, Zone::Inkwell, ZonePosition::Top)?;
        self.state.players[player].ink_available += 1;

        self.dispatch(EventContext::new(EventKind::InkPlayed).with_source(card).with_player(player));
        self.run_until_stable()
    }

    /// Exert a ready character in play to gain its lore.
    pub fn quest(&mut self, card: EntityId) -> Result<Vec<ActionResult>> {
        self.ready_character(card, "quest")?;
        let player = self.state.controller_of(card)?;
        let lore = self.state.card(card)?.lore();
        self.state.exert(card)?;

        let mut context = ActionContext::default().with_player(player).with_reason("quest");
        context.source = Some(card);
        self.queue.enqueue(
            ActionRequest::new(Effect::GainLore(lore), Target::Card(card), context)
                .with_priority(ActionPriority::Immediate),
        );
        self.dispatch(
            EventContext::new(EventKind::CharacterQuests)
                .with_source(card)
                .with_player(player)
                .with_amount(lore),
        );
        self.run_until_stable()
    }

    /// Challenge an exerted opposing character.
    ///
    /// Both characters deal damage equal to their strength to each other;
    /// whichever is defeated is banished and `CharacterBanishedInChallenge`
    /// is dispatched for it.
    pub fn challenge(&mut self, attacker: EntityId, defender: EntityId) -> Result<Vec<ActionResult>> {
        self.ready_character(attacker, "challenge")?;
        if self.state.zone_of(defender) != Some(Zone::Play) {
            return Err(RulesError::NotInZone {
                entity: defender,
                expected: Zone::Play,
            });
        }
        let player = self.state.controller_of(attacker)?;
        let defending = self.state.card(defender)?;
        if defending.controller == player || !defending.exerted {
            return Err(RulesError::InvalidTarget {
                effect: "challenge".into(),
                target: defending.name().to_owned(),
            });
        }

        let attack = self.state.card(attacker)?.strength().max(0);
        let counter = defending.strength().max(0);
        self.state.exert(attacker)?;
        self.challenge = Some((attacker, defender));

        for (from, to, amount) in [(attacker, defender, attack), (defender, attacker, counter)] {
            let mut context = ActionContext::default().with_reason("challenge");
            context.source = Some(from);
            context.player = self.state.controller_of(from).ok();
            self.queue.enqueue(
                ActionRequest::new(Effect::damage(amount), Target::Card(to), context)
                    .with_priority(ActionPriority::Immediate),
            );
        }

        self.dispatch(
            EventContext::new(EventKind::CharacterChallenges)
                .with_source(attacker)
                .with_target(defender)
                .with_player(player),
        );
        self.dispatch(
            EventContext::new(EventKind::CharacterDealsDamage)
                .with_source(attacker)
                .with_target(defender)
                .with_player(player)
                .with_amount(attack),
        );
        self.run_until_stable()
    }

    fn ready_character(&self, card: EntityId, action: &str) -> Result<()> {
        if self.state.zone_of(card) != Some(Zone::Play) {
            return Err(RulesError::NotInZone {
                entity: card,
                expected: Zone::Play,
            });
        }
        let instance = self.state.card(card)?;
        if instance.exerted || instance.definition.kind != CardKind::Character {
            return Err(RulesError::InvalidTarget {
                effect: action.into(),
                target: instance.name().to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::AbilityBuilder;
    use crate::cards::{AbilitySpec, CardDefinition, Stat};
    use crate::choice::ChoiceEffect;
    use crate::effects::TargetSelector;
    use crate::modifiers::{CostFilter, CostModifier};
    use crate::triggers::{when_quests, when_turn_begins};

    fn p(n: u8) -> PlayerId {
        PlayerId::new(n)
    }

    fn hero() -> CardDefinition {
        CardDefinition::character("Hero", 3, 2, 3, 2)
    }

    #[test]
    fn test_quest_gains_lore_and_exerts() {
        let mut state = GameState::new(2, 0);
        let id = state.add_card(hero(), p(0), Zone::Play);
        let mut engine = RulesEngine::new(state);

        engine.quest(id).unwrap();
        assert_eq!(engine.state().players[p(0)].lore, 2);
        assert!(engine.state().card(id).unwrap().exerted);

        // an exerted character cannot quest again
        assert!(matches!(engine.quest(id), Err(RulesError::InvalidTarget { .. })));
    }

    #[test]
    fn test_quest_trigger_runs_after_lore() {
        let mut state = GameState::new(2, 0);
        let id = state.add_card(hero(), p(0), Zone::Play);
        state.add_card(hero(), p(0), Zone::Deck);
        let mut engine = RulesEngine::new(state);
        engine
            .bus_mut()
            .register(AbilityBuilder::new("SCOUT", id).when(when_quests(id)).apply(Effect::Draw(1)).build());

        let results = engine.quest(id).unwrap();
        let kinds: Vec<_> = results.iter().map(|r| r.effect_kind).collect();
        assert_eq!(kinds, vec!["GainLore", "AbilityTrigger"]);
        assert_eq!(engine.state().hand(p(0)).len(), 1);
    }

    #[test]
    fn test_challenge_banishes_defeated() {
        let mut state = GameState::new(2, 0);
        let attacker = state.add_card(CardDefinition::character("Big", 3, 4, 5, 1), p(0), Zone::Play);
        let defender = state.add_card(CardDefinition::character("Small", 1, 1, 2, 1), p(1), Zone::Play);
        state.exert(defender).unwrap();
        let mut engine = RulesEngine::new(state);

        engine.challenge(attacker, defender).unwrap();
        assert_eq!(engine.state().zone_of(defender), Some(Zone::Discard));
        assert_eq!(engine.state().card(attacker).unwrap().damage, 1);
        assert!(engine.queue().is_empty());
    }

    #[test]
    fn test_challenge_requires_exerted_enemy() {
        let mut state = GameState::new(2, 0);
        let a = state.add_card(hero(), p(0), Zone::Play);
        let b = state.add_card(hero(), p(1), Zone::Play);
        let mut engine = RulesEngine::new(state);
        assert!(matches!(engine.challenge(a, b), Err(RulesError::InvalidTarget { .. })));
        assert!(!engine.state().card(a).unwrap().exerted);
    }

    #[test]
    fn test_play_card_pays_modified_cost() {
        let mut state = GameState::new(2, 0);
        let card = state.add_card(hero(), p(0), Zone::Hand);
        let source = state.add_card(hero(), p(0), Zone::Play);
        state.players[p(0)].ink_available = 2;
        let mut engine = RulesEngine::new(state);
        engine
            .costs_mut()
            .register(CostModifier::reduction("discount", source, 1, CostFilter::Any).activated());

        assert_eq!(engine.modified_cost(card).unwrap(), 2);
        engine.play_card(card).unwrap();
        assert_eq!(engine.state().zone_of(card), Some(Zone::Play));
        assert_eq!(engine.state().players[p(0)].ink_available, 0);
    }

    #[test]
    fn test_play_card_insufficient_ink() {
        let mut state = GameState::new(2, 0);
        let card = state.add_card(hero(), p(0), Zone::Hand);
        let mut engine = RulesEngine::new(state);
        let err = engine.play_card(card).unwrap_err();
        assert_eq!(
            err,
            RulesError::InsufficientInk {
                player: p(0),
                needed: 3,
                available: 0
            }
        );
        assert_eq!(engine.state().zone_of(card), Some(Zone::Hand));
    }

    #[test]
    fn test_ink_card() {
        let mut state = GameState::new(2, 0);
        let card = state.add_card(hero(), p(0), Zone::Hand);
        let dud = state.add_card(hero().uninkable(), p(0), Zone::Hand);
        let mut engine = RulesEngine::new(state);

        engine.ink_card(card).unwrap();
        assert_eq!(engine.state().zone_of(card), Some(Zone::Inkwell));
        assert_eq!(engine.state().players[p(0)].ink_available, 1);
        assert!(engine.ink_card(dud).is_err());
    }

    #[test]
    fn test_turns_advance_and_expire_effects() {
        let mut state = GameState::new(2, 0);
        let id = state.add_card(hero(), p(0), Zone::Play);
        let mut engine = RulesEngine::new(state);

        engine.begin_turn(p(0)).unwrap();
        assert_eq!(engine.state().turn_number, 1);
        engine.enqueue(ActionRequest::new(
            Effect::stat_this_turn(Stat::Strength, 2),
            Target::Card(id),
            ActionContext::default(),
        ));
        engine.run_until_stable().unwrap();
        assert_eq!(engine.state().card(id).unwrap().strength(), 5);

        engine.end_turn().unwrap();
        engine.begin_turn(p(1)).unwrap();
        assert_eq!(engine.state().turn_number, 2);
        assert_eq!(engine.state().active_player, p(1));
        assert_eq!(engine.state().card(id).unwrap().strength(), 3);
    }

    #[test]
    fn test_choice_pauses_then_resumes() {
        let mut state = GameState::new(2, 0);
        let id = state.add_card(hero(), p(0), Zone::Play);
        state.add_card(hero(), p(0), Zone::Deck);
        let mut engine = RulesEngine::new(state);
        engine.bus_mut().register(
            AbilityBuilder::new("MAYBE", id)
                .when(when_turn_begins(None))
                .target(TargetSelector::NoTarget)
                .apply(ChoiceEffect::may("Draw a card?", Effect::Draw(1)).into())
                .build(),
        );

        engine.begin_turn(p(0)).unwrap();
        assert!(engine.is_waiting_for_choice());
        let choice_id = engine.current_choice().unwrap().choice_id.clone();

        assert!(!engine.provide_choice(&choice_id, "nonsense").unwrap());
        assert!(engine.provide_choice(&choice_id, "yes").unwrap());
        assert!(!engine.is_waiting_for_choice());
        assert_eq!(engine.state().hand(p(0)).len(), 1);
    }

    #[test]
    fn test_register_unknown_ability() {
        let mut state = GameState::new(2, 0);
        let id = state.add_card(
            hero()
                .with_ability(AbilitySpec::named("DANCE-OFF"))
                .with_ability(AbilitySpec::named("NOT A THING")),
            p(0),
            Zone::Play,
        );
        let mut engine = RulesEngine::new(state);
        assert_eq!(
            engine.register_card_abilities(id),
            Err(RulesError::UnknownAbility("NOT A THING".into()))
        );
        assert_eq!(engine.bus().len(), 1);
        assert_eq!(engine.unregister_card_abilities(id), 1);
    }
}
