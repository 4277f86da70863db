//! Turn history and temporary-effect expiry.
//!
//! `TurnTiming` keeps an append-only history of turns (with their phases
//! and recorded events) stamped by a monotonically increasing logical
//! clock. It also tracks temporary effects and decides when they expire.
//!
//! Expiry is measured in turns *started*: a record registered during the
//! Nth started turn is stamped `registered_turn = N`.
//!
//! | Duration           | Expired when                                  |
//! |--------------------|-----------------------------------------------|
//! | `UntilEndOfTurn`   | `current_turn > registered_turn`              |
//! | `Turns(n)`         | `current_turn >= registered_turn + n`         |
//! | `Phases(n)`        | per `PhaseDurationPolicy`                     |
//! | `UntilCondition`   | predicate is `true` (faults count as `false`) |
//! | `Permanent`        | never                                         |
//!
//! Expired records are never removed silently: the scheduler turns each
//! into a Cleanup-priority queued action.

use serde::{Deserialize, Serialize};

use super::duration::{Duration, TemporaryEffect};
use crate::core::{GameState, Phase, PhaseDurationPolicy, PlayerId};
use crate::effects::{ActionContext, Effect};
use crate::events::EventContext;
use crate::queue::{ActionPriority, ActionQueue, ActionRequest};

/// An event recorded against the turn clock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub timestamp: u64,
    pub event: EventContext,
}

/// One phase inside a turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub start_time: u64,
    pub end_time: Option<u64>,
    pub events: Vec<TimedEvent>,
}

/// One turn in the history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInfo {
    pub turn_number: u32,
    pub player: PlayerId,
    pub start_time: u64,
    pub end_time: Option<u64>,
    pub phases: Vec<PhaseRecord>,
    pub events: Vec<TimedEvent>,
}

impl TurnInfo {
    /// The most recently started phase that has not ended.
    #[must_use]
    pub fn open_phase(&self) -> Option<Phase> {
        self.phases
            .iter()
            .filter(|p| p.end_time.is_none())
            .max_by_key(|p| p.start_time)
            .map(|p| p.phase)
    }
}

/// Aggregate timing numbers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingStatistics {
    pub turns: usize,
    pub completed_turns: usize,
    pub total_time: u64,
    pub avg_turn_time: f64,
    pub active_temporary_effects: usize,
    pub current_turn: Option<u32>,
}

/// Turn/phase history plus temporary-effect tracking.
#[derive(Clone, Debug, Default)]
pub struct TurnTiming {
    history: im::Vector<TurnInfo>,
    /// Index of the open turn in `history`.
    current: Option<usize>,
    /// Registered records in registration order.
    durations: Vec<TemporaryEffect>,
    clock: u64,
    phases_started: u64,
    next_id: u64,
    phase_policy: PhaseDurationPolicy,
}

impl TurnTiming {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how `Phases` durations expire (builder pattern).
    #[must_use]
    pub fn with_phase_policy(mut self, policy: PhaseDurationPolicy) -> Self {
        self.phase_policy = policy;
        self
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn current_mut(&mut self) -> Option<&mut TurnInfo> {
        let index = self.current?;
        self.history.get_mut(index)
    }

    // === Turn Structure ===

    /// Start a turn, ending the previous one if still open.
    pub fn start_turn(&mut self, turn_number: u32, player: PlayerId) -> &TurnInfo {
        if self.current.is_some() {
            self.end_turn();
        }
        let start_time = self.tick();
        self.history.push_back(TurnInfo {
            turn_number,
            player,
            start_time,
            end_time: None,
            phases: Vec::new(),
            events: Vec::new(),
        });
        let index = self.history.len() - 1;
        self.current = Some(index);
        tracing::debug!(turn_number, %player, "turn started");
        &self.history[index]
    }

    /// End the open turn. Returns the completed turn, if there was one.
    pub fn end_turn(&mut self) -> Option<TurnInfo> {
        self.current?;
        let end_time = self.tick();
        let turn = self.current_mut()?;
        turn.end_time = Some(end_time);
        let completed = turn.clone();
        self.current = None;
        tracing::debug!(turn_number = completed.turn_number, "turn ended");
        Some(completed)
    }

    /// Record a phase start in the open turn.
    pub fn start_phase(&mut self, phase: Phase) {
        if self.current.is_none() {
            return;
        }
        let start_time = self.tick();
        self.phases_started += 1;
        if let Some(turn) = self.current_mut() {
            turn.phases.push(PhaseRecord {
                phase,
                start_time,
                end_time: None,
                events: Vec::new(),
            });
            tracing::debug!(%phase, turn_number = turn.turn_number, "phase started");
        }
    }

    /// Record a phase end in the open turn.
    pub fn end_phase(&mut self, phase: Phase) {
        if self.current.is_none() {
            return;
        }
        let end_time = self.tick();
        if let Some(turn) = self.current_mut() {
            if let Some(record) = turn
                .phases
                .iter_mut()
                .rev()
                .find(|p| p.phase == phase && p.end_time.is_none())
            {
                record.end_time = Some(end_time);
            }
        }
    }

    /// The open phase of the open turn.
    #[must_use]
    pub fn current_phase(&self) -> Option<Phase> {
        self.current.and_then(|i| self.history.get(i)).and_then(TurnInfo::open_phase)
    }

    /// Record an event in the open turn and its open phase.
    pub fn record_event(&mut self, event: &EventContext) {
        if self.current.is_none() {
            return;
        }
        let timed = TimedEvent {
            timestamp: self.tick(),
            event: event.clone(),
        };
        if let Some(turn) = self.current_mut() {
            if let Some(phase) = turn.open_phase() {
                if let Some(record) = turn
                    .phases
                    .iter_mut()
                    .rev()
                    .find(|p| p.phase == phase && p.end_time.is_none())
                {
                    record.events.push(timed.clone());
                }
            }
            turn.events.push(timed);
        }
    }

    // === Temporary Effects ===

    /// Register a temporary effect and return its id.
    pub fn register_temporary_effect(&mut self, mut record: TemporaryEffect) -> String {
        self.next_id += 1;
        record.id = format!("temp_{}", self.next_id);
        record.registered_turn = self.turn_count();
        record.registered_phase = self.current_phase();
        record.registered_phase_count = self.phases_started;
        tracing::debug!(effect_id = %record.id, duration = ?record.duration, "temporary effect registered");
        let id = record.id.clone();
        self.durations.push(record);
        id
    }

    /// Drop a record without expiring it. Returns `false` for unknown ids.
    pub fn unregister_temporary_effect(&mut self, id: &str) -> bool {
        let before = self.durations.len();
        self.durations.retain(|r| r.id != id);
        self.durations.len() != before
    }

    #[must_use]
    pub fn temporary_effect(&self, id: &str) -> Option<&TemporaryEffect> {
        self.durations.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn temporary_effect_count(&self) -> usize {
        self.durations.len()
    }

    /// Remove and return every record expired at `current_turn` (defaults
    /// to the number of turns started).
    pub fn get_expired_effects(&mut self, current_turn: Option<usize>, state: &GameState) -> Vec<TemporaryEffect> {
        let current_turn = current_turn.unwrap_or_else(|| self.turn_count());
        let (expired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.durations)
            .into_iter()
            .partition(|r| self.should_expire(r, current_turn, state));
        self.durations = kept;
        for record in &expired {
            tracing::debug!(effect_id = %record.id, "temporary effect expired");
        }
        expired
    }

    fn should_expire(&self, record: &TemporaryEffect, current_turn: usize, state: &GameState) -> bool {
        match &record.duration {
            Duration::Permanent => false,
            Duration::UntilEndOfTurn => current_turn > record.registered_turn,
            Duration::Turns(n) => current_turn >= record.registered_turn + *n as usize,
            Duration::Phases(n) => match self.phase_policy {
                PhaseDurationPolicy::SameAsEndOfTurn => current_turn > record.registered_turn,
                PhaseDurationPolicy::CountPhases => {
                    self.phases_started >= record.registered_phase_count + u64::from(*n)
                }
            },
            Duration::UntilCondition { name, predicate } => predicate(state).unwrap_or_else(|err| {
                tracing::warn!(condition = %name, %err, "expiry condition failed");
                false
            }),
        }
    }

    /// Queue a Cleanup action for every expired record. Returns how many.
    pub fn check_and_queue_expired_effects(&mut self, queue: &mut ActionQueue, state: &GameState) -> usize {
        let expired = self.get_expired_effects(None, state);
        let count = expired.len();
        for record in expired {
            let description = format!("Effect expired: {}", record.description);
            let target = record.target.clone();
            let context = ActionContext {
                source: record.source,
                ..ActionContext::default()
            }
            .with_reason("duration_expired");
            queue.enqueue(
                ActionRequest::new(Effect::ExpireTemporary(Box::new(record)), target, context)
                    .with_priority(ActionPriority::Cleanup)
                    .with_description(description),
            );
        }
        if count > 0 {
            tracing::debug!(count, "queued expired effects");
        }
        count
    }

    // === History ===

    /// Number of turns started.
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn current_turn_number(&self) -> Option<u32> {
        self.current.and_then(|i| self.history.get(i)).map(|t| t.turn_number)
    }

    #[must_use]
    pub fn turn_info(&self, turn_number: u32) -> Option<&TurnInfo> {
        self.history.iter().find(|t| t.turn_number == turn_number)
    }

    /// The last `count` turns, oldest first.
    #[must_use]
    pub fn recent_turns(&self, count: usize) -> Vec<TurnInfo> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Forget all history and every registered record.
    pub fn clear_history(&mut self) {
        self.history = im::Vector::new();
        self.current = None;
        self.durations.clear();
        self.clock = 0;
        self.phases_started = 0;
        tracing::debug!("turn timing cleared");
    }

    #[must_use]
    pub fn statistics(&self) -> TimingStatistics {
        let completed: Vec<u64> = self
            .history
            .iter()
            .filter_map(|t| t.end_time.map(|end| end - t.start_time))
            .collect();
        let total_time: u64 = completed.iter().sum();
        TimingStatistics {
            turns: self.history.len(),
            completed_turns: completed.len(),
            total_time,
            avg_turn_time: if completed.is_empty() {
                0.0
            } else {
                total_time as f64 / completed.len() as f64
            },
            active_temporary_effects: self.durations.len(),
            current_turn: self.current_turn_number(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Target;
    use crate::events::EventKind;

    fn record(duration: Duration) -> TemporaryEffect {
        TemporaryEffect::new("test", Target::None, Effect::NoEffect, duration)
    }

    #[test]
    fn test_start_turn_closes_previous() {
        let mut timing = TurnTiming::new();
        timing.start_turn(1, PlayerId::new(0));
        timing.start_turn(2, PlayerId::new(1));

        assert_eq!(timing.turn_count(), 2);
        assert!(timing.turn_info(1).unwrap().end_time.is_some());
        assert_eq!(timing.current_turn_number(), Some(2));
        assert!(timing.end_turn().is_some());
        assert!(timing.end_turn().is_none());
    }

    #[test]
    fn test_phases_and_events() {
        let mut timing = TurnTiming::new();
        timing.start_turn(1, PlayerId::new(0));
        timing.start_phase(Phase::Ready);
        timing.end_phase(Phase::Ready);
        timing.start_phase(Phase::Main);
        timing.record_event(&EventContext::new(EventKind::CharacterQuests));

        assert_eq!(timing.current_phase(), Some(Phase::Main));
        let turn = timing.turn_info(1).unwrap();
        assert_eq!(turn.events.len(), 1);
        assert_eq!(turn.phases[1].events.len(), 1);
        assert!(turn.phases[0].events.is_empty());
    }

    #[test]
    fn test_until_end_of_turn() {
        let state = GameState::new(2, 0);
        let mut timing = TurnTiming::new();
        timing.start_turn(1, PlayerId::new(0));
        timing.register_temporary_effect(record(Duration::UntilEndOfTurn));

        assert!(timing.get_expired_effects(Some(1), &state).is_empty());
        assert_eq!(timing.get_expired_effects(Some(2), &state).len(), 1);
        assert_eq!(timing.temporary_effect_count(), 0);
    }

    #[test]
    fn test_turns_duration() {
        let state = GameState::new(2, 0);
        let mut timing = TurnTiming::new();
        timing.start_turn(1, PlayerId::new(0));
        timing.register_temporary_effect(record(Duration::Turns(2)));

        timing.start_turn(2, PlayerId::new(1));
        assert!(timing.get_expired_effects(None, &state).is_empty());
        timing.start_turn(3, PlayerId::new(0));
        assert_eq!(timing.get_expired_effects(None, &state).len(), 1);
    }

    #[test]
    fn test_phase_policies() {
        let state = GameState::new(2, 0);

        let mut same = TurnTiming::new();
        same.start_turn(1, PlayerId::new(0));
        same.register_temporary_effect(record(Duration::Phases(1)));
        same.start_phase(Phase::Set);
        assert!(same.get_expired_effects(None, &state).is_empty());

        let mut counting = TurnTiming::new().with_phase_policy(PhaseDurationPolicy::CountPhases);
        counting.start_turn(1, PlayerId::new(0));
        counting.register_temporary_effect(record(Duration::Phases(1)));
        counting.start_phase(Phase::Set);
        assert_eq!(counting.get_expired_effects(None, &state).len(), 1);
    }

    #[test]
    fn test_until_condition_faults_do_not_expire() {
        let state = GameState::new(2, 0);
        let mut timing = TurnTiming::new();
        timing.register_temporary_effect(record(Duration::until("broken", |_| {
            Err(crate::error::RulesError::predicate("boom"))
        })));
        timing.register_temporary_effect(record(Duration::until("lore", |s| {
            Ok(s.players[PlayerId::new(0)].lore >= 0)
        })));

        let expired = timing.get_expired_effects(None, &state);
        assert_eq!(expired.len(), 1);
        assert_eq!(timing.temporary_effect_count(), 1);
    }

    #[test]
    fn test_unregister() {
        let mut timing = TurnTiming::new();
        let id = timing.register_temporary_effect(record(Duration::UntilEndOfTurn));
        assert!(timing.temporary_effect(&id).is_some());
        assert!(timing.unregister_temporary_effect(&id));
        assert!(!timing.unregister_temporary_effect(&id));
    }

    #[test]
    fn test_check_and_queue_uses_cleanup_priority() {
        let state = GameState::new(2, 0);
        let mut queue = ActionQueue::new();
        let mut timing = TurnTiming::new();
        timing.start_turn(1, PlayerId::new(0));
        timing.register_temporary_effect(record(Duration::UntilEndOfTurn));
        timing.start_turn(2, PlayerId::new(1));

        assert_eq!(timing.check_and_queue_expired_effects(&mut queue, &state), 1);
        let pending = queue.pending_actions();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].priority, ActionPriority::Cleanup);
        assert_eq!(pending[0].context.reason.as_deref(), Some("duration_expired"));
    }

    #[test]
    fn test_statistics() {
        let mut timing = TurnTiming::new();
        timing.start_turn(1, PlayerId::new(0));
        timing.start_turn(2, PlayerId::new(1));

        let stats = timing.statistics();
        assert_eq!(stats.turns, 2);
        assert_eq!(stats.completed_turns, 1);
        assert_eq!(stats.current_turn, Some(2));
        assert_eq!(timing.recent_turns(1)[0].turn_number, 2);

        timing.clear_history();
        assert_eq!(timing.statistics().turns, 0);
    }
}
