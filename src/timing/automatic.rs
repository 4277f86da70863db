//! Effects that fire on turn structure rather than on card triggers.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{GameState, Phase, PlayerId};
use crate::effects::Effect;
use crate::error::Result;
use crate::events::{EventContext, EventKind};

/// When an automatic effect fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutomaticTrigger {
    StartOfTurn,
    EndOfTurn,
    PhaseStart(Phase),
    PhaseEnd(Phase),
}

/// What an automatic-effect condition can see.
pub struct AutomaticContext<'a> {
    pub state: &'a GameState,
    pub player: PlayerId,
    pub phase: Option<Phase>,
    pub event: Option<&'a EventContext>,
}

pub type AutomaticCondition = Rc<dyn Fn(&AutomaticContext<'_>) -> Result<bool>>;

/// Wrap a closure as an automatic-effect condition.
pub fn automatic_condition(f: impl Fn(&AutomaticContext<'_>) -> Result<bool> + 'static) -> AutomaticCondition {
    Rc::new(f)
}

#[derive(Clone)]
struct Registration {
    effect: Effect,
    condition: Option<AutomaticCondition>,
}

impl Registration {
    fn fires(&self, ctx: &AutomaticContext<'_>) -> bool {
        match &self.condition {
            None => true,
            Some(condition) => condition(ctx).unwrap_or_else(|err| {
                tracing::warn!(effect = %self.effect, %err, "automatic effect condition failed");
                false
            }),
        }
    }
}

#[derive(Clone)]
struct ConditionalTrigger {
    events: Vec<EventKind>,
    effect: Effect,
    condition: AutomaticCondition,
}

/// Counts of registrations per trigger class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCounts {
    pub start_of_turn: usize,
    pub end_of_turn: usize,
    pub phase_start: usize,
    pub phase_end: usize,
    pub conditional: usize,
}

/// Registry of turn-structure effects, each with an optional condition.
#[derive(Clone, Default)]
pub struct AutomaticEffectRegistry {
    start_of_turn: Vec<Registration>,
    end_of_turn: Vec<Registration>,
    phase_start: FxHashMap<Phase, Vec<Registration>>,
    phase_end: FxHashMap<Phase, Vec<Registration>>,
    conditional: Vec<ConditionalTrigger>,
}

impl AutomaticEffectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_start_of_turn(&mut self, effect: Effect, condition: Option<AutomaticCondition>) {
        self.start_of_turn.push(Registration { effect, condition });
    }

    pub fn register_end_of_turn(&mut self, effect: Effect, condition: Option<AutomaticCondition>) {
        self.end_of_turn.push(Registration { effect, condition });
    }

    pub fn register_phase_start(&mut self, phase: Phase, effect: Effect, condition: Option<AutomaticCondition>) {
        self.phase_start
            .entry(phase)
            .or_default()
            .push(Registration { effect, condition });
    }

    pub fn register_phase_end(&mut self, phase: Phase, effect: Effect, condition: Option<AutomaticCondition>) {
        self.phase_end
            .entry(phase)
            .or_default()
            .push(Registration { effect, condition });
    }

    /// Fire `effect` on any of `events` when `condition` holds.
    pub fn register_conditional_trigger(
        &mut self,
        events: Vec<EventKind>,
        effect: Effect,
        condition: impl Fn(&AutomaticContext<'_>) -> Result<bool> + 'static,
    ) {
        self.conditional.push(ConditionalTrigger {
            events,
            effect,
            condition: Rc::new(condition),
        });
    }

    /// Effects due for `trigger`, in registration order.
    pub fn get_automatic_effects(&self, trigger: AutomaticTrigger, ctx: &AutomaticContext<'_>) -> Vec<Effect> {
        let registrations: &[Registration] = match trigger {
            AutomaticTrigger::StartOfTurn => &self.start_of_turn,
            AutomaticTrigger::EndOfTurn => &self.end_of_turn,
            AutomaticTrigger::PhaseStart(phase) => self.phase_start.get(&phase).map_or(&[][..], Vec::as_slice),
            AutomaticTrigger::PhaseEnd(phase) => self.phase_end.get(&phase).map_or(&[][..], Vec::as_slice),
        };
        let due: Vec<Effect> = registrations
            .iter()
            .filter(|r| r.fires(ctx))
            .map(|r| r.effect.clone())
            .collect();
        if !due.is_empty() {
            tracing::debug!(?trigger, count = due.len(), "automatic effects due");
        }
        due
    }

    /// Conditional effects due for `event`. Faulting conditions count as false.
    pub fn get_conditional_effects(&self, event: &EventContext, ctx: &AutomaticContext<'_>) -> Vec<Effect> {
        self.conditional
            .iter()
            .filter(|t| t.events.contains(&event.kind))
            .filter(|t| {
                (t.condition)(ctx).unwrap_or_else(|err| {
                    tracing::warn!(event = %event.kind, %err, "conditional trigger failed");
                    false
                })
            })
            .map(|t| t.effect.clone())
            .collect()
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
        tracing::debug!("automatic effects cleared");
    }

    #[must_use]
    pub fn registration_count(&self) -> RegistrationCounts {
        RegistrationCounts {
            start_of_turn: self.start_of_turn.len(),
            end_of_turn: self.end_of_turn.len(),
            phase_start: self.phase_start.values().map(Vec::len).sum(),
            phase_end: self.phase_end.values().map(Vec::len).sum(),
            conditional: self.conditional.len(),
        }
    }
}

impl fmt::Debug for AutomaticEffectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomaticEffectRegistry")
            .field("counts", &self.registration_count())
            .finish()
    }
}
