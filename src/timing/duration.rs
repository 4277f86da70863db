//! Durations and the temporary-effect records they govern.

use std::fmt;
use std::rc::Rc;

use crate::core::{EntityId, GameState, Phase};
use crate::effects::{ActionContext, Effect, Target};
use crate::error::Result;
use crate::events::{EventContext, EventKind};

/// Signature for `UntilCondition` expiry checks.
pub type ExpiryFn = Rc<dyn Fn(&GameState) -> Result<bool>>;

/// How long a temporary effect lasts.
#[derive(Clone, Default)]
pub enum Duration {
    #[default]
    Permanent,
    /// Expires once a later turn has started.
    UntilEndOfTurn,
    /// Expires once this many turns have started since registration.
    Turns(u32),
    /// Expiry follows the configured `PhaseDurationPolicy`.
    Phases(u32),
    /// Expires when the predicate returns `true`. Faults count as "not yet".
    UntilCondition { name: String, predicate: ExpiryFn },
}

impl Duration {
    pub fn until(name: impl Into<String>, predicate: impl Fn(&GameState) -> Result<bool> + 'static) -> Self {
        Duration::UntilCondition {
            name: name.into(),
            predicate: Rc::new(predicate),
        }
    }

    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Duration::Permanent)
    }

    /// Short tag: `permanent`, `until_end_of_turn`, `turns`, `phases`,
    /// `until_condition`.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Duration::Permanent => "permanent",
            Duration::UntilEndOfTurn => "until_end_of_turn",
            Duration::Turns(_) => "turns",
            Duration::Phases(_) => "phases",
            Duration::UntilCondition { .. } => "until_condition",
        }
    }

    /// Text appended to effect descriptions.
    #[must_use]
    pub fn suffix(&self) -> String {
        match self {
            Duration::Permanent => String::new(),
            Duration::UntilEndOfTurn => " this turn".to_string(),
            Duration::Turns(n) => format!(" for {n} turn(s)"),
            Duration::Phases(n) => format!(" for {n} phase(s)"),
            Duration::UntilCondition { name, .. } => format!(" until {name}"),
        }
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Duration::Turns(n) | Duration::Phases(n) => write!(f, "{}({n})", self.kind_name()),
            Duration::UntilCondition { name, .. } => write!(f, "until_condition({name})"),
            _ => f.write_str(self.kind_name()),
        }
    }
}

/// A registered effect waiting to expire.
///
/// On expiry the record becomes an `Effect::ExpireTemporary` cleanup
/// action that applies `removal` to `target`.
#[derive(Clone, Debug)]
pub struct TemporaryEffect {
    /// Assigned at registration (`temp_{n}`).
    pub id: String,
    pub description: String,
    pub target: Target,
    pub source: Option<EntityId>,
    pub removal: Effect,
    pub duration: Duration,

    // === Stamped at registration ===
    /// Turns started when registered.
    pub registered_turn: usize,
    pub registered_phase: Option<Phase>,
    /// Phases started when registered.
    pub registered_phase_count: u64,
}

impl TemporaryEffect {
    #[must_use]
    pub fn new(description: impl Into<String>, target: Target, removal: Effect, duration: Duration) -> Self {
        Self {
            id: String::new(),
            description: description.into(),
            target,
            source: None,
            removal,
            duration,
            registered_turn: 0,
            registered_phase: None,
            registered_phase_count: 0,
        }
    }

    /// Set the source card (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: Option<EntityId>) -> Self {
        self.source = source;
        self
    }

    /// The "effect expired" notification for this record.
    pub fn expired_event(&self, target: &Target, context: &ActionContext) -> EventContext {
        let mut event = EventContext::new(EventKind::EffectExpired).with_source_opt(context.source.or(self.source));
        if let Some(card) = target.cards().first() {
            event = event.with_target(*card);
        }
        event.data.effect_id = Some(self.id.clone());
        event
    }
}

impl fmt::Display for TemporaryEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.description, self.duration)
    }
}
