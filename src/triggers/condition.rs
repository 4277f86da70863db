//! Trigger conditions.
//!
//! A condition decides whether a listener reacts to an event. Conditions
//! also declare which event kinds they care about, so the event bus only
//! offers them matching events.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, GameState, PlayerId};
use crate::error::Result;
use crate::events::{EventContext, EventKind};

/// What a trigger condition can see.
pub struct TriggerContext<'a> {
    pub event: &'a EventContext,
    pub state: &'a GameState,
    /// The card whose ability is listening.
    pub owner: Option<EntityId>,
}

impl<'a> TriggerContext<'a> {
    pub fn new(event: &'a EventContext, state: &'a GameState) -> Self {
        Self {
            event,
            state,
            owner: None,
        }
    }

    #[must_use]
    pub fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    fn controller(&self, id: Option<EntityId>) -> Option<PlayerId> {
        id.and_then(|id| self.state.get_card(id)).map(|c| c.controller)
    }
}

pub type TriggerFn = Rc<dyn Fn(&TriggerContext<'_>) -> Result<bool>>;

/// A named closure condition.
#[derive(Clone)]
pub struct CustomTrigger {
    pub name: String,
    pub predicate: TriggerFn,
}

impl fmt::Debug for CustomTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomTrigger").field(&self.name).finish()
    }
}

impl PartialEq for CustomTrigger {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Rc::ptr_eq(&self.predicate, &other.predicate)
    }
}

/// A condition that must hold for a listener to trigger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TriggerCondition {
    // === Event Type Matching ===
    /// The event is of this kind.
    Event(EventKind),

    // === Entity Filters ===
    SourceIs(EntityId),
    TargetIs(EntityId),
    /// The event concerns this player.
    ForPlayer(PlayerId),
    SourceControlledBy(PlayerId),
    TargetControlledBy(PlayerId),
    /// The source shares a controller with the listening card.
    FriendlySource,
    SourceHasSubtype(String),

    // === Data Filters ===
    AmountAtLeast(i64),
    /// `extra[key] == value`.
    Extra { key: String, value: i64 },

    // === Combinators ===
    All(Vec<TriggerCondition>),
    Any(Vec<TriggerCondition>),
    Not(Box<TriggerCondition>),

    // === Special ===
    Always,
    Never,
    /// Closure condition. Not serializable.
    #[serde(skip)]
    Custom(CustomTrigger),
}

impl TriggerCondition {
    pub fn custom(name: impl Into<String>, predicate: impl Fn(&TriggerContext<'_>) -> Result<bool> + 'static) -> Self {
        Self::Custom(CustomTrigger {
            name: name.into(),
            predicate: Rc::new(predicate),
        })
    }

    /// Add another condition with AND.
    #[must_use]
    pub fn and(self, other: TriggerCondition) -> Self {
        match self {
            Self::All(mut conditions) => {
                conditions.push(other);
                Self::All(conditions)
            }
            _ => Self::All(vec![self, other]),
        }
    }

    /// Add another condition with OR.
    #[must_use]
    pub fn or(self, other: TriggerCondition) -> Self {
        match self {
            Self::Any(mut conditions) => {
                conditions.push(other);
                Self::Any(conditions)
            }
            _ => Self::Any(vec![self, other]),
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Event kinds this condition can match, in first-seen order.
    ///
    /// Combinators declare the union of their parts. Pure filters declare
    /// nothing.
    #[must_use]
    pub fn relevant_events(&self) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        self.collect_events(&mut kinds);
        kinds
    }

    fn collect_events(&self, out: &mut Vec<EventKind>) {
        match self {
            Self::Event(kind) => {
                if !out.contains(kind) {
                    out.push(*kind);
                }
            }
            Self::All(conditions) | Self::Any(conditions) => {
                for condition in conditions {
                    condition.collect_events(out);
                }
            }
            Self::Not(inner) => inner.collect_events(out),
            _ => {}
        }
    }

    /// Evaluate against an event. Only custom conditions can fail.
    pub fn evaluate(&self, ctx: &TriggerContext<'_>) -> Result<bool> {
        let event = ctx.event;
        Ok(match self {
            Self::Event(kind) => event.kind == *kind,
            Self::SourceIs(id) => event.source == Some(*id),
            Self::TargetIs(id) => event.target == Some(*id),
            Self::ForPlayer(player) => event.player == Some(*player),
            Self::SourceControlledBy(player) => ctx.controller(event.source) == Some(*player),
            Self::TargetControlledBy(player) => ctx.controller(event.target) == Some(*player),
            Self::FriendlySource => {
                let owner = ctx.controller(ctx.owner);
                owner.is_some() && owner == ctx.controller(event.source)
            }
            Self::SourceHasSubtype(subtype) => event
                .source
                .and_then(|id| ctx.state.get_card(id))
                .is_some_and(|card| card.definition.has_subtype(subtype)),
            Self::AmountAtLeast(min) => event.data.amount.is_some_and(|a| a >= *min),
            Self::Extra { key, value } => event.data.extra.get(key) == Some(value),
            Self::All(conditions) => {
                for condition in conditions {
                    if !condition.evaluate(ctx)? {
                        return Ok(false);
                    }
                }
                true
            }
            Self::Any(conditions) => {
                for condition in conditions {
                    if condition.evaluate(ctx)? {
                        return Ok(true);
                    }
                }
                false
            }
            Self::Not(inner) => !inner.evaluate(ctx)?,
            Self::Always => true,
            Self::Never => false,
            Self::Custom(custom) => (custom.predicate)(ctx)?,
        })
    }

    /// Evaluate, folding a fault into `false` with a warning.
    #[must_use]
    pub fn check(&self, ctx: &TriggerContext<'_>) -> bool {
        self.evaluate(ctx).unwrap_or_else(|err| {
            tracing::warn!(condition = %self, event = %ctx.event.kind, %err, "trigger condition failed");
            false
        })
    }
}

impl std::ops::Not for TriggerCondition {
    type Output = TriggerCondition;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

impl fmt::Display for TriggerCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |f: &mut fmt::Formatter<'_>, conditions: &[TriggerCondition], sep: &str| {
            let parts: Vec<String> = conditions.iter().map(ToString::to_string).collect();
            write!(f, "({})", parts.join(sep))
        };
        match self {
            Self::Event(kind) => write!(f, "on {kind}"),
            Self::SourceIs(id) => write!(f, "source is {id}"),
            Self::TargetIs(id) => write!(f, "target is {id}"),
            Self::ForPlayer(player) => write!(f, "for {player}"),
            Self::SourceControlledBy(player) => write!(f, "source controlled by {player}"),
            Self::TargetControlledBy(player) => write!(f, "target controlled by {player}"),
            Self::FriendlySource => f.write_str("friendly source"),
            Self::SourceHasSubtype(subtype) => write!(f, "source is {subtype}"),
            Self::AmountAtLeast(min) => write!(f, "amount >= {min}"),
            Self::Extra { key, value } => write!(f, "{key} = {value}"),
            Self::All(conditions) => list(f, conditions, " and "),
            Self::Any(conditions) => list(f, conditions, " or "),
            Self::Not(inner) => write!(f, "not {inner}"),
            Self::Always => f.write_str("always"),
            Self::Never => f.write_str("never"),
            Self::Custom(custom) => f.write_str(&custom.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardDefinition;
    use crate::error::RulesError;
    use crate::zones::Zone;

    fn setup() -> (GameState, EntityId, EntityId) {
        let mut state = GameState::new(2, 42);
        let mine = state.add_card(
            CardDefinition::character("Mine", 2, 2, 2, 1).with_subtype("Hero"),
            PlayerId::new(0),
            Zone::Play,
        );
        let theirs = state.add_card(CardDefinition::character("Theirs", 2, 2, 2, 1), PlayerId::new(1), Zone::Play);
        (state, mine, theirs)
    }

    #[test]
    fn test_event_and_entity_filters() {
        let (state, mine, theirs) = setup();
        let event = EventContext::new(EventKind::CharacterChallenges)
            .with_source(mine)
            .with_target(theirs);
        let ctx = TriggerContext::new(&event, &state);

        assert!(TriggerCondition::Event(EventKind::CharacterChallenges).check(&ctx));
        assert!(!TriggerCondition::Event(EventKind::CharacterQuests).check(&ctx));
        assert!(TriggerCondition::SourceIs(mine).check(&ctx));
        assert!(TriggerCondition::TargetControlledBy(PlayerId::new(1)).check(&ctx));
        assert!(TriggerCondition::SourceHasSubtype("Hero".into()).check(&ctx));
        assert!(!TriggerCondition::SourceControlledBy(PlayerId::new(1)).check(&ctx));
    }

    #[test]
    fn test_friendly_source_uses_owner() {
        let (state, mine, theirs) = setup();
        let event = EventContext::new(EventKind::CharacterQuests).with_source(mine);

        assert!(TriggerCondition::FriendlySource.check(&TriggerContext::new(&event, &state).with_owner(mine)));
        assert!(!TriggerCondition::FriendlySource.check(&TriggerContext::new(&event, &state).with_owner(theirs)));
        assert!(!TriggerCondition::FriendlySource.check(&TriggerContext::new(&event, &state)));
    }

    #[test]
    fn test_combinators_and_relevant_events() {
        let (state, mine, _) = setup();
        let quest = TriggerCondition::Event(EventKind::CharacterQuests);
        let challenge = TriggerCondition::Event(EventKind::CharacterChallenges);

        let either = quest.clone().or(challenge.clone());
        assert_eq!(either.relevant_events(), vec![EventKind::CharacterQuests, EventKind::CharacterChallenges]);

        let mine_quests = quest.and(TriggerCondition::SourceIs(mine));
        assert_eq!(mine_quests.relevant_events(), vec![EventKind::CharacterQuests]);

        let event = EventContext::new(EventKind::CharacterQuests).with_source(mine);
        let ctx = TriggerContext::new(&event, &state);
        assert!(mine_quests.check(&ctx));
        assert!(!(!mine_quests.clone()).check(&ctx));
        assert!(TriggerCondition::Extra { key: "x".into(), value: 1 }.relevant_events().is_empty());
    }

    #[test]
    fn test_custom_faults_fold_to_false() {
        let (state, _, _) = setup();
        let event = EventContext::new(EventKind::CardDrawn);
        let ctx = TriggerContext::new(&event, &state);

        let failing = TriggerCondition::custom("explodes", |_| Err(RulesError::predicate("no data")));
        assert!(failing.evaluate(&ctx).is_err());
        assert!(!failing.check(&ctx));

        let big = TriggerCondition::custom("big", |c| Ok(c.event.data.amount.unwrap_or(0) > 2));
        assert!(!big.check(&ctx));
    }

    #[test]
    fn test_condition_serialization() {
        let condition = TriggerCondition::All(vec![
            TriggerCondition::Event(EventKind::CharacterTakesDamage),
            TriggerCondition::AmountAtLeast(2),
        ]);
        let json = serde_json::to_string(&condition).unwrap();
        let back: TriggerCondition = serde_json::from_str(&json).unwrap();
        assert_eq!(condition, back);
    }
}
