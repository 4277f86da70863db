//! Conditions checked by conditional effects.

use std::fmt;
use std::rc::Rc;

use super::context::ActionContext;
use super::target::Target;
use crate::core::GameState;
use crate::error::Result;

/// Signature for ad-hoc effect conditions.
pub type ConditionFn = Rc<dyn Fn(&Target, &ActionContext, &GameState) -> Result<bool>>;

/// A predicate over the effect's target and context.
#[derive(Clone)]
pub enum EffectCondition {
    /// The first targeted card has damage.
    TargetDamaged,
    TargetExerted,
    TargetHasSubtype(String),
    /// The acting player has at least this much lore.
    ControllerLoreAtLeast(i64),
    /// It is the acting player's turn.
    DuringControllersTurn,
    Not(Box<EffectCondition>),
    Custom { name: String, predicate: ConditionFn },
}

impl EffectCondition {
    pub fn custom(
        name: impl Into<String>,
        predicate: impl Fn(&Target, &ActionContext, &GameState) -> Result<bool> + 'static,
    ) -> Self {
        EffectCondition::Custom {
            name: name.into(),
            predicate: Rc::new(predicate),
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        EffectCondition::Not(Box::new(self))
    }

    /// Evaluate, surfacing faults.
    pub fn evaluate(&self, target: &Target, context: &ActionContext, state: &GameState) -> Result<bool> {
        let first_card = || target.cards().first().copied();
        match self {
            EffectCondition::TargetDamaged => match first_card() {
                Some(id) => Ok(state.card(id)?.is_damaged()),
                None => Ok(false),
            },
            EffectCondition::TargetExerted => match first_card() {
                Some(id) => Ok(state.card(id)?.exerted),
                None => Ok(false),
            },
            EffectCondition::TargetHasSubtype(subtype) => match first_card() {
                Some(id) => Ok(state.card(id)?.definition.has_subtype(subtype)),
                None => Ok(false),
            },
            EffectCondition::ControllerLoreAtLeast(min) => match context.acting_player(state) {
                Some(player) => Ok(state.player(player)?.lore >= *min),
                None => Ok(false),
            },
            EffectCondition::DuringControllersTurn => {
                Ok(context.acting_player(state) == Some(state.active_player))
            }
            EffectCondition::Not(inner) => inner.evaluate(target, context, state).map(|b| !b),
            EffectCondition::Custom { predicate, .. } => predicate(target, context, state),
        }
    }

    /// Evaluate, folding faults into `false`.
    pub fn check(&self, target: &Target, context: &ActionContext, state: &GameState) -> bool {
        self.evaluate(target, context, state).unwrap_or_else(|err| {
            tracing::warn!(condition = %self, %err, "effect condition failed");
            false
        })
    }
}

impl fmt::Display for EffectCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectCondition::TargetDamaged => f.write_str("target is damaged"),
            EffectCondition::TargetExerted => f.write_str("target is exerted"),
            EffectCondition::TargetHasSubtype(subtype) => write!(f, "target is a {subtype}"),
            EffectCondition::ControllerLoreAtLeast(min) => write!(f, "you have {min}+ lore"),
            EffectCondition::DuringControllersTurn => f.write_str("during your turn"),
            EffectCondition::Not(inner) => write!(f, "not ({inner})"),
            EffectCondition::Custom { name, .. } => f.write_str(name),
        }
    }
}

impl fmt::Debug for EffectCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EffectCondition({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardDefinition;
    use crate::core::{EntityId, PlayerId};
    use crate::error::RulesError;
    use crate::zones::Zone;

    #[test]
    fn test_target_conditions() {
        let mut state = GameState::new(2, 0);
        let id = state.add_card(
            CardDefinition::character("Hero", 1, 1, 3, 1).with_subtype("Hero"),
            PlayerId::new(0),
            Zone::Play,
        );
        let ctx = ActionContext::default();
        let target = Target::Card(id);

        assert!(!EffectCondition::TargetDamaged.check(&target, &ctx, &state));
        state.damage(id, 1).unwrap();
        assert!(EffectCondition::TargetDamaged.check(&target, &ctx, &state));
        assert!(EffectCondition::TargetHasSubtype("Hero".into()).check(&target, &ctx, &state));
        assert!(EffectCondition::TargetExerted.negate().check(&target, &ctx, &state));
        assert!(!EffectCondition::TargetDamaged.check(&Target::None, &ctx, &state));
    }

    #[test]
    fn test_controller_conditions() {
        let mut state = GameState::new(2, 0);
        let id = state.add_card(CardDefinition::character("A", 1, 1, 1, 1), PlayerId::new(1), Zone::Play);
        let ctx = ActionContext::for_ability(id, "TEST");

        assert!(!EffectCondition::DuringControllersTurn.check(&Target::None, &ctx, &state));
        state.active_player = PlayerId::new(1);
        assert!(EffectCondition::DuringControllersTurn.check(&Target::None, &ctx, &state));

        state.gain_lore(PlayerId::new(1), 5).unwrap();
        assert!(EffectCondition::ControllerLoreAtLeast(5).check(&Target::None, &ctx, &state));
    }

    #[test]
    fn test_faults_fold_to_false() {
        let state = GameState::new(2, 0);
        let ctx = ActionContext::default();
        let missing = Target::Card(EntityId(42));

        assert_eq!(
            EffectCondition::TargetDamaged.evaluate(&missing, &ctx, &state),
            Err(RulesError::UnknownEntity(EntityId(42)))
        );
        assert!(!EffectCondition::TargetDamaged.check(&missing, &ctx, &state));

        let broken = EffectCondition::custom("broken", |_, _, _| Err(RulesError::predicate("boom")));
        assert!(!broken.check(&Target::None, &ctx, &state));
    }
}
