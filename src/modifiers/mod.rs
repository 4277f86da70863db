//! Continuous rules modifiers.
//!
//! - [`ConditionalEffectTracker`]: "while X, Y" effects that toggle on and
//!   off as the game changes
//! - [`CostModifierManager`]: ink cost adjustments grouped by source

mod conditional;
mod cost;

pub use conditional::{
    character_in_play, controller_has_character_with_subtype, during_controllers_turn, during_opponents_turn,
    during_phase, ConditionType, ConditionalApply, ConditionalCheck, ConditionalEffect, ConditionalEffectTracker,
    ConditionalRemove,
};
pub use cost::{
    CostCondition, CostFilter, CostFilterFn, CostModifier, CostModifierDebugInfo, CostModifierKind,
    CostModifierManager,
};
