//! Effect system.
//!
//! - `Effect`: immutable mutation units, atomic and structural
//! - `TargetSelector` / `CardFilter`: pure target selection
//! - `EffectCondition`: predicates for conditional effects
//! - `ActionContext` / `EffectEnv`: what an effect sees while it applies
//!
//! Effects never dispatch events themselves. The action queue asks each
//! applied effect for its declared events and hands them to the event bus.

mod atomic;
mod condition;
mod context;
mod effect;
mod target;
mod targeting;
mod wrappers;

pub use condition::{ConditionFn, EffectCondition};
pub use context::{ActionContext, EffectEnv, EffectOutcome, EffectStep};
pub(crate) use effect::record_step;
pub use effect::{Branch, CustomEffect, Effect};
pub use target::Target;
pub use targeting::{CardFilter, CustomFilter, FilterFn, SelectionContext, TargetSelector, Whose};
pub use wrappers::{AbilityTrigger, TargetedEffect};
