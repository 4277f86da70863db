//! Turn structure tracking.
//!
//! - `TurnTiming`: turn/phase history and temporary-effect expiry
//! - `Duration` / `TemporaryEffect`: how long an effect lasts
//! - `AutomaticEffectRegistry`: effects fired by turn and phase boundaries

mod automatic;
mod duration;
mod turn;

pub use automatic::{
    automatic_condition, AutomaticCondition, AutomaticContext, AutomaticEffectRegistry, AutomaticTrigger,
    RegistrationCounts,
};
pub use duration::{Duration, ExpiryFn, TemporaryEffect};
pub use turn::{PhaseRecord, TimedEvent, TimingStatistics, TurnInfo, TurnTiming};
