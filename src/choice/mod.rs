//! Player decisions: pause points and the effects that create them.
//!
//! - `ChoiceContext` / `ChoiceOption`: a pending decision and its answers
//! - `ChoiceManager`: FIFO of pending choices, resolution, default sweep
//! - `ChoiceEffect`: may / choose one / select character / select card

mod context;
mod effects;
mod manager;

pub use context::{ChoiceContext, ChoiceOption, ChoiceResult, ChoiceType};
pub use effects::{ChoiceEffect, ChoiceKind};
pub use manager::ChoiceManager;
