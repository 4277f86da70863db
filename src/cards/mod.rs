//! Card definitions and instances.
//!
//! - `CardDefinition`: printed data (cost, stats, subtypes, keywords, named abilities)
//! - `CardInstance`: runtime state (damage, exerted, bonuses, granted properties)

pub mod definition;
pub mod instance;

pub use definition::{AbilitySpec, CardDefinition, CardKind, Keyword};
pub use instance::{CardInstance, Stat, StatBonus};
