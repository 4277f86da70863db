//! Events and the bus that routes them to abilities.
//!
//! - [`EventContext`]: one notification, created where a mutation happens
//! - [`EventBus`]: abilities indexed by event kind; dispatch returns the
//!   work they produced instead of doing it

mod bus;
mod event;

pub use bus::EventBus;
pub use event::{EventContext, EventData, EventKind};
