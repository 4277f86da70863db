//! The rules engine: game actions in, settled state out.
//!
//! [`RulesEngine`] is the one place that owns every subsystem at once. It
//! turns player actions and turn boundaries into events, routes them
//! through the bus, and runs the action queue to a fixed point.

mod engine;

pub use engine::RulesEngine;
