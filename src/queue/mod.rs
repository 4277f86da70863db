//! The action queue: the single place state changes are scheduled.
//!
//! - `ActionPriority`: dequeue order
//! - `ActionRequest`: work produced by listeners, choices, and timing
//! - `ActionQueue`: ordered pending actions, pause/resume, history
//! - `describe_step`: presentation summaries of processed actions

mod action;
mod action_queue;
mod describe;
mod priority;

pub use action::{ActionRequest, ActionResult, QueuedAction};
pub use action_queue::{ActionQueue, QueueEnv};
pub use describe::{describe_step, StepDescription};
pub use priority::ActionPriority;
