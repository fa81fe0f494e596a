//! The gate engine: the single front door through which a node moves from
//! requested to implemented.
//!
//! Orchestrates the interview engine, the generation router, and the
//! validation pipeline over a registry of nodes, and emits notifications so
//! observers can follow progress without coupling to engine internals.

mod engine;
mod events;

pub use engine::GateEngine;
pub use events::{GateNotification, NotificationBus};
