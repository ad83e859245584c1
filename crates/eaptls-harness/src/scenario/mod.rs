//! Scenario testing framework.
//!
//! A scenario names a conversation, configures both ends, runs it, and
//! hands the resulting [`World`] to a mandatory oracle.

mod builder;
mod world;

pub use builder::{RunnableScenario, Scenario};
pub use world::World;

/// Oracle run against the finished world.
pub type OracleFn = Box<dyn FnOnce(&World) -> Result<(), String>>;
