//! Component definitions for the colony ECS.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.
//!
//! Agents also carry `hive_logic::agent::Cargo` and `AgentMemory` directly
//! as components.

mod agents;
mod common;
mod structures;

pub use agents::*;
pub use common::*;
pub use structures::*;
