//! Hive Core - Colony Simulation Engine
//!
//! An ECS-based host for the `hive-logic` decision core: zones of structures,
//! sources and worker agents, advanced one cycle at a time.
//!
//! # Architecture
//!
//! The colony uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Agents, structures, sources, drops and tombstones
//! - **Components**: Pure data attached to entities (Position, Structure, Cargo, etc.)
//! - **Systems**: Role controllers, production and upkeep that query and update components
//!
//! Each cycle, per zone, the population controller queues production
//! requests, idle spawns produce from the queue, the logistics controller
//! rebuilds the task list and the dispatcher assigns it. Queues and cached
//! zone figures live in a TTL cache that is saved with the colony.
//!
//! # Example
//!
//! ```rust,no_run
//! use hive_core::prelude::*;
//!
//! let mut engine = ColonyEngine::new(ColonyConfig::default());
//! engine.generate();
//!
//! for _ in 0..1000 {
//!     engine.run_cycle();
//! }
//! ```

pub mod cache;
pub mod components;
pub mod config;
pub mod engine;
pub mod generation;
pub mod pathing;
pub mod persistence;
pub mod systems;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::ColonyConfig;
    pub use crate::engine::{ColonyEngine, CycleReport};
    pub use crate::world::ColonyWorld;
}
