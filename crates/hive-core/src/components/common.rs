//! Components shared by every entity type.

use hive_logic::geometry::ZonePos;
use serde::{Deserialize, Serialize};

/// Stable identifier that survives save/load, unlike `hecs::Entity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// Tile an entity occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position(pub ZonePos);

/// Countdown to removal. Ground drops, tombstones and ruins carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decay {
    pub ticks_left: u32,
}
