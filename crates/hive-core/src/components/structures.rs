//! Structure components: stores, sources and production facilities.

use hive_logic::agent::{AgentId, AgentMemory};
use hive_logic::constants::BodyPart;
use hive_logic::world::{Store, TargetKind};
use serde::{Deserialize, Serialize};

/// Any world object that holds resources. Sources included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub kind: TargetKind,
    pub store: Store,
    /// Kept stocked from storage by haul tasks (e.g. an upgrade container).
    #[serde(default)]
    pub sink: bool,
}

impl Structure {
    pub fn new(kind: TargetKind, store: Store) -> Self {
        Self { kind, store, sink: false }
    }

    pub fn sink(mut self) -> Self {
        self.sink = true;
        self
    }

    /// Spawns and extensions: energy here pays for production.
    pub fn feeds_production(&self) -> bool {
        matches!(self.kind, TargetKind::Spawn | TargetKind::Extension)
    }
}

/// Energy regrowth of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regen {
    pub max: u32,
    /// Cycles between refills.
    pub interval: u32,
    pub timer: u32,
}

impl Regen {
    pub fn new(max: u32, interval: u32) -> Self {
        Self {
            max,
            interval,
            timer: interval,
        }
    }
}

/// Production facility state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spawner {
    pub producing: Option<Production>,
}

impl Spawner {
    pub fn is_idle(&self) -> bool {
        self.producing.is_none()
    }
}

/// An agent being produced. The id is reserved up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    pub agent: AgentId,
    pub body: Vec<BodyPart>,
    pub memory: AgentMemory,
    pub ticks_left: u32,
}
