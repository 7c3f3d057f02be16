//! Collaborator seams between the decision core and the host world.
//!
//! The core never owns world state. It reads snapshots (`TargetView`,
//! `AgentView`) and requests actions through `TaskWorld`; distances come from
//! `Pathing`. The ECS engine implements these for real play, tests implement
//! them with small in-memory fixtures.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId, Cargo};
use crate::constants::ResourceKind;
use crate::geometry::{ZoneId, ZonePos};
use crate::task::TargetId;

/// Per-resource amounts plus a shared capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub energy: u32,
    pub mineral: u32,
    pub power: u32,
    /// Total units the store can hold across all kinds. Zero = cannot receive.
    pub capacity: u32,
}

impl Store {
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn holding(resource: ResourceKind, amount: u32) -> Self {
        let mut store = Self::default();
        *store.get_mut(resource) = amount;
        store
    }

    pub fn get(&self, resource: ResourceKind) -> u32 {
        match resource {
            ResourceKind::Energy => self.energy,
            ResourceKind::Mineral => self.mineral,
            ResourceKind::Power => self.power,
        }
    }

    pub fn get_mut(&mut self, resource: ResourceKind) -> &mut u32 {
        match resource {
            ResourceKind::Energy => &mut self.energy,
            ResourceKind::Mineral => &mut self.mineral,
            ResourceKind::Power => &mut self.power,
        }
    }

    pub fn used(&self) -> u32 {
        self.energy + self.mineral + self.power
    }

    pub fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.used())
    }

    /// Move as much `resource` as `cargo` can take out of this store.
    pub fn unload_into(&mut self, cargo: &mut Cargo, resource: ResourceKind) -> ActionResult {
        let available = self.get(resource);
        if available == 0 {
            return ActionResult::NotEnoughResources;
        }
        let taken = cargo.add(resource, available);
        if taken == 0 {
            return ActionResult::Full;
        }
        *self.get_mut(resource) -= taken;
        ActionResult::Ok
    }

    /// Move carried `resource` in, limited by free capacity.
    pub fn load_from(&mut self, cargo: &mut Cargo, resource: ResourceKind) -> ActionResult {
        let carried = cargo.amount_of(resource);
        if carried == 0 {
            return ActionResult::NotEnoughResources;
        }
        let room = self.free();
        if room == 0 {
            return ActionResult::Full;
        }
        let moved = cargo.remove(carried.min(room));
        *self.get_mut(resource) += moved;
        ActionResult::Ok
    }
}

/// What kind of object a target is. Drives how resources are taken from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Spawn,
    Extension,
    Tower,
    Container,
    Storage,
    Link,
    /// Corpse store left by a dead agent.
    Tombstone,
    Ruin,
    /// Resource lying on the ground.
    Drop,
    /// Regenerating origin of energy; harvested, not withdrawn.
    Source,
}

impl TargetKind {
    /// General-purpose stores that deliveries may fall back to.
    pub fn is_storage(self) -> bool {
        matches!(self, TargetKind::Container | TargetKind::Storage)
    }
}

/// Snapshot of a world object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetView {
    pub id: TargetId,
    pub kind: TargetKind,
    pub pos: ZonePos,
    pub store: Store,
}

impl TargetView {
    pub fn stock(&self, resource: ResourceKind) -> u32 {
        self.store.get(resource)
    }

    pub fn free_capacity(&self) -> u32 {
        self.store.free()
    }
}

/// Snapshot of another agent, as seen by a task targeting it.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentView {
    pub id: AgentId,
    pub pos: ZonePos,
    pub cargo: Cargo,
    pub role: String,
    /// Agent currently committed to supplying this one.
    pub claimed_by: Option<AgentId>,
}

/// Outcome of a world action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    Ok,
    NotInRange,
    NotEnoughResources,
    Full,
    InvalidTarget,
    NoPath,
}

impl ActionResult {
    pub fn is_ok(self) -> bool {
        self == ActionResult::Ok
    }
}

/// Distance oracle.
pub trait Pathing {
    /// Walking distance, or `None` if no path exists.
    fn path_distance(&mut self, from: &ZonePos, to: &ZonePos) -> Option<u32>;

    /// Straight-line range, or `None` if it cannot be measured.
    fn range(&self, from: &ZonePos, to: &ZonePos) -> Option<u32> {
        from.range_to(to)
    }
}

/// Everything a task needs to validate itself and make progress.
pub trait TaskWorld: Pathing {
    fn target(&self, id: TargetId) -> Option<TargetView>;

    fn agent_view(&self, id: AgentId) -> Option<AgentView>;

    /// All objects in a zone that hold or can hold resources.
    fn targets_in_zone(&self, zone: ZoneId) -> Vec<TargetView>;

    /// Step the agent one tile along a path toward `to`.
    fn move_toward(&mut self, agent: &mut Agent, to: ZonePos) -> ActionResult;

    fn withdraw(&mut self, agent: &mut Agent, from: TargetId, resource: ResourceKind) -> ActionResult;

    fn pickup(&mut self, agent: &mut Agent, drop: TargetId) -> ActionResult;

    fn harvest(&mut self, agent: &mut Agent, source: TargetId) -> ActionResult;

    fn transfer(&mut self, agent: &mut Agent, to: TargetId, resource: ResourceKind) -> ActionResult;

    fn transfer_to_agent(&mut self, agent: &mut Agent, to: AgentId, resource: ResourceKind) -> ActionResult;

    /// Record that `by` is supplying `target`. False if someone else holds it.
    fn claim_agent(&mut self, target: AgentId, by: AgentId) -> bool;

    /// Drop `by`'s claim on `target`, if it holds one.
    fn release_claim(&mut self, target: AgentId, by: AgentId);
}
