//! Task model - units of offered work that agents are assigned to.
//!
//! Tasks are rebuilt from world state every cycle by the role controllers.
//! Only the copy an agent currently holds is persisted (inside its
//! `AgentMemory`), and that copy is re-validated before it is trusted again.
//!
//! Identity is explicit: `Task::key()` reduces a task to its kind, target
//! references, resource, position and tag. Two tasks with the same key are
//! the same work even if their priorities differ.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId};
use crate::constants::{BodyPart, ResourceKind};
use crate::geometry::ZonePos;

/// Stable identifier of a world object (structure, source, drop, ...).
pub type TargetId = u64;

/// The closed set of task variants. Each carries its target references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Move `resource` from one store to another.
    Haul {
        from: TargetId,
        to: TargetId,
        resource: ResourceKind,
    },
    /// Fill a structure (tower, container, ...) with `resource`.
    SupplyStructure {
        target: TargetId,
        resource: ResourceKind,
    },
    /// Fill a production facility or its extension with energy.
    SupplySpawn { target: TargetId },
    /// Empty a store into the nearest storage.
    Unload {
        source: TargetId,
        resource: ResourceKind,
    },
    /// Hand `resource` to another agent.
    SupplyCreep {
        target: AgentId,
        resource: ResourceKind,
    },
    /// Collect a ground drop or corpse store into the nearest storage.
    Cleanup {
        target: TargetId,
        resource: ResourceKind,
    },
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Haul { .. } => "haul",
            TaskKind::SupplyStructure { .. } => "supply-structure",
            TaskKind::SupplySpawn { .. } => "supply-spawn",
            TaskKind::Unload { .. } => "unload",
            TaskKind::SupplyCreep { .. } => "supply-creep",
            TaskKind::Cleanup { .. } => "cleanup",
        }
    }

    /// Resource this task moves.
    pub fn resource(&self) -> ResourceKind {
        match self {
            TaskKind::Haul { resource, .. }
            | TaskKind::SupplyStructure { resource, .. }
            | TaskKind::Unload { resource, .. }
            | TaskKind::SupplyCreep { resource, .. }
            | TaskKind::Cleanup { resource, .. } => *resource,
            TaskKind::SupplySpawn { .. } => ResourceKind::Energy,
        }
    }
}

/// Declarative eligibility check over an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requirement {
    HasPart(BodyPart),
    MinCarryCapacity(u32),
    Role(String),
    /// Agent carries nothing, or only this resource.
    NotCarryingOther(ResourceKind),
}

impl Requirement {
    pub fn accepts(&self, agent: &Agent) -> bool {
        match self {
            Requirement::HasPart(part) => agent.has_part(*part),
            Requirement::MinCarryCapacity(min) => agent.cargo.capacity >= *min,
            Requirement::Role(role) => agent.memory.role == *role,
            Requirement::NotCarryingOther(resource) => agent.cargo.accepts(*resource),
        }
    }
}

/// Identity of a task, independent of priority and override.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    kind: TaskKind,
    pos: ZonePos,
    tag: Option<String>,
}

/// One unit of offered work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub kind: TaskKind,
    /// Higher is more urgent.
    pub priority: i32,
    /// Where the work happens; used for distance ranking.
    pub pos: ZonePos,
    /// May displace a busy agent holding lower or equal priority work.
    #[serde(rename = "override")]
    pub override_: bool,
    /// Disambiguates otherwise identical tasks.
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

impl Task {
    pub fn new(kind: TaskKind, priority: i32, pos: ZonePos) -> Self {
        Self {
            kind,
            priority,
            pos,
            override_: false,
            tag: None,
            requirements: Vec::new(),
        }
    }

    pub fn with_override(mut self) -> Self {
        self.override_ = true;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn require(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn key(&self) -> TaskKey {
        TaskKey {
            kind: self.kind.clone(),
            pos: self.pos,
            tag: self.tag.clone(),
        }
    }

    /// Duplicate test: same kind, targets, resource, position and tag.
    pub fn same_as(&self, other: &Task) -> bool {
        self.key() == other.key()
    }

    /// Whether every requirement accepts `agent`.
    pub fn accepts(&self, agent: &Agent) -> bool {
        self.requirements.iter().all(|r| r.accepts(agent))
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.kind.name())?;
        match &self.kind {
            TaskKind::Haul { from, to, resource } => {
                write!(f, "{}>{}:{}", from, to, resource.short_name())?
            }
            TaskKind::SupplyStructure { target, resource }
            | TaskKind::Unload {
                source: target,
                resource,
            }
            | TaskKind::SupplyCreep { target, resource }
            | TaskKind::Cleanup { target, resource } => {
                write!(f, "{}:{}", target, resource.short_name())?
            }
            TaskKind::SupplySpawn { target } => write!(f, "{}", target)?,
        }
        write!(f, "@{}", self.pos)?;
        if let Some(tag) = &self.tag {
            write!(f, "#{}", tag)?;
        }
        Ok(())
    }
}
