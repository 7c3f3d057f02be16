//! Mobile worker agents and their persisted memory.

use serde::{Deserialize, Serialize};

use crate::body::carry_capacity;
use crate::constants::{BodyPart, ResourceKind};
use crate::geometry::ZonePos;
use crate::task::Task;

/// Stable identifier of an agent.
pub type AgentId = u64;

/// Which half of a logistics task the agent is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkPhase {
    #[default]
    Loading,
    Delivering,
}

/// Resources an agent is carrying. One kind at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cargo {
    pub resource: Option<ResourceKind>,
    pub amount: u32,
    pub capacity: u32,
}

impl Cargo {
    pub fn empty(capacity: u32) -> Self {
        Self {
            resource: None,
            amount: 0,
            capacity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    pub fn is_full(&self) -> bool {
        self.amount >= self.capacity
    }

    pub fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.amount)
    }

    /// Amount of `resource` carried (zero if carrying something else).
    pub fn amount_of(&self, resource: ResourceKind) -> u32 {
        match self.resource {
            Some(r) if r == resource => self.amount,
            _ => 0,
        }
    }

    /// Whether `resource` can be added without mixing kinds.
    pub fn accepts(&self, resource: ResourceKind) -> bool {
        self.is_empty() || self.resource == Some(resource)
    }

    /// Add up to `amount`; returns what was actually taken.
    pub fn add(&mut self, resource: ResourceKind, amount: u32) -> u32 {
        if !self.accepts(resource) {
            return 0;
        }
        let taken = amount.min(self.free());
        if taken > 0 {
            self.resource = Some(resource);
            self.amount += taken;
        }
        taken
    }

    /// Remove up to `amount`; returns what was actually removed.
    pub fn remove(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.amount);
        self.amount -= removed;
        if self.amount == 0 {
            self.resource = None;
        }
        removed
    }
}

/// Persisted per-agent state that survives between cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMemory {
    /// Role controller that owns this agent.
    pub role: String,
    /// Current assignment. Re-validated every cycle before use.
    pub task: Option<Task>,
    pub phase: WorkPhase,
    /// Set when a replacement has been produced.
    pub retiring: bool,
    /// Opaque payload attached by the requester at production time.
    #[serde(default)]
    pub payload: Vec<(String, String)>,
}

impl AgentMemory {
    pub fn for_role(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Self::default()
        }
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.push((key.into(), value.into()));
        self
    }

    pub fn payload_value(&self, key: &str) -> Option<&str> {
        self.payload
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Snapshot of one agent as seen by the decision core.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub pos: ZonePos,
    pub body: Vec<BodyPart>,
    pub cargo: Cargo,
    pub memory: AgentMemory,
}

impl Agent {
    pub fn new(id: AgentId, pos: ZonePos, body: Vec<BodyPart>, memory: AgentMemory) -> Self {
        let cargo = Cargo::empty(carry_capacity(&body));
        Self {
            id,
            pos,
            body,
            cargo,
            memory,
        }
    }

    pub fn task(&self) -> Option<&Task> {
        self.memory.task.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.memory.task.is_some()
    }

    /// Replace the assignment, resetting the work phase from what is carried.
    pub fn assign(&mut self, task: Task) {
        self.memory.phase = if self.cargo.is_empty() {
            WorkPhase::Loading
        } else {
            WorkPhase::Delivering
        };
        self.memory.task = Some(task);
    }

    /// Drop the assignment; returns it.
    pub fn clear_task(&mut self) -> Option<Task> {
        self.memory.task.take()
    }

    /// Priority of the current assignment; idle agents rank as 0.
    pub fn current_priority(&self) -> i32 {
        self.task().map(|t| t.priority).unwrap_or(0)
    }

    pub fn has_part(&self, part: BodyPart) -> bool {
        self.body.contains(&part)
    }
}
