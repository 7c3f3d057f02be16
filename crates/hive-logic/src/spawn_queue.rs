//! Production queue - pending agent-creation requests, one queue per zone.
//!
//! `pop` always takes the strictly-highest priority; among equals the earliest
//! pushed wins. Queues are plain values passed around explicitly; the engine
//! loads them from the zone cache at cycle start and writes them back at the
//! end. A zone with no stored queue starts empty.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, AgentMemory};
use crate::body::BodyProfile;
use crate::geometry::ZoneId;

/// A request to produce one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub priority: i32,
    pub profile: BodyProfile,
    /// Grow against the zone's full capacity instead of what is producible now.
    pub max: bool,
    /// Reorder the grown body canonically before producing.
    pub sort: bool,
    /// Initial memory of the produced agent.
    pub memory: AgentMemory,
    /// Agent this one replaces; marked retiring once production succeeds.
    pub replacing: Option<AgentId>,
}

impl SpawnRequest {
    pub fn new(priority: i32, profile: BodyProfile, memory: AgentMemory) -> Self {
        Self {
            priority,
            profile,
            max: false,
            sort: false,
            memory,
            replacing: None,
        }
    }

    pub fn budgeted(mut self) -> Self {
        self.max = true;
        self
    }

    pub fn sorted(mut self) -> Self {
        self.sort = true;
        self
    }

    pub fn replacing(mut self, agent: AgentId) -> Self {
        self.replacing = Some(agent);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnQueue {
    pending: Vec<SpawnRequest>,
}

impl SpawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: SpawnRequest) {
        self.pending.push(request);
    }

    /// Remove and return the highest-priority request.
    pub fn pop(&mut self) -> Option<SpawnRequest> {
        let index = self.best_index()?;
        Some(self.pending.remove(index))
    }

    /// The request `pop` would return, without removing it.
    pub fn peek(&self) -> Option<&SpawnRequest> {
        self.best_index().map(|i| &self.pending[i])
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending requests in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SpawnRequest> {
        self.pending.iter()
    }

    /// Whether a pending request would replace `agent`.
    pub fn replaces(&self, agent: AgentId) -> bool {
        self.pending.iter().any(|r| r.replacing == Some(agent))
    }

    fn best_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, request) in self.pending.iter().enumerate() {
            // Strict comparison: ties keep the earlier entry.
            if best.map(|b| request.priority > self.pending[b].priority).unwrap_or(true) {
                best = Some(i);
            }
        }
        best
    }
}

/// Per-zone queues, created lazily on first access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnQueues {
    zones: BTreeMap<ZoneId, SpawnQueue>,
}

impl SpawnQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zone(&mut self, zone: ZoneId) -> &mut SpawnQueue {
        self.zones.entry(zone).or_default()
    }

    /// Queue for `zone` if one was ever created.
    pub fn get(&self, zone: ZoneId) -> Option<&SpawnQueue> {
        self.zones.get(&zone)
    }

    /// Install a queue loaded from storage.
    pub fn insert(&mut self, zone: ZoneId, queue: SpawnQueue) {
        self.zones.insert(zone, queue);
    }

    /// Detach a zone's queue, e.g. to flush it to storage.
    pub fn take(&mut self, zone: ZoneId) -> SpawnQueue {
        self.zones.remove(&zone).unwrap_or_default()
    }

    pub fn total_pending(&self) -> usize {
        self.zones.values().map(SpawnQueue::len).sum()
    }
}
