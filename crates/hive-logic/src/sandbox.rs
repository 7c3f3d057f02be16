//! In-memory world for exercising the decision core without an engine.
//!
//! Walking distance equals straight-line range unless a pair of positions is
//! marked unreachable. Agents referenced by `SupplyCreep` tasks live in the
//! sandbox as `AgentView`s; the agent doing the work is passed in by value.

use std::collections::{HashMap, HashSet};

use crate::agent::{Agent, AgentId};
use crate::constants::{BodyPart, ResourceKind, HARVEST_PER_WORK};
use crate::body::count_parts;
use crate::geometry::{ZoneId, ZonePos};
use crate::task::TargetId;
use crate::world::{ActionResult, AgentView, Pathing, Store, TargetKind, TargetView, TaskWorld};

#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    targets: HashMap<TargetId, TargetView>,
    agents: HashMap<AgentId, AgentView>,
    /// Destinations no agent can walk to.
    unreachable: HashSet<ZonePos>,
    /// When set, `path_distance` always fails (forces the range fallback).
    pub pathing_offline: bool,
    next_id: TargetId,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Add a world object; returns its id.
    pub fn add_target(&mut self, kind: TargetKind, pos: ZonePos, store: Store) -> TargetId {
        let id = self.next_id;
        self.next_id += 1;
        self.targets.insert(id, TargetView { id, kind, pos, store });
        id
    }

    pub fn remove_target(&mut self, id: TargetId) {
        self.targets.remove(&id);
    }

    pub fn add_agent_view(&mut self, view: AgentView) {
        self.agents.insert(view.id, view);
    }

    pub fn mark_unreachable(&mut self, pos: ZonePos) {
        self.unreachable.insert(pos);
    }

    pub fn store_of(&self, id: TargetId) -> Option<Store> {
        self.targets.get(&id).map(|t| t.store)
    }

    pub fn store_mut(&mut self, id: TargetId) -> Option<&mut Store> {
        self.targets.get_mut(&id).map(|t| &mut t.store)
    }

    pub fn agent(&self, id: AgentId) -> Option<&AgentView> {
        self.agents.get(&id)
    }

    fn take_from(&mut self, agent: &mut Agent, id: TargetId, resource: ResourceKind) -> ActionResult {
        let Some(target) = self.targets.get_mut(&id) else {
            return ActionResult::InvalidTarget;
        };
        if !agent.pos.is_adjacent(&target.pos) {
            return ActionResult::NotInRange;
        }
        target.store.unload_into(&mut agent.cargo, resource)
    }
}

impl Pathing for Sandbox {
    fn path_distance(&mut self, from: &ZonePos, to: &ZonePos) -> Option<u32> {
        if self.pathing_offline || self.unreachable.contains(to) {
            return None;
        }
        from.range_to(to)
    }
}

impl TaskWorld for Sandbox {
    fn target(&self, id: TargetId) -> Option<TargetView> {
        self.targets.get(&id).copied()
    }

    fn agent_view(&self, id: AgentId) -> Option<AgentView> {
        self.agents.get(&id).cloned()
    }

    fn targets_in_zone(&self, zone: ZoneId) -> Vec<TargetView> {
        let mut targets: Vec<TargetView> = self
            .targets
            .values()
            .filter(|t| t.pos.zone == zone)
            .copied()
            .collect();
        targets.sort_by_key(|t| t.id);
        targets
    }

    fn move_toward(&mut self, agent: &mut Agent, to: ZonePos) -> ActionResult {
        if self.path_distance(&agent.pos, &to).is_none() {
            return ActionResult::NoPath;
        }
        agent.pos = agent.pos.step_toward(&to);
        ActionResult::Ok
    }

    fn withdraw(&mut self, agent: &mut Agent, from: TargetId, resource: ResourceKind) -> ActionResult {
        self.take_from(agent, from, resource)
    }

    fn pickup(&mut self, agent: &mut Agent, drop: TargetId) -> ActionResult {
        let resource = match self.targets.get(&drop) {
            Some(t) if t.kind == TargetKind::Drop => ResourceKind::all().into_iter().find(|r| t.store.get(*r) > 0),
            _ => return ActionResult::InvalidTarget,
        };
        match resource {
            Some(resource) => self.take_from(agent, drop, resource),
            None => ActionResult::NotEnoughResources,
        }
    }

    fn harvest(&mut self, agent: &mut Agent, source: TargetId) -> ActionResult {
        let Some(target) = self.targets.get_mut(&source) else {
            return ActionResult::InvalidTarget;
        };
        if target.kind != TargetKind::Source {
            return ActionResult::InvalidTarget;
        }
        if !agent.pos.is_adjacent(&target.pos) {
            return ActionResult::NotInRange;
        }
        let yield_ = count_parts(&agent.body, BodyPart::Work) * HARVEST_PER_WORK;
        let amount = yield_.min(target.store.energy);
        if amount == 0 {
            return ActionResult::NotEnoughResources;
        }
        let taken = agent.cargo.add(ResourceKind::Energy, amount);
        target.store.energy -= taken;
        ActionResult::Ok
    }

    fn transfer(&mut self, agent: &mut Agent, to: TargetId, resource: ResourceKind) -> ActionResult {
        let Some(target) = self.targets.get_mut(&to) else {
            return ActionResult::InvalidTarget;
        };
        if !agent.pos.is_adjacent(&target.pos) {
            return ActionResult::NotInRange;
        }
        target.store.load_from(&mut agent.cargo, resource)
    }

    fn transfer_to_agent(&mut self, agent: &mut Agent, to: AgentId, resource: ResourceKind) -> ActionResult {
        let Some(receiver) = self.agents.get_mut(&to) else {
            return ActionResult::InvalidTarget;
        };
        if !agent.pos.is_adjacent(&receiver.pos) {
            return ActionResult::NotInRange;
        }
        let carried = agent.cargo.amount_of(resource);
        if carried == 0 {
            return ActionResult::NotEnoughResources;
        }
        let accepted = receiver.cargo.add(resource, carried);
        if accepted == 0 {
            return ActionResult::Full;
        }
        agent.cargo.remove(accepted);
        ActionResult::Ok
    }

    fn claim_agent(&mut self, target: AgentId, by: AgentId) -> bool {
        match self.agents.get_mut(&target) {
            Some(view) => match view.claimed_by {
                Some(holder) => holder == by,
                None => {
                    view.claimed_by = Some(by);
                    true
                }
            },
            None => false,
        }
    }

    fn release_claim(&mut self, target: AgentId, by: AgentId) {
        if let Some(view) = self.agents.get_mut(&target) {
            if view.claimed_by == Some(by) {
                view.claimed_by = None;
            }
        }
    }
}
