//! Colony world - the hecs ECS plus terrain and a stable id index.
//!
//! `ColonyWorld` is what the decision core sees: it implements `Pathing`
//! (BFS over terrain) and `TaskWorld` (snapshots and resource actions over
//! components). Agents are handed to the core as `Agent` snapshots and
//! written back after each step.

use std::collections::{BTreeSet, HashMap};

use hecs::{Entity, World};
use hive_logic::agent::{Agent, AgentId, AgentMemory, Cargo};
use hive_logic::body::count_parts;
use hive_logic::constants::{BodyPart, ResourceKind, HARVEST_PER_WORK};
use hive_logic::geometry::{ZoneId, ZonePos};
use hive_logic::task::TargetId;
use hive_logic::world::{ActionResult, AgentView, Pathing, Store, TargetKind, TargetView, TaskWorld};

use crate::components::*;
use crate::pathing::Terrain;

pub struct ColonyWorld {
    /// ECS world containing all entities
    pub ecs: World,
    pub terrain: Terrain,
    /// ObjectId → entity. Rebuilt on load.
    index: HashMap<u64, Entity>,
    next_id: u64,
}

impl Default for ColonyWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ColonyWorld {
    pub fn new() -> Self {
        Self {
            ecs: World::new(),
            terrain: Terrain::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    /// Reserve a fresh object id.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn entity(&self, id: u64) -> Option<Entity> {
        self.index.get(&id).copied()
    }

    /// Rebuild the id index from `ObjectId` components (after a load).
    pub fn reindex(&mut self, next_id: u64) {
        self.index = self
            .ecs
            .query::<&ObjectId>()
            .iter()
            .map(|(entity, id)| (id.0, entity))
            .collect();
        let highest = self.index.keys().max().copied().unwrap_or(0);
        self.next_id = next_id.max(highest + 1);
    }

    fn register(&mut self, id: u64, entity: Entity) {
        self.index.insert(id, entity);
    }

    // ── Spawning entities ────────────────────────────────────────────────

    pub fn add_structure(&mut self, pos: ZonePos, structure: Structure) -> TargetId {
        let id = self.allocate_id();
        let entity = if structure.kind == TargetKind::Spawn {
            self.ecs.spawn((ObjectId(id), Position(pos), structure, Spawner::default()))
        } else {
            self.ecs.spawn((ObjectId(id), Position(pos), structure))
        };
        self.register(id, entity);
        id
    }

    pub fn add_source(&mut self, pos: ZonePos, energy: u32, regen_interval: u32) -> TargetId {
        let id = self.allocate_id();
        let structure = Structure::new(TargetKind::Source, Store::holding(ResourceKind::Energy, energy));
        let entity = self
            .ecs
            .spawn((ObjectId(id), Position(pos), structure, Regen::new(energy, regen_interval)));
        self.register(id, entity);
        id
    }

    /// Ground drop, tombstone or ruin that disappears after `ticks` cycles.
    pub fn add_decaying(&mut self, pos: ZonePos, kind: TargetKind, store: Store, ticks: u32) -> TargetId {
        let id = self.allocate_id();
        let entity = self.ecs.spawn((
            ObjectId(id),
            Position(pos),
            Structure::new(kind, store),
            Decay { ticks_left: ticks },
        ));
        self.register(id, entity);
        id
    }

    /// Add an agent under a pre-reserved id (see `allocate_id`).
    pub fn add_agent(&mut self, id: AgentId, pos: ZonePos, body: Vec<BodyPart>, memory: AgentMemory, lifetime: u32) {
        let agent = Agent::new(id, pos, body, memory);
        let entity = self.ecs.spawn((
            ObjectId(id),
            Position(pos),
            Body(agent.body),
            agent.cargo,
            agent.memory,
            Lifetime { ticks_left: lifetime },
            SupplyClaim::default(),
        ));
        self.register(id, entity);
    }

    pub fn despawn(&mut self, id: u64) {
        if let Some(entity) = self.index.remove(&id) {
            let _ = self.ecs.despawn(entity);
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Every zone that contains a structure.
    pub fn zones(&self) -> Vec<ZoneId> {
        let zones: BTreeSet<ZoneId> = self
            .ecs
            .query::<(&Position, &Structure)>()
            .iter()
            .map(|(_, (pos, _))| pos.0.zone)
            .collect();
        zones.into_iter().collect()
    }

    /// Snapshot of one agent.
    pub fn agent(&self, id: AgentId) -> Option<Agent> {
        let entity = self.entity(id)?;
        let pos = self.ecs.get::<&Position>(entity).ok()?.0;
        let body = self.ecs.get::<&Body>(entity).ok()?.0.clone();
        let cargo = *self.ecs.get::<&Cargo>(entity).ok()?;
        let memory = (*self.ecs.get::<&AgentMemory>(entity).ok()?).clone();
        Some(Agent {
            id,
            pos,
            body,
            cargo,
            memory,
        })
    }

    /// Snapshots of a zone's agents, sorted by id.
    pub fn agents_in_zone(&self, zone: ZoneId) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self
            .ecs
            .query::<(&ObjectId, &Position, &Body, &Cargo, &AgentMemory)>()
            .iter()
            .filter(|(_, (_, pos, ..))| pos.0.zone == zone)
            .map(|(_, (id, pos, body, cargo, memory))| Agent {
                id: id.0,
                pos: pos.0,
                body: body.0.clone(),
                cargo: *cargo,
                memory: memory.clone(),
            })
            .collect();
        agents.sort_by_key(|a| a.id);
        agents
    }

    /// Persist a snapshot's position, cargo and memory.
    pub fn write_back(&mut self, agent: &Agent) {
        let Some(entity) = self.entity(agent.id) else {
            return;
        };
        if let Ok((pos, cargo, memory)) = self
            .ecs
            .query_one_mut::<(&mut Position, &mut Cargo, &mut AgentMemory)>(entity)
        {
            *pos = Position(agent.pos);
            *cargo = agent.cargo;
            *memory = agent.memory.clone();
        }
    }

    /// Persist only the memory (assignment) of a snapshot.
    pub fn write_memory(&mut self, agent: &Agent) {
        let Some(entity) = self.entity(agent.id) else {
            return;
        };
        if let Ok(mut memory) = self.ecs.get::<&mut AgentMemory>(entity) {
            *memory = agent.memory.clone();
        }
    }

    pub fn set_retiring(&mut self, id: AgentId) -> bool {
        let Some(entity) = self.entity(id) else {
            return false;
        };
        match self.ecs.get::<&mut AgentMemory>(entity) {
            Ok(mut memory) => {
                memory.retiring = true;
                true
            }
            Err(_) => false,
        }
    }

    /// Cycles an agent has left to live.
    pub fn lifetime(&self, id: AgentId) -> Option<u32> {
        let entity = self.entity(id)?;
        self.ecs.get::<&Lifetime>(entity).ok().map(|l| l.ticks_left)
    }

    /// Ids of spawns in a zone, ascending.
    pub fn spawns_in_zone(&self, zone: ZoneId) -> Vec<TargetId> {
        let mut spawns: Vec<TargetId> = self
            .ecs
            .query::<(&ObjectId, &Position, &Spawner)>()
            .iter()
            .filter(|(_, (_, pos, _))| pos.0.zone == zone)
            .map(|(_, (id, ..))| id.0)
            .collect();
        spawns.sort_unstable();
        spawns
    }

    /// Energy currently held by spawns and extensions.
    pub fn energy_available(&self, zone: ZoneId) -> u32 {
        self.production_stores(zone).map(|s| s.energy).sum()
    }

    /// Energy spawns and extensions can hold when full.
    pub fn energy_capacity(&self, zone: ZoneId) -> u32 {
        self.production_stores(zone).map(|s| s.capacity).sum()
    }

    fn production_stores(&self, zone: ZoneId) -> impl Iterator<Item = Store> + '_ {
        self.ecs
            .query::<(&Position, &Structure)>()
            .iter()
            .filter(move |(_, (pos, s))| pos.0.zone == zone && s.feeds_production())
            .map(|(_, (_, s))| s.store)
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Take `amount` energy from spawns first, then extensions, by id.
    /// Returns false (and takes nothing) if the zone holds too little.
    pub fn drain_energy(&mut self, zone: ZoneId, amount: u32) -> bool {
        if self.energy_available(zone) < amount {
            return false;
        }
        let mut payers: Vec<(bool, u64, Entity)> = self
            .ecs
            .query::<(&ObjectId, &Position, &Structure)>()
            .iter()
            .filter(|(_, (_, pos, s))| pos.0.zone == zone && s.feeds_production())
            .map(|(entity, (id, _, s))| (s.kind != TargetKind::Spawn, id.0, entity))
            .collect();
        payers.sort();
        let mut owed = amount;
        for (_, _, entity) in payers {
            if owed == 0 {
                break;
            }
            if let Ok(mut structure) = self.ecs.get::<&mut Structure>(entity) {
                let paid = structure.store.energy.min(owed);
                structure.store.energy -= paid;
                owed -= paid;
            }
        }
        true
    }

    pub fn structure(&self, id: TargetId) -> Option<Structure> {
        let entity = self.entity(id)?;
        self.ecs.get::<&Structure>(entity).ok().map(|s| *s)
    }

    pub fn structure_mut(&mut self, id: TargetId) -> Option<hecs::RefMut<'_, Structure>> {
        let entity = self.entity(id)?;
        self.ecs.get::<&mut Structure>(entity).ok()
    }

    pub fn agent_count(&self) -> usize {
        self.ecs.query::<&Body>().iter().count()
    }

    fn adjacent_target(&self, agent: &Agent, id: TargetId) -> Result<Entity, ActionResult> {
        let entity = self.entity(id).ok_or(ActionResult::InvalidTarget)?;
        let pos = self
            .ecs
            .get::<&Position>(entity)
            .map_err(|_| ActionResult::InvalidTarget)?
            .0;
        if !agent.pos.is_adjacent(&pos) {
            return Err(ActionResult::NotInRange);
        }
        Ok(entity)
    }

    fn take_from(&mut self, agent: &mut Agent, id: TargetId, resource: ResourceKind) -> ActionResult {
        let entity = match self.adjacent_target(agent, id) {
            Ok(entity) => entity,
            Err(result) => return result,
        };
        match self.ecs.get::<&mut Structure>(entity) {
            Ok(mut structure) => structure.store.unload_into(&mut agent.cargo, resource),
            Err(_) => ActionResult::InvalidTarget,
        }
    }
}

impl Pathing for ColonyWorld {
    fn path_distance(&mut self, from: &ZonePos, to: &ZonePos) -> Option<u32> {
        self.terrain.find_path(*from, *to).map(|path| path.len() as u32)
    }
}

impl TaskWorld for ColonyWorld {
    fn target(&self, id: TargetId) -> Option<TargetView> {
        let entity = self.entity(id)?;
        let pos = self.ecs.get::<&Position>(entity).ok()?.0;
        let structure = *self.ecs.get::<&Structure>(entity).ok()?;
        Some(TargetView {
            id,
            kind: structure.kind,
            pos,
            store: structure.store,
        })
    }

    fn agent_view(&self, id: AgentId) -> Option<AgentView> {
        let entity = self.entity(id)?;
        let pos = self.ecs.get::<&Position>(entity).ok()?.0;
        let cargo = *self.ecs.get::<&Cargo>(entity).ok()?;
        let role = self.ecs.get::<&AgentMemory>(entity).ok()?.role.clone();
        let claimed_by = self.ecs.get::<&SupplyClaim>(entity).ok()?.0;
        Some(AgentView {
            id,
            pos,
            cargo,
            role,
            claimed_by,
        })
    }

    fn targets_in_zone(&self, zone: ZoneId) -> Vec<TargetView> {
        let mut targets: Vec<TargetView> = self
            .ecs
            .query::<(&ObjectId, &Position, &Structure)>()
            .iter()
            .filter(|(_, (_, pos, _))| pos.0.zone == zone)
            .map(|(_, (id, pos, s))| TargetView {
                id: id.0,
                kind: s.kind,
                pos: pos.0,
                store: s.store,
            })
            .collect();
        targets.sort_by_key(|t| t.id);
        targets
    }

    fn move_toward(&mut self, agent: &mut Agent, to: ZonePos) -> ActionResult {
        match self.terrain.find_path(agent.pos, to) {
            Some(path) => {
                if let Some(next) = path.first() {
                    agent.pos = *next;
                }
                ActionResult::Ok
            }
            None => ActionResult::NoPath,
        }
    }

    fn withdraw(&mut self, agent: &mut Agent, from: TargetId, resource: ResourceKind) -> ActionResult {
        self.take_from(agent, from, resource)
    }

    fn pickup(&mut self, agent: &mut Agent, drop: TargetId) -> ActionResult {
        let resource = match self.structure(drop) {
            Some(s) if s.kind == TargetKind::Drop => ResourceKind::all().into_iter().find(|r| s.store.get(*r) > 0),
            _ => return ActionResult::InvalidTarget,
        };
        match resource {
            Some(resource) => self.take_from(agent, drop, resource),
            None => ActionResult::NotEnoughResources,
        }
    }

    fn harvest(&mut self, agent: &mut Agent, source: TargetId) -> ActionResult {
        let entity = match self.adjacent_target(agent, source) {
            Ok(entity) => entity,
            Err(result) => return result,
        };
        let Ok(mut structure) = self.ecs.get::<&mut Structure>(entity) else {
            return ActionResult::InvalidTarget;
        };
        if structure.kind != TargetKind::Source {
            return ActionResult::InvalidTarget;
        }
        let amount = (count_parts(&agent.body, BodyPart::Work) * HARVEST_PER_WORK).min(structure.store.energy);
        if amount == 0 {
            return ActionResult::NotEnoughResources;
        }
        let taken = agent.cargo.add(ResourceKind::Energy, amount);
        structure.store.energy -= taken;
        ActionResult::Ok
    }

    fn transfer(&mut self, agent: &mut Agent, to: TargetId, resource: ResourceKind) -> ActionResult {
        let entity = match self.adjacent_target(agent, to) {
            Ok(entity) => entity,
            Err(result) => return result,
        };
        match self.ecs.get::<&mut Structure>(entity) {
            Ok(mut structure) => structure.store.load_from(&mut agent.cargo, resource),
            Err(_) => ActionResult::InvalidTarget,
        }
    }

    fn transfer_to_agent(&mut self, agent: &mut Agent, to: AgentId, resource: ResourceKind) -> ActionResult {
        let Some(entity) = self.entity(to) else {
            return ActionResult::InvalidTarget;
        };
        let Ok((pos, cargo)) = self.ecs.query_one_mut::<(&Position, &mut Cargo)>(entity) else {
            return ActionResult::InvalidTarget;
        };
        if !agent.pos.is_adjacent(&pos.0) {
            return ActionResult::NotInRange;
        }
        let carried = agent.cargo.amount_of(resource);
        if carried == 0 {
            return ActionResult::NotEnoughResources;
        }
        let accepted = cargo.add(resource, carried);
        if accepted == 0 {
            return ActionResult::Full;
        }
        agent.cargo.remove(accepted);
        ActionResult::Ok
    }

    fn claim_agent(&mut self, target: AgentId, by: AgentId) -> bool {
        let Some(entity) = self.entity(target) else {
            return false;
        };
        let Ok(mut claim) = self.ecs.get::<&mut SupplyClaim>(entity) else {
            return false;
        };
        match claim.0 {
            Some(holder) => holder == by,
            None => {
                claim.0 = Some(by);
                true
            }
        }
    }

    fn release_claim(&mut self, target: AgentId, by: AgentId) {
        let Some(entity) = self.entity(target) else {
            return;
        };
        if let Ok(mut claim) = self.ecs.get::<&mut SupplyClaim>(entity) {
            if claim.0 == Some(by) {
                claim.0 = None;
            }
        }
    }
}
