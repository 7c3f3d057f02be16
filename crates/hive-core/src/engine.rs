//! Colony engine - main entry point for running the colony

use hive_logic::agent::Agent;
use hive_logic::catalog::WorkStatus;
use hive_logic::dispatch::{assign, release_stale};
use hive_logic::geometry::ZoneId;
use hive_logic::spawn_queue::{SpawnQueue, SpawnQueues, SpawnRequest};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cache::{Ttl, ZoneCache};
use crate::config::ColonyConfig;
use crate::generation::{generate_colony, ColonyLayout};
use crate::persistence::{load_colony, save_colony, SaveError};
use crate::systems::*;
use crate::world::ColonyWorld;

/// Cache key of a zone's production queue.
pub const QUEUE_KEY: &str = "spawn_queue";
/// Cache key of a zone's energy capacity.
pub const CAPACITY_KEY: &str = "energy_capacity";

/// What happened during one cycle, summed over zones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub tick: u64,
    pub requested: usize,
    /// Productions started.
    pub started: usize,
    /// Agents that finished production and entered the world.
    pub born: usize,
    pub tasks: usize,
    pub assigned: usize,
    pub bumped: usize,
    pub released: usize,
    pub completed: usize,
    pub reaped: usize,
    pub decayed: usize,
    pub upgraded: u64,
}

/// Main colony engine
pub struct ColonyEngine {
    pub world: ColonyWorld,
    pub config: ColonyConfig,
    /// Zone-scoped cache; holds production queues between cycles.
    pub cache: ZoneCache,
    /// Queues of the cycle in progress. Empty between cycles.
    queues: SpawnQueues,
    tick: u64,
    last_report: CycleReport,
}

impl ColonyEngine {
    /// Create an empty colony with `config`.
    pub fn new(config: ColonyConfig) -> Self {
        Self {
            world: ColonyWorld::new(),
            config,
            cache: ZoneCache::new(),
            queues: SpawnQueues::new(),
            tick: 0,
            last_report: CycleReport::default(),
        }
    }

    /// Generate the configured colony layout, seeded from the config.
    pub fn generate(&mut self) -> ColonyLayout {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let layout = generate_colony(&mut self.world, &self.config, &mut rng);
        log::info!(
            "generated {} zone(s), {} wall tiles",
            layout.zones.len(),
            self.world.terrain.walls().len()
        );
        layout
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn last_report(&self) -> &CycleReport {
        &self.last_report
    }

    /// Run one full cycle over every zone.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.tick += 1;
        let mut report = CycleReport {
            tick: self.tick,
            ..Default::default()
        };

        report.reaped = reap_dead(&mut self.world).len();
        for zone in self.world.zones() {
            self.run_zone(zone, &mut report);
        }

        report.born = advance_production(&mut self.world).len();
        age_agents(&mut self.world);
        report.decayed = decay_objects(&mut self.world);
        regen_sources(&mut self.world);
        report.upgraded = upgrade_system(&mut self.world, &self.config);

        log::debug!("cycle {}: {:?}", self.tick, report);
        self.last_report = report.clone();
        report
    }

    fn run_zone(&mut self, zone: ZoneId, report: &mut CycleReport) {
        let loaded = self.load_queue(zone);
        self.queues.insert(zone, loaded);
        let budget = self.zone_capacity(zone);

        let queue = self.queues.zone(zone);
        report.requested += request_agents(&self.world, zone, &self.config, queue);
        report.started += run_production(&mut self.world, zone, &self.config, queue, budget).len();
        let spawn_waiting = !queue.is_empty();

        let tasks = collect_tasks(&self.world, zone, &self.config, spawn_waiting);
        report.tasks += tasks.len();

        let mut agents: Vec<Agent> = self
            .world
            .agents_in_zone(zone)
            .into_iter()
            .filter(|a| self.config.is_logistics_role(&a.memory.role))
            .collect();
        report.released += release_stale(&mut agents, &mut self.world);
        let summary = assign(&mut agents, tasks, &mut self.world);
        report.assigned += summary.assigned.len();
        report.bumped += summary.bumped.len();
        for agent in &agents {
            self.world.write_memory(agent);
        }

        for id in agents.iter().filter(|a| a.is_busy()).map(|a| a.id) {
            report.completed += self.work_agent(id) as usize;
        }

        self.flush_queue(zone);
    }

    /// One work step for a busy agent. Returns true when its task completed.
    fn work_agent(&mut self, id: u64) -> bool {
        let Some(mut agent) = self.world.agent(id) else {
            return false;
        };
        let Some(task) = agent.task().cloned() else {
            return false;
        };
        let status = task.work(&mut agent, &mut self.world);
        if status == WorkStatus::Invalid {
            log::debug!("agent {} dropping invalid {}", id, task);
            task.cancel(id, &mut self.world);
            agent.clear_task();
        }
        self.world.write_back(&agent);
        status == WorkStatus::Complete
    }

    fn load_queue(&self, zone: ZoneId) -> SpawnQueue {
        match self.cache.get::<SpawnQueue>(zone, QUEUE_KEY, self.tick) {
            Ok(queue) => queue.unwrap_or_default(),
            Err(e) => {
                log::warn!("zone {} production queue unreadable, starting empty: {}", zone, e);
                SpawnQueue::new()
            }
        }
    }

    fn flush_queue(&mut self, zone: ZoneId) {
        let queue = self.queues.take(zone);
        if let Err(e) = self.cache.set(zone, QUEUE_KEY, &queue, Ttl::Forever, self.tick) {
            log::warn!("zone {} production queue not stored: {}", zone, e);
        }
    }

    /// Zone energy capacity, recomputed when the cached value expires.
    fn zone_capacity(&mut self, zone: ZoneId) -> u32 {
        if let Ok(Some(capacity)) = self.cache.get::<u32>(zone, CAPACITY_KEY, self.tick) {
            return capacity;
        }
        let capacity = self.world.energy_capacity(zone);
        let ttl = Ttl::Ticks(self.config.capacity_ttl);
        if let Err(e) = self.cache.set(zone, CAPACITY_KEY, &capacity, ttl, self.tick) {
            log::warn!("zone {} capacity not cached: {}", zone, e);
        }
        capacity
    }

    /// Push a request onto a zone's stored production queue.
    pub fn enqueue(&mut self, zone: ZoneId, request: SpawnRequest) {
        let mut queue = self.load_queue(zone);
        queue.push(request);
        self.queues.insert(zone, queue);
        self.flush_queue(zone);
    }

    /// Pending production requests of a zone.
    pub fn pending(&self, zone: ZoneId) -> usize {
        self.load_queue(zone).len()
    }

    pub fn agent_count(&self) -> usize {
        self.world.agent_count()
    }

    /// Live agents of `role` across all zones.
    pub fn role_count(&self, role: &str) -> usize {
        self.world
            .zones()
            .into_iter()
            .flat_map(|zone| self.world.agents_in_zone(zone))
            .filter(|a| a.memory.role == role)
            .count()
    }

    /// Save colony state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        save_colony(writer, &self.world, &self.cache, &self.config, self.tick)
    }

    /// Load colony state from a reader
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = load_colony(reader)?;
        self.world = loaded.world;
        self.cache = loaded.cache;
        self.config = loaded.config;
        self.tick = loaded.tick;
        self.queues = SpawnQueues::new();
        self.last_report = CycleReport::default();
        Ok(())
    }
}

impl Default for ColonyEngine {
    fn default() -> Self {
        Self::new(ColonyConfig::default())
    }
}
