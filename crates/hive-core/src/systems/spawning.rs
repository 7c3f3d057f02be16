//! Production system - turns queued spawn requests into agents.
//!
//! An idle spawn peeks at its zone's queue, grows a body for the top
//! request and tries to produce it. A request that cannot be afforded yet
//! stays queued; production is head-of-line, so lower-priority requests wait
//! behind it.

use hive_logic::agent::{AgentId, AgentMemory};
use hive_logic::body::{body_cost, grow_budgeted, grow_live, sort_body, SpawnProbe};
use hive_logic::constants::{BodyPart, AGENT_LIFETIME, MAX_BODY_PARTS, SPAWN_TICKS_PER_PART};
use hive_logic::geometry::ZoneId;
use hive_logic::spawn_queue::SpawnQueue;
use hive_logic::task::TargetId;

use crate::components::{Position, Production, Spawner};
use crate::config::ColonyConfig;
use crate::world::ColonyWorld;

/// Result codes of a production attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// The spawn is already producing.
    Busy,
    NotEnoughEnergy,
    /// Empty body or more than the platform part limit.
    InvalidBody,
    NoSpawn,
}

impl std::fmt::Display for SpawnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpawnError::Busy => write!(f, "spawn is busy"),
            SpawnError::NotEnoughEnergy => write!(f, "not enough energy"),
            SpawnError::InvalidBody => write!(f, "invalid body"),
            SpawnError::NoSpawn => write!(f, "no such spawn"),
        }
    }
}

impl std::error::Error for SpawnError {}

/// Dry run: could `spawn` start producing `body` right now?
pub fn check_spawn(world: &ColonyWorld, spawn: TargetId, body: &[BodyPart]) -> Result<ZoneId, SpawnError> {
    let entity = world.entity(spawn).ok_or(SpawnError::NoSpawn)?;
    let idle = world
        .ecs
        .get::<&Spawner>(entity)
        .map_err(|_| SpawnError::NoSpawn)?
        .is_idle();
    if !idle {
        return Err(SpawnError::Busy);
    }
    if body.is_empty() || body.len() as u32 > MAX_BODY_PARTS {
        return Err(SpawnError::InvalidBody);
    }
    let zone = world
        .ecs
        .get::<&Position>(entity)
        .map_err(|_| SpawnError::NoSpawn)?
        .0
        .zone;
    if body_cost(body) > world.energy_available(zone) {
        return Err(SpawnError::NotEnoughEnergy);
    }
    Ok(zone)
}

/// Feasibility probe bound to one spawn.
pub struct SpawnCheck<'a> {
    pub world: &'a ColonyWorld,
    pub spawn: TargetId,
}

impl SpawnProbe for SpawnCheck<'_> {
    fn can_spawn(&self, body: &[BodyPart]) -> bool {
        check_spawn(self.world, self.spawn, body).is_ok()
    }
}

/// Start producing an agent. Energy is paid up front; the agent appears
/// when production finishes. Returns the reserved agent id.
pub fn produce(
    world: &mut ColonyWorld,
    spawn: TargetId,
    body: Vec<BodyPart>,
    memory: AgentMemory,
) -> Result<AgentId, SpawnError> {
    let zone = check_spawn(world, spawn, &body)?;
    let entity = world.entity(spawn).ok_or(SpawnError::NoSpawn)?;
    if !world.drain_energy(zone, body_cost(&body)) {
        return Err(SpawnError::NotEnoughEnergy);
    }
    let agent = world.allocate_id();
    let ticks_left = body.len() as u32 * SPAWN_TICKS_PER_PART;
    let mut spawner = world
        .ecs
        .get::<&mut Spawner>(entity)
        .map_err(|_| SpawnError::NoSpawn)?;
    spawner.producing = Some(Production {
        agent,
        body,
        memory,
        ticks_left,
    });
    Ok(agent)
}

/// Feed idle spawns in `zone` from its queue. `budget` is the zone's full
/// energy capacity, used by budgeted requests. Returns agents started.
pub fn run_production(
    world: &mut ColonyWorld,
    zone: ZoneId,
    config: &ColonyConfig,
    queue: &mut SpawnQueue,
    budget: u32,
) -> Vec<AgentId> {
    let mut started = Vec::new();
    for spawn in world.spawns_in_zone(zone) {
        let Some(request) = queue.peek().cloned() else {
            break;
        };
        let mut body = if request.max {
            grow_budgeted(&request.profile, budget)
        } else {
            let probe = SpawnCheck { world: &*world, spawn };
            grow_live(&request.profile, config.spawn_base_reserve, &probe)
        };
        if request.sort {
            sort_body(&mut body);
        }

        let cost = body_cost(&body);
        match produce(world, spawn, body, request.memory.clone()) {
            Ok(agent) => {
                queue.pop();
                log::info!(
                    "zone {} spawn {} producing {} agent {} (cost {})",
                    zone,
                    spawn,
                    request.memory.role,
                    agent,
                    cost
                );
                if let Some(old) = request.replacing {
                    world.set_retiring(old);
                }
                started.push(agent);
            }
            Err(SpawnError::Busy) => continue,
            Err(SpawnError::NotEnoughEnergy) => {
                log::debug!("zone {} waiting for {} energy for {}", zone, cost, request.memory.role);
                break;
            }
            Err(e) => {
                log::warn!("zone {} dropping {} request: {}", zone, request.memory.role, e);
                queue.pop();
                break;
            }
        }
    }
    started
}

/// Count down productions; finished agents appear on their spawn's tile.
pub fn advance_production(world: &mut ColonyWorld) -> Vec<AgentId> {
    let mut finished = Vec::new();
    for (_, (pos, spawner)) in world.ecs.query_mut::<(&Position, &mut Spawner)>() {
        let done = match spawner.producing.as_mut() {
            Some(production) => {
                production.ticks_left = production.ticks_left.saturating_sub(1);
                production.ticks_left == 0
            }
            None => false,
        };
        if done {
            if let Some(production) = spawner.producing.take() {
                finished.push((pos.0, production));
            }
        }
    }

    let mut ids = Vec::with_capacity(finished.len());
    for (pos, production) in finished {
        ids.push(production.agent);
        world.add_agent(production.agent, pos, production.body, production.memory, AGENT_LIFETIME);
    }
    ids
}

/// Roles currently in production in `zone`.
pub fn roles_in_production(world: &ColonyWorld, zone: ZoneId) -> Vec<String> {
    world
        .ecs
        .query::<(&Position, &Spawner)>()
        .iter()
        .filter(|(_, (pos, _))| pos.0.zone == zone)
        .filter_map(|(_, (_, spawner))| spawner.producing.as_ref().map(|p| p.memory.role.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Structure;
    use hive_logic::body::BodyProfile;
    use hive_logic::geometry::ZonePos;
    use hive_logic::spawn_queue::SpawnRequest;
    use hive_logic::world::{Store, TargetKind};
    use BodyPart::*;

    fn colony(spawn_energy: u32, extensions: u32) -> (ColonyWorld, TargetId) {
        let mut world = ColonyWorld::new();
        let spawn = world.add_structure(
            ZonePos::new(25, 25, 1),
            Structure::new(TargetKind::Spawn, {
                let mut s = Store::with_capacity(300);
                s.energy = spawn_energy;
                s
            }),
        );
        for i in 0..extensions {
            let mut s = Store::with_capacity(50);
            s.energy = 50;
            world.add_structure(ZonePos::new(20 + i as i32, 20, 1), Structure::new(TargetKind::Extension, s));
        }
        (world, spawn)
    }

    #[test]
    fn test_check_spawn_codes() {
        let (world, spawn) = colony(300, 0);
        assert_eq!(check_spawn(&world, spawn, &[Work, Carry, Move]), Ok(1));
        assert_eq!(check_spawn(&world, spawn, &[]), Err(SpawnError::InvalidBody));
        assert_eq!(check_spawn(&world, spawn, &[Claim]), Err(SpawnError::NotEnoughEnergy));
        assert_eq!(check_spawn(&world, 999, &[Move]), Err(SpawnError::NoSpawn));
        assert_eq!(check_spawn(&world, spawn, &vec![Move; 51]), Err(SpawnError::InvalidBody));
    }

    #[test]
    fn test_produce_pays_and_finishes() {
        let (mut world, spawn) = colony(300, 0);
        let id = produce(&mut world, spawn, vec![Work, Carry, Move], AgentMemory::for_role("worker")).unwrap();
        assert_eq!(world.energy_available(1), 100);
        assert_eq!(
            produce(&mut world, spawn, vec![Move], AgentMemory::for_role("x")),
            Err(SpawnError::Busy)
        );
        for _ in 0..8 {
            assert!(advance_production(&mut world).is_empty());
        }
        assert_eq!(advance_production(&mut world), vec![id]);
        let agent = world.agent(id).unwrap();
        assert_eq!(agent.memory.role, "worker");
        assert_eq!(agent.pos, ZonePos::new(25, 25, 1));
    }

    #[test]
    fn test_live_growth_uses_extensions() {
        let (mut world, _) = colony(300, 4);
        let mut queue = SpawnQueue::new();
        queue.push(SpawnRequest::new(
            10,
            BodyProfile::new(vec![Work, Carry, Move]),
            AgentMemory::for_role("worker"),
        ));
        let config = ColonyConfig::default();
        let started = run_production(&mut world, 1, &config, &mut queue, 500);
        assert_eq!(started.len(), 1);
        // 300 reserve + 200 in extensions: two profile copies.
        assert_eq!(world.energy_available(1), 100);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_budgeted_request_waits_for_energy() {
        let (mut world, spawn) = colony(100, 0);
        let mut queue = SpawnQueue::new();
        queue.push(
            SpawnRequest::new(10, BodyProfile::new(vec![Work, Carry, Move]), AgentMemory::for_role("worker"))
                .budgeted(),
        );
        let config = ColonyConfig::default();
        assert!(run_production(&mut world, 1, &config, &mut queue, 300).is_empty());
        assert_eq!(queue.len(), 1);

        if let Some(mut s) = world.structure_mut(spawn) {
            s.store.energy = 300;
        }
        assert_eq!(run_production(&mut world, 1, &config, &mut queue, 300).len(), 1);
    }

    #[test]
    fn test_replacement_marks_old_agent_retiring() {
        let (mut world, _) = colony(300, 0);
        let old = world.allocate_id();
        world.add_agent(old, ZonePos::new(1, 1, 1), vec![Carry, Move], AgentMemory::for_role("hauler"), 10);
        let mut queue = SpawnQueue::new();
        queue.push(
            SpawnRequest::new(10, BodyProfile::new(vec![Carry, Move]), AgentMemory::for_role("hauler"))
                .replacing(old)
                .sorted(),
        );
        let config = ColonyConfig::default();
        run_production(&mut world, 1, &config, &mut queue, 300);
        assert!(world.agent(old).map(|a| a.memory.retiring).unwrap_or(false));
        assert_eq!(roles_in_production(&world, 1), vec!["hauler".to_string()]);
    }
}
