//! Upkeep systems - ageing, death, decay, source regrowth and upgrading.

use hive_logic::agent::{AgentId, AgentMemory, Cargo};
use hive_logic::body::count_parts;
use hive_logic::constants::{BodyPart, ResourceKind};
use hive_logic::world::{Store, TargetKind};

use crate::components::{Body, Decay, Lifetime, ObjectId, Regen, Structure};
use crate::config::ColonyConfig;
use crate::world::ColonyWorld;

/// Corpse stores last this many cycles per body part.
const TOMBSTONE_TICKS_PER_PART: u32 = 5;

/// Age every agent by one cycle.
pub fn age_agents(world: &mut ColonyWorld) {
    for (_, lifetime) in world.ecs.query_mut::<&mut Lifetime>() {
        lifetime.ticks_left = lifetime.ticks_left.saturating_sub(1);
    }
}

/// Remove agents whose lifetime ran out. Their held task is cancelled and
/// any cargo is left behind in a tombstone. Returns the reaped ids.
pub fn reap_dead(world: &mut ColonyWorld) -> Vec<AgentId> {
    let mut dead: Vec<AgentId> = world
        .ecs
        .query::<(&ObjectId, &Lifetime)>()
        .iter()
        .filter(|(_, (_, lifetime))| lifetime.ticks_left == 0)
        .map(|(_, (id, _))| id.0)
        .collect();
    dead.sort_unstable();

    for &id in &dead {
        let Some(mut agent) = world.agent(id) else {
            continue;
        };
        if let Some(task) = agent.clear_task() {
            task.cancel(id, world);
        }
        if let Some(resource) = agent.cargo.resource.filter(|_| !agent.cargo.is_empty()) {
            let ticks = agent.body.len() as u32 * TOMBSTONE_TICKS_PER_PART;
            world.add_decaying(
                agent.pos,
                TargetKind::Tombstone,
                Store::holding(resource, agent.cargo.amount),
                ticks.max(1),
            );
        }
        world.despawn(id);
        log::debug!("agent {} ({}) expired", id, agent.memory.role);
    }
    dead
}

/// Count down decaying objects; expired or emptied ones disappear.
pub fn decay_objects(world: &mut ColonyWorld) -> usize {
    let mut gone = Vec::new();
    for (_, (id, decay, structure)) in world.ecs.query_mut::<(&ObjectId, &mut Decay, &Structure)>() {
        decay.ticks_left = decay.ticks_left.saturating_sub(1);
        if decay.ticks_left == 0 || structure.store.used() == 0 {
            gone.push(id.0);
        }
    }
    for &id in &gone {
        world.despawn(id);
    }
    gone.len()
}

/// Refill sources whose regrowth timer ran out.
pub fn regen_sources(world: &mut ColonyWorld) {
    for (_, (structure, regen)) in world.ecs.query_mut::<(&mut Structure, &mut Regen)>() {
        regen.timer = regen.timer.saturating_sub(1);
        if regen.timer == 0 {
            structure.store.energy = regen.max;
            regen.timer = regen.interval.max(1);
        }
    }
}

/// Supplied agents burn carried energy per `Work` part. Returns the energy
/// burned this cycle.
pub fn upgrade_system(world: &mut ColonyWorld, config: &ColonyConfig) -> u64 {
    let mut burned = 0u64;
    for (_, (body, cargo, memory)) in world.ecs.query_mut::<(&Body, &mut Cargo, &AgentMemory)>() {
        if !config.is_supplied_role(&memory.role) {
            continue;
        }
        let rate = count_parts(&body.0, BodyPart::Work) * config.upgrade_rate;
        let used = cargo.amount_of(ResourceKind::Energy).min(rate);
        burned += cargo.remove(used) as u64;
    }
    burned
}
