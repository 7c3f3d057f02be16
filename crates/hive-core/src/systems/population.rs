//! Population controller - keeps each role at its target head count.
//!
//! Counts live agents that are not retiring, agents in production and fresh
//! requests already queued. Agents close to the end of their lifetime get a
//! replacement request; the old agent is marked retiring once the
//! replacement starts production.

use hive_logic::agent::AgentMemory;
use hive_logic::geometry::ZoneId;
use hive_logic::spawn_queue::{SpawnQueue, SpawnRequest};

use crate::config::{ColonyConfig, RoleConfig};
use crate::systems::spawning::roles_in_production;
use crate::world::ColonyWorld;

fn request_for(role: &RoleConfig) -> SpawnRequest {
    let mut request = SpawnRequest::new(role.priority, role.profile.clone(), AgentMemory::for_role(role.name.clone()));
    if role.max {
        request = request.budgeted();
    }
    if role.sort {
        request = request.sorted();
    }
    request
}

/// Queue whatever `zone` is missing. Returns the number of requests pushed.
pub fn request_agents(world: &ColonyWorld, zone: ZoneId, config: &ColonyConfig, queue: &mut SpawnQueue) -> usize {
    let agents = world.agents_in_zone(zone);
    let producing = roles_in_production(world, zone);
    let mut pushed = 0;

    for role in &config.roles {
        let alive = agents
            .iter()
            .filter(|a| a.memory.role == role.name && !a.memory.retiring)
            .count();
        let in_production = producing.iter().filter(|r| **r == role.name).count();
        let queued = queue
            .iter()
            .filter(|r| r.memory.role == role.name && r.replacing.is_none())
            .count();

        let have = alive + in_production + queued;
        for _ in have..role.target as usize {
            queue.push(request_for(role));
            pushed += 1;
        }

        for agent in agents.iter().filter(|a| a.memory.role == role.name && !a.memory.retiring) {
            let ageing = world
                .lifetime(agent.id)
                .map(|left| left <= config.replace_margin)
                .unwrap_or(false);
            if ageing && !queue.replaces(agent.id) {
                log::debug!("zone {} requesting replacement for {} {}", zone, role.name, agent.id);
                queue.push(request_for(role).replacing(agent.id));
                pushed += 1;
            }
        }
    }
    pushed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Structure;
    use hive_logic::constants::BodyPart;
    use hive_logic::geometry::ZonePos;
    use hive_logic::world::{Store, TargetKind};

    fn zone_with_spawn() -> ColonyWorld {
        let mut world = ColonyWorld::new();
        world.add_structure(
            ZonePos::new(25, 25, 1),
            Structure::new(TargetKind::Spawn, Store::with_capacity(300)),
        );
        world
    }

    fn add(world: &mut ColonyWorld, role: &str, lifetime: u32) -> u64 {
        let id = world.allocate_id();
        world.add_agent(id, ZonePos::new(1, 1, 1), vec![BodyPart::Carry, BodyPart::Move], AgentMemory::for_role(role), lifetime);
        id
    }

    #[test]
    fn test_fills_empty_zone_to_targets() {
        let world = zone_with_spawn();
        let config = ColonyConfig::default();
        let mut queue = SpawnQueue::new();
        assert_eq!(request_agents(&world, 1, &config, &mut queue), 7);
        // Second pass sees the queued requests.
        assert_eq!(request_agents(&world, 1, &config, &mut queue), 0);
        let top = queue.peek().unwrap();
        assert_eq!(top.memory.role, "worker");
        assert!(top.sort);
    }

    #[test]
    fn test_live_agents_count() {
        let mut world = zone_with_spawn();
        add(&mut world, "hauler", 1500);
        add(&mut world, "hauler", 1500);
        add(&mut world, "hauler", 1500);
        let config = ColonyConfig::default();
        let mut queue = SpawnQueue::new();
        request_agents(&world, 1, &config, &mut queue);
        assert_eq!(queue.iter().filter(|r| r.memory.role == "hauler").count(), 0);
        assert!(queue.iter().any(|r| r.memory.role == "upgrader" && r.max));
    }

    #[test]
    fn test_ageing_agent_gets_one_replacement() {
        let mut world = zone_with_spawn();
        let old = add(&mut world, "hauler", 50);
        add(&mut world, "hauler", 1500);
        add(&mut world, "hauler", 1500);
        let config = ColonyConfig::default();
        let mut queue = SpawnQueue::new();
        request_agents(&world, 1, &config, &mut queue);
        request_agents(&world, 1, &config, &mut queue);
        let replacements: Vec<_> = queue.iter().filter(|r| r.replacing.is_some()).collect();
        assert_eq!(replacements.len(), 1);
        assert_eq!(replacements[0].replacing, Some(old));
    }

    #[test]
    fn test_retiring_agents_do_not_count() {
        let mut world = zone_with_spawn();
        let a = add(&mut world, "worker", 1500);
        add(&mut world, "worker", 1500);
        world.set_retiring(a);
        let config = ColonyConfig::default();
        let mut queue = SpawnQueue::new();
        request_agents(&world, 1, &config, &mut queue);
        assert_eq!(queue.iter().filter(|r| r.memory.role == "worker").count(), 1);
    }
}
