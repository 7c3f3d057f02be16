//! Logistics controller - rebuilds the zone's task list every cycle.
//!
//! Tasks are derived from current world state only. Work already held by an
//! agent is re-emitted here as well; the dispatcher drops the duplicate.

use hive_logic::constants::{BodyPart, ResourceKind};
use hive_logic::geometry::ZoneId;
use hive_logic::task::{Requirement, Task, TaskKind};
use hive_logic::world::{TargetKind, TaskWorld};

use crate::config::ColonyConfig;
use crate::world::ColonyWorld;

/// Agents need carry parts and must not hold a different resource.
fn carried(task: Task) -> Task {
    let resource = task.kind.resource();
    task.require(Requirement::HasPart(BodyPart::Carry))
        .require(Requirement::NotCarryingOther(resource))
}

/// Every task currently offered in `zone`.
///
/// `spawn_waiting` marks one spawn supply task as override work, so a busy
/// agent is pulled off other work while production is stalled. No override
/// is offered while an agent already holds spawn supply; otherwise equal
/// priority overrides would trade that agent between targets every cycle.
pub fn collect_tasks(world: &ColonyWorld, zone: ZoneId, config: &ColonyConfig, spawn_waiting: bool) -> Vec<Task> {
    let priorities = &config.priorities;
    let targets = world.targets_in_zone(zone);
    let agents = world.agents_in_zone(zone);
    let supplying = agents
        .iter()
        .filter_map(|a| a.task())
        .any(|t| matches!(t.kind, TaskKind::SupplySpawn { .. }));
    let mut override_left = spawn_waiting && !supplying;
    let storage = targets
        .iter()
        .find(|t| t.kind == TargetKind::Storage)
        .copied();
    let has_store_room = targets.iter().any(|t| t.kind.is_storage() && t.free_capacity() > 0);
    let mut tasks = Vec::new();

    for target in &targets {
        match target.kind {
            TargetKind::Spawn | TargetKind::Extension if target.free_capacity() > 0 => {
                let task = Task::new(TaskKind::SupplySpawn { target: target.id }, priorities.supply_spawn, target.pos);
                if override_left {
                    override_left = false;
                    tasks.push(task.with_override());
                } else {
                    tasks.push(task);
                }
            }
            TargetKind::Tower if target.free_capacity() > 0 => {
                tasks.push(Task::new(
                    TaskKind::SupplyStructure {
                        target: target.id,
                        resource: ResourceKind::Energy,
                    },
                    priorities.supply_structure,
                    target.pos,
                ));
            }
            TargetKind::Container => {
                let sink = world.structure(target.id).map(|s| s.sink).unwrap_or(false);
                if sink {
                    let hungry = target.free_capacity() > target.store.capacity / 2;
                    if let Some(storage) = storage.filter(|s| hungry && s.stock(ResourceKind::Energy) > 0) {
                        tasks.push(Task::new(
                            TaskKind::Haul {
                                from: storage.id,
                                to: target.id,
                                resource: ResourceKind::Energy,
                            },
                            priorities.haul,
                            storage.pos,
                        ));
                    }
                    continue;
                }
                if storage.is_none() {
                    continue;
                }
                for resource in ResourceKind::all() {
                    let stock = target.stock(resource);
                    let due = match resource {
                        ResourceKind::Energy => stock >= config.unload_threshold,
                        _ => stock > 0,
                    };
                    if due {
                        tasks.push(Task::new(
                            TaskKind::Unload {
                                source: target.id,
                                resource,
                            },
                            priorities.unload,
                            target.pos,
                        ));
                    }
                }
            }
            TargetKind::Drop | TargetKind::Tombstone | TargetKind::Ruin if has_store_room => {
                for resource in ResourceKind::all() {
                    if target.stock(resource) > 0 {
                        tasks.push(Task::new(
                            TaskKind::Cleanup {
                                target: target.id,
                                resource,
                            },
                            priorities.cleanup,
                            target.pos,
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    for agent in agents {
        if !config.is_supplied_role(&agent.memory.role) || agent.memory.retiring {
            continue;
        }
        let claimed = world
            .agent_view(agent.id)
            .and_then(|v| v.claimed_by)
            .is_some();
        if !claimed && agent.cargo.capacity > 0 && agent.cargo.free() > agent.cargo.capacity / 2 {
            tasks.push(Task::new(
                TaskKind::SupplyCreep {
                    target: agent.id,
                    resource: ResourceKind::Energy,
                },
                priorities.supply_creep,
                agent.pos,
            ));
        }
    }

    tasks.into_iter().map(carried).collect()
}
