//! Multi-cycle logistics: producers, dispatch and work steps together.
//!
//! Mirrors what the engine does per zone, against the in-memory world.

use hive_logic::agent::{Agent, AgentMemory};
use hive_logic::catalog::WorkStatus;
use hive_logic::constants::{BodyPart, ResourceKind};
use hive_logic::dispatch::{assign, release_stale};
use hive_logic::geometry::ZonePos;
use hive_logic::sandbox::Sandbox;
use hive_logic::task::{Task, TaskKind};
use hive_logic::world::{Store, TargetKind, TaskWorld};

fn at(x: i32, y: i32) -> ZonePos {
    ZonePos::new(x, y, 1)
}

/// Offer a SupplySpawn for every spawn or extension with room.
fn spawn_demand(world: &Sandbox) -> Vec<Task> {
    world
        .targets_in_zone(1)
        .into_iter()
        .filter(|t| matches!(t.kind, TargetKind::Spawn | TargetKind::Extension) && t.free_capacity() > 0)
        .map(|t| Task::new(TaskKind::SupplySpawn { target: t.id }, 30, t.pos))
        .collect()
}

fn run_cycle(agents: &mut [Agent], tasks: Vec<Task>, world: &mut Sandbox) -> usize {
    release_stale(agents, world);
    assign(agents, tasks, world);
    let mut completed = 0;
    for agent in agents.iter_mut() {
        let Some(task) = agent.task().cloned() else {
            continue;
        };
        match task.work(agent, world) {
            WorkStatus::Complete => completed += 1,
            WorkStatus::Invalid => {
                task.cancel(agent.id, world);
                agent.clear_task();
            }
            WorkStatus::InProgress | WorkStatus::Blocked => {}
        }
    }
    completed
}

#[test]
fn haulers_fill_spawn_and_extensions() {
    let mut world = Sandbox::new();
    let storage = world.add_target(TargetKind::Storage, at(25, 25), {
        let mut store = Store::with_capacity(100_000);
        store.energy = 10_000;
        store
    });
    let spawn = world.add_target(TargetKind::Spawn, at(20, 20), Store::with_capacity(300));
    let extensions: Vec<u64> = (18..23)
        .map(|x| world.add_target(TargetKind::Extension, at(x, 17), Store::with_capacity(50)))
        .collect();

    let mut agents: Vec<Agent> = (1..=3)
        .map(|id| {
            Agent::new(
                id,
                at(24 + id as i32, 30),
                vec![BodyPart::Carry, BodyPart::Carry, BodyPart::Move, BodyPart::Move],
                AgentMemory::for_role("hauler"),
            )
        })
        .collect();

    let mut completed = 0;
    for _ in 0..300 {
        let tasks = spawn_demand(&world);
        if tasks.is_empty() && agents.iter().all(|a| !a.is_busy()) {
            break;
        }
        completed += run_cycle(&mut agents, tasks, &mut world);
    }

    assert_eq!(world.store_of(spawn).map(|s| s.energy), Some(300));
    for ext in extensions {
        assert_eq!(world.store_of(ext).map(|s| s.energy), Some(50));
    }
    assert!(completed >= 6);
    let carried: u32 = agents.iter().map(|a| a.cargo.amount_of(ResourceKind::Energy)).sum();
    let left = world.store_of(storage).map(|s| s.energy).unwrap_or(0);
    assert_eq!(left + carried + 550, 10_000);
}

#[test]
fn no_two_agents_hold_the_same_task() {
    let mut world = Sandbox::new();
    world.add_target(TargetKind::Container, at(10, 10), {
        let mut store = Store::with_capacity(2000);
        store.energy = 2000;
        store
    });
    let spawn = world.add_target(TargetKind::Spawn, at(40, 40), Store::with_capacity(300));
    let mut agents: Vec<Agent> = (1..=4)
        .map(|id| {
            Agent::new(
                id,
                at(10 + id as i32, 12),
                vec![BodyPart::Carry, BodyPart::Move],
                AgentMemory::for_role("hauler"),
            )
        })
        .collect();

    for _ in 0..10 {
        let tasks = vec![Task::new(TaskKind::SupplySpawn { target: spawn }, 30, at(40, 40))];
        run_cycle(&mut agents, tasks, &mut world);
        let holders = agents.iter().filter(|a| a.is_busy()).count();
        assert!(holders <= 1, "{} agents hold the same delivery", holders);
    }
}
