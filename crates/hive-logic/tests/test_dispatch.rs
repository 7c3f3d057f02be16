//! Integration tests for task dispatch against the in-memory world.
//!
//! Randomized sweeps use a fixed-seed `StdRng` so failures reproduce.

use hive_logic::agent::{Agent, AgentId, AgentMemory};
use hive_logic::constants::{BodyPart, ResourceKind};
use hive_logic::dispatch::{assign, release_stale};
use hive_logic::geometry::ZonePos;
use hive_logic::sandbox::Sandbox;
use hive_logic::task::{Task, TaskKind};
use hive_logic::world::{Store, TargetKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Helpers ────────────────────────────────────────────────────────────

fn hauler(id: AgentId, pos: ZonePos) -> Agent {
    Agent::new(
        id,
        pos,
        vec![BodyPart::Carry, BodyPart::Carry, BodyPart::Move],
        AgentMemory::for_role("hauler"),
    )
}

fn random_pos(rng: &mut StdRng) -> ZonePos {
    ZonePos::new(rng.gen_range(0..50), rng.gen_range(0..50), 1)
}

fn random_task(rng: &mut StdRng, target: u64) -> Task {
    let pos = random_pos(rng);
    let kind = match rng.gen_range(0..3) {
        0 => TaskKind::SupplySpawn { target },
        1 => TaskKind::SupplyStructure {
            target,
            resource: ResourceKind::Energy,
        },
        _ => TaskKind::Cleanup {
            target,
            resource: ResourceKind::Energy,
        },
    };
    Task::new(kind, rng.gen_range(-10..100), pos)
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn override_bumps_only_busy_agent() {
    let mut world = Sandbox::new();
    let original = Task::new(TaskKind::SupplySpawn { target: 1 }, 20, ZonePos::new(5, 5, 1));
    let mut agent = hauler(1, ZonePos::new(6, 6, 1));
    agent.assign(original.clone());
    let mut agents = vec![agent];

    let urgent = Task::new(TaskKind::SupplySpawn { target: 2 }, 40, ZonePos::new(30, 30, 1)).with_override();
    let other = Task::new(TaskKind::SupplySpawn { target: 3 }, 10, ZonePos::new(30, 31, 1));
    let summary = assign(&mut agents, vec![other.clone(), urgent.clone()], &mut world);

    assert_eq!(agents[0].task(), Some(&urgent));
    assert_eq!(summary.bumped.len(), 1);
    assert_eq!(summary.bumped[0].previous, original);
    assert_eq!(summary.unassigned, vec![other]);
}

#[test]
fn stale_then_dispatch_reassigns() {
    let mut world = Sandbox::new();
    let spawn = world.add_target(TargetKind::Spawn, ZonePos::new(10, 10, 1), Store::with_capacity(300));
    let gone = world.add_target(TargetKind::Spawn, ZonePos::new(20, 20, 1), Store::with_capacity(300));
    let mut agent = hauler(1, ZonePos::new(19, 19, 1));
    agent.assign(Task::new(TaskKind::SupplySpawn { target: gone }, 50, ZonePos::new(20, 20, 1)));
    world.remove_target(gone);
    let mut agents = vec![agent];

    assert_eq!(release_stale(&mut agents, &mut world), 1);
    let fresh = Task::new(TaskKind::SupplySpawn { target: spawn }, 5, ZonePos::new(10, 10, 1));
    assign(&mut agents, vec![fresh.clone()], &mut world);
    assert_eq!(agents[0].task(), Some(&fresh));
}

// ── Randomized properties ──────────────────────────────────────────────

#[test]
fn single_agent_takes_highest_priority() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let mut world = Sandbox::new();
        let mut agents = vec![hauler(1, random_pos(&mut rng))];
        let count = rng.gen_range(1..12);
        let tasks: Vec<Task> = (0..count).map(|t| random_task(&mut rng, t)).collect();
        let best = tasks.iter().map(|t| t.priority).max().unwrap();
        assign(&mut agents, tasks, &mut world);
        assert_eq!(agents[0].current_priority(), best);
    }
}

#[test]
fn assignments_follow_priority_order() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let mut world = Sandbox::new();
        let free = rng.gen_range(1..6);
        let mut agents: Vec<Agent> = (0..free).map(|id| hauler(id, random_pos(&mut rng))).collect();
        let count = rng.gen_range(0..15);
        let tasks: Vec<Task> = (0..count).map(|t| random_task(&mut rng, t)).collect();
        let summary = assign(&mut agents, tasks, &mut world);

        let lowest_assigned = summary.assigned.iter().map(|(_, t)| t.priority).min();
        let highest_dropped = summary.unassigned.iter().map(|t| t.priority).max();
        if let (Some(low), Some(high)) = (lowest_assigned, highest_dropped) {
            assert!(low >= high, "dropped {} while assigning {}", high, low);
        }
        assert_eq!(summary.assigned.len(), (count as usize).min(free as usize));
    }
}

#[test]
fn held_tasks_are_never_reissued() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..200 {
        let mut world = Sandbox::new();
        let mut agents = Vec::new();
        let mut held = Vec::new();
        for id in 0..rng.gen_range(1..8) {
            let mut agent = hauler(id, random_pos(&mut rng));
            if rng.gen_bool(0.5) {
                let task = random_task(&mut rng, 1000 + id);
                held.push(task.clone());
                agent.assign(task);
            }
            agents.push(agent);
        }
        // Re-offer every held task (with fresh priorities) next to new work.
        let mut offered: Vec<Task> = held
            .iter()
            .map(|t| {
                let mut again = t.clone();
                again.priority = rng.gen_range(0..200);
                again.override_ = rng.gen_bool(0.5);
                again
            })
            .collect();
        offered.extend((0..rng.gen_range(0..6)).map(|t| random_task(&mut rng, t)));

        let summary = assign(&mut agents, offered, &mut world);
        assert_eq!(summary.duplicates, held.len());
        for (_, task) in &summary.assigned {
            assert!(!held.iter().any(|h| h.same_as(task)), "reissued {}", task);
        }
    }
}

#[test]
fn override_bumps_lowest_eligible_priority() {
    let mut rng = StdRng::seed_from_u64(31);
    for _ in 0..300 {
        let mut world = Sandbox::new();
        let mut agents = Vec::new();
        for id in 0..rng.gen_range(1..8) {
            let mut agent = hauler(id, random_pos(&mut rng));
            agent.assign(random_task(&mut rng, 1000 + id));
            agents.push(agent);
        }
        let lowest = agents.iter().map(Agent::current_priority).min().unwrap();
        let urgent = random_task(&mut rng, 1).with_override();
        let summary = assign(&mut agents, vec![urgent.clone()], &mut world);

        if lowest <= urgent.priority {
            assert_eq!(summary.bumped.len(), 1);
            assert_eq!(summary.bumped[0].priority, lowest);
            assert!(summary.bumped[0].priority <= urgent.priority);
            assert_eq!(summary.assigned_to(summary.bumped[0].agent), Some(&urgent));
        } else {
            assert!(summary.bumped.is_empty());
            assert_eq!(summary.unassigned, vec![urgent]);
        }
    }
}

#[test]
fn persisted_assignment_still_dedups() {
    let held = Task::new(TaskKind::SupplySpawn { target: 8 }, 30, ZonePos::new(12, 12, 1)).with_tag("east");
    let mut agent = hauler(1, ZonePos::new(10, 10, 1));
    agent.assign(held.clone());

    let json = serde_json::to_string(&agent.memory).unwrap();
    agent.memory = serde_json::from_str(&json).unwrap();
    assert_eq!(agent.task(), Some(&held));

    let mut agents = vec![agent, hauler(2, ZonePos::new(40, 40, 1))];
    let summary = assign(&mut agents, vec![held], &mut Sandbox::new());
    assert_eq!(summary.duplicates, 1);
    assert!(agents[1].task().is_none());
}
