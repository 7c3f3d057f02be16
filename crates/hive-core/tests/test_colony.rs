//! Integration tests for whole-colony cycles.
//!
//! Exercises: generation → population → production → logistics dispatch
//! → work steps → upkeep, over many cycles of a generated colony.

use std::collections::HashSet;

use hive_core::components::{Lifetime, ObjectId, SupplyClaim};
use hive_core::engine::{ColonyEngine, QUEUE_KEY};
use hive_core::prelude::ColonyConfig;
use hive_logic::spawn_queue::SpawnQueue;
use hive_logic::task::TaskKind;

// ── Helpers ────────────────────────────────────────────────────────────

fn generated(config: ColonyConfig) -> ColonyEngine {
    let mut engine = ColonyEngine::new(config);
    engine.generate();
    engine
}

fn stored_queue(engine: &ColonyEngine, zone: u32) -> SpawnQueue {
    engine
        .cache
        .get::<SpawnQueue>(zone, QUEUE_KEY, engine.tick())
        .unwrap()
        .unwrap_or_default()
}

// ── Population tests ───────────────────────────────────────────────────

#[test]
fn generated_colony_produces_every_role() {
    let mut engine = generated(ColonyConfig::default());
    for _ in 0..800 {
        engine.run_cycle();
    }
    assert!(engine.role_count("worker") >= 2);
    assert!(engine.role_count("hauler") >= 1);
    assert!(engine.role_count("upgrader") >= 1);
}

#[test]
fn ageing_agent_is_replaced_then_reaped() {
    let mut engine = generated(ColonyConfig::default());
    let id = engine.world.agents_in_zone(1)[0].id;
    let entity = engine.world.entity(id).unwrap();
    engine.world.ecs.get::<&mut Lifetime>(entity).unwrap().ticks_left = 50;

    engine.run_cycle();
    assert!(stored_queue(&engine, 1).replaces(id));

    for _ in 0..60 {
        engine.run_cycle();
    }
    assert!(engine.world.agent(id).is_none());
    assert!(engine.role_count("worker") >= 1);
}

#[test]
fn queue_never_requests_beyond_targets() {
    let mut engine = generated(ColonyConfig::default());
    for _ in 0..50 {
        engine.run_cycle();
        let queue = stored_queue(&engine, 1);
        let fresh = queue.iter().filter(|r| r.replacing.is_none()).count();
        // 2 workers + 3 haulers + 2 upgraders, minus the seeded worker.
        assert!(fresh <= 6, "cycle {}: {} fresh requests", engine.tick(), fresh);
    }
}

// ── Logistics tests ────────────────────────────────────────────────────

#[test]
fn no_two_agents_hold_the_same_task() {
    let mut engine = generated(ColonyConfig::default());
    for _ in 0..300 {
        engine.run_cycle();
        let mut seen = HashSet::new();
        for agent in engine.world.agents_in_zone(1) {
            if let Some(task) = agent.task() {
                assert!(seen.insert(task.key()), "duplicate {} at cycle {}", task, engine.tick());
            }
        }
    }
}

#[test]
fn claims_belong_to_supplying_agents() {
    let mut engine = generated(ColonyConfig::default());
    for _ in 0..400 {
        engine.run_cycle();
        let claims: Vec<(u64, u64)> = engine
            .world
            .ecs
            .query::<(&ObjectId, &SupplyClaim)>()
            .iter()
            .filter_map(|(_, (id, claim))| claim.0.map(|by| (id.0, by)))
            .collect();
        for (target, by) in claims {
            let holder = engine.world.agent(by).expect("claim held by a dead agent");
            let supplying = matches!(
                holder.task().map(|t| &t.kind),
                Some(TaskKind::SupplyCreep { target: t, .. }) if *t == target
            );
            assert!(supplying, "agent {} claims {} without supplying it", by, target);
        }
    }
}

#[test]
fn spawn_energy_is_replenished() {
    let mut engine = generated(ColonyConfig::default());
    let mut refilled = false;
    for _ in 0..200 {
        let before = engine.world.energy_available(1);
        engine.run_cycle();
        if engine.world.energy_available(1) > before {
            refilled = true;
            break;
        }
    }
    assert!(refilled);
}

// ── Multi-zone tests ───────────────────────────────────────────────────

#[test]
fn zones_run_independently() {
    let mut config = ColonyConfig::default();
    config.layout.zones = 3;
    let mut engine = generated(config);
    for _ in 0..100 {
        engine.run_cycle();
    }
    for zone in 1..=3 {
        assert!(!engine.world.agents_in_zone(zone).is_empty(), "zone {} is empty", zone);
        for agent in engine.world.agents_in_zone(zone) {
            assert_eq!(agent.pos.zone, zone);
        }
    }
}
