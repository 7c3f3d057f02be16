//! Hive Headless Colony Harness
//!
//! Validates decision logic and whole-colony cycles in-process.
//! No platform, no networking, no rendering.
//!
//! Usage:
//!   cargo run -p hive-simtest
//!   cargo run -p hive-simtest -- --verbose

use std::collections::HashSet;

use hive_core::engine::ColonyEngine;
use hive_core::prelude::ColonyConfig;
use hive_logic::agent::{Agent, AgentMemory};
use hive_logic::body::{body_cost, build_body_profile, count_parts, grow_budgeted, sort_body, BodyProfile};
use hive_logic::constants::BodyPart;
use hive_logic::dispatch::assign;
use hive_logic::geometry::ZonePos;
use hive_logic::sandbox::Sandbox;
use hive_logic::spawn_queue::{SpawnQueue, SpawnRequest};
use hive_logic::task::{Task, TaskKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Colony config (same JSON a deployment would load) ───────────────────
const COLONY_JSON: &str = include_str!("../../../data/colony.json");

/// Cycles the colony run covers.
const RUN_CYCLES: u32 = 1_000;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    println!("=== Hive Colony Harness ===\n");

    let mut results = Vec::new();

    // 1. Config validation
    let config = match ColonyConfig::from_json(COLONY_JSON) {
        Ok(config) => config,
        Err(e) => {
            println!("  ✗ config_parse: {}", e);
            std::process::exit(1);
        }
    };
    results.extend(validate_config(&config, verbose));

    // 2. Body growth sweep
    results.extend(validate_body_growth(&config, verbose));

    // 3. Production queue ordering
    results.extend(validate_spawn_queue(verbose));

    // 4. Dispatch sweep on the in-memory world
    results.extend(validate_dispatch(verbose));

    // 5. Full colony run
    results.extend(validate_colony_run(&config, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!("\n=== RESULT: {}/{} passed, {} failed ===", passed, total, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Config ───────────────────────────────────────────────────────────

fn validate_config(config: &ColonyConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Colony Config ---");
    let mut results = Vec::new();

    results.push(TestResult {
        name: "config_has_roles".into(),
        passed: !config.roles.is_empty(),
        detail: format!("{} roles loaded", config.roles.len()),
    });

    let undefined: Vec<&String> = config
        .logistics_roles
        .iter()
        .chain(&config.supplied_roles)
        .filter(|name| config.role(name).is_none())
        .collect();
    results.push(TestResult {
        name: "config_role_references".into(),
        passed: undefined.is_empty(),
        detail: if undefined.is_empty() {
            "every referenced role is defined".into()
        } else {
            format!("undefined roles: {:?}", undefined)
        },
    });

    let empty: Vec<&str> = config
        .roles
        .iter()
        .filter(|r| r.profile.profile.is_empty())
        .map(|r| r.name.as_str())
        .collect();
    results.push(TestResult {
        name: "config_profiles_grow".into(),
        passed: empty.is_empty(),
        detail: format!("{} roles with an empty growth unit", empty.len()),
    });

    let mut names = HashSet::new();
    let unique = config.roles.iter().all(|r| names.insert(r.name.as_str()));
    results.push(TestResult {
        name: "config_unique_role_names".into(),
        passed: unique,
        detail: "role names are unique".into(),
    });

    if verbose {
        for role in &config.roles {
            println!(
                "  {:<10} target {} priority {:>3} profile {:?}",
                role.name, role.target, role.priority, role.profile.profile
            );
        }
    }

    results
}

// ── 2. Body Growth ──────────────────────────────────────────────────────

fn validate_body_growth(config: &ColonyConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Body Growth ---");
    let mut results = Vec::new();

    let mut over_ceiling = 0;
    let mut over_budget = 0;
    let mut shrank = 0;
    let mut samples = 0;
    for role in &config.roles {
        let minimal = initial_body(&role.profile);
        let mut last_cost = 0;
        for budget in (0..=12_900).step_by(100) {
            let body = grow_budgeted(&role.profile, budget);
            samples += 1;
            if body.len() > (role.profile.ceiling() as usize).max(minimal.len()) {
                over_ceiling += 1;
            }
            if body_cost(&body) > budget.max(body_cost(&minimal)) {
                over_budget += 1;
            }
            if body_cost(&body) < last_cost {
                shrank += 1;
            }
            last_cost = body_cost(&body);
        }
        if verbose {
            let full = grow_budgeted(&role.profile, 12_900);
            println!("  {:<10} at 12900: {} parts, cost {}", role.name, full.len(), body_cost(&full));
        }
    }

    results.push(TestResult {
        name: "growth_within_ceiling".into(),
        passed: over_ceiling == 0,
        detail: format!("{} of {} samples over the part ceiling", over_ceiling, samples),
    });
    results.push(TestResult {
        name: "growth_within_budget".into(),
        passed: over_budget == 0,
        detail: format!("{} of {} samples over budget", over_budget, samples),
    });
    results.push(TestResult {
        name: "growth_monotonic".into(),
        passed: shrank == 0,
        detail: format!("{} budget steps produced a cheaper body", shrank),
    });

    // Back-solving a ceiling from a wanted Work count
    let mut misses = Vec::new();
    for role in config.roles.iter().filter(|r| r.profile.profile.contains(&BodyPart::Work)) {
        for wanted in 1..=10 {
            let profile = build_body_profile(&role.profile, BodyPart::Work, wanted);
            let body = grow_budgeted(&profile, u32::MAX);
            let got = count_parts(&body, BodyPart::Work);
            let floor = count_parts(&initial_body(&role.profile), BodyPart::Work);
            if got > wanted.max(floor) {
                misses.push(format!("{} wanted {} got {}", role.name, wanted, got));
            }
        }
    }
    results.push(TestResult {
        name: "growth_back_solve".into(),
        passed: misses.is_empty(),
        detail: if misses.is_empty() {
            "back-solved ceilings never overshoot".into()
        } else {
            misses.join("; ")
        },
    });

    // Canonical sort keeps the multiset
    let mut body = vec![BodyPart::Move, BodyPart::Carry, BodyPart::Work, BodyPart::Tough, BodyPart::Move];
    let before = body.clone();
    sort_body(&mut body);
    let kept = BodyPart::all()
        .iter()
        .all(|p| count_parts(&body, *p) == count_parts(&before, *p));
    results.push(TestResult {
        name: "growth_sort_canonical".into(),
        passed: kept && body.first() == Some(&BodyPart::Tough) && body.last() == Some(&BodyPart::Move),
        detail: format!("{:?}", body),
    });

    results
}

/// The body growth starts from: the seed, or one profile copy.
fn initial_body(profile: &BodyProfile) -> Vec<BodyPart> {
    if profile.seed.is_empty() {
        profile.profile.clone()
    } else {
        profile.seed.clone()
    }
}

// ── 3. Production Queue ─────────────────────────────────────────────────

fn validate_spawn_queue(_verbose: bool) -> Vec<TestResult> {
    println!("--- Production Queue ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(5);

    let mut violations = 0;
    for _ in 0..200 {
        let mut queue = SpawnQueue::new();
        let count = rng.gen_range(0..20);
        for i in 0..count {
            let memory = AgentMemory::for_role(format!("r{}", i));
            let profile = BodyProfile::new(vec![BodyPart::Move]);
            queue.push(SpawnRequest::new(rng.gen_range(0..5), profile, memory));
        }
        let mut last: Option<(i32, usize)> = None;
        while let Some(request) = queue.pop() {
            let order: usize = request.memory.role[1..].parse().unwrap_or(0);
            if let Some((priority, index)) = last {
                let ok = request.priority < priority || (request.priority == priority && order > index);
                if !ok {
                    violations += 1;
                }
            }
            last = Some((request.priority, order));
        }
    }
    results.push(TestResult {
        name: "queue_priority_then_fifo".into(),
        passed: violations == 0,
        detail: format!("{} ordering violations over 200 queues", violations),
    });

    let mut empty = SpawnQueue::new();
    results.push(TestResult {
        name: "queue_empty_pop".into(),
        passed: empty.pop().is_none(),
        detail: "empty queue pops nothing".into(),
    });

    results
}

// ── 4. Dispatch ─────────────────────────────────────────────────────────

fn random_pos(rng: &mut StdRng) -> ZonePos {
    ZonePos::new(rng.gen_range(0..50), rng.gen_range(0..50), 1)
}

fn validate_dispatch(verbose: bool) -> Vec<TestResult> {
    println!("--- Dispatch ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(17);

    let mut doubled = 0;
    let mut order_breaks = 0;
    let mut bad_bumps = 0;
    let mut assigned_total = 0;
    for round in 0..500u64 {
        let mut world = Sandbox::new();
        let mut agents: Vec<Agent> = (0..rng.gen_range(1..10))
            .map(|id| {
                let mut agent = Agent::new(
                    id,
                    random_pos(&mut rng),
                    vec![BodyPart::Carry, BodyPart::Move],
                    AgentMemory::for_role("hauler"),
                );
                if rng.gen_bool(0.4) {
                    let pos = random_pos(&mut rng);
                    agent.assign(Task::new(
                        TaskKind::SupplySpawn { target: 10_000 + id },
                        rng.gen_range(0..100),
                        pos,
                    ));
                }
                agent
            })
            .collect();
        let tasks: Vec<Task> = (0..rng.gen_range(0..15))
            .map(|t| {
                let task = Task::new(
                    TaskKind::SupplySpawn { target: round * 100 + t },
                    rng.gen_range(0..100),
                    random_pos(&mut rng),
                );
                if rng.gen_bool(0.2) {
                    task.with_override()
                } else {
                    task
                }
            })
            .collect();

        let summary = assign(&mut agents, tasks, &mut world);
        assigned_total += summary.assigned.len();

        let mut keys = HashSet::new();
        for agent in &agents {
            if let Some(task) = agent.task() {
                if !keys.insert(task.key()) {
                    doubled += 1;
                }
            }
        }

        let lowest_assigned = summary
            .assigned
            .iter()
            .filter(|(_, t)| !t.override_)
            .map(|(_, t)| t.priority)
            .min();
        let highest_dropped = summary
            .unassigned
            .iter()
            .filter(|t| !t.override_)
            .map(|t| t.priority)
            .max();
        if let (Some(low), Some(high)) = (lowest_assigned, highest_dropped) {
            if low < high {
                order_breaks += 1;
            }
        }

        for bump in &summary.bumped {
            let by = summary.assigned_to(bump.agent).map(|t| t.priority).unwrap_or(i32::MIN);
            if bump.priority > by {
                bad_bumps += 1;
            }
        }
    }

    if verbose {
        println!("  {} assignments over 500 rounds", assigned_total);
    }
    results.push(TestResult {
        name: "dispatch_no_double_assignment".into(),
        passed: doubled == 0,
        detail: format!("{} tasks held twice", doubled),
    });
    results.push(TestResult {
        name: "dispatch_priority_order".into(),
        passed: order_breaks == 0,
        detail: format!("{} rounds dropped higher work than they assigned", order_breaks),
    });
    results.push(TestResult {
        name: "dispatch_bumps_only_lower".into(),
        passed: bad_bumps == 0,
        detail: format!("{} bumps displaced higher-priority work", bad_bumps),
    });

    results
}

// ── 5. Colony Run ───────────────────────────────────────────────────────

fn validate_colony_run(config: &ColonyConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Colony Run ---");
    let mut results = Vec::new();

    let mut engine = ColonyEngine::new(config.clone());
    let layout = engine.generate();

    let mut duplicate_cycles = 0;
    let mut completed = 0;
    let mut born = 0;
    let mut upgraded = 0;
    for _ in 0..RUN_CYCLES {
        let report = engine.run_cycle();
        completed += report.completed;
        born += report.born;
        upgraded += report.upgraded;

        for zone in &layout.zones {
            let mut keys = HashSet::new();
            let duplicated = engine
                .world
                .agents_in_zone(zone.zone)
                .iter()
                .filter_map(|a| a.task())
                .any(|t| !keys.insert(t.key()));
            if duplicated {
                duplicate_cycles += 1;
            }
        }

        if verbose && engine.tick() % 100 == 0 {
            println!(
                "  cycle {:>4}: {} agents, {} pending, {} tasks done",
                engine.tick(),
                engine.agent_count(),
                engine.pending(1),
                completed
            );
        }
    }

    results.push(TestResult {
        name: "colony_unique_assignments".into(),
        passed: duplicate_cycles == 0,
        detail: format!("{} zone-cycles with a task held twice", duplicate_cycles),
    });

    let missing: Vec<String> = config
        .roles
        .iter()
        .filter(|r| r.target > 0 && engine.role_count(&r.name) == 0)
        .map(|r| r.name.clone())
        .collect();
    results.push(TestResult {
        name: "colony_every_role_alive".into(),
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            format!("{} agents born, {} alive", born, engine.agent_count())
        } else {
            format!("no agents of: {}", missing.join(", "))
        },
    });

    results.push(TestResult {
        name: "colony_logistics_flow".into(),
        passed: completed > 0,
        detail: format!("{} deliveries completed", completed),
    });

    results.push(TestResult {
        name: "colony_upgraders_supplied".into(),
        passed: upgraded > 0,
        detail: format!("{} energy burned by upgraders", upgraded),
    });

    // Save, reload and check both copies continue identically
    let mut buffer = Vec::new();
    let resumed = match engine.save(&mut buffer) {
        Ok(()) => {
            let mut loaded = ColonyEngine::default();
            match loaded.load(&buffer[..]) {
                Ok(()) => {
                    let a = engine.run_cycle();
                    let b = loaded.run_cycle();
                    if a == b {
                        Ok(format!("{} byte save resumes identically", buffer.len()))
                    } else {
                        Err(format!("diverged: {:?} vs {:?}", a, b))
                    }
                }
                Err(e) => Err(e.to_string()),
            }
        }
        Err(e) => Err(e.to_string()),
    };
    results.push(TestResult {
        name: "colony_save_resume".into(),
        passed: resumed.is_ok(),
        detail: match resumed {
            Ok(detail) | Err(detail) => detail,
        },
    });

    results
}
