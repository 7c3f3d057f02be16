//! Task catalog - validity checks and per-cycle work steps for every task kind.
//!
//! Each kind reduces to a route: where resources are loaded from, where they
//! are delivered to, and which resource moves. The work step is then a small
//! two-phase state machine stored in the agent's memory:
//!
//! - **Loading**: acquire the resource. Kinds with an explicit origin load
//!   only from it; the rest pick the best source in fixed order (adjacent
//!   tombstone > adjacent ruin > adjacent drop > nearest reachable store or
//!   drop point > nearest energy source).
//! - **Delivering**: walk to the destination and transfer. A successful
//!   transfer completes the task and clears the assignment.
//!
//! `route()` is the single exhaustive dispatch point over `TaskKind`; a new
//! kind does not compile until it is routed here.

use crate::agent::{Agent, AgentId, WorkPhase};
use crate::constants::{BodyPart, ResourceKind};
use crate::geometry::ZonePos;
use crate::task::{TargetId, Task, TaskKind};
use crate::world::{ActionResult, TargetKind, TargetView, TaskWorld};

/// Result of one work step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// Progress made; keep the assignment.
    InProgress,
    /// Work finished; assignment cleared.
    Complete,
    /// Could not act this cycle (no path, nothing to load); retry next cycle.
    Blocked,
    /// The task's target vanished or its demand is met.
    Invalid,
}

/// Where a task loads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Target(TargetId),
    Best,
}

/// Where a task delivers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Target(TargetId),
    Agent(AgentId),
    NearestStorage,
}

#[derive(Debug, Clone, Copy)]
struct Route {
    origin: Origin,
    destination: Destination,
    resource: ResourceKind,
}

impl Task {
    fn route(&self) -> Route {
        let (origin, destination) = match self.kind {
            TaskKind::Haul { from, to, .. } => (Origin::Target(from), Destination::Target(to)),
            TaskKind::SupplyStructure { target, .. } => (Origin::Best, Destination::Target(target)),
            TaskKind::SupplySpawn { target } => (Origin::Best, Destination::Target(target)),
            TaskKind::Unload { source, .. } => (Origin::Target(source), Destination::NearestStorage),
            TaskKind::SupplyCreep { target, .. } => (Origin::Best, Destination::Agent(target)),
            TaskKind::Cleanup { target, .. } => (Origin::Target(target), Destination::NearestStorage),
        };
        Route {
            origin,
            destination,
            resource: self.kind.resource(),
        }
    }

    /// True while the target exists and still has unmet demand or stock.
    pub fn validate(&self, world: &impl TaskWorld) -> bool {
        let route = self.route();
        let origin_ok = match route.origin {
            Origin::Target(id) => has_stock(world, id, route.resource),
            Origin::Best => true,
        };
        let destination_ok = match route.destination {
            Destination::Target(id) => has_room(world, id),
            Destination::Agent(id) => world
                .agent_view(id)
                .map(|a| a.cargo.accepts(route.resource) && a.cargo.free() > 0)
                .unwrap_or(false),
            Destination::NearestStorage => true,
        };
        origin_ok && destination_ok
    }

    /// Release anything this task holds on other objects.
    pub fn cancel(&self, agent: AgentId, world: &mut impl TaskWorld) {
        if let Destination::Agent(target) = self.route().destination {
            world.release_claim(target, agent);
        }
    }

    /// Execute one unit of progress for `agent`.
    pub fn work(&self, agent: &mut Agent, world: &mut impl TaskWorld) -> WorkStatus {
        let route = self.route();
        if !agent.cargo.accepts(route.resource) {
            log::debug!("agent {} carries the wrong resource for {}", agent.id, self);
            return WorkStatus::Blocked;
        }
        if let Destination::Agent(target) = route.destination {
            if !world.claim_agent(target, agent.id) {
                return WorkStatus::Invalid;
            }
        }

        if agent.memory.phase == WorkPhase::Loading {
            if agent.cargo.is_full() {
                agent.memory.phase = WorkPhase::Delivering;
            } else {
                match self.load_step(&route, agent, world) {
                    LoadOutcome::Working(status) => return status,
                    LoadOutcome::Ready => agent.memory.phase = WorkPhase::Delivering,
                }
            }
        }

        self.deliver_step(&route, agent, world)
    }

    fn load_step(&self, route: &Route, agent: &mut Agent, world: &mut impl TaskWorld) -> LoadOutcome {
        let exclude = match route.destination {
            Destination::Target(id) => Some(id),
            _ => None,
        };
        let source = match route.origin {
            Origin::Target(id) => world.target(id).filter(|t| t.stock(route.resource) > 0),
            Origin::Best => select_source(world, agent, route.resource, exclude),
        };
        let Some(source) = source else {
            if !agent.cargo.is_empty() {
                return LoadOutcome::Ready;
            }
            return match route.origin {
                Origin::Target(_) => LoadOutcome::Working(WorkStatus::Invalid),
                Origin::Best => LoadOutcome::Working(WorkStatus::Blocked),
            };
        };

        if !agent.pos.is_adjacent(&source.pos) {
            return LoadOutcome::Working(match world.move_toward(agent, source.pos) {
                ActionResult::Ok => WorkStatus::InProgress,
                _ => WorkStatus::Blocked,
            });
        }

        let result = match source.kind {
            TargetKind::Drop => world.pickup(agent, source.id),
            TargetKind::Source => world.harvest(agent, source.id),
            _ => world.withdraw(agent, source.id, route.resource),
        };
        if !result.is_ok() {
            log::debug!("agent {} failed to load from {}: {:?}", agent.id, source.id, result);
            return LoadOutcome::Working(WorkStatus::Blocked);
        }

        let exhausted = world
            .target(source.id)
            .map(|t| t.stock(route.resource) == 0)
            .unwrap_or(true);
        if agent.cargo.is_full() || (exhausted && source.kind != TargetKind::Source) {
            agent.memory.phase = WorkPhase::Delivering;
        }
        LoadOutcome::Working(WorkStatus::InProgress)
    }

    fn deliver_step(&self, route: &Route, agent: &mut Agent, world: &mut impl TaskWorld) -> WorkStatus {
        if agent.cargo.is_empty() {
            agent.memory.phase = WorkPhase::Loading;
            return WorkStatus::InProgress;
        }

        let (pos, receiver) = match route.destination {
            Destination::Target(id) => match world.target(id) {
                Some(target) => (target.pos, Receiver::Target(id)),
                None => return WorkStatus::Invalid,
            },
            Destination::Agent(id) => match world.agent_view(id) {
                Some(view) => (view.pos, Receiver::Agent(id)),
                None => return WorkStatus::Invalid,
            },
            Destination::NearestStorage => {
                let origin = match route.origin {
                    Origin::Target(id) => Some(id),
                    Origin::Best => None,
                };
                match nearest_storage(world, agent, origin) {
                    Some(store) => (store.pos, Receiver::Target(store.id)),
                    None => return WorkStatus::Blocked,
                }
            }
        };

        if !agent.pos.is_adjacent(&pos) {
            return match world.move_toward(agent, pos) {
                ActionResult::Ok => WorkStatus::InProgress,
                _ => WorkStatus::Blocked,
            };
        }

        let result = match receiver {
            Receiver::Target(id) => world.transfer(agent, id, route.resource),
            Receiver::Agent(id) => world.transfer_to_agent(agent, id, route.resource),
        };
        match result {
            ActionResult::Ok => {
                if agent.cargo.is_empty() {
                    agent.memory.phase = WorkPhase::Loading;
                }
                self.cancel(agent.id, world);
                agent.clear_task();
                WorkStatus::Complete
            }
            ActionResult::Full | ActionResult::InvalidTarget => WorkStatus::Invalid,
            ActionResult::NotEnoughResources => {
                agent.memory.phase = WorkPhase::Loading;
                WorkStatus::InProgress
            }
            ActionResult::NotInRange | ActionResult::NoPath => WorkStatus::Blocked,
        }
    }
}

enum LoadOutcome {
    Working(WorkStatus),
    Ready,
}

/// Resolved delivery receiver for this cycle.
enum Receiver {
    Target(TargetId),
    Agent(AgentId),
}

fn has_stock(world: &impl TaskWorld, id: TargetId, resource: ResourceKind) -> bool {
    world
        .target(id)
        .map(|t| t.stock(resource) > 0)
        .unwrap_or(false)
}

fn has_room(world: &impl TaskWorld, id: TargetId) -> bool {
    world
        .target(id)
        .map(|t| t.free_capacity() > 0)
        .unwrap_or(false)
}

/// Pick where to load `resource` from, in fixed preference order.
pub fn select_source(
    world: &mut impl TaskWorld,
    agent: &Agent,
    resource: ResourceKind,
    exclude: Option<TargetId>,
) -> Option<TargetView> {
    let candidates: Vec<TargetView> = world
        .targets_in_zone(agent.pos.zone)
        .into_iter()
        .filter(|t| Some(t.id) != exclude && t.stock(resource) > 0)
        .collect();

    for kind in [TargetKind::Tombstone, TargetKind::Ruin, TargetKind::Drop] {
        if let Some(adjacent) = candidates
            .iter()
            .find(|t| t.kind == kind && agent.pos.is_adjacent(&t.pos))
        {
            return Some(*adjacent);
        }
    }

    let points = candidates.iter().filter(|t| is_load_point(t.kind));
    if let Some(nearest) = nearest_reachable(world, &agent.pos, points) {
        return Some(nearest);
    }

    if resource == ResourceKind::Energy && agent.has_part(BodyPart::Work) {
        let sources = candidates.iter().filter(|t| t.kind == TargetKind::Source);
        return nearest_reachable(world, &agent.pos, sources);
    }
    None
}

/// Objects that can be withdrawn from or picked up, other than sources.
fn is_load_point(kind: TargetKind) -> bool {
    match kind {
        TargetKind::Container
        | TargetKind::Storage
        | TargetKind::Link
        | TargetKind::Tombstone
        | TargetKind::Ruin
        | TargetKind::Drop => true,
        TargetKind::Spawn | TargetKind::Extension | TargetKind::Tower | TargetKind::Source => false,
    }
}

fn nearest_storage(world: &mut impl TaskWorld, agent: &Agent, exclude: Option<TargetId>) -> Option<TargetView> {
    let stores: Vec<TargetView> = world
        .targets_in_zone(agent.pos.zone)
        .into_iter()
        .filter(|t| t.kind.is_storage() && Some(t.id) != exclude && t.free_capacity() > 0)
        .collect();
    nearest_reachable(world, &agent.pos, stores.iter())
}

/// Closest candidate by walking distance; unreachable candidates are skipped.
fn nearest_reachable<'a>(
    world: &mut impl TaskWorld,
    from: &ZonePos,
    candidates: impl Iterator<Item = &'a TargetView>,
) -> Option<TargetView> {
    let mut best: Option<(u32, TargetView)> = None;
    for candidate in candidates {
        let Some(distance) = world.path_distance(from, &candidate.pos) else {
            continue;
        };
        if best.map(|(d, _)| distance < d).unwrap_or(true) {
            best = Some((distance, *candidate));
        }
    }
    best.map(|(_, t)| t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentMemory, Cargo};
    use crate::sandbox::Sandbox;
    use crate::world::{AgentView, Store};

    fn at(x: i32, y: i32) -> ZonePos {
        ZonePos::new(x, y, 1)
    }

    fn hauler(id: AgentId, pos: ZonePos) -> Agent {
        Agent::new(id, pos, vec![BodyPart::Carry, BodyPart::Move], AgentMemory::for_role("hauler"))
    }

    fn stocked(resource: ResourceKind, amount: u32, capacity: u32) -> Store {
        let mut store = Store::with_capacity(capacity);
        *store.get_mut(resource) = amount;
        store
    }

    /// Run work steps until the task stops being in progress.
    fn run(task: &Task, agent: &mut Agent, world: &mut Sandbox, limit: usize) -> WorkStatus {
        agent.assign(task.clone());
        for _ in 0..limit {
            let status = task.work(agent, world);
            if status != WorkStatus::InProgress {
                return status;
            }
        }
        WorkStatus::InProgress
    }

    #[test]
    fn test_supply_spawn_loads_then_delivers() {
        let mut world = Sandbox::new();
        let container = world.add_target(TargetKind::Container, at(11, 10), stocked(ResourceKind::Energy, 100, 2000));
        let spawn = world.add_target(TargetKind::Spawn, at(14, 10), Store::with_capacity(300));
        let task = Task::new(TaskKind::SupplySpawn { target: spawn }, 10, at(14, 10));
        let mut agent = hauler(1, at(10, 10));

        assert_eq!(run(&task, &mut agent, &mut world, 10), WorkStatus::Complete);
        assert!(!agent.is_busy());
        assert_eq!(world.store_of(spawn).map(|s| s.energy), Some(50));
        assert_eq!(world.store_of(container).map(|s| s.energy), Some(50));
    }

    #[test]
    fn test_adjacent_tombstone_beats_nearer_store() {
        let mut world = Sandbox::new();
        world.add_target(TargetKind::Container, at(11, 10), stocked(ResourceKind::Energy, 500, 2000));
        let tomb = world.add_target(TargetKind::Tombstone, at(9, 10), stocked(ResourceKind::Energy, 20, 0));
        let agent = hauler(1, at(10, 10));
        let picked = select_source(&mut world, &agent, ResourceKind::Energy, None);
        assert_eq!(picked.map(|t| t.id), Some(tomb));
    }

    #[test]
    fn test_adjacent_ruin_beats_adjacent_drop() {
        let mut world = Sandbox::new();
        world.add_target(TargetKind::Drop, at(11, 11), stocked(ResourceKind::Energy, 90, 0));
        let ruin = world.add_target(TargetKind::Ruin, at(9, 9), stocked(ResourceKind::Energy, 10, 0));
        let agent = hauler(1, at(10, 10));
        let picked = select_source(&mut world, &agent, ResourceKind::Energy, None);
        assert_eq!(picked.map(|t| t.id), Some(ruin));
    }

    #[test]
    fn test_distant_corpse_ranks_by_distance() {
        let mut world = Sandbox::new();
        let container = world.add_target(TargetKind::Container, at(13, 10), stocked(ResourceKind::Energy, 500, 2000));
        world.add_target(TargetKind::Tombstone, at(30, 30), stocked(ResourceKind::Energy, 20, 0));
        let agent = hauler(1, at(10, 10));
        let picked = select_source(&mut world, &agent, ResourceKind::Energy, None);
        assert_eq!(picked.map(|t| t.id), Some(container));
    }

    #[test]
    fn test_unreachable_store_is_skipped() {
        let mut world = Sandbox::new();
        world.add_target(TargetKind::Container, at(12, 10), stocked(ResourceKind::Energy, 500, 2000));
        let far = world.add_target(TargetKind::Storage, at(30, 10), stocked(ResourceKind::Energy, 500, 10_000));
        world.mark_unreachable(at(12, 10));
        let agent = hauler(1, at(10, 10));
        let picked = select_source(&mut world, &agent, ResourceKind::Energy, None);
        assert_eq!(picked.map(|t| t.id), Some(far));
    }

    #[test]
    fn test_harvest_only_with_work_parts() {
        let mut world = Sandbox::new();
        let source = world.add_target(TargetKind::Source, at(11, 10), Store::holding(ResourceKind::Energy, 3000));
        let carrier = hauler(1, at(10, 10));
        assert!(select_source(&mut world, &carrier, ResourceKind::Energy, None).is_none());

        let mut worker = hauler(2, at(10, 10));
        worker.body.push(BodyPart::Work);
        let picked = select_source(&mut world, &worker, ResourceKind::Energy, None);
        assert_eq!(picked.map(|t| t.id), Some(source));
        assert!(select_source(&mut world, &worker, ResourceKind::Mineral, None).is_none());
    }

    #[test]
    fn test_nothing_to_load_blocks() {
        let mut world = Sandbox::new();
        let spawn = world.add_target(TargetKind::Spawn, at(14, 10), Store::with_capacity(300));
        let task = Task::new(TaskKind::SupplySpawn { target: spawn }, 10, at(14, 10));
        let mut agent = hauler(1, at(10, 10));
        assert_eq!(run(&task, &mut agent, &mut world, 3), WorkStatus::Blocked);
        assert!(agent.is_busy());
    }

    #[test]
    fn test_delivery_does_not_load_from_its_own_target() {
        let mut world = Sandbox::new();
        let target = world.add_target(TargetKind::Container, at(11, 10), stocked(ResourceKind::Energy, 100, 2000));
        let task = Task::new(
            TaskKind::SupplyStructure {
                target,
                resource: ResourceKind::Energy,
            },
            10,
            at(11, 10),
        );
        let mut agent = hauler(1, at(10, 10));
        assert_eq!(run(&task, &mut agent, &mut world, 3), WorkStatus::Blocked);
    }

    #[test]
    fn test_unreachable_destination_keeps_task() {
        let mut world = Sandbox::new();
        let spawn = world.add_target(TargetKind::Spawn, at(14, 10), Store::with_capacity(300));
        world.mark_unreachable(at(14, 10));
        let task = Task::new(TaskKind::SupplySpawn { target: spawn }, 10, at(14, 10));
        let mut agent = hauler(1, at(10, 10));
        agent.cargo.add(ResourceKind::Energy, 50);
        assert_eq!(run(&task, &mut agent, &mut world, 3), WorkStatus::Blocked);
        assert_eq!(agent.task(), Some(&task));
    }

    #[test]
    fn test_wrong_cargo_blocks() {
        let mut world = Sandbox::new();
        let spawn = world.add_target(TargetKind::Spawn, at(11, 10), Store::with_capacity(300));
        let task = Task::new(TaskKind::SupplySpawn { target: spawn }, 10, at(11, 10));
        let mut agent = hauler(1, at(10, 10));
        agent.cargo.add(ResourceKind::Mineral, 10);
        assert_eq!(run(&task, &mut agent, &mut world, 1), WorkStatus::Blocked);
    }

    #[test]
    fn test_full_target_invalidates() {
        let mut world = Sandbox::new();
        let spawn = world.add_target(TargetKind::Spawn, at(11, 10), stocked(ResourceKind::Energy, 300, 300));
        let task = Task::new(TaskKind::SupplySpawn { target: spawn }, 10, at(11, 10));
        assert!(!task.validate(&world));
        let mut agent = hauler(1, at(10, 10));
        agent.cargo.add(ResourceKind::Energy, 50);
        assert_eq!(run(&task, &mut agent, &mut world, 1), WorkStatus::Invalid);
    }

    #[test]
    fn test_unload_goes_to_nearest_other_storage() {
        let mut world = Sandbox::new();
        let source = world.add_target(TargetKind::Container, at(11, 10), stocked(ResourceKind::Mineral, 30, 2000));
        let storage = world.add_target(TargetKind::Storage, at(15, 10), Store::with_capacity(10_000));
        let far = world.add_target(TargetKind::Container, at(40, 40), Store::with_capacity(2000));
        let task = Task::new(
            TaskKind::Unload {
                source,
                resource: ResourceKind::Mineral,
            },
            5,
            at(11, 10),
        );
        let mut agent = hauler(1, at(10, 10));
        assert_eq!(run(&task, &mut agent, &mut world, 10), WorkStatus::Complete);
        assert_eq!(world.store_of(storage).map(|s| s.mineral), Some(30));
        assert_eq!(world.store_of(far).map(|s| s.mineral), Some(0));
        assert_eq!(world.store_of(source).map(|s| s.mineral), Some(0));
    }

    #[test]
    fn test_haul_and_cleanup_validation() {
        let mut world = Sandbox::new();
        let from = world.add_target(TargetKind::Container, at(11, 10), Store::with_capacity(2000));
        let to = world.add_target(TargetKind::Storage, at(15, 10), Store::with_capacity(10_000));
        let haul = Task::new(
            TaskKind::Haul {
                from,
                to,
                resource: ResourceKind::Energy,
            },
            5,
            at(11, 10),
        );
        assert!(!haul.validate(&world));
        if let Some(store) = world.store_mut(from) {
            store.energy = 10;
        }
        assert!(haul.validate(&world));

        let drop = world.add_target(TargetKind::Drop, at(20, 20), stocked(ResourceKind::Energy, 5, 0));
        let cleanup = Task::new(
            TaskKind::Cleanup {
                target: drop,
                resource: ResourceKind::Energy,
            },
            1,
            at(20, 20),
        );
        assert!(cleanup.validate(&world));
        if let Some(store) = world.store_mut(drop) {
            store.energy = 0;
        }
        assert!(!cleanup.validate(&world));
        world.remove_target(drop);
        assert!(!cleanup.validate(&world));
    }

    #[test]
    fn test_supply_creep_claims_target() {
        let mut world = Sandbox::new();
        world.add_target(TargetKind::Container, at(11, 10), stocked(ResourceKind::Energy, 500, 2000));
        world.add_agent_view(AgentView {
            id: 50,
            pos: at(13, 10),
            cargo: Cargo::empty(100),
            role: "upgrader".into(),
            claimed_by: None,
        });
        let task = Task::new(
            TaskKind::SupplyCreep {
                target: 50,
                resource: ResourceKind::Energy,
            },
            10,
            at(13, 10),
        );
        assert!(task.validate(&world));

        let mut first = hauler(1, at(10, 10));
        first.assign(task.clone());
        assert_eq!(task.work(&mut first, &mut world), WorkStatus::InProgress);
        assert_eq!(world.agent(50).and_then(|a| a.claimed_by), Some(1));

        let mut second = hauler(2, at(10, 11));
        second.assign(task.clone());
        assert_eq!(task.work(&mut second, &mut world), WorkStatus::Invalid);

        assert_eq!(run(&task, &mut first, &mut world, 10), WorkStatus::Complete);
        assert_eq!(world.agent(50).map(|a| a.cargo.amount), Some(50));
        assert_eq!(world.agent(50).and_then(|a| a.claimed_by), None);
    }

    #[test]
    fn test_harvest_fills_worker() {
        let mut world = Sandbox::new();
        world.add_target(TargetKind::Source, at(11, 10), Store::holding(ResourceKind::Energy, 3000));
        let spawn = world.add_target(TargetKind::Spawn, at(9, 10), Store::with_capacity(300));
        let task = Task::new(TaskKind::SupplySpawn { target: spawn }, 10, at(9, 10));
        let mut worker = Agent::new(
            1,
            at(10, 10),
            vec![BodyPart::Work, BodyPart::Work, BodyPart::Carry, BodyPart::Move],
            AgentMemory::for_role("worker"),
        );
        // 4 energy per cycle into a 50 capacity: 13 harvests, then one transfer.
        assert_eq!(run(&task, &mut worker, &mut world, 20), WorkStatus::Complete);
        assert_eq!(world.store_of(spawn).map(|s| s.energy), Some(50));
    }
}
