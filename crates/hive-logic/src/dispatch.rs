//! Task dispatcher - matches free agents to the cycle's offered tasks.
//!
//! One call per zone per cycle:
//!
//! 1. Agents split into busy (holding a task) and free.
//! 2. Offered tasks that duplicate a busy agent's task are dropped.
//! 3. Remaining tasks are stably sorted by descending priority.
//! 4. Each task goes to the nearest eligible free agent: walking distance
//!    first, straight-line range if nobody has a path, first eligible agent if
//!    range cannot be measured either.
//! 5. Unassigned `override` tasks may bump a busy agent whose current task
//!    priority is at or below theirs, lowest priority first. The bumped task
//!    is cancelled and dropped.
//!
//! Unassigned ordinary tasks are dropped; producers re-offer them next cycle.
//! The dispatcher never validates tasks.

use std::collections::HashSet;

use crate::agent::{Agent, AgentId};
use crate::task::{Task, TaskKey};
use crate::world::TaskWorld;

/// A busy agent displaced by an override task.
#[derive(Debug, Clone, PartialEq)]
pub struct Bump {
    pub agent: AgentId,
    /// Task the agent was holding; abandoned.
    pub previous: Task,
    pub priority: i32,
}

/// What happened during one dispatch. Diagnostic only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchSummary {
    pub assigned: Vec<(AgentId, Task)>,
    pub bumped: Vec<Bump>,
    /// Tasks nobody took this cycle, overrides that found no victim included.
    pub unassigned: Vec<Task>,
    /// Offered tasks already held by a busy agent.
    pub duplicates: usize,
}

impl DispatchSummary {
    pub fn assigned_to(&self, agent: AgentId) -> Option<&Task> {
        self.assigned
            .iter()
            .rev()
            .find(|(id, _)| *id == agent)
            .map(|(_, task)| task)
    }
}

/// Assign `tasks` to `agents`, mutating their stored assignments.
pub fn assign(agents: &mut [Agent], tasks: Vec<Task>, world: &mut impl TaskWorld) -> DispatchSummary {
    let mut summary = DispatchSummary::default();

    let (mut busy, mut free): (Vec<usize>, Vec<usize>) = (0..agents.len()).partition(|&i| agents[i].is_busy());

    let held: HashSet<TaskKey> = busy.iter().filter_map(|&i| agents[i].task()).map(Task::key).collect();
    let offered = tasks.len();
    let mut pending: Vec<Task> = tasks.into_iter().filter(|task| !held.contains(&task.key())).collect();
    summary.duplicates = offered - pending.len();

    // Vec::sort_by is stable; equal priorities keep producer order.
    pending.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut unassigned = Vec::new();
    let mut remaining = pending.into_iter();
    for task in remaining.by_ref() {
        if free.is_empty() {
            unassigned.push(task);
            break;
        }
        let eligible: Vec<usize> = free.iter().copied().filter(|&i| task.accepts(&agents[i])).collect();
        let Some(chosen) = closest_agent(agents, &eligible, &task, world) else {
            unassigned.push(task);
            continue;
        };
        log::debug!("dispatch {} -> agent {}", task, agents[chosen].id);
        agents[chosen].assign(task.clone());
        summary.assigned.push((agents[chosen].id, task));
        free.retain(|&i| i != chosen);
        busy.push(chosen);
    }
    unassigned.extend(remaining);

    // Preemption: lowest current priority first. The order is fixed here; a
    // bumped agent stays in the pool with its new priority.
    busy.sort_by_key(|&i| agents[i].current_priority());
    for task in unassigned {
        if !task.override_ {
            summary.unassigned.push(task);
            continue;
        }
        let victim = busy
            .iter()
            .copied()
            .find(|&i| agents[i].current_priority() <= task.priority && task.accepts(&agents[i]));
        let Some(victim) = victim else {
            summary.unassigned.push(task);
            continue;
        };
        let agent = &mut agents[victim];
        if let Some(previous) = agent.clear_task() {
            log::debug!("override {} bumps agent {} off {}", task, agent.id, previous);
            previous.cancel(agent.id, world);
            summary.bumped.push(Bump {
                agent: agent.id,
                priority: previous.priority,
                previous,
            });
        }
        agent.assign(task.clone());
        summary.assigned.push((agent.id, task));
    }

    summary
}

/// Nearest of `eligible` to the task, or `None` if nobody is eligible.
fn closest_agent(agents: &[Agent], eligible: &[usize], task: &Task, world: &mut impl TaskWorld) -> Option<usize> {
    let first = *eligible.first()?;

    let by_path = eligible
        .iter()
        .filter_map(|&i| world.path_distance(&agents[i].pos, &task.pos).map(|d| (d, i)))
        .min_by_key(|&(d, _)| d);
    if let Some((_, i)) = by_path {
        return Some(i);
    }

    let by_range = eligible
        .iter()
        .filter_map(|&i| world.range(&agents[i].pos, &task.pos).map(|d| (d, i)))
        .min_by_key(|&(d, _)| d);
    if let Some((_, i)) = by_range {
        return Some(i);
    }

    Some(first)
}

/// Re-validate persisted assignments; cancel and clear the ones that no
/// longer hold. Returns how many were released.
pub fn release_stale(agents: &mut [Agent], world: &mut impl TaskWorld) -> usize {
    let mut released = 0;
    for agent in agents.iter_mut() {
        let stale = match agent.task() {
            Some(task) => !task.validate(world),
            None => false,
        };
        if !stale {
            continue;
        }
        if let Some(task) = agent.clear_task() {
            log::debug!("agent {} drops stale {}", agent.id, task);
            task.cancel(agent.id, world);
            released += 1;
        }
    }
    released
}
