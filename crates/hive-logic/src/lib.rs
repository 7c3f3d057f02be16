//! Pure colony decision logic for Hive.
//!
//! This crate decides *who does what* and *what gets built next* for a colony
//! of worker agents. It owns no world state: the host hands in agent snapshots
//! and implements the collaborator traits in [`world`] and [`body`], and every
//! decision runs synchronously within one zone's slice of a cycle.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`agent`] | Agents, carried cargo, persisted agent memory |
//! | [`body`] | Body growth under a budget or a live feasibility probe |
//! | [`catalog`] | Per-kind task validation and two-phase work steps |
//! | [`constants`] | Body parts, resource kinds, platform limits |
//! | [`dispatch`] | Priority dispatch of tasks to agents, with preemption |
//! | [`geometry`] | Zone positions and range |
//! | [`sandbox`] | In-memory world for tests, benches and the harness |
//! | [`spawn_queue`] | Per-zone priority queue of production requests |
//! | [`task`] | Task kinds, identity and eligibility requirements |
//! | [`world`] | Collaborator traits and object snapshots |

pub mod agent;
pub mod body;
pub mod catalog;
pub mod constants;
pub mod dispatch;
pub mod geometry;
pub mod sandbox;
pub mod spawn_queue;
pub mod task;
pub mod world;
