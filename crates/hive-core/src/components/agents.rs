//! Agent components.

use hive_logic::agent::AgentId;
use hive_logic::constants::BodyPart;
use serde::{Deserialize, Serialize};

/// Ordered body parts of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body(pub Vec<BodyPart>);

/// Remaining cycles before the agent dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifetime {
    pub ticks_left: u32,
}

/// Which agent, if any, is committed to supplying this one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyClaim(pub Option<AgentId>);
