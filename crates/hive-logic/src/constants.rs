//! Platform constants - body parts, resource kinds, production limits.
//!
//! These mirror the host platform's fixed rules. Both the ECS engine and the
//! headless harness use them.

use serde::{Deserialize, Serialize};

/// Hard platform ceiling on the number of parts in one body.
pub const MAX_BODY_PARTS: u32 = 50;

/// Resource units one `Carry` part can hold.
pub const CARRY_CAPACITY: u32 = 50;

/// Energy a single production facility holds on its own, before any
/// supporting infrastructure is filled.
pub const SPAWN_BASE_RESERVE: u32 = 300;

/// Energy harvested per `Work` part per cycle.
pub const HARVEST_PER_WORK: u32 = 2;

/// Cycles each body part adds to production time.
pub const SPAWN_TICKS_PER_PART: u32 = 3;

/// Lifetime of a produced agent, in cycles.
pub const AGENT_LIFETIME: u32 = 1500;

/// Cycles a ground drop survives before decaying completely.
pub const DROP_DECAY_TICKS: u32 = 1000;

/// One physical part of an agent body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    Move,
    Work,
    Carry,
    Attack,
    RangedAttack,
    Heal,
    Claim,
    Tough,
}

impl BodyPart {
    /// Energy cost of producing this part.
    pub fn cost(self) -> u32 {
        match self {
            BodyPart::Move => 50,
            BodyPart::Work => 100,
            BodyPart::Carry => 50,
            BodyPart::Attack => 80,
            BodyPart::RangedAttack => 150,
            BodyPart::Heal => 250,
            BodyPart::Claim => 600,
            BodyPart::Tough => 10,
        }
    }

    /// Position in the canonical production ordering. Damage is absorbed
    /// front to back, so armour leads and movement/healing trail.
    pub fn sort_rank(self) -> u8 {
        match self {
            BodyPart::Tough => 0,
            BodyPart::Claim => 1,
            BodyPart::Work => 2,
            BodyPart::Carry => 3,
            BodyPart::Attack => 4,
            BodyPart::RangedAttack => 5,
            BodyPart::Move => 6,
            BodyPart::Heal => 7,
        }
    }

    pub fn all() -> &'static [BodyPart] {
        &[
            BodyPart::Move,
            BodyPart::Work,
            BodyPart::Carry,
            BodyPart::Attack,
            BodyPart::RangedAttack,
            BodyPart::Heal,
            BodyPart::Claim,
            BodyPart::Tough,
        ]
    }

    pub fn short_name(self) -> &'static str {
        match self {
            BodyPart::Move => "move",
            BodyPart::Work => "work",
            BodyPart::Carry => "carry",
            BodyPart::Attack => "attack",
            BodyPart::RangedAttack => "ranged",
            BodyPart::Heal => "heal",
            BodyPart::Claim => "claim",
            BodyPart::Tough => "tough",
        }
    }
}

/// Kinds of resource that can be stored, carried and transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Energy,
    Mineral,
    Power,
}

impl ResourceKind {
    pub fn all() -> [ResourceKind; 3] {
        [ResourceKind::Energy, ResourceKind::Mineral, ResourceKind::Power]
    }

    pub fn short_name(self) -> &'static str {
        match self {
            ResourceKind::Energy => "energy",
            ResourceKind::Mineral => "mineral",
            ResourceKind::Power => "power",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_costs() {
        assert_eq!(BodyPart::Work.cost(), 100);
        assert_eq!(BodyPart::Carry.cost(), 50);
        assert_eq!(BodyPart::Move.cost(), 50);
        assert_eq!(BodyPart::Claim.cost(), 600);
    }

    #[test]
    fn test_sort_ranks_are_unique() {
        let mut ranks: Vec<u8> = BodyPart::all().iter().map(|p| p.sort_rank()).collect();
        ranks.sort_unstable();
        ranks.dedup();
        assert_eq!(ranks.len(), BodyPart::all().len());
    }
}
