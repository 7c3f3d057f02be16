//! Colony configuration: roles, population targets, task priorities, layout.
//!
//! Loadable from JSON; every field has a default so partial files work.

use hive_logic::body::BodyProfile;
use hive_logic::constants::{BodyPart, SPAWN_BASE_RESERVE};
use serde::{Deserialize, Serialize};

/// One kind of agent the population controller keeps alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
    pub name: String,
    pub profile: BodyProfile,
    /// Agents of this role wanted per zone.
    pub target: u32,
    pub priority: i32,
    /// Grow against full zone capacity instead of what is producible now.
    #[serde(default)]
    pub max: bool,
    #[serde(default)]
    pub sort: bool,
}

/// Priority of each task kind the logistics controller emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPriorities {
    pub supply_spawn: i32,
    pub supply_structure: i32,
    pub supply_creep: i32,
    pub haul: i32,
    pub unload: i32,
    pub cleanup: i32,
}

impl Default for TaskPriorities {
    fn default() -> Self {
        Self {
            supply_spawn: 50,
            supply_structure: 35,
            supply_creep: 30,
            haul: 20,
            unload: 15,
            cleanup: 10,
        }
    }
}

/// Shape of a generated colony.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub zones: u32,
    pub extensions: u32,
    pub sources: u32,
    pub towers: u32,
    /// Scattered wall tiles per zone.
    pub walls: u32,
    pub storage_energy: u32,
    pub source_energy: u32,
    pub source_regen_interval: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            zones: 1,
            extensions: 10,
            sources: 2,
            towers: 1,
            walls: 120,
            storage_energy: 5_000,
            source_energy: 3_000,
            source_regen_interval: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyConfig {
    pub roles: Vec<RoleConfig>,
    /// Roles whose agents take logistics tasks.
    pub logistics_roles: Vec<String>,
    /// Roles whose agents are supplied directly by other agents.
    pub supplied_roles: Vec<String>,
    pub priorities: TaskPriorities,
    /// Energy a single spawn holds on its own.
    pub spawn_base_reserve: u32,
    /// Container stock at which it is emptied into storage.
    pub unload_threshold: u32,
    /// Cycles the cached zone energy capacity stays valid.
    pub capacity_ttl: u64,
    /// Lifetime left at which a replacement is requested.
    pub replace_margin: u32,
    /// Energy per `Work` part an upgrader burns each cycle.
    pub upgrade_rate: u32,
    pub layout: LayoutConfig,
    /// Random seed for deterministic generation.
    pub seed: u64,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        use BodyPart::*;
        Self {
            roles: vec![
                RoleConfig {
                    name: "worker".into(),
                    profile: BodyProfile::new(vec![Work, Carry, Move]).with_max_parts(12),
                    target: 2,
                    priority: 90,
                    max: false,
                    sort: true,
                },
                RoleConfig {
                    name: "hauler".into(),
                    profile: BodyProfile::new(vec![Carry, Carry, Move]).with_max_parts(24),
                    target: 3,
                    priority: 80,
                    max: false,
                    sort: true,
                },
                RoleConfig {
                    name: "upgrader".into(),
                    profile: BodyProfile::new(vec![Work, Work, Move])
                        .with_seed(vec![Carry, Move])
                        .with_max_work(10),
                    target: 2,
                    priority: 40,
                    max: true,
                    sort: true,
                },
            ],
            logistics_roles: vec!["worker".into(), "hauler".into()],
            supplied_roles: vec!["upgrader".into()],
            priorities: TaskPriorities::default(),
            spawn_base_reserve: SPAWN_BASE_RESERVE,
            unload_threshold: 500,
            capacity_ttl: 100,
            replace_margin: 100,
            upgrade_rate: 1,
            layout: LayoutConfig::default(),
            seed: 42,
        }
    }
}

impl ColonyConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn role(&self, name: &str) -> Option<&RoleConfig> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn is_logistics_role(&self, role: &str) -> bool {
        self.logistics_roles.iter().any(|r| r == role)
    }

    pub fn is_supplied_role(&self, role: &str) -> bool {
        self.supplied_roles.iter().any(|r| r == role)
    }
}
