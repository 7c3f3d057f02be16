//! Colony generation - lays out a working base in every configured zone

use std::collections::HashSet;

use hive_logic::agent::AgentMemory;
use hive_logic::constants::{ResourceKind, AGENT_LIFETIME, DROP_DECAY_TICKS};
use hive_logic::geometry::{ZoneId, ZonePos, ZONE_SIZE};
use hive_logic::task::TargetId;
use hive_logic::world::{Store, TargetKind};
use rand::Rng;

use crate::components::Structure;
use crate::config::ColonyConfig;
use crate::world::ColonyWorld;

/// Tiles around the base centre kept free of walls.
const CLEAR_RADIUS: u32 = 7;
/// Energy already sitting in each source's container.
const SOURCE_CONTAINER_STOCK: u32 = 600;

const SPAWN_CAPACITY: u32 = 300;
const EXTENSION_CAPACITY: u32 = 50;
const TOWER_CAPACITY: u32 = 1_000;
const CONTAINER_CAPACITY: u32 = 2_000;
const STORAGE_CAPACITY: u32 = 1_000_000;

/// Ids of what was built in one zone.
#[derive(Debug, Clone, Default)]
pub struct ZoneLayout {
    pub zone: ZoneId,
    pub spawn: TargetId,
    pub storage: TargetId,
    /// Container kept stocked for upgraders.
    pub sink: TargetId,
    pub extensions: Vec<TargetId>,
    pub towers: Vec<TargetId>,
    pub sources: Vec<TargetId>,
    pub containers: Vec<TargetId>,
    pub ruin: Option<TargetId>,
}

#[derive(Debug, Clone, Default)]
pub struct ColonyLayout {
    pub zones: Vec<ZoneLayout>,
}

impl ColonyLayout {
    pub fn zone(&self, zone: ZoneId) -> Option<&ZoneLayout> {
        self.zones.iter().find(|z| z.zone == zone)
    }
}

/// Chebyshev ring of tiles at `radius` around `center`, row-major.
fn ring(center: ZonePos, radius: i32) -> Vec<ZonePos> {
    let mut tiles = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx.abs().max(dy.abs()) == radius {
                tiles.push(ZonePos::new(center.x + dx, center.y + dy, center.zone));
            }
        }
    }
    tiles
}

fn filled(capacity: u32, energy: u32) -> Store {
    let mut store = Store::with_capacity(capacity);
    store.energy = energy;
    store
}

/// Random in-bounds tile at least `min_range` from `center` and not taken.
fn random_tile(rng: &mut impl Rng, center: ZonePos, min_range: u32, taken: &HashSet<ZonePos>) -> ZonePos {
    loop {
        let pos = ZonePos::new(rng.gen_range(2..ZONE_SIZE - 2), rng.gen_range(2..ZONE_SIZE - 2), center.zone);
        let far = pos.range_to(&center).map(|r| r >= min_range).unwrap_or(false);
        if far && !taken.contains(&pos) {
            return pos;
        }
    }
}

fn generate_zone(world: &mut ColonyWorld, zone: ZoneId, config: &ColonyConfig, rng: &mut impl Rng) -> ZoneLayout {
    let layout_config = &config.layout;
    let center = ZonePos::new(ZONE_SIZE / 2, ZONE_SIZE / 2, zone);
    let mut taken: HashSet<ZonePos> = HashSet::new();
    let mut layout = ZoneLayout {
        zone,
        ..Default::default()
    };

    layout.spawn = world.add_structure(
        center,
        Structure::new(TargetKind::Spawn, filled(SPAWN_CAPACITY, SPAWN_CAPACITY)),
    );
    taken.insert(center);

    // Ring 1 stays open for agents leaving the spawn.
    let slots: Vec<ZonePos> = ring(center, 2).into_iter().chain(ring(center, 3)).collect();
    for pos in slots.into_iter().take(layout_config.extensions as usize) {
        layout.extensions.push(world.add_structure(
            pos,
            Structure::new(TargetKind::Extension, Store::with_capacity(EXTENSION_CAPACITY)),
        ));
        taken.insert(pos);
    }

    let storage_pos = ZonePos::new(center.x + 5, center.y, zone);
    layout.storage = world.add_structure(
        storage_pos,
        Structure::new(TargetKind::Storage, filled(STORAGE_CAPACITY, layout_config.storage_energy)),
    );
    taken.insert(storage_pos);

    let sink_pos = ZonePos::new(center.x - 5, center.y + 5, zone);
    layout.sink = world.add_structure(
        sink_pos,
        Structure::new(TargetKind::Container, Store::with_capacity(CONTAINER_CAPACITY)).sink(),
    );
    taken.insert(sink_pos);

    for i in 0..layout_config.towers as i32 {
        let pos = ZonePos::new(center.x - 4 + 2 * i, center.y - 6, zone);
        layout.towers.push(world.add_structure(
            pos,
            Structure::new(TargetKind::Tower, Store::with_capacity(TOWER_CAPACITY)),
        ));
        taken.insert(pos);
    }

    for _ in 0..layout_config.sources {
        let pos = random_tile(rng, center, 10, &taken);
        layout.sources.push(world.add_source(
            pos,
            layout_config.source_energy,
            layout_config.source_regen_interval,
        ));
        taken.insert(pos);
        let container_pos = pos.step_toward(&center);
        layout.containers.push(world.add_structure(
            container_pos,
            Structure::new(TargetKind::Container, filled(CONTAINER_CAPACITY, SOURCE_CONTAINER_STOCK)),
        ));
        taken.insert(container_pos);
    }

    let ruin_pos = random_tile(rng, center, CLEAR_RADIUS, &taken);
    let mut ruin = Store::holding(ResourceKind::Energy, rng.gen_range(50..200));
    ruin.mineral = rng.gen_range(0..20);
    layout.ruin = Some(world.add_decaying(ruin_pos, TargetKind::Ruin, ruin, DROP_DECAY_TICKS));
    taken.insert(ruin_pos);

    let blocked: HashSet<ZonePos> = taken
        .iter()
        .flat_map(|p| p.neighbors().chain(std::iter::once(*p)).collect::<Vec<_>>())
        .collect();
    let mut walls = 0;
    while walls < layout_config.walls {
        let pos = random_tile(rng, center, CLEAR_RADIUS + 1, &blocked);
        if !world.terrain.is_wall(&pos) {
            world.terrain.add_wall(pos);
            walls += 1;
        }
    }

    // Seed one logistics agent so the zone can bootstrap its own economy.
    if let Some(role) = config.logistics_roles.first().and_then(|name| config.role(name)) {
        let id = world.allocate_id();
        let pos = ZonePos::new(center.x, center.y + 1, zone);
        world.add_agent(
            id,
            pos,
            role.profile.profile.clone(),
            AgentMemory::for_role(role.name.clone()),
            AGENT_LIFETIME,
        );
    }

    layout
}

/// Generate every zone of a colony into `world`.
pub fn generate_colony(world: &mut ColonyWorld, config: &ColonyConfig, rng: &mut impl Rng) -> ColonyLayout {
    let zones = (1..=config.layout.zones)
        .map(|zone| generate_zone(world, zone, config, rng))
        .collect();
    ColonyLayout { zones }
}
