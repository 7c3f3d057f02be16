//! Save/Load functionality for persisting colony state
//!
//! Uses bincode for binary serialization of the whole colony. Components are
//! serialized individually per entity, then the world, its id index and the
//! zone cache are reconstructed on load. Production queues live in the zone
//! cache, so they persist with it.

use hecs::World;
use hive_logic::agent::{AgentMemory, Cargo};
use hive_logic::geometry::ZonePos;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::cache::ZoneCache;
use crate::components::*;
use crate::config::ColonyConfig;
use crate::world::ColonyWorld;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the colony
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub tick: u64,
    /// Next object id to hand out
    pub next_id: u64,
    pub config: ColonyConfig,
    pub cache: ZoneCache,
    pub walls: Vec<ZonePos>,
    /// All entities with their components
    pub entities: Vec<SerializableEntity>,
}

/// All possible components for an entity, serialized as optionals
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableEntity {
    // Core
    pub object_id: Option<ObjectId>,
    pub position: Option<Position>,

    // Structures
    pub structure: Option<Structure>,
    pub regen: Option<Regen>,
    pub spawner: Option<Spawner>,
    pub decay: Option<Decay>,

    // Agents
    pub body: Option<Body>,
    pub cargo: Option<Cargo>,
    pub memory: Option<AgentMemory>,
    pub lifetime: Option<Lifetime>,
    pub claim: Option<SupplyClaim>,
}

/// Extract all entities from a world into serializable form
fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    let mut entities = Vec::new();

    for entity_ref in world.iter() {
        let mut se = SerializableEntity::default();

        if let Some(c) = entity_ref.get::<&ObjectId>() {
            se.object_id = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Position>() {
            se.position = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Structure>() {
            se.structure = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Regen>() {
            se.regen = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Spawner>() {
            se.spawner = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&Decay>() {
            se.decay = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Body>() {
            se.body = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&Cargo>() {
            se.cargo = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&AgentMemory>() {
            se.memory = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&Lifetime>() {
            se.lifetime = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&SupplyClaim>() {
            se.claim = Some(*c);
        }

        entities.push(se);
    }

    // Stable order so identical colonies produce identical saves.
    entities.sort_by_key(|se| se.object_id);
    entities
}

/// Spawn an entity with all its components
fn spawn_entity(world: &mut World, se: SerializableEntity) {
    let entity = world.spawn(());

    if let Some(c) = se.object_id {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.position {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.structure {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.regen {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.spawner {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.decay {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.body {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.cargo {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.memory {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.lifetime {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.claim {
        let _ = world.insert_one(entity, c);
    }
}

/// Save the complete colony to a writer
pub fn save_colony<W: Write>(
    writer: W,
    world: &ColonyWorld,
    cache: &ZoneCache,
    config: &ColonyConfig,
    tick: u64,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        tick,
        next_id: world.next_id(),
        config: config.clone(),
        cache: cache.clone(),
        walls: world.terrain.walls(),
        entities: serialize_entities(&world.ecs),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a colony from a reader
pub fn load_colony<R: Read>(reader: R) -> Result<LoadedColony, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = ColonyWorld::new();
    for se in save_data.entities {
        spawn_entity(&mut world.ecs, se);
    }
    for wall in save_data.walls {
        world.terrain.add_wall(wall);
    }
    world.reindex(save_data.next_id);

    Ok(LoadedColony {
        world,
        tick: save_data.tick,
        config: save_data.config,
        cache: save_data.cache,
    })
}

/// Result of loading a colony
pub struct LoadedColony {
    pub world: ColonyWorld,
    pub tick: u64,
    pub config: ColonyConfig,
    pub cache: ZoneCache,
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(f, "Save version mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for SaveError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ColonyEngine;

    #[test]
    fn test_save_load_roundtrip() {
        let mut engine = ColonyEngine::default();
        engine.generate();
        for _ in 0..40 {
            engine.run_cycle();
        }

        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).expect("Save failed");

        let mut loaded = ColonyEngine::default();
        loaded.load(&save_buffer[..]).expect("Load failed");

        assert_eq!(loaded.tick(), engine.tick());
        assert_eq!(loaded.agent_count(), engine.agent_count());
        assert_eq!(loaded.pending(1), engine.pending(1));
        assert_eq!(loaded.world.terrain.walls(), engine.world.terrain.walls());
        assert_eq!(loaded.world.next_id(), engine.world.next_id());
        for agent in engine.world.agents_in_zone(1) {
            assert_eq!(loaded.world.agent(agent.id), Some(agent));
        }

        // Both continue identically.
        let a = engine.run_cycle();
        let b = loaded.run_cycle();
        assert_eq!(a, b);
    }

    #[test]
    fn test_version_mismatch() {
        let engine = ColonyEngine::default();
        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).unwrap();
        // Version is the first field, little-endian.
        save_buffer[0] = 99;
        let mut loaded = ColonyEngine::default();
        match loaded.load(&save_buffer[..]) {
            Err(SaveError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, 99);
            }
            other => panic!("expected version mismatch, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_truncated_save_is_an_error() {
        let mut engine = ColonyEngine::default();
        engine.generate();
        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).unwrap();
        save_buffer.truncate(save_buffer.len() / 2);
        assert!(ColonyEngine::default().load(&save_buffer[..]).is_err());
    }
}
