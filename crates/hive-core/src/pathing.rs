//! Grid pathfinding over zone terrain.
//!
//! `Terrain` holds the impassable tiles of every zone and provides BFS
//! pathfinding with a bounded path cache. Structures and agents never block
//! movement; only walls do.

use std::collections::{HashMap, HashSet, VecDeque};

use hive_logic::geometry::{ZoneId, ZonePos};

/// Walls per zone, with BFS pathfinding and path cache.
#[derive(Debug, Clone)]
pub struct Terrain {
    walls: HashMap<ZoneId, HashSet<(i32, i32)>>,
    /// (from, to) → cached path. Simple bounded cache.
    cache: HashMap<(ZonePos, ZonePos), Vec<ZonePos>>,
    cache_capacity: usize,
}

impl Default for Terrain {
    fn default() -> Self {
        Self::with_cache(1024)
    }
}

impl Terrain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache_capacity: usize) -> Self {
        Self {
            walls: HashMap::new(),
            cache: HashMap::new(),
            cache_capacity,
        }
    }

    /// Mark a tile impassable. Invalidates cached paths.
    pub fn add_wall(&mut self, pos: ZonePos) {
        if self.walls.entry(pos.zone).or_default().insert((pos.x, pos.y)) {
            self.cache.clear();
        }
    }

    pub fn is_wall(&self, pos: &ZonePos) -> bool {
        self.walls
            .get(&pos.zone)
            .map(|w| w.contains(&(pos.x, pos.y)))
            .unwrap_or(false)
    }

    pub fn is_walkable(&self, pos: &ZonePos) -> bool {
        pos.in_bounds() && !self.is_wall(pos)
    }

    /// Every wall tile, sorted for stable output.
    pub fn walls(&self) -> Vec<ZonePos> {
        let mut all: Vec<ZonePos> = self
            .walls
            .iter()
            .flat_map(|(zone, tiles)| tiles.iter().map(move |&(x, y)| ZonePos::new(x, y, *zone)))
            .collect();
        all.sort_by_key(|p| (p.zone, p.y, p.x));
        all
    }

    /// Find a path from `from` to `to` via BFS.
    ///
    /// Returns the tiles to step through, ending at `to`. Returns an empty vec
    /// if already there. Returns `None` if unreachable or in another zone.
    pub fn find_path(&mut self, from: ZonePos, to: ZonePos) -> Option<Vec<ZonePos>> {
        if from == to {
            return Some(vec![]);
        }
        if from.zone != to.zone || !to.in_bounds() {
            return None;
        }

        let key = (from, to);
        if let Some(cached) = self.cache.get(&key) {
            return Some(cached.clone());
        }

        let result = self.bfs(from, to);

        if let Some(ref path) = result {
            if self.cache.len() >= self.cache_capacity {
                // Evict an arbitrary entry (HashMap iteration order)
                if let Some(&evict_key) = self.cache.keys().next() {
                    self.cache.remove(&evict_key);
                }
            }
            self.cache.insert(key, path.clone());
        }

        result
    }

    /// Number of cached paths.
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn bfs(&self, from: ZonePos, to: ZonePos) -> Option<Vec<ZonePos>> {
        let mut came_from: HashMap<ZonePos, ZonePos> = HashMap::new();
        let mut queue = VecDeque::new();
        came_from.insert(from, from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for next in current.neighbors() {
                // The destination tile is always enterable.
                if next != to && self.is_wall(&next) {
                    continue;
                }
                if came_from.contains_key(&next) {
                    continue;
                }
                came_from.insert(next, current);
                if next == to {
                    return Some(unwind(&came_from, from, to));
                }
                queue.push_back(next);
            }
        }

        None
    }
}

fn unwind(came_from: &HashMap<ZonePos, ZonePos>, from: ZonePos, to: ZonePos) -> Vec<ZonePos> {
    let mut path = vec![to];
    let mut current = to;
    while let Some(&prev) = came_from.get(&current) {
        if prev == from {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
