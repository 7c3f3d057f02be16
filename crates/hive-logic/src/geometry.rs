//! Zone coordinates and straight-line range.
//!
//! Every zone is an independent square grid. Positions in different zones
//! have no straight-line range; only a path oracle can relate them.

use serde::{Deserialize, Serialize};

/// Identifier of a zone (one independently simulated grid).
pub type ZoneId = u32;

/// Side length of a zone grid, in tiles.
pub const ZONE_SIZE: i32 = 50;

/// A tile position inside a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZonePos {
    pub x: i32,
    pub y: i32,
    pub zone: ZoneId,
}

impl ZonePos {
    pub fn new(x: i32, y: i32, zone: ZoneId) -> Self {
        Self { x, y, zone }
    }

    /// Chebyshev distance (diagonal moves cost one tile). `None` across zones.
    pub fn range_to(&self, other: &ZonePos) -> Option<u32> {
        if self.zone != other.zone {
            return None;
        }
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        Some(dx.max(dy))
    }

    /// True when `other` is on this tile or one of the eight around it.
    pub fn is_adjacent(&self, other: &ZonePos) -> bool {
        matches!(self.range_to(other), Some(r) if r <= 1)
    }

    /// Whether the tile lies inside the zone grid.
    pub fn in_bounds(&self) -> bool {
        (0..ZONE_SIZE).contains(&self.x) && (0..ZONE_SIZE).contains(&self.y)
    }

    /// One step from `self` toward `target` (same zone only).
    pub fn step_toward(&self, target: &ZonePos) -> ZonePos {
        if self.zone != target.zone {
            return *self;
        }
        ZonePos {
            x: self.x + (target.x - self.x).signum(),
            y: self.y + (target.y - self.y).signum(),
            zone: self.zone,
        }
    }

    /// The eight neighbouring tiles that are in bounds.
    pub fn neighbors(&self) -> impl Iterator<Item = ZonePos> + '_ {
        const DIRS: [(i32, i32); 8] = [
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ];
        DIRS.iter()
            .map(move |(dx, dy)| ZonePos::new(self.x + dx, self.y + dy, self.zone))
            .filter(|p| p.in_bounds())
    }
}

impl std::fmt::Display for ZonePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}@{}", self.x, self.y, self.zone)
    }
}
