//! Zone-scoped key/value cache with explicit time-to-live.
//!
//! Values are stored bincode-encoded so the whole cache persists with the
//! colony save. Expiry is checked lazily when an entry is read; nothing
//! sweeps the cache in the background.

use std::collections::BTreeMap;

use hive_logic::geometry::ZoneId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// How long an entry stays readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ttl {
    Forever,
    /// Expires this many cycles after it was written.
    Ticks(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    bytes: Vec<u8>,
    expires_at: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCache {
    entries: BTreeMap<(ZoneId, String), Entry>,
}

impl ZoneCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `(zone, key)`, replacing any previous entry.
    pub fn set<T: Serialize>(&mut self, zone: ZoneId, key: &str, value: &T, ttl: Ttl, now: u64) -> Result<(), CacheError> {
        let bytes = bincode::serialize(value)?;
        let expires_at = match ttl {
            Ttl::Forever => None,
            Ttl::Ticks(n) => Some(now.saturating_add(n)),
        };
        self.entries.insert((zone, key.to_string()), Entry { bytes, expires_at });
        Ok(())
    }

    /// Read `(zone, key)`. Missing and expired entries are `Ok(None)`.
    pub fn get<T: DeserializeOwned>(&self, zone: ZoneId, key: &str, now: u64) -> Result<Option<T>, CacheError> {
        let Some(entry) = self.entries.get(&(zone, key.to_string())) else {
            return Ok(None);
        };
        if entry.expires_at.map(|at| now >= at).unwrap_or(false) {
            return Ok(None);
        }
        Ok(Some(bincode::deserialize(&entry.bytes)?))
    }

    pub fn remove(&mut self, zone: ZoneId, key: &str) {
        self.entries.remove(&(zone, key.to_string()));
    }

    /// Stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors from encoding or decoding cached values.
#[derive(Debug)]
pub enum CacheError {
    Bincode(Box<bincode::ErrorKind>),
}

impl From<Box<bincode::ErrorKind>> for CacheError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        CacheError::Bincode(e)
    }
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Bincode(e) => write!(f, "Cache encoding error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}
