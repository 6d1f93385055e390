//! Device identity directory
//!
//! Resolves a device name to its stable integer id. The ingestion path gets
//! one name resolution per incoming sample, so resolved ids are held in an
//! in-memory cache owned by the directory; a cache miss always falls back to
//! the store, and the store's UNIQUE constraint on `devices.name` settles
//! concurrent insert races (the losing insert re-reads the winner's id).
//!
//! Read paths use [`DeviceDirectory::lookup`] / [`DeviceDirectory::exists`],
//! which never create devices - a malformed query request must not mint a
//! device row.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

use super::error::{StoreError, StoreResult};
use super::WeatherStore;

/// Maximum device name length, enforced here and by the schema
pub const DEVICE_NAME_MAX: usize = 20;

/// A registered sensor device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Process-lifetime name -> id cache
///
/// Purely a performance optimization; correctness never depends on a hit.
#[derive(Debug, Default)]
struct DeviceCache {
    map: Mutex<HashMap<String, i64>>,
}

impl DeviceCache {
    fn get(&self, name: &str) -> Option<i64> {
        self.map
            .lock()
            .ok()
            .and_then(|map| map.get(name).copied())
    }

    fn put(&self, name: &str, id: i64) {
        if let Ok(mut map) = self.map.lock() {
            map.insert(name.to_string(), id);
        }
    }
}

/// Name -> id resolution with insert-on-miss for the ingestion path
#[derive(Debug, Default)]
pub struct DeviceDirectory {
    cache: DeviceCache,
}

impl DeviceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a device id, inserting the device on first sight
    ///
    /// Ingestion path only. Cache -> store lookup -> insert; at most one
    /// insert happens per name, repeated calls return the same id.
    pub fn resolve_or_insert(&self, store: &WeatherStore, name: &str) -> StoreResult<i64> {
        validate_name(name)?;

        if let Some(id) = self.cache.get(name) {
            return Ok(id);
        }

        if let Some(id) = self.lookup(store, name)? {
            self.cache.put(name, id);
            return Ok(id);
        }

        // INSERT OR IGNORE + re-select: if a concurrent worker won the
        // race, the UNIQUE constraint swallows our insert and the select
        // returns the winner's id.
        store.conn().execute(
            "INSERT OR IGNORE INTO devices (name) VALUES (?1)",
            params![name],
        )?;
        let id = self
            .lookup(store, name)?
            .ok_or_else(|| StoreError::Unavailable(format!("device {:?} vanished after insert", name)))?;

        tracing::info!(device = name, id, "registered new device");
        self.cache.put(name, id);
        Ok(id)
    }

    /// Read-only id lookup; never creates a device
    pub fn lookup(&self, store: &WeatherStore, name: &str) -> StoreResult<Option<i64>> {
        let mut stmt = store
            .conn()
            .prepare_cached("SELECT id FROM devices WHERE name = ?1")?;
        let id = stmt
            .query_row(params![name], |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(id)
    }

    /// Whether a device name is registered
    pub fn exists(&self, store: &WeatherStore, name: &str) -> StoreResult<bool> {
        if self.cache.get(name).is_some() {
            return Ok(true);
        }
        Ok(self.lookup(store, name)?.is_some())
    }

    /// All registered devices, ordered by id
    pub fn list(&self, store: &WeatherStore) -> StoreResult<Vec<Device>> {
        let mut stmt = store
            .conn()
            .prepare_cached("SELECT id, name, description FROM devices ORDER BY id")?;
        let devices = stmt
            .query_map([], |row| {
                Ok(Device {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(devices)
    }
}

fn validate_name(name: &str) -> StoreResult<()> {
    // Counted in characters, matching the schema's length() CHECK.
    if name.is_empty() || name.chars().count() > DEVICE_NAME_MAX {
        return Err(StoreError::InvalidDeviceName(name.to_string()));
    }
    Ok(())
}
