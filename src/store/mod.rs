//! Measurement store
//!
//! SQLite-backed relational store for devices and their periodic sensor
//! readings. The schema is created on open:
//!
//! - `devices(id, name UNIQUE, description)` — device identities, immutable
//!   once created; the UNIQUE constraint on `name` is the arbiter for
//!   concurrent insert races.
//! - `measurements(device_id, measurement_time, temp_out, temp_in, humid,
//!   pressure)` — append-only readings keyed `(device_id, measurement_time)`,
//!   numeric columns nullable for sensor dropout.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM` text; with this fixed format
//! lexicographic comparison is chronological comparison, so range queries
//! bind plain text bounds.

pub mod device;
pub mod error;
pub mod series;

pub use device::{Device, DeviceDirectory, DEVICE_NAME_MAX};
pub use error::{StoreError, StoreResult};
pub use series::{Measurement, SeriesLoader};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};

use crate::range::FMT_MEASUREMENT_TIME;

/// A new sensor reading bound for the `measurements` table
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub device_id: i64,
    pub measurement_time: NaiveDateTime,
    pub temp_out: Option<f64>,
    pub temp_in: Option<f64>,
    pub humid: Option<f64>,
    pub pressure: Option<f64>,
}

/// SQLite-backed weather measurement store
pub struct WeatherStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl WeatherStore {
    /// Open (or create) the store at `path`
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store, used by tests
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let store = Self { conn, path: None };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS devices (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE
                            CHECK(length(name) BETWEEN 1 AND 20),
                description TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS measurements (
                device_id        INTEGER NOT NULL REFERENCES devices(id),
                measurement_time TEXT NOT NULL,
                temp_out         REAL,
                temp_in          REAL,
                humid            REAL,
                pressure         REAL,
                PRIMARY KEY (device_id, measurement_time)
            );
            ",
        )?;
        Ok(())
    }

    /// Append one sensor reading
    ///
    /// A reading that collides on `(device_id, measurement_time)` replaces
    /// the earlier row; sensors occasionally rebroadcast within the same
    /// minute.
    pub fn insert_measurement(&self, m: &NewMeasurement) -> StoreResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR REPLACE INTO measurements
                 (device_id, measurement_time, temp_out, temp_in, humid, pressure)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        stmt.execute(params![
            m.device_id,
            m.measurement_time.format(FMT_MEASUREMENT_TIME).to_string(),
            m.temp_out,
            m.temp_in,
            m.humid,
            m.pressure,
        ])?;
        Ok(())
    }

    /// Series loader bound to this store
    pub fn series(&self) -> SeriesLoader<'_> {
        SeriesLoader::new(self)
    }

    /// Path of the backing database file, if file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_open_creates_schema() {
        let dir = tempdir().unwrap();
        let store = WeatherStore::open(&dir.path().join("weather.db")).unwrap();

        let directory = DeviceDirectory::new();
        assert!(!directory.exists(&store, "sensor1").unwrap());
    }

    #[test]
    fn test_insert_measurement() {
        let store = WeatherStore::open_in_memory().unwrap();
        let directory = DeviceDirectory::new();
        let did = directory.resolve_or_insert(&store, "sensor1").unwrap();

        store
            .insert_measurement(&NewMeasurement {
                device_id: did,
                measurement_time: ts(2023, 9, 1, 10, 0),
                temp_out: Some(25.0),
                temp_in: Some(26.0),
                humid: Some(55.0),
                pressure: Some(1013.0),
            })
            .unwrap();

        let last = store.series().fetch_last("sensor1").unwrap().unwrap();
        assert_eq!(last.measurement_time, ts(2023, 9, 1, 10, 0));
        assert_eq!(last.temp_out, Some(25.0));
    }

    #[test]
    fn test_same_minute_rebroadcast_replaces() {
        let store = WeatherStore::open_in_memory().unwrap();
        let directory = DeviceDirectory::new();
        let did = directory.resolve_or_insert(&store, "sensor1").unwrap();

        let base = NewMeasurement {
            device_id: did,
            measurement_time: ts(2023, 9, 1, 10, 0),
            temp_out: Some(25.0),
            temp_in: None,
            humid: None,
            pressure: None,
        };
        store.insert_measurement(&base).unwrap();
        store
            .insert_measurement(&NewMeasurement {
                temp_out: Some(25.5),
                ..base
            })
            .unwrap();

        let last = store.series().fetch_last("sensor1").unwrap().unwrap();
        assert_eq!(last.temp_out, Some(25.5));
    }
}
