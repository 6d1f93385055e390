//! Series loader
//!
//! Bounds-parameterized queries over the `measurements` table. Every device
//! name and timestamp bound is bound as a statement parameter - query text
//! never carries interpolated input. Rows come back ordered ascending by
//! `(device_id, measurement_time)`; an empty window is an empty result, not
//! an error.
//!
//! Grouping queries (`group_by_day` / `group_by_month`) feed navigation
//! controls: which calendar buckets have at least one reading.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, OptionalExtension, Row};

use super::error::StoreResult;
use super::WeatherStore;
use crate::range::{FMT_ISO_DATE, FMT_MEASUREMENT_TIME, ResolvedRange};
use crate::table::{SeriesRow, SeriesTable};

/// One stored sensor reading
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub device_id: i64,
    pub measurement_time: NaiveDateTime,
    pub temp_out: Option<f64>,
    pub temp_in: Option<f64>,
    pub humid: Option<f64>,
    pub pressure: Option<f64>,
}

impl From<Measurement> for SeriesRow {
    fn from(m: Measurement) -> Self {
        SeriesRow {
            device_id: m.device_id,
            measurement_time: m.measurement_time,
            temp_out: m.temp_out,
            temp_in: m.temp_in,
            humid: m.humid,
            pressure: m.pressure,
        }
    }
}

/// Read-side query interface over a [`WeatherStore`]
pub struct SeriesLoader<'a> {
    store: &'a WeatherStore,
}

const SELECT_COLUMNS: &str =
    "device_id, measurement_time, temp_out, temp_in, humid, pressure";

impl<'a> SeriesLoader<'a> {
    pub fn new(store: &'a WeatherStore) -> Self {
        Self { store }
    }

    /// Most recent reading for a device, across the whole store
    pub fn fetch_last(&self, device_name: &str) -> StoreResult<Option<Measurement>> {
        let mut stmt = self.store.conn().prepare_cached(&format!(
            "SELECT {SELECT_COLUMNS}
             FROM measurements
             WHERE device_id = (SELECT id FROM devices WHERE name = ?1)
             ORDER BY measurement_time DESC
             LIMIT 1"
        ))?;
        let row = stmt
            .query_row(params![device_name], measurement_from_row)
            .optional()?;
        Ok(row)
    }

    /// Readings with `lower <= measurement_time < upper`, time ascending
    ///
    /// Returned as the tabular seam representation the renderer consumes.
    pub fn fetch_range(
        &self,
        device_name: &str,
        lower: NaiveDateTime,
        upper: NaiveDateTime,
    ) -> StoreResult<SeriesTable> {
        let mut stmt = self.store.conn().prepare_cached(&format!(
            "SELECT {SELECT_COLUMNS}
             FROM measurements
             WHERE device_id = (SELECT id FROM devices WHERE name = ?1)
               AND measurement_time >= ?2
               AND measurement_time < ?3
             ORDER BY device_id, measurement_time"
        ))?;
        let rows = stmt
            .query_map(
                params![
                    device_name,
                    lower.format(FMT_MEASUREMENT_TIME).to_string(),
                    upper.format(FMT_MEASUREMENT_TIME).to_string(),
                ],
                measurement_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SeriesTable::new(rows.into_iter().map(Into::into).collect()))
    }

    /// Convenience wrapper taking resolved range bounds
    pub fn fetch_resolved(
        &self,
        device_name: &str,
        range: &ResolvedRange,
    ) -> StoreResult<SeriesTable> {
        self.fetch_range(device_name, range.lower, range.upper)
    }

    /// Earliest measurement date for a device, `None` when no data exists
    pub fn first_day(&self, device_name: &str) -> StoreResult<Option<NaiveDate>> {
        let mut stmt = self.store.conn().prepare_cached(
            "SELECT min(substr(measurement_time, 1, 10))
             FROM measurements
             WHERE device_id = (SELECT id FROM devices WHERE name = ?1)",
        )?;
        let day: Option<String> = stmt.query_row(params![device_name], |row| row.get(0))?;
        Ok(day.and_then(|d| NaiveDate::parse_from_str(&d, FMT_ISO_DATE).ok()))
    }

    /// Distinct days with data on or after `since`, ascending
    pub fn group_by_day(
        &self,
        device_name: &str,
        since: NaiveDate,
    ) -> StoreResult<Vec<NaiveDate>> {
        let mut stmt = self.store.conn().prepare_cached(
            "SELECT DISTINCT substr(measurement_time, 1, 10) AS day
             FROM measurements
             WHERE device_id = (SELECT id FROM devices WHERE name = ?1)
               AND substr(measurement_time, 1, 10) >= ?2
             ORDER BY day",
        )?;
        let days = stmt
            .query_map(
                params![device_name, since.format(FMT_ISO_DATE).to_string()],
                |row| row.get::<_, String>(0),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(days
            .into_iter()
            .filter_map(|d| NaiveDate::parse_from_str(&d, FMT_ISO_DATE).ok())
            .collect())
    }

    /// Distinct `YYYY-MM` months with data on or after `since`, descending
    pub fn group_by_month(
        &self,
        device_name: &str,
        since: NaiveDate,
    ) -> StoreResult<Vec<String>> {
        let mut stmt = self.store.conn().prepare_cached(
            "SELECT DISTINCT substr(measurement_time, 1, 7) AS month
             FROM measurements
             WHERE device_id = (SELECT id FROM devices WHERE name = ?1)
               AND substr(measurement_time, 1, 7) >= ?2
             ORDER BY month DESC",
        )?;
        let months = stmt
            .query_map(
                params![device_name, since.format("%Y-%m").to_string()],
                |row| row.get::<_, String>(0),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(months)
    }
}

fn measurement_from_row(row: &Row<'_>) -> rusqlite::Result<Measurement> {
    let time: String = row.get(1)?;
    let measurement_time = NaiveDateTime::parse_from_str(&time, FMT_MEASUREMENT_TIME)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;
    Ok(Measurement {
        device_id: row.get(0)?,
        measurement_time,
        temp_out: row.get(2)?,
        temp_in: row.get(3)?,
        humid: row.get(4)?,
        pressure: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::DateRangeSpec;
    use crate::store::{DeviceDirectory, NewMeasurement};
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn seeded_store() -> WeatherStore {
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
        store
    }

    #[test]
    fn test_fetch_range_single_day() {
        let store = seeded_store();

        let table = store
            .series()
            .fetch_range("sensor1", ts(2023, 9, 1, 0, 0), ts(2023, 9, 2, 0, 0))
            .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].measurement_time, ts(2023, 9, 1, 10, 0));
        assert_eq!(table.rows[0].temp_out, Some(25.0));
    }

    #[test]
    fn test_fetch_range_upper_bound_exclusive() {
        let store = seeded_store();
        let directory = DeviceDirectory::new();
        let did = directory.lookup(&store, "sensor1").unwrap().unwrap();

        // Reading exactly at the upper bound belongs to the next window
        store
            .insert_measurement(&NewMeasurement {
                device_id: did,
                measurement_time: ts(2023, 9, 2, 0, 0),
                temp_out: Some(20.0),
                temp_in: None,
                humid: None,
                pressure: None,
            })
            .unwrap();

        let table = store
            .series()
            .fetch_range("sensor1", ts(2023, 9, 1, 0, 0), ts(2023, 9, 2, 0, 0))
            .unwrap();
        assert_eq!(table.len(), 1);
        assert!(table
            .rows
            .iter()
            .all(|r| r.measurement_time < ts(2023, 9, 2, 0, 0)));
    }

    #[test]
    fn test_fetch_range_empty_window() {
        let store = seeded_store();
        let table = store
            .series()
            .fetch_range("sensor1", ts(2024, 1, 1, 0, 0), ts(2024, 1, 2, 0, 0))
            .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_fetch_resolved_uses_spec_bounds() {
        let store = seeded_store();
        let range = DateRangeSpec::Today {
            reference_date: NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
        }
        .resolve();

        let table = store.series().fetch_resolved("sensor1", &range).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_fetch_last_absent_device() {
        let store = seeded_store();
        assert!(store.series().fetch_last("ghost").unwrap().is_none());
    }

    #[test]
    fn test_null_readings_stay_null() {
        let store = seeded_store();
        let directory = DeviceDirectory::new();
        let did = directory.lookup(&store, "sensor1").unwrap().unwrap();

        store
            .insert_measurement(&NewMeasurement {
                device_id: did,
                measurement_time: ts(2023, 9, 1, 10, 10),
                temp_out: None,
                temp_in: Some(26.0),
                humid: None,
                pressure: Some(1012.5),
            })
            .unwrap();

        let table = store
            .series()
            .fetch_range("sensor1", ts(2023, 9, 1, 0, 0), ts(2023, 9, 2, 0, 0))
            .unwrap();
        let dropout = &table.rows[1];
        assert_eq!(dropout.temp_out, None);
        assert_eq!(dropout.humid, None);
        assert_eq!(dropout.pressure, Some(1012.5));
    }

    #[test]
    fn test_grouping_and_first_day() {
        let store = seeded_store();
        let directory = DeviceDirectory::new();
        let did = directory.lookup(&store, "sensor1").unwrap().unwrap();

        for (d, month) in [(2, 9), (15, 9), (3, 10)] {
            store
                .insert_measurement(&NewMeasurement {
                    device_id: did,
                    measurement_time: ts(2023, month, d, 12, 0),
                    temp_out: Some(20.0),
                    temp_in: None,
                    humid: None,
                    pressure: None,
                })
                .unwrap();
        }

        let since = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let days = store.series().group_by_day("sensor1", since).unwrap();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 9, 2).unwrap(),
                NaiveDate::from_ymd_opt(2023, 9, 15).unwrap(),
                NaiveDate::from_ymd_opt(2023, 10, 3).unwrap(),
            ]
        );

        // Months come back descending for the navigation dropdown
        let months = store.series().group_by_month("sensor1", since).unwrap();
        assert_eq!(months, vec!["2023-10".to_string(), "2023-09".to_string()]);

        assert_eq!(
            store.series().first_day("sensor1").unwrap(),
            Some(NaiveDate::from_ymd_opt(2023, 9, 1).unwrap())
        );
        assert_eq!(store.series().first_day("ghost").unwrap(), None);
    }
}
