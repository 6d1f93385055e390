//! Intermediate tabular series representation
//!
//! The seam between the series loader and the chart renderer: ordered rows
//! with a fixed six-column layout, independent of the store's wire format.
//! Serializes to CSV with the header
//! `did,measurement_time,temp_out,temp_in,humid,pressure`; absent sensor
//! readings stay empty fields and round-trip as `None`, never `0.0`.

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::range::FMT_MEASUREMENT_TIME;

/// Fixed column order of the tabular seam
pub const SERIES_HEADER: [&str; 6] = [
    "did",
    "measurement_time",
    "temp_out",
    "temp_in",
    "humid",
    "pressure",
];

/// One measurement row in the tabular seam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    /// Device id the row belongs to
    pub device_id: i64,
    /// Measurement timestamp, minute resolution
    pub measurement_time: NaiveDateTime,
    /// Outdoor temperature (°C), absent on sensor dropout
    pub temp_out: Option<f64>,
    /// Indoor temperature (°C)
    pub temp_in: Option<f64>,
    /// Indoor relative humidity (%)
    pub humid: Option<f64>,
    /// Barometric pressure (hPa)
    pub pressure: Option<f64>,
}

/// Ordered measurement rows for one device and range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesTable {
    pub rows: Vec<SeriesRow>,
}

impl SeriesTable {
    pub fn new(rows: Vec<SeriesRow>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Timestamp of the first row, if any
    pub fn first_time(&self) -> Option<NaiveDateTime> {
        self.rows.first().map(|r| r.measurement_time)
    }

    /// Timestamp of the last row, if any
    pub fn last_time(&self) -> Option<NaiveDateTime> {
        self.rows.last().map(|r| r.measurement_time)
    }

    /// Serialize to CSV, optionally with the fixed header row
    pub fn to_csv(&self, require_header: bool) -> Result<String, TableError> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        if require_header {
            writer.write_record(SERIES_HEADER)?;
        }
        for row in &self.rows {
            writer.write_record([
                row.device_id.to_string(),
                row.measurement_time.format(FMT_MEASUREMENT_TIME).to_string(),
                format_opt(row.temp_out),
                format_opt(row.temp_in),
                format_opt(row.humid),
                format_opt(row.pressure),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| TableError::Csv(e.into_error().into()))?;
        String::from_utf8(bytes).map_err(|e| TableError::Format(e.to_string()))
    }

    /// Parse CSV produced by [`SeriesTable::to_csv`]
    pub fn from_csv(input: &str, has_header: bool) -> Result<Self, TableError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(has_header)
            .from_reader(input.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() != SERIES_HEADER.len() {
                return Err(TableError::Format(format!(
                    "expected {} columns, got {}",
                    SERIES_HEADER.len(),
                    record.len()
                )));
            }

            let device_id = record[0]
                .parse::<i64>()
                .map_err(|e| TableError::Format(format!("bad device id: {}", e)))?;
            let measurement_time =
                NaiveDateTime::parse_from_str(&record[1], FMT_MEASUREMENT_TIME)
                    .map_err(|e| TableError::Format(format!("bad timestamp: {}", e)))?;

            rows.push(SeriesRow {
                device_id,
                measurement_time,
                temp_out: parse_opt(&record[2])?,
                temp_in: parse_opt(&record[3])?,
                humid: parse_opt(&record[4])?,
                pressure: parse_opt(&record[5])?,
            });
        }

        Ok(Self { rows })
    }
}

fn format_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

fn parse_opt(field: &str) -> Result<Option<f64>, TableError> {
    if field.is_empty() {
        return Ok(None);
    }
    field
        .parse::<f64>()
        .map(Some)
        .map_err(|e| TableError::Format(format!("bad numeric field {:?}: {}", field, e)))
}

/// Errors from the tabular seam
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Format error: {0}")]
    Format(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_row() -> SeriesRow {
        SeriesRow {
            device_id: 1,
            measurement_time: NaiveDate::from_ymd_opt(2023, 9, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            temp_out: Some(25.0),
            temp_in: Some(26.5),
            humid: Some(55.0),
            pressure: Some(1013.2),
        }
    }

    #[test]
    fn test_csv_round_trip() {
        let table = SeriesTable::new(vec![sample_row()]);

        let csv = table.to_csv(true).unwrap();
        assert!(csv.starts_with("did,measurement_time,temp_out,temp_in,humid,pressure"));

        let restored = SeriesTable::from_csv(&csv, true).unwrap();
        assert_eq!(restored, table);
    }

    #[test]
    fn test_null_fields_round_trip_as_null() {
        let mut row = sample_row();
        row.temp_out = None;
        row.humid = None;
        let table = SeriesTable::new(vec![row]);

        let csv = table.to_csv(true).unwrap();
        let restored = SeriesTable::from_csv(&csv, true).unwrap();

        // Dropout stays absent, it must not decay to 0.0
        assert_eq!(restored.rows[0].temp_out, None);
        assert_eq!(restored.rows[0].humid, None);
        assert_eq!(restored.rows[0].temp_in, Some(26.5));
    }

    #[test]
    fn test_headerless_round_trip() {
        let table = SeriesTable::new(vec![sample_row()]);
        let csv = table.to_csv(false).unwrap();
        assert!(csv.starts_with("1,2023-09-01 10:00"));

        let restored = SeriesTable::from_csv(&csv, false).unwrap();
        assert_eq!(restored, table);
    }

    #[test]
    fn test_empty_table() {
        let table = SeriesTable::default();
        assert!(table.is_empty());
        assert_eq!(table.first_time(), None);

        let csv = table.to_csv(true).unwrap();
        let restored = SeriesTable::from_csv(&csv, true).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn test_rejects_short_rows() {
        let result = SeriesTable::from_csv("1,2023-09-01 10:00,25.0\n", false);
        assert!(result.is_err());
    }
}
