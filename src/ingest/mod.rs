//! UDP ingestion listener for ESP weather sensor datagrams.
//!
//! Sensors broadcast one comma-separated line per reading:
//! `device_name,temp_out,temp_in,humid,pressure`. Readings are stamped
//! with the local wall clock on arrival, so sensor clocks never matter.

use std::sync::{Arc, Mutex};

use chrono::Local;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::store::{DeviceDirectory, NewMeasurement, WeatherStore};

const DATAGRAM_BUF_SIZE: usize = 1024;

/// A decoded sensor datagram, prior to device resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub device_name: String,
    pub temp_out: Option<f64>,
    pub temp_in: Option<f64>,
    pub humid: Option<f64>,
    pub pressure: Option<f64>,
}

/// Parse one `device_name,temp_out,temp_in,humid,pressure` line.
///
/// Unparsable numeric fields become `None` rather than failing the whole
/// reading; a sensor with a dead pressure element still reports temperature.
/// Returns `None` only when the line itself is malformed (wrong field
/// count or empty device name).
pub fn parse_datagram(line: &str) -> Option<SensorReading> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != 5 {
        return None;
    }
    let device_name = fields[0].trim();
    if device_name.is_empty() {
        return None;
    }
    let num = |s: &str| s.trim().parse::<f64>().ok();
    Some(SensorReading {
        device_name: device_name.to_string(),
        temp_out: num(fields[1]),
        temp_in: num(fields[2]),
        humid: num(fields[3]),
        pressure: num(fields[4]),
    })
}

/// Listen for sensor datagrams and persist them until the task is aborted.
///
/// Malformed datagrams and failed inserts are logged and skipped; the
/// listener itself only exits on a socket-level error.
pub async fn run(
    config: IngestConfig,
    store: Arc<Mutex<WeatherStore>>,
    devices: Arc<DeviceDirectory>,
) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{}", config.port);
    let socket = UdpSocket::bind(&addr).await?;
    info!(%addr, "ingest listener started");

    let mut buf = [0u8; DATAGRAM_BUF_SIZE];
    loop {
        let (len, peer) = socket.recv_from(&mut buf).await?;
        let line = match std::str::from_utf8(&buf[..len]) {
            Ok(s) => s,
            Err(_) => {
                warn!(%peer, len, "ignoring non-utf8 datagram");
                continue;
            }
        };
        debug!(%peer, line, "datagram received");

        let reading = match parse_datagram(line) {
            Some(r) => r,
            None => {
                warn!(%peer, line, "ignoring malformed datagram");
                continue;
            }
        };
        if let Err(err) = store_reading(&store, &devices, &reading) {
            warn!(device = %reading.device_name, %err, "dropping reading");
        }
    }
}

fn store_reading(
    store: &Mutex<WeatherStore>,
    devices: &DeviceDirectory,
    reading: &SensorReading,
) -> crate::store::StoreResult<()> {
    let guard = store
        .lock()
        .map_err(|_| crate::store::StoreError::Unavailable("store mutex poisoned".into()))?;
    let device_id = devices.resolve_or_insert(&guard, &reading.device_name)?;
    // Storage truncates this to minute resolution when formatting.
    let measurement_time = Local::now().naive_local();
    guard.insert_measurement(&NewMeasurement {
        device_id,
        measurement_time,
        temp_out: reading.temp_out,
        temp_in: reading.temp_in,
        humid: reading.humid,
        pressure: reading.pressure,
    })
}
