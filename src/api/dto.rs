//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

// ============================================
// CHART DTOs
// ============================================

/// Query parameters for the today / month chart endpoints
#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    /// Device name, defaults to the configured device
    #[serde(default)]
    pub device_name: Option<String>,
    /// Client viewport as `<width>x<height>x<density>`; absent means desktop
    #[serde(default)]
    pub phone_size: Option<String>,
}

/// Query parameters for the rolling-window chart endpoint
#[derive(Debug, Deserialize)]
pub struct RangeChartQuery {
    #[serde(default)]
    pub device_name: Option<String>,
    /// Window end day (ISO 8601), defaults to today
    #[serde(default)]
    pub start_day: Option<String>,
    /// Window length in days; one of 1, 2, 3 or 7
    pub before_days: i64,
    #[serde(default)]
    pub phone_size: Option<String>,
}

/// Chart response: record count plus the encoded image
///
/// A zero-record window reports `rec_count: 0` with no `img_src` instead
/// of a blank chart.
#[derive(Debug, Serialize)]
pub struct ChartResponse {
    /// Number of measurements in the plotted window
    pub rec_count: usize,
    /// `data:image/png;base64,...` URI, absent when no data matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_src: Option<String>,
}

// ============================================
// DEVICE DTOs
// ============================================

/// Query parameter shared by device-scoped read endpoints
#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    #[serde(default)]
    pub device_name: Option<String>,
}

/// One registered device (internal id not exposed)
#[derive(Debug, Serialize)]
pub struct DeviceDto {
    pub name: String,
    pub description: String,
}

/// Device list response
#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub total: usize,
    pub devices: Vec<DeviceDto>,
}

// ============================================
// MEASUREMENT DTOs
// ============================================

/// Latest reading for a device
#[derive(Debug, Serialize)]
pub struct LastMeasurementResponse {
    pub device_name: String,
    /// 1 when a reading exists, 0 otherwise
    pub rec_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_time: Option<String>,
    pub temp_out: Option<f64>,
    pub temp_in: Option<f64>,
    pub humid: Option<f64>,
    pub pressure: Option<f64>,
}

// ============================================
// NAVIGATION DTOs
// ============================================

/// Calendar buckets that have at least one reading
#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub device_name: String,
    /// Earliest day with data (`YYYY-MM-DD`), absent when the device is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_day: Option<String>,
    /// `YYYY-MM` buckets, newest first
    pub months: Vec<String>,
    /// `YYYY-MM-DD` buckets, oldest first
    pub days: Vec<String>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub uptime_seconds: u64,
    pub version: String,
}
