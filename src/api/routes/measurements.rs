//! Measurement Routes
//!
//! - GET /api/v1/measurements/last - latest reading for a device

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{DeviceQuery, LastMeasurementResponse};
use crate::api::error::ApiResult;
use crate::api::routes::require_device;
use crate::api::state::AppState;
use crate::range::FMT_MEASUREMENT_TIME;

/// GET /api/v1/measurements/last
///
/// A registered device with no readings yet answers `rec_count: 0`
/// rather than 404; the device itself exists.
pub async fn last_measurement(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeviceQuery>,
) -> ApiResult<Json<LastMeasurementResponse>> {
    let device = require_device(&state, query.device_name.as_deref())?;

    let store = state.store()?;
    let last = store.series().fetch_last(&device)?;

    let response = match last {
        Some(m) => LastMeasurementResponse {
            device_name: device,
            rec_count: 1,
            measurement_time: Some(m.measurement_time.format(FMT_MEASUREMENT_TIME).to_string()),
            temp_out: m.temp_out,
            temp_in: m.temp_in,
            humid: m.humid,
            pressure: m.pressure,
        },
        None => LastMeasurementResponse {
            device_name: device,
            rec_count: 0,
            measurement_time: None,
            temp_out: None,
            temp_in: None,
            humid: None,
            pressure: None,
        },
    };
    Ok(Json(response))
}
