//! Device Routes
//!
//! - GET /api/v1/devices - list registered devices

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{DeviceDto, DeviceListResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/devices
///
/// Internal row ids stay internal; clients address devices by name.
pub async fn list_devices(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DeviceListResponse>> {
    let store = state.store()?;
    let devices = state.devices.list(&store)?;

    let devices: Vec<DeviceDto> = devices
        .into_iter()
        .map(|d| DeviceDto {
            name: d.name,
            description: d.description,
        })
        .collect();

    Ok(Json(DeviceListResponse {
        total: devices.len(),
        devices,
    }))
}
