//! Navigation Routes
//!
//! - GET /api/v1/navigation - calendar buckets with data
//!
//! Backs the client's month/day pickers: only buckets that actually hold
//! readings are offered, so every pick renders a non-empty chart.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::api::dto::{DeviceQuery, NavigationResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::require_device;
use crate::api::state::AppState;
use crate::range::FMT_ISO_DATE;

/// GET /api/v1/navigation
pub async fn navigation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeviceQuery>,
) -> ApiResult<Json<NavigationResponse>> {
    let device = require_device(&state, query.device_name.as_deref())?;
    let since = navigation_start(&state)?;

    let store = state.store()?;
    let loader = store.series();
    let first_day = loader.first_day(&device)?;
    let months = loader.group_by_month(&device, since)?;
    let days = loader.group_by_day(&device, since)?;

    Ok(Json(NavigationResponse {
        device_name: device,
        first_day: first_day.map(|d| d.format(FMT_ISO_DATE).to_string()),
        months,
        days: days
            .into_iter()
            .map(|d| d.format(FMT_ISO_DATE).to_string())
            .collect(),
    }))
}

fn navigation_start(state: &AppState) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(&state.config.navigation_start, FMT_ISO_DATE).map_err(|_| {
        ApiError::Internal(format!(
            "invalid navigation_start in config: '{}'",
            state.config.navigation_start
        ))
    })
}
