//! Chart Routes
//!
//! Render-and-encode endpoints for the three time windows.
//!
//! - GET /api/v1/charts/today - the current calendar day
//! - GET /api/v1/charts/month/:year_month - one calendar month
//! - GET /api/v1/charts/range - rolling window ending on a given day
//!
//! Responses carry the record count and a `data:image/png;base64,` URI;
//! an empty window reports `rec_count: 0` with no image.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{Local, NaiveDate};
use std::sync::Arc;

use crate::api::dto::{ChartQuery, ChartResponse, RangeChartQuery};
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::require_device;
use crate::api::state::AppState;
use crate::chart::{PhysicalSize, RenderOutcome};
use crate::range::{DateRangeSpec, RangeKind, ResolvedRange, FMT_ISO_DATE};
use crate::table::SeriesTable;

/// Window lengths accepted by the range endpoint
const VALID_BEFORE_DAYS: [i64; 4] = [1, 2, 3, 7];

/// GET /api/v1/charts/today
pub async fn today_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<Json<ChartResponse>> {
    let device = require_device(&state, query.device_name.as_deref())?;
    let size = parse_phone_size(query.phone_size.as_deref())?;

    let spec = DateRangeSpec::Today {
        reference_date: Local::now().date_naive(),
    };
    render_chart(&state, &device, spec, size)
}

/// GET /api/v1/charts/month/:year_month
pub async fn month_chart(
    State(state): State<Arc<AppState>>,
    Path(year_month): Path<String>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<Json<ChartResponse>> {
    let device = require_device(&state, query.device_name.as_deref())?;
    let size = parse_phone_size(query.phone_size.as_deref())?;
    let (year, month) = parse_year_month(&year_month)?;

    let spec = DateRangeSpec::YearMonth { year, month };
    render_chart(&state, &device, spec, size)
}

/// GET /api/v1/charts/range
pub async fn range_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeChartQuery>,
) -> ApiResult<Json<ChartResponse>> {
    let device = require_device(&state, query.device_name.as_deref())?;
    let size = parse_phone_size(query.phone_size.as_deref())?;

    if !VALID_BEFORE_DAYS.contains(&query.before_days) {
        return Err(ApiError::Validation(format!(
            "before_days must be one of {:?}",
            VALID_BEFORE_DAYS
        )));
    }
    let start_day = match query.start_day.as_deref() {
        Some(s) => parse_iso_date(s)?,
        None => Local::now().date_naive(),
    };

    let spec = DateRangeSpec::Range {
        start_day,
        before_days: query.before_days,
    };
    render_chart(&state, &device, spec, size)
}

/// Fetch the window, render it, and wrap the PNG in the JSON envelope.
fn render_chart(
    state: &AppState,
    device: &str,
    spec: DateRangeSpec,
    size: Option<PhysicalSize>,
) -> ApiResult<Json<ChartResponse>> {
    let range = spec
        .try_resolve()
        .ok_or_else(|| ApiError::Validation("unresolvable date range".to_string()))?;

    // Lock only for the query; rendering happens on the fetched table.
    let (table, range) = {
        let store = state.store()?;
        let table = store.series().fetch_resolved(device, &range)?;
        let range = pin_today(&range, &table);
        (table, range)
    };

    let rec_count = table.len();
    match state.renderer.render(&table, &range, size)? {
        RenderOutcome::Image(png) => Ok(Json(ChartResponse {
            rec_count,
            img_src: Some(format!("data:image/png;base64,{}", BASE64.encode(png))),
        })),
        RenderOutcome::NoData => Ok(Json(ChartResponse {
            rec_count: 0,
            img_src: None,
        })),
    }
}

/// Re-pin a today window to the day of its first sample.
fn pin_today(range: &ResolvedRange, table: &SeriesTable) -> ResolvedRange {
    if range.kind == RangeKind::Today {
        if let Some(first) = table.first_time() {
            return range.pin_to_sample_day(first);
        }
    }
    range.clone()
}

pub(crate) fn parse_phone_size(raw: Option<&str>) -> ApiResult<Option<PhysicalSize>> {
    match raw {
        None => Ok(None),
        Some(s) => s
            .parse::<PhysicalSize>()
            .map(Some)
            .map_err(|e| ApiError::Validation(format!("phone_size: {}", e))),
    }
}

pub(crate) fn parse_iso_date(s: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(s, FMT_ISO_DATE)
        .map_err(|_| ApiError::Validation(format!("expected YYYY-MM-DD, got '{}'", s)))
}

pub(crate) fn parse_year_month(s: &str) -> ApiResult<(i32, u32)> {
    let invalid = || ApiError::Validation(format!("expected YYYY-MM, got '{}'", s));
    let (y, m) = s.split_once('-').ok_or_else(invalid)?;
    if y.len() != 4 || m.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month: u32 = m.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}
