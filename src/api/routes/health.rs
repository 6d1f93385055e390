//! Health Routes
//!
//! - GET /health/live - liveness probe (process is alive)
//! - GET /health/ready - readiness probe (store is reachable)
//! - GET /health - full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Returns 200 once the store answers a trivial query.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if check_store_health(&state) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store_ok = check_store_health(&state);

    Json(HealthResponse {
        status: if store_ok { "healthy" } else { "unhealthy" }.to_string(),
        store: if store_ok { "ok" } else { "error" }.to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn check_store_health(state: &AppState) -> bool {
    match state.store() {
        Ok(store) => state.devices.list(&store).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }
}
