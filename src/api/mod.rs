//! Stratus REST API
//!
//! HTTP API layer, built with Axum.
//!
//! # Endpoints
//!
//! ## Charts
//! - `GET /api/v1/charts/today` - chart for the current day
//! - `GET /api/v1/charts/month/:year_month` - chart for one calendar month
//! - `GET /api/v1/charts/range` - chart for a rolling window of days
//!
//! ## Devices
//! - `GET /api/v1/devices` - list registered devices
//!
//! ## Measurements
//! - `GET /api/v1/measurements/last` - latest reading for a device
//!
//! ## Navigation
//! - `GET /api/v1/navigation` - calendar buckets with data
//!
//! ## Health
//! - `GET /health/live` - liveness probe
//! - `GET /health/ready` - readiness probe
//! - `GET /health` - full health status

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{http::HeaderValue, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let timeout = TimeoutLayer::new(Duration::from_secs(state.config.request_timeout_secs));

    let api_routes = Router::new()
        .route("/charts/today", get(routes::charts::today_chart))
        .route("/charts/month/:year_month", get(routes::charts::month_chart))
        .route("/charts/range", get(routes::charts::range_chart))
        .route("/devices", get(routes::devices::list_devices))
        .route("/measurements/last", get(routes::measurements::last_measurement))
        .route("/navigation", get(routes::navigation::navigation));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .layer(cors)
        .with_state(shared_state)
}

/// CORS from config; an empty origin list means any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new().allow_origin(parsed).allow_methods(Any)
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartRenderer;
    use crate::config::{ApiConfig, PlotConfig};
    use crate::store::{DeviceDirectory, NewMeasurement, WeatherStore};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_test_app_with(|_, _| {})
    }

    /// Build a router over an in-memory store, after running `seed`
    /// against it.
    fn create_test_app_with(seed: impl FnOnce(&WeatherStore, &DeviceDirectory)) -> Router {
        let store = WeatherStore::open_in_memory().unwrap();
        let devices = DeviceDirectory::new();
        seed(&store, &devices);

        let state = AppState::new(
            Arc::new(Mutex::new(store)),
            Arc::new(devices),
            ChartRenderer::new(PlotConfig::default()),
            ApiConfig::default(),
        );
        build_router(state)
    }

    fn seed_device(store: &WeatherStore, devices: &DeviceDirectory, name: &str) -> i64 {
        devices.resolve_or_insert(store, name).unwrap()
    }

    fn seed_measurement(store: &WeatherStore, device_id: i64, y: i32, m: u32, d: u32) {
        let measurement_time = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        store
            .insert_measurement(&NewMeasurement {
                device_id,
                measurement_time,
                temp_out: Some(10.0),
                temp_in: Some(20.0),
                humid: Some(50.0),
                pressure: Some(1010.0),
            })
            .unwrap();
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app();
        let (status, _) = get(app, "/health/live").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let app = create_test_app();
        let (status, _) = get(app, "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app();
        let (status, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_list_devices() {
        let app = create_test_app_with(|store, devices| {
            seed_device(store, devices, "esp8266_1");
            seed_device(store, devices, "esp8266_2");
        });
        let (status, body) = get(app, "/api/v1/devices").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
    }

    #[tokio::test]
    async fn test_unknown_device_is_404() {
        let app = create_test_app();
        let (status, body) = get(app, "/api/v1/measurements/last?device_name=nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_overlong_device_name_is_400() {
        let app = create_test_app();
        let name = "x".repeat(21);
        let (status, _) = get(
            app,
            &format!("/api/v1/measurements/last?device_name={}", name),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_last_measurement_empty_device() {
        let app = create_test_app_with(|store, devices| {
            seed_device(store, devices, "esp8266_1");
        });
        let (status, body) = get(app, "/api/v1/measurements/last?device_name=esp8266_1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rec_count"], 0);
    }

    #[tokio::test]
    async fn test_last_measurement_with_data() {
        let app = create_test_app_with(|store, devices| {
            let id = seed_device(store, devices, "esp8266_1");
            seed_measurement(store, id, 2022, 11, 3);
            seed_measurement(store, id, 2022, 11, 4);
        });
        let (status, body) = get(app, "/api/v1/measurements/last?device_name=esp8266_1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rec_count"], 1);
        assert_eq!(body["measurement_time"], "2022-11-04 12:00");
    }

    #[tokio::test]
    async fn test_chart_with_no_data_reports_zero() {
        let app = create_test_app_with(|store, devices| {
            seed_device(store, devices, "esp8266_1");
        });
        let (status, body) = get(
            app,
            "/api/v1/charts/month/2022-11?device_name=esp8266_1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rec_count"], 0);
        assert!(body.get("img_src").is_none());
    }

    #[tokio::test]
    async fn test_chart_invalid_year_month() {
        let app = create_test_app_with(|store, devices| {
            seed_device(store, devices, "esp8266_1");
        });
        let (status, body) = get(
            app,
            "/api/v1/charts/month/2022-13?device_name=esp8266_1",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_range_chart_rejects_odd_window() {
        let app = create_test_app_with(|store, devices| {
            seed_device(store, devices, "esp8266_1");
        });
        let (status, _) = get(
            app,
            "/api/v1/charts/range?device_name=esp8266_1&before_days=5",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_range_chart_rejects_bad_phone_size() {
        let app = create_test_app_with(|store, devices| {
            seed_device(store, devices, "esp8266_1");
        });
        let (status, _) = get(
            app,
            "/api/v1/charts/range?device_name=esp8266_1&before_days=7&phone_size=bogus",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_navigation_buckets() {
        let app = create_test_app_with(|store, devices| {
            let id = seed_device(store, devices, "esp8266_1");
            seed_measurement(store, id, 2022, 10, 30);
            seed_measurement(store, id, 2022, 11, 3);
            seed_measurement(store, id, 2022, 11, 4);
        });
        let (status, body) = get(app, "/api/v1/navigation?device_name=esp8266_1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["first_day"], "2022-10-30");
        // Months newest first, days oldest first
        assert_eq!(body["months"][0], "2022-11");
        assert_eq!(body["months"][1], "2022-10");
        assert_eq!(body["days"][0], "2022-10-30");
    }
}
