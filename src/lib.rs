//! # Stratus
//!
//! Home weather-station chart service. Sensor boards broadcast readings
//! over UDP; Stratus stores them in SQLite and serves three-panel
//! (temperature / humidity / pressure) PNG charts over HTTP.
//!
//! ## Modules
//!
//! - [`store`]: SQLite-backed measurement store and device directory
//! - [`range`]: time-window resolution and localized chart titles
//! - [`table`]: the tabular seam between queries and the renderer
//! - [`chart`]: three-panel chart rendering and device-aware sizing
//! - [`api`]: REST API server with Axum
//! - [`ingest`]: UDP listener for sensor datagrams
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stratus::api::{serve, AppState};
//! use stratus::chart::ChartRenderer;
//! use stratus::config::Config;
//! use stratus::store::{DeviceDirectory, WeatherStore};
//! use std::path::Path;
//! use std::sync::{Arc, Mutex};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let store = Arc::new(Mutex::new(WeatherStore::open(Path::new(&config.database.path))?));
//!     let devices = Arc::new(DeviceDirectory::new());
//!     let renderer = ChartRenderer::new(config.plot.clone());
//!
//!     let state = AppState::new(store, devices, renderer, config.api.clone());
//!     serve(state).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod ingest;
pub mod range;
pub mod store;
pub mod table;

// Re-export top-level types for convenience
pub use store::{
    Device, DeviceDirectory, Measurement, NewMeasurement, SeriesLoader, StoreError, StoreResult,
    WeatherStore,
};

pub use range::{DateRangeSpec, RangeKind, ResolvedRange};

pub use table::{SeriesRow, SeriesTable};

pub use chart::{ChartError, ChartRenderer, ChartResult, PhysicalSize, RenderOutcome};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::Config;
