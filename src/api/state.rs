//! Application State
//!
//! Shared state accessible by all API handlers. The SQLite connection is
//! not `Sync`, so the store sits behind a mutex; handlers hold it only for
//! the duration of one query.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::chart::ChartRenderer;
use crate::config::ApiConfig;
use crate::store::{DeviceDirectory, WeatherStore};

use super::error::{ApiError, ApiResult};

/// Shared application state for all handlers
pub struct AppState {
    /// Measurement store, serialized behind a mutex
    pub store: Arc<Mutex<WeatherStore>>,
    /// Device name -> id directory with insert-on-miss cache
    pub devices: Arc<DeviceDirectory>,
    /// Chart renderer configured from `[plot]`
    pub renderer: ChartRenderer,
    /// API configuration
    pub config: ApiConfig,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<Mutex<WeatherStore>>,
        devices: Arc<DeviceDirectory>,
        renderer: ChartRenderer,
        config: ApiConfig,
    ) -> Self {
        Self {
            store,
            devices,
            renderer,
            config,
            start_time: Instant::now(),
        }
    }

    /// Lock the store, mapping a poisoned mutex to a 503
    pub fn store(&self) -> ApiResult<std::sync::MutexGuard<'_, WeatherStore>> {
        self.store
            .lock()
            .map_err(|_| ApiError::ServiceUnavailable("store mutex poisoned".to_string()))
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
