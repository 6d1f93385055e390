//! Route handlers
//!
//! One module per resource, plus the boundary validation shared by the
//! device-scoped read endpoints. All input checking happens here; the
//! store and renderer below this layer assume validated input.

pub mod charts;
pub mod devices;
pub mod health;
pub mod measurements;
pub mod navigation;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::DEVICE_NAME_MAX;

/// Resolve the effective device name for a read request and require that
/// it is registered.
///
/// Falls back to the configured default device when the query carries no
/// name. Length is checked before touching the store.
pub(crate) fn require_device(state: &AppState, query_name: Option<&str>) -> ApiResult<String> {
    let name = query_name
        .unwrap_or(state.config.default_device.as_str())
        .to_string();
    if name.is_empty() || name.chars().count() > DEVICE_NAME_MAX {
        return Err(ApiError::Validation(format!(
            "device_name must be 1-{} characters",
            DEVICE_NAME_MAX
        )));
    }
    let store = state.store()?;
    if !state.devices.exists(&store, &name)? {
        return Err(ApiError::NotFound(format!("device '{}'", name)));
    }
    Ok(name)
}
