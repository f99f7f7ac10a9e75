use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::models::*;
use crate::AppState;

use super::ApiError;

/// List committed devices
pub async fn list_devices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DeviceRecord>>, ApiError> {
    let devices = state.store.list_devices().await?;
    Ok(Json(devices))
}

/// Get a single committed device by hostname
pub async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(hostname): Path<String>,
) -> Result<Json<DeviceRecord>, ApiError> {
    let device = state.store.get_device_by_hostname(&hostname).await?;
    Ok(Json(device))
}
