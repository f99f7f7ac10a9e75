use axum::{
    extract::State,
    Json,
};
use std::sync::Arc;

use crate::models::*;
use crate::topology::naming::check_hostname_pattern;
use crate::AppState;

use super::ApiError;

/// Get the facility defaults
pub async fn get_defaults(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FacilityDefaults>, ApiError> {
    let defaults = state.store.get_defaults().await?;
    Ok(Json(defaults))
}

/// Replace the facility defaults
pub async fn update_defaults(
    State(state): State<Arc<AppState>>,
    Json(defaults): Json<FacilityDefaults>,
) -> Result<Json<FacilityDefaults>, ApiError> {
    check_hostname_pattern(&defaults.hostname_pattern)?;
    if defaults.cable_slack_percent < 0 {
        return Err(ApiError::bad_request("cable_slack_percent must not be negative"));
    }
    state.store.update_defaults(&defaults).await?;
    tracing::info!("Facility defaults updated");
    Ok(Json(defaults))
}
