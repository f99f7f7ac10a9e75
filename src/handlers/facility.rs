use axum::{extract::State, Json};
use std::sync::Arc;

use crate::models::*;
use crate::AppState;

use super::ApiError;

pub async fn list_halls(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HallRecord>>, ApiError> {
    let halls = state.store.list_halls().await?;
    Ok(Json(halls))
}

/// Committed racks with their row and hall names
pub async fn list_racks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RackRecord>>, ApiError> {
    let racks = state.store.list_racks().await?;
    Ok(Json(racks))
}
