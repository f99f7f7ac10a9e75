use axum::{
    extract::State,
    Json,
};
use std::sync::Arc;

use crate::models::*;
use crate::AppState;

use super::ApiError;

/// List every recorded cable end, keyed by hostname. Feed the result back
/// as `port_assignments` on the BOM, cutsheet and connection sheet requests.
pub async fn list_port_assignments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PortAssignment>>, ApiError> {
    let assignments = state.store.list_port_assignments().await?;
    Ok(Json(assignments))
}
