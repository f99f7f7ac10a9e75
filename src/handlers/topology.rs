use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::commit::{commit, CommitSummary};
use crate::models::*;
use crate::topology::{
    self,
    cabling::{self, BomRow, ConnectionWorkbook},
    layout::{self, Diagram},
};
use crate::AppState;

use super::ApiError;

/// Compute the full preview for a topology request
pub async fn preview_topology(
    State(state): State<Arc<AppState>>,
    Json(config): Json<TopologyConfig>,
) -> Result<Json<TopologyPreview>, ApiError> {
    let defaults = state.store.get_defaults().await?;
    let preview = topology::preview(&config, &defaults)?;
    Ok(Json(preview))
}

/// Lay out a (possibly edited) preview for drawing
pub async fn topology_diagram(Json(preview): Json<TopologyPreview>) -> Json<Diagram> {
    Json(layout::layout_preview(&preview))
}

pub async fn topology_bom(Json(req): Json<CablingRequest>) -> Json<Vec<BomRow>> {
    Json(cabling::bill_of_materials(&req.preview, &req.port_assignments))
}

pub async fn topology_bom_csv(Json(req): Json<CablingRequest>) -> Result<Response, ApiError> {
    let rows = cabling::bill_of_materials(&req.preview, &req.port_assignments);
    Ok(csv_response(cabling::bom_csv(&rows)?, "bom.csv"))
}

pub async fn topology_cutsheet_csv(Json(req): Json<CablingRequest>) -> Result<Response, ApiError> {
    let runs = cabling::cable_runs(&req.preview, &req.port_assignments);
    Ok(csv_response(cabling::cutsheet_csv(&runs)?, "cutsheet.csv"))
}

pub async fn connection_sheets(Json(req): Json<CablingRequest>) -> Json<ConnectionWorkbook> {
    Json(cabling::connection_workbook(&req.preview, &req.port_assignments))
}

fn csv_response(body: String, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct BuildResponse {
    pub topology_name: String,
    pub device_count: usize,
    pub cable_count: usize,
    pub summary: CommitSummary,
}

/// Regenerate the topology, apply operator edits and commit it to the inventory
pub async fn build_topology(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TopologyBuildRequest>,
) -> Result<Json<BuildResponse>, ApiError> {
    let defaults = state.store.get_defaults().await?;
    let resolved = topology::resolve(&req.config, &defaults)?;
    let mut preview = topology::preview_resolved(&resolved)?;
    if let Some(overrides) = &req.overrides {
        preview = topology::apply_overrides(preview, &overrides.devices, &resolved)?;
    }

    let runs = cabling::cable_runs(&preview, &[]);
    let summary = commit(&state.store, &preview, resolved.datacenter_id, &runs).await;

    Ok(Json(BuildResponse {
        topology_name: preview.topology_name.clone(),
        device_count: preview.devices.len(),
        cable_count: runs.len(),
        summary,
    }))
}
