use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Build the application router with all routes
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::healthcheck))
        // Topology routes
        .route("/api/topology/preview", post(handlers::topology::preview_topology))
        .route("/api/topology/diagram", post(handlers::topology::topology_diagram))
        .route("/api/topology/bom", post(handlers::topology::topology_bom))
        .route("/api/topology/bom.csv", post(handlers::topology::topology_bom_csv))
        .route("/api/topology/cutsheet.csv", post(handlers::topology::topology_cutsheet_csv))
        .route("/api/topology/connection-sheets", post(handlers::topology::connection_sheets))
        .route("/api/topology/build", post(handlers::topology::build_topology))
        // Settings routes
        .route(
            "/api/settings/defaults",
            get(handlers::settings::get_defaults).put(handlers::settings::update_defaults),
        )
        // Inventory routes
        .route("/api/devices", get(handlers::devices::list_devices))
        .route("/api/devices/:hostname", get(handlers::devices::get_device))
        .route("/api/facility/halls", get(handlers::facility::list_halls))
        .route("/api/facility/racks", get(handlers::facility::list_racks))
        // Port assignment routes
        .route("/api/port-assignments", get(handlers::port_assignments::list_port_assignments))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
