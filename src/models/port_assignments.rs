use serde::{Deserialize, Serialize};

/// PortAssignment is a live per-device port connection, keyed by hostname.
/// The same cable may be reported from both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortAssignment {
    pub device: String,
    pub port_name: String,
    pub remote_device: String,
    pub remote_port_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_panel_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_panel_a_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_panel_b: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_panel_b_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cable_length_meters: Option<f64>,
}

/// Request body for BOM, cutsheet and connection sheet endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct CablingRequest {
    pub preview: super::TopologyPreview,
    #[serde(default)]
    pub port_assignments: Vec<PortAssignment>,
}
