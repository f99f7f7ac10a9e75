use serde::{Deserialize, Serialize};

use super::{Device, FabricLink, GpuCluster, GpuClusterSpec, Rack};

/// Fabric architecture style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Clos,
    Hierarchical,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Clos => "clos",
            Architecture::Hierarchical => "hierarchical",
        }
    }
}

/// TopologyConfig is the raw builder request. Tier 1/2/3 mean spine/leaf/- for
/// CLOS and core/distribution/access for hierarchical. Empty model strings
/// fall back to the facility defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub architecture: Architecture,
    #[serde(default)]
    pub topology_name: String,
    /// Vendor tag of the target platform; selects the interface naming style
    #[serde(default)]
    pub vendor: String,

    #[serde(default = "default_external_count")]
    pub external_count: usize,
    #[serde(default)]
    pub external_to_tier1_ratio: Option<usize>,
    #[serde(default)]
    pub external_names: Vec<String>,
    #[serde(default)]
    pub external_model: String,

    #[serde(default = "default_tier1_count")]
    pub tier1_count: usize,
    #[serde(default)]
    pub tier1_to_tier2_ratio: Option<usize>,
    #[serde(default)]
    pub tier1_model: String,

    #[serde(default = "default_tier2_count")]
    pub tier2_count: usize,
    #[serde(default)]
    pub tier2_to_tier3_ratio: Option<usize>,
    #[serde(default)]
    pub tier2_model: String,

    #[serde(default)]
    pub tier3_count: usize,
    #[serde(default)]
    pub tier3_model: String,

    // 5-stage CLOS
    #[serde(default)]
    pub super_spine_enabled: bool,
    #[serde(default = "default_super_spine_count")]
    pub super_spine_count: usize,
    #[serde(default)]
    pub super_spine_model: String,
    #[serde(default)]
    pub spine_to_super_spine_ratio: Option<usize>,
    #[serde(default = "default_one")]
    pub pods: usize,

    // Location
    #[serde(default)]
    pub region_id: Option<i64>,
    #[serde(default)]
    pub campus_id: Option<i64>,
    #[serde(default)]
    pub datacenter_id: Option<i64>,
    #[serde(default)]
    pub datacenter_name: String,
    #[serde(default)]
    pub region_name: String,

    // Facility shape
    #[serde(default = "default_one")]
    pub halls: usize,
    #[serde(default = "default_one")]
    pub rows_per_hall: usize,
    #[serde(default = "default_racks_per_row")]
    pub racks_per_row: usize,
    #[serde(default = "default_devices_per_rack")]
    pub devices_per_rack: usize,
    #[serde(default = "default_row_spacing")]
    pub row_spacing_cm: usize,
    #[serde(default = "default_rack_width")]
    pub rack_width_cm: usize,
    #[serde(default = "default_rack_height")]
    pub rack_height_ru: u32,
    #[serde(default = "default_rack_depth")]
    pub rack_depth_cm: usize,

    // Placement policy ("" | beginning | middle | end | <rack number>)
    #[serde(default)]
    pub tier1_placement: String,
    #[serde(default)]
    pub tier2_placement: String,
    #[serde(default)]
    pub tier3_placement: String,
    /// "" | bottom | middle | top
    #[serde(default)]
    pub ru_placement: String,
    #[serde(default = "default_true")]
    pub include_patch_panels: bool,

    // GPU clusters (flat form; `gpu_clusters` overrides when non-empty)
    #[serde(default)]
    pub gpu_cluster_count: usize,
    #[serde(default)]
    pub gpu_model: String,
    #[serde(default = "default_gpus_per_node")]
    pub gpus_per_node: usize,
    #[serde(default = "default_gpu_nodes_per_cluster")]
    pub gpu_nodes_per_cluster: usize,
    #[serde(default = "default_interconnect")]
    pub gpu_interconnect: String,
    #[serde(default = "default_gpu_uplinks")]
    pub gpu_uplinks_per_node: usize,
    #[serde(default = "default_true")]
    pub gpu_include_leaf_uplinks: bool,
    #[serde(default = "default_true")]
    pub gpu_include_fabric_cabling: bool,
    #[serde(default)]
    pub gpu_clusters: Vec<GpuClusterSpec>,

    // Management switches
    #[serde(default)]
    pub mgmt_switch_model: String,
    /// per-row | per-rack | per-hall | count-per-row | none
    #[serde(default = "default_mgmt_distribution")]
    pub mgmt_switch_distribution: String,
    #[serde(default = "default_one")]
    pub mgmt_switches_per_row: usize,
}

fn default_external_count() -> usize { 2 }
fn default_tier1_count() -> usize { 2 }
fn default_tier2_count() -> usize { 16 }
fn default_super_spine_count() -> usize { 2 }
fn default_one() -> usize { 1 }
fn default_racks_per_row() -> usize { 8 }
fn default_devices_per_rack() -> usize { 2 }
fn default_row_spacing() -> usize { 120 } // 120cm (~4 feet) between rows
fn default_rack_width() -> usize { 60 }
fn default_rack_height() -> u32 { 42 }
fn default_rack_depth() -> usize { 100 }
fn default_true() -> bool { true }
fn default_gpus_per_node() -> usize { 8 }
fn default_gpu_nodes_per_cluster() -> usize { 8 }
fn default_interconnect() -> String { "InfiniBand".to_string() }
fn default_gpu_uplinks() -> usize { 2 }
fn default_mgmt_distribution() -> String { "per-row".to_string() }

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            architecture: Architecture::Clos,
            topology_name: String::new(),
            vendor: String::new(),
            external_count: default_external_count(),
            external_to_tier1_ratio: None,
            external_names: Vec::new(),
            external_model: String::new(),
            tier1_count: default_tier1_count(),
            tier1_to_tier2_ratio: None,
            tier1_model: String::new(),
            tier2_count: default_tier2_count(),
            tier2_to_tier3_ratio: None,
            tier2_model: String::new(),
            tier3_count: 0,
            tier3_model: String::new(),
            super_spine_enabled: false,
            super_spine_count: default_super_spine_count(),
            super_spine_model: String::new(),
            spine_to_super_spine_ratio: None,
            pods: default_one(),
            region_id: None,
            campus_id: None,
            datacenter_id: None,
            datacenter_name: String::new(),
            region_name: String::new(),
            halls: default_one(),
            rows_per_hall: default_one(),
            racks_per_row: default_racks_per_row(),
            devices_per_rack: default_devices_per_rack(),
            row_spacing_cm: default_row_spacing(),
            rack_width_cm: default_rack_width(),
            rack_height_ru: default_rack_height(),
            rack_depth_cm: default_rack_depth(),
            tier1_placement: String::new(),
            tier2_placement: String::new(),
            tier3_placement: String::new(),
            ru_placement: String::new(),
            include_patch_panels: true,
            gpu_cluster_count: 0,
            gpu_model: String::new(),
            gpus_per_node: default_gpus_per_node(),
            gpu_nodes_per_cluster: default_gpu_nodes_per_cluster(),
            gpu_interconnect: default_interconnect(),
            gpu_uplinks_per_node: default_gpu_uplinks(),
            gpu_include_leaf_uplinks: true,
            gpu_include_fabric_cabling: true,
            gpu_clusters: Vec::new(),
            mgmt_switch_model: String::new(),
            mgmt_switch_distribution: default_mgmt_distribution(),
            mgmt_switches_per_row: default_one(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Topology Preview types — read-only computation of what a build will produce
// ─────────────────────────────────────────────────────────────────────────────

/// TopologyPreview is the full generated plan handed to layout, cabling and commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyPreview {
    pub architecture: Architecture,
    pub topology_name: String,
    pub devices: Vec<Device>,
    pub fabric_links: Vec<FabricLink>,
    pub racks: Vec<Rack>,
    #[serde(default)]
    pub gpu_clusters: Vec<GpuCluster>,
    #[serde(default)]
    pub tier1_placement: String,
    #[serde(default)]
    pub tier2_placement: String,
    #[serde(default)]
    pub tier3_placement: String,
    #[serde(default)]
    pub ru_placement: String,
}

impl TopologyPreview {
    pub fn device(&self, hostname: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.hostname == hostname)
    }

    /// Every link in the plan: tier links, then per-cluster GPU uplinks and fabric mesh
    pub fn all_links(&self) -> impl Iterator<Item = &FabricLink> {
        self.fabric_links.iter().chain(
            self.gpu_clusters
                .iter()
                .flat_map(|c| c.leaf_uplink_links.iter().chain(c.fabric_links.iter())),
        )
    }
}

/// Request to build a topology with optional operator edits from a preview
#[derive(Debug, Clone, Deserialize)]
pub struct TopologyBuildRequest {
    #[serde(flatten)]
    pub config: TopologyConfig,
    #[serde(default)]
    pub overrides: Option<TopologyOverrides>,
}

/// Edited preview devices keyed by `index`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopologyOverrides {
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_minimal_json() {
        let cfg: TopologyConfig = serde_json::from_str(r#"{"architecture": "clos"}"#).unwrap();
        assert_eq!(cfg.architecture, Architecture::Clos);
        assert_eq!(cfg.tier1_count, 2);
        assert_eq!(cfg.tier2_count, 16);
        assert_eq!(cfg.tier1_to_tier2_ratio, None);
        assert_eq!(cfg.rack_height_ru, 42);
        assert!(cfg.include_patch_panels);
        assert_eq!(cfg.mgmt_switch_distribution, "per-row");
    }

    #[test]
    fn test_architecture_is_required() {
        let res: Result<TopologyConfig, _> = serde_json::from_str(r#"{"tier1_count": 4}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_unknown_architecture_rejected() {
        let res: Result<TopologyConfig, _> = serde_json::from_str(r#"{"architecture": "mesh"}"#);
        assert!(res.is_err());
    }
}
