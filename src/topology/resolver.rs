use std::collections::HashSet;

use crate::models::{Architecture, FacilityDefaults, Interconnect, TopologyConfig};

use super::error::ConfigError;
use super::generator::{GpuClusterPlan, GpuPlan, MgmtDistribution, MgmtPlan, TierPlan};
use super::naming::{check_hostname_pattern, InterfaceStyle, CLOS_LOOPBACK_POOL, CLOS_P2P_POOL, MGMT_POOL};
use super::placement::{FacilityShape, PlacementPolicy, RackPlacement, RuPlacement};

/// Links per device pair when a ratio is left unset
pub const DEFAULT_LINKS_PER_PAIR: usize = 2;

/// Rack positions (device and network racks) a facility may span
pub const MAX_RACK_SLOTS: usize = 20_000;
pub const MAX_RACK_HEIGHT_RU: u32 = 64;
const MAX_GPU_CLUSTERS: usize = 256;
/// Largest cluster that may be cabled as a full mesh
const MAX_GPU_MESH_NODES: usize = 1024;

/// A topology request with every default applied and every input validated
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub architecture: Architecture,
    pub topology_name: String,
    pub interface_style: InterfaceStyle,
    pub hostname_pattern: String,
    pub datacenter_name: String,
    pub region_name: String,
    pub region_id: Option<i64>,
    pub campus_id: Option<i64>,
    pub datacenter_id: Option<i64>,

    pub externals: TierPlan,
    pub external_names: Vec<String>,
    /// Present only for 5-stage CLOS
    pub super_spines: Option<TierPlan>,
    /// Spine (CLOS) or core (hierarchical); per pod for CLOS
    pub tier1: TierPlan,
    /// Leaf (CLOS) or distribution (hierarchical); per pod for CLOS
    pub tier2: TierPlan,
    /// Access (hierarchical only)
    pub tier3: TierPlan,
    pub pods: usize,

    pub external_ratio: usize,
    pub super_spine_ratio: usize,
    pub tier1_ratio: usize,
    pub tier2_ratio: usize,

    pub gpu: GpuPlan,
    pub mgmt: MgmtPlan,
    pub facility: FacilityShape,
    pub placement: PlacementPolicy,
    pub placement_labels: PlacementLabels,
    pub cable_slack_percent: i32,
}

/// Placement fields echoed back on the preview as given
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlacementLabels {
    pub tier1: String,
    pub tier2: String,
    pub tier3: String,
    pub ru: String,
}

impl ResolvedConfig {
    pub fn gpu_node_count(&self) -> usize {
        self.gpu.node_count()
    }

    /// Point-to-point links that consume a /31
    pub fn p2p_link_count(&self) -> usize {
        let gpu = if self.gpu.leaf_uplinks {
            self.gpu_node_count().saturating_mul(self.gpu.uplinks_per_node)
        } else {
            0
        };
        let tiers = match self.architecture {
            Architecture::Clos => {
                let spines = self.tier1.count.saturating_mul(self.pods);
                let spine_leaf = self.tier1.count
                    .saturating_mul(self.tier2.count)
                    .saturating_mul(self.tier1_ratio)
                    .saturating_mul(self.pods);
                let super_spine = self.super_spines.as_ref().map_or(0, |ss| {
                    ss.count.saturating_mul(spines).saturating_mul(self.super_spine_ratio)
                });
                let external = self.externals.count
                    .saturating_mul(spines)
                    .saturating_mul(self.external_ratio);
                spine_leaf.saturating_add(super_spine).saturating_add(external)
            }
            Architecture::Hierarchical => {
                let dist_access = self.tier2.count
                    .saturating_mul(self.tier3.count)
                    .saturating_mul(self.tier2_ratio);
                let core_dist = self.tier1.count
                    .saturating_mul(self.tier2.count)
                    .saturating_mul(self.tier1_ratio);
                dist_access.saturating_add(core_dist)
            }
        };
        tiers.saturating_add(gpu)
    }

    /// Devices that take a loopback
    pub fn routed_device_count(&self) -> usize {
        let ss = self.super_spines.as_ref().map_or(0, |s| s.count);
        let per_pod = self.tier1.count.saturating_add(self.tier2.count).saturating_mul(self.pods);
        self.externals.count
            .saturating_add(ss)
            .saturating_add(per_pod)
            .saturating_add(self.tier3.count)
    }

    pub fn mgmt_switch_count(&self) -> usize {
        let f = &self.facility;
        match self.mgmt.distribution {
            MgmtDistribution::None => 0,
            MgmtDistribution::PerHall => f.halls,
            MgmtDistribution::PerRow => f.row_count(),
            MgmtDistribution::PerRack => f.row_count().saturating_mul(f.rack_slots_per_row()),
            MgmtDistribution::CountPerRow(n) => f.row_count().saturating_mul(n),
        }
    }
}

/// Normalize a raw request against the facility defaults and validate it.
/// The rack capacity check runs here, before anything is generated.
pub fn resolve(config: &TopologyConfig, defaults: &FacilityDefaults) -> Result<ResolvedConfig, ConfigError> {
    // ── 1. Facility shape ──
    for (value, field) in [
        (config.halls, "halls"),
        (config.rows_per_hall, "rows_per_hall"),
        (config.racks_per_row, "racks_per_row"),
        (config.devices_per_rack, "devices_per_rack"),
    ] {
        if value == 0 {
            return Err(ConfigError::invalid(format!("{} must be at least 1", field)));
        }
    }
    if config.rack_height_ru == 0 || config.rack_height_ru > MAX_RACK_HEIGHT_RU {
        return Err(ConfigError::invalid(format!(
            "rack_height_ru must be between 1 and {}",
            MAX_RACK_HEIGHT_RU
        )));
    }
    if config.devices_per_rack > config.rack_height_ru as usize {
        return Err(ConfigError::invalid(format!(
            "devices_per_rack {} exceeds the {} RU rack height",
            config.devices_per_rack, config.rack_height_ru
        )));
    }
    let rack_slots = config
        .halls
        .checked_mul(config.rows_per_hall)
        .zip(config.racks_per_row.checked_add(1))
        .and_then(|(rows, per_row)| rows.checked_mul(per_row));
    if !rack_slots.is_some_and(|slots| slots <= MAX_RACK_SLOTS) {
        return Err(ConfigError::invalid(format!(
            "facility of {} halls × {} rows × {} racks exceeds {} rack positions",
            config.halls, config.rows_per_hall, config.racks_per_row, MAX_RACK_SLOTS
        )));
    }
    let facility = FacilityShape {
        halls: config.halls,
        rows_per_hall: config.rows_per_hall,
        racks_per_row: config.racks_per_row,
        devices_per_rack: config.devices_per_rack,
        row_spacing_cm: config.row_spacing_cm,
        rack_width_cm: config.rack_width_cm,
        rack_height_ru: config.rack_height_ru,
        rack_depth_cm: config.rack_depth_cm,
    };

    // ── 2. Tiers ──
    let empty_tier = TierPlan { count: 0, model: String::new() };
    let (externals, super_spines, tier1, tier2, tier3, pods) = match config.architecture {
        Architecture::Clos => {
            let super_spines = if config.super_spine_enabled {
                if config.super_spine_count == 0 {
                    return Err(ConfigError::invalid("super-spine enabled with zero super-spines"));
                }
                if config.pods == 0 {
                    return Err(ConfigError::invalid("super-spine enabled with zero pods"));
                }
                Some(TierPlan {
                    count: config.super_spine_count,
                    model: pick_model(&config.super_spine_model, &defaults.super_spine_model),
                })
            } else {
                None
            };
            let pods = if super_spines.is_some() { config.pods } else { 1 };
            if config.tier2_count == 0 && config.tier1_count > 0 {
                return Err(ConfigError::invalid("a CLOS fabric with spines needs at least one leaf"));
            }
            (
                TierPlan {
                    count: config.external_count,
                    model: pick_model(&config.external_model, &defaults.external_model),
                },
                super_spines,
                TierPlan {
                    count: config.tier1_count,
                    model: pick_model(&config.tier1_model, &defaults.spine_model),
                },
                TierPlan {
                    count: config.tier2_count,
                    model: pick_model(&config.tier2_model, &defaults.leaf_model),
                },
                empty_tier,
                pods,
            )
        }
        Architecture::Hierarchical => {
            if config.tier3_count == 0 && config.tier2_count > 0 {
                return Err(ConfigError::invalid(
                    "a hierarchical fabric with distribution switches needs at least one access switch",
                ));
            }
            (
                empty_tier.clone(),
                None,
                TierPlan {
                    count: config.tier1_count,
                    model: pick_model(&config.tier1_model, &defaults.core_model),
                },
                TierPlan {
                    count: config.tier2_count,
                    model: pick_model(&config.tier2_model, &defaults.spine_model),
                },
                TierPlan {
                    count: config.tier3_count,
                    model: pick_model(&config.tier3_model, &defaults.leaf_model),
                },
                1,
            )
        }
    };

    let ss_count = super_spines.as_ref().map_or(0, |s| s.count);
    let external_ratio = ratio(config.external_to_tier1_ratio, externals.count, tier1.count, "external_to_tier1")?;
    let super_spine_ratio = ratio(config.spine_to_super_spine_ratio, ss_count, tier1.count, "spine_to_super_spine")?;
    let tier1_ratio = ratio(config.tier1_to_tier2_ratio, tier1.count, tier2.count, "tier1_to_tier2")?;
    let tier2_ratio = match config.architecture {
        Architecture::Clos => config.tier2_to_tier3_ratio.unwrap_or(DEFAULT_LINKS_PER_PAIR),
        Architecture::Hierarchical => ratio(config.tier2_to_tier3_ratio, tier2.count, tier3.count, "tier2_to_tier3")?,
    };

    // ── 3. Rack capacity gate ──
    let (required, noun) = match config.architecture {
        Architecture::Clos => (
            tier2.count
                .checked_mul(pods)
                .ok_or_else(|| ConfigError::invalid("tier2_count × pods overflows"))?,
            "leaves",
        ),
        Architecture::Hierarchical => (tier3.count, "access switches"),
    };
    let capacity = facility.edge_capacity();
    if required > capacity {
        return Err(ConfigError::Capacity {
            required,
            noun,
            racks: facility.device_rack_count(),
            per_rack: facility.devices_per_rack,
            capacity,
        });
    }

    // ── 4. GPU clusters ──
    if config.gpu_clusters.is_empty() && config.gpu_cluster_count > MAX_GPU_CLUSTERS {
        return Err(ConfigError::invalid(format!(
            "gpu_cluster_count must be at most {}",
            MAX_GPU_CLUSTERS
        )));
    }
    let gpu = GpuPlan {
        clusters: resolve_gpu_clusters(config, defaults)?,
        uplinks_per_node: config.gpu_uplinks_per_node,
        leaf_uplinks: config.gpu_include_leaf_uplinks,
        fabric_cabling: config.gpu_include_fabric_cabling,
    };
    if gpu.fabric_cabling {
        if let Some(c) = gpu.clusters.iter().find(|c| c.node_count > MAX_GPU_MESH_NODES) {
            return Err(ConfigError::invalid(format!(
                "{} has {} nodes; a full-mesh GPU fabric allows at most {}",
                c.name, c.node_count, MAX_GPU_MESH_NODES
            )));
        }
    }
    let gpu_nodes = gpu.node_count();
    if gpu_nodes > 0 && required == 0 {
        return Err(ConfigError::invalid(format!(
            "GPU nodes need at least one {} to attach to",
            if noun == "leaves" { "leaf" } else { "access switch" }
        )));
    }

    // ── 5. Management switches ──
    let distribution = MgmtDistribution::parse(&config.mgmt_switch_distribution, config.mgmt_switches_per_row)
        .ok_or_else(|| {
            ConfigError::invalid(format!(
                "unknown mgmt_switch_distribution '{}'",
                config.mgmt_switch_distribution
            ))
        })?;
    if distribution == MgmtDistribution::CountPerRow(0) {
        return Err(ConfigError::invalid("count-per-row needs at least one switch per row"));
    }
    let mgmt = MgmtPlan {
        model: pick_model(&config.mgmt_switch_model, &defaults.mgmt_switch_model),
        distribution,
    };

    // ── 6. Placement policy ──
    let tier1_placement = parse_rack_placement(&config.tier1_placement, "tier1_placement")?;
    let tier2_placement = parse_rack_placement(&config.tier2_placement, "tier2_placement")?;
    let tier3_placement = parse_rack_placement(&config.tier3_placement, "tier3_placement")?;
    let ru = RuPlacement::parse(&config.ru_placement)
        .ok_or_else(|| ConfigError::invalid(format!("unknown ru_placement '{}'", config.ru_placement)))?;
    let (network_rack, edge_fill) = match config.architecture {
        Architecture::Clos => (tier1_placement, tier2_placement),
        Architecture::Hierarchical => (tier2_placement, tier3_placement),
    };
    let datacenter_name = config.datacenter_name.trim().to_string();
    let placement = PlacementPolicy {
        network_rack,
        edge_fill,
        ru,
        patch_panels: config.include_patch_panels,
        patch_panel_model: defaults.patch_panel_model.clone(),
        datacenter_name: datacenter_name.clone(),
    };

    // ── 7. Hostnames ──
    check_hostname_pattern(&defaults.hostname_pattern)?;
    let mut named = HashSet::new();
    for name in config.external_names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if !named.insert(name) {
            return Err(ConfigError::invalid(format!("external name {} is given twice", name)));
        }
    }

    let resolved = ResolvedConfig {
        architecture: config.architecture,
        topology_name: config.topology_name.trim().to_string(),
        interface_style: InterfaceStyle::for_vendor(&config.vendor),
        hostname_pattern: defaults.hostname_pattern.clone(),
        datacenter_name,
        region_name: config.region_name.trim().to_string(),
        region_id: config.region_id,
        campus_id: config.campus_id,
        datacenter_id: config.datacenter_id,
        externals,
        external_names: config.external_names.clone(),
        super_spines,
        tier1,
        tier2,
        tier3,
        pods,
        external_ratio,
        super_spine_ratio,
        tier1_ratio,
        tier2_ratio,
        gpu,
        mgmt,
        facility,
        placement,
        placement_labels: PlacementLabels {
            tier1: config.tier1_placement.clone(),
            tier2: config.tier2_placement.clone(),
            tier3: config.tier3_placement.clone(),
            ru: config.ru_placement.clone(),
        },
        cable_slack_percent: defaults.cable_slack_percent,
    };

    // ── 8. Address pools ──
    let p2p_available = CLOS_P2P_POOL.remaining() / 2;
    if resolved.p2p_link_count() > p2p_available {
        return Err(ConfigError::invalid(format!(
            "plan needs {} point-to-point links but the address pool holds {}",
            resolved.p2p_link_count(),
            p2p_available
        )));
    }
    if resolved.routed_device_count() > CLOS_LOOPBACK_POOL.remaining() {
        return Err(ConfigError::invalid(format!(
            "plan needs {} loopbacks but the address pool holds {}",
            resolved.routed_device_count(),
            CLOS_LOOPBACK_POOL.remaining()
        )));
    }
    let managed = resolved
        .routed_device_count()
        .saturating_add(gpu_nodes)
        .saturating_add(resolved.mgmt_switch_count());
    if managed > MGMT_POOL.remaining() {
        return Err(ConfigError::invalid(format!(
            "plan needs {} management addresses but the address pool holds {}",
            managed,
            MGMT_POOL.remaining()
        )));
    }

    Ok(resolved)
}

fn pick_model(requested: &str, fallback: &str) -> String {
    let requested = requested.trim();
    if requested.is_empty() {
        fallback.to_string()
    } else {
        requested.to_string()
    }
}

/// Unset ratios default to two links; zero is only allowed when a side is empty
fn ratio(value: Option<usize>, upper: usize, lower: usize, name: &str) -> Result<usize, ConfigError> {
    let r = value.unwrap_or(DEFAULT_LINKS_PER_PAIR);
    if r == 0 && upper > 0 && lower > 0 {
        return Err(ConfigError::invalid(format!("{}_ratio must be at least 1", name)));
    }
    Ok(r)
}

fn parse_rack_placement(value: &str, field: &str) -> Result<RackPlacement, ConfigError> {
    RackPlacement::parse(value).ok_or_else(|| ConfigError::invalid(format!("unknown {} '{}'", field, value)))
}

fn parse_interconnect(value: &str) -> Result<Interconnect, ConfigError> {
    Interconnect::parse(value).ok_or_else(|| ConfigError::invalid(format!("unknown GPU interconnect '{}'", value)))
}

/// Expand the flat GPU fields, or the per-cluster list when given
fn resolve_gpu_clusters(
    config: &TopologyConfig,
    defaults: &FacilityDefaults,
) -> Result<Vec<GpuClusterPlan>, ConfigError> {
    let flat_model = pick_model(&config.gpu_model, &defaults.gpu_model);

    if config.gpu_clusters.is_empty() {
        if config.gpu_cluster_count == 0 {
            return Ok(Vec::new());
        }
        let interconnect = parse_interconnect(&config.gpu_interconnect)?;
        return Ok((1..=config.gpu_cluster_count)
            .map(|i| GpuClusterPlan {
                name: format!("gpu-cluster-{}", i),
                gpu_model: flat_model.clone(),
                node_count: config.gpu_nodes_per_cluster,
                gpus_per_node: config.gpus_per_node,
                interconnect,
            })
            .collect());
    }

    config
        .gpu_clusters
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let interconnect = match &spec.interconnect {
                Some(s) => parse_interconnect(s)?,
                None => parse_interconnect(&config.gpu_interconnect)?,
            };
            let name = spec.name.trim();
            Ok(GpuClusterPlan {
                name: if name.is_empty() {
                    format!("gpu-cluster-{}", i + 1)
                } else {
                    name.to_string()
                },
                gpu_model: spec
                    .gpu_model
                    .as_deref()
                    .map(|m| pick_model(m, &flat_model))
                    .unwrap_or_else(|| flat_model.clone()),
                node_count: spec.node_count.unwrap_or(config.gpu_nodes_per_cluster),
                gpus_per_node: spec.gpus_per_node.unwrap_or(config.gpus_per_node),
                interconnect,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GpuClusterSpec;

    fn defaults() -> FacilityDefaults {
        FacilityDefaults::default()
    }

    fn invalid(cfg: &TopologyConfig) -> String {
        match resolve(cfg, &defaults()) {
            Err(ConfigError::Invalid(msg)) => msg,
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_capacity_gate() {
        let cfg = TopologyConfig {
            halls: 1,
            rows_per_hall: 1,
            racks_per_row: 2,
            devices_per_rack: 1,
            tier2_count: 3,
            ..Default::default()
        };
        let err = resolve(&cfg, &defaults()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Not enough racks for 3 leaves: 2 racks × 1 devices/rack = 2 capacity"
        );
    }

    #[test]
    fn test_oversized_facility_rejected_without_overflow() {
        let cfg = TopologyConfig {
            halls: usize::MAX,
            rows_per_hall: 2,
            ..Default::default()
        };
        assert!(invalid(&cfg).contains("rack positions"));

        let cfg = TopologyConfig {
            halls: 100,
            rows_per_hall: 100,
            ..Default::default()
        };
        assert!(invalid(&cfg).contains("exceeds 20000 rack positions"));
    }

    #[test]
    fn test_leaf_total_overflow_rejected() {
        let cfg = TopologyConfig {
            super_spine_enabled: true,
            pods: usize::MAX,
            ..Default::default()
        };
        assert_eq!(invalid(&cfg), "tier2_count × pods overflows");
    }

    #[test]
    fn test_rack_height_bounds() {
        for height in [0, MAX_RACK_HEIGHT_RU + 1] {
            let cfg = TopologyConfig {
                rack_height_ru: height,
                ..Default::default()
            };
            assert_eq!(invalid(&cfg), "rack_height_ru must be between 1 and 64");
        }
        let cfg = TopologyConfig {
            devices_per_rack: 43,
            ..Default::default()
        };
        assert_eq!(invalid(&cfg), "devices_per_rack 43 exceeds the 42 RU rack height");
    }

    #[test]
    fn test_gpu_bounds() {
        let cfg = TopologyConfig {
            gpu_cluster_count: 1_000,
            ..Default::default()
        };
        assert_eq!(invalid(&cfg), "gpu_cluster_count must be at most 256");

        let cfg = TopologyConfig {
            gpu_cluster_count: 1,
            gpu_nodes_per_cluster: 5_000,
            ..Default::default()
        };
        assert!(invalid(&cfg).starts_with("gpu-cluster-1 has 5000 nodes"));
    }

    #[test]
    fn test_hostname_pattern_needs_ordinal() {
        let defaults = FacilityDefaults {
            hostname_pattern: "$datacenter-$role".to_string(),
            ..FacilityDefaults::default()
        };
        match resolve(&TopologyConfig::default(), &defaults) {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("no '#' ordinal")),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_external_name_rejected() {
        let cfg = TopologyConfig {
            external_names: vec!["edge-a".to_string(), " edge-a ".to_string()],
            ..Default::default()
        };
        assert_eq!(invalid(&cfg), "external name edge-a is given twice");
    }

    #[test]
    fn test_capacity_gate_counts_pods() {
        let cfg = TopologyConfig {
            tier2_count: 2,
            super_spine_enabled: true,
            pods: 2,
            racks_per_row: 1,
            devices_per_rack: 3,
            ..Default::default()
        };
        assert!(matches!(
            resolve(&cfg, &defaults()),
            Err(ConfigError::Capacity { required: 4, capacity: 3, .. })
        ));
    }

    #[test]
    fn test_capacity_gate_hierarchical_wording() {
        let cfg = TopologyConfig {
            architecture: Architecture::Hierarchical,
            tier3_count: 5,
            racks_per_row: 2,
            ..Default::default()
        };
        let err = resolve(&cfg, &defaults()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Not enough racks for 5 access switches: 2 racks × 2 devices/rack = 4 capacity"
        );
    }

    #[test]
    fn test_models_default_per_architecture() {
        let clos = resolve(&TopologyConfig::default(), &defaults()).unwrap();
        assert_eq!(clos.tier1.model, "7050CX3-32S");
        assert_eq!(clos.tier2.model, "7050SX3-48YC8");
        assert_eq!(clos.externals.model, "7280R3");

        let hier = resolve(
            &TopologyConfig {
                architecture: Architecture::Hierarchical,
                tier3_count: 4,
                tier2_model: "custom-dist".to_string(),
                ..Default::default()
            },
            &defaults(),
        )
        .unwrap();
        assert_eq!(hier.tier1.model, "7280R3");
        assert_eq!(hier.tier2.model, "custom-dist");
        assert_eq!(hier.tier3.model, "7050SX3-48YC8");
        assert_eq!(hier.externals.count, 0);
    }

    #[test]
    fn test_unset_ratio_defaults_to_two() {
        let r = resolve(&TopologyConfig::default(), &defaults()).unwrap();
        assert_eq!(r.tier1_ratio, 2);
        assert_eq!(r.external_ratio, 2);
    }

    #[test]
    fn test_zero_ratio_between_populated_tiers_rejected() {
        let cfg = TopologyConfig {
            tier1_to_tier2_ratio: Some(0),
            ..Default::default()
        };
        assert!(invalid(&cfg).contains("tier1_to_tier2"));

        // no externals: a zero external ratio is harmless
        let cfg = TopologyConfig {
            external_count: 0,
            external_to_tier1_ratio: Some(0),
            ..Default::default()
        };
        assert!(resolve(&cfg, &defaults()).is_ok());
    }

    #[test]
    fn test_pods_forced_to_one_without_super_spine() {
        let cfg = TopologyConfig { pods: 4, ..Default::default() };
        assert_eq!(resolve(&cfg, &defaults()).unwrap().pods, 1);
    }

    #[test]
    fn test_structural_rejections() {
        assert!(invalid(&TopologyConfig { tier2_count: 0, ..Default::default() }).contains("leaf"));
        assert!(invalid(&TopologyConfig { halls: 0, ..Default::default() }).contains("halls"));
        assert!(invalid(&TopologyConfig {
            super_spine_enabled: true,
            super_spine_count: 0,
            ..Default::default()
        })
        .contains("super-spine"));
        assert!(invalid(&TopologyConfig {
            mgmt_switch_distribution: "per-pod".to_string(),
            ..Default::default()
        })
        .contains("mgmt_switch_distribution"));
        assert!(invalid(&TopologyConfig {
            tier2_placement: "sideways".to_string(),
            ..Default::default()
        })
        .contains("tier2_placement"));
        assert!(invalid(&TopologyConfig {
            gpu_cluster_count: 1,
            gpu_interconnect: "carrier-pigeon".to_string(),
            ..Default::default()
        })
        .contains("interconnect"));
    }

    #[test]
    fn test_gpu_without_leaves_rejected() {
        let cfg = TopologyConfig {
            tier1_count: 0,
            tier2_count: 0,
            external_count: 0,
            gpu_cluster_count: 1,
            ..Default::default()
        };
        assert!(invalid(&cfg).contains("GPU"));
    }

    #[test]
    fn test_gpu_cluster_list_overrides_flat_fields() {
        let cfg = TopologyConfig {
            gpu_cluster_count: 5,
            gpu_nodes_per_cluster: 4,
            gpu_clusters: vec![
                GpuClusterSpec {
                    name: "train".to_string(),
                    node_count: Some(2),
                    interconnect: Some("RoCE".to_string()),
                    ..Default::default()
                },
                GpuClusterSpec::default(),
            ],
            ..Default::default()
        };
        let r = resolve(&cfg, &defaults()).unwrap();
        assert_eq!(r.gpu.clusters.len(), 2);
        assert_eq!(r.gpu.clusters[0].name, "train");
        assert_eq!(r.gpu.clusters[0].node_count, 2);
        assert_eq!(r.gpu.clusters[0].interconnect, Interconnect::Roce);
        assert_eq!(r.gpu.clusters[1].name, "gpu-cluster-2");
        assert_eq!(r.gpu.clusters[1].node_count, 4);
        assert_eq!(r.gpu.clusters[1].gpu_model, "MI300X");
        assert_eq!(r.gpu.clusters[1].interconnect, Interconnect::InfiniBand);
    }

    #[test]
    fn test_p2p_pool_exhaustion_rejected() {
        let cfg = TopologyConfig {
            external_count: 0,
            tier1_count: 200,
            tier2_count: 100,
            racks_per_row: 50,
            ..Default::default()
        };
        assert!(invalid(&cfg).contains("point-to-point"));
    }

    #[test]
    fn test_placement_maps_to_tiers() {
        let cfg = TopologyConfig {
            architecture: Architecture::Hierarchical,
            tier3_count: 2,
            tier2_placement: "end".to_string(),
            tier3_placement: "2".to_string(),
            ru_placement: "top".to_string(),
            ..Default::default()
        };
        let r = resolve(&cfg, &defaults()).unwrap();
        assert_eq!(r.placement.network_rack, RackPlacement::End);
        assert_eq!(r.placement.edge_fill, RackPlacement::Rack(2));
        assert_eq!(r.placement.ru, RuPlacement::Top);
        assert_eq!(r.placement_labels.tier3, "2");
    }
}
