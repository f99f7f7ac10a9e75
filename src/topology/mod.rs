pub mod cable;
pub mod cabling;
pub mod error;
pub mod generator;
pub mod layout;
pub mod naming;
pub mod placement;
pub mod resolver;

use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::models::{Device, DeviceRole, FacilityDefaults, RackSlot, TopologyConfig, TopologyPreview};

use cable::CableEstimator;
pub use error::ConfigError;
use placement::FacilityShape;
pub use resolver::{resolve, ResolvedConfig};

/// Resolve, generate, place and estimate cable lengths in one pass
pub fn preview(config: &TopologyConfig, defaults: &FacilityDefaults) -> Result<TopologyPreview, ConfigError> {
    let resolved = resolve(config, defaults)?;
    preview_resolved(&resolved)
}

/// Generate and place a resolved request. Fails when the hostname pattern or
/// external names make two devices share a hostname.
pub fn preview_resolved(cfg: &ResolvedConfig) -> Result<TopologyPreview, ConfigError> {
    let fabric = generator::generate(cfg);
    let plan = placement::plan(fabric.devices, &cfg.facility, &cfg.placement);

    let mut preview = TopologyPreview {
        architecture: cfg.architecture,
        topology_name: cfg.topology_name.clone(),
        devices: plan.devices,
        fabric_links: fabric.fabric_links,
        racks: plan.racks,
        gpu_clusters: fabric.gpu_clusters,
        tier1_placement: cfg.placement_labels.tier1.clone(),
        tier2_placement: cfg.placement_labels.tier2.clone(),
        tier3_placement: cfg.placement_labels.tier3.clone(),
        ru_placement: cfg.placement_labels.ru.clone(),
    };
    check_hostnames(&preview)?;
    annotate_cable_lengths(&mut preview, &cfg.facility, cfg.cable_slack_percent);

    info!(
        "Topology preview ({}): {} devices, {} fabric links, {} racks",
        cfg.architecture.as_str(),
        preview.devices.len(),
        preview.fabric_links.len(),
        preview.racks.len()
    );
    Ok(preview)
}

/// Hostnames are unique and every link ends on a device of the preview
fn check_hostnames(preview: &TopologyPreview) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for d in &preview.devices {
        if !seen.insert(d.hostname.as_str()) {
            return Err(ConfigError::invalid(format!("duplicate hostname {}", d.hostname)));
        }
    }
    for link in preview.all_links() {
        for end in [&link.side_a_hostname, &link.side_b_hostname] {
            if !seen.contains(end.as_str()) {
                return Err(ConfigError::invalid(format!("link ends on unknown device {}", end)));
            }
        }
    }
    Ok(())
}

/// Re-estimate every link length from the current placements
pub fn annotate_cable_lengths(preview: &mut TopologyPreview, facility: &FacilityShape, slack_percent: i32) {
    let estimator = CableEstimator::new(&preview.devices, &preview.racks, facility, slack_percent);
    let fabric_links = estimator.annotate(&preview.fabric_links);
    let clusters: Vec<_> = preview
        .gpu_clusters
        .iter()
        .map(|c| (estimator.annotate(&c.leaf_uplink_links), estimator.annotate(&c.fabric_links)))
        .collect();

    preview.fabric_links = fabric_links;
    for (cluster, (uplinks, mesh)) in preview.gpu_clusters.iter_mut().zip(clusters) {
        cluster.leaf_uplink_links = uplinks;
        cluster.fabric_links = mesh;
    }
}

/// Apply operator edits from an edited preview. Devices are matched by
/// `index`; hostname changes are carried through every link and GPU
/// reference, and cable lengths are re-estimated afterwards.
pub fn apply_overrides(
    mut preview: TopologyPreview,
    overrides: &[Device],
    cfg: &ResolvedConfig,
) -> Result<TopologyPreview, ConfigError> {
    let mut renames: HashMap<String, String> = HashMap::new();

    for edit in overrides {
        let rack_count = preview.racks.len();
        let Some(dev) = preview.devices.get_mut(edit.index) else {
            return Err(ConfigError::invalid(format!("override for unknown device index {}", edit.index)));
        };
        if dev.kind() != edit.kind() {
            return Err(ConfigError::invalid(format!("override may not change the role of {}", dev.hostname)));
        }
        let placement = match &edit.placement {
            Some(slot) if slot.rack_index >= rack_count => {
                return Err(ConfigError::invalid(format!(
                    "override places {} in unknown rack {}",
                    edit.hostname, slot.rack_index
                )));
            }
            Some(slot) => {
                let rack = &preview.racks[slot.rack_index];
                Some(RackSlot {
                    rack_index: rack.index,
                    rack_name: rack.name.clone(),
                    hall: rack.hall,
                    row: rack.row,
                    rack_position: slot.rack_position,
                })
            }
            None => None,
        };
        if dev.hostname != edit.hostname {
            renames.insert(dev.hostname.clone(), edit.hostname.clone());
        }
        *dev = Device {
            index: dev.index,
            placement,
            ..edit.clone()
        };
    }

    placement::check_placements(&preview.devices, &preview.racks)?;

    if !renames.is_empty() {
        let rename = |h: &mut String| {
            if let Some(new) = renames.get(h.as_str()) {
                *h = new.clone();
            }
        };
        for link in preview.fabric_links.iter_mut().chain(
            preview
                .gpu_clusters
                .iter_mut()
                .flat_map(|c| c.leaf_uplink_links.iter_mut().chain(c.fabric_links.iter_mut())),
        ) {
            rename(&mut link.side_a_hostname);
            rename(&mut link.side_b_hostname);
        }
        for dev in preview.devices.iter_mut() {
            if let DeviceRole::GpuNode { leaf, .. } = &mut dev.role {
                rename(leaf);
            }
        }
        for cluster in preview.gpu_clusters.iter_mut() {
            for leaf in cluster.leaf_assignments.iter_mut() {
                rename(leaf);
            }
        }
    }

    check_hostnames(&preview)?;
    annotate_cable_lengths(&mut preview, &cfg.facility, cfg.cable_slack_percent);
    Ok(preview)
}
