//! 2D geometry for the fabric diagram. Produces boxes, segments and label
//! lists only; rendering is left to the client.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Device, FabricLink, Role, TopologyPreview};

const NODE_WIDTH: f64 = 140.0;
const NODE_HEIGHT: f64 = 50.0;
/// Patch panels and GPU nodes
const SHORT_NODE_HEIGHT: f64 = 32.0;
const H_GAP: f64 = 30.0;
const BASE_GAP: f64 = 60.0;
const LABEL_LINE_HEIGHT: f64 = 12.0;
const LABEL_PADDING: f64 = 10.0;
const PATCH_PANEL_GAP: f64 = 40.0;
const LEAF_GPU_GAP: f64 = 80.0;
const MGMT_COLUMN_GAP: f64 = 80.0;
const MGMT_V_GAP: f64 = 16.0;
const MARGIN: f64 = 20.0;
const MGMT_LINE_OPACITY: f64 = 0.25;

/// Vertical slots of the diagram, top to bottom. Hierarchical roles share
/// the CLOS slots: core with super-spine, distribution with spine, access with leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    External,
    SuperSpine,
    Spine,
    PatchPanel,
    Leaf,
    Gpu,
}

impl Tier {
    const ORDER: [Tier; 6] = [
        Tier::External,
        Tier::SuperSpine,
        Tier::Spine,
        Tier::PatchPanel,
        Tier::Leaf,
        Tier::Gpu,
    ];

    /// `None` for management switches, which live in the side column
    pub fn of(role: Role) -> Option<Tier> {
        match role {
            Role::External => Some(Tier::External),
            Role::SuperSpine | Role::Core => Some(Tier::SuperSpine),
            Role::Spine | Role::Distribution => Some(Tier::Spine),
            Role::PatchPanel => Some(Tier::PatchPanel),
            Role::Leaf | Role::Access => Some(Tier::Leaf),
            Role::GpuNode => Some(Tier::Gpu),
            Role::MgmtSwitch => None,
        }
    }

    fn node_height(&self) -> f64 {
        match self {
            Tier::PatchPanel | Tier::Gpu => SHORT_NODE_HEIGHT,
            _ => NODE_HEIGHT,
        }
    }
}

/// Fill/border intent of a node box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStyle {
    Fabric,
    External,
    Passive,
    Compute,
    Management,
}

impl NodeStyle {
    fn of(role: Role) -> Self {
        match role {
            Role::External => NodeStyle::External,
            Role::PatchPanel => NodeStyle::Passive,
            Role::GpuNode => NodeStyle::Compute,
            Role::MgmtSwitch => NodeStyle::Management,
            _ => NodeStyle::Fabric,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeBox {
    pub hostname: String,
    pub role: Role,
    pub label: String,
    pub sublabel: String,
    pub style: NodeStyle,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Local interface names in link order
    pub interfaces: Vec<String>,
}

impl NodeBox {
    fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    fn top(&self) -> (f64, f64) {
        (self.center_x(), self.y)
    }

    fn bottom(&self) -> (f64, f64) {
        (self.center_x(), self.y + self.height)
    }

    fn middle(&self) -> (f64, f64) {
        (self.center_x(), self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    fn between(a: (f64, f64), b: (f64, f64)) -> Self {
        Self { x1: a.0, y1: a.1, x2: b.0, y2: b.1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
    Fabric,
    GpuUplink,
    Management,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkPath {
    pub kind: LinkKind,
    pub side_a_hostname: String,
    pub side_a_interface: String,
    pub side_b_hostname: String,
    pub side_b_interface: String,
    /// Patch panel the link is drawn through
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
    pub segments: Vec<Segment>,
    pub dashed: bool,
    pub opacity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagram {
    pub nodes: Vec<NodeBox>,
    pub links: Vec<LinkPath>,
    pub width: f64,
    pub height: f64,
}

/// Lay out a preview's devices with its tier links and GPU uplinks
pub fn layout_preview(preview: &TopologyPreview) -> Diagram {
    let links: Vec<FabricLink> = preview
        .fabric_links
        .iter()
        .chain(preview.gpu_clusters.iter().flat_map(|c| c.leaf_uplink_links.iter()))
        .cloned()
        .collect();
    layout(&preview.devices, &links)
}

/// Compute node boxes and link segments. Links between two GPU nodes and
/// links with an endpoint outside `devices` are not drawn.
pub fn layout(devices: &[Device], links: &[FabricLink]) -> Diagram {
    if devices.is_empty() {
        return Diagram::default();
    }

    let role_of: HashMap<&str, Role> = devices.iter().map(|d| (d.hostname.as_str(), d.kind())).collect();
    let drawn: Vec<&FabricLink> = links
        .iter()
        .filter(|l| match (role_of.get(l.side_a_hostname.as_str()), role_of.get(l.side_b_hostname.as_str())) {
            (Some(a), Some(b)) => !(*a == Role::GpuNode && *b == Role::GpuNode),
            _ => false,
        })
        .collect();

    // ── 1. Interface labels per node, in link order ──
    let mut interfaces: HashMap<&str, Vec<String>> = HashMap::new();
    for l in &drawn {
        interfaces
            .entry(l.side_a_hostname.as_str())
            .or_default()
            .push(l.side_a_interface.clone());
        interfaces
            .entry(l.side_b_hostname.as_str())
            .or_default()
            .push(l.side_b_interface.clone());
    }

    // ── 2. Group into tiers ──
    let mut tiers: Vec<(Tier, Vec<&Device>)> = Tier::ORDER.iter().map(|t| (*t, Vec::new())).collect();
    let mut mgmt: Vec<&Device> = Vec::new();
    for d in devices {
        match Tier::of(d.kind()) {
            Some(t) => {
                if let Some((_, members)) = tiers.iter_mut().find(|(tier, _)| *tier == t) {
                    members.push(d);
                }
            }
            None => mgmt.push(d),
        }
    }
    tiers.retain(|(_, members)| !members.is_empty());

    // Label block under/over a tier sized for its busiest node
    let blocks: Vec<f64> = tiers
        .iter()
        .map(|(_, members)| {
            let count = members
                .iter()
                .map(|d| interfaces.get(d.hostname.as_str()).map_or(0, |v| v.len()))
                .max()
                .unwrap_or(0);
            count as f64 * LABEL_LINE_HEIGHT + LABEL_PADDING
        })
        .collect();

    let max_tier_count = tiers.iter().map(|(_, m)| m.len()).max().unwrap_or(0);
    let fabric_width = if max_tier_count == 0 {
        0.0
    } else {
        max_tier_count as f64 * (NODE_WIDTH + H_GAP) - H_GAP
    };

    // ── 3. Vertical offsets and horizontal centering ──
    let mut nodes: Vec<NodeBox> = Vec::with_capacity(devices.len());
    let mut tier_y: HashMap<Tier, (f64, f64)> = HashMap::new();
    let mut y = MARGIN;
    for (i, (tier, members)) in tiers.iter().enumerate() {
        let row_width = members.len() as f64 * (NODE_WIDTH + H_GAP) - H_GAP;
        let x0 = MARGIN + (fabric_width - row_width) / 2.0;
        let height = tier.node_height();
        for (k, d) in members.iter().enumerate() {
            nodes.push(node_box(d, x0 + k as f64 * (NODE_WIDTH + H_GAP), y, height, &interfaces));
        }
        tier_y.insert(*tier, (y, y + height));

        if let Some((next, _)) = tiers.get(i + 1) {
            let (here, below) = (blocks[i], blocks[i + 1]);
            let mut gap = match (tier, next) {
                (Tier::Leaf, Tier::Gpu) => LEAF_GPU_GAP,
                _ => BASE_GAP,
            } + here
                + below;
            if *tier == Tier::PatchPanel || *next == Tier::PatchPanel {
                gap += PATCH_PANEL_GAP;
            }
            y += height + gap;
        } else {
            y += height;
        }
    }
    let mut width = if nodes.is_empty() { 0.0 } else { fabric_width + 2.0 * MARGIN };
    let mut height = if nodes.is_empty() { 0.0 } else { y + MARGIN };

    // ── 4. Management side column ──
    if !mgmt.is_empty() {
        let column_height = mgmt.len() as f64 * (NODE_HEIGHT + MGMT_V_GAP) - MGMT_V_GAP;
        let center = match (tier_y.get(&Tier::Spine), tier_y.get(&Tier::Leaf)) {
            (Some(spine), Some(leaf)) => ((spine.0 + spine.1) / 2.0 + (leaf.0 + leaf.1) / 2.0) / 2.0,
            _ if !nodes.is_empty() => (MARGIN + y) / 2.0,
            _ => MARGIN + column_height / 2.0,
        };
        let x = if nodes.is_empty() { MARGIN } else { MARGIN + fabric_width + MGMT_COLUMN_GAP };
        let top = (center - column_height / 2.0).max(MARGIN);
        for (k, d) in mgmt.iter().enumerate() {
            let y = top + k as f64 * (NODE_HEIGHT + MGMT_V_GAP);
            nodes.push(node_box(d, x, y, NODE_HEIGHT, &interfaces));
        }
        width = x + NODE_WIDTH + MARGIN;
        height = height.max(top + column_height + MARGIN);
    }

    // ── 5. Links ──
    let index: HashMap<&str, usize> = nodes.iter().enumerate().map(|(i, n)| (n.hostname.as_str(), i)).collect();
    let panels: Vec<&NodeBox> = nodes.iter().filter(|n| n.role == Role::PatchPanel).collect();
    let mut paths: Vec<LinkPath> = Vec::with_capacity(drawn.len());

    for l in &drawn {
        let (Some(&ia), Some(&ib)) = (index.get(l.side_a_hostname.as_str()), index.get(l.side_b_hostname.as_str())) else {
            continue;
        };
        let (a, b) = (&nodes[ia], &nodes[ib]);
        let (upper, lower) = if a.y <= b.y { (a, b) } else { (b, a) };
        let kind = if a.role == Role::GpuNode || b.role == Role::GpuNode {
            LinkKind::GpuUplink
        } else {
            LinkKind::Fabric
        };

        let through_panel = Tier::of(upper.role) == Some(Tier::Spine) && Tier::of(lower.role) == Some(Tier::Leaf);
        let panel = if through_panel {
            nearest_panel(&panels, (upper.center_x() + lower.center_x()) / 2.0)
        } else {
            None
        };
        let (via, segments) = match panel {
            Some(pp) => (
                Some(pp.hostname.clone()),
                vec![
                    Segment::between(upper.bottom(), pp.top()),
                    Segment::between(pp.bottom(), lower.top()),
                ],
            ),
            None => (None, vec![Segment::between(upper.bottom(), lower.top())]),
        };
        paths.push(LinkPath {
            kind,
            side_a_hostname: l.side_a_hostname.clone(),
            side_a_interface: l.side_a_interface.clone(),
            side_b_hostname: l.side_b_hostname.clone(),
            side_b_interface: l.side_b_interface.clone(),
            via,
            segments,
            dashed: false,
            opacity: 1.0,
        });
    }

    // Management lines: every mgmt switch to every spine-class and leaf-class node
    let managed: Vec<&NodeBox> = nodes
        .iter()
        .filter(|n| matches!(Tier::of(n.role), Some(Tier::Spine) | Some(Tier::Leaf)))
        .collect();
    for m in nodes.iter().filter(|n| n.role == Role::MgmtSwitch) {
        let from = (m.x, m.middle().1);
        for target in &managed {
            paths.push(LinkPath {
                kind: LinkKind::Management,
                side_a_hostname: m.hostname.clone(),
                side_a_interface: String::new(),
                side_b_hostname: target.hostname.clone(),
                side_b_interface: String::new(),
                via: None,
                segments: vec![Segment::between(from, (target.x + target.width, target.middle().1))],
                dashed: true,
                opacity: MGMT_LINE_OPACITY,
            });
        }
    }

    Diagram {
        nodes,
        links: paths,
        width,
        height,
    }
}

fn node_box(d: &Device, x: f64, y: f64, height: f64, interfaces: &HashMap<&str, Vec<String>>) -> NodeBox {
    NodeBox {
        hostname: d.hostname.clone(),
        role: d.kind(),
        label: d.hostname.clone(),
        sublabel: d.model.clone(),
        style: NodeStyle::of(d.kind()),
        x,
        y,
        width: NODE_WIDTH,
        height,
        interfaces: interfaces.get(d.hostname.as_str()).cloned().unwrap_or_default(),
    }
}

/// Panel whose center is horizontally nearest `mid_x`; ties go to the first
fn nearest_panel<'a>(panels: &[&'a NodeBox], mid_x: f64) -> Option<&'a NodeBox> {
    let mut best: Option<(&NodeBox, f64)> = None;
    for pp in panels {
        let d = (pp.center_x() - mid_x).abs();
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((*pp, d));
        }
    }
    best.map(|(pp, _)| pp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FacilityDefaults, TopologyConfig};
    use crate::topology::preview;

    fn clos(spines: usize, leaves: usize, ratio: usize) -> TopologyPreview {
        let cfg = TopologyConfig {
            external_count: 0,
            tier1_count: spines,
            tier2_count: leaves,
            tier1_to_tier2_ratio: Some(ratio),
            racks_per_row: 8,
            mgmt_switch_distribution: "none".to_string(),
            ..Default::default()
        };
        preview(&cfg, &FacilityDefaults::default()).unwrap()
    }

    fn node<'a>(d: &'a Diagram, hostname: &str) -> &'a NodeBox {
        d.nodes.iter().find(|n| n.hostname == hostname).unwrap()
    }

    #[test]
    fn test_empty_input_gives_empty_diagram() {
        let d = layout(&[], &[]);
        assert!(d.nodes.is_empty());
        assert!(d.links.is_empty());
        assert_eq!(d.width, 0.0);
        assert_eq!(d.height, 0.0);
    }

    #[test]
    fn test_spine_leaf_links_route_through_patch_panel() {
        let p = clos(4, 16, 2);
        let d = layout_preview(&p);
        let fabric: Vec<&LinkPath> = d.links.iter().filter(|l| l.kind == LinkKind::Fabric).collect();
        assert_eq!(fabric.len(), 128);
        for l in fabric {
            assert_eq!(l.segments.len(), 2);
            assert_eq!(l.via.as_deref(), Some("hall-1-row-1-pp"));
        }
    }

    #[test]
    fn test_without_patch_panel_links_are_straight() {
        let mut p = clos(2, 2, 1);
        p.devices.retain(|d| d.kind() != Role::PatchPanel);
        let d = layout_preview(&p);
        assert!(d.links.iter().all(|l| l.segments.len() == 1 && l.via.is_none()));
    }

    #[test]
    fn test_patch_panel_tier_adds_fixed_gap_above_and_below() {
        let with = clos(2, 2, 1);
        let mut without = with.clone();
        without.devices.retain(|d| d.kind() != Role::PatchPanel);
        let span = |p: &TopologyPreview| {
            let d = layout_preview(p);
            node(&d, "leaf-1").y - node(&d, "spine-1").y
        };
        // the panel tier has no link endpoints, so its label block is padding only
        let panel_tier = SHORT_NODE_HEIGHT + BASE_GAP + LABEL_PADDING;
        assert_eq!(span(&with) - span(&without), panel_tier + 2.0 * PATCH_PANEL_GAP + LABEL_PADDING);
    }

    #[test]
    fn test_tiers_centered_in_fabric_width() {
        let p = clos(2, 4, 1);
        let d = layout_preview(&p);
        let fabric_width = 4.0 * (NODE_WIDTH + H_GAP) - H_GAP;
        let spine_row = 2.0 * (NODE_WIDTH + H_GAP) - H_GAP;
        assert_eq!(node(&d, "spine-1").x, MARGIN + (fabric_width - spine_row) / 2.0);
        assert_eq!(node(&d, "leaf-1").x, MARGIN);
        assert_eq!(d.width, fabric_width + 2.0 * MARGIN);
        assert!(node(&d, "spine-1").y < node(&d, "hall-1-row-1-pp").y);
        assert!(node(&d, "hall-1-row-1-pp").y < node(&d, "leaf-1").y);
    }

    #[test]
    fn test_more_links_need_taller_gaps() {
        let thin = layout_preview(&clos(2, 4, 1));
        let thick = layout_preview(&clos(2, 4, 4));
        assert!(node(&thick, "leaf-1").y > node(&thin, "leaf-1").y);
        assert!(thick.height > thin.height);
        assert_eq!(node(&thick, "spine-1").interfaces.len(), 16);
    }

    #[test]
    fn test_mgmt_column_and_dashed_lines() {
        let cfg = TopologyConfig {
            external_count: 0,
            tier1_count: 2,
            tier2_count: 4,
            racks_per_row: 2,
            ..Default::default()
        };
        let p = preview(&cfg, &FacilityDefaults::default()).unwrap();
        let d = layout_preview(&p);
        let fabric_width = 4.0 * (NODE_WIDTH + H_GAP) - H_GAP;

        let m = node(&d, "mgmt-switch-1");
        assert_eq!(m.x, MARGIN + fabric_width + MGMT_COLUMN_GAP);
        let mgmt_lines: Vec<&LinkPath> = d.links.iter().filter(|l| l.kind == LinkKind::Management).collect();
        assert_eq!(mgmt_lines.len(), 6);
        assert!(mgmt_lines.iter().all(|l| l.dashed && l.opacity == MGMT_LINE_OPACITY));

        let spine = node(&d, "spine-1");
        let leaf = node(&d, "leaf-1");
        let expected = ((spine.y + spine.height / 2.0) + (leaf.y + leaf.height / 2.0)) / 2.0;
        assert_eq!(m.y + m.height / 2.0, expected);
    }

    #[test]
    fn test_gpu_nodes_below_leaves_linked_to_leaf_only() {
        let cfg = TopologyConfig {
            external_count: 0,
            tier1_count: 2,
            tier2_count: 2,
            gpu_cluster_count: 1,
            gpu_nodes_per_cluster: 4,
            mgmt_switch_distribution: "none".to_string(),
            ..Default::default()
        };
        let p = preview(&cfg, &FacilityDefaults::default()).unwrap();
        let d = layout_preview(&p);

        let gpu = node(&d, "gpu-node-1");
        let leaf = node(&d, "leaf-1");
        assert!(gpu.y >= leaf.y + leaf.height + LEAF_GPU_GAP);
        assert_eq!(gpu.height, SHORT_NODE_HEIGHT);

        for l in d.links.iter().filter(|l| l.touches_gpu()) {
            assert_eq!(l.kind, LinkKind::GpuUplink);
            assert!(l.side_b_hostname.starts_with("leaf-"));
        }
        assert_eq!(d.links.iter().filter(|l| l.kind == LinkKind::GpuUplink).count(), 8);
    }

    #[test]
    fn test_nearest_panel_prefers_first_on_tie() {
        let pp = |x: f64, name: &str| NodeBox {
            hostname: name.to_string(),
            role: Role::PatchPanel,
            label: name.to_string(),
            sublabel: String::new(),
            style: NodeStyle::Passive,
            x,
            y: 0.0,
            width: NODE_WIDTH,
            height: SHORT_NODE_HEIGHT,
            interfaces: Vec::new(),
        };
        let a = pp(0.0, "a");
        let b = pp(200.0, "b");
        let panels = vec![&a, &b];
        assert_eq!(nearest_panel(&panels, 60.0).unwrap().hostname, "a");
        assert_eq!(nearest_panel(&panels, 250.0).unwrap().hostname, "b");
        assert_eq!(nearest_panel(&panels, 170.0).unwrap().hostname, "a");
        assert!(nearest_panel(&[], 0.0).is_none());
    }

    impl LinkPath {
        fn touches_gpu(&self) -> bool {
            self.side_a_hostname.starts_with("gpu-node") || self.side_b_hostname.starts_with("gpu-node")
        }
    }
}
