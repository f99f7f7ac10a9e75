//! Procurement and installation documents derived from a preview: bill of
//! materials, cutsheet and per-rack connection sheets.

use anyhow::{anyhow, Context, Result};
use csv::Writer;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{CableKey, Device, DeviceRole, FabricLink, Interconnect, PortAssignment, Rack, Role, TopologyPreview};

use super::cable::standard_length;

pub const BOM_CSV_HEADER: [&str; 6] = ["Category", "Item", "Specification", "Quantity", "Unit Length", "Notes"];
pub const CUTSHEET_CSV_HEADER: [&str; 9] = [
    "Side A Hostname",
    "Side A Interface",
    "Side A Patch Panel",
    "Side A PP Port",
    "Side B Hostname",
    "Side B Interface",
    "Side B Patch Panel",
    "Side B PP Port",
    "Cable Length (m)",
];

const FABRIC_OPTIC: &str = "100G QSFP28";
const GPU_UPLINK_OPTIC: &str = "400G QSFP-DD";
const GPU_IB_OPTIC: &str = "400G OSFP InfiniBand NDR";
const GPU_ETHERNET_OPTIC: &str = "400G QSFP-DD AOC";
const MGMT_CABLE: &str = "1G copper";

/// What a physical link carries, which decides its optic part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "class", content = "interconnect")]
pub enum LinkClass {
    Fabric,
    GpuUplink,
    GpuFabric(Interconnect),
}

impl LinkClass {
    pub fn optic(&self) -> &'static str {
        match self {
            LinkClass::Fabric => FABRIC_OPTIC,
            LinkClass::GpuUplink => GPU_UPLINK_OPTIC,
            LinkClass::GpuFabric(ic) if ic.uses_ib_ports() => GPU_IB_OPTIC,
            LinkClass::GpuFabric(_) => GPU_ETHERNET_OPTIC,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            LinkClass::Fabric => "fabric",
            LinkClass::GpuUplink => "gpu-uplink",
            LinkClass::GpuFabric(_) => "gpu-fabric",
        }
    }
}

/// One de-duplicated physical cable with its patch-panel hops. Also the
/// cutsheet row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CableRun {
    pub side_a_hostname: String,
    pub side_a_interface: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_a_patch_panel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_a_pp_port: Option<String>,
    pub side_b_hostname: String,
    pub side_b_interface: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_b_patch_panel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_b_pp_port: Option<String>,
    pub cable_length_meters: Option<f64>,
    pub class: LinkClass,
}

impl CableRun {
    fn from_link(link: &FabricLink, class: LinkClass) -> Self {
        Self {
            side_a_hostname: link.side_a_hostname.clone(),
            side_a_interface: link.side_a_interface.clone(),
            side_a_patch_panel: None,
            side_a_pp_port: None,
            side_b_hostname: link.side_b_hostname.clone(),
            side_b_interface: link.side_b_interface.clone(),
            side_b_patch_panel: None,
            side_b_pp_port: None,
            cable_length_meters: link.cable_length_meters,
            class,
        }
    }

    fn from_assignment(pa: &PortAssignment) -> Self {
        Self {
            side_a_hostname: pa.device.clone(),
            side_a_interface: pa.port_name.clone(),
            side_a_patch_panel: pa.patch_panel_a.clone(),
            side_a_pp_port: pa.patch_panel_a_port.clone(),
            side_b_hostname: pa.remote_device.clone(),
            side_b_interface: pa.remote_port_name.clone(),
            side_b_patch_panel: pa.patch_panel_b.clone(),
            side_b_pp_port: pa.patch_panel_b_port.clone(),
            cable_length_meters: pa.cable_length_meters,
            class: LinkClass::Fabric,
        }
    }

    pub fn key(&self) -> CableKey {
        CableKey::new(
            &self.side_a_hostname,
            &self.side_a_interface,
            &self.side_b_hostname,
            &self.side_b_interface,
        )
    }

    pub fn touches(&self, hostname: &str) -> bool {
        self.side_a_hostname == hostname || self.side_b_hostname == hostname
    }

    /// Overlay an assignment's patch-panel hops and length. `pa.device` may be
    /// either side of this run.
    fn merge(&mut self, pa: &PortAssignment) {
        let device_is_a = self.side_a_hostname == pa.device && self.side_a_interface == pa.port_name;
        let (local_pp, local_port, remote_pp, remote_port) = if device_is_a {
            (
                &mut self.side_a_patch_panel,
                &mut self.side_a_pp_port,
                &mut self.side_b_patch_panel,
                &mut self.side_b_pp_port,
            )
        } else {
            (
                &mut self.side_b_patch_panel,
                &mut self.side_b_pp_port,
                &mut self.side_a_patch_panel,
                &mut self.side_a_pp_port,
            )
        };
        overlay(local_pp, &pa.patch_panel_a);
        overlay(local_port, &pa.patch_panel_a_port);
        overlay(remote_pp, &pa.patch_panel_b);
        overlay(remote_port, &pa.patch_panel_b_port);
        if pa.cable_length_meters.is_some() {
            self.cable_length_meters = pa.cable_length_meters;
        }
    }
}

fn overlay(slot: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value {
        *slot = Some(v.clone());
    }
}

/// Collect every physical cable in the preview, allocate patch-panel ports
/// for spine↔leaf links and overlay live port assignments.
pub fn cable_runs(preview: &TopologyPreview, assignments: &[PortAssignment]) -> Vec<CableRun> {
    let classified = preview
        .fabric_links
        .iter()
        .map(|l| (l, LinkClass::Fabric))
        .chain(preview.gpu_clusters.iter().flat_map(|c| {
            c.leaf_uplink_links
                .iter()
                .map(|l| (l, LinkClass::GpuUplink))
                .chain(c.fabric_links.iter().map(move |l| (l, LinkClass::GpuFabric(c.interconnect))))
        }));

    let mut runs: Vec<CableRun> = Vec::new();
    let mut by_key: HashMap<CableKey, usize> = HashMap::new();
    for (link, class) in classified {
        let key = link.dedup_key();
        if by_key.contains_key(&key) {
            continue;
        }
        by_key.insert(key, runs.len());
        runs.push(CableRun::from_link(link, class));
    }

    allocate_patch_panel_ports(&preview.devices, &mut runs);

    for pa in assignments {
        let key = CableKey::new(&pa.device, &pa.port_name, &pa.remote_device, &pa.remote_port_name);
        match by_key.get(&key) {
            Some(&i) => runs[i].merge(pa),
            None => {
                by_key.insert(key, runs.len());
                runs.push(CableRun::from_assignment(pa));
            }
        }
    }
    runs
}

/// Each spine-class↔leaf-class run whose leaf-side device sits in a row with
/// a patch panel takes the next two ports of that panel: `Port N` for the
/// upper side and `Port N+1` for the lower side.
fn allocate_patch_panel_ports(devices: &[Device], runs: &mut [CableRun]) {
    let panels: HashMap<(usize, usize), &str> = devices
        .iter()
        .filter_map(|d| match &d.role {
            DeviceRole::PatchPanel { hall, row } => Some(((*hall, *row), d.hostname.as_str())),
            _ => None,
        })
        .collect();
    if panels.is_empty() {
        return;
    }
    let by_host: HashMap<&str, &Device> = devices.iter().map(|d| (d.hostname.as_str(), d)).collect();
    let mut next_port: HashMap<&str, usize> = HashMap::new();

    for run in runs.iter_mut().filter(|r| r.class == LinkClass::Fabric) {
        let (Some(a), Some(b)) = (
            by_host.get(run.side_a_hostname.as_str()),
            by_host.get(run.side_b_hostname.as_str()),
        ) else {
            continue;
        };
        let (a_upper, lower) = if a.kind().is_spine_class() && b.kind().is_leaf_class() {
            (true, *b)
        } else if b.kind().is_spine_class() && a.kind().is_leaf_class() {
            (false, *a)
        } else {
            continue;
        };
        let Some(slot) = &lower.placement else { continue };
        let Some(&panel) = panels.get(&(slot.hall, slot.row)) else { continue };

        let n = next_port.entry(panel).or_insert(1);
        let upper_port = format!("Port {}", *n);
        let lower_port = format!("Port {}", *n + 1);
        *n += 2;

        let (a_port, b_port) = if a_upper { (upper_port, lower_port) } else { (lower_port, upper_port) };
        run.side_a_patch_panel = Some(panel.to_string());
        run.side_a_pp_port = Some(a_port);
        run.side_b_patch_panel = Some(panel.to_string());
        run.side_b_pp_port = Some(b_port);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bill of materials
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BomCategory {
    Device,
    Cable,
    Optic,
    Management,
}

impl BomCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BomCategory::Device => "Device",
            BomCategory::Cable => "Cable",
            BomCategory::Optic => "Optic",
            BomCategory::Management => "Management",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BomRow {
    pub category: BomCategory,
    pub item: String,
    pub specification: String,
    pub quantity: usize,
    pub unit_length_meters: Option<f64>,
    pub notes: String,
}

pub fn bill_of_materials(preview: &TopologyPreview, assignments: &[PortAssignment]) -> Vec<BomRow> {
    let runs = cable_runs(preview, assignments);
    let mut rows = device_rows(&preview.devices);
    rows.extend(cable_rows(&runs));
    rows.extend(optic_rows(&runs));
    rows.extend(management_rows(&preview.devices));
    rows
}

/// One row per (model, role) in first-seen order; externals and patch panels
/// are not procured.
fn device_rows(devices: &[Device]) -> Vec<BomRow> {
    let mut groups: Vec<((&str, Role), usize)> = Vec::new();
    for d in devices {
        let role = d.kind();
        if matches!(role, Role::External | Role::PatchPanel) {
            continue;
        }
        match groups.iter_mut().find(|(k, _)| *k == (d.model.as_str(), role)) {
            Some((_, count)) => *count += 1,
            None => groups.push(((d.model.as_str(), role), 1)),
        }
    }
    groups
        .into_iter()
        .map(|((model, role), quantity)| BomRow {
            category: BomCategory::Device,
            item: model.to_string(),
            specification: role.as_str().to_string(),
            quantity,
            unit_length_meters: None,
            notes: String::new(),
        })
        .collect()
}

fn cable_rows(runs: &[CableRun]) -> Vec<BomRow> {
    // f64 is not Ord; ladder lengths are exact in tenths of a millimeter
    let mut by_length: BTreeMap<u64, usize> = BTreeMap::new();
    for run in runs {
        let len = standard_length(run.cable_length_meters);
        *by_length.entry((len * 10_000.0).round() as u64).or_insert(0) += 1;
    }
    by_length
        .into_iter()
        .map(|(key, quantity)| {
            let len = key as f64 / 10_000.0;
            BomRow {
                category: BomCategory::Cable,
                item: "Fiber patch cable".to_string(),
                specification: format!("{}m", len),
                quantity,
                unit_length_meters: Some(len),
                notes: String::new(),
            }
        })
        .collect()
}

/// Two optics per distinct cable, one row per part
fn optic_rows(runs: &[CableRun]) -> Vec<BomRow> {
    let mut parts: Vec<(&'static str, &'static str, usize)> = Vec::new();
    for run in runs {
        let part = run.class.optic();
        match parts.iter_mut().find(|(p, _, _)| *p == part) {
            Some((_, _, count)) => *count += 2,
            None => parts.push((part, run.class.label(), 2)),
        }
    }
    parts
        .into_iter()
        .map(|(part, class, quantity)| BomRow {
            category: BomCategory::Optic,
            item: part.to_string(),
            specification: class.to_string(),
            quantity,
            unit_length_meters: None,
            notes: "one per link end".to_string(),
        })
        .collect()
}

fn management_rows(devices: &[Device]) -> Vec<BomRow> {
    if !devices.iter().any(|d| d.kind() == Role::MgmtSwitch) {
        return Vec::new();
    }
    let managed = devices
        .iter()
        .filter(|d| !matches!(d.kind(), Role::PatchPanel | Role::External | Role::MgmtSwitch))
        .count();
    if managed == 0 {
        return Vec::new();
    }
    vec![BomRow {
        category: BomCategory::Management,
        item: MGMT_CABLE.to_string(),
        specification: "RJ45".to_string(),
        quantity: managed,
        unit_length_meters: None,
        notes: "management switch to device".to_string(),
    }]
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection workbook
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionWorkbook {
    pub summary: WorkbookSummary,
    pub racks: Vec<RackSheet>,
    pub unracked: Vec<UnrackedGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbookSummary {
    pub topology_name: String,
    pub architecture: String,
    pub device_count: usize,
    pub rack_count: usize,
    pub cable_count: usize,
    pub unracked_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RackSheet {
    pub rack_index: usize,
    pub name: String,
    pub hall_name: String,
    pub row_name: String,
    pub height_ru: u32,
    /// Top-down, one entry per RU
    pub units: Vec<RackUnitRow>,
    pub links: Vec<ConnectionRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RackUnitRow {
    pub ru: u32,
    pub hostname: Option<String>,
    pub model: Option<String>,
    pub role: Option<Role>,
}

/// A cable as seen from one device on the sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionRow {
    pub device: String,
    pub interface: String,
    pub patch_panel: Option<String>,
    pub patch_panel_port: Option<String>,
    pub remote_device: String,
    pub remote_interface: String,
    pub remote_patch_panel: Option<String>,
    pub remote_patch_panel_port: Option<String>,
    pub cable_length_meters: f64,
}

impl ConnectionRow {
    fn from_run(run: &CableRun, hostname: &str) -> Self {
        let length = standard_length(run.cable_length_meters);
        if run.side_a_hostname == hostname {
            Self {
                device: run.side_a_hostname.clone(),
                interface: run.side_a_interface.clone(),
                patch_panel: run.side_a_patch_panel.clone(),
                patch_panel_port: run.side_a_pp_port.clone(),
                remote_device: run.side_b_hostname.clone(),
                remote_interface: run.side_b_interface.clone(),
                remote_patch_panel: run.side_b_patch_panel.clone(),
                remote_patch_panel_port: run.side_b_pp_port.clone(),
                cable_length_meters: length,
            }
        } else {
            Self {
                device: run.side_b_hostname.clone(),
                interface: run.side_b_interface.clone(),
                patch_panel: run.side_b_patch_panel.clone(),
                patch_panel_port: run.side_b_pp_port.clone(),
                remote_device: run.side_a_hostname.clone(),
                remote_interface: run.side_a_interface.clone(),
                remote_patch_panel: run.side_a_patch_panel.clone(),
                remote_patch_panel_port: run.side_a_pp_port.clone(),
                cable_length_meters: length,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnrackedGroup {
    /// "Hall 1 Row 2", or "Unassigned" for devices with no home row
    pub label: String,
    pub devices: Vec<UnrackedDevice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnrackedDevice {
    pub hostname: String,
    pub model: String,
    pub role: Role,
}

pub fn connection_workbook(preview: &TopologyPreview, assignments: &[PortAssignment]) -> ConnectionWorkbook {
    let runs = cable_runs(preview, assignments);
    let racks: Vec<RackSheet> = preview.racks.iter().map(|r| rack_sheet(r, &preview.devices, &runs)).collect();
    let unracked = unracked_groups(&preview.devices);

    ConnectionWorkbook {
        summary: WorkbookSummary {
            topology_name: preview.topology_name.clone(),
            architecture: preview.architecture.as_str().to_string(),
            device_count: preview.devices.len(),
            rack_count: preview.racks.len(),
            cable_count: runs.len(),
            unracked_count: unracked.iter().map(|g| g.devices.len()).sum(),
        },
        racks,
        unracked,
    }
}

fn rack_sheet(rack: &Rack, devices: &[Device], runs: &[CableRun]) -> RackSheet {
    let mut members: Vec<&Device> = devices.iter().filter(|d| d.rack_index() == Some(rack.index)).collect();
    members.sort_by_key(|d| std::cmp::Reverse(d.rack_position().unwrap_or(0)));

    let units = (1..=rack.height_ru)
        .rev()
        .map(|ru| {
            let occupant = members.iter().find(|d| {
                let bottom = d.rack_position().unwrap_or(0);
                ru >= bottom && ru < bottom.saturating_add(d.kind().rack_units())
            });
            RackUnitRow {
                ru,
                hostname: occupant.map(|d| d.hostname.clone()),
                model: occupant.map(|d| d.model.clone()),
                role: occupant.map(|d| d.kind()),
            }
        })
        .collect();

    let mut seen: HashSet<CableKey> = HashSet::new();
    let mut links = Vec::new();
    for d in &members {
        for run in runs.iter().filter(|r| r.touches(&d.hostname)) {
            if seen.insert(run.key()) {
                links.push(ConnectionRow::from_run(run, &d.hostname));
            }
        }
    }

    RackSheet {
        rack_index: rack.index,
        name: rack.name.clone(),
        hall_name: rack.hall_name.clone(),
        row_name: rack.row_name.clone(),
        height_ru: rack.height_ru,
        units,
        links,
    }
}

/// Unracked devices grouped by the row they serve: a patch panel's or
/// management switch's own row, a GPU node's leaf row. Everything else is
/// "Unassigned", listed last.
fn unracked_groups(devices: &[Device]) -> Vec<UnrackedGroup> {
    let rows: HashMap<&str, (usize, usize)> = devices
        .iter()
        .filter_map(|d| d.placement.as_ref().map(|p| (d.hostname.as_str(), (p.hall, p.row))))
        .collect();

    let mut grouped: BTreeMap<Option<(usize, usize)>, Vec<UnrackedDevice>> = BTreeMap::new();
    for d in devices.iter().filter(|d| d.placement.is_none()) {
        let home = match &d.role {
            DeviceRole::PatchPanel { hall, row } => Some((*hall, *row)),
            DeviceRole::MgmtSwitch { scope, .. } => scope.row().map(|row| (scope.hall(), row)),
            DeviceRole::GpuNode { leaf, .. } => rows.get(leaf.as_str()).copied(),
            _ => None,
        };
        grouped.entry(home).or_default().push(UnrackedDevice {
            hostname: d.hostname.clone(),
            model: d.model.clone(),
            role: d.kind(),
        });
    }

    let mut groups: Vec<UnrackedGroup> = Vec::new();
    let mut unassigned = None;
    for (home, devices) in grouped {
        match home {
            Some((hall, row)) => groups.push(UnrackedGroup {
                label: format!("Hall {} Row {}", hall, row),
                devices,
            }),
            None => unassigned = Some(devices),
        }
    }
    if let Some(devices) = unassigned {
        groups.push(UnrackedGroup {
            label: "Unassigned".to_string(),
            devices,
        });
    }
    groups
}

// ─────────────────────────────────────────────────────────────────────────────
// CSV
// ─────────────────────────────────────────────────────────────────────────────

fn write_csv<const N: usize>(header: [&str; N], records: impl IntoIterator<Item = [String; N]>) -> Result<String> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(header)?;
    for record in records {
        wtr.write_record(&record)?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| anyhow!("CSV writer error: {}", e))?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn bom_csv(rows: &[BomRow]) -> Result<String> {
    write_csv(
        BOM_CSV_HEADER,
        rows.iter().map(|row| {
            [
                row.category.as_str().to_string(),
                row.item.clone(),
                row.specification.clone(),
                row.quantity.to_string(),
                row.unit_length_meters.map(|m| format!("{}m", m)).unwrap_or_default(),
                row.notes.clone(),
            ]
        }),
    )
}

pub fn cutsheet_csv(runs: &[CableRun]) -> Result<String> {
    write_csv(
        CUTSHEET_CSV_HEADER,
        runs.iter().map(|run| {
            [
                run.side_a_hostname.clone(),
                run.side_a_interface.clone(),
                run.side_a_patch_panel.clone().unwrap_or_default(),
                run.side_a_pp_port.clone().unwrap_or_default(),
                run.side_b_hostname.clone(),
                run.side_b_interface.clone(),
                run.side_b_patch_panel.clone().unwrap_or_default(),
                run.side_b_pp_port.clone().unwrap_or_default(),
                standard_length(run.cable_length_meters).to_string(),
            ]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Architecture, FacilityDefaults, TopologyConfig};
    use crate::topology::preview;

    fn clos(spines: usize, leaves: usize, ratio: usize) -> TopologyConfig {
        TopologyConfig {
            external_count: 0,
            tier1_count: spines,
            tier2_count: leaves,
            tier1_to_tier2_ratio: Some(ratio),
            mgmt_switch_distribution: "none".to_string(),
            ..Default::default()
        }
    }

    fn optics(rows: &[BomRow], part: &str) -> usize {
        rows.iter()
            .filter(|r| r.category == BomCategory::Optic && r.item == part)
            .map(|r| r.quantity)
            .sum()
    }

    fn empty_preview() -> TopologyPreview {
        TopologyPreview {
            architecture: Architecture::Clos,
            topology_name: String::new(),
            devices: Vec::new(),
            fabric_links: Vec::new(),
            racks: Vec::new(),
            gpu_clusters: Vec::new(),
            tier1_placement: String::new(),
            tier2_placement: String::new(),
            tier3_placement: String::new(),
            ru_placement: String::new(),
        }
    }

    #[test]
    fn test_fabric_optics_two_per_link() {
        let p = preview(&clos(4, 16, 2), &FacilityDefaults::default()).unwrap();
        let bom = bill_of_materials(&p, &[]);
        assert_eq!(optics(&bom, FABRIC_OPTIC), 256);
    }

    #[test]
    fn test_gpu_uplink_optics() {
        let cfg = TopologyConfig {
            gpu_cluster_count: 1,
            gpu_nodes_per_cluster: 8,
            gpu_uplinks_per_node: 2,
            ..clos(2, 4, 1)
        };
        let p = preview(&cfg, &FacilityDefaults::default()).unwrap();
        let bom = bill_of_materials(&p, &[]);
        assert_eq!(optics(&bom, GPU_UPLINK_OPTIC), 32);
        assert!(optics(&bom, GPU_IB_OPTIC) > 0);
        assert_eq!(optics(&bom, GPU_ETHERNET_OPTIC), 0);
    }

    #[test]
    fn test_device_rows_skip_patch_panels_and_externals() {
        let cfg = TopologyConfig {
            external_count: 2,
            ..clos(2, 4, 1)
        };
        let p = preview(&cfg, &FacilityDefaults::default()).unwrap();
        let bom = bill_of_materials(&p, &[]);
        let devices: Vec<&BomRow> = bom.iter().filter(|r| r.category == BomCategory::Device).collect();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].specification, "spine");
        assert_eq!(devices[0].quantity, 2);
        assert_eq!(devices[1].specification, "leaf");
        assert_eq!(devices[1].quantity, 4);
    }

    #[test]
    fn test_cable_rows_group_by_ladder_length() {
        let p = preview(&clos(2, 4, 1), &FacilityDefaults::default()).unwrap();
        let bom = bill_of_materials(&p, &[]);
        let cables: Vec<&BomRow> = bom.iter().filter(|r| r.category == BomCategory::Cable).collect();
        assert_eq!(cables.iter().map(|r| r.quantity).sum::<usize>(), 8);
        let lengths: Vec<f64> = cables.iter().filter_map(|r| r.unit_length_meters).collect();
        let mut sorted = lengths.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted.dedup();
        assert_eq!(lengths, sorted);
        for len in lengths {
            assert!(crate::topology::cable::CABLE_LADDER_M.contains(&len));
        }
    }

    #[test]
    fn test_management_cabling_counts_managed_devices() {
        let cfg = TopologyConfig {
            external_count: 2,
            mgmt_switch_distribution: "per-row".to_string(),
            ..clos(2, 4, 1)
        };
        let p = preview(&cfg, &FacilityDefaults::default()).unwrap();
        let bom = bill_of_materials(&p, &[]);
        let mgmt = bom.iter().find(|r| r.category == BomCategory::Management).unwrap();
        assert_eq!(mgmt.item, MGMT_CABLE);
        assert_eq!(mgmt.quantity, 6);

        let without = preview(&clos(2, 4, 1), &FacilityDefaults::default()).unwrap();
        assert!(bill_of_materials(&without, &[])
            .iter()
            .all(|r| r.category != BomCategory::Management));
    }

    #[test]
    fn test_patch_panel_ports_in_link_order() {
        let p = preview(&clos(2, 2, 1), &FacilityDefaults::default()).unwrap();
        let runs = cable_runs(&p, &[]);
        assert_eq!(runs[0].side_a_patch_panel.as_deref(), Some("hall-1-row-1-pp"));
        assert_eq!(runs[0].side_a_pp_port.as_deref(), Some("Port 1"));
        assert_eq!(runs[0].side_b_pp_port.as_deref(), Some("Port 2"));
        assert_eq!(runs[1].side_a_pp_port.as_deref(), Some("Port 3"));
        assert_eq!(runs[1].side_b_pp_port.as_deref(), Some("Port 4"));
    }

    #[test]
    fn test_bidirectional_assignments_collapse() {
        let p = preview(&clos(2, 2, 1), &FacilityDefaults::default()).unwrap();
        let link = &p.fabric_links[0];
        let forward = PortAssignment {
            device: link.side_a_hostname.clone(),
            port_name: link.side_a_interface.clone(),
            remote_device: link.side_b_hostname.clone(),
            remote_port_name: link.side_b_interface.clone(),
            patch_panel_a: Some("pp-x".to_string()),
            patch_panel_a_port: Some("Port 9".to_string()),
            patch_panel_b: None,
            patch_panel_b_port: None,
            cable_length_meters: None,
        };
        let reverse = PortAssignment {
            device: link.side_b_hostname.clone(),
            port_name: link.side_b_interface.clone(),
            remote_device: link.side_a_hostname.clone(),
            remote_port_name: link.side_a_interface.clone(),
            patch_panel_a: Some("pp-y".to_string()),
            patch_panel_a_port: Some("Port 10".to_string()),
            patch_panel_b: None,
            patch_panel_b_port: None,
            cable_length_meters: Some(12.0),
        };
        let extra = PortAssignment {
            device: "server-1".to_string(),
            port_name: "eth0".to_string(),
            remote_device: "leaf-1".to_string(),
            remote_port_name: "Ethernet48".to_string(),
            patch_panel_a: None,
            patch_panel_a_port: None,
            patch_panel_b: None,
            patch_panel_b_port: None,
            cable_length_meters: None,
        };

        let base = cable_runs(&p, &[]).len();
        let runs = cable_runs(&p, &[forward, reverse, extra.clone(), extra]);
        assert_eq!(runs.len(), base + 1);
        assert_eq!(runs[0].side_a_patch_panel.as_deref(), Some("pp-x"));
        assert_eq!(runs[0].side_a_pp_port.as_deref(), Some("Port 9"));
        assert_eq!(runs[0].side_b_patch_panel.as_deref(), Some("pp-y"));
        assert_eq!(runs[0].side_b_pp_port.as_deref(), Some("Port 10"));
        assert_eq!(runs[0].cable_length_meters, Some(12.0));
    }

    #[test]
    fn test_rack_sheet_units_top_down() {
        let cfg = TopologyConfig {
            racks_per_row: 2,
            ..clos(2, 4, 1)
        };
        let p = preview(&cfg, &FacilityDefaults::default()).unwrap();
        let wb = connection_workbook(&p, &[]);
        assert_eq!(wb.racks.len(), p.racks.len());
        assert_eq!(wb.summary.cable_count, 8);

        for sheet in &wb.racks {
            assert_eq!(sheet.units.len(), 42);
            assert_eq!(sheet.units[0].ru, 42);
            assert_eq!(sheet.units[41].ru, 1);
        }
        let leaf_rack = wb
            .racks
            .iter()
            .find(|s| s.units.iter().any(|u| u.hostname.as_deref() == Some("leaf-1")))
            .unwrap();
        let keys: HashSet<(String, String)> = leaf_rack
            .links
            .iter()
            .map(|l| (l.device.clone(), l.interface.clone()))
            .collect();
        assert_eq!(keys.len(), leaf_rack.links.len());
        assert!(leaf_rack.links.iter().all(|l| l.device.starts_with("leaf-")));
    }

    #[test]
    fn test_unracked_grouped_by_row() {
        let cfg = TopologyConfig {
            external_count: 2,
            ..clos(2, 4, 1)
        };
        let p = preview(&cfg, &FacilityDefaults::default()).unwrap();
        let wb = connection_workbook(&p, &[]);
        let last = wb.unracked.last().unwrap();
        assert_eq!(last.label, "Unassigned");
        assert!(last.devices.iter().any(|d| d.hostname == "external-1"));
        assert_eq!(wb.summary.unracked_count, wb.unracked.iter().map(|g| g.devices.len()).sum::<usize>());
    }

    #[test]
    fn test_csv_headers_and_first_run() {
        let p = preview(&clos(2, 2, 1), &FacilityDefaults::default()).unwrap();
        let csv = bom_csv(&bill_of_materials(&p, &[])).unwrap();
        assert_eq!(csv.lines().next(), Some("Category,Item,Specification,Quantity,Unit Length,Notes"));
        let cut = cutsheet_csv(&cable_runs(&p, &[])).unwrap();
        let mut lines = cut.lines();
        assert_eq!(lines.next(), Some(CUTSHEET_CSV_HEADER.join(",").as_str()));
        assert!(lines.next().unwrap().starts_with("spine-1,Ethernet1,hall-1-row-1-pp,Port 1,leaf-1,"));
    }

    #[test]
    fn test_csv_quotes_special_fields() {
        let rows = vec![BomRow {
            category: BomCategory::Device,
            item: "7050CX3-32S".to_string(),
            specification: "spine, \"core\" tier".to_string(),
            quantity: 2,
            unit_length_meters: None,
            notes: "line one\nline two".to_string(),
        }];
        let csv = bom_csv(&rows).unwrap();
        let body = csv.split_once('\n').unwrap().1;
        assert_eq!(body, "Device,7050CX3-32S,\"spine, \"\"core\"\" tier\",2,,\"line one\nline two\"\n");
    }

    #[test]
    fn test_empty_preview_gives_empty_documents() {
        let p = empty_preview();
        assert!(bill_of_materials(&p, &[]).is_empty());
        assert!(cable_runs(&p, &[]).is_empty());
        let wb = connection_workbook(&p, &[]);
        assert!(wb.racks.is_empty());
        assert!(wb.unracked.is_empty());
        assert_eq!(cutsheet_csv(&[]).unwrap(), format!("{}\n", CUTSHEET_CSV_HEADER.join(",")));
    }
}
