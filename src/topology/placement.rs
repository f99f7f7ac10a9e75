use std::collections::HashMap;
use tracing::{debug, warn};

use crate::models::{Device, DeviceRole, DeviceType, MgmtScope, Rack, RackKind, RackSlot, Role};

use super::error::ConfigError;

/// Where a tier goes within a row.
///
/// For the network tier this picks the row slot of the network rack; for the
/// edge tier it picks the order in which device racks are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RackPlacement {
    Default,
    Beginning,
    Middle,
    End,
    /// 1-based rack number
    Rack(usize),
}

impl RackPlacement {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Some(Self::Default),
            "beginning" | "start" => Some(Self::Beginning),
            "middle" | "center" => Some(Self::Middle),
            "end" => Some(Self::End),
            other => other.parse::<usize>().ok().filter(|n| *n >= 1).map(Self::Rack),
        }
    }

    /// 1-based slot of the network rack in a row of `slots` racks
    pub fn network_slot(&self, slots: usize) -> usize {
        match self {
            Self::Default | Self::Middle => (slots.saturating_sub(1)) / 2 + 1,
            Self::Beginning => 1,
            Self::End => slots.max(1),
            Self::Rack(n) => (*n).clamp(1, slots.max(1)),
        }
    }

    /// 0-based device rack ordinals of one row, in the order they are filled
    pub fn fill_order(&self, device_racks: usize) -> Vec<usize> {
        let n = device_racks;
        match self {
            Self::Default | Self::Beginning => (0..n).collect(),
            Self::End => (0..n).rev().collect(),
            Self::Middle => {
                let mut order: Vec<usize> = (0..n).collect();
                order.sort_by_key(|&k| ((2 * k as i64 - (n as i64 - 1)).abs(), k));
                order
            }
            Self::Rack(r) => {
                if n == 0 {
                    return Vec::new();
                }
                let start = (r - 1).min(n - 1);
                (start..n).chain(0..start).collect()
            }
        }
    }
}

/// Stacking direction of devices within a rack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuPlacement {
    Bottom,
    Middle,
    Top,
}

impl RuPlacement {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "bottom" => Some(Self::Bottom),
            "middle" => Some(Self::Middle),
            "top" => Some(Self::Top),
            _ => None,
        }
    }
}

/// Physical shape of the facility
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityShape {
    pub halls: usize,
    pub rows_per_hall: usize,
    /// Device racks per row; each row also gets one network rack
    pub racks_per_row: usize,
    pub devices_per_rack: usize,
    pub row_spacing_cm: usize,
    pub rack_width_cm: usize,
    pub rack_height_ru: u32,
    pub rack_depth_cm: usize,
}

impl FacilityShape {
    pub fn row_count(&self) -> usize {
        self.halls.saturating_mul(self.rows_per_hall)
    }

    pub fn rack_slots_per_row(&self) -> usize {
        self.racks_per_row.saturating_add(1)
    }

    pub fn device_rack_count(&self) -> usize {
        self.row_count().saturating_mul(self.racks_per_row)
    }

    pub fn edge_capacity(&self) -> usize {
        self.device_rack_count().saturating_mul(self.devices_per_rack)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementPolicy {
    pub network_rack: RackPlacement,
    pub edge_fill: RackPlacement,
    pub ru: RuPlacement,
    pub patch_panels: bool,
    pub patch_panel_model: String,
    /// Prefix for synthesized patch panel hostnames
    pub datacenter_name: String,
}

#[derive(Debug, Clone)]
pub struct FacilityPlan {
    pub devices: Vec<Device>,
    pub racks: Vec<Rack>,
}

/// Lay out the racks of every row. Racks are indexed hall-major, then row,
/// then position within the row.
pub fn build_racks(shape: &FacilityShape, network: RackPlacement) -> Vec<Rack> {
    let slots = shape.rack_slots_per_row();
    let net_slot = network.network_slot(slots);
    let mut racks = Vec::with_capacity(shape.row_count().saturating_mul(slots));

    for h in 1..=shape.halls {
        for r in 1..=shape.rows_per_hall {
            let mut k = 0;
            for pos in 1..=slots {
                let (name, rack_type, capacity) = if pos == net_slot {
                    (format!("Hall {} Row {} Network Rack", h, r), RackKind::Network, 0)
                } else {
                    k += 1;
                    (
                        format!("Hall {} Row {} Rack {}", h, r, k),
                        RackKind::Device,
                        shape.devices_per_rack,
                    )
                };
                racks.push(Rack {
                    index: racks.len(),
                    name,
                    hall: h,
                    row: r,
                    position_in_row: pos,
                    hall_name: format!("Hall {}", h),
                    row_name: format!("Row {}", r),
                    rack_type,
                    width_cm: shape.rack_width_cm,
                    height_ru: shape.rack_height_ru,
                    depth_cm: shape.rack_depth_cm,
                    capacity,
                });
            }
        }
    }
    racks
}

/// Map devices onto racks. Devices that already carry a placement keep it;
/// devices that cannot fit stay unracked.
pub fn plan(devices: Vec<Device>, shape: &FacilityShape, policy: &PlacementPolicy) -> FacilityPlan {
    let racks = build_racks(shape, policy.network_rack);
    let mut planner = Planner::new(&racks, devices);

    planner.claim_existing();
    if policy.patch_panels {
        planner.add_patch_panels(shape, policy);
    }
    planner.place_mgmt_switches();
    planner.place_network_tier(policy.ru);
    planner.place_edge_tier(shape, policy);
    planner.place_gpu_nodes();

    let devices = planner.devices;
    debug!(
        "Placed {} of {} devices across {} racks",
        devices.iter().filter(|d| d.placement.is_some()).count(),
        devices.len(),
        racks.len()
    );
    FacilityPlan { devices, racks }
}

/// Verify that every placed device lies inside its rack and that no two
/// devices share a rack unit.
pub fn check_placements(devices: &[Device], racks: &[Rack]) -> Result<(), ConfigError> {
    let mut units: Vec<RackUnits> = racks.iter().map(|r| RackUnits::new(r.height_ru)).collect();
    for dev in devices {
        let Some(slot) = &dev.placement else { continue };
        let size = dev.kind().rack_units();
        let Some(rack) = units.get_mut(slot.rack_index) else {
            return Err(ConfigError::invalid(format!(
                "{} is placed in unknown rack {}",
                dev.hostname, slot.rack_index
            )));
        };
        if !rack.fits(slot.rack_position, size) {
            return Err(ConfigError::invalid(format!(
                "{} at U{} does not fit the {} RU rack {}",
                dev.hostname,
                slot.rack_position,
                rack.height(),
                racks[slot.rack_index].name
            )));
        }
        if !rack.is_free(slot.rack_position, size) {
            return Err(ConfigError::invalid(format!(
                "{} at U{} overlaps another device in {}",
                dev.hostname, slot.rack_position, racks[slot.rack_index].name
            )));
        }
        rack.claim(slot.rack_position, size);
    }
    Ok(())
}

/// Rack unit occupancy of a single rack
#[derive(Debug, Clone)]
struct RackUnits {
    used: Vec<bool>,
}

impl RackUnits {
    fn new(height: u32) -> Self {
        Self {
            used: vec![false; height as usize],
        }
    }

    fn height(&self) -> u32 {
        self.used.len() as u32
    }

    /// Whether `units` starting at `bottom` lie inside the rack
    fn fits(&self, bottom: u32, units: u32) -> bool {
        bottom >= 1
            && bottom
                .checked_add(units.saturating_sub(1))
                .is_some_and(|top| top <= self.height())
    }

    fn is_free(&self, bottom: u32, units: u32) -> bool {
        self.fits(bottom, units) && (bottom..bottom + units).all(|u| !self.used[(u - 1) as usize])
    }

    fn claim(&mut self, bottom: u32, units: u32) {
        for u in bottom.max(1)..bottom.saturating_add(units) {
            if let Some(slot) = self.used.get_mut((u - 1) as usize) {
                *slot = true;
            }
        }
    }

    /// Lowest RU of the first free block of `units`, scanning per `order`
    fn find(&self, units: u32, order: RuPlacement) -> Option<u32> {
        let max_bottom = self.height().checked_sub(units)? + 1;
        match order {
            RuPlacement::Bottom => (1..=max_bottom).find(|&b| self.is_free(b, units)),
            RuPlacement::Top => (1..=max_bottom).rev().find(|&b| self.is_free(b, units)),
            RuPlacement::Middle => {
                let start = (self.height() / 2).clamp(1, max_bottom);
                (start..=max_bottom)
                    .chain((1..start).rev())
                    .find(|&b| self.is_free(b, units))
            }
        }
    }

    /// First free block at or above `start`
    fn find_from(&self, start: u32, units: u32) -> Option<u32> {
        let max_bottom = self.height().checked_sub(units)? + 1;
        (start.max(1)..=max_bottom).find(|&b| self.is_free(b, units))
    }
}

struct Planner<'a> {
    racks: &'a [Rack],
    units: Vec<RackUnits>,
    /// Edge-tier devices counted against each rack's capacity
    edge_slots: Vec<usize>,
    devices: Vec<Device>,
}

impl<'a> Planner<'a> {
    fn new(racks: &'a [Rack], devices: Vec<Device>) -> Self {
        Self {
            racks,
            units: racks.iter().map(|r| RackUnits::new(r.height_ru)).collect(),
            edge_slots: vec![0; racks.len()],
            devices,
        }
    }

    fn claim_existing(&mut self) {
        for dev in &self.devices {
            let Some(slot) = &dev.placement else { continue };
            let units = dev.kind().rack_units();
            match self.units.get_mut(slot.rack_index) {
                Some(rack) if rack.is_free(slot.rack_position, units) => {
                    rack.claim(slot.rack_position, units);
                    if dev.kind().is_leaf_class() {
                        self.edge_slots[slot.rack_index] += 1;
                    }
                }
                _ => warn!(
                    "Keeping placement of {} at {} U{} although it does not fit the planned racks",
                    dev.hostname, slot.rack_name, slot.rack_position
                ),
            }
        }
    }

    fn assign(&mut self, dev: usize, rack: usize, ru: u32) {
        let units = self.devices[dev].kind().rack_units();
        self.units[rack].claim(ru, units);
        let r = &self.racks[rack];
        self.devices[dev].placement = Some(RackSlot {
            rack_index: r.index,
            rack_name: r.name.clone(),
            hall: r.hall,
            row: r.row,
            rack_position: ru,
        });
    }

    fn rack_at(&self, hall: usize, row: usize, position: usize) -> Option<usize> {
        self.racks
            .iter()
            .position(|r| r.hall == hall && r.row == row && r.position_in_row == position)
    }

    fn unplaced(&self, pred: impl Fn(Role) -> bool) -> Vec<usize> {
        self.devices
            .iter()
            .enumerate()
            .filter(|(_, d)| d.placement.is_none() && pred(d.kind()))
            .map(|(i, _)| i)
            .collect()
    }

    // ── Patch panels: one per row, top RU of the row's first rack ──
    fn add_patch_panels(&mut self, shape: &FacilityShape, policy: &PlacementPolicy) {
        for h in 1..=shape.halls {
            for r in 1..=shape.rows_per_hall {
                let exists = self.devices.iter().any(|d| {
                    matches!(d.role, DeviceRole::PatchPanel { hall, row } if hall == h && row == r)
                });
                if exists {
                    continue;
                }
                let base = format!("hall-{}-row-{}-pp", h, r);
                let hostname = if policy.datacenter_name.is_empty() {
                    base
                } else {
                    format!("{}-{}", policy.datacenter_name, base)
                };
                let index = self.devices.len();
                self.devices.push(Device {
                    index,
                    hostname,
                    model: policy.patch_panel_model.clone(),
                    device_type: DeviceType::Internal,
                    role: DeviceRole::PatchPanel { hall: h, row: r },
                    placement: None,
                });

                let slot = self
                    .rack_at(h, r, 1)
                    .and_then(|rack| self.units[rack].find(1, RuPlacement::Top).map(|ru| (rack, ru)));
                match slot {
                    Some((rack, ru)) => self.assign(index, rack, ru),
                    None => warn!("No room for patch panel in hall {} row {}", h, r),
                }
            }
        }
    }

    // ── Management switches: top of their scope rack, under the patch panel ──
    fn place_mgmt_switches(&mut self) {
        for dev in self.unplaced(|r| r == Role::MgmtSwitch) {
            let DeviceRole::MgmtSwitch { scope, .. } = self.devices[dev].role else {
                continue;
            };
            let target = match scope {
                MgmtScope::Hall { hall } => self.rack_at(hall, 1, 1),
                MgmtScope::Row { hall, row } => self.rack_at(hall, row, 1),
                MgmtScope::Rack { hall, row, rack } => self.rack_at(hall, row, rack),
            };
            let slot = target.and_then(|rack| self.units[rack].find(1, RuPlacement::Top).map(|ru| (rack, ru)));
            match slot {
                Some((rack, ru)) => self.assign(dev, rack, ru),
                None => warn!("Leaving management switch {} unracked", self.devices[dev].hostname),
            }
        }
    }

    // ── Network tier: round-robin across network racks ──
    fn place_network_tier(&mut self, ru: RuPlacement) {
        let net_racks: Vec<usize> = self
            .racks
            .iter()
            .filter(|r| r.rack_type == RackKind::Network)
            .map(|r| r.index)
            .collect();
        if net_racks.is_empty() {
            return;
        }
        let tier = self.unplaced(|r| matches!(r, Role::Spine | Role::SuperSpine | Role::Distribution));
        for (i, dev) in tier.into_iter().enumerate() {
            let units = self.devices[dev].kind().rack_units();
            let first = i % net_racks.len();
            let slot = (0..net_racks.len())
                .map(|k| net_racks[(first + k) % net_racks.len()])
                .find_map(|rack| self.units[rack].find(units, ru).map(|pos| (rack, pos)));
            match slot {
                Some((rack, pos)) => self.assign(dev, rack, pos),
                None => warn!("No network rack space left for {}", self.devices[dev].hostname),
            }
        }
    }

    // ── Edge tier: fill device racks devices_per_rack at a time ──
    fn place_edge_tier(&mut self, shape: &FacilityShape, policy: &PlacementPolicy) {
        let per_row = policy.edge_fill.fill_order(shape.racks_per_row);
        let mut fill: Vec<usize> = Vec::with_capacity(shape.device_rack_count());
        for h in 1..=shape.halls {
            for r in 1..=shape.rows_per_hall {
                let row_racks: Vec<usize> = self
                    .racks
                    .iter()
                    .filter(|x| x.hall == h && x.row == r && x.rack_type == RackKind::Device)
                    .map(|x| x.index)
                    .collect();
                fill.extend(per_row.iter().filter_map(|&k| row_racks.get(k).copied()));
            }
        }

        let mut cursor = 0;
        for dev in self.unplaced(|r| r.is_leaf_class()) {
            while cursor < fill.len() && self.edge_slots[fill[cursor]] >= self.racks[fill[cursor]].capacity {
                cursor += 1;
            }
            let units = self.devices[dev].kind().rack_units();
            let slot = fill[cursor.min(fill.len())..].iter().find_map(|&rack| {
                if self.edge_slots[rack] >= self.racks[rack].capacity {
                    return None;
                }
                self.units[rack].find(units, policy.ru).map(|pos| (rack, pos))
            });
            match slot {
                Some((rack, pos)) => {
                    self.edge_slots[rack] += 1;
                    self.assign(dev, rack, pos);
                }
                None => warn!("No device rack capacity left for {}", self.devices[dev].hostname),
            }
        }
    }

    // ── GPU nodes: stacked above their leaf in the leaf's rack ──
    fn place_gpu_nodes(&mut self) {
        let by_hostname: HashMap<String, usize> = self
            .devices
            .iter()
            .enumerate()
            .map(|(i, d)| (d.hostname.clone(), i))
            .collect();

        for dev in self.unplaced(|r| r == Role::GpuNode) {
            let DeviceRole::GpuNode { leaf, .. } = &self.devices[dev].role else {
                continue;
            };
            let leaf_slot = by_hostname
                .get(leaf)
                .and_then(|&i| self.devices[i].placement.as_ref())
                .map(|p| (p.rack_index, p.rack_position));
            let Some((rack, leaf_ru)) = leaf_slot else {
                continue;
            };
            let units = Role::GpuNode.rack_units();
            let pos = self.units[rack]
                .find_from(leaf_ru + 1, units)
                .or_else(|| self.units[rack].find(units, RuPlacement::Bottom));
            match pos {
                Some(pos) => self.assign(dev, rack, pos),
                None => warn!("No room for GPU node {} in its leaf rack", self.devices[dev].hostname),
            }
        }
    }
}
