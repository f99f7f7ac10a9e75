use std::collections::HashMap;

use crate::models::{Device, FabricLink, Rack};

use super::placement::FacilityShape;

/// Post clearance added to the rack width for one rack slot (8cm each side)
const RACK_POST_CLEARANCE_CM: usize = 16;
/// 1U = 4.445cm (1.75")
const U_HEIGHT_CM: f64 = 4.445;

/// Standard stocked cable lengths in meters
pub const CABLE_LADDER_M: [f64; 11] = [0.5, 1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 15.0, 20.0, 30.0, 50.0];
/// Used when a link has no length estimate
pub const DEFAULT_CABLE_LENGTH_M: f64 = 3.0;

/// Estimate cable length in meters between two racked devices.
///
/// Accounts for horizontal distance between racks, row spacing, and vertical
/// distance within racks (distance from the cable tray at the top of the rack).
/// All internal math is in centimeters; output is rounded to 0.1 m.
pub fn estimate_cable_length(
    a: (&Rack, u32),
    b: (&Rack, u32),
    shape: &FacilityShape,
    slack_percent: i32,
) -> f64 {
    let (rack_a, pos_a) = a;
    let (rack_b, pos_b) = b;
    let slot_cm = (shape.rack_width_cm + RACK_POST_CLEARANCE_CM) as f64;

    let row_a = (rack_a.hall - 1) * shape.rows_per_hall + (rack_a.row - 1);
    let row_b = (rack_b.hall - 1) * shape.rows_per_hall + (rack_b.row - 1);
    let in_row_a = rack_a.position_in_row.saturating_sub(1);
    let in_row_b = rack_b.position_in_row.saturating_sub(1);

    // Horizontal distance (cm)
    let horizontal_cm = if row_a == row_b {
        in_row_a.abs_diff(in_row_b) as f64 * slot_cm
    } else {
        // Different rows: distance within each row to the aisle + row spacing
        let row_diff = row_a.abs_diff(row_b);
        (in_row_a + in_row_b) as f64 * slot_cm + (row_diff * shape.row_spacing_cm) as f64
    };

    // Vertical distance (cm)
    let vertical_cm = if rack_a.index == rack_b.index {
        pos_a.abs_diff(pos_b) as f64 * U_HEIGHT_CM
    } else {
        let up_a = rack_a.height_ru.saturating_sub(pos_a) as f64 * U_HEIGHT_CM;
        let up_b = rack_b.height_ru.saturating_sub(pos_b) as f64 * U_HEIGHT_CM;
        up_a + up_b
    };

    // Add slack for service loops, convert to meters
    let with_slack_cm = (horizontal_cm + vertical_cm) * (1.0 + slack_percent as f64 / 100.0);
    let meters = with_slack_cm / 100.0;
    (meters * 10.0).round() / 10.0
}

/// Round a length up onto the stocked ladder; past the ladder round up to a whole meter
pub fn round_cable_length(meters: f64) -> f64 {
    CABLE_LADDER_M
        .iter()
        .copied()
        .find(|&step| step >= meters)
        .unwrap_or_else(|| meters.ceil())
}

/// Ladder length of a link, with unknown lengths taken as the default
pub fn standard_length(meters: Option<f64>) -> f64 {
    meters.map(round_cable_length).unwrap_or(DEFAULT_CABLE_LENGTH_M)
}

/// Looks up rack placements by hostname and annotates links with estimates
pub struct CableEstimator<'a> {
    slots: HashMap<&'a str, (&'a Rack, u32)>,
    shape: &'a FacilityShape,
    slack_percent: i32,
}

impl<'a> CableEstimator<'a> {
    pub fn new(devices: &'a [Device], racks: &'a [Rack], shape: &'a FacilityShape, slack_percent: i32) -> Self {
        let slots = devices
            .iter()
            .filter_map(|d| {
                let p = d.placement.as_ref()?;
                let rack = racks.get(p.rack_index)?;
                Some((d.hostname.as_str(), (rack, p.rack_position)))
            })
            .collect();
        Self {
            slots,
            shape,
            slack_percent,
        }
    }

    /// `None` when either side is unracked
    pub fn length(&self, a: &str, b: &str) -> Option<f64> {
        let a = self.slots.get(a)?;
        let b = self.slots.get(b)?;
        Some(estimate_cable_length(*a, *b, self.shape, self.slack_percent))
    }

    pub fn annotate(&self, links: &[FabricLink]) -> Vec<FabricLink> {
        links
            .iter()
            .map(|l| l.with_cable_length(self.length(&l.side_a_hostname, &l.side_b_hostname)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::placement::{build_racks, RackPlacement};

    fn shape() -> FacilityShape {
        FacilityShape {
            halls: 1,
            rows_per_hall: 2,
            racks_per_row: 2,
            devices_per_rack: 2,
            row_spacing_cm: 120,
            rack_width_cm: 60,
            rack_height_ru: 42,
            rack_depth_cm: 100,
        }
    }

    #[test]
    fn test_ladder_rounding() {
        assert_eq!(round_cable_length(2.2), 3.0);
        assert_eq!(round_cable_length(3.0), 3.0);
        assert_eq!(round_cable_length(0.3), 0.5);
        assert_eq!(round_cable_length(51.0), 51.0);
        assert_eq!(round_cable_length(51.2), 52.0);
        assert_eq!(standard_length(None), 3.0);
    }

    #[test]
    fn test_same_rack_is_vertical_only() {
        let s = shape();
        let racks = build_racks(&s, RackPlacement::Default);
        assert_eq!(estimate_cable_length((&racks[0], 1), (&racks[0], 3), &s, 0), 0.1);
    }

    #[test]
    fn test_adjacent_racks_same_row() {
        let s = shape();
        let racks = build_racks(&s, RackPlacement::Default);
        // 76cm across + 2 × 41U up to the tray
        assert_eq!(estimate_cable_length((&racks[0], 1), (&racks[1], 1), &s, 0), 4.4);
        assert_eq!(estimate_cable_length((&racks[0], 1), (&racks[1], 1), &s, 20), 5.3);
    }

    #[test]
    fn test_cross_row_adds_row_spacing() {
        let s = shape();
        let racks = build_racks(&s, RackPlacement::Default);
        // rack 0 of row 1 to rack 3 (first slot) of row 2: 120cm + both verticals at U42
        assert_eq!(racks[3].row, 2);
        assert_eq!(estimate_cable_length((&racks[0], 42), (&racks[3], 42), &s, 0), 1.2);
    }
}
