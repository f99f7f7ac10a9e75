use serde::{Deserialize, Serialize};

/// Network racks host the spine-class tier, device racks the leaf-class tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RackKind {
    Network,
    Device,
}

impl RackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RackKind::Network => "network",
            RackKind::Device => "device",
        }
    }
}

/// Rack is one physical rack of the planned facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rack {
    pub index: usize,
    pub name: String,
    pub hall: usize,
    pub row: usize,
    /// 1-based slot within the row, network rack included
    pub position_in_row: usize,
    pub hall_name: String,
    pub row_name: String,
    pub rack_type: RackKind,
    pub width_cm: usize,
    pub height_ru: u32,
    pub depth_cm: usize,
    /// Edge-tier device slots (0 for network racks)
    pub capacity: usize,
}

/// Row is a line of racks inside a hall
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub number: usize,
    pub name: String,
    pub rack_indices: Vec<usize>,
}

/// Hall groups rows; halls belong to the configured datacenter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hall {
    pub number: usize,
    pub name: String,
    pub rows: Vec<Row>,
}

/// Group a flat rack list into the hall → row containment tree, preserving
/// first-seen order at every level.
pub fn facility_tree(racks: &[Rack]) -> Vec<Hall> {
    let mut halls: Vec<Hall> = Vec::new();
    for rack in racks {
        let hall = match halls.iter().position(|h| h.number == rack.hall) {
            Some(i) => &mut halls[i],
            None => {
                halls.push(Hall {
                    number: rack.hall,
                    name: rack.hall_name.clone(),
                    rows: Vec::new(),
                });
                let last = halls.len() - 1;
                &mut halls[last]
            }
        };
        match hall.rows.iter_mut().find(|r| r.number == rack.row) {
            Some(row) => row.rack_indices.push(rack.index),
            None => hall.rows.push(Row {
                number: rack.row,
                name: rack.row_name.clone(),
                rack_indices: vec![rack.index],
            }),
        }
    }
    halls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rack(index: usize, hall: usize, row: usize) -> Rack {
        Rack {
            index,
            name: format!("Hall {} Row {} Rack {}", hall, row, index),
            hall,
            row,
            position_in_row: 1,
            hall_name: format!("Hall {}", hall),
            row_name: format!("Hall {} Row {}", hall, row),
            rack_type: RackKind::Device,
            width_cm: 60,
            height_ru: 42,
            depth_cm: 100,
            capacity: 2,
        }
    }

    #[test]
    fn test_facility_tree_groups_by_hall_and_row() {
        let racks = vec![rack(0, 1, 1), rack(1, 1, 1), rack(2, 1, 2), rack(3, 2, 1)];
        let tree = facility_tree(&racks);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].rows.len(), 2);
        assert_eq!(tree[0].rows[0].rack_indices, vec![0, 1]);
        assert_eq!(tree[1].name, "Hall 2");
        assert_eq!(tree[1].rows[0].rack_indices, vec![3]);
    }

    #[test]
    fn test_facility_tree_empty() {
        assert!(facility_tree(&[]).is_empty());
    }
}
