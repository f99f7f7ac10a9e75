use serde::{Deserialize, Serialize};

/// FabricLink is one physical point-to-point link between two devices.
/// Side A is the upper tier (or the GPU node for GPU uplinks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FabricLink {
    pub side_a_hostname: String,
    pub side_a_interface: String,
    pub side_a_ip: String,
    pub side_b_hostname: String,
    pub side_b_interface: String,
    pub side_b_ip: String,
    pub subnet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cable_length_meters: Option<f64>,
}

impl FabricLink {
    /// Direction-independent identity of the physical cable
    pub fn dedup_key(&self) -> CableKey {
        CableKey::new(
            &self.side_a_hostname,
            &self.side_a_interface,
            &self.side_b_hostname,
            &self.side_b_interface,
        )
    }

    pub fn with_cable_length(&self, cable_length_meters: Option<f64>) -> FabricLink {
        FabricLink {
            cable_length_meters,
            ..self.clone()
        }
    }
}

/// Sorted (deviceA, portA, deviceB, portB) tuple so that A→B and B→A
/// port-assignment entries collapse onto one cable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CableKey {
    pub low: (String, String),
    pub high: (String, String),
}

impl CableKey {
    pub fn new(dev_a: &str, port_a: &str, dev_b: &str, port_b: &str) -> Self {
        let a = (dev_a.to_string(), port_a.to_string());
        let b = (dev_b.to_string(), port_b.to_string());
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }
}
