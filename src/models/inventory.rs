use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeviceType, RackKind, Role};

/// Result of an idempotent insert: the row id and whether this call created it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "id", rename_all = "snake_case")]
pub enum Upserted {
    Created(i64),
    AlreadyExists(i64),
}

impl Upserted {
    pub fn id(&self) -> i64 {
        match self {
            Upserted::Created(id) | Upserted::AlreadyExists(id) => *id,
        }
    }
}

/// CreateHallRequest for creating halls under a datacenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateHallRequest {
    #[serde(default)]
    pub datacenter_id: Option<i64>,
    pub name: String,
}

/// CreateRowRequest for creating rows under a hall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRowRequest {
    pub hall_id: i64,
    pub name: String,
}

/// CreateRackRequest for creating racks under a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRackRequest {
    pub row_id: i64,
    pub name: String,
    pub rack_type: RackKind,
    pub width_cm: usize,
    pub height_ru: u32,
    pub depth_cm: usize,
}

/// CreateDeviceRequest for registering a planned device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    pub hostname: String,
    pub role: Role,
    pub model: String,
    pub device_type: DeviceType,
    #[serde(default)]
    pub topology_name: String,
    #[serde(default)]
    pub loopback: Option<String>,
    #[serde(default)]
    pub asn: Option<u32>,
    #[serde(default)]
    pub mgmt_ip: Option<String>,
    #[serde(default)]
    pub hall_id: Option<i64>,
    #[serde(default)]
    pub row_id: Option<i64>,
    #[serde(default)]
    pub rack_id: Option<i64>,
    #[serde(default)]
    pub rack_position: Option<u32>,
}

/// SetPortAssignmentRequest for recording one end of a cable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPortAssignmentRequest {
    pub device_id: i64,
    pub port_name: String,
    pub remote_device_id: i64,
    pub remote_port_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub patch_panel_a_id: Option<i64>,
    #[serde(default)]
    pub patch_panel_a_port: Option<String>,
    #[serde(default)]
    pub patch_panel_b_id: Option<i64>,
    #[serde(default)]
    pub patch_panel_b_port: Option<String>,
    #[serde(default)]
    pub cable_length_meters: Option<f64>,
}

/// HallRecord is a committed hall
#[derive(Debug, Clone, Serialize)]
pub struct HallRecord {
    pub id: i64,
    pub datacenter_id: Option<i64>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// RackRecord is a committed rack with its row and hall names
#[derive(Debug, Clone, Serialize)]
pub struct RackRecord {
    pub id: i64,
    pub row_id: i64,
    pub name: String,
    pub rack_type: String,
    pub height_ru: u32,
    pub row_name: String,
    pub hall_name: String,
    pub created_at: DateTime<Utc>,
}

/// DeviceRecord is a committed device
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRecord {
    pub id: i64,
    pub hostname: String,
    pub role: String,
    pub model: String,
    pub device_type: String,
    pub topology_name: String,
    pub loopback: Option<String>,
    pub asn: Option<u32>,
    pub mgmt_ip: Option<String>,
    pub rack_id: Option<i64>,
    pub rack_position: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
