use sqlx::{Row, sqlite::SqliteRow};

use crate::models::*;

/// Filter empty strings to None — used when DB stores '' instead of NULL
pub fn none_if_empty(opt: Option<String>) -> Option<String> {
    opt.filter(|s| !s.is_empty())
}

/// Stored ids use 0 for "no datacenter"
fn none_if_zero(v: i64) -> Option<i64> {
    if v == 0 { None } else { Some(v) }
}

pub fn map_hall_row(row: &SqliteRow) -> HallRecord {
    HallRecord {
        id: row.get("id"),
        datacenter_id: none_if_zero(row.get("datacenter_id")),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

pub fn map_rack_row(row: &SqliteRow) -> RackRecord {
    let height_ru: i64 = row.get("height_ru");
    RackRecord {
        id: row.get("id"),
        row_id: row.get("row_id"),
        name: row.get("name"),
        rack_type: row.get("rack_type"),
        height_ru: u32::try_from(height_ru).unwrap_or(0),
        row_name: row.get("row_name"),
        hall_name: row.get("hall_name"),
        created_at: row.get("created_at"),
    }
}

/// Map a SQLite row to a DeviceRecord
pub fn map_device_row(row: &SqliteRow) -> DeviceRecord {
    DeviceRecord {
        id: row.get("id"),
        hostname: row.get("hostname"),
        role: row.get("role"),
        model: row.get("model"),
        device_type: row.get("device_type"),
        topology_name: row.get("topology_name"),
        loopback: none_if_empty(row.get("loopback")),
        asn: row
            .try_get::<Option<i64>, _>("asn")
            .ok()
            .flatten()
            .and_then(|v| u32::try_from(v).ok()),
        mgmt_ip: none_if_empty(row.get("mgmt_ip")),
        rack_id: row.try_get::<Option<i64>, _>("rack_id").ok().flatten(),
        rack_position: {
            let v: i64 = row.get("rack_position");
            if v <= 0 { None } else { u32::try_from(v).ok() }
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
