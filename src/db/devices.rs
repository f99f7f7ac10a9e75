use anyhow::Result;
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::models::*;

use super::row_helpers::map_device_row;
use super::NotFoundError;

const SELECT_DEVICE: &str = r#"
    SELECT id, hostname, role, model, device_type, topology_name, loopback, asn,
           mgmt_ip, rack_id, rack_position, created_at, updated_at
    FROM devices
"#;

/// Device database operations
pub struct DeviceRepo;

impl DeviceRepo {
    pub async fn list(pool: &Pool<Sqlite>) -> Result<Vec<DeviceRecord>> {
        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_DEVICE))
            .fetch_all(pool)
            .await?;

        Ok(rows.iter().map(map_device_row).collect())
    }

    pub async fn get_by_hostname(pool: &Pool<Sqlite>, hostname: &str) -> Result<DeviceRecord> {
        let row = sqlx::query(&format!("{} WHERE hostname = ?", SELECT_DEVICE))
            .bind(hostname)
            .fetch_optional(pool)
            .await?;

        row.as_ref()
            .map(map_device_row)
            .ok_or_else(|| NotFoundError::new("Device", hostname).into())
    }

    /// Insert a device unless its hostname is already registered
    pub async fn upsert(pool: &Pool<Sqlite>, req: &CreateDeviceRequest) -> Result<Upserted> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO devices (hostname, role, model, device_type, topology_name, loopback, asn,
                                 mgmt_ip, hall_id, row_id, rack_id, rack_position, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(hostname) DO NOTHING
            "#,
        )
        .bind(&req.hostname)
        .bind(req.role.as_str())
        .bind(&req.model)
        .bind(req.device_type.as_str())
        .bind(&req.topology_name)
        .bind(req.loopback.clone().unwrap_or_default())
        .bind(req.asn.map(i64::from))
        .bind(req.mgmt_ip.clone().unwrap_or_default())
        .bind(req.hall_id)
        .bind(req.row_id)
        .bind(req.rack_id)
        .bind(req.rack_position.map(i64::from).unwrap_or(0))
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(Upserted::Created(result.last_insert_rowid()));
        }
        let (id,): (i64,) = sqlx::query_as("SELECT id FROM devices WHERE hostname = ?")
            .bind(&req.hostname)
            .fetch_one(pool)
            .await?;
        Ok(Upserted::AlreadyExists(id))
    }
}
