use anyhow::Result;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::models::*;

use super::row_helpers::none_if_empty;

/// Port assignments come back keyed by hostname, the same shape the
/// cabling documents consume.
fn map_row(row: &SqliteRow) -> PortAssignment {
    PortAssignment {
        device: row.get("device_hostname"),
        port_name: row.get("port_name"),
        remote_device: row.get("remote_device_hostname"),
        remote_port_name: row.get("remote_port_name"),
        patch_panel_a: none_if_empty(row.get("patch_panel_a_hostname")),
        patch_panel_a_port: none_if_empty(row.get("patch_panel_a_port")),
        patch_panel_b: none_if_empty(row.get("patch_panel_b_hostname")),
        patch_panel_b_port: none_if_empty(row.get("patch_panel_b_port")),
        cable_length_meters: row.try_get::<Option<f64>, _>("cable_length_meters").ok().flatten(),
    }
}

const SELECT_PORT_ASSIGNMENT: &str = r#"
    SELECT pa.port_name, pa.remote_port_name,
           pa.patch_panel_a_port, pa.patch_panel_b_port, pa.cable_length_meters,
           d.hostname AS device_hostname,
           rd.hostname AS remote_device_hostname,
           ppa.hostname AS patch_panel_a_hostname,
           ppb.hostname AS patch_panel_b_hostname
    FROM device_port_assignments pa
    JOIN devices d ON d.id = pa.device_id
    JOIN devices rd ON rd.id = pa.remote_device_id
    LEFT JOIN devices ppa ON ppa.id = pa.patch_panel_a_id
    LEFT JOIN devices ppb ON ppb.id = pa.patch_panel_b_id
"#;

pub struct PortAssignmentRepo;

impl PortAssignmentRepo {
    /// Every recorded cable end
    pub async fn list(pool: &Pool<Sqlite>) -> Result<Vec<PortAssignment>> {
        let rows = sqlx::query(&format!("{} ORDER BY d.hostname, pa.port_name", SELECT_PORT_ASSIGNMENT))
            .fetch_all(pool)
            .await?;

        Ok(rows.iter().map(map_row).collect())
    }

    /// Record one cable end unless that device port is already assigned
    pub async fn upsert(pool: &Pool<Sqlite>, req: &SetPortAssignmentRequest) -> Result<Upserted> {
        let now = chrono::Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO device_port_assignments (device_id, port_name, remote_device_id, remote_port_name, description,
                patch_panel_a_id, patch_panel_a_port, patch_panel_b_id, patch_panel_b_port, cable_length_meters,
                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(device_id, port_name) DO NOTHING
            "#,
        )
        .bind(req.device_id)
        .bind(&req.port_name)
        .bind(req.remote_device_id)
        .bind(&req.remote_port_name)
        .bind(req.description.clone().unwrap_or_default())
        .bind(req.patch_panel_a_id)
        .bind(req.patch_panel_a_port.clone().unwrap_or_default())
        .bind(req.patch_panel_b_id)
        .bind(req.patch_panel_b_port.clone().unwrap_or_default())
        .bind(req.cable_length_meters)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(Upserted::Created(result.last_insert_rowid()));
        }
        let (id,): (i64,) =
            sqlx::query_as("SELECT id FROM device_port_assignments WHERE device_id = ? AND port_name = ?")
                .bind(req.device_id)
                .bind(&req.port_name)
                .fetch_one(pool)
                .await?;
        Ok(Upserted::AlreadyExists(id))
    }
}
