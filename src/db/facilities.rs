use anyhow::Result;
use sqlx::{Pool, Sqlite};

use crate::models::*;

use super::row_helpers::{map_hall_row, map_rack_row};

/// Hall, row and rack database operations. Every create is an idempotent
/// upsert keyed by (parent, name).
pub struct FacilityRepo;

impl FacilityRepo {
    pub async fn upsert_hall(pool: &Pool<Sqlite>, req: &CreateHallRequest) -> Result<Upserted> {
        let datacenter_id = req.datacenter_id.unwrap_or(0);
        let result = sqlx::query(
            "INSERT INTO dc_halls (datacenter_id, name, created_at) VALUES (?, ?, ?) ON CONFLICT(datacenter_id, name) DO NOTHING",
        )
        .bind(datacenter_id)
        .bind(&req.name)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(Upserted::Created(result.last_insert_rowid()));
        }
        let (id,): (i64,) = sqlx::query_as("SELECT id FROM dc_halls WHERE datacenter_id = ? AND name = ?")
            .bind(datacenter_id)
            .bind(&req.name)
            .fetch_one(pool)
            .await?;
        Ok(Upserted::AlreadyExists(id))
    }

    pub async fn upsert_row(pool: &Pool<Sqlite>, req: &CreateRowRequest) -> Result<Upserted> {
        let result = sqlx::query(
            "INSERT INTO dc_rows (hall_id, name, created_at) VALUES (?, ?, ?) ON CONFLICT(hall_id, name) DO NOTHING",
        )
        .bind(req.hall_id)
        .bind(&req.name)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(Upserted::Created(result.last_insert_rowid()));
        }
        let (id,): (i64,) = sqlx::query_as("SELECT id FROM dc_rows WHERE hall_id = ? AND name = ?")
            .bind(req.hall_id)
            .bind(&req.name)
            .fetch_one(pool)
            .await?;
        Ok(Upserted::AlreadyExists(id))
    }

    pub async fn upsert_rack(pool: &Pool<Sqlite>, req: &CreateRackRequest) -> Result<Upserted> {
        let result = sqlx::query(
            r#"
            INSERT INTO dc_racks (row_id, name, rack_type, width_cm, height_ru, depth_cm, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(row_id, name) DO NOTHING
            "#,
        )
        .bind(req.row_id)
        .bind(&req.name)
        .bind(req.rack_type.as_str())
        .bind(req.width_cm as i64)
        .bind(i64::from(req.height_ru))
        .bind(req.depth_cm as i64)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(Upserted::Created(result.last_insert_rowid()));
        }
        let (id,): (i64,) = sqlx::query_as("SELECT id FROM dc_racks WHERE row_id = ? AND name = ?")
            .bind(req.row_id)
            .bind(&req.name)
            .fetch_one(pool)
            .await?;
        Ok(Upserted::AlreadyExists(id))
    }

    pub async fn list_halls(pool: &Pool<Sqlite>) -> Result<Vec<HallRecord>> {
        let rows = sqlx::query("SELECT id, datacenter_id, name, created_at FROM dc_halls ORDER BY id")
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(map_hall_row).collect())
    }

    pub async fn list_racks(pool: &Pool<Sqlite>) -> Result<Vec<RackRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.row_id, r.name, r.rack_type, r.height_ru, r.created_at,
                   w.name AS row_name, h.name AS hall_name
            FROM dc_racks r
            JOIN dc_rows w ON w.id = r.row_id
            JOIN dc_halls h ON h.id = w.hall_id
            ORDER BY r.id
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.iter().map(map_rack_row).collect())
    }
}
