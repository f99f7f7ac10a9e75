use anyhow::Result;
use sqlx::{Pool, Sqlite};

use crate::models::*;

/// Facility defaults database operations
pub struct SettingsRepo;

impl SettingsRepo {
    pub async fn get(pool: &Pool<Sqlite>) -> Result<FacilityDefaults> {
        let row: (String,) = sqlx::query_as("SELECT data FROM settings WHERE id = 1")
            .fetch_one(pool)
            .await?;
        Ok(serde_json::from_str(&row.0)?)
    }

    pub async fn update(pool: &Pool<Sqlite>, defaults: &FacilityDefaults) -> Result<()> {
        let data = serde_json::to_string(defaults)?;
        sqlx::query("UPDATE settings SET data = ? WHERE id = 1")
            .bind(&data)
            .execute(pool)
            .await?;
        Ok(())
    }
}
