mod devices;
mod facilities;
mod port_assignments;
pub(crate) mod row_helpers;
mod settings;

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::models::*;

/// Typed error for "resource not found" — enables reliable downcast
/// in the API error handler instead of fragile string matching.
#[derive(Debug)]
pub struct NotFoundError {
    pub resource: String,
    pub id: String,
}

impl NotFoundError {
    pub fn new(resource: &str, id: &str) -> Self {
        Self {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} not found: {}", self.resource, self.id)
    }
}

impl std::error::Error for NotFoundError {}

/// Store is the inventory database, delegating to per-entity repo modules.
#[derive(Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Create a new database store with configurable pool size
    pub async fn new(db_path: &str) -> Result<Self> {
        Self::with_pool_size(db_path, 5).await
    }

    /// Create a new database store with a specific pool size
    pub async fn with_pool_size(db_path: &str, max_connections: u32) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&db_url)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database; one connection so every query sees the same data
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations
    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;

        // Initialize facility defaults if not exists
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM settings")
            .fetch_one(&self.pool)
            .await?;

        if count.0 == 0 {
            let defaults = FacilityDefaults::default();
            let data = serde_json::to_string(&defaults)?;
            sqlx::query("INSERT INTO settings (id, data) VALUES (1, ?)")
                .bind(&data)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    // ========== Settings Operations ==========

    pub async fn get_defaults(&self) -> Result<FacilityDefaults> {
        settings::SettingsRepo::get(&self.pool).await
    }

    pub async fn update_defaults(&self, d: &FacilityDefaults) -> Result<()> {
        settings::SettingsRepo::update(&self.pool, d).await
    }

    // ========== Facility Operations ==========

    pub async fn upsert_hall(&self, req: &CreateHallRequest) -> Result<Upserted> {
        facilities::FacilityRepo::upsert_hall(&self.pool, req).await
    }

    pub async fn upsert_row(&self, req: &CreateRowRequest) -> Result<Upserted> {
        facilities::FacilityRepo::upsert_row(&self.pool, req).await
    }

    pub async fn upsert_rack(&self, req: &CreateRackRequest) -> Result<Upserted> {
        facilities::FacilityRepo::upsert_rack(&self.pool, req).await
    }

    pub async fn list_halls(&self) -> Result<Vec<HallRecord>> {
        facilities::FacilityRepo::list_halls(&self.pool).await
    }

    pub async fn list_racks(&self) -> Result<Vec<RackRecord>> {
        facilities::FacilityRepo::list_racks(&self.pool).await
    }

    // ========== Device Operations ==========

    pub async fn upsert_device(&self, req: &CreateDeviceRequest) -> Result<Upserted> {
        devices::DeviceRepo::upsert(&self.pool, req).await
    }

    pub async fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        devices::DeviceRepo::list(&self.pool).await
    }

    pub async fn get_device_by_hostname(&self, hostname: &str) -> Result<DeviceRecord> {
        devices::DeviceRepo::get_by_hostname(&self.pool, hostname).await
    }

    // ========== Port Assignment Operations ==========

    pub async fn list_port_assignments(&self) -> Result<Vec<PortAssignment>> {
        port_assignments::PortAssignmentRepo::list(&self.pool).await
    }

    pub async fn upsert_port_assignment(&self, req: &SetPortAssignmentRequest) -> Result<Upserted> {
        port_assignments::PortAssignmentRepo::upsert(&self.pool, req).await
    }
}
