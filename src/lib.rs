pub mod commit;
pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod router;
pub mod topology;

use config::Config;
use db::Store;

/// Application state shared across handlers
pub struct AppState {
    pub store: Store,
    pub config: Config,
}
