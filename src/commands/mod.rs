//! Commands module - CLI command implementations.
//!
//! Each command is implemented in its own module and opens its database
//! connection through [`connect`].

pub mod admin;
pub mod migrate;
pub mod serve;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;

/// Open the database, applying pending migrations first when `migrate` is set.
pub(crate) async fn connect(config: &Config, migrate: bool) -> AppResult<Database> {
    let connected = if migrate {
        Database::connect(config).await
    } else {
        Database::connect_without_migrations(config).await
    };

    connected.map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))
}
