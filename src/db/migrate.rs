//! Embedded schema migrations.
//!
//! Migration files live in `migrations/` and are compiled into the binary,
//! so a freshly configured database is schema-complete after startup.

use crate::error::{StoreError, StoreResult};
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use tracing::{error, info};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply all pending migrations.
pub async fn run(pool: &SqlitePool) -> StoreResult<()> {
    MIGRATOR.run(pool).await.map_err(|e| {
        error!(error = %e, "Migration failed");
        StoreError::internal("schema migration failed")
    })?;
    info!("Schema migrations applied");
    Ok(())
}
