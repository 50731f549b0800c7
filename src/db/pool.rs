//! Connection pool management.
//!
//! This module owns the SQLite connection pool: sizing, acquire timeouts,
//! idle recycling, health probing, and eviction of connections that fail
//! validation. Nothing outside `db/` constructs pools or raw connections.

use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Connection, Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Health probe outcome exposed to liveness/readiness collaborators.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthReport {
    pub ok: bool,
    pub detail: String,
}

/// Owns the database connection pool and its lifecycle.
///
/// One manager per process; callers share it behind an `Arc`. Every
/// transaction and every read goes through here, so the pool is the only
/// shared mutable resource in the layer.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    pool: SqlitePool,
    acquire_timeout: Duration,
}

impl ConnectionManager {
    /// Open the pool described by `config` and verify it with one probe.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool_opts = &config.pool_options;
        let acquire_timeout = Duration::from_secs(pool_opts.acquire_timeout_or_default());

        let options = SqliteConnectOptions::from_str(&config.connection_string)
            .map_err(|e| {
                StoreError::unhealthy(format!(
                    "invalid connection string {}: {}",
                    config.masked_connection_string(),
                    e
                ))
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(pool_opts.busy_timeout_or_default()));

        let pool = SqlitePoolOptions::new()
            .min_connections(pool_opts.min_connections_or_default())
            .max_connections(pool_opts.max_connections_or_default())
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Some(Duration::from_secs(pool_opts.idle_timeout_or_default())))
            .max_lifetime(Some(Duration::from_secs(pool_opts.max_lifetime_or_default())))
            .test_before_acquire(pool_opts.test_before_acquire_or_default())
            .connect_with(options)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to open connection pool");
                StoreError::unhealthy("failed to open the database")
            })?;

        info!(
            database = %config.masked_connection_string(),
            max_connections = pool_opts.max_connections_or_default(),
            min_connections = pool_opts.min_connections_or_default(),
            acquire_timeout_secs = acquire_timeout.as_secs(),
            "Connection pool opened"
        );

        let manager = Self {
            pool,
            acquire_timeout,
        };

        let report = manager.health_check().await;
        if !report.ok {
            manager.close().await;
            return Err(StoreError::unhealthy(report.detail));
        }

        Ok(manager)
    }

    /// Acquire a validated connection from the pool.
    ///
    /// A connection that fails the validation probe is detached from the
    /// pool and closed, and acquisition is retried once before the failure
    /// surfaces. Waiting longer than the acquire timeout fails with
    /// `PoolExhausted`. Dropping the returned connection releases it back
    /// to the pool.
    pub async fn acquire(&self) -> StoreResult<PoolConnection<Sqlite>> {
        match self.acquire_validated().await {
            Ok(conn) => Ok(conn),
            Err(StoreError::ConnectionUnhealthy { detail }) => {
                warn!(detail = %detail, "Evicted unhealthy connection, retrying acquire");
                self.acquire_validated().await
            }
            Err(e) => Err(e),
        }
    }

    async fn acquire_validated(&self) -> StoreResult<PoolConnection<Sqlite>> {
        let mut conn = self.pool.acquire().await.map_err(|e| match e {
            sqlx::Error::PoolTimedOut => {
                StoreError::pool_exhausted(self.acquire_timeout.as_secs())
            }
            other => other.into(),
        })?;

        match sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&mut *conn)
            .await
        {
            Ok(_) => Ok(conn),
            Err(e) => {
                // Detach so the pool never hands this connection out again.
                let raw = conn.detach();
                let _ = raw.close().await;
                Err(StoreError::unhealthy(format!(
                    "connection failed validation probe: {}",
                    e
                )))
            }
        }
    }

    /// Begin a write transaction.
    ///
    /// Writers serialize at `BEGIN IMMEDIATE`, so two transactions racing
    /// on the same uniqueness constraint resolve as exactly one winner
    /// instead of a snapshot-upgrade conflict mid-flight. Dropping the
    /// returned transaction rolls it back and returns the connection to
    /// the pool.
    pub async fn begin_write(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        match self.begin_immediate().await {
            Ok(tx) => Ok(tx),
            Err(StoreError::ConnectionUnhealthy { detail }) => {
                warn!(detail = %detail, "Transaction begin failed on unhealthy connection, retrying");
                self.begin_immediate().await
            }
            Err(e) => Err(e),
        }
    }

    async fn begin_immediate(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| match e {
                sqlx::Error::PoolTimedOut => {
                    StoreError::pool_exhausted(self.acquire_timeout.as_secs())
                }
                sqlx::Error::Io(io_err) => {
                    StoreError::unhealthy(format!("I/O error beginning transaction: {}", io_err))
                }
                other => other.into(),
            })
    }

    /// Issue a trivial round-trip query and report the pool's health.
    pub async fn health_check(&self) -> HealthReport {
        match sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => {
                debug!(
                    size = self.pool.size(),
                    idle = self.pool.num_idle(),
                    "Health check passed"
                );
                HealthReport {
                    ok: true,
                    detail: format!(
                        "pool ok ({} connections, {} idle)",
                        self.pool.size(),
                        self.pool.num_idle()
                    ),
                }
            }
            Err(e) => {
                warn!(error = %e, "Health check failed");
                HealthReport {
                    ok: false,
                    detail: format!("health probe failed: {}", e),
                }
            }
        }
    }

    /// The underlying pool, for migrations and read-only statements.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Configured acquire timeout.
    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Connection pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    async fn memory_manager() -> ConnectionManager {
        let config = DatabaseConfig::parse("sqlite::memory:?max_connections=2").unwrap();
        ConnectionManager::connect(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_connect_and_health_check() {
        let manager = memory_manager().await;
        let report = manager.health_check().await;
        assert!(report.ok);
        assert!(report.detail.contains("pool ok"));
    }

    #[tokio::test]
    async fn test_acquire_returns_usable_connection() {
        let manager = memory_manager().await;
        let mut conn = manager.acquire().await.unwrap();
        let value: i64 = sqlx::query_scalar("SELECT 41 + 1")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let manager = memory_manager().await;
        // In-memory pools give each connection its own database, so pin a
        // single shared table through one connection instead.
        let mut tx = manager.begin_write().await.unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .execute(&mut *tx)
            .await
            .unwrap();
        drop(tx); // rollback

        let mut tx = manager.begin_write().await.unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .execute(&mut *tx)
            .await
            .expect("table from rolled-back transaction must not exist");
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_marks_pool_unusable() {
        let manager = memory_manager().await;
        manager.close().await;
        let result = manager.acquire().await;
        assert!(result.is_err());
    }
}
