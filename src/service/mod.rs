//! Service facade.
//!
//! The only surface external callers use. Each service wraps repository
//! calls in a single write transaction per operation: the transaction
//! commits only if every nested step succeeds, and the first failure
//! propagates unchanged while the dropped transaction rolls back and the
//! connection returns to the pool. Reads run as single statements on an
//! acquired connection.

pub mod competition;
pub mod media;
pub mod reference;

pub use competition::{MatchService, RallyService, SeriesService};
pub use media::{CameraService, VideoService};
pub use reference::{NationService, PlayerService, TeamService};

use crate::config::Config;
use crate::db::{ConnectionManager, HealthReport, migrate};
use crate::error::{StoreError, StoreResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Bound one operation by the configured statement timeout.
///
/// An elapsed deadline drops the operation's future; any open transaction
/// rolls back on drop and its connection goes back to the pool before the
/// caller sees the failure.
pub(crate) async fn with_timeout<T, F>(
    operation: &'static str,
    limit: Duration,
    fut: F,
) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                operation,
                timeout_secs = limit.as_secs(),
                "Operation deadline elapsed, transaction rolled back"
            );
            Err(StoreError::timeout(operation, limit.as_secs()))
        }
    }
}

/// Handle bundling every entity service over one shared pool.
#[derive(Debug, Clone)]
pub struct Store {
    manager: Arc<ConnectionManager>,
    statement_timeout: Duration,
}

impl Store {
    /// Open the pool from configuration and bring the schema up to date.
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let db_config = config
            .parse_database()
            .map_err(|e| StoreError::validation("config", "database", e))?;
        let manager = Arc::new(ConnectionManager::connect(&db_config).await?);
        migrate::run(manager.pool()).await?;
        Ok(Self {
            manager,
            statement_timeout: config.statement_timeout_duration(),
        })
    }

    /// Build a store over an already-connected manager.
    pub fn from_manager(manager: Arc<ConnectionManager>, statement_timeout: Duration) -> Self {
        Self {
            manager,
            statement_timeout,
        }
    }

    pub fn nations(&self) -> NationService {
        NationService::new(self.manager.clone(), self.statement_timeout)
    }

    pub fn teams(&self) -> TeamService {
        TeamService::new(self.manager.clone(), self.statement_timeout)
    }

    pub fn players(&self) -> PlayerService {
        PlayerService::new(self.manager.clone(), self.statement_timeout)
    }

    pub fn series(&self) -> SeriesService {
        SeriesService::new(self.manager.clone(), self.statement_timeout)
    }

    pub fn matches(&self) -> MatchService {
        MatchService::new(self.manager.clone(), self.statement_timeout)
    }

    pub fn rallies(&self) -> RallyService {
        RallyService::new(self.manager.clone(), self.statement_timeout)
    }

    pub fn videos(&self) -> VideoService {
        VideoService::new(self.manager.clone(), self.statement_timeout)
    }

    pub fn cameras(&self) -> CameraService {
        CameraService::new(self.manager.clone(), self.statement_timeout)
    }

    /// Liveness/readiness probe.
    pub async fn health_check(&self) -> HealthReport {
        self.manager.health_check().await
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        self.manager.close().await;
    }
}
