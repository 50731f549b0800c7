//! Repository (CRUD) layer.
//!
//! One repository per entity, all operating on `&mut SqliteConnection` so a
//! caller-owned transaction spans every nested call. The write path is
//! always validate, then constraint pre-checks, then the statement; the
//! schema's real constraints back the pre-checks up, so a concurrent racer
//! still loses with a `ConstraintViolation` rather than corrupting data.

pub mod competition;
pub mod media;
pub mod reference;

pub use competition::{MatchFilter, MatchRepo, RallyRepo, SeriesFilter, SeriesRepo};
pub use media::{CameraRepo, VideoRepo};
pub use reference::{NationFilter, NationRepo, PlayerFilter, PlayerRepo, TeamFilter, TeamRepo};

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

/// Generate a fresh entity identifier.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Timestamp for an update: now, nudged forward if the clock has not moved
/// since the previous write, so `updated_at` strictly increases.
pub(crate) fn next_timestamp(after: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > after {
        now
    } else {
        after + Duration::microseconds(1)
    }
}

/// Verify a referenced parent row exists before a write.
///
/// Missing references surface as `ConstraintViolation` naming the
/// relationship, matching what the schema's FK would raise under a race.
pub(crate) async fn ensure_referenced_row(
    conn: &mut SqliteConnection,
    table: &'static str,
    entity: &'static str,
    id: &str,
) -> StoreResult<()> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table);
    let found: Option<i64> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    if found.is_some() {
        Ok(())
    } else {
        Err(StoreError::constraint(
            format!("fk_{}", table),
            format!("referenced {} '{}' does not exist", entity, id),
        ))
    }
}

/// Reject a delete while dependent child rows exist (RESTRICT policy).
pub(crate) async fn reject_if_children(
    conn: &mut SqliteConnection,
    child_table: &'static str,
    fk_column: &'static str,
    entity: &'static str,
    id: &str,
    dependent: &'static str,
) -> StoreResult<()> {
    let sql = format!(
        "SELECT 1 FROM {} WHERE {} = ?1 LIMIT 1",
        child_table, fk_column
    );
    let found: Option<i64> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    if found.is_some() {
        Err(StoreError::dependency_exists(entity, id, dependent))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_unique() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_next_timestamp_strictly_increases() {
        let base = Utc::now();
        let next = next_timestamp(base);
        assert!(next > base);

        // Even a timestamp from the future moves forward.
        let future = Utc::now() + Duration::seconds(60);
        let next = next_timestamp(future);
        assert!(next > future);
    }
}
