//! Repositories for match videos and cameras.

use crate::error::{StoreError, StoreResult};
use crate::model::{Camera, CameraPatch, NewCamera, NewVideo, Video, VideoPatch};
use crate::query::{Filter, Page, Sort, bind_param_as, build_select};
use crate::repo::{ensure_referenced_row, new_id, next_timestamp};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

const VIDEO_COLUMNS: &[&str] = &[
    "id",
    "match_id",
    "uri",
    "duration_secs",
    "created_at",
    "updated_at",
];
const CAMERA_COLUMNS: &[&str] = &[
    "id",
    "match_id",
    "label",
    "created_at",
    "updated_at",
];

pub struct VideoRepo;

impl VideoRepo {
    pub async fn create(
        conn: &mut SqliteConnection,
        match_id: &str,
        new: &NewVideo,
    ) -> StoreResult<Video> {
        new.validate()?;
        ensure_referenced_row(&mut *conn, "matches", "match", match_id).await?;

        let now = Utc::now();
        let video = Video {
            id: new_id(),
            match_id: match_id.to_string(),
            uri: new.uri.trim().to_string(),
            duration_secs: new.duration_secs,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO videos (id, match_id, uri, duration_secs, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&video.id)
        .bind(&video.match_id)
        .bind(&video.uri)
        .bind(video.duration_secs)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&mut *conn)
        .await?;

        debug!(video_id = %video.id, match_id = %match_id, "Inserted video");
        Ok(video)
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Video> {
        sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StoreError::not_found("video", id))
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        id: &str,
        patch: &VideoPatch,
    ) -> StoreResult<Video> {
        if patch.is_empty() {
            return Err(StoreError::validation("video", "patch", "no fields to update"));
        }
        let current = Self::get(&mut *conn, id).await?;
        let merged = patch.apply(&current);
        merged.validate()?;

        let updated_at = next_timestamp(current.updated_at);
        sqlx::query("UPDATE videos SET uri = ?1, duration_secs = ?2, updated_at = ?3 WHERE id = ?4")
            .bind(merged.uri.trim())
            .bind(merged.duration_secs)
            .bind(updated_at)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(Video {
            uri: merged.uri.trim().to_string(),
            duration_secs: merged.duration_secs,
            updated_at,
            ..current
        })
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("video", id));
        }
        debug!(video_id = %id, "Deleted video");
        Ok(())
    }

    pub async fn list_for_match(
        conn: &mut SqliteConnection,
        match_id: &str,
        page: Page,
    ) -> StoreResult<Vec<Video>> {
        let filter = Filter::new().eq("match_id", match_id);
        let (sql, params) = build_select(
            "videos",
            VIDEO_COLUMNS,
            &filter,
            &Sort::asc("created_at"),
            &page,
        )?;
        let mut query = sqlx::query_as::<_, Video>(&sql);
        for param in &params {
            query = bind_param_as(query, param);
        }
        Ok(query.fetch_all(&mut *conn).await?)
    }
}

pub struct CameraRepo;

impl CameraRepo {
    pub async fn create(
        conn: &mut SqliteConnection,
        match_id: &str,
        new: &NewCamera,
    ) -> StoreResult<Camera> {
        new.validate()?;
        ensure_referenced_row(&mut *conn, "matches", "match", match_id).await?;
        Self::ensure_label_free(&mut *conn, match_id, new.label.trim(), None).await?;

        let now = Utc::now();
        let camera = Camera {
            id: new_id(),
            match_id: match_id.to_string(),
            label: new.label.trim().to_string(),
            calibration: new.calibration.clone(),
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO cameras (id, match_id, label, calibration, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&camera.id)
        .bind(&camera.match_id)
        .bind(&camera.label)
        .bind(&camera.calibration)
        .bind(camera.created_at)
        .bind(camera.updated_at)
        .execute(&mut *conn)
        .await?;

        debug!(camera_id = %camera.id, match_id = %match_id, label = %camera.label, "Inserted camera");
        Ok(camera)
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Camera> {
        sqlx::query_as::<_, Camera>("SELECT * FROM cameras WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StoreError::not_found("camera", id))
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        id: &str,
        patch: &CameraPatch,
    ) -> StoreResult<Camera> {
        if patch.is_empty() {
            return Err(StoreError::validation("camera", "patch", "no fields to update"));
        }
        let current = Self::get(&mut *conn, id).await?;
        let merged = patch.apply(&current);
        merged.validate()?;

        if merged.label.trim() != current.label {
            Self::ensure_label_free(&mut *conn, &current.match_id, merged.label.trim(), Some(id))
                .await?;
        }

        let updated_at = next_timestamp(current.updated_at);
        sqlx::query("UPDATE cameras SET label = ?1, calibration = ?2, updated_at = ?3 WHERE id = ?4")
            .bind(merged.label.trim())
            .bind(&merged.calibration)
            .bind(updated_at)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(Camera {
            label: merged.label.trim().to_string(),
            calibration: merged.calibration,
            updated_at,
            ..current
        })
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM cameras WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("camera", id));
        }
        debug!(camera_id = %id, "Deleted camera");
        Ok(())
    }

    pub async fn list_for_match(
        conn: &mut SqliteConnection,
        match_id: &str,
        page: Page,
    ) -> StoreResult<Vec<Camera>> {
        let filter = Filter::new().eq("match_id", match_id);
        let (sql, params) = build_select(
            "cameras",
            CAMERA_COLUMNS,
            &filter,
            &Sort::asc("label"),
            &page,
        )?;
        let mut query = sqlx::query_as::<_, Camera>(&sql);
        for param in &params {
            query = bind_param_as(query, param);
        }
        Ok(query.fetch_all(&mut *conn).await?)
    }

    async fn ensure_label_free(
        conn: &mut SqliteConnection,
        match_id: &str,
        label: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<()> {
        let taken: Option<String> = sqlx::query_scalar(
            "SELECT id FROM cameras WHERE match_id = ?1 AND label = ?2 AND id <> ?3",
        )
        .bind(match_id)
        .bind(label)
        .bind(exclude_id.unwrap_or(""))
        .fetch_optional(&mut *conn)
        .await?;
        if taken.is_some() {
            return Err(StoreError::constraint(
                "uq_cameras_match_label",
                format!("camera label '{}' is already used for this match", label),
            ));
        }
        Ok(())
    }
}
