//! Services for match videos and cameras.

use crate::db::ConnectionManager;
use crate::error::StoreResult;
use crate::model::{Camera, CameraPatch, NewCamera, NewVideo, Video, VideoPatch};
use crate::query::Page;
use crate::repo::{CameraRepo, VideoRepo};
use crate::service::with_timeout;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct VideoService {
    manager: Arc<ConnectionManager>,
    timeout: Duration,
}

impl VideoService {
    pub fn new(manager: Arc<ConnectionManager>, timeout: Duration) -> Self {
        Self { manager, timeout }
    }

    pub async fn create(&self, match_id: &str, new: NewVideo) -> StoreResult<Video> {
        with_timeout("video.create", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let video = VideoRepo::create(&mut tx, match_id, &new).await?;
            tx.commit().await?;
            info!(video_id = %video.id, match_id = %match_id, "Registered video");
            Ok(video)
        })
        .await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Video> {
        with_timeout("video.get", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            VideoRepo::get(&mut conn, id).await
        })
        .await
    }

    pub async fn update(&self, id: &str, patch: VideoPatch) -> StoreResult<Video> {
        with_timeout("video.update", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let video = VideoRepo::update(&mut tx, id, &patch).await?;
            tx.commit().await?;
            info!(video_id = %id, "Updated video");
            Ok(video)
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        with_timeout("video.delete", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            VideoRepo::delete(&mut tx, id).await?;
            tx.commit().await?;
            info!(video_id = %id, "Deleted video");
            Ok(())
        })
        .await
    }

    pub async fn list_for_match(&self, match_id: &str, page: Page) -> StoreResult<Vec<Video>> {
        with_timeout("video.list", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            VideoRepo::list_for_match(&mut conn, match_id, page).await
        })
        .await
    }
}

#[derive(Debug, Clone)]
pub struct CameraService {
    manager: Arc<ConnectionManager>,
    timeout: Duration,
}

impl CameraService {
    pub fn new(manager: Arc<ConnectionManager>, timeout: Duration) -> Self {
        Self { manager, timeout }
    }

    pub async fn create(&self, match_id: &str, new: NewCamera) -> StoreResult<Camera> {
        with_timeout("camera.create", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let camera = CameraRepo::create(&mut tx, match_id, &new).await?;
            tx.commit().await?;
            info!(camera_id = %camera.id, match_id = %match_id, "Registered camera");
            Ok(camera)
        })
        .await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Camera> {
        with_timeout("camera.get", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            CameraRepo::get(&mut conn, id).await
        })
        .await
    }

    pub async fn update(&self, id: &str, patch: CameraPatch) -> StoreResult<Camera> {
        with_timeout("camera.update", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let camera = CameraRepo::update(&mut tx, id, &patch).await?;
            tx.commit().await?;
            info!(camera_id = %id, "Updated camera");
            Ok(camera)
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        with_timeout("camera.delete", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            CameraRepo::delete(&mut tx, id).await?;
            tx.commit().await?;
            info!(camera_id = %id, "Deleted camera");
            Ok(())
        })
        .await
    }

    pub async fn list_for_match(&self, match_id: &str, page: Page) -> StoreResult<Vec<Camera>> {
        with_timeout("camera.list", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            CameraRepo::list_for_match(&mut conn, match_id, page).await
        })
        .await
    }
}
