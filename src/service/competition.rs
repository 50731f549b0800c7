//! Services for series, matches, and rallies.

use crate::db::ConnectionManager;
use crate::error::StoreResult;
use crate::model::{
    Match, MatchPatch, NewMatch, NewRally, NewSeries, Rally, RallyPatch, Series, SeriesPatch,
};
use crate::query::Page;
use crate::repo::{MatchFilter, MatchRepo, RallyRepo, SeriesFilter, SeriesRepo};
use crate::service::with_timeout;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SeriesService {
    manager: Arc<ConnectionManager>,
    timeout: Duration,
}

impl SeriesService {
    pub fn new(manager: Arc<ConnectionManager>, timeout: Duration) -> Self {
        Self { manager, timeout }
    }

    pub async fn create(&self, new: NewSeries) -> StoreResult<Series> {
        with_timeout("series.create", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let series = SeriesRepo::create(&mut tx, &new).await?;
            tx.commit().await?;
            info!(series_id = %series.id, season = %series.season, "Created series");
            Ok(series)
        })
        .await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Series> {
        with_timeout("series.get", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            SeriesRepo::get(&mut conn, id).await
        })
        .await
    }

    pub async fn update(&self, id: &str, patch: SeriesPatch) -> StoreResult<Series> {
        with_timeout("series.update", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let series = SeriesRepo::update(&mut tx, id, &patch).await?;
            tx.commit().await?;
            info!(series_id = %id, "Updated series");
            Ok(series)
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        with_timeout("series.delete", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            SeriesRepo::delete(&mut tx, id).await?;
            tx.commit().await?;
            info!(series_id = %id, "Deleted series");
            Ok(())
        })
        .await
    }

    pub async fn list(&self, filter: SeriesFilter, page: Page) -> StoreResult<Vec<Series>> {
        with_timeout("series.list", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            SeriesRepo::list(&mut conn, &filter, page).await
        })
        .await
    }
}

#[derive(Debug, Clone)]
pub struct MatchService {
    manager: Arc<ConnectionManager>,
    timeout: Duration,
}

impl MatchService {
    pub fn new(manager: Arc<ConnectionManager>, timeout: Duration) -> Self {
        Self { manager, timeout }
    }

    pub async fn create(&self, new: NewMatch) -> StoreResult<Match> {
        with_timeout("match.create", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let game = MatchRepo::create(&mut tx, &new).await?;
            tx.commit().await?;
            info!(match_id = %game.id, series_id = %game.series_id, "Created match");
            Ok(game)
        })
        .await
    }

    /// Create a match together with its opening rallies, atomically.
    ///
    /// Either the match and every rally land, or nothing does.
    pub async fn create_with_rallies(
        &self,
        new: NewMatch,
        rallies: Vec<NewRally>,
    ) -> StoreResult<(Match, Vec<Rally>)> {
        with_timeout("match.create_with_rallies", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let game = MatchRepo::create(&mut tx, &new).await?;
            let mut created = Vec::with_capacity(rallies.len());
            for new_rally in &rallies {
                created.push(RallyRepo::append(&mut tx, &game.id, new_rally).await?);
            }
            tx.commit().await?;
            info!(
                match_id = %game.id,
                rallies = created.len(),
                "Created match with opening rallies"
            );
            Ok((game, created))
        })
        .await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Match> {
        with_timeout("match.get", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            MatchRepo::get(&mut conn, id).await
        })
        .await
    }

    pub async fn update(&self, id: &str, patch: MatchPatch) -> StoreResult<Match> {
        with_timeout("match.update", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let game = MatchRepo::update(&mut tx, id, &patch).await?;
            tx.commit().await?;
            info!(match_id = %id, "Updated match");
            Ok(game)
        })
        .await
    }

    /// Delete a match; owned rallies, videos, and cameras cascade.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        with_timeout("match.delete", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            MatchRepo::delete(&mut tx, id).await?;
            tx.commit().await?;
            info!(match_id = %id, "Deleted match");
            Ok(())
        })
        .await
    }

    pub async fn list(&self, filter: MatchFilter, page: Page) -> StoreResult<Vec<Match>> {
        with_timeout("match.list", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            MatchRepo::list(&mut conn, &filter, page).await
        })
        .await
    }
}

#[derive(Debug, Clone)]
pub struct RallyService {
    manager: Arc<ConnectionManager>,
    timeout: Duration,
}

impl RallyService {
    pub fn new(manager: Arc<ConnectionManager>, timeout: Duration) -> Self {
        Self { manager, timeout }
    }

    /// Record the next rally of a match.
    pub async fn create(&self, match_id: &str, new: NewRally) -> StoreResult<Rally> {
        with_timeout("rally.create", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let rally = RallyRepo::append(&mut tx, match_id, &new).await?;
            tx.commit().await?;
            info!(
                rally_id = %rally.id,
                match_id = %match_id,
                seq_index = rally.seq_index,
                "Recorded rally"
            );
            Ok(rally)
        })
        .await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Rally> {
        with_timeout("rally.get", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            RallyRepo::get(&mut conn, id).await
        })
        .await
    }

    pub async fn update(&self, id: &str, patch: RallyPatch) -> StoreResult<Rally> {
        with_timeout("rally.update", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let rally = RallyRepo::update(&mut tx, id, &patch).await?;
            tx.commit().await?;
            info!(rally_id = %id, "Updated rally");
            Ok(rally)
        })
        .await
    }

    /// Delete a rally and renumber the rest of the match in one transaction.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        with_timeout("rally.delete", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            RallyRepo::delete_and_renumber(&mut tx, id).await?;
            tx.commit().await?;
            info!(rally_id = %id, "Deleted rally");
            Ok(())
        })
        .await
    }

    pub async fn list_for_match(&self, match_id: &str, page: Page) -> StoreResult<Vec<Rally>> {
        with_timeout("rally.list", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            RallyRepo::list_for_match(&mut conn, match_id, page).await
        })
        .await
    }
}
