//! Services for nations, teams, and players.

use crate::db::ConnectionManager;
use crate::error::StoreResult;
use crate::model::{
    Nation, NationPatch, NewNation, NewPlayer, NewTeam, Player, PlayerPatch, Team, TeamPatch,
};
use crate::query::Page;
use crate::repo::{NationFilter, NationRepo, PlayerFilter, PlayerRepo, TeamFilter, TeamRepo};
use crate::service::with_timeout;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct NationService {
    manager: Arc<ConnectionManager>,
    timeout: Duration,
}

impl NationService {
    pub fn new(manager: Arc<ConnectionManager>, timeout: Duration) -> Self {
        Self { manager, timeout }
    }

    pub async fn create(&self, new: NewNation) -> StoreResult<Nation> {
        with_timeout("nation.create", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let nation = NationRepo::create(&mut tx, &new).await?;
            tx.commit().await?;
            info!(nation_id = %nation.id, code = %nation.code, "Created nation");
            Ok(nation)
        })
        .await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Nation> {
        with_timeout("nation.get", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            NationRepo::get(&mut conn, id).await
        })
        .await
    }

    pub async fn update(&self, id: &str, patch: NationPatch) -> StoreResult<Nation> {
        with_timeout("nation.update", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let nation = NationRepo::update(&mut tx, id, &patch).await?;
            tx.commit().await?;
            info!(nation_id = %id, "Updated nation");
            Ok(nation)
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        with_timeout("nation.delete", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            NationRepo::delete(&mut tx, id).await?;
            tx.commit().await?;
            info!(nation_id = %id, "Deleted nation");
            Ok(())
        })
        .await
    }

    pub async fn list(&self, filter: NationFilter, page: Page) -> StoreResult<Vec<Nation>> {
        with_timeout("nation.list", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            NationRepo::list(&mut conn, &filter, page).await
        })
        .await
    }
}

#[derive(Debug, Clone)]
pub struct TeamService {
    manager: Arc<ConnectionManager>,
    timeout: Duration,
}

impl TeamService {
    pub fn new(manager: Arc<ConnectionManager>, timeout: Duration) -> Self {
        Self { manager, timeout }
    }

    pub async fn create(&self, new: NewTeam) -> StoreResult<Team> {
        with_timeout("team.create", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let team = TeamRepo::create(&mut tx, &new).await?;
            tx.commit().await?;
            info!(team_id = %team.id, "Created team");
            Ok(team)
        })
        .await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Team> {
        with_timeout("team.get", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            TeamRepo::get(&mut conn, id).await
        })
        .await
    }

    pub async fn update(&self, id: &str, patch: TeamPatch) -> StoreResult<Team> {
        with_timeout("team.update", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let team = TeamRepo::update(&mut tx, id, &patch).await?;
            tx.commit().await?;
            info!(team_id = %id, "Updated team");
            Ok(team)
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        with_timeout("team.delete", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            TeamRepo::delete(&mut tx, id).await?;
            tx.commit().await?;
            info!(team_id = %id, "Deleted team");
            Ok(())
        })
        .await
    }

    pub async fn list(&self, filter: TeamFilter, page: Page) -> StoreResult<Vec<Team>> {
        with_timeout("team.list", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            TeamRepo::list(&mut conn, &filter, page).await
        })
        .await
    }
}

#[derive(Debug, Clone)]
pub struct PlayerService {
    manager: Arc<ConnectionManager>,
    timeout: Duration,
}

impl PlayerService {
    pub fn new(manager: Arc<ConnectionManager>, timeout: Duration) -> Self {
        Self { manager, timeout }
    }

    pub async fn create(&self, new: NewPlayer) -> StoreResult<Player> {
        with_timeout("player.create", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let player = PlayerRepo::create(&mut tx, &new).await?;
            tx.commit().await?;
            info!(
                player_id = %player.id,
                team_id = %player.team_id,
                jersey = player.jersey_number,
                "Created player"
            );
            Ok(player)
        })
        .await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Player> {
        with_timeout("player.get", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            PlayerRepo::get(&mut conn, id).await
        })
        .await
    }

    pub async fn update(&self, id: &str, patch: PlayerPatch) -> StoreResult<Player> {
        with_timeout("player.update", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            let player = PlayerRepo::update(&mut tx, id, &patch).await?;
            tx.commit().await?;
            info!(player_id = %id, "Updated player");
            Ok(player)
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        with_timeout("player.delete", self.timeout, async {
            let mut tx = self.manager.begin_write().await?;
            PlayerRepo::delete(&mut tx, id).await?;
            tx.commit().await?;
            info!(player_id = %id, "Deleted player");
            Ok(())
        })
        .await
    }

    pub async fn list(&self, filter: PlayerFilter, page: Page) -> StoreResult<Vec<Player>> {
        with_timeout("player.list", self.timeout, async {
            let mut conn = self.manager.acquire().await?;
            PlayerRepo::list(&mut conn, &filter, page).await
        })
        .await
    }
}
