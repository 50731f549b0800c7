//! Repositories for nations, teams, and players.

use crate::error::{StoreError, StoreResult};
use crate::model::{
    Nation, NationPatch, NewNation, NewPlayer, NewTeam, Player, PlayerPatch, Team, TeamPatch,
};
use crate::query::{Filter, Page, Sort, bind_param_as, build_select};
use crate::repo::{ensure_referenced_row, new_id, next_timestamp, reject_if_children};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

const NATION_COLUMNS: &[&str] = &["id", "name", "code", "created_at", "updated_at"];
const TEAM_COLUMNS: &[&str] = &["id", "name", "nation_id", "created_at", "updated_at"];
const PLAYER_COLUMNS: &[&str] = &[
    "id",
    "name",
    "team_id",
    "nation_id",
    "jersey_number",
    "created_at",
    "updated_at",
];

/// List filter for nations.
#[derive(Debug, Clone, Default)]
pub struct NationFilter {
    pub code: Option<String>,
    pub name_like: Option<String>,
}

impl NationFilter {
    fn to_filter(&self) -> Filter {
        let mut f = Filter::new();
        if let Some(code) = &self.code {
            f = f.eq("code", code.trim().to_ascii_uppercase());
        }
        if let Some(pattern) = &self.name_like {
            f = f.like("name", pattern.clone());
        }
        f
    }
}

pub struct NationRepo;

impl NationRepo {
    pub async fn create(conn: &mut SqliteConnection, new: &NewNation) -> StoreResult<Nation> {
        new.validate()?;
        let code = new.normalized_code();

        let taken: Option<String> = sqlx::query_scalar("SELECT id FROM nations WHERE code = ?1")
            .bind(&code)
            .fetch_optional(&mut *conn)
            .await?;
        if taken.is_some() {
            return Err(StoreError::constraint(
                "uq_nations_code",
                format!("nation code '{}' is already taken", code),
            ));
        }

        let now = Utc::now();
        let nation = Nation {
            id: new_id(),
            name: new.name.trim().to_string(),
            code,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO nations (id, name, code, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&nation.id)
        .bind(&nation.name)
        .bind(&nation.code)
        .bind(nation.created_at)
        .bind(nation.updated_at)
        .execute(&mut *conn)
        .await?;

        debug!(nation_id = %nation.id, code = %nation.code, "Inserted nation");
        Ok(nation)
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Nation> {
        sqlx::query_as::<_, Nation>("SELECT * FROM nations WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StoreError::not_found("nation", id))
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        id: &str,
        patch: &NationPatch,
    ) -> StoreResult<Nation> {
        if patch.is_empty() {
            return Err(StoreError::validation("nation", "patch", "no fields to update"));
        }
        let current = Self::get(&mut *conn, id).await?;
        let merged = patch.apply(&current);
        merged.validate()?;
        let code = merged.normalized_code();

        if code != current.code {
            let taken: Option<String> =
                sqlx::query_scalar("SELECT id FROM nations WHERE code = ?1 AND id <> ?2")
                    .bind(&code)
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?;
            if taken.is_some() {
                return Err(StoreError::constraint(
                    "uq_nations_code",
                    format!("nation code '{}' is already taken", code),
                ));
            }
        }

        let updated_at = next_timestamp(current.updated_at);
        sqlx::query("UPDATE nations SET name = ?1, code = ?2, updated_at = ?3 WHERE id = ?4")
            .bind(merged.name.trim())
            .bind(&code)
            .bind(updated_at)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(Nation {
            name: merged.name.trim().to_string(),
            code,
            updated_at,
            ..current
        })
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> StoreResult<()> {
        reject_if_children(&mut *conn, "teams", "nation_id", "nation", id, "team").await?;
        reject_if_children(&mut *conn, "players", "nation_id", "nation", id, "player").await?;

        let result = sqlx::query("DELETE FROM nations WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("nation", id));
        }
        debug!(nation_id = %id, "Deleted nation");
        Ok(())
    }

    pub async fn list(
        conn: &mut SqliteConnection,
        filter: &NationFilter,
        page: Page,
    ) -> StoreResult<Vec<Nation>> {
        let (sql, params) = build_select(
            "nations",
            NATION_COLUMNS,
            &filter.to_filter(),
            &Sort::asc("name"),
            &page,
        )?;
        let mut query = sqlx::query_as::<_, Nation>(&sql);
        for param in &params {
            query = bind_param_as(query, param);
        }
        Ok(query.fetch_all(&mut *conn).await?)
    }
}

/// List filter for teams.
#[derive(Debug, Clone, Default)]
pub struct TeamFilter {
    pub nation_id: Option<String>,
    pub name_like: Option<String>,
}

impl TeamFilter {
    fn to_filter(&self) -> Filter {
        let mut f = Filter::new();
        if let Some(nation_id) = &self.nation_id {
            f = f.eq("nation_id", nation_id.clone());
        }
        if let Some(pattern) = &self.name_like {
            f = f.like("name", pattern.clone());
        }
        f
    }
}

pub struct TeamRepo;

impl TeamRepo {
    pub async fn create(conn: &mut SqliteConnection, new: &NewTeam) -> StoreResult<Team> {
        new.validate()?;
        ensure_referenced_row(&mut *conn, "nations", "nation", &new.nation_id).await?;

        let now = Utc::now();
        let team = Team {
            id: new_id(),
            name: new.name.trim().to_string(),
            nation_id: new.nation_id.clone(),
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO teams (id, name, nation_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&team.id)
        .bind(&team.name)
        .bind(&team.nation_id)
        .bind(team.created_at)
        .bind(team.updated_at)
        .execute(&mut *conn)
        .await?;

        debug!(team_id = %team.id, "Inserted team");
        Ok(team)
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Team> {
        sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StoreError::not_found("team", id))
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        id: &str,
        patch: &TeamPatch,
    ) -> StoreResult<Team> {
        if patch.is_empty() {
            return Err(StoreError::validation("team", "patch", "no fields to update"));
        }
        let current = Self::get(&mut *conn, id).await?;
        let merged = patch.apply(&current);
        merged.validate()?;

        if merged.nation_id != current.nation_id {
            ensure_referenced_row(&mut *conn, "nations", "nation", &merged.nation_id).await?;
        }

        let updated_at = next_timestamp(current.updated_at);
        sqlx::query("UPDATE teams SET name = ?1, nation_id = ?2, updated_at = ?3 WHERE id = ?4")
            .bind(merged.name.trim())
            .bind(&merged.nation_id)
            .bind(updated_at)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(Team {
            name: merged.name.trim().to_string(),
            nation_id: merged.nation_id,
            updated_at,
            ..current
        })
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> StoreResult<()> {
        reject_if_children(&mut *conn, "players", "team_id", "team", id, "player").await?;
        reject_if_children(&mut *conn, "matches", "home_team_id", "team", id, "match").await?;
        reject_if_children(&mut *conn, "matches", "away_team_id", "team", id, "match").await?;

        let result = sqlx::query("DELETE FROM teams WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("team", id));
        }
        debug!(team_id = %id, "Deleted team");
        Ok(())
    }

    pub async fn list(
        conn: &mut SqliteConnection,
        filter: &TeamFilter,
        page: Page,
    ) -> StoreResult<Vec<Team>> {
        let (sql, params) = build_select(
            "teams",
            TEAM_COLUMNS,
            &filter.to_filter(),
            &Sort::asc("name"),
            &page,
        )?;
        let mut query = sqlx::query_as::<_, Team>(&sql);
        for param in &params {
            query = bind_param_as(query, param);
        }
        Ok(query.fetch_all(&mut *conn).await?)
    }
}

/// List filter for players.
#[derive(Debug, Clone, Default)]
pub struct PlayerFilter {
    pub team_id: Option<String>,
    pub nation_id: Option<String>,
}

impl PlayerFilter {
    fn to_filter(&self) -> Filter {
        let mut f = Filter::new();
        if let Some(team_id) = &self.team_id {
            f = f.eq("team_id", team_id.clone());
        }
        if let Some(nation_id) = &self.nation_id {
            f = f.eq("nation_id", nation_id.clone());
        }
        f
    }
}

pub struct PlayerRepo;

impl PlayerRepo {
    pub async fn create(conn: &mut SqliteConnection, new: &NewPlayer) -> StoreResult<Player> {
        new.validate()?;
        ensure_referenced_row(&mut *conn, "teams", "team", &new.team_id).await?;
        ensure_referenced_row(&mut *conn, "nations", "nation", &new.nation_id).await?;
        Self::ensure_jersey_free(&mut *conn, &new.team_id, new.jersey_number, None).await?;

        let now = Utc::now();
        let player = Player {
            id: new_id(),
            name: new.name.trim().to_string(),
            team_id: new.team_id.clone(),
            nation_id: new.nation_id.clone(),
            jersey_number: new.jersey_number,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO players (id, name, team_id, nation_id, jersey_number, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&player.id)
        .bind(&player.name)
        .bind(&player.team_id)
        .bind(&player.nation_id)
        .bind(player.jersey_number)
        .bind(player.created_at)
        .bind(player.updated_at)
        .execute(&mut *conn)
        .await?;

        debug!(player_id = %player.id, jersey = player.jersey_number, "Inserted player");
        Ok(player)
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Player> {
        sqlx::query_as::<_, Player>("SELECT * FROM players WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StoreError::not_found("player", id))
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        id: &str,
        patch: &PlayerPatch,
    ) -> StoreResult<Player> {
        if patch.is_empty() {
            return Err(StoreError::validation("player", "patch", "no fields to update"));
        }
        let current = Self::get(&mut *conn, id).await?;
        let merged = patch.apply(&current);
        merged.validate()?;

        if merged.team_id != current.team_id {
            ensure_referenced_row(&mut *conn, "teams", "team", &merged.team_id).await?;
        }
        if merged.nation_id != current.nation_id {
            ensure_referenced_row(&mut *conn, "nations", "nation", &merged.nation_id).await?;
        }
        if merged.team_id != current.team_id || merged.jersey_number != current.jersey_number {
            Self::ensure_jersey_free(&mut *conn, &merged.team_id, merged.jersey_number, Some(id))
                .await?;
        }

        let updated_at = next_timestamp(current.updated_at);
        sqlx::query(
            "UPDATE players SET name = ?1, team_id = ?2, nation_id = ?3, jersey_number = ?4, \
             updated_at = ?5 WHERE id = ?6",
        )
        .bind(merged.name.trim())
        .bind(&merged.team_id)
        .bind(&merged.nation_id)
        .bind(merged.jersey_number)
        .bind(updated_at)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(Player {
            name: merged.name.trim().to_string(),
            team_id: merged.team_id,
            nation_id: merged.nation_id,
            jersey_number: merged.jersey_number,
            updated_at,
            ..current
        })
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM players WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("player", id));
        }
        debug!(player_id = %id, "Deleted player");
        Ok(())
    }

    pub async fn list(
        conn: &mut SqliteConnection,
        filter: &PlayerFilter,
        page: Page,
    ) -> StoreResult<Vec<Player>> {
        let (sql, params) = build_select(
            "players",
            PLAYER_COLUMNS,
            &filter.to_filter(),
            &Sort::asc("jersey_number"),
            &page,
        )?;
        let mut query = sqlx::query_as::<_, Player>(&sql);
        for param in &params {
            query = bind_param_as(query, param);
        }
        Ok(query.fetch_all(&mut *conn).await?)
    }

    async fn ensure_jersey_free(
        conn: &mut SqliteConnection,
        team_id: &str,
        jersey_number: i64,
        exclude_id: Option<&str>,
    ) -> StoreResult<()> {
        let taken: Option<String> = sqlx::query_scalar(
            "SELECT id FROM players WHERE team_id = ?1 AND jersey_number = ?2 AND id <> ?3",
        )
        .bind(team_id)
        .bind(jersey_number)
        .bind(exclude_id.unwrap_or(""))
        .fetch_optional(&mut *conn)
        .await?;
        if taken.is_some() {
            return Err(StoreError::constraint(
                "uq_players_team_jersey",
                format!("jersey number {} is already taken in this team", jersey_number),
            ));
        }
        Ok(())
    }
}
