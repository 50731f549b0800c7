//! Repositories for series, matches, and rallies.

use crate::error::{StoreError, StoreResult};
use crate::model::{
    Match, MatchPatch, NewMatch, NewRally, NewSeries, Rally, RallyPatch, Series, SeriesPatch,
};
use crate::query::{Filter, Page, Sort, bind_param_as, build_select};
use crate::repo::{ensure_referenced_row, new_id, next_timestamp, reject_if_children};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

const SERIES_COLUMNS: &[&str] = &[
    "id",
    "name",
    "season",
    "starts_on",
    "ends_on",
    "created_at",
    "updated_at",
];
const MATCH_COLUMNS: &[&str] = &[
    "id",
    "series_id",
    "home_team_id",
    "away_team_id",
    "scheduled_at",
    "venue",
    "created_at",
    "updated_at",
];
const RALLY_COLUMNS: &[&str] = &[
    "id",
    "match_id",
    "seq_index",
    "winning_side",
    "home_score",
    "away_score",
    "created_at",
    "updated_at",
];

/// List filter for series.
#[derive(Debug, Clone, Default)]
pub struct SeriesFilter {
    pub season: Option<String>,
    pub name_like: Option<String>,
}

impl SeriesFilter {
    fn to_filter(&self) -> Filter {
        let mut f = Filter::new();
        if let Some(season) = &self.season {
            f = f.eq("season", season.clone());
        }
        if let Some(pattern) = &self.name_like {
            f = f.like("name", pattern.clone());
        }
        f
    }
}

pub struct SeriesRepo;

impl SeriesRepo {
    pub async fn create(conn: &mut SqliteConnection, new: &NewSeries) -> StoreResult<Series> {
        new.validate()?;

        let now = Utc::now();
        let series = Series {
            id: new_id(),
            name: new.name.trim().to_string(),
            season: new.season.trim().to_string(),
            starts_on: new.starts_on,
            ends_on: new.ends_on,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO series (id, name, season, starts_on, ends_on, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&series.id)
        .bind(&series.name)
        .bind(&series.season)
        .bind(series.starts_on)
        .bind(series.ends_on)
        .bind(series.created_at)
        .bind(series.updated_at)
        .execute(&mut *conn)
        .await?;

        debug!(series_id = %series.id, "Inserted series");
        Ok(series)
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Series> {
        sqlx::query_as::<_, Series>("SELECT * FROM series WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StoreError::not_found("series", id))
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        id: &str,
        patch: &SeriesPatch,
    ) -> StoreResult<Series> {
        if patch.is_empty() {
            return Err(StoreError::validation("series", "patch", "no fields to update"));
        }
        let current = Self::get(&mut *conn, id).await?;
        let merged = patch.apply(&current);
        merged.validate()?;

        let updated_at = next_timestamp(current.updated_at);
        sqlx::query(
            "UPDATE series SET name = ?1, season = ?2, starts_on = ?3, ends_on = ?4, \
             updated_at = ?5 WHERE id = ?6",
        )
        .bind(merged.name.trim())
        .bind(merged.season.trim())
        .bind(merged.starts_on)
        .bind(merged.ends_on)
        .bind(updated_at)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(Series {
            name: merged.name.trim().to_string(),
            season: merged.season.trim().to_string(),
            starts_on: merged.starts_on,
            ends_on: merged.ends_on,
            updated_at,
            ..current
        })
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> StoreResult<()> {
        reject_if_children(&mut *conn, "matches", "series_id", "series", id, "match").await?;

        let result = sqlx::query("DELETE FROM series WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("series", id));
        }
        debug!(series_id = %id, "Deleted series");
        Ok(())
    }

    pub async fn list(
        conn: &mut SqliteConnection,
        filter: &SeriesFilter,
        page: Page,
    ) -> StoreResult<Vec<Series>> {
        let (sql, params) = build_select(
            "series",
            SERIES_COLUMNS,
            &filter.to_filter(),
            &Sort::asc("name"),
            &page,
        )?;
        let mut query = sqlx::query_as::<_, Series>(&sql);
        for param in &params {
            query = bind_param_as(query, param);
        }
        Ok(query.fetch_all(&mut *conn).await?)
    }
}

/// List filter for matches.
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub series_id: Option<String>,
    pub home_team_id: Option<String>,
    pub away_team_id: Option<String>,
    pub scheduled_from: Option<DateTime<Utc>>,
    pub scheduled_to: Option<DateTime<Utc>>,
}

impl MatchFilter {
    fn to_filter(&self) -> Filter {
        let mut f = Filter::new();
        if let Some(series_id) = &self.series_id {
            f = f.eq("series_id", series_id.clone());
        }
        if let Some(team_id) = &self.home_team_id {
            f = f.eq("home_team_id", team_id.clone());
        }
        if let Some(team_id) = &self.away_team_id {
            f = f.eq("away_team_id", team_id.clone());
        }
        if let Some(from) = self.scheduled_from {
            f = f.ge("scheduled_at", from);
        }
        if let Some(to) = self.scheduled_to {
            f = f.le("scheduled_at", to);
        }
        f
    }
}

pub struct MatchRepo;

impl MatchRepo {
    pub async fn create(conn: &mut SqliteConnection, new: &NewMatch) -> StoreResult<Match> {
        new.validate()?;
        ensure_referenced_row(&mut *conn, "series", "series", &new.series_id).await?;
        ensure_referenced_row(&mut *conn, "teams", "team", &new.home_team_id).await?;
        ensure_referenced_row(&mut *conn, "teams", "team", &new.away_team_id).await?;

        let now = Utc::now();
        let game = Match {
            id: new_id(),
            series_id: new.series_id.clone(),
            home_team_id: new.home_team_id.clone(),
            away_team_id: new.away_team_id.clone(),
            scheduled_at: new.scheduled_at,
            venue: new.venue.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO matches (id, series_id, home_team_id, away_team_id, scheduled_at, venue, \
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&game.id)
        .bind(&game.series_id)
        .bind(&game.home_team_id)
        .bind(&game.away_team_id)
        .bind(game.scheduled_at)
        .bind(&game.venue)
        .bind(game.created_at)
        .bind(game.updated_at)
        .execute(&mut *conn)
        .await?;

        debug!(match_id = %game.id, series_id = %game.series_id, "Inserted match");
        Ok(game)
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Match> {
        sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StoreError::not_found("match", id))
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        id: &str,
        patch: &MatchPatch,
    ) -> StoreResult<Match> {
        if patch.is_empty() {
            return Err(StoreError::validation("match", "patch", "no fields to update"));
        }
        let current = Self::get(&mut *conn, id).await?;
        let merged = patch.apply(&current);
        merged.validate()?;

        if merged.series_id != current.series_id {
            ensure_referenced_row(&mut *conn, "series", "series", &merged.series_id).await?;
        }
        if merged.home_team_id != current.home_team_id {
            ensure_referenced_row(&mut *conn, "teams", "team", &merged.home_team_id).await?;
        }
        if merged.away_team_id != current.away_team_id {
            ensure_referenced_row(&mut *conn, "teams", "team", &merged.away_team_id).await?;
        }

        let updated_at = next_timestamp(current.updated_at);
        sqlx::query(
            "UPDATE matches SET series_id = ?1, home_team_id = ?2, away_team_id = ?3, \
             scheduled_at = ?4, venue = ?5, updated_at = ?6 WHERE id = ?7",
        )
        .bind(&merged.series_id)
        .bind(&merged.home_team_id)
        .bind(&merged.away_team_id)
        .bind(merged.scheduled_at)
        .bind(merged.venue.trim())
        .bind(updated_at)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(Match {
            series_id: merged.series_id,
            home_team_id: merged.home_team_id,
            away_team_id: merged.away_team_id,
            scheduled_at: merged.scheduled_at,
            venue: merged.venue.trim().to_string(),
            updated_at,
            ..current
        })
    }

    /// Delete a match. Rallies, videos, and cameras cascade with it.
    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM matches WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("match", id));
        }
        debug!(match_id = %id, "Deleted match with owned children");
        Ok(())
    }

    pub async fn list(
        conn: &mut SqliteConnection,
        filter: &MatchFilter,
        page: Page,
    ) -> StoreResult<Vec<Match>> {
        let (sql, params) = build_select(
            "matches",
            MATCH_COLUMNS,
            &filter.to_filter(),
            &Sort::asc("scheduled_at"),
            &page,
        )?;
        let mut query = sqlx::query_as::<_, Match>(&sql);
        for param in &params {
            query = bind_param_as(query, param);
        }
        Ok(query.fetch_all(&mut *conn).await?)
    }
}

pub struct RallyRepo;

impl RallyRepo {
    /// Append a rally at the tail of the match's sequence.
    ///
    /// The repository owns sequence assignment; callers supply only the
    /// outcome. Writers hold an immediate transaction, so two appends to
    /// the same match cannot read the same tail.
    pub async fn append(
        conn: &mut SqliteConnection,
        match_id: &str,
        new: &NewRally,
    ) -> StoreResult<Rally> {
        new.validate()?;
        ensure_referenced_row(&mut *conn, "matches", "match", match_id).await?;

        let seq_index: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(seq_index), 0) + 1 FROM rallies WHERE match_id = ?1",
        )
        .bind(match_id)
        .fetch_one(&mut *conn)
        .await?;

        let now = Utc::now();
        let rally = Rally {
            id: new_id(),
            match_id: match_id.to_string(),
            seq_index,
            winning_side: new.winning_side,
            home_score: new.home_score,
            away_score: new.away_score,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO rallies (id, match_id, seq_index, winning_side, home_score, away_score, \
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&rally.id)
        .bind(&rally.match_id)
        .bind(rally.seq_index)
        .bind(rally.winning_side)
        .bind(rally.home_score)
        .bind(rally.away_score)
        .bind(rally.created_at)
        .bind(rally.updated_at)
        .execute(&mut *conn)
        .await?;

        debug!(rally_id = %rally.id, match_id = %match_id, seq_index, "Appended rally");
        Ok(rally)
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Rally> {
        sqlx::query_as::<_, Rally>("SELECT * FROM rallies WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StoreError::not_found("rally", id))
    }

    pub async fn update(
        conn: &mut SqliteConnection,
        id: &str,
        patch: &RallyPatch,
    ) -> StoreResult<Rally> {
        if patch.is_empty() {
            return Err(StoreError::validation("rally", "patch", "no fields to update"));
        }
        let current = Self::get(&mut *conn, id).await?;
        let merged = patch.apply(&current);
        merged.validate()?;

        let updated_at = next_timestamp(current.updated_at);
        sqlx::query(
            "UPDATE rallies SET winning_side = ?1, home_score = ?2, away_score = ?3, \
             updated_at = ?4 WHERE id = ?5",
        )
        .bind(merged.winning_side)
        .bind(merged.home_score)
        .bind(merged.away_score)
        .bind(updated_at)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(Rally {
            winning_side: merged.winning_side,
            home_score: merged.home_score,
            away_score: merged.away_score,
            updated_at,
            ..current
        })
    }

    /// Delete a rally and renumber the tail so the match's sequence stays
    /// contiguous. Must run inside the caller's transaction.
    pub async fn delete_and_renumber(conn: &mut SqliteConnection, id: &str) -> StoreResult<()> {
        let rally = Self::get(&mut *conn, id).await?;

        sqlx::query("DELETE FROM rallies WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        // Close the gap in two steps; the intermediate negative values keep
        // the (match_id, seq_index) unique index satisfied row by row.
        let now = Utc::now();
        sqlx::query(
            "UPDATE rallies SET seq_index = -(seq_index - 1), updated_at = ?1 \
             WHERE match_id = ?2 AND seq_index > ?3",
        )
        .bind(now)
        .bind(&rally.match_id)
        .bind(rally.seq_index)
        .execute(&mut *conn)
        .await?;
        let shifted = sqlx::query(
            "UPDATE rallies SET seq_index = -seq_index WHERE match_id = ?1 AND seq_index < 0",
        )
        .bind(&rally.match_id)
        .execute(&mut *conn)
        .await?;

        debug!(
            rally_id = %id,
            match_id = %rally.match_id,
            renumbered = shifted.rows_affected(),
            "Deleted rally and renumbered tail"
        );
        Ok(())
    }

    pub async fn list_for_match(
        conn: &mut SqliteConnection,
        match_id: &str,
        page: Page,
    ) -> StoreResult<Vec<Rally>> {
        let filter = Filter::new().eq("match_id", match_id);
        let (sql, params) = build_select(
            "rallies",
            RALLY_COLUMNS,
            &filter,
            &Sort::asc("seq_index"),
            &page,
        )?;
        let mut query = sqlx::query_as::<_, Rally>(&sql);
        for param in &params {
            query = bind_param_as(query, param);
        }
        Ok(query.fetch_all(&mut *conn).await?)
    }
}
