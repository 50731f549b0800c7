//! Competition entities: series, matches, rallies.

use crate::error::{StoreError, StoreResult};
use crate::model::validate;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the net won a rally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Home => write!(f, "home"),
            Self::Away => write!(f, "away"),
        }
    }
}

/// A competition series (league season, tournament).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Series {
    pub id: String,
    pub name: String,
    /// Season label, e.g. "2025/26".
    pub season: String,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSeries {
    pub name: String,
    pub season: String,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

impl NewSeries {
    pub fn validate(&self) -> StoreResult<()> {
        validate::non_empty("series", "name", &self.name)?;
        validate::non_empty("series", "season", &self.season)?;
        if let (Some(starts), Some(ends)) = (self.starts_on, self.ends_on) {
            if starts > ends {
                return Err(StoreError::validation(
                    "series",
                    "starts_on",
                    "must not be after ends_on",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesPatch {
    pub name: Option<String>,
    pub season: Option<String>,
    /// `Some(None)` clears the date.
    pub starts_on: Option<Option<NaiveDate>>,
    pub ends_on: Option<Option<NaiveDate>>,
}

impl SeriesPatch {
    pub fn apply(&self, current: &Series) -> NewSeries {
        NewSeries {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            season: self
                .season
                .clone()
                .unwrap_or_else(|| current.season.clone()),
            starts_on: self.starts_on.unwrap_or(current.starts_on),
            ends_on: self.ends_on.unwrap_or(current.ends_on),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.season.is_none()
            && self.starts_on.is_none()
            && self.ends_on.is_none()
    }
}

/// A scheduled or played match between two teams in a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Match {
    pub id: String,
    pub series_id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub venue: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMatch {
    pub series_id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub venue: String,
}

impl NewMatch {
    pub fn validate(&self) -> StoreResult<()> {
        validate::non_empty("match", "series_id", &self.series_id)?;
        validate::non_empty("match", "home_team_id", &self.home_team_id)?;
        validate::non_empty("match", "away_team_id", &self.away_team_id)?;
        validate::non_empty("match", "venue", &self.venue)?;
        if self.home_team_id == self.away_team_id {
            return Err(StoreError::validation(
                "match",
                "away_team_id",
                "a team cannot play itself",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchPatch {
    pub series_id: Option<String>,
    pub home_team_id: Option<String>,
    pub away_team_id: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub venue: Option<String>,
}

impl MatchPatch {
    pub fn apply(&self, current: &Match) -> NewMatch {
        NewMatch {
            series_id: self
                .series_id
                .clone()
                .unwrap_or_else(|| current.series_id.clone()),
            home_team_id: self
                .home_team_id
                .clone()
                .unwrap_or_else(|| current.home_team_id.clone()),
            away_team_id: self
                .away_team_id
                .clone()
                .unwrap_or_else(|| current.away_team_id.clone()),
            scheduled_at: self.scheduled_at.unwrap_or(current.scheduled_at),
            venue: self.venue.clone().unwrap_or_else(|| current.venue.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series_id.is_none()
            && self.home_team_id.is_none()
            && self.away_team_id.is_none()
            && self.scheduled_at.is_none()
            && self.venue.is_none()
    }
}

/// One rally within a match.
///
/// `seq_index` starts at 1 and stays contiguous within the match: creation
/// appends at the tail and deletion renumbers everything after the gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rally {
    pub id: String,
    pub match_id: String,
    pub seq_index: i64,
    pub winning_side: Side,
    pub home_score: i64,
    pub away_score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome fields for a new rally; the sequence index is assigned by the
/// repository, not the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRally {
    pub winning_side: Side,
    pub home_score: i64,
    pub away_score: i64,
}

impl NewRally {
    pub fn validate(&self) -> StoreResult<()> {
        validate::non_negative("rally", "home_score", self.home_score)?;
        validate::non_negative("rally", "away_score", self.away_score)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RallyPatch {
    pub winning_side: Option<Side>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

impl RallyPatch {
    pub fn apply(&self, current: &Rally) -> NewRally {
        NewRally {
            winning_side: self.winning_side.unwrap_or(current.winning_side),
            home_score: self.home_score.unwrap_or(current.home_score),
            away_score: self.away_score.unwrap_or(current.away_score),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.winning_side.is_none() && self.home_score.is_none() && self.away_score.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_date_range() {
        let series = |starts, ends| NewSeries {
            name: "SuperLega".to_string(),
            season: "2025/26".to_string(),
            starts_on: starts,
            ends_on: ends,
        };
        let d = |s: &str| s.parse::<NaiveDate>().unwrap();

        assert!(series(None, None).validate().is_ok());
        assert!(
            series(Some(d("2025-10-01")), Some(d("2026-04-30")))
                .validate()
                .is_ok()
        );
        assert!(
            series(Some(d("2026-05-01")), Some(d("2025-10-01")))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_match_rejects_same_team_twice() {
        let new = NewMatch {
            series_id: "s1".to_string(),
            home_team_id: "t1".to_string(),
            away_team_id: "t1".to_string(),
            scheduled_at: Utc::now(),
            venue: "PalaLottomatica".to_string(),
        };
        assert!(matches!(
            new.validate(),
            Err(StoreError::Validation { field: "away_team_id", .. })
        ));
    }

    #[test]
    fn test_rally_scores_non_negative() {
        let rally = |home, away| NewRally {
            winning_side: Side::Home,
            home_score: home,
            away_score: away,
        };
        assert!(rally(25, 23).validate().is_ok());
        assert!(rally(0, 0).validate().is_ok());
        assert!(rally(-1, 0).validate().is_err());
    }

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Home.to_string(), "home");
        assert_eq!(Side::Away.to_string(), "away");
    }

    #[test]
    fn test_series_patch_clears_dates() {
        let now = Utc::now();
        let current = Series {
            id: "s1".to_string(),
            name: "SuperLega".to_string(),
            season: "2025/26".to_string(),
            starts_on: Some("2025-10-01".parse().unwrap()),
            ends_on: Some("2026-04-30".parse().unwrap()),
            created_at: now,
            updated_at: now,
        };
        let patch = SeriesPatch {
            starts_on: Some(None),
            ..SeriesPatch::default()
        };
        let merged = patch.apply(&current);
        assert!(merged.starts_on.is_none());
        assert_eq!(merged.ends_on, current.ends_on);
    }
}
