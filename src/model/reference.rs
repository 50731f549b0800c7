//! Reference entities: nations, teams, players.
//!
//! These are the long-lived rows the competition data points at. Each
//! entity has a persisted record struct, a create shape (`New*`) and a
//! partial-update shape (`*Patch`). Validation is pure; uniqueness and
//! foreign-key existence are the repository's business.

use crate::error::StoreResult;
use crate::model::validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Jersey numbers allowed by FIVB rules.
pub const JERSEY_MIN: i64 = 1;
pub const JERSEY_MAX: i64 = 99;

/// A national federation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Nation {
    pub id: String,
    pub name: String,
    /// 2-3 letter federation code, stored upper-case, unique.
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNation {
    pub name: String,
    pub code: String,
}

impl NewNation {
    pub fn validate(&self) -> StoreResult<()> {
        validate::non_empty("nation", "name", &self.name)?;
        validate::federation_code("nation", "code", &self.code)?;
        Ok(())
    }

    /// Code as stored: trimmed and upper-cased.
    pub fn normalized_code(&self) -> String {
        self.code.trim().to_ascii_uppercase()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NationPatch {
    pub name: Option<String>,
    pub code: Option<String>,
}

impl NationPatch {
    /// Merge this patch over the current record into a full create shape.
    pub fn apply(&self, current: &Nation) -> NewNation {
        NewNation {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            code: self.code.clone().unwrap_or_else(|| current.code.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.code.is_none()
    }
}

/// A club or national team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub nation_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub nation_id: String,
}

impl NewTeam {
    pub fn validate(&self) -> StoreResult<()> {
        validate::non_empty("team", "name", &self.name)?;
        validate::non_empty("team", "nation_id", &self.nation_id)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub nation_id: Option<String>,
}

impl TeamPatch {
    pub fn apply(&self, current: &Team) -> NewTeam {
        NewTeam {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            nation_id: self
                .nation_id
                .clone()
                .unwrap_or_else(|| current.nation_id.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.nation_id.is_none()
    }
}

/// A rostered player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub team_id: String,
    pub nation_id: String,
    /// Unique within the player's team.
    pub jersey_number: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub team_id: String,
    pub nation_id: String,
    pub jersey_number: i64,
}

impl NewPlayer {
    pub fn validate(&self) -> StoreResult<()> {
        validate::non_empty("player", "name", &self.name)?;
        validate::non_empty("player", "team_id", &self.team_id)?;
        validate::non_empty("player", "nation_id", &self.nation_id)?;
        validate::in_range(
            "player",
            "jersey_number",
            self.jersey_number,
            JERSEY_MIN,
            JERSEY_MAX,
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerPatch {
    pub name: Option<String>,
    pub team_id: Option<String>,
    pub nation_id: Option<String>,
    pub jersey_number: Option<i64>,
}

impl PlayerPatch {
    pub fn apply(&self, current: &Player) -> NewPlayer {
        NewPlayer {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            team_id: self
                .team_id
                .clone()
                .unwrap_or_else(|| current.team_id.clone()),
            nation_id: self
                .nation_id
                .clone()
                .unwrap_or_else(|| current.nation_id.clone()),
            jersey_number: self.jersey_number.unwrap_or(current.jersey_number),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.team_id.is_none()
            && self.nation_id.is_none()
            && self.jersey_number.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_nation_validation() {
        let ok = NewNation {
            name: "Italy".to_string(),
            code: "ita".to_string(),
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.normalized_code(), "ITA");

        let bad_code = NewNation {
            name: "Italy".to_string(),
            code: "ITALY".to_string(),
        };
        assert!(bad_code.validate().is_err());

        let blank_name = NewNation {
            name: " ".to_string(),
            code: "IT".to_string(),
        };
        assert!(blank_name.validate().is_err());
    }

    #[test]
    fn test_new_player_jersey_bounds() {
        let player = |jersey| NewPlayer {
            name: "P1".to_string(),
            team_id: "t1".to_string(),
            nation_id: "n1".to_string(),
            jersey_number: jersey,
        };
        assert!(player(1).validate().is_ok());
        assert!(player(99).validate().is_ok());
        assert!(player(0).validate().is_err());
        assert!(player(100).validate().is_err());
    }

    #[test]
    fn test_patch_apply_keeps_unspecified_fields() {
        let now = Utc::now();
        let current = Player {
            id: "p1".to_string(),
            name: "P1".to_string(),
            team_id: "t1".to_string(),
            nation_id: "n1".to_string(),
            jersey_number: 7,
            created_at: now,
            updated_at: now,
        };
        let patch = PlayerPatch {
            jersey_number: Some(9),
            ..PlayerPatch::default()
        };
        let merged = patch.apply(&current);
        assert_eq!(merged.name, "P1");
        assert_eq!(merged.team_id, "t1");
        assert_eq!(merged.jersey_number, 9);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(NationPatch::default().is_empty());
        assert!(
            !NationPatch {
                name: Some("x".to_string()),
                code: None,
            }
            .is_empty()
        );
    }
}
