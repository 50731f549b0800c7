//! Integration tests for transactional CRUD across the service facade.

use tempfile::NamedTempFile;
use volleystore::config::Config;
use volleystore::error::StoreError;
use volleystore::model::{
    NationPatch, NewMatch, NewNation, NewPlayer, NewRally, NewSeries, NewTeam, NewVideo,
    PlayerPatch, Side,
};
use volleystore::query::Page;
use volleystore::repo::PlayerFilter;
use volleystore::{Store, StoreResult};

/// Create a store over a fresh temp-file database.
async fn setup_store() -> Store {
    let db_path = NamedTempFile::new()
        .unwrap()
        .into_temp_path()
        .keep()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let config = Config {
        database: format!("sqlite:{}", db_path),
        ..Config::default_config()
    };
    Store::connect(&config).await.unwrap()
}

/// Seed one nation and one team, returning their ids.
async fn seed_nation_and_team(store: &Store) -> StoreResult<(String, String)> {
    let nation = store
        .nations()
        .create(NewNation {
            name: "Italy".to_string(),
            code: "ITA".to_string(),
        })
        .await?;
    let team = store
        .teams()
        .create(NewTeam {
            name: "Team A".to_string(),
            nation_id: nation.id.clone(),
        })
        .await?;
    Ok((nation.id, team.id))
}

#[tokio::test]
async fn test_create_get_round_trip() {
    let store = setup_store().await;

    let created = store
        .nations()
        .create(NewNation {
            name: "Italy".to_string(),
            code: "ita".to_string(),
        })
        .await
        .unwrap();

    let fetched = store.nations().get(&created.id).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.name, "Italy");
    // Codes are stored normalized.
    assert_eq!(fetched.code, "ITA");
    assert!(fetched.updated_at >= fetched.created_at);
}

#[tokio::test]
async fn test_invalid_create_persists_nothing() {
    let store = setup_store().await;
    let (nation_id, team_id) = seed_nation_and_team(&store).await.unwrap();

    let result = store
        .players()
        .create(NewPlayer {
            name: "P1".to_string(),
            team_id: team_id.clone(),
            nation_id,
            jersey_number: 0,
        })
        .await;
    assert!(matches!(result, Err(StoreError::Validation { .. })));

    let players = store
        .players()
        .list(
            PlayerFilter {
                team_id: Some(team_id),
                ..PlayerFilter::default()
            },
            Page::first(),
        )
        .await
        .unwrap();
    assert!(players.is_empty());
}

#[tokio::test]
async fn test_create_with_missing_parent_fails() {
    let store = setup_store().await;

    let result = store
        .teams()
        .create(NewTeam {
            name: "Orphans".to_string(),
            nation_id: "no-such-nation".to_string(),
        })
        .await;
    assert!(matches!(result, Err(StoreError::ConstraintViolation { .. })));
}

#[tokio::test]
async fn test_italy_team_a_jersey_scenario() {
    let store = setup_store().await;
    let (nation_id, team_id) = seed_nation_and_team(&store).await.unwrap();

    let p1 = store
        .players()
        .create(NewPlayer {
            name: "P1".to_string(),
            team_id: team_id.clone(),
            nation_id: nation_id.clone(),
            jersey_number: 7,
        })
        .await
        .unwrap();

    assert!(store.nations().get(&nation_id).await.is_ok());
    assert!(store.teams().get(&team_id).await.is_ok());
    assert!(store.players().get(&p1.id).await.is_ok());

    let p2 = store
        .players()
        .create(NewPlayer {
            name: "P2".to_string(),
            team_id,
            nation_id,
            jersey_number: 7,
        })
        .await;
    assert!(matches!(p2, Err(StoreError::ConstraintViolation { .. })));
}

#[tokio::test]
async fn test_duplicate_nation_code_rejected_case_insensitively() {
    let store = setup_store().await;

    store
        .nations()
        .create(NewNation {
            name: "Italy".to_string(),
            code: "ita".to_string(),
        })
        .await
        .unwrap();

    let dup = store
        .nations()
        .create(NewNation {
            name: "Italia".to_string(),
            code: "ITA".to_string(),
        })
        .await;
    assert!(matches!(dup, Err(StoreError::ConstraintViolation { .. })));
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let store = setup_store().await;
    let (nation_id, team_id) = seed_nation_and_team(&store).await.unwrap();

    let player = store
        .players()
        .create(NewPlayer {
            name: "P1".to_string(),
            team_id: team_id.clone(),
            nation_id: nation_id.clone(),
            jersey_number: 7,
        })
        .await
        .unwrap();

    let updated = store
        .players()
        .update(
            &player.id,
            PlayerPatch {
                jersey_number: Some(9),
                ..PlayerPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "P1");
    assert_eq!(updated.team_id, team_id);
    assert_eq!(updated.nation_id, nation_id);
    assert_eq!(updated.jersey_number, 9);
    assert!(updated.updated_at > player.updated_at);
    assert_eq!(updated.created_at, player.created_at);

    // The write is visible, not just the returned value.
    let fetched = store.players().get(&player.id).await.unwrap();
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_updated_at_strictly_increases_across_updates() {
    let store = setup_store().await;

    let nation = store
        .nations()
        .create(NewNation {
            name: "Italy".to_string(),
            code: "ITA".to_string(),
        })
        .await
        .unwrap();

    let mut last = nation.updated_at;
    for name in ["Italia", "Italie", "Italy"] {
        let updated = store
            .nations()
            .update(
                &nation.id,
                NationPatch {
                    name: Some(name.to_string()),
                    code: None,
                },
            )
            .await
            .unwrap();
        assert!(updated.updated_at > last);
        last = updated.updated_at;
    }
}

#[tokio::test]
async fn test_empty_patch_rejected() {
    let store = setup_store().await;

    let nation = store
        .nations()
        .create(NewNation {
            name: "Italy".to_string(),
            code: "ITA".to_string(),
        })
        .await
        .unwrap();

    let result = store.nations().update(&nation.id, NationPatch::default()).await;
    assert!(matches!(result, Err(StoreError::Validation { .. })));
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    let store = setup_store().await;

    let result = store.nations().get("missing").await;
    assert!(matches!(
        result,
        Err(StoreError::NotFound { entity: "nation", .. })
    ));

    let result = store.matches().get("missing").await;
    assert!(matches!(
        result,
        Err(StoreError::NotFound { entity: "match", .. })
    ));
}

#[tokio::test]
async fn test_delete_blocked_then_allowed() {
    let store = setup_store().await;
    let (nation_id, team_id) = seed_nation_and_team(&store).await.unwrap();

    let player = store
        .players()
        .create(NewPlayer {
            name: "P1".to_string(),
            team_id: team_id.clone(),
            nation_id: nation_id.clone(),
            jersey_number: 7,
        })
        .await
        .unwrap();

    // Nation is referenced by the team and the player.
    let blocked = store.nations().delete(&nation_id).await;
    assert!(matches!(blocked, Err(StoreError::DependencyExists { .. })));

    // Team is referenced by the player.
    let blocked = store.teams().delete(&team_id).await;
    assert!(matches!(blocked, Err(StoreError::DependencyExists { .. })));

    // Remove children bottom-up and the deletes go through.
    store.players().delete(&player.id).await.unwrap();
    store.teams().delete(&team_id).await.unwrap();
    store.nations().delete(&nation_id).await.unwrap();

    let result = store.nations().get(&nation_id).await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}

#[tokio::test]
async fn test_delete_unknown_id_is_not_found() {
    let store = setup_store().await;
    let result = store.nations().delete("missing").await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}

#[tokio::test]
async fn test_match_create_with_rallies_is_atomic() {
    let store = setup_store().await;
    let (nation_id, team_a) = seed_nation_and_team(&store).await.unwrap();
    let team_b = store
        .teams()
        .create(NewTeam {
            name: "Team B".to_string(),
            nation_id,
        })
        .await
        .unwrap();
    let series = store
        .series()
        .create(NewSeries {
            name: "SuperLega".to_string(),
            season: "2025/26".to_string(),
            starts_on: None,
            ends_on: None,
        })
        .await
        .unwrap();

    let new_match = NewMatch {
        series_id: series.id.clone(),
        home_team_id: team_a.clone(),
        away_team_id: team_b.id.clone(),
        scheduled_at: "2026-03-14T18:00:00Z".parse().unwrap(),
        venue: "PalaPanini".to_string(),
    };

    // A bad rally aborts the whole operation, match included.
    let failed = store
        .matches()
        .create_with_rallies(
            new_match.clone(),
            vec![
                NewRally {
                    winning_side: Side::Home,
                    home_score: 1,
                    away_score: 0,
                },
                NewRally {
                    winning_side: Side::Away,
                    home_score: 1,
                    away_score: -1,
                },
            ],
        )
        .await;
    assert!(matches!(failed, Err(StoreError::Validation { .. })));

    let matches = store
        .matches()
        .list(Default::default(), Page::first())
        .await
        .unwrap();
    assert!(matches.is_empty());

    // The valid version lands match and rallies together.
    let (game, rallies) = store
        .matches()
        .create_with_rallies(
            new_match,
            vec![
                NewRally {
                    winning_side: Side::Home,
                    home_score: 1,
                    away_score: 0,
                },
                NewRally {
                    winning_side: Side::Away,
                    home_score: 1,
                    away_score: 1,
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(rallies.len(), 2);
    assert_eq!(rallies[0].seq_index, 1);
    assert_eq!(rallies[1].seq_index, 2);
    assert_eq!(store.rallies().get(&rallies[0].id).await.unwrap().match_id, game.id);
}

#[tokio::test]
async fn test_video_round_trip_under_match() {
    let store = setup_store().await;
    let (nation_id, team_a) = seed_nation_and_team(&store).await.unwrap();
    let team_b = store
        .teams()
        .create(NewTeam {
            name: "Team B".to_string(),
            nation_id,
        })
        .await
        .unwrap();
    let series = store
        .series()
        .create(NewSeries {
            name: "SuperLega".to_string(),
            season: "2025/26".to_string(),
            starts_on: None,
            ends_on: None,
        })
        .await
        .unwrap();
    let game = store
        .matches()
        .create(NewMatch {
            series_id: series.id,
            home_team_id: team_a,
            away_team_id: team_b.id,
            scheduled_at: "2026-03-14T18:00:00Z".parse().unwrap(),
            venue: "PalaPanini".to_string(),
        })
        .await
        .unwrap();

    let video = store
        .videos()
        .create(
            &game.id,
            NewVideo {
                uri: "s3://matches/2026/panini.mp4".to_string(),
                duration_secs: 5400,
            },
        )
        .await
        .unwrap();

    let fetched = store.videos().get(&video.id).await.unwrap();
    assert_eq!(fetched, video);

    let listed = store
        .videos()
        .list_for_match(&game.id, Page::first())
        .await
        .unwrap();
    assert_eq!(listed, vec![fetched]);

    // Videos for a match that does not exist are a constraint failure.
    let orphan = store
        .videos()
        .create(
            "missing",
            NewVideo {
                uri: "s3://x".to_string(),
                duration_secs: 1,
            },
        )
        .await;
    assert!(matches!(orphan, Err(StoreError::ConstraintViolation { .. })));
}

#[tokio::test]
async fn test_health_check_reports_ok() {
    let store = setup_store().await;
    let report = store.health_check().await;
    assert!(report.ok);
    assert!(report.detail.contains("pool ok"));
}
