use anyhow::Result;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::db::insert_raw_records;
use crate::models::{RawRecord, RecordKind, Sport};

const SEED_SOURCE: &str = "seed";

fn record(sport: Sport, kind: RecordKind, payload: Value) -> RawRecord {
    RawRecord::new(
        sport,
        kind,
        SEED_SOURCE,
        payload.as_object().cloned().unwrap_or_default(),
    )
}

/// Load the sample batch into the raw store. Skips when it is already there.
pub async fn seed_sample_records(pool: &SqlitePool) -> Result<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM raw_records WHERE source = ?")
        .bind(SEED_SOURCE)
        .fetch_one(pool)
        .await?;

    if count > 0 {
        tracing::info!("Sample records already loaded ({} rows), skipping.", count);
        return Ok(0);
    }

    tracing::info!("Seeding raw store with sample NFL and NBA records...");

    let mut records = nfl_records();
    records.extend(nba_records());
    insert_raw_records(pool, &records).await?;

    tracing::info!("Seeded {} raw records.", records.len());
    Ok(records.len())
}

// ─────────────────────────────────────────────────────────────────────────────
//  NFL (SportsDataIO field names)
// ─────────────────────────────────────────────────────────────────────────────

fn nfl_records() -> Vec<RawRecord> {
    // (id, key, city, name, conference, division, stadium, capacity)
    let teams: Vec<(i64, &str, &str, &str, &str, &str, &str, i64)> = vec![
        (1, "DAL", "Dallas", "Cowboys", "NFC", "East", "AT&T Stadium", 80000),
        (2, "NE", "New England", "Patriots", "AFC", "East", "Gillette Stadium", 65878),
        (3, "KC", "Kansas City", "Chiefs", "AFC", "West", "GEHA Field at Arrowhead Stadium", 76416),
        (4, "PHI", "Philadelphia", "Eagles", "NFC", "East", "Lincoln Financial Field", 69796),
    ];

    let mut records: Vec<RawRecord> = teams
        .into_iter()
        .map(|(id, key, city, name, conference, division, stadium, capacity)| {
            record(
                Sport::Nfl,
                RecordKind::Team,
                json!({
                    "TeamID": id,
                    "Key": key,
                    "City": city,
                    "Name": name,
                    "FullName": format!("{} {}", city, name),
                    "Conference": conference,
                    "Division": division,
                    "StadiumDetails": { "Name": stadium, "Capacity": capacity },
                }),
            )
        })
        .collect();

    // (game, week, date, home, away, home score, away score, status)
    let games: Vec<(i64, i64, &str, i64, i64, Option<i64>, Option<i64>, &str)> = vec![
        (1001, 1, "2024-09-08T20:20:00", 1, 2, Some(21), Some(17), "Final"),
        (1002, 1, "2024-09-05T20:20:00", 3, 4, Some(27), Some(20), "F"),
        (1003, 2, "2024-09-15T13:00:00", 2, 3, Some(13), Some(13), "F/OT"),
        (1004, 2, "2024-09-15T16:25:00", 4, 1, Some(34), Some(10), "Final"),
        (1005, 3, "2024-09-22T13:00:00", 1, 3, None, None, "Scheduled"),
    ];

    records.extend(games.into_iter().map(
        |(game_id, week, date, home, away, home_score, away_score, status)| {
            record(
                Sport::Nfl,
                RecordKind::Game,
                json!({
                    "GameID": game_id,
                    "Season": 2024,
                    "SeasonType": 1,
                    "Week": week,
                    "DateTime": date,
                    "HomeTeamID": home,
                    "AwayTeamID": away,
                    "HomeScore": home_score,
                    "AwayScore": away_score,
                    "Status": status,
                }),
            )
        },
    ));

    // Play-by-play in nflfastR column names: (play, game, posteam, epa, yardline, touchdown)
    let plays: Vec<(i64, i64, &str, f64, i64, bool)> = vec![
        (1, 1001, "DAL", 0.42, 75, false),
        (2, 1001, "DAL", -0.65, 68, false),
        (3, 1001, "DAL", 1.85, 18, false),
        (4, 1001, "DAL", 2.10, 4, true),
        (5, 1001, "NE", 0.15, 80, false),
        (6, 1001, "NE", -1.20, 55, false),
        (7, 1001, "NE", 0.95, 12, false),
        (8, 1001, "NE", -0.40, 9, false),
        (9, 1004, "PHI", 1.30, 15, true),
        (10, 1004, "DAL", -0.85, 62, false),
    ];

    records.extend(plays.into_iter().map(|(play_id, game_id, posteam, epa, yardline, touchdown)| {
        record(
            Sport::Nfl,
            RecordKind::Play,
            json!({
                "play_id": play_id,
                "game_id": game_id,
                "posteam": posteam,
                "epa": epa,
                "yardline_100": yardline,
                "touchdown": if touchdown { 1 } else { 0 },
            }),
        )
    }));

    records
}

// ─────────────────────────────────────────────────────────────────────────────
//  NBA (stats.nba.com field names)
// ─────────────────────────────────────────────────────────────────────────────

fn nba_records() -> Vec<RawRecord> {
    let mut records = vec![
        record(
            Sport::Nba,
            RecordKind::Team,
            json!({"TEAM_ID": 1610612738, "TEAM_ABBREVIATION": "BOS", "TEAM_NAME": "Boston Celtics",
                   "conference": "East", "City": "Boston"}),
        ),
        record(
            Sport::Nba,
            RecordKind::Team,
            json!({"TEAM_ID": 1610612747, "TEAM_ABBREVIATION": "LAL", "TEAM_NAME": "Los Angeles Lakers",
                   "conference": "West", "City": "Los Angeles"}),
        ),
    ];

    // (game, date, home, away, home score, away score)
    let games: Vec<(i64, &str, i64, i64, i64, i64)> = vec![
        (22400001, "2024-10-22", 1610612738, 1610612747, 118, 104),
        (22400002, "2024-12-25", 1610612747, 1610612738, 112, 115),
    ];
    for (game_id, date, home, away, home_score, away_score) in games {
        records.push(record(
            Sport::Nba,
            RecordKind::Game,
            json!({"GAME_ID": game_id, "SEASON": 2024, "season_type": "REG", "GAME_DATE": date,
                   "home_team_id": home, "away_team_id": away,
                   "home_score": home_score, "away_score": away_score, "status": "Final"}),
        ));
    }

    // (player, name, team, game, MIN, PTS, FGM, FGA, FG3M, FG3A, FTM, FTA, REB, AST, TOV)
    let lines: Vec<(i64, &str, i64, i64, &str, i64, i64, i64, i64, i64, i64, i64, i64, i64, i64)> = vec![
        (1628369, "Jayson Tatum", 1610612738, 22400001, "36:12", 37, 14, 24, 8, 13, 1, 2, 10, 4, 2),
        (1627759, "Jaylen Brown", 1610612738, 22400001, "33:40", 23, 9, 18, 2, 6, 3, 4, 4, 6, 3),
        (2544, "LeBron James", 1610612747, 22400001, "35:05", 16, 6, 15, 1, 4, 3, 4, 5, 9, 4),
        (203076, "Anthony Davis", 1610612747, 22400001, "34:50", 36, 13, 22, 1, 3, 9, 11, 16, 4, 2),
        (1628369, "Jayson Tatum", 1610612738, 22400002, "38:01", 32, 11, 25, 4, 11, 6, 7, 15, 10, 4),
        (1627759, "Jaylen Brown", 1610612738, 22400002, "36:22", 24, 10, 21, 2, 8, 2, 2, 6, 4, 2),
        (2544, "LeBron James", 1610612747, 22400002, "37:30", 31, 12, 25, 4, 9, 3, 4, 10, 4, 5),
        (203076, "Anthony Davis", 1610612747, 22400002, "36:45", 30, 12, 21, 0, 2, 6, 6, 10, 3, 2),
    ];
    for (player_id, name, team_id, game_id, min, pts, fgm, fga, fg3m, fg3a, ftm, fta, reb, ast, tov) in lines {
        records.push(record(
            Sport::Nba,
            RecordKind::PlayerGame,
            json!({"PLAYER_ID": player_id, "PLAYER_NAME": name, "TEAM_ID": team_id, "GAME_ID": game_id,
                   "MIN": min, "PTS": pts, "FGM": fgm, "FGA": fga, "FG3M": fg3m, "FG3A": fg3a,
                   "FTM": ftm, "FTA": fta, "REB": reb, "AST": ast, "TOV": tov}),
        ));
    }

    // (shot, game, player, name, team, distance, made)
    let shots: Vec<(i64, i64, i64, &str, i64, f64, bool)> = vec![
        (1, 22400001, 1628369, "Jayson Tatum", 1610612738, 2.0, true),
        (2, 22400001, 1628369, "Jayson Tatum", 1610612738, 26.0, true),
        (3, 22400001, 1628369, "Jayson Tatum", 1610612738, 17.0, false),
        (4, 22400001, 1627759, "Jaylen Brown", 1610612738, 8.0, true),
        (5, 22400001, 203076, "Anthony Davis", 1610612747, 1.0, true),
        (6, 22400001, 203076, "Anthony Davis", 1610612747, 6.0, false),
        (7, 22400002, 2544, "LeBron James", 1610612747, 24.0, false),
        (8, 22400002, 2544, "LeBron James", 1610612747, 3.0, true),
    ];
    for (shot_id, game_id, player_id, name, team_id, distance, made) in shots {
        records.push(record(
            Sport::Nba,
            RecordKind::Shot,
            json!({"SHOT_ID": shot_id, "GAME_ID": game_id, "PLAYER_ID": player_id, "PLAYER_NAME": name,
                   "TEAM_ID": team_id, "SHOT_DISTANCE": distance, "SHOT_MADE_FLAG": if made { 1 } else { 0 },
                   "PERIOD": 1}),
        ));
    }

    records
}
