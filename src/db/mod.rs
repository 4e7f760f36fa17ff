pub mod raw_store;
pub mod seed;

pub use raw_store::*;
pub use seed::seed_sample_records;

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::str::FromStr;

use crate::config::Settings;
use crate::models::*;
use crate::services::MetricScope;
use crate::utils::parse_timestamp;

pub async fn create_pool(settings: &Settings) -> Result<SqlitePool> {
    let database_url = &settings.database_url;

    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    if let Some(parent) = std::path::Path::new(file_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // Single writer per run.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Called from the CLI where no pool exists yet.
pub async fn init_database(settings: &Settings) -> Result<SqlitePool> {
    let pool = create_pool(settings).await?;
    init_database_with_pool(&pool).await?;
    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS raw_records (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        sport         TEXT NOT NULL,
        kind          TEXT NOT NULL,
        source        TEXT NOT NULL,
        payload       TEXT NOT NULL,
        fetched_at    TEXT NOT NULL,
        normalized_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        id               TEXT PRIMARY KEY,
        team_id          INTEGER NOT NULL UNIQUE,
        sport            TEXT NOT NULL CHECK (sport IN ('nfl', 'nba')),
        abbreviation     TEXT,
        name             TEXT NOT NULL,
        city             TEXT,
        conference       TEXT NOT NULL CHECK (conference IN ('AFC', 'NFC', 'East', 'West')),
        division         TEXT,
        primary_color    TEXT,
        secondary_color  TEXT,
        stadium_name     TEXT,
        stadium_capacity INTEGER CHECK (stadium_capacity IS NULL OR stadium_capacity >= 0),
        created_at       TEXT NOT NULL,
        updated_at       TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS games (
        id           TEXT PRIMARY KEY,
        game_id      INTEGER NOT NULL UNIQUE,
        sport        TEXT NOT NULL CHECK (sport IN ('nfl', 'nba')),
        season       INTEGER NOT NULL CHECK (season BETWEEN 1920 AND 2030),
        season_type  TEXT NOT NULL CHECK (season_type IN ('PRE', 'REG', 'POST')),
        week         INTEGER CHECK (week IS NULL OR week BETWEEN 1 AND 22),
        game_date    TEXT,
        home_team_id INTEGER NOT NULL REFERENCES teams (team_id),
        away_team_id INTEGER NOT NULL REFERENCES teams (team_id),
        home_score   INTEGER CHECK (home_score IS NULL OR home_score >= 0),
        away_score   INTEGER CHECK (away_score IS NULL OR away_score >= 0),
        status       TEXT NOT NULL CHECK (status IN ('Scheduled', 'InProgress', 'Final', 'Postponed')),
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL,
        CHECK (home_team_id <> away_team_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS player_stats (
        id                       TEXT PRIMARY KEY,
        player_id                INTEGER NOT NULL,
        player_name              TEXT NOT NULL,
        game_id                  INTEGER NOT NULL REFERENCES games (game_id),
        team_id                  INTEGER NOT NULL REFERENCES teams (team_id),
        position                 TEXT,
        minutes                  REAL NOT NULL DEFAULT 0 CHECK (minutes >= 0),
        points                   INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
        field_goals_made         INTEGER NOT NULL DEFAULT 0,
        field_goals_attempted    INTEGER NOT NULL DEFAULT 0,
        three_pointers_made      INTEGER NOT NULL DEFAULT 0,
        three_pointers_attempted INTEGER NOT NULL DEFAULT 0,
        free_throws_made         INTEGER NOT NULL DEFAULT 0,
        free_throws_attempted    INTEGER NOT NULL DEFAULT 0,
        rebounds                 INTEGER NOT NULL DEFAULT 0,
        assists                  INTEGER NOT NULL DEFAULT 0,
        turnovers                INTEGER NOT NULL DEFAULT 0,
        passing_yards            INTEGER NOT NULL DEFAULT 0,
        rushing_yards            INTEGER NOT NULL DEFAULT 0,
        receiving_yards          INTEGER NOT NULL DEFAULT 0,
        touchdowns               INTEGER NOT NULL DEFAULT 0,
        created_at               TEXT NOT NULL,
        updated_at               TEXT NOT NULL,
        UNIQUE (player_id, game_id),
        CHECK (field_goals_made <= field_goals_attempted),
        CHECK (three_pointers_made <= three_pointers_attempted),
        CHECK (free_throws_made <= free_throws_attempted)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS shots (
        id            TEXT PRIMARY KEY,
        shot_id       INTEGER NOT NULL UNIQUE,
        game_id       INTEGER NOT NULL REFERENCES games (game_id),
        player_id     INTEGER NOT NULL,
        player_name   TEXT NOT NULL,
        team_id       INTEGER NOT NULL REFERENCES teams (team_id),
        period        INTEGER,
        loc_x         REAL,
        loc_y         REAL,
        shot_distance REAL NOT NULL CHECK (shot_distance >= 0),
        shot_made     INTEGER NOT NULL CHECK (shot_made IN (0, 1)),
        shot_type     TEXT,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS plays (
        id           TEXT PRIMARY KEY,
        play_id      INTEGER NOT NULL UNIQUE,
        game_id      INTEGER NOT NULL REFERENCES games (game_id),
        team_id      INTEGER NOT NULL REFERENCES teams (team_id),
        epa          REAL NOT NULL,
        success      INTEGER NOT NULL CHECK (success IN (0, 1)),
        yardline_100 INTEGER CHECK (yardline_100 IS NULL OR yardline_100 BETWEEN 0 AND 100),
        touchdown    INTEGER NOT NULL CHECK (touchdown IN (0, 1)),
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS team_season_stats (
        team_id               INTEGER NOT NULL,
        season                INTEGER NOT NULL,
        season_type           TEXT NOT NULL,
        games_played          INTEGER NOT NULL,
        wins                  INTEGER NOT NULL,
        losses                INTEGER NOT NULL,
        ties                  INTEGER NOT NULL,
        points_scored         INTEGER NOT NULL,
        points_allowed        INTEGER NOT NULL,
        point_differential    INTEGER NOT NULL,
        win_percentage        REAL NOT NULL,
        avg_points_scored     REAL NOT NULL,
        avg_points_allowed    REAL NOT NULL,
        points_scored_std_dev REAL,
        home_wins             INTEGER NOT NULL,
        away_wins             INTEGER NOT NULL,
        power_ranking         INTEGER NOT NULL,
        PRIMARY KEY (team_id, season, season_type),
        CHECK (point_differential = points_scored - points_allowed),
        CHECK (wins + losses + ties = games_played)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS team_week_performance (
        team_id          INTEGER NOT NULL,
        season           INTEGER NOT NULL,
        week             INTEGER NOT NULL,
        plays            INTEGER NOT NULL,
        total_epa        REAL NOT NULL,
        epa_per_play     REAL,
        success_rate     REAL,
        red_zone_plays   INTEGER NOT NULL,
        red_zone_td_rate REAL,
        PRIMARY KEY (team_id, season, week)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS team_chemistry (
        team_id             INTEGER NOT NULL,
        season              INTEGER NOT NULL,
        games_played        INTEGER NOT NULL,
        possessions         REAL NOT NULL,
        offensive_rating    REAL,
        defensive_rating    REAL,
        net_rating          REAL,
        pace                REAL,
        win_percentage      REAL NOT NULL,
        ball_movement_ratio REAL,
        chemistry_score     REAL,
        chemistry_rating    TEXT NOT NULL,
        PRIMARY KEY (team_id, season)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS player_season_stats (
        player_id             INTEGER NOT NULL,
        season                INTEGER NOT NULL,
        player_name           TEXT NOT NULL,
        team_id               INTEGER NOT NULL,
        games_played          INTEGER NOT NULL,
        minutes_per_game      REAL NOT NULL,
        points_per_game       REAL NOT NULL,
        rebounds_per_game     REAL NOT NULL,
        assists_per_game      REAL NOT NULL,
        field_goal_pct        REAL,
        three_point_pct       REAL,
        true_shooting_pct     REAL,
        usage_rate            REAL,
        assist_turnover_ratio REAL,
        passing_yards         INTEGER NOT NULL,
        rushing_yards         INTEGER NOT NULL,
        receiving_yards       INTEGER NOT NULL,
        touchdowns            INTEGER NOT NULL,
        PRIMARY KEY (player_id, season)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS player_shooting (
        player_id            INTEGER NOT NULL,
        season               INTEGER NOT NULL,
        player_name          TEXT NOT NULL,
        team_id              INTEGER NOT NULL,
        total_attempts       INTEGER NOT NULL,
        total_makes          INTEGER NOT NULL,
        field_goal_pct       REAL,
        at_rim_attempts      INTEGER NOT NULL,
        at_rim_makes         INTEGER NOT NULL,
        at_rim_pct           REAL,
        paint_attempts       INTEGER NOT NULL,
        paint_makes          INTEGER NOT NULL,
        paint_pct            REAL,
        mid_range_attempts   INTEGER NOT NULL,
        mid_range_makes      INTEGER NOT NULL,
        mid_range_pct        REAL,
        three_point_attempts INTEGER NOT NULL,
        three_point_makes    INTEGER NOT NULL,
        three_point_pct      REAL,
        shot_selection_score REAL,
        PRIMARY KEY (player_id, season)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS zone_efficiency (
        season         INTEGER NOT NULL,
        zone           TEXT NOT NULL,
        attempts       INTEGER NOT NULL,
        makes          INTEGER NOT NULL,
        field_goal_pct REAL,
        PRIMARY KEY (season, zone)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS team_shooting_efficiency (
        team_id                       INTEGER NOT NULL,
        season                        INTEGER NOT NULL,
        games_played                  INTEGER NOT NULL CHECK (games_played > 0),
        total_attempts                INTEGER NOT NULL,
        total_makes                   INTEGER NOT NULL,
        close_range_attempts          INTEGER NOT NULL,
        close_range_makes             INTEGER NOT NULL,
        close_range_pct               REAL,
        three_point_attempts          INTEGER NOT NULL,
        three_point_makes             INTEGER NOT NULL,
        three_point_pct               REAL,
        three_point_attempts_per_game REAL NOT NULL,
        efficiency_score              REAL,
        PRIMARY KEY (team_id, season)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS player_development (
        player_id             INTEGER NOT NULL,
        season                INTEGER NOT NULL,
        player_name           TEXT NOT NULL,
        team_id               INTEGER NOT NULL,
        previous_season       INTEGER NOT NULL,
        points_delta          REAL NOT NULL,
        true_shooting_delta   REAL NOT NULL,
        usage_delta           REAL NOT NULL,
        development_score     REAL NOT NULL,
        breakout_probability  REAL NOT NULL CHECK (breakout_probability BETWEEN 0 AND 1),
        is_breakout_candidate INTEGER NOT NULL,
        PRIMARY KEY (player_id, season)
    )
    "#,
    // Reads the canonical team-season rows; no aggregation of its own.
    r#"
    CREATE VIEW IF NOT EXISTS team_records AS
    SELECT t.team_id, t.abbreviation, t.name, s.season, s.season_type,
           s.games_played, s.wins, s.losses, s.ties, s.win_percentage,
           s.avg_points_scored, s.avg_points_allowed, s.point_differential
    FROM team_season_stats s
    JOIN teams t ON t.team_id = s.team_id
    "#,
    "CREATE INDEX IF NOT EXISTS idx_raw_records_pending ON raw_records(normalized_at, id)",
    "CREATE INDEX IF NOT EXISTS idx_games_season ON games(season, season_type)",
    "CREATE INDEX IF NOT EXISTS idx_player_stats_game ON player_stats(game_id)",
    "CREATE INDEX IF NOT EXISTS idx_shots_player ON shots(player_id)",
    "CREATE INDEX IF NOT EXISTS idx_plays_game ON plays(game_id)",
];

/// Tables that `export` may dump.
pub const EXPORTABLE_TABLES: &[&str] = &[
    "teams",
    "games",
    "player_stats",
    "team_season_stats",
    "team_week_performance",
    "team_chemistry",
    "player_season_stats",
    "player_shooting",
    "team_shooting_efficiency",
    "zone_efficiency",
    "player_development",
    "team_records",
];

pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("Database initialized successfully");
    Ok(())
}

// ── Row mapping ──────────────────────────────────────────────────────────────

fn parse_date_column(raw: Option<String>) -> Result<Option<NaiveDate>> {
    raw.map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
        .transpose()
        .map_err(Into::into)
}

fn team_from_row(row: &SqliteRow) -> Result<Team> {
    Ok(Team {
        id: row.get("id"),
        team_id: row.get("team_id"),
        sport: row.get::<String, _>("sport").parse()?,
        abbreviation: row.get("abbreviation"),
        name: row.get("name"),
        city: row.get("city"),
        conference: row.get::<String, _>("conference").parse()?,
        division: row.get("division"),
        primary_color: row.get("primary_color"),
        secondary_color: row.get("secondary_color"),
        stadium_name: row.get("stadium_name"),
        stadium_capacity: row.get("stadium_capacity"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

fn game_from_row(row: &SqliteRow) -> Result<Game> {
    Ok(Game {
        id: row.get("id"),
        game_id: row.get("game_id"),
        sport: row.get::<String, _>("sport").parse()?,
        season: row.get("season"),
        season_type: row.get::<String, _>("season_type").parse()?,
        week: row.get("week"),
        game_date: parse_date_column(row.get("game_date"))?,
        home_team_id: row.get("home_team_id"),
        away_team_id: row.get("away_team_id"),
        home_score: row.get("home_score"),
        away_score: row.get("away_score"),
        status: row.get::<String, _>("status").parse()?,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

fn player_stat_from_row(row: &SqliteRow) -> Result<PlayerGameStat> {
    Ok(PlayerGameStat {
        id: row.get("id"),
        player_id: row.get("player_id"),
        player_name: row.get("player_name"),
        game_id: row.get("game_id"),
        team_id: row.get("team_id"),
        position: row.get("position"),
        stats: BoxScore {
            minutes: row.get("minutes"),
            points: row.get("points"),
            field_goals_made: row.get("field_goals_made"),
            field_goals_attempted: row.get("field_goals_attempted"),
            three_pointers_made: row.get("three_pointers_made"),
            three_pointers_attempted: row.get("three_pointers_attempted"),
            free_throws_made: row.get("free_throws_made"),
            free_throws_attempted: row.get("free_throws_attempted"),
            rebounds: row.get("rebounds"),
            assists: row.get("assists"),
            turnovers: row.get("turnovers"),
            passing_yards: row.get("passing_yards"),
            rushing_yards: row.get("rushing_yards"),
            receiving_yards: row.get("receiving_yards"),
            touchdowns: row.get("touchdowns"),
        },
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

fn shot_from_row(row: &SqliteRow) -> Result<ShotRecord> {
    Ok(ShotRecord {
        id: row.get("id"),
        shot_id: row.get("shot_id"),
        game_id: row.get("game_id"),
        player_id: row.get("player_id"),
        player_name: row.get("player_name"),
        team_id: row.get("team_id"),
        period: row.get("period"),
        loc_x: row.get("loc_x"),
        loc_y: row.get("loc_y"),
        shot_distance: row.get("shot_distance"),
        shot_made: row.get("shot_made"),
        shot_type: row.get("shot_type"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

fn play_from_row(row: &SqliteRow) -> Result<PlayRecord> {
    Ok(PlayRecord {
        id: row.get("id"),
        play_id: row.get("play_id"),
        game_id: row.get("game_id"),
        team_id: row.get("team_id"),
        epa: row.get("epa"),
        success: row.get("success"),
        yardline_100: row.get("yardline_100"),
        touchdown: row.get("touchdown"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

// ── Team operations ──────────────────────────────────────────────────────────

pub async fn find_team(conn: &mut SqliteConnection, team_id: i64) -> Result<Option<Team>> {
    let row = sqlx::query("SELECT * FROM teams WHERE team_id = ?")
        .bind(team_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(team_from_row).transpose()
}

pub async fn find_team_by_abbreviation(
    conn: &mut SqliteConnection,
    sport: Sport,
    abbreviation: &str,
) -> Result<Option<Team>> {
    let row = sqlx::query("SELECT * FROM teams WHERE sport = ? AND UPPER(abbreviation) = UPPER(?)")
        .bind(sport.as_str())
        .bind(abbreviation)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(team_from_row).transpose()
}

pub async fn insert_team(conn: &mut SqliteConnection, team: &Team) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO teams
        (id, team_id, sport, abbreviation, name, city, conference, division,
         primary_color, secondary_color, stadium_name, stadium_capacity, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&team.id)
    .bind(team.team_id)
    .bind(team.sport.as_str())
    .bind(&team.abbreviation)
    .bind(&team.name)
    .bind(&team.city)
    .bind(team.conference.as_str())
    .bind(&team.division)
    .bind(&team.primary_color)
    .bind(&team.secondary_color)
    .bind(&team.stadium_name)
    .bind(team.stadium_capacity)
    .bind(team.created_at.to_rfc3339())
    .bind(team.updated_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Overwrites the loaded fields by natural key; `id` and `created_at` stay.
pub async fn update_team(conn: &mut SqliteConnection, team: &Team) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE teams SET
            sport = ?, abbreviation = ?, name = ?, city = ?, conference = ?, division = ?,
            primary_color = ?, secondary_color = ?, stadium_name = ?, stadium_capacity = ?,
            updated_at = ?
        WHERE team_id = ?
        "#,
    )
    .bind(team.sport.as_str())
    .bind(&team.abbreviation)
    .bind(&team.name)
    .bind(&team.city)
    .bind(team.conference.as_str())
    .bind(&team.division)
    .bind(&team.primary_color)
    .bind(&team.secondary_color)
    .bind(&team.stadium_name)
    .bind(team.stadium_capacity)
    .bind(team.updated_at.to_rfc3339())
    .bind(team.team_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn get_all_teams(pool: &SqlitePool) -> Result<Vec<Team>> {
    let rows = sqlx::query("SELECT * FROM teams ORDER BY sport, conference, name")
        .fetch_all(pool)
        .await?;
    rows.iter().map(team_from_row).collect()
}

pub async fn get_team(pool: &SqlitePool, team_id: i64) -> Result<Option<Team>> {
    let mut conn = pool.acquire().await?;
    find_team(&mut conn, team_id).await
}

pub async fn search_teams(pool: &SqlitePool, query: &str) -> Result<Vec<Team>> {
    let rows = sqlx::query(
        "SELECT * FROM teams WHERE LOWER(name) LIKE LOWER(?) OR UPPER(abbreviation) = UPPER(?) ORDER BY name",
    )
    .bind(format!("%{}%", query))
    .bind(query)
    .fetch_all(pool)
    .await?;
    rows.iter().map(team_from_row).collect()
}

// ── Game operations ──────────────────────────────────────────────────────────

pub async fn find_game(conn: &mut SqliteConnection, game_id: i64) -> Result<Option<Game>> {
    let row = sqlx::query("SELECT * FROM games WHERE game_id = ?")
        .bind(game_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(game_from_row).transpose()
}

pub async fn insert_game(conn: &mut SqliteConnection, game: &Game) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO games
        (id, game_id, sport, season, season_type, week, game_date, home_team_id, away_team_id,
         home_score, away_score, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&game.id)
    .bind(game.game_id)
    .bind(game.sport.as_str())
    .bind(game.season)
    .bind(game.season_type.as_str())
    .bind(game.week)
    .bind(game.game_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(game.home_team_id)
    .bind(game.away_team_id)
    .bind(game.home_score)
    .bind(game.away_score)
    .bind(game.status.as_str())
    .bind(game.created_at.to_rfc3339())
    .bind(game.updated_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn update_game(conn: &mut SqliteConnection, game: &Game) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE games SET
            sport = ?, season = ?, season_type = ?, week = ?, game_date = ?,
            home_team_id = ?, away_team_id = ?, home_score = ?, away_score = ?, status = ?,
            updated_at = ?
        WHERE game_id = ?
        "#,
    )
    .bind(game.sport.as_str())
    .bind(game.season)
    .bind(game.season_type.as_str())
    .bind(game.week)
    .bind(game.game_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(game.home_team_id)
    .bind(game.away_team_id)
    .bind(game.home_score)
    .bind(game.away_score)
    .bind(game.status.as_str())
    .bind(game.updated_at.to_rfc3339())
    .bind(game.game_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn get_team_recent_games(pool: &SqlitePool, team_id: i64, limit: i64) -> Result<Vec<Game>> {
    let rows = sqlx::query(
        r#"SELECT * FROM games
           WHERE (home_team_id = ? OR away_team_id = ?) AND status = 'Final'
           ORDER BY season DESC, game_date DESC, game_id DESC LIMIT ?"#,
    )
    .bind(team_id)
    .bind(team_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.iter().map(game_from_row).collect()
}

// ── Player stat operations ───────────────────────────────────────────────────

pub async fn find_player_stat(
    conn: &mut SqliteConnection,
    player_id: i64,
    game_id: i64,
) -> Result<Option<PlayerGameStat>> {
    let row = sqlx::query("SELECT * FROM player_stats WHERE player_id = ? AND game_id = ?")
        .bind(player_id)
        .bind(game_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(player_stat_from_row).transpose()
}

pub async fn insert_player_stat(conn: &mut SqliteConnection, stat: &PlayerGameStat) -> Result<()> {
    let s = &stat.stats;
    sqlx::query(
        r#"
        INSERT INTO player_stats
        (id, player_id, player_name, game_id, team_id, position, minutes, points,
         field_goals_made, field_goals_attempted, three_pointers_made, three_pointers_attempted,
         free_throws_made, free_throws_attempted, rebounds, assists, turnovers,
         passing_yards, rushing_yards, receiving_yards, touchdowns, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&stat.id)
    .bind(stat.player_id)
    .bind(&stat.player_name)
    .bind(stat.game_id)
    .bind(stat.team_id)
    .bind(&stat.position)
    .bind(s.minutes)
    .bind(s.points)
    .bind(s.field_goals_made)
    .bind(s.field_goals_attempted)
    .bind(s.three_pointers_made)
    .bind(s.three_pointers_attempted)
    .bind(s.free_throws_made)
    .bind(s.free_throws_attempted)
    .bind(s.rebounds)
    .bind(s.assists)
    .bind(s.turnovers)
    .bind(s.passing_yards)
    .bind(s.rushing_yards)
    .bind(s.receiving_yards)
    .bind(s.touchdowns)
    .bind(stat.created_at.to_rfc3339())
    .bind(stat.updated_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn update_player_stat(conn: &mut SqliteConnection, stat: &PlayerGameStat) -> Result<()> {
    let s = &stat.stats;
    sqlx::query(
        r#"
        UPDATE player_stats SET
            player_name = ?, team_id = ?, position = ?, minutes = ?, points = ?,
            field_goals_made = ?, field_goals_attempted = ?,
            three_pointers_made = ?, three_pointers_attempted = ?,
            free_throws_made = ?, free_throws_attempted = ?,
            rebounds = ?, assists = ?, turnovers = ?,
            passing_yards = ?, rushing_yards = ?, receiving_yards = ?, touchdowns = ?,
            updated_at = ?
        WHERE player_id = ? AND game_id = ?
        "#,
    )
    .bind(&stat.player_name)
    .bind(stat.team_id)
    .bind(&stat.position)
    .bind(s.minutes)
    .bind(s.points)
    .bind(s.field_goals_made)
    .bind(s.field_goals_attempted)
    .bind(s.three_pointers_made)
    .bind(s.three_pointers_attempted)
    .bind(s.free_throws_made)
    .bind(s.free_throws_attempted)
    .bind(s.rebounds)
    .bind(s.assists)
    .bind(s.turnovers)
    .bind(s.passing_yards)
    .bind(s.rushing_yards)
    .bind(s.receiving_yards)
    .bind(s.touchdowns)
    .bind(stat.updated_at.to_rfc3339())
    .bind(stat.player_id)
    .bind(stat.game_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// ── Shot operations ──────────────────────────────────────────────────────────

pub async fn find_shot(conn: &mut SqliteConnection, shot_id: i64) -> Result<Option<ShotRecord>> {
    let row = sqlx::query("SELECT * FROM shots WHERE shot_id = ?")
        .bind(shot_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(shot_from_row).transpose()
}

pub async fn insert_shot(conn: &mut SqliteConnection, shot: &ShotRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO shots
        (id, shot_id, game_id, player_id, player_name, team_id, period, loc_x, loc_y,
         shot_distance, shot_made, shot_type, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&shot.id)
    .bind(shot.shot_id)
    .bind(shot.game_id)
    .bind(shot.player_id)
    .bind(&shot.player_name)
    .bind(shot.team_id)
    .bind(shot.period)
    .bind(shot.loc_x)
    .bind(shot.loc_y)
    .bind(shot.shot_distance)
    .bind(shot.shot_made)
    .bind(&shot.shot_type)
    .bind(shot.created_at.to_rfc3339())
    .bind(shot.updated_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn update_shot(conn: &mut SqliteConnection, shot: &ShotRecord) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE shots SET
            game_id = ?, player_id = ?, player_name = ?, team_id = ?, period = ?,
            loc_x = ?, loc_y = ?, shot_distance = ?, shot_made = ?, shot_type = ?,
            updated_at = ?
        WHERE shot_id = ?
        "#,
    )
    .bind(shot.game_id)
    .bind(shot.player_id)
    .bind(&shot.player_name)
    .bind(shot.team_id)
    .bind(shot.period)
    .bind(shot.loc_x)
    .bind(shot.loc_y)
    .bind(shot.shot_distance)
    .bind(shot.shot_made)
    .bind(&shot.shot_type)
    .bind(shot.updated_at.to_rfc3339())
    .bind(shot.shot_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// ── Play operations ──────────────────────────────────────────────────────────

pub async fn find_play(conn: &mut SqliteConnection, play_id: i64) -> Result<Option<PlayRecord>> {
    let row = sqlx::query("SELECT * FROM plays WHERE play_id = ?")
        .bind(play_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(play_from_row).transpose()
}

pub async fn insert_play(conn: &mut SqliteConnection, play: &PlayRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO plays
        (id, play_id, game_id, team_id, epa, success, yardline_100, touchdown, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&play.id)
    .bind(play.play_id)
    .bind(play.game_id)
    .bind(play.team_id)
    .bind(play.epa)
    .bind(play.success)
    .bind(play.yardline_100)
    .bind(play.touchdown)
    .bind(play.created_at.to_rfc3339())
    .bind(play.updated_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn update_play(conn: &mut SqliteConnection, play: &PlayRecord) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE plays SET
            game_id = ?, team_id = ?, epa = ?, success = ?, yardline_100 = ?, touchdown = ?,
            updated_at = ?
        WHERE play_id = ?
        "#,
    )
    .bind(play.game_id)
    .bind(play.team_id)
    .bind(play.epa)
    .bind(play.success)
    .bind(play.yardline_100)
    .bind(play.touchdown)
    .bind(play.updated_at.to_rfc3339())
    .bind(play.play_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// ── Canonical table loads (Metric Engine input) ──────────────────────────────

pub async fn load_teams(pool: &SqlitePool) -> Result<Vec<Team>> {
    let rows = sqlx::query("SELECT * FROM teams ORDER BY team_id")
        .fetch_all(pool)
        .await?;
    rows.iter().map(team_from_row).collect()
}

pub async fn load_games(pool: &SqlitePool) -> Result<Vec<Game>> {
    let rows = sqlx::query("SELECT * FROM games ORDER BY game_id")
        .fetch_all(pool)
        .await?;
    rows.iter().map(game_from_row).collect()
}

pub async fn load_player_stats(pool: &SqlitePool) -> Result<Vec<PlayerGameStat>> {
    let rows = sqlx::query("SELECT * FROM player_stats ORDER BY game_id, player_id")
        .fetch_all(pool)
        .await?;
    rows.iter().map(player_stat_from_row).collect()
}

pub async fn load_shots(pool: &SqlitePool) -> Result<Vec<ShotRecord>> {
    let rows = sqlx::query("SELECT * FROM shots ORDER BY shot_id")
        .fetch_all(pool)
        .await?;
    rows.iter().map(shot_from_row).collect()
}

pub async fn load_plays(pool: &SqlitePool) -> Result<Vec<PlayRecord>> {
    let rows = sqlx::query("SELECT * FROM plays ORDER BY play_id")
        .fetch_all(pool)
        .await?;
    rows.iter().map(play_from_row).collect()
}

// ── Aggregate store ──────────────────────────────────────────────────────────

/// Replace the aggregate rows covered by `scope` with `set` in one transaction.
pub async fn replace_aggregates(
    pool: &SqlitePool,
    scope: &MetricScope,
    set: &AggregateSet,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    if scope.player_id.is_none() {
        for table in [
            "team_season_stats",
            "team_week_performance",
            "team_chemistry",
            "team_shooting_efficiency",
        ] {
            let sql = format!(
                "DELETE FROM {} WHERE (?1 IS NULL OR season = ?1) AND (?2 IS NULL OR team_id = ?2)",
                table
            );
            sqlx::query(&sql)
                .bind(scope.season)
                .bind(scope.team_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    for table in ["player_season_stats", "player_shooting", "player_development"] {
        let sql = format!(
            "DELETE FROM {} WHERE (?1 IS NULL OR season = ?1) AND (?2 IS NULL OR team_id = ?2) \
             AND (?3 IS NULL OR player_id = ?3)",
            table
        );
        sqlx::query(&sql)
            .bind(scope.season)
            .bind(scope.team_id)
            .bind(scope.player_id)
            .execute(&mut *tx)
            .await?;
    }

    if scope.covers_league() {
        sqlx::query("DELETE FROM zone_efficiency WHERE (?1 IS NULL OR season = ?1)")
            .bind(scope.season)
            .execute(&mut *tx)
            .await?;
    }

    for row in &set.team_seasons {
        insert_team_season(&mut tx, row).await?;
    }
    for row in &set.team_weeks {
        insert_team_week(&mut tx, row).await?;
    }
    for row in &set.team_chemistry {
        insert_team_chemistry(&mut tx, row).await?;
    }
    for row in &set.player_seasons {
        insert_player_season(&mut tx, row).await?;
    }
    for row in &set.player_shooting {
        insert_player_shooting(&mut tx, row).await?;
    }
    for row in &set.team_shooting {
        insert_team_shooting(&mut tx, row).await?;
    }
    for row in &set.zone_efficiency {
        insert_zone_efficiency(&mut tx, row).await?;
    }
    for row in &set.player_development {
        insert_player_development(&mut tx, row).await?;
    }

    tx.commit().await?;
    tracing::info!("Aggregate store replaced: {} rows", set.row_count());
    Ok(())
}

async fn insert_team_season(conn: &mut SqliteConnection, row: &TeamSeasonStats) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO team_season_stats
        (team_id, season, season_type, games_played, wins, losses, ties, points_scored,
         points_allowed, point_differential, win_percentage, avg_points_scored, avg_points_allowed,
         points_scored_std_dev, home_wins, away_wins, power_ranking)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.team_id)
    .bind(row.season)
    .bind(row.season_type.as_str())
    .bind(row.games_played)
    .bind(row.wins)
    .bind(row.losses)
    .bind(row.ties)
    .bind(row.points_scored)
    .bind(row.points_allowed)
    .bind(row.point_differential)
    .bind(row.win_percentage)
    .bind(row.avg_points_scored)
    .bind(row.avg_points_allowed)
    .bind(row.points_scored_std_dev)
    .bind(row.home_wins)
    .bind(row.away_wins)
    .bind(row.power_ranking)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_team_week(conn: &mut SqliteConnection, row: &TeamWeekPerformance) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO team_week_performance
        (team_id, season, week, plays, total_epa, epa_per_play, success_rate, red_zone_plays, red_zone_td_rate)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.team_id)
    .bind(row.season)
    .bind(row.week)
    .bind(row.plays)
    .bind(row.total_epa)
    .bind(row.epa_per_play)
    .bind(row.success_rate)
    .bind(row.red_zone_plays)
    .bind(row.red_zone_td_rate)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_team_chemistry(conn: &mut SqliteConnection, row: &TeamChemistry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO team_chemistry
        (team_id, season, games_played, possessions, offensive_rating, defensive_rating,
         net_rating, pace, win_percentage, ball_movement_ratio, chemistry_score, chemistry_rating)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.team_id)
    .bind(row.season)
    .bind(row.games_played)
    .bind(row.possessions)
    .bind(row.offensive_rating)
    .bind(row.defensive_rating)
    .bind(row.net_rating)
    .bind(row.pace)
    .bind(row.win_percentage)
    .bind(row.ball_movement_ratio)
    .bind(row.chemistry_score)
    .bind(row.chemistry_rating.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_player_season(conn: &mut SqliteConnection, row: &PlayerSeasonStats) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO player_season_stats
        (player_id, season, player_name, team_id, games_played, minutes_per_game, points_per_game,
         rebounds_per_game, assists_per_game, field_goal_pct, three_point_pct, true_shooting_pct,
         usage_rate, assist_turnover_ratio, passing_yards, rushing_yards, receiving_yards, touchdowns)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.player_id)
    .bind(row.season)
    .bind(&row.player_name)
    .bind(row.team_id)
    .bind(row.games_played)
    .bind(row.minutes_per_game)
    .bind(row.points_per_game)
    .bind(row.rebounds_per_game)
    .bind(row.assists_per_game)
    .bind(row.field_goal_pct)
    .bind(row.three_point_pct)
    .bind(row.true_shooting_pct)
    .bind(row.usage_rate)
    .bind(row.assist_turnover_ratio)
    .bind(row.passing_yards)
    .bind(row.rushing_yards)
    .bind(row.receiving_yards)
    .bind(row.touchdowns)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_player_shooting(conn: &mut SqliteConnection, row: &PlayerShooting) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO player_shooting
        (player_id, season, player_name, team_id, total_attempts, total_makes, field_goal_pct,
         at_rim_attempts, at_rim_makes, at_rim_pct, paint_attempts, paint_makes, paint_pct,
         mid_range_attempts, mid_range_makes, mid_range_pct,
         three_point_attempts, three_point_makes, three_point_pct, shot_selection_score)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.player_id)
    .bind(row.season)
    .bind(&row.player_name)
    .bind(row.team_id)
    .bind(row.total_attempts)
    .bind(row.total_makes)
    .bind(row.field_goal_pct)
    .bind(row.at_rim.attempts)
    .bind(row.at_rim.makes)
    .bind(row.at_rim.field_goal_pct())
    .bind(row.paint.attempts)
    .bind(row.paint.makes)
    .bind(row.paint.field_goal_pct())
    .bind(row.mid_range.attempts)
    .bind(row.mid_range.makes)
    .bind(row.mid_range.field_goal_pct())
    .bind(row.three_point.attempts)
    .bind(row.three_point.makes)
    .bind(row.three_point.field_goal_pct())
    .bind(row.shot_selection_score)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_team_shooting(conn: &mut SqliteConnection, row: &TeamShootingEfficiency) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO team_shooting_efficiency
        (team_id, season, games_played, total_attempts, total_makes,
         close_range_attempts, close_range_makes, close_range_pct,
         three_point_attempts, three_point_makes, three_point_pct,
         three_point_attempts_per_game, efficiency_score)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.team_id)
    .bind(row.season)
    .bind(row.games_played)
    .bind(row.total_attempts)
    .bind(row.total_makes)
    .bind(row.close_range.attempts)
    .bind(row.close_range.makes)
    .bind(row.close_range.field_goal_pct())
    .bind(row.three_point.attempts)
    .bind(row.three_point.makes)
    .bind(row.three_point.field_goal_pct())
    .bind(row.three_point_attempts_per_game)
    .bind(row.efficiency_score)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_zone_efficiency(conn: &mut SqliteConnection, row: &ZoneEfficiency) -> Result<()> {
    sqlx::query(
        "INSERT OR REPLACE INTO zone_efficiency (season, zone, attempts, makes, field_goal_pct) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(row.season)
    .bind(row.zone.as_str())
    .bind(row.attempts)
    .bind(row.makes)
    .bind(row.field_goal_pct)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_player_development(conn: &mut SqliteConnection, row: &PlayerDevelopment) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO player_development
        (player_id, season, player_name, team_id, previous_season, points_delta,
         true_shooting_delta, usage_delta, development_score, breakout_probability, is_breakout_candidate)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.player_id)
    .bind(row.season)
    .bind(&row.player_name)
    .bind(row.team_id)
    .bind(row.previous_season)
    .bind(row.points_delta)
    .bind(row.true_shooting_delta)
    .bind(row.usage_delta)
    .bind(row.development_score)
    .bind(row.breakout_probability)
    .bind(row.is_breakout_candidate)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// ── Report queries ───────────────────────────────────────────────────────────

fn team_season_from_row(row: &SqliteRow) -> Result<TeamSeasonStats> {
    Ok(TeamSeasonStats {
        team_id: row.get("team_id"),
        season: row.get("season"),
        season_type: row.get::<String, _>("season_type").parse()?,
        games_played: row.get("games_played"),
        wins: row.get("wins"),
        losses: row.get("losses"),
        ties: row.get("ties"),
        points_scored: row.get("points_scored"),
        points_allowed: row.get("points_allowed"),
        point_differential: row.get("point_differential"),
        win_percentage: row.get("win_percentage"),
        avg_points_scored: row.get("avg_points_scored"),
        avg_points_allowed: row.get("avg_points_allowed"),
        points_scored_std_dev: row.get("points_scored_std_dev"),
        home_wins: row.get("home_wins"),
        away_wins: row.get("away_wins"),
        power_ranking: row.get("power_ranking"),
    })
}

pub async fn get_team_season_stats(
    pool: &SqlitePool,
    season: Option<i32>,
    team_id: Option<i64>,
) -> Result<Vec<TeamSeasonStats>> {
    let rows = sqlx::query(
        r#"SELECT * FROM team_season_stats
           WHERE (?1 IS NULL OR season = ?1) AND (?2 IS NULL OR team_id = ?2)
           ORDER BY season DESC, season_type, power_ranking"#,
    )
    .bind(season)
    .bind(team_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(team_season_from_row).collect()
}

/// Rows of the `team_records` view.
pub async fn get_team_records(pool: &SqlitePool, season: Option<i32>) -> Result<Vec<TeamRecord>> {
    let rows = sqlx::query(
        r#"SELECT * FROM team_records
           WHERE (?1 IS NULL OR season = ?1)
           ORDER BY season DESC, season_type, win_percentage DESC, point_differential DESC, team_id"#,
    )
    .bind(season)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        records.push(TeamRecord {
            team_id: row.get("team_id"),
            abbreviation: row.get("abbreviation"),
            name: row.get("name"),
            season: row.get("season"),
            season_type: row.get::<String, _>("season_type").parse()?,
            games_played: row.get("games_played"),
            wins: row.get("wins"),
            losses: row.get("losses"),
            ties: row.get("ties"),
            win_percentage: row.get("win_percentage"),
            avg_points_scored: row.get("avg_points_scored"),
            avg_points_allowed: row.get("avg_points_allowed"),
            point_differential: row.get("point_differential"),
        });
    }
    Ok(records)
}

pub async fn get_team_weeks(
    pool: &SqlitePool,
    season: Option<i32>,
    team_id: Option<i64>,
) -> Result<Vec<TeamWeekPerformance>> {
    let rows = sqlx::query(
        r#"SELECT * FROM team_week_performance
           WHERE (?1 IS NULL OR season = ?1) AND (?2 IS NULL OR team_id = ?2)
           ORDER BY season DESC, week, epa_per_play DESC NULLS LAST"#,
    )
    .bind(season)
    .bind(team_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| TeamWeekPerformance {
            team_id: row.get("team_id"),
            season: row.get("season"),
            week: row.get("week"),
            plays: row.get("plays"),
            total_epa: row.get("total_epa"),
            epa_per_play: row.get("epa_per_play"),
            success_rate: row.get("success_rate"),
            red_zone_plays: row.get("red_zone_plays"),
            red_zone_td_rate: row.get("red_zone_td_rate"),
        })
        .collect())
}

pub async fn get_chemistry_rankings(
    pool: &SqlitePool,
    season: Option<i32>,
    limit: i64,
) -> Result<Vec<TeamChemistry>> {
    let rows = sqlx::query(
        r#"SELECT * FROM team_chemistry
           WHERE (?1 IS NULL OR season = ?1)
           ORDER BY chemistry_score DESC NULLS LAST, team_id
           LIMIT ?2"#,
    )
    .bind(season)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut teams = Vec::with_capacity(rows.len());
    for row in rows {
        teams.push(TeamChemistry {
            team_id: row.get("team_id"),
            season: row.get("season"),
            games_played: row.get("games_played"),
            possessions: row.get("possessions"),
            offensive_rating: row.get("offensive_rating"),
            defensive_rating: row.get("defensive_rating"),
            net_rating: row.get("net_rating"),
            pace: row.get("pace"),
            win_percentage: row.get("win_percentage"),
            ball_movement_ratio: row.get("ball_movement_ratio"),
            chemistry_score: row.get("chemistry_score"),
            chemistry_rating: row.get::<String, _>("chemistry_rating").parse()?,
        });
    }
    Ok(teams)
}

pub async fn get_shooting_rankings(
    pool: &SqlitePool,
    season: Option<i32>,
    limit: i64,
) -> Result<Vec<PlayerShooting>> {
    let rows = sqlx::query(
        r#"SELECT * FROM player_shooting
           WHERE (?1 IS NULL OR season = ?1)
           ORDER BY shot_selection_score DESC NULLS LAST, player_id
           LIMIT ?2"#,
    )
    .bind(season)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let zone = |row: &SqliteRow, prefix: &str| ZoneLine {
        attempts: row.get(format!("{}_attempts", prefix).as_str()),
        makes: row.get(format!("{}_makes", prefix).as_str()),
    };

    Ok(rows
        .iter()
        .map(|row| PlayerShooting {
            player_id: row.get("player_id"),
            season: row.get("season"),
            player_name: row.get("player_name"),
            team_id: row.get("team_id"),
            total_attempts: row.get("total_attempts"),
            total_makes: row.get("total_makes"),
            field_goal_pct: row.get("field_goal_pct"),
            at_rim: zone(row, "at_rim"),
            paint: zone(row, "paint"),
            mid_range: zone(row, "mid_range"),
            three_point: zone(row, "three_point"),
            shot_selection_score: row.get("shot_selection_score"),
        })
        .collect())
}

pub async fn get_team_shooting_rankings(
    pool: &SqlitePool,
    season: Option<i32>,
    limit: i64,
) -> Result<Vec<TeamShootingEfficiency>> {
    let rows = sqlx::query(
        r#"SELECT * FROM team_shooting_efficiency
           WHERE (?1 IS NULL OR season = ?1)
           ORDER BY efficiency_score DESC NULLS LAST, team_id
           LIMIT ?2"#,
    )
    .bind(season)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| TeamShootingEfficiency {
            team_id: row.get("team_id"),
            season: row.get("season"),
            games_played: row.get("games_played"),
            total_attempts: row.get("total_attempts"),
            total_makes: row.get("total_makes"),
            close_range: ZoneLine {
                attempts: row.get("close_range_attempts"),
                makes: row.get("close_range_makes"),
            },
            three_point: ZoneLine {
                attempts: row.get("three_point_attempts"),
                makes: row.get("three_point_makes"),
            },
            three_point_attempts_per_game: row.get("three_point_attempts_per_game"),
            efficiency_score: row.get("efficiency_score"),
        })
        .collect())
}

pub async fn get_zone_efficiency(pool: &SqlitePool, season: Option<i32>) -> Result<Vec<ZoneEfficiency>> {
    let rows = sqlx::query(
        "SELECT * FROM zone_efficiency WHERE (?1 IS NULL OR season = ?1) ORDER BY season DESC, zone",
    )
    .bind(season)
    .fetch_all(pool)
    .await?;

    let mut zones = Vec::with_capacity(rows.len());
    for row in rows {
        zones.push(ZoneEfficiency {
            season: row.get("season"),
            zone: row.get::<String, _>("zone").parse()?,
            attempts: row.get("attempts"),
            makes: row.get("makes"),
            field_goal_pct: row.get("field_goal_pct"),
        });
    }
    Ok(zones)
}

pub async fn get_breakout_rankings(
    pool: &SqlitePool,
    season: Option<i32>,
    candidates_only: bool,
    limit: i64,
) -> Result<Vec<PlayerDevelopment>> {
    let rows = sqlx::query(
        r#"SELECT * FROM player_development
           WHERE (?1 IS NULL OR season = ?1) AND (?2 = 0 OR is_breakout_candidate = 1)
           ORDER BY breakout_probability DESC, player_id
           LIMIT ?3"#,
    )
    .bind(season)
    .bind(candidates_only)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| PlayerDevelopment {
            player_id: row.get("player_id"),
            season: row.get("season"),
            player_name: row.get("player_name"),
            team_id: row.get("team_id"),
            previous_season: row.get("previous_season"),
            points_delta: row.get("points_delta"),
            true_shooting_delta: row.get("true_shooting_delta"),
            usage_delta: row.get("usage_delta"),
            development_score: row.get("development_score"),
            breakout_probability: row.get("breakout_probability"),
            is_breakout_candidate: row.get("is_breakout_candidate"),
        })
        .collect())
}

pub async fn get_team_profile(pool: &SqlitePool, team_id: i64) -> Result<Option<TeamProfile>> {
    let Some(team) = get_team(pool, team_id).await? else {
        return Ok(None);
    };
    Ok(Some(TeamProfile {
        team,
        seasons: get_team_season_stats(pool, None, Some(team_id)).await?,
        recent_games: get_team_recent_games(pool, team_id, 10).await?,
    }))
}

/// Dump a table or view as column names plus JSON-typed cells.
pub async fn export_rows(
    pool: &SqlitePool,
    table: &str,
) -> Result<(Vec<String>, Vec<Vec<serde_json::Value>>)> {
    if !EXPORTABLE_TABLES.contains(&table) {
        return Err(anyhow::anyhow!("Table '{}' cannot be exported", table));
    }

    // Header comes from the schema so empty tables still export their columns.
    let columns: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
            .bind(table)
            .fetch_all(pool)
            .await?;

    let rows = sqlx::query(&format!("SELECT {} FROM {}", columns.join(", "), table))
        .fetch_all(pool)
        .await?;

    let mut data = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut cells = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            let cell = if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
                v.map_or(serde_json::Value::Null, Into::into)
            } else if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
                v.map_or(serde_json::Value::Null, Into::into)
            } else {
                row.try_get::<Option<String>, _>(i)
                    .ok()
                    .flatten()
                    .map_or(serde_json::Value::Null, Into::into)
            };
            cells.push(cell);
        }
        data.push(cells);
    }

    Ok((columns, data))
}

#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory pool");
    init_database_with_pool(&pool).await.expect("schema");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_team(team_id: i64, name: &str, conference: Conference) -> Team {
        Team {
            id: Uuid::new_v4().to_string(),
            team_id,
            sport: conference.sport(),
            abbreviation: None,
            name: name.to_string(),
            city: None,
            conference,
            division: None,
            primary_color: None,
            secondary_color: None,
            stadium_name: None,
            stadium_capacity: Some(80000),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_game(game_id: i64, home: i64, away: i64) -> Game {
        Game {
            id: Uuid::new_v4().to_string(),
            game_id,
            sport: Sport::Nfl,
            season: 2024,
            season_type: SeasonType::Regular,
            week: Some(1),
            game_date: NaiveDate::from_ymd_opt(2024, 9, 8),
            home_team_id: home,
            away_team_id: away,
            home_score: Some(21),
            away_score: Some(17),
            status: GameStatus::Final,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_team_round_trip() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let team = sample_team(1, "Dallas Cowboys", Conference::Nfc);
        insert_team(&mut conn, &team).await.unwrap();

        let loaded = find_team(&mut conn, 1).await.unwrap().unwrap();
        assert_eq!(loaded.id, team.id);
        assert!(loaded.same_content(&team));
        assert!(find_team(&mut conn, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_schema_rejects_self_matchup_and_unknown_team() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        insert_team(&mut conn, &sample_team(1, "Dallas Cowboys", Conference::Nfc)).await.unwrap();

        assert!(insert_game(&mut conn, &sample_game(1, 1, 1)).await.is_err());
        assert!(insert_game(&mut conn, &sample_game(2, 1, 99)).await.is_err());
        assert!(find_game(&mut conn, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_export_rejects_unknown_table() {
        let pool = memory_pool().await;
        assert!(export_rows(&pool, "sqlite_master").await.is_err());

        let mut conn = pool.acquire().await.unwrap();
        insert_team(&mut conn, &sample_team(7, "Boston Celtics", Conference::East)).await.unwrap();
        drop(conn);

        let (columns, rows) = export_rows(&pool, "teams").await.unwrap();
        assert!(columns.contains(&"team_id".to_string()));
        assert_eq!(rows.len(), 1);
        let team_id_col = columns.iter().position(|c| c == "team_id").unwrap();
        assert_eq!(rows[0][team_id_col], serde_json::json!(7));
    }

    #[tokio::test]
    async fn test_export_empty_table_keeps_header() {
        let pool = memory_pool().await;

        let (columns, rows) = export_rows(&pool, "team_chemistry").await.unwrap();
        assert!(rows.is_empty());
        assert!(columns.contains(&"chemistry_score".to_string()), "{:?}", columns);

        let (columns, rows) = export_rows(&pool, "team_records").await.unwrap();
        assert!(rows.is_empty());
        assert!(columns.contains(&"win_percentage".to_string()), "{:?}", columns);
    }
}
