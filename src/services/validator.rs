use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;
use crate::utils::parse_game_date;

/// Why a raw record was not loaded. Each variant names the failing rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{field}' has invalid value {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{0} must not be negative")]
    Negative(&'static str),
    #[error("{made} exceeds {attempted}")]
    MadeExceedsAttempted {
        made: &'static str,
        attempted: &'static str,
    },
    #[error("home and away team are both {0}")]
    SelfMatchup(i64),
    #[error("conference '{conference}' does not belong to {sport}")]
    ConferenceMismatch { conference: String, sport: Sport },
    #[error("unknown game status '{0}'")]
    UnknownStatus(String),
    #[error("Final game is missing a score")]
    MissingFinalScore,
    #[error("unknown reference: {0}")]
    UnknownReference(String),
    #[error("game {0} is Final and can only change in a corrective load")]
    FinalGameLocked(i64),
    #[error("{kind} {key} is already loaded and can only change in a corrective load")]
    ImmutableRecord { kind: RecordKind, key: String },
    #[error("constraint violated: {0}")]
    Constraint(String),
}

impl RejectReason {
    /// Short rule name used in rejection reports.
    pub fn rule(&self) -> &'static str {
        match self {
            RejectReason::MissingField(_) => "missing_field",
            RejectReason::InvalidValue { .. } => "invalid_value",
            RejectReason::OutOfRange { .. } => "out_of_range",
            RejectReason::Negative(_) => "negative_value",
            RejectReason::MadeExceedsAttempted { .. } => "made_exceeds_attempted",
            RejectReason::SelfMatchup(_) => "self_matchup",
            RejectReason::ConferenceMismatch { .. } => "conference_mismatch",
            RejectReason::UnknownStatus(_) => "unknown_status",
            RejectReason::MissingFinalScore => "missing_final_score",
            RejectReason::UnknownReference(_) => "unknown_reference",
            RejectReason::FinalGameLocked(_) => "final_game_locked",
            RejectReason::ImmutableRecord { .. } => "immutable_record",
            RejectReason::Constraint(_) => "constraint",
        }
    }
}

/// Upper bounds for a single game's score and per-game counting stats.
const MAX_SCORE: i64 = 500;
const MAX_COUNT: i64 = 10_000;

// Field aliases: canonical name first, then SportsDataIO and stats.nba.com spellings.
const TEAM_ID: &[&str] = &["team_id", "TeamID", "TEAM_ID"];
const TEAM_NAME: &[&str] = &["name", "FullName", "Name", "TEAM_NAME"];
const ABBREVIATION: &[&str] = &["abbreviation", "Key", "TEAM_ABBREVIATION"];
const CITY: &[&str] = &["city", "City"];
const CONFERENCE: &[&str] = &["conference", "Conference"];
const DIVISION: &[&str] = &["division", "Division"];
const PRIMARY_COLOR: &[&str] = &["primary_color", "PrimaryColor"];
const SECONDARY_COLOR: &[&str] = &["secondary_color", "SecondaryColor"];
const STADIUM_NAME: &[&str] = &["stadium_name", "StadiumName"];
const STADIUM_CAPACITY: &[&str] = &["stadium_capacity", "StadiumCapacity"];

const GAME_ID: &[&str] = &["game_id", "GameID", "GameKey", "GAME_ID"];
const SEASON: &[&str] = &["season", "Season", "SEASON"];
const SEASON_TYPE: &[&str] = &["season_type", "SeasonType"];
const WEEK: &[&str] = &["week", "Week"];
const GAME_DATE: &[&str] = &["game_date", "date", "Date", "DateTime", "Day", "GAME_DATE"];
const HOME_TEAM_ID: &[&str] = &["home_team_id", "HomeTeamID", "GlobalHomeTeamID"];
const AWAY_TEAM_ID: &[&str] = &["away_team_id", "AwayTeamID", "GlobalAwayTeamID"];
const HOME_SCORE: &[&str] = &["home_score", "HomeScore"];
const AWAY_SCORE: &[&str] = &["away_score", "AwayScore"];
const STATUS: &[&str] = &["status", "Status"];

const PLAYER_ID: &[&str] = &["player_id", "PlayerID", "PLAYER_ID"];
const PLAYER_NAME: &[&str] = &["player_name", "Name", "PLAYER_NAME"];
const POSITION: &[&str] = &["position", "Position", "POSITION"];
const MINUTES: &[&str] = &["minutes", "Minutes", "MIN"];
const POINTS: &[&str] = &["points", "Points", "PTS"];
const FGM: &[&str] = &["field_goals_made", "FieldGoalsMade", "FGM"];
const FGA: &[&str] = &["field_goals_attempted", "FieldGoalsAttempted", "FGA"];
const FG3M: &[&str] = &["three_pointers_made", "ThreePointersMade", "FG3M"];
const FG3A: &[&str] = &["three_pointers_attempted", "ThreePointersAttempted", "FG3A"];
const FTM: &[&str] = &["free_throws_made", "FreeThrowsMade", "FTM"];
const FTA: &[&str] = &["free_throws_attempted", "FreeThrowsAttempted", "FTA"];
const REBOUNDS: &[&str] = &["rebounds", "Rebounds", "REB"];
const ASSISTS: &[&str] = &["assists", "Assists", "AST"];
const TURNOVERS: &[&str] = &["turnovers", "Turnovers", "TOV"];
const PASSING_YARDS: &[&str] = &["passing_yards", "PassingYards"];
const RUSHING_YARDS: &[&str] = &["rushing_yards", "RushingYards"];
const RECEIVING_YARDS: &[&str] = &["receiving_yards", "ReceivingYards"];
const TOUCHDOWNS: &[&str] = &["touchdowns", "Touchdowns"];

const SHOT_ID: &[&str] = &["shot_id", "ShotID", "SHOT_ID"];
const PERIOD: &[&str] = &["period", "Period", "PERIOD"];
const LOC_X: &[&str] = &["loc_x", "LOC_X"];
const LOC_Y: &[&str] = &["loc_y", "LOC_Y"];
const SHOT_DISTANCE: &[&str] = &["shot_distance", "SHOT_DISTANCE"];
const SHOT_MADE: &[&str] = &["shot_made", "SHOT_MADE_FLAG"];
const SHOT_TYPE: &[&str] = &["shot_type", "SHOT_TYPE"];

const PLAY_ID: &[&str] = &["play_id", "PlayID"];
const EPA: &[&str] = &["epa", "EPA"];
const POSTEAM: &[&str] = &["posteam", "PossessionTeam"];
const SUCCESS: &[&str] = &["success", "Success"];
const YARDLINE_100: &[&str] = &["yardline_100", "YardsToEndZone"];
const TOUCHDOWN: &[&str] = &["touchdown", "Touchdown"];

/// The offensive team of a play, by id or by abbreviation.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamRef {
    Id(i64),
    Abbreviation(String),
}

/// A play whose team may still need resolving against loaded teams.
#[derive(Debug, Clone)]
pub struct PlayDraft {
    pub play: PlayRecord,
    pub team: TeamRef,
}

/// A raw record that passed validation, typed per kind.
#[derive(Debug, Clone)]
pub enum ValidRecord {
    Team(Team),
    Game(Game),
    PlayerGame(PlayerGameStat),
    Shot(ShotRecord),
    Play(PlayDraft),
}

impl ValidRecord {
    pub fn natural_key(&self) -> String {
        match self {
            ValidRecord::Team(t) => t.team_id.to_string(),
            ValidRecord::Game(g) => g.game_id.to_string(),
            ValidRecord::PlayerGame(s) => format!("{}/{}", s.player_id, s.game_id),
            ValidRecord::Shot(s) => s.shot_id.to_string(),
            ValidRecord::Play(p) => p.play.play_id.to_string(),
        }
    }
}

/// Best-effort natural key for a record that may not validate.
pub fn natural_key_hint(record: &RawRecord) -> String {
    let p = &record.payload;
    let key = match record.kind {
        RecordKind::Team => lookup(p, TEAM_ID).map(render),
        RecordKind::Game => lookup(p, GAME_ID).map(render),
        RecordKind::PlayerGame => match (lookup(p, PLAYER_ID), lookup(p, GAME_ID)) {
            (Some(player), Some(game)) => Some(format!("{}/{}", render(player), render(game))),
            _ => None,
        },
        RecordKind::Shot => lookup(p, SHOT_ID).map(render),
        RecordKind::Play => lookup(p, PLAY_ID).map(render),
    };
    key.unwrap_or_else(|| "?".to_string())
}

/// Validate and coerce one raw record into its canonical shape.
pub fn validate(record: &RawRecord) -> Result<ValidRecord, RejectReason> {
    let p = &record.payload;
    match record.kind {
        RecordKind::Team => validate_team(record.sport, p).map(ValidRecord::Team),
        RecordKind::Game => validate_game(record.sport, p).map(ValidRecord::Game),
        RecordKind::PlayerGame => validate_player_game(p).map(ValidRecord::PlayerGame),
        RecordKind::Shot => validate_shot(p).map(ValidRecord::Shot),
        RecordKind::Play => validate_play(p).map(ValidRecord::Play),
    }
}

fn validate_team(sport: Sport, p: &Map<String, Value>) -> Result<Team, RejectReason> {
    let team_id = require_i64(p, "team_id", TEAM_ID)?;
    let name = require_string(p, "name", TEAM_NAME)?;
    let conference_raw = require_string(p, "conference", CONFERENCE)?;
    let conference = Conference::parse_for(sport, &conference_raw).ok_or_else(|| {
        if conference_raw.parse::<Conference>().is_ok() {
            RejectReason::ConferenceMismatch {
                conference: conference_raw.clone(),
                sport,
            }
        } else {
            RejectReason::InvalidValue {
                field: "conference",
                value: format!("'{}'", conference_raw),
            }
        }
    })?;

    // SportsDataIO nests stadium data under StadiumDetails.
    let stadium = p.get("StadiumDetails").and_then(Value::as_object);
    let stadium_name = match optional_string(p, STADIUM_NAME) {
        Some(name) => Some(name),
        None => stadium.and_then(|s| optional_string(s, &["Name"])),
    };
    let stadium_capacity = match optional_i64(p, "stadium_capacity", STADIUM_CAPACITY)? {
        Some(capacity) => Some(capacity),
        None => match stadium {
            Some(s) => optional_i64(s, "stadium_capacity", &["Capacity"])?,
            None => None,
        },
    };
    if stadium_capacity.is_some_and(|c| c < 0) {
        return Err(RejectReason::Negative("stadium_capacity"));
    }

    let now = Utc::now();
    Ok(Team {
        id: Uuid::new_v4().to_string(),
        team_id,
        sport,
        abbreviation: optional_string(p, ABBREVIATION),
        name,
        city: optional_string(p, CITY),
        conference,
        division: optional_string(p, DIVISION),
        primary_color: optional_string(p, PRIMARY_COLOR),
        secondary_color: optional_string(p, SECONDARY_COLOR),
        stadium_name,
        stadium_capacity,
        created_at: now,
        updated_at: now,
    })
}

fn validate_game(sport: Sport, p: &Map<String, Value>) -> Result<Game, RejectReason> {
    let game_id = require_i64(p, "game_id", GAME_ID)?;
    let season = require_i64(p, "season", SEASON)?;
    check_range("season", season, 1920, 2030)?;

    let season_type = match lookup(p, SEASON_TYPE) {
        None => SeasonType::Regular,
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(SeasonType::from_code)
            .ok_or_else(|| invalid("season_type", &Value::Number(n.clone())))?,
        Some(v) => v
            .as_str()
            .and_then(SeasonType::parse)
            .ok_or_else(|| invalid("season_type", v))?,
    };

    let week = match sport {
        Sport::Nfl => Some(require_i64(p, "week", WEEK)?),
        Sport::Nba => optional_i64(p, "week", WEEK)?,
    };
    if let Some(w) = week {
        check_range("week", w, 1, 22)?;
    }

    let game_date = match lookup(p, GAME_DATE) {
        None => None,
        Some(v) => Some(
            v.as_str()
                .and_then(parse_game_date)
                .ok_or_else(|| invalid("game_date", v))?,
        ),
    };

    let home_team_id = require_i64(p, "home_team_id", HOME_TEAM_ID)?;
    let away_team_id = require_i64(p, "away_team_id", AWAY_TEAM_ID)?;
    if home_team_id == away_team_id {
        return Err(RejectReason::SelfMatchup(home_team_id));
    }

    let home_score = optional_bounded(p, "home_score", HOME_SCORE, MAX_SCORE)?;
    let away_score = optional_bounded(p, "away_score", AWAY_SCORE, MAX_SCORE)?;

    let status_raw = require_string(p, "status", STATUS)?;
    let status = GameStatus::parse(&status_raw).ok_or(RejectReason::UnknownStatus(status_raw))?;
    if status == GameStatus::Final && (home_score.is_none() || away_score.is_none()) {
        return Err(RejectReason::MissingFinalScore);
    }

    let now = Utc::now();
    Ok(Game {
        id: Uuid::new_v4().to_string(),
        game_id,
        sport,
        season: season as i32,
        season_type,
        week: week.map(|w| w as i32),
        game_date,
        home_team_id,
        away_team_id,
        home_score,
        away_score,
        status,
        created_at: now,
        updated_at: now,
    })
}

fn validate_player_game(p: &Map<String, Value>) -> Result<PlayerGameStat, RejectReason> {
    let player_id = require_i64(p, "player_id", PLAYER_ID)?;
    let game_id = require_i64(p, "game_id", GAME_ID)?;
    let team_id = require_i64(p, "team_id", TEAM_ID)?;

    let minutes = match lookup(p, MINUTES) {
        None => 0.0,
        Some(v) => coerce_minutes(v).ok_or_else(|| invalid("minutes", v))?,
    };
    if minutes < 0.0 {
        return Err(RejectReason::Negative("minutes"));
    }

    let count = |field: &'static str, aliases: &[&str]| {
        optional_count(p, field, aliases).map(Option::unwrap_or_default)
    };
    let stats = BoxScore {
        minutes,
        points: count("points", POINTS)?,
        field_goals_made: count("field_goals_made", FGM)?,
        field_goals_attempted: count("field_goals_attempted", FGA)?,
        three_pointers_made: count("three_pointers_made", FG3M)?,
        three_pointers_attempted: count("three_pointers_attempted", FG3A)?,
        free_throws_made: count("free_throws_made", FTM)?,
        free_throws_attempted: count("free_throws_attempted", FTA)?,
        rebounds: count("rebounds", REBOUNDS)?,
        assists: count("assists", ASSISTS)?,
        turnovers: count("turnovers", TURNOVERS)?,
        passing_yards: optional_yards(p, "passing_yards", PASSING_YARDS)?,
        rushing_yards: optional_yards(p, "rushing_yards", RUSHING_YARDS)?,
        receiving_yards: optional_yards(p, "receiving_yards", RECEIVING_YARDS)?,
        touchdowns: count("touchdowns", TOUCHDOWNS)?,
    };

    for (made, attempted, m, a) in [
        ("field_goals_made", "field_goals_attempted", stats.field_goals_made, stats.field_goals_attempted),
        ("three_pointers_made", "three_pointers_attempted", stats.three_pointers_made, stats.three_pointers_attempted),
        ("free_throws_made", "free_throws_attempted", stats.free_throws_made, stats.free_throws_attempted),
    ] {
        if m > a {
            return Err(RejectReason::MadeExceedsAttempted { made, attempted });
        }
    }

    let now = Utc::now();
    Ok(PlayerGameStat {
        id: Uuid::new_v4().to_string(),
        player_id,
        player_name: optional_string(p, PLAYER_NAME).unwrap_or_else(|| format!("Player {}", player_id)),
        game_id,
        team_id,
        position: optional_string(p, POSITION),
        stats,
        created_at: now,
        updated_at: now,
    })
}

fn validate_shot(p: &Map<String, Value>) -> Result<ShotRecord, RejectReason> {
    let shot_id = require_i64(p, "shot_id", SHOT_ID)?;
    let game_id = require_i64(p, "game_id", GAME_ID)?;
    let player_id = require_i64(p, "player_id", PLAYER_ID)?;
    let team_id = require_i64(p, "team_id", TEAM_ID)?;
    let shot_distance = require_f64(p, "shot_distance", SHOT_DISTANCE)?;
    if shot_distance < 0.0 {
        return Err(RejectReason::Negative("shot_distance"));
    }
    let shot_made = require_bool(p, "shot_made", SHOT_MADE)?;

    let now = Utc::now();
    Ok(ShotRecord {
        id: Uuid::new_v4().to_string(),
        shot_id,
        game_id,
        player_id,
        player_name: optional_string(p, PLAYER_NAME).unwrap_or_else(|| format!("Player {}", player_id)),
        team_id,
        period: optional_i32(p, "period", PERIOD)?,
        loc_x: optional_f64(p, "loc_x", LOC_X)?,
        loc_y: optional_f64(p, "loc_y", LOC_Y)?,
        shot_distance,
        shot_made,
        shot_type: optional_string(p, SHOT_TYPE),
        created_at: now,
        updated_at: now,
    })
}

fn validate_play(p: &Map<String, Value>) -> Result<PlayDraft, RejectReason> {
    let play_id = require_i64(p, "play_id", PLAY_ID)?;
    let game_id = require_i64(p, "game_id", GAME_ID)?;
    let epa = require_f64(p, "epa", EPA)?;

    let team = match optional_i64(p, "team_id", TEAM_ID)? {
        Some(id) => TeamRef::Id(id),
        None => TeamRef::Abbreviation(
            optional_string(p, POSTEAM).ok_or(RejectReason::MissingField("team_id"))?,
        ),
    };

    let yardline_100 = optional_i64(p, "yardline_100", YARDLINE_100)?;
    if let Some(y) = yardline_100 {
        check_range("yardline_100", y, 0, 100)?;
    }

    let now = Utc::now();
    Ok(PlayDraft {
        play: PlayRecord {
            id: Uuid::new_v4().to_string(),
            play_id,
            game_id,
            team_id: match team {
                TeamRef::Id(id) => id,
                TeamRef::Abbreviation(_) => 0,
            },
            epa,
            success: optional_bool(p, "success", SUCCESS)?.unwrap_or(epa > 0.0),
            yardline_100: yardline_100.map(|y| y as i32),
            touchdown: optional_bool(p, "touchdown", TOUCHDOWN)?.unwrap_or(false),
            created_at: now,
            updated_at: now,
        },
        team,
    })
}

// ── Coercion helpers ─────────────────────────────────────────────────────────

/// First present alias; JSON null and blank strings count as absent.
fn lookup<'a>(p: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().filter_map(|alias| p.get(*alias)).find(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

fn render(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn invalid(field: &'static str, v: &Value) -> RejectReason {
    RejectReason::InvalidValue {
        field,
        value: v.to_string(),
    }
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), RejectReason> {
    if value < min || value > max {
        return Err(RejectReason::OutOfRange {
            field,
            value: value as f64,
            min: min as f64,
            max: max as f64,
        });
    }
    Ok(())
}

fn coerce_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

fn coerce_f64(v: &Value) -> Option<f64> {
    let value = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|f| f.is_finite())
}

fn coerce_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "t" | "yes" | "y" | "made" => Some(true),
            "0" | "false" | "f" | "no" | "n" | "missed" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Minutes arrive as numbers or as `mm:ss` clock strings.
fn coerce_minutes(v: &Value) -> Option<f64> {
    if let Value::String(s) = v {
        if let Some((mins, secs)) = s.trim().split_once(':') {
            let mins = mins.parse::<f64>().ok()?;
            let secs = secs.parse::<f64>().ok()?;
            return Some(mins + secs / 60.0);
        }
    }
    coerce_f64(v)
}

fn require_i64(p: &Map<String, Value>, field: &'static str, aliases: &[&str]) -> Result<i64, RejectReason> {
    optional_i64(p, field, aliases)?.ok_or(RejectReason::MissingField(field))
}

fn optional_i64(p: &Map<String, Value>, field: &'static str, aliases: &[&str]) -> Result<Option<i64>, RejectReason> {
    lookup(p, aliases)
        .map(|v| coerce_i64(v).ok_or_else(|| invalid(field, v)))
        .transpose()
}

fn optional_i32(p: &Map<String, Value>, field: &'static str, aliases: &[&str]) -> Result<Option<i32>, RejectReason> {
    match lookup(p, aliases) {
        None => Ok(None),
        Some(v) => coerce_i64(v)
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| invalid(field, v)),
    }
}

/// Non-negative integer count.
fn optional_count(p: &Map<String, Value>, field: &'static str, aliases: &[&str]) -> Result<Option<i32>, RejectReason> {
    optional_bounded(p, field, aliases, MAX_COUNT)
}

/// Non-negative integer no larger than `max`.
fn optional_bounded(
    p: &Map<String, Value>,
    field: &'static str,
    aliases: &[&str],
    max: i64,
) -> Result<Option<i32>, RejectReason> {
    let value = optional_i32(p, field, aliases)?;
    if let Some(n) = value {
        if n < 0 {
            return Err(RejectReason::Negative(field));
        }
        check_range(field, i64::from(n), 0, max)?;
    }
    Ok(value)
}

fn optional_yards(p: &Map<String, Value>, field: &'static str, aliases: &[&str]) -> Result<i32, RejectReason> {
    let value = optional_i32(p, field, aliases)?.unwrap_or_default();
    check_range(field, i64::from(value), -MAX_COUNT, MAX_COUNT)?;
    Ok(value)
}

fn require_f64(p: &Map<String, Value>, field: &'static str, aliases: &[&str]) -> Result<f64, RejectReason> {
    optional_f64(p, field, aliases)?.ok_or(RejectReason::MissingField(field))
}

fn optional_f64(p: &Map<String, Value>, field: &'static str, aliases: &[&str]) -> Result<Option<f64>, RejectReason> {
    lookup(p, aliases)
        .map(|v| coerce_f64(v).ok_or_else(|| invalid(field, v)))
        .transpose()
}

fn require_bool(p: &Map<String, Value>, field: &'static str, aliases: &[&str]) -> Result<bool, RejectReason> {
    optional_bool(p, field, aliases)?.ok_or(RejectReason::MissingField(field))
}

fn optional_bool(p: &Map<String, Value>, field: &'static str, aliases: &[&str]) -> Result<Option<bool>, RejectReason> {
    lookup(p, aliases)
        .map(|v| coerce_bool(v).ok_or_else(|| invalid(field, v)))
        .transpose()
}

fn require_string(p: &Map<String, Value>, field: &'static str, aliases: &[&str]) -> Result<String, RejectReason> {
    optional_string(p, aliases).ok_or(RejectReason::MissingField(field))
}

fn optional_string(p: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    lookup(p, aliases).map(render)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(sport: Sport, kind: RecordKind, payload: Value) -> RawRecord {
        RawRecord::new(sport, kind, "test", payload.as_object().cloned().unwrap())
    }

    fn nfl_game(overrides: Value) -> RawRecord {
        let mut payload = json!({
            "GameID": "1001", "Season": 2024, "SeasonType": 1, "Week": "1",
            "Date": "2024-09-08T20:20:00", "HomeTeamID": 1, "AwayTeamID": 2,
            "HomeScore": 21, "AwayScore": "17", "Status": "F"
        });
        for (k, v) in overrides.as_object().unwrap() {
            payload[k] = v.clone();
        }
        raw(Sport::Nfl, RecordKind::Game, payload)
    }

    #[test]
    fn test_game_coerces_upstream_fields() {
        let ValidRecord::Game(game) = validate(&nfl_game(json!({}))).unwrap() else {
            panic!("expected a game");
        };
        assert_eq!(game.game_id, 1001);
        assert_eq!(game.week, Some(1));
        assert_eq!(game.season_type, SeasonType::Regular);
        assert_eq!(game.status, GameStatus::Final);
        assert_eq!(game.final_score(), Some((21, 17)));
        assert_eq!(game.game_date.unwrap().to_string(), "2024-09-08");
    }

    #[test]
    fn test_game_domain_rules() {
        let cases = [
            (json!({"AwayTeamID": 1}), "self_matchup"),
            (json!({"Week": 23}), "out_of_range"),
            (json!({"Week": 0}), "out_of_range"),
            (json!({"Week": null}), "missing_field"),
            (json!({"Season": 1919}), "out_of_range"),
            (json!({"HomeScore": -3}), "negative_value"),
            (json!({"HomeScore": 2_000_000_000}), "out_of_range"),
            (json!({"Status": "Halftime"}), "unknown_status"),
            (json!({"HomeScore": null}), "missing_final_score"),
            (json!({"Week": "first"}), "invalid_value"),
        ];
        for (overrides, rule) in cases {
            let err = validate(&nfl_game(overrides.clone())).unwrap_err();
            assert_eq!(err.rule(), rule, "{overrides}");
        }
    }

    #[test]
    fn test_nba_game_week_is_optional() {
        let record = raw(
            Sport::Nba,
            RecordKind::Game,
            json!({"game_id": 5, "season": 2024, "home_team_id": 10, "away_team_id": 11, "status": "Scheduled"}),
        );
        let ValidRecord::Game(game) = validate(&record).unwrap() else {
            panic!("expected a game");
        };
        assert_eq!(game.week, None);
        assert_eq!(game.home_score, None);
    }

    #[test]
    fn test_team_conference_must_match_sport() {
        let record = raw(
            Sport::Nfl,
            RecordKind::Team,
            json!({"TeamID": 1, "Name": "Cowboys", "Conference": "East"}),
        );
        assert!(matches!(
            validate(&record),
            Err(RejectReason::ConferenceMismatch { sport: Sport::Nfl, .. })
        ));

        let record = raw(
            Sport::Nfl,
            RecordKind::Team,
            json!({"TeamID": 1, "FullName": "Dallas Cowboys", "Name": "Cowboys", "Conference": "NFC",
                   "StadiumDetails": {"Name": "AT&T Stadium", "Capacity": 80000}}),
        );
        let ValidRecord::Team(team) = validate(&record).unwrap() else {
            panic!("expected a team");
        };
        assert_eq!(team.name, "Dallas Cowboys");
        assert_eq!(team.stadium_name.as_deref(), Some("AT&T Stadium"));
        assert_eq!(team.stadium_capacity, Some(80000));
    }

    #[test]
    fn test_player_game_made_cannot_exceed_attempted() {
        let record = raw(
            Sport::Nba,
            RecordKind::PlayerGame,
            json!({"PLAYER_ID": 7, "GAME_ID": 5, "TEAM_ID": 10, "FGM": 6, "FGA": 5}),
        );
        assert_eq!(
            validate(&record).unwrap_err(),
            RejectReason::MadeExceedsAttempted {
                made: "field_goals_made",
                attempted: "field_goals_attempted"
            }
        );
    }

    #[test]
    fn test_player_game_counts_are_bounded() {
        let record = raw(
            Sport::Nba,
            RecordKind::PlayerGame,
            json!({"PLAYER_ID": 7, "GAME_ID": 5, "TEAM_ID": 10, "PTS": 2_000_000_000}),
        );
        assert_eq!(validate(&record).unwrap_err().rule(), "out_of_range");

        let record = raw(
            Sport::Nfl,
            RecordKind::PlayerGame,
            json!({"PlayerID": 7, "GameID": 5, "TeamID": 10, "RushingYards": -4}),
        );
        let ValidRecord::PlayerGame(stat) = validate(&record).unwrap() else {
            panic!("expected a player line");
        };
        assert_eq!(stat.stats.rushing_yards, -4);
    }

    #[test]
    fn test_player_game_parses_clock_minutes() {
        let record = raw(
            Sport::Nba,
            RecordKind::PlayerGame,
            json!({"PLAYER_ID": 7, "GAME_ID": 5, "TEAM_ID": 10, "MIN": "34:30", "PTS": "21", "FGA": ""}),
        );
        let ValidRecord::PlayerGame(stat) = validate(&record).unwrap() else {
            panic!("expected a player line");
        };
        assert_eq!(stat.stats.minutes, 34.5);
        assert_eq!(stat.stats.points, 21);
        assert_eq!(stat.stats.field_goals_attempted, 0);
        assert_eq!(stat.player_name, "Player 7");
    }

    #[test]
    fn test_shot_requires_distance_and_flag() {
        let base = json!({"SHOT_ID": 1, "GAME_ID": 5, "PLAYER_ID": 7, "TEAM_ID": 10});
        let record = raw(Sport::Nba, RecordKind::Shot, base.clone());
        assert_eq!(validate(&record).unwrap_err(), RejectReason::MissingField("shot_distance"));

        let mut payload = base;
        payload["SHOT_DISTANCE"] = json!(-1);
        payload["SHOT_MADE_FLAG"] = json!(1);
        let record = raw(Sport::Nba, RecordKind::Shot, payload);
        assert_eq!(validate(&record).unwrap_err(), RejectReason::Negative("shot_distance"));
    }

    #[test]
    fn test_play_team_falls_back_to_posteam() {
        let record = raw(
            Sport::Nfl,
            RecordKind::Play,
            json!({"play_id": 9, "game_id": 1001, "epa": "-0.4", "posteam": "DAL", "yardline_100": 12}),
        );
        let ValidRecord::Play(draft) = validate(&record).unwrap() else {
            panic!("expected a play");
        };
        assert_eq!(draft.team, TeamRef::Abbreviation("DAL".to_string()));
        assert!(!draft.play.success);
        assert!(draft.play.in_red_zone());

        let record = raw(Sport::Nfl, RecordKind::Play, json!({"play_id": 9, "game_id": 1001, "epa": 0.1}));
        assert_eq!(validate(&record).unwrap_err(), RejectReason::MissingField("team_id"));
    }

    #[test]
    fn test_natural_key_hint_survives_invalid_records() {
        let record = raw(Sport::Nba, RecordKind::PlayerGame, json!({"PLAYER_ID": 7, "GAME_ID": "5"}));
        assert_eq!(natural_key_hint(&record), "7/5");
        let record = raw(Sport::Nfl, RecordKind::Team, json!({}));
        assert_eq!(natural_key_hint(&record), "?");
    }
}
