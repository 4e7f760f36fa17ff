use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Enumerations ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Nfl,
    Nba,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Nfl => "nfl",
            Sport::Nba => "nba",
        }
    }
}

impl FromStr for Sport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nfl" | "football" => Ok(Sport::Nfl),
            "nba" | "basketball" => Ok(Sport::Nba),
            other => Err(anyhow::anyhow!("Unsupported sport: {}", other)),
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conference {
    #[serde(rename = "AFC")]
    Afc,
    #[serde(rename = "NFC")]
    Nfc,
    East,
    West,
}

impl Conference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Conference::Afc => "AFC",
            Conference::Nfc => "NFC",
            Conference::East => "East",
            Conference::West => "West",
        }
    }

    /// Parse a conference name, accepting only the conferences of `sport`.
    pub fn parse_for(sport: Sport, raw: &str) -> Option<Self> {
        let conference = match raw.trim().to_lowercase().as_str() {
            "afc" => Conference::Afc,
            "nfc" => Conference::Nfc,
            "east" | "eastern" => Conference::East,
            "west" | "western" => Conference::West,
            _ => return None,
        };
        (conference.sport() == sport).then_some(conference)
    }

    pub fn sport(&self) -> Sport {
        match self {
            Conference::Afc | Conference::Nfc => Sport::Nfl,
            Conference::East | Conference::West => Sport::Nba,
        }
    }
}

impl FromStr for Conference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Conference::parse_for(Sport::Nfl, s)
            .or_else(|| Conference::parse_for(Sport::Nba, s))
            .ok_or_else(|| anyhow::anyhow!("Unknown conference: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Final,
    Postponed,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Scheduled => "Scheduled",
            GameStatus::InProgress => "InProgress",
            GameStatus::Final => "Final",
            GameStatus::Postponed => "Postponed",
        }
    }

    /// Accepts the canonical names plus the upstream spellings seen in feeds.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "scheduled" | "pregame" => Some(GameStatus::Scheduled),
            "inprogress" | "in progress" | "live" => Some(GameStatus::InProgress),
            "final" | "f" | "f/ot" | "completed" | "closed" => Some(GameStatus::Final),
            "postponed" | "canceled" | "cancelled" => Some(GameStatus::Postponed),
            _ => None,
        }
    }
}

impl FromStr for GameStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameStatus::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown game status: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeasonType {
    #[serde(rename = "PRE")]
    Preseason,
    #[serde(rename = "REG")]
    Regular,
    #[serde(rename = "POST")]
    Postseason,
}

impl SeasonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonType::Preseason => "PRE",
            SeasonType::Regular => "REG",
            SeasonType::Postseason => "POST",
        }
    }

    /// SportsDataIO encodes season types as 1 = regular, 2 = pre, 3 = post.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(SeasonType::Regular),
            2 => Some(SeasonType::Preseason),
            3 => Some(SeasonType::Postseason),
            _ => None,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pre" | "preseason" => Some(SeasonType::Preseason),
            "reg" | "regular" | "regular season" => Some(SeasonType::Regular),
            "post" | "postseason" | "playoffs" => Some(SeasonType::Postseason),
            other => other.parse::<i64>().ok().and_then(SeasonType::from_code),
        }
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeasonType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SeasonType::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown season type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Team,
    Game,
    PlayerGame,
    Shot,
    Play,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Team,
        RecordKind::Game,
        RecordKind::PlayerGame,
        RecordKind::Shot,
        RecordKind::Play,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Team => "team",
            RecordKind::Game => "game",
            RecordKind::PlayerGame => "player_game",
            RecordKind::Shot => "shot",
            RecordKind::Play => "play",
        }
    }
}

impl FromStr for RecordKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "team" | "teams" => Ok(RecordKind::Team),
            "game" | "games" => Ok(RecordKind::Game),
            "player_game" | "player_games" | "player_stats" => Ok(RecordKind::PlayerGame),
            "shot" | "shots" => Ok(RecordKind::Shot),
            "play" | "plays" | "pbp" => Ok(RecordKind::Play),
            other => Err(anyhow::anyhow!("Unknown record kind: {}", other)),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotZone {
    AtRim,
    Paint,
    MidRange,
    ThreePoint,
}

impl ShotZone {
    pub const ALL: [ShotZone; 4] = [
        ShotZone::AtRim,
        ShotZone::Paint,
        ShotZone::MidRange,
        ShotZone::ThreePoint,
    ];

    /// Distance buckets in feet from the basket.
    pub fn from_distance(distance: f64) -> Self {
        if distance <= 3.0 {
            ShotZone::AtRim
        } else if distance <= 10.0 {
            ShotZone::Paint
        } else if distance < 23.0 {
            ShotZone::MidRange
        } else {
            ShotZone::ThreePoint
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShotZone::AtRim => "at_rim",
            ShotZone::Paint => "paint",
            ShotZone::MidRange => "mid_range",
            ShotZone::ThreePoint => "three_point",
        }
    }
}

impl FromStr for ShotZone {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShotZone::ALL
            .into_iter()
            .find(|z| z.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown shot zone: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChemistryRating {
    Elite,
    Good,
    Average,
    Poor,
}

impl ChemistryRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChemistryRating::Elite => "Elite Chemistry",
            ChemistryRating::Good => "Good Chemistry",
            ChemistryRating::Average => "Average Chemistry",
            ChemistryRating::Poor => "Poor Chemistry",
        }
    }
}

impl FromStr for ChemistryRating {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Elite Chemistry" => Ok(ChemistryRating::Elite),
            "Good Chemistry" => Ok(ChemistryRating::Good),
            "Average Chemistry" => Ok(ChemistryRating::Average),
            "Poor Chemistry" => Ok(ChemistryRating::Poor),
            other => Err(anyhow::anyhow!("Unknown chemistry rating: {}", other)),
        }
    }
}

// ── Raw records ──────────────────────────────────────────────────────────────

/// An upstream record before validation: a loosely typed field map tagged
/// with the sport and the kind of entity it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub sport: Sport,
    pub kind: RecordKind,
    pub source: String,
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl RawRecord {
    pub fn new(
        sport: Sport,
        kind: RecordKind,
        source: impl Into<String>,
        payload: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            sport,
            kind,
            source: source.into(),
            payload,
        }
    }
}

/// A raw record as persisted in the raw store.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRawRecord {
    pub id: i64,
    pub record: RawRecord,
    pub fetched_at: DateTime<Utc>,
    pub normalized_at: Option<DateTime<Utc>>,
}

// ── Canonical tables ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub team_id: i64,
    pub sport: Sport,
    pub abbreviation: Option<String>,
    pub name: String,
    pub city: Option<String>,
    pub conference: Conference,
    pub division: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub stadium_name: Option<String>,
    pub stadium_capacity: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// Compares every loaded field, ignoring the surrogate id and audit stamps.
    pub fn same_content(&self, other: &Team) -> bool {
        self.team_id == other.team_id
            && self.sport == other.sport
            && self.abbreviation == other.abbreviation
            && self.name == other.name
            && self.city == other.city
            && self.conference == other.conference
            && self.division == other.division
            && self.primary_color == other.primary_color
            && self.secondary_color == other.secondary_color
            && self.stadium_name == other.stadium_name
            && self.stadium_capacity == other.stadium_capacity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub game_id: i64,
    pub sport: Sport,
    pub season: i32,
    pub season_type: SeasonType,
    pub week: Option<i32>,
    pub game_date: Option<NaiveDate>,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub status: GameStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn same_content(&self, other: &Game) -> bool {
        self.game_id == other.game_id
            && self.sport == other.sport
            && self.season == other.season
            && self.season_type == other.season_type
            && self.week == other.week
            && self.game_date == other.game_date
            && self.home_team_id == other.home_team_id
            && self.away_team_id == other.away_team_id
            && self.home_score == other.home_score
            && self.away_score == other.away_score
            && self.status == other.status
    }

    /// Final score as (home, away), only for completed games.
    pub fn final_score(&self) -> Option<(i32, i32)> {
        if self.status != GameStatus::Final {
            return None;
        }
        Some((self.home_score?, self.away_score?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxScore {
    pub minutes: f64,
    pub points: i32,
    pub field_goals_made: i32,
    pub field_goals_attempted: i32,
    pub three_pointers_made: i32,
    pub three_pointers_attempted: i32,
    pub free_throws_made: i32,
    pub free_throws_attempted: i32,
    pub rebounds: i32,
    pub assists: i32,
    pub turnovers: i32,
    pub passing_yards: i32,
    pub rushing_yards: i32,
    pub receiving_yards: i32,
    pub touchdowns: i32,
}

impl BoxScore {
    /// Possession estimate: FGA + 0.44 * FTA + TOV.
    pub fn possessions(&self) -> f64 {
        self.field_goals_attempted as f64
            + 0.44 * self.free_throws_attempted as f64
            + self.turnovers as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerGameStat {
    pub id: String,
    pub player_id: i64,
    pub player_name: String,
    pub game_id: i64,
    pub team_id: i64,
    pub position: Option<String>,
    pub stats: BoxScore,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlayerGameStat {
    pub fn same_content(&self, other: &PlayerGameStat) -> bool {
        self.player_id == other.player_id
            && self.player_name == other.player_name
            && self.game_id == other.game_id
            && self.team_id == other.team_id
            && self.position == other.position
            && self.stats == other.stats
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotRecord {
    pub id: String,
    pub shot_id: i64,
    pub game_id: i64,
    pub player_id: i64,
    pub player_name: String,
    pub team_id: i64,
    pub period: Option<i32>,
    pub loc_x: Option<f64>,
    pub loc_y: Option<f64>,
    pub shot_distance: f64,
    pub shot_made: bool,
    pub shot_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShotRecord {
    pub fn zone(&self) -> ShotZone {
        ShotZone::from_distance(self.shot_distance)
    }

    pub fn same_content(&self, other: &ShotRecord) -> bool {
        self.shot_id == other.shot_id
            && self.game_id == other.game_id
            && self.player_id == other.player_id
            && self.player_name == other.player_name
            && self.team_id == other.team_id
            && self.period == other.period
            && self.loc_x == other.loc_x
            && self.loc_y == other.loc_y
            && self.shot_distance == other.shot_distance
            && self.shot_made == other.shot_made
            && self.shot_type == other.shot_type
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayRecord {
    pub id: String,
    pub play_id: i64,
    pub game_id: i64,
    pub team_id: i64,
    pub epa: f64,
    pub success: bool,
    pub yardline_100: Option<i32>,
    pub touchdown: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlayRecord {
    pub fn same_content(&self, other: &PlayRecord) -> bool {
        self.play_id == other.play_id
            && self.game_id == other.game_id
            && self.team_id == other.team_id
            && self.epa == other.epa
            && self.success == other.success
            && self.yardline_100 == other.yardline_100
            && self.touchdown == other.touchdown
    }

    pub fn in_red_zone(&self) -> bool {
        self.yardline_100.is_some_and(|y| y <= 20)
    }
}

// ── Aggregate tables ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonStats {
    pub team_id: i64,
    pub season: i32,
    pub season_type: SeasonType,
    pub games_played: i32,
    pub wins: i32,
    pub losses: i32,
    pub ties: i32,
    pub points_scored: i64,
    pub points_allowed: i64,
    pub point_differential: i64,
    pub win_percentage: f64,
    pub avg_points_scored: f64,
    pub avg_points_allowed: f64,
    pub points_scored_std_dev: Option<f64>,
    pub home_wins: i32,
    pub away_wins: i32,
    pub power_ranking: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamWeekPerformance {
    pub team_id: i64,
    pub season: i32,
    pub week: i32,
    pub plays: i32,
    pub total_epa: f64,
    pub epa_per_play: Option<f64>,
    pub success_rate: Option<f64>,
    pub red_zone_plays: i32,
    pub red_zone_td_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamChemistry {
    pub team_id: i64,
    pub season: i32,
    pub games_played: i32,
    pub possessions: f64,
    pub offensive_rating: Option<f64>,
    pub defensive_rating: Option<f64>,
    pub net_rating: Option<f64>,
    pub pace: Option<f64>,
    pub win_percentage: f64,
    pub ball_movement_ratio: Option<f64>,
    pub chemistry_score: Option<f64>,
    pub chemistry_rating: ChemistryRating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonStats {
    pub player_id: i64,
    pub season: i32,
    pub player_name: String,
    pub team_id: i64,
    pub games_played: i32,
    pub minutes_per_game: f64,
    pub points_per_game: f64,
    pub rebounds_per_game: f64,
    pub assists_per_game: f64,
    pub field_goal_pct: Option<f64>,
    pub three_point_pct: Option<f64>,
    pub true_shooting_pct: Option<f64>,
    pub usage_rate: Option<f64>,
    pub assist_turnover_ratio: Option<f64>,
    pub passing_yards: i64,
    pub rushing_yards: i64,
    pub receiving_yards: i64,
    pub touchdowns: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneLine {
    pub attempts: i32,
    pub makes: i32,
}

impl ZoneLine {
    pub fn field_goal_pct(&self) -> Option<f64> {
        crate::utils::safe_ratio(self.makes as f64, self.attempts as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerShooting {
    pub player_id: i64,
    pub season: i32,
    pub player_name: String,
    pub team_id: i64,
    pub total_attempts: i32,
    pub total_makes: i32,
    pub field_goal_pct: Option<f64>,
    pub at_rim: ZoneLine,
    pub paint: ZoneLine,
    pub mid_range: ZoneLine,
    pub three_point: ZoneLine,
    pub shot_selection_score: Option<f64>,
}

impl PlayerShooting {
    pub fn zone(&self, zone: ShotZone) -> ZoneLine {
        match zone {
            ShotZone::AtRim => self.at_rim,
            ShotZone::Paint => self.paint,
            ShotZone::MidRange => self.mid_range,
            ShotZone::ThreePoint => self.three_point,
        }
    }
}

/// Team shot profile per season. Close range is everything within 10 ft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamShootingEfficiency {
    pub team_id: i64,
    pub season: i32,
    pub games_played: i32,
    pub total_attempts: i32,
    pub total_makes: i32,
    pub close_range: ZoneLine,
    pub three_point: ZoneLine,
    pub three_point_attempts_per_game: f64,
    pub efficiency_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneEfficiency {
    pub season: i32,
    pub zone: ShotZone,
    pub attempts: i32,
    pub makes: i32,
    pub field_goal_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDevelopment {
    pub player_id: i64,
    pub season: i32,
    pub player_name: String,
    pub team_id: i64,
    pub previous_season: i32,
    pub points_delta: f64,
    pub true_shooting_delta: f64,
    pub usage_delta: f64,
    pub development_score: f64,
    pub breakout_probability: f64,
    pub is_breakout_candidate: bool,
}

/// One row of the `team_records` reporting view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team_id: i64,
    pub abbreviation: Option<String>,
    pub name: String,
    pub season: i32,
    pub season_type: SeasonType,
    pub games_played: i32,
    pub wins: i32,
    pub losses: i32,
    pub ties: i32,
    pub win_percentage: f64,
    pub avg_points_scored: f64,
    pub avg_points_allowed: f64,
    pub point_differential: i64,
}

/// Every aggregate table produced by one Metric Engine run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateSet {
    pub team_seasons: Vec<TeamSeasonStats>,
    pub team_weeks: Vec<TeamWeekPerformance>,
    pub team_chemistry: Vec<TeamChemistry>,
    pub player_seasons: Vec<PlayerSeasonStats>,
    pub player_shooting: Vec<PlayerShooting>,
    pub team_shooting: Vec<TeamShootingEfficiency>,
    pub zone_efficiency: Vec<ZoneEfficiency>,
    pub player_development: Vec<PlayerDevelopment>,
}

impl AggregateSet {
    pub fn row_count(&self) -> usize {
        self.team_seasons.len()
            + self.team_weeks.len()
            + self.team_chemistry.len()
            + self.player_seasons.len()
            + self.player_shooting.len()
            + self.team_shooting.len()
            + self.zone_efficiency.len()
            + self.player_development.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamProfile {
    pub team: Team,
    pub seasons: Vec<TeamSeasonStats>,
    pub recent_games: Vec<Game>,
}

// API Response types
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conference_must_match_sport() {
        assert_eq!(Conference::parse_for(Sport::Nfl, "afc"), Some(Conference::Afc));
        assert_eq!(Conference::parse_for(Sport::Nba, "Western"), Some(Conference::West));
        assert_eq!(Conference::parse_for(Sport::Nfl, "East"), None);
        assert_eq!(Conference::parse_for(Sport::Nba, "NFC"), None);
    }

    #[test]
    fn test_status_aliases() {
        assert_eq!(GameStatus::parse("F/OT"), Some(GameStatus::Final));
        assert_eq!(GameStatus::parse("InProgress"), Some(GameStatus::InProgress));
        assert_eq!(GameStatus::parse("halftime"), None);
    }

    #[test]
    fn test_season_type_codes() {
        assert_eq!(SeasonType::parse("1"), Some(SeasonType::Regular));
        assert_eq!(SeasonType::parse("POST"), Some(SeasonType::Postseason));
        assert_eq!(SeasonType::from_code(9), None);
    }

    #[test]
    fn test_shot_zone_boundaries() {
        assert_eq!(ShotZone::from_distance(0.0), ShotZone::AtRim);
        assert_eq!(ShotZone::from_distance(3.0), ShotZone::AtRim);
        assert_eq!(ShotZone::from_distance(3.5), ShotZone::Paint);
        assert_eq!(ShotZone::from_distance(10.0), ShotZone::Paint);
        assert_eq!(ShotZone::from_distance(22.9), ShotZone::MidRange);
        assert_eq!(ShotZone::from_distance(23.0), ShotZone::ThreePoint);
    }
}
