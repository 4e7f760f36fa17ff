use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db;
use crate::models::*;
use crate::services::{player_metrics, team_metrics};

/// Canonical tables as read at the start of an aggregation run.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub teams: Vec<Team>,
    pub games: Vec<Game>,
    pub player_stats: Vec<PlayerGameStat>,
    pub shots: Vec<ShotRecord>,
    pub plays: Vec<PlayRecord>,
}

impl Snapshot {
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        Ok(Self {
            teams: db::load_teams(pool).await?,
            games: db::load_games(pool).await?,
            player_stats: db::load_player_stats(pool).await?,
            shots: db::load_shots(pool).await?,
            plays: db::load_plays(pool).await?,
        })
    }
}

/// Which aggregate rows a run replaces. Empty scope means everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricScope {
    pub season: Option<i32>,
    pub team_id: Option<i64>,
    pub player_id: Option<i64>,
}

impl MetricScope {
    pub fn all() -> Self {
        Self::default()
    }

    fn season_matches(&self, season: i32) -> bool {
        self.season.map_or(true, |s| s == season)
    }

    /// Team-level rows are out of scope for a player-only run.
    pub fn covers_team(&self, team_id: i64, season: i32) -> bool {
        self.player_id.is_none()
            && self.season_matches(season)
            && self.team_id.map_or(true, |t| t == team_id)
    }

    pub fn covers_player(&self, player_id: i64, team_id: i64, season: i32) -> bool {
        self.season_matches(season)
            && self.team_id.map_or(true, |t| t == team_id)
            && self.player_id.map_or(true, |p| p == player_id)
    }

    /// League-wide rows (zone efficiency) are only rebuilt without a team or player filter.
    pub fn covers_league(&self) -> bool {
        self.team_id.is_none() && self.player_id.is_none()
    }
}

pub struct MetricEngine<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MetricEngine<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Recompute every aggregate from a snapshot. Pure and deterministic.
    pub fn compute(snapshot: &Snapshot) -> AggregateSet {
        let player_seasons = player_metrics::player_season_stats(&snapshot.games, &snapshot.player_stats);
        let player_development = player_metrics::player_development(&player_seasons);

        AggregateSet {
            team_seasons: team_metrics::team_season_stats(&snapshot.games),
            team_weeks: team_metrics::team_week_performance(&snapshot.games, &snapshot.plays),
            team_chemistry: team_metrics::team_chemistry(&snapshot.games, &snapshot.player_stats),
            player_shooting: player_metrics::player_shooting(&snapshot.games, &snapshot.shots),
            team_shooting: player_metrics::team_shooting_efficiency(&snapshot.games, &snapshot.shots),
            zone_efficiency: player_metrics::zone_efficiency(&snapshot.games, &snapshot.shots),
            player_seasons,
            player_development,
        }
    }

    /// Full recomputation, then keep only the rows inside `scope`.
    pub fn compute_scoped(snapshot: &Snapshot, scope: &MetricScope) -> AggregateSet {
        let mut set = Self::compute(snapshot);
        set.team_seasons.retain(|r| scope.covers_team(r.team_id, r.season));
        set.team_weeks.retain(|r| scope.covers_team(r.team_id, r.season));
        set.team_chemistry.retain(|r| scope.covers_team(r.team_id, r.season));
        set.team_shooting.retain(|r| scope.covers_team(r.team_id, r.season));
        set.player_seasons.retain(|r| scope.covers_player(r.player_id, r.team_id, r.season));
        set.player_shooting.retain(|r| scope.covers_player(r.player_id, r.team_id, r.season));
        set.player_development.retain(|r| scope.covers_player(r.player_id, r.team_id, r.season));
        if scope.covers_league() {
            set.zone_efficiency.retain(|r| scope.season_matches(r.season));
        } else {
            set.zone_efficiency.clear();
        }
        set
    }

    /// Load, compute and replace the scope's rows in the aggregate store.
    pub async fn run(&self, scope: &MetricScope) -> Result<AggregateSet> {
        let snapshot = Snapshot::load(self.pool).await?;
        tracing::info!(
            "Computing aggregates over {} teams, {} games, {} player lines, {} shots, {} plays",
            snapshot.teams.len(),
            snapshot.games.len(),
            snapshot.player_stats.len(),
            snapshot.shots.len(),
            snapshot.plays.len()
        );

        let set = Self::compute_scoped(&snapshot, scope);
        db::replace_aggregates(self.pool, scope, &set).await?;

        tracing::info!(
            "Aggregates written: {} team seasons, {} team weeks, {} chemistry, {} player seasons, \
             {} shooting, {} team shooting, {} zones, {} development",
            set.team_seasons.len(),
            set.team_weeks.len(),
            set.team_chemistry.len(),
            set.player_seasons.len(),
            set.player_shooting.len(),
            set.team_shooting.len(),
            set.zone_efficiency.len(),
            set.player_development.len()
        );
        Ok(set)
    }
}
