use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Settings;
use crate::db;
use crate::models::*;

const DEFAULT_LIMIT: i64 = 25;
const MAX_LIMIT: i64 = 500;

pub async fn serve(settings: &Settings, port: u16) -> anyhow::Result<()> {
    let pool = db::init_database(settings).await?;

    let app = create_router().with_state(pool);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Statline report API listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router() -> Router<SqlitePool> {
    Router::new()
        .route("/health", get(health_check))
        .route("/teams", get(list_teams_handler))
        .route("/teams/{team_id}", get(team_profile_handler))
        .route("/reports/team-records", get(team_records_handler))
        .route("/aggregates/team-season", get(team_season_handler))
        .route("/aggregates/chemistry", get(chemistry_handler))
        .route("/aggregates/shooting", get(shooting_handler))
        .route("/aggregates/team-shooting", get(team_shooting_handler))
        .route("/aggregates/zones", get(zones_handler))
        .route("/aggregates/breakout", get(breakout_handler))
        .route("/aggregates/epa", get(epa_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[derive(Debug, Default, Deserialize)]
struct ReportQuery {
    season: Option<i32>,
    team_id: Option<i64>,
    limit: Option<i64>,
    #[serde(default)]
    candidates_only: bool,
}

impl ReportQuery {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, StatusCode>;

/// Wrap a query result, logging and mapping failures to 500.
fn respond<T>(what: &str, result: anyhow::Result<T>) -> ApiResult<T> {
    match result {
        Ok(data) => Ok(Json(ApiResponse::success(data))),
        Err(e) => {
            tracing::error!("Failed to fetch {}: {}", what, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("Statline API is running"))
}

// GET /teams
async fn list_teams_handler(State(pool): State<SqlitePool>) -> ApiResult<Vec<Team>> {
    respond("teams", db::get_all_teams(&pool).await)
}

// GET /teams/{team_id} - team with its season lines and recent results
async fn team_profile_handler(
    State(pool): State<SqlitePool>,
    Path(team_id): Path<i64>,
) -> ApiResult<TeamProfile> {
    match db::get_team_profile(&pool, team_id).await {
        Ok(Some(profile)) => Ok(Json(ApiResponse::success(profile))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to fetch team {}: {}", team_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// GET /reports/team-records?season=
async fn team_records_handler(
    State(pool): State<SqlitePool>,
    Query(params): Query<ReportQuery>,
) -> ApiResult<Vec<TeamRecord>> {
    respond("team records", db::get_team_records(&pool, params.season).await)
}

// GET /aggregates/team-season?season=&team_id=
async fn team_season_handler(
    State(pool): State<SqlitePool>,
    Query(params): Query<ReportQuery>,
) -> ApiResult<Vec<TeamSeasonStats>> {
    respond(
        "team season stats",
        db::get_team_season_stats(&pool, params.season, params.team_id).await,
    )
}

// GET /aggregates/chemistry?season=&limit=
async fn chemistry_handler(
    State(pool): State<SqlitePool>,
    Query(params): Query<ReportQuery>,
) -> ApiResult<Vec<TeamChemistry>> {
    respond(
        "chemistry rankings",
        db::get_chemistry_rankings(&pool, params.season, params.limit()).await,
    )
}

// GET /aggregates/shooting?season=&limit=
async fn shooting_handler(
    State(pool): State<SqlitePool>,
    Query(params): Query<ReportQuery>,
) -> ApiResult<Vec<PlayerShooting>> {
    respond(
        "shooting rankings",
        db::get_shooting_rankings(&pool, params.season, params.limit()).await,
    )
}

// GET /aggregates/team-shooting?season=&limit=
async fn team_shooting_handler(
    State(pool): State<SqlitePool>,
    Query(params): Query<ReportQuery>,
) -> ApiResult<Vec<TeamShootingEfficiency>> {
    respond(
        "team shooting efficiency",
        db::get_team_shooting_rankings(&pool, params.season, params.limit()).await,
    )
}

// GET /aggregates/zones?season=
async fn zones_handler(
    State(pool): State<SqlitePool>,
    Query(params): Query<ReportQuery>,
) -> ApiResult<Vec<ZoneEfficiency>> {
    respond("zone efficiency", db::get_zone_efficiency(&pool, params.season).await)
}

// GET /aggregates/breakout?season=&limit=&candidates_only=
async fn breakout_handler(
    State(pool): State<SqlitePool>,
    Query(params): Query<ReportQuery>,
) -> ApiResult<Vec<PlayerDevelopment>> {
    respond(
        "breakout rankings",
        db::get_breakout_rankings(&pool, params.season, params.candidates_only, params.limit()).await,
    )
}

// GET /aggregates/epa?season=&team_id=
async fn epa_handler(
    State(pool): State<SqlitePool>,
    Query(params): Query<ReportQuery>,
) -> ApiResult<Vec<TeamWeekPerformance>> {
    respond("weekly EPA", db::get_team_weeks(&pool, params.season, params.team_id).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::db::{memory_pool, seed_sample_records};
    use crate::services::{LoadMode, MetricEngine, MetricScope, Normalizer};

    async fn loaded_pool() -> SqlitePool {
        let pool = memory_pool().await;
        seed_sample_records(&pool).await.unwrap();
        Normalizer::new(&pool, LoadMode::Incremental)
            .normalize_pending(false)
            .await
            .unwrap();
        MetricEngine::new(&pool).run(&MetricScope::all()).await.unwrap();
        pool
    }

    async fn get(pool: &SqlitePool, uri: &str) -> (StatusCode, Value) {
        let response = create_router()
            .with_state(pool.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let pool = memory_pool().await;
        let (status, body) = get(&pool, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], Value::Bool(true));
    }

    #[tokio::test]
    async fn test_team_profile_and_missing_team() {
        let pool = loaded_pool().await;

        let (status, body) = get(&pool, "/teams/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["team"]["name"], "Dallas Cowboys");
        assert!(!body["data"]["seasons"].as_array().unwrap().is_empty());

        let (status, _) = get(&pool, "/teams/424242").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_team_season_filter() {
        let pool = loaded_pool().await;
        let (status, body) = get(&pool, "/aggregates/team-season?season=2024&team_id=1").await;
        assert_eq!(status, StatusCode::OK);

        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["team_id"], 1);
        assert_eq!(rows[0]["point_differential"], rows[0]["points_scored"].as_i64().unwrap() - rows[0]["points_allowed"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn test_rankings_respect_limit() {
        let pool = loaded_pool().await;
        let (status, body) = get(&pool, "/aggregates/shooting?limit=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (_, body) = get(&pool, "/aggregates/zones?season=2024").await;
        assert_eq!(body["data"].as_array().unwrap().len(), 4);

        let (_, body) = get(&pool, "/reports/team-records").await;
        assert!(!body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_team_shooting_ranked_by_score() {
        let pool = loaded_pool().await;
        let (status, body) = get(&pool, "/aggregates/team-shooting?season=2024").await;
        assert_eq!(status, StatusCode::OK);

        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["team_id"], 1610612738);
        assert_eq!(rows[0]["close_range"]["attempts"], 2);
        assert!(rows[0]["efficiency_score"].as_f64() > rows[1]["efficiency_score"].as_f64());
    }
}
