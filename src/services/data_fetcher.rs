use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::Value;
use sqlx::SqlitePool;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::db::insert_raw_records;
use crate::models::{RawRecord, RecordKind, SeasonType, Sport};

const SOURCE: &str = "sportsdata.io";

/// SportsDataIO NFL client. Responses land in the raw store untouched;
/// validation happens in the normalizer.
pub struct DataFetcher {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl DataFetcher {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: Client::new(),
            api_key: settings.sportsdata_api_key.clone(),
            base_url: settings.sportsdata_base_url.trim_end_matches('/').to_string(),
            min_interval: settings.min_request_interval,
            last_request: None,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Keep at least `min_interval` between upstream calls.
    async fn throttle(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    async fn get_json(&mut self, endpoint: &str) -> Result<Value> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("SPORTSDATA_API_KEY not set"))?;

        self.throttle().await;
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::info!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Ocp-Apim-Subscription-Key", api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("SportsDataIO error {} for {}: {}", status, endpoint, body));
        }

        Ok(response.json().await?)
    }

    pub async fn fetch_teams(&mut self) -> Result<Vec<RawRecord>> {
        let body = self.get_json("scores/json/Teams").await?;
        let records = to_raw_records(RecordKind::Team, body)?;
        tracing::info!("Fetched {} NFL teams", records.len());
        Ok(records)
    }

    /// Games with scores and status. The schedule-only endpoint omits both,
    /// so its rows could never become Final.
    pub async fn fetch_games(&mut self, season: i32, season_type: SeasonType) -> Result<Vec<RawRecord>> {
        let endpoint = games_endpoint(season, season_type);
        let body = self.get_json(&endpoint).await?;
        let records = to_raw_records(RecordKind::Game, body)?;
        tracing::info!("Fetched {} NFL games for {} {}", records.len(), season, season_type.as_str());
        Ok(records)
    }

    /// Fetch teams and the requested season games, then append them to the raw store.
    pub async fn fetch_into_store(
        &mut self,
        pool: &SqlitePool,
        season: i32,
        season_types: &[SeasonType],
    ) -> Result<usize> {
        let mut records = self.fetch_teams().await?;
        for season_type in season_types {
            records.extend(self.fetch_games(season, *season_type).await?);
        }
        insert_raw_records(pool, &records).await?;
        Ok(records.len())
    }
}

fn games_endpoint(season: i32, season_type: SeasonType) -> String {
    format!("scores/json/Games/{}{}", season, season_type.as_str())
}

/// Wrap a JSON array response as raw records, dropping bye-week placeholders.
pub fn to_raw_records(kind: RecordKind, body: Value) -> Result<Vec<RawRecord>> {
    let Value::Array(items) = body else {
        return Err(anyhow!("Expected a JSON array from SportsDataIO"));
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .filter(|map| {
            let is_bye = |key: &str| map.get(key).and_then(Value::as_str) == Some("BYE");
            !(is_bye("HomeTeam") || is_bye("AwayTeam"))
        })
        .map(|payload| RawRecord::new(Sport::Nfl, kind, SOURCE, payload))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameStatus;
    use crate::services::validator::{self, ValidRecord};
    use serde_json::json;

    #[test]
    fn test_to_raw_records_skips_byes() {
        let body = json!([
            {"GameKey": "202410101", "GameID": 1001, "HomeTeam": "DAL", "AwayTeam": "NE"},
            {"GameKey": "202410199", "HomeTeam": "KC", "AwayTeam": "BYE"},
            "garbage"
        ]);
        let records = to_raw_records(RecordKind::Game, body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::Game);
        assert_eq!(records[0].source, SOURCE);
        assert_eq!(records[0].payload["GameID"], json!(1001));
    }

    #[test]
    fn test_games_endpoint() {
        assert_eq!(games_endpoint(2024, SeasonType::Regular), "scores/json/Games/2024REG");
        assert_eq!(games_endpoint(2023, SeasonType::Postseason), "scores/json/Games/2023POST");
    }

    #[test]
    fn test_scored_game_rows_validate_as_final() {
        let body = json!([{
            "GameKey": "202410101", "GameID": 18900, "Season": 2024, "SeasonType": 1,
            "Week": 1, "Date": "2024-09-08T20:20:00", "HomeTeam": "DAL", "AwayTeam": "NE",
            "HomeTeamID": 9, "AwayTeamID": 21, "HomeScore": 27, "AwayScore": 20,
            "Status": "Final"
        }]);
        let records = to_raw_records(RecordKind::Game, body).unwrap();
        let ValidRecord::Game(game) = validator::validate(&records[0]).unwrap() else {
            panic!("expected a game");
        };
        assert_eq!(game.status, GameStatus::Final);
        assert_eq!(game.final_score(), Some((27, 20)));
    }

    #[test]
    fn test_to_raw_records_requires_array() {
        assert!(to_raw_records(RecordKind::Team, json!({"message": "denied"})).is_err());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_an_error() {
        let settings = Settings {
            database_url: "sqlite::memory:".to_string(),
            sportsdata_api_key: None,
            sportsdata_base_url: "http://127.0.0.1:9".to_string(),
            min_request_interval: Duration::from_millis(0),
        };
        let mut fetcher = DataFetcher::new(&settings);
        assert!(!fetcher.has_api_key());
        assert!(fetcher.fetch_teams().await.is_err());
    }

    #[tokio::test]
    async fn test_throttle_spaces_requests() {
        let settings = Settings {
            database_url: "sqlite::memory:".to_string(),
            sportsdata_api_key: Some("key".to_string()),
            sportsdata_base_url: "http://127.0.0.1:9".to_string(),
            min_request_interval: Duration::from_millis(50),
        };
        let mut fetcher = DataFetcher::new(&settings);
        let start = Instant::now();
        fetcher.throttle().await;
        fetcher.throttle().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
