use std::env;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/statline.db";
pub const DEFAULT_SPORTSDATA_BASE_URL: &str = "https://api.sportsdata.io/v3/nfl";

/// Runtime settings, read from the environment after `.env` is loaded.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub sportsdata_api_key: Option<String>,
    pub sportsdata_base_url: String,
    /// Minimum spacing between upstream requests.
    pub min_request_interval: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        let min_interval_ms = env::var("SPORTSDATA_MIN_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(1000);

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            sportsdata_api_key: env::var("SPORTSDATA_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            sportsdata_base_url: env::var("SPORTSDATA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_SPORTSDATA_BASE_URL.to_string()),
            min_request_interval: Duration::from_millis(min_interval_ms),
        }
    }
}
