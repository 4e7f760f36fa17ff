pub mod data_fetcher;
pub mod metric_engine;
pub mod normalizer;
pub mod player_metrics;
pub mod team_metrics;
pub mod validator;

pub use data_fetcher::*;
pub use metric_engine::*;
pub use normalizer::*;
