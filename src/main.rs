mod api;
mod cli;
mod config;
mod db;
mod models;
mod services;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::cli::FileFormat;
use crate::config::Settings;
use crate::models::{RecordKind, SeasonType, Sport};
use crate::services::{LoadMode, MetricScope};

#[derive(Parser)]
#[command(name = "statline")]
#[command(about = "Normalizes NFL/NBA data and builds a queryable metrics warehouse")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct ScopeArgs {
    /// Limit the run to one season
    #[arg(long)]
    season: Option<i32>,
    /// Limit the run to one team
    #[arg(long)]
    team_id: Option<i64>,
    /// Limit the run to one player
    #[arg(long)]
    player_id: Option<i64>,
}

impl From<ScopeArgs> for MetricScope {
    fn from(args: ScopeArgs) -> Self {
        MetricScope {
            season: args.season,
            team_id: args.team_id,
            player_id: args.player_id,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    InitDb,
    /// Append records from a JSON array or CSV file to the raw store
    Ingest {
        path: PathBuf,
        #[arg(short, long)]
        sport: Sport,
        #[arg(short, long)]
        kind: RecordKind,
        #[arg(short, long, value_enum)]
        format: Option<FileFormat>,
    },
    /// Fetch NFL teams and season games from SportsDataIO into the raw store
    Fetch {
        #[arg(long)]
        season: i32,
        #[arg(long = "season-type", default_values_t = vec![SeasonType::Regular])]
        season_types: Vec<SeasonType>,
    },
    /// Load the sample NFL/NBA batch into the raw store
    Seed,
    /// Validate raw records and upsert them into the canonical tables
    Normalize {
        #[arg(short, long, value_enum, default_value_t = LoadMode::Incremental)]
        mode: LoadMode,
        /// Re-process records that were already normalized
        #[arg(long)]
        all: bool,
        /// Write rejected records to this CSV file
        #[arg(long)]
        rejections: Option<PathBuf>,
    },
    /// Recompute the aggregate tables
    Aggregate {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Normalize pending records, then recompute aggregates
    Run {
        #[arg(short, long, value_enum, default_value_t = LoadMode::Incremental)]
        mode: LoadMode,
        #[arg(long)]
        rejections: Option<PathBuf>,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Print team records and metric rankings
    Report {
        #[arg(long)]
        season: Option<i32>,
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },
    /// Query a team's profile
    Team {
        #[arg(short, long)]
        name: String,
    },
    /// Export a table or view as CSV or JSON
    Export {
        table: String,
        #[arg(short, long, value_enum, default_value_t = FileFormat::Csv)]
        format: FileFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Start the report API server
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("statline=info")),
        )
        .init();

    let settings = Settings::from_env();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::InitDb) => {
            tracing::info!("Initializing database...");
            cli::init_db(&settings).await?;
        }
        Some(Commands::Ingest { path, sport, kind, format }) => {
            tracing::info!("Ingesting {} {} records from {}", sport, kind, path.display());
            cli::ingest(&settings, &path, sport, kind, format).await?;
        }
        Some(Commands::Fetch { season, season_types }) => {
            tracing::info!("Fetching NFL season {}", season);
            cli::fetch(&settings, season, &season_types).await?;
        }
        Some(Commands::Seed) => {
            cli::seed(&settings).await?;
        }
        Some(Commands::Normalize { mode, all, rejections }) => {
            cli::normalize(&settings, mode, all, rejections.as_deref()).await?;
        }
        Some(Commands::Aggregate { scope }) => {
            cli::aggregate(&settings, scope.into()).await?;
        }
        Some(Commands::Run { mode, rejections, scope }) => {
            cli::run_pipeline(&settings, mode, scope.into(), rejections.as_deref()).await?;
        }
        Some(Commands::Report { season, limit }) => {
            cli::report(&settings, season, limit).await?;
        }
        Some(Commands::Team { name }) => {
            tracing::info!("Querying team: {}", name);
            cli::query_team(&settings, &name).await?;
        }
        Some(Commands::Export { table, format, output }) => {
            cli::export(&settings, &table, format, output.as_deref()).await?;
        }
        Some(Commands::Serve { port }) => {
            tracing::info!("Starting Statline API server on port {}", port);
            api::serve(&settings, port).await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting Statline API server on port 3000");
            api::serve(&settings, 3000).await?;
        }
    }

    Ok(())
}
