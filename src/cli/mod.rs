use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::io::{Read, Write};
use std::path::Path;

use crate::config::Settings;
use crate::db;
use crate::models::{Game, RawRecord, RecordKind, SeasonType, ShotZone, Sport, Team};
use crate::services::{DataFetcher, LoadMode, LoadReport, MetricEngine, MetricScope, Normalizer};
use crate::utils::{format_opt, format_pct};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    /// Explicit format wins, otherwise the file extension decides.
    fn resolve(explicit: Option<FileFormat>, path: &Path) -> Result<FileFormat> {
        if let Some(format) = explicit {
            return Ok(format);
        }
        match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("json") => Ok(FileFormat::Json),
            _ => Err(anyhow!("Cannot infer format of {}; pass --format", path.display())),
        }
    }
}

pub async fn init_db(settings: &Settings) -> Result<()> {
    db::init_database(settings).await?;
    println!("✅ Database ready at {}", settings.database_url);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
//  Raw store inputs
// ─────────────────────────────────────────────────────────────────────────────

pub async fn ingest(
    settings: &Settings,
    path: &Path,
    sport: Sport,
    kind: RecordKind,
    format: Option<FileFormat>,
) -> Result<()> {
    let pool = db::init_database(settings).await?;
    let format = FileFormat::resolve(format, path)?;

    println!("📥 Reading {} {} records from {}...", sport, kind, path.display());
    let file = std::fs::File::open(path)?;
    let source = format!(
        "file:{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("input")
    );
    let records = read_records(file, format, sport, kind, &source)?;

    db::insert_raw_records(&pool, &records).await?;
    println!("✅ Stored {} raw records. Run `statline normalize` to load them.", records.len());
    Ok(())
}

/// Parse a JSON array of objects or a CSV file into raw records.
/// Empty CSV cells become absent fields; every CSV value stays a string.
pub fn read_records<R: Read>(
    mut input: R,
    format: FileFormat,
    sport: Sport,
    kind: RecordKind,
    source: &str,
) -> Result<Vec<RawRecord>> {
    match format {
        FileFormat::Json => {
            let mut text = String::new();
            input.read_to_string(&mut text)?;
            let items: Vec<Value> = serde_json::from_str(&text)?;
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(payload) => Ok(RawRecord::new(sport, kind, source, payload)),
                    _ => Err(anyhow!("Element {} is not a JSON object", i)),
                })
                .collect()
        }
        FileFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
            let headers = reader.headers()?.clone();
            let mut records = Vec::new();
            for row in reader.records() {
                let row = row?;
                let payload: Map<String, Value> = headers
                    .iter()
                    .zip(row.iter())
                    .filter(|(_, cell)| !cell.is_empty())
                    .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
                    .collect();
                records.push(RawRecord::new(sport, kind, source, payload));
            }
            Ok(records)
        }
    }
}

pub async fn fetch(settings: &Settings, season: i32, season_types: &[SeasonType]) -> Result<()> {
    let pool = db::init_database(settings).await?;
    let mut fetcher = DataFetcher::new(settings);

    if !fetcher.has_api_key() {
        println!("❌ SPORTSDATA_API_KEY is not set. Add it to .env or use `statline seed` for sample data.");
        return Ok(());
    }

    println!("🏈 Fetching NFL {} teams and games...", season);
    let stored = fetcher.fetch_into_store(&pool, season, season_types).await?;
    println!("✅ Stored {} raw records from SportsDataIO.", stored);
    Ok(())
}

pub async fn seed(settings: &Settings) -> Result<()> {
    let pool = db::init_database(settings).await?;
    let inserted = db::seed_sample_records(&pool).await?;
    if inserted == 0 {
        println!("ℹ️  Sample records already present.");
    } else {
        println!("🌱 Seeded {} sample raw records.", inserted);
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
//  Pipeline stages
// ─────────────────────────────────────────────────────────────────────────────

pub async fn normalize(
    settings: &Settings,
    mode: LoadMode,
    include_processed: bool,
    rejections_csv: Option<&Path>,
) -> Result<LoadReport> {
    let pool = db::init_database(settings).await?;

    let (total, processed) = db::count_raw_records(&pool).await?;
    println!(
        "🧹 Normalizing raw records ({:?} mode, {} stored, {} already processed)...",
        mode, total, processed
    );
    let report = Normalizer::new(&pool, mode).normalize_pending(include_processed).await?;
    print_load_report(&report);

    if let Some(path) = rejections_csv {
        report.write_rejections_csv(path)?;
        println!("📝 Wrote {} rejections to {}", report.rejections.len(), path.display());
    }
    Ok(report)
}

fn print_load_report(report: &LoadReport) {
    println!("\n{:<12} {:>9} {:>8} {:>10} {:>9}", "kind", "inserted", "updated", "unchanged", "rejected");
    for kind in RecordKind::ALL {
        let c = report.counts_for(kind);
        println!("{:<12} {:>9} {:>8} {:>10} {:>9}", kind, c.inserted, c.updated, c.unchanged, c.rejected);
    }

    if !report.rejections.is_empty() {
        println!("\n⚠️  Rejections:");
        for r in report.rejections.iter().take(20) {
            println!("   #{} {} {} [{}] {}", r.index, r.kind, r.natural_key, r.rule, r.detail);
        }
        if report.rejections.len() > 20 {
            println!("   ... and {} more", report.rejections.len() - 20);
        }
    }
}

pub async fn aggregate(settings: &Settings, scope: MetricScope) -> Result<()> {
    let pool = db::init_database(settings).await?;

    println!("📊 Recomputing aggregates...");
    let aggregates = MetricEngine::new(&pool).run(&scope).await?;
    println!("   Team seasons:       {}", aggregates.team_seasons.len());
    println!("   Team weeks (EPA):   {}", aggregates.team_weeks.len());
    println!("   Team chemistry:     {}", aggregates.team_chemistry.len());
    println!("   Player seasons:     {}", aggregates.player_seasons.len());
    println!("   Player shooting:    {}", aggregates.player_shooting.len());
    println!("   Team shooting:      {}", aggregates.team_shooting.len());
    println!("   Zone efficiency:    {}", aggregates.zone_efficiency.len());
    println!("   Player development: {}", aggregates.player_development.len());
    println!("✅ Replaced {} aggregate rows.", aggregates.row_count());
    Ok(())
}

/// Normalize pending raw records, then rebuild the aggregates in scope.
pub async fn run_pipeline(
    settings: &Settings,
    mode: LoadMode,
    scope: MetricScope,
    rejections_csv: Option<&Path>,
) -> Result<()> {
    let report = normalize(settings, mode, false, rejections_csv).await?;
    if !report.changed_anything() {
        println!("\nℹ️  No canonical rows changed; rebuilding aggregates anyway.");
    }
    println!();
    aggregate(settings, scope).await
}

// ─────────────────────────────────────────────────────────────────────────────
//  Reports
// ─────────────────────────────────────────────────────────────────────────────

pub async fn report(settings: &Settings, season: Option<i32>, limit: i64) -> Result<()> {
    let pool = db::init_database(settings).await?;

    let records = db::get_team_records(&pool, season).await?;
    if records.is_empty() {
        println!("📭 No aggregates yet. Try: statline seed && statline run");
        return Ok(());
    }

    println!("🏆 Team records:");
    for r in &records {
        println!(
            "   {} {:<24} {:>2}-{:>2}-{:<2} {:>6}  diff {:+}  ({} {})",
            r.abbreviation.as_deref().unwrap_or("---"),
            r.name,
            r.wins,
            r.losses,
            r.ties,
            format!("{:.3}", r.win_percentage),
            r.point_differential,
            r.season,
            r.season_type.as_str(),
        );
    }

    let chemistry = db::get_chemistry_rankings(&pool, season, limit).await?;
    if !chemistry.is_empty() {
        println!("\n🤝 Chemistry rankings:");
        for (i, c) in chemistry.iter().enumerate() {
            println!(
                "   {}. team {} ({}) score {} | net {} | pace {} | {}",
                i + 1,
                c.team_id,
                c.season,
                format_opt(c.chemistry_score, 1),
                format_opt(c.net_rating, 1),
                format_opt(c.pace, 1),
                c.chemistry_rating.as_str(),
            );
        }
    }

    let shooting = db::get_shooting_rankings(&pool, season, limit).await?;
    if !shooting.is_empty() {
        println!("\n🎯 Shot selection:");
        for (i, s) in shooting.iter().enumerate() {
            println!(
                "   {}. {} ({}) score {} | FG {} on {} attempts",
                i + 1,
                s.player_name,
                s.season,
                format_opt(s.shot_selection_score, 2),
                format_pct(s.field_goal_pct),
                s.total_attempts,
            );
            let zones: Vec<String> = ShotZone::ALL
                .iter()
                .map(|&zone| format!("{} {}", zone.as_str(), format_pct(s.zone(zone).field_goal_pct())))
                .collect();
            println!("      {}", zones.join(" | "));
        }
    }

    let team_shooting = db::get_team_shooting_rankings(&pool, season, limit).await?;
    if !team_shooting.is_empty() {
        println!("\n🏀 Team shooting efficiency:");
        for (i, t) in team_shooting.iter().enumerate() {
            println!(
                "   {}. team {} ({}) score {} | close {} | 3P {} on {:.1} per game",
                i + 1,
                t.team_id,
                t.season,
                format_opt(t.efficiency_score, 1),
                format_pct(t.close_range.field_goal_pct()),
                format_pct(t.three_point.field_goal_pct()),
                t.three_point_attempts_per_game,
            );
        }
    }

    let zones = db::get_zone_efficiency(&pool, season).await?;
    if !zones.is_empty() {
        println!("\n📍 Zone efficiency:");
        for z in &zones {
            println!("   {} {:<12} {:>4}/{:<4} {}", z.season, z.zone.as_str(), z.makes, z.attempts, format_pct(z.field_goal_pct));
        }
    }

    let breakout = db::get_breakout_rankings(&pool, season, false, limit).await?;
    if !breakout.is_empty() {
        println!("\n🚀 Breakout watch:");
        for (i, d) in breakout.iter().enumerate() {
            println!(
                "   {}. {} ({} vs {}) probability {} | development {:.1}{}",
                i + 1,
                d.player_name,
                d.season,
                d.previous_season,
                format_pct(Some(d.breakout_probability)),
                d.development_score,
                if d.is_breakout_candidate { " ⭐" } else { "" },
            );
        }
    }

    let weeks = db::get_team_weeks(&pool, season, None).await?;
    if !weeks.is_empty() {
        println!("\n📈 Weekly EPA:");
        for w in weeks.iter().take(limit.max(0) as usize) {
            println!(
                "   team {} week {:>2} ({}) {} plays | EPA/play {} | success {} | red zone TD {}",
                w.team_id,
                w.week,
                w.season,
                w.plays,
                format_opt(w.epa_per_play, 3),
                format_pct(w.success_rate),
                format_pct(w.red_zone_td_rate),
            );
        }
    }

    Ok(())
}

pub async fn query_team(settings: &Settings, query: &str) -> Result<()> {
    let pool = db::init_database(settings).await?;

    println!("🔍 Searching for team: {}", query);
    let teams = db::search_teams(&pool, query).await?;

    if teams.is_empty() {
        println!("❌ No teams found matching '{}'", query);
        println!("\n💡 Available teams:");
        for team in db::get_all_teams(&pool).await?.iter().take(10) {
            println!("   • {} ({})", team.name, team.sport);
        }
        return Ok(());
    }

    if teams.len() > 1 {
        println!("📋 Found {} teams matching '{}':\n", teams.len(), query);
        for (i, team) in teams.iter().enumerate() {
            println!("{}. {} ({})", i + 1, team.name, team.sport);
        }
        println!("\n🔍 Showing details for first match:");
    }

    let Some(profile) = db::get_team_profile(&pool, teams[0].team_id).await? else {
        return Ok(());
    };
    let team = &profile.team;

    println!("📊 Team Details:");
    println!("   Name: {}", team.name);
    println!("   Sport: {} ({} {})", team.sport, team.conference.as_str(), team.division.as_deref().unwrap_or(""));
    if let Some(stadium) = &team.stadium_name {
        println!(
            "   Stadium: {}{}",
            stadium,
            team.stadium_capacity.map_or(String::new(), |c| format!(" ({} seats)", c))
        );
    }
    println!("   Last Updated: {}", team.updated_at.format("%Y-%m-%d %H:%M:%S"));

    println!("\n📈 Seasons:");
    if profile.seasons.is_empty() {
        println!("   No aggregated seasons");
    }
    for s in &profile.seasons {
        println!(
            "   {} {}: {}-{}-{} ({:.3}) scored {} allowed {} diff {:+} rank #{}",
            s.season,
            s.season_type.as_str(),
            s.wins,
            s.losses,
            s.ties,
            s.win_percentage,
            s.points_scored,
            s.points_allowed,
            s.point_differential,
            s.power_ranking,
        );
    }

    println!("\n📅 Recent Games:");
    if profile.recent_games.is_empty() {
        println!("   No games found");
    }
    for game in &profile.recent_games {
        println!("   {}", describe_game(team, game));
    }

    Ok(())
}

fn describe_game(team: &Team, game: &Game) -> String {
    let is_home = game.home_team_id == team.team_id;
    let opponent = if is_home { game.away_team_id } else { game.home_team_id };
    let venue = if is_home { "vs" } else { "at" };
    let date = game
        .game_date
        .map_or("--/--".to_string(), |d| d.format("%m/%d").to_string());

    match game.final_score() {
        Some((home, away)) => {
            let (ours, theirs) = if is_home { (home, away) } else { (away, home) };
            let result = if ours > theirs {
                "W"
            } else if ours < theirs {
                "L"
            } else {
                "T"
            };
            format!("{} {} team {} ({}-{}) {}", date, venue, opponent, home, away, result)
        }
        None => format!("{} {} team {} ({})", date, venue, opponent, game.status.as_str()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
//  Export
// ─────────────────────────────────────────────────────────────────────────────

pub async fn export(
    settings: &Settings,
    table: &str,
    format: FileFormat,
    output: Option<&Path>,
) -> Result<()> {
    let pool = db::init_database(settings).await?;
    let (columns, rows) = db::export_rows(&pool, table).await?;

    match output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            write_export(file, format, &columns, &rows)?;
            println!("💾 Exported {} rows from {} to {}", rows.len(), table, path.display());
        }
        None => write_export(std::io::stdout().lock(), format, &columns, &rows)?,
    }
    Ok(())
}

pub fn write_export<W: Write>(
    mut out: W,
    format: FileFormat,
    columns: &[String],
    rows: &[Vec<Value>],
) -> Result<()> {
    match format {
        FileFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(columns)?;
            for row in rows {
                writer.write_record(row.iter().map(|cell| match cell {
                    Value::Null => String::new(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }))?;
            }
            writer.flush()?;
        }
        FileFormat::Json => {
            let objects: Vec<Map<String, Value>> = rows
                .iter()
                .map(|row| columns.iter().cloned().zip(row.iter().cloned()).collect())
                .collect();
            serde_json::to_writer_pretty(&mut out, &objects)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_csv_drops_empty_cells() {
        let csv = "GameID,Season,Week,HomeTeamID,AwayTeamID,HomeScore,AwayScore,Status\n\
                   1001,2024,1,1,2,21,17,Final\n\
                   1005,2024,3,1,3,,,Scheduled\n";
        let records = read_records(csv.as_bytes(), FileFormat::Csv, Sport::Nfl, RecordKind::Game, "file:games.csv").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload["HomeScore"], json!("21"));
        assert!(!records[1].payload.contains_key("HomeScore"));
        assert_eq!(records[1].source, "file:games.csv");
    }

    #[test]
    fn test_read_json_requires_objects() {
        let good = r#"[{"TeamID": 1, "Name": "Cowboys"}]"#;
        let records = read_records(good.as_bytes(), FileFormat::Json, Sport::Nfl, RecordKind::Team, "t").unwrap();
        assert_eq!(records[0].payload["TeamID"], json!(1));

        let bad = r#"[{"TeamID": 1}, 42]"#;
        assert!(read_records(bad.as_bytes(), FileFormat::Json, Sport::Nfl, RecordKind::Team, "t").is_err());
    }

    #[test]
    fn test_format_resolution() {
        assert_eq!(FileFormat::resolve(None, Path::new("plays.CSV")).unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::resolve(Some(FileFormat::Json), Path::new("plays.csv")).unwrap(), FileFormat::Json);
        assert!(FileFormat::resolve(None, Path::new("plays.txt")).is_err());
    }

    #[test]
    fn test_write_export_formats() {
        let columns = vec!["team_id".to_string(), "name".to_string(), "pace".to_string()];
        let rows = vec![vec![json!(1), json!("Dallas Cowboys"), Value::Null]];

        let mut csv_out = Vec::new();
        write_export(&mut csv_out, FileFormat::Csv, &columns, &rows).unwrap();
        assert_eq!(String::from_utf8(csv_out).unwrap(), "team_id,name,pace\n1,Dallas Cowboys,\n");

        let mut json_out = Vec::new();
        write_export(&mut json_out, FileFormat::Json, &columns, &rows).unwrap();
        let parsed: Value = serde_json::from_slice(&json_out).unwrap();
        assert_eq!(parsed, json!([{"team_id": 1, "name": "Dallas Cowboys", "pace": null}]));
    }
}
