use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::db;
use crate::models::*;
use crate::services::validator::{self, PlayDraft, RejectReason, TeamRef, ValidRecord};

/// Whether already-settled rows may be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LoadMode {
    /// Final games and loaded player/shot/play rows are left alone.
    #[default]
    Incremental,
    /// Overwrite anything whose content changed.
    Corrective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    /// Position of the record in the submitted batch.
    pub index: usize,
    pub kind: RecordKind,
    pub natural_key: String,
    pub rule: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub counts: BTreeMap<RecordKind, KindCounts>,
    pub rejections: Vec<Rejection>,
}

impl LoadReport {
    fn record(&mut self, kind: RecordKind, outcome: UpsertOutcome) {
        let counts = self.counts.entry(kind).or_default();
        match outcome {
            UpsertOutcome::Inserted => counts.inserted += 1,
            UpsertOutcome::Updated => counts.updated += 1,
            UpsertOutcome::Unchanged => counts.unchanged += 1,
        }
    }

    fn reject(&mut self, index: usize, kind: RecordKind, natural_key: String, reason: RejectReason) {
        tracing::warn!("Rejected {} {} (record {}): {}", kind, natural_key, index, reason);
        self.counts.entry(kind).or_default().rejected += 1;
        self.rejections.push(Rejection {
            index,
            kind,
            natural_key,
            rule: reason.rule().to_string(),
            detail: reason.to_string(),
        });
    }

    pub fn counts_for(&self, kind: RecordKind) -> KindCounts {
        self.counts.get(&kind).copied().unwrap_or_default()
    }

    pub fn totals(&self) -> KindCounts {
        self.counts.values().fold(KindCounts::default(), |acc, c| KindCounts {
            inserted: acc.inserted + c.inserted,
            updated: acc.updated + c.updated,
            unchanged: acc.unchanged + c.unchanged,
            rejected: acc.rejected + c.rejected,
        })
    }

    /// True when the load changed at least one canonical row.
    pub fn changed_anything(&self) -> bool {
        let totals = self.totals();
        totals.inserted + totals.updated > 0
    }

    pub fn write_rejections_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for rejection in &self.rejections {
            writer.serialize(rejection)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Validates raw records and upserts them into the canonical tables.
pub struct Normalizer<'a> {
    pool: &'a SqlitePool,
    mode: LoadMode,
}

impl<'a> Normalizer<'a> {
    pub fn new(pool: &'a SqlitePool, mode: LoadMode) -> Self {
        Self { pool, mode }
    }

    /// Load one batch in a single transaction. Invalid records are rejected
    /// and reported; storage failures abort and roll back the whole batch.
    pub async fn load(&self, records: &[RawRecord]) -> Result<LoadReport> {
        let mut order: Vec<usize> = (0..records.len()).collect();
        // Stable: keeps batch order within a kind.
        order.sort_by_key(|&i| records[i].kind);

        let mut report = LoadReport::default();
        let mut tx = self.pool.begin().await?;

        for index in order {
            let raw = &records[index];
            let valid = match validator::validate(raw) {
                Ok(valid) => valid,
                Err(reason) => {
                    report.reject(index, raw.kind, validator::natural_key_hint(raw), reason);
                    continue;
                }
            };

            let key = valid.natural_key();
            match self.apply(&mut tx, raw.sport, valid).await? {
                Ok(outcome) => {
                    tracing::debug!("{} {} -> {:?}", raw.kind, key, outcome);
                    report.record(raw.kind, outcome);
                }
                Err(reason) => report.reject(index, raw.kind, key, reason),
            }
        }

        tx.commit().await?;

        let totals = report.totals();
        tracing::info!(
            "Normalized {} records ({:?} mode): {} inserted, {} updated, {} unchanged, {} rejected",
            records.len(),
            self.mode,
            totals.inserted,
            totals.updated,
            totals.unchanged,
            totals.rejected
        );
        Ok(report)
    }

    /// Normalize everything waiting in the raw store. Accepted records are
    /// stamped processed; rejected ones stay pending for the next run.
    pub async fn normalize_pending(&self, include_processed: bool) -> Result<LoadReport> {
        let stored = db::pending_raw_records(self.pool, include_processed).await?;
        if stored.is_empty() {
            tracing::info!("No pending raw records");
            return Ok(LoadReport::default());
        }

        let records: Vec<RawRecord> = stored.iter().map(|s| s.record.clone()).collect();
        let report = self.load(&records).await?;

        let rejected: HashSet<usize> = report.rejections.iter().map(|r| r.index).collect();
        let ids: Vec<i64> = stored
            .iter()
            .enumerate()
            .filter(|(index, _)| !rejected.contains(index))
            .map(|(_, s)| s.id)
            .collect();
        db::mark_normalized(self.pool, &ids).await?;
        Ok(report)
    }

    async fn apply(
        &self,
        conn: &mut SqliteConnection,
        sport: Sport,
        record: ValidRecord,
    ) -> Result<Result<UpsertOutcome, RejectReason>> {
        match record {
            ValidRecord::Team(team) => self.upsert_team(conn, team).await,
            ValidRecord::Game(game) => self.upsert_game(conn, game).await,
            ValidRecord::PlayerGame(stat) => self.upsert_player_stat(conn, stat).await,
            ValidRecord::Shot(shot) => self.upsert_shot(conn, shot).await,
            ValidRecord::Play(draft) => self.upsert_play(conn, sport, draft).await,
        }
    }

    async fn upsert_team(
        &self,
        conn: &mut SqliteConnection,
        mut team: Team,
    ) -> Result<Result<UpsertOutcome, RejectReason>> {
        let write = match db::find_team(conn, team.team_id).await? {
            None => db::insert_team(conn, &team).await.map(|_| UpsertOutcome::Inserted),
            Some(existing) if existing.same_content(&team) => return Ok(Ok(UpsertOutcome::Unchanged)),
            Some(existing) => {
                team.id = existing.id;
                team.created_at = existing.created_at;
                team.updated_at = Utc::now();
                db::update_team(conn, &team).await.map(|_| UpsertOutcome::Updated)
            }
        };
        classify(write, || format!("team {}", team.team_id))
    }

    async fn upsert_game(
        &self,
        conn: &mut SqliteConnection,
        mut game: Game,
    ) -> Result<Result<UpsertOutcome, RejectReason>> {
        let write = match db::find_game(conn, game.game_id).await? {
            None => db::insert_game(conn, &game).await.map(|_| UpsertOutcome::Inserted),
            Some(existing) if existing.same_content(&game) => return Ok(Ok(UpsertOutcome::Unchanged)),
            Some(existing) if existing.status == GameStatus::Final && self.mode == LoadMode::Incremental => {
                return Ok(Err(RejectReason::FinalGameLocked(game.game_id)));
            }
            Some(existing) => {
                game.id = existing.id;
                game.created_at = existing.created_at;
                game.updated_at = Utc::now();
                db::update_game(conn, &game).await.map(|_| UpsertOutcome::Updated)
            }
        };
        classify(write, || {
            format!("home team {} or away team {}", game.home_team_id, game.away_team_id)
        })
    }

    async fn upsert_player_stat(
        &self,
        conn: &mut SqliteConnection,
        mut stat: PlayerGameStat,
    ) -> Result<Result<UpsertOutcome, RejectReason>> {
        let write = match db::find_player_stat(conn, stat.player_id, stat.game_id).await? {
            None => db::insert_player_stat(conn, &stat).await.map(|_| UpsertOutcome::Inserted),
            Some(existing) if existing.same_content(&stat) => return Ok(Ok(UpsertOutcome::Unchanged)),
            Some(_) if self.mode == LoadMode::Incremental => {
                return Ok(Err(RejectReason::ImmutableRecord {
                    kind: RecordKind::PlayerGame,
                    key: format!("{}/{}", stat.player_id, stat.game_id),
                }));
            }
            Some(existing) => {
                stat.id = existing.id;
                stat.created_at = existing.created_at;
                stat.updated_at = Utc::now();
                db::update_player_stat(conn, &stat).await.map(|_| UpsertOutcome::Updated)
            }
        };
        classify(write, || format!("game {} or team {}", stat.game_id, stat.team_id))
    }

    async fn upsert_shot(
        &self,
        conn: &mut SqliteConnection,
        mut shot: ShotRecord,
    ) -> Result<Result<UpsertOutcome, RejectReason>> {
        let write = match db::find_shot(conn, shot.shot_id).await? {
            None => db::insert_shot(conn, &shot).await.map(|_| UpsertOutcome::Inserted),
            Some(existing) if existing.same_content(&shot) => return Ok(Ok(UpsertOutcome::Unchanged)),
            Some(_) if self.mode == LoadMode::Incremental => {
                return Ok(Err(RejectReason::ImmutableRecord {
                    kind: RecordKind::Shot,
                    key: shot.shot_id.to_string(),
                }));
            }
            Some(existing) => {
                shot.id = existing.id;
                shot.created_at = existing.created_at;
                shot.updated_at = Utc::now();
                db::update_shot(conn, &shot).await.map(|_| UpsertOutcome::Updated)
            }
        };
        classify(write, || format!("game {} or team {}", shot.game_id, shot.team_id))
    }

    async fn upsert_play(
        &self,
        conn: &mut SqliteConnection,
        sport: Sport,
        draft: PlayDraft,
    ) -> Result<Result<UpsertOutcome, RejectReason>> {
        let PlayDraft { mut play, team } = draft;
        if let TeamRef::Abbreviation(abbreviation) = team {
            match db::find_team_by_abbreviation(conn, sport, &abbreviation).await? {
                Some(t) => play.team_id = t.team_id,
                None => {
                    return Ok(Err(RejectReason::UnknownReference(format!(
                        "team '{}'",
                        abbreviation
                    ))))
                }
            }
        }

        let write = match db::find_play(conn, play.play_id).await? {
            None => db::insert_play(conn, &play).await.map(|_| UpsertOutcome::Inserted),
            Some(existing) if existing.same_content(&play) => return Ok(Ok(UpsertOutcome::Unchanged)),
            Some(_) if self.mode == LoadMode::Incremental => {
                return Ok(Err(RejectReason::ImmutableRecord {
                    kind: RecordKind::Play,
                    key: play.play_id.to_string(),
                }));
            }
            Some(existing) => {
                play.id = existing.id;
                play.created_at = existing.created_at;
                play.updated_at = Utc::now();
                db::update_play(conn, &play).await.map(|_| UpsertOutcome::Updated)
            }
        };
        classify(write, || format!("game {} or team {}", play.game_id, play.team_id))
    }
}

/// Split a write result into a per-row rejection (constraint violations)
/// or a fatal error (anything else).
fn classify(
    write: Result<UpsertOutcome>,
    references: impl FnOnce() -> String,
) -> Result<Result<UpsertOutcome, RejectReason>> {
    let err = match write {
        Ok(outcome) => return Ok(Ok(outcome)),
        Err(err) => err,
    };

    let Some(db_err) = err
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
    else {
        return Err(err);
    };

    let message = db_err.message().to_string();
    let reason = match db_err.kind() {
        sqlx::error::ErrorKind::ForeignKeyViolation => RejectReason::UnknownReference(references()),
        sqlx::error::ErrorKind::UniqueViolation
        | sqlx::error::ErrorKind::CheckViolation
        | sqlx::error::ErrorKind::NotNullViolation => RejectReason::Constraint(message),
        _ if message.contains("FOREIGN KEY") => RejectReason::UnknownReference(references()),
        _ if message.contains("constraint failed") => RejectReason::Constraint(message),
        _ => return Err(err),
    };
    Ok(Err(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{find_game, find_team, memory_pool};
    use serde_json::{json, Value};

    fn raw(sport: Sport, kind: RecordKind, payload: Value) -> RawRecord {
        RawRecord::new(sport, kind, "test", payload.as_object().cloned().unwrap())
    }

    fn nfl_team(team_id: i64, key: &str, name: &str, conference: &str, capacity: i64) -> RawRecord {
        raw(
            Sport::Nfl,
            RecordKind::Team,
            json!({"TeamID": team_id, "Key": key, "FullName": name, "Conference": conference,
                   "StadiumCapacity": capacity}),
        )
    }

    fn nfl_game(game_id: i64, home: i64, away: i64, score: (i64, i64), status: &str) -> RawRecord {
        raw(
            Sport::Nfl,
            RecordKind::Game,
            json!({"GameID": game_id, "Season": 2024, "SeasonType": 1, "Week": 1,
                   "HomeTeamID": home, "AwayTeamID": away,
                   "HomeScore": score.0, "AwayScore": score.1, "Status": status}),
        )
    }

    fn batch() -> Vec<RawRecord> {
        vec![
            nfl_game(1001, 1, 2, (21, 17), "Final"),
            nfl_team(1, "DAL", "Dallas Cowboys", "NFC", 80000),
            nfl_team(2, "NE", "New England Patriots", "AFC", 65878),
        ]
    }

    #[tokio::test]
    async fn test_load_orders_by_dependency() {
        let pool = memory_pool().await;
        let report = Normalizer::new(&pool, LoadMode::Incremental)
            .load(&batch())
            .await
            .unwrap();

        assert!(report.rejections.is_empty(), "{:?}", report.rejections);
        assert_eq!(report.counts_for(RecordKind::Team).inserted, 2);
        assert_eq!(report.counts_for(RecordKind::Game).inserted, 1);
    }

    #[tokio::test]
    async fn test_reload_is_a_no_op() {
        let pool = memory_pool().await;
        let normalizer = Normalizer::new(&pool, LoadMode::Incremental);
        normalizer.load(&batch()).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let before = find_team(&mut conn, 1).await.unwrap().unwrap();
        drop(conn);

        let report = normalizer.load(&batch()).await.unwrap();
        let totals = report.totals();
        assert_eq!(totals.unchanged, 3);
        assert_eq!(totals.inserted + totals.updated + totals.rejected, 0);
        assert!(!report.changed_anything());

        let mut conn = pool.acquire().await.unwrap();
        let after = find_team(&mut conn, 1).await.unwrap().unwrap();
        assert_eq!(before.id, after.id);
        assert_eq!(before.updated_at, after.updated_at);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_stadium_capacity_update_keeps_identity() {
        let pool = memory_pool().await;
        let normalizer = Normalizer::new(&pool, LoadMode::Incremental);
        normalizer.load(&batch()).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let before = find_team(&mut conn, 1).await.unwrap().unwrap();
        drop(conn);

        let report = normalizer
            .load(&[nfl_team(1, "DAL", "Dallas Cowboys", "NFC", 92000)])
            .await
            .unwrap();
        assert_eq!(report.counts_for(RecordKind::Team).updated, 1);

        let mut conn = pool.acquire().await.unwrap();
        let after = find_team(&mut conn, 1).await.unwrap().unwrap();
        assert_eq!(after.stadium_capacity, Some(92000));
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams WHERE team_id = 1")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_unknown_team_rejects_only_that_game() {
        let pool = memory_pool().await;
        let mut records = batch();
        records.push(nfl_game(1002, 1, 99, (10, 3), "Final"));

        let report = Normalizer::new(&pool, LoadMode::Incremental)
            .load(&records)
            .await
            .unwrap();

        assert_eq!(report.counts_for(RecordKind::Game).inserted, 1);
        assert_eq!(report.rejections.len(), 1);
        let rejection = &report.rejections[0];
        assert_eq!(rejection.index, 3);
        assert_eq!(rejection.natural_key, "1002");
        assert_eq!(rejection.rule, "unknown_reference");

        let mut conn = pool.acquire().await.unwrap();
        assert!(find_game(&mut conn, 1002).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_records_are_reported_with_rule() {
        let pool = memory_pool().await;
        let mut records = batch();
        records.push(nfl_game(1003, 1, 1, (0, 0), "Final"));
        records.push(raw(Sport::Nfl, RecordKind::Team, json!({"TeamID": 3, "Conference": "NFC"})));

        let report = Normalizer::new(&pool, LoadMode::Incremental)
            .load(&records)
            .await
            .unwrap();

        let rules: Vec<_> = report.rejections.iter().map(|r| r.rule.as_str()).collect();
        assert_eq!(rules, vec!["missing_field", "self_matchup"]);
        assert_eq!(report.counts_for(RecordKind::Team).inserted, 2);
    }

    #[tokio::test]
    async fn test_final_games_only_change_in_corrective_mode() {
        let pool = memory_pool().await;
        Normalizer::new(&pool, LoadMode::Incremental)
            .load(&batch())
            .await
            .unwrap();

        let corrected = [nfl_game(1001, 1, 2, (24, 17), "Final")];
        let report = Normalizer::new(&pool, LoadMode::Incremental)
            .load(&corrected)
            .await
            .unwrap();
        assert_eq!(report.rejections[0].rule, "final_game_locked");

        let report = Normalizer::new(&pool, LoadMode::Corrective)
            .load(&corrected)
            .await
            .unwrap();
        assert_eq!(report.counts_for(RecordKind::Game).updated, 1);

        let mut conn = pool.acquire().await.unwrap();
        let game = find_game(&mut conn, 1001).await.unwrap().unwrap();
        assert_eq!(game.final_score(), Some((24, 17)));
    }

    #[tokio::test]
    async fn test_scheduled_game_can_become_final() {
        let pool = memory_pool().await;
        let normalizer = Normalizer::new(&pool, LoadMode::Incremental);
        let mut records = batch();
        records[0] = raw(
            Sport::Nfl,
            RecordKind::Game,
            json!({"GameID": 1001, "Season": 2024, "Week": 1, "HomeTeamID": 1,
                   "AwayTeamID": 2, "Status": "Scheduled"}),
        );
        normalizer.load(&records).await.unwrap();

        let report = normalizer
            .load(&[nfl_game(1001, 1, 2, (21, 17), "F")])
            .await
            .unwrap();
        assert_eq!(report.counts_for(RecordKind::Game).updated, 1);
    }

    #[tokio::test]
    async fn test_plays_resolve_posteam_and_lock_after_insert() {
        let pool = memory_pool().await;
        let normalizer = Normalizer::new(&pool, LoadMode::Incremental);
        let mut records = batch();
        records.push(raw(
            Sport::Nfl,
            RecordKind::Play,
            json!({"play_id": 1, "game_id": 1001, "posteam": "dal", "epa": 0.8, "yardline_100": 15}),
        ));
        records.push(raw(
            Sport::Nfl,
            RecordKind::Play,
            json!({"play_id": 2, "game_id": 1001, "posteam": "XYZ", "epa": 0.1}),
        ));

        let report = normalizer.load(&records).await.unwrap();
        assert_eq!(report.counts_for(RecordKind::Play).inserted, 1);
        assert_eq!(report.rejections[0].rule, "unknown_reference");

        let edited = raw(
            Sport::Nfl,
            RecordKind::Play,
            json!({"play_id": 1, "game_id": 1001, "team_id": 1, "epa": -0.2}),
        );
        let report = normalizer.load(&[edited]).await.unwrap();
        assert_eq!(report.rejections[0].rule, "immutable_record");
    }

    #[tokio::test]
    async fn test_normalize_pending_marks_records() {
        let pool = memory_pool().await;
        db::insert_raw_records(&pool, &batch()).await.unwrap();

        let normalizer = Normalizer::new(&pool, LoadMode::Incremental);
        let report = normalizer.normalize_pending(false).await.unwrap();
        assert_eq!(report.totals().inserted, 3);

        let report = normalizer.normalize_pending(false).await.unwrap();
        assert_eq!(report.totals(), KindCounts::default());

        let report = normalizer.normalize_pending(true).await.unwrap();
        assert_eq!(report.totals().unchanged, 3);
    }

    #[tokio::test]
    async fn test_rejected_raw_records_stay_pending() {
        let pool = memory_pool().await;
        let mut records = batch();
        records.push(nfl_game(1002, 1, 99, (10, 3), "Final"));
        db::insert_raw_records(&pool, &records).await.unwrap();

        let normalizer = Normalizer::new(&pool, LoadMode::Incremental);
        let report = normalizer.normalize_pending(false).await.unwrap();
        assert_eq!(report.totals().inserted, 3);
        assert_eq!(report.totals().rejected, 1);

        let pending = db::pending_raw_records(&pool, false).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].record.payload["GameID"], json!(1002));

        // Once the missing team shows up the held-back game goes through.
        db::insert_raw_records(&pool, &[nfl_team(99, "NYJ", "New York Jets", "AFC", 82500)])
            .await
            .unwrap();
        let report = normalizer.normalize_pending(false).await.unwrap();
        assert_eq!(report.counts_for(RecordKind::Team).inserted, 1);
        assert_eq!(report.counts_for(RecordKind::Game).inserted, 1);
        assert!(db::pending_raw_records(&pool, false).await.unwrap().is_empty());
    }

    #[test]
    fn test_rejections_csv() {
        let mut report = LoadReport::default();
        report.reject(4, RecordKind::Game, "1002".into(), RejectReason::SelfMatchup(1));
        let path = std::env::temp_dir().join(format!("rejections-{}.csv", uuid::Uuid::new_v4()));
        report.write_rejections_csv(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(contents.starts_with("index,kind,natural_key,rule,detail"));
        assert!(contents.contains("4,game,1002,self_matchup,"));
    }
}
