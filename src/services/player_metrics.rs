use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::*;
use crate::utils::{clamp_unit, safe_ratio};

/// Shot selection weight per zone.
pub fn zone_weight(zone: ShotZone) -> f64 {
    match zone {
        ShotZone::AtRim => 30.0,
        ShotZone::ThreePoint => 20.0,
        ShotZone::Paint => 15.0,
        ShotZone::MidRange => 5.0,
    }
}

/// Breakout flag thresholds.
const MIN_MINUTES_PER_GAME: f64 = 15.0;
const MIN_TRUE_SHOOTING: f64 = 0.52;
const MAX_USAGE_RATE: f64 = 25.0;
const MIN_DEVELOPMENT_SCORE: f64 = 5.0;

/// Season lookup for non-preseason games.
fn counted_games(games: &[Game]) -> HashMap<i64, &Game> {
    games
        .iter()
        .filter(|g| g.season_type != SeasonType::Preseason)
        .map(|g| (g.game_id, g))
        .collect()
}

/// True shooting: PTS / (2 * (FGA + 0.44 * FTA)).
pub fn true_shooting(points: i64, fga: i64, fta: i64) -> Option<f64> {
    safe_ratio(points as f64, 2.0 * (fga as f64 + 0.44 * fta as f64))
}

/// Per-game rates and shooting efficiency per (player, season).
pub fn player_season_stats(games: &[Game], player_stats: &[PlayerGameStat]) -> Vec<PlayerSeasonStats> {
    let counted = counted_games(games);

    // Team possessions per (team, game), for usage.
    let mut team_possessions: HashMap<(i64, i64), f64> = HashMap::new();
    for stat in player_stats {
        *team_possessions.entry((stat.team_id, stat.game_id)).or_default() += stat.stats.possessions();
    }

    let mut groups: BTreeMap<(i64, i32), Vec<(&Game, &PlayerGameStat)>> = BTreeMap::new();
    for stat in player_stats {
        if let Some(&game) = counted.get(&stat.game_id) {
            groups.entry((stat.player_id, game.season)).or_default().push((game, stat));
        }
    }

    groups
        .into_iter()
        .map(|((player_id, season), mut lines)| {
            lines.sort_by_key(|(game, _)| (game.game_date, game.game_id));
            let latest = lines[lines.len() - 1].1;

            let sum = |f: fn(&BoxScore) -> i32| lines.iter().map(|(_, s)| i64::from(f(&s.stats))).sum::<i64>();
            let games_played = lines.len() as i32;
            let gp = games_played as f64;
            let minutes: f64 = lines.iter().map(|(_, s)| s.stats.minutes).sum();
            let points = sum(|s| s.points);
            let fgm = sum(|s| s.field_goals_made);
            let fga = sum(|s| s.field_goals_attempted);
            let fg3m = sum(|s| s.three_pointers_made);
            let fg3a = sum(|s| s.three_pointers_attempted);
            let fta = sum(|s| s.free_throws_attempted);
            let assists = sum(|s| s.assists);
            let turnovers = sum(|s| s.turnovers);

            let player_possessions: f64 = lines.iter().map(|(_, s)| s.stats.possessions()).sum();
            let team_total: f64 = lines
                .iter()
                .map(|(_, s)| team_possessions.get(&(s.team_id, s.game_id)).copied().unwrap_or_default())
                .sum();

            PlayerSeasonStats {
                player_id,
                season,
                player_name: latest.player_name.clone(),
                team_id: latest.team_id,
                games_played,
                minutes_per_game: minutes / gp,
                points_per_game: points as f64 / gp,
                rebounds_per_game: sum(|s| s.rebounds) as f64 / gp,
                assists_per_game: assists as f64 / gp,
                field_goal_pct: safe_ratio(fgm as f64, fga as f64),
                three_point_pct: safe_ratio(fg3m as f64, fg3a as f64),
                true_shooting_pct: true_shooting(points, fga, fta),
                usage_rate: safe_ratio(player_possessions, team_total).map(|r| 100.0 * r),
                assist_turnover_ratio: safe_ratio(assists as f64, turnovers as f64),
                passing_yards: sum(|s| s.passing_yards),
                rushing_yards: sum(|s| s.rushing_yards),
                receiving_yards: sum(|s| s.receiving_yards),
                touchdowns: sum(|s| s.touchdowns),
            }
        })
        .collect()
}

/// Attempt-share weighted zone score; `None` without attempts.
pub fn shot_selection_score(zones: &[(ShotZone, ZoneLine)]) -> Option<f64> {
    let total: i64 = zones.iter().map(|(_, line)| i64::from(line.attempts)).sum();
    if total == 0 {
        return None;
    }
    Some(
        zones
            .iter()
            .map(|(zone, line)| line.attempts as f64 / total as f64 * zone_weight(*zone))
            .sum(),
    )
}

fn add_shot(line: &mut ZoneLine, made: bool) {
    line.attempts += 1;
    if made {
        line.makes += 1;
    }
}

/// Zone splits and shot selection score per (player, season).
pub fn player_shooting(games: &[Game], shots: &[ShotRecord]) -> Vec<PlayerShooting> {
    let counted = counted_games(games);

    let mut groups: BTreeMap<(i64, i32), Vec<&ShotRecord>> = BTreeMap::new();
    for shot in shots {
        if let Some(game) = counted.get(&shot.game_id) {
            groups.entry((shot.player_id, game.season)).or_default().push(shot);
        }
    }

    groups
        .into_iter()
        .map(|((player_id, season), shots)| {
            let mut at_rim = ZoneLine::default();
            let mut paint = ZoneLine::default();
            let mut mid_range = ZoneLine::default();
            let mut three_point = ZoneLine::default();
            for shot in &shots {
                let line = match shot.zone() {
                    ShotZone::AtRim => &mut at_rim,
                    ShotZone::Paint => &mut paint,
                    ShotZone::MidRange => &mut mid_range,
                    ShotZone::ThreePoint => &mut three_point,
                };
                add_shot(line, shot.shot_made);
            }

            let latest = shots
                .iter()
                .max_by_key(|s| (s.game_id, s.shot_id))
                .copied()
                .unwrap_or(shots[0]);
            let total_attempts = shots.len() as i32;
            let total_makes = shots.iter().filter(|s| s.shot_made).count() as i32;

            PlayerShooting {
                player_id,
                season,
                player_name: latest.player_name.clone(),
                team_id: latest.team_id,
                total_attempts,
                total_makes,
                field_goal_pct: safe_ratio(total_makes as f64, total_attempts as f64),
                at_rim,
                paint,
                mid_range,
                three_point,
                shot_selection_score: shot_selection_score(&[
                    (ShotZone::AtRim, at_rim),
                    (ShotZone::Paint, paint),
                    (ShotZone::MidRange, mid_range),
                    (ShotZone::ThreePoint, three_point),
                ]),
            }
        })
        .collect()
}

/// (close% * 40 + 3P% * 30 + 3PA per game / 100 * 20 + 0.10) * 100.
/// `None` unless the team has both close-range and three-point attempts.
pub fn team_shooting_score(close_range_pct: Option<f64>, three_point_pct: Option<f64>, fg3a_per_game: f64) -> Option<f64> {
    Some((close_range_pct? * 40.0 + three_point_pct? * 30.0 + fg3a_per_game / 100.0 * 20.0 + 0.10) * 100.0)
}

/// Close-range and three-point efficiency per (team, season). Games played
/// counts the games the team has shots in.
pub fn team_shooting_efficiency(games: &[Game], shots: &[ShotRecord]) -> Vec<TeamShootingEfficiency> {
    let counted = counted_games(games);

    let mut groups: BTreeMap<(i64, i32), Vec<&ShotRecord>> = BTreeMap::new();
    for shot in shots {
        if let Some(game) = counted.get(&shot.game_id) {
            groups.entry((shot.team_id, game.season)).or_default().push(shot);
        }
    }

    groups
        .into_iter()
        .map(|((team_id, season), shots)| {
            let mut close_range = ZoneLine::default();
            let mut three_point = ZoneLine::default();
            for shot in &shots {
                match shot.zone() {
                    ShotZone::AtRim | ShotZone::Paint => add_shot(&mut close_range, shot.shot_made),
                    ShotZone::ThreePoint => add_shot(&mut three_point, shot.shot_made),
                    ShotZone::MidRange => {}
                }
            }

            let games_played = shots.iter().map(|s| s.game_id).collect::<BTreeSet<_>>().len() as i32;
            let three_point_attempts_per_game = three_point.attempts as f64 / games_played as f64;

            TeamShootingEfficiency {
                team_id,
                season,
                games_played,
                total_attempts: shots.len() as i32,
                total_makes: shots.iter().filter(|s| s.shot_made).count() as i32,
                close_range,
                three_point,
                three_point_attempts_per_game,
                efficiency_score: team_shooting_score(
                    close_range.field_goal_pct(),
                    three_point.field_goal_pct(),
                    three_point_attempts_per_game,
                ),
            }
        })
        .collect()
}

/// League-wide attempts and FG% per (season, zone). Every zone is listed
/// for each season that has shots.
pub fn zone_efficiency(games: &[Game], shots: &[ShotRecord]) -> Vec<ZoneEfficiency> {
    let counted = counted_games(games);

    let mut lines: BTreeMap<(i32, ShotZone), ZoneLine> = BTreeMap::new();
    for shot in shots {
        if let Some(game) = counted.get(&shot.game_id) {
            for zone in ShotZone::ALL {
                lines.entry((game.season, zone)).or_default();
            }
            if let Some(line) = lines.get_mut(&(game.season, shot.zone())) {
                add_shot(line, shot.shot_made);
            }
        }
    }

    lines
        .into_iter()
        .map(|((season, zone), line)| ZoneEfficiency {
            season,
            zone,
            attempts: line.attempts,
            makes: line.makes,
            field_goal_pct: line.field_goal_pct(),
        })
        .collect()
}

/// Year-over-year development and breakout probability. Needs the prior
/// season and defined TS%/usage in both seasons.
pub fn player_development(seasons: &[PlayerSeasonStats]) -> Vec<PlayerDevelopment> {
    let by_key: HashMap<(i64, i32), &PlayerSeasonStats> =
        seasons.iter().map(|s| ((s.player_id, s.season), s)).collect();

    let mut rows: Vec<PlayerDevelopment> = seasons
        .iter()
        .filter_map(|current| {
            let previous = by_key.get(&(current.player_id, current.season - 1))?;
            let ts = current.true_shooting_pct?;
            let usage = current.usage_rate?;
            let prev_ts = previous.true_shooting_pct?;
            let prev_usage = previous.usage_rate?;

            let points_delta = current.points_per_game - previous.points_per_game;
            let true_shooting_delta = ts - prev_ts;
            let usage_delta = usage - prev_usage;
            let development_score = 0.4 * points_delta + 0.3 * 100.0 * true_shooting_delta + 0.3 * usage_delta;

            let breakout_probability = clamp_unit(
                0.3 * ts + 0.3 * clamp_unit((30.0 - usage) / 30.0) + 0.4 * clamp_unit(development_score / 10.0),
            );
            let is_breakout_candidate = current.minutes_per_game >= MIN_MINUTES_PER_GAME
                && ts >= MIN_TRUE_SHOOTING
                && usage <= MAX_USAGE_RATE
                && development_score >= MIN_DEVELOPMENT_SCORE;

            Some(PlayerDevelopment {
                player_id: current.player_id,
                season: current.season,
                player_name: current.player_name.clone(),
                team_id: current.team_id,
                previous_season: previous.season,
                points_delta,
                true_shooting_delta,
                usage_delta,
                development_score,
                breakout_probability,
                is_breakout_candidate,
            })
        })
        .collect();

    rows.sort_by_key(|r| (r.player_id, r.season));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn nba_game(game_id: i64, season: i32, season_type: SeasonType, day: u32) -> Game {
        Game {
            id: format!("g{}", game_id),
            game_id,
            sport: Sport::Nba,
            season,
            season_type,
            week: None,
            game_date: NaiveDate::from_ymd_opt(season, 11, day),
            home_team_id: 10,
            away_team_id: 11,
            home_score: Some(100),
            away_score: Some(90),
            status: GameStatus::Final,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(player_id: i64, game_id: i64, team_id: i64, stats: BoxScore) -> PlayerGameStat {
        PlayerGameStat {
            id: format!("{}-{}", player_id, game_id),
            player_id,
            player_name: format!("Player {}", player_id),
            game_id,
            team_id,
            position: None,
            stats,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn shot(shot_id: i64, game_id: i64, distance: f64, made: bool) -> ShotRecord {
        ShotRecord {
            id: shot_id.to_string(),
            shot_id,
            game_id,
            player_id: 7,
            player_name: "Player 7".to_string(),
            team_id: 10,
            period: Some(1),
            loc_x: None,
            loc_y: None,
            shot_distance: distance,
            shot_made: made,
            shot_type: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_zero_attempts_leave_percentages_undefined() {
        let games = [nba_game(1, 2024, SeasonType::Regular, 1)];
        let stats = [line(7, 1, 10, BoxScore { minutes: 12.0, rebounds: 4, ..Default::default() })];
        let rows = player_season_stats(&games, &stats);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field_goal_pct, None);
        assert_eq!(rows[0].three_point_pct, None);
        assert_eq!(rows[0].true_shooting_pct, None);
        assert_eq!(rows[0].usage_rate, None);
        assert_eq!(rows[0].rebounds_per_game, 4.0);
    }

    #[test]
    fn test_season_rates_and_usage() {
        let games = [
            nba_game(1, 2024, SeasonType::Regular, 1),
            nba_game(2, 2024, SeasonType::Regular, 3),
            nba_game(3, 2024, SeasonType::Preseason, 2),
        ];
        let box_score = |points, fga, fta, tov| BoxScore {
            minutes: 30.0,
            points,
            field_goals_made: fga / 2,
            field_goals_attempted: fga,
            free_throws_attempted: fta,
            turnovers: tov,
            ..Default::default()
        };
        let stats = [
            line(7, 1, 10, box_score(20, 16, 5, 2)),
            line(7, 2, 12, box_score(30, 20, 10, 3)),
            line(7, 3, 10, box_score(50, 30, 0, 0)),
            line(8, 1, 10, box_score(10, 10, 0, 2)),
        ];
        let rows = player_season_stats(&games, &stats);
        let player = rows.iter().find(|r| r.player_id == 7).unwrap();

        assert_eq!(player.games_played, 2);
        assert_eq!(player.points_per_game, 25.0);
        // Most recent game decides the team.
        assert_eq!(player.team_id, 12);
        let ts = 50.0 / (2.0 * (36.0 + 0.44 * 15.0));
        assert!((player.true_shooting_pct.unwrap() - ts).abs() < 1e-9);

        // Game 1 team possessions include player 8; game 2 is player 7 alone.
        let own = (16.0 + 2.2 + 2.0) + (20.0 + 4.4 + 3.0);
        let team = own + 12.0;
        assert!((player.usage_rate.unwrap() - 100.0 * own / team).abs() < 1e-9);
    }

    #[test]
    fn test_shot_selection_score() {
        assert_eq!(shot_selection_score(&[(ShotZone::AtRim, ZoneLine::default())]), None);

        let zones = [
            (ShotZone::AtRim, ZoneLine { attempts: 2, makes: 1 }),
            (ShotZone::Paint, ZoneLine { attempts: 0, makes: 0 }),
            (ShotZone::MidRange, ZoneLine { attempts: 1, makes: 0 }),
            (ShotZone::ThreePoint, ZoneLine { attempts: 1, makes: 1 }),
        ];
        // 0.5 * 30 + 0.25 * 5 + 0.25 * 20
        assert_eq!(shot_selection_score(&zones), Some(21.25));
    }

    #[test]
    fn test_player_shooting_zone_splits() {
        let games = [nba_game(1, 2024, SeasonType::Regular, 1)];
        let shots = [
            shot(1, 1, 1.0, true),
            shot(2, 1, 2.5, false),
            shot(3, 1, 15.0, false),
            shot(4, 1, 25.0, true),
            shot(5, 99, 25.0, true),
        ];
        let rows = player_shooting(&games, &shots);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.total_attempts, 4);
        assert_eq!(row.at_rim, ZoneLine { attempts: 2, makes: 1 });
        assert_eq!(row.paint.field_goal_pct(), None);
        assert_eq!(row.zone(ShotZone::ThreePoint).field_goal_pct(), Some(1.0));
        assert_eq!(row.shot_selection_score, Some(21.25));
    }

    #[test]
    fn test_zone_efficiency_lists_every_zone() {
        let games = [nba_game(1, 2024, SeasonType::Regular, 1)];
        let rows = zone_efficiency(&games, &[shot(1, 1, 2.0, true), shot(2, 1, 2.0, false)]);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].zone, ShotZone::AtRim);
        assert_eq!(rows[0].field_goal_pct, Some(0.5));
        assert!(rows[1..].iter().all(|r| r.attempts == 0 && r.field_goal_pct.is_none()));
    }

    #[test]
    fn test_team_shooting_efficiency() {
        let games = [nba_game(1, 2024, SeasonType::Regular, 1), nba_game(2, 2024, SeasonType::Regular, 3)];
        let shots = [
            shot(1, 1, 2.0, true),
            shot(2, 1, 8.0, false),
            shot(3, 1, 25.0, true),
            shot(4, 2, 25.0, false),
            shot(5, 2, 15.0, true),
        ];
        let rows = team_shooting_efficiency(&games, &shots);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!((row.team_id, row.games_played, row.total_attempts, row.total_makes), (10, 2, 5, 3));
        assert_eq!(row.close_range, ZoneLine { attempts: 2, makes: 1 });
        assert_eq!(row.three_point, ZoneLine { attempts: 2, makes: 1 });
        assert_eq!(row.three_point_attempts_per_game, 1.0);
        // (0.5 * 40 + 0.5 * 30 + 1 / 100 * 20 + 0.10) * 100
        assert!((row.efficiency_score.unwrap() - 3530.0).abs() < 1e-9);
    }

    #[test]
    fn test_team_shooting_score_needs_both_ranges() {
        let games = [nba_game(1, 2024, SeasonType::Regular, 1)];
        let rows = team_shooting_efficiency(&games, &[shot(1, 1, 2.0, true), shot(2, 1, 15.0, true)]);
        assert_eq!(rows[0].three_point.field_goal_pct(), None);
        assert_eq!(rows[0].efficiency_score, None);
        assert_eq!(team_shooting_score(Some(0.6), None, 35.0), None);
    }

    fn season(player_id: i64, season: i32, ppg: f64, ts: Option<f64>, usage: Option<f64>) -> PlayerSeasonStats {
        PlayerSeasonStats {
            player_id,
            season,
            player_name: format!("Player {}", player_id),
            team_id: 10,
            games_played: 60,
            minutes_per_game: 28.0,
            points_per_game: ppg,
            rebounds_per_game: 5.0,
            assists_per_game: 3.0,
            field_goal_pct: Some(0.48),
            three_point_pct: Some(0.36),
            true_shooting_pct: ts,
            usage_rate: usage,
            assist_turnover_ratio: Some(2.0),
            passing_yards: 0,
            rushing_yards: 0,
            receiving_yards: 0,
            touchdowns: 0,
        }
    }

    #[test]
    fn test_breakout_formula() {
        let seasons = [
            season(7, 2023, 10.0, Some(0.52), Some(18.0)),
            season(7, 2024, 16.0, Some(0.58), Some(22.0)),
        ];
        let rows = player_development(&seasons);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.previous_season, 2023);
        // 0.4 * 6 + 0.3 * 6 + 0.3 * 4
        assert!((row.development_score - 5.4).abs() < 1e-9);
        let expected = 0.3 * 0.58 + 0.3 * (8.0 / 30.0) + 0.4 * 0.54;
        assert!((row.breakout_probability - expected).abs() < 1e-9);
        assert!(row.is_breakout_candidate);
    }

    #[test]
    fn test_breakout_needs_prior_season_and_defined_inputs() {
        let seasons = [
            season(7, 2022, 10.0, Some(0.52), Some(18.0)),
            season(7, 2024, 16.0, Some(0.58), Some(22.0)),
            season(8, 2023, 10.0, None, Some(18.0)),
            season(8, 2024, 16.0, Some(0.58), Some(22.0)),
        ];
        assert!(player_development(&seasons).is_empty());
    }

    #[test]
    fn test_breakout_probability_is_clamped() {
        let seasons = [
            season(7, 2023, 2.0, Some(0.40), Some(10.0)),
            season(7, 2024, 40.0, Some(0.90), Some(5.0)),
        ];
        let row = &player_development(&seasons)[0];
        assert!(row.breakout_probability <= 1.0);
        assert!(row.breakout_probability >= 0.0);
    }
}
