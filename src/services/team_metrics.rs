use statrs::statistics::Statistics;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::models::*;
use crate::utils::{calculate_win_percentage, safe_ratio};

/// One team's side of a completed game.
#[derive(Debug, Clone, Copy)]
struct Participation {
    scored: i32,
    allowed: i32,
    is_home: bool,
}

impl Participation {
    fn result(&self) -> Ordering {
        self.scored.cmp(&self.allowed)
    }
}

/// Project each Final game into a home row and a mirrored away row.
fn participations<'a>(games: impl IntoIterator<Item = &'a Game>) -> Vec<(&'a Game, i64, Participation)> {
    games
        .into_iter()
        .filter_map(|game| game.final_score().map(|score| (game, score)))
        .flat_map(|(game, (home, away))| {
            [
                (
                    game,
                    game.home_team_id,
                    Participation { scored: home, allowed: away, is_home: true },
                ),
                (
                    game,
                    game.away_team_id,
                    Participation { scored: away, allowed: home, is_home: false },
                ),
            ]
        })
        .collect()
}

/// Win/loss record per (team, season, season type) over Final games,
/// with power rankings assigned within each (season, season type).
pub fn team_season_stats(games: &[Game]) -> Vec<TeamSeasonStats> {
    let mut groups: BTreeMap<(i64, i32, SeasonType), Vec<Participation>> = BTreeMap::new();
    for (game, team_id, p) in participations(games) {
        groups
            .entry((team_id, game.season, game.season_type))
            .or_default()
            .push(p);
    }

    let mut rows: Vec<TeamSeasonStats> = groups
        .into_iter()
        .map(|((team_id, season, season_type), games)| {
            let games_played = games.len() as i32;
            let count = |o: Ordering| games.iter().filter(|p| p.result() == o).count() as i32;
            let (wins, losses, ties) = (count(Ordering::Greater), count(Ordering::Less), count(Ordering::Equal));
            let points_scored: i64 = games.iter().map(|p| i64::from(p.scored)).sum();
            let points_allowed: i64 = games.iter().map(|p| i64::from(p.allowed)).sum();

            let scored: Vec<f64> = games.iter().map(|p| p.scored as f64).collect();
            let points_scored_std_dev = (scored.len() >= 2).then(|| scored.iter().std_dev());

            TeamSeasonStats {
                team_id,
                season,
                season_type,
                games_played,
                wins,
                losses,
                ties,
                points_scored,
                points_allowed,
                point_differential: points_scored - points_allowed,
                win_percentage: calculate_win_percentage(wins, ties, games_played),
                avg_points_scored: points_scored as f64 / games_played as f64,
                avg_points_allowed: points_allowed as f64 / games_played as f64,
                points_scored_std_dev,
                home_wins: games.iter().filter(|p| p.is_home && p.result() == Ordering::Greater).count() as i32,
                away_wins: games.iter().filter(|p| !p.is_home && p.result() == Ordering::Greater).count() as i32,
                power_ranking: 0,
            }
        })
        .collect();

    assign_power_rankings(&mut rows);
    rows
}

fn assign_power_rankings(rows: &mut [TeamSeasonStats]) {
    let mut buckets: BTreeMap<(i32, SeasonType), Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        buckets.entry((row.season, row.season_type)).or_default().push(i);
    }

    for indices in buckets.values_mut() {
        indices.sort_by(|&a, &b| {
            let (a, b) = (&rows[a], &rows[b]);
            b.win_percentage
                .total_cmp(&a.win_percentage)
                .then(b.point_differential.cmp(&a.point_differential))
                .then(a.team_id.cmp(&b.team_id))
        });
        for (rank, &i) in indices.iter().enumerate() {
            rows[i].power_ranking = rank as i32 + 1;
        }
    }
}

/// EPA summary per (offensive team, season, week). Preseason plays and
/// plays from games without a week are skipped.
pub fn team_week_performance(games: &[Game], plays: &[PlayRecord]) -> Vec<TeamWeekPerformance> {
    let weeks: HashMap<i64, (i32, i32)> = games
        .iter()
        .filter(|g| g.season_type != SeasonType::Preseason)
        .filter_map(|g| g.week.map(|w| (g.game_id, (g.season, w))))
        .collect();

    let mut groups: BTreeMap<(i64, i32, i32), Vec<&PlayRecord>> = BTreeMap::new();
    for play in plays {
        if let Some(&(season, week)) = weeks.get(&play.game_id) {
            groups.entry((play.team_id, season, week)).or_default().push(play);
        }
    }

    groups
        .into_iter()
        .map(|((team_id, season, week), plays)| {
            let total = plays.len() as f64;
            let total_epa: f64 = plays.iter().map(|p| p.epa).sum();
            let successes = plays.iter().filter(|p| p.success).count() as f64;
            let red_zone: Vec<_> = plays.iter().filter(|p| p.in_red_zone()).collect();
            let red_zone_tds = red_zone.iter().filter(|p| p.touchdown).count() as f64;

            TeamWeekPerformance {
                team_id,
                season,
                week,
                plays: plays.len() as i32,
                total_epa,
                epa_per_play: safe_ratio(total_epa, total),
                success_rate: safe_ratio(successes, total),
                red_zone_plays: red_zone.len() as i32,
                red_zone_td_rate: safe_ratio(red_zone_tds, red_zone.len() as f64),
            }
        })
        .collect()
}

#[derive(Debug, Default)]
struct ChemistryTotals {
    games: i32,
    wins: i32,
    ties: i32,
    points_scored: i64,
    points_allowed: i64,
    possessions: f64,
    minutes: f64,
    assists: i64,
    turnovers: i64,
}

/// Efficiency and chemistry score per NBA team-season, over Final
/// non-preseason games and the team's player lines in them.
pub fn team_chemistry(games: &[Game], player_stats: &[PlayerGameStat]) -> Vec<TeamChemistry> {
    let eligible: Vec<&Game> = games
        .iter()
        .filter(|g| g.sport == Sport::Nba && g.season_type != SeasonType::Preseason)
        .collect();
    let season_of: HashMap<i64, i32> = eligible
        .iter()
        .filter(|g| g.final_score().is_some())
        .map(|g| (g.game_id, g.season))
        .collect();

    let mut totals: BTreeMap<(i64, i32), ChemistryTotals> = BTreeMap::new();
    for (game, team_id, p) in participations(eligible.iter().copied()) {
        let t = totals.entry((team_id, game.season)).or_default();
        t.games += 1;
        match p.result() {
            Ordering::Greater => t.wins += 1,
            Ordering::Equal => t.ties += 1,
            Ordering::Less => {}
        }
        t.points_scored += i64::from(p.scored);
        t.points_allowed += i64::from(p.allowed);
    }

    for stat in player_stats {
        let Some(&season) = season_of.get(&stat.game_id) else {
            continue;
        };
        if let Some(t) = totals.get_mut(&(stat.team_id, season)) {
            t.possessions += stat.stats.possessions();
            t.minutes += stat.stats.minutes;
            t.assists += i64::from(stat.stats.assists);
            t.turnovers += i64::from(stat.stats.turnovers);
        }
    }

    totals
        .into_iter()
        .map(|((team_id, season), t)| {
            let win_percentage = calculate_win_percentage(t.wins, t.ties, t.games);
            let offensive_rating = safe_ratio(100.0 * t.points_scored as f64, t.possessions);
            let defensive_rating = safe_ratio(100.0 * t.points_allowed as f64, t.possessions);
            let net_rating = offensive_rating.zip(defensive_rating).map(|(o, d)| o - d);
            let pace = safe_ratio(48.0 * t.possessions, t.minutes / 5.0);
            let ball_movement_ratio = safe_ratio(t.assists as f64, t.turnovers as f64);
            let chemistry_score = net_rating
                .zip(ball_movement_ratio)
                .map(|(net, ball)| 30.0 * win_percentage + 0.5 * net + 5.0 * ball);

            TeamChemistry {
                team_id,
                season,
                games_played: t.games,
                possessions: t.possessions,
                offensive_rating,
                defensive_rating,
                net_rating,
                pace,
                win_percentage,
                ball_movement_ratio,
                chemistry_score,
                chemistry_rating: classify_chemistry(
                    win_percentage,
                    t.points_scored - t.points_allowed,
                    t.assists,
                    t.turnovers,
                ),
            }
        })
        .collect()
}

/// Points-based label from win%, point differential and assist/turnover ratio.
pub fn classify_chemistry(win_percentage: f64, point_differential: i64, assists: i64, turnovers: i64) -> ChemistryRating {
    let mut points = 0;

    points += if win_percentage >= 0.60 {
        3
    } else if win_percentage >= 0.50 {
        2
    } else if win_percentage >= 0.40 {
        1
    } else {
        0
    };

    points += if point_differential > 100 {
        2
    } else if point_differential > 0 {
        1
    } else {
        0
    };

    let ratio = assists as f64 / turnovers.max(1) as f64;
    points += if ratio >= 2.0 {
        2
    } else if ratio >= 1.5 {
        1
    } else {
        0
    };

    if points >= 6 {
        ChemistryRating::Elite
    } else if points >= 4 {
        ChemistryRating::Good
    } else if points >= 2 {
        ChemistryRating::Average
    } else {
        ChemistryRating::Poor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn game(game_id: i64, home: i64, away: i64, score: Option<(i32, i32)>) -> Game {
        Game {
            id: format!("g{}", game_id),
            game_id,
            sport: Sport::Nfl,
            season: 2024,
            season_type: SeasonType::Regular,
            week: Some(1),
            game_date: None,
            home_team_id: home,
            away_team_id: away,
            home_score: score.map(|s| s.0),
            away_score: score.map(|s| s.1),
            status: if score.is_some() { GameStatus::Final } else { GameStatus::Scheduled },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn row(rows: &[TeamSeasonStats], team_id: i64) -> &TeamSeasonStats {
        rows.iter().find(|r| r.team_id == team_id).unwrap()
    }

    #[test]
    fn test_single_final_game() {
        let rows = team_season_stats(&[game(1001, 1, 2, Some((21, 17)))]);
        assert_eq!(rows.len(), 2);

        let dallas = row(&rows, 1);
        assert_eq!((dallas.wins, dallas.losses, dallas.ties), (1, 0, 0));
        assert_eq!(dallas.points_scored, 21);
        assert_eq!(dallas.points_allowed, 17);
        assert_eq!(dallas.point_differential, 4);
        assert_eq!(dallas.home_wins, 1);
        assert_eq!(dallas.points_scored_std_dev, None);
        assert_eq!(dallas.power_ranking, 1);

        let patriots = row(&rows, 2);
        assert_eq!((patriots.wins, patriots.losses), (0, 1));
        assert_eq!(patriots.point_differential, -4);
        assert_eq!(patriots.power_ranking, 2);
    }

    #[test]
    fn test_unfinished_games_are_ignored() {
        let rows = team_season_stats(&[game(1, 1, 2, None), game(2, 1, 3, Some((10, 10)))]);
        let team = row(&rows, 1);
        assert_eq!(team.games_played, 1);
        assert_eq!(team.ties, 1);
        assert_eq!(team.win_percentage, 0.5);
        assert!(rows.iter().all(|r| r.team_id != 2));
    }

    #[test]
    fn test_differential_and_record_invariants() {
        let games = [
            game(1, 1, 2, Some((21, 17))),
            game(2, 2, 3, Some((30, 3))),
            game(3, 3, 1, Some((14, 14))),
            game(4, 1, 3, Some((7, 28))),
        ];
        for r in team_season_stats(&games) {
            assert_eq!(r.points_scored - r.points_allowed, r.point_differential);
            assert_eq!(r.wins + r.losses + r.ties, r.games_played);
        }
        let rows = team_season_stats(&games);
        let team = row(&rows, 1);
        // Scored 21, 14, 7: sample std dev is 7.
        assert!((team.points_scored_std_dev.unwrap() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_season_totals_do_not_overflow() {
        let games = [
            game(1, 1, 2, Some((2_000_000_000, 0))),
            game(2, 1, 2, Some((2_000_000_000, 0))),
        ];
        let rows = team_season_stats(&games);
        let team = row(&rows, 1);
        assert_eq!(team.points_scored, 4_000_000_000);
        assert_eq!(team.point_differential, 4_000_000_000);
        assert_eq!(row(&rows, 2).point_differential, -4_000_000_000);
    }

    #[test]
    fn test_power_ranking_tiebreaks() {
        // Teams 1 and 3 both 1-0; team 3 has the larger differential.
        let games = [game(1, 1, 2, Some((21, 17))), game(2, 3, 4, Some((35, 10)))];
        let rows = team_season_stats(&games);
        assert_eq!(row(&rows, 3).power_ranking, 1);
        assert_eq!(row(&rows, 1).power_ranking, 2);
        assert_eq!(row(&rows, 2).power_ranking, 3);
        assert_eq!(row(&rows, 4).power_ranking, 4);
    }

    #[test]
    fn test_week_epa_and_red_zone() {
        let play = |play_id: i64, team_id: i64, epa: f64, yardline: Option<i32>, touchdown: bool| PlayRecord {
            id: play_id.to_string(),
            play_id,
            game_id: 1001,
            team_id,
            epa,
            success: epa > 0.0,
            yardline_100: yardline,
            touchdown,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let plays = [
            play(1, 1, 0.5, Some(40), false),
            play(2, 1, -0.3, Some(18), false),
            play(3, 1, 1.6, Some(5), true),
            play(4, 2, 0.2, None, false),
        ];
        let rows = team_week_performance(&[game(1001, 1, 2, Some((21, 17)))], &plays);
        assert_eq!(rows.len(), 2);

        let dallas = &rows[0];
        assert_eq!((dallas.team_id, dallas.week, dallas.plays), (1, 1, 3));
        assert!((dallas.total_epa - 1.8).abs() < 1e-9);
        assert!((dallas.epa_per_play.unwrap() - 0.6).abs() < 1e-9);
        assert_eq!(dallas.red_zone_plays, 2);
        assert_eq!(dallas.red_zone_td_rate, Some(0.5));

        let patriots = &rows[1];
        assert_eq!(patriots.red_zone_plays, 0);
        assert_eq!(patriots.red_zone_td_rate, None);
    }

    #[test]
    fn test_chemistry_score_and_label() {
        let mut nba_game = game(10, 10, 11, Some((110, 100)));
        nba_game.sport = Sport::Nba;
        nba_game.week = None;

        let line = |team_id, fga, fta, tov, ast, minutes: f64| PlayerGameStat {
            id: format!("p{}", team_id),
            player_id: team_id * 100,
            player_name: "Player".to_string(),
            game_id: 10,
            team_id,
            position: None,
            stats: BoxScore {
                minutes,
                field_goals_attempted: fga,
                free_throws_attempted: fta,
                turnovers: tov,
                assists: ast,
                ..Default::default()
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        // 88 + 0.44 * 25 + 11 = 110 possessions for the home side.
        let stats = [line(10, 88, 25, 11, 22, 240.0), line(11, 90, 0, 10, 10, 240.0)];
        let rows = team_chemistry(&[nba_game], &stats);
        assert_eq!(rows.len(), 2);

        let home = &rows[0];
        assert!((home.possessions - 110.0).abs() < 1e-9);
        assert!((home.offensive_rating.unwrap() - 100.0).abs() < 1e-9);
        assert!((home.pace.unwrap() - 110.0).abs() < 1e-9);
        assert_eq!(home.ball_movement_ratio, Some(2.0));
        let expected = 30.0 * 1.0 + 0.5 * home.net_rating.unwrap() + 5.0 * 2.0;
        assert!((home.chemistry_score.unwrap() - expected).abs() < 1e-9);
        // 3 (win%) + 1 (differential) + 2 (AST/TOV).
        assert_eq!(home.chemistry_rating, ChemistryRating::Elite);
    }

    #[test]
    fn test_chemistry_without_player_lines_has_no_score() {
        let mut nba_game = game(10, 10, 11, Some((99, 101)));
        nba_game.sport = Sport::Nba;
        let rows = team_chemistry(&[nba_game], &[]);
        assert_eq!(rows[0].offensive_rating, None);
        assert_eq!(rows[0].pace, None);
        assert_eq!(rows[0].chemistry_score, None);
        assert_eq!(rows[0].chemistry_rating, ChemistryRating::Poor);
    }

    #[test]
    fn test_classify_chemistry_thresholds() {
        assert_eq!(classify_chemistry(0.65, 150, 25, 10), ChemistryRating::Elite);
        assert_eq!(classify_chemistry(0.55, 50, 15, 10), ChemistryRating::Good);
        assert_eq!(classify_chemistry(0.45, 10, 10, 10), ChemistryRating::Average);
        assert_eq!(classify_chemistry(0.30, -20, 10, 0), ChemistryRating::Average);
        assert_eq!(classify_chemistry(0.30, -20, 5, 10), ChemistryRating::Poor);
    }
}
