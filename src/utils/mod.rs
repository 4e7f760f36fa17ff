use chrono::{DateTime, NaiveDate, Utc};

/// Ratio guarded against a zero (or non-finite) denominator.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return None;
    }
    Some(numerator / denominator)
}

/// Win percentage with ties counted as half a win.
pub fn calculate_win_percentage(wins: i32, ties: i32, games: i32) -> f64 {
    safe_ratio(wins as f64 + 0.5 * ties as f64, games as f64).unwrap_or(0.0)
}

/// Clamp into [0, 1].
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

pub fn format_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.3}", v))
}

pub fn format_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.*}", precision, v))
}

pub fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

/// Accepts `YYYY-MM-DD` with an optional time suffix (`T20:20:00`, ` 20:20`).
pub fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_ratio_guards_zero() {
        assert_eq!(safe_ratio(5.0, 0.0), None);
        assert_eq!(safe_ratio(0.0, 4.0), Some(0.0));
        assert_eq!(safe_ratio(3.0, 4.0), Some(0.75));
    }

    #[test]
    fn test_calculate_win_percentage() {
        assert_eq!(calculate_win_percentage(3, 1, 5), 0.7);
        assert_eq!(calculate_win_percentage(0, 0, 0), 0.0);
    }

    #[test]
    fn test_parse_game_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 9, 8);
        assert_eq!(parse_game_date("2024-09-08T20:20:00"), expected);
        assert_eq!(parse_game_date("2024-09-08"), expected);
        assert_eq!(parse_game_date("09/08/2024"), expected);
        assert_eq!(parse_game_date("next sunday"), None);
    }
}
