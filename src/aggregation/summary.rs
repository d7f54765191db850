// ABOUTME: Trend classification and UI-facing nutrient summary assembly
// ABOUTME: Recent-versus-baseline coverage comparison with a dead band
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! Summary assembly. The trend compares the mean coverage of the most
//! recent days against the mean of the days before them; small movements
//! inside the dead band read as `Stable` so the UI does not flicker between
//! arrows on noise.

use chrono::{Days, NaiveDate};
use std::collections::HashMap;

use crate::config::{CoverageConfig, TrendConfig};
use crate::models::{CoverageStatus, DailyNutrientScore, NutrientId, TrendDirection};

/// Classify the trend over a seven-day coverage series.
///
/// `daily_coverage` is ordered oldest to newest and must span
/// `baseline_days + recent_days` entries; unlogged days contribute 0.
/// Returns the direction and the signed percentage change that produced it.
#[must_use]
pub fn classify_trend(daily_coverage: &[f64], config: &TrendConfig) -> (TrendDirection, f64) {
    let recent_len = config.recent_days.min(daily_coverage.len());
    let split = daily_coverage.len() - recent_len;
    let (baseline, recent) = daily_coverage.split_at(split);

    let recent_mean = mean(recent);
    let baseline_mean = mean(baseline);

    if baseline_mean <= f64::EPSILON {
        if recent_mean <= f64::EPSILON {
            return (TrendDirection::Stable, 0.0);
        }
        // Anything over an empty baseline is an improvement.
        return (TrendDirection::Improving, 100.0);
    }

    let change = (recent_mean - baseline_mean) / baseline_mean * 100.0;
    let direction = if change > config.change_threshold_percent {
        TrendDirection::Improving
    } else if change < -config.change_threshold_percent {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };
    (direction, change)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let len = values.len() as f64;
    values.iter().sum::<f64>() / len
}

/// Daily coverage series for one nutrient over the trend horizon, oldest
/// first, with 0.0 filled in for days without a score.
#[must_use]
pub fn coverage_series(
    nutrient: NutrientId,
    scores: &[DailyNutrientScore],
    today: NaiveDate,
    config: &TrendConfig,
) -> Vec<f64> {
    let span = config.baseline_days + config.recent_days;
    let by_date: HashMap<NaiveDate, f64> = scores
        .iter()
        .filter(|s| s.nutrient == nutrient)
        .map(|s| (s.date, s.coverage_percentage()))
        .collect();

    (0..span)
        .rev()
        .map(|offset| {
            today
                .checked_sub_days(Days::new(offset as u64))
                .and_then(|date| by_date.get(&date).copied())
                .unwrap_or(0.0)
        })
        .collect()
}

/// Mean coverage over the trailing seven days, unlogged days counted as 0
#[must_use]
pub fn seven_day_average(
    nutrient: NutrientId,
    scores: &[DailyNutrientScore],
    today: NaiveDate,
) -> f64 {
    let start = today.checked_sub_days(Days::new(6)).unwrap_or(NaiveDate::MIN);
    let total: f64 = scores
        .iter()
        .filter(|s| s.nutrient == nutrient && s.date >= start && s.date <= today)
        .map(DailyNutrientScore::coverage_percentage)
        .sum();
    total / 7.0
}

/// Short informational line for the UI, keyed off the status bucket
#[must_use]
pub fn info_text(nutrient_name: &str, status: CoverageStatus, config: &CoverageConfig) -> String {
    match status {
        CoverageStatus::Strong => format!("{nutrient_name} intake is on track this week"),
        CoverageStatus::Adequate => {
            format!("{nutrient_name} intake is adequate; one more source would help")
        }
        CoverageStatus::Low => format!(
            "{nutrient_name} coverage is below {:.0}% this week",
            config.low_below
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TrendConfig {
        TrendConfig::default()
    }

    #[test]
    fn test_improving_beyond_dead_band() {
        // Baseline mean 40, recent mean 60: +50% change.
        let series = [40.0, 40.0, 40.0, 40.0, 60.0, 60.0, 60.0];
        let (direction, change) = classify_trend(&series, &config());
        assert_eq!(direction, TrendDirection::Improving);
        assert!((change - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_stable_inside_dead_band() {
        // Baseline mean 50, recent mean 52: +4% change.
        let series = [50.0, 50.0, 50.0, 50.0, 52.0, 52.0, 52.0];
        let (direction, _) = classify_trend(&series, &config());
        assert_eq!(direction, TrendDirection::Stable);
    }

    #[test]
    fn test_declining_beyond_dead_band() {
        let series = [80.0, 80.0, 80.0, 80.0, 40.0, 40.0, 40.0];
        let (direction, _) = classify_trend(&series, &config());
        assert_eq!(direction, TrendDirection::Declining);
    }

    #[test]
    fn test_zero_baseline_with_recent_activity_improves() {
        let series = [0.0, 0.0, 0.0, 0.0, 25.0, 25.0, 25.0];
        let (direction, change) = classify_trend(&series, &config());
        assert_eq!(direction, TrendDirection::Improving);
        assert!((change - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_all_zero_is_stable() {
        let series = [0.0; 7];
        let (direction, change) = classify_trend(&series, &config());
        assert_eq!(direction, TrendDirection::Stable);
        assert!(change.abs() < f64::EPSILON);
    }
}
