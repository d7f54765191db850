// ABOUTME: Pure frequency math: 30-day windows, streaks, snapshots, sources
// ABOUTME: Deterministic functions over day activity and daily score history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! Frequency rollup computation. Everything here is a pure function of the
//! activity history handed in, so rollups are rebuildable from scratch and a
//! rescan of any day converges to the same numbers.

use chrono::{Datelike, Days, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

use crate::classifier::FoodCategoryClassifier;
use crate::config::{ClassifierConfig, SourceListConfig, StreakConfig, UnloggedDayPolicy};
use crate::models::{
    DailyNutrientScore, DayNutrientActivity, FoodCategory, FoodSource, MonthlySnapshot,
    NutrientFrequency, NutrientId, YearlySnapshot,
};

/// Days in the rolling recency window
pub const ROLLING_WINDOW_DAYS: u64 = 30;

/// Rebuild one nutrient's frequency rollup from activity history.
///
/// `activities` must be sorted ascending by date and cover the full history
/// the caller wants counted. `previous` contributes only its `best_streak`,
/// which never decreases even when the history that produced it has been
/// pruned.
#[must_use]
pub fn recompute_frequency(
    nutrient: NutrientId,
    previous: Option<&NutrientFrequency>,
    activities: &[DayNutrientActivity],
    today: NaiveDate,
    streak_config: &StreakConfig,
) -> NutrientFrequency {
    let mut frequency = NutrientFrequency::empty(nutrient);

    let window_start = today
        .checked_sub_days(Days::new(ROLLING_WINDOW_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);

    for activity in activities {
        let present = activity.nutrients_present.contains(&nutrient);
        if present {
            frequency.total_logged_days += 1;
            frequency.last_appearance = Some(activity.date);
            if activity.date >= window_start && activity.date <= today {
                frequency.last_30_days_appearances += 1;
            }
        }
    }

    frequency.current_streak = current_streak(nutrient, activities, today, streak_config);
    let historical_best = best_streak(nutrient, activities, streak_config);
    frequency.best_streak = historical_best
        .max(frequency.current_streak)
        .max(previous.map_or(0, |p| p.best_streak));

    frequency.monthly_snapshots = monthly_snapshots(nutrient, activities);
    frequency.yearly_snapshots = yearly_snapshots(nutrient, activities);

    frequency
}

/// Current consecutive-day streak ending at (or just before) `today`
#[must_use]
pub fn current_streak(
    nutrient: NutrientId,
    activities: &[DayNutrientActivity],
    today: NaiveDate,
    config: &StreakConfig,
) -> u32 {
    match config.unlogged_day_policy {
        UnloggedDayPolicy::SkipsUnloggedDays => {
            // Walk logged days newest-first; unlogged calendar gaps are
            // invisible, a logged day without the nutrient ends the streak.
            let mut streak = 0;
            for activity in activities.iter().rev() {
                if activity.date > today {
                    continue;
                }
                if activity.nutrients_present.contains(&nutrient) {
                    streak += 1;
                } else {
                    break;
                }
            }
            streak
        }
        UnloggedDayPolicy::BreaksStreak => {
            let by_date: BTreeMap<NaiveDate, &DayNutrientActivity> =
                activities.iter().map(|a| (a.date, a)).collect();
            // A streak may end yesterday if today has no diary yet.
            let mut cursor = if by_date.contains_key(&today) {
                today
            } else {
                match today.pred_opt() {
                    Some(yesterday) => yesterday,
                    None => return 0,
                }
            };
            let mut streak = 0;
            loop {
                match by_date.get(&cursor) {
                    Some(activity) if activity.nutrients_present.contains(&nutrient) => {
                        streak += 1;
                    }
                    _ => break,
                }
                match cursor.pred_opt() {
                    Some(prev) => cursor = prev,
                    None => break,
                }
            }
            streak
        }
    }
}

/// Longest streak anywhere in the history, under the configured policy
#[must_use]
pub fn best_streak(
    nutrient: NutrientId,
    activities: &[DayNutrientActivity],
    config: &StreakConfig,
) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev_date: Option<NaiveDate> = None;

    for activity in activities {
        let present = activity.nutrients_present.contains(&nutrient);
        let contiguous = match (config.unlogged_day_policy, prev_date) {
            // Logged-day adjacency is all that matters under the skip policy.
            (UnloggedDayPolicy::SkipsUnloggedDays, _) => true,
            (UnloggedDayPolicy::BreaksStreak, Some(prev)) => {
                activity.date.pred_opt() == Some(prev)
            }
            (UnloggedDayPolicy::BreaksStreak, None) => true,
        };

        if present && contiguous {
            run += 1;
        } else if present {
            run = 1;
        } else {
            run = 0;
        }
        best = best.max(run);
        prev_date = Some(activity.date);
    }
    best
}

fn monthly_snapshots(nutrient: NutrientId, activities: &[DayNutrientActivity]) -> Vec<MonthlySnapshot> {
    let mut months: BTreeMap<(i32, u32), (u32, u32)> = BTreeMap::new();
    for activity in activities {
        let entry = months
            .entry((activity.date.year(), activity.date.month()))
            .or_insert((0, 0));
        entry.1 += 1;
        if activity.nutrients_present.contains(&nutrient) {
            entry.0 += 1;
        }
    }
    months
        .into_iter()
        .map(|((year, month), (days_present, days_logged))| MonthlySnapshot {
            year,
            month,
            days_present,
            days_logged,
        })
        .collect()
}

fn yearly_snapshots(nutrient: NutrientId, activities: &[DayNutrientActivity]) -> Vec<YearlySnapshot> {
    let mut years: BTreeMap<i32, (u32, u32)> = BTreeMap::new();
    for activity in activities {
        let entry = years.entry(activity.date.year()).or_insert((0, 0));
        entry.1 += 1;
        if activity.nutrients_present.contains(&nutrient) {
            entry.0 += 1;
        }
    }
    years
        .into_iter()
        .map(|(year, (days_present, days_logged))| YearlySnapshot {
            year,
            days_present,
            days_logged,
        })
        .collect()
}

/// Build the bounded top-sources list from daily score history.
///
/// Derivation from scores rather than incremental counters keeps the list
/// idempotent under day rescans. Entries older than the retention horizon
/// are dropped, then the list is ordered most-frequent-then-most-recent and
/// truncated to the configured maximum.
///
/// `known_categories` carries categories computed with the full ingredient
/// list (from the current scan or a previous rollup); names not in the map
/// fall back to name-only classification.
#[must_use]
pub fn build_top_sources(
    nutrient: NutrientId,
    scores: &[DailyNutrientScore],
    today: NaiveDate,
    config: &SourceListConfig,
    known_categories: &BTreeMap<String, FoodCategory>,
    classifier_config: &ClassifierConfig,
) -> Vec<FoodSource> {
    let horizon = today
        .checked_sub_signed(chrono::Duration::days(config.retention_days))
        .unwrap_or(NaiveDate::MIN);

    let mut by_food: BTreeMap<&str, (u32, NaiveDate)> = BTreeMap::new();
    for score in scores {
        if score.nutrient != nutrient || score.date < horizon {
            continue;
        }
        for food_name in &score.sources {
            let entry = by_food.entry(food_name.as_str()).or_insert((0, score.date));
            entry.0 += 1;
            entry.1 = entry.1.max(score.date);
        }
    }

    let mut sources: Vec<FoodSource> = by_food
        .into_iter()
        .map(|(food_name, (times_consumed, last_date))| FoodSource {
            food_name: food_name.to_owned(),
            brand: None,
            times_consumed,
            last_consumed: Utc
                .from_utc_datetime(&last_date.and_hms_opt(0, 0, 0).unwrap_or_default()),
            category: known_categories.get(food_name).copied().unwrap_or_else(|| {
                FoodCategoryClassifier::classify(food_name, &[], classifier_config)
            }),
        })
        .collect();

    sources.sort_by(|a, b| {
        b.times_consumed
            .cmp(&a.times_consumed)
            .then_with(|| b.last_consumed.cmp(&a.last_consumed))
            .then_with(|| a.food_name.cmp(&b.food_name))
    });
    sources.truncate(config.max_entries);
    sources
}
