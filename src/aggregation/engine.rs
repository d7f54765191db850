// ABOUTME: Aggregation engine orchestrating scores, rollups, and summaries
// ABOUTME: Rescan-based writes so every operation is idempotent per day
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! # Aggregation Engine
//!
//! Owns the write path from a day's logged foods to persisted daily scores,
//! the balance score, and per-nutrient frequency rollups, plus the read path
//! that assembles UI summaries. Writes always go through a full rescan of
//! the affected day, so reprocessing the same diary converges to identical
//! stored state.
//!
//! Persistence failures on secondary documents (balance, rollups) are logged
//! and skipped rather than failing the whole rescan; the next rescan repairs
//! them.

use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::FreshnessCache;
use crate::classifier::FoodCategoryClassifier;
use crate::config::IntelligenceConfig;
use crate::errors::{AppError, AppResult};
use crate::extractor::ExtractionStrategy;
use crate::models::{
    CoverageStatus, DailyNutrientScore, DayNutrientActivity, FoodCategory, FoodSource, LoggedFood,
    NutrientBalanceScore, NutrientFrequency, NutrientId, NutrientSummary, ValidatedMicronutrient,
};
use crate::store::NutrientStore;

use super::frequency::{build_top_sources, recompute_frequency};
use super::summary::{classify_trend, coverage_series, info_text, seven_day_average};

/// How far back activity history is loaded when rebuilding rollups
const HISTORY_HORIZON_DAYS: u64 = 400;

/// Orchestrates extraction, scoring, and rollup maintenance for one store
pub struct AggregationEngine {
    store: Arc<dyn NutrientStore>,
    strategy: ExtractionStrategy,
    config: IntelligenceConfig,
    // Serializes the read-modify-write cycle across concurrent mutations.
    mutation_gate: Mutex<()>,
    frequency_cache: FreshnessCache<(Uuid, NutrientId), NutrientFrequency>,
    balance_cache: FreshnessCache<(Uuid, NaiveDate), NutrientBalanceScore>,
}

impl AggregationEngine {
    /// Build an engine over a store and extraction strategy
    #[must_use]
    pub fn new(
        store: Arc<dyn NutrientStore>,
        strategy: ExtractionStrategy,
        config: IntelligenceConfig,
    ) -> Self {
        let frequency_cache = FreshnessCache::new(&config.cache);
        let balance_cache = FreshnessCache::new(&config.cache);
        Self {
            store,
            strategy,
            config,
            mutation_gate: Mutex::new(()),
            frequency_cache,
            balance_cache,
        }
    }

    /// Record a day's already-extracted nutrient activity.
    ///
    /// For callers that ran extraction themselves and only need the day's
    /// activity record and derived rollups updated. Does not touch score
    /// documents.
    ///
    /// # Errors
    ///
    /// Returns an error when the activity record cannot be written.
    pub async fn record_day_event(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        nutrients_present: BTreeSet<NutrientId>,
        meal_count: u32,
    ) -> AppResult<()> {
        let _gate = self.mutation_gate.lock().await;
        let activity = DayNutrientActivity {
            date,
            nutrients_present,
            meal_count,
        };
        self.store.save_day_activity(user_id, &activity).await?;
        self.refresh_derived(user_id, date, &activity.nutrients_present, &BTreeMap::new())
            .await;
        Ok(())
    }

    /// Add one food's confirmed detections to a day incrementally.
    ///
    /// Each detection contributes the flat per-food points. The day's
    /// activity record is unioned, not replaced; use [`Self::rescan_day`]
    /// when a food is edited or removed.
    ///
    /// # Errors
    ///
    /// Returns an error when score or activity documents cannot be read or
    /// written.
    pub async fn upsert_food_detection(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        food: &LoggedFood,
        detections: &[ValidatedMicronutrient],
    ) -> AppResult<()> {
        let _gate = self.mutation_gate.lock().await;
        let existing = self.store.load_daily_scores(user_id, date, date).await?;
        let mut by_nutrient: BTreeMap<NutrientId, DailyNutrientScore> =
            existing.into_iter().map(|s| (s.nutrient, s)).collect();
        let mut touched: BTreeSet<NutrientId> = BTreeSet::new();

        for detection in detections {
            let points = self.points_for(food, detection.nutrient);
            by_nutrient
                .entry(detection.nutrient)
                .or_insert_with(|| DailyNutrientScore::new(detection.nutrient, date))
                .add_contribution(&food.name, points);
            touched.insert(detection.nutrient);
        }

        for nutrient in &touched {
            if let Some(score) = by_nutrient.get(nutrient) {
                self.store.save_daily_score(user_id, score).await?;
            }
        }

        self.union_day_activity(user_id, date, &touched).await?;

        let categories = self.categorize(std::slice::from_ref(food));
        self.refresh_derived(user_id, date, &touched, &categories)
            .await;
        Ok(())
    }

    /// Rescan one diary day from scratch.
    ///
    /// Existing score documents for the day are deleted first, then every
    /// food is re-extracted and re-scored, so running this twice with the
    /// same foods produces identical stored state.
    ///
    /// # Errors
    ///
    /// Returns an error when the day's score documents cannot be deleted or
    /// written. Secondary document failures are logged and skipped.
    pub async fn rescan_day(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        foods: &[LoggedFood],
    ) -> AppResult<Vec<DailyNutrientScore>> {
        let _gate = self.mutation_gate.lock().await;
        self.store.delete_daily_scores_for_date(user_id, date).await?;

        let mut scores: BTreeMap<NutrientId, DailyNutrientScore> = BTreeMap::new();
        let mut nutrients_present: BTreeSet<NutrientId> = BTreeSet::new();

        for food in foods {
            let detections = self.strategy.extract(food).await;
            for detection in detections {
                let points = self.points_for(food, detection.nutrient);
                nutrients_present.insert(detection.nutrient);
                scores
                    .entry(detection.nutrient)
                    .or_insert_with(|| DailyNutrientScore::new(detection.nutrient, date))
                    .add_contribution(&food.name, points);
            }
        }

        for score in scores.values() {
            self.store.save_daily_score(user_id, score).await?;
        }

        let activity = DayNutrientActivity {
            date,
            nutrients_present,
            meal_count: u32::try_from(foods.len()).unwrap_or(u32::MAX),
        };
        self.store.save_day_activity(user_id, &activity).await?;

        let categories = self.categorize(foods);
        self.refresh_derived(user_id, date, &activity.nutrients_present, &categories)
            .await;

        debug!(%user_id, %date, nutrients = scores.len(), "Day rescan complete");
        Ok(scores.into_values().collect())
    }

    /// Reprocess a span of diary history, oldest day first.
    ///
    /// Checks the cancellation flag between days and stops cleanly when it
    /// is set. Returns the number of days fully processed.
    ///
    /// # Errors
    ///
    /// Returns an error when a day's rescan fails; days already processed
    /// stay written.
    pub async fn reprocess_history(
        &self,
        user_id: Uuid,
        history: &[(NaiveDate, Vec<LoggedFood>)],
        cancel: &AtomicBool,
    ) -> AppResult<u32> {
        let mut processed = 0;
        for (date, foods) in history {
            if cancel.load(Ordering::Relaxed) {
                debug!(%user_id, processed, "History reprocess cancelled");
                break;
            }
            self.rescan_day(user_id, *date, foods).await?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Apply a quantified nutrition profile for one food to one day.
    ///
    /// `amounts` are per single serving; `serving_size` scales them for the
    /// portion actually logged before conversion to points. Points are the
    /// percent of the recommended daily value each scaled amount covers,
    /// capped at 100. Nutrients without a configured daily value fall back
    /// to the flat per-food points.
    ///
    /// # Errors
    ///
    /// Returns an error when `serving_size` is not a positive finite number
    /// or when score documents cannot be read or written.
    pub async fn process_nutrient_profile(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        food: &LoggedFood,
        serving_size: f64,
        amounts: &BTreeMap<NutrientId, f64>,
    ) -> AppResult<()> {
        if !serving_size.is_finite() || serving_size <= 0.0 {
            return Err(AppError::invalid_input(format!(
                "serving size must be positive and finite, got {serving_size}"
            )));
        }
        let _gate = self.mutation_gate.lock().await;
        let existing = self.store.load_daily_scores(user_id, date, date).await?;
        let mut by_nutrient: BTreeMap<NutrientId, DailyNutrientScore> =
            existing.into_iter().map(|s| (s.nutrient, s)).collect();
        let mut touched: BTreeSet<NutrientId> = BTreeSet::new();

        for (nutrient, amount) in amounts {
            if !amount.is_finite() || *amount <= 0.0 {
                continue;
            }
            let points = self.quantified_points(*nutrient, *amount * serving_size);
            by_nutrient
                .entry(*nutrient)
                .or_insert_with(|| DailyNutrientScore::new(*nutrient, date))
                .add_contribution(&food.name, points);
            touched.insert(*nutrient);
        }

        for nutrient in &touched {
            if let Some(score) = by_nutrient.get(nutrient) {
                self.store.save_daily_score(user_id, score).await?;
            }
        }

        self.union_day_activity(user_id, date, &touched).await?;

        let categories = self.categorize(std::slice::from_ref(food));
        self.refresh_derived(user_id, date, &touched, &categories)
            .await;
        Ok(())
    }

    /// One day's balance score, from cache when fresh
    ///
    /// # Errors
    ///
    /// Returns an error when the backend read fails.
    pub async fn balance_score(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<NutrientBalanceScore>> {
        if let Some(cached) = self.balance_cache.get(&(user_id, date)) {
            return Ok(Some(cached));
        }
        let loaded = self.store.load_balance_score(user_id, date).await?;
        if let Some(score) = &loaded {
            self.balance_cache.put((user_id, date), score.clone());
        }
        Ok(loaded)
    }

    /// One nutrient's frequency rollup, from cache when fresh
    ///
    /// # Errors
    ///
    /// Returns an error when the backend read fails.
    pub async fn frequency(
        &self,
        user_id: Uuid,
        nutrient: NutrientId,
    ) -> AppResult<Option<NutrientFrequency>> {
        if let Some(cached) = self.frequency_cache.get(&(user_id, nutrient)) {
            return Ok(Some(cached));
        }
        let loaded = self.store.load_frequency(user_id, nutrient).await?;
        if let Some(frequency) = &loaded {
            self.frequency_cache
                .put((user_id, nutrient), frequency.clone());
        }
        Ok(loaded)
    }

    /// Assemble UI summaries for every nutrient with recent data.
    ///
    /// Top sources recorded as ultra-processed are dropped from the display,
    /// using the category the scan computed from each food's full ingredient
    /// list.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend read fails.
    pub async fn nutrient_summaries(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> AppResult<Vec<NutrientSummary>> {
        let trend_span = self.config.trend.recent_days + self.config.trend.baseline_days;
        let from = today
            .checked_sub_days(Days::new(trend_span.max(7) as u64 - 1))
            .unwrap_or(NaiveDate::MIN);
        let scores = self.store.load_daily_scores(user_id, from, today).await?;
        let frequencies = self.store.load_all_frequencies(user_id).await?;
        let by_nutrient: BTreeMap<NutrientId, NutrientFrequency> =
            frequencies.into_iter().map(|f| (f.nutrient, f)).collect();

        let mut active: BTreeSet<NutrientId> = scores.iter().map(|s| s.nutrient).collect();
        active.extend(by_nutrient.keys().copied());

        let mut summaries = Vec::with_capacity(active.len());
        for nutrient in active {
            let today_percentage = scores
                .iter()
                .find(|s| s.nutrient == nutrient && s.date == today)
                .map_or(0.0, DailyNutrientScore::coverage_percentage);
            let average = seven_day_average(nutrient, &scores, today);
            let series = coverage_series(nutrient, &scores, today, &self.config.trend);
            let (trend, change) = classify_trend(&series, &self.config.trend);

            let recent_sources = by_nutrient
                .get(&nutrient)
                .map(|f| Self::filter_displayable_sources(&f.top_food_sources))
                .unwrap_or_default();

            let today_status = CoverageStatus::from_percentage(today_percentage, &self.config.coverage);
            let seven_day_status = CoverageStatus::from_percentage(average, &self.config.coverage);

            summaries.push(NutrientSummary {
                nutrient,
                name: nutrient.display_name().to_owned(),
                today_percentage,
                today_status,
                seven_day_average: average,
                seven_day_status,
                trend,
                trend_percentage_change: change,
                recent_sources,
                info: info_text(nutrient.display_name(), seven_day_status, &self.config.coverage),
            });
        }
        Ok(summaries)
    }

    /// Fold newly touched nutrients into the day's activity record
    async fn union_day_activity(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        touched: &BTreeSet<NutrientId>,
    ) -> AppResult<()> {
        let mut activity = self
            .store
            .load_day_activities(user_id, date, date)
            .await?
            .into_iter()
            .next()
            .unwrap_or(DayNutrientActivity {
                date,
                nutrients_present: BTreeSet::new(),
                meal_count: 0,
            });
        activity.nutrients_present.extend(touched.iter().copied());
        activity.meal_count = activity.meal_count.saturating_add(1);
        self.store.save_day_activity(user_id, &activity).await
    }

    /// Recompute and persist the balance score and affected rollups.
    ///
    /// Failures here are logged and swallowed: the primary score documents
    /// are already written and the next rescan rebuilds everything derived.
    async fn refresh_derived(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        touched: &BTreeSet<NutrientId>,
        categories: &BTreeMap<String, FoodCategory>,
    ) {
        if let Err(e) = self.recompute_balance(user_id, date).await {
            warn!(%user_id, %date, error = %e, "Balance score recompute failed");
        }
        if let Err(e) = self
            .recompute_frequencies(user_id, date, touched, categories)
            .await
        {
            warn!(%user_id, %date, error = %e, "Frequency rollup recompute failed");
        }
        self.balance_cache.invalidate_all();
        self.frequency_cache.invalidate_all();
    }

    async fn recompute_balance(&self, user_id: Uuid, date: NaiveDate) -> AppResult<()> {
        let scores = self.store.load_daily_scores(user_id, date, date).await?;
        let mut balance = NutrientBalanceScore {
            date,
            total_nutrients_tracked: scores.len(),
            strong_count: 0,
            adequate_count: 0,
            low_count: 0,
            average_coverage: 0.0,
        };
        let mut total = 0.0;
        for score in &scores {
            let pct = score.coverage_percentage();
            total += pct;
            match CoverageStatus::from_percentage(pct, &self.config.coverage) {
                CoverageStatus::Strong => balance.strong_count += 1,
                CoverageStatus::Adequate => balance.adequate_count += 1,
                CoverageStatus::Low => balance.low_count += 1,
            }
        }
        if !scores.is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let count = scores.len() as f64;
            balance.average_coverage = total / count;
        }
        self.store.save_balance_score(user_id, &balance).await
    }

    async fn recompute_frequencies(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        touched: &BTreeSet<NutrientId>,
        day_categories: &BTreeMap<String, FoodCategory>,
    ) -> AppResult<()> {
        let from = date
            .checked_sub_days(Days::new(HISTORY_HORIZON_DAYS))
            .unwrap_or(NaiveDate::MIN);
        let activities = self.store.load_day_activities(user_id, from, date).await?;
        let scores = self.store.load_daily_scores(user_id, from, date).await?;

        // Rollups for nutrients the day no longer contains also need a
        // refresh: a deleted food may have ended a streak.
        let existing = self.store.load_all_frequencies(user_id).await?;
        let mut affected: BTreeSet<NutrientId> = touched.clone();
        affected.extend(existing.iter().map(|f| f.nutrient));

        // Categories already persisted on earlier rollups carry over, so a
        // food classified from its full ingredient list once stays classified
        // even when later scans only know its name. Today's scan wins ties.
        let mut known_categories: BTreeMap<String, FoodCategory> = existing
            .iter()
            .flat_map(|f| f.top_food_sources.iter())
            .map(|s| (s.food_name.clone(), s.category))
            .collect();
        known_categories.extend(
            day_categories
                .iter()
                .map(|(name, category)| (name.clone(), *category)),
        );

        for nutrient in affected {
            let previous = existing.iter().find(|f| f.nutrient == nutrient);
            let mut rollup =
                recompute_frequency(nutrient, previous, &activities, date, &self.config.streak);
            rollup.top_food_sources = build_top_sources(
                nutrient,
                &scores,
                date,
                &self.config.sources,
                &known_categories,
                &self.config.classifier,
            );
            self.store.save_frequency(user_id, &rollup).await?;
        }
        Ok(())
    }

    /// Classify each food from its full ingredient list, keyed by name
    fn categorize(&self, foods: &[LoggedFood]) -> BTreeMap<String, FoodCategory> {
        foods
            .iter()
            .map(|food| {
                let category = FoodCategoryClassifier::classify(
                    &food.name,
                    &food.ingredients,
                    &self.config.classifier,
                );
                (food.name.clone(), category)
            })
            .collect()
    }

    /// Drop sources recorded as ultra-processed from display lists
    fn filter_displayable_sources(sources: &[FoodSource]) -> Vec<FoodSource> {
        sources
            .iter()
            .filter(|s| s.category != FoodCategory::UltraProcessed)
            .cloned()
            .collect()
    }

    /// Points one detection of `nutrient` in `food` contributes.
    ///
    /// Quantified label values score as percent of the recommended daily
    /// value; unquantified detections score the flat per-food default.
    fn points_for(&self, food: &LoggedFood, nutrient: NutrientId) -> u32 {
        let quantified = food
            .nutrition_table
            .as_ref()
            .and_then(|table| table.get(&nutrient).copied())
            .filter(|amount| amount.is_finite() && *amount > 0.0);
        match quantified {
            Some(amount) => self.quantified_points(nutrient, amount),
            None => self.config.scoring.default_food_points,
        }
    }

    fn quantified_points(&self, nutrient: NutrientId, amount: f64) -> u32 {
        match self.config.scoring.daily_value(nutrient) {
            Some(rdv) if rdv > 0.0 => {
                let pct = (amount / rdv * 100.0).clamp(0.0, 100.0);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    pct.round() as u32
                }
            }
            _ => self.config.scoring.default_food_points,
        }
    }
}
