// ABOUTME: Persistence seam for scores, rollups, and day activity
// ABOUTME: Async trait plus an in-memory implementation for tests and tools
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! # Nutrient Store
//!
//! The aggregation engine computes; the store persists. Backends live behind
//! `NutrientStore` so the engine never knows whether it is talking to a
//! remote document database or the in-memory map used by tests. Document
//! keys mirror the remote layout: daily scores under `{nutrient}:{date}`,
//! one frequency rollup per nutrient, one activity record per day.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{
    DailyNutrientScore, DayNutrientActivity, NutrientBalanceScore, NutrientFrequency, NutrientId,
};

/// Persistence backend for aggregation output
#[async_trait]
pub trait NutrientStore: Send + Sync {
    /// Upsert one daily score document
    ///
    /// # Errors
    ///
    /// Returns an error when the backend write fails.
    async fn save_daily_score(&self, user_id: Uuid, score: &DailyNutrientScore) -> AppResult<()>;

    /// Load every daily score in the inclusive date range
    ///
    /// # Errors
    ///
    /// Returns an error when the backend read fails.
    async fn load_daily_scores(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<DailyNutrientScore>>;

    /// Delete all daily score documents for one day
    ///
    /// # Errors
    ///
    /// Returns an error when the backend write fails.
    async fn delete_daily_scores_for_date(&self, user_id: Uuid, date: NaiveDate) -> AppResult<()>;

    /// Upsert one day's balance score
    ///
    /// # Errors
    ///
    /// Returns an error when the backend write fails.
    async fn save_balance_score(&self, user_id: Uuid, score: &NutrientBalanceScore)
        -> AppResult<()>;

    /// Load one day's balance score, if computed
    ///
    /// # Errors
    ///
    /// Returns an error when the backend read fails.
    async fn load_balance_score(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<NutrientBalanceScore>>;

    /// Upsert one nutrient's frequency rollup
    ///
    /// # Errors
    ///
    /// Returns an error when the backend write fails.
    async fn save_frequency(&self, user_id: Uuid, frequency: &NutrientFrequency) -> AppResult<()>;

    /// Load one nutrient's frequency rollup, if present
    ///
    /// # Errors
    ///
    /// Returns an error when the backend read fails.
    async fn load_frequency(
        &self,
        user_id: Uuid,
        nutrient: NutrientId,
    ) -> AppResult<Option<NutrientFrequency>>;

    /// Load every frequency rollup for a user
    ///
    /// # Errors
    ///
    /// Returns an error when the backend read fails.
    async fn load_all_frequencies(&self, user_id: Uuid) -> AppResult<Vec<NutrientFrequency>>;

    /// Upsert one day's activity record
    ///
    /// # Errors
    ///
    /// Returns an error when the backend write fails.
    async fn save_day_activity(&self, user_id: Uuid, activity: &DayNutrientActivity)
        -> AppResult<()>;

    /// Load the day activity records in the inclusive date range
    ///
    /// # Errors
    ///
    /// Returns an error when the backend read fails.
    async fn load_day_activities(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<DayNutrientActivity>>;
}

#[derive(Default)]
struct UserRecords {
    daily_scores: HashMap<String, DailyNutrientScore>,
    balance_scores: HashMap<NaiveDate, NutrientBalanceScore>,
    frequencies: HashMap<NutrientId, NutrientFrequency>,
    day_activities: HashMap<NaiveDate, DayNutrientActivity>,
}

/// In-memory store used by tests and offline tooling
#[derive(Default)]
pub struct InMemoryNutrientStore {
    users: RwLock<HashMap<Uuid, UserRecords>>,
}

impl InMemoryNutrientStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_user<R>(
        &self,
        user_id: Uuid,
        f: impl FnOnce(&UserRecords) -> R,
    ) -> AppResult<R> {
        let users = self
            .users
            .read()
            .map_err(|_| AppError::storage("store lock poisoned"))?;
        Ok(f(users.get(&user_id).unwrap_or(&UserRecords::default())))
    }

    fn with_user_mut<R>(
        &self,
        user_id: Uuid,
        f: impl FnOnce(&mut UserRecords) -> R,
    ) -> AppResult<R> {
        let mut users = self
            .users
            .write()
            .map_err(|_| AppError::storage("store lock poisoned"))?;
        Ok(f(users.entry(user_id).or_default()))
    }
}

#[async_trait]
impl NutrientStore for InMemoryNutrientStore {
    async fn save_daily_score(&self, user_id: Uuid, score: &DailyNutrientScore) -> AppResult<()> {
        self.with_user_mut(user_id, |records| {
            records
                .daily_scores
                .insert(score.document_key(), score.clone());
        })
    }

    async fn load_daily_scores(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<DailyNutrientScore>> {
        self.with_user(user_id, |records| {
            records
                .daily_scores
                .values()
                .filter(|s| s.date >= from && s.date <= to)
                .cloned()
                .collect()
        })
    }

    async fn delete_daily_scores_for_date(&self, user_id: Uuid, date: NaiveDate) -> AppResult<()> {
        self.with_user_mut(user_id, |records| {
            records.daily_scores.retain(|_, s| s.date != date);
        })
    }

    async fn save_balance_score(
        &self,
        user_id: Uuid,
        score: &NutrientBalanceScore,
    ) -> AppResult<()> {
        self.with_user_mut(user_id, |records| {
            records.balance_scores.insert(score.date, score.clone());
        })
    }

    async fn load_balance_score(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<NutrientBalanceScore>> {
        self.with_user(user_id, |records| records.balance_scores.get(&date).cloned())
    }

    async fn save_frequency(&self, user_id: Uuid, frequency: &NutrientFrequency) -> AppResult<()> {
        self.with_user_mut(user_id, |records| {
            records
                .frequencies
                .insert(frequency.nutrient, frequency.clone());
        })
    }

    async fn load_frequency(
        &self,
        user_id: Uuid,
        nutrient: NutrientId,
    ) -> AppResult<Option<NutrientFrequency>> {
        self.with_user(user_id, |records| records.frequencies.get(&nutrient).cloned())
    }

    async fn load_all_frequencies(&self, user_id: Uuid) -> AppResult<Vec<NutrientFrequency>> {
        self.with_user(user_id, |records| {
            let mut all: Vec<NutrientFrequency> = records.frequencies.values().cloned().collect();
            all.sort_by_key(|f| f.nutrient);
            all
        })
    }

    async fn save_day_activity(
        &self,
        user_id: Uuid,
        activity: &DayNutrientActivity,
    ) -> AppResult<()> {
        self.with_user_mut(user_id, |records| {
            records.day_activities.insert(activity.date, activity.clone());
        })
    }

    async fn load_day_activities(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<DayNutrientActivity>> {
        self.with_user(user_id, |records| {
            let mut days: Vec<DayNutrientActivity> = records
                .day_activities
                .values()
                .filter(|d| d.date >= from && d.date <= to)
                .cloned()
                .collect();
            days.sort_by_key(|d| d.date);
            days
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_daily_score_upsert_by_document_key() {
        let store = InMemoryNutrientStore::new();
        let user = Uuid::new_v4();
        let mut score = DailyNutrientScore::new(NutrientId::Iron, date(2025, 6, 1));
        score.add_contribution("Lentil Soup", 25);
        store.save_daily_score(user, &score).await.unwrap();

        score.add_contribution("Spinach Salad", 25);
        store.save_daily_score(user, &score).await.unwrap();

        let loaded = store
            .load_daily_scores(user, date(2025, 6, 1), date(2025, 6, 1))
            .await
            .unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].total_points, 50);
    }

    #[tokio::test]
    async fn test_delete_daily_scores_for_date() {
        let store = InMemoryNutrientStore::new();
        let user = Uuid::new_v4();
        for nutrient in [NutrientId::Iron, NutrientId::Zinc] {
            let score = DailyNutrientScore::new(nutrient, date(2025, 6, 1));
            store.save_daily_score(user, &score).await.unwrap();
        }
        store
            .delete_daily_scores_for_date(user, date(2025, 6, 1))
            .await
            .unwrap();
        let loaded = store
            .load_daily_scores(user, date(2025, 6, 1), date(2025, 6, 1))
            .await
            .unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_day_activities_sorted_by_date() {
        let store = InMemoryNutrientStore::new();
        let user = Uuid::new_v4();
        for d in [3, 1, 2] {
            let activity = DayNutrientActivity {
                date: date(2025, 6, d),
                nutrients_present: BTreeSet::from([NutrientId::VitaminC]),
                meal_count: 1,
            };
            store.save_day_activity(user, &activity).await.unwrap();
        }
        let days = store
            .load_day_activities(user, date(2025, 6, 1), date(2025, 6, 3))
            .await
            .unwrap();
        let dates: Vec<u32> = days.iter().map(|d| chrono::Datelike::day(&d.date)).collect();
        assert_eq!(dates, vec![1, 2, 3]);
    }
}
