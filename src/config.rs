// ABOUTME: Tunable configuration for classification, coverage, trends, and caching
// ABOUTME: Named overridable constants with documented defaults and a process-wide global
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! # Intelligence Configuration
//!
//! All magic numbers of the detection and aggregation pipeline live here as
//! named, overridable fields. Thresholds that are product decisions rather
//! than algorithmic necessities (marker counts, coverage cut points, trend
//! sensitivity) carry their defaults in the field docs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::errors::{AppError, AppResult};
use crate::models::NutrientId;

static INTELLIGENCE_CONFIG: OnceLock<IntelligenceConfig> = OnceLock::new();

/// Top-level configuration for the nutrient intelligence engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntelligenceConfig {
    /// Food category classification thresholds
    pub classifier: ClassifierConfig,
    /// Coverage status cut points
    pub coverage: CoverageConfig,
    /// Trend classification windows and sensitivity
    pub trend: TrendConfig,
    /// Top-food-source list bounds
    pub sources: SourceListConfig,
    /// Read-cache freshness window
    pub cache: CacheFreshnessConfig,
    /// Streak computation policy
    pub streak: StreakConfig,
    /// Per-food scoring defaults and recommended daily values
    pub scoring: ScoringConfig,
}

impl IntelligenceConfig {
    /// Process-wide shared configuration with defaults
    pub fn global() -> &'static Self {
        INTELLIGENCE_CONFIG.get_or_init(Self::default)
    }

    /// Validate all sections
    ///
    /// # Errors
    ///
    /// Returns `AppError::config` if any section holds an out-of-range value
    pub fn validate(&self) -> AppResult<()> {
        self.classifier.validate()?;
        self.coverage.validate()?;
        self.trend.validate()?;
        self.sources.validate()?;
        self.scoring.validate()?;
        Ok(())
    }
}

/// Food category classification thresholds
///
/// Both thresholds are deliberate product choices preserved as named
/// configuration rather than inlined literals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Distinct ultra-processed ingredient markers required before a food is
    /// classified ultra-processed by marker count alone. Default: 3 (exactly
    /// 2 markers must not classify, to avoid over-flagging moderately
    /// processed foods).
    pub ultra_processed_marker_threshold: usize,
    /// Maximum ingredient-list length for the whole-food heuristic. Default: 3.
    pub whole_food_max_ingredients: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            ultra_processed_marker_threshold: 3,
            whole_food_max_ingredients: 3,
        }
    }
}

impl ClassifierConfig {
    /// Validate thresholds are usable
    ///
    /// # Errors
    ///
    /// Returns `AppError::config` if a threshold is zero
    pub fn validate(&self) -> AppResult<()> {
        if self.ultra_processed_marker_threshold == 0 {
            return Err(AppError::config(
                "ultra_processed_marker_threshold must be at least 1",
            ));
        }
        if self.whole_food_max_ingredients == 0 {
            return Err(AppError::config(
                "whole_food_max_ingredients must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Coverage status cut points, bucketing percent-of-daily-value
///
/// The aggregator reads these but does not own them; product tuning happens
/// here, not in the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// Percentages below this are `Low`. Default: 25.0
    pub low_below: f64,
    /// Percentages at or above this are `Strong`. Default: 67.0
    pub strong_at_or_above: f64,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            low_below: 25.0,
            strong_at_or_above: 67.0,
        }
    }
}

impl CoverageConfig {
    /// Validate the cut points form a proper ordering
    ///
    /// # Errors
    ///
    /// Returns `AppError::config` if the cut points are out of range or inverted
    pub fn validate(&self) -> AppResult<()> {
        if !(0.0..=100.0).contains(&self.low_below)
            || !(0.0..=100.0).contains(&self.strong_at_or_above)
        {
            return Err(AppError::config("coverage cut points must be 0-100"));
        }
        if self.low_below >= self.strong_at_or_above {
            return Err(AppError::config(
                "low_below must be less than strong_at_or_above",
            ));
        }
        Ok(())
    }
}

/// Trend classification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Days in the recent window. Default: 3
    pub recent_days: usize,
    /// Days in the preceding baseline window. Default: 4
    pub baseline_days: usize,
    /// Signed percentage change that tips the 3-way classification.
    /// Default: 10.0
    pub change_threshold_percent: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            recent_days: 3,
            baseline_days: 4,
            change_threshold_percent: 10.0,
        }
    }
}

impl TrendConfig {
    /// Validate window sizes
    ///
    /// # Errors
    ///
    /// Returns `AppError::config` if either window is empty
    pub fn validate(&self) -> AppResult<()> {
        if self.recent_days == 0 || self.baseline_days == 0 {
            return Err(AppError::config("trend windows must be non-empty"));
        }
        Ok(())
    }
}

/// Bounds on the per-nutrient top-food-sources list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceListConfig {
    /// Maximum entries kept per nutrient. Default: 50
    pub max_entries: usize,
    /// Entries whose last contribution is older than this many days are
    /// pruned on each recompute. Default: 60
    pub retention_days: i64,
}

impl Default for SourceListConfig {
    fn default() -> Self {
        Self {
            max_entries: 50,
            retention_days: 60,
        }
    }
}

impl SourceListConfig {
    /// Validate bounds
    ///
    /// # Errors
    ///
    /// Returns `AppError::config` if the bounds are degenerate
    pub fn validate(&self) -> AppResult<()> {
        if self.max_entries == 0 {
            return Err(AppError::config("max_entries must be at least 1"));
        }
        if self.retention_days <= 0 {
            return Err(AppError::config("retention_days must be positive"));
        }
        Ok(())
    }
}

/// Read-cache freshness window in front of remote loads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFreshnessConfig {
    /// Whole cache is stale after this many seconds, or after any write.
    /// Default: 300 (5 minutes)
    pub freshness_secs: u64,
}

impl Default for CacheFreshnessConfig {
    fn default() -> Self {
        Self { freshness_secs: 300 }
    }
}

/// How streak computation treats days with no diary activity at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnloggedDayPolicy {
    /// A calendar day with no logged foods breaks the streak
    BreaksStreak,
    /// Unlogged days are skipped; only a logged day without the nutrient
    /// breaks the streak
    SkipsUnloggedDays,
}

/// Streak computation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Treatment of unlogged days. Default: `SkipsUnloggedDays` (a missed
    /// diary day should not silently erase an otherwise consistent streak)
    pub unlogged_day_policy: UnloggedDayPolicy,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            unlogged_day_policy: UnloggedDayPolicy::SkipsUnloggedDays,
        }
    }
}

/// Per-food scoring defaults and recommended daily values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Points one unquantified confirmed detection contributes to a
    /// nutrient-day. Default: 25 (four varied sources reach full coverage)
    pub default_food_points: u32,
    /// Recommended daily value per nutrient, in the same unit the caller
    /// supplies quantified amounts in. Defaults follow NIH adult reference
    /// values (mg for macrominerals, µg for trace vitamins).
    pub recommended_daily_values: HashMap<NutrientId, f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let recommended_daily_values = HashMap::from([
            (NutrientId::VitaminA, 900.0),   // µg RAE
            (NutrientId::VitaminB1, 1.2),    // mg
            (NutrientId::VitaminB2, 1.3),    // mg
            (NutrientId::VitaminB3, 16.0),   // mg NE
            (NutrientId::VitaminB5, 5.0),    // mg
            (NutrientId::VitaminB6, 1.7),    // mg
            (NutrientId::VitaminB7, 30.0),   // µg
            (NutrientId::Folate, 400.0),     // µg DFE
            (NutrientId::VitaminB12, 2.4),   // µg
            (NutrientId::VitaminC, 90.0),    // mg
            (NutrientId::VitaminD, 20.0),    // µg
            (NutrientId::VitaminE, 15.0),    // mg
            (NutrientId::VitaminK, 120.0),   // µg
            (NutrientId::Calcium, 1000.0),   // mg
            (NutrientId::Iron, 18.0),        // mg
            (NutrientId::Magnesium, 420.0),  // mg
            (NutrientId::Zinc, 11.0),        // mg
            (NutrientId::Iodine, 150.0),     // µg
            (NutrientId::Potassium, 3400.0), // mg
            (NutrientId::Selenium, 55.0),    // µg
            (NutrientId::Omega3, 1600.0),    // mg
        ]);
        Self {
            default_food_points: 25,
            recommended_daily_values,
        }
    }
}

impl ScoringConfig {
    /// Validate scoring values
    ///
    /// # Errors
    ///
    /// Returns `AppError::config` if any daily value is non-positive
    pub fn validate(&self) -> AppResult<()> {
        if self.default_food_points == 0 {
            return Err(AppError::config("default_food_points must be positive"));
        }
        for (nutrient, value) in &self.recommended_daily_values {
            if *value <= 0.0 || !value.is_finite() {
                return Err(AppError::config(format!(
                    "recommended daily value for {nutrient} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Recommended daily value for a nutrient, when configured
    #[must_use]
    pub fn daily_value(&self, nutrient: NutrientId) -> Option<f64> {
        self.recommended_daily_values.get(&nutrient).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        IntelligenceConfig::default().validate().unwrap();
    }

    #[test]
    fn test_global_is_stable() {
        let a = IntelligenceConfig::global();
        let b = IntelligenceConfig::global();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_inverted_coverage_rejected() {
        let config = CoverageConfig {
            low_below: 80.0,
            strong_at_or_above: 50.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_all_nutrients_have_daily_values() {
        let scoring = ScoringConfig::default();
        for nutrient in NutrientId::ALL {
            assert!(scoring.daily_value(nutrient).is_some(), "{nutrient}");
        }
    }
}
