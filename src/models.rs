// ABOUTME: Core domain types for micronutrient detection and frequency analytics
// ABOUTME: Nutrient identities, confidence tiers, daily scores, and rollup records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! # Domain Models
//!
//! Nutrient identity is a closed enumeration rather than a string-keyed
//! dictionary, giving compile-time exhaustiveness on every category and status
//! switch. The stable snake_case ids (`vitamin_c`, `iron`, ...) are the
//! persistence keys the remote store schema uses.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::config::CoverageConfig;
use crate::errors::AppError;

// ============================================================================
// Nutrient Identity
// ============================================================================

/// Closed enumeration of tracked micronutrients
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum NutrientId {
    /// Vitamin A (retinol, carotenoids)
    VitaminA,
    /// Vitamin B1 (thiamin)
    VitaminB1,
    /// Vitamin B2 (riboflavin)
    VitaminB2,
    /// Vitamin B3 (niacin)
    VitaminB3,
    /// Vitamin B5 (pantothenic acid)
    VitaminB5,
    /// Vitamin B6 (pyridoxine)
    VitaminB6,
    /// Vitamin B7 (biotin)
    VitaminB7,
    /// Folate (vitamin B9)
    Folate,
    /// Vitamin B12 (cobalamin)
    VitaminB12,
    /// Vitamin C (ascorbic acid)
    VitaminC,
    /// Vitamin D (cholecalciferol)
    VitaminD,
    /// Vitamin E (tocopherols)
    VitaminE,
    /// Vitamin K (phylloquinone)
    VitaminK,
    /// Calcium
    Calcium,
    /// Iron
    Iron,
    /// Magnesium
    Magnesium,
    /// Zinc
    Zinc,
    /// Iodine
    Iodine,
    /// Potassium
    Potassium,
    /// Selenium
    Selenium,
    /// Omega-3 fatty acids (EPA/DHA/ALA)
    Omega3,
}

impl NutrientId {
    /// Static registry of all tracked nutrients
    pub const ALL: [Self; 21] = [
        Self::VitaminA,
        Self::VitaminB1,
        Self::VitaminB2,
        Self::VitaminB3,
        Self::VitaminB5,
        Self::VitaminB6,
        Self::VitaminB7,
        Self::Folate,
        Self::VitaminB12,
        Self::VitaminC,
        Self::VitaminD,
        Self::VitaminE,
        Self::VitaminK,
        Self::Calcium,
        Self::Iron,
        Self::Magnesium,
        Self::Zinc,
        Self::Iodine,
        Self::Potassium,
        Self::Selenium,
        Self::Omega3,
    ];

    /// Stable snake_case identifier used as the persistence key
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VitaminA => "vitamin_a",
            Self::VitaminB1 => "vitamin_b1",
            Self::VitaminB2 => "vitamin_b2",
            Self::VitaminB3 => "vitamin_b3",
            Self::VitaminB5 => "vitamin_b5",
            Self::VitaminB6 => "vitamin_b6",
            Self::VitaminB7 => "vitamin_b7",
            Self::Folate => "folate",
            Self::VitaminB12 => "vitamin_b12",
            Self::VitaminC => "vitamin_c",
            Self::VitaminD => "vitamin_d",
            Self::VitaminE => "vitamin_e",
            Self::VitaminK => "vitamin_k",
            Self::Calcium => "calcium",
            Self::Iron => "iron",
            Self::Magnesium => "magnesium",
            Self::Zinc => "zinc",
            Self::Iodine => "iodine",
            Self::Potassium => "potassium",
            Self::Selenium => "selenium",
            Self::Omega3 => "omega_3",
        }
    }

    /// Human-readable display name
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::VitaminA => "Vitamin A",
            Self::VitaminB1 => "Vitamin B1 (Thiamin)",
            Self::VitaminB2 => "Vitamin B2 (Riboflavin)",
            Self::VitaminB3 => "Vitamin B3 (Niacin)",
            Self::VitaminB5 => "Vitamin B5 (Pantothenic Acid)",
            Self::VitaminB6 => "Vitamin B6",
            Self::VitaminB7 => "Vitamin B7 (Biotin)",
            Self::Folate => "Folate",
            Self::VitaminB12 => "Vitamin B12",
            Self::VitaminC => "Vitamin C",
            Self::VitaminD => "Vitamin D",
            Self::VitaminE => "Vitamin E",
            Self::VitaminK => "Vitamin K",
            Self::Calcium => "Calcium",
            Self::Iron => "Iron",
            Self::Magnesium => "Magnesium",
            Self::Zinc => "Zinc",
            Self::Iodine => "Iodine",
            Self::Potassium => "Potassium",
            Self::Selenium => "Selenium",
            Self::Omega3 => "Omega-3",
        }
    }

    /// Literal phrase that must appear in ingredient text for context-gated
    /// patterns of this nutrient to count (antioxidant-use exclusion).
    ///
    /// Only vitamin C (ascorbic acid / E300) and vitamin E (tocopherols) carry
    /// an explicit-context requirement; both are routinely added as
    /// antioxidants rather than as nutrient fortification.
    #[must_use]
    pub const fn explicit_context_phrase(&self) -> Option<&'static str> {
        match self {
            Self::VitaminC => Some("vitamin c"),
            Self::VitaminE => Some("vitamin e"),
            _ => None,
        }
    }
}

impl fmt::Display for NutrientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NutrientId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|n| n.as_str() == s)
            .copied()
            .ok_or_else(|| AppError::invalid_format(format!("unknown nutrient id: {s}")))
    }
}

impl From<NutrientId> for String {
    fn from(id: NutrientId) -> Self {
        id.as_str().to_owned()
    }
}

impl TryFrom<String> for NutrientId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Detection Types
// ============================================================================

/// Regex strength classification for a fortification pattern match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthTier {
    /// Weak textual evidence
    Trace,
    /// Reasonable textual evidence
    Moderate,
    /// Unambiguous textual evidence
    Strong,
}

/// A single entry of the static fortification pattern library
#[derive(Debug, Clone, Copy)]
pub struct NutrientPattern {
    /// Case-insensitive regex source for the textual token
    pub pattern: &'static str,
    /// Canonical nutrient the token maps to
    pub nutrient: NutrientId,
    /// Evidence strength of a match
    pub strength: StrengthTier,
    /// When true, a match only counts if the nutrient's explicit context
    /// phrase also appears in the ingredient text (antioxidant exclusion)
    pub requires_explicit_context: bool,
}

/// Confidence tier assigned to a detected nutrient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    /// High-trust evidence, shown to end users
    Confirmed,
    /// Whole-food inference, computed for tuning only and never surfaced
    NaturalPrimarySource,
    /// Default state, not reported
    NotDetected,
}

impl ConfidenceTier {
    /// Whether this tier is trusted enough to show to an end user.
    ///
    /// Only `Confirmed` passes; the natural-primary-source tier is
    /// deliberately held back (prefer false negatives over false positives).
    #[must_use]
    pub const fn should_surface(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// Evidence source backing a validated nutrient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    /// Quantified value on a nutrition label
    NutritionTable,
    /// Explicit fortification declaration in the ingredient list
    DeclaredFortification,
    /// Food dominantly composed of a known natural source
    WholeFoodPrimarySource,
}

/// Result of one validation call for one nutrient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedMicronutrient {
    /// Detected nutrient
    pub nutrient: NutrientId,
    /// Assigned confidence tier
    pub tier: ConfidenceTier,
    /// Evidence source
    pub source: DetectionSource,
    /// Text fragment the detection is based on
    pub evidence: String,
}

/// Food category computed per lookup; not persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    /// Single-ingredient or near-single-ingredient natural food
    WholeFood,
    /// Food with declared added vitamins/minerals
    FortifiedFood,
    /// Confectionery, snacks, fast food; excluded from natural inference
    UltraProcessed,
    /// Everything else
    StandardProcessed,
}

// ============================================================================
// Aggregation Records
// ============================================================================

/// Per-(nutrient, day) accumulated score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyNutrientScore {
    /// Nutrient this score belongs to
    pub nutrient: NutrientId,
    /// Calendar day
    pub date: NaiveDate,
    /// Accumulated points; capped at 100 when read as a percentage
    pub total_points: u32,
    /// Food names that contributed on this day
    pub sources: BTreeSet<String>,
}

impl DailyNutrientScore {
    /// Create an empty score for a (nutrient, day) pair
    #[must_use]
    pub const fn new(nutrient: NutrientId, date: NaiveDate) -> Self {
        Self {
            nutrient,
            date,
            total_points: 0,
            sources: BTreeSet::new(),
        }
    }

    /// Remote-store document key: `{nutrient}:{date}`
    #[must_use]
    pub fn document_key(&self) -> String {
        format!("{}:{}", self.nutrient.as_str(), self.date)
    }

    /// Add a food's contribution, capping accumulated points at 100
    pub fn add_contribution(&mut self, food_name: &str, points: u32) {
        self.total_points = self.total_points.saturating_add(points).min(100);
        self.sources.insert(food_name.to_owned());
    }

    /// Points read as a coverage percentage (0-100)
    #[must_use]
    pub fn coverage_percentage(&self) -> f64 {
        f64::from(self.total_points.min(100))
    }
}

/// Coverage status bucket for a nutrient-day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    /// Below the low cut point
    Low,
    /// Between the cut points
    Adequate,
    /// At or above the strong cut point
    Strong,
}

impl CoverageStatus {
    /// Bucket a percent-of-daily-value using configured cut points
    #[must_use]
    pub fn from_percentage(pct: f64, config: &CoverageConfig) -> Self {
        if pct >= config.strong_at_or_above {
            Self::Strong
        } else if pct < config.low_below {
            Self::Low
        } else {
            Self::Adequate
        }
    }
}

/// Per-day aggregate across all tracked nutrients; recomputed, never appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientBalanceScore {
    /// Calendar day
    pub date: NaiveDate,
    /// Number of nutrients with an entry on this day
    pub total_nutrients_tracked: usize,
    /// Nutrients in the strong bucket
    pub strong_count: usize,
    /// Nutrients in the adequate bucket
    pub adequate_count: usize,
    /// Nutrients in the low bucket
    pub low_count: usize,
    /// Mean coverage percentage across nutrients present
    pub average_coverage: f64,
}

/// One food's attribution entry in a nutrient's top-sources list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodSource {
    /// Food name
    pub food_name: String,
    /// Brand, when known
    pub brand: Option<String>,
    /// Times this food contributed the nutrient
    pub times_consumed: u32,
    /// Most recent contribution
    pub last_consumed: DateTime<Utc>,
    /// Category computed from the full ingredient list when the food was
    /// scanned; the display gate reads this instead of reclassifying from
    /// the name alone
    pub category: FoodCategory,
}

/// Per-month consistency snapshot nested under a frequency rollup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySnapshot {
    /// Calendar year
    pub year: i32,
    /// Calendar month (1-12)
    pub month: u32,
    /// Days that month where the nutrient was present
    pub days_present: u32,
    /// Days that month with any diary activity
    pub days_logged: u32,
}

/// Per-year consistency snapshot nested under a frequency rollup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlySnapshot {
    /// Calendar year
    pub year: i32,
    /// Days that year where the nutrient was present
    pub days_present: u32,
    /// Days that year with any diary activity
    pub days_logged: u32,
}

/// Long-lived per-nutrient rollup, persisted remotely and cached locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientFrequency {
    /// Nutrient this rollup belongs to
    pub nutrient: NutrientId,
    /// Display name, denormalized for the UI layer
    pub nutrient_name: String,
    /// Days in the rolling 30-day window where the nutrient appeared
    pub last_30_days_appearances: u32,
    /// Total diary days where the nutrient appeared, all time
    pub total_logged_days: u32,
    /// Current consecutive-day streak
    pub current_streak: u32,
    /// Best streak ever observed; never less than `current_streak`
    pub best_streak: u32,
    /// Most recent day the nutrient appeared
    pub last_appearance: Option<NaiveDate>,
    /// Bounded top contributing foods, most-frequent-then-most-recent order
    pub top_food_sources: Vec<FoodSource>,
    /// Per-month consistency snapshots
    pub monthly_snapshots: Vec<MonthlySnapshot>,
    /// Per-year consistency snapshots
    pub yearly_snapshots: Vec<YearlySnapshot>,
}

impl NutrientFrequency {
    /// Create an empty rollup for a nutrient
    #[must_use]
    pub fn empty(nutrient: NutrientId) -> Self {
        Self {
            nutrient,
            nutrient_name: nutrient.display_name().to_owned(),
            last_30_days_appearances: 0,
            total_logged_days: 0,
            current_streak: 0,
            best_streak: 0,
            last_appearance: None,
            top_food_sources: Vec::new(),
            monthly_snapshots: Vec::new(),
            yearly_snapshots: Vec::new(),
        }
    }
}

/// Per-day nutrient activity; fully recomputed whenever the day changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayNutrientActivity {
    /// Calendar day
    pub date: NaiveDate,
    /// Nutrients detected across the day's logged foods
    pub nutrients_present: BTreeSet<NutrientId>,
    /// Number of meals logged that day
    pub meal_count: u32,
}

// ============================================================================
// Summary Output
// ============================================================================

/// Trend classification over the recent week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// Recent mean above baseline by more than the threshold
    Improving,
    /// Within the threshold either way
    Stable,
    /// Recent mean below baseline by more than the threshold
    Declining,
}

/// UI-facing per-nutrient summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientSummary {
    /// Nutrient id
    pub nutrient: NutrientId,
    /// Display name
    pub name: String,
    /// Today's coverage percentage
    pub today_percentage: f64,
    /// Today's status bucket
    pub today_status: CoverageStatus,
    /// Mean coverage over the last 7 days
    pub seven_day_average: f64,
    /// Status bucket of the 7-day average
    pub seven_day_status: CoverageStatus,
    /// Trend classification
    pub trend: TrendDirection,
    /// Signed percentage change driving the trend
    pub trend_percentage_change: f64,
    /// Recent contributing foods, re-filtered through the category gate
    pub recent_sources: Vec<FoodSource>,
    /// Short informational text for the UI
    pub info: String,
}

/// A logged diary food, the unit the aggregation engine rescans
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedFood {
    /// Food name as logged
    pub name: String,
    /// Brand, when known
    pub brand: Option<String>,
    /// Ordered ingredient list
    pub ingredients: Vec<String>,
    /// Quantified nutrition-label values, when available
    pub nutrition_table: Option<std::collections::HashMap<NutrientId, f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nutrient_id_round_trip() {
        for nutrient in NutrientId::ALL {
            let parsed: NutrientId = nutrient.as_str().parse().unwrap();
            assert_eq!(parsed, nutrient);
        }
    }

    #[test]
    fn test_nutrient_id_unknown_string() {
        assert!("vitamin_q".parse::<NutrientId>().is_err());
    }

    #[test]
    fn test_daily_score_cap() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut score = DailyNutrientScore::new(NutrientId::Iron, date);
        score.add_contribution("Lentil Soup", 60);
        score.add_contribution("Beef Stew", 70);
        assert_eq!(score.total_points, 100);
        assert_eq!(score.sources.len(), 2);
    }

    #[test]
    fn test_document_key_shape() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let score = DailyNutrientScore::new(NutrientId::VitaminC, date);
        assert_eq!(score.document_key(), "vitamin_c:2025-06-01");
    }

    #[test]
    fn test_only_confirmed_surfaces() {
        assert!(ConfidenceTier::Confirmed.should_surface());
        assert!(!ConfidenceTier::NaturalPrimarySource.should_surface());
        assert!(!ConfidenceTier::NotDetected.should_surface());
    }

    #[test]
    fn test_strength_tier_ordering() {
        assert!(StrengthTier::Strong > StrengthTier::Moderate);
        assert!(StrengthTier::Moderate > StrengthTier::Trace);
    }
}
