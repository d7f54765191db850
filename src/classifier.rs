// ABOUTME: Categorical food classification into whole/fortified/ultra-processed buckets
// ABOUTME: Keyword tables plus ingredient-list shape heuristics, thresholds from config
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! # Food Category Classifier
//!
//! Classifies a food into one of four categories from its name and ingredient
//! list. Rules run in strict priority order; the ultra-processed checks come
//! first because that category gates natural-ingredient nutrient inference
//! downstream.

use crate::config::ClassifierConfig;
use crate::models::FoodCategory;
use crate::patterns::{
    FORTIFICATION_DECLARATIONS, ULTRA_PROCESSED_KEYWORDS, ULTRA_PROCESSED_MARKERS,
};

/// Stateless food category classifier
pub struct FoodCategoryClassifier;

impl FoodCategoryClassifier {
    /// Classify a food from its name and ordered ingredient list.
    ///
    /// Priority order:
    /// 1. Ultra-processed name keyword -> `UltraProcessed`
    /// 2. At least `ultra_processed_marker_threshold` distinct marker
    ///    ingredients -> `UltraProcessed`
    /// 3. Fortification declaration present -> `FortifiedFood`
    /// 4. Short ingredient list whose first ingredient overlaps the food
    ///    name -> `WholeFood`
    /// 5. Otherwise `StandardProcessed`
    #[must_use]
    pub fn classify(
        food_name: &str,
        ingredients: &[String],
        config: &ClassifierConfig,
    ) -> FoodCategory {
        let name = food_name.to_lowercase();

        if ULTRA_PROCESSED_KEYWORDS.iter().any(|kw| name.contains(kw)) {
            return FoodCategory::UltraProcessed;
        }

        let joined = ingredients.join(", ").to_lowercase();

        if Self::distinct_marker_count(&joined) >= config.ultra_processed_marker_threshold {
            return FoodCategory::UltraProcessed;
        }

        if FORTIFICATION_DECLARATIONS
            .iter()
            .any(|marker| joined.contains(marker))
        {
            return FoodCategory::FortifiedFood;
        }

        if ingredients.len() <= config.whole_food_max_ingredients
            && Self::name_overlaps_first_ingredient(&name, ingredients)
        {
            return FoodCategory::WholeFood;
        }

        FoodCategory::StandardProcessed
    }

    /// Count distinct ultra-processed markers present in the joined text
    #[must_use]
    pub fn distinct_marker_count(joined_ingredients: &str) -> usize {
        ULTRA_PROCESSED_MARKERS
            .iter()
            .filter(|marker| joined_ingredients.contains(*marker))
            .count()
    }

    /// Substring overlap in either direction between the food name and the
    /// first ingredient
    fn name_overlaps_first_ingredient(name: &str, ingredients: &[String]) -> bool {
        let Some(first) = ingredients.first() else {
            // No ingredient list at all: a bare name like "Banana" is the
            // whole-food case (single foods are often logged without one).
            return !name.is_empty();
        };
        let first = first.trim().to_lowercase();
        if first.is_empty() {
            return false;
        }
        name.contains(&first) || first.contains(name)
    }
}
