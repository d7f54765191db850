// ABOUTME: Evidence-tiered micronutrient validation from ingredient and label data
// ABOUTME: Nutrition-table, fortification, and whole-food paths in strict priority order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! # Evidence-Tiered Micronutrient Validator
//!
//! The central decision engine. Given a food name, ingredient list, and
//! optional quantified nutrition-table values, produces the set of nutrients
//! the food is judged to contain, each tagged with a confidence tier. Only
//! `Confirmed`-tier results reach callers: the governing rule of this
//! subsystem is to prefer false negatives over false positives.
//!
//! Priority order (earlier matches block later lower-confidence inference of
//! the same nutrient):
//! 1. Positive nutrition-table value — unconditional, wins even for
//!    ultra-processed foods.
//! 2. Explicit fortification declaration in the ingredient text, with the
//!    ascorbic-acid and tocopherol antioxidant exclusions.
//! 3. Whole-food primary-source inference, gated off entirely for
//!    ultra-processed foods and never surfaced (tuning telemetry only).

use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::classifier::FoodCategoryClassifier;
use crate::config::IntelligenceConfig;
use crate::models::{
    ConfidenceTier, DetectionSource, FoodCategory, NutrientId, ValidatedMicronutrient,
};
use crate::patterns::{compiled_fortification_patterns, primary_sources_for, TRIVIAL_INGREDIENTS};

/// Evidence-tiered micronutrient validator
pub struct MicronutrientValidator {
    config: IntelligenceConfig,
}

impl Default for MicronutrientValidator {
    fn default() -> Self {
        Self::new(IntelligenceConfig::global().clone())
    }
}

impl MicronutrientValidator {
    /// Create a validator with an explicit configuration
    #[must_use]
    pub const fn new(config: IntelligenceConfig) -> Self {
        Self { config }
    }

    /// Validate a food and return only surfaceable (`Confirmed`) nutrients,
    /// deduplicated by nutrient id.
    #[must_use]
    pub fn validate(
        &self,
        food_name: &str,
        ingredients: &[String],
        nutrition_table: Option<&HashMap<NutrientId, f64>>,
    ) -> Vec<ValidatedMicronutrient> {
        self.validate_all_tiers(food_name, ingredients, nutrition_table)
            .into_iter()
            .filter(|v| v.tier.should_surface())
            .collect()
    }

    /// Validate a food and return every computed tier, including the
    /// natural-primary-source detections that are never shown to users.
    /// Exists for tuning and telemetry.
    #[must_use]
    pub fn validate_all_tiers(
        &self,
        food_name: &str,
        ingredients: &[String],
        nutrition_table: Option<&HashMap<NutrientId, f64>>,
    ) -> Vec<ValidatedMicronutrient> {
        // BTreeMap keyed by nutrient: dedup plus stable output order.
        let mut detections: BTreeMap<NutrientId, ValidatedMicronutrient> = BTreeMap::new();

        // Priority 1: quantified nutrition-table values.
        if let Some(table) = nutrition_table {
            for (nutrient, value) in table {
                if !value.is_finite() || *value <= 0.0 {
                    // Malformed or absent entries are skipped, not errors.
                    debug!(nutrient = %nutrient, value, "Skipping non-positive nutrition-table entry");
                    continue;
                }
                detections.insert(
                    *nutrient,
                    ValidatedMicronutrient {
                        nutrient: *nutrient,
                        tier: ConfidenceTier::Confirmed,
                        source: DetectionSource::NutritionTable,
                        evidence: format!("nutrition label: {value}"),
                    },
                );
            }
        }

        // Priority 2: fortification declarations in the ingredient text.
        let joined = ingredients.join(", ").to_lowercase();
        for (nutrient, evidence) in Self::scan_fortification(&joined) {
            detections
                .entry(nutrient)
                .or_insert_with(|| ValidatedMicronutrient {
                    nutrient,
                    tier: ConfidenceTier::Confirmed,
                    source: DetectionSource::DeclaredFortification,
                    evidence,
                });
        }

        // Priority 3: whole-food primary-source inference. Gated off for
        // ultra-processed foods; results are never surfaced.
        let category = FoodCategoryClassifier::classify(food_name, ingredients, &self.config.classifier);
        if category != FoodCategory::UltraProcessed {
            for (nutrient, evidence) in Self::scan_primary_sources(food_name, ingredients) {
                detections
                    .entry(nutrient)
                    .or_insert_with(|| ValidatedMicronutrient {
                        nutrient,
                        tier: ConfidenceTier::NaturalPrimarySource,
                        source: DetectionSource::WholeFoodPrimarySource,
                        evidence,
                    });
            }
        }

        detections.into_values().collect()
    }

    /// Scan the joined lowercase ingredient text against the fortification
    /// pattern table. Pure CPU; patterns are tested in parallel.
    fn scan_fortification(joined: &str) -> Vec<(NutrientId, String)> {
        let mut hits: Vec<(NutrientId, String)> = compiled_fortification_patterns()
            .par_iter()
            .filter_map(|(regex, entry)| {
                let matched = regex.find(joined)?;
                if entry.requires_explicit_context {
                    // Antioxidant exclusion: ascorbic acid / tocopherols only
                    // count when the nutrient is also named outright.
                    let phrase = entry.nutrient.explicit_context_phrase()?;
                    if !joined.contains(phrase) {
                        return None;
                    }
                }
                Some((entry.nutrient, matched.as_str().to_owned()))
            })
            .collect();

        // Parallel collection order is nondeterministic; sort for stable
        // first-evidence-wins dedup downstream.
        hits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        hits
    }

    /// Match the food name or dominant ingredient against the curated
    /// primary-source lists.
    fn scan_primary_sources(food_name: &str, ingredients: &[String]) -> Vec<(NutrientId, String)> {
        let name = food_name.to_lowercase();

        // Dominant ingredient: the first, or first and second when the list
        // has exactly two entries.
        let dominant: Vec<String> = match ingredients {
            [] => Vec::new(),
            [first, second] => vec![first.to_lowercase(), second.to_lowercase()],
            [first, ..] => vec![first.to_lowercase()],
        };

        let qualifying: Vec<&String> = dominant
            .iter()
            .filter(|ing| {
                let trimmed = ing.trim();
                !TRIVIAL_INGREDIENTS
                    .iter()
                    .any(|trivial| trimmed == *trivial)
            })
            .collect();

        let mut hits = Vec::new();
        for nutrient in NutrientId::ALL {
            let Some(sources) = primary_sources_for(nutrient) else {
                continue;
            };
            let matched = sources.iter().find(|keyword| {
                name.contains(*keyword) || qualifying.iter().any(|ing| ing.contains(*keyword))
            });
            if let Some(keyword) = matched {
                hits.push((nutrient, format!("primary source: {keyword}")));
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredients(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_trivial_first_ingredient_never_qualifies() {
        let validator = MicronutrientValidator::default();
        // "Orange Drink" with water dominant: the name still matches orange,
        // but water alone must not.
        let all = validator.validate_all_tiers(
            "Still Drink",
            &ingredients(&["Water", "Flavouring", "Sweetener"]),
            None,
        );
        assert!(all
            .iter()
            .all(|v| v.source != DetectionSource::WholeFoodPrimarySource));
    }

    #[test]
    fn test_primary_source_never_surfaced() {
        let validator = MicronutrientValidator::default();
        let all = validator.validate_all_tiers("Orange", &ingredients(&["Orange"]), None);
        assert!(all
            .iter()
            .any(|v| v.tier == ConfidenceTier::NaturalPrimarySource
                && v.nutrient == NutrientId::VitaminC));

        let surfaced = validator.validate("Orange", &ingredients(&["Orange"]), None);
        assert!(surfaced.is_empty());
    }

    #[test]
    fn test_two_ingredient_dominance() {
        let validator = MicronutrientValidator::default();
        // Exactly two ingredients: both are dominant, so the second may match.
        let all = validator.validate_all_tiers(
            "Fruit Pot",
            &ingredients(&["Apple", "Banana"]),
            None,
        );
        assert!(all
            .iter()
            .any(|v| v.nutrient == NutrientId::Potassium
                && v.tier == ConfidenceTier::NaturalPrimarySource));
    }
}
