// ABOUTME: Extraction seam joining the remote classifier path and the
// ABOUTME: deterministic fallback parser behind one strategy type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! # Extraction Strategy
//!
//! Foods arrive from two directions: a remote classification service that
//! returns structured nutrition data, and raw label text scanned on device.
//! `ExtractionStrategy` owns the fallback chain: try the remote path, and on
//! any error degrade to the deterministic parser. Outputs from the two paths
//! are never mixed within a single food.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::AppResult;
use crate::models::{
    ConfidenceTier, DetectionSource, LoggedFood, NutrientId, ValidatedMicronutrient,
};
use crate::parser::DeterministicPatternParser;
use crate::validator::MicronutrientValidator;

/// Anything that can turn a logged food into tiered nutrient detections
pub trait NutrientExtractor {
    /// Extract surfaceable nutrient detections from a logged food
    fn extract(&self, food: &LoggedFood) -> Vec<ValidatedMicronutrient>;
}

impl NutrientExtractor for MicronutrientValidator {
    fn extract(&self, food: &LoggedFood) -> Vec<ValidatedMicronutrient> {
        self.validate(&food.name, &food.ingredients, food.nutrition_table.as_ref())
    }
}

impl NutrientExtractor for DeterministicPatternParser {
    fn extract(&self, food: &LoggedFood) -> Vec<ValidatedMicronutrient> {
        self.parse(&food.ingredients.join(", "))
            .into_iter()
            .map(|parsed| ValidatedMicronutrient {
                nutrient: parsed.nutrient,
                tier: ConfidenceTier::Confirmed,
                source: DetectionSource::DeclaredFortification,
                evidence: parsed.matched_phrase,
            })
            .collect()
    }
}

/// Remote food classification service seam.
///
/// Implementations call out to a product database or ML classifier and
/// return quantified per-nutrient values, typically richer than anything
/// derivable from label text alone.
#[async_trait]
pub trait RemoteFoodClassifier: Send + Sync {
    /// Classify a food by name and brand, returning quantified nutrient
    /// values when the service recognizes it.
    ///
    /// # Errors
    ///
    /// Returns an error when the service is unreachable, rate-limited, or
    /// returns an unparseable response. Callers treat any error as a signal
    /// to fall back to deterministic parsing.
    async fn classify(
        &self,
        food_name: &str,
        brand: Option<&str>,
    ) -> AppResult<HashMap<NutrientId, f64>>;
}

/// Remote-first extraction with deterministic fallback
pub struct ExtractionStrategy {
    classifier: Option<Arc<dyn RemoteFoodClassifier>>,
    validator: MicronutrientValidator,
    parser: DeterministicPatternParser,
}

impl ExtractionStrategy {
    /// Build a strategy backed by a remote classifier
    #[must_use]
    pub fn new(classifier: Arc<dyn RemoteFoodClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
            validator: MicronutrientValidator::default(),
            parser: DeterministicPatternParser,
        }
    }

    /// Build a strategy with no remote path; every food goes through the
    /// deterministic parser.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            classifier: None,
            validator: MicronutrientValidator::default(),
            parser: DeterministicPatternParser,
        }
    }

    /// Extract nutrient detections for a food, preferring the remote path.
    ///
    /// When the remote classifier succeeds, its quantified values are merged
    /// into the food's nutrition table and run through the full validator.
    /// On any remote error the deterministic parser runs instead; the two
    /// result sets are never combined.
    pub async fn extract(&self, food: &LoggedFood) -> Vec<ValidatedMicronutrient> {
        if let Some(classifier) = &self.classifier {
            match classifier.classify(&food.name, food.brand.as_deref()).await {
                Ok(table) => {
                    debug!(food = %food.name, nutrients = table.len(), "Remote classification succeeded");
                    let mut merged = food.nutrition_table.clone().unwrap_or_default();
                    for (nutrient, value) in table {
                        merged.entry(nutrient).or_insert(value);
                    }
                    return self
                        .validator
                        .validate(&food.name, &food.ingredients, Some(&merged));
                }
                Err(e) => {
                    warn!(food = %food.name, error = %e, "Remote classification failed, using deterministic parser");
                }
            }
        }
        self.parser.extract(food)
    }
}
