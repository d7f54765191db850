// ABOUTME: Deterministic fallback parser for ingredient text when remote
// ABOUTME: classification is unavailable; pattern-only, no category gating
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! # Deterministic Pattern Parser
//!
//! The offline fallback path. Splits raw ingredient text into comma-separated
//! phrases and tests each phrase against the fortification pattern table.
//! Unlike the validator it applies no food-category gate and no
//! primary-source inference; it produces fixed-confidence detections from
//! declared fortification alone, so a network outage degrades recall but
//! never precision.

use tracing::debug;

use crate::models::{NutrientId, StrengthTier};
use crate::patterns::compiled_fortification_patterns;

/// Confidence attached to every deterministic detection. The parser has no
/// probabilistic model; declared fortification either matches or it does not.
pub const DETERMINISTIC_CONFIDENCE: f64 = 0.95;

/// One nutrient detection produced by the deterministic parser
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNutrient {
    /// Detected nutrient
    pub nutrient: NutrientId,
    /// Strength of the strongest matching pattern
    pub strength: StrengthTier,
    /// Fixed parser confidence
    pub confidence: f64,
    /// Ingredient phrase the match came from
    pub matched_phrase: String,
}

/// Deterministic, network-free ingredient text parser
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicPatternParser;

impl DeterministicPatternParser {
    /// Parse raw ingredient text into nutrient detections.
    ///
    /// Text is split on commas into phrases. Each phrase is matched
    /// independently so evidence reports the specific phrase, not the whole
    /// label. Duplicate nutrients are collapsed keeping the strongest tier.
    #[must_use]
    pub fn parse(&self, ingredient_text: &str) -> Vec<ParsedNutrient> {
        let lowered = ingredient_text.to_lowercase();
        let mut results: Vec<ParsedNutrient> = Vec::new();

        for phrase in lowered.split(',') {
            let phrase = phrase.trim();
            if phrase.is_empty() {
                continue;
            }
            for (regex, entry) in compiled_fortification_patterns() {
                if entry.requires_explicit_context {
                    // Context-gated patterns need the full nutrient name in
                    // the same text; per-phrase splitting would lose it, so
                    // check the complete lowered string.
                    match entry.nutrient.explicit_context_phrase() {
                        Some(ctx) if lowered.contains(ctx) => {}
                        _ => continue,
                    }
                }
                if !regex.is_match(phrase) {
                    continue;
                }
                match results.iter_mut().find(|r| r.nutrient == entry.nutrient) {
                    Some(existing) => {
                        if entry.strength > existing.strength {
                            existing.strength = entry.strength;
                            existing.matched_phrase = phrase.to_owned();
                        }
                    }
                    None => results.push(ParsedNutrient {
                        nutrient: entry.nutrient,
                        strength: entry.strength,
                        confidence: DETERMINISTIC_CONFIDENCE,
                        matched_phrase: phrase.to_owned(),
                    }),
                }
            }
        }

        debug!(
            detections = results.len(),
            "Deterministic parse complete"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strongest_tier_wins_on_duplicate() {
        let parser = DeterministicPatternParser;
        let results = parser.parse("vitamin c, ascorbic acid");
        let vit_c: Vec<_> = results
            .iter()
            .filter(|r| r.nutrient == NutrientId::VitaminC)
            .collect();
        assert_eq!(vit_c.len(), 1);
        assert_eq!(vit_c[0].strength, StrengthTier::Strong);
    }

    #[test]
    fn test_context_gate_applies_across_phrases() {
        let parser = DeterministicPatternParser;
        // Ascorbic acid alone is an antioxidant, not fortification.
        assert!(parser.parse("water, ascorbic acid").is_empty());
        // Naming the vitamin anywhere in the text unlocks it.
        let results = parser.parse("water, ascorbic acid (vitamin c)");
        assert!(results.iter().any(|r| r.nutrient == NutrientId::VitaminC));
    }

    #[test]
    fn test_fixed_confidence() {
        let parser = DeterministicPatternParser;
        let results = parser.parse("ferrous sulphate, niacin, riboflavin");
        assert!(!results.is_empty());
        assert!(results
            .iter()
            .all(|r| (r.confidence - DETERMINISTIC_CONFIDENCE).abs() < f64::EPSILON));
    }
}
