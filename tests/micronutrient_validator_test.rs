// ABOUTME: Tests for evidence-tiered micronutrient validation
// ABOUTME: Covers confectionery rejection, fortification, and antioxidant exclusions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::collections::HashMap;

use nutrient_intelligence::models::{ConfidenceTier, DetectionSource};
use nutrient_intelligence::{MicronutrientValidator, NutrientId};

fn ingredients(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn test_chocolate_confectionery_yields_no_nutrients() {
    let validator = MicronutrientValidator::default();
    let results = validator.validate(
        "Revels",
        &ingredients(&[
            "Sugar",
            "Glucose Syrup",
            "Cocoa Butter",
            "Cocoa Mass",
            "Skimmed Milk Powder",
            "Lactose",
            "Vegetable Fats",
            "Raisins",
            "Coffee",
            "Emulsifier (Soya Lecithin)",
            "Glazing Agents",
        ]),
        None,
    );
    assert!(
        results.is_empty(),
        "confectionery must not surface nutrients: {results:?}"
    );
}

#[test]
fn test_fortified_cereal_surfaces_declared_nutrients() {
    let validator = MicronutrientValidator::default();
    let results = validator.validate(
        "Bran Flakes",
        &ingredients(&[
            "Wholewheat",
            "Wheat Bran",
            "Sugar",
            "Niacin",
            "Iron",
            "Riboflavin",
            "Thiamin",
            "Folic Acid",
            "Vitamin B6",
            "Vitamin B12",
            "Vitamin D",
        ]),
        None,
    );
    let nutrients: Vec<NutrientId> = results.iter().map(|r| r.nutrient).collect();
    assert!(nutrients.len() >= 7, "expected at least seven nutrients: {nutrients:?}");
    for expected in [
        NutrientId::VitaminB3,
        NutrientId::Iron,
        NutrientId::VitaminB2,
        NutrientId::VitaminB1,
        NutrientId::Folate,
        NutrientId::VitaminB6,
        NutrientId::VitaminB12,
        NutrientId::VitaminD,
    ] {
        assert!(nutrients.contains(&expected), "missing {expected:?}");
    }
    assert!(results
        .iter()
        .all(|r| r.tier == ConfidenceTier::Confirmed
            && r.source == DetectionSource::DeclaredFortification));
}

#[test]
fn test_ascorbic_acid_alone_is_not_vitamin_c() {
    let validator = MicronutrientValidator::default();
    let results = validator.validate(
        "Apple Juice",
        &ingredients(&["Apple Juice from Concentrate", "Antioxidant: Ascorbic Acid"]),
        None,
    );
    assert!(results
        .iter()
        .all(|r| r.nutrient != NutrientId::VitaminC));
}

#[test]
fn test_ascorbic_acid_with_explicit_name_counts() {
    let validator = MicronutrientValidator::default();
    let results = validator.validate(
        "Blackcurrant Squash",
        &ingredients(&["Water", "Blackcurrant Juice", "Ascorbic Acid (Vitamin C)"]),
        None,
    );
    assert!(results
        .iter()
        .any(|r| r.nutrient == NutrientId::VitaminC && r.tier == ConfidenceTier::Confirmed));
}

#[test]
fn test_tocopherols_alone_are_not_vitamin_e() {
    let validator = MicronutrientValidator::default();
    let results = validator.validate(
        "Sunflower Spread",
        &ingredients(&["Vegetable Oils", "Water", "Antioxidant: Tocopherols"]),
        None,
    );
    assert!(results
        .iter()
        .all(|r| r.nutrient != NutrientId::VitaminE));
}

#[test]
fn test_nutrition_table_wins_even_for_ultra_processed_food() {
    let validator = MicronutrientValidator::default();
    let table = HashMap::from([(NutrientId::Calcium, 120.0), (NutrientId::VitaminD, 1.5)]);
    let results = validator.validate(
        "Milk Chocolate Bar",
        &ingredients(&["Sugar", "Cocoa Butter", "Cocoa Mass", "Milk Powder", "Emulsifier"]),
        Some(&table),
    );
    assert!(results
        .iter()
        .any(|r| r.nutrient == NutrientId::Calcium
            && r.source == DetectionSource::NutritionTable));
    assert!(results
        .iter()
        .any(|r| r.nutrient == NutrientId::VitaminD));
}

#[test]
fn test_non_positive_table_values_ignored() {
    let validator = MicronutrientValidator::default();
    let table = HashMap::from([
        (NutrientId::Zinc, 0.0),
        (NutrientId::Iron, -3.0),
        (NutrientId::Selenium, f64::NAN),
    ]);
    let results = validator.validate("Plain Yogurt", &ingredients(&["Milk"]), Some(&table));
    assert!(results
        .iter()
        .all(|r| r.source != DetectionSource::NutritionTable));
}

#[test]
fn test_whole_food_inference_never_surfaces() {
    let validator = MicronutrientValidator::default();
    let surfaced = validator.validate("Banana", &ingredients(&["Banana"]), None);
    assert!(surfaced.is_empty());

    let all = validator.validate_all_tiers("Banana", &ingredients(&["Banana"]), None);
    assert!(all
        .iter()
        .any(|r| r.nutrient == NutrientId::Potassium
            && r.tier == ConfidenceTier::NaturalPrimarySource));
}

#[test]
fn test_ultra_processed_gate_blocks_whole_food_inference() {
    let validator = MicronutrientValidator::default();
    // Name keyword marks this ultra-processed despite a fruit ingredient.
    let all = validator.validate_all_tiers(
        "Strawberry Milkshake",
        &ingredients(&["Strawberry", "Milk", "Sugar", "Stabiliser"]),
        None,
    );
    assert!(all
        .iter()
        .all(|r| r.source != DetectionSource::WholeFoodPrimarySource));
}

#[test]
fn test_b1_pattern_does_not_match_b12() {
    let validator = MicronutrientValidator::default();
    let results = validator.validate(
        "Oat Drink",
        &ingredients(&["Oats", "Water", "Vitamin B12"]),
        None,
    );
    assert!(results.iter().any(|r| r.nutrient == NutrientId::VitaminB12));
    assert!(results.iter().all(|r| r.nutrient != NutrientId::VitaminB1));
}
