// ABOUTME: Tests for the aggregation engine write and read paths
// ABOUTME: Covers rescan idempotency, point capping, balance, and cancellation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use nutrient_intelligence::config::IntelligenceConfig;
use nutrient_intelligence::store::{InMemoryNutrientStore, NutrientStore};
use nutrient_intelligence::{AggregationEngine, ExtractionStrategy, LoggedFood, NutrientId};

mod common;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn engine() -> (AggregationEngine, Arc<InMemoryNutrientStore>) {
    common::init_test_logging();
    let store = Arc::new(InMemoryNutrientStore::new());
    let engine = AggregationEngine::new(
        store.clone(),
        ExtractionStrategy::offline(),
        IntelligenceConfig::default(),
    );
    (engine, store)
}

fn fortified_cereal() -> LoggedFood {
    LoggedFood {
        name: "Bran Flakes".to_owned(),
        brand: Some("Shopmark".to_owned()),
        ingredients: vec![
            "Wholewheat".to_owned(),
            "Niacin".to_owned(),
            "Iron".to_owned(),
            "Riboflavin".to_owned(),
        ],
        nutrition_table: None,
    }
}

#[tokio::test]
async fn test_rescan_writes_scores_and_activity() {
    let (engine, store) = engine();
    let user = Uuid::new_v4();
    let scores = engine
        .rescan_day(user, date(1), &[fortified_cereal()])
        .await
        .unwrap();
    assert!(scores.iter().any(|s| s.nutrient == NutrientId::Iron));
    assert!(scores.iter().any(|s| s.nutrient == NutrientId::VitaminB3));
    assert!(scores.iter().all(|s| s.total_points == 25));

    let activities = store
        .load_day_activities(user, date(1), date(1))
        .await
        .unwrap();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].meal_count, 1);
    assert!(activities[0].nutrients_present.contains(&NutrientId::Iron));
}

#[tokio::test]
async fn test_rescan_is_idempotent() {
    let (engine, store) = engine();
    let user = Uuid::new_v4();
    let foods = vec![fortified_cereal(), fortified_cereal()];

    let first = engine.rescan_day(user, date(1), &foods).await.unwrap();
    let second = engine.rescan_day(user, date(1), &foods).await.unwrap();
    assert_eq!(first, second);

    // Same food twice on one day contributes once to the sources set and
    // both times to points.
    let iron = second
        .iter()
        .find(|s| s.nutrient == NutrientId::Iron)
        .unwrap();
    assert_eq!(iron.total_points, 50);
    assert_eq!(iron.sources.len(), 1);

    let stored = store
        .load_daily_scores(user, date(1), date(1))
        .await
        .unwrap();
    assert_eq!(stored.len(), second.len());
}

#[tokio::test]
async fn test_daily_points_cap_at_one_hundred() {
    let (engine, _) = engine();
    let user = Uuid::new_v4();
    // Six iron sources at 25 points each would be 150 uncapped.
    let foods: Vec<LoggedFood> = (0..6)
        .map(|i| LoggedFood {
            name: format!("Iron Rich Meal {i}"),
            brand: None,
            ingredients: vec!["Ferrous Fumarate".to_owned()],
            nutrition_table: None,
        })
        .collect();
    let scores = engine.rescan_day(user, date(1), &foods).await.unwrap();
    let iron = scores
        .iter()
        .find(|s| s.nutrient == NutrientId::Iron)
        .unwrap();
    assert_eq!(iron.total_points, 100);
    assert_eq!(iron.sources.len(), 6);
}

#[tokio::test]
async fn test_quantified_amounts_score_as_percent_of_daily_value() {
    let (engine, _) = engine();
    let user = Uuid::new_v4();
    // Default vitamin C daily value is 90, so 45 is 50 points.
    let food = LoggedFood {
        name: "Orange Juice".to_owned(),
        brand: None,
        ingredients: vec!["Orange Juice".to_owned(), "Vitamin C".to_owned()],
        nutrition_table: Some(HashMap::from([(NutrientId::VitaminC, 45.0)])),
    };
    let scores = engine.rescan_day(user, date(1), &[food]).await.unwrap();
    let vit_c = scores
        .iter()
        .find(|s| s.nutrient == NutrientId::VitaminC)
        .unwrap();
    assert_eq!(vit_c.total_points, 50);
}

#[tokio::test]
async fn test_balance_score_buckets_by_coverage() {
    let (engine, _) = engine();
    let user = Uuid::new_v4();
    let mut amounts = BTreeMap::new();
    // 100% of vitamin C daily value, 50% of vitamin D, 10% of zinc.
    amounts.insert(NutrientId::VitaminC, 90.0);
    amounts.insert(NutrientId::VitaminD, 10.0);
    amounts.insert(NutrientId::Zinc, 1.1);
    let food = LoggedFood {
        name: "Multivitamin Smoothie Mix".to_owned(),
        brand: None,
        ingredients: Vec::new(),
        nutrition_table: None,
    };
    engine
        .process_nutrient_profile(user, date(1), &food, 1.0, &amounts)
        .await
        .unwrap();

    let balance = engine.balance_score(user, date(1)).await.unwrap().unwrap();
    assert_eq!(balance.total_nutrients_tracked, 3);
    assert_eq!(balance.strong_count, 1);
    assert_eq!(balance.adequate_count, 1);
    assert_eq!(balance.low_count, 1);
}

#[tokio::test]
async fn test_profile_amounts_scale_with_serving_size() {
    let (engine, store) = engine();
    let user = Uuid::new_v4();
    // 45 mg vitamin C per serving, half a serving eaten: 22.5 of the 90 mg
    // daily value is 25 points.
    let amounts = BTreeMap::from([(NutrientId::VitaminC, 45.0)]);
    let food = LoggedFood {
        name: "Orange Juice".to_owned(),
        brand: None,
        ingredients: Vec::new(),
        nutrition_table: None,
    };
    engine
        .process_nutrient_profile(user, date(1), &food, 0.5, &amounts)
        .await
        .unwrap();

    let scores = store
        .load_daily_scores(user, date(1), date(1))
        .await
        .unwrap();
    let vit_c = scores
        .iter()
        .find(|s| s.nutrient == NutrientId::VitaminC)
        .unwrap();
    assert_eq!(vit_c.total_points, 25);
}

#[tokio::test]
async fn test_profile_rejects_non_positive_serving_size() {
    let (engine, store) = engine();
    let user = Uuid::new_v4();
    let amounts = BTreeMap::from([(NutrientId::VitaminC, 45.0)]);
    let food = LoggedFood {
        name: "Orange Juice".to_owned(),
        brand: None,
        ingredients: Vec::new(),
        nutrition_table: None,
    };
    for serving_size in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let result = engine
            .process_nutrient_profile(user, date(1), &food, serving_size, &amounts)
            .await;
        assert!(result.is_err());
    }
    let scores = store
        .load_daily_scores(user, date(1), date(1))
        .await
        .unwrap();
    assert!(scores.is_empty());
}

#[tokio::test]
async fn test_reprocess_history_honors_cancellation() {
    let (engine, store) = engine();
    let user = Uuid::new_v4();
    let history: Vec<(NaiveDate, Vec<LoggedFood>)> =
        (1..=5).map(|d| (date(d), vec![fortified_cereal()])).collect();

    let cancel = AtomicBool::new(true);
    let processed = engine
        .reprocess_history(user, &history, &cancel)
        .await
        .unwrap();
    assert_eq!(processed, 0);

    cancel.store(false, Ordering::Relaxed);
    let processed = engine
        .reprocess_history(user, &history, &cancel)
        .await
        .unwrap();
    assert_eq!(processed, 5);
    let activities = store
        .load_day_activities(user, date(1), date(5))
        .await
        .unwrap();
    assert_eq!(activities.len(), 5);
}

#[tokio::test]
async fn test_upsert_food_detection_accumulates() {
    let (engine, store) = engine();
    let user = Uuid::new_v4();
    let validator = nutrient_intelligence::MicronutrientValidator::default();
    let food = fortified_cereal();
    let detections = validator.validate(&food.name, &food.ingredients, None);
    assert!(!detections.is_empty());

    engine
        .upsert_food_detection(user, date(1), &food, &detections)
        .await
        .unwrap();
    engine
        .upsert_food_detection(user, date(1), &food, &detections)
        .await
        .unwrap();

    // Two upserts of the same food: points accumulate, one appearance day.
    let scores = store
        .load_daily_scores(user, date(1), date(1))
        .await
        .unwrap();
    let iron = scores
        .iter()
        .find(|s| s.nutrient == NutrientId::Iron)
        .unwrap();
    assert_eq!(iron.total_points, 50);

    let frequency = engine
        .frequency(user, NutrientId::Iron)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frequency.last_30_days_appearances, 1);

    let activities = store
        .load_day_activities(user, date(1), date(1))
        .await
        .unwrap();
    assert_eq!(activities[0].meal_count, 2);
}

#[tokio::test]
async fn test_record_day_event_updates_rollup_without_scores() {
    let (engine, store) = engine();
    let user = Uuid::new_v4();
    let nutrients = [NutrientId::VitaminC, NutrientId::Iron]
        .into_iter()
        .collect();
    engine
        .record_day_event(user, date(1), nutrients, 3)
        .await
        .unwrap();

    let frequency = engine
        .frequency(user, NutrientId::VitaminC)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frequency.total_logged_days, 1);
    assert_eq!(frequency.current_streak, 1);

    let scores = store
        .load_daily_scores(user, date(1), date(1))
        .await
        .unwrap();
    assert!(scores.is_empty());
}

#[tokio::test]
async fn test_summaries_filter_ultra_processed_sources() {
    let (engine, _) = engine();
    let user = Uuid::new_v4();
    // A fortified chocolate bar is scored (declared fortification counts)
    // but must not appear as a displayed source.
    let bar = LoggedFood {
        name: "Chocolate Bar Max".to_owned(),
        brand: None,
        ingredients: vec!["Sugar".to_owned(), "Iron".to_owned()],
        nutrition_table: None,
    };
    engine
        .rescan_day(user, date(1), &[fortified_cereal(), bar])
        .await
        .unwrap();

    let summaries = engine.nutrient_summaries(user, date(1)).await.unwrap();
    let iron = summaries
        .iter()
        .find(|s| s.nutrient == NutrientId::Iron)
        .unwrap();
    assert!(iron
        .recent_sources
        .iter()
        .any(|s| s.food_name == "Bran Flakes"));
    assert!(iron
        .recent_sources
        .iter()
        .all(|s| s.food_name != "Chocolate Bar Max"));
    assert!(iron.today_percentage > 0.0);
}

#[tokio::test]
async fn test_summaries_filter_marker_classified_sources() {
    let (engine, _) = engine();
    let user = Uuid::new_v4();
    // Nothing in this name flags it; only the ingredient markers recorded at
    // scan time classify it ultra-processed.
    let chew_mix = LoggedFood {
        name: "Fruit Chew Mix".to_owned(),
        brand: None,
        ingredients: vec![
            "Glucose Syrup".to_owned(),
            "Maltodextrin".to_owned(),
            "Emulsifier".to_owned(),
            "Iron".to_owned(),
        ],
        nutrition_table: None,
    };
    engine
        .rescan_day(user, date(1), &[fortified_cereal(), chew_mix])
        .await
        .unwrap();

    let summaries = engine.nutrient_summaries(user, date(1)).await.unwrap();
    let iron = summaries
        .iter()
        .find(|s| s.nutrient == NutrientId::Iron)
        .unwrap();
    assert!(iron
        .recent_sources
        .iter()
        .any(|s| s.food_name == "Bran Flakes"));
    assert!(iron
        .recent_sources
        .iter()
        .all(|s| s.food_name != "Fruit Chew Mix"));
}
