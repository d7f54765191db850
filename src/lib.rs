// ABOUTME: Evidence-tiered micronutrient extraction and aggregation engine
// ABOUTME: Library crate joining detection, scoring, rollups, and summaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

#![deny(unsafe_code)]

//! # Nutrient Intelligence
//!
//! Evidence-tiered micronutrient detection over logged foods, plus the
//! aggregation layer that turns per-food detections into daily coverage
//! scores, consistency rollups, and UI summaries.
//!
//! The detection side prefers false negatives over false positives: a
//! nutrient surfaces only with `Confirmed` evidence, meaning a quantified
//! nutrition-table value or an explicit fortification declaration in the
//! ingredient list. Whole-food inference runs for tuning but is never shown.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **models**: Nutrient ids, tiers, scores, rollups, and summary types
//! - **config**: Tunable thresholds behind a process-wide default
//! - **patterns**: Fortification regex tables and curated keyword lists
//! - **classifier**: Four-way food category classification
//! - **validator**: Evidence-tiered micronutrient validation
//! - **parser**: Deterministic offline fallback parser
//! - **extractor**: Remote-first extraction strategy with fallback
//! - **cache**: Freshness cache for derived snapshots
//! - **store**: Persistence seam plus an in-memory implementation
//! - **aggregation**: Daily scoring, frequency rollups, and summaries

/// Unified error handling with standard error codes
pub mod errors;

/// Core data models (nutrients, tiers, scores, rollups, summaries)
pub mod models;

/// Tunable thresholds and recommended daily values
pub mod config;

/// Fortification pattern tables and curated keyword lists
pub mod patterns;

/// Food category classification (whole food through ultra-processed)
pub mod classifier;

/// Evidence-tiered micronutrient validation
pub mod validator;

/// Deterministic ingredient text parser
pub mod parser;

/// Extraction strategy over remote classification with local fallback
pub mod extractor;

/// Freshness cache for derived aggregation snapshots
pub mod cache;

/// Persistence seam for scores, rollups, and day activity
pub mod store;

/// Daily scoring, frequency rollups, and UI summaries
pub mod aggregation;

pub use aggregation::AggregationEngine;
pub use classifier::FoodCategoryClassifier;
pub use config::IntelligenceConfig;
pub use errors::{AppError, AppResult, ErrorCode};
pub use extractor::{ExtractionStrategy, NutrientExtractor, RemoteFoodClassifier};
pub use models::{
    ConfidenceTier, DailyNutrientScore, FoodCategory, LoggedFood, NutrientFrequency, NutrientId,
    NutrientSummary, TrendDirection, ValidatedMicronutrient,
};
pub use parser::DeterministicPatternParser;
pub use store::{InMemoryNutrientStore, NutrientStore};
pub use validator::MicronutrientValidator;
