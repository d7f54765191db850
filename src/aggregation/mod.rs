// ABOUTME: Aggregation subsystem: daily scoring, frequency rollups, summaries
// ABOUTME: Engine orchestration over pure frequency and trend math
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! # Aggregation
//!
//! Turns per-food nutrient detections into per-day scores, long-lived
//! frequency rollups, and UI summaries. The engine owns orchestration and
//! persistence; the `frequency` and `summary` modules hold the pure math so
//! it stays testable without a store.

pub mod engine;
pub mod frequency;
pub mod summary;

pub use engine::AggregationEngine;
pub use frequency::{best_streak, build_top_sources, current_streak, recompute_frequency};
pub use summary::{classify_trend, coverage_series, seven_day_average};
