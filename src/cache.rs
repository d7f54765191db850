// ABOUTME: Freshness cache for derived aggregation snapshots
// ABOUTME: Single-slot TTL cache invalidated wholesale on any data write
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! # Freshness Cache
//!
//! Frequency and balance snapshots are cheap to serve but not free to
//! rebuild. This cache holds the last computed value per key for a short
//! freshness window. Correctness rule: any write to the underlying data
//! invalidates everything, so the cache can serve stale data only within the
//! freshness window, never across a write.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;
use tracing::debug;

use crate::config::CacheFreshnessConfig;

struct CachedEntry<T> {
    value: T,
    computed_at: DateTime<Utc>,
}

/// TTL cache for derived snapshots, keyed by caller-chosen key
pub struct FreshnessCache<K, T> {
    entries: RwLock<HashMap<K, CachedEntry<T>>>,
    ttl: Duration,
}

impl<K, T> FreshnessCache<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    /// Create a cache with the configured freshness window
    #[must_use]
    pub fn new(config: &CacheFreshnessConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(i64::try_from(config.freshness_secs).unwrap_or(i64::MAX)),
        }
    }

    /// Fetch a value if present and still fresh
    #[must_use]
    pub fn get(&self, key: &K) -> Option<T> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        if Utc::now() - entry.computed_at > self.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Store a freshly computed value
    pub fn put(&self, key: K, value: T) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key,
                CachedEntry {
                    value,
                    computed_at: Utc::now(),
                },
            );
        }
    }

    /// Drop every cached entry. Called after any write to underlying data.
    pub fn invalidate_all(&self) {
        if let Ok(mut entries) = self.entries.write() {
            let dropped = entries.len();
            entries.clear();
            if dropped > 0 {
                debug!(dropped, "Freshness cache invalidated");
            }
        }
    }

    /// Number of live entries, fresh or stale
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the cache holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
