//! Resolution metrics and observability module.
//!
//! This module tracks how the resolution cache is used: cache hits and
//! misses, loader invocations, and load failures.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one resolution cache.
#[derive(Debug, Default)]
pub struct ResolutionMetrics {
    /// Number of requests answered by an already settled cache entry
    cache_hits: AtomicUsize,

    /// Number of requests that created a cache entry or found it still
    /// loading
    cache_misses: AtomicUsize,

    /// Number of times a getter source was invoked
    loader_calls: AtomicUsize,

    /// Number of pending operations that settled with an error
    load_failures: AtomicUsize,
}

impl ResolutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit (entry already settled).
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss (entry created or still loading).
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a getter invocation.
    pub fn record_loader_call(&self) {
        self.loader_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed load.
    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn loader_calls(&self) -> usize {
        self.loader_calls.load(Ordering::Relaxed)
    }

    pub fn load_failures(&self) -> usize {
        self.load_failures.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_cache_queries = hits + misses;
        let cache_hit_rate = if total_cache_queries > 0 {
            (hits as f64 / total_cache_queries as f64) * 100.0
        } else {
            0.0
        };

        let calls = self.loader_calls();
        let failures = self.load_failures();
        let load_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            loader_calls: calls,
            load_failures: failures,
            load_success_rate,
        }
    }
}

/// Snapshot of resolution statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    pub loader_calls: usize,
    pub load_failures: usize,

    /// Load success rate as a percentage (0-100)
    pub load_success_rate: f64,
}
