//! # Data-Quality and Engine Counters
//!
//! Atomic counters for conditions the engine recovers from locally
//! (missing terrain tiles, missing antenna patterns) and for request
//! outcomes. Counters only ever accumulate; totals are independent of the
//! order in which parallel workers increment them.
//!
//! ## Example
//!
//! ```rust
//! use afc_core::observe::DataQuality;
//!
//! let quality = DataQuality::new();
//! quality.missing_terrain.inc();
//! quality.missing_antenna_patterns.inc_by(2);
//!
//! let report = quality.snapshot();
//! assert_eq!(report.missing_terrain, 1);
//! assert!(!report.is_clean());
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A simple atomic counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter.
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// Increment by 1.
    #[inline]
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment by a specific amount.
    #[inline]
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Get the current value.
    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Per-request data-quality counters
#[derive(Debug, Default)]
pub struct DataQuality {
    /// Terrain lookups answered by the flat/rural fallback
    pub missing_terrain: Counter,
    /// Declared antenna models with no measured pattern
    pub missing_antenna_patterns: Counter,
    /// Refractivity/climate lookups answered by defaults
    pub missing_climate_data: Counter,
}

impl DataQuality {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy for the response
    pub fn snapshot(&self) -> DataQualityReport {
        DataQualityReport {
            missing_terrain: self.missing_terrain.get(),
            missing_antenna_patterns: self.missing_antenna_patterns.get(),
            missing_climate_data: self.missing_climate_data.get(),
        }
    }
}

/// Serializable data-quality summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub missing_terrain: u64,
    pub missing_antenna_patterns: u64,
    pub missing_climate_data: u64,
}

impl DataQualityReport {
    /// No fallback was needed
    pub fn is_clean(&self) -> bool {
        self.missing_terrain == 0 && self.missing_antenna_patterns == 0 && self.missing_climate_data == 0
    }
}

/// Cumulative engine outcome counters
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub evaluated: Counter,
    pub rejected: Counter,
    pub cancelled: Counter,
    pub failed: Counter,
    pub scan_points: Counter,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            evaluated: self.evaluated.get(),
            rejected: self.rejected.get(),
            cancelled: self.cancelled.get(),
            failed: self.failed.get(),
            scan_points: self.scan_points.get(),
        }
    }
}

/// Copy of [`EngineMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMetricsSnapshot {
    pub evaluated: u64,
    pub rejected: u64,
    pub cancelled: u64,
    pub failed: u64,
    pub scan_points: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counter() {
        let c = Counter::new();
        c.inc();
        c.inc_by(4);
        assert_eq!(c.get(), 5);
    }

    #[test]
    fn test_counter_threads() {
        let quality = Arc::new(DataQuality::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let q = Arc::clone(&quality);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        q.missing_terrain.inc();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(quality.snapshot().missing_terrain, 4000);
    }

    #[test]
    fn test_clean_report() {
        assert!(DataQuality::new().snapshot().is_clean());
    }
}
