//! Per-interval statistics

use serde::{Deserialize, Serialize};

use crate::core::types::Interval;

/// Statistics recorded at the end of one interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalStats {
    /// Zero-based index of the interval these statistics close
    pub interval: Interval,
    /// Coverage fraction for thresholds `1..=max_threshold` (index `t - 1`)
    pub coverage: Vec<f64>,
    pub living_civilizations: usize,
    /// Cumulative supernova count up to and including this interval
    pub total_supernovae: u64,
    pub supernovae: u64,
    pub cells_hit: u64,
    pub newly_hit_cells: u64,
    pub emergences: u64,
    pub discarded_emergences: u64,
    pub extinctions: u64,
}

impl IntervalStats {
    /// Coverage fraction for a single threshold
    pub fn coverage_at(&self, threshold: u32) -> Option<f64> {
        (threshold as usize)
            .checked_sub(1)
            .and_then(|i| self.coverage.get(i))
            .copied()
    }
}
