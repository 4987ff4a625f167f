//! Incremental coverage tallies over disk cells

use rayon::prelude::*;

use crate::galaxy::grid::GalaxyGrid;

/// Chunk size for parallel scans over the counter array
const PARALLEL_CHUNK: usize = 1 << 16;

/// Number of disk cells at or above each hit threshold
///
/// Maintained incrementally by the impact engine: a counter reaching value
/// `v <= max_threshold` bumps the tally for threshold `v`. Coverage for any
/// threshold is then O(1) instead of a full grid scan per interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageTracker {
    at_least: Vec<u64>,
    masked_cells: usize,
}

impl CoverageTracker {
    pub fn new(max_threshold: u32, masked_cells: usize) -> Self {
        Self {
            at_least: vec![0; max_threshold as usize],
            masked_cells,
        }
    }

    /// Rebuild the tallies from the grid counters
    pub fn recount(grid: &GalaxyGrid, max_threshold: u32) -> Self {
        let thresholds = max_threshold as usize;
        let at_least = grid
            .hit_counts()
            .par_chunks(PARALLEL_CHUNK)
            .zip(grid.mask().par_chunks(PARALLEL_CHUNK))
            .map(|(hits, mask)| {
                let mut local = vec![0u64; thresholds];
                for (&h, &m) in hits.iter().zip(mask) {
                    if !m || h == 0 {
                        continue;
                    }
                    let top = (h.min(thresholds as u64)) as usize;
                    for slot in &mut local[..top] {
                        *slot += 1;
                    }
                }
                local
            })
            .reduce(
                || vec![0u64; thresholds],
                |mut a, b| {
                    a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                    a
                },
            );

        Self {
            at_least,
            masked_cells: grid.masked_cells(),
        }
    }

    /// Record that a disk cell's counter just reached `count`
    #[inline]
    pub fn record(&mut self, count: u64) {
        if let Some(slot) = (count as usize)
            .checked_sub(1)
            .and_then(|i| self.at_least.get_mut(i))
        {
            *slot += 1;
        }
    }

    /// Disk cells hit at least `threshold` times
    pub fn cells_at_least(&self, threshold: u32) -> Option<u64> {
        (threshold as usize)
            .checked_sub(1)
            .and_then(|i| self.at_least.get(i))
            .copied()
    }

    /// Coverage fraction for each threshold in `1..=max_threshold`
    pub fn fractions(&self) -> Vec<f64> {
        if self.masked_cells == 0 {
            return vec![0.0; self.at_least.len()];
        }
        let total = self.masked_cells as f64;
        self.at_least.iter().map(|&n| n as f64 / total).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;

    #[test]
    fn test_record_fills_thresholds_in_order() {
        let mut tracker = CoverageTracker::new(3, 10);
        tracker.record(1);
        tracker.record(1);
        tracker.record(2);
        tracker.record(4);

        assert_eq!(tracker.cells_at_least(1), Some(2));
        assert_eq!(tracker.cells_at_least(2), Some(1));
        assert_eq!(tracker.cells_at_least(3), Some(0));
        assert_eq!(tracker.cells_at_least(4), None);
        assert_eq!(tracker.cells_at_least(0), None);
    }

    #[test]
    fn test_fractions() {
        let mut tracker = CoverageTracker::new(2, 4);
        tracker.record(1);
        tracker.record(1);
        tracker.record(2);
        assert_eq!(tracker.fractions(), vec![0.5, 0.25]);
    }

    #[test]
    fn test_fractions_without_disk_cells() {
        let tracker = CoverageTracker::new(2, 0);
        assert_eq!(tracker.fractions(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_recount_of_fresh_grid_is_empty() {
        let grid = GalaxyGrid::new(&SimulationConfig {
            radius: 100.0,
            thickness: 10.0,
            ngrid_xy: 4,
            ngrid_z: 2,
            ..Default::default()
        })
        .unwrap();
        let recount = CoverageTracker::recount(&grid, 3);
        assert_eq!(recount, CoverageTracker::new(3, grid.masked_cells()));
    }
}
