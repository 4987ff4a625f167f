//! Read-only views of the simulation state for plotting and export

use std::collections::BTreeMap;
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::galaxy::grid::GalaxyGrid;
use crate::simulation::stats::IntervalStats;

const PARALLEL_CHUNK: usize = 1 << 16;

/// Distribution of per-cell hit counters over disk cells
///
/// `counts[&c]` is the number of disk cells hit exactly `c` times. Only
/// counter values that occur are stored, so size is bounded by the number of
/// disk cells rather than by the largest counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitHistogram {
    pub counts: BTreeMap<u64, u64>,
}

impl HitHistogram {
    pub fn from_grid(grid: &GalaxyGrid) -> Self {
        let counts = grid
            .hit_counts()
            .par_chunks(PARALLEL_CHUNK)
            .zip(grid.mask().par_chunks(PARALLEL_CHUNK))
            .map(|(hits, mask)| {
                let mut local = BTreeMap::new();
                for (&h, &m) in hits.iter().zip(mask) {
                    if m {
                        *local.entry(h).or_insert(0u64) += 1;
                    }
                }
                local
            })
            .reduce(BTreeMap::new, |mut a, b| {
                for (hits, cells) in b {
                    *a.entry(hits).or_insert(0) += cells;
                }
                a
            });

        Self { counts }
    }

    /// Highest hit count present
    pub fn max_hits(&self) -> u64 {
        self.counts.keys().next_back().copied().unwrap_or(0)
    }

    /// Disk cells hit exactly `hits` times
    pub fn cells_with(&self, hits: u64) -> u64 {
        self.counts.get(&hits).copied().unwrap_or(0)
    }

    /// Disk cells hit at least once
    pub fn cells_hit(&self) -> u64 {
        self.counts.range(1..).map(|(_, &cells)| cells).sum()
    }
}

/// Hit counters of one horizontal layer, for heat maps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapSlice {
    pub layer: usize,
    pub width: usize,
    pub height: usize,
    /// Row-major by x: `cells[i * height + j]`
    pub cells: Vec<u64>,
}

impl HeatmapSlice {
    /// Slice through the disk mid-plane
    pub fn mid_plane(grid: &GalaxyGrid) -> Self {
        Self::layer_of(grid, grid.mid_plane())
    }

    pub fn from_grid(grid: &GalaxyGrid, layer: usize) -> Option<Self> {
        (layer < grid.ngrid_z).then(|| Self::layer_of(grid, layer))
    }

    fn layer_of(grid: &GalaxyGrid, layer: usize) -> Self {
        let n = grid.ngrid_xy;
        let hits = grid.hit_counts();
        let cells = (0..n * n).map(|col| hits[col * grid.ngrid_z + layer]).collect();
        Self {
            layer,
            width: n,
            height: n,
            cells,
        }
    }

    pub fn get(&self, i: usize, j: usize) -> Option<u64> {
        if i < self.width && j < self.height {
            Some(self.cells[i * self.height + j])
        } else {
            None
        }
    }

    pub fn max(&self) -> u64 {
        self.cells.iter().copied().max().unwrap_or(0)
    }
}

/// Serializable snapshot of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub config: SimulationConfig,
    pub intervals_completed: u32,
    pub total_supernovae: u64,
    pub living_civilizations: usize,
    pub extinct_civilizations: usize,
    pub history: Vec<IntervalStats>,
    pub histogram: HitHistogram,
    pub mid_plane: HeatmapSlice,
    pub elapsed_ms: u64,
}

impl SimulationSnapshot {
    /// Coverage series for one threshold across all completed intervals
    pub fn coverage_series(&self, threshold: u32) -> Vec<f64> {
        self.history
            .iter()
            .filter_map(|s| s.coverage_at(threshold))
            .collect()
    }

    /// Living civilization count per interval
    pub fn civ_series(&self) -> Vec<usize> {
        self.history.iter().map(|s| s.living_civilizations).collect()
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = elapsed.as_millis() as u64;
        self
    }

    pub fn summary(&self) -> String {
        let coverage = self
            .history
            .last()
            .and_then(|s| s.coverage_at(1))
            .unwrap_or(0.0);
        format!(
            "Simulated {} intervals ({:.3e} years) in {}ms\n{} supernovae, {:.2}% of disk hit at least once, {} civilizations alive, {} extinct",
            self.intervals_completed,
            self.intervals_completed as f64 * self.config.interval_years,
            self.elapsed_ms,
            self.total_supernovae,
            coverage * 100.0,
            self.living_civilizations,
            self.extinct_civilizations,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{CellIndex, Vec3};
    use crate::galaxy::impact::ImpactEngine;
    use crate::galaxy::coverage::CoverageTracker;

    fn hit_grid() -> GalaxyGrid {
        let config = SimulationConfig {
            radius: 100.0,
            thickness: 10.0,
            ngrid_xy: 10,
            ngrid_z: 5,
            bubble_radius: 15.0,
            ..Default::default()
        };
        let mut grid = GalaxyGrid::new(&config).unwrap();
        let engine = ImpactEngine::new(config.bubble_radius, &grid);
        let mut coverage = CoverageTracker::new(5, grid.masked_cells());
        engine.apply(&mut grid, &mut coverage, Vec3::new(10.0, 10.0, 0.0));
        engine.apply(&mut grid, &mut coverage, Vec3::new(10.0, 10.0, 0.0));
        engine.apply(&mut grid, &mut coverage, Vec3::new(-50.0, 10.0, 0.0));
        grid
    }

    #[test]
    fn test_histogram_accounts_for_every_disk_cell() {
        let grid = hit_grid();
        let histogram = HitHistogram::from_grid(&grid);
        let total: u64 = histogram.counts.values().sum();
        assert_eq!(total as usize, grid.masked_cells());
        assert_eq!(histogram.max_hits(), 2);
        assert!(histogram.cells_with(2) > 0);
        assert_eq!(histogram.cells_with(3), 0);

        let hit: u64 = grid.hit_counts().iter().filter(|&&h| h > 0).count() as u64;
        assert_eq!(histogram.cells_hit(), hit);
    }

    #[test]
    fn test_histogram_of_heavily_hit_cell_stays_small() {
        let config = SimulationConfig {
            radius: 100.0,
            thickness: 10.0,
            ngrid_xy: 1,
            ngrid_z: 1,
            bubble_radius: 500.0,
            ..Default::default()
        };
        let mut grid = GalaxyGrid::new(&config).unwrap();
        let engine = ImpactEngine::new(config.bubble_radius, &grid);
        let mut coverage = CoverageTracker::new(5, grid.masked_cells());
        for _ in 0..100_000 {
            engine.apply(&mut grid, &mut coverage, Vec3::new(0.0, 0.0, 0.0));
        }

        let histogram = HitHistogram::from_grid(&grid);
        assert_eq!(histogram.counts.len(), 1);
        assert_eq!(histogram.max_hits(), 100_000);
        assert_eq!(histogram.cells_with(100_000), 1);
        assert_eq!(histogram.cells_with(0), 0);
        assert_eq!(histogram.cells_hit(), 1);
    }

    #[test]
    fn test_mid_plane_slice() {
        let grid = hit_grid();
        let slice = HeatmapSlice::mid_plane(&grid);
        assert_eq!(slice.layer, 2);
        assert_eq!(slice.cells.len(), 100);
        for i in 0..10 {
            for j in 0..10 {
                assert_eq!(slice.get(i, j), grid.hits(CellIndex::new(i, j, 2)));
            }
        }
        assert_eq!(slice.max(), 2);
        assert_eq!(HeatmapSlice::from_grid(&grid, 2), Some(slice));
        assert!(HeatmapSlice::from_grid(&grid, 5).is_none());
    }
}
