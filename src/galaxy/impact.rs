//! Lethal-bubble impact accumulation
//!
//! This is the hot path of the whole simulation. For each supernova only the
//! index window bounding its lethal sphere is visited, and each cell in that
//! window is tested against `bubble_r^2` before its counter is incremented.
//! Total work is `events x window volume`, so the ratio of bubble radius to
//! cell size is what governs throughput.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::types::{CellIndex, Vec3};
use crate::galaxy::grid::GalaxyGrid;
use crate::galaxy::coverage::CoverageTracker;

/// Outcome of applying one supernova to the grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactReport {
    /// Cells whose counter was incremented
    pub cells_hit: u64,
    /// Cells that went from zero to one hit
    pub first_hits: u64,
}

impl ImpactReport {
    pub fn merge(&mut self, other: ImpactReport) {
        self.cells_hit += other.cells_hit;
        self.first_hits += other.first_hits;
    }
}

/// Inclusive index window along each axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWindow {
    pub i: RangeInclusive<usize>,
    pub j: RangeInclusive<usize>,
    pub k: RangeInclusive<usize>,
}

impl CellWindow {
    pub fn volume(&self) -> usize {
        [&self.i, &self.j, &self.k]
            .iter()
            .map(|r| if r.is_empty() { 0 } else { r.end() - r.start() + 1 })
            .product()
    }
}

/// Applies lethal bubbles of a fixed radius to a grid
#[derive(Debug, Clone)]
pub struct ImpactEngine {
    radius: f64,
    radius_sq: f64,
}

impl ImpactEngine {
    pub fn new(bubble_radius: f64, grid: &GalaxyGrid) -> Self {
        // Cells spanned per axis, clipped to the grid before multiplying
        let reach = |size: f64, n: usize| {
            ((bubble_radius / size).ceil() as usize)
                .saturating_mul(2)
                .saturating_add(1)
                .min(n)
        };
        let (rx, ry, rz) = (
            reach(grid.cell_size.x, grid.ngrid_xy),
            reach(grid.cell_size.y, grid.ngrid_xy),
            reach(grid.cell_size.z, grid.ngrid_z),
        );
        let window = rx * ry * rz;

        info!(
            "Lethal bubble {:.1} ly spans up to {}x{}x{} cells per event",
            bubble_radius, rx, ry, rz
        );
        if window.saturating_mul(4) > grid.total_cells() {
            warn!(
                "Lethal window ({} cells) covers over a quarter of the grid ({} cells); \
                 each supernova will be close to a full scan",
                window,
                grid.total_cells()
            );
        }

        Self {
            radius: bubble_radius,
            radius_sq: bubble_radius * bubble_radius,
        }
    }

    /// Index window bounding the sphere around `center`, clipped to the grid
    ///
    /// The window carries one cell of slack per side; the distance test is
    /// authoritative.
    pub fn window(&self, grid: &GalaxyGrid, center: Vec3) -> CellWindow {
        CellWindow {
            i: axis_window(center.x, self.radius, grid.origin.x, grid.cell_size.x, grid.ngrid_xy),
            j: axis_window(center.y, self.radius, grid.origin.y, grid.cell_size.y, grid.ngrid_xy),
            k: axis_window(center.z, self.radius, grid.origin.z, grid.cell_size.z, grid.ngrid_z),
        }
    }

    /// Whether the centre of `cell` lies inside the bubble around `center`
    #[inline]
    pub fn covers(&self, grid: &GalaxyGrid, center: Vec3, cell: CellIndex) -> bool {
        grid.cell_center(cell).distance_squared(&center) <= self.radius_sq
    }

    /// Increment every disk cell whose centre is within the bubble
    pub fn apply(
        &self,
        grid: &mut GalaxyGrid,
        coverage: &mut CoverageTracker,
        center: Vec3,
    ) -> ImpactReport {
        let window = self.window(grid, center);
        let (n_xy, n_z) = (grid.ngrid_xy, grid.ngrid_z);
        let (origin, size) = (grid.origin, grid.cell_size);
        let r2 = self.radius_sq;
        let (hits, mask) = grid.counters_mut();

        let mut report = ImpactReport::default();

        for i in window.i.clone() {
            let dx = origin.x + (i as f64 + 0.5) * size.x - center.x;
            let dx2 = dx * dx;
            if dx2 > r2 {
                continue;
            }
            for j in window.j.clone() {
                let dy = origin.y + (j as f64 + 0.5) * size.y - center.y;
                let dxy2 = dx2 + dy * dy;
                if dxy2 > r2 {
                    continue;
                }
                let column = (i * n_xy + j) * n_z;
                for k in window.k.clone() {
                    let dz = origin.z + (k as f64 + 0.5) * size.z - center.z;
                    if dxy2 + dz * dz > r2 {
                        continue;
                    }
                    let idx = column + k;
                    if !mask[idx] {
                        continue;
                    }
                    let count = &mut hits[idx];
                    *count += 1;
                    if *count == 1 {
                        report.first_hits += 1;
                    }
                    coverage.record(*count);
                    report.cells_hit += 1;
                }
            }
        }

        report
    }
}

#[inline]
fn axis_window(c: f64, r: f64, origin: f64, size: f64, n: usize) -> RangeInclusive<usize> {
    let lo = ((c - r - origin) / size - 0.5).floor();
    let hi = ((c + r - origin) / size - 0.5).ceil();
    let max = (n - 1) as f64;
    if hi < 0.0 || lo > max {
        // Empty range
        return 1..=0;
    }
    (lo.max(0.0) as usize)..=(hi.min(max) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;

    fn setup(bubble: f64) -> (GalaxyGrid, ImpactEngine, CoverageTracker) {
        let config = SimulationConfig {
            radius: 100.0,
            thickness: 10.0,
            ngrid_xy: 10,
            ngrid_z: 5,
            bubble_radius: bubble,
            max_threshold: 3,
            ..Default::default()
        };
        let grid = GalaxyGrid::new(&config).unwrap();
        let engine = ImpactEngine::new(config.bubble_radius, &grid);
        let coverage = CoverageTracker::new(config.max_threshold, grid.masked_cells());
        (grid, engine, coverage)
    }

    /// Brute-force count of masked cells within `r` of `center`
    fn brute_force(grid: &GalaxyGrid, center: Vec3, r: f64) -> u64 {
        let mut n = 0;
        for i in 0..grid.ngrid_xy {
            for j in 0..grid.ngrid_xy {
                for k in 0..grid.ngrid_z {
                    let cell = CellIndex::new(i, j, k);
                    if grid.is_masked(cell) && grid.cell_center(cell).distance_squared(&center) <= r * r {
                        n += 1;
                    }
                }
            }
        }
        n
    }

    #[test]
    fn test_matches_brute_force() {
        let centers = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(13.7, -42.1, 3.3),
            Vec3::new(-95.0, 5.0, -4.9),
            Vec3::new(70.0, 70.0, 0.0),
        ];
        for center in centers {
            let (mut grid, engine, mut coverage) = setup(25.0);
            let report = engine.apply(&mut grid, &mut coverage, center);
            assert_eq!(report.cells_hit, brute_force(&grid, center, 25.0), "center {:?}", center);
            assert_eq!(report.first_hits, report.cells_hit);
            let total: u64 = grid.hit_counts().iter().sum();
            assert_eq!(total, report.cells_hit);
        }
    }

    #[test]
    fn test_overlap_counts_twice() {
        let (mut grid, engine, mut coverage) = setup(15.0);
        let center = Vec3::new(10.0, 10.0, 1.0);
        let first = engine.apply(&mut grid, &mut coverage, center);
        let second = engine.apply(&mut grid, &mut coverage, center);

        assert!(first.cells_hit > 0);
        assert_eq!(second.cells_hit, first.cells_hit);
        assert_eq!(second.first_hits, 0);
        let cell = grid.cell_of(center).unwrap();
        assert_eq!(grid.hits(cell), Some(2));
    }

    #[test]
    fn test_zero_radius_hits_nothing_off_centre() {
        let (mut grid, engine, mut coverage) = setup(0.0);
        let report = engine.apply(&mut grid, &mut coverage, Vec3::new(1.0, 2.0, 0.3));
        assert_eq!(report.cells_hit, 0);
    }

    #[test]
    fn test_never_touches_cells_outside_disk() {
        let (mut grid, engine, mut coverage) = setup(60.0);
        engine.apply(&mut grid, &mut coverage, Vec3::new(70.0, 70.0, 0.0));
        for (hit, masked) in grid.hit_counts().iter().zip(grid.mask()) {
            if !masked {
                assert_eq!(*hit, 0);
            }
        }
    }

    #[test]
    fn test_window_is_clipped() {
        let (grid, engine, _) = setup(30.0);
        let window = engine.window(&grid, Vec3::new(-99.0, 99.0, 0.0));
        assert_eq!(*window.i.start(), 0);
        assert_eq!(*window.j.end(), 9);
        assert_eq!(*window.k.start(), 0);
        assert_eq!(*window.k.end(), 4);
        assert!(window.volume() < grid.total_cells());
    }

    #[test]
    fn test_covers_uses_cell_centre() {
        let (grid, engine, _) = setup(15.0);
        let cell = CellIndex::new(5, 5, 2);
        let centre = grid.cell_center(cell);
        assert!(engine.covers(&grid, centre, cell));
        assert!(engine.covers(&grid, Vec3::new(centre.x + 14.9, centre.y, centre.z), cell));
        assert!(!engine.covers(&grid, Vec3::new(centre.x + 15.1, centre.y, centre.z), cell));
    }

    #[test]
    fn test_enormous_bubble_covers_whole_disk() {
        let (mut grid, engine, mut coverage) = setup(1e30);
        let window = engine.window(&grid, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(window.volume(), grid.total_cells());

        let report = engine.apply(&mut grid, &mut coverage, Vec3::new(42.0, -17.0, 1.0));
        assert_eq!(report.cells_hit, grid.masked_cells() as u64);
        assert_eq!(coverage.cells_at_least(1), Some(grid.masked_cells() as u64));
    }

    #[test]
    fn test_coverage_tracks_increments() {
        let (mut grid, engine, mut coverage) = setup(25.0);
        let center = Vec3::new(0.0, 0.0, 0.0);
        engine.apply(&mut grid, &mut coverage, center);
        engine.apply(&mut grid, &mut coverage, center);
        assert_eq!(coverage, CoverageTracker::recount(&grid, 3));
    }
}
