//! Per-interval event generation
//!
//! Each interval draws `k ~ Poisson(rate * interval_years)` events and places
//! every one of them uniformly inside the disk by rejection sampling against
//! the bounding box. Supernovae and civilization emergences each own a
//! generator on a separate ChaCha stream so their draws never interleave.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};

use crate::core::config::MAX_EVENTS_PER_INTERVAL;
use crate::core::error::{Result, SimError};
use crate::core::types::{CellIndex, Interval, Vec3};
use crate::galaxy::grid::GalaxyGrid;

/// What an event represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Supernova,
    Emergence,
}

impl EventKind {
    /// ChaCha stream reserved for this kind
    pub fn stream(&self) -> u64 {
        match self {
            EventKind::Supernova => 0,
            EventKind::Emergence => 1,
        }
    }
}

/// A single sampled occurrence; consumed immediately, never stored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub position: Vec3,
    /// Cell containing `position` (always inside the disk mask)
    pub cell: CellIndex,
    pub interval: Interval,
}

/// Seeded Poisson event source for one kind of event
#[derive(Debug, Clone)]
pub struct EventGenerator {
    kind: EventKind,
    poisson: Option<Poisson<f64>>,
    rng: ChaCha8Rng,
}

impl EventGenerator {
    /// Create a generator with `mean` expected events per interval
    ///
    /// A zero mean is allowed and produces no events without touching the RNG.
    pub fn new(kind: EventKind, mean: f64, seed: u64) -> Result<Self> {
        if mean > MAX_EVENTS_PER_INTERVAL {
            return Err(SimError::invalid(
                "rate",
                format!(
                    "expected events per interval must be at most {:e}, got {}",
                    MAX_EVENTS_PER_INTERVAL, mean
                ),
            ));
        }

        let poisson = if mean > 0.0 {
            Some(Poisson::new(mean).map_err(|e| {
                SimError::invalid("rate", format!("cannot build Poisson({}): {}", mean, e))
            })?)
        } else if mean == 0.0 {
            None
        } else {
            return Err(SimError::invalid(
                "rate",
                format!("expected events per interval must be non-negative, got {}", mean),
            ));
        };

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(kind.stream());

        Ok(Self { kind, poisson, rng })
    }

    /// Draw the number of events for one interval
    pub fn draw_count(&mut self) -> u64 {
        match &self.poisson {
            Some(poisson) => poisson.sample(&mut self.rng) as u64,
            None => 0,
        }
    }

    /// Sample a position uniformly inside the disk
    ///
    /// Candidates are drawn in the bounding box and kept only when they lie
    /// inside the continuous cylinder and in a masked cell. The central cells
    /// are always masked, so this terminates with probability one.
    pub fn sample_position(&mut self, grid: &GalaxyGrid) -> (Vec3, CellIndex) {
        let r = grid.radius;
        let half_h = grid.thickness / 2.0;
        loop {
            let candidate = Vec3::new(
                self.rng.gen_range(-r..=r),
                self.rng.gen_range(-r..=r),
                self.rng.gen_range(-half_h..=half_h),
            );
            if !grid.in_disk(candidate) {
                continue;
            }
            if let Some(cell) = grid.cell_of(candidate) {
                if grid.is_masked(cell) {
                    return (candidate, cell);
                }
            }
        }
    }

    /// Sample one event for the given interval
    pub fn sample_event(&mut self, grid: &GalaxyGrid, interval: Interval) -> Event {
        let (position, cell) = self.sample_position(grid);
        Event {
            kind: self.kind,
            position,
            cell,
            interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;

    fn grid() -> GalaxyGrid {
        GalaxyGrid::new(&SimulationConfig {
            radius: 100.0,
            thickness: 10.0,
            ngrid_xy: 10,
            ngrid_z: 5,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_zero_mean_never_fires() {
        let mut generator = EventGenerator::new(EventKind::Supernova, 0.0, 1).unwrap();
        for _ in 0..100 {
            assert_eq!(generator.draw_count(), 0);
        }
    }

    #[test]
    fn test_negative_mean_rejected() {
        assert!(EventGenerator::new(EventKind::Supernova, -1.0, 1).is_err());
        assert!(EventGenerator::new(EventKind::Supernova, f64::NAN, 1).is_err());
    }

    #[test]
    fn test_unbounded_mean_rejected() {
        assert!(EventGenerator::new(EventKind::Supernova, f64::INFINITY, 1).is_err());
        assert!(EventGenerator::new(EventKind::Supernova, 1e300, 1).is_err());
        assert!(EventGenerator::new(EventKind::Supernova, MAX_EVENTS_PER_INTERVAL, 1).is_ok());
    }

    #[test]
    fn test_count_mean_is_close_to_rate() {
        let mut generator = EventGenerator::new(EventKind::Supernova, 4.0, 7).unwrap();
        let draws = 20_000;
        let total: u64 = (0..draws).map(|_| generator.draw_count()).sum();
        let mean = total as f64 / draws as f64;
        assert!((mean - 4.0).abs() < 0.1, "sample mean {}", mean);
    }

    #[test]
    fn test_positions_stay_in_disk() {
        let grid = grid();
        let mut generator = EventGenerator::new(EventKind::Supernova, 1.0, 3).unwrap();
        for interval in 0..2_000 {
            let event = generator.sample_event(&grid, interval);
            assert!(grid.in_disk(event.position));
            assert!(grid.is_masked(event.cell));
            assert_eq!(grid.cell_of(event.position), Some(event.cell));
            assert_eq!(event.interval, interval);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let grid = grid();
        let mut a = EventGenerator::new(EventKind::Supernova, 2.5, 99).unwrap();
        let mut b = EventGenerator::new(EventKind::Supernova, 2.5, 99).unwrap();
        for _ in 0..50 {
            assert_eq!(a.draw_count(), b.draw_count());
            assert_eq!(a.sample_position(&grid), b.sample_position(&grid));
        }
    }

    #[test]
    fn test_kinds_use_independent_streams() {
        let grid = grid();
        let mut supernovae = EventGenerator::new(EventKind::Supernova, 1.0, 5).unwrap();
        let mut emergences = EventGenerator::new(EventKind::Emergence, 1.0, 5).unwrap();
        let a: Vec<_> = (0..10).map(|_| supernovae.sample_position(&grid).0).collect();
        let b: Vec<_> = (0..10).map(|_| emergences.sample_position(&grid).0).collect();
        assert_ne!(a, b);
    }
}
