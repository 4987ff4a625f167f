//! Interval-by-interval simulation driver
//!
//! `step()` advances exactly one interval:
//! 1. draw this interval's supernovae and apply each to the grid, extinguishing
//!    civilizations inside its lethal sphere as it lands
//! 2. draw and apply civilization emergences (when enabled)
//! 3. record coverage, living count and event totals
//!
//! A run is a finite, single-pass sequence. Reproducing it means building a new
//! `Simulation` from the same config and seed.

use std::time::Instant;

use tracing::{debug, info};

use crate::civilization::registry::{CivilizationRegistry, Emergence};
use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::Interval;
use crate::galaxy::coverage::CoverageTracker;
use crate::galaxy::grid::GalaxyGrid;
use crate::galaxy::impact::{ImpactEngine, ImpactReport};
use crate::galaxy::sampling::{EventGenerator, EventKind};
use crate::simulation::snapshot::{HeatmapSlice, HitHistogram, SimulationSnapshot};
use crate::simulation::stats::IntervalStats;

/// Result of a call to [`Simulation::step`]
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// One interval was simulated
    Advanced(IntervalStats),
    /// All configured intervals have already run
    Exhausted,
}

impl StepOutcome {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, StepOutcome::Exhausted)
    }
}

/// How a batch run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    Exhausted,
    /// The stop predicate fired after this interval
    Stopped(Interval),
}

/// Civilization state, only present when civilizations are simulated
struct CivilizationLayer {
    registry: CivilizationRegistry,
    emergences: EventGenerator,
}

pub struct Simulation {
    config: SimulationConfig,
    grid: GalaxyGrid,
    engine: ImpactEngine,
    coverage: CoverageTracker,
    supernovae: EventGenerator,
    civilizations: Option<CivilizationLayer>,
    current_interval: Interval,
    total_supernovae: u64,
    history: Vec<IntervalStats>,
    started: Instant,
}

impl Simulation {
    /// Validate the config and build the grid, generators and registry
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let grid = GalaxyGrid::new(&config)?;
        let engine = ImpactEngine::new(config.bubble_radius, &grid);
        let coverage = CoverageTracker::new(config.max_threshold, grid.masked_cells());
        let supernovae = EventGenerator::new(
            EventKind::Supernova,
            config.mean_supernovae_per_interval(),
            config.seed,
        )?;

        let civilizations = if config.simulate_civilizations {
            Some(CivilizationLayer {
                registry: CivilizationRegistry::new(),
                emergences: EventGenerator::new(
                    EventKind::Emergence,
                    config.mean_emergences_per_interval(),
                    config.seed,
                )?,
            })
        } else {
            None
        };

        info!(
            "Simulation ready: {} intervals of {:.3e} years, {:.3} supernovae/interval, civilizations {}",
            config.num_intervals,
            config.interval_years,
            config.mean_supernovae_per_interval(),
            if config.simulate_civilizations { "on" } else { "off" },
        );

        Ok(Self {
            history: Vec::with_capacity(config.num_intervals.min(1 << 16) as usize),
            config,
            grid,
            engine,
            coverage,
            supernovae,
            civilizations,
            current_interval: 0,
            total_supernovae: 0,
            started: Instant::now(),
        })
    }

    /// Advance exactly one interval
    pub fn step(&mut self) -> StepOutcome {
        if self.is_finished() {
            return StepOutcome::Exhausted;
        }
        let interval = self.current_interval;

        // Supernovae, with per-event extinction
        let supernovae = self.supernovae.draw_count();
        let mut impact = ImpactReport::default();
        let mut extinctions = 0u64;

        for _ in 0..supernovae {
            let event = self.supernovae.sample_event(&self.grid, interval);
            debug_assert!(self.grid.in_disk(event.position));
            impact.merge(self.engine.apply(&mut self.grid, &mut self.coverage, event.position));

            if let Some(layer) = self.civilizations.as_mut() {
                extinctions += layer.registry.extinguish_within(
                    &self.grid,
                    &self.engine,
                    event.position,
                    interval,
                ) as u64;
            }
        }
        self.total_supernovae += supernovae;

        // Emergences
        let mut emergences = 0u64;
        let mut discarded_emergences = 0u64;
        let mut living_civilizations = 0;

        if let Some(layer) = self.civilizations.as_mut() {
            let count = layer.emergences.draw_count();
            for _ in 0..count {
                let event = layer.emergences.sample_event(&self.grid, interval);
                match layer.registry.emerge(&event) {
                    Emergence::Emerged(_) => emergences += 1,
                    Emergence::Occupied(_) => discarded_emergences += 1,
                }
            }
            living_civilizations = layer.registry.living_count();
        }

        let stats = IntervalStats {
            interval,
            coverage: self.coverage.fractions(),
            living_civilizations,
            total_supernovae: self.total_supernovae,
            supernovae,
            cells_hit: impact.cells_hit,
            newly_hit_cells: impact.first_hits,
            emergences,
            discarded_emergences,
            extinctions,
        };

        debug!(
            "Interval {}: {} supernovae, {} new cells, coverage@1 {:.4}, {} civs alive (+{} -{})",
            interval,
            supernovae,
            impact.first_hits,
            stats.coverage.first().copied().unwrap_or(0.0),
            living_civilizations,
            emergences,
            extinctions,
        );

        self.history.push(stats.clone());
        self.current_interval += 1;

        StepOutcome::Advanced(stats)
    }

    /// Run every remaining interval; returns how many were simulated
    pub fn run_to_end(&mut self) -> u32 {
        let start = self.current_interval;
        while !self.step().is_exhausted() {}
        self.current_interval - start
    }

    /// Run until exhausted or until `stop` returns true for an interval
    pub fn run_until<F>(&mut self, mut stop: F) -> RunEnd
    where
        F: FnMut(&IntervalStats) -> bool,
    {
        loop {
            match self.step() {
                StepOutcome::Exhausted => return RunEnd::Exhausted,
                StepOutcome::Advanced(stats) => {
                    if stop(&stats) {
                        return RunEnd::Stopped(stats.interval);
                    }
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current_interval >= self.config.num_intervals
    }

    /// Number of intervals simulated so far
    pub fn current_interval(&self) -> Interval {
        self.current_interval
    }

    pub fn remaining_intervals(&self) -> u32 {
        self.config.num_intervals.saturating_sub(self.current_interval)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn grid(&self) -> &GalaxyGrid {
        &self.grid
    }

    /// Civilization registry, `None` when civilizations are disabled
    pub fn civilizations(&self) -> Option<&CivilizationRegistry> {
        self.civilizations.as_ref().map(|layer| &layer.registry)
    }

    pub fn total_supernovae(&self) -> u64 {
        self.total_supernovae
    }

    pub fn history(&self) -> &[IntervalStats] {
        &self.history
    }

    pub fn latest(&self) -> Option<&IntervalStats> {
        self.history.last()
    }

    /// Coverage fractions right now, one per threshold
    pub fn coverage(&self) -> Vec<f64> {
        self.coverage.fractions()
    }

    /// Coverage series for one threshold across all completed intervals
    pub fn coverage_series(&self, threshold: u32) -> Vec<f64> {
        self.history
            .iter()
            .filter_map(|s| s.coverage_at(threshold))
            .collect()
    }

    /// Living civilization count per completed interval
    pub fn civ_history(&self) -> Vec<usize> {
        self.history.iter().map(|s| s.living_civilizations).collect()
    }

    pub fn hit_histogram(&self) -> HitHistogram {
        HitHistogram::from_grid(&self.grid)
    }

    /// Hit counters of the mid-plane layer
    pub fn mid_plane_slice(&self) -> HeatmapSlice {
        HeatmapSlice::mid_plane(&self.grid)
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        let (living, extinct) = self
            .civilizations()
            .map(|r| (r.living_count(), r.extinct_count()))
            .unwrap_or((0, 0));

        SimulationSnapshot {
            config: self.config.clone(),
            intervals_completed: self.current_interval,
            total_supernovae: self.total_supernovae,
            living_civilizations: living,
            extinct_civilizations: extinct,
            history: self.history.clone(),
            histogram: self.hit_histogram(),
            mid_plane: self.mid_plane_slice(),
            elapsed_ms: 0,
        }
        .with_elapsed(self.started.elapsed())
    }
}
