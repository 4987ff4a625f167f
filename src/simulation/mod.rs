//! Simulation driver, statistics, snapshots and export
//!
//! The driver owns all mutable state. Consumers (plotting front-ends,
//! exporters) pull read-only views after each `step()`.

pub mod driver;
pub mod export;
pub mod snapshot;
pub mod stats;

pub use driver::{RunEnd, Simulation, StepOutcome};
pub use export::{OutputFormat, RunReport};
pub use snapshot::{HeatmapSlice, HitHistogram, SimulationSnapshot};
pub use stats::IntervalStats;
