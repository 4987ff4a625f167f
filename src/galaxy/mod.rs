//! Galaxy model
//!
//! Discretized disk, Poisson event placement and lethal-bubble accumulation.

pub mod coverage;
pub mod grid;
pub mod impact;
pub mod sampling;

pub use coverage::CoverageTracker;
pub use grid::GalaxyGrid;
pub use impact::{CellWindow, ImpactEngine, ImpactReport};
pub use sampling::{Event, EventGenerator, EventKind};
