//! Supernova Sim - stochastic supernova impacts on a discretized galactic disk

pub mod civilization;
pub mod core;
pub mod galaxy;
pub mod simulation;

pub use crate::core::{Result, SimError, SimulationConfig};
pub use crate::simulation::{Simulation, StepOutcome};
