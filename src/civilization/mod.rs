//! Civilization lifecycle: emergence and supernova extinction

pub mod registry;

pub use registry::{CivState, Civilization, CivilizationId, CivilizationRegistry, Emergence};
