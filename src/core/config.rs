//! Simulation configuration
//!
//! Every knob of a run lives in [`SimulationConfig`]. The defaults describe a
//! Milky-Way-like disk sampled on a coarse grid; see the field docs for units.
//! Configurations are consumed once, at construction, and never re-read.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};

/// Highest hit threshold coverage can be tracked for
pub const MAX_THRESHOLD: u32 = 1024;

/// Ceiling on the expected number of events drawn in one interval
pub const MAX_EVENTS_PER_INTERVAL: f64 = 1e12;

/// Configuration for a supernova simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === TIME ===
    /// Number of intervals the run lasts
    pub num_intervals: u32,

    /// Simulated years covered by one interval
    pub interval_years: f64,

    /// Galactic supernova rate (events per year)
    ///
    /// The number of supernovae per interval is Poisson distributed with
    /// mean `rate_per_year * interval_years`.
    pub rate_per_year: f64,

    // === GEOMETRY ===
    /// Disk radius (light-years)
    #[serde(alias = "R")]
    pub radius: f64,

    /// Full disk thickness (light-years); the disk spans `[-h/2, h/2]`
    #[serde(alias = "h")]
    pub thickness: f64,

    /// Radius of the lethal sphere around each supernova (light-years)
    ///
    /// Zero is accepted and yields a degenerate run where nothing is ever hit.
    #[serde(alias = "bubble_r")]
    pub bubble_radius: f64,

    /// Cells along each horizontal axis
    pub ngrid_xy: usize,

    /// Cells along the vertical axis
    pub ngrid_z: usize,

    // === STATISTICS ===
    /// Highest hit threshold tracked by the coverage statistics
    ///
    /// Coverage is reported for every threshold in `1..=max_threshold`.
    pub max_threshold: u32,

    // === CIVILIZATIONS ===
    /// Whether civilizations emerge and can be extinguished
    pub simulate_civilizations: bool,

    /// Civilization emergence rate (new civilizations per year)
    pub civ_emergence_rate: f64,

    // === REPRODUCIBILITY ===
    /// Seed for both random streams
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_intervals: 10_000,
            interval_years: 1e6,
            rate_per_year: 0.02,

            radius: 50_000.0,
            thickness: 1_000.0,
            bubble_radius: 50.0,
            ngrid_xy: 200,
            ngrid_z: 50,

            max_threshold: 5,

            simulate_civilizations: true,
            civ_emergence_rate: 1e-9,

            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Expected supernovae per interval
    pub fn mean_supernovae_per_interval(&self) -> f64 {
        self.rate_per_year * self.interval_years
    }

    /// Expected civilization emergences per interval (zero when disabled)
    pub fn mean_emergences_per_interval(&self) -> f64 {
        if self.simulate_civilizations {
            self.civ_emergence_rate * self.interval_years
        } else {
            0.0
        }
    }

    /// Total number of cells in the bounding lattice
    pub fn total_cells(&self) -> Option<usize> {
        self.ngrid_xy
            .checked_mul(self.ngrid_xy)
            .and_then(|n| n.checked_mul(self.ngrid_z))
    }

    /// Validate the configuration, failing on the first bad field
    pub fn validate(&self) -> Result<()> {
        positive("radius", self.radius)?;
        positive("thickness", self.thickness)?;
        positive("interval_years", self.interval_years)?;

        if !self.bubble_radius.is_finite() || self.bubble_radius < 0.0 {
            return Err(SimError::invalid(
                "bubble_radius",
                format!("must be a finite non-negative number, got {}", self.bubble_radius),
            ));
        }

        // Sampling spans [-R, R] and distance tests square lengths
        squarable("radius", 2.0 * self.radius)?;
        squarable("thickness", self.thickness)?;
        squarable("bubble_radius", self.bubble_radius)?;

        if self.ngrid_xy == 0 {
            return Err(SimError::invalid("ngrid_xy", "must be at least 1"));
        }
        if self.ngrid_z == 0 {
            return Err(SimError::invalid("ngrid_z", "must be at least 1"));
        }
        if self.total_cells().is_none() {
            return Err(SimError::invalid(
                "ngrid_xy",
                format!(
                    "grid of {}x{}x{} cells overflows addressable memory",
                    self.ngrid_xy, self.ngrid_xy, self.ngrid_z
                ),
            ));
        }

        if self.max_threshold < 1 || self.max_threshold > MAX_THRESHOLD {
            return Err(SimError::invalid(
                "max_threshold",
                format!("must be in 1..={}, got {}", MAX_THRESHOLD, self.max_threshold),
            ));
        }

        non_negative("rate_per_year", self.rate_per_year)?;
        non_negative("civ_emergence_rate", self.civ_emergence_rate)?;
        events_per_interval("rate_per_year", self.mean_supernovae_per_interval())?;
        events_per_interval("civ_emergence_rate", self.mean_emergences_per_interval())?;

        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(
            field,
            format!("must be a finite positive number, got {}", value),
        ))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(
            field,
            format!("must be a finite non-negative number, got {}", value),
        ))
    }
}

fn squarable(field: &'static str, span: f64) -> Result<()> {
    if span.is_finite() && (span * span).is_finite() {
        Ok(())
    } else {
        Err(SimError::invalid(
            field,
            format!("span {} is too large to square in f64", span),
        ))
    }
}

fn events_per_interval(field: &'static str, mean: f64) -> Result<()> {
    if mean.is_finite() && mean <= MAX_EVENTS_PER_INTERVAL {
        Ok(())
    } else {
        Err(SimError::invalid(
            field,
            format!(
                "expected events per interval must be at most {:e}, got {}",
                MAX_EVENTS_PER_INTERVAL, mean
            ),
        ))
    }
}
