//! Result export (JSON and CSV)
//!
//! Exporters only read a [`SimulationSnapshot`]; they never touch live state.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::Interval;
use crate::simulation::snapshot::SimulationSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    /// Infer the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => OutputFormat::Csv,
            _ => OutputFormat::Json,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(SimError::UnknownFormat(other.to_string())),
        }
    }
}

/// JSON document describing a finished (or stopped) run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub parameters: SimulationConfig,
    pub intervals: Vec<Interval>,
    /// Coverage series keyed by hit threshold
    pub coverage_history: BTreeMap<u32, Vec<f64>>,
    /// Living civilizations per interval; empty when civilizations are off
    pub civ_history: Vec<usize>,
    pub supernovae: u64,
}

impl RunReport {
    pub fn from_snapshot(snapshot: &SimulationSnapshot) -> Self {
        let coverage_history = (1..=snapshot.config.max_threshold)
            .map(|t| (t, snapshot.coverage_series(t)))
            .collect();
        let civ_history = if snapshot.config.simulate_civilizations {
            snapshot.civ_series()
        } else {
            Vec::new()
        };

        Self {
            parameters: snapshot.config.clone(),
            intervals: snapshot.history.iter().map(|s| s.interval).collect(),
            coverage_history,
            civ_history,
            supernovae: snapshot.total_supernovae,
        }
    }
}

pub fn write_json<W: Write>(snapshot: &SimulationSnapshot, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, &RunReport::from_snapshot(snapshot))?;
    Ok(())
}

/// One row per interval; `supernovae` is the cumulative count at that interval
pub fn write_csv<W: Write>(snapshot: &SimulationSnapshot, mut writer: W) -> Result<()> {
    let max_threshold = snapshot.config.max_threshold;

    write!(writer, "interval,supernovae,civ_count")?;
    for t in 1..=max_threshold {
        write!(writer, ",coverage_ge_{}", t)?;
    }
    writeln!(writer)?;

    for stats in &snapshot.history {
        write!(writer, "{},{},", stats.interval, stats.total_supernovae)?;
        if snapshot.config.simulate_civilizations {
            write!(writer, "{}", stats.living_civilizations)?;
        }
        for fraction in &stats.coverage {
            write!(writer, ",{}", fraction)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the snapshot to `path` in the given format
pub fn write_to_path(snapshot: &SimulationSnapshot, path: &Path, format: OutputFormat) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    match format {
        OutputFormat::Json => write_json(snapshot, writer),
        OutputFormat::Csv => write_csv(snapshot, writer),
    }
}
