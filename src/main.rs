//! Supernova Sim - headless runner
//!
//! Builds a simulation from defaults, an optional TOML file and command-line
//! overrides, runs it to completion (or until the coverage stop fires), and
//! optionally writes the results as JSON or CSV.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use supernova_sim::core::config::SimulationConfig;
use supernova_sim::core::error::Result;
use supernova_sim::simulation::driver::{RunEnd, Simulation};
use supernova_sim::simulation::export::{write_to_path, OutputFormat};

/// Supernova galaxy simulation (headless)
#[derive(Parser, Debug)]
#[command(name = "supernova-sim")]
#[command(about = "Simulate supernova lethal bubbles and civilization survival in a galactic disk")]
struct Args {
    /// TOML config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    num_intervals: Option<u32>,

    /// Years per interval
    #[arg(long)]
    interval_years: Option<f64>,

    /// Supernovae per year
    #[arg(long)]
    rate_per_year: Option<f64>,

    /// Galaxy radius (ly)
    #[arg(long)]
    radius: Option<f64>,

    /// Galaxy disk thickness (ly)
    #[arg(long)]
    thickness: Option<f64>,

    /// Lethal bubble radius (ly)
    #[arg(long, visible_alias = "bubble-r")]
    bubble_radius: Option<f64>,

    #[arg(long)]
    ngrid_xy: Option<usize>,

    #[arg(long)]
    ngrid_z: Option<usize>,

    /// Highest hit threshold tracked for coverage
    #[arg(long)]
    max_threshold: Option<u32>,

    /// Disable civilization simulation
    #[arg(long)]
    no_civs: bool,

    /// New civilizations per year
    #[arg(long)]
    civ_emergence_rate: Option<f64>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Stop early once this fraction of the disk has been hit at least once
    #[arg(long)]
    stop_at_coverage: Option<f64>,

    /// Output file (JSON or CSV)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Output format: json or csv (inferred from the extension if omitted)
    #[arg(long)]
    output_format: Option<OutputFormat>,

    /// Reduce console output
    #[arg(long, short = 'q')]
    quiet: bool,
}

impl Args {
    fn build_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_toml_file(path)?,
            None => SimulationConfig::new(),
        };

        if let Some(v) = self.num_intervals {
            config.num_intervals = v;
        }
        if let Some(v) = self.interval_years {
            config.interval_years = v;
        }
        if let Some(v) = self.rate_per_year {
            config.rate_per_year = v;
        }
        if let Some(v) = self.radius {
            config.radius = v;
        }
        if let Some(v) = self.thickness {
            config.thickness = v;
        }
        if let Some(v) = self.bubble_radius {
            config.bubble_radius = v;
        }
        if let Some(v) = self.ngrid_xy {
            config.ngrid_xy = v;
        }
        if let Some(v) = self.ngrid_z {
            config.ngrid_z = v;
        }
        if let Some(v) = self.max_threshold {
            config.max_threshold = v;
        }
        if self.no_civs {
            config.simulate_civilizations = false;
        }
        if let Some(v) = self.civ_emergence_rate {
            config.civ_emergence_rate = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let directive = if args.quiet { "supernova_sim=warn" } else { "supernova_sim=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .init();

    let config = args.build_config()?;
    let mut sim = Simulation::new(config)?;

    if !args.quiet {
        println!("Running simulation...");
    }

    let start = Instant::now();
    let end = match args.stop_at_coverage {
        Some(target) => sim.run_until(|stats| stats.coverage_at(1).unwrap_or(0.0) >= target),
        None => {
            sim.run_to_end();
            RunEnd::Exhausted
        }
    };
    let elapsed = start.elapsed();

    if let RunEnd::Stopped(interval) = end {
        tracing::info!("Coverage target reached after interval {}", interval);
    }

    let snapshot = sim.snapshot().with_elapsed(elapsed);

    if !args.quiet {
        println!("{}", snapshot.summary());
    }

    if let Some(path) = &args.output {
        let format = args
            .output_format
            .unwrap_or_else(|| OutputFormat::from_path(path));
        write_to_path(&snapshot, path, format)?;
        if !args.quiet {
            println!("Wrote {:?} to {}", format, path.display());
        }
    }

    Ok(())
}
