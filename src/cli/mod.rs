//! Command-line parsing for the eclipse minima timer.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline and the math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::SyntheticConfig;
use crate::domain::{AnalysisConfig, PhaseWindow};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "mist", version, about = "Times of minima for eclipsing binary light curves")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Segment a light curve into eclipses and time each minimum (parabola + Kwee-van Woerden).
    Analyze(AnalyzeArgs),
    /// Write a synthetic eclipsing-binary light curve with known minima.
    Simulate(SimulateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Observation table: time, magnitude, phase (whitespace or comma separated, no header).
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Primary eclipse phase window.
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [0.95, 1.05])]
    pub primary: Vec<f64>,

    /// Secondary eclipse phase window.
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [1.45, 1.55])]
    pub secondary: Vec<f64>,

    /// Monte-Carlo iterations per event.
    #[arg(long = "mc-iter", default_value_t = 100)]
    pub mc_iterations: usize,

    /// Minimum samples for an eclipse to be analysed.
    #[arg(long, default_value_t = 5)]
    pub min_points: usize,

    /// Largest |KvW - parabolic| difference (days) still reported as OK.
    #[arg(long, default_value_t = 0.005)]
    pub threshold: f64,

    /// Seed for the Monte-Carlo noise (random when omitted).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output directory (default: `<input-stem>_Detailed_Analysis` next to the input).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl AnalyzeArgs {
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            primary: window("Primary", &self.primary),
            secondary: window("Secondary", &self.secondary),
            mc_iterations: self.mc_iterations,
            min_points: self.min_points,
            threshold: self.threshold,
            seed: self.seed,
        }
    }
}

/// Clap guarantees two values; anything else becomes an invalid (NaN) window
/// and is rejected by `AnalysisConfig::validate`.
fn window(label: &str, bounds: &[f64]) -> PhaseWindow {
    match bounds {
        [min, max] => PhaseWindow::new(label, *min, *max),
        _ => PhaseWindow::new(label, f64::NAN, f64::NAN),
    }
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Where to write the generated table.
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,

    /// Orbital period (days).
    #[arg(long, default_value_t = 1.5)]
    pub period: f64,

    /// Time of the first primary minimum.
    #[arg(long, default_value_t = 2_459_000.2)]
    pub epoch: f64,

    /// Orbital cycles to cover.
    #[arg(long, default_value_t = 4)]
    pub cycles: usize,

    /// Sampling interval (days).
    #[arg(long, default_value_t = 0.004)]
    pub cadence: f64,

    /// Magnitude noise standard deviation.
    #[arg(long, default_value_t = 0.002)]
    pub noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl SimulateArgs {
    pub fn synthetic_config(&self) -> SyntheticConfig {
        SyntheticConfig {
            period: self.period,
            epoch: self.epoch,
            cycles: self.cycles,
            cadence: self.cadence,
            noise: self.noise,
            seed: self.seed,
            ..SyntheticConfig::default()
        }
    }
}
