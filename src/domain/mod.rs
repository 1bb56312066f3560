//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw input (`Sample`, `ObservationTable`) and run configuration (`AnalysisConfig`)
//! - segmented eclipses (`Event`)
//! - estimator outputs (`FitResult`, `FitFailure`, `Timing`, `MinimaEstimate`, `AnalysisResult`)

pub mod types;

pub use types::*;
