//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - passed by value between pipeline stages
//! - exported as per-event plot data (JSON) and report rows
//! - constructed directly in tests without touching the filesystem

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One photometric observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Observation time (typically BJD).
    pub time: f64,
    /// Magnitude or flux.
    pub magnitude: f64,
    /// Orbital phase.
    pub phase: f64,
}

/// The full input series as parallel columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    /// Human-readable identifier of where the data came from (file stem, test name, ...).
    pub source: String,
    pub time: Vec<f64>,
    pub magnitude: Vec<f64>,
    pub phase: Vec<f64>,
}

impl ObservationTable {
    /// Build a table, rejecting ragged or non-finite columns.
    pub fn new(
        source: impl Into<String>,
        time: Vec<f64>,
        magnitude: Vec<f64>,
        phase: Vec<f64>,
    ) -> Result<Self, AppError> {
        let source = source.into();
        if time.len() != magnitude.len() || time.len() != phase.len() {
            return Err(AppError::input(format!(
                "Column length mismatch in '{source}': time={}, magnitude={}, phase={}",
                time.len(),
                magnitude.len(),
                phase.len()
            )));
        }
        if time.is_empty() {
            return Err(AppError::no_data(format!("No observations in '{source}'.")));
        }
        let columns = [("time", &time), ("magnitude", &magnitude), ("phase", &phase)];
        for (name, column) in columns {
            if let Some(row) = column.iter().position(|v| !v.is_finite()) {
                return Err(AppError::input(format!(
                    "Non-finite {name} value in '{source}' at row {}",
                    row + 1
                )));
            }
        }
        Ok(Self {
            source,
            time,
            magnitude,
            phase,
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn sample(&self, idx: usize) -> Sample {
        Sample {
            time: self.time[idx],
            magnitude: self.magnitude[idx],
            phase: self.phase[idx],
        }
    }
}

/// A closed phase interval `[min, max]` isolating one family of eclipses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseWindow {
    /// Label used for event ids (`"<label>_<n>"`) and log lines.
    pub label: String,
    pub min: f64,
    pub max: f64,
}

impl PhaseWindow {
    pub fn new(label: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            label: label.into(),
            min,
            max,
        }
    }

    pub fn contains(&self, phase: f64) -> bool {
        phase >= self.min && phase <= self.max
    }
}

/// One eclipse: a time-sorted run of samples from a single phase window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub label: String,
    /// 1-based sequence number within the window.
    pub index: usize,
    pub samples: Vec<Sample>,
}

impl Event {
    pub fn id(&self) -> String {
        format!("{}_{}", self.label, self.index)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    pub fn magnitudes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.magnitude).collect()
    }
}

/// A point on a fitted curve (for plotting only).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub time: f64,
    pub magnitude: f64,
}

/// Why an estimator could not produce a minimum time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum FitFailure {
    /// Not enough samples to fit and scale a covariance.
    TooFewPoints { n: usize, required: usize },
    /// Normal equations could not be inverted.
    SingularMatrix,
    /// Leading quadratic coefficient is zero, so there is no vertex.
    DegenerateCurvature,
    /// Too few KvW trial centres had enough mirrored points.
    InsufficientSupport { valid_trials: usize, required: usize },
    /// The KvW sum-of-squares parabola opens downwards.
    NonPositiveCurvature,
    /// Arithmetic produced NaN or infinity.
    NonFinite,
}

impl std::fmt::Display for FitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitFailure::TooFewPoints { n, required } => {
                write!(f, "too few points (n={n}, need >= {required})")
            }
            FitFailure::SingularMatrix => write!(f, "singular normal matrix"),
            FitFailure::DegenerateCurvature => write!(f, "zero quadratic coefficient"),
            FitFailure::InsufficientSupport {
                valid_trials,
                required,
            } => write!(
                f,
                "insufficient mirror support ({valid_trials} valid trials, need >= {required})"
            ),
            FitFailure::NonPositiveCurvature => write!(f, "non-positive curvature"),
            FitFailure::NonFinite => write!(f, "non-finite result"),
        }
    }
}

/// Successful single-shot estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitSuccess {
    pub time: f64,
    /// Analytic uncertainty; always `>= 0`.
    pub sigma: f64,
    /// Smooth fitted curve; empty for methods that have none (KvW).
    pub curve: Vec<CurvePoint>,
}

/// Outcome of one estimator on one `(time, magnitude)` series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitResult {
    Success(FitSuccess),
    Failed(FitFailure),
}

impl FitResult {
    pub fn time(&self) -> Option<f64> {
        match self {
            FitResult::Success(s) => Some(s.time),
            FitResult::Failed(_) => None,
        }
    }

    pub fn sigma(&self) -> Option<f64> {
        match self {
            FitResult::Success(s) => Some(s.sigma),
            FitResult::Failed(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FitResult::Success(_))
    }
}

/// Slack applied to the status threshold so decimal inputs such as
/// `12.345 - 12.340` compare equal to `0.005` despite binary rounding.
const THRESHOLD_SLACK: f64 = 1e-9;

/// Agreement between the two methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Check,
}

impl Status {
    /// `CHECK` when the KvW and parabolic times differ by strictly more than
    /// `threshold`, or when KvW produced no time at all.
    pub fn classify(kvw_time: Option<f64>, parabolic_time: f64, threshold: f64) -> Self {
        match kvw_time {
            Some(kvw) if (kvw - parabolic_time).abs() <= threshold + THRESHOLD_SLACK => Status::Ok,
            _ => Status::Check,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Check => "CHECK",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A minimum time with both its analytic and its final (empirical when available) sigma.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    pub time: f64,
    pub analytic_sigma: f64,
    pub sigma: f64,
    /// Monte-Carlo replicas that produced a time (0 when the analytic sigma was kept).
    pub replicas: usize,
}

/// Final per-method timing for an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    Measured(Measurement),
    Failed(FitFailure),
}

impl Timing {
    pub fn time(&self) -> Option<f64> {
        match self {
            Timing::Measured(m) => Some(m.time),
            Timing::Failed(_) => None,
        }
    }

    pub fn sigma(&self) -> Option<f64> {
        match self {
            Timing::Measured(m) => Some(m.sigma),
            Timing::Failed(_) => None,
        }
    }
}

/// Per-event result: both timings plus the series needed by plot/report writers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimaEstimate {
    pub id: String,
    pub window: String,
    pub index: usize,
    pub parabolic: Measurement,
    pub kvw: Timing,
    pub status: Status,
    pub samples: Vec<Sample>,
    pub curve: Vec<CurvePoint>,
    /// Observed minus parabolic fit, one per sample.
    pub residuals: Vec<f64>,
}

/// Aggregated output of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub source: String,
    pub created: DateTime<Local>,
    pub config: AnalysisConfig,
    pub rows: usize,
    pub estimates: Vec<MinimaEstimate>,
    /// Events dropped because the parabolic fit failed, and why.
    pub dropped: Vec<(String, FitFailure)>,
}

/// A full run's configuration as understood by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub primary: PhaseWindow,
    pub secondary: PhaseWindow,
    pub mc_iterations: usize,
    pub min_points: usize,
    /// Maximum |KvW - parabolic| (time units) still classified `OK`.
    pub threshold: f64,
    /// Seed for Monte-Carlo noise; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            primary: PhaseWindow::new("Primary", 0.95, 1.05),
            secondary: PhaseWindow::new("Secondary", 1.45, 1.55),
            mc_iterations: 100,
            min_points: 5,
            threshold: 0.005,
            seed: None,
        }
    }
}

impl AnalysisConfig {
    /// Smallest event size the estimators can work with.
    pub const MIN_POINTS_FLOOR: usize = 3;

    pub fn windows(&self) -> [&PhaseWindow; 2] {
        [&self.primary, &self.secondary]
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for w in self.windows() {
            if !(w.min.is_finite() && w.max.is_finite() && w.min < w.max) {
                return Err(AppError::input(format!(
                    "Invalid {} phase window: [{}, {}] (must be finite with min < max).",
                    w.label, w.min, w.max
                )));
            }
        }
        if self.mc_iterations == 0 {
            return Err(AppError::input("Monte-Carlo iterations must be >= 1."));
        }
        if self.min_points < Self::MIN_POINTS_FLOOR {
            return Err(AppError::input(format!(
                "Minimum points per event must be >= {}.",
                Self::MIN_POINTS_FLOOR
            )));
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(AppError::input(format!(
                "Threshold must be finite and > 0, got {}.",
                self.threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_boundary_is_inclusive_ok() {
        // |diff| == threshold is not "greater than" the threshold.
        assert_eq!(Status::classify(Some(12.345), 12.340, 0.005), Status::Ok);
        assert_eq!(Status::classify(Some(12.345), 12.300, 0.005), Status::Check);
    }

    #[test]
    fn status_without_kvw_is_check() {
        assert_eq!(Status::classify(None, 12.3, 0.005), Status::Check);
    }

    #[test]
    fn table_rejects_ragged_columns() {
        let err = ObservationTable::new("t", vec![1.0, 2.0], vec![1.0], vec![0.1, 0.2]).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }

    #[test]
    fn table_rejects_nan() {
        let err = ObservationTable::new("t", vec![1.0, f64::NAN], vec![1.0, 1.0], vec![0.1, 0.2])
            .unwrap_err();
        assert!(err.message().contains("row 2"), "{err}");
    }

    #[test]
    fn default_config_is_valid() {
        AnalysisConfig::default().validate().unwrap();
    }

    #[test]
    fn config_rejects_inverted_window() {
        let config = AnalysisConfig {
            secondary: PhaseWindow::new("Secondary", 1.55, 1.45),
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn event_id_uses_label_and_index() {
        let event = Event {
            label: "Primary".to_string(),
            index: 3,
            samples: vec![],
        };
        assert_eq!(event.id(), "Primary_3");
    }
}
