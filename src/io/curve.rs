//! Read/write per-event plot data.
//!
//! Plot JSON is the portable representation of one analysed eclipse:
//! - observed samples (time, magnitude, phase)
//! - the fitted parabola sampled on a regular grid
//! - residuals against that parabola
//! - the minimum times of both methods
//!
//! Any plotting tool can render the light curve, fit and residual panels from it.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{CurvePoint, MinimaEstimate, Sample};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPlotData {
    pub id: String,
    pub window: String,
    /// Parabolic minimum time.
    pub minimum_time: f64,
    /// KvW minimum time, absent when that method failed.
    pub kvw_time: Option<f64>,
    pub status: String,
    pub samples: Vec<Sample>,
    pub curve: Vec<CurvePoint>,
    pub residuals: Vec<f64>,
}

impl EventPlotData {
    pub fn from_estimate(estimate: &MinimaEstimate) -> Self {
        Self {
            id: estimate.id.clone(),
            window: estimate.window.clone(),
            minimum_time: estimate.parabolic.time,
            kvw_time: estimate.kvw.time(),
            status: estimate.status.to_string(),
            samples: estimate.samples.clone(),
            curve: estimate.curve.clone(),
            residuals: estimate.residuals.clone(),
        }
    }
}

/// Write one event's plot JSON.
pub fn write_event_json(path: &Path, estimate: &MinimaEstimate) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create plot JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &EventPlotData::from_estimate(estimate))
        .map_err(|e| AppError::input(format!("Failed to write plot JSON: {e}")))
}

/// Read an event plot JSON file.
pub fn read_event_json(path: &Path) -> Result<EventPlotData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open plot JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid plot JSON: {e}")))
}
