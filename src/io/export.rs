//! Result writers.
//!
//! The pipeline hands its [`AnalysisResult`] to a [`ResultWriter`]. The default
//! [`DirectoryWriter`] produces, inside one output directory:
//!
//! - `Minima_Report.txt`: fixed-width table for humans
//! - `ML_Data.csv`: `ID,KvW,Par,Status` records for downstream scripts
//! - `events/<ID>.json`: per-event plot data

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::AnalysisResult;
use crate::error::AppError;
use crate::io::curve::write_event_json;
use crate::report::format_report;

pub const REPORT_FILE: &str = "Minima_Report.txt";
pub const RECORDS_FILE: &str = "ML_Data.csv";
pub const EVENTS_DIR: &str = "events";
const OUTPUT_DIR_SUFFIX: &str = "_Detailed_Analysis";

/// Consumer of a finished analysis.
pub trait ResultWriter: Send {
    /// Where results go; reported as the run's output location.
    fn destination(&self) -> String;

    fn write(&mut self, result: &AnalysisResult) -> Result<(), AppError>;
}

/// Writes report, records and plot data into one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryWriter {
    dir: PathBuf,
}

impl DirectoryWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<input-stem>_Detailed_Analysis` next to the input file.
    pub fn beside_input(input: &Path) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "observations".to_string());
        let parent = input.parent().unwrap_or_else(|| Path::new(""));
        Self::new(parent.join(format!("{stem}{OUTPUT_DIR_SUFFIX}")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ResultWriter for DirectoryWriter {
    fn destination(&self) -> String {
        self.dir.display().to_string()
    }

    fn write(&mut self, result: &AnalysisResult) -> Result<(), AppError> {
        let events_dir = self.dir.join(EVENTS_DIR);
        fs::create_dir_all(&events_dir).map_err(|e| {
            AppError::input(format!("Failed to create output directory '{}': {e}", events_dir.display()))
        })?;

        write_report(&self.dir.join(REPORT_FILE), result)?;
        if !result.estimates.is_empty() {
            write_records_csv(&self.dir.join(RECORDS_FILE), result)?;
        }
        for estimate in &result.estimates {
            write_event_json(&events_dir.join(format!("{}.json", estimate.id)), estimate)?;
        }
        Ok(())
    }
}

/// Write the fixed-width minima report.
pub fn write_report(path: &Path, result: &AnalysisResult) -> Result<(), AppError> {
    fs::write(path, format_report(result))
        .map_err(|e| AppError::input(format!("Failed to write report '{}': {e}", path.display())))
}

#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "KvW")]
    kvw: Option<f64>,
    #[serde(rename = "Par")]
    par: f64,
    #[serde(rename = "Status")]
    status: &'static str,
}

/// Write one `ID,KvW,Par,Status` record per estimate.
pub fn write_records_csv(path: &Path, result: &AnalysisResult) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::input(format!("Failed to create CSV '{}': {e}", path.display())))?;
    for estimate in &result.estimates {
        writer
            .serialize(RecordRow {
                id: &estimate.id,
                kvw: estimate.kvw.time(),
                par: estimate.parabolic.time,
                status: estimate.status.as_str(),
            })
            .map_err(|e| AppError::input(format!("Failed to write CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush CSV '{}': {e}", path.display())))
}
