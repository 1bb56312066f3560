//! Fixed-width text formatting for the minima report and pipeline log lines.
//!
//! All strings that end up in a file or on the notification stream are built
//! here so the pipeline and writers stay free of layout details.

use chrono::{DateTime, Local};

use crate::domain::{AnalysisResult, MinimaEstimate, Status, Timing};

/// Width of the rule under the title block.
const TITLE_RULE_WIDTH: usize = 50;
/// Column widths of the ID, time and error header cells.
const ID_WIDTH: usize = 15;
const TIME_WIDTH: usize = 15;
const ERR_WIDTH: usize = 10;

/// Rendered in place of a time/error pair when the method failed.
pub const FAILED_CELL: &str = "FAILED";

/// Column header of the minima table.
pub fn report_header() -> String {
    format!(
        "{:<ID_WIDTH$} | {:<TIME_WIDTH$} +/- {:<ERR_WIDTH$} | {:<TIME_WIDTH$} +/- {:<ERR_WIDTH$} | {}",
        "ID", "KvW Time", "Err", "Par Time", "Err", "Status"
    )
}

/// One table row: `ID | KvW +/- err | Par +/- err | STATUS`.
pub fn format_row(estimate: &MinimaEstimate) -> String {
    let kvw = match &estimate.kvw {
        Timing::Measured(m) => format!("{:.5} +/- {:.5}", m.time, m.sigma),
        Timing::Failed(_) => FAILED_CELL.to_string(),
    };
    format!(
        "{:<ID_WIDTH$} | {kvw} | {:.5} +/- {:.5} | {}",
        estimate.id, estimate.parabolic.time, estimate.parabolic.sigma, estimate.status
    )
}

/// The complete `Minima_Report.txt` body (no trailing newline).
pub fn format_report(result: &AnalysisResult) -> String {
    let header = report_header();
    let separator = "-".repeat(header.chars().count());
    let mut lines = vec![
        format!("ANALYSIS REPORT: {}", result.source),
        format!("DATE: {}", format_report_date(&result.created)),
        "-".repeat(TITLE_RULE_WIDTH),
        header,
        separator,
    ];
    lines.extend(result.estimates.iter().map(format_row));
    lines.join("\n")
}

pub fn format_report_date(created: &DateTime<Local>) -> String {
    created.format("%Y-%m-%d %H:%M").to_string()
}

/// Timestamp prefix used by the terminal front end.
pub fn format_clock(at: &DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

pub fn session_line(source: &str) -> String {
    format!("SESSION START: {source}")
}

pub fn loaded_line(rows: usize) -> String {
    format!("DATA LOADED: {rows} ROWS")
}

pub fn scanning_line(label: &str) -> String {
    format!("SCANNING {}...", label.to_uppercase())
}

pub fn event_line(id: &str, status: Status) -> String {
    format!("-> {id} ({status})")
}

pub const COMPLETED_LINE: &str = "ANALYSIS COMPLETED SUCCESSFULLY";

pub fn critical_line(message: &str) -> String {
    format!("CRITICAL ERROR: {message}")
}
