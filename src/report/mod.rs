//! Reporting utilities: run summaries and formatted text output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{AnalysisResult, Status};

pub mod format;

pub use format::*;

/// Status counts of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub ok: usize,
    pub check: usize,
    /// Events whose KvW fit failed (all of them are also counted as `check`).
    pub kvw_failed: usize,
    pub dropped: usize,
}

pub fn summarize(result: &AnalysisResult) -> Summary {
    let mut summary = Summary {
        dropped: result.dropped.len(),
        ..Summary::default()
    };
    for estimate in &result.estimates {
        match estimate.status {
            Status::Ok => summary.ok += 1,
            Status::Check => summary.check += 1,
        }
        if estimate.kvw.time().is_none() {
            summary.kvw_failed += 1;
        }
    }
    summary
}

/// One-line summary, e.g. `6 MINIMA: 5 OK, 1 CHECK (1 DROPPED)`.
pub fn format_summary(summary: &Summary) -> String {
    let mut out = format!(
        "{} MINIMA: {} OK, {} CHECK",
        summary.ok + summary.check,
        summary.ok,
        summary.check
    );
    if summary.dropped > 0 {
        out.push_str(&format!(" ({} DROPPED)", summary.dropped));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line_mentions_drops_only_when_present() {
        let clean = Summary {
            ok: 2,
            check: 1,
            kvw_failed: 0,
            dropped: 0,
        };
        assert_eq!(format_summary(&clean), "3 MINIMA: 2 OK, 1 CHECK");
        let dropped = Summary { dropped: 2, ..clean };
        assert_eq!(format_summary(&dropped), "3 MINIMA: 2 OK, 1 CHECK (2 DROPPED)");
    }
}
