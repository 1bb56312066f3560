//! Both minimum-time methods applied to one event.

use crate::domain::{Event, FitResult};
use crate::fit::kvw::{fit_kvw, kvw_minimum};
use crate::fit::parabolic::{fit_parabola, parabolic_minimum};

/// Single-shot results of both methods on one series.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFits {
    pub parabolic: FitResult,
    pub kvw: FitResult,
}

/// Run the parabolic and KvW estimators on `(times, mags)`.
///
/// Pure: identical inputs always give identical outputs.
pub fn estimate_minima(times: &[f64], mags: &[f64]) -> EventFits {
    EventFits {
        parabolic: parabolic_minimum(times, mags),
        kvw: kvw_minimum(times, mags),
    }
}

/// Convenience wrapper for an [`Event`].
pub fn estimate_event(event: &Event) -> EventFits {
    estimate_minima(&event.times(), &event.magnitudes())
}

/// Minimum times only (no curve), as needed by Monte-Carlo replicas.
pub fn minimum_times(times: &[f64], mags: &[f64]) -> (Option<f64>, Option<f64>) {
    let parabolic = fit_parabola(times, mags).ok().map(|f| f.time);
    let kvw = fit_kvw(times, mags).ok().map(|f| f.time);
    (parabolic, kvw)
}
