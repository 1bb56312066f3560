//! Kwee–van Woerden (KvW) minimum-time estimator.
//!
//! The light curve around a minimum is assumed symmetric. For a trial centre
//! `t`, every sample is reflected to `2t - x` and compared with the
//! piecewise-linear interpolant of the observed branch:
//!
//! ```text
//! S(t) = Σ (m_i - f(2t - x_i))²      over samples whose reflection stays in the data range
//! ```
//!
//! `S` is evaluated on a grid of trial centres around the mean time, a
//! quadratic `A·t² + B·t + C` is fitted to `S` near its smallest value, and the
//! vertex is the minimum time. The uncertainty follows Kwee & van Woerden:
//!
//! ```text
//! σ² = 2·|S_min| / (A·(n - 2))
//! ```

use crate::domain::{FitFailure, FitResult, FitSuccess};
use crate::math::{LinearInterpolator, linspace, mean, polyfit};
use crate::models::Quadratic;

/// Number of trial centres.
pub const KVW_TRIALS: usize = 50;
/// Search half-width is the event span divided by this.
pub const KVW_SEARCH_DIVISOR: f64 = 3.0;
/// Trials on each side of the best one used for the local quadratic.
pub const KVW_LOCAL_HALF_WIDTH: usize = 5;
/// Mirrored samples a trial needs before its `S(t)` counts.
pub const KVW_MIN_MIRRORED: usize = 3;
/// Trials with finite `S(t)` needed for a fit.
pub const KVW_MIN_VALID_TRIALS: usize = 5;

/// KvW minimum in absolute time with its analytic sigma.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KvwFit {
    pub time: f64,
    pub sigma: f64,
}

/// Run the KvW search on one event.
pub fn fit_kvw(times: &[f64], mags: &[f64]) -> Result<KvwFit, FitFailure> {
    let n = times.len().min(mags.len());
    if n < KVW_MIN_MIRRORED {
        return Err(FitFailure::TooFewPoints {
            n,
            required: KVW_MIN_MIRRORED,
        });
    }

    let mut pairs: Vec<(f64, f64)> = times.iter().copied().zip(mags.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let offset = pairs[0].0;
    let x: Vec<f64> = pairs.iter().map(|p| p.0 - offset).collect();
    let y: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    if x.iter().chain(&y).any(|v| !v.is_finite()) {
        return Err(FitFailure::NonFinite);
    }

    let interp = LinearInterpolator::new(&x, &y).ok_or(FitFailure::NonFinite)?;
    let (x_lo, x_hi) = (x[0], x[n - 1]);
    let center = mean(&x).ok_or(FitFailure::NonFinite)?;
    let search = (x_hi - x_lo) / KVW_SEARCH_DIVISOR;

    let mut trials = Vec::with_capacity(KVW_TRIALS);
    let mut sums = Vec::with_capacity(KVW_TRIALS);
    for t in linspace(center - search, center + search, KVW_TRIALS) {
        let s = mirror_sum_of_squares(&x, &y, &interp, t, x_lo, x_hi);
        if s.is_finite() {
            trials.push(t);
            sums.push(s);
        }
    }

    if trials.len() < KVW_MIN_VALID_TRIALS {
        return Err(FitFailure::InsufficientSupport {
            valid_trials: trials.len(),
            required: KVW_MIN_VALID_TRIALS,
        });
    }

    let best = sums
        .iter()
        .enumerate()
        .fold(0, |best, (i, s)| if *s < sums[best] { i } else { best });
    let lo = best.saturating_sub(KVW_LOCAL_HALF_WIDTH);
    let hi = (best + KVW_LOCAL_HALF_WIDTH + 1).min(sums.len());

    // Centre the local abscissae; the vertex and S_min are shift invariant.
    let window_t = &trials[lo..hi];
    let pivot = mean(window_t).ok_or(FitFailure::NonFinite)?;
    let u: Vec<f64> = window_t.iter().map(|t| t - pivot).collect();
    let fit = polyfit(&u, &sums[lo..hi], 2, false)?;
    let model = Quadratic::from_fit(&fit)?;

    if !(model.a > 0.0) {
        return Err(FitFailure::NonPositiveCurvature);
    }

    let time = model.vertex()? + pivot + offset;
    let sigma = (2.0 * model.vertex_value().abs() / (model.a * (n as f64 - 2.0))).sqrt();
    if !(time.is_finite() && sigma.is_finite()) {
        return Err(FitFailure::NonFinite);
    }

    Ok(KvwFit { time, sigma })
}

/// `S(t)`, or infinity when fewer than [`KVW_MIN_MIRRORED`] reflections land in range.
fn mirror_sum_of_squares(
    x: &[f64],
    y: &[f64],
    interp: &LinearInterpolator<'_>,
    t: f64,
    x_lo: f64,
    x_hi: f64,
) -> f64 {
    let mut retained = 0usize;
    let mut sum = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let reflected = 2.0 * t - xi;
        if reflected >= x_lo && reflected <= x_hi {
            let d = yi - interp.eval(reflected);
            sum += d * d;
            retained += 1;
        }
    }
    if retained < KVW_MIN_MIRRORED { f64::INFINITY } else { sum }
}

/// Single-shot KvW estimate.
pub fn kvw_minimum(times: &[f64], mags: &[f64]) -> FitResult {
    match fit_kvw(times, mags) {
        Ok(fit) => FitResult::Success(FitSuccess {
            time: fit.time,
            sigma: fit.sigma,
            curve: Vec::new(),
        }),
        Err(reason) => FitResult::Failed(reason),
    }
}
