//! Parabolic minimum-time estimator.
//!
//! Fit `m(x) = a·x² + b·x + c` to magnitude vs. offset time `x = t - t_0`
//! (offsetting keeps the Vandermonde matrix well conditioned for BJD-sized
//! times) and report the vertex `-b / 2a + t_0`.
//!
//! The analytic uncertainty propagates the coefficient covariance through the
//! vertex formula:
//!
//! ```text
//! σ² = |var_b / 4a² + b²·var_a / 4a⁴ - 2b·cov_ab / 4a³|
//! ```

use crate::domain::{CurvePoint, FitFailure, FitResult, FitSuccess};
use crate::math::polyfit;
use crate::models::Quadratic;

/// Points in the smooth curve handed to plot writers.
pub const CURVE_POINTS: usize = 50;

/// A successful parabolic fit, kept in the offset frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParabolicFit {
    pub offset: f64,
    pub model: Quadratic,
    /// Vertex in absolute time.
    pub time: f64,
    pub sigma: f64,
}

impl ParabolicFit {
    /// `observed - fitted` for each sample.
    pub fn residuals(&self, times: &[f64], mags: &[f64]) -> Vec<f64> {
        times
            .iter()
            .zip(mags)
            .map(|(&t, &m)| m - self.model.eval(t - self.offset))
            .collect()
    }

    /// The fitted parabola sampled across the data's time range.
    pub fn curve(&self, times: &[f64]) -> Vec<CurvePoint> {
        let t_min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let t_max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(t_min.is_finite() && t_max.is_finite()) {
            return Vec::new();
        }
        self.model.sample_curve(self.offset, t_min, t_max, CURVE_POINTS)
    }
}

/// Fit the parabola and derive the vertex time and its analytic sigma.
pub fn fit_parabola(times: &[f64], mags: &[f64]) -> Result<ParabolicFit, FitFailure> {
    let Some(&offset) = times.first() else {
        return Err(FitFailure::TooFewPoints { n: 0, required: 4 });
    };
    let x: Vec<f64> = times.iter().map(|t| t - offset).collect();

    let fit = polyfit(&x, mags, 2, true)?;
    let model = Quadratic::from_fit(&fit)?;
    let vertex = model.vertex()?;
    let cov = fit.covariance.ok_or(FitFailure::SingularMatrix)?;

    let Quadratic { a, b, .. } = model;
    let var_a = cov[(0, 0)];
    let var_b = cov[(1, 1)];
    let cov_ab = cov[(0, 1)];
    let variance = var_b / (4.0 * a.powi(2)) + (b.powi(2) * var_a) / (4.0 * a.powi(4))
        - (2.0 * b * cov_ab) / (4.0 * a.powi(3));
    let sigma = variance.abs().sqrt();
    let time = vertex + offset;

    if !(time.is_finite() && sigma.is_finite()) {
        return Err(FitFailure::NonFinite);
    }

    Ok(ParabolicFit {
        offset,
        model,
        time,
        sigma,
    })
}

/// Single-shot parabolic estimate including the plotted curve.
pub fn parabolic_minimum(times: &[f64], mags: &[f64]) -> FitResult {
    match fit_parabola(times, mags) {
        Ok(fit) => FitResult::Success(FitSuccess {
            time: fit.time,
            sigma: fit.sigma,
            curve: fit.curve(times),
        }),
        Err(reason) => FitResult::Failed(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dip(t0: f64, n: usize, step: f64) -> (Vec<f64>, Vec<f64>) {
        let times: Vec<f64> = (0..n).map(|k| t0 + (k as f64 - (n as f64 - 1.0) / 2.0) * step).collect();
        let mags = times.iter().map(|t| 12.0 + 3.0 * (t - t0).powi(2)).collect();
        (times, mags)
    }

    #[test]
    fn recovers_vertex_of_noiseless_dip() {
        let t0 = 2_450_000.5;
        let (times, mags) = dip(t0, 21, 0.01);
        let fit = fit_parabola(&times, &mags).unwrap();
        assert!((fit.time - t0).abs() < 1e-6, "time={} t0={t0}", fit.time);
        assert!(fit.sigma < 1e-6, "sigma={}", fit.sigma);
    }

    #[test]
    fn curve_spans_data_range() {
        let (times, mags) = dip(100.0, 11, 0.02);
        let FitResult::Success(s) = parabolic_minimum(&times, &mags) else {
            panic!("fit should succeed");
        };
        assert_eq!(s.curve.len(), CURVE_POINTS);
        assert_eq!(s.curve[0].time, times[0]);
        assert_eq!(s.curve[CURVE_POINTS - 1].time, times[10]);
        assert!((s.curve[0].magnitude - mags[0]).abs() < 1e-9);
    }

    #[test]
    fn straight_line_has_no_vertex() {
        let times: Vec<f64> = (0..8).map(|i| i as f64 * 0.01).collect();
        let mags: Vec<f64> = times.iter().map(|t| 10.0 + 0.5 * t).collect();
        match parabolic_minimum(&times, &mags) {
            FitResult::Failed(FitFailure::DegenerateCurvature) | FitResult::Failed(FitFailure::NonFinite) => {}
            FitResult::Failed(other) => panic!("unexpected failure {other}"),
            // Rounding may leave a tiny `a`; the vertex then sits far outside the data.
            FitResult::Success(s) => assert!((s.time - times[0]).abs() > 1.0),
        }
    }

    #[test]
    fn too_few_points_fail() {
        let r = parabolic_minimum(&[0.0, 0.1, 0.2], &[1.0, 0.0, 1.0]);
        assert_eq!(r, FitResult::Failed(FitFailure::TooFewPoints { n: 3, required: 4 }));
        assert_eq!(
            parabolic_minimum(&[], &[]),
            FitResult::Failed(FitFailure::TooFewPoints { n: 0, required: 4 })
        );
    }

    #[test]
    fn noisy_dip_has_positive_sigma() {
        let t0 = 50.0;
        let (times, mut mags) = dip(t0, 25, 0.01);
        for (i, m) in mags.iter_mut().enumerate() {
            *m += if i % 3 == 0 { 0.002 } else { -0.001 };
        }
        let fit = fit_parabola(&times, &mags).unwrap();
        assert!(fit.sigma > 0.0);
        assert!((fit.time - t0).abs() < 0.01);

        let res = fit.residuals(&times, &mags);
        assert_eq!(res.len(), times.len());
    }

    #[test]
    fn repeated_calls_are_identical() {
        let (times, mags) = dip(7.25, 15, 0.013);
        assert_eq!(parabolic_minimum(&times, &mags), parabolic_minimum(&times, &mags));
    }
}
