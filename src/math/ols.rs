//! Polynomial least squares with coefficient covariance.
//!
//! Both minimum-time estimators reduce to small polynomial regressions:
//!
//! ```text
//! minimize Σ (y_i - Σ_j c_j x_i^(d-j))^2
//! ```
//!
//! Implementation choices:
//! - Columns of the Vandermonde matrix are scaled to unit norm before solving,
//!   which keeps the normal matrix well conditioned for quadratic terms.
//! - We solve with SVD (Nalgebra's `QR::solve` is intended for square systems and
//!   will panic for the tall design matrices used here).
//! - The covariance is `(XᵀX)⁻¹ · SSE / (n - order)`, the same scaling as the
//!   usual `polyfit(..., cov=True)` convention.

use nalgebra::{DMatrix, DVector};

use crate::domain::FitFailure;

/// Result of a polynomial fit. Coefficients are ordered highest power first.
#[derive(Debug, Clone)]
pub struct PolyFit {
    pub coefficients: Vec<f64>,
    /// Present only when requested and the normal matrix was invertible.
    pub covariance: Option<DMatrix<f64>>,
    pub sse: f64,
}

impl PolyFit {
    /// Evaluate the fitted polynomial (Horner).
    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients.iter().fold(0.0, |acc, c| acc * x + c)
    }
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if a strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit a polynomial of `degree` to `(x, y)`.
///
/// With `covariance = true` the fit needs strictly more points than
/// coefficients so the residual variance can be scaled.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize, covariance: bool) -> Result<PolyFit, FitFailure> {
    let order = degree + 1;
    let n = x.len().min(y.len());
    let required = if covariance { order + 1 } else { order };
    if n < required {
        return Err(FitFailure::TooFewPoints { n, required });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(FitFailure::NonFinite);
    }

    // Vandermonde matrix, highest power in column 0.
    let mut lhs = DMatrix::<f64>::zeros(n, order);
    for (i, &xi) in x.iter().take(n).enumerate() {
        let mut p = 1.0;
        for j in (0..order).rev() {
            lhs[(i, j)] = p;
            p *= xi;
        }
    }

    let mut scale = vec![0.0; order];
    for (j, s) in scale.iter_mut().enumerate() {
        *s = lhs.column(j).norm();
        if !(s.is_finite() && *s > 0.0) {
            return Err(FitFailure::SingularMatrix);
        }
        for i in 0..n {
            lhs[(i, j)] /= *s;
        }
    }

    let rank_tol = n as f64 * f64::EPSILON;
    let singular_values = lhs.clone().svd(false, false).singular_values;
    let s_max = singular_values.max();
    if singular_values.iter().any(|&s| s <= rank_tol * s_max) {
        return Err(FitFailure::SingularMatrix);
    }

    let rhs = DVector::from_iterator(n, y.iter().take(n).copied());
    let solution = solve_least_squares(&lhs, &rhs).ok_or(FitFailure::SingularMatrix)?;
    let coefficients: Vec<f64> = solution.iter().zip(&scale).map(|(c, s)| c / s).collect();

    let fit = PolyFit {
        coefficients,
        covariance: None,
        sse: 0.0,
    };
    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let r = yi - fit.eval(xi);
            r * r
        })
        .sum();
    if !sse.is_finite() {
        return Err(FitFailure::NonFinite);
    }

    let covariance = if covariance {
        let normal = lhs.transpose() * &lhs;
        let inv = normal.try_inverse().ok_or(FitFailure::SingularMatrix)?;
        let factor = sse / (n - order) as f64;
        let cov = DMatrix::from_fn(order, order, |i, j| inv[(i, j)] / (scale[i] * scale[j]) * factor);
        if cov.iter().any(|v| !v.is_finite()) {
            return Err(FitFailure::NonFinite);
        }
        Some(cov)
    } else {
        None
    };

    Ok(PolyFit {
        covariance,
        sse,
        ..fit
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn polyfit_recovers_exact_quadratic() {
        let x: Vec<f64> = (0..9).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = x.iter().map(|t| 2.0 * t * t - 3.0 * t + 0.5).collect();

        let fit = polyfit(&x, &y, 2, true).unwrap();
        assert!((fit.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((fit.coefficients[1] + 3.0).abs() < 1e-9);
        assert!((fit.coefficients[2] - 0.5).abs() < 1e-9);
        assert!(fit.sse < 1e-20, "sse={}", fit.sse);

        let cov = fit.covariance.unwrap();
        assert!(cov.iter().all(|v| v.abs() < 1e-15), "noiseless covariance must vanish");
    }

    #[test]
    fn polyfit_covariance_needs_extra_point() {
        let x = [0.0, 1.0, 2.0];
        let y = [1.0, 0.0, 1.0];
        assert!(polyfit(&x, &y, 2, false).is_ok());
        assert_eq!(
            polyfit(&x, &y, 2, true).unwrap_err(),
            FitFailure::TooFewPoints { n: 3, required: 4 }
        );
    }

    #[test]
    fn polyfit_flags_repeated_abscissa() {
        let x = [1.0; 6];
        let y = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(polyfit(&x, &y, 2, true).unwrap_err(), FitFailure::SingularMatrix);
    }

    #[test]
    fn polyfit_covariance_is_positive_with_noise() {
        let x: Vec<f64> = (0..12).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, t)| (t - 0.5) * (t - 0.5) + if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        let fit = polyfit(&x, &y, 2, true).unwrap();
        let cov = fit.covariance.unwrap();
        for i in 0..3 {
            assert!(cov[(i, i)] > 0.0);
        }
    }
}
