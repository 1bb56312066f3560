//! The local quadratic model `y(x) = a·x² + b·x + c`.
//!
//! Both estimators approximate something near its minimum with this model:
//! - the parabolic method fits magnitude vs. offset time
//! - KvW fits the mirror sum-of-squares vs. trial centre
//!
//! Times are kept in an offset frame (`x = t - offset`) while fitting; the
//! offset is added back when reporting.

use crate::domain::{CurvePoint, FitFailure};
use crate::math::{PolyFit, linspace};

/// Quadratic coefficients, highest power first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadratic {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Quadratic {
    /// Take the coefficients of a degree-2 [`PolyFit`].
    pub fn from_fit(fit: &PolyFit) -> Result<Self, FitFailure> {
        match fit.coefficients.as_slice() {
            &[a, b, c] => Ok(Self { a, b, c }),
            _ => Err(FitFailure::NonFinite),
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        (self.a * x + self.b) * x + self.c
    }

    /// Abscissa of the turning point, `-b / 2a`.
    pub fn vertex(&self) -> Result<f64, FitFailure> {
        if self.a == 0.0 {
            return Err(FitFailure::DegenerateCurvature);
        }
        let x = -self.b / (2.0 * self.a);
        if x.is_finite() { Ok(x) } else { Err(FitFailure::NonFinite) }
    }

    /// Value at the turning point, `c - b² / 4a`.
    pub fn vertex_value(&self) -> f64 {
        self.c - (self.b * self.b) / (4.0 * self.a)
    }

    /// Sample the model at `n` evenly spaced absolute times in `[t_min, t_max]`.
    pub fn sample_curve(&self, offset: f64, t_min: f64, t_max: f64, n: usize) -> Vec<CurvePoint> {
        linspace(t_min, t_max, n)
            .into_iter()
            .map(|time| CurvePoint {
                time,
                magnitude: self.eval(time - offset),
            })
            .collect()
    }
}
