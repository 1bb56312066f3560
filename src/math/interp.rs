//! Piecewise-linear interpolation with linear extrapolation past both ends.

/// Guard for zero-width segments (repeated abscissae).
const X_EPS: f64 = 1e-12;

/// Linear interpolant over ascending knots.
#[derive(Debug, Clone, Copy)]
pub struct LinearInterpolator<'a> {
    xs: &'a [f64],
    ys: &'a [f64],
}

impl<'a> LinearInterpolator<'a> {
    /// Returns `None` unless there are at least two knots, the slices have
    /// equal length, and `xs` is non-decreasing.
    pub fn new(xs: &'a [f64], ys: &'a [f64]) -> Option<Self> {
        if xs.len() < 2 || xs.len() != ys.len() {
            return None;
        }
        if xs.windows(2).any(|w| w[1] < w[0]) {
            return None;
        }
        Some(Self { xs, ys })
    }

    /// Evaluate at `x`; outside `[xs[0], xs[n-1]]` the end segments are extended.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        // First knot >= x, clamped so that [i-1, i] is a valid segment.
        let i = self.xs.partition_point(|&k| k < x).clamp(1, n - 1);
        linear_interp((self.xs[i - 1], self.ys[i - 1]), (self.xs[i], self.ys[i]), x)
    }
}

fn linear_interp(a: (f64, f64), b: (f64, f64), x: f64) -> f64 {
    let (x0, y0) = a;
    let (x1, y1) = b;
    if (x1 - x0).abs() < X_EPS {
        return y0;
    }
    let u = (x - x0) / (x1 - x0);
    y0 + u * (y1 - y0)
}
