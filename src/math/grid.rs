//! Evenly spaced grids.
//!
//! The KvW search and the plotted parabola both sample a closed interval at a
//! fixed number of points, endpoints included.

/// Generate `steps` evenly spaced points between `start` and `end` (inclusive).
///
/// `steps == 1` yields `[start]`; `steps == 0` yields an empty grid.
pub fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (steps as f64 - 1.0);
            let mut out: Vec<f64> = (0..steps).map(|i| start + step * i as f64).collect();
            // Pin the last point so rounding never leaves it short of `end`.
            out[steps - 1] = end;
            out
        }
    }
}
