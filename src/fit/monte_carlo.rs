//! Monte-Carlo refinement of the analytic uncertainties.
//!
//! The noise level of an event is the standard deviation of its residuals
//! against the single-shot parabola. Each replica adds independent
//! `N(0, noise)` draws to the observed magnitudes and re-runs both methods;
//! the spread of the replica times becomes the reported sigma.
//!
//! Replicas are independent, so they run on the rayon pool. Every replica gets
//! its own `StdRng` seeded from a sub-seed drawn sequentially from the caller's
//! RNG, and results are collected in replica order: the outcome does not depend
//! on the number of worker threads.

use log::debug;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use rayon::prelude::*;

use crate::domain::{FitResult, Measurement, Timing};
use crate::fit::estimator::minimum_times;
use crate::fit::parabolic::ParabolicFit;
use crate::math::std_dev;

/// Default number of replicas.
pub const DEFAULT_ITERATIONS: usize = 100;

/// Refined timings for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Refined {
    pub parabolic: Measurement,
    pub kvw: Timing,
    /// Residual standard deviation used as the noise scale.
    pub noise_scale: f64,
    pub residuals: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UncertaintyEstimator {
    pub iterations: usize,
}

impl Default for UncertaintyEstimator {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl UncertaintyEstimator {
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    /// Replace analytic sigmas with Monte-Carlo ones where replicas succeed.
    ///
    /// Requires a successful parabolic fit; KvW may have failed, in which case
    /// it stays failed.
    pub fn refine<R: Rng + ?Sized>(
        &self,
        times: &[f64],
        mags: &[f64],
        parabola: &ParabolicFit,
        kvw: &FitResult,
        rng: &mut R,
    ) -> Refined {
        let residuals = parabola.residuals(times, mags);
        let noise_scale = std_dev(&residuals).unwrap_or(0.0);

        let (par_times, kvw_times) = self.replicate(times, mags, noise_scale, rng);

        let parabolic = Measurement {
            time: parabola.time,
            analytic_sigma: parabola.sigma,
            sigma: std_dev(&par_times).unwrap_or(parabola.sigma),
            replicas: par_times.len(),
        };
        let kvw = match kvw {
            FitResult::Success(s) => Timing::Measured(Measurement {
                time: s.time,
                analytic_sigma: s.sigma,
                sigma: std_dev(&kvw_times).unwrap_or(s.sigma),
                replicas: kvw_times.len(),
            }),
            FitResult::Failed(reason) => Timing::Failed(*reason),
        };

        Refined {
            parabolic,
            kvw,
            noise_scale,
            residuals,
        }
    }

    /// Successful replica times per method (parabolic, KvW), in replica order.
    ///
    /// With a zero (or unusable) noise scale every replica would equal the
    /// observed series, so none are run.
    fn replicate<R: Rng + ?Sized>(
        &self,
        times: &[f64],
        mags: &[f64],
        noise_scale: f64,
        rng: &mut R,
    ) -> (Vec<f64>, Vec<f64>) {
        if !(noise_scale.is_finite() && noise_scale > 0.0) || self.iterations == 0 {
            debug!("skipping Monte-Carlo replicas (noise scale {noise_scale})");
            return (Vec::new(), Vec::new());
        }
        let Ok(noise) = Normal::new(0.0, noise_scale) else {
            return (Vec::new(), Vec::new());
        };

        let seeds: Vec<u64> = (0..self.iterations).map(|_| rng.r#gen()).collect();
        let draws: Vec<(Option<f64>, Option<f64>)> = seeds
            .par_iter()
            .map(|&seed| {
                let mut local = StdRng::seed_from_u64(seed);
                let noisy: Vec<f64> = mags.iter().map(|m| m + noise.sample(&mut local)).collect();
                minimum_times(times, &noisy)
            })
            .collect();

        let par_times = draws.iter().filter_map(|d| d.0).collect();
        let kvw_times = draws.iter().filter_map(|d| d.1).collect();
        (par_times, kvw_times)
    }
}
