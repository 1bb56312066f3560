//! Minimum-time estimation for single eclipse events.
//!
//! Responsibilities:
//!
//! - parabolic vertex fit with covariance-propagated sigma
//! - Kwee–van Woerden mirror-symmetry search
//! - Monte-Carlo replacement of both analytic sigmas (parallel replicas)

pub mod estimator;
pub mod kvw;
pub mod monte_carlo;
pub mod parabolic;

pub use estimator::*;
pub use kvw::*;
pub use monte_carlo::*;
pub use parabolic::*;
