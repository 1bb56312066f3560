//! Series-level data handling.
//!
//! - splitting a folded light curve into eclipse events (`segment`)
//! - reproducible synthetic light curves for demos and tests (`synthetic`)

pub mod segment;
pub mod synthetic;

pub use segment::*;
pub use synthetic::*;
