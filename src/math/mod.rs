//! Mathematical utilities: polynomial least squares, interpolation, grids and statistics.

pub mod grid;
pub mod interp;
pub mod ols;
pub mod stats;

pub use grid::*;
pub use interp::*;
pub use ols::*;
pub use stats::*;
