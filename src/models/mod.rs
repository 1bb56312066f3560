//! Model implementations.
//!
//! Models are small, pure value types so the estimators can stay generic.

pub mod model;

pub use model::*;
