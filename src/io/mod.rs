//! Input/output helpers.
//!
//! - observation table ingest + validation (`ingest`)
//! - report and record writers (`export`)
//! - per-event plot JSON read/write (`curve`)

pub mod curve;
pub mod export;
pub mod ingest;

pub use curve::*;
pub use export::*;
pub use ingest::*;
