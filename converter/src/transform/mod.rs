//! Transformation module.
//!
//! One sub-module per conversion stage:
//! - Flatten: source app export → flattened sheets
//! - Common: flattened sheets → common layer
//! - Datasource: target datasource merged into the common layer
//! - Target: common layer → target chart entries, assembled by the grouper
//! - Pipeline: all stages in order

pub mod common;
pub mod datasource;
pub mod flatten;
pub mod grouper;
pub mod pipeline;
pub mod target;

pub use grouper::assemble;
pub use pipeline::{run, PipelineOptions, PipelineReport};
