//! # Sheetbridge - BI workbook conversion through a common layer
//!
//! Sheetbridge converts the sheets and charts of an unbuilt source app export
//! into a target dashboarding tool's workbook. Charts are first reduced to a
//! tool-neutral common layer, then re-expanded against the target
//! datasource's columns.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ App export  │────▶│  Flattener  │────▶│   Common    │────▶│   Target    │
//! │ (objects/)  │     │ (libraries) │     │   layer     │     │ (JSON, XML) │
//! └─────────────┘     └─────────────┘     └──────▲──────┘     └─────────────┘
//!                                                │
//!                                     ┌──────────┴──────────┐
//!                                     │ Datasource resolver │
//!                                     └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetbridge::{run, PipelineOptions};
//!
//! let report = run(&PipelineOptions::new("exports/sales", "sales.tds", "out")).unwrap();
//! println!("Wrote {} worksheets", report.worksheet_count);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`logs`] - Broadcast logging
//! - [`models`] - Artifact models (flattened, common, target)
//! - [`config`] - Function/chart dictionary
//! - [`artifact`] - JSON/XML artifact I/O
//! - [`parser`] - Equations, load scripts, datasource markup
//! - [`cache`] - Library cache
//! - [`transform`] - Stages, assembly, and pipeline

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Configuration
pub mod config;

// Artifact I/O
pub mod artifact;

// Parsing
pub mod parser;

// Caching
pub mod cache;

// Transformation
pub mod transform;

pub use transform::pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ArtifactError,
    ConfigError,
    DatasourceError,
    EquationError,
    PipelineError,
    PipelineResult,
    SourceError,
    TargetError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CommonDocument,
    DataColumn,
    Equation,
    FieldBinding,
    FlattenedWorkbook,
    TargetChartEntry,
    TargetDocument,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{Dictionary, FunctionInfo, ValueKind};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{discover_data_sources, parse_datasource_markup, parse_equation};

// =============================================================================
// Re-exports - Cache
// =============================================================================

pub use cache::{Library, LibraryCache, LibraryKind};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{run, PipelineOptions, PipelineReport};
