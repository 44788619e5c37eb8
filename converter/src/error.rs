//! Error types for the sheetbridge conversion pipeline.
//!
//! This module defines a hierarchy of error types, one per stage:
//!
//! - [`ArtifactError`] - Reading/writing the files exchanged between stages
//! - [`SourceError`] - Source flattener errors
//! - [`DatasourceError`] - Target datasource resolution errors
//! - [`EquationError`] - Malformed equations (absorbed by the mapper)
//! - [`TargetError`] - Common-to-target mapping errors
//! - [`ConfigError`] - Dictionary configuration errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Artifact Errors
// =============================================================================

/// Errors reading or writing a pipeline artifact.
///
/// Every variant carries the path of the artifact involved.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Missing or unreadable file.
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File could not be written.
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not the expected JSON document.
    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// In-memory document could not be serialized.
    #[error("Failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// Source Flattener Errors
// =============================================================================

/// Errors while flattening a source app export.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A sheet, library or script artifact failed to load.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// The export has no objects directory.
    #[error("Objects directory not found: {}", .0.display())]
    MissingObjects(PathBuf),
}

// =============================================================================
// Datasource Resolver Errors
// =============================================================================

/// Errors while resolving the target datasource definition.
#[derive(Debug, Error)]
pub enum DatasourceError {
    /// Common layer or datasource file failed to load.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Datasource markup is not well-formed.
    #[error("Invalid datasource markup in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

// =============================================================================
// Equation Errors
// =============================================================================

/// An equation string outside the supported grammar.
///
/// Never surfaces to callers of the mapper: the mapper logs it and falls back
/// to a best-effort split.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquationError {
    #[error("Malformed equation '{input}': {reason}")]
    Malformed { input: String, reason: String },
}

// =============================================================================
// Common-to-Target Errors
// =============================================================================

/// Errors while expanding the common layer into the target document.
#[derive(Debug, Error)]
pub enum TargetError {
    /// Common layer failed to load or target document failed to write.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// XML serialization failed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Rendered XML was not valid UTF-8.
    #[error("XML encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// The common layer has not been merged with a target datasource.
    #[error("Datasource in {} is not resolved (run the datasource stage first)", .0.display())]
    UnresolvedDatasource(PathBuf),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors loading the lookup dictionary.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file failed to load.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Config file is not valid TOML for the dictionary.
    #[error("Invalid config {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Artifact error outside a specific stage.
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Source flattener error.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Datasource resolver error.
    #[error("Datasource error: {0}")]
    Datasource(#[from] DatasourceError),

    /// Common-to-target error.
    #[error("Target error: {0}")]
    Target(#[from] TargetError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for artifact I/O.
pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Result type for the source flattener.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for the datasource resolver.
pub type DatasourceResult<T> = Result<T, DatasourceError>;

/// Result type for the common-to-target mapper.
pub type TargetResult<T> = Result<T, TargetError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ArtifactError -> SourceError -> PipelineError
        let artifact = ArtifactError::Read {
            path: PathBuf::from("objects/dimensions.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let source: SourceError = artifact.into();
        let pipeline_err: PipelineError = source.into();
        assert!(pipeline_err.to_string().contains("objects/dimensions.json"));
    }

    #[test]
    fn test_parse_error_carries_path() {
        let err = DatasourceError::Parse {
            path: PathBuf::from("datasource.xml"),
            message: "unclosed <datasource>".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("datasource.xml"));
        assert!(msg.contains("unclosed"));
    }

    #[test]
    fn test_unresolved_datasource_message() {
        let err = TargetError::UnresolvedDatasource(PathBuf::from("common_layer.json"));
        assert!(err.to_string().contains("common_layer.json"));
    }
}
