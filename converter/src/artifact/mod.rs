//! Reading and writing pipeline artifacts.
//!
//! Every stage reads its input and writes its output through these helpers,
//! so that failures always carry the offending path.

pub mod xml;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::{ArtifactError, ArtifactResult};

pub use xml::{json_to_xml, write_xml};

/// Read a text artifact.
pub fn read_text(path: &Path) -> ArtifactResult<String> {
    fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and deserialize a JSON artifact.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> ArtifactResult<T> {
    let content = read_text(path)?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a text artifact, creating parent directories.
pub fn write_text(path: &Path, content: &str) -> ArtifactResult<()> {
    let write_err = |source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, content).map_err(write_err)
}

/// Pretty-print `value` as JSON.
pub fn to_json_string<T: Serialize>(value: &T, path: &Path) -> ArtifactResult<String> {
    serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Serialize {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize `value` as pretty JSON into `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> ArtifactResult<()> {
    let mut content = to_json_string(value, path)?;
    content.push('\n');
    write_text(path, &content)
}
