//! Datasource resolver: merges a target datasource definition into the
//! common layer.

use std::path::Path;

use crate::artifact::{read_json, read_text, write_json};
use crate::error::{DatasourceError, DatasourceResult};
use crate::logs::{log_info_indent, log_success, log_warning};
use crate::models::{CommonDocument, ResolvedDatasource};
use crate::parser::parse_datasource_markup;

/// Parse datasource markup, attributing errors to `path`.
pub fn resolve(markup: &str, path: &Path) -> DatasourceResult<ResolvedDatasource> {
    parse_datasource_markup(markup).map_err(|message| DatasourceError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Read and parse the datasource file at `path`.
pub fn resolve_file(path: &Path) -> DatasourceResult<ResolvedDatasource> {
    let markup = read_text(path)?;
    resolve(&markup, path)
}

/// Merge `resolved` into the common document's datasource section.
pub fn merge(common: &mut CommonDocument, resolved: ResolvedDatasource) {
    if !resolved.declared {
        log_warning("No <datasource> element found; keeping the placeholder name");
    }
    log_info_indent(
        format!(
            "Datasource {} with {} column(s)",
            resolved.name.as_deref().unwrap_or("(unnamed)"),
            resolved.columns.len()
        ),
        1,
    );
    common.workbook.data_source.merge(resolved);
}

/// Merge the datasource at `datasource_path` into the common layer at
/// `common_path` and write the result to `output`.
///
/// `output` may equal `common_path` to update the document in place.
pub fn run(
    common_path: &Path,
    datasource_path: &Path,
    output: &Path,
) -> DatasourceResult<CommonDocument> {
    let mut common: CommonDocument = read_json(common_path)?;
    let resolved = resolve_file(datasource_path)?;
    merge(&mut common, resolved);
    write_json(output, &common)?;
    log_success(format!("Datasource merged into {}", output.display()));
    Ok(common)
}
