//! Source flattener: app export → per-sheet object lists.
//!
//! # Input layout
//!
//! ```text
//! <root>/
//! ├── script.qvs              load script (data source discovery)
//! └── objects/
//!     ├── sheet-*.json        one document per sheet
//!     ├── dimensions.json     dimension library
//!     └── measures.json       measure library
//! ```
//!
//! # Binding resolution
//!
//! Each axis (dimensions, measures) of an object is resolved as a whole:
//! if any entry references a library id, the library is scanned in file order
//! and every entry matching a referenced id is emitted (unknown ids are
//! dropped); otherwise each entry's inline definition is used.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::artifact::{read_json, read_text, write_json};
use crate::cache::{LibraryCache, LibraryKind};
use crate::error::{ArtifactError, SourceError, SourceResult};
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{
    FieldBinding, FlattenedWorkbook, SheetContents, SheetDocument, SheetInfo, SheetObjectRecord,
};
use crate::parser::discover_data_sources;

/// Sub-directory holding sheet documents and libraries.
pub const OBJECTS_DIR: &str = "objects";

/// Load script file name, relative to the export root.
pub const SCRIPT_FILE: &str = "script.qvs";

/// Flatten an app export rooted at `root` and write the result to `output`.
pub fn run(root: &Path, output: &Path) -> SourceResult<FlattenedWorkbook> {
    let flattened = flatten_folder(root)?;
    write_json(output, &flattened)?;
    log_success(format!("Flattened workbook written to {}", output.display()));
    Ok(flattened)
}

/// Flatten every sheet of the export at `root` and discover its data sources.
pub fn flatten_folder(root: &Path) -> SourceResult<FlattenedWorkbook> {
    let objects_dir = root.join(OBJECTS_DIR);
    let files = sheet_files(&objects_dir)?;
    log_info(format!("📄 Flattening {} sheet(s) from {}", files.len(), objects_dir.display()));

    let cache = LibraryCache::new(&objects_dir);
    let mut flattened = FlattenedWorkbook::default();

    for path in files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data: Value = read_json(&path)?;
        let contents = flatten_sheet(&data, &cache)?;
        log_info(format!(
            "{}: {} object(s)",
            file_name,
            contents.sheet_objects.len()
        ));
        flattened
            .ws_sheets
            .insert(file_name, SheetDocument { document: contents });
    }

    let script_path = root.join(SCRIPT_FILE);
    let script = read_text(&script_path)?;
    flattened.data_sources = discover_data_sources(&script);
    if flattened.data_sources.is_empty() {
        log_warning(format!("No data source found in {}", script_path.display()));
    } else {
        log_success(format!("Data sources: {}", flattened.data_sources.join(", ")));
    }

    Ok(flattened)
}

/// JSON files whose name contains `sheet`, sorted by name.
pub fn sheet_files(objects_dir: &Path) -> SourceResult<Vec<PathBuf>> {
    if !objects_dir.is_dir() {
        return Err(SourceError::MissingObjects(objects_dir.to_path_buf()));
    }
    let read_err = |source| ArtifactError::Read {
        path: objects_dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(objects_dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".json") && name.contains("sheet") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Flatten one sheet document.
pub fn flatten_sheet(data: &Value, cache: &LibraryCache) -> SourceResult<SheetContents> {
    let mut contents = SheetContents {
        sheet_info: SheetInfo {
            sheet_id: str_at(data, "/qProperty/qInfo/qId"),
            title: str_at(data, "/qProperty/qMetaDef/title"),
            ..SheetInfo::default()
        },
        sheet_objects: Vec::new(),
    };

    let children = data
        .get("qChildren")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for child in children {
        let record = flatten_object(child, cache)?;
        contents
            .sheet_info
            .child_objects
            .object_ids
            .push(record.info.object_id.clone());
        contents.sheet_objects.push(record);
    }

    Ok(contents)
}

/// Flatten one child node of a sheet into an object record.
pub fn flatten_object(child: &Value, cache: &LibraryCache) -> SourceResult<SheetObjectRecord> {
    let mut record = SheetObjectRecord::new(
        str_at(child, "/qProperty/qInfo/qId"),
        str_at(child, "/qProperty/title"),
        str_at(child, "/qProperty/qInfo/qType"),
    );

    let dimensions = array_at(child, "/qProperty/qHyperCubeDef/qDimensions");
    let measures = array_at(child, "/qProperty/qHyperCubeDef/qMeasures");

    record.dimensions = resolve_axis(dimensions, LibraryKind::Dimensions, cache)?;
    record.expressions = resolve_axis(measures, LibraryKind::Measures, cache)?;
    Ok(record)
}

/// Resolve all entries of one axis, either all from the library or all inline.
///
/// Library bindings come out in library order, not in the order the object
/// references them.
pub fn resolve_axis(
    entries: &[Value],
    kind: LibraryKind,
    cache: &LibraryCache,
) -> SourceResult<Vec<FieldBinding>> {
    let library_ids: Vec<&str> = entries
        .iter()
        .filter_map(|e| e.get("qLibraryId").and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .collect();

    if library_ids.is_empty() {
        return Ok(entries
            .iter()
            .map(|entry| match kind {
                LibraryKind::Dimensions => inline_dimension(entry),
                LibraryKind::Measures => inline_measure(entry),
            })
            .collect());
    }

    let library = cache.library(kind)?;
    for id in library_ids.iter().filter(|id| !library.contains(id)) {
        log_warning(format!("Library {} '{}' not found, skipped", kind.label(), id));
    }
    let bindings = library.lookup_all(&library_ids);
    Ok(bindings)
}

fn inline_dimension(entry: &Value) -> FieldBinding {
    FieldBinding::inline(
        str_at(entry, "/qDef/qFieldDefs/0"),
        str_at(entry, "/qDef/qFieldLabels/0"),
    )
}

fn inline_measure(entry: &Value) -> FieldBinding {
    FieldBinding::inline(str_at(entry, "/qDef/qDef"), str_at(entry, "/qDef/qLabel"))
}

/// String at a JSON pointer, empty when absent or not a string.
fn str_at(value: &Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn array_at<'a>(value: &'a Value, pointer: &str) -> &'a [Value] {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
