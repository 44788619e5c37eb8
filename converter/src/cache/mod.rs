//! Library cache - dimension and measure libraries of a source app export.
//!
//! Libraries live next to the sheet documents (`dimensions.json`,
//! `measures.json`). Each one is read on first use and kept for the rest of
//! the run. The cache is owned by the caller and passed into resolution.

use once_cell::unsync::OnceCell;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::artifact::read_json;
use crate::error::ArtifactResult;
use crate::logs::log_info_indent;
use crate::models::{FieldBinding, FieldText};

/// Which library a binding is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    Dimensions,
    Measures,
}

impl LibraryKind {
    /// File name of the library inside the objects directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            LibraryKind::Dimensions => "dimensions.json",
            LibraryKind::Measures => "measures.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LibraryKind::Dimensions => "dimension",
            LibraryKind::Measures => "measure",
        }
    }
}

/// Library entries in file order.
#[derive(Debug, Clone, Default)]
pub struct Library {
    entries: Vec<(String, FieldBinding)>,
}

impl Library {
    /// Build a library from its raw JSON entries.
    ///
    /// Entries without `qInfo.qId` are ignored. Entries sharing an id are
    /// all kept.
    pub fn from_entries(kind: LibraryKind, raw: &[Value]) -> Self {
        let mut entries = Vec::with_capacity(raw.len());
        for item in raw {
            let Some(id) = item.pointer("/qInfo/qId").and_then(Value::as_str) else {
                continue;
            };
            let binding = match kind {
                LibraryKind::Dimensions => dimension_binding(item.get("qDim")),
                LibraryKind::Measures => measure_binding(item.get("qMeasure")),
            };
            entries.push((id.to_string(), binding));
        }
        Self { entries }
    }

    /// First binding with library id `id`.
    pub fn get(&self, id: &str) -> Option<&FieldBinding> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, binding)| binding)
    }

    /// Bindings referenced by `ids`, in library order.
    ///
    /// Each entry yields one binding per matching reference, so an id listed
    /// twice by an object yields its binding twice.
    pub fn lookup_all(&self, ids: &[&str]) -> Vec<FieldBinding> {
        let mut bindings = Vec::new();
        for (entry_id, binding) in &self.entries {
            for _ in ids.iter().filter(|id| **id == entry_id.as_str()) {
                bindings.push(binding.clone());
            }
        }
        bindings
    }

    /// Whether any entry has library id `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(entry_id, _)| entry_id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn string_list(value: Option<&Value>) -> FieldText {
    match value.and_then(Value::as_array) {
        Some(items) => FieldText::List(
            items
                .iter()
                .map(|v| v.as_str().unwrap_or_default().to_string())
                .collect(),
        ),
        None => FieldText::List(vec![String::new()]),
    }
}

fn string_field(value: Option<&Value>, key: &str) -> String {
    value
        .and_then(|v| v.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn dimension_binding(dim: Option<&Value>) -> FieldBinding {
    FieldBinding {
        definition: string_list(dim.and_then(|d| d.get("qFieldDefs"))),
        label: string_list(dim.and_then(|d| d.get("qFieldLabels"))),
        label_expression: Some(string_field(dim, "qLabelExpression")),
    }
}

fn measure_binding(measure: Option<&Value>) -> FieldBinding {
    FieldBinding {
        definition: FieldText::Single(string_field(measure, "qDef")),
        label: FieldText::Single(string_field(measure, "qLabel")),
        label_expression: Some(string_field(measure, "qLabelExpression")),
    }
}

/// Lazily loaded libraries of one app export.
pub struct LibraryCache {
    /// Directory holding the library files
    dir: PathBuf,
    dimensions: OnceCell<Library>,
    measures: OnceCell<Library>,
}

impl LibraryCache {
    /// Create a cache reading libraries from `dir` on first use.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: PathBuf::from(dir.as_ref()),
            dimensions: OnceCell::new(),
            measures: OnceCell::new(),
        }
    }

    /// Create a cache with both libraries already loaded.
    pub fn preloaded(dimensions: Library, measures: Library) -> Self {
        Self {
            dir: PathBuf::new(),
            dimensions: OnceCell::with_value(dimensions),
            measures: OnceCell::with_value(measures),
        }
    }

    fn cell(&self, kind: LibraryKind) -> &OnceCell<Library> {
        match kind {
            LibraryKind::Dimensions => &self.dimensions,
            LibraryKind::Measures => &self.measures,
        }
    }

    /// The library of `kind`, reading it from disk on first call.
    ///
    /// A missing or unreadable library file is an error.
    pub fn library(&self, kind: LibraryKind) -> ArtifactResult<&Library> {
        self.cell(kind).get_or_try_init(|| {
            let path = self.dir.join(kind.file_name());
            let raw: Vec<Value> = read_json(&path)?;
            let library = Library::from_entries(kind, &raw);
            log_info_indent(
                format!("Loaded {} {} entries from {}", library.len(), kind.label(), path.display()),
                1,
            );
            Ok(library)
        })
    }

    /// Whether the library of `kind` has been loaded.
    pub fn is_loaded(&self, kind: LibraryKind) -> bool {
        self.cell(kind).get().is_some()
    }
}
