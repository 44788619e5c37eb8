//! High-level pipeline API for source export to target workbook conversion.
//!
//! Runs the four stages in dependency order, writing every intermediate
//! artifact into one output directory:
//!
//! ```text
//! source_dir ──flatten──▶ flattened.json ──common──▶ common_layer.json
//!                                                        │
//! datasource.xml ─────────────────resolve (in place)─────┤
//!                                                        ▼
//!                                          target.json + target.xml
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetbridge::pipeline::{run, PipelineOptions};
//!
//! let report = run(&PipelineOptions::new("exports/sales", "sales.tds", "out"))?;
//! println!("{} worksheet(s)", report.worksheet_count);
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Dictionary;
use crate::error::PipelineResult;
use crate::logs::{log_info, log_success};
use crate::transform::{common, datasource, flatten, target};

/// Flattener output file name.
pub const FLATTENED_FILE: &str = "flattened.json";
/// Common layer file name (merged in place by the resolver).
pub const COMMON_FILE: &str = "common_layer.json";
/// Target JSON file name.
pub const TARGET_JSON_FILE: &str = "target.json";
/// Target XML file name.
pub const TARGET_XML_FILE: &str = "target.xml";

/// Options for a full pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Root of the unbuilt source app export
    pub source_dir: PathBuf,

    /// Target datasource definition (markup)
    pub datasource: PathBuf,

    /// Directory receiving every artifact (created if missing)
    pub output_dir: PathBuf,

    /// Function and chart lookup tables
    pub dictionary: Dictionary,
}

impl PipelineOptions {
    /// Options with the built-in dictionary.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        datasource: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            datasource: datasource.into(),
            output_dir: output_dir.into(),
            dictionary: Dictionary::builtin(),
        }
    }

    pub fn with_dictionary(mut self, dictionary: Dictionary) -> Self {
        self.dictionary = dictionary;
        self
    }

    fn artifact(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Number of sheets flattened
    pub sheet_count: usize,

    /// Number of objects across all sheets
    pub object_count: usize,

    /// Number of charts kept in the common layer
    pub chart_count: usize,

    /// Number of target worksheets written
    pub worksheet_count: usize,

    /// Data sources discovered in the load script
    pub data_sources: Vec<String>,

    /// Resolved target datasource name
    pub datasource_name: Option<String>,

    pub flattened_path: PathBuf,
    pub common_path: PathBuf,
    pub target_json_path: PathBuf,
    pub target_xml_path: PathBuf,
}

/// Run all four stages.
///
/// Stops at the first fatal error; artifacts written by earlier stages are
/// left in place.
pub fn run(options: &PipelineOptions) -> PipelineResult<PipelineReport> {
    log_info(format!(
        "🚀 Converting {} with datasource {}",
        options.source_dir.display(),
        options.datasource.display()
    ));

    let flattened_path = options.artifact(FLATTENED_FILE);
    let common_path = options.artifact(COMMON_FILE);
    let target_json_path = options.artifact(TARGET_JSON_FILE);
    let target_xml_path = options.artifact(TARGET_XML_FILE);

    // 1. Flatten
    let flattened = flatten::run(&options.source_dir, &flattened_path)?;

    // 2. Common layer
    common::run(&flattened_path, &common_path)?;

    // 3. Resolve the datasource into the common layer
    let merged = datasource::run(&common_path, &options.datasource, &common_path)?;

    // 4. Target
    let document = target::run(
        &common_path,
        &target_json_path,
        Some(&target_xml_path),
        &options.dictionary,
    )?;

    let report = PipelineReport {
        sheet_count: flattened.ws_sheets.len(),
        object_count: flattened
            .ws_sheets
            .values()
            .map(|s| s.document.sheet_objects.len())
            .sum(),
        chart_count: merged.workbook.sheets.values().map(|s| s.len()).sum(),
        worksheet_count: document.worksheets.worksheet.len(),
        data_sources: flattened.data_sources,
        datasource_name: merged.workbook.data_source.name,
        flattened_path,
        common_path,
        target_json_path,
        target_xml_path,
    };

    log_success(format!(
        "✅ {} sheet(s), {} chart(s), {} worksheet(s) written to {}",
        report.sheet_count,
        report.chart_count,
        report.worksheet_count,
        display_dir(&options.output_dir)
    ));
    Ok(report)
}

fn display_dir(dir: &Path) -> String {
    if dir.as_os_str().is_empty() {
        ".".to_string()
    } else {
        dir.display().to_string()
    }
}
