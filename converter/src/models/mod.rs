//! Domain models for the sheetbridge conversion pipeline.
//!
//! Every artifact exchanged between stages is one of these serde types:
//!
//! - [`FlattenedWorkbook`] - Flattener output (per-sheet objects + data sources)
//! - [`CommonDocument`] - Tool-neutral common layer
//! - [`DataColumn`] / [`ResolvedDatasource`] - Target datasource metadata
//! - [`TargetChartEntry`] - One expanded target chart
//! - [`TargetDocument`] - Assembled target workbook
//!
//! Field names follow the JSON artifacts, which is why several of them are
//! renamed to the source or target tool's casing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Flattener output
// =============================================================================

/// A definition or label that is either a single string or a list of strings.
///
/// Inline bindings and measure-library bindings carry a single string,
/// dimension-library bindings carry the library's field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldText {
    Single(String),
    List(Vec<String>),
}

impl FieldText {
    /// The primary string: the value itself, or the first list element.
    pub fn first(&self) -> &str {
        match self {
            FieldText::Single(s) => s,
            FieldText::List(items) => items.first().map(String::as_str).unwrap_or(""),
        }
    }
}

impl Default for FieldText {
    fn default() -> Self {
        FieldText::Single(String::new())
    }
}

impl From<&str> for FieldText {
    fn from(s: &str) -> Self {
        FieldText::Single(s.to_string())
    }
}

/// One dimension or expression entry of a sheet object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    #[serde(rename = "Definition", default)]
    pub definition: FieldText,
    #[serde(rename = "Label", default)]
    pub label: FieldText,
    #[serde(rename = "LabelExpression", default, skip_serializing_if = "Option::is_none")]
    pub label_expression: Option<String>,
}

impl FieldBinding {
    /// An inline binding (no label expression).
    pub fn inline(definition: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            definition: FieldText::Single(definition.into()),
            label: FieldText::Single(label.into()),
            label_expression: None,
        }
    }
}

/// Identity of a sheet object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetObjectInfo {
    #[serde(rename = "ObjectId")]
    pub object_id: String,
    #[serde(rename = "Caption", default)]
    pub caption: String,
    #[serde(rename = "Type", default)]
    pub object_type: String,
}

/// One chart, table or other object on a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetObjectRecord {
    #[serde(rename = "sheet_object_info")]
    pub info: SheetObjectInfo,
    #[serde(rename = "dimension", default)]
    pub dimensions: Vec<FieldBinding>,
    #[serde(rename = "expression", default)]
    pub expressions: Vec<FieldBinding>,
}

impl SheetObjectRecord {
    /// Create an object record with no bindings.
    pub fn new(
        object_id: impl Into<String>,
        caption: impl Into<String>,
        object_type: impl Into<String>,
    ) -> Self {
        Self {
            info: SheetObjectInfo {
                object_id: object_id.into(),
                caption: caption.into(),
                object_type: object_type.into(),
            },
            dimensions: Vec::new(),
            expressions: Vec::new(),
        }
    }

    /// Whether the mapper should emit a common record for this object.
    pub fn is_chart_like(&self) -> bool {
        let kind = self.info.object_type.to_lowercase();
        kind.contains("chart") || kind.contains("table")
    }
}

/// Ids of all child objects on a sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildObjects {
    #[serde(rename = "ObjectId", default)]
    pub object_ids: Vec<String>,
}

/// Sheet-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetInfo {
    #[serde(rename = "SheetId", default)]
    pub sheet_id: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "ChildObjects", default)]
    pub child_objects: ChildObjects,
}

/// Flattened content of one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetContents {
    pub sheet_info: SheetInfo,
    #[serde(default)]
    pub sheet_objects: Vec<SheetObjectRecord>,
}

/// Wrapper matching the `{"Document": ...}` envelope of a flattened sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetDocument {
    #[serde(rename = "Document")]
    pub document: SheetContents,
}

/// Flattener output for a whole app export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenedWorkbook {
    /// Sheets keyed by source file name.
    #[serde(default)]
    pub ws_sheets: BTreeMap<String, SheetDocument>,
    /// Data source names found in the load script, in order of appearance.
    #[serde(default)]
    pub data_sources: Vec<String>,
}

// =============================================================================
// Common layer
// =============================================================================

/// An `(aggregation, column)` pair, both lower-cased.
///
/// Both fields empty means "no binding on this axis".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equation {
    pub aggregation: String,
    pub column: String,
}

impl Equation {
    pub fn new(aggregation: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            aggregation: aggregation.into(),
            column: column.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.aggregation.is_empty() && self.column.is_empty()
    }

    /// Column reference in target bracket syntax.
    pub fn column_ref(&self) -> String {
        format!("[{}]", self.column)
    }
}

/// Descriptive part of a common chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDescription {
    #[serde(rename = "type", default)]
    pub chart_type: String,
    #[serde(default)]
    pub title: String,
}

/// Tool-neutral chart description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonChartRecord {
    pub description: ChartDescription,
    #[serde(default)]
    pub x_equation: Equation,
    #[serde(default)]
    pub y_equation: Equation,
}

/// One column exposed by the target datasource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataColumn {
    pub datatype: Option<String>,
    pub name: String,
    pub role: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl DataColumn {
    /// Column name without the surrounding brackets.
    pub fn bare_name(&self) -> &str {
        bare_column_name(&self.name)
    }
}

/// Strip one pair of surrounding brackets from a column reference.
pub fn bare_column_name(name: &str) -> &str {
    name.trim_start_matches('[').trim_end_matches(']')
}

/// Datasource section of the common layer.
///
/// Starts as a placeholder naming the source data source; the resolver adds
/// the target datasource's name, caption and columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceSection {
    #[serde(default)]
    pub data_source_name: Option<String>,
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub unique_script: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<BTreeMap<String, DataColumn>>,
}

impl DataSourceSection {
    /// Fresh placeholder for a common layer built from `data_source_name`.
    pub fn placeholder(data_source_name: Option<String>) -> Self {
        Self {
            data_source_name,
            table_name: "<name_of_table_in_ds>".to_string(),
            unique_script: "unique_script_for_this_data_source".to_string(),
            name: None,
            caption: None,
            columns: None,
        }
    }

    /// Merge a resolved target datasource into this section.
    ///
    /// Name and caption are overwritten only when the markup declared a
    /// datasource element; columns are always replaced.
    pub fn merge(&mut self, resolved: ResolvedDatasource) {
        if resolved.declared {
            self.name = resolved.name;
            self.caption = resolved.caption;
        }
        self.columns = Some(resolved.columns);
    }

    /// Resolved columns, empty when the resolver has not run.
    pub fn column_map(&self) -> &BTreeMap<String, DataColumn> {
        static EMPTY: BTreeMap<String, DataColumn> = BTreeMap::new();
        self.columns.as_ref().unwrap_or(&EMPTY)
    }
}

/// Charts of one sheet keyed by object id.
pub type CommonSheet = BTreeMap<String, CommonChartRecord>;

/// Body of the common layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonWorkbook {
    pub data_source: DataSourceSection,
    /// Sheets keyed by source file name.
    #[serde(flatten)]
    pub sheets: BTreeMap<String, CommonSheet>,
}

/// The common layer document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonDocument {
    #[serde(rename = "Workbook")]
    pub workbook: CommonWorkbook,
}

/// Target datasource metadata parsed from markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDatasource {
    /// Whether any datasource element was present.
    pub declared: bool,
    pub name: Option<String>,
    pub caption: Option<String>,
    pub columns: BTreeMap<String, DataColumn>,
}

// =============================================================================
// Target chart entries
// =============================================================================

/// A column paired with an aggregation, as the target tool references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInstance {
    #[serde(rename = "@column")]
    pub column: String,
    #[serde(rename = "@derivation")]
    pub derivation: String,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@pivot")]
    pub pivot: String,
    #[serde(rename = "@type")]
    pub kind: String,
}

/// A datasource column the chart depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyColumn {
    #[serde(rename = "@caption")]
    pub caption: String,
    #[serde(rename = "@datatype")]
    pub datatype: Option<String>,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@role")]
    pub role: String,
    #[serde(rename = "@type")]
    pub kind: String,
}

impl From<&DataColumn> for DependencyColumn {
    fn from(column: &DataColumn) -> Self {
        Self {
            caption: column.bare_name().to_string(),
            datatype: column.datatype.clone(),
            name: column.name.clone(),
            role: column.role.clone(),
            kind: column.kind.clone(),
        }
    }
}

/// Element carrying a single `value` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueAttr {
    #[serde(rename = "@value")]
    pub value: String,
}

impl ValueAttr {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneView {
    pub breakdown: ValueAttr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "@class")]
    pub class: String,
}

/// Pane rendering settings of a target chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneStyle {
    #[serde(rename = "@selection-relaxation-option")]
    pub selection_relaxation_option: String,
    pub view: PaneView,
    pub mark: Mark,
}

impl PaneStyle {
    /// Default pane for a chart drawn with `mark_class`.
    pub fn new(mark_class: impl Into<String>) -> Self {
        Self {
            selection_relaxation_option: "selection-relaxation-allow".to_string(),
            view: PaneView {
                breakdown: ValueAttr::new("auto"),
            },
            mark: Mark {
                class: mark_class.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneDimensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_dimension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_dimension: Option<String>,
    pub pane: PaneStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneColumns {
    #[serde(rename = "@datasource")]
    pub datasource: String,
    #[serde(rename = "column-instance", default)]
    pub column_instances: Vec<ColumnInstance>,
    #[serde(rename = "column", default)]
    pub columns: Vec<DependencyColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPane {
    pub dimensions: PaneDimensions,
    pub columns: PaneColumns,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartObjects {
    pub pane: ChartPane,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSheetInfo {
    #[serde(rename = "Sheet_Id")]
    pub sheet_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "ChildObjects")]
    pub child_objects: Vec<String>,
}

/// One fully expanded target chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetChartEntry {
    pub sheet_info: TargetSheetInfo,
    pub sheet_objects: ChartObjects,
}

impl TargetChartEntry {
    pub fn pane(&self) -> &ChartPane {
        &self.sheet_objects.pane
    }
}

// =============================================================================
// Target document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceRef {
    #[serde(rename = "@caption")]
    pub caption: String,
    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDatasources {
    pub datasource: DatasourceRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceDependencies {
    #[serde(rename = "@datasource")]
    pub datasource: String,
    #[serde(rename = "column-instance", default)]
    pub column_instances: Vec<ColumnInstance>,
    #[serde(rename = "column", default)]
    pub columns: Vec<DependencyColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub datasources: ViewDatasources,
    #[serde(rename = "datasource-dependencies")]
    pub dependencies: DatasourceDependencies,
    pub aggregation: ValueAttr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panes {
    pub pane: PaneStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksheetTable {
    pub view: TableView,
    /// Always empty; kept so the element is emitted.
    pub style: Option<String>,
    pub panes: Panes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cols: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleId {
    #[serde(rename = "@uuid")]
    pub uuid: String,
}

/// One target worksheet (one chart).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheet {
    #[serde(rename = "@name")]
    pub name: String,
    pub table: WorksheetTable,
    #[serde(rename = "simple-id")]
    pub simple_id: SimpleId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheets {
    #[serde(default)]
    pub worksheet: Vec<Worksheet>,
}

/// Assembled target workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDocument {
    pub worksheets: Worksheets,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_text_first() {
        assert_eq!(FieldText::from("Sum(Sales)").first(), "Sum(Sales)");
        assert_eq!(
            FieldText::List(vec!["Region".into(), "Country".into()]).first(),
            "Region"
        );
        assert_eq!(FieldText::List(vec![]).first(), "");
    }

    #[test]
    fn test_field_binding_accepts_list_and_string() {
        let binding: FieldBinding = serde_json::from_value(json!({
            "Definition": ["Region"],
            "Label": [""],
            "LabelExpression": ""
        }))
        .unwrap();
        assert_eq!(binding.definition, FieldText::List(vec!["Region".into()]));

        let binding: FieldBinding = serde_json::from_value(json!({
            "Definition": "Sum(Sales)",
            "Label": "Sales"
        }))
        .unwrap();
        assert_eq!(binding.definition.first(), "Sum(Sales)");
        assert!(binding.label_expression.is_none());
    }

    #[test]
    fn test_missing_binding_lists_default_to_empty() {
        let record: SheetObjectRecord = serde_json::from_value(json!({
            "sheet_object_info": { "ObjectId": "abc", "Caption": "", "Type": "text-image" }
        }))
        .unwrap();
        assert!(record.dimensions.is_empty());
        assert!(record.expressions.is_empty());
        assert!(!record.is_chart_like());
    }

    #[test]
    fn test_chart_like_is_case_insensitive() {
        assert!(SheetObjectRecord::new("a", "", "barchart").is_chart_like());
        assert!(SheetObjectRecord::new("b", "", "Pivot-Table").is_chart_like());
        assert!(!SheetObjectRecord::new("c", "", "filterpane").is_chart_like());
    }

    #[test]
    fn test_common_workbook_flattens_sheets() {
        let doc: CommonDocument = serde_json::from_value(json!({
            "Workbook": {
                "data_source": {
                    "data_source_name": "orders",
                    "table_name": "<name_of_table_in_ds>",
                    "unique_script": "unique_script_for_this_data_source"
                },
                "sheet-1.json": {
                    "obj1": {
                        "description": { "type": "barchart", "title": "Sales" },
                        "x_equation": { "aggregation": "none", "column": "region" },
                        "y_equation": { "aggregation": "sum", "column": "sales" }
                    }
                }
            }
        }))
        .unwrap();

        assert_eq!(doc.workbook.sheets.len(), 1);
        assert_eq!(doc.workbook.sheets["sheet-1.json"]["obj1"].y_equation.column, "sales");
        assert!(doc.workbook.data_source.columns.is_none());

        let back = serde_json::to_value(&doc).unwrap();
        assert!(back["Workbook"]["sheet-1.json"]["obj1"].is_object());
        assert!(back["Workbook"]["data_source"].get("columns").is_none());
    }

    #[test]
    fn test_pane_dimensions_omit_absent_fields() {
        let dims = PaneDimensions {
            x_dimension: None,
            y_dimension: Some("[ds].[sum:Sales:qk]".into()),
            pane: PaneStyle::new("Bar"),
        };
        let json = serde_json::to_value(&dims).unwrap();
        assert!(json.get("x_dimension").is_none());
        assert_eq!(json["y_dimension"], "[ds].[sum:Sales:qk]");
        assert_eq!(json["pane"]["mark"]["@class"], "Bar");
    }

    #[test]
    fn test_merge_keeps_name_when_undeclared() {
        let mut section = DataSourceSection::placeholder(Some("orders".into()));
        section.name = Some("federated.1".into());
        section.merge(ResolvedDatasource::default());
        assert_eq!(section.name.as_deref(), Some("federated.1"));
        assert!(section.columns.as_ref().unwrap().is_empty());
    }
}
