//! Common-to-target mapper.
//!
//! Expands every common chart into a [`TargetChartEntry`]: column instances
//! derived from the aggregation dictionary, the datasource columns the chart
//! depends on, and the qualified row/column dimensions. The entries are then
//! assembled into worksheets by [`grouper::assemble`].
//!
//! ```text
//! y_equation: (sum, revenue)
//!      │  column lookup  "[revenue]" → "[Revenue]"
//!      │  function lookup "sum"      → sum / quantitative
//!      ▼
//! column-instance  [sum:Revenue:qk]
//! y_dimension      [federated.17x9].[sum:Revenue:qk]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use crate::artifact::{read_json, write_json, write_xml};
use crate::config::{Dictionary, FunctionInfo};
use crate::error::{ArtifactError, TargetError, TargetResult};
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{
    ChartObjects, ChartPane, ColumnInstance, CommonChartRecord, CommonDocument, CommonWorkbook,
    DataColumn, DependencyColumn, Equation, PaneColumns, PaneDimensions, PaneStyle,
    TargetChartEntry, TargetDocument, TargetSheetInfo,
};
use crate::transform::grouper;

/// Root element of the rendered target XML.
pub const XML_ROOT: &str = "Workbook";

/// Datasource columns and name shared by all charts of a workbook.
struct DatasourceContext<'a> {
    name: &'a str,
    columns: &'a BTreeMap<String, DataColumn>,
}

impl<'a> DatasourceContext<'a> {
    /// Resolve the column an equation refers to.
    ///
    /// Exact key first, then ASCII case-insensitive on the column name.
    fn column(&self, equation: &Equation) -> Option<&'a DataColumn> {
        if equation.column.is_empty() {
            return None;
        }
        let key = equation.column_ref();
        self.columns.get(&key).or_else(|| {
            self.columns
                .values()
                .find(|c| c.name.eq_ignore_ascii_case(&key))
        })
    }
}

/// Column instance for `column` aggregated by `function`.
pub fn column_instance(column: &DataColumn, function: &FunctionInfo) -> ColumnInstance {
    ColumnInstance {
        column: column.name.clone(),
        derivation: function.name.clone(),
        name: format!(
            "[{}:{}:{}]",
            function.name,
            column.bare_name(),
            function.func_type.pivot_suffix()
        ),
        pivot: "key".to_string(),
        kind: function.func_type.as_str().to_string(),
    }
}

/// Qualified dimension of the instance built on `column`, if any.
pub fn dimension(datasource: &str, instances: &[ColumnInstance], column: &str) -> Option<String> {
    instances
        .iter()
        .find(|instance| instance.column == column)
        .map(|instance| format!("[{}].{}", datasource, instance.name))
}

/// Build the target entry for one common chart.
///
/// Lookup misses (unknown column, unknown function) are logged and leave the
/// corresponding instance and dimension absent.
pub fn build_entry(
    sheet_name: &str,
    record: &CommonChartRecord,
    datasource_name: &str,
    columns: &BTreeMap<String, DataColumn>,
    dictionary: &Dictionary,
) -> TargetChartEntry {
    let ctx = DatasourceContext {
        name: datasource_name,
        columns,
    };
    let title = &record.description.title;

    let mut axis_columns: Vec<&DataColumn> = Vec::with_capacity(2);
    let mut instances: Vec<ColumnInstance> = Vec::with_capacity(2);

    for (axis, equation) in [("x", &record.x_equation), ("y", &record.y_equation)] {
        if equation.is_empty() {
            continue;
        }
        let Some(column) = ctx.column(equation) else {
            log_warning(format!(
                "{title}: {axis} column '{}' not found in datasource {}",
                equation.column, ctx.name
            ));
            continue;
        };
        if !axis_columns.iter().any(|c| c.name == column.name) {
            axis_columns.push(column);
        }

        match dictionary.function(&equation.aggregation) {
            Some(function) => {
                let instance = column_instance(column, function);
                if !instances.contains(&instance) {
                    instances.push(instance);
                }
            }
            None => log_warning(format!(
                "{title}: unknown aggregation '{}' on {axis} axis",
                equation.aggregation
            )),
        }
    }

    let dimension_of = |equation: &Equation| {
        ctx.column(equation)
            .and_then(|column| dimension(ctx.name, &instances, &column.name))
    };

    TargetChartEntry {
        sheet_info: TargetSheetInfo {
            sheet_id: format!("{{{sheet_name}}}"),
            title: title.clone(),
            child_objects: vec!["pane".to_string()],
        },
        sheet_objects: ChartObjects {
            pane: ChartPane {
                dimensions: PaneDimensions {
                    x_dimension: dimension_of(&record.x_equation),
                    y_dimension: dimension_of(&record.y_equation),
                    pane: PaneStyle::new(dictionary.chart_class(&record.description.chart_type)),
                },
                columns: PaneColumns {
                    datasource: ctx.name.to_string(),
                    column_instances: instances.clone(),
                    columns: axis_columns.into_iter().map(DependencyColumn::from).collect(),
                },
            },
        },
    }
}

/// Expand every chart of `workbook`, in sheet order then object-id order.
///
/// `source` names the common layer in errors.
///
/// A datasource section without a `name` is rejected with
/// [`TargetError::UnresolvedDatasource`], even when the markup was
/// well-formed. Every column instance and dimension is qualified by that
/// name, so output built from a null name would reference no datasource.
/// This is the only fatal case of this stage besides artifact I/O and XML
/// rendering.
pub fn build_entries(
    workbook: &CommonWorkbook,
    dictionary: &Dictionary,
    source: &Path,
) -> TargetResult<Vec<TargetChartEntry>> {
    let section = &workbook.data_source;
    let Some(name) = section.name.as_deref() else {
        return Err(TargetError::UnresolvedDatasource(source.to_path_buf()));
    };
    let columns = section.column_map();

    let mut entries = Vec::new();
    for (sheet_name, charts) in &workbook.sheets {
        for record in charts.values() {
            entries.push(build_entry(sheet_name, record, name, columns, dictionary));
        }
    }
    Ok(entries)
}

/// Convert a merged common document into the target document.
pub fn convert(
    common: &CommonDocument,
    dictionary: &Dictionary,
    source: &Path,
) -> TargetResult<TargetDocument> {
    let workbook = &common.workbook;
    let entries = build_entries(workbook, dictionary, source)?;
    log_info(format!("Expanded {} chart(s)", entries.len()));

    let section = &workbook.data_source;
    let caption = section
        .caption
        .as_deref()
        .or(section.name.as_deref())
        .unwrap_or_default();
    Ok(grouper::assemble(entries, caption))
}

/// Read the common layer at `input` and convert it.
pub fn convert_file(input: &Path, dictionary: &Dictionary) -> TargetResult<TargetDocument> {
    let common: CommonDocument = read_json(input)?;
    convert(&common, dictionary, input)
}

/// Render the target document as XML under a `<Workbook>` root.
pub fn to_xml(document: &TargetDocument, path: &Path) -> TargetResult<String> {
    let value = to_value(document, path)?;
    crate::artifact::json_to_xml(XML_ROOT, &value)
}

fn to_value(document: &TargetDocument, path: &Path) -> TargetResult<serde_json::Value> {
    serde_json::to_value(document).map_err(|source| {
        TargetError::Artifact(ArtifactError::Serialize {
            path: path.to_path_buf(),
            source,
        })
    })
}

/// Convert the common layer at `input`, writing JSON to `json_output` and,
/// when given, XML to `xml_output`.
pub fn run(
    input: &Path,
    json_output: &Path,
    xml_output: Option<&Path>,
    dictionary: &Dictionary,
) -> TargetResult<TargetDocument> {
    let document = convert_file(input, dictionary)?;
    write_json(json_output, &document)?;
    log_success(format!("Target JSON written to {}", json_output.display()));

    if let Some(xml_path) = xml_output {
        write_xml(xml_path, XML_ROOT, &to_value(&document, xml_path)?)?;
        log_success(format!("Target XML written to {}", xml_path.display()));
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChartDescription, DataSourceSection, ResolvedDatasource};
    use tempfile::tempdir;

    fn col(name: &str, role: &str, kind: &str, datatype: &str) -> (String, DataColumn) {
        (
            name.to_string(),
            DataColumn {
                datatype: Some(datatype.to_string()),
                name: name.to_string(),
                role: role.to_string(),
                kind: kind.to_string(),
            },
        )
    }

    fn columns() -> BTreeMap<String, DataColumn> {
        [
            col("[Revenue]", "measure", "quantitative", "real"),
            col("[OrderId]", "dimension", "ordinal", "integer"),
            col("[Region]", "dimension", "nominal", "string"),
            col("[Order Date]", "dimension", "ordinal", "date"),
        ]
        .into_iter()
        .collect()
    }

    fn record(kind: &str, title: &str, x: Equation, y: Equation) -> CommonChartRecord {
        CommonChartRecord {
            description: ChartDescription {
                chart_type: kind.to_string(),
                title: title.to_string(),
            },
            x_equation: x,
            y_equation: y,
        }
    }

    fn resolved_workbook() -> CommonWorkbook {
        let mut section = DataSourceSection::placeholder(Some("orders".into()));
        section.merge(ResolvedDatasource {
            declared: true,
            name: Some("ds".into()),
            caption: Some("Orders".into()),
            columns: columns(),
        });

        let mut workbook = CommonWorkbook {
            data_source: section,
            sheets: BTreeMap::new(),
        };
        let sheet = workbook.sheets.entry("sheet-a.json".into()).or_default();
        sheet.insert(
            "obj-2".into(),
            record("piechart", "Share", Equation::new("none", "region"), Equation::new("sum", "revenue")),
        );
        sheet.insert(
            "obj-1".into(),
            record("barchart", "Orders", Equation::new("sum", "revenue"), Equation::new("count", "orderid")),
        );
        workbook
    }

    #[test]
    fn test_barchart_entry() {
        let entry = build_entry(
            "sheet-a.json",
            &record("barchart", "Orders", Equation::new("sum", "revenue"), Equation::new("count", "orderid")),
            "ds",
            &columns(),
            &Dictionary::builtin(),
        );

        assert_eq!(entry.sheet_info.sheet_id, "{sheet-a.json}");
        assert_eq!(entry.sheet_info.child_objects, vec!["pane"]);

        let pane = entry.pane();
        assert_eq!(pane.dimensions.pane.mark.class, "Bar");
        assert_eq!(pane.columns.datasource, "ds");
        assert_eq!(pane.columns.column_instances.len(), 2);
        assert_eq!(pane.dimensions.x_dimension.as_deref(), Some("[ds].[sum:Revenue:qk]"));
        assert_eq!(pane.dimensions.y_dimension.as_deref(), Some("[ds].[cnt:OrderId:qk]"));

        let caption: Vec<_> = pane.columns.columns.iter().map(|c| c.caption.as_str()).collect();
        assert_eq!(caption, vec!["Revenue", "OrderId"]);
    }

    #[test]
    fn test_column_instance_fields() {
        let (_, column) = col("[Order Date]", "dimension", "ordinal", "date");
        let dict = Dictionary::builtin();
        let instance = column_instance(&column, dict.function("year").unwrap());

        assert_eq!(instance.column, "[Order Date]");
        assert_eq!(instance.derivation, "yr");
        assert_eq!(instance.name, "[yr:Order Date:ok]");
        assert_eq!(instance.pivot, "key");
        assert_eq!(instance.kind, "ordinal");
    }

    #[test]
    fn test_max_keeps_its_own_derivation() {
        let entry = build_entry(
            "s",
            &record("barchart", "Peak", Equation::default(), Equation::new("max", "revenue")),
            "ds",
            &columns(),
            &Dictionary::builtin(),
        );
        assert_eq!(
            entry.pane().dimensions.y_dimension.as_deref(),
            Some("[ds].[max:Revenue:qk]")
        );
    }

    #[test]
    fn test_empty_axis_has_no_dimension() {
        let entry = build_entry(
            "s",
            &record("table", "Totals", Equation::default(), Equation::new("sum", "revenue")),
            "ds",
            &columns(),
            &Dictionary::builtin(),
        );
        let pane = entry.pane();
        assert!(pane.dimensions.x_dimension.is_none());
        assert_eq!(pane.dimensions.pane.mark.class, "Automatic");
        assert_eq!(pane.columns.column_instances.len(), 1);

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json["sheet_objects"]["pane"]["dimensions"].get("x_dimension").is_none());
    }

    #[test]
    fn test_unknown_column_and_function_absent() {
        let entry = build_entry(
            "s",
            &record(
                "mekkochart",
                "Odd",
                Equation::new("none", "shipping_zone_77"),
                Equation::new("stdev", "revenue"),
            ),
            "ds",
            &columns(),
            &Dictionary::builtin(),
        );
        let pane = entry.pane();
        assert_eq!(pane.dimensions.pane.mark.class, "Bar");
        assert!(pane.columns.column_instances.is_empty());
        assert!(pane.dimensions.x_dimension.is_none());
        assert!(pane.dimensions.y_dimension.is_none());
        // The measure column is still a dependency
        assert_eq!(pane.columns.columns.len(), 1);
        assert_eq!(pane.columns.columns[0].name, "[Revenue]");
    }

    #[test]
    fn test_same_column_both_axes_deduplicated() {
        let entry = build_entry(
            "s",
            &record("barchart", "Self", Equation::new("sum", "revenue"), Equation::new("sum", "revenue")),
            "ds",
            &columns(),
            &Dictionary::builtin(),
        );
        let pane = entry.pane();
        assert_eq!(pane.columns.columns.len(), 1);
        assert_eq!(pane.columns.column_instances.len(), 1);
        assert_eq!(pane.dimensions.x_dimension, pane.dimensions.y_dimension);
    }

    #[test]
    fn test_dimension_requires_matching_instance() {
        let (_, revenue) = col("[Revenue]", "measure", "quantitative", "real");
        let dict = Dictionary::builtin();
        let instances = vec![column_instance(&revenue, dict.function("sum").unwrap())];

        assert_eq!(
            dimension("ds", &instances, "[Revenue]").as_deref(),
            Some("[ds].[sum:Revenue:qk]")
        );
        assert!(dimension("ds", &instances, "[Region]").is_none());
    }

    #[test]
    fn test_entries_in_sheet_then_object_order() {
        let entries = build_entries(&resolved_workbook(), &Dictionary::builtin(), Path::new("c.json")).unwrap();
        let titles: Vec<_> = entries.iter().map(|e| e.sheet_info.title.as_str()).collect();
        assert_eq!(titles, vec!["Orders", "Share"]);
    }

    #[test]
    fn test_unresolved_datasource_is_fatal() {
        let mut workbook = resolved_workbook();
        workbook.data_source.name = None;
        let err = build_entries(&workbook, &Dictionary::builtin(), Path::new("common_layer.json"))
            .unwrap_err();
        assert!(matches!(err, TargetError::UnresolvedDatasource(_)));
    }

    #[test]
    fn test_convert_uses_datasource_caption() {
        let common = CommonDocument {
            workbook: resolved_workbook(),
        };
        let document = convert(&common, &Dictionary::builtin(), Path::new("c.json")).unwrap();
        let sheets = &document.worksheets.worksheet;
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].table.view.datasources.datasource.caption, "Orders");
        assert_eq!(sheets[0].table.view.datasources.datasource.name, "ds");
    }

    #[test]
    fn test_run_writes_json_and_xml() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("common_layer.json");
        let json_out = dir.path().join("target.json");
        let xml_out = dir.path().join("target.xml");
        write_json(&input, &CommonDocument { workbook: resolved_workbook() }).unwrap();

        run(&input, &json_out, Some(&xml_out), &Dictionary::builtin()).unwrap();

        let back: TargetDocument = read_json(&json_out).unwrap();
        assert_eq!(back.worksheets.worksheet.len(), 2);

        let xml = std::fs::read_to_string(&xml_out).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<Workbook>"));
        assert!(xml.contains("<worksheet name=\"Orders\">"));
        assert!(xml.contains("<rows>[ds].[cnt:OrderId:qk]</rows>"));
        assert!(xml.contains("<style/>"));
    }
}
