//! Assemble expanded chart entries into target worksheets.
//!
//! # Architecture
//!
//! ```text
//! Chart entries                       Target document
//! ┌─────────────────────────────┐     ┌──────────────────────────────┐
//! │ {sheet-a} Orders  pane/cols │  →  │ worksheet "Orders"           │
//! │ {sheet-a} Share   pane/cols │  →  │ worksheet "Share"            │
//! │ {sheet-b} Trend   pane/cols │  →  │ worksheet "Trend"            │
//! └─────────────────────────────┘     └──────────────────────────────┘
//! ```
//!
//! One worksheet per entry, in entry order. Entries sharing a title are all
//! kept.

use crate::models::{
    DatasourceDependencies, DatasourceRef, Panes, SimpleId, TableView, TargetChartEntry,
    TargetDocument, ValueAttr, ViewDatasources, Worksheet, WorksheetTable, Worksheets,
};

/// Build the target document from chart entries.
///
/// `caption` is the display caption of the datasource every worksheet reads.
pub fn assemble(entries: Vec<TargetChartEntry>, caption: &str) -> TargetDocument {
    TargetDocument {
        worksheets: Worksheets {
            worksheet: entries
                .into_iter()
                .map(|entry| worksheet(entry, caption))
                .collect(),
        },
    }
}

fn worksheet(entry: TargetChartEntry, caption: &str) -> Worksheet {
    let TargetChartEntry {
        sheet_info,
        sheet_objects,
    } = entry;
    let pane = sheet_objects.pane;
    let datasource = pane.columns.datasource;

    Worksheet {
        name: sheet_info.title,
        table: WorksheetTable {
            view: TableView {
                datasources: ViewDatasources {
                    datasource: DatasourceRef {
                        caption: caption.to_string(),
                        name: datasource.clone(),
                    },
                },
                dependencies: DatasourceDependencies {
                    datasource,
                    column_instances: pane.columns.column_instances,
                    columns: pane.columns.columns,
                },
                aggregation: ValueAttr::new("true"),
            },
            style: None,
            panes: Panes {
                pane: pane.dimensions.pane,
            },
            rows: pane.dimensions.y_dimension,
            cols: pane.dimensions.x_dimension,
        },
        simple_id: SimpleId {
            uuid: sheet_info.sheet_id,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChartObjects, ChartPane, ColumnInstance, DependencyColumn, PaneColumns, PaneDimensions,
        PaneStyle, TargetSheetInfo,
    };
    use serde_json::json;

    fn entry(sheet: &str, title: &str, x: Option<&str>, y: Option<&str>) -> TargetChartEntry {
        TargetChartEntry {
            sheet_info: TargetSheetInfo {
                sheet_id: format!("{{{sheet}}}"),
                title: title.to_string(),
                child_objects: vec!["pane".into()],
            },
            sheet_objects: ChartObjects {
                pane: ChartPane {
                    dimensions: PaneDimensions {
                        x_dimension: x.map(String::from),
                        y_dimension: y.map(String::from),
                        pane: PaneStyle::new("Line"),
                    },
                    columns: PaneColumns {
                        datasource: "ds".into(),
                        column_instances: vec![ColumnInstance {
                            column: "[Revenue]".into(),
                            derivation: "sum".into(),
                            name: "[sum:Revenue:qk]".into(),
                            pivot: "key".into(),
                            kind: "quantitative".into(),
                        }],
                        columns: vec![DependencyColumn {
                            caption: "Revenue".into(),
                            datatype: Some("real".into()),
                            name: "[Revenue]".into(),
                            role: "measure".into(),
                            kind: "quantitative".into(),
                        }],
                    },
                },
            },
        }
    }

    #[test]
    fn test_worksheet_fields() {
        let doc = assemble(
            vec![entry("sheet-a.json", "Trend", Some("[ds].[yr:Date:ok]"), Some("[ds].[sum:Revenue:qk]"))],
            "Orders",
        );
        let ws = &doc.worksheets.worksheet[0];

        assert_eq!(ws.name, "Trend");
        assert_eq!(ws.simple_id.uuid, "{sheet-a.json}");
        assert_eq!(ws.table.view.datasources.datasource.caption, "Orders");
        assert_eq!(ws.table.view.dependencies.datasource, "ds");
        assert_eq!(ws.table.view.dependencies.column_instances.len(), 1);
        assert_eq!(ws.table.panes.pane.mark.class, "Line");
        assert_eq!(ws.table.rows.as_deref(), Some("[ds].[sum:Revenue:qk]"));
        assert_eq!(ws.table.cols.as_deref(), Some("[ds].[yr:Date:ok]"));
    }

    #[test]
    fn test_duplicate_titles_kept() {
        let doc = assemble(
            vec![
                entry("sheet-a.json", "Sales", None, None),
                entry("sheet-b.json", "Sales", None, None),
            ],
            "ds",
        );
        let uuids: Vec<_> = doc.worksheets.worksheet.iter().map(|w| w.simple_id.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["{sheet-a.json}", "{sheet-b.json}"]);
    }

    #[test]
    fn test_serialized_shape() {
        let doc = assemble(vec![entry("s", "Only Y", None, Some("[ds].[sum:Revenue:qk]"))], "ds");
        let json = serde_json::to_value(&doc).unwrap();
        let table = &json["worksheets"]["worksheet"][0]["table"];

        assert_eq!(table["view"]["aggregation"], json!({ "@value": "true" }));
        assert!(table["style"].is_null());
        assert!(table.get("cols").is_none());
        assert_eq!(table["rows"], "[ds].[sum:Revenue:qk]");
        assert_eq!(
            table["view"]["datasource-dependencies"]["column"][0]["@caption"],
            "Revenue"
        );
    }

    #[test]
    fn test_empty_entries() {
        assert!(assemble(Vec::new(), "ds").worksheets.worksheet.is_empty());
    }
}
