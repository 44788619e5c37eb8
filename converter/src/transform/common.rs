//! Source-to-common mapper: flattened sheets → common layer.
//!
//! Only chart-like objects (type containing `chart` or `table`) are kept.
//! Each one becomes a [`CommonChartRecord`] whose equations come from the
//! first dimension and the first expression.

use std::path::Path;

use crate::artifact::{read_json, write_json};
use crate::error::ArtifactResult;
use crate::logs::{log_info, log_success};
use crate::models::{
    ChartDescription, CommonChartRecord, CommonDocument, CommonSheet, CommonWorkbook,
    DataSourceSection, Equation, FieldBinding, FlattenedWorkbook, SheetContents,
    SheetObjectRecord,
};
use crate::parser::parse_equation_lossy;

/// Map the flattened workbook at `input` and write the common layer to `output`.
pub fn run(input: &Path, output: &Path) -> ArtifactResult<CommonDocument> {
    let flattened: FlattenedWorkbook = read_json(input)?;
    let common = to_common(&flattened);
    write_json(output, &common)?;
    log_success(format!("Common layer written to {}", output.display()));
    Ok(common)
}

/// Build the common layer from a flattened workbook.
pub fn to_common(flattened: &FlattenedWorkbook) -> CommonDocument {
    let data_source_name = flattened.data_sources.first().cloned();
    let mut workbook = CommonWorkbook {
        data_source: DataSourceSection::placeholder(data_source_name),
        sheets: Default::default(),
    };

    for (sheet_name, sheet) in &flattened.ws_sheets {
        let charts = map_sheet(&sheet.document);
        log_info(format!(
            "{}: {} of {} object(s) mapped",
            sheet_name,
            charts.len(),
            sheet.document.sheet_objects.len()
        ));
        workbook.sheets.insert(sheet_name.clone(), charts);
    }

    CommonDocument { workbook }
}

/// Map the chart-like objects of one sheet, keyed by object id.
pub fn map_sheet(sheet: &SheetContents) -> CommonSheet {
    sheet
        .sheet_objects
        .iter()
        .filter(|obj| obj.is_chart_like())
        .map(|obj| (obj.info.object_id.clone(), map_object(obj)))
        .collect()
}

/// Map one object to its common record.
pub fn map_object(obj: &SheetObjectRecord) -> CommonChartRecord {
    CommonChartRecord {
        description: ChartDescription {
            chart_type: obj.info.object_type.clone(),
            title: obj.info.caption.clone(),
        },
        x_equation: extract_equation(&obj.dimensions),
        y_equation: extract_equation(&obj.expressions),
    }
}

/// Equation of the first binding, `("", "")` when there is none.
pub fn extract_equation(bindings: &[FieldBinding]) -> Equation {
    let Some(first) = bindings.first() else {
        return Equation::default();
    };
    let source = first
        .label_expression
        .as_deref()
        .filter(|expr| !expr.trim().is_empty())
        .unwrap_or_else(|| first.definition.first());
    parse_equation_lossy(source)
}
