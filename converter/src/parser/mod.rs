//! Parsers for the small textual languages found in workbook artifacts.
//!
//! - [`equation`] - `func(column)` definitions into `(aggregation, column)` pairs
//! - [`script`] - Data source names from `FROM [...]` clauses of load scripts
//! - [`markup`] - Target datasource definitions (columns, roles, types)

pub mod equation;
pub mod markup;
pub mod script;

pub use equation::{parse_equation, parse_equation_lossy, NO_AGGREGATION};
pub use markup::parse_datasource_markup;
pub use script::discover_data_sources;
