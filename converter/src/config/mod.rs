//! Lookup dictionary and runtime configuration.
//!
//! The dictionary maps common-layer aggregation functions and source chart
//! types onto the target tool's vocabulary. [`Dictionary::builtin`] returns
//! the built-in tables; a TOML file can extend or override them:
//!
//! ```toml
//! [function_info.stdev]
//! name = "stdev"
//! func_type = "quantitative"
//!
//! [chart_info]
//! "scatterplot" = "Circle"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::artifact::read_text;
use crate::error::ConfigError;

/// Environment variable naming a dictionary file.
pub const CONFIG_ENV_VAR: &str = "SHEETBRIDGE_CONFIG";

/// Mark class used for chart types missing from the table.
pub const DEFAULT_CHART_CLASS: &str = "Bar";

/// How the target tool treats the values of an aggregated column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Quantitative,
    Ordinal,
    Nominal,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Quantitative => "quantitative",
            ValueKind::Ordinal => "ordinal",
            ValueKind::Nominal => "nominal",
        }
    }

    /// Suffix of a synthesized column-instance name.
    pub fn pivot_suffix(&self) -> &'static str {
        match self {
            ValueKind::Quantitative => "qk",
            ValueKind::Ordinal => "ok",
            ValueKind::Nominal => "nk",
        }
    }
}

/// Target-side description of an aggregation function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// Canonical short name used as derivation.
    pub name: String,
    pub func_type: ValueKind,
}

impl FunctionInfo {
    fn new(name: &str, func_type: ValueKind) -> Self {
        Self { name: name.to_string(), func_type }
    }
}

/// Function and chart lookup tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    #[serde(default)]
    pub function_info: BTreeMap<String, FunctionInfo>,
    #[serde(default)]
    pub chart_info: BTreeMap<String, String>,
}

impl Dictionary {
    /// Built-in tables.
    pub fn builtin() -> Self {
        use ValueKind::{Ordinal, Quantitative};

        let function_info = [
            ("count", FunctionInfo::new("cnt", Quantitative)),
            ("median", FunctionInfo::new("med", Quantitative)),
            ("year", FunctionInfo::new("yr", Ordinal)),
            ("sum", FunctionInfo::new("sum", Quantitative)),
            ("max", FunctionInfo::new("max", Quantitative)),
            ("min", FunctionInfo::new("min", Quantitative)),
            ("avg", FunctionInfo::new("avg", Quantitative)),
            ("none", FunctionInfo::new("none", Ordinal)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let chart_info = [
            ("Bar Chart", "Bar"),
            ("barchart", "Bar"),
            ("Pie Chart", "Pie"),
            ("piechart", "Pie"),
            ("Line Chart", "Line"),
            ("linechart", "Line"),
            ("Pivot Table", "Automatic"),
            ("pivot-table", "Automatic"),
            ("table", "Automatic"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self { function_info, chart_info }
    }

    /// Built-in tables extended by the TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = read_text(path)?;
        let overrides = Self::from_toml_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::builtin().extended(overrides))
    }

    /// Parse a dictionary file without merging builtins.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Dictionary from an explicit path, else from `SHEETBRIDGE_CONFIG`, else builtin.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(p) = path {
            return Self::load(p);
        }
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(p) if !p.trim().is_empty() => Self::load(Path::new(p.trim())),
            _ => Ok(Self::builtin()),
        }
    }

    /// Entries of `other` added on top of `self`.
    pub fn extended(mut self, other: Dictionary) -> Self {
        self.function_info.extend(other.function_info);
        self.chart_info.extend(other.chart_info);
        self
    }

    /// Lookup an aggregation function by its lower-cased name.
    pub fn function(&self, aggregation: &str) -> Option<&FunctionInfo> {
        self.function_info.get(aggregation)
    }

    /// Target mark class for a source chart type, [`DEFAULT_CHART_CLASS`] if unknown.
    pub fn chart_class(&self, chart_type: &str) -> &str {
        self.chart_info
            .get(chart_type)
            .map(String::as_str)
            .unwrap_or(DEFAULT_CHART_CLASS)
    }

    /// Human-readable listing of the function table.
    pub fn functions_description(&self) -> String {
        let mut out = String::from("Aggregation functions:\n");
        for (key, info) in &self.function_info {
            out.push_str(&format!(
                "  {:<10} → {:<6} ({})\n",
                key,
                info.name,
                info.func_type.as_str()
            ));
        }
        out
    }

    /// Human-readable listing of the chart table.
    pub fn charts_description(&self) -> String {
        let mut out = String::from("Chart types:\n");
        for (key, class) in &self.chart_info {
            out.push_str(&format!("  {:<14} → {}\n", key, class));
        }
        out.push_str(&format!("  {:<14} → {}\n", "(other)", DEFAULT_CHART_CLASS));
        out
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_functions() {
        let dict = Dictionary::builtin();
        let count = dict.function("count").unwrap();
        assert_eq!(count.name, "cnt");
        assert_eq!(count.func_type, ValueKind::Quantitative);
        assert_eq!(dict.function("year").unwrap().func_type, ValueKind::Ordinal);
        assert!(dict.function("stdev").is_none());
    }

    #[test]
    fn test_chart_class_falls_back_to_bar() {
        let dict = Dictionary::builtin();
        assert_eq!(dict.chart_class("Pie Chart"), "Pie");
        assert_eq!(dict.chart_class("pivot-table"), "Automatic");
        assert_eq!(dict.chart_class("mekkochart"), "Bar");
        assert_eq!(dict.chart_class(""), "Bar");
    }

    #[test]
    fn test_load_extends_builtin() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dictionary.toml");
        fs::write(
            &path,
            r#"
[function_info.stdev]
name = "stdev"
func_type = "quantitative"

[function_info.count]
name = "cntd"
func_type = "quantitative"

[chart_info]
scatterplot = "Circle"
"#,
        )
        .unwrap();

        let dict = Dictionary::load(&path).unwrap();
        assert_eq!(dict.function("stdev").unwrap().name, "stdev");
        assert_eq!(dict.function("count").unwrap().name, "cntd");
        assert_eq!(dict.function("sum").unwrap().name, "sum");
        assert_eq!(dict.chart_class("scatterplot"), "Circle");
        assert_eq!(dict.chart_class("barchart"), "Bar");
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[function_info.sum]\nfunc_type = \"sideways\"\n").unwrap();

        let err = Dictionary::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_missing_config_is_io_error() {
        let err = Dictionary::load(Path::new("/nonexistent/dictionary.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Artifact(_)));
    }

    #[test]
    fn test_pivot_suffix() {
        assert_eq!(ValueKind::Quantitative.pivot_suffix(), "qk");
        assert_eq!(ValueKind::Ordinal.pivot_suffix(), "ok");
        assert_eq!(ValueKind::Nominal.pivot_suffix(), "nk");
    }
}
