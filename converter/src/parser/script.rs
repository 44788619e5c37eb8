//! Data source discovery in source load scripts.

use once_cell::sync::Lazy;
use regex::Regex;

/// `FROM [lib://folder/name.ext]` → `name`
static FROM_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"FROM \[.*[/\\]([^/\\]+)\.\w+\]").expect("valid FROM clause regex")
});

/// Names of the files loaded by `FROM [...]` clauses, in order of appearance.
///
/// Duplicates are kept.
pub fn discover_data_sources(script: &str) -> Vec<String> {
    FROM_CLAUSE
        .captures_iter(script)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_source() {
        let script = "Orders:\nLOAD * FROM [lib://DataFiles/orders.qvd]\n(qvd);";
        assert_eq!(discover_data_sources(script), vec!["orders"]);
    }

    #[test]
    fn test_order_and_duplicates_kept() {
        let script = r#"
LOAD * FROM [lib://Data/customers.xlsx] (ooxml);
LOAD * FROM [C:\exports\orders.csv] (txt);
LOAD * FROM [lib://Data/customers.xlsx] (ooxml);
"#;
        assert_eq!(
            discover_data_sources(script),
            vec!["customers", "orders", "customers"]
        );
    }

    #[test]
    fn test_no_match_without_folder() {
        assert!(discover_data_sources("LOAD * FROM [orders.qvd];").is_empty());
        assert!(discover_data_sources("LOAD * INLINE [a, b];").is_empty());
    }
}
