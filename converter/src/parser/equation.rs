//! Equation parser for dimension and expression definitions.
//!
//! Supported grammar (the complete grammar, nothing else is recognized):
//!
//! ```text
//! equation := ['='] IDENT '(' ARG ')'
//!           | ['='] ARG
//! IDENT    := [A-Za-z_][A-Za-z0-9_]*
//! ARG      := one or more characters other than '(' and ')'
//! ```
//!
//! Whitespace around tokens is ignored and one surrounding `[...]` pair is
//! removed from `ARG`. The bare form has aggregation `none`. Both parts are
//! lower-cased.

use crate::error::EquationError;
use crate::logs::log_warning;
use crate::models::Equation;

/// Aggregation reported for a bare column reference.
pub const NO_AGGREGATION: &str = "none";

/// Parse `input` strictly against the supported grammar.
pub fn parse_equation(input: &str) -> Result<Equation, EquationError> {
    let malformed = |reason: &str| EquationError::Malformed {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let body = input.trim();
    let body = body.strip_prefix('=').unwrap_or(body).trim();
    if body.is_empty() {
        return Err(malformed("empty equation"));
    }

    let Some(open) = body.find('(') else {
        if body.contains(')') {
            return Err(malformed("unbalanced ')'"));
        }
        let column = parse_arg(body).ok_or_else(|| malformed("empty column reference"))?;
        return Ok(Equation::new(NO_AGGREGATION, column));
    };

    let func = body[..open].trim();
    if !is_ident(func) {
        return Err(malformed("function name is not an identifier"));
    }

    let rest = &body[open + 1..];
    let Some(close) = rest.find(')') else {
        return Err(malformed("missing ')'"));
    };
    let arg = &rest[..close];
    if arg.contains('(') {
        return Err(malformed("nested function calls are not supported"));
    }
    if !rest[close + 1..].trim().is_empty() {
        return Err(malformed("trailing text after ')'"));
    }

    let column = parse_arg(arg).ok_or_else(|| malformed("empty function argument"))?;
    Ok(Equation::new(func.to_lowercase(), column))
}

/// Parse `input`, falling back to a best-effort split when malformed.
///
/// The fallback never fails: the aggregation is the text before the first
/// `(` (or `none`), the column the text after the last `(`.
pub fn parse_equation_lossy(input: &str) -> Equation {
    match parse_equation(input) {
        Ok(equation) => equation,
        Err(err) => {
            log_warning(format!("{err}, using best-effort split"));
            split_equation(input)
        }
    }
}

fn split_equation(input: &str) -> Equation {
    let parts: Vec<&str> = input.split('(').collect();
    let aggregation = if parts.len() > 1 {
        parts[0].trim_matches('=').trim().to_lowercase()
    } else {
        NO_AGGREGATION.to_string()
    };
    let column = parts
        .last()
        .map(|p| p.trim_matches(')').trim().to_lowercase())
        .unwrap_or_default();
    Equation::new(aggregation, column)
}

fn parse_arg(arg: &str) -> Option<String> {
    let arg = arg.trim();
    let arg = arg
        .strip_prefix('[')
        .and_then(|a| a.strip_suffix(']'))
        .unwrap_or(arg)
        .trim();
    if arg.is_empty() || arg.contains(')') {
        None
    } else {
        Some(arg.to_lowercase())
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(agg: &str, col: &str) -> Equation {
        Equation::new(agg, col)
    }

    #[test]
    fn test_function_call() {
        assert_eq!(parse_equation("sum(Sales)").unwrap(), eq("sum", "sales"));
        assert_eq!(parse_equation("=Year(Date)").unwrap(), eq("year", "date"));
        assert_eq!(parse_equation(" = Count( OrderId ) ").unwrap(), eq("count", "orderid"));
    }

    #[test]
    fn test_bare_column() {
        assert_eq!(parse_equation("Revenue").unwrap(), eq("none", "revenue"));
        assert_eq!(parse_equation("=Revenue").unwrap(), eq("none", "revenue"));
        assert_eq!(parse_equation("Order Date").unwrap(), eq("none", "order date"));
    }

    #[test]
    fn test_bracketed_argument() {
        assert_eq!(parse_equation("Sum([Unit Price])").unwrap(), eq("sum", "unit price"));
        assert_eq!(parse_equation("[Region]").unwrap(), eq("none", "region"));
    }

    #[test]
    fn test_malformed_inputs() {
        for input in ["", "  =  ", "Sum(Aggr(Sales))", "Sum(Sales", "Sales)", "Sum()", "1x(Sales)", "Sum(Sales) * 2"] {
            assert!(
                matches!(parse_equation(input), Err(EquationError::Malformed { .. })),
                "expected '{input}' to be malformed"
            );
        }
    }

    #[test]
    fn test_lossy_fallback_matches_split() {
        assert_eq!(parse_equation_lossy("Sum(Aggr(Sales))"), eq("sum", "sales"));
        assert_eq!(parse_equation_lossy("=Sum(Sales) * 2"), eq("sum", "sales) * 2"));
        assert_eq!(parse_equation_lossy(""), eq("none", ""));
    }

    #[test]
    fn test_lossy_accepts_valid_input() {
        assert_eq!(parse_equation_lossy("=Max(Price)"), eq("max", "price"));
    }
}
