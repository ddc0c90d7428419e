//! Shared helpers for the cleaning stage.

use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

// =============================================================================
// Column Names
// =============================================================================

pub const PRICE: &str = "price";
pub const LONGITUDE: &str = "longitude";
pub const LATITUDE: &str = "latitude";
pub const LAST_REVIEW: &str = "last_review";

/// Columns every input dataset must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = [PRICE, LONGITUDE, LATITUDE, LAST_REVIEW];

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a date or datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Values treated as missing in numeric text columns (compared lowercase).
pub const ERROR_MARKERS: [&str; 8] = [
    "error", "unknown", "n/a", "na", "null", "missing", "none", "#n/a",
];

/// `1,234` / `12,345,678.90`: commas only between groups of three digits.
static THOUSANDS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d{1,3}(,\d{3})+(\.\d+)?$").expect("Invalid regex: thousands separators")
});

/// How text in a numeric column is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericFormat {
    /// A bare number: `-73.95`, `40.7`, `1e3`.
    Plain,
    /// A price: an optional leading `$` and optional thousands separators.
    Currency,
}

/// Check if a string is an error/missing value marker.
///
/// ```rust,ignore
/// assert!(is_error_marker("N/A"));
/// assert!(!is_error_marker("0"));
/// ```
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a bare number. Only surrounding whitespace is ignored.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let value = s.trim();
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok()
}

/// Try to parse a price such as `$1,234.56`.
///
/// One leading `$` is dropped. Commas are accepted only as thousands
/// separators, so `1,5` and `$2$0$0` are rejected.
pub fn parse_price_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let value = trimmed.strip_prefix('$').unwrap_or(trimmed);

    if value.contains(',') {
        if !THOUSANDS_PATTERN.is_match(value) {
            return None;
        }
        return value.replace(',', "").parse::<f64>().ok();
    }
    parse_numeric_string(value)
}

/// Convert a column to `Float64` for range checks.
///
/// Numeric columns are cast. String columns are parsed value by value with
/// `format`; empty strings and [`ERROR_MARKERS`] become null, and the first
/// value that does not parse is reported.
pub fn numeric_column_as_f64(
    series: &Series,
    format: NumericFormat,
) -> std::result::Result<Float64Chunked, String> {
    let dtype = series.dtype();

    if is_numeric_dtype(dtype) || matches!(dtype, DataType::Null) {
        let cast = series
            .cast(&DataType::Float64)
            .map_err(|e| e.to_string())?;
        return cast.f64().cloned().map_err(|e| e.to_string());
    }

    if dtype == &DataType::String {
        let str_series = series.str().map_err(|e| e.to_string())?;
        let mut values: Vec<Option<f64>> = Vec::with_capacity(str_series.len());

        for opt_val in str_series.into_iter() {
            match opt_val {
                Some(val) if val.trim().is_empty() || is_error_marker(val) => values.push(None),
                Some(val) => {
                    let parsed = match format {
                        NumericFormat::Plain => parse_numeric_string(val),
                        NumericFormat::Currency => parse_price_string(val),
                    };
                    match parsed {
                        Some(parsed) => values.push(Some(parsed)),
                        None => return Err(format!("'{}' is not a number", val)),
                    }
                }
                None => values.push(None),
            }
        }

        return Ok(Float64Chunked::from_iter_options(
            series.name().clone(),
            values.into_iter(),
        ));
    }

    Err(format!("unsupported dtype {}", dtype))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_is_datetime_dtype() {
        assert!(is_datetime_dtype(&DataType::Date));
        assert!(is_datetime_dtype(&DataType::Datetime(
            TimeUnit::Milliseconds,
            None
        )));
        assert!(!is_datetime_dtype(&DataType::String));
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string(" 42 "), Some(42.0));
        assert_eq!(parse_numeric_string("-73.95"), Some(-73.95));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("cheap"), None);
        assert_eq!(parse_numeric_string("40,7"), None);
        assert_eq!(parse_numeric_string("$100"), None);
    }

    #[test]
    fn test_parse_price_string() {
        assert_eq!(parse_price_string("$1,234.56"), Some(1234.56));
        assert_eq!(parse_price_string("1,200,000"), Some(1_200_000.0));
        assert_eq!(parse_price_string(" $150 "), Some(150.0));
        assert_eq!(parse_price_string("99.5"), Some(99.5));
    }

    #[test]
    fn test_parse_price_string_rejects_misplaced_symbols() {
        assert_eq!(parse_price_string("1,5"), None);
        assert_eq!(parse_price_string("12,34"), None);
        assert_eq!(parse_price_string("$2$0$0"), None);
        assert_eq!(parse_price_string("$$100"), None);
        assert_eq!(parse_price_string("100$"), None);
        assert_eq!(parse_price_string("1 000"), None);
    }

    #[test]
    fn test_is_error_marker() {
        assert!(is_error_marker("NA"));
        assert!(is_error_marker(" n/a "));
        assert!(is_error_marker("NULL"));
        assert!(is_error_marker("#N/A"));
        assert!(!is_error_marker("0"));
        assert!(!is_error_marker("nan!"));
    }

    #[test]
    fn test_numeric_column_as_f64_casts_integers() {
        let series = Series::new("price".into(), &[100i64, 250, 5000]);
        let values = numeric_column_as_f64(&series, NumericFormat::Currency).unwrap();
        assert_eq!(values.get(0), Some(100.0));
        assert_eq!(values.get(2), Some(5000.0));
    }

    #[test]
    fn test_numeric_column_as_f64_parses_prices() {
        let series = Series::new("price".into(), &[Some("$1,200"), Some(""), None]);
        let values = numeric_column_as_f64(&series, NumericFormat::Currency).unwrap();
        assert_eq!(values.get(0), Some(1200.0));
        assert_eq!(values.get(1), None);
        assert_eq!(values.get(2), None);
    }

    #[test]
    fn test_numeric_column_as_f64_markers_become_null() {
        let series = Series::new("price".into(), &["100", "NA", "N/A", "null"]);
        let values = numeric_column_as_f64(&series, NumericFormat::Currency).unwrap();
        assert_eq!(values.get(0), Some(100.0));
        assert_eq!(values.null_count(), 3);
    }

    #[test]
    fn test_numeric_column_as_f64_rejects_text() {
        let series = Series::new("price".into(), &["100", "call us"]);
        let err = numeric_column_as_f64(&series, NumericFormat::Currency).unwrap_err();
        assert!(err.contains("call us"));
    }

    #[test]
    fn test_numeric_column_as_f64_plain_rejects_decimal_comma() {
        let series = Series::new("latitude".into(), &["40.7", "40,7"]);
        let err = numeric_column_as_f64(&series, NumericFormat::Plain).unwrap_err();
        assert!(err.contains("40,7"));
    }

    #[test]
    fn test_numeric_column_as_f64_rejects_booleans() {
        let series = Series::new("price".into(), &[true, false]);
        assert!(numeric_column_as_f64(&series, NumericFormat::Plain).is_err());
    }
}
