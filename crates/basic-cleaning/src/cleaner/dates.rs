//! `last_review` normalization.
//!
//! Whatever the source representation, the column leaves this module as a
//! polars `Date` column. Values that cannot be read become null and are
//! reported as [`DateParseWarning`]s.

use crate::error::Result;
use crate::types::DateParseWarning;
use crate::utils::is_datetime_dtype;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

/// Accepted date shapes and the chrono format each is parsed with.
/// Datetime shapes are matched as a prefix and only their date part is read.
static DATE_FORMATS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("Invalid regex: YYYY-MM-DD"),
            "%Y-%m-%d",
        ),
        (
            Regex::new(r"^\d{4}/\d{1,2}/\d{1,2}$").expect("Invalid regex: YYYY/MM/DD"),
            "%Y/%m/%d",
        ),
        (
            Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("Invalid regex: MM/DD/YYYY"),
            "%m/%d/%Y",
        ),
        (
            Regex::new(r"^\d{1,2}-\d{1,2}-\d{4}$").expect("Invalid regex: MM-DD-YYYY"),
            "%m-%d-%Y",
        ),
    ]
});

static DATETIME_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})[T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?$")
        .expect("Invalid regex: ISO datetime")
});

/// Parse one `last_review` string. Empty strings are `None` without being
/// an error; callers decide what counts as unparsable.
pub(crate) fn parse_review_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(caps) = DATETIME_PREFIX.captures(value) {
        return NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok();
    }

    DATE_FORMATS
        .iter()
        .find(|(pattern, _)| pattern.is_match(value))
        .and_then(|(_, format)| NaiveDate::parse_from_str(value, format).ok())
}

/// Convert a `last_review` series to `Date`.
///
/// Returns the converted series and one warning per non-empty value that
/// could not be parsed.
pub(crate) fn normalize_review_dates(series: &Series) -> Result<(Series, Vec<DateParseWarning>)> {
    let name = series.name().clone();

    match series.dtype() {
        // Date is a no-op cast; Datetime drops the time of day.
        dtype if is_datetime_dtype(dtype) || matches!(dtype, DataType::Null) => {
            Ok((series.cast(&DataType::Date)?, Vec::new()))
        }
        DataType::String => {
            let str_series = series.str()?;
            let mut parsed: Vec<Option<NaiveDate>> = Vec::with_capacity(str_series.len());
            let mut warnings = Vec::new();

            for (row, opt_val) in str_series.into_iter().enumerate() {
                match opt_val {
                    Some(val) if val.trim().is_empty() => parsed.push(None),
                    Some(val) => match parse_review_date(val) {
                        Some(date) => parsed.push(Some(date)),
                        None => {
                            warnings.push(DateParseWarning {
                                row,
                                value: val.to_string(),
                            });
                            parsed.push(None);
                        }
                    },
                    None => parsed.push(None),
                }
            }

            let dates = DateChunked::from_naive_date_options(name, parsed).into_series();
            Ok((dates, warnings))
        }
        _ => {
            // Integers, floats, booleans: nothing here is a date.
            let mut warnings = Vec::new();
            for row in 0..series.len() {
                let value = series.get(row)?;
                if !value.is_null() {
                    warnings.push(DateParseWarning {
                        row,
                        value: value.to_string(),
                    });
                }
            }

            let dates = Series::full_null(name, series.len(), &DataType::Date);
            Ok((dates, warnings))
        }
    }
}
