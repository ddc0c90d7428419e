//! Loading, validating and writing listing datasets.
//!
//! Datasets are CSV files with a header row. The whole file is materialized
//! as a polars [`DataFrame`].

use crate::error::{CleaningError, Result, ResultExt};
use crate::utils::{LAST_REVIEW, REQUIRED_COLUMNS};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Date format `last_review` is written with.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Read a CSV file into a DataFrame.
///
/// Schema inference scans every row so a late non-integer price does not
/// break the read. Any reader failure is reported as
/// [`CleaningError::MalformedInput`].
pub fn load_dataset(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(CleaningError::MalformedInput(format!(
            "{} is not a readable file",
            path.display()
        )));
    }

    debug!("Reading CSV from {}", path.display());

    // Keep `last_review` as text; date handling belongs to the cleaner.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_try_parse_dates(false),
        )
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .and_then(|reader| reader.finish())
        .map_err(|e| {
            CleaningError::MalformedInput(format!("failed to parse {}: {}", path.display(), e))
        })?;

    info!("Loaded {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

/// Ensure every required column is present.
///
/// All absent columns are reported at once.
pub fn validate_schema(df: &DataFrame) -> Result<()> {
    let present: Vec<&str> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !present.contains(required))
        .map(|s| s.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CleaningError::MissingColumn(missing))
    }
}

/// Write a DataFrame as CSV, keeping column order.
///
/// Dates use [`DATE_FORMAT`]; nulls are written as empty fields.
pub fn write_dataset(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context(format!("Creating {}", parent.display()))?;
    }

    let mut file = File::create(path).context(format!("Creating {}", path.display()))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .with_date_format(Some(DATE_FORMAT.to_string()))
        .finish(df)
        .context(format!("Writing {}", path.display()))?;

    info!(
        "Dataset saved: {} ({} rows, {} typed as {})",
        path.display(),
        df.height(),
        LAST_REVIEW,
        df.column(LAST_REVIEW)
            .map(|c| c.dtype().to_string())
            .unwrap_or_else(|_| "absent".to_string())
    );

    Ok(path.to_path_buf())
}
