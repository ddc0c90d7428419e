//! The listing cleaning transform.
//!
//! Steps, in order:
//! 1. Keep rows with `min_price <= price <= max_price`
//! 2. Keep rows inside the geographic bounding box
//! 3. Convert `last_review` to a date column (unparsable values become null)
//! 4. Optionally apply the bounding box again (no-op, parity only)
//!
//! The input frame is only borrowed. Survivors keep their input order and
//! every column other than `last_review` is passed through untouched.

mod dates;
mod filters;

use crate::config::CleaningConfig;
use crate::dataset::validate_schema;
use crate::error::{Result, ResultExt};
use crate::pipeline::{CleaningStage, ProgressReporter, ProgressUpdate};
use crate::types::{CleaningResult, CleaningSummary, DateParseWarning};
use crate::utils::LAST_REVIEW;
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How many unparsable dates are quoted in the aggregated warning.
const WARNING_SAMPLE_SIZE: usize = 3;

/// Scratch column carrying each row's input position through the filters.
const INPUT_ROW: &str = "__input_row";

/// Applies the price, geography and date rules to a listing dataset.
pub struct ListingCleaner {
    config: CleaningConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl ListingCleaner {
    pub fn new(config: CleaningConfig) -> Self {
        Self {
            config,
            progress_reporter: None,
        }
    }

    /// Report per-step progress to `reporter`.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    /// Clean a dataset.
    ///
    /// # Errors
    ///
    /// - [`CleaningError::MissingColumn`](crate::CleaningError::MissingColumn)
    ///   if a required column is absent
    /// - [`CleaningError::MalformedInput`](crate::CleaningError::MalformedInput)
    ///   if `price`, `longitude` or `latitude` hold non-numeric values
    ///
    /// An empty result is not an error.
    pub fn clean(&self, df: &DataFrame) -> Result<CleaningResult> {
        let start_time = Instant::now();

        self.report_progress(ProgressUpdate::new(
            CleaningStage::Validating,
            0.0,
            "Checking required columns...",
        ));
        validate_schema(df)?;

        let mut summary = CleaningSummary::new(df.height());
        let config = &self.config;

        if config.has_inverted_price_range() {
            warn!(
                "min_price ({}) is greater than max_price ({}); no rows can survive",
                config.min_price, config.max_price
            );
        }

        let indexed = df.with_row_index(INPUT_ROW.into(), None)?;

        // Step 1: price
        self.report_progress(ProgressUpdate::new(
            CleaningStage::PriceFilter,
            0.0,
            format!(
                "Keeping prices in [{}, {}]",
                config.min_price, config.max_price
            ),
        ));
        let (df, removed) = filters::filter_by_price(&indexed, config.min_price, config.max_price)
            .context("Filtering by price")?;
        summary.removed_by_price = removed;
        summary.add_step(format!(
            "Removed {} rows with price outside [{}, {}]",
            removed, config.min_price, config.max_price
        ));
        debug!("Price filter removed {} rows", removed);
        self.report_progress(
            ProgressUpdate::new(CleaningStage::PriceFilter, 1.0, "Price filter complete")
                .with_rows(df.height()),
        );

        // Step 2: geography
        let (df, removed) = self.apply_geo_filter(&df, CleaningStage::GeoFilter)?;
        summary.removed_by_geography = removed;
        summary.add_step(format!(
            "Removed {} rows outside the geographic bounding box",
            removed
        ));

        // Step 3: last_review
        self.report_progress(ProgressUpdate::new(
            CleaningStage::DateNormalization,
            0.0,
            "Converting last_review to dates...",
        ));
        let (df, warnings) = self.normalize_dates(df)?;
        summary.null_dates = df.column(LAST_REVIEW)?.null_count();
        summary.add_step(format!(
            "Converted {} to dates ({} null, {} unparsable)",
            LAST_REVIEW,
            summary.null_dates,
            warnings.len()
        ));
        log_date_warnings(&warnings);
        summary.date_warnings = warnings;
        self.report_progress(ProgressUpdate::new(
            CleaningStage::DateNormalization,
            1.0,
            "Date normalization complete",
        ));

        // Step 4: optional second geography pass
        let df = if config.legacy_geo_refilter {
            let (df, removed) = self.apply_geo_filter(&df, CleaningStage::GeoRefilter)?;
            summary.removed_by_geo_refilter = removed;
            summary.add_step(format!(
                "Re-applied geographic bounding box ({} rows removed)",
                removed
            ));
            df
        } else {
            df
        };

        summary.rows_after = df.height();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Cleaning complete: {} -> {} rows ({} removed)",
            summary.rows_before,
            summary.rows_after,
            summary.rows_removed()
        );

        Ok(CleaningResult { data: df, summary })
    }

    fn apply_geo_filter(&self, df: &DataFrame, stage: CleaningStage) -> Result<(DataFrame, usize)> {
        self.report_progress(ProgressUpdate::new(
            stage,
            0.0,
            "Keeping rows inside the bounding box",
        ));

        let (df, removed) = filters::filter_by_geography(df, &self.config.geo_bounds)
            .context("Filtering by geography")?;
        debug!("{} removed {} rows", stage.display_name(), removed);

        self.report_progress(
            ProgressUpdate::new(stage, 1.0, "Geography filter complete").with_rows(df.height()),
        );
        Ok((df, removed))
    }

    /// Converts `last_review` and drops the input-position column. Warning
    /// rows are rewritten from filtered positions to input positions.
    fn normalize_dates(&self, mut df: DataFrame) -> Result<(DataFrame, Vec<DateParseWarning>)> {
        let series = df.column(LAST_REVIEW)?.as_materialized_series().clone();
        let (dates, mut warnings) =
            dates::normalize_review_dates(&series).context("Normalizing last_review")?;
        df.replace(LAST_REVIEW, dates)?;

        let positions: Vec<usize> = df
            .column(INPUT_ROW)?
            .as_materialized_series()
            .idx()?
            .into_no_null_iter()
            .map(|i| i as usize)
            .collect();
        for warning in &mut warnings {
            warning.row = positions[warning.row];
        }

        Ok((df.drop(INPUT_ROW)?, warnings))
    }
}

/// Log unparsable dates once, with a few samples.
fn log_date_warnings(warnings: &[DateParseWarning]) {
    if warnings.is_empty() {
        return;
    }

    let samples: Vec<String> = warnings
        .iter()
        .take(WARNING_SAMPLE_SIZE)
        .map(|w| w.to_string())
        .collect();

    warn!(
        "{} last_review value(s) could not be parsed and were set to null (e.g. {})",
        warnings.len(),
        samples.join("; ")
    );
}

/// Clean `df` with the fixed NYC bounding box.
///
/// Shorthand for building a [`CleaningConfig`] and calling
/// [`ListingCleaner::clean`]; only the cleaned frame is returned.
pub fn clean(df: &DataFrame, min_price: f64, max_price: f64) -> Result<DataFrame> {
    let config = CleaningConfig::builder()
        .min_price(min_price)
        .max_price(max_price)
        .build()?;

    Ok(ListingCleaner::new(config).clean(df)?.data)
}
