//! Progress reporting for cleaning runs.
//!
//! A run moves through a fixed sequence of [`CleaningStage`]s. Callers that
//! want to follow along register a [`ProgressReporter`], usually through
//! [`PipelineBuilder::on_progress`](super::PipelineBuilder::on_progress).
//!
//! ```rust,ignore
//! let report = Pipeline::builder()
//!     .config(config)
//!     .store(store)
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .run("sample.csv:latest", &output)?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of a cleaning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    /// Resolving the input artifact to a local file
    Fetching,
    /// Reading the CSV file
    Loading,
    /// Checking required columns
    Validating,
    /// Dropping rows outside the price range
    PriceFilter,
    /// Dropping rows outside the bounding box
    GeoFilter,
    /// Converting `last_review` to dates
    DateNormalization,
    /// Optional second bounding-box pass
    GeoRefilter,
    /// Writing the cleaned CSV
    Writing,
    /// Publishing the output artifact
    Publishing,
    /// Run completed successfully
    Complete,
    /// Run failed with an error
    Failed,
}

impl CleaningStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Fetching => "Fetching Artifact",
            Self::Loading => "Loading Dataset",
            Self::Validating => "Validating Schema",
            Self::PriceFilter => "Filtering Prices",
            Self::GeoFilter => "Filtering Geography",
            Self::DateNormalization => "Normalizing Dates",
            Self::GeoRefilter => "Re-filtering Geography",
            Self::Writing => "Writing Output",
            Self::Publishing => "Publishing Artifact",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run this stage accounts for (0.0 - 1.0).
    ///
    /// The main stages sum to 1.0. The optional re-filter is weightless.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Fetching => 0.05,
            Self::Loading => 0.15,
            Self::Validating => 0.05,
            Self::PriceFilter => 0.15,
            Self::GeoFilter => 0.15,
            Self::DateNormalization => 0.20,
            Self::GeoRefilter => 0.0,
            Self::Writing => 0.15,
            Self::Publishing => 0.10,
            Self::Complete => 0.0,
            Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Fetching => 0.0,
            Self::Loading => 0.05,
            Self::Validating => 0.20,
            Self::PriceFilter => 0.25,
            Self::GeoFilter => 0.40,
            Self::DateNormalization => 0.55,
            Self::GeoRefilter => 0.75,
            Self::Writing => 0.75,
            Self::Publishing => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: CleaningStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,

    /// Rows remaining after this stage, when the stage changes the row set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage.
    pub fn new(stage: CleaningStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            rows: None,
        }
    }

    /// Attach the current row count.
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: CleaningStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
            rows: None,
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: CleaningStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
            rows: None,
        }
    }
}

/// Receives progress updates during a run.
///
/// Implementations must be `Send + Sync` so a pipeline can be moved to a
/// worker thread together with its reporter.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(CleaningStage::PriceFilter, 0.5, "Filtering...");
        assert_eq!(update.stage, CleaningStage::PriceFilter);
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.325).abs() < 1e-6);
        assert!(update.rows.is_none());
    }

    #[test]
    fn test_progress_update_with_rows() {
        let update = ProgressUpdate::new(CleaningStage::GeoFilter, 1.0, "Done").with_rows(42);
        assert_eq!(update.rows, Some(42));
    }

    #[test]
    fn test_progress_update_complete() {
        let update = ProgressUpdate::complete("Done!");
        assert_eq!(update.stage, CleaningStage::Complete);
        assert_eq!(update.progress, 1.0);
    }

    #[test]
    fn test_closure_progress_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::new(CleaningStage::Loading, 0.5, "Test"));
        reporter.report(ProgressUpdate::complete("Done"));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stage_weights_sum() {
        let stages = [
            CleaningStage::Fetching,
            CleaningStage::Loading,
            CleaningStage::Validating,
            CleaningStage::PriceFilter,
            CleaningStage::GeoFilter,
            CleaningStage::DateNormalization,
            CleaningStage::GeoRefilter,
            CleaningStage::Writing,
            CleaningStage::Publishing,
        ];

        let total_weight: f32 = stages.iter().map(|s| s.weight()).sum();
        assert!((total_weight - 1.0).abs() < 0.01, "Weights should sum to ~1.0");
    }

    #[test]
    fn test_base_progress_matches_weights() {
        let ordered = [
            CleaningStage::Fetching,
            CleaningStage::Loading,
            CleaningStage::Validating,
            CleaningStage::PriceFilter,
            CleaningStage::GeoFilter,
            CleaningStage::DateNormalization,
            CleaningStage::Writing,
            CleaningStage::Publishing,
        ];

        for pair in ordered.windows(2) {
            let expected = pair[0].base_progress() + pair[0].weight();
            assert!(
                (pair[1].base_progress() - expected).abs() < 1e-6,
                "{:?} should start where {:?} ends",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn test_stage_json_values() {
        let json = serde_json::to_string(&CleaningStage::DateNormalization).unwrap();
        assert_eq!(json, "\"date_normalization\"");

        let json = serde_json::to_string(&CleaningStage::GeoRefilter).unwrap();
        assert_eq!(json, "\"geo_refilter\"");
    }
}
