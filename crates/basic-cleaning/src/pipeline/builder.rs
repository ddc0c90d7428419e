//! The fetch → clean → publish run.
//!
//! [`Pipeline`] wraps the pure [`ListingCleaner`] transform with the artifact
//! plumbing around it: resolve the input artifact, load it, clean it, write
//! the result locally and publish that file as a new artifact version.

use crate::artifacts::ArtifactStore;
use crate::cleaner::ListingCleaner;
use crate::config::CleaningConfig;
use crate::dataset::{load_dataset, write_dataset};
use crate::error::{CleaningError, Result, ResultExt};
use crate::pipeline::progress::{
    ClosureProgressReporter, CleaningStage, ProgressReporter, ProgressUpdate,
};
use crate::types::{ArtifactSpec, RunReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// A configured cleaning run.
///
/// Use [`Pipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use basic_cleaning::{ArtifactSpec, CleaningConfig, LocalArtifactStore, Pipeline};
/// use std::sync::Arc;
///
/// let report = Pipeline::builder()
///     .config(CleaningConfig::builder().min_price(10.0).max_price(350.0).build()?)
///     .store(Arc::new(LocalArtifactStore::new("artifacts")))
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run(
///         "sample.csv:latest",
///         &ArtifactSpec::new("clean_sample.csv", "clean_sample", "Data with outliers removed"),
///     )?;
/// ```
pub struct Pipeline {
    store: Arc<dyn ArtifactStore>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cleaner: ListingCleaner,
    work_dir: PathBuf,
}

// Ensure Pipeline is Send (can be moved to a worker thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &CleaningConfig {
        self.cleaner.config()
    }

    /// Local path the cleaned dataset is written to before publishing.
    pub fn output_path(&self) -> PathBuf {
        self.work_dir.join(&self.config().output_file)
    }

    /// Fetch `input_artifact`, clean it, and publish the result as `output`.
    ///
    /// Nothing is written or published unless the transform succeeds.
    ///
    /// # Errors
    ///
    /// - [`CleaningError::Usage`] if `output` has an empty name or type
    /// - [`CleaningError::ArtifactNotFound`] if the input cannot be resolved
    /// - [`CleaningError::MissingColumn`] / [`CleaningError::MalformedInput`]
    ///   if the dataset is unusable
    pub fn run(&self, input_artifact: &str, output: &ArtifactSpec) -> Result<RunReport> {
        match self.run_internal(input_artifact, output) {
            Ok(report) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Published {}",
                    report.artifact.qualified_name()
                )));
                Ok(report)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Cleaning run failed: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self, input_artifact: &str, output: &ArtifactSpec) -> Result<RunReport> {
        let start_time = Instant::now();
        validate_output_spec(output)?;

        info!(
            "Cleaning {} -> {} (store: {})",
            input_artifact,
            output.name,
            self.store.name()
        );

        // Step 1: resolve the input
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Fetching,
            0.0,
            format!("Fetching {}", input_artifact),
        ));
        let input_path = self
            .store
            .fetch(input_artifact)
            .context(format!("Fetching input artifact '{}'", input_artifact))?;
        debug!("Input resolved to {}", input_path.display());

        // Step 2: load
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Loading,
            0.0,
            format!("Loading {}", input_path.display()),
        ));
        let df = load_dataset(&input_path)?;
        self.report_progress(
            ProgressUpdate::new(CleaningStage::Loading, 1.0, "Dataset loaded")
                .with_rows(df.height()),
        );

        // Step 3: transform
        let mut result = self.cleaner.clean(&df)?;

        // Step 4: write locally
        let output_path = self.output_path();
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Writing,
            0.0,
            format!("Writing {}", output_path.display()),
        ));
        let output_file = write_dataset(&mut result.data, &output_path)?;

        // Step 5: publish
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Publishing,
            0.0,
            format!("Publishing {} ({})", output.name, output.artifact_type),
        ));
        let artifact = self
            .store
            .publish(output, &output_file)
            .context(format!("Publishing '{}'", output.name))?;

        let mut summary = result.summary;
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Run finished in {} ms: {} rows published as {}",
            summary.duration_ms,
            summary.rows_after,
            artifact.qualified_name()
        );

        Ok(RunReport {
            input_artifact: input_artifact.to_string(),
            input_path,
            output_file,
            artifact,
            summary,
        })
    }
}

fn validate_output_spec(output: &ArtifactSpec) -> Result<()> {
    if output.name.trim().is_empty() {
        return Err(CleaningError::Usage(
            "output artifact name must not be empty".to_string(),
        ));
    }
    if output.artifact_type.trim().is_empty() {
        return Err(CleaningError::Usage(
            "output artifact type must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Builder for creating a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<CleaningConfig>,
    store: Option<Arc<dyn ArtifactStore>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    work_dir: Option<PathBuf>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the cleaning configuration.
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the artifact store inputs are fetched from and outputs published to.
    pub fn store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Directory the cleaned file is written to before publishing.
    /// Defaults to the current directory.
    pub fn work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set a progress reporter for receiving updates during the run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// Convenience over [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid or no store was set.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let store = self
            .store
            .ok_or_else(|| CleaningError::Usage("no artifact store configured".to_string()))?;

        let mut cleaner = ListingCleaner::new(config);
        if let Some(reporter) = &self.progress_reporter {
            cleaner = cleaner.with_reporter(Arc::clone(reporter));
        }

        Ok(Pipeline {
            store,
            progress_reporter: self.progress_reporter,
            cleaner,
            work_dir: self.work_dir.unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}
