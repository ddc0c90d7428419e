//! Basic Cleaning Library
//!
//! The cleaning stage of the NYC short-term rental price pipeline, built with
//! Rust and Polars.
//!
//! # Overview
//!
//! A raw listings dataset is fetched from an artifact store, reduced to rows
//! with a plausible price inside the New York City bounding box, has its
//! `last_review` column converted to dates, and is published back as a new
//! artifact version.
//!
//! - **Transform**: [`clean`] / [`ListingCleaner`], pure and side-effect free
//! - **Artifacts**: [`ArtifactStore`] trait with a filesystem backend,
//!   [`LocalArtifactStore`]
//! - **Orchestration**: [`Pipeline`], which wires fetch, load, clean, write and
//!   publish together and reports progress
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use basic_cleaning::{ArtifactSpec, CleaningConfig, LocalArtifactStore, Pipeline};
//! use std::sync::Arc;
//!
//! let config = CleaningConfig::builder()
//!     .min_price(10.0)
//!     .max_price(350.0)
//!     .build()?;
//!
//! let report = Pipeline::builder()
//!     .config(config)
//!     .store(Arc::new(LocalArtifactStore::new("artifacts")))
//!     .build()?
//!     .run(
//!         "sample.csv:latest",
//!         &ArtifactSpec::new("clean_sample.csv", "clean_sample", "Data with outliers removed"),
//!     )?;
//!
//! println!("{} rows kept", report.summary.rows_after);
//! ```
//!
//! The transform can also be used on its own:
//!
//! ```rust,ignore
//! use basic_cleaning::clean;
//!
//! let cleaned = clean(&df, 10.0, 350.0)?;
//! ```

pub mod artifacts;
pub mod cleaner;
pub mod config;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use artifacts::{ArtifactStore, LocalArtifactStore};
pub use cleaner::{ListingCleaner, clean};
pub use config::{
    CleaningConfig, CleaningConfigBuilder, ConfigValidationError, DEFAULT_OUTPUT_FILE, GeoBounds,
};
pub use dataset::{load_dataset, validate_schema, write_dataset};
pub use error::{CleaningError, ResultExt};
pub use pipeline::{
    ClosureProgressReporter, CleaningStage, Pipeline, PipelineBuilder, ProgressReporter,
    ProgressUpdate,
};
pub use types::{
    ArtifactHandle, ArtifactSpec, CleaningResult, CleaningSummary, DateParseWarning, RunReport,
};
pub use utils::REQUIRED_COLUMNS;
