//! Pipeline module.
//!
//! The artifact-level run around the cleaning transform, plus progress
//! reporting.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use progress::{ClosureProgressReporter, CleaningStage, ProgressReporter, ProgressUpdate};
