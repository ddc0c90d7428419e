//! Error types for the listing cleaning stage.
//!
//! Every fatal condition of a run maps to one variant of [`CleaningError`].
//! Per-row date problems are not errors: they are collected as
//! [`DateParseWarning`](crate::types::DateParseWarning)s in the run summary.
//!
//! Errors serialize as `{ "code": ..., "message": ... }` so a caller can
//! forward them as JSON.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// The main error type for the cleaning stage.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// A required parameter is missing or invalid.
    #[error("Usage error: {0}")]
    Usage(String),

    /// One or more required columns are absent from the input schema.
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumn(Vec<String>),

    /// The input could not be loaded or parsed as a dataset.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The artifact store could not resolve a name.
    #[error("Artifact '{0}' not found")]
    ArtifactNotFound(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable, machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Usage(_) => "USAGE_ERROR",
            Self::MissingColumn(_) => "MISSING_COLUMN",
            Self::MalformedInput(_) => "MALFORMED_INPUT",
            Self::ArtifactNotFound(_) => "ARTIFACT_NOT_FOUND",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Returns the innermost error, skipping any context layers.
    pub fn root(&self) -> &CleaningError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error was caused by the input data rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self.root(),
            Self::MissingColumn(_) | Self::MalformedInput(_)
        )
    }
}

impl From<ConfigValidationError> for CleaningError {
    fn from(err: ConfigValidationError) -> Self {
        CleaningError::Usage(err.to_string())
    }
}

impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Io(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            CleaningError::Usage("min_price is NaN".to_string()).error_code(),
            "USAGE_ERROR"
        );
        assert_eq!(
            CleaningError::MissingColumn(vec!["latitude".to_string()]).error_code(),
            "MISSING_COLUMN"
        );
        assert_eq!(
            CleaningError::MalformedInput("bad".to_string()).error_code(),
            "MALFORMED_INPUT"
        );
    }

    #[test]
    fn test_missing_column_message_lists_all_columns() {
        let error =
            CleaningError::MissingColumn(vec!["latitude".to_string(), "price".to_string()]);
        assert_eq!(
            error.to_string(),
            "Missing required column(s): latitude, price"
        );
    }

    #[test]
    fn test_is_input_error() {
        assert!(CleaningError::MissingColumn(vec!["price".to_string()]).is_input_error());
        assert!(CleaningError::MalformedInput("x".to_string()).is_input_error());
        assert!(
            CleaningError::MalformedInput("x".to_string())
                .with_context("Loading raw dataset")
                .is_input_error()
        );
        assert!(!CleaningError::ArtifactNotFound("sample.csv".to_string()).is_input_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = CleaningError::ArtifactNotFound("sample.csv:latest".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("ARTIFACT_NOT_FOUND"));
        assert!(json.contains("sample.csv:latest"));
    }

    #[test]
    fn test_with_context() {
        let error = CleaningError::MissingColumn(vec!["latitude".to_string()])
            .with_context("Validating schema");
        assert!(error.to_string().contains("Validating schema"));
        assert_eq!(error.error_code(), "MISSING_COLUMN");
    }

    #[test]
    fn test_config_error_maps_to_usage() {
        let error: CleaningError = ConfigValidationError::NonFiniteBound {
            field: "min_price".to_string(),
            value: f64::NAN,
        }
        .into();
        assert_eq!(error.error_code(), "USAGE_ERROR");
        assert!(error.to_string().contains("min_price"));
    }
}
