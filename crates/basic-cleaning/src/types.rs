use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A `last_review` value that could not be read as a date.
///
/// The row is kept; its date becomes null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateParseWarning {
    /// Position of the row in the input dataset (0-based).
    pub row: usize,
    pub value: String,
}

impl std::fmt::Display for DateParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: unparsable last_review '{}'", self.row, self.value)
    }
}

/// Row accounting for one cleaning pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    pub removed_by_price: usize,
    pub removed_by_geography: usize,
    /// Rows dropped by the second geography pass. Always zero; reported so
    /// parity runs can prove it.
    pub removed_by_geo_refilter: usize,
    /// Rows whose `last_review` is null after normalization.
    pub null_dates: usize,
    pub date_warnings: Vec<DateParseWarning>,
    pub steps: Vec<String>,
    pub duration_ms: u64,
}

impl CleaningSummary {
    pub fn new(rows_before: usize) -> Self {
        Self {
            rows_before,
            ..Default::default()
        }
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    pub fn add_step(&mut self, step: impl Into<String>) {
        self.steps.push(step.into());
    }
}

/// Output of [`ListingCleaner::clean`](crate::cleaner::ListingCleaner::clean).
#[derive(Debug, Clone)]
pub struct CleaningResult {
    pub data: DataFrame,
    pub summary: CleaningSummary,
}

/// Name, type and description an artifact is published under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
}

impl ArtifactSpec {
    pub fn new(
        name: impl Into<String>,
        artifact_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            artifact_type: artifact_type.into(),
            description: description.into(),
        }
    }
}

/// Handle to a published artifact version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHandle {
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub version: u32,
    pub path: PathBuf,
}

impl ArtifactHandle {
    /// Fully qualified `name:vN` reference.
    pub fn qualified_name(&self) -> String {
        format!("{}:v{}", self.name, self.version)
    }
}

/// What a full fetch → clean → publish run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub input_artifact: String,
    pub input_path: PathBuf,
    pub output_file: PathBuf,
    pub artifact: ArtifactHandle,
    pub summary: CleaningSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_removed_saturates() {
        let mut summary = CleaningSummary::new(3);
        summary.rows_after = 1;
        assert_eq!(summary.rows_removed(), 2);

        summary.rows_after = 5;
        assert_eq!(summary.rows_removed(), 0);
    }

    #[test]
    fn test_artifact_spec_serializes_type_field() {
        let spec = ArtifactSpec::new("clean_sample.csv", "clean_sample", "Cleaned data");
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"type\":\"clean_sample\""));
    }

    #[test]
    fn test_qualified_name() {
        let handle = ArtifactHandle {
            name: "clean_sample.csv".to_string(),
            artifact_type: "clean_sample".to_string(),
            version: 2,
            path: PathBuf::from("artifacts/clean_sample.csv/v2/clean_sample.csv"),
        };
        assert_eq!(handle.qualified_name(), "clean_sample.csv:v2");
    }

    #[test]
    fn test_date_warning_display() {
        let warning = DateParseWarning {
            row: 4,
            value: "yesterday".to_string(),
        };
        assert_eq!(warning.to_string(), "row 4: unparsable last_review 'yesterday'");
    }
}
