//! Configuration types for the cleaning stage.
//!
//! [`CleaningConfig`] is built with the builder pattern and validated on
//! [`build()`](CleaningConfigBuilder::build). The geographic bounding box is
//! fixed to [`GeoBounds::NYC`] unless a caller constructs the config in code.

use serde::{Deserialize, Serialize};

/// Default name of the local file the cleaned dataset is written to.
pub const DEFAULT_OUTPUT_FILE: &str = "clean_sample.csv";

/// Inclusive longitude/latitude bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub min_latitude: f64,
    pub max_latitude: f64,
}

impl GeoBounds {
    /// New York City.
    pub const NYC: GeoBounds = GeoBounds {
        min_longitude: -74.25,
        max_longitude: -73.50,
        min_latitude: 40.5,
        max_latitude: 41.2,
    };

    /// Returns true if the point lies inside the box (edges included).
    #[inline]
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        (self.min_longitude..=self.max_longitude).contains(&longitude)
            && (self.min_latitude..=self.max_latitude).contains(&latitude)
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::NYC
    }
}

/// Configuration for a cleaning run.
///
/// # Example
///
/// ```rust,ignore
/// use basic_cleaning::config::CleaningConfig;
///
/// let config = CleaningConfig::builder()
///     .min_price(10.0)
///     .max_price(350.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Lowest price kept (inclusive).
    /// Default: 0.0
    pub min_price: f64,

    /// Highest price kept (inclusive).
    /// Default: f64::MAX
    pub max_price: f64,

    /// Geographic box rows must fall inside.
    /// Default: [`GeoBounds::NYC`]
    pub geo_bounds: GeoBounds,

    /// Apply the geography filter a second time after date normalization.
    /// The result is identical; kept for parity with older runs.
    /// Default: false
    pub legacy_geo_refilter: bool,

    /// File name the cleaned dataset is written to before publishing.
    /// Default: "clean_sample.csv"
    pub output_file: String,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            min_price: 0.0,
            max_price: f64::MAX,
            geo_bounds: GeoBounds::NYC,
            legacy_geo_refilter: false,
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    ///
    /// An inverted price range is not an error: it simply keeps no rows.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if value.is_nan() {
                return Err(ConfigValidationError::NonFiniteBound {
                    field: field.to_string(),
                    value,
                });
            }
        }

        let b = &self.geo_bounds;
        if b.min_longitude > b.max_longitude || b.min_latitude > b.max_latitude {
            return Err(ConfigValidationError::InvalidGeoBounds(*b));
        }

        if self.output_file.trim().is_empty() {
            return Err(ConfigValidationError::EmptyOutputFile);
        }

        Ok(())
    }

    /// True when no row can satisfy the price predicate.
    pub fn has_inverted_price_range(&self) -> bool {
        self.min_price > self.max_price
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{field}': {value} (must be a number)")]
    NonFiniteBound { field: String, value: f64 },

    #[error("Invalid geographic bounds: {0:?}")]
    InvalidGeoBounds(GeoBounds),

    #[error("Output file name must not be empty")]
    EmptyOutputFile,
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    min_price: Option<f64>,
    max_price: Option<f64>,
    geo_bounds: Option<GeoBounds>,
    legacy_geo_refilter: Option<bool>,
    output_file: Option<String>,
}

impl CleaningConfigBuilder {
    /// Set the lowest price to keep (inclusive).
    pub fn min_price(mut self, price: f64) -> Self {
        self.min_price = Some(price);
        self
    }

    /// Set the highest price to keep (inclusive).
    pub fn max_price(mut self, price: f64) -> Self {
        self.max_price = Some(price);
        self
    }

    /// Override the geographic bounding box.
    pub fn geo_bounds(mut self, bounds: GeoBounds) -> Self {
        self.geo_bounds = Some(bounds);
        self
    }

    /// Enable or disable the second geography pass.
    pub fn legacy_geo_refilter(mut self, enable: bool) -> Self {
        self.legacy_geo_refilter = Some(enable);
        self
    }

    /// Set the local output file name.
    pub fn output_file(mut self, name: impl Into<String>) -> Self {
        self.output_file = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let defaults = CleaningConfig::default();
        let config = CleaningConfig {
            min_price: self.min_price.unwrap_or(defaults.min_price),
            max_price: self.max_price.unwrap_or(defaults.max_price),
            geo_bounds: self.geo_bounds.unwrap_or(defaults.geo_bounds),
            legacy_geo_refilter: self
                .legacy_geo_refilter
                .unwrap_or(defaults.legacy_geo_refilter),
            output_file: self.output_file.unwrap_or(defaults.output_file),
        };

        config.validate()?;
        Ok(config)
    }
}
