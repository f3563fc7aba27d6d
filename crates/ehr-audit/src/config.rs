//! Configuration types for the audit pipeline.
//!
//! The config deserializes from a plain JSON settings file; every option has
//! a safe default so a missing key is never an error. A builder is provided
//! for programmatic setup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_placeholders() -> Vec<String> {
    vec!["".to_string(), "N/A".to_string(), "Unknown".to_string()]
}

fn default_contamination() -> f64 {
    0.05
}

fn default_seed() -> u64 {
    42
}

fn default_tree_count() -> usize {
    100
}

/// Configuration for one audit run.
///
/// # Example
///
/// ```rust,ignore
/// use ehr_audit::AuditConfig;
///
/// let config = AuditConfig::builder()
///     .zero_as_missing_cols(["Glucose", "Insulin"])
///     .clinical_range("BMI", 10.0, 60.0)
///     .outlier_columns(["Glucose", "BMI"])
///     .contamination(0.1)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Tokens normalized to null before any detection runs.
    pub placeholder_values: Vec<String>,

    /// Fields where a zero value also means missing.
    pub zero_as_missing_cols: Vec<String>,

    /// Inclusive domain-valid (low, high) bounds per field.
    pub clinical_ranges: HashMap<String, (f64, f64)>,

    /// Fields subject to univariate and multivariate outlier detection.
    pub outlier_columns: Vec<String>,

    /// Weight per flag name; flags without an entry default to weight 1.
    pub error_weights: HashMap<String, f64>,

    /// Expected anomalous fraction of records, in (0, 0.5).
    pub contamination: f64,

    /// Seed for the isolation forest; equal seed and input give identical
    /// flag assignments.
    pub seed: u64,

    /// Number of trees in the isolation forest ensemble.
    pub tree_count: usize,

    /// Count a field at most once in the completeness numerator even if it
    /// is both marker-missing and zero-as-missing. Off by default to match
    /// the audited behavior.
    pub dedup_missing: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            placeholder_values: default_placeholders(),
            zero_as_missing_cols: Vec::new(),
            clinical_ranges: HashMap::new(),
            outlier_columns: Vec::new(),
            error_weights: HashMap::new(),
            contamination: default_contamination(),
            seed: default_seed(),
            tree_count: default_tree_count(),
            dedup_missing: false,
        }
    }
}

impl AuditConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.contamination > 0.0 && self.contamination < 0.5) {
            return Err(ConfigValidationError::InvalidContamination(
                self.contamination,
            ));
        }

        for (flag, weight) in &self.error_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigValidationError::NegativeWeight {
                    flag: flag.clone(),
                    weight: *weight,
                });
            }
        }

        for (field, (low, high)) in &self.clinical_ranges {
            if low > high {
                return Err(ConfigValidationError::InvertedRange {
                    field: field.clone(),
                    low: *low,
                    high: *high,
                });
            }
        }

        if self.tree_count == 0 {
            return Err(ConfigValidationError::InvalidTreeCount(self.tree_count));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid contamination: {0} (must lie in the open interval (0, 0.5))")]
    InvalidContamination(f64),

    #[error("Invalid weight for flag '{flag}': {weight} (must be non-negative and finite)")]
    NegativeWeight { flag: String, weight: f64 },

    #[error("Inverted clinical range for '{field}': low {low} exceeds high {high}")]
    InvertedRange { field: String, low: f64, high: f64 },

    #[error("Invalid tree count: {0} (must be at least 1)")]
    InvalidTreeCount(usize),
}

/// Builder for [`AuditConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AuditConfigBuilder {
    placeholder_values: Option<Vec<String>>,
    zero_as_missing_cols: Vec<String>,
    clinical_ranges: HashMap<String, (f64, f64)>,
    outlier_columns: Vec<String>,
    error_weights: HashMap<String, f64>,
    contamination: Option<f64>,
    seed: Option<u64>,
    tree_count: Option<usize>,
    dedup_missing: Option<bool>,
}

impl AuditConfigBuilder {
    /// Replace the placeholder token set normalized to null.
    pub fn placeholder_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.placeholder_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the fields where zero counts as missing.
    pub fn zero_as_missing_cols<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zero_as_missing_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Add one inclusive clinical range bound.
    pub fn clinical_range(mut self, field: impl Into<String>, low: f64, high: f64) -> Self {
        self.clinical_ranges.insert(field.into(), (low, high));
        self
    }

    /// Set the fields subject to outlier and anomaly detection.
    pub fn outlier_columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outlier_columns = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Set the weight for one flag name.
    pub fn error_weight(mut self, flag: impl Into<String>, weight: f64) -> Self {
        self.error_weights.insert(flag.into(), weight);
        self
    }

    /// Set the expected anomalous fraction of records.
    pub fn contamination(mut self, contamination: f64) -> Self {
        self.contamination = Some(contamination);
        self
    }

    /// Set the isolation forest seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the isolation forest ensemble size.
    pub fn tree_count(mut self, trees: usize) -> Self {
        self.tree_count = Some(trees);
        self
    }

    /// Count each field at most once toward the completeness numerator.
    pub fn dedup_missing(mut self, dedup: bool) -> Self {
        self.dedup_missing = Some(dedup);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AuditConfig` or an error if validation fails.
    pub fn build(self) -> Result<AuditConfig, ConfigValidationError> {
        let config = AuditConfig {
            placeholder_values: self.placeholder_values.unwrap_or_else(default_placeholders),
            zero_as_missing_cols: self.zero_as_missing_cols,
            clinical_ranges: self.clinical_ranges,
            outlier_columns: self.outlier_columns,
            error_weights: self.error_weights,
            contamination: self.contamination.unwrap_or_else(default_contamination),
            seed: self.seed.unwrap_or_else(default_seed),
            tree_count: self.tree_count.unwrap_or_else(default_tree_count),
            dedup_missing: self.dedup_missing.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }
}
