//! EHR Data Quality Audit Pipeline
//!
//! A data-quality auditing library for tabular clinical records, built on
//! Polars.
//!
//! # Overview
//!
//! The audit annotates a dataset in place, never dropping or reordering
//! records, and scores each record for quality:
//!
//! - **Missing-value analysis**: placeholder normalization, zero-as-missing
//!   flags, and a per-record completeness score
//! - **Univariate outliers**: Tukey-fence (1.5 IQR) detection per field
//! - **Multivariate anomalies**: a seeded isolation forest over the
//!   configured numeric fields
//! - **Clinical range validation**: inclusive domain bounds per field
//! - **Format validation**: representational checks such as a numeric age
//!   in `[0, 120]`
//! - **Scoring**: weighted error sums, a 0-100 quality score, and a
//!   human-readable per-record error log
//! - **Reporting**: detailed, error-log, and summary report files
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ehr_audit::{AuditConfig, AuditPipeline, ReportGenerator};
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("ehr.csv".into()))?
//!     .finish()?;
//!
//! let config = AuditConfig::builder()
//!     .zero_as_missing_cols(["Glucose", "BloodPressure", "BMI"])
//!     .clinical_range("BMI", 10.0, 60.0)
//!     .clinical_range("Glucose", 40.0, 400.0)
//!     .outlier_columns(["Glucose", "BloodPressure", "BMI"])
//!     .contamination(0.05)
//!     .build()?;
//!
//! let outcome = AuditPipeline::new(config)?.run(df)?;
//! let metrics = ReportGenerator::new("./outputs").generate(&outcome)?;
//!
//! println!("Average quality: {}%", metrics.average_quality_score);
//! ```
//!
//! # Determinism
//!
//! Equal input and equal configuration (including the seed) produce
//! identical flag assignments, scores, and reports. The isolation forest is
//! the only randomized stage and draws everything from one seeded generator.

pub mod config;
pub mod detectors;
pub mod error;
pub mod pipeline;
pub mod reporting;
pub mod scoring;
pub mod stats;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{AuditConfig, AuditConfigBuilder, ConfigValidationError};
pub use detectors::{
    ClinicalRangeValidator, FormatRule, FormatValidator, IqrOutlierDetector,
    IsolationForestDetector, MissingValueAnalyzer,
};
pub use error::{AuditError, Result as AuditResult, ResultExt};
pub use pipeline::AuditPipeline;
pub use reporting::{ReportGenerator, overall_metrics};
pub use scoring::ScoringEngine;
pub use stats::StatisticalSummarizer;
pub use types::{
    AuditOutcome, FieldStats, FlagColumn, FlagKind, FlagRegistry, MissingCounts, OverallMetrics,
};
