//! The audit pipeline.
//!
//! Fixed-order orchestration of the detectors, the Scoring Engine, and the
//! statistical summarizer. The pipeline takes ownership of the input frame,
//! annotates it in place, and returns an [`AuditOutcome`] holding the frame
//! plus everything the reports need.

use crate::config::AuditConfig;
use crate::detectors::{
    ClinicalRangeValidator, FormatValidator, IqrOutlierDetector, IsolationForestDetector,
    MissingValueAnalyzer,
};
use crate::error::{AuditError, Result, ResultExt};
use crate::scoring::ScoringEngine;
use crate::stats::StatisticalSummarizer;
use crate::types::{AuditOutcome, FlagRegistry};
use polars::prelude::*;
use tracing::{info, instrument};

/// Runs the full audit over one dataset.
#[derive(Debug)]
pub struct AuditPipeline {
    config: AuditConfig,
    format_validator: FormatValidator,
}

impl AuditPipeline {
    /// Build a pipeline from a validated configuration.
    pub fn new(config: AuditConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AuditError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            config,
            format_validator: FormatValidator::default(),
        })
    }

    /// Replace the built-in format rule set.
    pub fn with_format_validator(mut self, validator: FormatValidator) -> Self {
        self.format_validator = validator;
        self
    }

    /// Run every stage over `df` in pipeline order.
    ///
    /// Stage order is fixed: missing-value analysis (which normalizes
    /// placeholders and must run before anything reads the data), univariate
    /// outliers, the isolation forest, clinical ranges, format checks, then
    /// scoring and the field summary. Record order is never changed.
    #[instrument(skip(self, df), fields(records = df.height()))]
    pub fn run(&self, mut df: DataFrame) -> Result<AuditOutcome> {
        let data_fields: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        info!(
            "Auditing {} records across {} fields",
            df.height(),
            data_fields.len()
        );

        let mut registry = FlagRegistry::new();

        let (missing_summary, missing_flags) = MissingValueAnalyzer::analyze(&mut df, &self.config)
            .context("During missing-value analysis")?;
        registry.register_all(missing_flags);

        let outlier_flags = IqrOutlierDetector::detect(&mut df, &self.config.outlier_columns)
            .context("During outlier detection")?;
        registry.register_all(outlier_flags);

        if let Some(anomaly_flag) = IsolationForestDetector::detect(&mut df, &self.config)
            .context("During anomaly detection")?
        {
            registry.register(anomaly_flag);
        }

        let range_flags = ClinicalRangeValidator::validate(&mut df, &self.config.clinical_ranges)
            .context("During clinical range validation")?;
        registry.register_all(range_flags);

        let format_flags = self
            .format_validator
            .validate(&mut df)
            .context("During format validation")?;
        registry.register_all(format_flags);

        ScoringEngine::score(&mut df, &registry, &self.config.error_weights)
            .context("During scoring")?;

        let field_stats = StatisticalSummarizer::summarize(&df, &data_fields)
            .context("During statistical summary")?;

        info!("Audit finished: {} flag columns produced", registry.len());
        Ok(AuditOutcome {
            data: df,
            registry,
            missing_summary,
            field_stats,
            data_fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        COMPLETENESS_SCORE, ERROR_LOG, QUALITY_SCORE, ROW_ANOMALY_IF, ROW_INDEX, TOTAL_ERRORS,
        WEIGHTED_ERRORS,
    };
    use pretty_assertions::assert_eq;

    fn sample_frame() -> DataFrame {
        df![
            "Glucose" => [0.0, 100.0, 105.0, 600.0, 110.0, 98.0],
            "BMI" => [25.0, 80.0, 22.0, 30.0, 28.0, 24.0],
            "Age" => [30.0, -5.0, 45.0, 60.0, 50.0, 40.0],
            "Notes" => ["ok", "N/A", "ok", "Unknown", "ok", "ok"],
        ]
        .unwrap()
    }

    fn sample_config() -> AuditConfig {
        AuditConfig::builder()
            .zero_as_missing_cols(["Glucose"])
            .clinical_range("BMI", 10.0, 60.0)
            .outlier_columns(["Glucose", "BMI"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_full_run_produces_all_derived_columns() {
        let pipeline = AuditPipeline::new(sample_config()).unwrap();
        let outcome = pipeline.run(sample_frame()).unwrap();

        for name in [
            "Glucose_Missing",
            "Glucose_Outlier",
            "BMI_Outlier",
            ROW_ANOMALY_IF,
            "BMI_RangeError",
            "Age_FormatError",
            COMPLETENESS_SCORE,
            WEIGHTED_ERRORS,
            TOTAL_ERRORS,
            QUALITY_SCORE,
            ROW_INDEX,
            ERROR_LOG,
        ] {
            assert!(
                outcome.data.column(name).is_ok(),
                "expected column '{}'",
                name
            );
        }
    }

    #[test]
    fn test_registry_follows_pipeline_order() {
        let pipeline = AuditPipeline::new(sample_config()).unwrap();
        let outcome = pipeline.run(sample_frame()).unwrap();

        assert_eq!(
            outcome.registry.names(),
            vec![
                "Glucose_Missing",
                "Glucose_Outlier",
                "BMI_Outlier",
                ROW_ANOMALY_IF,
                "BMI_RangeError",
                "Age_FormatError",
            ]
        );
    }

    #[test]
    fn test_data_fields_exclude_derived_columns() {
        let pipeline = AuditPipeline::new(sample_config()).unwrap();
        let outcome = pipeline.run(sample_frame()).unwrap();

        assert_eq!(outcome.data_fields, vec!["Glucose", "BMI", "Age", "Notes"]);
    }

    #[test]
    fn test_record_order_preserved() {
        let pipeline = AuditPipeline::new(sample_config()).unwrap();
        let outcome = pipeline.run(sample_frame()).unwrap();

        let indices: Vec<u32> = outcome
            .data
            .column(ROW_INDEX)
            .unwrap()
            .u32()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);

        let glucose: Vec<f64> = outcome
            .data
            .column("Glucose")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect();
        assert_eq!(glucose, vec![0.0, 100.0, 105.0, 600.0, 110.0, 98.0]);
    }

    #[test]
    fn test_run_is_deterministic() {
        let pipeline = AuditPipeline::new(sample_config()).unwrap();
        let first = pipeline.run(sample_frame()).unwrap();
        let second = pipeline.run(sample_frame()).unwrap();

        assert!(first.data.equals_missing(&second.data));
    }

    #[test]
    fn test_known_flags_on_sample() {
        let pipeline = AuditPipeline::new(sample_config()).unwrap();
        let outcome = pipeline.run(sample_frame()).unwrap();

        let logs: Vec<String> = outcome
            .data
            .column(ERROR_LOG)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap().to_string())
            .collect();

        // Record 0: glucose zero. Record 1: BMI out of range, negative age.
        // Record 3: glucose fence outlier.
        assert!(logs[0].contains("Glucose_Missing (0.0)"));
        assert!(logs[1].contains("BMI_RangeError (80.0)"));
        assert!(logs[1].contains("Age_FormatError (-5.0)"));
        assert!(logs[3].contains("Glucose_Outlier (600.0)"));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = sample_config();
        config.contamination = 0.9;

        let result = AuditPipeline::new(config);
        assert!(matches!(
            result.unwrap_err(),
            AuditError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_field_stats_cover_numeric_fields_only() {
        let pipeline = AuditPipeline::new(sample_config()).unwrap();
        let outcome = pipeline.run(sample_frame()).unwrap();

        let fields: Vec<&str> = outcome
            .field_stats
            .iter()
            .map(|s| s.field.as_str())
            .collect();
        assert_eq!(fields, vec!["Glucose", "BMI", "Age"]);
    }

    #[test]
    fn test_custom_weights_flow_through() {
        let config = AuditConfig::builder()
            .zero_as_missing_cols(["Glucose"])
            .clinical_range("BMI", 10.0, 60.0)
            .outlier_columns(["Glucose", "BMI"])
            .error_weight("Glucose_Missing", 2.0)
            .build()
            .unwrap();
        let pipeline = AuditPipeline::new(config).unwrap();
        let outcome = pipeline.run(sample_frame()).unwrap();

        // 6 registered flags, Glucose_Missing reweighted to 2: total 7.
        // Record 0 triggers Glucose_Missing (weight 2) and, because the zero
        // falls below the lower fence, Glucose_Outlier (weight 1).
        let quality: Vec<f64> = outcome
            .data
            .column(QUALITY_SCORE)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect();
        assert!((quality[0] - (100.0 - 3.0 / 7.0 * 100.0)).abs() < 1e-9);
    }
}
