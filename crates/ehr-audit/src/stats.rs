//! Per-field descriptive statistics for the summary report.
//!
//! Computed over the original data fields only, after placeholder
//! normalization, so derived flag and score columns never leak into the
//! summary. Nulls are excluded from every statistic.

use crate::error::Result;
use crate::types::FieldStats;
use crate::utils::{interpolated_quantile, is_numeric_dtype, sorted_non_null};
use polars::prelude::*;
use tracing::debug;

/// Summarizes the numeric data fields of an audited frame.
pub struct StatisticalSummarizer;

impl StatisticalSummarizer {
    /// Mean, median, min, and max per numeric field, in `data_fields` order.
    ///
    /// Non-numeric and all-null fields are skipped. Fields listed but absent
    /// from the frame are skipped as well, mirroring the detectors.
    pub fn summarize(df: &DataFrame, data_fields: &[String]) -> Result<Vec<FieldStats>> {
        let mut summaries = Vec::new();

        for field in data_fields {
            let Ok(column) = df.column(field) else {
                debug!("Summary field '{}' not in dataset, skipping", field);
                continue;
            };
            if !is_numeric_dtype(column.dtype()) {
                continue;
            }

            let values = sorted_non_null(column.as_materialized_series())?;
            if values.is_empty() {
                debug!("Summary field '{}' has no non-null values", field);
                continue;
            }

            let mean = values.iter().sum::<f64>() / values.len() as f64;
            summaries.push(FieldStats {
                field: field.clone(),
                mean,
                median: interpolated_quantile(&values, 0.5),
                min: values[0],
                max: values[values.len() - 1],
            });
        }

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_values() {
        let df = df![
            "Glucose" => [0.0, 100.0, 105.0, 600.0],
        ]
        .unwrap();

        let stats =
            StatisticalSummarizer::summarize(&df, &["Glucose".to_string()]).unwrap();

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].field, "Glucose");
        assert_eq!(stats[0].mean, 201.25);
        assert_eq!(stats[0].median, 102.5);
        assert_eq!(stats[0].min, 0.0);
        assert_eq!(stats[0].max, 600.0);
    }

    #[test]
    fn test_nulls_excluded() {
        let df = df![
            "BMI" => [Some(20.0), None, Some(40.0)],
        ]
        .unwrap();

        let stats = StatisticalSummarizer::summarize(&df, &["BMI".to_string()]).unwrap();

        assert_eq!(stats[0].mean, 30.0);
        assert_eq!(stats[0].median, 30.0);
    }

    #[test]
    fn test_non_numeric_and_absent_fields_skipped() {
        let df = df![
            "Name" => ["a", "b"],
            "Age" => [40.0, 50.0],
        ]
        .unwrap();
        let fields = vec![
            "Name".to_string(),
            "Age".to_string(),
            "Missing".to_string(),
        ];

        let stats = StatisticalSummarizer::summarize(&df, &fields).unwrap();

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].field, "Age");
    }

    #[test]
    fn test_all_null_field_skipped() {
        let df = df![
            "Insulin" => [None::<f64>, None],
        ]
        .unwrap();

        let stats =
            StatisticalSummarizer::summarize(&df, &["Insulin".to_string()]).unwrap();

        assert!(stats.is_empty());
    }

    #[test]
    fn test_field_order_follows_input() {
        let df = df![
            "BMI" => [25.0],
            "Age" => [40.0],
        ]
        .unwrap();
        let fields = vec!["Age".to_string(), "BMI".to_string()];

        let stats = StatisticalSummarizer::summarize(&df, &fields).unwrap();
        let names: Vec<&str> = stats.iter().map(|s| s.field.as_str()).collect();
        assert_eq!(names, vec!["Age", "BMI"]);
    }
}
