//! Report generation.
//!
//! Writes the three audit artifacts into an output directory: the detailed
//! per-record CSV, the compact error-log CSV, and a sectioned summary file
//! with missing counts, field statistics, and the overall quality metrics.

use crate::error::{AuditError, Result};
use crate::types::{
    AuditOutcome, COMPLETENESS_SCORE, ERROR_LOG, OverallMetrics, QUALITY_SCORE, ROW_INDEX,
    TOTAL_ERRORS, WEIGHTED_ERRORS,
};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the detailed per-record report.
pub const DETAILED_REPORT: &str = "data_quality_detailed_report.csv";
/// File name of the per-record error-log report.
pub const ERROR_LOG_REPORT: &str = "data_quality_error_log.csv";
/// File name of the sectioned summary report.
pub const SUMMARY_REPORT: &str = "data_quality_summary.csv";

/// Dataset-level metrics over an audited frame.
///
/// Averages are rounded to two decimals, matching the report format.
pub fn overall_metrics(df: &DataFrame) -> Result<OverallMetrics> {
    let quality = df.column(QUALITY_SCORE)?.as_materialized_series().clone();
    let completeness = df
        .column(COMPLETENESS_SCORE)?
        .as_materialized_series()
        .clone();

    let records_without_errors = df
        .column(TOTAL_ERRORS)?
        .as_materialized_series()
        .u32()?
        .into_iter()
        .filter(|v| *v == Some(0))
        .count();
    let records_below_half_quality = quality
        .f64()?
        .into_iter()
        .filter(|v| v.is_some_and(|q| q < 50.0))
        .count();

    Ok(OverallMetrics {
        total_records: df.height(),
        average_quality_score: round2(quality.mean().unwrap_or(0.0)),
        records_without_errors,
        records_below_half_quality,
        average_completeness_score: round2(completeness.mean().unwrap_or(0.0)),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Writes the audit reports into one output directory.
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write all three report files and return the overall metrics.
    pub fn generate(&self, outcome: &AuditOutcome) -> Result<OverallMetrics> {
        fs::create_dir_all(&self.output_dir)?;

        self.write_detailed_report(outcome)?;
        self.write_error_log_report(&outcome.data)?;
        let metrics = overall_metrics(&outcome.data)?;
        self.write_summary_report(outcome, &metrics)?;

        info!("Reports written to {}", self.output_dir.display());
        Ok(metrics)
    }

    /// `Row_Index`, the original fields, every flag column, then the scores.
    fn write_detailed_report(&self, outcome: &AuditOutcome) -> Result<()> {
        let mut columns: Vec<String> = vec![ROW_INDEX.to_string()];
        columns.extend(outcome.data_fields.iter().cloned());
        for name in outcome.registry.names() {
            if outcome.data.column(&name).is_ok() {
                columns.push(name);
            }
        }
        columns.extend(
            [
                TOTAL_ERRORS,
                WEIGHTED_ERRORS,
                QUALITY_SCORE,
                COMPLETENESS_SCORE,
                ERROR_LOG,
            ]
            .map(String::from),
        );

        let mut report = outcome.data.select(columns).map_err(|e| {
            AuditError::ReportGenerationFailed(format!("detailed report selection: {e}"))
        })?;
        self.write_csv(DETAILED_REPORT, &mut report)
    }

    fn write_error_log_report(&self, df: &DataFrame) -> Result<()> {
        let mut report = df.select([ROW_INDEX, ERROR_LOG]).map_err(|e| {
            AuditError::ReportGenerationFailed(format!("error-log selection: {e}"))
        })?;
        self.write_csv(ERROR_LOG_REPORT, &mut report)
    }

    fn write_csv(&self, name: &str, df: &mut DataFrame) -> Result<()> {
        let path = self.output_dir.join(name);
        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(df)?;
        info!("Report saved: {}", path.display());
        Ok(())
    }

    fn write_summary_report(
        &self,
        outcome: &AuditOutcome,
        metrics: &OverallMetrics,
    ) -> Result<()> {
        let path = self.output_dir.join(SUMMARY_REPORT);
        let mut file = File::create(&path)?;

        writeln!(file, "=== Missing Data Summary ===")?;
        writeln!(file, "Field,Missing_Count,Missing_Percent")?;
        for entry in &outcome.missing_summary {
            writeln!(
                file,
                "{},{},{:.2}",
                entry.field, entry.missing_count, entry.missing_percent
            )?;
        }

        writeln!(file, "\n=== Statistical Summary ===")?;
        writeln!(file, "Field,Mean,Median,Min,Max")?;
        for stats in &outcome.field_stats {
            writeln!(
                file,
                "{},{:.2},{:.2},{:.2},{:.2}",
                stats.field, stats.mean, stats.median, stats.min, stats.max
            )?;
        }

        writeln!(file, "\n=== Overall Quality Metrics ===")?;
        writeln!(file, "Total Records,{}", metrics.total_records)?;
        writeln!(
            file,
            "Average Quality Score (%),{}",
            metrics.average_quality_score
        )?;
        writeln!(
            file,
            "Records with 0 Errors,{}",
            metrics.records_without_errors
        )?;
        writeln!(
            file,
            "Records with >50% Errors,{}",
            metrics.records_below_half_quality
        )?;
        writeln!(
            file,
            "Average Completeness Score (%),{}",
            metrics.average_completeness_score
        )?;

        info!("Report saved: {}", path.display());
        Ok(())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;
    use crate::pipeline::AuditPipeline;
    use pretty_assertions::assert_eq;

    fn audited_outcome() -> AuditOutcome {
        let df = df![
            "Glucose" => [0.0, 100.0, 105.0, 600.0],
            "BMI" => [25.0, 80.0, 22.0, 30.0],
        ]
        .unwrap();
        let config = AuditConfig::builder()
            .zero_as_missing_cols(["Glucose"])
            .clinical_range("BMI", 10.0, 60.0)
            .outlier_columns(["Glucose"])
            .build()
            .unwrap();
        AuditPipeline::new(config).unwrap().run(df).unwrap()
    }

    #[test]
    fn test_generate_writes_all_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = audited_outcome();

        ReportGenerator::new(dir.path()).generate(&outcome).unwrap();

        for name in [DETAILED_REPORT, ERROR_LOG_REPORT, SUMMARY_REPORT] {
            assert!(dir.path().join(name).exists(), "missing {}", name);
        }
    }

    #[test]
    fn test_detailed_report_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = audited_outcome();

        ReportGenerator::new(dir.path()).generate(&outcome).unwrap();

        let content = std::fs::read_to_string(dir.path().join(DETAILED_REPORT)).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.starts_with("Row_Index,Glucose,BMI,Glucose_Missing"));
        assert!(header.ends_with(
            "Total_Errors,Weighted_Errors,Quality_Score,Completeness_Score,Error_Log"
        ));
    }

    #[test]
    fn test_error_log_report_is_two_columns() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = audited_outcome();

        ReportGenerator::new(dir.path()).generate(&outcome).unwrap();

        let content = std::fs::read_to_string(dir.path().join(ERROR_LOG_REPORT)).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "Row_Index,Error_Log");
        assert_eq!(content.lines().count(), 5);
    }

    #[test]
    fn test_summary_report_sections() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = audited_outcome();

        ReportGenerator::new(dir.path()).generate(&outcome).unwrap();

        let content = std::fs::read_to_string(dir.path().join(SUMMARY_REPORT)).unwrap();
        assert!(content.contains("=== Missing Data Summary ==="));
        assert!(content.contains("=== Statistical Summary ==="));
        assert!(content.contains("=== Overall Quality Metrics ==="));
        assert!(content.contains("Glucose_Zeros_as_Missing,1,25.00"));
        assert!(content.contains("Total Records,4"));
    }

    #[test]
    fn test_overall_metrics() {
        let outcome = audited_outcome();
        let metrics = overall_metrics(&outcome.data).unwrap();

        assert_eq!(metrics.total_records, 4);
        assert!(metrics.average_quality_score <= 100.0);
        assert!(metrics.records_without_errors <= 4);
        // Every record has both data fields present except the glucose zero
        assert_eq!(metrics.average_completeness_score, 87.5);
    }

    #[test]
    fn test_generate_creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports").join("run1");
        let outcome = audited_outcome();

        ReportGenerator::new(&nested).generate(&outcome).unwrap();

        assert!(nested.join(SUMMARY_REPORT).exists());
    }
}
