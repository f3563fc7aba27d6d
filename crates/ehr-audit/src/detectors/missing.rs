//! Missing-value analysis.
//!
//! Normalizes placeholder tokens to null, flags zero-as-missing fields, and
//! computes the per-record completeness score.

use crate::config::AuditConfig;
use crate::error::Result;
use crate::types::{COMPLETENESS_SCORE, FlagColumn, FlagKind, MissingCounts};
use crate::utils::numeric_values;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Detects explicit and zero-as-missing values and scores completeness.
pub struct MissingValueAnalyzer;

impl MissingValueAnalyzer {
    /// Run the full missing-value analysis in place.
    ///
    /// Returns the per-field missing counts for reporting and the flag
    /// columns appended to the frame.
    pub fn analyze(
        df: &mut DataFrame,
        config: &AuditConfig,
    ) -> Result<(Vec<MissingCounts>, Vec<FlagColumn>)> {
        let data_fields: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let height = df.height();

        Self::normalize_placeholders(df, &data_fields, &config.placeholder_values)?;

        let mut summary = Vec::new();
        for field in &data_fields {
            let missing_count = df.column(field)?.null_count();
            summary.push(MissingCounts {
                field: field.clone(),
                missing_count,
                missing_percent: percent(missing_count, height),
            });
        }

        // Zero-as-missing flags, counted separately from marker missingness
        let mut flags = Vec::new();
        let mut zero_masks: HashMap<String, Vec<bool>> = HashMap::new();
        for field in &config.zero_as_missing_cols {
            let Ok(column) = df.column(field) else {
                debug!("Zero-as-missing field '{}' not in dataset, skipping", field);
                continue;
            };
            let mask: Vec<bool> = numeric_values(column.as_materialized_series())?
                .into_iter()
                .map(|v| v == Some(0.0))
                .collect();
            let zero_count = mask.iter().filter(|&&z| z).count();

            summary.push(MissingCounts {
                field: format!("{}_Zeros_as_Missing", field),
                missing_count: zero_count,
                missing_percent: percent(zero_count, height),
            });

            let flag = FlagColumn::for_field(field, FlagKind::Missing);
            let series =
                BooleanChunked::from_slice(flag.name.as_str().into(), &mask).into_series();
            df.with_column(series)?;
            zero_masks.insert(field.clone(), mask);
            flags.push(flag);
        }

        Self::append_completeness(df, &data_fields, &zero_masks, config.dedup_missing)?;

        debug!(
            "Missing-value analysis finished: {} fields, {} zero-as-missing flags",
            data_fields.len(),
            flags.len()
        );
        Ok((summary, flags))
    }

    /// Replace placeholder tokens with null across all string columns.
    fn normalize_placeholders(
        df: &mut DataFrame,
        fields: &[String],
        placeholders: &[String],
    ) -> Result<()> {
        for field in fields {
            if df.column(field)?.dtype() != &DataType::String {
                continue;
            }
            let mut replaced = 0usize;
            let cleaned: Vec<Option<String>> = df
                .column(field)?
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|opt| match opt {
                    Some(v) if placeholders.iter().any(|p| p == v) => {
                        replaced += 1;
                        None
                    }
                    other => other.map(|s| s.to_string()),
                })
                .collect();
            if replaced > 0 {
                df.replace(field, Series::new(field.as_str().into(), cleaned))?;
                debug!("Normalized {} placeholder values in '{}'", replaced, field);
            }
        }
        Ok(())
    }

    /// Append the per-record completeness score.
    ///
    /// Numerator: explicit nulls across the original data fields plus the
    /// zero-as-missing flags. Without `dedup`, a field contributes through
    /// both signals independently, matching the audited behavior.
    fn append_completeness(
        df: &mut DataFrame,
        data_fields: &[String],
        zero_masks: &HashMap<String, Vec<bool>>,
        dedup: bool,
    ) -> Result<()> {
        let height = df.height();
        let mut missing_per_row = vec![0usize; height];

        for field in data_fields {
            let null_mask = df.column(field)?.as_materialized_series().is_null();
            let zero_mask = zero_masks.get(field);
            for (row, is_null) in null_mask.into_iter().enumerate() {
                let is_null = is_null.unwrap_or(false);
                let is_zero = zero_mask.map(|m| m[row]).unwrap_or(false);
                missing_per_row[row] += if dedup {
                    usize::from(is_null || is_zero)
                } else {
                    usize::from(is_null) + usize::from(is_zero)
                };
            }
        }

        let denominator = data_fields.len() as f64;
        let scores: Vec<f64> = missing_per_row
            .iter()
            .map(|&missing| 100.0 * (1.0 - missing as f64 / denominator))
            .collect();
        df.with_column(Series::new(COMPLETENESS_SCORE.into(), scores))?;
        Ok(())
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}
