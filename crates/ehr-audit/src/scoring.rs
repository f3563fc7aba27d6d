//! The Scoring Engine.
//!
//! Aggregates every registered flag into weighted and unweighted error
//! counts, the per-record quality score, and the human-readable error log.
//! Flags are enumerated from the registry the detectors built, so a skipped
//! detector simply contributes nothing; a registered flag whose column is
//! absent is likewise dropped from the enumeration.

use crate::error::{AuditError, Result};
use crate::types::{
    ERROR_LOG, FlagColumn, FlagRegistry, NO_ERRORS, QUALITY_SCORE, ROW_INDEX, TOTAL_ERRORS,
    WEIGHTED_ERRORS,
};
use crate::utils::render_cell;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// One enumerated flag, materialized for scoring.
struct ScoredFlag {
    flag: FlagColumn,
    mask: Vec<bool>,
    base: Option<Series>,
    weight: f64,
}

/// Turns per-field flags into one consistent, explainable per-record score.
pub struct ScoringEngine;

impl ScoringEngine {
    /// Append `Weighted_Errors`, `Total_Errors`, `Quality_Score`,
    /// `Row_Index`, and `Error_Log` to the frame.
    ///
    /// Weights default to 1 for registered flags without an explicit entry;
    /// entries for flags no detector produced are ignored. Fails with
    /// [`AuditError::ZeroTotalWeight`] when the effective weight sum is zero,
    /// since the quality score would be undefined.
    pub fn score(
        df: &mut DataFrame,
        registry: &FlagRegistry,
        weights: &HashMap<String, f64>,
    ) -> Result<()> {
        let flags = Self::materialize_flags(df, registry, weights)?;
        let total_weight: f64 = flags.iter().map(|f| f.weight).sum();
        if total_weight == 0.0 {
            return Err(AuditError::ZeroTotalWeight);
        }
        debug!(
            "Scoring {} flags with total weight {}",
            flags.len(),
            total_weight
        );

        let height = df.height();
        let mut weighted = vec![0.0f64; height];
        let mut totals = vec![0u32; height];
        for flag in &flags {
            for (row, &triggered) in flag.mask.iter().enumerate() {
                if triggered {
                    weighted[row] += flag.weight;
                    totals[row] += 1;
                }
            }
        }

        let quality: Vec<f64> = weighted
            .iter()
            .map(|w| 100.0 - w / total_weight * 100.0)
            .collect();
        let logs = Self::build_error_logs(&flags, height)?;
        let row_index: Vec<u32> = (0..height as u32).collect();

        df.with_column(Series::new(WEIGHTED_ERRORS.into(), weighted))?;
        df.with_column(Series::new(TOTAL_ERRORS.into(), totals))?;
        df.with_column(Series::new(QUALITY_SCORE.into(), quality))?;
        df.with_column(Series::new(ROW_INDEX.into(), row_index))?;
        df.with_column(Series::new(ERROR_LOG.into(), logs))?;
        Ok(())
    }

    /// Pull the registered flag columns out of the frame, with weights.
    fn materialize_flags(
        df: &DataFrame,
        registry: &FlagRegistry,
        weights: &HashMap<String, f64>,
    ) -> Result<Vec<ScoredFlag>> {
        let mut flags = Vec::new();
        for flag in registry.iter() {
            let Ok(column) = df.column(&flag.name) else {
                debug!("Registered flag '{}' has no column, skipping", flag.name);
                continue;
            };
            let mask: Vec<bool> = column
                .as_materialized_series()
                .bool()?
                .into_iter()
                .map(|v| v.unwrap_or(false))
                .collect();
            let base = flag
                .base_field
                .as_ref()
                .and_then(|f| df.column(f).ok())
                .map(|c| c.as_materialized_series().clone());
            flags.push(ScoredFlag {
                flag: flag.clone(),
                mask,
                base,
                weight: weights.get(&flag.name).copied().unwrap_or(1.0),
            });
        }
        Ok(flags)
    }

    /// `"<flag> (<base value or N/A>)"` per triggered flag, in registry
    /// order, joined by `"; "`.
    fn build_error_logs(flags: &[ScoredFlag], height: usize) -> Result<Vec<String>> {
        let mut logs = Vec::with_capacity(height);
        for row in 0..height {
            let mut parts = Vec::new();
            for scored in flags {
                if !scored.mask[row] {
                    continue;
                }
                let rendered = match &scored.base {
                    Some(series) => render_cell(&series.get(row)?),
                    None => "N/A".to_string(),
                };
                parts.push(format!("{} ({})", scored.flag.name, rendered));
            }
            logs.push(if parts.is_empty() {
                NO_ERRORS.to_string()
            } else {
                parts.join("; ")
            });
        }
        Ok(logs)
    }
}
