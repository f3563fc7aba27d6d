//! Univariate outlier detection using the Tukey fence.
//!
//! Each configured field is handled independently: quartiles are computed
//! over that field's non-null values and every record gets an
//! `<Field>_Outlier` flag. Missing values are excluded from the quartile
//! computation and flag false, since they are not comparable.

use crate::error::Result;
use crate::types::{FlagColumn, FlagKind};
use crate::utils::{interpolated_quantile, is_numeric_dtype, numeric_values, sorted_non_null};
use polars::prelude::*;
use tracing::debug;

/// Flags values outside `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]` per field.
pub struct IqrOutlierDetector;

impl IqrOutlierDetector {
    /// Append one outlier flag per configured field present in the frame.
    pub fn detect(df: &mut DataFrame, fields: &[String]) -> Result<Vec<FlagColumn>> {
        let mut flags = Vec::new();

        for field in fields {
            let Ok(column) = df.column(field) else {
                debug!("Outlier field '{}' not in dataset, skipping", field);
                continue;
            };
            if !is_numeric_dtype(column.dtype()) {
                debug!("Outlier field '{}' is not numeric, skipping", field);
                continue;
            }

            let series = column.as_materialized_series().clone();
            let mask = Self::fence_mask(&series)?;
            let flag = FlagColumn::for_field(field, FlagKind::Outlier);
            df.with_column(
                BooleanChunked::from_slice(flag.name.as_str().into(), &mask).into_series(),
            )?;
            flags.push(flag);
        }

        Ok(flags)
    }

    /// Per-record outlier mask for one field.
    fn fence_mask(series: &Series) -> Result<Vec<bool>> {
        let sorted = sorted_non_null(series)?;
        if sorted.is_empty() {
            return Ok(vec![false; series.len()]);
        }

        let q1 = interpolated_quantile(&sorted, 0.25);
        let q3 = interpolated_quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let lower = q1 - 1.5 * iqr;
        let upper = q3 + 1.5 * iqr;
        debug!(
            "Tukey fence for '{}': [{:.3}, {:.3}]",
            series.name(),
            lower,
            upper
        );

        Ok(numeric_values(series)?
            .into_iter()
            .map(|v| match v {
                Some(val) => val < lower || val > upper,
                None => false,
            })
            .collect())
    }
}
