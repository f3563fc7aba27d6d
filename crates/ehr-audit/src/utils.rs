//! Shared utilities for the audit pipeline.
//!
//! Common helpers used across detectors and scoring to reduce duplication
//! and keep numeric conventions in one place.

use crate::error::Result;
use polars::prelude::*;

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Extract a column as per-record optional floats, nulls preserved.
///
/// Works for every numeric dtype by casting through Float64.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series.f64()?.into_iter().collect())
}

/// Quantile with linear interpolation over an ascending-sorted slice.
///
/// Matches the convention the audited datasets were scored under; callers
/// must pass non-empty, sorted, non-null data.
pub fn interpolated_quantile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = pos - lower as f64;
        sorted[lower] + frac * (sorted[upper] - sorted[lower])
    }
}

/// Collect the non-null values of a numeric column, sorted ascending.
pub fn sorted_non_null(series: &Series) -> Result<Vec<f64>> {
    let mut values: Vec<f64> = numeric_values(series)?.into_iter().flatten().collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Ok(values)
}

/// Median of the non-null values of a numeric column.
pub fn column_median(series: &Series) -> Option<f64> {
    series.cast(&DataType::Float64).ok()?.median()
}

/// Render one cell for the error log: the raw value, or `N/A` when null.
pub fn render_cell(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => "N/A".to_string(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => format!("{}", other),
    }
}
