//! Format validation.
//!
//! Structural checks per field: a value of the wrong representational kind
//! (a cell that does not parse as a number, a non-finite float, or a number
//! outside the field's plausible bounds) is flagged, never raised as an
//! error. Nulls are not representable values and flag false.

use crate::error::Result;
use crate::types::{FlagColumn, FlagKind};
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use tracing::debug;

/// A bounded-numeric format rule for one field.
#[derive(Debug, Clone)]
pub struct FormatRule {
    pub field: String,
    pub min: f64,
    pub max: f64,
}

impl FormatRule {
    pub fn bounded_numeric(field: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            field: field.into(),
            min,
            max,
        }
    }

    fn accepts(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Applies field-specific format predicates.
#[derive(Debug)]
pub struct FormatValidator {
    rules: Vec<FormatRule>,
}

impl Default for FormatValidator {
    /// The built-in rule set: an age must be a number within `[0, 120]`.
    fn default() -> Self {
        Self::with_rules(vec![FormatRule::bounded_numeric("Age", 0.0, 120.0)])
    }
}

impl FormatValidator {
    pub fn with_rules(rules: Vec<FormatRule>) -> Self {
        Self { rules }
    }

    /// Append one format flag per rule whose field is present in the frame.
    pub fn validate(&self, df: &mut DataFrame) -> Result<Vec<FlagColumn>> {
        let mut flags = Vec::new();

        for rule in &self.rules {
            let Ok(column) = df.column(&rule.field) else {
                debug!("Format field '{}' not in dataset, skipping", rule.field);
                continue;
            };

            let series = column.as_materialized_series().clone();
            let mask = if is_numeric_dtype(series.dtype()) {
                Self::check_numeric(&series, rule)?
            } else if series.dtype() == &DataType::String {
                Self::check_string(&series, rule)?
            } else {
                // Boolean/date cells cannot satisfy a numeric format
                vec![true; series.len()]
            };

            let flag = FlagColumn::for_field(&rule.field, FlagKind::FormatError);
            df.with_column(
                BooleanChunked::from_slice(flag.name.as_str().into(), &mask).into_series(),
            )?;
            flags.push(flag);
        }

        Ok(flags)
    }

    fn check_numeric(series: &Series, rule: &FormatRule) -> Result<Vec<bool>> {
        let float_series = series.cast(&DataType::Float64)?;
        Ok(float_series
            .f64()?
            .into_iter()
            .map(|v| match v {
                Some(val) => !rule.accepts(val),
                None => false,
            })
            .collect())
    }

    /// A nominally numeric field stored as text: each cell must parse.
    fn check_string(series: &Series, rule: &FormatRule) -> Result<Vec<bool>> {
        Ok(series
            .str()?
            .into_iter()
            .map(|v| match v {
                Some(raw) => match raw.trim().parse::<f64>() {
                    Ok(val) => !rule.accepts(val),
                    Err(_) => true,
                },
                None => false,
            })
            .collect())
    }
}
