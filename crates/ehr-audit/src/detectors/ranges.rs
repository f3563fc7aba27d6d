//! Clinical range validation.
//!
//! Flags values outside externally supplied inclusive domain bounds. Fields
//! named in the config but absent from the dataset are skipped silently, a
//! deliberate tolerance for partially-matching configs. Missing values are
//! not comparable and flag false.

use crate::error::Result;
use crate::types::{FlagColumn, FlagKind};
use crate::utils::{is_numeric_dtype, numeric_values};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Flags values outside `[low, high]` per configured field.
pub struct ClinicalRangeValidator;

impl ClinicalRangeValidator {
    /// Append one range flag per configured field present in the frame.
    pub fn validate(
        df: &mut DataFrame,
        ranges: &HashMap<String, (f64, f64)>,
    ) -> Result<Vec<FlagColumn>> {
        let mut flags = Vec::new();

        // Stable flag order regardless of map iteration order
        let mut fields: Vec<&String> = ranges.keys().collect();
        fields.sort();

        for field in fields {
            let (low, high) = ranges[field];
            let Ok(column) = df.column(field) else {
                debug!("Range field '{}' not in dataset, skipping", field);
                continue;
            };
            if !is_numeric_dtype(column.dtype()) {
                debug!("Range field '{}' is not numeric, skipping", field);
                continue;
            }

            let mask: Vec<bool> = numeric_values(column.as_materialized_series())?
                .into_iter()
                .map(|v| match v {
                    Some(val) => val < low || val > high,
                    None => false,
                })
                .collect();

            let flag = FlagColumn::for_field(field, FlagKind::RangeError);
            df.with_column(
                BooleanChunked::from_slice(flag.name.as_str().into(), &mask).into_series(),
            )?;
            flags.push(flag);
        }

        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flag_values(df: &DataFrame, name: &str) -> Vec<bool> {
        df.column(name)
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn test_bmi_out_of_range_flagged() {
        let mut df = df![
            "BMI" => [25.0, 80.0, 10.0, 60.0],
        ]
        .unwrap();
        let ranges = HashMap::from([("BMI".to_string(), (10.0, 60.0))]);

        let flags = ClinicalRangeValidator::validate(&mut df, &ranges).unwrap();

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].name, "BMI_RangeError");
        // Bounds are inclusive: 10 and 60 pass, 80 fails
        assert_eq!(
            flag_values(&df, "BMI_RangeError"),
            vec![false, true, false, false]
        );
    }

    #[test]
    fn test_missing_values_flag_false() {
        let mut df = df![
            "Glucose" => [Some(100.0), None, Some(700.0)],
        ]
        .unwrap();
        let ranges = HashMap::from([("Glucose".to_string(), (40.0, 400.0))]);

        ClinicalRangeValidator::validate(&mut df, &ranges).unwrap();

        assert_eq!(
            flag_values(&df, "Glucose_RangeError"),
            vec![false, false, true]
        );
    }

    #[test]
    fn test_field_absent_from_dataset_skipped_silently() {
        let mut df = df![
            "BMI" => [25.0],
        ]
        .unwrap();
        let ranges = HashMap::from([
            ("BMI".to_string(), (10.0, 60.0)),
            ("Cholesterol".to_string(), (100.0, 300.0)),
        ]);

        let flags = ClinicalRangeValidator::validate(&mut df, &ranges).unwrap();

        assert_eq!(flags.len(), 1);
        assert!(df.column("Cholesterol_RangeError").is_err());
    }

    #[test]
    fn test_flag_order_is_deterministic() {
        let mut df = df![
            "BMI" => [25.0],
            "Age" => [40.0],
        ]
        .unwrap();
        let ranges = HashMap::from([
            ("BMI".to_string(), (10.0, 60.0)),
            ("Age".to_string(), (0.0, 120.0)),
        ]);

        let flags = ClinicalRangeValidator::validate(&mut df, &ranges).unwrap();
        let names: Vec<&str> = flags.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Age_RangeError", "BMI_RangeError"]);
    }
}
