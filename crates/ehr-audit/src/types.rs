use serde::{Deserialize, Serialize};

/// Name of the per-record completeness column.
pub const COMPLETENESS_SCORE: &str = "Completeness_Score";
/// Name of the per-record weighted error sum column.
pub const WEIGHTED_ERRORS: &str = "Weighted_Errors";
/// Name of the per-record unweighted error count column.
pub const TOTAL_ERRORS: &str = "Total_Errors";
/// Name of the per-record quality score column.
pub const QUALITY_SCORE: &str = "Quality_Score";
/// Name of the original-position index column.
pub const ROW_INDEX: &str = "Row_Index";
/// Name of the per-record error log column.
pub const ERROR_LOG: &str = "Error_Log";
/// Name of the record-level multivariate anomaly flag.
pub const ROW_ANOMALY_IF: &str = "Row_AnomalyIF";
/// Sentinel written to the error log when no flag triggered.
pub const NO_ERRORS: &str = "No Errors";

/// Kind of data-quality condition a flag column reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Value is a zero that stands for a missing measurement.
    Missing,
    /// Value lies outside the field's Tukey fence.
    Outlier,
    /// Value lies outside the configured clinical range.
    RangeError,
    /// Value has the wrong representation for the field.
    FormatError,
    /// Record is jointly anomalous across the configured field set.
    AnomalyIf,
}

impl FlagKind {
    /// Column-name suffix for this kind of flag.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Missing => "_Missing",
            Self::Outlier => "_Outlier",
            Self::RangeError => "_RangeError",
            Self::FormatError => "_FormatError",
            Self::AnomalyIf => "_AnomalyIF",
        }
    }
}

/// A boolean flag column produced by a detector.
///
/// Flags are registered explicitly by their producing detector rather than
/// rediscovered by name suffix at scoring time, so the Scoring Engine always
/// knows which base field a flag derives from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagColumn {
    /// Full column name, e.g. `Glucose_Outlier`.
    pub name: String,
    /// What condition the flag reports.
    pub kind: FlagKind,
    /// The data field the flag derives from; `None` for record-level flags.
    pub base_field: Option<String>,
}

impl FlagColumn {
    /// Build a field-level flag, deriving the column name from the field.
    pub fn for_field(field: &str, kind: FlagKind) -> Self {
        Self {
            name: format!("{}{}", field, kind.suffix()),
            kind,
            base_field: Some(field.to_string()),
        }
    }

    /// Build the record-level anomaly flag.
    pub fn row_anomaly() -> Self {
        Self {
            name: ROW_ANOMALY_IF.to_string(),
            kind: FlagKind::AnomalyIf,
            base_field: None,
        }
    }
}

/// Ordered registry of every flag column the detectors produced.
///
/// Registration order is pipeline order, which fixes the error-log ordering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlagRegistry {
    flags: Vec<FlagColumn>,
}

impl FlagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flag column. Re-registering the same name is ignored so a
    /// rerun over an already-annotated frame stays idempotent.
    pub fn register(&mut self, flag: FlagColumn) {
        if !self.contains(&flag.name) {
            self.flags.push(flag);
        }
    }

    pub fn register_all(&mut self, flags: impl IntoIterator<Item = FlagColumn>) {
        for flag in flags {
            self.register(flag);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlagColumn> {
        self.flags.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.flags.iter().map(|f| f.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Per-field missing-value counts for the summary report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingCounts {
    /// Field name, or `<Field>_Zeros_as_Missing` for zero-based counts.
    pub field: String,
    /// Number of records missing this field.
    pub missing_count: usize,
    /// Percentage of records missing this field.
    pub missing_percent: f64,
}

/// Descriptive statistics for one numeric field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldStats {
    pub field: String,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Dataset-level metrics for the summary report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub total_records: usize,
    pub average_quality_score: f64,
    pub records_without_errors: usize,
    pub records_below_half_quality: usize,
    pub average_completeness_score: f64,
}

/// Everything one audit run produces.
///
/// The pipeline takes ownership of the input frame and hands it back fully
/// annotated here; nothing mutates it afterwards.
#[derive(Debug)]
pub struct AuditOutcome {
    /// The annotated dataset: original fields plus flags and scores.
    pub data: polars::prelude::DataFrame,
    /// Every flag column the detectors produced, in pipeline order.
    pub registry: FlagRegistry,
    /// Per-field missing-value counts.
    pub missing_summary: Vec<MissingCounts>,
    /// Descriptive statistics per original numeric field.
    pub field_stats: Vec<FieldStats>,
    /// The original (non-derived) data fields, in dataset order.
    pub data_fields: Vec<String>,
}
