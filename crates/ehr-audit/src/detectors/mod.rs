//! The four flag-producing detectors.
//!
//! Each detector appends boolean flag columns to the frame and returns the
//! [`crate::types::FlagColumn`] descriptors it produced, which the pipeline
//! collects into the registry handed to the Scoring Engine.

pub mod format;
pub mod isolation;
pub mod missing;
pub mod outliers;
pub mod ranges;

pub use format::{FormatRule, FormatValidator};
pub use isolation::IsolationForestDetector;
pub use missing::MissingValueAnalyzer;
pub use outliers::IqrOutlierDetector;
pub use ranges::ClinicalRangeValidator;
