//! Multivariate anomaly detection with a seeded isolation forest.
//!
//! Records that sit in sparse regions of the configured field space isolate
//! in fewer random splits than normal records, so their average path length
//! across the ensemble is shorter and their anomaly score higher. The top
//! `contamination` fraction of records by score gets `Row_AnomalyIF = true`.
//!
//! Missing values are median-imputed into a local matrix for scoring only;
//! the stored dataset values are never altered. Scoring is deterministic
//! under a fixed seed: a single seeded generator drives subsampling and
//! split selection, and trees are built sequentially.

use crate::config::AuditConfig;
use crate::error::Result;
use crate::types::FlagColumn;
use crate::utils::{column_median, is_numeric_dtype, numeric_values};
use polars::prelude::*;
use rand::prelude::*;
use tracing::debug;

const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

/// Seeded isolation forest over a configured field set.
pub struct IsolationForestDetector;

impl IsolationForestDetector {
    /// Score every record and append the `Row_AnomalyIF` flag.
    ///
    /// Returns `None` without touching the frame when no configured field is
    /// usable, mirroring the silent tolerance for partially-matching configs.
    pub fn detect(df: &mut DataFrame, config: &AuditConfig) -> Result<Option<FlagColumn>> {
        let matrix = Self::build_matrix(df, &config.outlier_columns)?;
        let Some(matrix) = matrix else {
            debug!("No usable fields for anomaly detection, skipping");
            return Ok(None);
        };

        let forest = IsolationForest::fit(&matrix, config.tree_count, config.seed);
        let scores: Vec<f64> = matrix.rows().map(|row| forest.score(row)).collect();
        let mask = threshold_scores(&scores, config.contamination);

        let flag = FlagColumn::row_anomaly();
        df.with_column(
            BooleanChunked::from_slice(flag.name.as_str().into(), &mask).into_series(),
        )?;
        debug!(
            "Isolation forest flagged {} of {} records",
            mask.iter().filter(|&&v| v).count(),
            mask.len()
        );
        Ok(Some(flag))
    }

    /// Materialize the configured fields as a row-major f64 matrix with
    /// per-field median imputation, local to this detector.
    fn build_matrix(df: &DataFrame, fields: &[String]) -> Result<Option<Matrix>> {
        let mut columns = Vec::new();
        for field in fields {
            let Ok(column) = df.column(field) else {
                debug!("Anomaly field '{}' not in dataset, skipping", field);
                continue;
            };
            if !is_numeric_dtype(column.dtype()) {
                continue;
            }
            let series = column.as_materialized_series();
            let median = column_median(series).unwrap_or(0.0);
            let values: Vec<f64> = numeric_values(series)?
                .into_iter()
                .map(|v| v.unwrap_or(median))
                .collect();
            columns.push(values);
        }

        if columns.is_empty() || columns[0].is_empty() {
            return Ok(None);
        }

        let n_rows = columns[0].len();
        let n_cols = columns.len();
        let mut data = vec![0.0; n_rows * n_cols];
        for (c, col) in columns.iter().enumerate() {
            for (r, &v) in col.iter().enumerate() {
                data[r * n_cols + c] = v;
            }
        }
        Ok(Some(Matrix {
            data,
            n_rows,
            n_cols,
        }))
    }
}

/// Row-major numeric matrix.
struct Matrix {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl Matrix {
    fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.n_cols..(r + 1) * self.n_cols]
    }

    fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.n_rows).map(|r| self.row(r))
    }
}

enum Node {
    Internal {
        feature: usize,
        split: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

struct IsolationForest {
    trees: Vec<Node>,
    subsample: usize,
}

impl IsolationForest {
    fn fit(matrix: &Matrix, tree_count: usize, seed: u64) -> Self {
        let subsample = matrix.n_rows.min(256);
        let height_limit = (subsample as f64).log2().ceil().max(0.0) as usize;
        let mut rng = StdRng::seed_from_u64(seed);
        let indices: Vec<usize> = (0..matrix.n_rows).collect();

        let trees = (0..tree_count)
            .map(|_| {
                let sample: Vec<usize> = indices
                    .choose_multiple(&mut rng, subsample)
                    .copied()
                    .collect();
                Self::build_node(matrix, &sample, 0, height_limit, &mut rng)
            })
            .collect();

        Self { trees, subsample }
    }

    fn build_node(
        matrix: &Matrix,
        sample: &[usize],
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> Node {
        if sample.len() <= 1 || depth >= height_limit {
            return Node::Leaf { size: sample.len() };
        }

        // Only features with spread in this node can split it
        let splittable: Vec<(usize, f64, f64)> = (0..matrix.n_cols)
            .filter_map(|feature| {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for &row in sample {
                    let v = matrix.row(row)[feature];
                    min = min.min(v);
                    max = max.max(v);
                }
                (min < max).then_some((feature, min, max))
            })
            .collect();

        if splittable.is_empty() {
            return Node::Leaf { size: sample.len() };
        }

        let &(feature, min, max) = splittable.choose(rng).unwrap_or(&splittable[0]);
        let split = rng.gen_range(min..max);

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .iter()
            .copied()
            .partition(|&row| matrix.row(row)[feature] < split);

        Node::Internal {
            feature,
            split,
            left: Box::new(Self::build_node(matrix, &left, depth + 1, height_limit, rng)),
            right: Box::new(Self::build_node(matrix, &right, depth + 1, height_limit, rng)),
        }
    }

    /// Anomaly score in (0, 1); higher isolates faster.
    fn score(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|tree| Self::path_length(tree, row)).sum();
        let mean_path = total / self.trees.len() as f64;
        let norm = average_path_length(self.subsample);
        if norm == 0.0 {
            return 0.0;
        }
        2f64.powf(-mean_path / norm)
    }

    fn path_length(node: &Node, row: &[f64]) -> f64 {
        let mut node = node;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Internal {
                    feature,
                    split,
                    left,
                    right,
                } => {
                    node = if row[*feature] < *split { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search over `n` points,
/// the normalization constant from the isolation forest formulation.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        n => {
            let n = n as f64;
            let harmonic = (n - 1.0).ln() + EULER_MASCHERONI;
            2.0 * harmonic - 2.0 * (n - 1.0) / n
        }
    }
}

/// Flag exactly `round(contamination * n)` records with the highest scores.
/// Ties are broken by row index, keeping the assignment deterministic.
fn threshold_scores(scores: &[f64], contamination: f64) -> Vec<bool> {
    let n = scores.len();
    let k = (contamination * n as f64).round() as usize;
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut mask = vec![false; n];
    for &idx in order.iter().take(k) {
        mask[idx] = true;
    }
    mask
}
