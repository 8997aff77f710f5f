//! Baseline model training
//!
//! Fits a fixed-configuration random forest on an uploaded dataset as a
//! quick reference benchmark: 80/20 split, 100 trees, fixed seeds.

mod forest;
mod tree;

pub use forest::RandomForest;
pub use tree::DecisionTree;

use crate::dataset::design_matrix;
use crate::error::{BenchError, Result};
use ndarray::{Array1, Axis};
use polars::prelude::DataFrame;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

/// Shuffled train/test index split with a fixed seed.
///
/// Test size is `ceil(test_fraction * n)`; the remainder trains.
pub fn train_test_split(
    n_samples: usize,
    test_fraction: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n_samples as f64) * test_fraction).ceil() as usize;
    let n_test = n_test.min(n_samples);
    let test = indices[..n_test].to_vec();
    let train = indices[n_test..].to_vec();
    (train, test)
}

/// Metrics of the baseline run, as percentages rounded to 2 decimals.
#[derive(Debug, Clone, Serialize)]
pub struct BaselineReport {
    pub accuracy: f64,
    pub precision: f64,
    pub f1_score: f64,
}

/// Trains the reference random-forest classifier.
#[derive(Debug, Clone)]
pub struct BaselineTrainer {
    pub n_estimators: usize,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for BaselineTrainer {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl BaselineTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the baseline on `df` and report test-split metrics.
    pub fn train(&self, df: &DataFrame, target_column: &str) -> Result<BaselineReport> {
        let has_target = df
            .get_column_names()
            .iter()
            .any(|c| c.as_str() == target_column);
        if !has_target {
            return Err(BenchError::InvalidTargetColumn);
        }

        let design = design_matrix(df, Some(target_column))?;
        let n_samples = design.features.nrows();
        let (train_idx, test_idx) = train_test_split(n_samples, self.test_fraction, self.seed);

        if train_idx.is_empty() || test_idx.is_empty() {
            return Err(BenchError::Data(format!(
                "Dataset with {n_samples} rows is too small to split for training"
            )));
        }

        let x_train = design.features.select(Axis(0), &train_idx);
        let y_train = Array1::from_vec(train_idx.iter().map(|&i| design.labels[i]).collect());
        let x_test = design.features.select(Axis(0), &test_idx);
        let y_test = Array1::from_vec(test_idx.iter().map(|&i| design.labels[i]).collect());

        let mut forest = RandomForest::new(self.n_estimators).with_seed(self.seed);
        forest.fit(&x_train, &y_train)?;
        let predictions = forest.predict(&x_test)?;

        let report = crate::evaluation::classification_report(&y_test, &predictions);
        info!(
            target = target_column,
            train_rows = train_idx.len(),
            test_rows = test_idx.len(),
            accuracy = report.accuracy,
            "Baseline training completed"
        );

        Ok(BaselineReport {
            accuracy: as_rounded_percent(report.accuracy),
            precision: as_rounded_percent(report.precision),
            f1_score: as_rounded_percent(report.f1_score),
        })
    }
}

fn as_rounded_percent(value: f64) -> f64 {
    (value * 100.0 * 100.0).round() / 100.0
}
