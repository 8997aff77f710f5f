//! Pickled estimator parameter bundles
//!
//! A `.pkl` artifact carries the parameters of a fitted estimator as a
//! tagged map. Some kinds expose class probabilities, others only direct
//! label prediction; the caller probes `predict_proba` first and falls
//! back to `predict`.

use crate::error::{BenchError, Result};
use crate::model::network::argmax;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Parameters of a deserialized estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PickledEstimator {
    /// Logistic regression; probability-capable.
    Logistic {
        /// Per-class coefficient rows `[n_classes][n_features]`
        /// (a single row for the binary case)
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
        classes: Vec<f64>,
    },
    /// Linear SVC; decision function only, no probabilities.
    LinearSvc {
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
        classes: Vec<f64>,
    },
    /// Nearest-centroid classifier; direct prediction only.
    NearestCentroid {
        centroids: Vec<Vec<f64>>,
        classes: Vec<f64>,
    },
}

impl PickledEstimator {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_pickle::from_slice(bytes, serde_pickle::DeOptions::new()).map_err(|e| {
            BenchError::Serialization(format!("Failed to deserialize estimator: {e}"))
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_pickle::to_vec(self, serde_pickle::SerOptions::new())
            .map_err(|e| BenchError::Serialization(format!("Failed to serialize estimator: {e}")))
    }

    pub fn classes(&self) -> &[f64] {
        match self {
            PickledEstimator::Logistic { classes, .. }
            | PickledEstimator::LinearSvc { classes, .. }
            | PickledEstimator::NearestCentroid { classes, .. } => classes,
        }
    }

    /// Class probabilities per row, or `None` when this estimator kind has
    /// no probability capability.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array2<f64>>> {
        match self {
            PickledEstimator::Logistic {
                coef,
                intercept,
                classes,
            } => {
                let scores = decision_function(x, coef, intercept)?;
                let proba = if classes.len() == 2 && scores.ncols() == 1 {
                    // binary: sigmoid of the single decision value
                    let mut proba = Array2::<f64>::zeros((x.nrows(), 2));
                    for (i, row) in scores.rows().into_iter().enumerate() {
                        let p1 = 1.0 / (1.0 + (-row[0]).exp());
                        proba[[i, 0]] = 1.0 - p1;
                        proba[[i, 1]] = p1;
                    }
                    proba
                } else {
                    softmax_rows(&scores)
                };
                Ok(Some(proba))
            }
            PickledEstimator::LinearSvc { .. } | PickledEstimator::NearestCentroid { .. } => {
                Ok(None)
            }
        }
    }

    /// Direct label prediction.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            PickledEstimator::Logistic {
                coef,
                intercept,
                classes,
            }
            | PickledEstimator::LinearSvc {
                coef,
                intercept,
                classes,
            } => {
                let scores = decision_function(x, coef, intercept)?;
                let labels: Vec<f64> = scores
                    .rows()
                    .into_iter()
                    .map(|row| {
                        if classes.len() == 2 && row.len() == 1 {
                            let idx = usize::from(row[0] > 0.0);
                            classes[idx]
                        } else {
                            classes[argmax(row.iter().copied())]
                        }
                    })
                    .collect();
                Ok(Array1::from_vec(labels))
            }
            PickledEstimator::NearestCentroid { centroids, classes } => {
                let labels: Vec<f64> = x
                    .rows()
                    .into_iter()
                    .map(|row| {
                        let mut best = 0;
                        let mut best_dist = f64::INFINITY;
                        for (c, centroid) in centroids.iter().enumerate() {
                            let dist: f64 = row
                                .iter()
                                .zip(centroid.iter())
                                .map(|(a, b)| (a - b).powi(2))
                                .sum();
                            if dist < best_dist {
                                best_dist = dist;
                                best = c;
                            }
                        }
                        classes[best]
                    })
                    .collect();
                Ok(Array1::from_vec(labels))
            }
        }
    }
}

/// Per-class linear scores: `x . coef^T + intercept`.
fn decision_function(
    x: &Array2<f64>,
    coef: &[Vec<f64>],
    intercept: &[f64],
) -> Result<Array2<f64>> {
    let n_rows = x.nrows();
    let n_scores = coef.len();
    let mut scores = Array2::<f64>::zeros((n_rows, n_scores));

    for (c, row_coef) in coef.iter().enumerate() {
        if row_coef.len() != x.ncols() {
            return Err(BenchError::Shape {
                expected: format!("{} coefficients", x.ncols()),
                actual: format!("{}", row_coef.len()),
            });
        }
        let b = intercept.get(c).copied().unwrap_or(0.0);
        for (i, row) in x.rows().into_iter().enumerate() {
            let dot: f64 = row.iter().zip(row_coef.iter()).map(|(a, w)| a * w).sum();
            scores[[i, c]] = dot + b;
        }
    }
    Ok(scores)
}

fn softmax_rows(scores: &Array2<f64>) -> Array2<f64> {
    let mut proba = scores.clone();
    for mut row in proba.rows_mut() {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum: f64 = row.iter().sum();
        if sum > 0.0 {
            row.mapv_inplace(|v| v / sum);
        }
    }
    proba
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn binary_logistic() -> PickledEstimator {
        PickledEstimator::Logistic {
            coef: vec![vec![2.0, -1.0]],
            intercept: vec![0.0],
            classes: vec![0.0, 1.0],
        }
    }

    #[test]
    fn test_logistic_proba_sums_to_one() {
        let est = binary_logistic();
        let proba = est
            .predict_proba(&array![[1.0, 0.0], [0.0, 3.0]])
            .unwrap()
            .unwrap();

        for i in 0..proba.nrows() {
            let sum: f64 = proba.row(i).iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
        assert!(proba[[0, 1]] > 0.5);
        assert!(proba[[1, 1]] < 0.5);
    }

    #[test]
    fn test_linear_svc_has_no_proba() {
        let est = PickledEstimator::LinearSvc {
            coef: vec![vec![1.0]],
            intercept: vec![0.0],
            classes: vec![0.0, 1.0],
        };
        assert!(est.predict_proba(&array![[1.0]]).unwrap().is_none());

        let labels = est.predict(&array![[2.0], [-2.0]]).unwrap();
        assert_eq!(labels.to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_nearest_centroid_predict() {
        let est = PickledEstimator::NearestCentroid {
            centroids: vec![vec![0.0, 0.0], vec![10.0, 10.0]],
            classes: vec![3.0, 7.0],
        };
        let labels = est.predict(&array![[1.0, 1.0], [9.0, 9.0]]).unwrap();
        assert_eq!(labels.to_vec(), vec![3.0, 7.0]);
    }

    #[test]
    fn test_pickle_round_trip() {
        let est = binary_logistic();
        let bytes = est.to_bytes().unwrap();
        let restored = PickledEstimator::from_bytes(&bytes).unwrap();
        assert_eq!(restored.classes(), &[0.0, 1.0]);
    }
}
