//! Random forest classifier

use crate::error::{BenchError, Result};
use crate::training::tree::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::HashMap;

/// Bagged ensemble of gini decision trees with sqrt feature subsampling.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
    classes: Vec<f64>,
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            bootstrap: true,
            seed: 42,
            classes: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Fit the forest; trees are built in parallel with per-tree seeds
    /// derived from the base seed.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(BenchError::Shape {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(BenchError::EmptyDataset);
        }

        let mut classes: Vec<f64> = y.iter().copied().collect();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        classes.dedup();
        self.classes = classes;

        let max_features = ((n_features as f64).sqrt().ceil() as usize).max(1);
        let base_seed = self.seed;
        let bootstrap = self.bootstrap;
        let max_depth = self.max_depth;

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if bootstrap {
                    (0..n_samples)
                        .map(|_| (rng.next_u64() as usize) % n_samples)
                        .collect()
                } else {
                    (0..n_samples).collect()
                };

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = DecisionTree::new()
                    .with_max_features(max_features)
                    .with_seed(seed);
                if let Some(d) = max_depth {
                    tree = tree.with_max_depth(d);
                }
                tree.fit(&x_boot, &y_boot).ok();
                tree
            })
            .collect();

        self.trees = trees;
        Ok(self)
    }

    /// Majority-vote prediction across trees.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(BenchError::ModelNotFitted);
        }

        let all_predictions: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .filter_map(|tree| tree.predict(x).ok())
            .collect();

        if all_predictions.is_empty() {
            return Err(BenchError::Data(
                "No tree could make predictions".to_string(),
            ));
        }

        let n_samples = x.nrows();
        let predictions: Vec<f64> = (0..n_samples)
            .map(|i| {
                let mut votes: HashMap<i64, usize> = HashMap::new();
                for preds in &all_predictions {
                    let class = preds[i].round() as i64;
                    *votes.entry(class).or_insert(0) += 1;
                }
                votes
                    .into_iter()
                    .max_by_key(|&(class, count)| (count, std::cmp::Reverse(class)))
                    .map(|(class, _)| class as f64)
                    .unwrap_or(0.0)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_separable() {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.2],
            [1.0, 1.0],
            [1.1, 1.1],
            [1.2, 1.2],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut forest = RandomForest::new(10).with_seed(42);
        forest.fit(&x, &y).unwrap();

        let predictions = forest.predict(&x).unwrap();
        let accuracy = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count() as f64
            / y.len() as f64;

        assert!(accuracy >= 0.8, "Accuracy too low: {accuracy}");
    }

    #[test]
    fn test_unfitted_forest_errors() {
        let forest = RandomForest::new(5);
        let err = forest.predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, BenchError::ModelNotFitted));
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let x = array![[0.0], [0.3], [0.6], [1.0], [1.3], [1.6]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut a = RandomForest::new(20).with_seed(7);
        let mut b = RandomForest::new(20).with_seed(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(
            a.predict(&x).unwrap().to_vec(),
            b.predict(&x).unwrap().to_vec()
        );
    }

    #[test]
    fn test_classes_sorted_unique() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![2.0, 0.0, 2.0];

        let mut forest = RandomForest::new(3);
        forest.fit(&x, &y).unwrap();
        assert_eq!(forest.classes(), &[0.0, 2.0]);
    }
}
