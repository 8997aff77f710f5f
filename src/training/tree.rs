//! Decision tree classifier used by the baseline forest

use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        class: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Gini-impurity decision tree for classification.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Option<Node>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means all
    pub max_features: Option<usize>,
    seed: u64,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit the tree to training data.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(BenchError::Shape {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(BenchError::EmptyDataset);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build(x, y, &indices, 0, &mut rng));
        Ok(())
    }

    /// Predict a class per row.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(BenchError::ModelNotFitted)?;

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let mut node = root;
                loop {
                    match node {
                        Node::Leaf { class } => return *class,
                        Node::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        } => {
                            node = if row[*feature] <= *threshold {
                                left
                            } else {
                                right
                            };
                        }
                    }
                }
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> Node {
        let parent_gini = gini(y, indices);
        let depth_reached = self.max_depth.is_some_and(|d| depth >= d);

        if parent_gini == 0.0 || indices.len() < self.min_samples_split || depth_reached {
            return Node::Leaf {
                class: majority_class(y, indices),
            };
        }

        let n_features = x.ncols();
        let mut feature_pool: Vec<usize> = (0..n_features).collect();
        let n_candidates = self.max_features.unwrap_or(n_features).clamp(1, n_features);
        feature_pool.shuffle(rng);
        feature_pool.truncate(n_candidates);

        let mut best: Option<(usize, f64, f64)> = None;
        for &feature in &feature_pool {
            if let Some((threshold, impurity)) = self.best_threshold(x, y, indices, feature) {
                if best.map_or(true, |(_, _, b)| impurity < b) {
                    best = Some((feature, threshold, impurity));
                }
            }
        }

        let Some((feature, threshold, impurity)) = best else {
            return Node::Leaf {
                class: majority_class(y, indices),
            };
        };
        if impurity >= parent_gini - 1e-12 {
            return Node::Leaf {
                class: majority_class(y, indices),
            };
        }

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| x[[i, feature]] <= threshold);

        let left = self.build(x, y, &left_idx, depth + 1, rng);
        let right = self.build(x, y, &right_idx, depth + 1, rng);

        Node::Split {
            feature,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Best split threshold for one feature: midpoints between consecutive
    /// distinct values, scored by weighted child gini.
    fn best_threshold(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature: usize,
    ) -> Option<(f64, f64)> {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_by(|&a, &b| {
            x[[a, feature]]
                .partial_cmp(&x[[b, feature]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let n = sorted.len();
        let mut best: Option<(f64, f64)> = None;

        for split_at in 1..n {
            let prev = x[[sorted[split_at - 1], feature]];
            let next = x[[sorted[split_at], feature]];
            if prev == next {
                continue;
            }
            if split_at < self.min_samples_leaf || n - split_at < self.min_samples_leaf {
                continue;
            }

            let threshold = (prev + next) / 2.0;
            let left = &sorted[..split_at];
            let right = &sorted[split_at..];
            let impurity = (left.len() as f64 * gini(y, left)
                + right.len() as f64 * gini(y, right))
                / n as f64;

            if best.map_or(true, |(_, b)| impurity < b) {
                best = Some((threshold, impurity));
            }
        }

        best
    }
}

fn gini(y: &Array1<f64>, indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &i in indices {
        *counts.entry(y[i].round() as i64).or_insert(0) += 1;
    }
    let n = indices.len() as f64;
    1.0 - counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn majority_class(y: &Array1<f64>, indices: &[usize]) -> f64 {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &i in indices {
        *counts.entry(y[i].round() as i64).or_insert(0) += 1;
    }
    counts
        .into_iter()
        // break count ties on the smaller label for determinism
        .max_by_key(|&(class, count)| (count, std::cmp::Reverse(class)))
        .map(|(class, _)| class as f64)
        .unwrap_or(0.0)
}
