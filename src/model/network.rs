//! Feed-forward network used by the checkpoint runtimes

use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Activation function applied after a layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    ReLU,
    Sigmoid,
    Tanh,
    Linear,
    Softmax,
}

impl Default for Activation {
    fn default() -> Self {
        Self::ReLU
    }
}

/// A dense layer: weights stored row-major as `[inputs][outputs]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    pub fn new(weights: Vec<Vec<f64>>, bias: Vec<f64>, activation: Activation) -> Self {
        Self {
            weights,
            bias,
            activation,
        }
    }

    pub fn n_inputs(&self) -> usize {
        self.weights.len()
    }

    pub fn n_outputs(&self) -> usize {
        self.bias.len()
    }

    fn weight_matrix(&self) -> Result<Array2<f64>> {
        let rows = self.weights.len();
        let cols = self.bias.len();
        let mut w = Array2::<f64>::zeros((rows, cols));
        for (i, row) in self.weights.iter().enumerate() {
            if row.len() != cols {
                return Err(BenchError::Shape {
                    expected: format!("{cols} weights per row"),
                    actual: format!("{} in row {i}", row.len()),
                });
            }
            for (j, v) in row.iter().enumerate() {
                w[[i, j]] = *v;
            }
        }
        Ok(w)
    }
}

/// A stack of dense layers with a batched forward pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedForwardNet {
    pub layers: Vec<DenseLayer>,
}

impl FeedForwardNet {
    pub fn new(layers: Vec<DenseLayer>) -> Self {
        Self { layers }
    }

    pub fn n_inputs(&self) -> usize {
        self.layers.first().map(|l| l.n_inputs()).unwrap_or(0)
    }

    pub fn n_outputs(&self) -> usize {
        self.layers.last().map(|l| l.n_outputs()).unwrap_or(0)
    }

    /// Batched forward pass returning per-row output activations.
    pub fn forward(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.layers.is_empty() {
            return Err(BenchError::ModelNotFitted);
        }

        let mut activations = x.clone();
        for layer in &self.layers {
            if activations.ncols() != layer.n_inputs() {
                return Err(BenchError::Shape {
                    expected: format!("{} input features", layer.n_inputs()),
                    actual: format!("{}", activations.ncols()),
                });
            }
            let w = layer.weight_matrix()?;
            let b = Array1::from_vec(layer.bias.clone());
            let mut z = activations.dot(&w) + &b;
            apply_activation(&mut z, layer.activation);
            activations = z;
        }
        Ok(activations)
    }

    /// Forward pass followed by per-row argmax over output activations.
    pub fn predict_classes(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let outputs = self.forward(x)?;
        let classes: Vec<f64> = outputs
            .rows()
            .into_iter()
            .map(|row| argmax(row.iter().copied()) as f64)
            .collect();
        Ok(Array1::from_vec(classes))
    }
}

fn apply_activation(z: &mut Array2<f64>, activation: Activation) {
    match activation {
        Activation::ReLU => z.mapv_inplace(|v| v.max(0.0)),
        Activation::Sigmoid => z.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp())),
        Activation::Tanh => z.mapv_inplace(|v| v.tanh()),
        Activation::Linear => {}
        Activation::Softmax => {
            for mut row in z.rows_mut() {
                let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                row.mapv_inplace(|v| (v - max).exp());
                let sum: f64 = row.iter().sum();
                if sum > 0.0 {
                    row.mapv_inplace(|v| v / sum);
                }
            }
        }
    }
}

/// Index of the maximum value; ties resolve to the first occurrence.
pub(crate) fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best_idx = 0;
    let mut best = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best {
            best = v;
            best_idx = i;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_forward_single_layer() {
        let layer = DenseLayer::new(
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![0.5, -0.5],
            Activation::Linear,
        );
        let net = FeedForwardNet::new(vec![layer]);

        let x = array![[1.0, 2.0]];
        let out = net.forward(&x).unwrap();

        assert_eq!(out[[0, 0]], 1.5);
        assert_eq!(out[[0, 1]], 1.5);
    }

    #[test]
    fn test_predict_classes_argmax() {
        let layer = DenseLayer::new(
            vec![vec![0.0, 0.0], vec![0.0, 0.0]],
            vec![1.0, 0.0],
            Activation::Linear,
        );
        let net = FeedForwardNet::new(vec![layer]);

        let x = array![[3.0, 4.0], [5.0, 6.0]];
        let classes = net.predict_classes(&x).unwrap();

        assert_eq!(classes.to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let layer = DenseLayer::new(
            vec![vec![1.0, -1.0]],
            vec![0.0, 0.0],
            Activation::Softmax,
        );
        let net = FeedForwardNet::new(vec![layer]);

        let out = net.forward(&array![[2.0]]).unwrap();
        let sum: f64 = out.row(0).iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_shape_mismatch() {
        let layer = DenseLayer::new(vec![vec![1.0]], vec![0.0], Activation::Linear);
        let net = FeedForwardNet::new(vec![layer]);

        let err = net.forward(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, BenchError::Shape { .. }));
    }

    #[test]
    fn test_argmax_ties_take_first() {
        assert_eq!(argmax([1.0, 1.0, 0.5].into_iter()), 0);
        assert_eq!(argmax([0.1, 0.9, 0.9].into_iter()), 1);
    }
}
