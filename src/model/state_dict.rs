//! State-dict checkpoints (pickle framed)
//!
//! A checkpoint is a map of named tensors (`"0.weight"`, `"0.bias"`, ...)
//! assembled into a feed-forward network. Weight tensors use the
//! `[outputs, inputs]` convention and are transposed at load time.
//! Inference always runs in eval mode: no dropout, no gradient state.

use crate::error::{BenchError, Result};
use crate::model::network::{Activation, DenseLayer, FeedForwardNet};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named tensor inside a state dict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorData {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl TensorData {
    fn validate(&self, name: &str) -> Result<()> {
        let expected: usize = self.shape.iter().product();
        if self.data.len() != expected {
            return Err(BenchError::Serialization(format!(
                "Tensor '{name}' has {} values but shape {:?}",
                self.data.len(),
                self.shape
            )));
        }
        Ok(())
    }
}

/// A network assembled from a state-dict checkpoint.
#[derive(Debug, Clone)]
pub struct StateDictModel {
    net: FeedForwardNet,
}

impl StateDictModel {
    /// Parse raw pickle bytes into a model.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let entries: BTreeMap<String, TensorData> =
            serde_pickle::from_slice(bytes, serde_pickle::DeOptions::new()).map_err(|e| {
                BenchError::Serialization(format!("Failed to deserialize state dict: {e}"))
            })?;
        Self::from_entries(&entries)
    }

    /// Assemble layers from `"<index>.weight"` / `"<index>.bias"` entries.
    ///
    /// Hidden layers get ReLU; the output layer stays linear since only the
    /// argmax of its activations is consumed.
    pub fn from_entries(entries: &BTreeMap<String, TensorData>) -> Result<Self> {
        let mut indices: Vec<usize> = Vec::new();
        for key in entries.keys() {
            let Some((idx, part)) = key.split_once('.') else {
                return Err(BenchError::Serialization(format!(
                    "Unrecognized state-dict key '{key}'"
                )));
            };
            let idx: usize = idx.parse().map_err(|_| {
                BenchError::Serialization(format!("Unrecognized state-dict key '{key}'"))
            })?;
            if part != "weight" && part != "bias" {
                return Err(BenchError::Serialization(format!(
                    "Unrecognized state-dict key '{key}'"
                )));
            }
            if !indices.contains(&idx) {
                indices.push(idx);
            }
        }
        indices.sort_unstable();

        if indices.is_empty() {
            return Err(BenchError::Serialization(
                "State dict contains no layers".to_string(),
            ));
        }

        let mut layers = Vec::with_capacity(indices.len());
        let last = *indices.last().unwrap();
        for idx in indices {
            let weight = entries.get(&format!("{idx}.weight")).ok_or_else(|| {
                BenchError::Serialization(format!("Layer {idx} is missing its weight tensor"))
            })?;
            let bias = entries.get(&format!("{idx}.bias")).ok_or_else(|| {
                BenchError::Serialization(format!("Layer {idx} is missing its bias tensor"))
            })?;
            weight.validate(&format!("{idx}.weight"))?;
            bias.validate(&format!("{idx}.bias"))?;

            if weight.shape.len() != 2 {
                return Err(BenchError::Serialization(format!(
                    "Weight tensor '{idx}.weight' must be 2-dimensional, got shape {:?}",
                    weight.shape
                )));
            }
            let (n_out, n_in) = (weight.shape[0], weight.shape[1]);
            if bias.data.len() != n_out {
                return Err(BenchError::Serialization(format!(
                    "Bias tensor '{idx}.bias' has {} values, expected {n_out}",
                    bias.data.len()
                )));
            }

            // transpose [out, in] -> [in][out]
            let mut weights = vec![vec![0.0; n_out]; n_in];
            for o in 0..n_out {
                for i in 0..n_in {
                    weights[i][o] = weight.data[o * n_in + i];
                }
            }

            let activation = if idx == last {
                Activation::Linear
            } else {
                Activation::ReLU
            };
            layers.push(DenseLayer::new(weights, bias.data.clone(), activation));
        }

        Ok(Self {
            net: FeedForwardNet::new(layers),
        })
    }

    pub fn n_inputs(&self) -> usize {
        self.net.n_inputs()
    }

    /// Eval-mode batched forward pass; class = argmax activation per row.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.net.predict_classes(x)
    }
}
