//! Dense-network checkpoints (binary framed)
//!
//! Checkpoint layout: magic bytes, format version, then the layered
//! network. Serialized with bincode.

use crate::error::{BenchError, Result};
use crate::model::network::FeedForwardNet;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Magic bytes for dense checkpoints
const MAGIC: [u8; 4] = *b"MBDN";
/// Current checkpoint format version
const VERSION: u32 = 1;

/// A layered dense-network checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseCheckpoint {
    magic: [u8; 4],
    format_version: u32,
    pub net: FeedForwardNet,
}

impl DenseCheckpoint {
    pub fn new(net: FeedForwardNet) -> Self {
        Self {
            magic: MAGIC,
            format_version: VERSION,
            net,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| BenchError::Serialization(format!("Failed to serialize checkpoint: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let checkpoint: DenseCheckpoint = bincode::deserialize(bytes)
            .map_err(|e| BenchError::Serialization(format!("Failed to deserialize checkpoint: {e}")))?;

        if checkpoint.magic != MAGIC {
            return Err(BenchError::Serialization(
                "Not a dense-network checkpoint (bad magic bytes)".to_string(),
            ));
        }
        if checkpoint.format_version != VERSION {
            return Err(BenchError::Serialization(format!(
                "Unsupported checkpoint version {}",
                checkpoint.format_version
            )));
        }
        Ok(checkpoint)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Batched forward pass; class = argmax output activation per row.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.net.predict_classes(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::network::{Activation, DenseLayer};
    use ndarray::array;

    fn two_class_net() -> FeedForwardNet {
        FeedForwardNet::new(vec![DenseLayer::new(
            vec![vec![1.0, -1.0], vec![-1.0, 1.0]],
            vec![0.0, 0.0],
            Activation::Softmax,
        )])
    }

    #[test]
    fn test_round_trip() {
        let checkpoint = DenseCheckpoint::new(two_class_net());
        let bytes = checkpoint.to_bytes().unwrap();
        let restored = DenseCheckpoint::from_bytes(&bytes).unwrap();

        assert_eq!(restored.net.n_inputs(), 2);
        assert_eq!(restored.net.n_outputs(), 2);
    }

    #[test]
    fn test_corrupt_bytes_rejected() {
        let err = DenseCheckpoint::from_bytes(&[0u8; 16]).unwrap_err();
        assert!(matches!(err, BenchError::Serialization(_)));
    }

    #[test]
    fn test_predict() {
        let checkpoint = DenseCheckpoint::new(two_class_net());
        let predictions = checkpoint
            .predict(&array![[2.0, 0.0], [0.0, 2.0]])
            .unwrap();
        assert_eq!(predictions.to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.h5");

        let checkpoint = DenseCheckpoint::new(two_class_net());
        checkpoint.save(&path).unwrap();

        let restored = DenseCheckpoint::load(&path).unwrap();
        assert_eq!(restored.net.layers.len(), 1);
    }
}
