//! Model artifact handling
//!
//! Serialized models are deserialized into a tagged [`ModelHandle`], one
//! variant per artifact family, each implementing a single `predict`
//! capability. See [`loader::load`] for the extension dispatch table.

mod dense;
mod estimator;
mod loader;
pub mod network;
mod state_dict;

pub use dense::DenseCheckpoint;
pub use estimator::PickledEstimator;
pub use loader::load;
pub use network::{Activation, DenseLayer, FeedForwardNet};
pub use state_dict::{StateDictModel, TensorData};

use crate::error::Result;
use crate::model::network::argmax;
use ndarray::{Array1, Array2};

/// An opaque deserialized model plus its inference capability.
#[derive(Debug, Clone)]
pub enum ModelHandle {
    /// Dense-network checkpoint (`.h5`)
    Dense(DenseCheckpoint),
    /// State-dict checkpoint (`.pt` / `.pth`)
    StateDict(StateDictModel),
    /// Generic pickled estimator (`.pkl`)
    Pickled(PickledEstimator),
}

impl ModelHandle {
    /// Predicted class labels for a batch of encoded feature rows.
    ///
    /// Checkpoint variants take the argmax over output activations. The
    /// pickled variant tries class probabilities first and falls back to
    /// direct prediction when the estimator kind has none.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            ModelHandle::Dense(model) => model.predict(x),
            ModelHandle::StateDict(model) => model.predict(x),
            ModelHandle::Pickled(estimator) => match estimator.predict_proba(x)? {
                Some(proba) => {
                    let classes = estimator.classes();
                    let labels: Vec<f64> = proba
                        .rows()
                        .into_iter()
                        .map(|row| classes[argmax(row.iter().copied())])
                        .collect();
                    Ok(Array1::from_vec(labels))
                }
                None => estimator.predict(x),
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelHandle::Dense(_) => "dense",
            ModelHandle::StateDict(_) => "state_dict",
            ModelHandle::Pickled(_) => "pickled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_pickled_proba_path_maps_class_labels() {
        // Probability-capable estimator with non-contiguous class labels
        let est = PickledEstimator::Logistic {
            coef: vec![vec![1.0]],
            intercept: vec![0.0],
            classes: vec![2.0, 5.0],
        };
        let handle = ModelHandle::Pickled(est);

        let labels = handle.predict(&array![[3.0], [-3.0]]).unwrap();
        assert_eq!(labels.to_vec(), vec![5.0, 2.0]);
    }

    #[test]
    fn test_pickled_fallback_to_direct_predict() {
        let est = PickledEstimator::NearestCentroid {
            centroids: vec![vec![0.0], vec![5.0]],
            classes: vec![0.0, 1.0],
        };
        let handle = ModelHandle::Pickled(est);

        let labels = handle.predict(&array![[4.5], [0.5]]).unwrap();
        assert_eq!(labels.to_vec(), vec![1.0, 0.0]);
    }
}
