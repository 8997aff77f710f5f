//! Model artifact loading, dispatched by file extension

use crate::error::{BenchError, Result};
use crate::model::dense::DenseCheckpoint;
use crate::model::estimator::PickledEstimator;
use crate::model::state_dict::StateDictModel;
use crate::model::ModelHandle;
use std::fs;
use std::path::Path;
use tracing::info;

/// Load a model artifact into a [`ModelHandle`].
///
/// Dispatch is purely by extension; file content is not sniffed. `.onnx`
/// always fails as unimplemented regardless of content, and any other
/// extension is rejected. Inference capability is not validated here; a
/// malformed network surfaces on first predict.
pub fn load(path: &Path) -> Result<ModelHandle> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let handle = match ext.as_str() {
        "h5" => {
            let bytes = read_artifact(path)?;
            DenseCheckpoint::from_bytes(&bytes)
                .map(ModelHandle::Dense)
                .map_err(|e| load_error(path, e))?
        }
        "pt" | "pth" => {
            let bytes = read_artifact(path)?;
            StateDictModel::from_bytes(&bytes)
                .map(ModelHandle::StateDict)
                .map_err(|e| load_error(path, e))?
        }
        "pkl" => {
            let bytes = read_artifact(path)?;
            PickledEstimator::from_bytes(&bytes)
                .map(ModelHandle::Pickled)
                .map_err(|e| load_error(path, e))?
        }
        "onnx" => return Err(BenchError::OnnxNotImplemented),
        _ => return Err(BenchError::unsupported_model()),
    };

    info!(path = %path.display(), kind = handle.kind(), "Model loaded");
    Ok(handle)
}

fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| load_error(path, BenchError::Io(e)))
}

fn load_error(path: &Path, cause: BenchError) -> BenchError {
    BenchError::ModelLoad {
        path: path.display().to_string(),
        cause: cause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::network::{Activation, DenseLayer, FeedForwardNet};
    use std::io::Write;

    fn checkpoint_bytes() -> Vec<u8> {
        let net = FeedForwardNet::new(vec![DenseLayer::new(
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![0.0, 0.0],
            Activation::Linear,
        )]);
        DenseCheckpoint::new(net).to_bytes().unwrap()
    }

    #[test]
    fn test_dispatch_is_extension_only() {
        // The same valid checkpoint bytes under .onnx must still fail as
        // unimplemented.
        let mut file = tempfile::Builder::new()
            .suffix(".onnx")
            .tempfile()
            .unwrap();
        file.write_all(&checkpoint_bytes()).unwrap();

        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, BenchError::OnnxNotImplemented));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let mut file = tempfile::Builder::new()
            .suffix(".model")
            .tempfile()
            .unwrap();
        file.write_all(&checkpoint_bytes()).unwrap();

        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, BenchError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_load_dense_checkpoint() {
        let mut file = tempfile::Builder::new().suffix(".h5").tempfile().unwrap();
        file.write_all(&checkpoint_bytes()).unwrap();

        let handle = load(file.path()).unwrap();
        assert_eq!(handle.kind(), "dense");
    }

    #[test]
    fn test_corrupt_checkpoint_reports_cause() {
        let mut file = tempfile::Builder::new().suffix(".h5").tempfile().unwrap();
        file.write_all(b"not a checkpoint").unwrap();

        let err = load(file.path()).unwrap_err();
        match err {
            BenchError::ModelLoad { path, .. } => {
                assert!(path.ends_with(".h5"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_pickled_estimator() {
        let est = PickledEstimator::NearestCentroid {
            centroids: vec![vec![0.0], vec![1.0]],
            classes: vec![0.0, 1.0],
        };
        let mut file = tempfile::Builder::new().suffix(".pkl").tempfile().unwrap();
        file.write_all(&est.to_bytes().unwrap()).unwrap();

        let handle = load(file.path()).unwrap();
        assert_eq!(handle.kind(), "pickled");
    }
}
