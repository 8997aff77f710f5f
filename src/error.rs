//! Error types for the model evaluation service

use thiserror::Error;

/// Result type alias for modelbench operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Main error type for the evaluation service
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Unsupported {artifact} format. Supported formats: {supported}")]
    UnsupportedFormat {
        artifact: &'static str,
        supported: &'static str,
    },

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Dataset must have at least two columns (features and target)")]
    InsufficientColumns,

    #[error("Target column '{column}' not found in dataset. Available columns: {available:?}")]
    UnknownColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Failed to encode column '{column}': {reason}")]
    FeatureEncoding { column: String, reason: String },

    #[error("Error loading model from {path}: {cause}")]
    ModelLoad { path: String, cause: String },

    #[error("ONNX support not yet implemented")]
    OnnxNotImplemented,

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Invalid target column")]
    InvalidTargetColumn,

    #[error("No test items produced a generation")]
    NoResults,

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BenchError {
    /// Supported-format error for dataset artifacts.
    pub fn unsupported_dataset() -> Self {
        BenchError::UnsupportedFormat {
            artifact: "dataset",
            supported: ".csv, .xlsx, .xls",
        }
    }

    /// Supported-format error for model artifacts.
    pub fn unsupported_model() -> Self {
        BenchError::UnsupportedFormat {
            artifact: "model",
            supported: ".h5, .pt, .pth, .pkl, .onnx",
        }
    }
}

impl From<polars::error::PolarsError> for BenchError {
    fn from(err: polars::error::PolarsError) -> Self {
        BenchError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BenchError {
    fn from(err: ndarray::ShapeError) -> Self {
        BenchError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
