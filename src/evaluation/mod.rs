//! Model evaluation pipeline
//!
//! Composes the model loader and dataset loader, dispatches inference by
//! model kind, and aggregates classification metrics. [`EvaluationPipeline::evaluate`]
//! is the never-raises boundary: any failure becomes an error-status
//! outcome instead of propagating.

mod metrics;

pub use metrics::{classification_report, ClassificationReport};

use crate::dataset::DatasetLoader;
use crate::error::Result;
use crate::model;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalStatus {
    Success,
    Error,
}

/// Outcome of one evaluation call.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutcome {
    pub status: EvalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ClassificationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictions: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EvaluationOutcome {
    fn success(metrics: ClassificationReport, predictions: Vec<f64>) -> Self {
        Self {
            status: EvalStatus::Success,
            metrics: Some(metrics),
            predictions: Some(predictions),
            message: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: EvalStatus::Error,
            metrics: None,
            predictions: None,
            message: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EvalStatus::Success
    }
}

/// Evaluates serialized models against tabular datasets.
pub struct EvaluationPipeline {
    loader: DatasetLoader,
}

impl Default for EvaluationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationPipeline {
    pub fn new() -> Self {
        Self {
            loader: DatasetLoader::new(),
        }
    }

    /// Evaluate a model against a dataset. Single attempt, no retries;
    /// errors are captured into the outcome rather than raised.
    pub fn evaluate(
        &self,
        model_path: &Path,
        dataset_path: &Path,
        target_column: Option<&str>,
    ) -> EvaluationOutcome {
        match self.run(model_path, dataset_path, target_column) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    model = %model_path.display(),
                    dataset = %dataset_path.display(),
                    error = %e,
                    "Evaluation failed"
                );
                EvaluationOutcome::error(e.to_string())
            }
        }
    }

    fn run(
        &self,
        model_path: &Path,
        dataset_path: &Path,
        target_column: Option<&str>,
    ) -> Result<EvaluationOutcome> {
        let handle = model::load(model_path)?;
        let design = self.loader.load(dataset_path, target_column)?;

        let predictions = handle.predict(&design.features)?;
        let report = classification_report(&design.labels, &predictions);

        info!(
            model = %model_path.display(),
            kind = handle.kind(),
            rows = design.features.nrows(),
            accuracy = report.accuracy,
            "Evaluation completed"
        );

        Ok(EvaluationOutcome::success(report, predictions.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_outcome_never_raises() {
        let pipeline = EvaluationPipeline::new();
        let outcome = pipeline.evaluate(
            Path::new("/nonexistent/model.h5"),
            Path::new("/nonexistent/data.csv"),
            None,
        );

        assert_eq!(outcome.status, EvalStatus::Error);
        assert!(outcome.metrics.is_none());
        assert!(outcome.message.is_some());
    }

    #[test]
    fn test_outcome_serialization_shape() {
        let outcome = EvaluationOutcome::error("boom".to_string());
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "boom");
        assert!(json.get("metrics").is_none());
    }
}
