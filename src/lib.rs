//! Modelbench - model evaluation service
//!
//! Runs previously trained classification models against uploaded tabular
//! datasets and reports accuracy-style metrics, trains a reference
//! baseline for comparison, and measures simple generation-quality
//! metrics for text-generation models.
//!
//! # Modules
//!
//! ## Core pipeline
//! - [`dataset`] - Tabular loading, validation, categorical encoding
//! - [`model`] - Serialized model loading and the tagged model handle
//! - [`evaluation`] - Model-vs-dataset evaluation and metrics
//! - [`training`] - Baseline random-forest training
//! - [`textgen`] - Text-generation analysis (tokenizer + generator pair)
//!
//! ## Infrastructure
//! - [`repository`] - Append-only benchmark / model-library stores
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

pub mod error;

pub mod dataset;
pub mod evaluation;
pub mod model;
pub mod textgen;
pub mod training;

pub mod repository;

pub mod cli;
pub mod server;

pub use error::{BenchError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{BenchError, Result};

    pub use crate::dataset::{design_matrix, DatasetLoader, DatasetSummary, DesignMatrix};

    pub use crate::model::{self, ModelHandle};

    pub use crate::evaluation::{
        classification_report, ClassificationReport, EvaluationOutcome, EvaluationPipeline,
    };

    pub use crate::training::{train_test_split, BaselineReport, BaselineTrainer, RandomForest};

    pub use crate::textgen::{jaccard, BatchReport, GenerationResult, TestItem, TextGenAnalyzer};

    pub use crate::repository::{InMemoryStore, RecordStore};
}
