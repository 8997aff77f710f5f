//! Dataset loading and encoding
//!
//! Reads tabular files (CSV or spreadsheet) into polars DataFrames,
//! validates their shape, and turns them into numeric design matrices
//! with integer-coded categorical columns.

mod encode;
mod loader;

pub use encode::{design_matrix, DesignMatrix};
pub use loader::{DatasetLoader, DatasetSummary};
