//! Design-matrix construction with categorical code encoding

use crate::dataset::loader::is_numeric_dtype;
use crate::error::{BenchError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::collections::HashMap;

/// Numeric feature matrix and label vector derived from a DataFrame.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub features: Array2<f64>,
    pub labels: Array1<f64>,
    pub feature_names: Vec<String>,
    pub target_name: String,
}

/// Split a DataFrame into an encoded feature matrix and label vector.
///
/// Validates the table shape, resolves the target column (last column when
/// `target_column` is `None`), and integer-encodes every non-numeric column
/// independently by order of first appearance. All matrix entries are
/// finite; a missing or non-convertible value fails the load.
pub fn design_matrix(df: &DataFrame, target_column: Option<&str>) -> Result<DesignMatrix> {
    if df.height() == 0 {
        return Err(BenchError::EmptyDataset);
    }
    if df.width() < 2 {
        return Err(BenchError::InsufficientColumns);
    }

    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let target_name = match target_column {
        Some(name) => {
            if !columns.iter().any(|c| c == name) {
                return Err(BenchError::UnknownColumn {
                    column: name.to_string(),
                    available: columns,
                });
            }
            name.to_string()
        }
        // Documented default, not inferred semantically
        None => columns.last().cloned().unwrap_or_default(),
    };

    let target_series = df
        .column(target_name.as_str())?
        .as_materialized_series()
        .clone();
    let labels = Array1::from_vec(encode_series(&target_series)?);

    let feature_frame = df.drop(target_name.as_str())?;
    let feature_names: Vec<String> = feature_frame
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let n_rows = feature_frame.height();
    let n_cols = feature_frame.width();
    let mut features = Array2::<f64>::zeros((n_rows, n_cols));

    for (j, col) in feature_frame.get_columns().iter().enumerate() {
        let encoded = encode_series(col.as_materialized_series())?;
        for (i, value) in encoded.into_iter().enumerate() {
            features[[i, j]] = value;
        }
    }

    Ok(DesignMatrix {
        features,
        labels,
        feature_names,
        target_name,
    })
}

/// Encode a single column to finite floats.
///
/// Numeric columns are cast to f64; string columns get categorical codes in
/// order of first appearance (null maps to -1); boolean columns become 0/1.
fn encode_series(series: &Series) -> Result<Vec<f64>> {
    let name = series.name().to_string();

    match series.dtype() {
        DataType::String => {
            let ca = series
                .str()
                .map_err(|e| encoding_error(&name, &e.to_string()))?;
            let mut codes: HashMap<String, usize> = HashMap::new();
            let mut out = Vec::with_capacity(series.len());
            for value in ca.into_iter() {
                match value {
                    Some(v) => {
                        let next = codes.len();
                        let code = *codes.entry(v.to_string()).or_insert(next);
                        out.push(code as f64);
                    }
                    None => out.push(-1.0),
                }
            }
            Ok(out)
        }
        DataType::Boolean => {
            let ca = series
                .bool()
                .map_err(|e| encoding_error(&name, &e.to_string()))?;
            ca.into_iter()
                .map(|v| match v {
                    Some(true) => Ok(1.0),
                    Some(false) => Ok(0.0),
                    None => Err(encoding_error(&name, "missing value")),
                })
                .collect()
        }
        dtype if is_numeric_dtype(dtype) => {
            let cast = series
                .cast(&DataType::Float64)
                .map_err(|e| encoding_error(&name, &e.to_string()))?;
            let ca = cast
                .f64()
                .map_err(|e| encoding_error(&name, &e.to_string()))?;
            ca.into_iter()
                .map(|v| match v {
                    Some(v) if v.is_finite() => Ok(v),
                    Some(_) => Err(encoding_error(&name, "non-finite value")),
                    None => Err(encoding_error(&name, "missing value")),
                })
                .collect()
        }
        other => Err(encoding_error(
            &name,
            &format!("cannot convert dtype {other:?} to float"),
        )),
    }
}

fn encoding_error(column: &str, reason: &str) -> BenchError {
    BenchError::FeatureEncoding {
        column: column.to_string(),
        reason: reason.to_string(),
    }
}
