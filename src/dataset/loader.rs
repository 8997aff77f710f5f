//! Tabular file readers

use crate::dataset::{design_matrix, DesignMatrix};
use crate::error::{BenchError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Loader for dataset files, dispatched by file extension.
pub struct DatasetLoader {
    /// Number of rows used for CSV schema inference
    infer_schema_length: usize,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 100,
        }
    }

    /// Read a tabular file into a DataFrame.
    ///
    /// `.csv` goes through the polars CSV reader, `.xlsx`/`.xls` through a
    /// spreadsheet reader. Any other extension fails with an
    /// unsupported-format error.
    pub fn load_table(&self, path: &Path) -> Result<DataFrame> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let df = match ext.as_str() {
            "csv" => self.read_csv(path)?,
            "xlsx" | "xls" => self.read_spreadsheet(path)?,
            _ => return Err(BenchError::unsupported_dataset()),
        };

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "Dataset loaded"
        );
        Ok(df)
    }

    /// Load a dataset and build its design matrix.
    ///
    /// If `target_column` is `None` the last column is treated as the
    /// target. Categorical columns are integer-encoded per call; the
    /// encoding is not stable across loads of different data.
    pub fn load(&self, path: &Path, target_column: Option<&str>) -> Result<DesignMatrix> {
        let df = self.load_table(path)?;
        design_matrix(&df, target_column)
    }

    /// Summarize a dataset file: columns, shape, dtypes, missing values,
    /// and numeric columns.
    pub fn summarize(&self, path: &Path) -> Result<DatasetSummary> {
        let df = self.load_table(path)?;
        Ok(DatasetSummary::from_frame(&df))
    }

    fn read_csv(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| BenchError::Data(e.to_string()))?;

        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file);

        reader.finish().map_err(|e| BenchError::Data(e.to_string()))
    }

    fn read_spreadsheet(&self, path: &Path) -> Result<DataFrame> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| BenchError::Data(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| BenchError::Data("Workbook has no sheets".to_string()))?
            .map_err(|e| BenchError::Data(e.to_string()))?;

        frame_from_sheet(&range)
    }
}

/// Convert a spreadsheet cell range into a DataFrame.
///
/// The first row supplies column names; a column whose non-empty cells are
/// all numeric becomes a float column, otherwise a string column.
fn frame_from_sheet(range: &calamine::Range<Data>) -> Result<DataFrame> {
    let mut rows = range.rows();
    let header = rows.next().ok_or(BenchError::EmptyDataset)?;

    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = match cell {
                Data::String(s) => s.trim().to_string(),
                Data::Empty => String::new(),
                other => other.to_string(),
            };
            if name.is_empty() {
                format!("column_{i}")
            } else {
                name
            }
        })
        .collect();

    let mut cells: Vec<Vec<Data>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (i, slot) in cells.iter_mut().enumerate() {
            slot.push(row.get(i).cloned().unwrap_or(Data::Empty));
        }
    }

    let columns: Vec<Column> = names
        .iter()
        .zip(cells.iter())
        .map(|(name, values)| sheet_column(name, values))
        .collect();

    DataFrame::new(columns).map_err(|e| BenchError::Data(e.to_string()))
}

fn sheet_column(name: &str, values: &[Data]) -> Column {
    let numeric = values
        .iter()
        .all(|v| matches!(v, Data::Int(_) | Data::Float(_) | Data::Empty));

    if numeric {
        let floats: Vec<Option<f64>> = values
            .iter()
            .map(|v| match v {
                Data::Int(i) => Some(*i as f64),
                Data::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        Column::new(name.into(), floats)
    } else {
        let strings: Vec<Option<String>> = values
            .iter()
            .map(|v| match v {
                Data::Empty => None,
                Data::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect();
        Column::new(name.into(), strings)
    }
}

/// Dataset information returned by the info query.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatasetSummary {
    pub columns: Vec<String>,
    /// (rows, columns)
    pub shape: (usize, usize),
    pub dtypes: BTreeMap<String, String>,
    /// Per-column flag, in column order
    pub has_missing_values: Vec<bool>,
    pub numeric_columns: Vec<String>,
}

impl DatasetSummary {
    pub fn from_frame(df: &DataFrame) -> Self {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut dtypes = BTreeMap::new();
        let mut has_missing_values = Vec::with_capacity(df.width());
        let mut numeric_columns = Vec::new();

        for col in df.get_columns() {
            let name = col.name().to_string();
            dtypes.insert(name.clone(), format!("{:?}", col.dtype()));
            has_missing_values.push(col.null_count() > 0);
            if is_numeric_dtype(col.dtype()) {
                numeric_columns.push(name);
            }
        }

        Self {
            columns,
            shape: (df.height(), df.width()),
            dtypes,
            has_missing_values,
            numeric_columns,
        }
    }
}

pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}
