//! HTTP request handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::dataset::DatasetLoader;
use crate::evaluation::EvaluationPipeline;
use crate::textgen::{TestItem, DEFAULT_MAX_LENGTH};
use crate::training::BaselineTrainer;

use super::error::{Result, ServerError};
use super::state::AppState;

const DATASET_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];
const MODEL_EXTENSIONS: [&str; 5] = ["h5", "pt", "pth", "pkl", "onnx"];

// ============================================================================
// Upload handlers
// ============================================================================

/// Upload a dataset file, store it, and return its summary.
pub async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let (file_name, data) = read_upload(multipart).await?;
    let ext = checked_extension(&file_name, &DATASET_EXTENSIONS, ".csv, .xlsx, .xls")?;

    let stored = PathBuf::from(&state.config.data_dir)
        .join(format!("dataset_{}.{ext}", AppState::generate_id()));
    tokio::fs::write(&stored, &data).await?;
    info!(file = %file_name, stored = %stored.display(), bytes = data.len(), "Dataset uploaded");

    let loader = DatasetLoader::new();
    let summary = match loader.summarize(&stored) {
        Ok(summary) => summary,
        Err(e) => {
            // Don't keep artifacts that can't be read back
            let _ = tokio::fs::remove_file(&stored).await;
            return Err(e.into());
        }
    };

    Ok(Json(json!({
        "success": true,
        "message": "Dataset uploaded successfully",
        "filepath": stored.display().to_string(),
        "filename": file_name,
        "columns": summary.columns,
        "shape": summary.shape,
        "dtypes": summary.dtypes,
        "has_missing_values": summary.has_missing_values,
        "numeric_columns": summary.numeric_columns,
    })))
}

/// Upload a model artifact and return its stored path.
pub async fn upload_model(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (file_name, data) = read_upload(multipart).await?;
    let ext = checked_extension(&file_name, &MODEL_EXTENSIONS, ".h5, .pt, .pth, .pkl, .onnx")?;

    let stored = PathBuf::from(&state.config.models_dir)
        .join(format!("model_{}.{ext}", AppState::generate_id()));
    tokio::fs::write(&stored, &data).await?;
    info!(file = %file_name, stored = %stored.display(), bytes = data.len(), "Model uploaded");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Model uploaded successfully",
            "filepath": stored.display().to_string(),
        })),
    ))
}

async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        let Some(file_name) = field.file_name().map(|n| n.to_string()) else {
            continue;
        };
        if file_name.is_empty() {
            return Err(ServerError::BadRequest("No file selected".to_string()));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;
        return Ok((file_name, data.to_vec()));
    }
    Err(ServerError::BadRequest("No file uploaded".to_string()))
}

fn checked_extension(
    file_name: &str,
    allowed: &[&str],
    supported: &'static str,
) -> Result<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !allowed.contains(&ext.as_str()) {
        return Err(ServerError::BadRequest(format!(
            "Invalid file type. Supported formats: {supported}"
        )));
    }
    Ok(ext)
}

// ============================================================================
// Dataset info
// ============================================================================

#[derive(Deserialize)]
pub struct DatasetInfoQuery {
    path: String,
}

pub async fn dataset_info(
    Query(query): Query<DatasetInfoQuery>,
) -> Result<Json<serde_json::Value>> {
    let path = PathBuf::from(&query.path);
    if !path.exists() {
        return Err(ServerError::NotFound("Dataset not found".to_string()));
    }

    let summary = DatasetLoader::new().summarize(&path)?;
    Ok(Json(serde_json::to_value(summary).map_err(|e| {
        ServerError::Internal(e.to_string())
    })?))
}

// ============================================================================
// Evaluation and training
// ============================================================================

#[derive(Deserialize)]
pub struct EvaluateRequest {
    model_path: String,
    dataset_path: String,
    target_column: Option<String>,
}

/// Run the evaluation pipeline. The pipeline never raises; an error-status
/// outcome maps to a failure response.
pub async fn evaluate_model(
    Json(request): Json<EvaluateRequest>,
) -> impl IntoResponse {
    let pipeline = EvaluationPipeline::new();
    let outcome = pipeline.evaluate(
        Path::new(&request.model_path),
        Path::new(&request.dataset_path),
        request.target_column.as_deref(),
    );

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome))
}

#[derive(Deserialize)]
pub struct TrainRequest {
    dataset_path: String,
    target_column: String,
}

pub async fn train_baseline(
    Json(request): Json<TrainRequest>,
) -> Result<Json<serde_json::Value>> {
    let df = DatasetLoader::new().load_table(Path::new(&request.dataset_path))?;
    let report = BaselineTrainer::new().train(&df, &request.target_column)?;

    Ok(Json(json!({
        "success": true,
        "metrics": report,
    })))
}

// ============================================================================
// Record repositories
// ============================================================================

pub async fn list_benchmarks(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!(state.benchmarks.read().await.list()))
}

pub async fn record_benchmark(
    State(state): State<Arc<AppState>>,
    Json(record): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.benchmarks.write().await.append(record.clone());
    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Benchmark result saved successfully",
            "data": record,
        })),
    )
}

pub async fn list_library(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!(state.library.read().await.list()))
}

pub async fn record_library_entry(
    State(state): State<Arc<AppState>>,
    Json(record): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.library.write().await.append(record.clone());
    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Model saved successfully",
            "data": record,
        })),
    )
}

// ============================================================================
// Text generation
// ============================================================================

#[derive(Deserialize)]
pub struct LlmLoadRequest {
    model_dir: String,
}

pub async fn load_llm_model(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LlmLoadRequest>,
) -> Result<Json<serde_json::Value>> {
    // Write lock: replacing the pair must not race in-flight generation
    state
        .analyzer
        .write()
        .await
        .load_model(Path::new(&request.model_dir))?;

    Ok(Json(json!({
        "message": "LLM model loaded successfully",
        "model_dir": request.model_dir,
    })))
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    prompt: String,
    max_length: Option<usize>,
}

pub async fn analyze_generation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<serde_json::Value>> {
    if request.prompt.is_empty() {
        return Err(ServerError::BadRequest("Prompt is required".to_string()));
    }

    let max_length = request.max_length.unwrap_or(DEFAULT_MAX_LENGTH);
    let result = state
        .analyzer
        .read()
        .await
        .generate(&request.prompt, max_length)?;

    Ok(Json(json!({
        "status": "success",
        "generated_text": result.generated_text,
        "metrics": result.metrics,
    })))
}

#[derive(Deserialize)]
pub struct LlmEvaluateRequest {
    test_data: Vec<TestItem>,
}

pub async fn evaluate_generation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LlmEvaluateRequest>,
) -> Result<Json<serde_json::Value>> {
    if request.test_data.is_empty() {
        return Err(ServerError::BadRequest("Test data is required".to_string()));
    }

    let report = state
        .analyzer
        .read()
        .await
        .evaluate_batch(&request.test_data)?;

    Ok(Json(json!({
        "status": "success",
        "results": report.results,
        "skipped": report.skipped,
        "summary_metrics": report.summary,
    })))
}

// ============================================================================
// System
// ============================================================================

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "modelbench",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn get_system_status() -> Json<serde_json::Value> {
    Json(AppState::get_system_info())
}
