//! API route definitions

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers, state::AppState, ServerConfig};

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": true,
            "message": "Not found. See /api/health for API status.",
        })),
    )
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let api_routes = Router::new()
        // Datasets
        .route("/data/upload", post(handlers::upload_dataset))
        .route("/data/info", get(handlers::dataset_info))
        // Models
        .route("/models/upload", post(handlers::upload_model))
        // Evaluation and training
        .route("/evaluate", post(handlers::evaluate_model))
        .route("/train", post(handlers::train_baseline))
        // Record repositories
        .route(
            "/benchmarks",
            get(handlers::list_benchmarks).post(handlers::record_benchmark),
        )
        .route(
            "/library",
            get(handlers::list_library).post(handlers::record_library_entry),
        )
        // Text generation
        .route("/llm/load", post(handlers::load_llm_model))
        .route("/llm/analyze", post(handlers::analyze_generation))
        .route("/llm/evaluate", post(handlers::evaluate_generation))
        // System
        .route("/health", get(handlers::health_check))
        .route("/system/status", get(handlers::get_system_status))
        .fallback(handle_404);

    // CORS configured via CORS_ORIGIN env var (default: allow all for
    // machine-local use)
    let cors = match std::env::var("CORS_ORIGIN") {
        Ok(origin) if !origin.is_empty() && origin != "*" => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<axum::http::HeaderValue>()
                    .unwrap_or_else(|_| axum::http::HeaderValue::from_static("*")),
            )
            .allow_methods(Any)
            .allow_headers(Any),
        _ => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    Router::new()
        .nest("/api", api_routes)
        .fallback(handle_404)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
