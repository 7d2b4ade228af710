//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use textserve_core::{Error, Label};
use tracing::{debug, error, info, warn};

use crate::state::{build_loader, AppState};

/// Greeting returned by the root route
pub const RUNNING_MESSAGE: &str = "Text classification API is running!";

/// Message returned by `/test-load` on success
pub const LOAD_OK_MESSAGE: &str = "Model and vectorizer loaded successfully!";

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root).fallback(method_not_allowed))
        .route("/predict", post(predict).fallback(method_not_allowed))
        .route("/debug-files", get(debug_files).fallback(method_not_allowed))
        .route("/test-load", get(test_load).fallback(method_not_allowed))
        .route("/health", get(health_check).fallback(method_not_allowed))
        .route("/metrics", get(metrics).fallback(method_not_allowed))
        .fallback(fallback)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": RUNNING_MESSAGE }))
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "model_loaded": state.model.is_loaded(),
    }))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics exporter not installed").into_response(),
    }
}

/// Prediction request body
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub text: String,
}

/// Prediction response body: one label per input row
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: Vec<Label>,
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, AppError> {
    let Json(request) = payload?;

    let model = match state.model.model() {
        Ok(model) => model.clone(),
        Err(e) => {
            record_prediction("unavailable");
            warn!("Prediction requested but no model is loaded");
            return Err(e.into());
        }
    };

    debug!("Predicting for text of {} bytes", request.text.len());
    let start = Instant::now();

    let result = tokio::task::spawn_blocking(move || model.predict(&request.text))
        .await
        .map_err(|e| {
            record_prediction("error");
            error!("Prediction task failed: {}", e);
            AppError::Internal(e.to_string())
        })?;

    metrics::histogram!("textserve_prediction_latency_us")
        .record(start.elapsed().as_micros() as f64);

    match result {
        Ok(prediction) => {
            record_prediction("ok");
            debug!("Prediction: {:?}", prediction);
            Ok(Json(PredictionResponse { prediction }))
        }
        Err(e) => {
            record_prediction("error");
            warn!("{}", e);
            Err(e.into())
        }
    }
}

fn record_prediction(outcome: &'static str) {
    metrics::counter!("textserve_predictions_total", "outcome" => outcome).increment(1);
}

/// File-presence report for the configured artifact paths
#[derive(Debug, Serialize, Deserialize)]
pub struct DebugFiles {
    pub model_path: String,
    pub vectorizer_path: String,
    pub model_exists: bool,
    pub vectorizer_exists: bool,
    pub current_directory: String,
    pub files_in_directory: Vec<String>,
}

async fn debug_files(State(state): State<AppState>) -> Result<Json<DebugFiles>, AppError> {
    let artifacts = &state.config.artifacts;
    let cwd = std::env::current_dir().map_err(|e| AppError::Internal(e.to_string()))?;

    let mut files_in_directory = Vec::new();
    let mut entries = tokio::fs::read_dir(&cwd)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    {
        files_in_directory.push(entry.file_name().to_string_lossy().into_owned());
    }
    files_in_directory.sort();

    Ok(Json(DebugFiles {
        model_path: artifacts.model_path.display().to_string(),
        vectorizer_path: artifacts.vectorizer_path.display().to_string(),
        model_exists: tokio::fs::try_exists(&artifacts.model_path)
            .await
            .unwrap_or(false),
        vectorizer_exists: tokio::fs::try_exists(&artifacts.vectorizer_path)
            .await
            .unwrap_or(false),
        current_directory: cwd.display().to_string(),
        files_in_directory,
    }))
}

/// Load the artifacts again without touching the serving model
async fn test_load(State(state): State<AppState>) -> Json<serde_json::Value> {
    let outcome = match &state.loader {
        Some(loader) => loader.load().await.map(|_| ()),
        None => build_loader(&state.config).map(|_| ()),
    };

    match outcome {
        Ok(()) => {
            info!("Test load succeeded");
            Json(json!({ "message": LOAD_OK_MESSAGE }))
        }
        Err(e) => {
            warn!("Test load failed: {}", e);
            Json(json!({ "error": e.to_string() }))
        }
    }
}

async fn fallback() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))).into_response()
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "detail": "Method Not Allowed" })),
    )
        .into_response()
}

/// Request-level errors, rendered as `{"detail": ...}`
#[derive(Debug)]
pub enum AppError {
    /// Body could not be extracted (bad JSON, missing field, wrong content type)
    Validation { status: StatusCode, detail: String },
    /// No model is loaded
    Unavailable(String),
    /// Transform or predict failed for this input
    PredictionFailed(String),
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::ServiceUnavailable(msg) => AppError::Unavailable(msg),
            Error::PredictionFailed(msg) => AppError::PredictionFailed(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::Validation { status, detail } => (status, detail),
            AppError::Unavailable(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::PredictionFailed(msg) => {
                (StatusCode::BAD_REQUEST, format!("Prediction failed: {msg}"))
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
