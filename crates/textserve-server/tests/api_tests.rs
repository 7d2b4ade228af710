//! HTTP API tests
//!
//! Drives the full router (layers included) with `oneshot` requests against
//! artifacts written to a temporary directory.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use textserve_classifiers::{
    ClassifierArtifact, CountVectorizerParams, LinearClassifierParams, VectorizerArtifact,
    MODEL_NOT_LOADED,
};
use textserve_core::Label;
use textserve_server::app::MAX_BODY_BYTES;
use textserve_server::routes::{LOAD_OK_MESSAGE, RUNNING_MESSAGE};
use textserve_server::{build_app, AppState, ServerConfig};
use tower::ServiceExt;

struct Fixture {
    _dir: tempfile::TempDir,
    model_path: PathBuf,
    vectorizer_path: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("api").join("finalized_model.sav");
        let vectorizer_path = dir.path().join("api").join("count_vectorizer.sav");
        std::fs::create_dir_all(dir.path().join("api")).unwrap();
        Self {
            _dir: dir,
            model_path,
            vectorizer_path,
        }
    }

    /// Spam filter over a four-term vocabulary
    fn with_spam_model(self) -> Self {
        write_vectorizer(&self.vectorizer_path, &["invoice", "winner", "prize", "schedule"]);
        write_linear(&self.model_path, vec![-1.0, 2.0, 2.0, -1.0]);
        self
    }

    fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.artifacts.model_path = self.model_path.clone();
        config.artifacts.vectorizer_path = self.vectorizer_path.clone();
        config
    }

    async fn app(&self) -> Router {
        build_app(AppState::initialize(self.config(), None).await)
    }
}

fn write_vectorizer(path: &Path, terms: &[&str]) {
    let vocabulary = terms
        .iter()
        .enumerate()
        .map(|(i, t)| (t.to_string(), i))
        .collect();
    let bytes = VectorizerArtifact::Count(CountVectorizerParams::with_vocabulary(vocabulary))
        .encode()
        .unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn write_linear(path: &Path, coef: Vec<f32>) {
    let bytes = ClassifierArtifact::Linear(LinearClassifierParams {
        classes: vec![Label::text("ham"), Label::text("spam")],
        coef: vec![coef],
        intercept: vec![-0.5],
    })
    .encode()
    .unwrap();
    std::fs::write(path, bytes).unwrap();
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, body: impl Into<String>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_root_reports_running() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": RUNNING_MESSAGE }));
}

#[tokio::test]
async fn test_predict_returns_single_label() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let (status, body) = post_json(&app, r#"{"text": "You are a WINNER! Claim your prize"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "prediction": ["spam"] }));

    let (status, body) = post_json(&app, r#"{"text": "Invoice and schedule attached"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "prediction": ["ham"] }));
}

#[tokio::test]
async fn test_predict_is_idempotent() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let text = json!({ "text": "prize schedule winner" }).to_string();
    let first = post_json(&app, text.clone()).await;
    let second = post_json(&app, text).await;
    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(first.1["prediction"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_predict_empty_text_still_predicts() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let (status, body) = post_json(&app, r#"{"text": ""}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "prediction": ["ham"] }));
}

#[tokio::test]
async fn test_missing_artifacts_refuse_predictions() {
    let fixture = Fixture::new();
    let app = fixture.app().await;

    let (status, body) = post_json(&app, r#"{"text": "hello"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": MODEL_NOT_LOADED }));

    let (status, _) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "model_loaded": false }));
}

#[tokio::test]
async fn test_corrupt_artifact_refuses_predictions() {
    let fixture = Fixture::new().with_spam_model();
    std::fs::write(&fixture.model_path, b"\x80\x04\x95not-an-artifact").unwrap();
    let app = fixture.app().await;

    let (status, body) = post_json(&app, r#"{"text": "hello"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], MODEL_NOT_LOADED);
}

#[tokio::test]
async fn test_swapped_artifacts_refuse_predictions() {
    let fixture = Fixture::new().with_spam_model();
    let vectorizer = std::fs::read(&fixture.vectorizer_path).unwrap();
    let classifier = std::fs::read(&fixture.model_path).unwrap();
    std::fs::write(&fixture.vectorizer_path, classifier).unwrap();
    std::fs::write(&fixture.model_path, vectorizer).unwrap();

    let state = AppState::initialize(fixture.config(), None).await;
    assert!(state
        .model
        .unavailable_reason()
        .unwrap()
        .contains("artifact corrupt"));
}

#[tokio::test]
async fn test_missing_text_field_is_unprocessable() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let (status, body) = post_json(&app, r#"{"message": "hello"}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("text"));

    let (status, _) = post_json(&app, r#"{"text": 42}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let (status, body) = post_json(&app, r#"{"text": "unterminated"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_missing_content_type_is_unsupported() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .body(Body::from(r#"{"text": "hello"}"#))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_feature_mismatch_is_prediction_failure() {
    let fixture = Fixture::new();
    write_vectorizer(&fixture.vectorizer_path, &["one", "two", "three"]);
    write_linear(&fixture.model_path, vec![1.0, -1.0]);
    let app = fixture.app().await;

    let (status, body) = post_json(&app, r#"{"text": "one two three"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Prediction failed: "), "{detail}");
    assert!(detail.contains("3 features"), "{detail}");
}

#[tokio::test]
async fn test_debug_files_tracks_artifact_presence() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let (status, body) = get(&app, "/debug-files").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_exists"], true);
    assert_eq!(body["vectorizer_exists"], true);
    assert_eq!(
        body["model_path"],
        fixture.model_path.display().to_string()
    );
    assert!(body["current_directory"].is_string());
    assert!(body["files_in_directory"].is_array());

    std::fs::remove_file(&fixture.model_path).unwrap();

    let (_, body) = get(&app, "/debug-files").await;
    assert_eq!(body["model_exists"], false);
    assert_eq!(body["vectorizer_exists"], true);
}

#[tokio::test]
async fn test_test_load_does_not_replace_serving_model() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let (status, body) = get(&app, "/test-load").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": LOAD_OK_MESSAGE }));

    std::fs::remove_file(&fixture.model_path).unwrap();

    let (status, body) = get(&app, "/test-load").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("finalized_model.sav"));

    // The model loaded at startup keeps serving
    let (status, body) = post_json(&app, r#"{"text": "winner"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "prediction": ["spam"] }));
}

#[tokio::test]
async fn test_health_reports_loaded_model() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "model_loaded": true }));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let (status, body) = get(&app, "/predictions").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Not Found");
}

#[tokio::test]
async fn test_wrong_method_is_json_method_not_allowed() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let (status, body) = get(&app, "/predict").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "detail": "Method Not Allowed" }));

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["detail"], "Method Not Allowed");
}

#[tokio::test]
async fn test_oversized_body_is_json_payload_too_large() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let text = "a".repeat(2 * MAX_BODY_BYTES);
    let (status, body) = post_json(&app, json!({ "text": text }).to_string()).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["detail"].is_string());

    // Just under the limit is still served
    let text = "a".repeat(MAX_BODY_BYTES - 64);
    let (status, _) = post_json(&app, json!({ "text": text }).to_string()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let request = Request::get("/")
        .header(header::ORIGIN, "https://frontend.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_cors_restricted_to_configured_origins() {
    let fixture = Fixture::new().with_spam_model();
    let mut config = fixture.config();
    config.cors.allow_origins = vec!["https://app.example.com".to_string()];
    let app = build_app(AppState::initialize(config, None).await);

    let allowed = Request::get("/")
        .header(header::ORIGIN, "https://app.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(allowed).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example.com"
    );

    let denied = Request::get("/")
        .header(header::ORIGIN, "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(denied).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_metrics_without_exporter_is_not_found() {
    let fixture = Fixture::new().with_spam_model();
    let app = fixture.app().await;

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
