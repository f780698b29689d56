//! Integration test: full HTTP flow against an in-memory database

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use tower::ServiceExt;

use spiral_screen::config::{AppConfig, AuthConfig, GatewayConfig, ModelConfig};
use spiral_screen::imaging::ImageTensor;
use spiral_screen::inference::{ClassifierError, ClassifierHandle, ProbabilityModel};
use spiral_screen::{AppState, Database, build_router};

const BOUNDARY: &str = "----spiral-screen-test-boundary";

/// Replays queued probability pairs, repeating the last one once drained.
struct ScriptedModel {
    outputs: Mutex<VecDeque<Vec<f32>>>,
    last: Mutex<Vec<f32>>,
}

impl ScriptedModel {
    fn new(outputs: Vec<Vec<f32>>) -> Self {
        let last = outputs.last().cloned().unwrap_or_else(|| vec![0.5, 0.5]);
        Self {
            outputs: Mutex::new(outputs.into()),
            last: Mutex::new(last),
        }
    }
}

impl ProbabilityModel for ScriptedModel {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        assert_eq!(input.shape(), [1, 224, 224, 3]);
        let next = self.outputs.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.last.lock().unwrap().clone()))
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        log_level: "info".to_string(),
        log_dir: "./logs".to_string(),
        log_file: "test.log".to_string(),
        use_json: false,
        rotation: "never".to_string(),
        gateway: GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_upload_bytes: 1024 * 1024,
        },
        database_url: "sqlite::memory:".to_string(),
        model: ModelConfig::default(),
        auth: AuthConfig {
            jwt_secret: "integration-test-secret".to_string(),
            token_ttl_minutes: 30,
            hash_memory_kib: Some(1024),
            hash_iterations: Some(1),
        },
    }
}

async fn test_app(classifier: ClassifierHandle) -> (Arc<AppState>, axum::Router) {
    test_app_with_limit(classifier, test_config().gateway.max_upload_bytes).await
}

async fn test_app_with_limit(
    classifier: ClassifierHandle,
    max_upload_bytes: usize,
) -> (Arc<AppState>, axum::Router) {
    let config = test_config();
    let db = Database::connect_in_memory().await.unwrap();
    let state = Arc::new(AppState::assemble(&config, db, classifier).unwrap());
    let router = build_router(state.clone(), max_upload_bytes);
    (state, router)
}

fn scripted(outputs: Vec<Vec<f32>>) -> ClassifierHandle {
    ClassifierHandle::new(Arc::new(ScriptedModel::new(outputs)))
}

fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

fn multipart_body(patient_name: &str, patient_age: &str, filename: &str, image: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in [("patient_name", patient_name), ("patient_age", patient_age)] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn form_request(uri: &str, username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={}&password={}", username, password)))
        .unwrap()
}

async fn register(app: &axum::Router, username: &str, password: &str) -> StatusCode {
    send(app, form_request("/api/v1/auth/register", username, password))
        .await
        .0
}

async fn login(app: &axum::Router, username: &str, password: &str) -> Value {
    let (status, json) = send(app, form_request("/api/v1/auth/token", username, password)).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", json);
    json["data"].clone()
}

async fn predict(
    app: &axum::Router,
    token: &str,
    patient_name: &str,
    patient_age: &str,
    image: &[u8],
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/screening/predict")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(
            patient_name,
            patient_age,
            "spiral.jpg",
            image,
        )))
        .unwrap();
    send(app, req).await
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[tokio::test]
async fn test_doctor_register_login_predict_history() {
    let (_state, app) = test_app(scripted(vec![vec![0.1, 0.9]])).await;

    assert_eq!(register(&app, "alice123", "hunter2pass").await, StatusCode::CREATED);

    let token = login(&app, "alice123", "hunter2pass").await;
    assert_eq!(token["role"], "doctor");
    assert_eq!(token["token_type"], "bearer");
    let access_token = token["access_token"].as_str().unwrap().to_string();

    let (status, json) = predict(&app, &access_token, "Jane Doe", "63", &sample_jpeg(300, 400)).await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    let data = &json["data"];
    assert_eq!(data["patient"], "Jane Doe");
    assert!(matches!(data["prediction"].as_str(), Some("Healthy" | "Parkinson")));
    let confidence = data["confidence"].as_f64().unwrap();
    assert!((50.0..=100.0).contains(&confidence));
    assert_eq!(data["prediction"], "Parkinson");
    assert_eq!(confidence, 90.0);

    let (status, json) = send(&app, get_with_token("/api/v1/screening/history", &access_token)).await;
    assert_eq!(status, StatusCode::OK);
    let history = json["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["patient_name"], "Jane Doe");
    assert_eq!(history[0]["patient_age"], 63);
    assert_eq!(history[0]["filename"], "spiral.jpg");
    assert_eq!(history[0]["label"], "Parkinson");
}

#[tokio::test]
async fn test_admin_stats_and_doctor_forbidden() {
    let (state, app) = test_app(scripted(vec![
        vec![0.2, 0.8],
        vec![0.7, 0.3],
        vec![0.4, 0.6],
        vec![0.9, 0.1],
        vec![0.05, 0.95],
    ]))
    .await;

    state
        .user_auth
        .provision_admin("admin1", "admin-pass")
        .await
        .unwrap();
    assert_eq!(register(&app, "alice123", "hunter2pass").await, StatusCode::CREATED);
    assert_eq!(register(&app, "bob456", "swordfish").await, StatusCode::CREATED);

    let alice = login(&app, "alice123", "hunter2pass").await["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    let bob = login(&app, "bob456", "swordfish").await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let image = sample_jpeg(120, 90);
    for (token, patient) in [
        (&alice, "P1"),
        (&alice, "P2"),
        (&bob, "P3"),
        (&bob, "P4"),
        (&bob, "P5"),
    ] {
        let (status, json) = predict(&app, token, patient, "70", &image).await;
        assert_eq!(status, StatusCode::OK, "{}", json);
    }

    let admin = login(&app, "admin1", "admin-pass").await;
    assert_eq!(admin["role"], "admin");
    let admin_token = admin["access_token"].as_str().unwrap();

    let (status, json) = send(&app, get_with_token("/api/v1/admin/stats", admin_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["data"],
        serde_json::json!({
            "total_users": 3,
            "total_predictions": 5,
            "parkinson_cases": 3,
            "healthy_cases": 2,
        })
    );

    let (status, json) = send(&app, get_with_token("/api/v1/admin/stats", &alice)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], 2004);

    // History is scoped to the caller
    let (_, json) = send(&app, get_with_token("/api/v1/screening/history", &alice)).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

// ============================================================================
// Failure paths
// ============================================================================

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (_state, app) = test_app(ClassifierHandle::unavailable()).await;

    assert_eq!(register(&app, "alice123", "hunter2pass").await, StatusCode::CREATED);
    assert_eq!(register(&app, "alice123", "other").await, StatusCode::CONFLICT);

    // The first secret still works
    login(&app, "alice123", "hunter2pass").await;
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_look_the_same() {
    let (_state, app) = test_app(ClassifierHandle::unavailable()).await;
    register(&app, "alice123", "hunter2pass").await;

    let (s1, j1) = send(&app, form_request("/api/v1/auth/token", "alice123", "nope")).await;
    let (s2, j2) = send(&app, form_request("/api/v1/auth/token", "nobody", "nope")).await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s1, s2);
    assert_eq!(j1, j2);
}

#[tokio::test]
async fn test_incomplete_form_gets_error_envelope() {
    let (_state, app) = test_app(ClassifierHandle::unavailable()).await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=alice123"))
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 1001);
    assert!(json["msg"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (_state, app) = test_app(ClassifierHandle::unavailable()).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/screening/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

    let (status, _) = send(&app, get_with_token("/api/v1/admin/stats", "not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_image_is_rejected_and_not_recorded() {
    let (_state, app) = test_app(scripted(vec![vec![0.5, 0.5]])).await;
    register(&app, "alice123", "hunter2pass").await;
    let token = login(&app, "alice123", "hunter2pass").await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, json) = predict(&app, &token, "Jane Doe", "63", b"definitely not an image").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 1002);

    let (_, json) = send(&app, get_with_token("/api/v1/screening/history", &token)).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_numeric_age_is_invalid_input() {
    let (_state, app) = test_app(scripted(vec![vec![0.5, 0.5]])).await;
    register(&app, "alice123", "hunter2pass").await;
    let token = login(&app, "alice123", "hunter2pass").await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, json) = predict(&app, &token, "Jane Doe", "sixty", &sample_jpeg(64, 64)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], 1001);
}

#[tokio::test]
async fn test_oversized_upload_is_413_and_not_recorded() {
    let (_state, app) = test_app_with_limit(scripted(vec![vec![0.3, 0.7]]), 4096).await;
    register(&app, "alice123", "hunter2pass").await;
    let token = login(&app, "alice123", "hunter2pass").await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let oversized = vec![0xAB_u8; 20_000];
    let (status, json) = predict(&app, &token, "Jane Doe", "63", &oversized).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{}", json);
    assert_eq!(json["code"], 1004);

    let (_, json) = send(&app, get_with_token("/api/v1/screening/history", &token)).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    // Uploads under the limit still go through
    let (status, json) = predict(&app, &token, "Jane Doe", "63", &sample_jpeg(16, 16)).await;
    assert_eq!(status, StatusCode::OK, "{}", json);
}

#[tokio::test]
async fn test_missing_model_returns_503() {
    let (_state, app) = test_app(ClassifierHandle::unavailable()).await;
    register(&app, "alice123", "hunter2pass").await;
    let token = login(&app, "alice123", "hunter2pass").await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, json) = predict(&app, &token, "Jane Doe", "63", &sample_jpeg(64, 64)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], 5001);
}

#[tokio::test]
async fn test_health_reports_model_state() {
    let (_state, app) = test_app(ClassifierHandle::unavailable()).await;

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["database"], true);
    assert_eq!(json["data"]["model_loaded"], false);
}
