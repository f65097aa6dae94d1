//! Shared fixtures for API tests

#![allow(dead_code)]

use std::io::Write;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use flowguard_inference::logic::features::FeatureSchema;
use flowguard_inference::logic::model::{load_model, LoadedModel};
use flowguard_inference::{create_router, AppState, Config};

pub const BOUNDARY: &str = "flowguard-test-boundary";

/// Feature indices in the built-in CIC-IDS2017 layout
pub const DESTINATION_PORT: i64 = 0;
pub const FLOW_DURATION: i64 = 1;
pub const SYN_FLAG_COUNT: i64 = 44;

pub fn stump(feature: i64, threshold: f32, left: f32, right: f32) -> Value {
    json!({
        "left_children": [1, -1, -1],
        "right_children": [2, -1, -1],
        "split_indices": [feature, 0, 0],
        "split_conditions": [threshold, left, right],
        "default_left": [1, 0, 0],
        "split_type": [0, 0, 0]
    })
}

/// 15-class model over 79 inputs:
/// well-known port → BENIGN, SYN flag → PortScan, long flow → DDoS
pub fn ids_model_json() -> Value {
    json!({
        "learner": {
            "learner_model_param": {"base_score": "5E-1", "num_class": "15", "num_feature": "79"},
            "objective": {"name": "multi:softprob", "softmax_multiclass_param": {"num_class": "15"}},
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "gbtree_model_param": {"num_trees": "3"},
                    "trees": [
                        stump(DESTINATION_PORT, 1024.0, 3.0, -1.0),
                        stump(SYN_FLAG_COUNT, 0.5, -1.0, 5.0),
                        stump(FLOW_DURATION, 1.0e6, -1.0, 4.0)
                    ],
                    "tree_info": [0, 10, 2]
                }
            }
        },
        "version": [2, 0, 3]
    })
}

/// Write JSON to a temp file with the given suffix
pub fn write_temp(suffix: &str, content: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(content).expect("write temp file");
    file
}

pub fn load_fixture_model(doc: &Value) -> LoadedModel {
    let file = write_temp(".json", doc.to_string().as_bytes());
    load_model(file.path(), None).expect("load fixture model")
}

/// Router with the built-in schema and the fixture model
pub fn app_with_model() -> Router {
    let model = load_fixture_model(&ids_model_json());
    create_router(AppState::new(
        Config::default(),
        FeatureSchema::cic_ids2017(),
        Some(model),
    ))
}

pub fn app_without_model() -> Router {
    create_router(AppState::without_model(Config::default()))
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

pub fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .expect("build request")
}

/// multipart/form-data request with one file field
pub fn post_upload(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/predict_csv")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("build request")
}
