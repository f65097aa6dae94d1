//! API tests driving the router end to end

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;
use flowguard_inference::logic::features::FeatureSchema;
use flowguard_inference::{create_router, AppState, Config};

// ============================================================================
// HEALTH / CATALOGUE
// ============================================================================

#[tokio::test]
async fn test_health_reports_model_state() {
    let (status, body) = send(app_with_model(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());

    let (status, body) = send(app_without_model(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_attack_types_catalogue() {
    let (status, body) = send(app_without_model(), get("/attack_types")).await;
    assert_eq!(status, StatusCode::OK);

    let catalogue = body.as_object().unwrap();
    assert_eq!(catalogue.len(), 15);
    assert_eq!(catalogue["0"], "BENIGN");
    assert_eq!(catalogue["10"], "PortScan");
    assert_eq!(catalogue["13"], "Web Attack  SQL Injection");
}

#[tokio::test]
async fn test_model_info() {
    let (status, body) = send(app_with_model(), get("/model_info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_type"], "XGBClassifier");
    assert_eq!(body["feature_count"], 79);
    assert_eq!(body["classes"], 15);
    assert_eq!(body["attack_types"]["2"], "DDoS");
    assert_eq!(body["model_format"], "xgboost");
    assert_eq!(body["schema_columns"], 78);
    assert_eq!(body["model_sha256"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_model_info_without_model() {
    let (status, body) = send(app_without_model(), get("/model_info")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Model not loaded", "status": 500}));
}

// ============================================================================
// SINGLE PREDICTION
// ============================================================================

#[tokio::test]
async fn test_predict_benign() {
    let request = post_json("/predict", json!({"Destination Port": 80, "Flow Duration": 1200}).to_string());
    let (status, body) = send(app_with_model(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], 0);
    assert_eq!(body["attack_type"], "BENIGN");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&confidence));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_predict_portscan() {
    let request = post_json("/predict", json!({"Destination Port": 8080, "SYN Flag Count": 1}).to_string());
    let (status, body) = send(app_with_model(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], 10);
    assert_eq!(body["attack_type"], "PortScan");
    assert!(body["confidence"].as_f64().unwrap() > 50.0);
}

#[tokio::test]
async fn test_predict_accepts_numeric_strings() {
    let request = post_json(
        "/predict",
        json!({"Destination Port": "8080", "Flow Duration": "2e6", "Label": "ignored"}).to_string(),
    );
    let (status, body) = send(app_with_model(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attack_type"], "DDoS");
}

#[tokio::test]
async fn test_predict_no_data() {
    for payload in ["", "{}"] {
        let (status, body) = send(app_with_model(), post_json("/predict", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No data provided");
    }
}

#[tokio::test]
async fn test_predict_invalid_value() {
    let request = post_json("/predict", json!({"Flow Duration": "slow"}).to_string());
    let (status, body) = send(app_with_model(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Flow Duration"));
}

#[tokio::test]
async fn test_predict_without_model() {
    let request = post_json("/predict", json!({"Flow Duration": 1}).to_string());
    let (status, body) = send(app_without_model(), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Model not loaded");
}

#[tokio::test]
async fn test_predict_schema_model_mismatch_is_server_error() {
    // Two-column schema, 79-input model: no padding applies
    let schema = FeatureSchema::new(["a", "b"], &[], "test").unwrap();
    let model = load_fixture_model(&ids_model_json());
    let app = create_router(AppState::new(Config::default(), schema, Some(model)));

    let (status, body) = send(app, post_json("/predict", json!({"a": 1}).to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Feature shape mismatch, expected: 79, got 2");
}

#[tokio::test]
async fn test_predict_overflowing_margin_is_server_error() {
    // Two leaves near f32::MAX in the same class overflow to +inf
    let schema = FeatureSchema::new(["a"], &[], "test").unwrap();
    let model = load_fixture_model(&json!({
        "learner": {
            "learner_model_param": {"base_score": "5E-1", "num_class": "3", "num_feature": "1"},
            "objective": {"name": "multi:softprob"},
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "trees": [stump(0, 0.5, 3.0e38, 3.0e38), stump(0, 0.5, 3.0e38, 3.0e38)],
                    "tree_info": [0, 0]
                }
            }
        }
    }));
    let app = create_router(AppState::new(Config::default(), schema, Some(model)));

    let (status, body) = send(app, post_json("/predict", json!({"a": 1}).to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("non-finite"));
}

// ============================================================================
// CSV PREDICTION
// ============================================================================

#[tokio::test]
async fn test_predict_csv() {
    let csv = b"Unnamed: 0, Destination Port, SYN Flag Count, Flow Duration,Label\n\
0,80,0,100,BENIGN\n\
1,8080,1,100,PortScan\n\
2,8080,0,5000000,DDoS\n";
    let (status, body) = send(app_with_model(), post_upload("file", "flows.csv", csv)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_predictions"], 3);

    let results = body["results"].as_array().unwrap();
    let labels: Vec<_> = results.iter().map(|r| r["label"].as_u64().unwrap()).collect();
    assert_eq!(labels, vec![0, 10, 2]);
    let rows: Vec<_> = results.iter().map(|r| r["row"].as_u64().unwrap()).collect();
    assert_eq!(rows, vec![1, 2, 3]);
    assert_eq!(results[2]["attack_type"], "DDoS");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_predict_csv_handles_infinity_and_blanks() {
    let csv = b"Destination Port,Flow Bytes/s,Flow Duration\n443,Infinity,\n";
    let (status, body) = send(app_with_model(), post_upload("file", "FLOWS.CSV", csv)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["label"], 0);
}

#[tokio::test]
async fn test_predict_csv_short_rows_are_padded() {
    let csv = b"Destination Port,SYN Flag Count,Flow Duration\n8080,1,100\n80\n";
    let (status, body) = send(app_with_model(), post_upload("file", "flows.csv", csv)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_predictions"], 2);
    assert_eq!(body["results"][0]["attack_type"], "PortScan");
    assert_eq!(body["results"][1]["attack_type"], "BENIGN");
}

#[tokio::test]
async fn test_predict_csv_long_row_rejected() {
    let csv = b"Destination Port,Flow Duration\n80,100\n80,100,7\n";
    let (status, body) = send(app_with_model(), post_upload("file", "flows.csv", csv)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Error reading CSV"));
}

#[tokio::test]
async fn test_predict_csv_upload_errors() {
    let cases = [
        ("data", "flows.csv", &b"a\n1\n"[..], "No file uploaded"),
        ("file", "", &b"a\n1\n"[..], "No file selected"),
        ("file", "flows.txt", &b"a\n1\n"[..], "File must be a CSV"),
        ("file", "flows.csv", &b"Destination Port,Flow Duration\n"[..], "CSV file is empty"),
    ];

    for (field, name, content, expected) in cases {
        let (status, body) = send(app_with_model(), post_upload(field, name, content)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "case {expected}");
        assert_eq!(body["error"], expected);
    }
}

#[tokio::test]
async fn test_predict_csv_invalid_utf8() {
    let (status, body) = send(
        app_with_model(),
        post_upload("file", "flows.csv", b"Destination Port\n\xff\xfe\n"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Error reading CSV"));
}

#[tokio::test]
async fn test_predict_csv_not_multipart() {
    let (status, body) = send(app_with_model(), post_json("/predict_csv", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_predict_csv_invalid_cell_reports_row() {
    let csv = b"Destination Port\n80\nnot-a-port\n";
    let (status, body) = send(app_with_model(), post_upload("file", "flows.csv", csv)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at row 2"));
}

#[tokio::test]
async fn test_predict_csv_without_model() {
    let (status, body) = send(
        app_without_model(),
        post_upload("file", "flows.csv", b"a\n1\n"),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Model not loaded");
}

// ============================================================================
// REFERENCE SCHEMA
// ============================================================================

#[tokio::test]
async fn test_reference_schema_with_dummy_padding() {
    // Reference CSV with two features; model trained on three (dummy last)
    let reference = write_temp(".csv", b"Unnamed: 0,x,y,Label,Label_Encoded\n0,1,2,BENIGN,0\n");
    let schema =
        FeatureSchema::from_reference_csv(reference.path(), &Config::default().excluded_columns)
            .unwrap();
    assert_eq!(schema.len(), 2);

    let model = load_fixture_model(&json!({
        "learner": {
            "learner_model_param": {"base_score": "5E-1", "num_class": "15", "num_feature": "3"},
            "objective": {"name": "multi:softprob"},
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "trees": [{
                        "left_children": [1, -1, -1],
                        "right_children": [2, -1, -1],
                        "split_indices": [1, 0, 0],
                        "split_conditions": [10.0, -1.0, 6.0],
                        "default_left": [0, 0, 0]
                    }],
                    "tree_info": [8]
                }
            }
        }
    }));
    let app = create_router(AppState::new(Config::default(), schema, Some(model)));

    let (status, body) = send(app.clone(), post_json("/predict", json!({"y": 50}).to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attack_type"], "Heartbleed");

    let (status, body) = send(app, get("/model_info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feature_count"], 3);
    assert_eq!(body["schema_columns"], 2);
}
