//! Integration tests for the query API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use carbon_lib::{
    observability::{CarbonMetrics, StructuredLogger},
    DatacenterLocation, Dataset, DistanceModel, EmissionsRecord, HealthRegistry, Session,
};
use carbon_server::api::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn record(dc: &str, subtype: &str, co2e: f64) -> EmissionsRecord {
    EmissionsRecord {
        datacenter: dc.to_string(),
        activity_type: "cpu".to_string(),
        activity_subtype: subtype.to_string(),
        co2e,
    }
}

/// A(0,0) emits 100, B(0,1) emits 80, C(0,90) emits 50; D has GPU records only
fn test_session() -> Session {
    let locations = vec![
        DatacenterLocation::new("a", 0.0, 0.0),
        DatacenterLocation::new("b", 0.0, 1.0),
        DatacenterLocation::new("c", 0.0, 90.0),
        DatacenterLocation::new("d", 0.0, 0.5),
    ];
    let records = vec![
        record("a", "std", 100.0),
        record("b", "std", 80.0),
        record("c", "std", 50.0),
        record("d", "gpu", 10.0),
    ];
    let dataset = Dataset::new(locations, records).unwrap();
    Session::build(dataset, DistanceModel::default(), "in-memory")
}

async fn setup_test_app(install: bool) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        HealthRegistry::new(),
        CarbonMetrics::new(),
        StructuredLogger::new("test-node"),
    ));
    state.register_components().await;
    if install {
        state.install_session(test_session()).await;
    }

    (create_router(state.clone()), state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_queries_unavailable_before_session() {
    let (app, _state) = setup_test_app(false).await;

    let (status, body) = get_json(app.clone(), "/api/v1/datacenters").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "not_ready");

    let (status, _) = post_json(
        app,
        "/api/v1/recommendation",
        json!({ "current_datacenter": "a" }),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_health_before_and_after_session() {
    let (app, _state) = setup_test_app(false).await;
    let (status, body) = get_json(app.clone(), "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");

    let (status, body) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);

    let (app, _state) = setup_test_app(true).await;
    let (status, body) = get_json(app.clone(), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["components"]["distance_index"].is_object());

    let (status, body) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn test_list_datacenters() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = get_json(app, "/api/v1/datacenters").await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = body["datacenters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|dc| dc["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
    assert_eq!(body["datacenters"][0]["mean_co2e"], 100.0);
    assert_eq!(body["subtypes"], json!(["gpu", "std"]));
    assert_eq!(body["activity_types"], json!(["cpu"]));
}

#[tokio::test]
async fn test_recommendation_within_budget() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(
        app,
        "/api/v1/recommendation",
        json!({
            "current_datacenter": "a",
            "subtypes": ["std"],
            "latency_ms": 10.0,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["distance_budget_km"], 818.0);
    assert_eq!(body["current_co2e"], 100.0);
    assert_eq!(body["outcome"]["status"], "alternative");
    assert_eq!(body["outcome"]["datacenter"], "b");
    assert_eq!(body["outcome"]["co2e_delta"], 20.0);
    assert_eq!(body["outcome"]["latency_ms"], 2.22);
    assert!(body.get("savings").is_none());
}

#[tokio::test]
async fn test_recommendation_with_savings() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(
        app,
        "/api/v1/recommendation",
        json!({
            "current_datacenter": "a",
            "subtypes": ["std"],
            "latency_ms": 10.0,
            "usage": {
                "instance_count": 1,
                "cores_per_instance": 4,
                "hours_per_day": 4,
                "days_per_week": 7
            },
            "equivalence": "car_kilometers"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let savings = &body["savings"];
    assert_eq!(savings["target"], "b");
    // 5840 core-hours a year
    assert_eq!(savings["current_annual_co2e_kg"], 584000.0);
    assert_eq!(savings["potential_savings_kg"], 116800.0);
    assert_eq!(savings["equivalence"], "car_kilometers");
}

#[tokio::test]
async fn test_recommendation_nothing_in_range() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(
        app,
        "/api/v1/recommendation",
        json!({
            "current_datacenter": "a",
            "subtypes": ["std"],
            "latency_ms": 1.0,
            "usage": {
                "instance_count": 1,
                "cores_per_instance": 1,
                "hours_per_day": 1,
                "days_per_week": 1
            }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["status"], "no_alternative_in_range");
    assert_eq!(body["savings"]["target"], "(No alternative in range)");
    assert_eq!(body["savings"]["potential_savings_kg"], 0.0);
}

#[tokio::test]
async fn test_recommendation_unknown_datacenter() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(
        app,
        "/api/v1/recommendation",
        json!({ "current_datacenter": "atlantis" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_datacenter");
}

#[tokio::test]
async fn test_recommendation_missing_data() {
    let (app, _state) = setup_test_app(true).await;

    // D only has gpu records
    let (status, body) = post_json(
        app,
        "/api/v1/recommendation",
        json!({ "current_datacenter": "d", "subtypes": ["std"] }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "missing_data");
}

#[tokio::test]
async fn test_recommendation_rejects_bad_usage() {
    let (app, _state) = setup_test_app(true).await;

    let (status, body) = post_json(
        app,
        "/api/v1/recommendation",
        json!({
            "current_datacenter": "a",
            "usage": {
                "instance_count": 1,
                "cores_per_instance": 4,
                "hours_per_day": 25,
                "days_per_week": 7
            }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_usage_profile");
}

#[tokio::test]
async fn test_savings_endpoint() {
    let (app, _state) = setup_test_app(false).await;

    // Savings projections do not need the dataset
    let (status, body) = post_json(
        app.clone(),
        "/api/v1/savings",
        json!({
            "per_core_delta_kg": 1.0,
            "usage": {
                "instance_count": 1,
                "cores_per_instance": 4,
                "hours_per_day": 4,
                "days_per_week": 7
            }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["annual_co2e_kg"], 5840.0);
    assert_eq!(body["equivalent"], "1150.33 km");

    let (status, body) = post_json(
        app,
        "/api/v1/savings",
        json!({
            "per_core_delta_kg": 1.0,
            "usage": {
                "instance_count": 1,
                "cores_per_instance": 4,
                "hours_per_day": 4,
                "days_per_week": 7
            },
            "equivalence": "smartphones_charged"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported_equivalence_kind");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _state) = setup_test_app(true).await;

    let _ = post_json(
        app.clone(),
        "/api/v1/recommendation",
        json!({ "current_datacenter": "a", "latency_ms": 10.0 }),
    )
    .await;

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("carbon_recommendations_total"));
    assert!(text.contains("carbon_datacenters_indexed"));
}

#[tokio::test]
async fn test_rejected_recommendation_counts_as_error() {
    let (app, _state) = setup_test_app(true).await;

    // Valid on its own, D would get "no better alternative" for gpu
    let (status, _) = post_json(
        app.clone(),
        "/api/v1/recommendation",
        json!({
            "current_datacenter": "d",
            "subtypes": ["gpu"],
            "latency_ms": 10.0,
            "usage": {
                "instance_count": 1,
                "cores_per_instance": 4,
                "hours_per_day": 25,
                "days_per_week": 7
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(app, request).await;
    let text = String::from_utf8(body).unwrap();

    assert!(text.contains(r#"carbon_query_errors_total{kind="invalid_usage_profile"}"#));
    assert!(!text.contains(r#"outcome="no_better_alternative_in_range""#));
}
