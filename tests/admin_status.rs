//! RPC boundary: routes, JSON shapes and admin calls

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::cluster;
use minijudge::coordinator::http::{create_router, node_liveness_router, CoordState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn router(ids: &[u32]) -> Router {
    create_router(CoordState {
        coordinator: cluster(ids),
    })
}

async fn call(app: &Router, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_cluster_status_uses_string_node_keys() {
    let app = router(&[1, 2, 3]);
    let (status, body) = call(&app, "GET", "/get_cluster_status", None).await;
    assert_eq!(status, StatusCode::OK);
    let nodes = body["nodes"].as_object().unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(body["nodes"]["1"]["alive"], json!(true));
    assert_eq!(body["nodes"]["2"]["load"], json!(0));
    assert_eq!(body["nodes"]["3"]["port"], json!(9103));
}

#[tokio::test]
async fn test_submit_code_returns_output_string() {
    let app = router(&[1, 2]);
    let (status, body) = call(
        &app,
        "POST",
        "/submit_code",
        Some(json!({ "code": "print('hello')", "tests": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("hello\n"));

    let (_, body) = call(&app, "POST", "/submit_code", Some(json!({ "code": "raise:bad" }))).await;
    assert_eq!(body, json!("ERROR: bad"));
}

#[tokio::test]
async fn test_crash_and_recover_unknown_node() {
    let app = router(&[1, 2]);
    let (status, body) = call(&app, "POST", "/crash_node", Some(json!({ "node_id": 99 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(false));

    let (_, body) = call(&app, "POST", "/recover_node", Some(json!({ "node_id": 99 }))).await;
    assert_eq!(body, json!(false));
}

#[tokio::test]
async fn test_crash_leader_then_force_election() {
    let app = router(&[1, 2, 3]);
    let (_, body) = call(&app, "POST", "/force_election", None).await;
    assert_eq!(body, json!(3));

    let (_, body) = call(&app, "POST", "/crash_node", Some(json!({ "node_id": 3 }))).await;
    assert_eq!(body, json!(true));

    let (_, body) = call(&app, "GET", "/get_cluster_status", None).await;
    assert_eq!(body["leader"], json!(2));
    assert_eq!(body["nodes"]["3"]["alive"], json!(false));

    let (_, body) = call(&app, "POST", "/recover_node", Some(json!({ "node_id": 3 }))).await;
    assert_eq!(body, json!(true));
    let (_, body) = call(&app, "POST", "/force_election", None).await;
    assert_eq!(body, json!(3));
}

#[tokio::test]
async fn test_list_problems_and_replicas() {
    let app = router(&[1, 2]);
    let (_, problems) = call(&app, "GET", "/list_problems", None).await;
    assert!(problems["two-sum"]["title"].is_string());

    let (status, body) = call(
        &app,
        "POST",
        "/replicate_problem",
        Some(json!({ "key": "two-sum", "value": "prompt" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["leader"], json!(2));

    let (_, body) = call(&app, "GET", "/replicas/two-sum", None).await;
    assert_eq!(body["1"]["version"], json!(1));
    assert_eq!(body["2"]["value"], json!("prompt"));
}

#[tokio::test]
async fn test_runtime_metrics_lists_recent_tasks() {
    let app = router(&[1]);
    call(&app, "POST", "/submit_batch", Some(json!({ "count": 2 }))).await;
    let (_, body) = call(&app, "GET", "/get_runtime_metrics", None).await;
    let recent = body["recent"].as_array().unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0]["status"], json!("OK"));
    assert_eq!(recent[0]["node_id"], json!(1));
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = router(&[1]);
    let request = Request::builder()
        .uri("/health/live")
        .header("X-Request-ID", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["X-Request-ID"], "req-42");

    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alive_nodes"], json!(1));

    call(&app, "POST", "/crash_node", Some(json!({ "node_id": 1 }))).await;
    let (status, _) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_exposition() {
    let app = router(&[1, 2]);
    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("minijudge_node_alive{node=\"1\"} 1"));
    assert!(text.contains("minijudge_election_term"));
}

#[tokio::test]
async fn test_node_liveness_endpoint_follows_crash_and_recover() {
    let coord = cluster(&[1, 2]);
    let app = node_liveness_router(coord.clone(), 2);

    let (status, body) = call(&app, "GET", "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alive"], json!(true));

    coord.crash_node(2).await;
    let (status, body) = call(&app, "GET", "/health/live", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["alive"], json!(false));

    coord.recover_node(2).await;
    let (status, _) = call(&app, "GET", "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);

    let unknown = node_liveness_router(coord, 9);
    let (status, _) = call(&unknown, "GET", "/health/live", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
