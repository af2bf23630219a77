//! HTTP RPC boundary
//!
//! Every coordinator operation is exposed as a named route taking and
//! returning JSON. Node ids used as map keys are stringified on the wire.
//! Unknown node ids in admin calls answer `false`, not an error status.

use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::{Error, NodeId};
use crate::coordinator::cluster::ClusterCoordinator;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write as _;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body (submissions included)
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct CoordState {
    pub coordinator: Arc<ClusterCoordinator>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub code: String,
    #[serde(default)]
    pub tests: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeRequest {
    pub node_id: NodeId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(default = "default_batch_count")]
    pub count: i64,
}

fn default_batch_count() -> i64 {
    1
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicateRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicateResponse {
    pub leader: NodeId,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (
            self.to_http_status(),
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

pub fn create_router(state: CoordState) -> Router {
    Router::new()
        // Submissions
        .route("/submit_code", post(submit_code))
        .route("/submit_batch", post(submit_batch))
        // Catalog & replication
        .route("/list_problems", get(list_problems))
        .route("/replicate_problem", post(replicate_problem))
        .route("/replicas/:key", get(replicas))
        // Observability
        .route("/get_cluster_status", get(get_cluster_status))
        .route("/get_runtime_metrics", get(get_runtime_metrics))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .route("/health/live", get(health_live))
        // Admin
        .route("/crash_node", post(crash_node))
        .route("/recover_node", post(recover_node))
        .route("/force_election", post(force_election))
        .layer(axum::middleware::from_fn(request_tracing_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn submit_code(
    State(state): State<CoordState>,
    Json(req): Json<SubmitRequest>,
) -> Json<String> {
    tracing::info!(
        "received submission len(code)={} len(tests)={}",
        req.code.len(),
        req.tests.len()
    );
    let timeout = state.coordinator.settings().submission_timeout();
    Json(
        state
            .coordinator
            .execute_submission(&req.code, &req.tests, timeout)
            .await,
    )
}

async fn submit_batch(
    State(state): State<CoordState>,
    Json(req): Json<BatchRequest>,
) -> impl IntoResponse {
    Json(state.coordinator.submit_batch(req.count).await)
}

async fn list_problems(State(state): State<CoordState>) -> impl IntoResponse {
    Json(state.coordinator.list_problems())
}

async fn replicate_problem(
    State(state): State<CoordState>,
    Json(req): Json<ReplicateRequest>,
) -> Result<Json<ReplicateResponse>, Error> {
    let leader = state
        .coordinator
        .replicate_problem(&req.key, &req.value)
        .await?;
    Ok(Json(ReplicateResponse { leader }))
}

async fn replicas(State(state): State<CoordState>, Path(key): Path<String>) -> impl IntoResponse {
    Json(state.coordinator.replica_view(&key).await)
}

async fn get_cluster_status(State(state): State<CoordState>) -> impl IntoResponse {
    Json(state.coordinator.get_status().await)
}

async fn get_runtime_metrics(State(state): State<CoordState>) -> impl IntoResponse {
    Json(state.coordinator.get_runtime_metrics().await)
}

async fn crash_node(
    State(state): State<CoordState>,
    Json(req): Json<NodeRequest>,
) -> Json<bool> {
    Json(state.coordinator.crash_node(req.node_id).await)
}

async fn recover_node(
    State(state): State<CoordState>,
    Json(req): Json<NodeRequest>,
) -> Json<bool> {
    Json(state.coordinator.recover_node(req.node_id).await)
}

async fn force_election(State(state): State<CoordState>) -> Json<Option<NodeId>> {
    Json(state.coordinator.force_election().await)
}

/// Cluster health: leader and alive node count
async fn health(State(state): State<CoordState>) -> impl IntoResponse {
    let status = state.coordinator.get_status().await;
    let alive = status.nodes.values().filter(|n| n.alive).count();
    let code = if alive > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(json!({
            "status": if alive > 0 { "healthy" } else { "unavailable" },
            "leader": status.leader,
            "alive_nodes": alive,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Liveness of the coordinator process itself
async fn health_live() -> impl IntoResponse {
    Json(json!({
        "alive": true,
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}

#[derive(Clone)]
struct NodeLiveState {
    coordinator: Arc<ClusterCoordinator>,
    node_id: NodeId,
}

/// `/health/live` for one node, served on that node's port in `http`
/// liveness mode. 200 while the node is marked alive, 503 otherwise.
pub fn node_liveness_router(coordinator: Arc<ClusterCoordinator>, node_id: NodeId) -> Router {
    Router::new()
        .route("/health/live", get(node_live))
        .with_state(NodeLiveState {
            coordinator,
            node_id,
        })
}

async fn node_live(State(state): State<NodeLiveState>) -> impl IntoResponse {
    let alive = state
        .coordinator
        .reports_alive(state.node_id)
        .unwrap_or(false);
    let code = if alive {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(json!({ "node": state.node_id, "alive": alive })))
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<CoordState>) -> impl IntoResponse {
    let status = state.coordinator.get_status().await;
    let runtime = state.coordinator.get_runtime_metrics().await;

    let mut out = String::new();
    let _ = writeln!(out, "minijudge_leader {}", status.leader.map(i64::from).unwrap_or(-1));
    let _ = writeln!(out, "minijudge_election_term {}", status.term);
    for (id, node) in &status.nodes {
        let _ = writeln!(out, "minijudge_node_alive{{node=\"{}\"}} {}", id, u8::from(node.alive));
        let _ = writeln!(out, "minijudge_node_load{{node=\"{}\"}} {}", id, node.load);
        let _ = writeln!(out, "minijudge_node_clock{{node=\"{}\"}} {}", id, node.clock);
    }
    for (id, tasks) in &runtime.running {
        let _ = writeln!(out, "minijudge_running_tasks{{node=\"{}\"}} {}", id, tasks.len());
    }
    let _ = writeln!(out, "minijudge_recent_tasks {}", runtime.recent.len());

    (StatusCode::OK, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status() {
        let response = Error::NoNodesAvailable.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_batch_request_defaults() {
        let req: BatchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.count, 1);
        let req: SubmitRequest = serde_json::from_str(r#"{"code":"print(1)"}"#).unwrap();
        assert!(req.tests.is_empty());
    }
}
