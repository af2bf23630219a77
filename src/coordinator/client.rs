//! Typed client for the HTTP RPC boundary

use crate::common::{Error, NodeId, Result};
use crate::coordinator::catalog::ProblemDescriptor;
use crate::coordinator::cluster::{BatchResult, ClusterStatus, RuntimeMetrics};
use crate::coordinator::http::{
    BatchRequest, NodeRequest, ReplicateRequest, ReplicateResponse, SubmitRequest,
};
use crate::coordinator::replication::ReplicaEntry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

pub struct RpcClient {
    base_url: String,
    client: reqwest::Client,
}

impl RpcClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.client.get(self.url(path)).send().await?;
        Self::decode(resp).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Http(format!("{}: {}", status, text)));
        }
        Ok(resp.json().await?)
    }

    pub async fn submit_code(&self, code: &str, tests: &str) -> Result<String> {
        let req = SubmitRequest {
            code: code.to_string(),
            tests: tests.to_string(),
        };
        self.post("submit_code", &req).await
    }

    pub async fn submit_batch(&self, count: i64) -> Result<BatchResult> {
        self.post("submit_batch", &BatchRequest { count }).await
    }

    pub async fn list_problems(&self) -> Result<BTreeMap<String, ProblemDescriptor>> {
        self.get("list_problems").await
    }

    pub async fn get_cluster_status(&self) -> Result<ClusterStatus> {
        self.get("get_cluster_status").await
    }

    pub async fn get_runtime_metrics(&self) -> Result<RuntimeMetrics> {
        self.get("get_runtime_metrics").await
    }

    pub async fn crash_node(&self, node_id: NodeId) -> Result<bool> {
        self.post("crash_node", &NodeRequest { node_id }).await
    }

    pub async fn recover_node(&self, node_id: NodeId) -> Result<bool> {
        self.post("recover_node", &NodeRequest { node_id }).await
    }

    pub async fn force_election(&self) -> Result<Option<NodeId>> {
        self.post("force_election", &serde_json::Value::Null).await
    }

    pub async fn replicate_problem(&self, key: &str, value: &str) -> Result<NodeId> {
        let req = ReplicateRequest {
            key: key.to_string(),
            value: value.to_string(),
        };
        let resp: ReplicateResponse = self.post("replicate_problem", &req).await?;
        Ok(resp.leader)
    }

    pub async fn replicas(&self, key: &str) -> Result<BTreeMap<String, Option<ReplicaEntry<String>>>> {
        self.get(&format!("replicas/{}", key)).await
    }

    pub async fn metrics(&self) -> Result<String> {
        let resp = self.client.get(self.url("metrics")).send().await?;
        Ok(resp.error_for_status()?.text().await?)
    }
}
