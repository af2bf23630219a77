//! Liveness oracles used by election probes
//!
//! A bully initiator asks every higher node whether it is alive. The
//! oracle decides the answer: fixed (tests, logical clusters), random
//! (the historical simulation) or a real bounded HTTP health check.

use crate::common::{LivenessConfig, LivenessMode, NodeId, NodeSpec};
use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait LivenessOracle: Send + Sync {
    /// Does `target` answer an election message sent by `from`?
    async fn probe(&self, from: NodeId, target: NodeId) -> bool;
}

/// Every probe is answered
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysResponds;

#[async_trait]
impl LivenessOracle for AlwaysResponds {
    async fn probe(&self, _from: NodeId, _target: NodeId) -> bool {
        true
    }
}

/// No probe is ever answered
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverResponds;

#[async_trait]
impl LivenessOracle for NeverResponds {
    async fn probe(&self, _from: NodeId, _target: NodeId) -> bool {
        false
    }
}

/// Answers with a fixed probability
#[derive(Debug, Clone, Copy)]
pub struct RandomOracle {
    response_rate: f64,
}

impl RandomOracle {
    pub fn new(response_rate: f64) -> Self {
        Self {
            response_rate: response_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl LivenessOracle for RandomOracle {
    async fn probe(&self, _from: NodeId, _target: NodeId) -> bool {
        rand::thread_rng().gen_bool(self.response_rate)
    }
}

/// Only the listed nodes answer
#[derive(Debug, Default, Clone)]
pub struct StaticOracle {
    reachable: HashSet<NodeId>,
}

impl StaticOracle {
    pub fn new(reachable: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            reachable: reachable.into_iter().collect(),
        }
    }
}

#[async_trait]
impl LivenessOracle for StaticOracle {
    async fn probe(&self, _from: NodeId, target: NodeId) -> bool {
        self.reachable.contains(&target)
    }
}

/// Bounded `GET /health/live` against each node's port.
/// The server binds those endpoints in `http` mode; a refused or slow
/// connection counts as no answer.
pub struct HttpOracle {
    client: reqwest::Client,
    endpoints: HashMap<NodeId, String>,
}

impl HttpOracle {
    pub fn new(host: &str, nodes: &[NodeSpec], timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let endpoints = nodes
            .iter()
            .map(|node| {
                (
                    node.id,
                    format!("http://{}:{}/health/live", host, node.port),
                )
            })
            .collect();
        Ok(Self { client, endpoints })
    }
}

#[async_trait]
impl LivenessOracle for HttpOracle {
    async fn probe(&self, from: NodeId, target: NodeId) -> bool {
        let Some(url) = self.endpoints.get(&target) else {
            return false;
        };
        match self.client.get(url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!(from, target, "liveness probe failed: {}", e);
                false
            }
        }
    }
}

/// Build the oracle selected by configuration
pub fn from_config(
    config: &LivenessConfig,
    nodes: &[NodeSpec],
) -> crate::Result<Arc<dyn LivenessOracle>> {
    let oracle: Arc<dyn LivenessOracle> = match config.mode {
        LivenessMode::Always => Arc::new(AlwaysResponds),
        LivenessMode::Never => Arc::new(NeverResponds),
        LivenessMode::Random => Arc::new(RandomOracle::new(config.response_rate)),
        LivenessMode::Http => Arc::new(HttpOracle::new(
            &config.probe_host,
            nodes,
            Duration::from_millis(config.probe_timeout_ms),
        )?),
    };
    Ok(oracle)
}
