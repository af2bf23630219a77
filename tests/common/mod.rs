//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use minijudge::common::{ClusterConfig, NodeId, NodeSpec};
use minijudge::coordinator::catalog::ProblemCatalog;
use minijudge::coordinator::liveness::{AlwaysResponds, LivenessOracle};
use minijudge::coordinator::sandbox::Sandbox;
use minijudge::{ClusterCoordinator, Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Scripted sandbox:
/// - `raise:<msg>` fails with `<msg>`
/// - `sleep:<ms>` sleeps then prints `slept`
/// - `print('<text>')` prints `<text>`
/// - anything else succeeds silently
pub struct ScriptedSandbox;

#[async_trait]
impl Sandbox for ScriptedSandbox {
    async fn run(&self, code: &str, _tests: &str) -> Result<String> {
        if let Some(message) = code.strip_prefix("raise:") {
            return Err(Error::Execution(message.to_string()));
        }
        if let Some(ms) = code.strip_prefix("sleep:") {
            let ms: u64 = ms.parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            return Ok("slept\n".to_string());
        }
        if let Some(text) = code
            .strip_prefix("print('")
            .and_then(|rest| rest.strip_suffix("')"))
        {
            return Ok(format!("{}\n", text));
        }
        Ok(String::new())
    }
}

pub fn settings(ids: &[NodeId]) -> ClusterConfig {
    ClusterConfig {
        nodes: ids
            .iter()
            .map(|id| NodeSpec {
                id: *id,
                port: 9100 + *id as u16,
            })
            .collect(),
        election_settle_ms: 0,
        ..Default::default()
    }
}

pub fn cluster_with(settings: ClusterConfig, oracle: Arc<dyn LivenessOracle>) -> Arc<ClusterCoordinator> {
    Arc::new(
        ClusterCoordinator::new(
            settings,
            ProblemCatalog::builtin(),
            Arc::new(ScriptedSandbox),
            oracle,
        )
        .unwrap(),
    )
}

/// Cluster where every alive node answers election probes
pub fn cluster(ids: &[NodeId]) -> Arc<ClusterCoordinator> {
    cluster_with(settings(ids), Arc::new(AlwaysResponds))
}

/// Poll `check` until it holds or a second has passed
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
