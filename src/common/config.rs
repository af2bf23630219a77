//! Configuration for minijudge components

use crate::common::{Error, NodeId, Result};
use crate::coordinator::catalog::ProblemDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Default config file looked up in the working directory
pub const CONFIG_FILE: &str = "minijudge";

/// Environment prefix, e.g. `MINIJUDGE__CLUSTER__WORKERS_PER_NODE=4`
pub const ENV_PREFIX: &str = "MINIJUDGE";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub cluster: ClusterConfig,

    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Problem catalog; the built-in problems are used when empty
    #[serde(default)]
    pub problems: BTreeMap<String, ProblemDescriptor>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            cluster: ClusterConfig::default(),
            sandbox: SandboxConfig::default(),
            problems: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load `minijudge.toml` (if present) and `MINIJUDGE__*` environment overrides
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Same as [`Config::load`], with an explicit file layered on top
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config: Config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.cluster.validate()?;
        self.sandbox.validate()?;
        if self.cluster.liveness.mode == LivenessMode::Http {
            let rpc_port = self.server.bind_addr.port();
            if let Some(node) = self.cluster.nodes.iter().find(|n| n.port == rpc_port) {
                return Err(Error::InvalidConfig(format!(
                    "node {} liveness port {} collides with the RPC port",
                    node.id, node.port
                )));
            }
        }
        Ok(())
    }
}

/// RPC boundary configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP RPC boundary
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// A cluster member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    pub port: u16,
}

/// Cluster coordination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default = "default_nodes")]
    pub nodes: Vec<NodeSpec>,

    /// Concurrent executions per node
    #[serde(default = "default_workers_per_node")]
    pub workers_per_node: usize,

    /// Wall-clock budget of a single submission
    #[serde(default = "default_submission_timeout")]
    pub submission_timeout_ms: u64,

    /// Heartbeat period (clock tick + leader check)
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,

    /// Completed tasks kept for observability
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Upper bound of `submit_batch`
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,

    /// Delay before acknowledging a higher responding node
    #[serde(default = "default_election_settle")]
    pub election_settle_ms: u64,

    #[serde(default)]
    pub liveness: LivenessConfig,
}

fn default_nodes() -> Vec<NodeSpec> {
    vec![
        NodeSpec { id: 1, port: 9101 },
        NodeSpec { id: 2, port: 9102 },
        NodeSpec { id: 3, port: 9103 },
    ]
}
fn default_workers_per_node() -> usize {
    2
}
fn default_submission_timeout() -> u64 {
    2000
}
fn default_heartbeat_interval() -> u64 {
    500
}
fn default_history_capacity() -> usize {
    50
}
fn default_max_batch() -> usize {
    20
}
fn default_election_settle() -> u64 {
    50
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            workers_per_node: default_workers_per_node(),
            submission_timeout_ms: default_submission_timeout(),
            heartbeat_interval_ms: default_heartbeat_interval(),
            history_capacity: default_history_capacity(),
            max_batch: default_max_batch(),
            election_settle_ms: default_election_settle(),
            liveness: LivenessConfig::default(),
        }
    }
}

impl ClusterConfig {
    pub fn submission_timeout(&self) -> Duration {
        Duration::from_millis(self.submission_timeout_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn election_settle(&self) -> Duration {
        Duration::from_millis(self.election_settle_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::InvalidConfig("cluster needs at least one node".into()));
        }
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
        }
        if self.workers_per_node == 0 {
            return Err(Error::InvalidConfig("workers_per_node must be > 0".into()));
        }
        if self.submission_timeout_ms == 0 || self.heartbeat_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "timeouts and intervals must be > 0".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(Error::InvalidConfig("history_capacity must be > 0".into()));
        }
        if self.max_batch == 0 {
            return Err(Error::InvalidConfig("max_batch must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.liveness.response_rate) {
            return Err(Error::InvalidConfig(format!(
                "response_rate {} outside [0, 1]",
                self.liveness.response_rate
            )));
        }
        Ok(())
    }
}

/// How election probes decide whether a higher node answered
///
/// `Http` sends `GET /health/live` to `probe_host:<node port>`. The server
/// binds one such endpoint per node, answering from the node's alive flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivenessMode {
    Always,
    Never,
    Random,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessConfig {
    #[serde(default = "default_liveness_mode")]
    pub mode: LivenessMode,

    /// Probability that a probe is answered in `random` mode
    #[serde(default = "default_response_rate")]
    pub response_rate: f64,

    /// Host the per-node `/health/live` endpoints bind to and are probed on
    /// in `http` mode
    #[serde(default = "default_probe_host")]
    pub probe_host: String,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

fn default_liveness_mode() -> LivenessMode {
    LivenessMode::Always
}
fn default_response_rate() -> f64 {
    0.8
}
fn default_probe_host() -> String {
    "127.0.0.1".to_string()
}
fn default_probe_timeout() -> u64 {
    200
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            mode: default_liveness_mode(),
            response_rate: default_response_rate(),
            probe_host: default_probe_host(),
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

/// Sandboxed interpreter used for submissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    #[serde(default = "default_interpreter_args")]
    pub args: Vec<String>,

    /// Hard limit on one interpreter run; the process is killed past it
    #[serde(default = "default_max_runtime")]
    pub max_runtime_ms: u64,
}

fn default_interpreter() -> String {
    "python3".to_string()
}
fn default_interpreter_args() -> Vec<String> {
    vec!["-I".to_string()]
}
fn default_max_runtime() -> u64 {
    10_000
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            args: default_interpreter_args(),
            max_runtime_ms: default_max_runtime(),
        }
    }
}

impl SandboxConfig {
    pub fn max_runtime(&self) -> Duration {
        Duration::from_millis(self.max_runtime_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interpreter.trim().is_empty() {
            return Err(Error::InvalidConfig("sandbox interpreter is empty".into()));
        }
        if self.max_runtime_ms == 0 {
            return Err(Error::InvalidConfig("max_runtime_ms must be > 0".into()));
        }
        Ok(())
    }
}
