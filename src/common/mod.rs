//! Common utilities and types shared across minijudge

pub mod clock;
pub mod config;
pub mod error;
pub mod tracing_middleware;
pub mod utils;

/// Cluster member identifier; ids are unique and totally ordered
pub type NodeId = u32;

/// Monotonic task identifier
pub type TaskId = u64;

pub use clock::LamportClock;
pub use config::{ClusterConfig, Config, LivenessConfig, LivenessMode, NodeSpec, SandboxConfig, ServerConfig};
pub use error::{Error, Result};
pub use utils::{parse_duration, round_millis, timestamp_secs};
