//! Cluster coordination layer
//!
//! The coordinator is responsible for:
//! - Logical clocks per node (send on assignment, receive on completion)
//! - Bully leader election among alive nodes
//! - Least-load dispatch onto bounded per-node worker pools
//! - Last-write-wins replication of the problem catalog
//! - Task telemetry (running tasks, bounded history)
//! - The HTTP RPC boundary

pub mod catalog;
pub mod client;
pub mod cluster;
pub mod election;
pub mod history;
pub mod http;
pub mod liveness;
pub mod placement;
pub mod pool;
pub mod replication;
pub mod sandbox;
pub mod server;

pub use cluster::ClusterCoordinator;
pub use server::Coordinator;
