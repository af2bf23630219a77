//! # minijudge
//!
//! Cluster coordinator for a judge that runs untrusted code submissions on
//! a small set of worker nodes:
//! - Lamport clocks ordering each node's dispatch/completion events
//! - Bully leader election among alive nodes
//! - Least-load dispatch onto bounded per-node worker pools, with timeouts
//! - Version-tagged, last-write-wins replication of the problem catalog
//! - An HTTP/JSON RPC boundary for the frontend and admin tooling
//!
//! Node failure is logical: a crashed node is marked unavailable inside
//! the one coordinator process.
//!
//! ## Architecture
//!
//! ```text
//!            RPC boundary (axum)
//!                   │
//! ┌─────────────────▼──────────────────────┐
//! │         ClusterCoordinator             │
//! │  leader cache · load balancer · history│
//! └──────┬──────────────┬──────────────┬───┘
//!        │              │              │
//!  ┌─────▼─────┐  ┌─────▼─────┐  ┌─────▼─────┐
//!  │ Node 1    │  │ Node 2    │  │ Node 3    │
//!  │ clock     │  │ clock     │  │ clock     │
//!  │ replica   │  │ replica   │  │ replica   │
//!  │ pool (2)  │  │ pool (2)  │  │ pool (2)  │
//!  └───────────┘  └───────────┘  └───────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start the coordinator
//! ```bash
//! minijudge-coord serve --bind 127.0.0.1:9000 --workers 2
//! ```
//!
//! ### Use the CLI
//! ```bash
//! minijudge submit --file solution.py --tests tests.py
//! minijudge status
//! minijudge crash 3
//! minijudge elect
//! minijudge batch 5
//! ```

pub mod common;
pub mod coordinator;

// Re-export commonly used types
pub use common::{Config, Error, Result};
pub use coordinator::{ClusterCoordinator, Coordinator};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build info
pub const BUILD_INFO: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARGO_PKG_NAME"), ")");
