//! Coordinator server

use crate::common::{Config, LivenessMode, Result};
use crate::coordinator::cluster::ClusterCoordinator;
use crate::coordinator::http::{create_router, node_liveness_router, CoordState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct Coordinator {
    config: Config,
}

impl Coordinator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn serve(self) -> Result<()> {
        let cluster = &self.config.cluster;
        tracing::info!("Starting coordinator {}", crate::BUILD_INFO);
        tracing::info!("  RPC API: {}", self.config.server.bind_addr);
        tracing::info!(
            "  Nodes: {:?}",
            cluster.nodes.iter().map(|n| n.id).collect::<Vec<_>>()
        );
        tracing::info!("  Workers per node: {}", cluster.workers_per_node);
        tracing::info!("  Liveness: {:?}", cluster.liveness.mode);

        let coordinator = Arc::new(ClusterCoordinator::from_config(&self.config)?);
        let node_endpoints = if cluster.liveness.mode == LivenessMode::Http {
            self.serve_node_liveness(&coordinator).await?
        } else {
            Vec::new()
        };
        let leader = coordinator.ensure_leader().await;
        let replicated = coordinator.replicate_catalog().await?;
        tracing::info!("Replicated {} problems from leader {:?}", replicated, leader);
        coordinator.start();

        let router = create_router(CoordState {
            coordinator: coordinator.clone(),
        });
        let listener = tokio::net::TcpListener::bind(self.config.server.bind_addr).await?;

        tracing::info!("✓ Coordinator ready on {}", self.config.server.bind_addr);

        let served = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;

        coordinator.stop().await;
        for endpoint in node_endpoints {
            endpoint.abort();
        }
        if let Err(e) = served {
            tracing::error!("HTTP server error: {}", e);
            return Err(e.into());
        }
        tracing::info!("Coordinator stopped");
        Ok(())
    }
}

impl Coordinator {
    /// Bind `/health/live` on every node port for `http` election probes
    async fn serve_node_liveness(
        &self,
        coordinator: &Arc<ClusterCoordinator>,
    ) -> Result<Vec<JoinHandle<()>>> {
        let host = &self.config.cluster.liveness.probe_host;
        let mut endpoints = Vec::new();
        for node in &self.config.cluster.nodes {
            let addr = format!("{}:{}", host, node.port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            let router = node_liveness_router(coordinator.clone(), node.id);
            let node_id = node.id;
            endpoints.push(tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, router).await {
                    tracing::error!("Liveness endpoint of node {} failed: {}", node_id, e);
                }
            }));
            tracing::info!("  Node {} liveness: http://{}/health/live", node.id, addr);
        }
        Ok(endpoints)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
