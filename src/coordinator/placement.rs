//! Least-load placement
//!
//! Tracks the absolute load of each node and picks the least loaded one.
//! Ties are broken by the smallest node id, so a given load snapshot and
//! candidate set always yield the same choice.

use crate::common::NodeId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct LoadBalancer {
    loads: BTreeMap<NodeId, u64>,
}

impl LoadBalancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the absolute load of a node (overwrites, not a delta)
    pub fn update_load(&mut self, node_id: NodeId, load: u64) {
        self.loads.insert(node_id, load);
        tracing::debug!(node = node_id, load, "load updated");
    }

    /// Least loaded node among every tracked node
    pub fn choose_node(&self) -> Option<NodeId> {
        let chosen = self
            .loads
            .iter()
            .min_by_key(|(id, load)| (**load, **id))
            .map(|(id, _)| *id);
        tracing::debug!(?chosen, "chosen among all nodes");
        chosen
    }

    /// Least loaded node among `allowed`; untracked candidates count as load 0
    pub fn choose_from(&self, allowed: &[NodeId]) -> Option<NodeId> {
        let chosen = allowed
            .iter()
            .map(|id| (self.loads.get(id).copied().unwrap_or(0), *id))
            .min()
            .map(|(_, id)| id);
        tracing::debug!(?allowed, ?chosen, "chosen among candidates");
        chosen
    }
}
