//! Version-tagged replicated key-value store
//!
//! Every node owns one store. A writer bumps the key's version locally and
//! pushes the same `(key, value, version)` tuple to each peer; every store
//! accepts an update only if it does not regress the stored version.
//! Equal versions overwrite, so re-applying a tuple is idempotent.
//!
//! This is last-write-wins with a single writer per round. Two writers that
//! race on a key after a leadership change are resolved by version only.
//! Equal versions overwrite, so a tie between two writers is won by
//! whichever value is applied last, and peers may observe a partially
//! propagated update.

use crate::common::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stored value with its version (always >= 1)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaEntry<V> {
    pub version: u64,
    pub value: V,
}

#[derive(Debug, Clone)]
pub struct ReplicatedStore<V> {
    node_id: NodeId,
    data: BTreeMap<String, ReplicaEntry<V>>,
}

impl<V: Clone + std::fmt::Debug> ReplicatedStore<V> {
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            data: BTreeMap::new(),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn get_local(&self, key: &str) -> Option<&V> {
        self.data.get(key).map(|entry| &entry.value)
    }

    pub fn get_entry(&self, key: &str) -> Option<&ReplicaEntry<V>> {
        self.data.get(key)
    }

    /// Stored version of `key`, 0 when absent
    pub fn version(&self, key: &str) -> u64 {
        self.data.get(key).map(|entry| entry.version).unwrap_or(0)
    }

    /// Apply an update unless it is older than the local entry.
    /// Returns whether the update was accepted; stale updates are dropped silently.
    pub fn apply_update(&mut self, key: &str, value: V, version: u64) -> bool {
        if let Some(local) = self.data.get(key) {
            if version < local.version {
                tracing::debug!(
                    node = self.node_id,
                    key,
                    version,
                    local = local.version,
                    "dropping stale update"
                );
                return false;
            }
        }
        tracing::debug!(node = self.node_id, key, version, ?value, "apply");
        self.data
            .insert(key.to_string(), ReplicaEntry { version, value });
        true
    }

    /// Bump the key's version, apply locally, then push to every peer.
    /// Returns the new version.
    pub fn update_and_replicate<'a, I>(&mut self, key: &str, value: V, peers: I) -> u64
    where
        I: IntoIterator<Item = &'a mut ReplicatedStore<V>>,
        V: 'a,
    {
        let new_version = self.version(key) + 1;
        self.apply_update(key, value.clone(), new_version);
        for peer in peers {
            let accepted = peer.apply_update(key, value.clone(), new_version);
            tracing::debug!(
                from = self.node_id,
                to = peer.node_id,
                key,
                version = new_version,
                accepted,
                "replicated"
            );
        }
        new_version
    }

    /// Snapshot of every entry
    pub fn dump(&self) -> BTreeMap<String, ReplicaEntry<V>> {
        self.data.clone()
    }

    /// Pull everything `other` holds through the latest-wins rule.
    /// Returns how many entries were accepted.
    pub fn sync_from(&mut self, other: &ReplicatedStore<V>) -> usize {
        other
            .dump()
            .into_iter()
            .filter(|(key, entry)| self.apply_update(key, entry.value.clone(), entry.version))
            .count()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
