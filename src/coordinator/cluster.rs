//! Cluster coordinator
//!
//! Owns every per-node structure (record, clock, replica store, worker
//! pool), the load balancer, the leader cache and the task history. All
//! multi-step mutations happen under one write lock; snapshots take the
//! read lock. Sandboxed code never runs while the lock is held.

use crate::common::{
    round_millis, timestamp_secs, ClusterConfig, Config, Error, LamportClock, NodeId, Result,
    TaskId,
};
use crate::coordinator::catalog::{ProblemCatalog, ProblemDescriptor};
use crate::coordinator::election::{BullyElection, ElectionOutcome};
use crate::coordinator::history::{TaskHistory, TaskRecord, TaskStatus};
use crate::coordinator::liveness::{self, LivenessOracle};
use crate::coordinator::placement::LoadBalancer;
use crate::coordinator::pool::WorkerPool;
use crate::coordinator::replication::{ReplicaEntry, ReplicatedStore};
use crate::coordinator::sandbox::{ProcessSandbox, Sandbox};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Code run by `submit_batch`
pub const BATCH_CODE: &str = "print('batch')";

/// One cluster member as seen by the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub port: u16,
    pub alive: bool,
    pub load: u64,
    /// Bumped on every crash; completions from an older incarnation leave load alone
    pub incarnation: u64,
}

#[derive(Debug, Clone)]
struct RunningTask {
    started_at: f64,
    worker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub alive: bool,
    pub load: u64,
    pub port: u16,
    pub clock: u64,
}

/// `get_cluster_status` payload; node ids are stringified on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    pub leader: Option<NodeId>,
    pub term: u64,
    pub nodes: BTreeMap<String, NodeStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningTaskView {
    pub start: f64,
    /// Worker slot label, `None` while queued
    pub thread: Option<String>,
    /// Always `RUNNING`; completed tasks move to the history
    pub status: TaskStatus,
}

/// `get_runtime_metrics` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeMetrics {
    pub running: BTreeMap<String, BTreeMap<String, RunningTaskView>>,
    pub recent: Vec<TaskRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub submitted: usize,
    pub outputs: Vec<String>,
}

struct ClusterState {
    nodes: BTreeMap<NodeId, NodeRecord>,
    clocks: BTreeMap<NodeId, LamportClock>,
    stores: BTreeMap<NodeId, ReplicatedStore<String>>,
    pools: BTreeMap<NodeId, Arc<WorkerPool>>,
    balancer: LoadBalancer,
    leader: Option<NodeId>,
    term: u64,
    last_election: Option<ElectionOutcome>,
    task_seq: TaskId,
    running: BTreeMap<NodeId, BTreeMap<TaskId, RunningTask>>,
    history: TaskHistory,
}

impl ClusterState {
    fn is_alive(&self, node_id: NodeId) -> bool {
        self.nodes.get(&node_id).map(|n| n.alive).unwrap_or(false)
    }

    fn alive_ids(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.alive)
            .map(|n| n.id)
            .collect()
    }

    /// Signed load change clamped at zero, mirrored into the balancer
    fn adjust_load(&mut self, node_id: NodeId, delta: i64) -> Result<u64> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(Error::UnknownNode(node_id))?;
        node.load = node.load.saturating_add_signed(delta);
        let load = node.load;
        self.balancer.update_load(node_id, load);
        Ok(load)
    }
}

/// Outcome of a worker job: clock stamp at start, sandbox result
type JobOutput = (u64, Result<String>);

pub struct ClusterCoordinator {
    settings: ClusterConfig,
    catalog: ProblemCatalog,
    sandbox: Arc<dyn Sandbox>,
    oracle: Arc<dyn LivenessOracle>,
    state: Arc<RwLock<ClusterState>>,
    /// Mirror of each node's `alive` flag, readable while an election holds the lock
    alive_flags: BTreeMap<NodeId, Arc<AtomicBool>>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl ClusterCoordinator {
    pub fn new(
        settings: ClusterConfig,
        catalog: ProblemCatalog,
        sandbox: Arc<dyn Sandbox>,
        oracle: Arc<dyn LivenessOracle>,
    ) -> Result<Self> {
        settings.validate()?;

        let mut state = ClusterState {
            nodes: BTreeMap::new(),
            clocks: BTreeMap::new(),
            stores: BTreeMap::new(),
            pools: BTreeMap::new(),
            balancer: LoadBalancer::new(),
            leader: None,
            term: 0,
            last_election: None,
            task_seq: 0,
            running: BTreeMap::new(),
            history: TaskHistory::new(settings.history_capacity),
        };
        for spec in &settings.nodes {
            state.nodes.insert(
                spec.id,
                NodeRecord {
                    id: spec.id,
                    port: spec.port,
                    alive: true,
                    load: 0,
                    incarnation: 0,
                },
            );
            state.clocks.insert(spec.id, LamportClock::new(spec.id));
            state.stores.insert(spec.id, ReplicatedStore::new(spec.id));
            state.pools.insert(
                spec.id,
                Arc::new(WorkerPool::new(spec.id, settings.workers_per_node)),
            );
            state.running.insert(spec.id, BTreeMap::new());
            state.balancer.update_load(spec.id, 0);
        }

        let alive_flags = settings
            .nodes
            .iter()
            .map(|spec| (spec.id, Arc::new(AtomicBool::new(true))))
            .collect();

        Ok(Self {
            settings,
            catalog,
            sandbox,
            oracle,
            state: Arc::new(RwLock::new(state)),
            alive_flags,
            heartbeat: Mutex::new(None),
        })
    }

    /// Wire the process sandbox and the configured liveness oracle
    pub fn from_config(config: &Config) -> Result<Self> {
        let oracle = liveness::from_config(&config.cluster.liveness, &config.cluster.nodes)?;
        Self::new(
            config.cluster.clone(),
            ProblemCatalog::from_config(&config.problems),
            Arc::new(ProcessSandbox::new(&config.sandbox)),
            oracle,
        )
    }

    pub fn settings(&self) -> &ClusterConfig {
        &self.settings
    }

    // === Leadership ===

    /// Cached leader if it is alive, otherwise a fresh bully election
    /// started by a random alive node. `None` only when every node is down.
    pub async fn ensure_leader(&self) -> Option<NodeId> {
        let mut state = self.state.write().await;
        self.ensure_leader_locked(&mut state).await
    }

    async fn ensure_leader_locked(&self, state: &mut ClusterState) -> Option<NodeId> {
        if let Some(leader) = state.leader {
            if state.is_alive(leader) {
                return Some(leader);
            }
        }

        let alive = state.alive_ids();
        let initiator = {
            let mut rng = rand::thread_rng();
            alive.choose(&mut rng).copied()
        };
        let Some(initiator) = initiator else {
            tracing::warn!("No alive node, leader cleared");
            state.leader = None;
            return None;
        };

        state.term += 1;
        let mut election = BullyElection::new(initiator, &alive, self.settings.election_settle());
        let outcome = election
            .start_election(state.term, self.oracle.as_ref())
            .await;

        let leader = if state.is_alive(outcome.leader) {
            outcome.leader
        } else {
            tracing::warn!(
                "{} (winner {} is not alive), node {} keeps leadership",
                Error::ElectionInconclusive,
                outcome.leader,
                initiator
            );
            initiator
        };
        tracing::info!("Leader elected: node {} (term {})", leader, state.term);
        state.leader = Some(leader);
        state.last_election = Some(outcome);
        Some(leader)
    }

    /// Cached leader, without re-validation
    pub async fn leader(&self) -> Option<NodeId> {
        self.state.read().await.leader
    }

    pub async fn last_election(&self) -> Option<ElectionOutcome> {
        self.state.read().await.last_election.clone()
    }

    /// Drop the cached leader and elect again
    pub async fn force_election(&self) -> Option<NodeId> {
        let mut state = self.state.write().await;
        state.leader = None;
        self.ensure_leader_locked(&mut state).await
    }

    // === Load & placement ===

    /// Adjust a node's load by `delta` (clamped at zero); returns the new load
    pub async fn update_load(&self, node_id: NodeId, delta: i64) -> Result<u64> {
        self.state.write().await.adjust_load(node_id, delta)
    }

    /// Least loaded alive node
    pub async fn choose_node_for_submission(&self) -> Option<NodeId> {
        let state = self.state.read().await;
        state.balancer.choose_from(&state.alive_ids())
    }

    /// Whether a node is currently marked alive, without taking the state lock.
    /// `None` for unknown ids.
    pub fn reports_alive(&self, node_id: NodeId) -> Option<bool> {
        self.alive_flags
            .get(&node_id)
            .map(|flag| flag.load(Ordering::SeqCst))
    }

    fn set_alive_flag(&self, node_id: NodeId, alive: bool) {
        if let Some(flag) = self.alive_flags.get(&node_id) {
            flag.store(alive, Ordering::SeqCst);
        }
    }

    pub async fn node(&self, node_id: NodeId) -> Option<NodeRecord> {
        self.state.read().await.nodes.get(&node_id).cloned()
    }

    // === Replication ===

    /// Write `key` on the leader's store and push it to every other store.
    /// Returns the leader that performed the write.
    pub async fn replicate_problem(&self, key: &str, value: &str) -> Result<NodeId> {
        let mut state = self.state.write().await;
        let leader = self
            .ensure_leader_locked(&mut state)
            .await
            .ok_or(Error::NoNodesAvailable)?;

        let mut leader_store = state
            .stores
            .remove(&leader)
            .ok_or_else(|| Error::Internal(format!("no store for node {}", leader)))?;
        let version =
            leader_store.update_and_replicate(key, value.to_string(), state.stores.values_mut());
        state.stores.insert(leader, leader_store);

        tracing::info!("Replicated {} v{} from leader {}", key, version, leader);
        Ok(leader)
    }

    /// Push every catalog prompt from the leader
    pub async fn replicate_catalog(&self) -> Result<usize> {
        let mut replicated = 0;
        for (key, problem) in self.catalog.list() {
            self.replicate_problem(key, &problem.prompt).await?;
            replicated += 1;
        }
        Ok(replicated)
    }

    /// What each node currently holds for `key`
    pub async fn replica_view(&self, key: &str) -> BTreeMap<String, Option<ReplicaEntry<String>>> {
        let state = self.state.read().await;
        state
            .stores
            .iter()
            .map(|(id, store)| (id.to_string(), store.get_entry(key).cloned()))
            .collect()
    }

    // === Execution ===

    /// Run a submission on the least loaded alive node and return its output:
    /// captured stdout (`"OK"` when empty), `"TIMEOUT"`, `"ERROR: ..."`, or
    /// `"no nodes available"`.
    pub async fn execute_submission(&self, code: &str, tests: &str, timeout: Duration) -> String {
        match self.submit(code, tests, timeout).await {
            Ok(record) => record.output,
            Err(e) => e.to_output(),
        }
    }

    /// Dispatch, wait up to `timeout`, record. Only fails when no node is alive;
    /// every other failure is folded into the returned record.
    pub async fn submit(&self, code: &str, tests: &str, timeout: Duration) -> Result<TaskRecord> {
        let started = Instant::now();

        // assignment: clock send, load++, task registration
        let (node_id, task_id, sent_clock, incarnation, started_at, pool) = {
            let mut state = self.state.write().await;
            let node_id = state
                .balancer
                .choose_from(&state.alive_ids())
                .ok_or(Error::NoNodesAvailable)?;
            let pool = state
                .pools
                .get(&node_id)
                .cloned()
                .ok_or_else(|| Error::Internal(format!("no worker pool for node {}", node_id)))?;
            let sent_clock = state
                .clocks
                .get_mut(&node_id)
                .map(|clock| clock.send_event())
                .unwrap_or(0);
            state.adjust_load(node_id, 1)?;
            let incarnation = state.nodes.get(&node_id).map(|n| n.incarnation).unwrap_or(0);

            state.task_seq += 1;
            let task_id = state.task_seq;
            let started_at = timestamp_secs();
            state.running.entry(node_id).or_default().insert(
                task_id,
                RunningTask {
                    started_at,
                    worker: None,
                },
            );
            (node_id, task_id, sent_clock, incarnation, started_at, pool)
        };
        tracing::info!("Assigned task {} to node {}", task_id, node_id);

        let state = self.state.clone();
        let sandbox = self.sandbox.clone();
        let code = code.to_string();
        let tests = tests.to_string();
        let handle = pool.submit(move |worker| async move {
            let start_clock = {
                let mut state = state.write().await;
                if let Some(task) = state
                    .running
                    .get_mut(&node_id)
                    .and_then(|tasks| tasks.get_mut(&task_id))
                {
                    task.worker = Some(worker);
                }
                state
                    .clocks
                    .get_mut(&node_id)
                    .map(|clock| clock.tick())
                    .unwrap_or(sent_clock)
            };
            let result = sandbox.run(&code, &tests).await;
            (start_clock, result)
        });

        // the handle is dropped on timeout: the job keeps running, its result is discarded
        let (status, output, reply_clock) = match tokio::time::timeout(timeout, handle).await {
            Err(_) => {
                tracing::warn!("Task {} on node {} timed out after {:?}", task_id, node_id, timeout);
                (
                    TaskStatus::Timeout,
                    Error::ExecutionTimeout(timeout).to_output(),
                    sent_clock,
                )
            }
            Ok(Err(join_err)) => (
                TaskStatus::Error,
                Error::Internal(join_err.to_string()).to_output(),
                sent_clock,
            ),
            Ok(Ok(Err(pool_err))) => {
                tracing::warn!("Task {} cancelled: {}", task_id, pool_err);
                (TaskStatus::Error, pool_err.to_output(), sent_clock)
            }
            Ok(Ok(Ok(job))) => Self::classify(job),
        };

        // completion: clock receive, load--, history
        let mut state = self.state.write().await;
        let completed_clock = state
            .clocks
            .get_mut(&node_id)
            .map(|clock| clock.receive_event(reply_clock))
            .unwrap_or(reply_clock);
        let same_incarnation = state
            .nodes
            .get(&node_id)
            .map(|n| n.incarnation == incarnation)
            .unwrap_or(false);
        if same_incarnation {
            state.adjust_load(node_id, -1)?;
        }
        let running = state
            .running
            .get_mut(&node_id)
            .and_then(|tasks| tasks.remove(&task_id));
        let record = TaskRecord {
            task_id,
            node_id,
            started_at: running.as_ref().map(|t| t.started_at).unwrap_or(started_at),
            status,
            output,
            duration: round_millis(started.elapsed().as_secs_f64()),
            worker: running.and_then(|t| t.worker),
            sent_clock,
            completed_clock,
        };
        state.history.push(record.clone());
        tracing::info!(
            "Finished task {} on node {}: {} in {:.3}s",
            task_id,
            node_id,
            record.status,
            record.duration
        );
        Ok(record)
    }

    fn classify((start_clock, result): JobOutput) -> (TaskStatus, String, u64) {
        match result {
            Ok(stdout) if stdout.is_empty() => (TaskStatus::Ok, "OK".to_string(), start_clock),
            Ok(stdout) => (TaskStatus::Ok, stdout, start_clock),
            Err(e) => (TaskStatus::Error, e.to_output(), start_clock),
        }
    }

    /// Run `count` (clamped to `[1, max_batch]`) trivial submissions one after another
    pub async fn submit_batch(&self, count: i64) -> BatchResult {
        let max = i64::try_from(self.settings.max_batch).unwrap_or(i64::MAX);
        let count = count.clamp(1, max) as usize;
        let timeout = self.settings.submission_timeout();
        let mut outputs = Vec::with_capacity(count);
        for _ in 0..count {
            outputs.push(self.execute_submission(BATCH_CODE, "", timeout).await);
        }
        BatchResult {
            submitted: count,
            outputs,
        }
    }

    // === Admin ===

    /// Mark a node dead, zero its load, cancel its queued work and replace
    /// it as leader if needed. `false` for unknown ids.
    pub async fn crash_node(&self, node_id: NodeId) -> bool {
        let mut state = self.state.write().await;
        let Some(node) = state.nodes.get_mut(&node_id) else {
            tracing::warn!("crash_node: {}", Error::UnknownNode(node_id));
            return false;
        };
        node.alive = false;
        node.load = 0;
        node.incarnation += 1;
        self.set_alive_flag(node_id, false);
        state.balancer.update_load(node_id, 0);
        if let Some(pool) = state.pools.get(&node_id) {
            pool.close();
        }
        tracing::info!("Node {} crashed", node_id);

        if state.leader == Some(node_id) {
            state.leader = None;
            self.ensure_leader_locked(&mut state).await;
        }
        true
    }

    /// Mark a node alive again, provision a fresh pool if its old one was
    /// closed, re-check the leader and catch its store up from the leader.
    /// `false` for unknown ids.
    pub async fn recover_node(&self, node_id: NodeId) -> bool {
        let mut state = self.state.write().await;
        let Some(node) = state.nodes.get_mut(&node_id) else {
            tracing::warn!("recover_node: {}", Error::UnknownNode(node_id));
            return false;
        };
        node.alive = true;
        let load = node.load;
        self.set_alive_flag(node_id, true);
        state.balancer.update_load(node_id, load);

        let closed = state
            .pools
            .get(&node_id)
            .map(|pool| pool.is_closed())
            .unwrap_or(true);
        if closed {
            state.pools.insert(
                node_id,
                Arc::new(WorkerPool::new(node_id, self.settings.workers_per_node)),
            );
        }
        tracing::info!("Node {} recovered", node_id);

        if let Some(leader) = self.ensure_leader_locked(&mut state).await {
            if leader != node_id {
                let source = state.stores.get(&leader).cloned();
                if let (Some(source), Some(store)) = (source, state.stores.get_mut(&node_id)) {
                    let accepted = store.sync_from(&source);
                    tracing::info!(
                        "Node {} caught up {} entries from leader {}",
                        node_id,
                        accepted,
                        leader
                    );
                }
            }
        }
        true
    }

    // === Snapshots ===

    pub async fn get_status(&self) -> ClusterStatus {
        let state = self.state.read().await;
        let nodes = state
            .nodes
            .values()
            .map(|node| {
                (
                    node.id.to_string(),
                    NodeStatus {
                        alive: node.alive,
                        load: node.load,
                        port: node.port,
                        clock: state.clocks.get(&node.id).map(|c| c.now()).unwrap_or(0),
                    },
                )
            })
            .collect();
        ClusterStatus {
            leader: state.leader,
            term: state.term,
            nodes,
        }
    }

    pub async fn get_runtime_metrics(&self) -> RuntimeMetrics {
        let state = self.state.read().await;
        let running = state
            .running
            .iter()
            .map(|(node_id, tasks)| {
                let tasks = tasks
                    .iter()
                    .map(|(task_id, task)| {
                        (
                            task_id.to_string(),
                            RunningTaskView {
                                start: task.started_at,
                                thread: task.worker.clone(),
                                status: TaskStatus::Running,
                            },
                        )
                    })
                    .collect();
                (node_id.to_string(), tasks)
            })
            .collect();
        RuntimeMetrics {
            running,
            recent: state.history.to_vec(),
        }
    }

    pub fn list_problems(&self) -> BTreeMap<String, ProblemDescriptor> {
        self.catalog.list().clone()
    }

    // === Background heartbeat ===

    /// One heartbeat: tick every clock, re-validate the leader
    pub async fn heartbeat(&self) -> Option<NodeId> {
        let mut state = self.state.write().await;
        for clock in state.clocks.values_mut() {
            clock.tick();
        }
        self.ensure_leader_locked(&mut state).await
    }

    /// Start the heartbeat loop; `false` if it is already running
    pub fn start(self: &Arc<Self>) -> bool {
        let Ok(mut slot) = self.heartbeat.lock() else {
            return false;
        };
        if slot.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
            return false;
        }

        let coordinator: Weak<Self> = Arc::downgrade(self);
        let period = self.settings.heartbeat_interval();
        *slot = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(coordinator) = coordinator.upgrade() else {
                    break;
                };
                coordinator.heartbeat().await;
            }
        }));
        tracing::info!("Heartbeat started every {:?}", period);
        true
    }

    /// Stop the heartbeat and shut every worker pool down, cancelling
    /// queued and running jobs (their interpreters are killed)
    pub async fn stop(&self) {
        if let Ok(mut slot) = self.heartbeat.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
        let state = self.state.read().await;
        for pool in state.pools.values() {
            pool.shutdown();
        }
    }
}

impl Drop for ClusterCoordinator {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.heartbeat.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::NodeSpec;
    use crate::coordinator::liveness::AlwaysResponds;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Sandbox for Echo {
        async fn run(&self, code: &str, _tests: &str) -> Result<String> {
            Ok(code.to_string())
        }
    }

    fn coordinator(ids: &[NodeId]) -> ClusterCoordinator {
        let settings = ClusterConfig {
            nodes: ids
                .iter()
                .map(|id| NodeSpec {
                    id: *id,
                    port: 9100 + *id as u16,
                })
                .collect(),
            election_settle_ms: 0,
            ..Default::default()
        };
        ClusterCoordinator::new(
            settings,
            ProblemCatalog::builtin(),
            Arc::new(Echo),
            Arc::new(AlwaysResponds),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_update_load_clamps_at_zero() {
        let coord = coordinator(&[1, 2]);
        assert_eq!(coord.update_load(1, 3).await.unwrap(), 3);
        assert_eq!(coord.update_load(1, -10).await.unwrap(), 0);
        assert!(matches!(
            coord.update_load(9, 1).await,
            Err(Error::UnknownNode(9))
        ));
    }

    #[tokio::test]
    async fn test_choose_node_prefers_idle_alive_node() {
        let coord = coordinator(&[1, 2, 3]);
        coord.update_load(1, 2).await.unwrap();
        assert_eq!(coord.choose_node_for_submission().await, Some(2));
        coord.crash_node(2).await;
        assert_eq!(coord.choose_node_for_submission().await, Some(3));
    }

    #[tokio::test]
    async fn test_ensure_leader_is_cached() {
        let coord = coordinator(&[1, 2, 3]);
        assert_eq!(coord.ensure_leader().await, Some(3));
        let term = coord.get_status().await.term;
        assert_eq!(coord.ensure_leader().await, Some(3));
        assert_eq!(coord.get_status().await.term, term);
    }

    #[tokio::test]
    async fn test_no_leader_when_all_nodes_down() {
        let coord = coordinator(&[1]);
        assert!(coord.crash_node(1).await);
        assert_eq!(coord.force_election().await, None);
        assert_eq!(
            coord.execute_submission("print(1)", "", Duration::from_secs(1)).await,
            "no nodes available"
        );
        assert!(coord.get_runtime_metrics().await.recent.is_empty());
    }

    #[tokio::test]
    async fn test_heartbeat_ticks_every_clock() {
        let coord = coordinator(&[1, 2]);
        coord.heartbeat().await;
        coord.heartbeat().await;
        let status = coord.get_status().await;
        assert!(status.nodes.values().all(|n| n.clock == 2));
        assert_eq!(status.leader, Some(2));
    }

    #[tokio::test]
    async fn test_start_does_not_stack_loops() {
        let coord = Arc::new(coordinator(&[1, 2]));
        assert!(coord.start());
        assert!(!coord.start());
        coord.stop().await;
    }
}
