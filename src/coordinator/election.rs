//! Bully leader election
//!
//! Per run: `Start -> ProbingHigher -> {Leader | Acknowledged}`.
//!
//! The initiator sends an election message to every alive node with a
//! higher id. If any of them answers, the initiator backs off and, after a
//! short settling delay, acknowledges the highest responding id as leader.
//! If none answers, the initiator declares itself leader. The winner is
//! therefore always drawn from the alive set, and it is the maximum alive
//! id whenever the oracle reflects true reachability.

use crate::common::NodeId;
use crate::coordinator::liveness::LivenessOracle;
use futures_util::future::join_all;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionPhase {
    Start,
    ProbingHigher,
    /// Initiator won
    Leader,
    /// Initiator deferred to a higher node
    Acknowledged,
}

impl std::fmt::Display for ElectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElectionPhase::Start => write!(f, "start"),
            ElectionPhase::ProbingHigher => write!(f, "probing_higher"),
            ElectionPhase::Leader => write!(f, "leader"),
            ElectionPhase::Acknowledged => write!(f, "acknowledged"),
        }
    }
}

/// One election message and whether it was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Probe {
    pub target: NodeId,
    pub responded: bool,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionOutcome {
    pub term: u64,
    pub initiator: NodeId,
    pub leader: NodeId,
    pub phase: ElectionPhase,
    pub probes: Vec<Probe>,
}

pub struct BullyElection {
    node_id: NodeId,
    alive: Vec<NodeId>,
    phase: ElectionPhase,
    leader_id: Option<NodeId>,
    settle: Duration,
}

impl BullyElection {
    /// `alive` is the set of currently alive ids, in any order
    pub fn new(node_id: NodeId, alive: &[NodeId], settle: Duration) -> Self {
        let mut alive = alive.to_vec();
        alive.sort_unstable();
        alive.dedup();
        Self {
            node_id,
            alive,
            phase: ElectionPhase::Start,
            leader_id: None,
            settle,
        }
    }

    pub fn phase(&self) -> ElectionPhase {
        self.phase
    }

    /// Last computed leader
    pub fn get_leader(&self) -> Option<NodeId> {
        self.leader_id
    }

    /// Run the election; `term` only labels the outcome
    pub async fn start_election(
        &mut self,
        term: u64,
        oracle: &dyn LivenessOracle,
    ) -> ElectionOutcome {
        tracing::info!("Node {} starting election (term {})", self.node_id, term);
        self.phase = ElectionPhase::ProbingHigher;

        let higher: Vec<NodeId> = self
            .alive
            .iter()
            .copied()
            .filter(|id| *id > self.node_id)
            .collect();

        let answers = join_all(higher.iter().map(|target| oracle.probe(self.node_id, *target))).await;
        let probes: Vec<Probe> = higher
            .iter()
            .zip(answers)
            .map(|(target, responded)| {
                tracing::debug!(
                    "node={} -> node={} ELECTION, responded={}",
                    self.node_id,
                    target,
                    responded
                );
                Probe {
                    target: *target,
                    responded,
                }
            })
            .collect();

        let highest_responder = probes
            .iter()
            .filter(|probe| probe.responded)
            .map(|probe| probe.target)
            .max();

        let leader = match highest_responder {
            Some(winner) => {
                // let the higher node finish its own round before acknowledging
                tokio::time::sleep(self.settle).await;
                self.phase = ElectionPhase::Acknowledged;
                tracing::info!("Node {} acknowledges leader {}", self.node_id, winner);
                winner
            }
            None => {
                self.phase = ElectionPhase::Leader;
                tracing::info!("Node {} became leader", self.node_id);
                self.node_id
            }
        };
        self.leader_id = Some(leader);

        ElectionOutcome {
            term,
            initiator: self.node_id,
            leader,
            phase: self.phase,
            probes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::liveness::{AlwaysResponds, NeverResponds, StaticOracle};

    #[tokio::test]
    async fn test_highest_id_initiator_wins() {
        let mut election = BullyElection::new(3, &[1, 2, 3], Duration::ZERO);
        let outcome = election.start_election(1, &AlwaysResponds).await;
        assert_eq!(outcome.leader, 3);
        assert_eq!(outcome.phase, ElectionPhase::Leader);
        assert!(outcome.probes.is_empty());
        assert_eq!(election.get_leader(), Some(3));
    }

    #[tokio::test]
    async fn test_unreachable_higher_nodes() {
        let mut election = BullyElection::new(1, &[1, 2, 3], Duration::ZERO);
        let outcome = election.start_election(1, &NeverResponds).await;
        assert_eq!(outcome.leader, 1);
        assert_eq!(outcome.probes.len(), 2);
        assert!(outcome.probes.iter().all(|p| !p.responded));
    }

    #[tokio::test]
    async fn test_reachable_higher_node_wins() {
        let mut election = BullyElection::new(1, &[3, 1, 2], Duration::ZERO);
        let outcome = election.start_election(1, &AlwaysResponds).await;
        assert_eq!(outcome.leader, 3);
        assert_eq!(outcome.phase, ElectionPhase::Acknowledged);
        assert_eq!(election.phase(), ElectionPhase::Acknowledged);
    }

    #[tokio::test]
    async fn test_max_responding_id_is_chosen() {
        // 4 is alive but unreachable, 3 answers
        let mut election = BullyElection::new(1, &[1, 2, 3, 4], Duration::ZERO);
        let outcome = election.start_election(1, &StaticOracle::new([2, 3])).await;
        assert_eq!(outcome.leader, 3);
    }

    #[tokio::test]
    async fn test_dead_ids_are_never_probed() {
        let mut election = BullyElection::new(1, &[1, 2], Duration::ZERO);
        let outcome = election.start_election(1, &AlwaysResponds).await;
        assert_eq!(outcome.leader, 2);
        assert_eq!(
            outcome.probes,
            vec![Probe {
                target: 2,
                responded: true
            }]
        );
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(ElectionPhase::ProbingHigher.to_string(), "probing_higher");
        let election = BullyElection::new(1, &[1], Duration::ZERO);
        assert_eq!(election.phase(), ElectionPhase::Start);
        assert_eq!(election.get_leader(), None);
    }
}
