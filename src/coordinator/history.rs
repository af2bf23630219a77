//! Task records and the bounded history of completed tasks

use crate::common::{NodeId, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// `Running` only appears in live task views, records carry the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Running,
    Ok,
    Error,
    Timeout,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Running => write!(f, "RUNNING"),
            TaskStatus::Ok => write!(f, "OK"),
            TaskStatus::Error => write!(f, "ERROR"),
            TaskStatus::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub node_id: NodeId,
    /// Unix seconds
    pub started_at: f64,
    pub status: TaskStatus,
    pub output: String,
    /// Seconds, millisecond precision
    pub duration: f64,
    /// Worker slot the task ran on, if it got one
    pub worker: Option<String>,
    /// Node clock at assignment
    pub sent_clock: u64,
    /// Node clock at completion
    pub completed_clock: u64,
}

/// Fixed-capacity ring of the most recent task records
#[derive(Debug, Clone)]
pub struct TaskHistory {
    capacity: usize,
    records: VecDeque<TaskRecord>,
}

impl TaskHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append, evicting the oldest record when full
    pub fn push(&mut self, record: TaskRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records.iter()
    }

    pub fn to_vec(&self) -> Vec<TaskRecord> {
        self.records.iter().cloned().collect()
    }
}
