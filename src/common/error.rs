//! Error types for minijudge

use crate::common::NodeId;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Dispatch Errors ===
    #[error("no nodes available")]
    NoNodesAvailable,

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Worker pool of node {0} is closed")]
    WorkerPoolClosed(NodeId),

    #[error("Worker pool of node {0} shut down")]
    WorkerPoolShutdown(NodeId),

    // === Execution Errors ===
    #[error("{0}")]
    Execution(String),

    #[error("Execution exceeded {0:?}")]
    ExecutionTimeout(Duration),

    // === Election Errors ===
    #[error("Election inconclusive")]
    ElectionInconclusive,

    // === Network Errors ===
    #[error("HTTP error: {0}")]
    Http(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration source error: {0}")]
    Config(#[from] config::ConfigError),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Output string reported to the submitter for a failed submission
    pub fn to_output(&self) -> String {
        match self {
            Error::NoNodesAvailable => "no nodes available".to_string(),
            Error::ExecutionTimeout(_) => "TIMEOUT".to_string(),
            Error::WorkerPoolClosed(node) => {
                format!("ERROR: node {} crashed before the task started", node)
            }
            Error::WorkerPoolShutdown(node) => format!("ERROR: node {} shut down", node),
            Error::Execution(message) => format!("ERROR: {}", message),
            other => format!("ERROR: {}", other),
        }
    }

    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Error::UnknownNode(_) => StatusCode::NOT_FOUND,
            Error::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            Error::ExecutionTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            Error::NoNodesAvailable | Error::ElectionInconclusive => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}
