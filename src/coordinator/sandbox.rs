//! Execution sandbox collaborator
//!
//! The coordinator only relies on the contract: run a submission and its
//! tests with a bounded set of built-ins, return captured stdout, fail
//! with the error message when the code raises.
//!
//! The caller's submission timeout only stops the wait. The interpreter
//! itself is bounded by `max_runtime_ms` and killed when it runs over or
//! when its future is dropped, so a runaway submission never holds a
//! worker slot for longer than that.

use crate::common::{Error, Result, SandboxConfig};
use async_trait::async_trait;
use serde::Serialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Run `code` then `tests`; `Ok` holds the captured stdout,
    /// `Err(Error::Execution)` the message of whatever the code raised.
    async fn run(&self, code: &str, tests: &str) -> Result<String>;
}

/// Interpreter driver: reads `{code, tests}` on stdin, executes both with
/// a whitelisted builtins table, reports exceptions on stderr.
const RESTRICTED_RUNNER: &str = r#"
import builtins, json, sys
allowed = ("range", "len", "sum", "min", "max", "print", "abs", "enumerate",
           "map", "filter", "list", "dict", "set", "int", "float", "str",
           "bool", "zip", "sorted", "reversed", "tuple", "any", "all",
           "AssertionError", "Exception", "ValueError", "IndexError", "KeyError")
job = json.load(sys.stdin)
scope = {"__builtins__": {name: getattr(builtins, name) for name in allowed}}
try:
    exec(job["code"], scope, scope)
    if job["tests"].strip():
        exec(job["tests"], scope, scope)
except BaseException as ex:
    sys.stdout.flush()
    sys.stderr.write(str(ex) or type(ex).__name__)
    sys.exit(1)
"#;

#[derive(Serialize)]
struct Job<'a> {
    code: &'a str,
    tests: &'a str,
}

/// Runs submissions in a fresh interpreter process per task
#[derive(Debug, Clone)]
pub struct ProcessSandbox {
    interpreter: String,
    args: Vec<String>,
    max_runtime: Duration,
}

impl ProcessSandbox {
    pub fn new(config: &SandboxConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            args: config.args.clone(),
            max_runtime: config.max_runtime(),
        }
    }
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    async fn run(&self, code: &str, tests: &str) -> Result<String> {
        let job = serde_json::to_vec(&Job { code, tests })
            .map_err(|e| Error::Internal(format!("Serialize error: {}", e)))?;

        let mut child = Command::new(&self.interpreter)
            .args(&self.args)
            .arg("-c")
            .arg(RESTRICTED_RUNNER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Execution(format!("cannot start {}: {}", self.interpreter, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&job).await?;
        }

        // dropping the wait on expiry drops the child, which kills it
        let output = match tokio::time::timeout(self.max_runtime, child.wait_with_output()).await
        {
            Ok(output) => output?,
            Err(_) => {
                tracing::warn!(
                    "Interpreter killed after {:?} sandbox limit",
                    self.max_runtime
                );
                return Err(Error::Execution(format!(
                    "killed after {}ms sandbox limit",
                    self.max_runtime.as_millis()
                )));
            }
        };
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            Err(Error::Execution(if message.is_empty() {
                format!("interpreter exited with {}", output.status)
            } else {
                message.to_string()
            }))
        }
    }
}
