//! Runaway submissions on the process sandbox

mod common;

use common::settings;
use minijudge::common::SandboxConfig;
use minijudge::coordinator::catalog::ProblemCatalog;
use minijudge::coordinator::liveness::AlwaysResponds;
use minijudge::coordinator::sandbox::ProcessSandbox;
use minijudge::ClusterCoordinator;
use std::sync::Arc;
use std::time::Duration;

fn python_cluster(workers: usize, max_runtime_ms: u64) -> Option<Arc<ClusterCoordinator>> {
    let sandbox = SandboxConfig {
        max_runtime_ms,
        ..Default::default()
    };
    let available = std::process::Command::new(&sandbox.interpreter)
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    if !available {
        eprintln!("{} not found, skipping", sandbox.interpreter);
        return None;
    }

    let mut cluster = settings(&[1]);
    cluster.workers_per_node = workers;
    let coordinator = ClusterCoordinator::new(
        cluster,
        ProblemCatalog::builtin(),
        Arc::new(ProcessSandbox::new(&sandbox)),
        Arc::new(AlwaysResponds),
    )
    .unwrap();
    Some(Arc::new(coordinator))
}

#[tokio::test]
async fn test_infinite_loops_release_their_slots() {
    let Some(coord) = python_cluster(2, 500) else { return };

    for _ in 0..2 {
        let output = coord
            .execute_submission("while True: pass", "", Duration::from_millis(100))
            .await;
        assert_eq!(output, "TIMEOUT");
    }

    // both slots are busy until the sandbox limit kills the loops
    let output = coord
        .execute_submission("print('ok')", "", Duration::from_secs(5))
        .await;
    assert_eq!(output, "ok\n");

    let node = coord.node(1).await.unwrap();
    assert_eq!(node.load, 0);
}

#[tokio::test]
async fn test_loop_within_deadline_reports_the_kill() {
    let Some(coord) = python_cluster(1, 300) else { return };
    let output = coord
        .execute_submission("while True: pass", "", Duration::from_secs(5))
        .await;
    assert!(output.starts_with("ERROR: killed after 300ms"), "{}", output);
}

#[tokio::test]
async fn test_stop_cancels_running_interpreters() {
    let Some(coord) = python_cluster(1, 60_000) else { return };

    let runner = coord.clone();
    let submission = tokio::spawn(async move {
        runner
            .execute_submission("while True: pass", "", Duration::from_secs(30))
            .await
    });
    common::wait_until(|| {
        let coord = coord.clone();
        async move {
            let metrics = coord.get_runtime_metrics().await;
            metrics.running["1"].values().any(|task| task.thread.is_some())
        }
    })
    .await;

    coord.stop().await;
    let output = tokio::time::timeout(Duration::from_secs(5), submission)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(output, "ERROR: node 1 shut down");
}
