//! Bounded per-node worker pool
//!
//! A pool admits at most `size` concurrent jobs; extra jobs queue on the
//! semaphore. Closing the pool releases every queued job with
//! `WorkerPoolClosed` while jobs that already hold a slot run to the end.
//! `shutdown` additionally cancels the running jobs.

use crate::common::{Error, NodeId, Result};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;

pub struct WorkerPool {
    node_id: NodeId,
    size: usize,
    semaphore: Arc<Semaphore>,
    free_slots: Arc<Mutex<Vec<usize>>>,
    cancel: watch::Sender<bool>,
}

impl WorkerPool {
    pub fn new(node_id: NodeId, size: usize) -> Self {
        Self {
            node_id,
            size,
            semaphore: Arc::new(Semaphore::new(size)),
            free_slots: Arc::new(Mutex::new((0..size).rev().collect())),
            cancel: watch::channel(false).0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots currently not held by a running job
    pub fn idle(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Stop admitting jobs and cancel the queued ones
    pub fn close(&self) {
        self.semaphore.close();
        tracing::info!("Worker pool of node {} closed", self.node_id);
    }

    /// Close the pool and drop every running job
    pub fn shutdown(&self) {
        self.close();
        self.cancel.send_replace(true);
    }

    /// Queue `job`; it receives the label of the slot it runs on
    pub fn submit<F, Fut, T>(&self, job: F) -> JoinHandle<Result<T>>
    where
        F: FnOnce(String) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let node_id = self.node_id;
        let semaphore = self.semaphore.clone();
        let free_slots = self.free_slots.clone();
        let mut cancel = self.cancel.subscribe();
        tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| Error::WorkerPoolClosed(node_id))?;
            let slot = WorkerSlot::take(node_id, free_slots);
            let output = tokio::select! {
                output = job(slot.label()) => output,
                _ = cancelled(&mut cancel) => {
                    return Err(Error::WorkerPoolShutdown(node_id));
                }
            };
            drop(slot);
            Ok(output)
        })
    }
}

/// Resolves once the pool is shut down; never if the pool is dropped first
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let dropped = cancel.wait_for(|cancelled| *cancelled).await.is_err();
    if dropped {
        std::future::pending::<()>().await;
    }
}

/// A slot index held for the duration of one job
struct WorkerSlot {
    node_id: NodeId,
    index: usize,
    free_slots: Arc<Mutex<Vec<usize>>>,
}

impl WorkerSlot {
    fn take(node_id: NodeId, free_slots: Arc<Mutex<Vec<usize>>>) -> Self {
        // a permit is held, so a slot index is free
        let index = free_slots
            .lock()
            .map(|mut slots| slots.pop().unwrap_or(0))
            .unwrap_or(0);
        Self {
            node_id,
            index,
            free_slots,
        }
    }

    fn label(&self) -> String {
        format!("N{}-w{}", self.node_id, self.index)
    }
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        if let Ok(mut slots) = self.free_slots.lock() {
            slots.push(self.index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_runs_job_with_slot_label() {
        let pool = WorkerPool::new(1, 2);
        let label = pool.submit(|label| async move { label }).await.unwrap().unwrap();
        assert_eq!(label, "N1-w0");
        assert_eq!(pool.idle(), 2);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::new(1, 2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let running = running.clone();
                let peak = peak.clone();
                pool.submit(move |_| async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_close_cancels_queued_jobs() {
        let pool = WorkerPool::new(3, 1);
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();

        let running = pool.submit(move |_| async move {
            let _ = started_tx.send(());
            let _ = release_rx.await;
            "finished"
        });
        started_rx.await.unwrap();

        let queued = pool.submit(|_| async { "never" });
        pool.close();
        assert!(pool.is_closed());

        let err = queued.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::WorkerPoolClosed(3)));

        // the job holding a slot is not interrupted
        release_tx.send(()).unwrap();
        assert_eq!(running.await.unwrap().unwrap(), "finished");
    }

    #[tokio::test]
    async fn test_shutdown_drops_running_jobs() {
        let pool = WorkerPool::new(2, 1);
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let running = pool.submit(move |_| async move {
            let _ = started_tx.send(());
            std::future::pending::<()>().await;
        });
        started_rx.await.unwrap();

        pool.shutdown();
        let err = tokio::time::timeout(Duration::from_secs(1), running)
            .await
            .unwrap()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, Error::WorkerPoolShutdown(2)));
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn test_dropping_the_pool_keeps_running_jobs() {
        let pool = WorkerPool::new(4, 1);
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let running = pool.submit(move |_| async move {
            let _ = release_rx.await;
            "done"
        });
        drop(pool);
        release_tx.send(()).unwrap();
        assert_eq!(running.await.unwrap().unwrap(), "done");
    }
}
