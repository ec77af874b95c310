//! Bounded worker pool executing match tasks.
//!
//! A fixed set of workers drains one bounded backlog queue. Saturation is a
//! caller-visible condition: submissions are rejected, never silently
//! dropped or unboundedly buffered. There is no cancellation; once queued,
//! a task runs to a terminal state.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::MatchPoolConfig;
use crate::services::task_service::TaskSubmitter;

use super::executor::MatchTaskExecutor;

/// Handle to the running pool; cheap to clone via `Arc`.
pub struct MatchWorkerPool {
    tx: mpsc::Sender<String>,
}

impl MatchWorkerPool {
    /// Spawn the workers and return the submission handle.
    pub fn start(config: &MatchPoolConfig, executor: Arc<MatchTaskExecutor>) -> Self {
        let (tx, rx) = mpsc::channel::<String>(config.queue_capacity);
        let rx = Arc::new(Mutex::new(rx));

        for worker_id in 0..config.worker_count {
            let rx = Arc::clone(&rx);
            let executor = Arc::clone(&executor);
            tokio::spawn(async move {
                loop {
                    // Hold the lock only while waiting for the next id so
                    // siblings can take over between tasks.
                    let next = { rx.lock().await.recv().await };
                    match next {
                        Some(task_id) => {
                            debug!(worker_id, task_id = %task_id, "worker picked up task");
                            executor.process(&task_id).await;
                        }
                        None => break,
                    }
                }
                debug!(worker_id, "worker stopped");
            });
        }

        info!(
            workers = config.worker_count,
            queue_capacity = config.queue_capacity,
            "match worker pool started"
        );
        Self { tx }
    }
}

impl TaskSubmitter for MatchWorkerPool {
    fn try_submit(&self, task_id: &str) -> DomainResult<()> {
        self.tx.try_send(task_id.to_string()).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => {
                DomainError::Capacity("Task backlog is full, try again later".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                DomainError::Internal("Worker pool is not running".to_string())
            }
        })
    }
}
