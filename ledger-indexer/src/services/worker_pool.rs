//! Bounded worker pool
//!
//! One pool is built at startup and handed to every component that fans out
//! work, so export, backfill and tests share the same capacity knob.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::core::error::{IndexerError, IndexerResult};

#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `task` once per unit with at most `workers` running at a time.
    ///
    /// Submission waits for a free worker. Every unit is driven to completion
    /// before returning; results come back in unit order, or the first error
    /// in unit order.
    pub async fn map<U, T, F, Fut>(&self, units: Vec<U>, task: F) -> IndexerResult<Vec<T>>
    where
        U: Send + 'static,
        T: Send + 'static,
        F: Fn(U) -> Fut,
        Fut: Future<Output = IndexerResult<T>> + Send + 'static,
    {
        let total = units.len();
        let mut set = JoinSet::new();
        for (position, unit) in units.into_iter().enumerate() {
            let permit = self
                .permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| IndexerError::Other(anyhow::anyhow!("worker pool closed: {}", e)))?;
            let fut = task(unit);
            set.spawn(async move {
                let result = fut.await;
                drop(permit);
                (position, result)
            });
        }

        let mut slots: Vec<Option<IndexerResult<T>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            let (position, result) =
                joined.map_err(|e| IndexerError::Other(anyhow::anyhow!("worker task failed: {}", e)))?;
            slots[position] = Some(result);
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err(IndexerError::Other(anyhow::anyhow!("worker result missing")))))
            .collect()
    }
}
