//! Concurrent map primitive
//!
//! `map(items, f)` runs `f` once per item and returns the results in
//! submission order, whatever order the workers finish in. A failing worker
//! only affects its own slot.

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Semaphore, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Why a slot carries no result
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    #[error("Worker panicked: {0}")]
    Panicked(String),

    #[error("Worker was cancelled")]
    Cancelled,
}

/// Injectable fan-out/gather executor
#[async_trait]
pub trait ConcurrentMapExecutor: Send + Sync {
    /// Apply `f` to every item; `result[i]` always corresponds to `items[i]`
    async fn map<I, O, F, Fut>(&self, items: Vec<I>, f: F) -> Vec<Result<O, TaskFailure>>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static;
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

/// Worker pool on the tokio runtime with a fixed concurrency limit.
///
/// Every item gets its own task and one-shot result channel, but only
/// `limit` tasks run `f` at once. Cancelling the token stops queued and
/// in-flight workers; their slots report `TaskFailure::Cancelled`.
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    limit: NonZeroUsize,
    cancellation: CancellationToken,
}

impl BoundedExecutor {
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            limit,
            cancellation: CancellationToken::new(),
        }
    }

    /// Tie this executor to an external cancellation source
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub const fn limit(&self) -> NonZeroUsize {
        self.limit
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }
}

#[async_trait]
impl ConcurrentMapExecutor for BoundedExecutor {
    async fn map<I, O, F, Fut>(&self, items: Vec<I>, f: F) -> Vec<Result<O, TaskFailure>>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.limit.get()));
        let f = Arc::new(f);

        // Dropping the gather future (e.g. an outer timeout) stops every worker
        let batch_token = self.cancellation.child_token();
        let _stop_workers_on_drop = batch_token.clone().drop_guard();

        debug!("Dispatching {} workers (limit {})", items.len(), self.limit);

        let slots: Vec<_> = items
            .into_iter()
            .map(|item| {
                let (tx, rx) = oneshot::channel();
                let semaphore = Arc::clone(&semaphore);
                let f = Arc::clone(&f);
                let token = batch_token.clone();

                let handle = tokio::spawn(async move {
                    let outcome = tokio::select! {
                        biased;
                        () = token.cancelled() => Err(TaskFailure::Cancelled),
                        output = async {
                            let _permit = semaphore.acquire().await.ok();
                            f(item).await
                        } => Ok(output),
                    };
                    // The receiver is only gone when the gather was dropped
                    let _ = tx.send(outcome);
                });

                (rx, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(slots.len());
        for (index, (rx, handle)) in slots.into_iter().enumerate() {
            let outcome = match rx.await {
                Ok(outcome) => outcome,
                Err(_) => match handle.await {
                    Err(join_error) if join_error.is_panic() => {
                        let message = panic_message(join_error.into_panic().as_ref());
                        warn!("Worker {} panicked: {}", index, message);
                        Err(TaskFailure::Panicked(message))
                    }
                    _ => Err(TaskFailure::Cancelled),
                },
            };
            results.push(outcome);
        }

        results
    }
}

/// Deterministic executor: runs items one at a time on the calling task.
///
/// Panics are still contained per slot, which keeps its failure behaviour
/// identical to `BoundedExecutor` for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

#[async_trait]
impl ConcurrentMapExecutor for InlineExecutor {
    async fn map<I, O, F, Fut>(&self, items: Vec<I>, f: F) -> Vec<Result<O, TaskFailure>>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let outcome = AssertUnwindSafe(async { f(item).await })
                .catch_unwind()
                .await
                .map_err(|payload| TaskFailure::Panicked(panic_message(payload.as_ref())));
            results.push(outcome);
        }
        results
    }
}
