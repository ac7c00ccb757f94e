//! Bounded concurrent dispatch.
//!
//! Every work item gets its own task up front; a counting semaphore decides
//! which of them may run. The same primitive drives liveness checks, port
//! probes and host fan-out, each with its own ceiling.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Everything a dispatch produced once all of its tasks have finished.
#[derive(Debug)]
pub struct Dispatched<R> {
    /// One entry per task that ran to completion, in completion order.
    pub results: Vec<R>,
    /// Tasks that panicked or were aborted.
    pub failures: Vec<JoinError>,
    /// Whether the token fired before every task completed.
    pub cancelled: bool,
}

/// Runs work items with at most `limit` of them in flight.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    limit: usize,
}

impl Dispatcher {
    /// Create a dispatcher; a zero limit is raised to one.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Spawn one task per item and wait for all of them.
    ///
    /// `work` is called on the current task to build each future; the future
    /// itself only starts once its task holds a permit. Cancelling `cancel`
    /// makes waiting tasks give up and running ones drop their work, so the
    /// call returns without waiting for slow I/O.
    pub async fn run<I, F, Fut, R>(
        &self,
        items: I,
        cancel: &CancellationToken,
        work: F,
    ) -> Dispatched<R>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut tasks = JoinSet::new();

        for item in items {
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let job = work(item);

            tasks.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                let Some(_permit) = permit else {
                    return None;
                };

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = job => Some(result),
                }
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => failures.push(e),
            }
        }

        Dispatched {
            results,
            failures,
            cancelled: cancel.is_cancelled(),
        }
    }
}
