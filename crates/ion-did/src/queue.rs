//! FIFO task queue serializing access to an operation log.
//!
//! Tasks go onto an unbounded channel the moment they are enqueued and a
//! single worker runs them one at a time, so issue order is completion order
//! no matter how long each task suspends.
//!
//! A task's error or panic is delivered to its own caller only; the worker
//! moves on to the next task. Dropping the future returned by
//! [`OperationQueue::enqueue`] does not cancel the task.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{DidError, Result};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handle to a running queue. Cloning shares the same worker.
///
/// The worker exits once every handle is dropped and the already-enqueued
/// tasks have run.
#[derive(Debug, Clone)]
pub struct OperationQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl OperationQueue {
    /// Start a worker on the current Tokio runtime.
    pub fn spawn() -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| DidError::NoRuntime)?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        handle.spawn(async move {
            while let Some(job) = rx.recv().await {
                job.await;
            }
            debug!("operation queue closed");
        });

        Ok(Self { tx })
    }

    /// Place `task` on the queue now and return a receiver for its result.
    pub fn dispatch<F, T>(&self, task: F) -> Result<oneshot::Receiver<Result<T>>>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let outcome = match AssertUnwindSafe(task).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    warn!("queued task panicked");
                    Err(DidError::TaskPanicked)
                }
            };
            // The caller may have stopped waiting.
            let _ = reply_tx.send(outcome);
        });

        self.tx.send(job).map_err(|_| DidError::QueueClosed)?;
        Ok(reply_rx)
    }

    /// Place `task` on the queue now; the returned future resolves with its
    /// result once every earlier task has finished.
    pub fn enqueue<F, T>(&self, task: F) -> impl Future<Output = Result<T>> + Send + 'static
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let dispatched = self.dispatch(task);
        async move { dispatched?.await.map_err(|_| DidError::QueueClosed)? }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
