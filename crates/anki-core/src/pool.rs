//! Fixed-size worker pool for independent, fallible tasks
//!
//! Workers are scoped threads pulling from a rendezvous channel, so
//! [`WorkerPool::submit`] blocks until a worker is free. A flood of notes is
//! never buffered in memory ahead of the workers.
//!
//! Tasks report their own failures (typically into a
//! [`FailureCollector`](crate::FailureCollector)); the pool only runs them.
//! Once the [`CancellationToken`] fires, workers finish their current task and
//! exit, and tasks that were not yet picked up are abandoned.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{Scope, ScopedJoinHandle};

use crate::cancel::CancellationToken;
use crate::{Error, Result};

/// A unit of work run by the pool
pub type Task<'env> = Box<dyn FnOnce() + Send + 'env>;

/// Bounded pool of worker threads living inside a [`std::thread::scope`]
pub struct WorkerPool<'scope, 'env: 'scope> {
    sender: SyncSender<Task<'env>>,
    workers: Vec<ScopedJoinHandle<'scope, ()>>,
    cancel: CancellationToken,
}

impl<'scope, 'env> WorkerPool<'scope, 'env> {
    /// Spawn exactly `workers` threads on `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParallelism`] if `workers` is zero.
    pub fn start(
        scope: &'scope Scope<'scope, 'env>,
        workers: usize,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        if workers == 0 {
            return Err(Error::InvalidParallelism { value: workers });
        }

        let (sender, receiver) = mpsc::sync_channel::<Task<'env>>(0);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..workers)
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                let cancel = cancel.clone();
                scope.spawn(move || worker_loop(index, &receiver, &cancel))
            })
            .collect();

        Ok(Self {
            sender,
            workers,
            cancel: cancel.clone(),
        })
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Hand a task to the next free worker, blocking until one takes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the run was cancelled, in which case the
    /// task is dropped without running.
    pub fn submit(&self, task: Task<'env>) -> Result<()> {
        self.cancel.check()?;

        self.sender.send(task).map_err(|_| {
            if self.cancel.is_cancelled() {
                Error::Cancelled
            } else {
                Error::Panicked {
                    subject: "worker pool".to_string(),
                }
            }
        })
    }

    /// Close the queue and wait for every worker to drain and exit.
    pub fn stop(self) -> Result<()> {
        let Self {
            sender, workers, ..
        } = self;
        drop(sender);

        let panicked = workers
            .into_iter()
            .map(ScopedJoinHandle::join)
            .filter(std::result::Result::is_err)
            .count();

        if panicked > 0 {
            return Err(Error::Panicked {
                subject: format!("{} pool worker(s)", panicked),
            });
        }

        Ok(())
    }
}

fn worker_loop(index: usize, receiver: &Mutex<Receiver<Task<'_>>>, cancel: &CancellationToken) {
    loop {
        if cancel.is_cancelled() {
            tracing::debug!(worker = index, "Worker exiting after cancellation");
            break;
        }

        let next = receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();

        let Ok(task) = next else {
            break;
        };

        if cancel.is_cancelled() {
            tracing::debug!(worker = index, "Abandoning task after cancellation");
            break;
        }

        task();
    }
}
