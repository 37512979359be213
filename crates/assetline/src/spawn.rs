//! Executor seam for running fetch operations.
//!
//! A fetch runs detached from the callers that asked for it, so that
//! dropping every requester does not abandon a half-finished fetch. The
//! pipeline hands the operation to a [`Spawn`] implementation instead of
//! naming an executor directly.

use std::{future::Future, pin::Pin};

/// A boxed, sendable unit of background work.
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs background tasks to completion.
pub trait Spawn: Send + Sync {
    /// Spawn a task that runs to completion.
    ///
    /// For tasks that need to return values, use channels to communicate
    /// results back to the caller.
    fn spawn(&self, task: Task);
}

/// Spawns onto a Tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner {
    handle: Option<tokio::runtime::Handle>,
}

impl TokioSpawner {
    /// Spawn onto whichever runtime is current when a task is spawned.
    ///
    /// Outside a Tokio runtime the task is dropped unrun.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn onto a specific runtime, from any thread.
    #[must_use]
    pub fn with_handle(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

impl Spawn for TokioSpawner {
    fn spawn(&self, task: Task) {
        let handle = match &self.handle {
            Some(handle) => handle.clone(),
            None => match tokio::runtime::Handle::try_current() {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::error!("cannot spawn task: {e}");
                    return;
                }
            },
        };
        drop(handle.spawn(task));
    }
}
