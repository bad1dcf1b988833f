// src/engine/worker.rs

//! Pluggable task dispatch.
//!
//! The run loop hands each task to a [`TaskDispatcher`] instead of spawning
//! it directly, so tests can substitute a dispatcher that reports scripted
//! events without running real jobs.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::warn;

use crate::engine::{EngineContext, RunEvent, SharedTask};
use crate::errors::Result;
use crate::native::NativeSubsystems;

/// Starts a task off the foreground.
///
/// Implementations must eventually deliver exactly one
/// [`RunEvent::Finished`] for every dispatched task.
pub trait TaskDispatcher: Send {
    fn dispatch(
        &mut self,
        task: SharedTask,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs each task on a blocking worker thread.
///
/// Progress and the final outcome are posted back with `blocking_send`, so
/// the worker waits for the foreground to accept each hand-off.
pub struct WorkerDispatcher {
    tx: mpsc::Sender<RunEvent>,
    ctx: EngineContext,
    native: NativeSubsystems,
}

impl WorkerDispatcher {
    pub fn new(tx: mpsc::Sender<RunEvent>, ctx: EngineContext, native: NativeSubsystems) -> Self {
        Self { tx, ctx, native }
    }
}

impl TaskDispatcher for WorkerDispatcher {
    fn dispatch(
        &mut self,
        task: SharedTask,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        let native = self.native.clone();

        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                let observer = |action: &str, percent: Option<u8>| {
                    let _ = tx.blocking_send(RunEvent::Progress {
                        action: action.to_string(),
                        percent,
                    });
                };
                let outcome = task.run(&observer, &ctx, &native);
                if tx.blocking_send(RunEvent::Finished { outcome }).is_err() {
                    warn!(task = %task.name(), "run loop is gone; outcome dropped");
                }
            });
            Ok(())
        })
    }
}
