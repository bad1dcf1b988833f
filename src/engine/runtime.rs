// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::task::Task;

use super::core::CoreRunLoop;
use super::status::StatusSurface;
use super::worker::TaskDispatcher;
use super::{CoreCommand, EngineContext, RunEvent, RunSummary};

/// Foreground run loop.
///
/// This is the IO shell around [`CoreRunLoop`]: it receives events from the
/// worker, feeds them to the core and carries out the resulting commands on
/// the status surface and the dispatcher. Only this task touches the
/// surface.
pub struct RunLoop<I, S, D> {
    core: CoreRunLoop<I>,
    event_rx: mpsc::Receiver<RunEvent>,
    status: S,
    dispatcher: D,
    ctx: EngineContext,
}

impl<I, S, D> fmt::Debug for RunLoop<I, S, D>
where
    I: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLoop")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<I, S, D> RunLoop<I, S, D>
where
    I: Iterator<Item = Task>,
    S: StatusSurface,
    D: TaskDispatcher,
{
    pub fn new(
        tasks: I,
        event_rx: mpsc::Receiver<RunEvent>,
        status: S,
        dispatcher: D,
        ctx: EngineContext,
    ) -> Self {
        Self {
            core: CoreRunLoop::new(tasks, ctx.stop.clone()),
            event_rx,
            status,
            dispatcher,
            ctx,
        }
    }

    /// Run until the sequence ends, then return the totals.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!("run loop started");

        let mut event = RunEvent::Start;
        loop {
            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command).await?;
            }
            if !step.keep_running {
                break;
            }

            event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("run event channel closed; exiting");
                    break;
                }
            };
            debug!(?event, "run loop received event");
        }

        let summary = self.core.summary();
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            stopped = summary.stopped,
            "run loop finished"
        );
        Ok(summary)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::BeginTask(task) => self.status.begin_task(task.name(), task.image()),
            CoreCommand::Dispatch(task) => self.dispatcher.dispatch(task).await?,
            CoreCommand::ShowProgress { action, percent } => self.status.progress(&action, percent),
            CoreCommand::Settle { task, outcome } => task.settle(&outcome, &self.ctx),
            CoreCommand::Clear => self.status.clear(),
            CoreCommand::Exit => debug!("sequence ended"),
        }
        Ok(())
    }
}
