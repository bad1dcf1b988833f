// src/engine/core.rs

//! Pure core run-loop state machine.
//!
//! The core consumes [`RunEvent`]s and produces commands for the IO shell
//! (`engine::runtime::RunLoop`). It owns the task sequence and the running
//! task but performs no IO: no channels, no threads, no status surface.
//!
//! Lifecycle:
//! - `Start` pulls the first task (`BeginTask` + `Dispatch`) or exits.
//! - `Progress` is forwarded as `ShowProgress` while a task is running.
//! - `Finished` settles the running task, clears the surface and pulls the
//!   next task, or exits when the sequence has ended.

use std::sync::Arc;

use tracing::debug;

use crate::engine::{ExecutionOutcome, RunEvent, RunSummary, SharedTask, StopFlag};
use crate::task::Task;

/// Something the IO shell must do, in order.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Show the task on the status surface.
    BeginTask(SharedTask),
    /// Run the task on the worker.
    Dispatch(SharedTask),
    ShowProgress {
        action: String,
        percent: Option<u8>,
    },
    /// Apply the reboot policy and log the result. Runs on the foreground
    /// before the next task is dispatched.
    Settle {
        task: SharedTask,
        outcome: ExecutionOutcome,
    },
    Clear,
    /// The sequence has ended.
    Exit,
}

/// Result of one core step.
#[derive(Debug)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// `false` once the core has nothing left to do.
    pub keep_running: bool,
}

impl CoreStep {
    fn idle() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }
}

#[derive(Debug)]
pub struct CoreRunLoop<I> {
    tasks: I,
    current: Option<SharedTask>,
    stop: StopFlag,
    summary: RunSummary,
    finished: bool,
}

impl<I> CoreRunLoop<I>
where
    I: Iterator<Item = Task>,
{
    /// `stop` is only read, to report whether the run was cut short.
    pub fn new(tasks: I, stop: StopFlag) -> Self {
        Self {
            tasks,
            current: None,
            stop,
            summary: RunSummary::default(),
            finished: false,
        }
    }

    pub fn current(&self) -> Option<&SharedTask> {
        self.current.as_ref()
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn step(&mut self, event: RunEvent) -> CoreStep {
        if self.finished {
            return CoreStep {
                commands: Vec::new(),
                keep_running: false,
            };
        }

        match event {
            RunEvent::Start => {
                if self.current.is_some() {
                    debug!("start ignored: a task is already running");
                    return CoreStep::idle();
                }
                let mut commands = Vec::new();
                let keep_running = self.advance(&mut commands);
                CoreStep {
                    commands,
                    keep_running,
                }
            }
            RunEvent::Progress { action, percent } => {
                if self.current.is_none() {
                    return CoreStep::idle();
                }
                CoreStep {
                    commands: vec![CoreCommand::ShowProgress { action, percent }],
                    keep_running: true,
                }
            }
            RunEvent::Finished { outcome } => {
                let Some(task) = self.current.take() else {
                    debug!("finish ignored: no task is running");
                    return CoreStep::idle();
                };
                if outcome.success {
                    self.summary.succeeded += 1;
                } else {
                    self.summary.failed += 1;
                }

                let mut commands = vec![CoreCommand::Settle { task, outcome }, CoreCommand::Clear];
                let keep_running = self.advance(&mut commands);
                CoreStep {
                    commands,
                    keep_running,
                }
            }
        }
    }

    /// Pull the next task. Returns whether the loop keeps running.
    fn advance(&mut self, commands: &mut Vec<CoreCommand>) -> bool {
        match self.tasks.next() {
            Some(task) => {
                let task = Arc::new(task);
                self.current = Some(Arc::clone(&task));
                commands.push(CoreCommand::BeginTask(Arc::clone(&task)));
                commands.push(CoreCommand::Dispatch(task));
                true
            }
            None => {
                self.summary.stopped = self.stop.is_requested();
                self.finished = true;
                commands.push(CoreCommand::Exit);
                false
            }
        }
    }
}
