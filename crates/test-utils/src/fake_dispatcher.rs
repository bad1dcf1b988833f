use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use provisioner::engine::{ExecutionOutcome, RunEvent, SharedTask, StopFlag, TaskDispatcher};
use provisioner::errors::Result;
use tokio::sync::mpsc;

/// What the fake does when a given task is dispatched.
#[derive(Debug, Clone)]
pub struct FakeRun {
    pub progress: Vec<(String, Option<u8>)>,
    pub outcome: ExecutionOutcome,
    /// Request a stop before reporting the outcome.
    pub stop: bool,
}

impl FakeRun {
    pub fn succeeded() -> Self {
        Self {
            progress: Vec::new(),
            outcome: ExecutionOutcome::succeeded(),
            stop: false,
        }
    }

    pub fn outcome(outcome: ExecutionOutcome) -> Self {
        Self {
            outcome,
            ..Self::succeeded()
        }
    }

    pub fn with_progress(mut self, action: &str, percent: Option<u8>) -> Self {
        self.progress.push((action.to_string(), percent));
        self
    }

    pub fn then_stop(mut self) -> Self {
        self.stop = true;
        self
    }
}

/// A fake dispatcher that:
/// - records which tasks were dispatched
/// - immediately reports scripted progress and a `Finished` event for each
///   (success unless a [`FakeRun`] is registered for the task name).
pub struct FakeDispatcher {
    runtime_tx: mpsc::Sender<RunEvent>,
    stop: StopFlag,
    runs: HashMap<String, FakeRun>,
    dispatched: Arc<Mutex<Vec<String>>>,
}

impl FakeDispatcher {
    pub fn new(
        runtime_tx: mpsc::Sender<RunEvent>,
        stop: StopFlag,
        dispatched: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            stop,
            runs: HashMap::new(),
            dispatched,
        }
    }

    pub fn with_run(mut self, task: &str, run: FakeRun) -> Self {
        self.runs.insert(task.to_string(), run);
        self
    }
}

impl TaskDispatcher for FakeDispatcher {
    fn dispatch(
        &mut self,
        task: SharedTask,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let stop = self.stop.clone();
        let dispatched = Arc::clone(&self.dispatched);
        let run = self
            .runs
            .get(task.name())
            .cloned()
            .unwrap_or_else(FakeRun::succeeded);

        Box::pin(async move {
            dispatched.lock().unwrap().push(task.name().to_string());

            for (action, percent) in run.progress {
                tx.send(RunEvent::Progress { action, percent })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            if run.stop {
                stop.request();
            }
            tx.send(RunEvent::Finished {
                outcome: run.outcome,
            })
            .await
            .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }
}
