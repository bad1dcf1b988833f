// src/exec/script.rs

//! Script jobs and the session object scripts talk to.

use std::fs;

use anyhow::Context;
use tracing::{error, info, warn};

use super::{JobContext, JobExecutor, ProgressObserver, map_exit_code};
use crate::engine::{ExecutionOutcome, StopFlag};
use crate::errors::Result;

/// One request a script makes to its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    Action(String),
    Progress(i32),
    Information(String),
    Warning(String),
    Error(String),
    RequestReboot,
    Stop,
}

/// The session object exposed to a running script.
///
/// Action and progress changes are forwarded to the observer only when the
/// value actually changes. Log calls are recorded under the task's name.
pub struct ScriptSession<'a> {
    task: &'a str,
    observer: &'a dyn ProgressObserver,
    stop: &'a StopFlag,
    action: String,
    progress: i32,
    reboot_requested: bool,
}

impl<'a> ScriptSession<'a> {
    pub fn new(task: &'a str, observer: &'a dyn ProgressObserver, stop: &'a StopFlag) -> Self {
        Self {
            task,
            observer,
            stop,
            action: String::new(),
            progress: -1,
            reboot_requested: false,
        }
    }

    pub fn task(&self) -> &str {
        self.task
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn set_action(&mut self, action: &str) {
        if action != self.action {
            self.action = action.to_string();
            self.report();
        }
    }

    /// Current progress, `-1` when indeterminate.
    pub fn progress(&self) -> i32 {
        self.progress
    }

    /// Set the progress; values are clamped to `-1..=100`.
    pub fn set_progress(&mut self, progress: i32) {
        let progress = progress.clamp(-1, 100);
        if progress != self.progress {
            self.progress = progress;
            self.report();
        }
    }

    pub fn information(&self, message: &str) {
        info!(task = %self.task, "{}", message);
    }

    pub fn warning(&self, message: &str) {
        warn!(task = %self.task, "{}", message);
    }

    pub fn error(&self, message: &str) {
        error!(task = %self.task, "{}", message);
    }

    /// Ask for a reboot once the run is over (subject to the job's policy).
    pub fn request_reboot(&mut self) {
        self.reboot_requested = true;
    }

    /// Keep the scheduler from starting any further task.
    pub fn stop(&self) {
        self.stop.request();
    }

    pub fn reboot_requested(&self) -> bool {
        self.reboot_requested
    }

    pub fn apply(&mut self, call: SessionCall) {
        match call {
            SessionCall::Action(action) => self.set_action(&action),
            SessionCall::Progress(progress) => self.set_progress(progress),
            SessionCall::Information(message) => self.information(&message),
            SessionCall::Warning(message) => self.warning(&message),
            SessionCall::Error(message) => self.error(&message),
            SessionCall::RequestReboot => self.request_reboot(),
            SessionCall::Stop => self.stop(),
        }
    }

    fn report(&self) {
        let percent = u8::try_from(self.progress).ok();
        self.observer.report(&self.action, percent);
    }
}

/// Runs `run-script` jobs through the configured [`crate::native::ScriptHost`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptExecutor;

impl JobExecutor for ScriptExecutor {
    fn execute(&self, job: &JobContext<'_>) -> Result<ExecutionOutcome> {
        let body = fs::read_to_string(job.file)
            .with_context(|| format!("reading script '{}'", job.file))?;

        let mut session = ScriptSession::new(job.task, job.observer, &job.engine.stop);
        let outcome = match job.native.scripts.run(&body, job.parameters, &mut session) {
            Ok(code) => {
                let mut outcome = map_exit_code(code, &job.engine.stop);
                outcome.reboot_required |= session.reboot_requested();
                outcome
            }
            Err(fault) => ExecutionOutcome {
                success: false,
                reboot_required: session.reboot_requested(),
                detail: Some(fault.0),
            },
        };
        Ok(outcome)
    }
}
