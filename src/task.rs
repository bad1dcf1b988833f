// src/task.rs

//! Runtime wrapper around a [`SetupDescriptor`].
//!
//! A task owns its descriptor, the expanded display name, the directory the
//! job document was loaded from and the optional display image. It runs at
//! most once, on the run loop's worker, and is settled on the foreground.

use std::any::Any;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::engine::{EngineContext, ExecutionOutcome};
use crate::env::{expand_opt, expand_vars};
use crate::errors::{ProvisionError, Result};
use crate::exec::{self, JobContext, ProgressObserver};
use crate::native::NativeSubsystems;
use crate::setup::SetupDescriptor;
use crate::types::JobKind;

/// Raw contents of a task's display image. Decoding is up to the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct Task {
    descriptor: SetupDescriptor,
    name: String,
    directory: PathBuf,
    image: Option<DisplayImage>,
    order_key: u64,
}

impl Task {
    /// Build a task for the document loaded from `document`.
    ///
    /// The image is loaded eagerly; a failure is logged and leaves the task
    /// without one.
    pub fn new(order_key: u64, document: &Path, descriptor: SetupDescriptor) -> Self {
        let name = expand_vars(&descriptor.name);
        let directory = document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let image = load_image(&name, &directory, &descriptor.image);

        Self {
            descriptor,
            name,
            directory,
            image,
            order_key,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn image(&self) -> Option<&DisplayImage> {
        self.image.as_ref()
    }

    pub fn order_key(&self) -> u64 {
        self.order_key
    }

    pub fn kind(&self) -> JobKind {
        self.descriptor.kind
    }

    pub fn is_exclusive(&self) -> bool {
        self.descriptor.exclusive
    }

    pub fn descriptor(&self) -> &SetupDescriptor {
        &self.descriptor
    }

    /// Execute the job.
    ///
    /// For the duration of the call the working directory is the task
    /// directory and the `.` environment variable holds it. Executor errors
    /// and panics are logged and reported as a failed outcome.
    pub fn run(
        &self,
        observer: &dyn ProgressObserver,
        ctx: &EngineContext,
        native: &NativeSubsystems,
    ) -> ExecutionOutcome {
        debug!(task = %self.name, kind = %self.kind(), directory = %self.directory.display(), "task starting");

        // SAFETY: tasks run strictly one at a time and nothing else in the
        // process touches the environment while one is running.
        unsafe { env::set_var(".", &self.directory) };

        let result = WorkingDirGuard::enter(&self.directory)
            .map_err(ProvisionError::from)
            .and_then(|_guard| {
                catch_unwind(AssertUnwindSafe(|| self.execute(observer, ctx, native)))
                    .unwrap_or_else(|panic| Err(ProvisionError::NativeError(panic_message(panic))))
            });

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(task = %self.name, error = %e, "job could not be run");
                ExecutionOutcome::failed(Some(e.to_string()))
            }
        }
    }

    fn execute(
        &self,
        observer: &dyn ProgressObserver,
        ctx: &EngineContext,
        native: &NativeSubsystems,
    ) -> Result<ExecutionOutcome> {
        let file = expand_vars(&self.descriptor.file);
        let parameters = expand_opt(self.descriptor.parameters.as_deref());

        let job = JobContext {
            task: &self.name,
            kind: self.descriptor.kind,
            file: &file,
            parameters: parameters.as_deref(),
            observer,
            engine: ctx,
            native,
        };
        exec::execute(&job)
    }

    /// Apply the reboot policy to `outcome` and log the result.
    ///
    /// Failures are always logged; successes only with `log_success`.
    pub fn settle(&self, outcome: &ExecutionOutcome, ctx: &EngineContext) {
        if self.descriptor.reboot.wants_reboot(outcome.reboot_required) {
            debug!(task = %self.name, policy = ?self.descriptor.reboot, "reboot scheduled");
            ctx.reboot.schedule();
        }

        if outcome.success && !self.descriptor.log_success {
            return;
        }

        let message = result_message(&self.name, outcome);
        if outcome.success {
            info!(task = %self.name, "{}", message);
        } else {
            warn!(task = %self.name, "{}", message);
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The line logged when a task settles.
pub fn result_message(name: &str, outcome: &ExecutionOutcome) -> String {
    let status = match (outcome.success, outcome.reboot_required) {
        (true, false) => "succeeded",
        (true, true) => "succeeded, a reboot is required",
        (false, _) => "failed",
    };
    match &outcome.detail {
        Some(detail) => format!("{name} {status}: {detail}"),
        None => format!("{name} {status}"),
    }
}

fn load_image(task: &str, directory: &Path, image: &str) -> Option<DisplayImage> {
    if image.trim().is_empty() {
        return None;
    }
    let path = directory.join(image);
    match fs::read(&path) {
        Ok(bytes) => Some(DisplayImage { path, bytes }),
        Err(e) => {
            warn!(task = %task, image = %path.display(), error = %e, "could not load task image");
            None
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}

/// Switches the process working directory and restores the previous one on
/// drop.
struct WorkingDirGuard {
    previous: PathBuf,
}

impl WorkingDirGuard {
    fn enter(dir: &Path) -> io::Result<Self> {
        let previous = env::current_dir()?;
        env::set_current_dir(dir)?;
        Ok(Self { previous })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.previous) {
            warn!(directory = %self.previous.display(), error = %e, "could not restore working directory");
        }
    }
}
