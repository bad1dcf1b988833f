// src/exec/mod.rs

//! Job executors.
//!
//! One strategy per family of [`JobKind`]s, each wrapping a native subsystem
//! call and translating its result into an [`ExecutionOutcome`]:
//!
//! - [`package`] — package install, patch, product removal (with the
//!   [`progress`] decoder on the installer's message stream).
//! - [`update`] — update-agent install/removal.
//! - [`script`] — script execution with a session object.
//! - [`executable`] — plain executables, optionally without a window.
//! - [`driver`] — driver staging and device updates.
//!
//! [`exit_code`] holds the shared exit-code policy.

use crate::engine::{EngineContext, ExecutionOutcome};
use crate::errors::Result;
use crate::native::NativeSubsystems;
use crate::types::JobKind;

pub mod driver;
pub mod executable;
pub mod exit_code;
pub mod package;
pub mod progress;
pub mod script;
pub mod update;

pub use exit_code::map_exit_code;
pub use progress::ProgressDecoder;
pub use script::{ScriptSession, SessionCall};

/// Receives `(action, percent)` updates from a running job.
///
/// `percent == None` means the job cannot tell how far along it is.
pub trait ProgressObserver {
    fn report(&self, action: &str, percent: Option<u8>);
}

impl<F> ProgressObserver for F
where
    F: Fn(&str, Option<u8>),
{
    fn report(&self, action: &str, percent: Option<u8>) {
        self(action, percent)
    }
}

/// Everything an executor needs to run one job.
///
/// `file` and `parameters` are already expanded.
pub struct JobContext<'a> {
    /// Task name, used as the identity in log records.
    pub task: &'a str,
    pub kind: JobKind,
    pub file: &'a str,
    pub parameters: Option<&'a str>,
    pub observer: &'a dyn ProgressObserver,
    pub engine: &'a EngineContext,
    pub native: &'a NativeSubsystems,
}

/// A strategy for one family of job kinds.
///
/// An `Err` is a fault: the task layer logs it and reports the job as failed.
pub trait JobExecutor: Sync {
    fn execute(&self, job: &JobContext<'_>) -> Result<ExecutionOutcome>;
}

/// Pick the executor for `kind`.
pub fn executor_for(kind: JobKind) -> &'static dyn JobExecutor {
    match kind {
        JobKind::InstallPackage | JobKind::ApplyPatch | JobKind::RemoveProduct => {
            &package::PackageExecutor
        }
        JobKind::InstallUpdateFile | JobKind::RemoveUpdateById => &update::UpdateExecutor,
        JobKind::RunScript => &script::ScriptExecutor,
        JobKind::RunExecutable | JobKind::RunExecutableHidden => &executable::ExecutableExecutor,
        JobKind::InstallDriverFile | JobKind::InstallDriverFileInteractive => {
            &driver::DriverExecutor
        }
    }
}

/// Run `job` with the executor for its kind.
pub fn execute(job: &JobContext<'_>) -> Result<ExecutionOutcome> {
    executor_for(job.kind).execute(job)
}
