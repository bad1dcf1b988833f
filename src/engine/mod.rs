// src/engine/mod.rs

//! Run engine for the provisioner.
//!
//! This module ties together:
//! - the engine context shared by every job (stop and reboot flags)
//! - the run loop that pulls one task at a time from the scheduler, runs it
//!   on a blocking worker and repaints the status surface from the
//!   foreground
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`], dispatching through [`worker`]. The
//! presentation contract is in [`status`].

use std::sync::Arc;

use crate::task::Task;

/// Result of running one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub reboot_required: bool,
    /// Extra information for the log (platform error text, fault message…).
    pub detail: Option<String>,
}

impl ExecutionOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            reboot_required: false,
            detail: None,
        }
    }

    pub fn succeeded_with_reboot() -> Self {
        Self {
            success: true,
            reboot_required: true,
            detail: None,
        }
    }

    pub fn failed(detail: Option<String>) -> Self {
        Self {
            success: false,
            reboot_required: false,
            detail,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Events flowing into the run loop from the worker (and the shell itself).
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Pull the first task. Sent once by the shell before the loop starts.
    Start,
    /// The running task reported progress. `percent == None` means
    /// indeterminate.
    Progress {
        action: String,
        percent: Option<u8>,
    },
    /// The running task finished with a concrete outcome.
    Finished { outcome: ExecutionOutcome },
}

/// Totals reported when the run loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Whether the run ended because the stop flag was set.
    pub stopped: bool,
}

/// Shared handle to a task while it is being run off the foreground.
pub type SharedTask = Arc<Task>;

pub mod context;
pub mod core;
pub mod runtime;
pub mod status;
pub mod worker;

pub use context::{EngineContext, RebootFlag, StopFlag};
pub use self::core::{CoreCommand, CoreRunLoop, CoreStep};
pub use runtime::RunLoop;
pub use status::{ConsoleStatus, StatusSurface};
pub use worker::{TaskDispatcher, WorkerDispatcher};
