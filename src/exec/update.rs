// src/exec/update.rs

//! Update-agent install and removal.

use std::path::Path;

use super::{JobContext, JobExecutor, map_exit_code};
use crate::engine::{ExecutionOutcome, StopFlag};
use crate::env::join_args;
use crate::errors::{ProvisionError, Result};
use crate::native::LaunchSpec;
use crate::types::JobKind;

/// Generic failure reported by the update agent.
pub const UPDATE_FAILED: u32 = 1;
pub const UPDATE_ALREADY_INSTALLED: u32 = 0x0024_0006;
pub const UPDATE_NOT_INSTALLED: u32 = 0x0024_0007;
pub const UPDATE_NOT_APPLICABLE: u32 = 0x8024_0017;

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateExecutor;

impl JobExecutor for UpdateExecutor {
    fn execute(&self, job: &JobContext<'_>) -> Result<ExecutionOutcome> {
        let base = update_arguments(job.kind, job.file)?;
        let arguments = join_args(&base, job.parameters);

        let spec = LaunchSpec {
            program: &job.native.update_agent,
            arguments: Some(&arguments),
            hidden: false,
        };
        let code = job.native.processes.run(&spec).map_err(|e| {
            ProvisionError::NativeError(format!(
                "starting update agent {}: {e}",
                Path::new(&job.native.update_agent).display()
            ))
        })?;

        Ok(map_update_exit_code(code, &job.engine.stop))
    }
}

/// Fixed update-agent arguments for a job kind.
pub fn update_arguments(kind: JobKind, file: &str) -> Result<String> {
    match kind {
        JobKind::InstallUpdateFile => Ok(format!("/quiet /norestart \"{file}\"")),
        JobKind::RemoveUpdateById => Ok(format!("/uninstall /kb:{file} /quiet /norestart")),
        other => Err(ProvisionError::ConfigError(format!(
            "{other} is not an update operation"
        ))),
    }
}

/// Update-agent specific codes first, then the generic mapping.
pub fn map_update_exit_code(code: i32, stop: &StopFlag) -> ExecutionOutcome {
    match code as u32 {
        UPDATE_FAILED => ExecutionOutcome::failed(None),
        UPDATE_ALREADY_INSTALLED => {
            ExecutionOutcome::succeeded().with_detail("the update is already installed")
        }
        UPDATE_NOT_INSTALLED => {
            ExecutionOutcome::succeeded().with_detail("the update is not installed")
        }
        UPDATE_NOT_APPLICABLE => ExecutionOutcome::failed(Some(
            "the update is not applicable to this computer".to_string(),
        )),
        _ => map_exit_code(code, stop),
    }
}
