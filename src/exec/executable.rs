// src/exec/executable.rs

use std::path::Path;

use super::{JobContext, JobExecutor, map_exit_code};
use crate::engine::ExecutionOutcome;
use crate::errors::{ProvisionError, Result};
use crate::native::LaunchSpec;
use crate::types::JobKind;

/// Runs an executable and maps its exit code.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutableExecutor;

impl JobExecutor for ExecutableExecutor {
    fn execute(&self, job: &JobContext<'_>) -> Result<ExecutionOutcome> {
        let spec = LaunchSpec {
            program: Path::new(job.file),
            arguments: job.parameters,
            hidden: job.kind == JobKind::RunExecutableHidden,
        };
        let code = job
            .native
            .processes
            .run(&spec)
            .map_err(|e| ProvisionError::NativeError(format!("starting '{}': {e}", job.file)))?;

        Ok(map_exit_code(code, &job.engine.stop))
    }
}
