// src/exec/driver.rs

//! Driver staging and device updates.

use tracing::debug;

use super::{JobContext, JobExecutor};
use crate::engine::ExecutionOutcome;
use crate::errors::Result;
use crate::native::error_detail;
use crate::types::JobKind;

/// Separator between hardware IDs in the job parameters.
#[cfg(windows)]
pub const HARDWARE_ID_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const HARDWARE_ID_SEPARATOR: char = ':';

#[derive(Debug, Clone, Copy, Default)]
pub struct DriverExecutor;

impl JobExecutor for DriverExecutor {
    fn execute(&self, job: &JobContext<'_>) -> Result<ExecutionOutcome> {
        let drivers = &job.native.drivers;

        if let Err(e) = drivers.stage(job.file) {
            return Ok(ExecutionOutcome::failed(error_detail(&e)));
        }

        let Some(parameters) = job.parameters else {
            return Ok(ExecutionOutcome::succeeded());
        };

        let interactive = job.kind == JobKind::InstallDriverFileInteractive;
        let mut reboot_required = false;

        for hardware_id in hardware_ids(parameters) {
            debug!(task = %job.task, hardware_id, "updating matching devices");
            match drivers.update_devices(hardware_id, job.file, interactive) {
                Ok(reboot) => reboot_required |= reboot,
                Err(e) => {
                    return Ok(ExecutionOutcome {
                        success: false,
                        reboot_required,
                        detail: error_detail(&e),
                    });
                }
            }
        }

        Ok(ExecutionOutcome {
            success: true,
            reboot_required,
            detail: None,
        })
    }
}

/// Non-blank, trimmed hardware IDs from the job parameters.
pub fn hardware_ids(parameters: &str) -> impl Iterator<Item = &str> {
    parameters
        .split(HARDWARE_ID_SEPARATOR)
        .map(str::trim)
        .filter(|id| !id.is_empty())
}
