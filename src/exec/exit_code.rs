// src/exec/exit_code.rs

//! Shared interpretation of native exit codes.

use crate::engine::{ExecutionOutcome, StopFlag};
use crate::native::platform_message;

pub const ERROR_SUCCESS: i32 = 0;
/// The installer has started a reboot itself.
pub const ERROR_SUCCESS_REBOOT_INITIATED: i32 = 1641;
pub const ERROR_SUCCESS_REBOOT_REQUIRED: i32 = 3010;
pub const ERROR_SUCCESS_RESTART_REQUIRED: i32 = 3011;

/// Map a process or API exit code to an outcome.
///
/// `1641` also requests a stop: the host session is already going down, so
/// no further task may start.
pub fn map_exit_code(code: i32, stop: &StopFlag) -> ExecutionOutcome {
    match code {
        ERROR_SUCCESS => ExecutionOutcome::succeeded(),
        ERROR_SUCCESS_REBOOT_INITIATED => {
            stop.request();
            ExecutionOutcome::succeeded_with_reboot()
        }
        ERROR_SUCCESS_REBOOT_REQUIRED | ERROR_SUCCESS_RESTART_REQUIRED => {
            ExecutionOutcome::succeeded_with_reboot()
        }
        other => ExecutionOutcome::failed(Some(platform_message(other))),
    }
}
