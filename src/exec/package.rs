// src/exec/package.rs

//! Package install, patch and product removal.

use tracing::{error, warn};

use super::progress::ProgressDecoder;
use super::{JobContext, JobExecutor, ProgressObserver, map_exit_code};
use crate::engine::ExecutionOutcome;
use crate::env::join_args;
use crate::errors::{ProvisionError, Result};
use crate::native::{InstallerMessage, InstallerMessageSink, MessageReply, PackageOperation};
use crate::types::JobKind;

/// Always passed to the installer: the host reboot is ours to decide.
pub const BASE_PROPERTIES: &str = "REBOOT=ReallySuppress";

#[derive(Debug, Clone, Copy, Default)]
pub struct PackageExecutor;

impl JobExecutor for PackageExecutor {
    fn execute(&self, job: &JobContext<'_>) -> Result<ExecutionOutcome> {
        let operation = match job.kind {
            JobKind::InstallPackage => PackageOperation::Install { package: job.file },
            JobKind::ApplyPatch => PackageOperation::ApplyPatches { patches: job.file },
            JobKind::RemoveProduct => PackageOperation::Remove { product: job.file },
            other => {
                return Err(ProvisionError::ConfigError(format!(
                    "{other} is not a package operation"
                )));
            }
        };
        let properties = join_args(BASE_PROPERTIES, job.parameters);

        let mut router = MessageRouter::new(job.task, job.observer);
        let code = job
            .native
            .installer
            .execute(operation, &properties, &mut router)?;

        Ok(map_exit_code(code as i32, &job.engine.stop))
    }
}

/// Routes installer UI messages: errors and warnings to the log, action data
/// and progress to the decoder.
pub struct MessageRouter<'a> {
    task: &'a str,
    observer: &'a dyn ProgressObserver,
    decoder: ProgressDecoder,
}

impl<'a> MessageRouter<'a> {
    pub fn new(task: &'a str, observer: &'a dyn ProgressObserver) -> Self {
        Self {
            task,
            observer,
            decoder: ProgressDecoder::new(),
        }
    }

    pub fn decoder(&self) -> &ProgressDecoder {
        &self.decoder
    }
}

impl InstallerMessageSink for MessageRouter<'_> {
    fn on_message(&mut self, message: InstallerMessage<'_>) -> MessageReply {
        match message {
            InstallerMessage::FatalExit(text) | InstallerMessage::Error(text) => {
                if !text.is_empty() {
                    error!(task = %self.task, "{}", text);
                }
                MessageReply::Unhandled
            }
            InstallerMessage::Warning(text) => {
                if !text.is_empty() {
                    warn!(task = %self.task, "{}", text);
                }
                MessageReply::Unhandled
            }
            InstallerMessage::ActionData(text) => {
                self.decoder.action_data(text, self.observer);
                MessageReply::Handled
            }
            InstallerMessage::Progress(payload) => {
                if self.decoder.progress(payload, self.observer) {
                    MessageReply::Handled
                } else {
                    MessageReply::Unhandled
                }
            }
            InstallerMessage::Other => MessageReply::Unhandled,
        }
    }
}
