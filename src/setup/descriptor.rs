// src/setup/descriptor.rs

use serde::Deserialize;

use crate::types::{JobKind, RebootPolicy};

/// One setup job, exactly as written in its job-definition document.
///
/// ```toml
/// name = "7-Zip"
/// image = "7zip.png"
/// kind = "install-package"
/// file = "7z.msi"
/// parameters = "INSTALLDIR=C:\\Tools\\7zip"
/// reboot = "if-required"
/// log_success = true
/// ```
///
/// `name`, `file` and `parameters` may contain `%NAME%` references; they are
/// expanded when the job runs, not when it is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupDescriptor {
    /// Display name.
    pub name: String,

    /// Display image, relative to the document's directory. Empty = none.
    #[serde(default)]
    pub image: String,

    pub kind: JobKind,

    /// Package, patch list, product code, update file, KB number, script,
    /// executable or driver file, depending on `kind`.
    pub file: String,

    /// Extra parameters appended to the native invocation.
    #[serde(default)]
    pub parameters: Option<String>,

    /// Run this job alone, superseding the rest of the job list.
    #[serde(default)]
    pub exclusive: bool,

    #[serde(default)]
    pub reboot: RebootPolicy,

    /// Also log successful outcomes (failures are always logged).
    #[serde(default)]
    pub log_success: bool,
}
