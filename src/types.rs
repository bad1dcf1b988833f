use std::fmt;

use serde::Deserialize;

/// The native mechanism a setup job is executed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Install a Windows Installer package (`.msi`).
    InstallPackage,
    /// Apply one or more Windows Installer patches (`.msp`, `;`-separated).
    ApplyPatch,
    /// Remove an installed product by product code.
    RemoveProduct,
    /// Install an update file through the update agent.
    InstallUpdateFile,
    /// Remove an installed update by KB number through the update agent.
    RemoveUpdateById,
    /// Run a script inside the script host.
    RunScript,
    RunExecutable,
    /// Same as `RunExecutable`, but without a console window.
    RunExecutableHidden,
    /// Stage a driver package and optionally update matching devices.
    InstallDriverFile,
    /// Same as `InstallDriverFile`, but the driver installer may show UI.
    InstallDriverFileInteractive,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::InstallPackage => "install-package",
            JobKind::ApplyPatch => "apply-patch",
            JobKind::RemoveProduct => "remove-product",
            JobKind::InstallUpdateFile => "install-update-file",
            JobKind::RemoveUpdateById => "remove-update-by-id",
            JobKind::RunScript => "run-script",
            JobKind::RunExecutable => "run-executable",
            JobKind::RunExecutableHidden => "run-executable-hidden",
            JobKind::InstallDriverFile => "install-driver-file",
            JobKind::InstallDriverFileInteractive => "install-driver-file-interactive",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a job contributes to the end-of-run reboot decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebootPolicy {
    Never,
    IfRequired,
    Always,
}

impl Default for RebootPolicy {
    fn default() -> Self {
        RebootPolicy::IfRequired
    }
}

impl RebootPolicy {
    /// Whether an outcome with the given `reboot_required` flag schedules a
    /// reboot under this policy.
    pub fn wants_reboot(self, reboot_required: bool) -> bool {
        match self {
            RebootPolicy::Never => false,
            RebootPolicy::IfRequired => reboot_required,
            RebootPolicy::Always => true,
        }
    }
}

/// How an exclusive job interacts with the rest of the job list.
///
/// - `ExclusiveWins`: if any job is exclusive, the exclusive job with the
///   lowest order key runs alone, wherever it appears in the job source.
/// - `FirstCome`: jobs are accepted in discovery order until the first
///   exclusive one; it is accepted only if nothing came before it, and every
///   job discovered after it is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExclusivityRule {
    ExclusiveWins,
    FirstCome,
}

impl Default for ExclusivityRule {
    fn default() -> Self {
        ExclusivityRule::ExclusiveWins
    }
}


/// What to do with a job-source entry whose key or value is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadEntryPolicy {
    /// Log the entry and keep enumerating.
    Skip,
    /// Log the entry and stop; nothing runs.
    Abort,
}

impl Default for BadEntryPolicy {
    fn default() -> Self {
        BadEntryPolicy::Skip
    }
}


/// Language the script host wraps job scripts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptDialect {
    /// Windows PowerShell / PowerShell 7; the session is a `$Session` object.
    PowerShell,
    /// POSIX `sh`; the session is a set of `session_*` shell functions.
    Posix,
}

impl Default for ScriptDialect {
    fn default() -> Self {
        if cfg!(windows) {
            ScriptDialect::PowerShell
        } else {
            ScriptDialect::Posix
        }
    }
}
