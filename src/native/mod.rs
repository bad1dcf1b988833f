// src/native/mod.rs

//! Native subsystems the job executors drive.
//!
//! Every subsystem sits behind a trait so that executors can be exercised
//! with fakes:
//! - [`PackageInstaller`] — Windows Installer (install, patch, remove).
//! - [`DriverStore`] — driver staging and device updates.
//! - [`ScriptHost`] — script execution with a session object.
//! - [`ProcessLauncher`] — plain process execution (executables, update agent).
//!
//! [`NativeSubsystems::platform`] picks the real implementations for the
//! current platform. Windows-only subsystems fail cleanly elsewhere.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ConfigSection;
use crate::errors::Result;
use crate::exec::script::ScriptSession;

pub mod process;
pub mod script_host;

#[cfg(not(windows))]
mod unsupported;
#[cfg(windows)]
pub mod windows;

pub use process::{StdProcessLauncher, split_command_line};
pub use script_host::InterpreterScriptHost;

/// One message from the package installer's UI stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerMessage<'a> {
    FatalExit(&'a str),
    Error(&'a str),
    Warning(&'a str),
    /// Display text for the item the current action is working on.
    ActionData(&'a str),
    /// `key: value` progress payload, see [`crate::exec::progress`].
    Progress(&'a str),
    /// Any message type the engine does not subscribe to.
    Other,
}

/// Reply to an installer message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageReply {
    /// The message was consumed (the installer sees `IDOK`).
    Handled,
    /// Let the installer apply its default handling.
    Unhandled,
}

/// Receiver for installer messages while an operation is running.
pub trait InstallerMessageSink {
    fn on_message(&mut self, message: InstallerMessage<'_>) -> MessageReply;
}

/// What to ask the package installer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOperation<'a> {
    Install { package: &'a str },
    /// `;`-separated list of patch files.
    ApplyPatches { patches: &'a str },
    Remove { product: &'a str },
}

pub trait PackageInstaller: Send + Sync {
    /// Run `operation` with the native UI suppressed, routing UI messages to
    /// `sink`, and return the installer's result code.
    ///
    /// Implementations must restore the previous UI level and handler on
    /// every exit path.
    fn execute(
        &self,
        operation: PackageOperation<'_>,
        properties: &str,
        sink: &mut dyn InstallerMessageSink,
    ) -> Result<u32>;
}

pub trait DriverStore: Send + Sync {
    /// Copy a driver definition file into the driver store.
    fn stage(&self, inf: &str) -> io::Result<()>;

    /// Install the staged driver on every device matching `hardware_id`.
    /// Returns whether a reboot is needed.
    fn update_devices(&self, hardware_id: &str, inf: &str, interactive: bool) -> io::Result<bool>;
}

/// A script run failed before it could produce an exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFault(pub String);

impl fmt::Display for ScriptFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ScriptFault {}

pub trait ScriptHost: Send + Sync {
    /// Run `body` with `parameters` as the arguments of the block that wraps
    /// it, exposing `session` to the script. Returns the script's exit code.
    fn run(
        &self,
        body: &str,
        parameters: Option<&str>,
        session: &mut ScriptSession<'_>,
    ) -> std::result::Result<i32, ScriptFault>;
}

/// A process to start and wait for.
#[derive(Debug, Clone, Copy)]
pub struct LaunchSpec<'a> {
    pub program: &'a Path,
    /// Raw argument string, passed through verbatim on Windows.
    pub arguments: Option<&'a str>,
    /// Do not create a console window.
    pub hidden: bool,
}

pub trait ProcessLauncher: Send + Sync {
    /// Start the process, wait for it, and return its exit code.
    fn run(&self, spec: &LaunchSpec<'_>) -> io::Result<i32>;
}

/// The set of native subsystems a task runs against.
#[derive(Clone)]
pub struct NativeSubsystems {
    pub installer: Arc<dyn PackageInstaller>,
    pub drivers: Arc<dyn DriverStore>,
    pub scripts: Arc<dyn ScriptHost>,
    pub processes: Arc<dyn ProcessLauncher>,
    /// Update agent executable used by the update install/removal jobs.
    pub update_agent: PathBuf,
}

impl fmt::Debug for NativeSubsystems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeSubsystems")
            .field("update_agent", &self.update_agent)
            .finish_non_exhaustive()
    }
}

impl NativeSubsystems {
    /// Real subsystems for the current platform, configured from `[config]`.
    pub fn platform(cfg: &ConfigSection) -> Self {
        let update_agent = cfg
            .update_agent
            .as_deref()
            .map(|p| PathBuf::from(crate::env::expand_vars(p)))
            .unwrap_or_else(default_update_agent);

        let scripts = match cfg.script_interpreter.as_deref() {
            Some([program, args @ ..]) => InterpreterScriptHost::new(
                crate::env::expand_vars(program),
                args.to_vec(),
                cfg.script_dialect,
            ),
            _ => InterpreterScriptHost::platform_default(),
        };

        Self {
            installer: platform_installer(),
            drivers: platform_drivers(),
            scripts: Arc::new(scripts),
            processes: Arc::new(StdProcessLauncher),
            update_agent,
        }
    }
}

#[cfg(windows)]
fn platform_installer() -> Arc<dyn PackageInstaller> {
    Arc::new(windows::MsiInstaller)
}

#[cfg(not(windows))]
fn platform_installer() -> Arc<dyn PackageInstaller> {
    Arc::new(unsupported::UnsupportedInstaller)
}

#[cfg(windows)]
fn platform_drivers() -> Arc<dyn DriverStore> {
    Arc::new(windows::SetupApiDriverStore)
}

#[cfg(not(windows))]
fn platform_drivers() -> Arc<dyn DriverStore> {
    Arc::new(unsupported::UnsupportedDriverStore)
}

fn default_update_agent() -> PathBuf {
    let root = std::env::var_os("SystemRoot").unwrap_or_else(|| "C:\\Windows".into());
    PathBuf::from(root).join("System32").join("wusa.exe")
}

/// Human-readable text for a platform error code, ending with a period.
pub fn platform_message(code: i32) -> String {
    let text = io::Error::from_raw_os_error(code).to_string();
    let suffix = format!(" (os error {code})");
    let text = text.strip_suffix(&suffix).unwrap_or(&text);
    format!("{}.", text.trim_end().trim_end_matches('.'))
}

/// Detail text for a failed native call, or `None` if the platform reported
/// no error code.
pub fn error_detail(err: &io::Error) -> Option<String> {
    match err.raw_os_error() {
        Some(0) => None,
        Some(code) => Some(platform_message(code)),
        None => Some(format!("{}.", err.to_string().trim_end_matches('.'))),
    }
}
