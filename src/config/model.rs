// src/config/model.rs

use serde::Deserialize;

use crate::types::{BadEntryPolicy, ExclusivityRule, ScriptDialect};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// log_path = "%ProgramData%/provisioner/provisioner.log"
/// bad_entry = "skip"
/// exclusivity = "exclusive-wins"
///
/// [jobs]
/// "10" = "C:/deploy/7zip/setup.toml"
/// "20" = { expand = "%DEPLOY%/office/setup.toml" }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Agent behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// The job list from `[jobs]`, in the order it appears in the file.
    #[serde(default)]
    pub jobs: toml::Table,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (or
/// [`ConfigFile::new_unchecked`] for code that has already validated).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub jobs: toml::Table,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, jobs: toml::Table) -> Self {
        Self { config, jobs }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Optional append-only text log. `%NAME%` references are expanded.
    #[serde(default)]
    pub log_path: Option<String>,

    /// Never reboot the host, even if a job scheduled it.
    #[serde(default)]
    pub suppress_reboot: bool,

    /// Keep going when the session ends (Ctrl-C, SIGTERM, logoff).
    #[serde(default)]
    pub ignore_session_end: bool,

    /// What to do with malformed `[jobs]` entries.
    #[serde(default)]
    pub bad_entry: BadEntryPolicy,

    /// How exclusive jobs interact with the rest of the list.
    #[serde(default)]
    pub exclusivity: ExclusivityRule,

    /// Path of the update agent executable. Defaults to `wusa.exe` in the
    /// system directory.
    #[serde(default)]
    pub update_agent: Option<String>,

    /// Interpreter command line used for `run-script` jobs. The path of the
    /// wrapped script is appended as the last argument.
    #[serde(default)]
    pub script_interpreter: Option<Vec<String>>,

    /// Wrapper language for `run-script` jobs run by `script_interpreter`.
    #[serde(default)]
    pub script_dialect: ScriptDialect,
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            log_path: None,
            suppress_reboot: false,
            ignore_session_end: false,
            bad_entry: BadEntryPolicy::default(),
            exclusivity: ExclusivityRule::default(),
            update_agent: None,
            script_interpreter: None,
            script_dialect: ScriptDialect::default(),
        }
    }
}
