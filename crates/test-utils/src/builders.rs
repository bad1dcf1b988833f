#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use provisioner::config::{ConfigFile, ConfigSection, RawConfigFile};
use provisioner::setup::SetupDescriptor;
use provisioner::task::Task;
use provisioner::types::{BadEntryPolicy, ExclusivityRule, JobKind, RebootPolicy};

/// Builder for `SetupDescriptor`, which can also write itself out as a job
/// document.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    descriptor: SetupDescriptor,
}

impl DescriptorBuilder {
    pub fn new(name: &str, kind: JobKind, file: &str) -> Self {
        Self {
            descriptor: SetupDescriptor {
                name: name.to_string(),
                image: String::new(),
                kind,
                file: file.to_string(),
                parameters: None,
                exclusive: false,
                reboot: RebootPolicy::IfRequired,
                log_success: false,
            },
        }
    }

    /// A `run-executable` job, the simplest kind to fake.
    pub fn executable(name: &str) -> Self {
        Self::new(name, JobKind::RunExecutable, "setup.exe")
    }

    pub fn image(mut self, image: &str) -> Self {
        self.descriptor.image = image.to_string();
        self
    }

    pub fn parameters(mut self, parameters: &str) -> Self {
        self.descriptor.parameters = Some(parameters.to_string());
        self
    }

    pub fn exclusive(mut self, val: bool) -> Self {
        self.descriptor.exclusive = val;
        self
    }

    pub fn reboot(mut self, policy: RebootPolicy) -> Self {
        self.descriptor.reboot = policy;
        self
    }

    pub fn log_success(mut self, val: bool) -> Self {
        self.descriptor.log_success = val;
        self
    }

    pub fn build(self) -> SetupDescriptor {
        self.descriptor
    }

    /// Build a task as if the document had been loaded from `dir/setup.toml`.
    pub fn task(self, order_key: u64, dir: &Path) -> Task {
        Task::new(order_key, &dir.join("setup.toml"), self.descriptor)
    }

    /// Render the descriptor as a job document.
    pub fn to_toml(&self) -> String {
        let d = &self.descriptor;
        let mut table = toml::Table::new();
        table.insert("name".into(), d.name.clone().into());
        if !d.image.is_empty() {
            table.insert("image".into(), d.image.clone().into());
        }
        table.insert("kind".into(), d.kind.as_str().into());
        table.insert("file".into(), d.file.clone().into());
        if let Some(ref p) = d.parameters {
            table.insert("parameters".into(), p.clone().into());
        }
        table.insert("exclusive".into(), d.exclusive.into());
        let reboot = match d.reboot {
            RebootPolicy::Never => "never",
            RebootPolicy::IfRequired => "if-required",
            RebootPolicy::Always => "always",
        };
        table.insert("reboot".into(), reboot.into());
        table.insert("log_success".into(), d.log_success.into());
        toml::to_string(&table).expect("descriptor serializes")
    }

    /// Write the document to `dir/<file_name>` (creating `dir`) and return its
    /// path.
    pub fn write_to(&self, dir: &Path, file_name: &str) -> PathBuf {
        fs::create_dir_all(dir).expect("create document dir");
        let path = dir.join(file_name);
        fs::write(&path, self.to_toml()).expect("write job document");
        path
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                jobs: toml::Table::new(),
            },
        }
    }

    /// Add a `[jobs]` entry with a literal document path.
    pub fn with_job(mut self, key: &str, path: &Path) -> Self {
        self.config
            .jobs
            .insert(key.to_string(), path.display().to_string().into());
        self
    }

    /// Add a `[jobs]` entry of the form `{ expand = "..." }`.
    pub fn with_expand_job(mut self, key: &str, path: &str) -> Self {
        let mut table = toml::Table::new();
        table.insert("expand".into(), path.into());
        self.config.jobs.insert(key.to_string(), table.into());
        self
    }

    /// Add a raw `[jobs]` value, for malformed-entry tests.
    pub fn with_raw_job(mut self, key: &str, value: toml::Value) -> Self {
        self.config.jobs.insert(key.to_string(), value);
        self
    }

    pub fn bad_entry(mut self, policy: BadEntryPolicy) -> Self {
        self.config.config.bad_entry = policy;
        self
    }

    pub fn exclusivity(mut self, rule: ExclusivityRule) -> Self {
        self.config.config.exclusivity = rule;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
