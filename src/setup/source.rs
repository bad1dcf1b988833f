// src/setup/source.rs

//! The ordered job list.
//!
//! Each entry maps a key (a signed integer, written as a string) to the path
//! of a job-definition document. Entries are returned in discovery order; the
//! scheduler is responsible for sorting and filtering them.

use std::path::PathBuf;

use crate::config::ConfigFile;
use crate::env::expand_vars;
use crate::errors::{ProvisionError, Result};

/// The value stored under a job key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue {
    /// A literal document path.
    Path(String),
    /// A document path containing `%NAME%` references.
    ExpandPath(String),
    /// Anything else; carries the kind that was found.
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEntry {
    pub key: String,
    pub value: EntryValue,
}

impl JobEntry {
    pub fn new(key: impl Into<String>, value: EntryValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Parse the key as a signed integer and reinterpret it as `u64`, so that
    /// negative keys sort after every positive one (`-1` runs last).
    pub fn order_key(&self) -> Result<u64> {
        self.key
            .trim()
            .parse::<i64>()
            .map(|k| k as u64)
            .map_err(|_| self.error("key is not an integer"))
    }

    /// Resolve the entry's value to an absolute document path.
    pub fn document_path(&self) -> Result<PathBuf> {
        let raw = match &self.value {
            EntryValue::Path(p) => p.clone(),
            EntryValue::ExpandPath(p) => expand_vars(p),
            EntryValue::Unsupported(kind) => {
                return Err(self.error(format!(
                    "value must be a path string or {{ expand = \"...\" }}, found {kind}"
                )));
            }
        };
        if raw.trim().is_empty() {
            return Err(self.error("document path is empty"));
        }
        std::path::absolute(&raw).map_err(|e| self.error(e))
    }

    fn error(&self, message: impl ToString) -> ProvisionError {
        ProvisionError::JobEntryError {
            key: self.key.clone(),
            message: message.to_string(),
        }
    }
}

/// Something that can enumerate the job list.
pub trait JobSource {
    /// All entries in discovery order. An error here means the source itself
    /// could not be read, which is fatal for the run.
    fn entries(&self) -> Result<Vec<JobEntry>>;
}

/// Job source backed by the `[jobs]` table of the agent configuration.
#[derive(Debug, Clone, Default)]
pub struct TomlJobSource {
    table: toml::Table,
}

impl TomlJobSource {
    pub fn new(table: toml::Table) -> Self {
        Self { table }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(cfg.jobs.clone())
    }
}

impl JobSource for TomlJobSource {
    fn entries(&self) -> Result<Vec<JobEntry>> {
        Ok(self
            .table
            .iter()
            .map(|(key, value)| JobEntry::new(key.clone(), entry_value(value)))
            .collect())
    }
}

fn entry_value(value: &toml::Value) -> EntryValue {
    match value {
        toml::Value::String(s) => EntryValue::Path(s.clone()),
        toml::Value::Table(t) if t.len() == 1 => match t.get("expand") {
            Some(toml::Value::String(s)) => EntryValue::ExpandPath(s.clone()),
            _ => EntryValue::Unsupported("table".to_string()),
        },
        other => EntryValue::Unsupported(other.type_str().to_string()),
    }
}
