// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A single job-definition document could not be loaded or validated.
    #[error("Setup document {path:?} rejected: {message}")]
    DocumentError { path: PathBuf, message: String },

    /// A job-source entry has a bad key or a value of the wrong kind.
    #[error("Job entry '{key}' rejected: {message}")]
    JobEntryError { key: String, message: String },

    /// A native subsystem call failed outright (not an exit code).
    #[error("Native subsystem error: {0}")]
    NativeError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ProvisionError>;
