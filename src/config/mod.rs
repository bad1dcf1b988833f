// src/config/mod.rs

//! Agent configuration for the provisioner.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate the `[config]` section (`validate.rs`).
//!
//! The `[jobs]` table is kept as raw TOML here; turning it into job entries is
//! the job source's business (see [`crate::setup::source`]).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, RawConfigFile};
