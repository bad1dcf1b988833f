// src/config/validate.rs

use crate::config::model::{ConfigFile, ConfigSection, RawConfigFile};
use crate::errors::{ProvisionError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ProvisionError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_section(&raw.config)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.jobs))
    }
}

fn validate_section(cfg: &ConfigSection) -> Result<()> {
    if let Some(ref path) = cfg.log_path {
        if path.trim().is_empty() {
            return Err(ProvisionError::ConfigError(
                "[config].log_path must not be blank (omit it to disable the text log)"
                    .to_string(),
            ));
        }
    }

    if let Some(ref agent) = cfg.update_agent {
        if agent.trim().is_empty() {
            return Err(ProvisionError::ConfigError(
                "[config].update_agent must not be blank".to_string(),
            ));
        }
    }

    if let Some(ref interpreter) = cfg.script_interpreter {
        match interpreter.first() {
            None => {
                return Err(ProvisionError::ConfigError(
                    "[config].script_interpreter must name a program".to_string(),
                ));
            }
            Some(program) if program.trim().is_empty() => {
                return Err(ProvisionError::ConfigError(
                    "[config].script_interpreter program must not be blank".to_string(),
                ));
            }
            Some(_) => {}
        }
    }

    Ok(())
}
