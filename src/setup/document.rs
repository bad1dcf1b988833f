// src/setup/document.rs

//! Loading of job-definition documents.
//!
//! Unknown fields and missing required fields are rejected during
//! deserialization; [`validate`] then checks what the type system cannot.

use std::fs;
use std::path::Path;

use crate::errors::{ProvisionError, Result};
use crate::setup::descriptor::SetupDescriptor;

/// Read, parse and validate the document at `path`.
pub fn load_descriptor(path: &Path) -> Result<SetupDescriptor> {
    let contents = fs::read_to_string(path).map_err(|e| document_error(path, e))?;
    parse_descriptor(path, &contents)
}

/// Parse and validate document text; `path` is only used for error reports.
pub fn parse_descriptor(path: &Path, contents: &str) -> Result<SetupDescriptor> {
    let raw: SetupDescriptor = toml::from_str(contents).map_err(|e| document_error(path, e))?;
    validate(path, raw)
}

fn validate(path: &Path, mut setup: SetupDescriptor) -> Result<SetupDescriptor> {
    if setup.name.trim().is_empty() {
        return Err(document_error(path, "`name` must not be blank"));
    }
    if setup.file.trim().is_empty() {
        return Err(document_error(path, "`file` must not be blank"));
    }
    if setup
        .parameters
        .as_deref()
        .is_some_and(|p| p.trim().is_empty())
    {
        setup.parameters = None;
    }
    Ok(setup)
}

fn document_error(path: &Path, message: impl ToString) -> ProvisionError {
    ProvisionError::DocumentError {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}
