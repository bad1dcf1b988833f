// src/setup/mod.rs

//! Job definitions and where they come from.
//!
//! - [`descriptor`] is the immutable description of one setup job.
//! - [`document`] loads and validates a job-definition document.
//! - [`source`] enumerates the ordered job list (order key → document path).

pub mod descriptor;
pub mod document;
pub mod source;

pub use descriptor::SetupDescriptor;
pub use document::load_descriptor;
pub use source::{EntryValue, JobEntry, JobSource, TomlJobSource};
