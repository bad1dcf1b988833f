// src/native/unsupported.rs

//! Stand-ins for Windows-only subsystems on other platforms.

use std::io;

use super::{DriverStore, InstallerMessageSink, PackageInstaller, PackageOperation};
use crate::errors::{ProvisionError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedInstaller;

impl PackageInstaller for UnsupportedInstaller {
    fn execute(
        &self,
        _operation: PackageOperation<'_>,
        _properties: &str,
        _sink: &mut dyn InstallerMessageSink,
    ) -> Result<u32> {
        Err(ProvisionError::NativeError(
            "the package installer is only available on Windows".to_string(),
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedDriverStore;

impl DriverStore for UnsupportedDriverStore {
    fn stage(&self, _inf: &str) -> io::Result<()> {
        Err(unsupported())
    }

    fn update_devices(
        &self,
        _hardware_id: &str,
        _inf: &str,
        _interactive: bool,
    ) -> io::Result<bool> {
        Err(unsupported())
    }
}

fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "driver installation is only available on Windows",
    )
}
