// src/host.rs

//! Host power control, used once at the very end of a run.

use std::io;

use tracing::{error, info};

use crate::engine::EngineContext;

pub trait HostPower {
    /// Restart the host. Returning at all on success is platform-dependent.
    fn reboot(&self) -> io::Result<()>;
}

/// The real host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPower;

impl HostPower for SystemPower {
    #[cfg(windows)]
    fn reboot(&self) -> io::Result<()> {
        crate::native::windows::reboot()
    }

    #[cfg(not(windows))]
    fn reboot(&self) -> io::Result<()> {
        let status = std::process::Command::new("shutdown")
            .args(["-r", "now"])
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("shutdown exited with {status}")))
        }
    }
}

/// Perform the end-of-run reboot if one was scheduled and not suppressed.
///
/// Returns whether a reboot was requested from the host. A failure is
/// logged; the caller still exits normally.
pub fn reboot_if_scheduled(ctx: &EngineContext, suppress: bool, power: &dyn HostPower) -> bool {
    if !ctx.reboot.is_scheduled() {
        return false;
    }
    if suppress {
        info!("a reboot is required but suppressed");
        return false;
    }

    info!("restarting the host");
    match power.reboot() {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "could not restart the host");
            false
        }
    }
}
