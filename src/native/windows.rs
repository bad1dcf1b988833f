// src/native/windows.rs

//! Windows implementations: Windows Installer, SetupAPI driver staging and
//! host restart.
//!
//! Raw bindings are declared here rather than pulled from a bindings crate;
//! the surface is a dozen functions.

use std::ffi::{OsStr, c_void};
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;

use tracing::debug;

use super::{
    DriverStore, InstallerMessage, InstallerMessageSink, MessageReply, PackageInstaller,
    PackageOperation,
};
use crate::errors::Result;

type Bool = i32;
type Handle = *mut c_void;
type Hwnd = *mut c_void;
type InstallUiHandler = Option<unsafe extern "system" fn(*mut c_void, u32, *const u16) -> i32>;

const INSTALLUILEVEL_NONE: u32 = 2;

const INSTALLMESSAGE_MASK: u32 = 0xFF00_0000;
const INSTALLMESSAGE_FATALEXIT: u32 = 0x0000_0000;
const INSTALLMESSAGE_ERROR: u32 = 0x0100_0000;
const INSTALLMESSAGE_WARNING: u32 = 0x0200_0000;
const INSTALLMESSAGE_ACTIONDATA: u32 = 0x0900_0000;
const INSTALLMESSAGE_PROGRESS: u32 = 0x0A00_0000;

const INSTALLLOGMODE_FATALEXIT: u32 = 1 << 0;
const INSTALLLOGMODE_ERROR: u32 = 1 << 1;
const INSTALLLOGMODE_WARNING: u32 = 1 << 2;
const INSTALLLOGMODE_ACTIONDATA: u32 = 1 << 9;
const INSTALLLOGMODE_PROGRESS: u32 = 1 << 10;

const INSTALLLEVEL_DEFAULT: i32 = 0;
const INSTALLSTATE_ABSENT: i32 = 2;

const IDOK: i32 = 1;

const SPOST_NONE: u32 = 0;
const INSTALLFLAG_FORCE: u32 = 0x0000_0001;
const INSTALLFLAG_NONINTERACTIVE: u32 = 0x0000_0004;

const TOKEN_ADJUST_PRIVILEGES: u32 = 0x0020;
const TOKEN_QUERY: u32 = 0x0008;
const SE_PRIVILEGE_ENABLED: u32 = 0x0000_0002;
const ERROR_NOT_ALL_ASSIGNED: i32 = 1300;

const EWX_REBOOT: u32 = 0x0000_0002;
const EWX_FORCE: u32 = 0x0000_0004;
const SHTDN_REASON_FLAG_PLANNED: u32 = 0x8000_0000;
const SHTDN_REASON_MAJOR_APPLICATION: u32 = 0x0004_0000;
const SHTDN_REASON_MINOR_INSTALLATION: u32 = 0x0000_0002;

#[repr(C)]
#[derive(Clone, Copy, Default)]
struct Luid {
    low_part: u32,
    high_part: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
struct LuidAndAttributes {
    luid: Luid,
    attributes: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
struct TokenPrivileges {
    privilege_count: u32,
    privileges: [LuidAndAttributes; 1],
}

#[link(name = "msi")]
unsafe extern "system" {
    fn MsiSetInternalUI(ui_level: u32, window: *mut Hwnd) -> u32;
    fn MsiSetExternalUIW(
        handler: InstallUiHandler,
        filter: u32,
        context: *mut c_void,
    ) -> InstallUiHandler;
    fn MsiInstallProductW(package: *const u16, command_line: *const u16) -> u32;
    fn MsiApplyMultiplePatchesW(
        patches: *const u16,
        product: *const u16,
        properties: *const u16,
    ) -> u32;
    fn MsiConfigureProductExW(
        product: *const u16,
        level: i32,
        state: i32,
        command_line: *const u16,
    ) -> u32;
}

#[link(name = "setupapi")]
unsafe extern "system" {
    fn SetupCopyOEMInfW(
        source: *const u16,
        media_location: *const u16,
        media_type: u32,
        copy_style: u32,
        destination: *mut u16,
        destination_size: u32,
        required_size: *mut u32,
        destination_component: *mut *mut u16,
    ) -> Bool;
}

#[link(name = "newdev")]
unsafe extern "system" {
    fn UpdateDriverForPlugAndPlayDevicesW(
        parent: Hwnd,
        hardware_id: *const u16,
        inf_path: *const u16,
        flags: u32,
        reboot_required: *mut Bool,
    ) -> Bool;
}

#[link(name = "advapi32")]
unsafe extern "system" {
    fn OpenProcessToken(process: Handle, access: u32, token: *mut Handle) -> Bool;
    fn LookupPrivilegeValueW(system: *const u16, name: *const u16, luid: *mut Luid) -> Bool;
    fn AdjustTokenPrivileges(
        token: Handle,
        disable_all: Bool,
        new_state: *const TokenPrivileges,
        buffer_length: u32,
        previous_state: *mut TokenPrivileges,
        return_length: *mut u32,
    ) -> Bool;
}

#[link(name = "kernel32")]
unsafe extern "system" {
    fn GetCurrentProcess() -> Handle;
    fn CloseHandle(handle: Handle) -> Bool;
}

#[link(name = "user32")]
unsafe extern "system" {
    fn ExitWindowsEx(flags: u32, reason: u32) -> Bool;
}

fn wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

/// # Safety
/// `ptr` must be null or point to a NUL-terminated UTF-16 string.
unsafe fn from_wide(ptr: *const u16) -> String {
    if ptr.is_null() {
        return String::new();
    }
    let mut len = 0;
    // SAFETY: the caller guarantees a terminator within the allocation.
    unsafe {
        while *ptr.add(len) != 0 {
            len += 1;
        }
        String::from_utf16_lossy(std::slice::from_raw_parts(ptr, len))
    }
}

/// Windows Installer driven through `msi.dll`.
///
/// The external UI handler is process-global; only one operation may run at
/// a time, which the run loop guarantees.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsiInstaller;

impl PackageInstaller for MsiInstaller {
    fn execute(
        &self,
        operation: PackageOperation<'_>,
        properties: &str,
        sink: &mut dyn InstallerMessageSink,
    ) -> Result<u32> {
        let _ui = InternalUiGuard::suppress();

        let mut sink: &mut dyn InstallerMessageSink = sink;
        let context = &mut sink as *mut &mut dyn InstallerMessageSink as *mut c_void;
        let _handler = ExternalUiGuard::install(
            Some(installer_ui_callback),
            INSTALLLOGMODE_FATALEXIT
                | INSTALLLOGMODE_ERROR
                | INSTALLLOGMODE_WARNING
                | INSTALLLOGMODE_ACTIONDATA
                | INSTALLLOGMODE_PROGRESS,
            context,
        );

        let properties = wide(properties);
        // SAFETY: all strings are NUL-terminated and outlive the call; the
        // handler context stays valid until `_handler` is dropped.
        let code = unsafe {
            match operation {
                PackageOperation::Install { package } => {
                    MsiInstallProductW(wide(package).as_ptr(), properties.as_ptr())
                }
                PackageOperation::ApplyPatches { patches } => MsiApplyMultiplePatchesW(
                    wide(patches).as_ptr(),
                    ptr::null(),
                    properties.as_ptr(),
                ),
                PackageOperation::Remove { product } => MsiConfigureProductExW(
                    wide(product).as_ptr(),
                    INSTALLLEVEL_DEFAULT,
                    INSTALLSTATE_ABSENT,
                    properties.as_ptr(),
                ),
            }
        };
        debug!(?operation, code, "installer returned");
        Ok(code)
    }
}

/// Sets the installer UI level to "none" and restores the previous level
/// and window on drop.
struct InternalUiGuard {
    previous: u32,
    window: Hwnd,
}

impl InternalUiGuard {
    fn suppress() -> Self {
        let mut window: Hwnd = ptr::null_mut();
        // SAFETY: `window` is a valid out-pointer.
        let previous = unsafe { MsiSetInternalUI(INSTALLUILEVEL_NONE, &mut window) };
        Self { previous, window }
    }
}

impl Drop for InternalUiGuard {
    fn drop(&mut self) {
        // SAFETY: restores the values returned by `suppress`.
        unsafe {
            MsiSetInternalUI(self.previous, &mut self.window);
        }
    }
}

/// Installs an external UI handler and puts the previous one back on drop.
struct ExternalUiGuard {
    previous: InstallUiHandler,
}

impl ExternalUiGuard {
    fn install(handler: InstallUiHandler, filter: u32, context: *mut c_void) -> Self {
        // SAFETY: the caller keeps `context` alive for the guard's lifetime.
        let previous = unsafe { MsiSetExternalUIW(handler, filter, context) };
        Self { previous }
    }
}

impl Drop for ExternalUiGuard {
    fn drop(&mut self) {
        // SAFETY: reinstalling the handler that was active before.
        unsafe {
            MsiSetExternalUIW(self.previous, 0, ptr::null_mut());
        }
    }
}

/// Installer UI callback. Forwards each message to the sink in `context`.
///
/// # Safety
/// - `context` must be null or point to a live `&mut dyn InstallerMessageSink`.
/// - `text` must be null or a NUL-terminated UTF-16 string.
/// - Must never unwind across the FFI boundary.
unsafe extern "system" fn installer_ui_callback(
    context: *mut c_void,
    message_type: u32,
    text: *const u16,
) -> i32 {
    if context.is_null() {
        return 0;
    }
    // SAFETY: see the function contract.
    let sink = unsafe { &mut **(context as *mut &mut dyn InstallerMessageSink) };
    let text = unsafe { from_wide(text) };

    let reply = catch_unwind(AssertUnwindSafe(|| {
        let message = match message_type & INSTALLMESSAGE_MASK {
            INSTALLMESSAGE_FATALEXIT => InstallerMessage::FatalExit(&text),
            INSTALLMESSAGE_ERROR => InstallerMessage::Error(&text),
            INSTALLMESSAGE_WARNING => InstallerMessage::Warning(&text),
            INSTALLMESSAGE_ACTIONDATA => InstallerMessage::ActionData(&text),
            INSTALLMESSAGE_PROGRESS => InstallerMessage::Progress(&text),
            _ => InstallerMessage::Other,
        };
        sink.on_message(message)
    }));

    match reply {
        Ok(MessageReply::Handled) => IDOK,
        _ => 0,
    }
}

/// Driver staging through SetupAPI and device updates through `newdev.dll`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetupApiDriverStore;

impl DriverStore for SetupApiDriverStore {
    fn stage(&self, inf: &str) -> io::Result<()> {
        let inf = wide(inf);
        // SAFETY: `inf` is NUL-terminated; every optional pointer is null.
        let ok = unsafe {
            SetupCopyOEMInfW(
                inf.as_ptr(),
                ptr::null(),
                SPOST_NONE,
                0,
                ptr::null_mut(),
                0,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn update_devices(&self, hardware_id: &str, inf: &str, interactive: bool) -> io::Result<bool> {
        let mut flags = INSTALLFLAG_FORCE;
        if !interactive {
            flags |= INSTALLFLAG_NONINTERACTIVE;
        }
        let hardware_id = wide(hardware_id);
        let inf = wide(inf);
        let mut reboot: Bool = 0;
        // SAFETY: strings are NUL-terminated; `reboot` is a valid out-pointer.
        let ok = unsafe {
            UpdateDriverForPlugAndPlayDevicesW(
                ptr::null_mut(),
                hardware_id.as_ptr(),
                inf.as_ptr(),
                flags,
                &mut reboot,
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(reboot != 0)
    }
}

/// Restart the host, forcing applications closed.
///
/// The shutdown privilege is enabled for the duration of the call.
pub fn reboot() -> io::Result<()> {
    let _privilege = ShutdownPrivilege::enable()?;
    // SAFETY: plain call with constant flags.
    let ok = unsafe {
        ExitWindowsEx(
            EWX_REBOOT | EWX_FORCE,
            SHTDN_REASON_FLAG_PLANNED
                | SHTDN_REASON_MAJOR_APPLICATION
                | SHTDN_REASON_MINOR_INSTALLATION,
        )
    };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Enables `SeShutdownPrivilege` on the process token; the previous state is
/// restored and the token closed on drop.
struct ShutdownPrivilege {
    token: Handle,
    previous: TokenPrivileges,
}

impl ShutdownPrivilege {
    fn enable() -> io::Result<Self> {
        let mut token: Handle = ptr::null_mut();
        // SAFETY: `token` is a valid out-pointer.
        let opened = unsafe {
            OpenProcessToken(
                GetCurrentProcess(),
                TOKEN_ADJUST_PRIVILEGES | TOKEN_QUERY,
                &mut token,
            )
        };
        if opened == 0 {
            return Err(io::Error::last_os_error());
        }

        let name = wide("SeShutdownPrivilege");
        let mut luid = Luid::default();
        // SAFETY: `name` is NUL-terminated; `luid` is a valid out-pointer.
        if unsafe { LookupPrivilegeValueW(ptr::null(), name.as_ptr(), &mut luid) } == 0 {
            let err = io::Error::last_os_error();
            // SAFETY: `token` was opened above.
            unsafe { CloseHandle(token) };
            return Err(err);
        }

        let new_state = TokenPrivileges {
            privilege_count: 1,
            privileges: [LuidAndAttributes {
                luid,
                attributes: SE_PRIVILEGE_ENABLED,
            }],
        };
        let mut previous = TokenPrivileges::default();
        let mut length = 0u32;
        // SAFETY: all pointers refer to live locals of the right size.
        let ok = unsafe {
            AdjustTokenPrivileges(
                token,
                0,
                &new_state,
                size_of::<TokenPrivileges>() as u32,
                &mut previous,
                &mut length,
            )
        };
        let err = io::Error::last_os_error();
        if ok == 0 || err.raw_os_error() == Some(ERROR_NOT_ALL_ASSIGNED) {
            // SAFETY: `token` was opened above.
            unsafe { CloseHandle(token) };
            return Err(err);
        }

        Ok(Self { token, previous })
    }
}

impl Drop for ShutdownPrivilege {
    fn drop(&mut self) {
        // SAFETY: `token` is open until this point; `previous` came from
        // `AdjustTokenPrivileges`.
        unsafe {
            AdjustTokenPrivileges(
                self.token,
                0,
                &self.previous,
                0,
                ptr::null_mut(),
                ptr::null_mut(),
            );
            CloseHandle(self.token);
        }
    }
}
