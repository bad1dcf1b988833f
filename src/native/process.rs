// src/native/process.rs

//! Plain process execution.
//!
//! Jobs hand over their parameters as one raw argument string, the way a
//! Windows command line works. On Windows it is passed through untouched; on
//! other platforms it is split with the same quoting rules first.

use std::io;
use std::process::{Command, ExitStatus};

use tracing::debug;

use super::{LaunchSpec, ProcessLauncher};

/// [`ProcessLauncher`] backed by `std::process::Command`.
///
/// Jobs run on a blocking worker thread, so a blocking wait is what we want
/// here.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdProcessLauncher;

impl ProcessLauncher for StdProcessLauncher {
    fn run(&self, spec: &LaunchSpec<'_>) -> io::Result<i32> {
        let mut cmd = Command::new(spec.program);
        if let Some(arguments) = spec.arguments {
            apply_arguments(&mut cmd, arguments);
        }
        if spec.hidden {
            hide_window(&mut cmd);
        }

        debug!(program = %spec.program.display(), arguments = ?spec.arguments, hidden = spec.hidden, "starting process");
        let status = cmd.status()?;
        let code = exit_code(status);
        debug!(program = %spec.program.display(), exit_code = code, "process exited");
        Ok(code)
    }
}

#[cfg(windows)]
fn apply_arguments(cmd: &mut Command, arguments: &str) {
    use std::os::windows::process::CommandExt;
    cmd.raw_arg(arguments);
}

#[cfg(not(windows))]
fn apply_arguments(cmd: &mut Command, arguments: &str) {
    cmd.args(split_command_line(arguments));
}

#[cfg(windows)]
fn hide_window(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_window(cmd: &mut Command) {
    cmd.stdin(std::process::Stdio::null());
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Split a command line into arguments using the Windows rules:
///
/// - unquoted whitespace separates arguments
/// - `"` toggles quoting; `""` inside quotes is a literal quote
/// - `2n` backslashes before a quote become `n` backslashes and the quote
///   toggles; `2n + 1` backslashes become `n` and a literal quote
/// - other backslashes are literal
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quoted = false;
    let mut backslashes = 0usize;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                backslashes += 1;
                in_arg = true;
            }
            '"' => {
                current.extend(std::iter::repeat_n('\\', backslashes / 2));
                if backslashes % 2 == 1 {
                    current.push('"');
                } else if quoted && chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    quoted = !quoted;
                }
                backslashes = 0;
                in_arg = true;
            }
            c if c.is_whitespace() && !quoted => {
                current.extend(std::iter::repeat_n('\\', backslashes));
                backslashes = 0;
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            c => {
                current.extend(std::iter::repeat_n('\\', backslashes));
                backslashes = 0;
                current.push(c);
                in_arg = true;
            }
        }
    }

    current.extend(std::iter::repeat_n('\\', backslashes));
    if in_arg {
        args.push(current);
    }
    args
}
