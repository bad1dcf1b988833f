// src/native/script_host.rs

//! Script host backed by an external interpreter.
//!
//! The job script is wrapped in a small prologue that defines the session
//! object for the target language, written to a temporary file and handed to
//! the interpreter. The session talks back over stdout, one directive per
//! line:
//!
//! ```text
//! ##session:<verb> <argument>
//! ```
//!
//! Verbs are `action`, `progress`, `information`, `warning`, `error`,
//! `reboot`, `stop`, and `fault` (emitted by the wrapper when the script
//! throws). Other stdout lines are logged at debug; stderr lines become
//! session warnings once the interpreter exits.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{ScriptFault, ScriptHost};
use crate::exec::script::{ScriptSession, SessionCall};
use crate::types::ScriptDialect;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^##session:([a-z]+)(?:[ \t]+(.*))?$").expect("directive pattern is valid")
});

/// A parsed stdout directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Call(SessionCall),
    /// The script threw; the argument is the error message.
    Fault(String),
}

/// Parse one stdout line. Returns `None` for ordinary output, unknown verbs
/// and progress values that are not integers.
pub fn parse_directive(line: &str) -> Option<Directive> {
    let caps = DIRECTIVE.captures(line.trim_end())?;
    let verb = caps.get(1)?.as_str();
    let arg = caps.get(2).map_or("", |m| m.as_str()).trim_end().to_string();

    let call = match verb {
        "action" => SessionCall::Action(arg),
        "progress" => SessionCall::Progress(arg.trim().parse().ok()?),
        "information" => SessionCall::Information(arg),
        "warning" => SessionCall::Warning(arg),
        "error" => SessionCall::Error(arg),
        "reboot" => SessionCall::RequestReboot,
        "stop" => SessionCall::Stop,
        "fault" => return Some(Directive::Fault(arg)),
        _ => return None,
    };
    Some(Directive::Call(call))
}

/// [`ScriptHost`] that runs an interpreter on a wrapped copy of the script.
///
/// The path of the wrapped script is appended to `args`.
#[derive(Debug, Clone)]
pub struct InterpreterScriptHost {
    program: PathBuf,
    args: Vec<String>,
    dialect: ScriptDialect,
}

impl InterpreterScriptHost {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, dialect: ScriptDialect) -> Self {
        Self {
            program: program.into(),
            args,
            dialect,
        }
    }

    /// Windows PowerShell on Windows, `sh` everywhere else.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::new(
                "powershell.exe",
                ["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-File"]
                    .map(String::from)
                    .to_vec(),
                ScriptDialect::PowerShell,
            )
        } else {
            Self::new("sh", Vec::new(), ScriptDialect::Posix)
        }
    }

    pub fn dialect(&self) -> ScriptDialect {
        self.dialect
    }

    fn write_script(&self, script: &str) -> io::Result<tempfile::TempPath> {
        let suffix = match self.dialect {
            ScriptDialect::PowerShell => ".ps1",
            ScriptDialect::Posix => ".sh",
        };
        let mut file = tempfile::Builder::new()
            .prefix("provisioner-")
            .suffix(suffix)
            .tempfile()?;
        file.write_all(script.as_bytes())?;
        file.flush()?;
        // Close our handle so the interpreter can open the file on Windows.
        Ok(file.into_temp_path())
    }
}

impl ScriptHost for InterpreterScriptHost {
    fn run(
        &self,
        body: &str,
        parameters: Option<&str>,
        session: &mut ScriptSession<'_>,
    ) -> Result<i32, ScriptFault> {
        let script = wrap_script(self.dialect, body, parameters);
        let path = self
            .write_script(&script)
            .map_err(|e| ScriptFault(format!("writing wrapped script: {e}")))?;

        debug!(program = %self.program.display(), script = %path.display(), "starting script interpreter");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ScriptFault(format!(
                    "starting interpreter {}: {e}",
                    self.program.display()
                ))
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let mut fault = None;

        let diagnostics = std::thread::scope(|s| {
            let reader = s.spawn(move || stderr.map(read_lines).unwrap_or_default());

            if let Some(stdout) = stdout {
                for line in read_lines(stdout) {
                    match parse_directive(&line) {
                        Some(Directive::Call(call)) => session.apply(call),
                        Some(Directive::Fault(message)) => fault = Some(message),
                        None => debug!(task = %session.task(), "stdout: {}", line),
                    }
                }
            }

            reader.join().unwrap_or_default()
        });

        for line in diagnostics.iter().filter(|l| !l.trim().is_empty()) {
            session.warning(line);
        }

        let status = child
            .wait()
            .map_err(|e| ScriptFault(format!("waiting for interpreter: {e}")))?;
        drop(path);

        match fault {
            Some(message) => Err(ScriptFault(message)),
            None => Ok(status.code().unwrap_or(-1)),
        }
    }
}

/// Read lines until EOF, tolerating invalid UTF-8 and `\r\n` endings.
fn read_lines(stream: impl Read) -> Vec<String> {
    let mut reader = BufReader::new(stream);
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                lines.push(line.trim_end_matches(['\r', '\n']).to_string());
            }
        }
    }
    lines
}

/// Wrap `body` so that it runs as a block invoked with `parameters`, with
/// the session object defined first.
pub fn wrap_script(dialect: ScriptDialect, body: &str, parameters: Option<&str>) -> String {
    let parameters = parameters.unwrap_or_default();
    match dialect {
        ScriptDialect::PowerShell => format!(
            "{POWERSHELL_PROLOGUE}\ntry {{\n    . {{\n{body}\n    }} {parameters}\n    exit 0\n}} catch {{\n    __SessionEmit 'fault' $_.Exception.Message\n    exit 1\n}}\n"
        ),
        ScriptDialect::Posix => format!(
            "{POSIX_PROLOGUE}\n__provisioner_job() {{\n:\n{body}\n}}\n__provisioner_job {parameters}\nexit $?\n"
        ),
    }
}

const POWERSHELL_PROLOGUE: &str = r###"function __SessionEmit([string]$Verb, [string]$Text) {
    $line = ('##session:{0} {1}' -f $Verb, ($Text -replace "`r?`n", ' ')).TrimEnd()
    [Console]::Out.WriteLine($line)
    [Console]::Out.Flush()
}
$Session = New-Object -TypeName PSObject -Property @{ _Action = ''; _Progress = -1 }
$Session | Add-Member -MemberType ScriptProperty -Name Action -Value { $this._Action } -SecondValue {
    param([string]$Value)
    $this._Action = $Value
    __SessionEmit 'action' $Value
}
$Session | Add-Member -MemberType ScriptProperty -Name Progress -Value { $this._Progress } -SecondValue {
    param([int]$Value)
    $this._Progress = [Math]::Max(-1, [Math]::Min(100, $Value))
    __SessionEmit 'progress' $this._Progress
}
$Session | Add-Member -MemberType ScriptMethod -Name Information -Value { param([string]$Message) __SessionEmit 'information' $Message }
$Session | Add-Member -MemberType ScriptMethod -Name Warning -Value { param([string]$Message) __SessionEmit 'warning' $Message }
$Session | Add-Member -MemberType ScriptMethod -Name Error -Value { param([string]$Message) __SessionEmit 'error' $Message }
$Session | Add-Member -MemberType ScriptMethod -Name RequestReboot -Value { __SessionEmit 'reboot' '' }
$Session | Add-Member -MemberType ScriptMethod -Name Stop -Value { __SessionEmit 'stop' '' }"###;

const POSIX_PROLOGUE: &str = r###"session_emit() { printf '##session:%s %s\n' "$1" "$2"; }
session_action() { session_emit action "$*"; }
session_progress() { session_emit progress "$1"; }
session_information() { session_emit information "$*"; }
session_warning() { session_emit warning "$*"; }
session_error() { session_emit error "$*"; }
session_request_reboot() { session_emit reboot ''; }
session_stop() { session_emit stop ''; }"###;
