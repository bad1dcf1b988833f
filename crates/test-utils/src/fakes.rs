#![allow(dead_code)]

//! Fake native subsystems, observers and surfaces.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use provisioner::errors::Result;
use provisioner::exec::{ProgressObserver, ScriptSession, SessionCall};
use provisioner::native::{
    DriverStore, InstallerMessage, InstallerMessageSink, LaunchSpec, MessageReply,
    NativeSubsystems, PackageInstaller, PackageOperation, ProcessLauncher, ScriptFault,
    ScriptHost,
};
use provisioner::task::DisplayImage;
use provisioner::engine::StatusSurface;

/// A message the fake installer plays back, owned so it can be scripted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedMessage {
    FatalExit(String),
    Error(String),
    Warning(String),
    ActionData(String),
    Progress(String),
    Other,
}

impl ScriptedMessage {
    fn as_message(&self) -> InstallerMessage<'_> {
        match self {
            ScriptedMessage::FatalExit(t) => InstallerMessage::FatalExit(t),
            ScriptedMessage::Error(t) => InstallerMessage::Error(t),
            ScriptedMessage::Warning(t) => InstallerMessage::Warning(t),
            ScriptedMessage::ActionData(t) => InstallerMessage::ActionData(t),
            ScriptedMessage::Progress(t) => InstallerMessage::Progress(t),
            ScriptedMessage::Other => InstallerMessage::Other,
        }
    }
}

/// One recorded installer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerCall {
    pub operation: String,
    pub target: String,
    pub properties: String,
}

/// Package installer that plays back messages and returns a fixed code.
#[derive(Default)]
pub struct FakeInstaller {
    pub messages: Mutex<Vec<ScriptedMessage>>,
    pub code: Mutex<u32>,
    pub calls: Mutex<Vec<InstallerCall>>,
    pub replies: Mutex<Vec<MessageReply>>,
}

impl FakeInstaller {
    pub fn set_messages(&self, messages: Vec<ScriptedMessage>) {
        *self.messages.lock().unwrap() = messages;
    }

    pub fn set_code(&self, code: u32) {
        *self.code.lock().unwrap() = code;
    }
}

impl PackageInstaller for FakeInstaller {
    fn execute(
        &self,
        operation: PackageOperation<'_>,
        properties: &str,
        sink: &mut dyn InstallerMessageSink,
    ) -> Result<u32> {
        let (name, target) = match operation {
            PackageOperation::Install { package } => ("install", package),
            PackageOperation::ApplyPatches { patches } => ("patch", patches),
            PackageOperation::Remove { product } => ("remove", product),
        };
        self.calls.lock().unwrap().push(InstallerCall {
            operation: name.to_string(),
            target: target.to_string(),
            properties: properties.to_string(),
        });

        let messages = self.messages.lock().unwrap().clone();
        for message in &messages {
            let reply = sink.on_message(message.as_message());
            self.replies.lock().unwrap().push(reply);
        }
        Ok(*self.code.lock().unwrap())
    }
}

/// Driver store with scripted results. Errors are raw OS error codes.
#[derive(Default)]
pub struct FakeDriverStore {
    pub stage_error: Mutex<Option<i32>>,
    /// Per hardware ID: `Ok(reboot)` or `Err(os error)`. Unknown IDs succeed
    /// without a reboot.
    pub devices: Mutex<HashMap<String, std::result::Result<bool, i32>>>,
    pub staged: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<(String, bool)>>,
}

impl FakeDriverStore {
    pub fn fail_stage(&self, code: i32) {
        *self.stage_error.lock().unwrap() = Some(code);
    }

    pub fn device(&self, hardware_id: &str, result: std::result::Result<bool, i32>) {
        self.devices
            .lock()
            .unwrap()
            .insert(hardware_id.to_string(), result);
    }

    pub fn updated_ids(&self) -> Vec<String> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl DriverStore for FakeDriverStore {
    fn stage(&self, inf: &str) -> io::Result<()> {
        self.staged.lock().unwrap().push(inf.to_string());
        match *self.stage_error.lock().unwrap() {
            Some(code) => Err(io::Error::from_raw_os_error(code)),
            None => Ok(()),
        }
    }

    fn update_devices(&self, hardware_id: &str, _inf: &str, interactive: bool) -> io::Result<bool> {
        self.updates
            .lock()
            .unwrap()
            .push((hardware_id.to_string(), interactive));
        match self.devices.lock().unwrap().get(hardware_id) {
            Some(Ok(reboot)) => Ok(*reboot),
            Some(Err(code)) => Err(io::Error::from_raw_os_error(*code)),
            None => Ok(false),
        }
    }
}

/// Script host that applies scripted session calls, then returns a fixed
/// result.
pub struct FakeScriptHost {
    pub calls: Mutex<Vec<SessionCall>>,
    pub result: Mutex<std::result::Result<i32, ScriptFault>>,
    pub runs: Mutex<Vec<(String, Option<String>)>>,
}

impl Default for FakeScriptHost {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            result: Mutex::new(Ok(0)),
            runs: Mutex::new(Vec::new()),
        }
    }
}

impl FakeScriptHost {
    pub fn set_calls(&self, calls: Vec<SessionCall>) {
        *self.calls.lock().unwrap() = calls;
    }

    pub fn set_result(&self, result: std::result::Result<i32, ScriptFault>) {
        *self.result.lock().unwrap() = result;
    }
}

impl ScriptHost for FakeScriptHost {
    fn run(
        &self,
        body: &str,
        parameters: Option<&str>,
        session: &mut ScriptSession<'_>,
    ) -> std::result::Result<i32, ScriptFault> {
        self.runs
            .lock()
            .unwrap()
            .push((body.to_string(), parameters.map(str::to_string)));
        for call in self.calls.lock().unwrap().iter().cloned() {
            session.apply(call);
        }
        self.result.lock().unwrap().clone()
    }
}

/// One recorded process launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub program: PathBuf,
    pub arguments: Option<String>,
    pub hidden: bool,
}

/// Process launcher that records launches and returns a fixed exit code.
#[derive(Default)]
pub struct FakeProcessLauncher {
    pub code: Mutex<i32>,
    pub fail_to_start: Mutex<bool>,
    pub launches: Mutex<Vec<Launch>>,
}

impl FakeProcessLauncher {
    pub fn set_code(&self, code: i32) {
        *self.code.lock().unwrap() = code;
    }

    pub fn last(&self) -> Option<Launch> {
        self.launches.lock().unwrap().last().cloned()
    }
}

impl ProcessLauncher for FakeProcessLauncher {
    fn run(&self, spec: &LaunchSpec<'_>) -> io::Result<i32> {
        self.launches.lock().unwrap().push(Launch {
            program: spec.program.to_path_buf(),
            arguments: spec.arguments.map(str::to_string),
            hidden: spec.hidden,
        });
        if *self.fail_to_start.lock().unwrap() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
        }
        Ok(*self.code.lock().unwrap())
    }
}

/// A full set of fakes, with handles kept for assertions.
#[derive(Clone)]
pub struct FakeNative {
    pub installer: Arc<FakeInstaller>,
    pub drivers: Arc<FakeDriverStore>,
    pub scripts: Arc<FakeScriptHost>,
    pub processes: Arc<FakeProcessLauncher>,
}

impl FakeNative {
    pub fn new() -> Self {
        Self {
            installer: Arc::new(FakeInstaller::default()),
            drivers: Arc::new(FakeDriverStore::default()),
            scripts: Arc::new(FakeScriptHost::default()),
            processes: Arc::new(FakeProcessLauncher::default()),
        }
    }

    pub fn subsystems(&self) -> NativeSubsystems {
        NativeSubsystems {
            installer: self.installer.clone(),
            drivers: self.drivers.clone(),
            scripts: self.scripts.clone(),
            processes: self.processes.clone(),
            update_agent: PathBuf::from("wusa.exe"),
        }
    }
}

impl Default for FakeNative {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer that records every report.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub reports: Mutex<Vec<(String, Option<u8>)>>,
}

impl RecordingObserver {
    pub fn reports(&self) -> Vec<(String, Option<u8>)> {
        self.reports.lock().unwrap().clone()
    }

    pub fn percents(&self) -> Vec<Option<u8>> {
        self.reports().into_iter().map(|(_, p)| p).collect()
    }
}

impl ProgressObserver for RecordingObserver {
    fn report(&self, action: &str, percent: Option<u8>) {
        self.reports
            .lock()
            .unwrap()
            .push((action.to_string(), percent));
    }
}

/// What a [`RecordingSurface`] was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Begin { name: String, has_image: bool },
    Progress { action: String, percent: Option<u8> },
    Clear,
}

/// Status surface that records calls into a shared log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub events: Arc<Mutex<Vec<SurfaceEvent>>>,
}

impl RecordingSurface {
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl StatusSurface for RecordingSurface {
    fn begin_task(&mut self, name: &str, image: Option<&DisplayImage>) {
        self.events.lock().unwrap().push(SurfaceEvent::Begin {
            name: name.to_string(),
            has_image: image.is_some(),
        });
    }

    fn progress(&mut self, action: &str, percent: Option<u8>) {
        self.events.lock().unwrap().push(SurfaceEvent::Progress {
            action: action.to_string(),
            percent,
        });
    }

    fn clear(&mut self) {
        self.events.lock().unwrap().push(SurfaceEvent::Clear);
    }
}
