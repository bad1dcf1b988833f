// tests/task_lifecycle.rs

use std::env;
use std::error::Error;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use provisioner::engine::{EngineContext, ExecutionOutcome};
use provisioner::native::{LaunchSpec, NativeSubsystems, ProcessLauncher};
use provisioner::task::result_message;
use provisioner::types::{JobKind, RebootPolicy};
use provisioner_test_utils::builders::DescriptorBuilder;
use provisioner_test_utils::fakes::{FakeNative, RecordingObserver};

type TestResult = Result<(), Box<dyn Error>>;

/// Tasks change process-wide state; run them one at a time.
static SERIAL: Mutex<()> = Mutex::new(());

/// Launcher that records where it was started from.
#[derive(Default)]
struct ProbeLauncher {
    seen: Mutex<Option<(PathBuf, Option<String>)>>,
    panic: bool,
}

impl ProcessLauncher for ProbeLauncher {
    fn run(&self, _spec: &LaunchSpec<'_>) -> io::Result<i32> {
        if self.panic {
            panic!("launcher exploded");
        }
        *self.seen.lock().unwrap() = Some((env::current_dir()?, env::var(".").ok()));
        Ok(0)
    }
}

fn native_with(launcher: Arc<ProbeLauncher>) -> NativeSubsystems {
    let mut native = FakeNative::new().subsystems();
    native.processes = launcher;
    native
}

#[test]
fn run_enters_the_task_directory_and_restores_it() -> TestResult {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir()?;
    let task_dir = dir.path().canonicalize()?.join("job");
    fs::create_dir_all(&task_dir)?;
    let before = env::current_dir()?;

    let launcher = Arc::new(ProbeLauncher::default());
    let task = DescriptorBuilder::executable("Probe").task(1, &task_dir);
    let outcome = task.run(
        &RecordingObserver::default(),
        &EngineContext::new(),
        &native_with(launcher.clone()),
    );

    assert_eq!(outcome, ExecutionOutcome::succeeded());
    let (cwd, dot) = launcher.seen.lock().unwrap().clone().expect("launcher ran");
    assert_eq!(cwd.canonicalize()?, task_dir);
    assert_eq!(dot.map(PathBuf::from), Some(task_dir.clone()));
    assert_eq!(env::current_dir()?, before);
    Ok(())
}

#[test]
fn panicking_executor_fails_the_task() -> TestResult {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir()?;
    let before = env::current_dir()?;

    let launcher = Arc::new(ProbeLauncher {
        panic: true,
        ..ProbeLauncher::default()
    });
    let task = DescriptorBuilder::executable("Boom").task(1, dir.path());
    let outcome = task.run(
        &RecordingObserver::default(),
        &EngineContext::new(),
        &native_with(launcher),
    );

    assert!(!outcome.success);
    assert!(
        outcome
            .detail
            .as_deref()
            .is_some_and(|d| d.contains("launcher exploded"))
    );
    assert_eq!(env::current_dir()?, before);
    Ok(())
}

#[test]
fn executor_fault_fails_the_task() -> TestResult {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir()?;

    let task =
        DescriptorBuilder::new("Script", JobKind::RunScript, "missing.ps1").task(1, dir.path());
    let outcome = task.run(
        &RecordingObserver::default(),
        &EngineContext::new(),
        &FakeNative::new().subsystems(),
    );

    assert!(!outcome.success);
    assert!(!outcome.reboot_required);
    assert!(outcome.detail.is_some());
    Ok(())
}

#[test]
fn missing_task_directory_fails_the_task() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let fakes = FakeNative::new();

    let task = DescriptorBuilder::executable("Nowhere")
        .task(1, &PathBuf::from("/definitely/not/a/directory"));
    let outcome = task.run(
        &RecordingObserver::default(),
        &EngineContext::new(),
        &fakes.subsystems(),
    );

    assert!(!outcome.success);
    assert!(fakes.processes.launches.lock().unwrap().is_empty());
}

#[test]
fn file_and_parameters_are_expanded_at_run_time() -> TestResult {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir()?;
    // SAFETY: serialized by SERIAL.
    unsafe { env::set_var("PROVISIONER_TASK_TOOL", "tool.exe") };
    let fakes = FakeNative::new();

    let task = DescriptorBuilder::new("Tool", JobKind::RunExecutable, "%PROVISIONER_TASK_TOOL%")
        .parameters("/dir=%PROVISIONER_TASK_TOOL%")
        .task(1, dir.path());
    task.run(&RecordingObserver::default(), &EngineContext::new(), &fakes.subsystems());

    let launch = fakes.processes.last().expect("launched");
    assert_eq!(launch.program, PathBuf::from("tool.exe"));
    assert_eq!(launch.arguments.as_deref(), Some("/dir=tool.exe"));
    Ok(())
}

#[test]
fn name_is_expanded_and_image_loaded_at_construction() -> TestResult {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("logo.png"), [0x89, b'P', b'N', b'G'])?;
    // SAFETY: serialized by SERIAL.
    unsafe { env::set_var("PROVISIONER_TASK_VERSION", "24.08") };

    let task = DescriptorBuilder::executable("7-Zip %PROVISIONER_TASK_VERSION%")
        .image("logo.png")
        .task(7, dir.path());

    assert_eq!(task.name(), "7-Zip 24.08");
    assert_eq!(task.to_string(), "7-Zip 24.08");
    assert_eq!(task.order_key(), 7);
    assert_eq!(task.directory(), dir.path());
    let image = task.image().expect("image loaded");
    assert_eq!(image.path, dir.path().join("logo.png"));
    assert_eq!(image.bytes, vec![0x89, b'P', b'N', b'G']);

    let missing = DescriptorBuilder::executable("x").image("nope.png").task(1, dir.path());
    assert!(missing.image().is_none());
    let blank = DescriptorBuilder::executable("x").image("  ").task(1, dir.path());
    assert!(blank.image().is_none());
    Ok(())
}

#[test]
fn settle_applies_the_reboot_policy() {
    let dir = PathBuf::from("/deploy");
    let cases = [
        (RebootPolicy::Never, ExecutionOutcome::succeeded_with_reboot(), false),
        (RebootPolicy::IfRequired, ExecutionOutcome::succeeded(), false),
        (RebootPolicy::IfRequired, ExecutionOutcome::succeeded_with_reboot(), true),
        (RebootPolicy::Always, ExecutionOutcome::failed(None), true),
        (RebootPolicy::Always, ExecutionOutcome::succeeded(), true),
    ];

    for (policy, outcome, expected) in cases {
        let ctx = EngineContext::new();
        let task = DescriptorBuilder::executable("job")
            .reboot(policy)
            .log_success(true)
            .task(1, &dir);
        task.settle(&outcome, &ctx);
        assert_eq!(ctx.reboot.is_scheduled(), expected, "{policy:?} {outcome:?}");
    }
}

#[test]
fn result_messages() {
    assert_eq!(
        result_message("7-Zip", &ExecutionOutcome::succeeded()),
        "7-Zip succeeded"
    );
    assert_eq!(
        result_message("7-Zip", &ExecutionOutcome::succeeded_with_reboot()),
        "7-Zip succeeded, a reboot is required"
    );
    assert_eq!(
        result_message(
            "KB1",
            &ExecutionOutcome::succeeded().with_detail("the update is already installed")
        ),
        "KB1 succeeded: the update is already installed"
    );
    assert_eq!(
        result_message("Office", &ExecutionOutcome::failed(Some("Fatal error.".into()))),
        "Office failed: Fatal error."
    );
    assert_eq!(result_message("Office", &ExecutionOutcome::failed(None)), "Office failed");
}
