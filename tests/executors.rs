// tests/executors.rs

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use provisioner::engine::{EngineContext, ExecutionOutcome};
use provisioner::errors::ProvisionError;
use provisioner::exec::update::update_arguments;
use provisioner::exec::{self, JobContext, SessionCall};
use provisioner::native::{MessageReply, ScriptFault, platform_message};
use provisioner::types::JobKind;
use provisioner_test_utils::fakes::{FakeNative, Launch, RecordingObserver, ScriptedMessage};

type TestResult = Result<(), Box<dyn Error>>;

struct Harness {
    fakes: FakeNative,
    observer: RecordingObserver,
    engine: EngineContext,
}

impl Harness {
    fn new() -> Self {
        Self {
            fakes: FakeNative::new(),
            observer: RecordingObserver::default(),
            engine: EngineContext::new(),
        }
    }

    fn run(
        &self,
        kind: JobKind,
        file: &str,
        parameters: Option<&str>,
    ) -> provisioner::errors::Result<ExecutionOutcome> {
        let native = self.fakes.subsystems();
        let job = JobContext {
            task: "test job",
            kind,
            file,
            parameters,
            observer: &self.observer,
            engine: &self.engine,
            native: &native,
        };
        exec::execute(&job)
    }
}

#[test]
fn package_install_routes_messages_and_maps_the_code() -> TestResult {
    let h = Harness::new();
    h.fakes.installer.set_messages(vec![
        ScriptedMessage::Progress("1: 0 2: 100 3: 0".into()),
        ScriptedMessage::ActionData("Copying files".into()),
        ScriptedMessage::Progress("1: 2 2: 40".into()),
        ScriptedMessage::Progress("1: 2".into()),
        ScriptedMessage::Warning("low disk space".into()),
        ScriptedMessage::Error("".into()),
        ScriptedMessage::FatalExit("gave up".into()),
        ScriptedMessage::Other,
    ]);
    h.fakes.installer.set_code(3010);

    let outcome = h.run(JobKind::InstallPackage, "C:/deploy/7z.msi", Some("ALLUSERS=1"))?;

    assert_eq!(outcome, ExecutionOutcome::succeeded_with_reboot());
    let calls = h.fakes.installer.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].operation, "install");
    assert_eq!(calls[0].target, "C:/deploy/7z.msi");
    assert_eq!(calls[0].properties, "REBOOT=ReallySuppress ALLUSERS=1");

    assert_eq!(
        h.fakes.installer.replies.lock().unwrap().clone(),
        vec![
            MessageReply::Handled,
            MessageReply::Handled,
            MessageReply::Handled,
            MessageReply::Unhandled,
            MessageReply::Unhandled,
            MessageReply::Unhandled,
            MessageReply::Unhandled,
            MessageReply::Unhandled,
        ]
    );
    assert_eq!(
        h.observer.reports(),
        vec![
            (String::new(), Some(0)),
            ("Copying files".to_string(), Some(0)),
            ("Copying files".to_string(), Some(40)),
        ]
    );
    Ok(())
}

#[test]
fn patch_and_removal_use_their_operations() -> TestResult {
    let h = Harness::new();

    h.run(JobKind::ApplyPatch, "a.msp;b.msp", None)?;
    h.run(JobKind::RemoveProduct, "{PRODUCT-CODE}", Some("  "))?;

    let calls = h.fakes.installer.calls.lock().unwrap().clone();
    assert_eq!(calls[0].operation, "patch");
    assert_eq!(calls[0].target, "a.msp;b.msp");
    assert_eq!(calls[0].properties, "REBOOT=ReallySuppress");
    assert_eq!(calls[1].operation, "remove");
    assert_eq!(calls[1].target, "{PRODUCT-CODE}");
    Ok(())
}

#[test]
fn package_failure_carries_platform_text() -> TestResult {
    let h = Harness::new();
    h.fakes.installer.set_code(1603);

    let outcome = h.run(JobKind::InstallPackage, "x.msi", None)?;

    assert_eq!(outcome, ExecutionOutcome::failed(Some(platform_message(1603))));
    Ok(())
}

#[test]
fn package_reboot_initiated_stops_the_run() -> TestResult {
    let h = Harness::new();
    h.fakes.installer.set_code(1641);

    let outcome = h.run(JobKind::InstallPackage, "x.msi", None)?;

    assert!(outcome.success && outcome.reboot_required);
    assert!(h.engine.stop.is_requested());
    Ok(())
}

#[test]
fn update_jobs_launch_the_agent() -> TestResult {
    let h = Harness::new();

    let outcome = h.run(JobKind::InstallUpdateFile, "kb123.msu", Some("/log:c:\\u.evt"))?;
    assert_eq!(outcome, ExecutionOutcome::succeeded());
    assert_eq!(
        h.fakes.processes.last(),
        Some(Launch {
            program: PathBuf::from("wusa.exe"),
            arguments: Some("/quiet /norestart \"kb123.msu\" /log:c:\\u.evt".to_string()),
            hidden: false,
        })
    );

    h.fakes.processes.set_code(0x0024_0007);
    let outcome = h.run(JobKind::RemoveUpdateById, "123456", None)?;
    assert_eq!(
        outcome,
        ExecutionOutcome::succeeded().with_detail("the update is not installed")
    );
    assert_eq!(
        h.fakes.processes.last().and_then(|l| l.arguments),
        Some("/uninstall /kb:123456 /quiet /norestart".to_string())
    );
    Ok(())
}

#[test]
fn update_arguments_reject_other_kinds() {
    assert!(matches!(
        update_arguments(JobKind::RunExecutable, "x"),
        Err(ProvisionError::ConfigError(_))
    ));
}

#[test]
fn update_agent_that_cannot_start_is_a_fault() {
    let h = Harness::new();
    *h.fakes.processes.fail_to_start.lock().unwrap() = true;

    let err = h
        .run(JobKind::InstallUpdateFile, "kb.msu", None)
        .expect_err("agent missing");

    assert!(matches!(err, ProvisionError::NativeError(ref m) if m.contains("wusa.exe")));
}

#[test]
fn executables_run_with_their_parameters() -> TestResult {
    let h = Harness::new();
    h.fakes.processes.set_code(3011);

    let outcome = h.run(JobKind::RunExecutableHidden, "tool.exe", Some("/S /D=C:\\x"))?;

    assert_eq!(outcome, ExecutionOutcome::succeeded_with_reboot());
    assert_eq!(
        h.fakes.processes.last(),
        Some(Launch {
            program: PathBuf::from("tool.exe"),
            arguments: Some("/S /D=C:\\x".to_string()),
            hidden: true,
        })
    );

    h.run(JobKind::RunExecutable, "tool.exe", None)?;
    let last = h.fakes.processes.last().expect("launched");
    assert!(!last.hidden);
    assert_eq!(last.arguments, None);
    Ok(())
}

#[test]
fn executable_failure_and_start_error() -> TestResult {
    let h = Harness::new();
    h.fakes.processes.set_code(5);
    let outcome = h.run(JobKind::RunExecutable, "tool.exe", None)?;
    assert_eq!(outcome, ExecutionOutcome::failed(Some(platform_message(5))));

    *h.fakes.processes.fail_to_start.lock().unwrap() = true;
    assert!(matches!(
        h.run(JobKind::RunExecutable, "missing.exe", None),
        Err(ProvisionError::NativeError(_))
    ));
    Ok(())
}

#[test]
fn driver_without_hardware_ids_only_stages() -> TestResult {
    let h = Harness::new();

    let outcome = h.run(JobKind::InstallDriverFile, "net.inf", None)?;

    assert_eq!(outcome, ExecutionOutcome::succeeded());
    assert_eq!(h.fakes.drivers.staged.lock().unwrap().clone(), vec!["net.inf"]);
    assert!(h.fakes.drivers.updated_ids().is_empty());
    Ok(())
}

#[test]
fn driver_updates_each_hardware_id() -> TestResult {
    let h = Harness::new();
    h.fakes.drivers.device("PCI\\VEN_2", Ok(true));
    let sep = provisioner::exec::driver::HARDWARE_ID_SEPARATOR;
    let ids = format!(" PCI\\VEN_1 {sep}{sep} PCI\\VEN_2{sep}  ");

    let outcome = h.run(JobKind::InstallDriverFileInteractive, "net.inf", Some(ids.as_str()))?;

    assert_eq!(outcome, ExecutionOutcome::succeeded_with_reboot());
    assert_eq!(
        h.fakes.drivers.updates.lock().unwrap().clone(),
        vec![
            ("PCI\\VEN_1".to_string(), true),
            ("PCI\\VEN_2".to_string(), true),
        ]
    );
    Ok(())
}

#[test]
fn driver_stops_at_the_first_failing_device() -> TestResult {
    let h = Harness::new();
    h.fakes.drivers.device("A", Ok(true));
    h.fakes.drivers.device("B", Err(2));
    let sep = provisioner::exec::driver::HARDWARE_ID_SEPARATOR;

    let outcome = h.run(
        JobKind::InstallDriverFile,
        "net.inf",
        Some(format!("A{sep}B{sep}C").as_str()),
    )?;

    assert_eq!(
        outcome,
        ExecutionOutcome {
            success: false,
            reboot_required: true,
            detail: Some(platform_message(2)),
        }
    );
    assert_eq!(h.fakes.drivers.updated_ids(), vec!["A", "B"]);
    Ok(())
}

#[test]
fn driver_stage_failure_fails_the_job() -> TestResult {
    let h = Harness::new();
    h.fakes.drivers.fail_stage(2);

    let outcome = h.run(JobKind::InstallDriverFile, "net.inf", Some("A"))?;

    assert_eq!(outcome, ExecutionOutcome::failed(Some(platform_message(2))));
    assert!(h.fakes.drivers.updated_ids().is_empty());
    Ok(())
}

#[test]
fn script_runs_body_with_parameters_through_the_session() -> TestResult {
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("setup.ps1");
    fs::write(&script, "Write-Output 'hi'")?;
    let h = Harness::new();
    h.fakes.scripts.set_calls(vec![
        SessionCall::Action("Configuring".into()),
        SessionCall::Progress(30),
        SessionCall::Progress(30),
        SessionCall::RequestReboot,
    ]);

    let outcome = h.run(
        JobKind::RunScript,
        script.to_str().expect("utf-8 path"),
        Some("-Mode Full"),
    )?;

    assert_eq!(outcome, ExecutionOutcome::succeeded_with_reboot());
    assert_eq!(
        h.fakes.scripts.runs.lock().unwrap().clone(),
        vec![("Write-Output 'hi'".to_string(), Some("-Mode Full".to_string()))]
    );
    assert_eq!(
        h.observer.reports(),
        vec![
            ("Configuring".to_string(), None),
            ("Configuring".to_string(), Some(30)),
        ]
    );
    Ok(())
}

#[test]
fn script_fault_fails_but_keeps_the_reboot_request() -> TestResult {
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("setup.sh");
    fs::write(&script, "exit 0")?;
    let h = Harness::new();
    h.fakes.scripts.set_calls(vec![SessionCall::RequestReboot, SessionCall::Stop]);
    h.fakes
        .scripts
        .set_result(Err(ScriptFault("division by zero".into())));

    let outcome = h.run(JobKind::RunScript, script.to_str().expect("utf-8 path"), None)?;

    assert_eq!(
        outcome,
        ExecutionOutcome {
            success: false,
            reboot_required: true,
            detail: Some("division by zero".to_string()),
        }
    );
    assert!(h.engine.stop.is_requested());
    Ok(())
}

#[test]
fn script_exit_code_is_mapped() -> TestResult {
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("setup.sh");
    fs::write(&script, "exit 5")?;
    let h = Harness::new();
    h.fakes.scripts.set_result(Ok(5));

    let outcome = h.run(JobKind::RunScript, script.to_str().expect("utf-8 path"), None)?;

    assert_eq!(outcome, ExecutionOutcome::failed(Some(platform_message(5))));
    Ok(())
}

#[test]
fn unreadable_script_is_a_fault() {
    let h = Harness::new();

    let err = h
        .run(JobKind::RunScript, "/definitely/not/here.ps1", None)
        .expect_err("missing script");

    assert!(matches!(err, ProvisionError::Other(_)));
    assert!(h.fakes.scripts.runs.lock().unwrap().is_empty());
}
