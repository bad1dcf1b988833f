// tests/script_host_posix.rs
#![cfg(unix)]

use std::error::Error;

use provisioner::engine::StopFlag;
use provisioner::exec::ScriptSession;
use provisioner::native::{InterpreterScriptHost, ScriptFault, ScriptHost};
use provisioner::types::ScriptDialect;
use provisioner_test_utils::fakes::RecordingObserver;

type TestResult = Result<(), Box<dyn Error>>;

fn sh() -> InterpreterScriptHost {
    InterpreterScriptHost::new("sh", Vec::new(), ScriptDialect::Posix)
}

#[test]
fn script_drives_the_session_and_returns_its_exit_code() -> TestResult {
    let observer = RecordingObserver::default();
    let stop = StopFlag::new();
    let mut session = ScriptSession::new("script job", &observer, &stop);

    let body = r#"
session_action "Configuring $1"
session_progress 40
echo "plain output"
echo "something odd" >&2
session_request_reboot
exit 7
"#;
    let code = sh().run(body, Some("alpha beta"), &mut session)?;

    assert_eq!(code, 7);
    assert!(session.reboot_requested());
    assert!(!stop.is_requested());
    assert_eq!(
        observer.reports(),
        vec![
            ("Configuring alpha".to_string(), None),
            ("Configuring alpha".to_string(), Some(40)),
        ]
    );
    Ok(())
}

#[test]
fn falling_off_the_end_returns_the_last_status() -> TestResult {
    let observer = RecordingObserver::default();
    let stop = StopFlag::new();
    let mut session = ScriptSession::new("script job", &observer, &stop);

    assert_eq!(sh().run("true", None, &mut session)?, 0);
    assert_eq!(sh().run("false", None, &mut session)?, 1);
    assert_eq!(sh().run("", None, &mut session)?, 0);
    Ok(())
}

#[test]
fn stop_request_reaches_the_flag() -> TestResult {
    let observer = RecordingObserver::default();
    let stop = StopFlag::new();
    let mut session = ScriptSession::new("script job", &observer, &stop);

    sh().run("session_stop", None, &mut session)?;

    assert!(stop.is_requested());
    Ok(())
}

#[test]
fn fault_directive_fails_the_run() {
    let observer = RecordingObserver::default();
    let stop = StopFlag::new();
    let mut session = ScriptSession::new("script job", &observer, &stop);

    let result = sh().run("echo '##session:fault it broke'\nexit 0", None, &mut session);

    assert_eq!(result, Err(ScriptFault("it broke".into())));
}

#[test]
fn missing_interpreter_is_a_fault() {
    let observer = RecordingObserver::default();
    let stop = StopFlag::new();
    let mut session = ScriptSession::new("script job", &observer, &stop);
    let host = InterpreterScriptHost::new(
        "/definitely/not/an/interpreter",
        Vec::new(),
        ScriptDialect::Posix,
    );

    let result = host.run("true", None, &mut session);

    assert!(matches!(result, Err(ScriptFault(ref m)) if m.contains("starting interpreter")));
}
