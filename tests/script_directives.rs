// tests/script_directives.rs

use provisioner::exec::SessionCall;
use provisioner::native::script_host::{Directive, parse_directive, wrap_script};
use provisioner::types::ScriptDialect;

#[test]
fn directives_map_to_session_calls() {
    let cases = [
        ("##session:action Copying files", SessionCall::Action("Copying files".into())),
        ("##session:progress 42", SessionCall::Progress(42)),
        ("##session:progress  -1 \r", SessionCall::Progress(-1)),
        ("##session:information hello world", SessionCall::Information("hello world".into())),
        ("##session:warning careful", SessionCall::Warning("careful".into())),
        ("##session:error broken", SessionCall::Error("broken".into())),
        ("##session:reboot", SessionCall::RequestReboot),
        ("##session:reboot ", SessionCall::RequestReboot),
        ("##session:stop", SessionCall::Stop),
        ("##session:action", SessionCall::Action(String::new())),
    ];

    for (line, call) in cases {
        assert_eq!(parse_directive(line), Some(Directive::Call(call)), "{line:?}");
    }
}

#[test]
fn fault_directive_carries_the_message() {
    assert_eq!(
        parse_directive("##session:fault Attempted to divide by zero."),
        Some(Directive::Fault("Attempted to divide by zero.".into()))
    );
}

#[test]
fn ordinary_output_is_not_a_directive() {
    for line in [
        "",
        "hello",
        " ##session:action indented",
        "##session:",
        "##session:launch rockets",
        "##session:progress lots",
        "##session:progress 99999999999",
        "##Session:action case matters",
    ] {
        assert_eq!(parse_directive(line), None, "{line:?}");
    }
}

#[test]
fn wrapped_scripts_define_the_session_before_the_body() {
    let posix = wrap_script(ScriptDialect::Posix, "echo body", Some("a b"));
    let session = posix.find("session_action()").expect("session defined");
    let body = posix.find("echo body").expect("body included");
    assert!(session < body);
    assert!(posix.contains("__provisioner_job a b\n"));

    let ps = wrap_script(ScriptDialect::PowerShell, "Write-Output body", None);
    let session = ps.find("$Session").expect("session defined");
    let body = ps.find("Write-Output body").expect("body included");
    assert!(session < body);
    assert!(ps.contains("__SessionEmit 'fault'"));
}
