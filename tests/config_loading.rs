// tests/config_loading.rs

use std::error::Error;
use std::fs;

use provisioner::config::load_and_validate;
use provisioner::errors::ProvisionError;
use provisioner::types::{BadEntryPolicy, ExclusivityRule, ScriptDialect};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn full_config_loads() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Provisioner.toml");
    fs::write(
        &path,
        r#"
[config]
log_path = "%ProgramData%/provisioner/provisioner.log"
suppress_reboot = true
ignore_session_end = true
bad_entry = "abort"
exclusivity = "first-come"
update_agent = "C:/Windows/System32/wusa.exe"
script_interpreter = ["pwsh", "-NoProfile", "-File"]
script_dialect = "powershell"

[jobs]
"20" = "b.toml"
"10" = { expand = "%DEPLOY%/a.toml" }
"-1" = "z.toml"
"#,
    )?;

    let cfg = load_and_validate(&path)?;

    assert!(cfg.config.suppress_reboot);
    assert!(cfg.config.ignore_session_end);
    assert_eq!(cfg.config.bad_entry, BadEntryPolicy::Abort);
    assert_eq!(cfg.config.exclusivity, ExclusivityRule::FirstCome);
    assert_eq!(cfg.config.script_dialect, ScriptDialect::PowerShell);
    assert_eq!(
        cfg.config.script_interpreter.as_deref(),
        Some(&["pwsh".to_string(), "-NoProfile".to_string(), "-File".to_string()][..])
    );
    let keys: Vec<_> = cfg.jobs.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["20", "10", "-1"]);
    Ok(())
}

#[test]
fn defaults_apply_when_config_section_is_missing() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("p.toml");
    fs::write(&path, "[jobs]\n\"1\" = \"a.toml\"\n")?;

    let cfg = load_and_validate(&path)?;

    assert!(!cfg.config.suppress_reboot);
    assert!(!cfg.config.ignore_session_end);
    assert_eq!(cfg.config.bad_entry, BadEntryPolicy::Skip);
    assert_eq!(cfg.config.exclusivity, ExclusivityRule::ExclusiveWins);
    assert_eq!(cfg.config.log_path, None);
    assert_eq!(cfg.jobs.len(), 1);
    Ok(())
}

#[test]
fn invalid_config_sections_are_fatal() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("p.toml");

    let cases = [
        ("[config]\nlog_path = \"\"\n", "config"),
        ("[config]\nupdate_agent = \" \"\n", "config"),
        ("[config]\nscript_interpreter = []\n", "config"),
        ("[config]\nscript_interpreter = [\"\"]\n", "config"),
        ("[config]\nbad_entry = \"ignore\"\n", "toml"),
        ("[config]\nexclusivity = \"last-wins\"\n", "toml"),
        ("[config]\nreg_path = \"HKLM\"\n", "toml"),
        ("[settings]\n", "toml"),
    ];

    for (text, kind) in cases {
        fs::write(&path, text)?;
        let err = load_and_validate(&path).expect_err(text);
        match kind {
            "config" => assert!(matches!(err, ProvisionError::ConfigError(_)), "{text}: {err}"),
            _ => assert!(matches!(err, ProvisionError::TomlError(_)), "{text}: {err}"),
        }
    }
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_and_validate("definitely/not/here/Provisioner.toml").expect_err("missing");
    assert!(matches!(err, ProvisionError::IoError(_)));
}
