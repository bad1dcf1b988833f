// tests/cli_args.rs

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use provisioner::cli::{CliArgs, LogLevel};
use provisioner::config::default_config_path;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn config_defaults_to_the_default_config_path() -> TestResult {
    let args = CliArgs::try_parse_from(["provisioner"])?;

    assert_eq!(args.config, default_config_path());
    assert_eq!(args.config, PathBuf::from("Provisioner.toml"));
    assert!(args.log_level.is_none());
    assert!(!args.dry_run);
    assert!(!args.no_reboot);
    Ok(())
}

#[test]
fn flags_override_the_defaults() -> TestResult {
    let args = CliArgs::try_parse_from([
        "provisioner",
        "--config",
        "/etc/provisioner/agent.toml",
        "--log-level",
        "debug",
        "--dry-run",
        "--no-reboot",
    ])?;

    assert_eq!(args.config, PathBuf::from("/etc/provisioner/agent.toml"));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(args.dry_run);
    assert!(args.no_reboot);
    Ok(())
}

#[test]
fn unknown_log_level_is_rejected() {
    assert!(CliArgs::try_parse_from(["provisioner", "--log-level", "loud"]).is_err());
}
