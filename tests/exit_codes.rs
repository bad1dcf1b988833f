// tests/exit_codes.rs

use provisioner::engine::{ExecutionOutcome, StopFlag};
use provisioner::exec::map_exit_code;
use provisioner::exec::update::{
    UPDATE_ALREADY_INSTALLED, UPDATE_NOT_APPLICABLE, UPDATE_NOT_INSTALLED, map_update_exit_code,
};
use provisioner::native::platform_message;

#[test]
fn success_codes() {
    let stop = StopFlag::new();

    assert_eq!(map_exit_code(0, &stop), ExecutionOutcome::succeeded());
    assert_eq!(map_exit_code(3010, &stop), ExecutionOutcome::succeeded_with_reboot());
    assert_eq!(map_exit_code(3011, &stop), ExecutionOutcome::succeeded_with_reboot());
    assert!(!stop.is_requested());
}

#[test]
fn reboot_initiated_also_requests_stop() {
    let stop = StopFlag::new();

    let outcome = map_exit_code(1641, &stop);

    assert!(outcome.success);
    assert!(outcome.reboot_required);
    assert!(stop.is_requested());
}

#[test]
fn other_codes_fail_with_platform_text() {
    let stop = StopFlag::new();

    let outcome = map_exit_code(5, &stop);

    assert!(!outcome.success);
    assert!(!outcome.reboot_required);
    let detail = outcome.detail.expect("detail");
    assert_eq!(detail, platform_message(5));
    assert!(detail.ends_with('.'));
    assert!(!detail.contains("os error"));
}

#[test]
fn update_agent_specific_codes() {
    let stop = StopFlag::new();

    let failed = map_update_exit_code(1, &stop);
    assert_eq!(failed, ExecutionOutcome::failed(None));

    let already = map_update_exit_code(UPDATE_ALREADY_INSTALLED as i32, &stop);
    assert!(already.success && !already.reboot_required);
    assert_eq!(already.detail.as_deref(), Some("the update is already installed"));

    let missing = map_update_exit_code(UPDATE_NOT_INSTALLED as i32, &stop);
    assert!(missing.success && !missing.reboot_required);
    assert_eq!(missing.detail.as_deref(), Some("the update is not installed"));

    let not_applicable = map_update_exit_code(UPDATE_NOT_APPLICABLE as i32, &stop);
    assert!(!not_applicable.success);
    assert_eq!(
        not_applicable.detail.as_deref(),
        Some("the update is not applicable to this computer")
    );
}

#[test]
fn update_agent_falls_back_to_generic_mapping() {
    let stop = StopFlag::new();

    assert_eq!(
        map_update_exit_code(3010, &stop),
        ExecutionOutcome::succeeded_with_reboot()
    );
    map_update_exit_code(1641, &stop);
    assert!(stop.is_requested());
}
