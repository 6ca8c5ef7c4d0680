//! Integration tests for runtime kill-switch behavior.

mod common;

use common::Harness;
use microcap_app::{AppError, capture_enabled_from_env};
use microcap_mirror::Permission;

#[tokio::test]
async fn kill_switch_behavior_tests_blocks_capture_when_env_is_false() {
    let harness = Harness::new("kill-switch", Permission::Denied);
    harness.ready().await;

    // Safety:
    // - This test binary holds a single test, so no other thread reads env.
    // - We reset the variable before returning.
    unsafe { std::env::set_var("MICROCAP_CAPTURE_ENABLED", "false") };
    assert!(!capture_enabled_from_env());
    let blocked = harness.session.capture().await;
    assert!(matches!(blocked, Err(AppError::CaptureDisabled)));
    assert_eq!(harness.source.frames_served(), 0);

    // Safety: see rationale above.
    unsafe { std::env::set_var("MICROCAP_CAPTURE_ENABLED", "true") };
    assert!(capture_enabled_from_env());
    assert!(harness.session.capture().await.is_ok());

    // Safety: see rationale above.
    unsafe { std::env::remove_var("MICROCAP_CAPTURE_ENABLED") };
}
