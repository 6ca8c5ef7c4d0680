//! Integration tests for startup reconciliation through the session.

mod common;

use std::fs;

use common::{Harness, ScratchDir};
use microcap_app::Screen;
use microcap_core::default_display_name;
use microcap_mirror::Permission;

fn seed(dir: &ScratchDir, files: &[&str], metadata: Option<&str>) {
    let captures = dir.captures();
    fs::create_dir_all(&captures).expect("captures dir should be created");
    for file in files {
        fs::write(captures.join(file), vec![0xAB; 2_048]).expect("fixture should be written");
    }
    if let Some(metadata) = metadata {
        fs::write(captures.join("metadata.json"), metadata).expect("metadata should be written");
    }
}

#[tokio::test]
async fn startup_reconcile_tests_loads_named_and_default_captures() {
    let dir = ScratchDir::new("startup-seeded");
    seed(
        &dir,
        &["capture_1000.jpg", "capture_2000.jpg"],
        Some(r#"{"2000": "Sample A"}"#),
    );
    let harness = Harness::in_dir(dir, Permission::Denied);

    let report = harness.session.startup().await;

    let state = harness.session.snapshot_state();
    assert_eq!(state.screen, Screen::Home);
    assert_eq!(report.captures, state.captures);
    let ids: Vec<&str> = state.captures.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["2000", "1000"]);
    assert_eq!(state.captures[0].display_name(), "Sample A");
    assert_eq!(state.captures[1].display_name(), default_display_name(1_000));
}

#[tokio::test]
async fn startup_reconcile_tests_missing_directory_starts_empty() {
    let harness = Harness::new("startup-missing", Permission::Denied);

    let report = harness.session.startup().await;

    assert!(report.captures.is_empty());
    assert_eq!(harness.session.snapshot_state().screen, Screen::Home);
    assert!(!harness.dir.captures().exists());
}

#[tokio::test]
async fn startup_reconcile_tests_corrupt_index_keeps_captures() {
    let dir = ScratchDir::new("startup-corrupt");
    seed(&dir, &["capture_5000.jpg"], Some("{not json"));
    let harness = Harness::in_dir(dir, Permission::Denied);

    let report = harness.session.startup().await;

    assert_eq!(report.captures.len(), 1);
    assert_eq!(report.captures[0].name, None);
    let backup = report
        .quarantined_index
        .expect("corrupt index should be moved aside");
    assert_eq!(
        fs::read_to_string(backup).expect("backup should be readable"),
        "{not json"
    );
}

#[tokio::test]
async fn startup_reconcile_tests_requests_permission_once() {
    let harness = Harness::new("startup-permission", Permission::Granted);

    harness.session.startup().await;
    harness.session.startup().await;

    assert_eq!(harness.library.permission_requests(), 1);
    assert_eq!(
        harness.session.library_permission(),
        Some(Permission::Granted)
    );
}

#[tokio::test]
async fn startup_reconcile_tests_restores_gallery_flags_after_restart() {
    let harness = Harness::new("startup-flags", Permission::Granted);
    harness.ready().await;
    harness
        .session
        .capture()
        .await
        .expect("capture should succeed");
    harness.library.set_fail_writes(true);
    harness.clock.advance(1_000);
    harness
        .session
        .capture()
        .await
        .expect("capture should succeed");

    let restarted = harness.restart();
    restarted.session.startup().await;

    let flags: Vec<bool> = restarted
        .session
        .snapshot_state()
        .captures
        .iter()
        .map(|capture| capture.in_gallery())
        .collect();
    assert_eq!(flags, vec![false, true]);
}
