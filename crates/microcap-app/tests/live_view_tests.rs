//! Integration tests for live-view liveness probing and teardown.

mod common;

use std::time::Duration;

use common::Harness;
use microcap_app::{Screen, SourceStatus};
use microcap_mirror::Permission;

const INTERVAL: Duration = Duration::from_secs(5);

#[tokio::test(start_paused = true)]
async fn live_view_tests_tracks_source_status() {
    let harness = Harness::new("live-status", Permission::Denied);
    let live_view = harness.session.enter_live_view();
    assert!(live_view.is_probing());

    tokio::time::sleep(Duration::from_millis(10)).await;
    let state = harness.session.snapshot_state();
    assert_eq!(state.screen, Screen::LiveView);
    assert_eq!(state.source, SourceStatus::Online);
    assert!(state.can_start_capture());

    harness.source.set_reachable(false);
    tokio::time::sleep(INTERVAL).await;
    assert_eq!(
        harness.session.snapshot_state().source,
        SourceStatus::Offline
    );
    assert!(!harness.session.adapter().is_live());

    live_view.close().await;
}

#[tokio::test(start_paused = true)]
async fn live_view_tests_close_stops_probing() {
    let harness = Harness::new("live-close", Permission::Denied);
    let live_view = harness.session.enter_live_view();
    tokio::time::sleep(Duration::from_millis(10)).await;

    live_view.close().await;
    let probes = harness.source.probe_count();
    tokio::time::sleep(INTERVAL * 4).await;

    assert_eq!(harness.source.probe_count(), probes);
    let state = harness.session.snapshot_state();
    assert_eq!(state.screen, Screen::Gallery);
    assert_eq!(state.source, SourceStatus::Unknown);
}

#[tokio::test(start_paused = true)]
async fn live_view_tests_drop_cancels_probing() {
    let harness = Harness::new("live-drop", Permission::Denied);
    let live_view = harness.session.enter_live_view();
    tokio::time::sleep(Duration::from_millis(10)).await;

    drop(live_view);
    tokio::time::sleep(Duration::from_millis(10)).await;
    let probes = harness.source.probe_count();
    tokio::time::sleep(INTERVAL * 4).await;

    assert_eq!(harness.source.probe_count(), probes);
    assert_eq!(harness.session.snapshot_state().screen, Screen::Gallery);
}
