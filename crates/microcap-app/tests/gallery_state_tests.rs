//! Integration tests for gallery state transitions.

use microcap_app::{GalleryState, NoticeKind, Screen, SourceStatus};
use microcap_core::Capture;

fn capture(timestamp_ms: u64) -> Capture {
    Capture::new(timestamp_ms, format!("/captures/capture_{timestamp_ms}.jpg"))
}

#[test]
fn gallery_state_tests_added_capture_is_prepended() {
    let mut state = GalleryState::new("0.1.0");
    state.captures_loaded(vec![capture(2_000), capture(1_000)]);

    state.capture_added(capture(3_000));

    let ids: Vec<&str> = state.captures.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["3000", "2000", "1000"]);
}

#[test]
fn gallery_state_tests_rename_and_mirror_update_in_place() {
    let mut state = GalleryState::new("0.1.0");
    state.captures_loaded(vec![capture(1_000)]);

    assert!(state.capture_renamed("1000", "Cheek cells"));
    assert!(state.capture_mirrored("1000", "asset-7"));
    assert!(!state.capture_renamed("9999", "Nothing"));

    let loaded = state.capture("1000").expect("capture should be present");
    assert_eq!(loaded.display_name(), "Cheek cells");
    assert!(loaded.in_gallery());
}

#[test]
fn gallery_state_tests_reload_drops_missing_selection() {
    let mut state = GalleryState::new("0.1.0");
    state.captures_loaded(vec![capture(1_000), capture(2_000)]);
    assert!(state.select("2000"));
    assert!(!state.select("5000"));

    state.captures_loaded(vec![capture(1_000)]);
    assert_eq!(state.selected, None);
}

#[test]
fn gallery_state_tests_leaving_live_view_resets_source() {
    let mut state = GalleryState::new("0.1.0");
    state.navigate(Screen::LiveView);
    state.source_status_changed(false);
    assert_eq!(state.source, SourceStatus::Offline);

    state.navigate(Screen::Gallery);
    assert_eq!(state.source, SourceStatus::Unknown);
}

#[test]
fn gallery_state_tests_notice_is_dismissable() {
    let mut state = GalleryState::new("0.1.0");
    state.show_notice(NoticeKind::Error, "Microscope is offline.");
    assert_eq!(
        state.notice.as_ref().map(|notice| notice.kind),
        Some(NoticeKind::Error)
    );

    state.dismiss_notice();
    assert_eq!(state.notice, None);
}
