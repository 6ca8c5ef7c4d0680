//! Tests id and file name derivation for captures.

use std::path::PathBuf;

use microcap_core::{
    Capture, CaptureFileName, Clock, ManualClock, capture_file_name, capture_id,
    parse_capture_file_name,
};

#[test]
fn capture_naming_tests_id_matches_file_name_digits() {
    let timestamp_ms = 1_733_000_000_456_u64;
    let name = capture_file_name(timestamp_ms);

    assert_eq!(capture_id(timestamp_ms), "1733000000456");
    assert_eq!(name, "capture_1733000000456.jpg");
    assert_eq!(
        parse_capture_file_name(&name),
        CaptureFileName::Valid(timestamp_ms)
    );
}

#[test]
fn capture_naming_tests_new_capture_is_unnamed_and_local_only() {
    let capture = Capture::new(2_000, PathBuf::from("/data/captures/capture_2000.jpg"));

    assert_eq!(capture.id, "2000");
    assert_eq!(capture.name, None);
    assert_eq!(capture.gallery_uri, None);
    assert!(!capture.in_gallery());
    assert_eq!(capture.file_name(), Some("capture_2000.jpg"));
}

#[test]
fn capture_naming_tests_in_gallery_follows_gallery_uri() {
    let mut capture = Capture::new(2_000, "capture_2000.jpg");
    capture.gallery_uri = Some("asset-7".to_string());
    assert!(capture.in_gallery());
}

#[test]
fn capture_naming_tests_manual_clock_is_monotonic_under_control() {
    let clock = ManualClock::new(1_000);
    assert_eq!(clock.now_ms(), 1_000);
    clock.advance(5);
    assert_eq!(clock.now_ms(), 1_005);
    clock.set(9_000);
    assert_eq!(clock.now_ms(), 9_000);
}

#[test]
fn capture_naming_tests_capture_serializes_with_optional_fields() {
    let capture = Capture::new(1_000, "capture_1000.jpg");
    let encoded = serde_json::to_value(&capture).expect("capture should serialize");

    assert_eq!(encoded["id"], "1000");
    assert_eq!(encoded["timestamp_ms"], 1_000);
    assert!(encoded["gallery_uri"].is_null());
    assert!(encoded["name"].is_null());
}

#[test]
fn capture_naming_tests_only_canonical_digits_parse_as_ids() {
    assert_eq!(
        parse_capture_file_name("capture_0.jpg"),
        CaptureFileName::Valid(0)
    );
    assert_eq!(
        parse_capture_file_name("capture_01000.jpg"),
        CaptureFileName::Foreign
    );
    assert_eq!(
        parse_capture_file_name(&capture_file_name(1_000)),
        CaptureFileName::Valid(1_000)
    );
}
