//! Integration tests for the share hand-off.

use microcap_core::Capture;
use microcap_mirror::{JPEG_MIME_TYPE, RecordingShareFacility, ShareError, share_capture};

#[tokio::test]
async fn share_tests_unavailable_facility_is_refused() {
    let facility = RecordingShareFacility::new(false);
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let capture = Capture::new(1_000, dir.path().join("capture_1000.jpg"));

    assert_eq!(
        share_capture(&facility, &capture, "Share image").await,
        Err(ShareError::Unavailable)
    );
    assert!(facility.requests().await.is_empty());
}

#[tokio::test]
async fn share_tests_missing_file_is_reported() {
    let facility = RecordingShareFacility::new(true);
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("missing").join("capture_1.jpg");
    let capture = Capture::new(1, &path);

    assert_eq!(
        share_capture(&facility, &capture, "Share image").await,
        Err(ShareError::MissingFile(path))
    );
}

#[tokio::test]
async fn share_tests_existing_capture_is_handed_over_as_jpeg() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("capture_2000.jpg");
    std::fs::write(&path, vec![0xFF; 1_200]).expect("file");

    let facility = RecordingShareFacility::new(true);
    let capture = Capture::new(2_000, &path);
    share_capture(&facility, &capture, "Share image")
        .await
        .expect("share should succeed");

    let requests = facility.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, path);
    assert_eq!(requests[0].mime_type, JPEG_MIME_TYPE);
    assert_eq!(requests[0].dialog_title, "Share image");
}
