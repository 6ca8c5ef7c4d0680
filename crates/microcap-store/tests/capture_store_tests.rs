//! Integration tests for capture writes and deletes.

mod common;

use microcap_core::Capture;
use microcap_store::CaptureStore;

use common::{ScratchDir, fixture_frame};

#[tokio::test]
async fn capture_store_tests_save_creates_dir_and_file() {
    let scratch = ScratchDir::new("store-save");
    let store = CaptureStore::in_documents_root(scratch.path());

    let frame = fixture_frame(2_048);
    let capture = store.save(&frame, 1_000).await.expect("save should succeed");

    assert_eq!(capture.id, "1000");
    assert_eq!(capture.timestamp_ms, 1_000);
    assert_eq!(capture.uri, scratch.captures().join("capture_1000.jpg"));
    assert_eq!(capture.name, None);
    assert!(!capture.in_gallery());
    assert_eq!(std::fs::read(&capture.uri).expect("file should exist"), frame);
}

#[tokio::test]
async fn capture_store_tests_leaves_no_temp_files_behind() {
    let scratch = ScratchDir::new("store-temp");
    let store = CaptureStore::in_documents_root(scratch.path());
    store.save(&fixture_frame(1_500), 1_000).await.expect("save");

    let names: Vec<String> = std::fs::read_dir(scratch.captures())
        .expect("listing")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["capture_1000.jpg".to_string()]);
}

#[tokio::test]
async fn capture_store_tests_same_millisecond_never_overwrites() {
    let scratch = ScratchDir::new("store-collide");
    let store = CaptureStore::in_documents_root(scratch.path());

    let first = store.save(&fixture_frame(1_100), 5_000).await.expect("first");
    let second = store.save(&fixture_frame(1_200), 5_000).await.expect("second");

    assert_eq!(first.id, "5000");
    assert_eq!(second.id, "5001");
    assert_eq!(std::fs::read(&first.uri).expect("first file").len(), 1_100);
    assert_eq!(std::fs::read(&second.uri).expect("second file").len(), 1_200);
}

#[tokio::test]
async fn capture_store_tests_delete_is_idempotent() {
    let scratch = ScratchDir::new("store-delete");
    let store = CaptureStore::in_documents_root(scratch.path());
    let capture = store.save(&fixture_frame(1_500), 1_000).await.expect("save");

    store.delete(&capture).await.expect("first delete");
    assert!(!capture.uri.exists());
    store.delete(&capture).await.expect("second delete is a no-op");

    let never_created = Capture::new(42, store.path_for(42));
    store
        .delete(&never_created)
        .await
        .expect("deleting an unknown capture is a no-op");
}

#[tokio::test]
async fn capture_store_tests_write_failure_is_persist_failed() {
    let scratch = ScratchDir::new("store-fail");
    // A plain file where the captures directory should be blocks every write.
    std::fs::write(scratch.captures(), b"not a directory").expect("blocker");

    let store = CaptureStore::in_documents_root(scratch.path());
    let error = store
        .save(&fixture_frame(1_500), 1_000)
        .await
        .expect_err("save should fail");
    assert!(matches!(error, microcap_store::StoreError::PersistFailed { .. }));
}
