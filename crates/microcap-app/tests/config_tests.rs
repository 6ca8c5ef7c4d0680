//! Integration tests for environment-driven configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use microcap_app::{AppConfig, ConfigError};
use microcap_source::{FrameSource, SourceKind};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| values.get(key).cloned()
}

#[test]
fn config_tests_defaults_match_camera_server() {
    let config = AppConfig::from_lookup(lookup(&[])).expect("defaults should load");

    assert_eq!(config.source_kind, SourceKind::PolledSnapshot);
    assert_eq!(config.source_url, "http://192.168.4.1:5000");
    assert_eq!(config.snapshot_quality, 90);
    assert_eq!(config.probe_interval, Duration::from_secs(5));
    assert_eq!(config.probe_timeout, Duration::from_secs(3));
    assert_eq!(config.transfer_timeout, Duration::from_secs(10));
    assert_eq!(config.min_frame_bytes, 1_000);
    assert_eq!(config.album_name, "Microscope");
    assert!(config.capture_enabled);
}

#[test]
fn config_tests_reads_overrides() {
    let config = AppConfig::from_lookup(lookup(&[
        ("MICROCAP_DATA_DIR", "/data/microcap"),
        ("MICROCAP_SOURCE_URL", "https://scope.local:8443"),
        ("MICROCAP_PROBE_INTERVAL_MS", "250"),
        ("MICROCAP_MIN_FRAME_BYTES", "2048"),
        ("MICROCAP_ALBUM_NAME", "Lab"),
        ("MICROCAP_CAPTURE_ENABLED", "OFF"),
    ]))
    .expect("overrides should load");

    assert_eq!(config.documents_root, PathBuf::from("/data/microcap"));
    assert_eq!(config.source_url, "https://scope.local:8443");
    assert_eq!(config.probe_interval, Duration::from_millis(250));
    assert_eq!(config.adapter_config().min_frame_bytes, 2_048);
    assert_eq!(config.album_name, "Lab");
    assert!(!config.capture_enabled);
}

#[test]
fn config_tests_unparseable_numbers_fall_back() {
    let config = AppConfig::from_lookup(lookup(&[
        ("MICROCAP_PROBE_TIMEOUT_MS", "soon"),
        ("MICROCAP_SNAPSHOT_QUALITY", "high"),
    ]))
    .expect("config should load");

    assert_eq!(config.probe_timeout, Duration::from_secs(3));
    assert_eq!(config.snapshot_quality, 90);
}

#[test]
fn config_tests_rejects_unknown_source_kind() {
    let result = AppConfig::from_lookup(lookup(&[("MICROCAP_SOURCE_KIND", "webview")]));
    assert!(matches!(result, Err(ConfigError::Source(_))));
}

#[test]
fn config_tests_rejects_non_http_source_url() {
    let result = AppConfig::from_lookup(lookup(&[("MICROCAP_SOURCE_URL", "ftp://scope")]));
    assert!(matches!(result, Err(ConfigError::InvalidSourceUrl(_))));
}

#[test]
fn config_tests_static_source_requires_asset() {
    let result = AppConfig::from_lookup(lookup(&[("MICROCAP_SOURCE_KIND", "static")]));
    assert_eq!(result, Err(ConfigError::MissingStaticAsset));

    let config = AppConfig::from_lookup(lookup(&[
        ("MICROCAP_SOURCE_KIND", "static"),
        ("MICROCAP_STATIC_ASSET", "assets/sample.jpg"),
    ]))
    .expect("static config should load");
    let built = config.build_source().expect("static source should build");
    assert_eq!(built.source.kind(), SourceKind::StaticAsset);
    assert!(built.pushed.is_none());
}

#[test]
fn config_tests_pushed_source_exposes_push_handle() {
    let config = AppConfig::from_lookup(lookup(&[("MICROCAP_SOURCE_KIND", "pushed")]))
        .expect("pushed config should load");
    let built = config.build_source().expect("pushed source should build");

    assert_eq!(built.source.kind(), SourceKind::PushedStream);
    assert!(built.pushed.is_some());
}
