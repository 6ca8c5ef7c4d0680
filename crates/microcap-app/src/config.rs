//! Environment-driven runtime configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use microcap_core::DEFAULT_MIN_FRAME_BYTES;
use microcap_mirror::DEFAULT_ALBUM_NAME;
use microcap_source::{
    AdapterConfig, DEFAULT_PROBE_INTERVAL, DEFAULT_PROBE_TIMEOUT, DEFAULT_SNAPSHOT_QUALITY,
    DEFAULT_STALENESS, DEFAULT_TRANSFER_TIMEOUT, FrameSource, PolledSnapshotSource,
    PushedStreamSource, SourceError, SourceKind, StaticAssetSource, SyntheticFrameSource,
};
use thiserror::Error;
use url::Url;

/// Camera server address used when none is configured.
pub const DEFAULT_SOURCE_URL: &str = "http://192.168.4.1:5000";

/// Documents root used when none is configured.
pub const DEFAULT_DOCUMENTS_ROOT: &str = "./microcap-data";

/// Runtime configuration for one client process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Application-private documents root; captures live in `<root>/captures`.
    pub documents_root: PathBuf,
    /// Live-video transport.
    pub source_kind: SourceKind,
    /// Camera server base address for the polled transport.
    pub source_url: String,
    /// Liveness path resolved against [`AppConfig::source_url`].
    pub probe_path: String,
    /// Bundled file for the static transport.
    pub static_asset: Option<PathBuf>,
    /// JPEG quality requested from the snapshot endpoint.
    pub snapshot_quality: u8,
    /// Period between liveness probes while the live view is open.
    pub probe_interval: Duration,
    /// Upper bound for one probe.
    pub probe_timeout: Duration,
    /// Upper bound for one frame transfer.
    pub transfer_timeout: Duration,
    /// Freshness window for pushed frames.
    pub push_staleness: Duration,
    /// Payloads below this size are rejected as placeholders.
    pub min_frame_bytes: usize,
    /// Shared-library album receiving mirrored captures.
    pub album_name: String,
    /// Runtime kill switch for capture.
    pub capture_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            documents_root: PathBuf::from(DEFAULT_DOCUMENTS_ROOT),
            source_kind: SourceKind::PolledSnapshot,
            source_url: DEFAULT_SOURCE_URL.to_string(),
            probe_path: "/".to_string(),
            static_asset: None,
            snapshot_quality: DEFAULT_SNAPSHOT_QUALITY,
            probe_interval: DEFAULT_PROBE_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
            push_staleness: DEFAULT_STALENESS,
            min_frame_bytes: DEFAULT_MIN_FRAME_BYTES,
            album_name: DEFAULT_ALBUM_NAME.to_string(),
            capture_enabled: true,
        }
    }
}

impl AppConfig {
    /// Reads configuration from `MICROCAP_*` environment variables.
    ///
    /// # Errors
    /// See [`AppConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults.
    ///
    /// Unparseable numbers fall back to their defaults.
    ///
    /// # Errors
    /// - [`ConfigError::Source`] for an unknown source kind.
    /// - [`ConfigError::InvalidSourceUrl`] for an unusable polled source url.
    /// - [`ConfigError::MissingStaticAsset`] for a static source without file.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let millis = |key: &str, fallback: Duration| {
            lookup(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(fallback)
        };

        let source_kind = match lookup("MICROCAP_SOURCE_KIND") {
            Some(raw) => raw.parse::<SourceKind>()?,
            None => defaults.source_kind,
        };

        let config = Self {
            documents_root: lookup("MICROCAP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.documents_root),
            source_kind,
            source_url: lookup("MICROCAP_SOURCE_URL").unwrap_or(defaults.source_url),
            probe_path: lookup("MICROCAP_PROBE_PATH").unwrap_or(defaults.probe_path),
            static_asset: lookup("MICROCAP_STATIC_ASSET").map(PathBuf::from),
            snapshot_quality: lookup("MICROCAP_SNAPSHOT_QUALITY")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(defaults.snapshot_quality),
            probe_interval: millis("MICROCAP_PROBE_INTERVAL_MS", defaults.probe_interval),
            probe_timeout: millis("MICROCAP_PROBE_TIMEOUT_MS", defaults.probe_timeout),
            transfer_timeout: millis("MICROCAP_TRANSFER_TIMEOUT_MS", defaults.transfer_timeout),
            push_staleness: millis("MICROCAP_PUSH_STALENESS_MS", defaults.push_staleness),
            min_frame_bytes: lookup("MICROCAP_MIN_FRAME_BYTES")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(defaults.min_frame_bytes),
            album_name: lookup("MICROCAP_ALBUM_NAME")
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(defaults.album_name),
            capture_enabled: lookup("MICROCAP_CAPTURE_ENABLED")
                .map(|value| switch_enabled(&value))
                .unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.source_kind {
            SourceKind::PolledSnapshot => {
                let parsed = Url::parse(&self.source_url)
                    .map_err(|error| ConfigError::InvalidSourceUrl(error.to_string()))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(ConfigError::InvalidSourceUrl(format!(
                        "unsupported scheme {}",
                        parsed.scheme()
                    )));
                }
            }
            SourceKind::StaticAsset if self.static_asset.is_none() => {
                return Err(ConfigError::MissingStaticAsset);
            }
            _ => {}
        }
        Ok(())
    }

    /// Limits handed to the frame source adapter.
    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            probe_timeout: self.probe_timeout,
            transfer_timeout: self.transfer_timeout,
            min_frame_bytes: self.min_frame_bytes,
        }
    }

    /// Instantiates the configured transport.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the transport cannot be built.
    pub fn build_source(&self) -> Result<BuiltSource, ConfigError> {
        let built = match self.source_kind {
            SourceKind::PolledSnapshot => BuiltSource::plain(Arc::new(PolledSnapshotSource::new(
                &self.source_url,
                &self.probe_path,
                self.snapshot_quality,
            )?)),
            SourceKind::PushedStream => {
                let pushed = Arc::new(PushedStreamSource::new(self.push_staleness));
                BuiltSource {
                    source: pushed.clone(),
                    pushed: Some(pushed),
                }
            }
            SourceKind::StaticAsset => {
                let path = self
                    .static_asset
                    .clone()
                    .ok_or(ConfigError::MissingStaticAsset)?;
                BuiltSource::plain(Arc::new(StaticAssetSource::new(path)))
            }
            SourceKind::Synthetic => BuiltSource::plain(Arc::new(SyntheticFrameSource::default())),
        };
        Ok(built)
    }
}

/// Transport instance plus the push handle when frames arrive over a socket.
#[derive(Clone)]
pub struct BuiltSource {
    /// Transport consumed by the adapter.
    pub source: Arc<dyn FrameSource>,
    /// Handle the socket layer pushes frames into.
    pub pushed: Option<Arc<PushedStreamSource>>,
}

impl BuiltSource {
    fn plain(source: Arc<dyn FrameSource>) -> Self {
        Self {
            source,
            pushed: None,
        }
    }
}

/// Interprets kill-switch values.
///
/// `0`, `false`, `off` (case-insensitive) disable; anything else enables.
pub fn switch_enabled(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    !(normalized == "0" || normalized == "false" || normalized == "off")
}

/// Configuration error type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Source kind or transport construction failed.
    #[error("source configuration: {0}")]
    Source(#[from] SourceError),
    /// Polled source url is unusable.
    #[error("invalid MICROCAP_SOURCE_URL: {0}")]
    InvalidSourceUrl(String),
    /// Static source selected without `MICROCAP_STATIC_ASSET`.
    #[error("MICROCAP_STATIC_ASSET is required for the static source")]
    MissingStaticAsset,
}
