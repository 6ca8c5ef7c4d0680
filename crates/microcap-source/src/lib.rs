#![warn(missing_docs)]
//! # microcap-source
//!
//! ## Purpose
//! Provides the transport-agnostic frame source used by the capture pipeline.
//!
//! ## Responsibilities
//! - Define the [`FrameSource`] trait implemented by every live-video transport.
//! - Wrap a source in [`FrameSourceAdapter`], which tracks liveness and enforces
//!   the capture contract (refuse when offline, bound transfers, reject
//!   placeholder payloads).
//! - Ship the transports: [`PolledSnapshotSource`], [`PushedStreamSource`],
//!   [`StaticAssetSource`], plus [`SyntheticFrameSource`] for tests and CI.
//! - Run periodic probes through [`LivenessMonitor`] with guaranteed
//!   cancellation when the guard goes away.
//!
//! ## Data flow
//! Live view mounts -> [`LivenessMonitor::start`] probes every interval ->
//! [`FrameSourceAdapter::capture_frame`] returns JPEG bytes -> capture store.
//!
//! ## Ownership and lifetimes
//! Frames are returned as owned `Vec<u8>` buffers; no borrowed transport memory
//! escapes a source. The adapter and its sources are shared through `Arc`.
//!
//! ## Error model
//! Offline sources, failed transfers and implausibly small payloads surface as
//! distinct [`SourceError`] variants so callers can log them apart.

mod monitor;
mod polled;
mod pushed;
mod static_asset;
mod synthetic;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use microcap_core::DEFAULT_MIN_FRAME_BYTES;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use monitor::{LivenessGuard, LivenessMonitor};
pub use polled::{DEFAULT_SNAPSHOT_QUALITY, PolledSnapshotSource, normalize_quality};
pub use pushed::{DEFAULT_STALENESS, PushedStreamSource};
pub use static_asset::StaticAssetSource;
pub use synthetic::SyntheticFrameSource;

/// Default upper bound for one liveness probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Default period between liveness probes.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// Default upper bound for one frame transfer.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport variant behind a frame source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Snapshot endpoint polled over HTTP.
    PolledSnapshot,
    /// Base64 frames pushed by a socket collaborator.
    PushedStream,
    /// Bundled file on disk.
    StaticAsset,
    /// Deterministic in-memory frames.
    Synthetic,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceKind::PolledSnapshot => "polled",
            SourceKind::PushedStream => "pushed",
            SourceKind::StaticAsset => "static",
            SourceKind::Synthetic => "synthetic",
        };
        f.write_str(label)
    }
}

impl FromStr for SourceKind {
    type Err = SourceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "polled" | "snapshot" | "http" => Ok(SourceKind::PolledSnapshot),
            "pushed" | "socket" | "stream" => Ok(SourceKind::PushedStream),
            "static" | "asset" | "file" => Ok(SourceKind::StaticAsset),
            "synthetic" => Ok(SourceKind::Synthetic),
            other => Err(SourceError::InvalidSource(format!(
                "unknown source kind: {other}"
            ))),
        }
    }
}

/// Trait implemented by every live-video transport.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Returns the transport variant.
    fn kind(&self) -> SourceKind;

    /// Performs a lightweight reachability check.
    ///
    /// # Errors
    /// Returns [`SourceError::Unavailable`] when the source cannot be reached.
    async fn probe(&self) -> Result<(), SourceError>;

    /// Retrieves the current frame bytes.
    ///
    /// # Errors
    /// Returns [`SourceError::TransferFailed`] when retrieval fails.
    async fn fetch_frame(&self) -> Result<Vec<u8>, SourceError>;
}

/// Result of one liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liveness {
    /// Whether the source answered within the probe timeout.
    pub live: bool,
}

/// Limits applied by [`FrameSourceAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Upper bound for one probe.
    pub probe_timeout: Duration,
    /// Upper bound for one frame transfer.
    pub transfer_timeout: Duration,
    /// Smallest payload accepted as a real frame.
    pub min_frame_bytes: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
            min_frame_bytes: DEFAULT_MIN_FRAME_BYTES,
        }
    }
}

/// Wraps one [`FrameSource`] with liveness tracking and capture rules.
pub struct FrameSourceAdapter {
    source: Arc<dyn FrameSource>,
    config: AdapterConfig,
    live: AtomicBool,
}

impl FrameSourceAdapter {
    /// Creates an adapter that starts offline until the first probe succeeds.
    pub fn new(source: Arc<dyn FrameSource>, config: AdapterConfig) -> Self {
        Self {
            source,
            config,
            live: AtomicBool::new(false),
        }
    }

    /// Returns the wrapped transport variant.
    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// Returns the limits in force.
    pub fn config(&self) -> AdapterConfig {
        self.config
    }

    /// Returns the last probed liveness.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Probes the source within the configured timeout and records the result.
    pub async fn probe(&self) -> Liveness {
        let live = match tokio::time::timeout(self.config.probe_timeout, self.source.probe()).await
        {
            Ok(Ok(())) => true,
            Ok(Err(error)) => {
                debug!(kind = %self.kind(), %error, "liveness probe failed");
                false
            }
            Err(_) => {
                debug!(
                    kind = %self.kind(),
                    timeout_ms = self.config.probe_timeout.as_millis() as u64,
                    "liveness probe timed out"
                );
                false
            }
        };

        let previous = self.live.swap(live, Ordering::SeqCst);
        if previous != live {
            if live {
                info!(kind = %self.kind(), "live source is online");
            } else {
                warn!(kind = %self.kind(), "live source went offline");
            }
        }

        Liveness { live }
    }

    /// Captures one frame from the source.
    ///
    /// # Errors
    /// - [`SourceError::Unavailable`] when the last probe did not succeed; the
    ///   source is not contacted.
    /// - [`SourceError::TransferFailed`] when retrieval errors or times out.
    /// - [`SourceError::FrameTooSmall`] when the payload is below
    ///   [`AdapterConfig::min_frame_bytes`].
    pub async fn capture_frame(&self) -> Result<Vec<u8>, SourceError> {
        if !self.is_live() {
            return Err(SourceError::Unavailable(
                "source has not answered a liveness probe".to_string(),
            ));
        }

        let frame =
            match tokio::time::timeout(self.config.transfer_timeout, self.source.fetch_frame())
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    return Err(SourceError::TransferFailed(format!(
                        "no frame within {} ms",
                        self.config.transfer_timeout.as_millis()
                    )));
                }
            };

        if frame.len() < self.config.min_frame_bytes {
            warn!(
                kind = %self.kind(),
                bytes = frame.len(),
                minimum = self.config.min_frame_bytes,
                "discarding placeholder frame"
            );
            return Err(SourceError::FrameTooSmall {
                actual: frame.len(),
                minimum: self.config.min_frame_bytes,
            });
        }

        debug!(kind = %self.kind(), bytes = frame.len(), "frame retrieved");
        Ok(frame)
    }
}

/// Frame source error type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Source is unreachable or has not been probed successfully.
    #[error("live source unavailable: {0}")]
    Unavailable(String),
    /// Frame retrieval errored.
    #[error("frame transfer failed: {0}")]
    TransferFailed(String),
    /// Payload too small to be a real frame.
    #[error("frame too small: {actual} bytes, expected at least {minimum}")]
    FrameTooSmall {
        /// Received payload size.
        actual: usize,
        /// Configured threshold.
        minimum: usize,
    },
    /// Pushed payload could not be decoded.
    #[error("invalid pushed frame: {0}")]
    InvalidPush(String),
    /// Source configuration is unusable.
    #[error("invalid source configuration: {0}")]
    InvalidSource(String),
}
