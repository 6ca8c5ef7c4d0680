//! Frames pushed as base64 text by a socket collaborator.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tokio::time::Instant;
use tracing::debug;

use crate::{FrameSource, SourceError, SourceKind};

/// A pushed stream counts as live while its latest frame is younger than this.
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(10);

#[derive(Debug)]
struct PushedFrame {
    bytes: Vec<u8>,
    received_at: Instant,
}

/// Keeps the most recent frame pushed by the socket layer.
#[derive(Debug)]
pub struct PushedStreamSource {
    latest: Mutex<Option<PushedFrame>>,
    staleness: Duration,
}

impl PushedStreamSource {
    /// Creates an empty stream with the given staleness window.
    pub fn new(staleness: Duration) -> Self {
        Self {
            latest: Mutex::new(None),
            staleness,
        }
    }

    /// Decodes one base64 frame (optionally a `data:` URL) and makes it current.
    ///
    /// # Returns
    /// Decoded frame length in bytes.
    ///
    /// # Errors
    /// Returns [`SourceError::InvalidPush`] for undecodable payloads; the
    /// previous frame stays current.
    pub fn push_encoded(&self, payload: &str) -> Result<usize, SourceError> {
        let encoded = match payload.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => payload,
        };

        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|error| SourceError::InvalidPush(error.to_string()))?;
        let len = bytes.len();
        self.push_bytes(bytes)?;
        Ok(len)
    }

    /// Makes already-decoded bytes the current frame.
    ///
    /// # Errors
    /// Returns [`SourceError::InvalidPush`] when the frame slot lock is poisoned.
    pub fn push_bytes(&self, bytes: Vec<u8>) -> Result<(), SourceError> {
        let mut latest = self
            .latest
            .lock()
            .map_err(|_| SourceError::InvalidPush("pushed frame lock poisoned".to_string()))?;
        debug!(bytes = bytes.len(), "pushed frame received");
        *latest = Some(PushedFrame {
            bytes,
            received_at: Instant::now(),
        });
        Ok(())
    }

    fn fresh_frame(&self) -> Result<Option<Vec<u8>>, SourceError> {
        let latest = self
            .latest
            .lock()
            .map_err(|_| SourceError::TransferFailed("pushed frame lock poisoned".to_string()))?;

        Ok(latest
            .as_ref()
            .filter(|frame| frame.received_at.elapsed() <= self.staleness)
            .map(|frame| frame.bytes.clone()))
    }
}

impl Default for PushedStreamSource {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS)
    }
}

#[async_trait]
impl FrameSource for PushedStreamSource {
    fn kind(&self) -> SourceKind {
        SourceKind::PushedStream
    }

    async fn probe(&self) -> Result<(), SourceError> {
        match self.fresh_frame() {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(SourceError::Unavailable(
                "no recent pushed frame".to_string(),
            )),
            Err(error) => Err(SourceError::Unavailable(error.to_string())),
        }
    }

    async fn fetch_frame(&self) -> Result<Vec<u8>, SourceError> {
        self.fresh_frame()?
            .ok_or_else(|| SourceError::TransferFailed("pushed stream is stale".to_string()))
    }
}
