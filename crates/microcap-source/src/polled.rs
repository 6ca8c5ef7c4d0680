//! HTTP snapshot polling against the camera server.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::{FrameSource, SourceError, SourceKind};

/// JPEG quality requested when none (or an out-of-range one) is configured.
pub const DEFAULT_SNAPSHOT_QUALITY: u8 = 90;

const SNAPSHOT_PATH: &str = "snapshot";

/// Clamps a requested JPEG quality into the range the camera accepts.
///
/// Values outside `1..=100` fall back to [`DEFAULT_SNAPSHOT_QUALITY`].
pub fn normalize_quality(quality: u8) -> u8 {
    if (1..=100).contains(&quality) {
        quality
    } else {
        DEFAULT_SNAPSHOT_QUALITY
    }
}

/// Polls `GET <base>/snapshot` for frames and a liveness path for probes.
#[derive(Debug, Clone)]
pub struct PolledSnapshotSource {
    client: Client,
    probe_url: Url,
    snapshot_url: Url,
}

impl PolledSnapshotSource {
    /// Creates a polled source rooted at `base_url`.
    ///
    /// `probe_path` is resolved against the base (`/` probes the root). When
    /// the probe answers with a JSON object carrying a `status` field, only
    /// `"online"` counts as live.
    ///
    /// # Errors
    /// Returns [`SourceError::InvalidSource`] for unparseable or non-HTTP URLs.
    pub fn new(base_url: &str, probe_path: &str, quality: u8) -> Result<Self, SourceError> {
        let mut base = Url::parse(base_url)
            .map_err(|error| SourceError::InvalidSource(format!("invalid source url: {error}")))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(SourceError::InvalidSource(format!(
                "source url must use http or https, got {}",
                base.scheme()
            )));
        }

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let probe_url = base
            .join(probe_path.trim_start_matches('/'))
            .map_err(|error| SourceError::InvalidSource(format!("invalid probe path: {error}")))?;

        let mut snapshot_url = base
            .join(SNAPSHOT_PATH)
            .map_err(|error| SourceError::InvalidSource(format!("invalid snapshot url: {error}")))?;
        snapshot_url
            .query_pairs_mut()
            .append_pair("quality", &normalize_quality(quality).to_string());

        let client = Client::builder()
            .build()
            .map_err(|error| SourceError::InvalidSource(format!("http client: {error}")))?;

        Ok(Self {
            client,
            probe_url,
            snapshot_url,
        })
    }

    /// Returns the resolved liveness URL.
    pub fn probe_url(&self) -> &Url {
        &self.probe_url
    }

    /// Returns the resolved snapshot URL including the quality query.
    pub fn snapshot_url(&self) -> &Url {
        &self.snapshot_url
    }
}

#[async_trait]
impl FrameSource for PolledSnapshotSource {
    fn kind(&self) -> SourceKind {
        SourceKind::PolledSnapshot
    }

    async fn probe(&self) -> Result<(), SourceError> {
        let response = self
            .client
            .get(self.probe_url.clone())
            .send()
            .await
            .map_err(|error| SourceError::Unavailable(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "probe answered {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| SourceError::Unavailable(error.to_string()))?;

        // Plain-text roots carry no status; only a JSON status field can veto.
        if let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(&body)
            && let Some(reported) = fields.get("status").and_then(Value::as_str)
            && reported != "online"
        {
            return Err(SourceError::Unavailable(format!(
                "camera reports status {reported}"
            )));
        }

        Ok(())
    }

    async fn fetch_frame(&self) -> Result<Vec<u8>, SourceError> {
        let response = self
            .client
            .get(self.snapshot_url.clone())
            .send()
            .await
            .map_err(|error| SourceError::TransferFailed(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::TransferFailed(format!(
                "snapshot answered {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| SourceError::TransferFailed(error.to_string()))?;

        Ok(bytes.to_vec())
    }
}
