//! Hand-off of a capture file to the platform share sheet.

use std::path::PathBuf;

use async_trait::async_trait;
use microcap_core::Capture;
use thiserror::Error;
use tracing::info;

/// Mime type every capture is shared as.
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// One share-sheet request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    /// Local file handed to the share target.
    pub path: PathBuf,
    /// Content type of the file.
    pub mime_type: String,
    /// Title shown on the share dialog.
    pub dialog_title: String,
}

/// Platform share capability.
#[async_trait]
pub trait ShareFacility: Send + Sync {
    /// Returns `true` when sharing works on this device.
    async fn is_available(&self) -> bool;

    /// Opens the share sheet for one file.
    async fn share(&self, request: &ShareRequest) -> Result<(), ShareError>;
}

/// Shares a capture after checking availability and the backing file.
///
/// # Errors
/// - [`ShareError::Unavailable`] when the facility reports no support.
/// - [`ShareError::MissingFile`] when the capture file is gone.
/// - Whatever the facility returns from [`ShareFacility::share`].
pub async fn share_capture(
    facility: &dyn ShareFacility,
    capture: &Capture,
    dialog_title: &str,
) -> Result<(), ShareError> {
    if !facility.is_available().await {
        return Err(ShareError::Unavailable);
    }

    if !tokio::fs::try_exists(&capture.uri).await.unwrap_or(false) {
        return Err(ShareError::MissingFile(capture.uri.clone()));
    }

    facility
        .share(&ShareRequest {
            path: capture.uri.clone(),
            mime_type: JPEG_MIME_TYPE.to_string(),
            dialog_title: dialog_title.to_string(),
        })
        .await?;

    info!(capture_id = %capture.id, "capture shared");
    Ok(())
}

/// Share failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShareError {
    /// Sharing is not supported on this device.
    #[error("sharing is not available on this device")]
    Unavailable,
    /// Capture file no longer exists.
    #[error("capture file is missing: {}", .0.display())]
    MissingFile(PathBuf),
    /// Share target failed.
    #[error("share failed: {0}")]
    Failed(String),
}
