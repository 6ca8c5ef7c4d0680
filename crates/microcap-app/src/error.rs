//! Application error type and its user-facing projection.

use std::io;

use microcap_core::CoreError;
use microcap_mirror::ShareError;
use microcap_source::SourceError;
use microcap_store::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Frame source error.
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    /// Local persistence error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Core model error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Share hand-off error.
    #[error("share error: {0}")]
    Share(#[from] ShareError),
    /// No capture with this id is loaded.
    #[error("unknown capture: {0}")]
    UnknownCapture(String),
    /// Kill switch is off.
    #[error("capture disabled by MICROCAP_CAPTURE_ENABLED")]
    CaptureDisabled,
}

impl AppError {
    /// Text for the dismissable notice shown to the user.
    pub fn user_notice(&self) -> String {
        match self {
            AppError::Source(SourceError::Unavailable(_)) => {
                "Microscope is offline. Check the connection and try again.".to_string()
            }
            AppError::Source(
                SourceError::TransferFailed(_) | SourceError::FrameTooSmall { .. },
            ) => "Could not capture the image. Try again.".to_string(),
            AppError::Source(_) | AppError::Config(_) => {
                "The live source is misconfigured.".to_string()
            }
            AppError::Store(StoreError::MetadataCorrupt { .. }) => {
                "Capture names could not be read.".to_string()
            }
            AppError::Store(StoreError::PersistFailed { source, .. }) => format!(
                "Could not save the image on this device ({}). Fix that and try again.",
                io_failure_detail(source)
            ),
            AppError::Store(StoreError::ReadFailed { source, .. }) => format!(
                "Could not read saved images on this device ({}).",
                io_failure_detail(source)
            ),
            AppError::Core(error) => error.to_string(),
            AppError::Share(ShareError::Unavailable) => {
                "Sharing is not available on this device.".to_string()
            }
            AppError::Share(_) => "Could not share the image.".to_string(),
            AppError::UnknownCapture(_) => "That capture no longer exists.".to_string(),
            AppError::CaptureDisabled => "Capture is disabled.".to_string(),
        }
    }
}

fn io_failure_detail(error: &io::Error) -> String {
    match error.kind() {
        io::ErrorKind::StorageFull => "storage is full".to_string(),
        io::ErrorKind::PermissionDenied => "permission denied".to_string(),
        io::ErrorKind::ReadOnlyFilesystem => "storage is read-only".to_string(),
        kind => kind.to_string(),
    }
}
