//! Bundled video still served from a file on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{FrameSource, SourceError, SourceKind};

/// Serves the same bundled file for every capture.
#[derive(Debug, Clone)]
pub struct StaticAssetSource {
    path: PathBuf,
}

impl StaticAssetSource {
    /// Creates a source backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FrameSource for StaticAssetSource {
    fn kind(&self) -> SourceKind {
        SourceKind::StaticAsset
    }

    async fn probe(&self) -> Result<(), SourceError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(metadata) if metadata.is_file() => Ok(()),
            Ok(_) => Err(SourceError::Unavailable(format!(
                "{} is not a file",
                self.path.display()
            ))),
            Err(error) => Err(SourceError::Unavailable(format!(
                "{}: {error}",
                self.path.display()
            ))),
        }
    }

    async fn fetch_frame(&self) -> Result<Vec<u8>, SourceError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|error| SourceError::TransferFailed(format!("{}: {error}", self.path.display())))
    }
}
