//! Capture file writes and deletes.

use std::io;
use std::path::{Path, PathBuf};

use microcap_core::{CAPTURES_DIR_NAME, Capture, capture_file_name};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::StoreError;

/// Owns the captures directory.
#[derive(Debug, Clone)]
pub struct CaptureStore {
    dir: PathBuf,
}

impl CaptureStore {
    /// Creates a store writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a store at `<documents_root>/captures`.
    pub fn in_documents_root(documents_root: impl AsRef<Path>) -> Self {
        Self::new(documents_root.as_ref().join(CAPTURES_DIR_NAME))
    }

    /// Returns the captures directory.
    pub fn captures_dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path a capture stamped at `timestamp_ms` lives at.
    pub fn path_for(&self, timestamp_ms: u64) -> PathBuf {
        self.dir.join(capture_file_name(timestamp_ms))
    }

    /// Creates the captures directory recursively; idempotent.
    ///
    /// # Errors
    /// Returns [`StoreError::PersistFailed`] when the directory cannot be made.
    pub async fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::PersistFailed {
                path: self.dir.clone(),
                source,
            })
    }

    /// Writes `frame` as a new capture stamped at `timestamp_ms`.
    ///
    /// The frame lands in a hidden temp file that is synced and then renamed,
    /// so readers see either nothing or the complete file. If a capture with
    /// the same millisecond already exists, the stamp moves forward by 1 ms
    /// until a free name is found.
    ///
    /// # Errors
    /// Returns [`StoreError::PersistFailed`]; the temp file is removed first.
    pub async fn save(&self, frame: &[u8], timestamp_ms: u64) -> Result<Capture, StoreError> {
        self.ensure_dir().await?;

        let mut stamp = timestamp_ms;
        let mut target = self.path_for(stamp);
        while fs::try_exists(&target)
            .await
            .map_err(|source| StoreError::PersistFailed {
                path: target.clone(),
                source,
            })?
        {
            stamp = stamp.saturating_add(1);
            target = self.path_for(stamp);
        }
        if stamp != timestamp_ms {
            debug!(requested = timestamp_ms, assigned = stamp, "capture stamp bumped");
        }

        let temp = self.dir.join(format!(".{}.tmp", capture_file_name(stamp)));
        if let Err(source) = write_synced(&temp, frame).await {
            discard(&temp).await;
            return Err(StoreError::PersistFailed { path: temp, source });
        }

        if let Err(source) = fs::rename(&temp, &target).await {
            discard(&temp).await;
            return Err(StoreError::PersistFailed {
                path: target,
                source,
            });
        }

        info!(capture_id = stamp, bytes = frame.len(), "capture saved");
        Ok(Capture::new(stamp, target))
    }

    /// Removes a capture's backing file; a missing file counts as removed.
    ///
    /// # Errors
    /// Returns [`StoreError::PersistFailed`] for any other I/O failure.
    pub async fn delete(&self, capture: &Capture) -> Result<(), StoreError> {
        match fs::remove_file(&capture.uri).await {
            Ok(()) => {
                info!(capture_id = %capture.id, "capture deleted");
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(capture_id = %capture.id, "capture already absent");
                Ok(())
            }
            Err(source) => Err(StoreError::PersistFailed {
                path: capture.uri.clone(),
                source,
            }),
        }
    }
}

pub(crate) async fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

pub(crate) async fn discard(temp: &Path) {
    if let Err(error) = fs::remove_file(temp).await
        && error.kind() != io::ErrorKind::NotFound
    {
        debug!(path = %temp.display(), %error, "temp file cleanup failed");
    }
}
