//! JSON sidecar mapping capture ids to display names.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use microcap_core::{Clock, METADATA_FILE_NAME, SystemClock};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::StoreError;
use crate::capture_store::{discard, write_synced};

/// Capture id -> display name, ordered by id for stable output.
pub type NameMap = BTreeMap<String, String>;

/// Name index persisted as one pretty-printed JSON object.
///
/// Every mutation runs load -> mutate -> save while holding one async mutex,
/// so concurrent renames are applied one after another and never overwrite
/// each other.
#[derive(Debug)]
pub struct MetadataIndex {
    path: PathBuf,
    writer: Mutex<()>,
}

impl MetadataIndex {
    /// Creates an index backed by `path`; the file is created lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    /// Creates an index at `<captures_dir>/metadata.json`.
    pub fn in_dir(captures_dir: impl AsRef<Path>) -> Self {
        Self::new(captures_dir.as_ref().join(METADATA_FILE_NAME))
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole mapping.
    ///
    /// A missing or blank file is an empty mapping.
    ///
    /// # Errors
    /// - [`StoreError::MetadataCorrupt`] when the content is not a JSON object
    ///   of strings.
    /// - [`StoreError::ReadFailed`] for I/O failures other than absence.
    pub async fn load(&self) -> Result<NameMap, StoreError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(NameMap::new()),
            Err(source) => {
                return Err(StoreError::ReadFailed {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(NameMap::new());
        }

        serde_json::from_slice(&raw).map_err(|source| StoreError::MetadataCorrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Returns the name assigned to one capture, if any.
    ///
    /// # Errors
    /// Propagates [`MetadataIndex::load`] errors.
    pub async fn name_of(&self, capture_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load().await?.remove(capture_id))
    }

    /// Overwrites the backing file with `mapping`.
    ///
    /// # Errors
    /// Returns [`StoreError::PersistFailed`] when the write fails.
    pub async fn save(&self, mapping: &NameMap) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        self.write_locked(mapping).await
    }

    /// Assigns `name` to `capture_id`; last write wins.
    ///
    /// # Errors
    /// Refuses to touch a corrupt index ([`StoreError::MetadataCorrupt`]) so
    /// existing names are not overwritten; otherwise propagates write errors.
    pub async fn upsert(&self, capture_id: &str, name: &str) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        let mut mapping = self.load().await?;
        mapping.insert(capture_id.to_string(), name.to_string());
        self.write_locked(&mapping).await?;
        debug!(capture_id, "capture name stored");
        Ok(())
    }

    /// Drops the name of `capture_id` if present.
    ///
    /// # Returns
    /// `true` when an entry was removed. Nothing is written otherwise.
    ///
    /// # Errors
    /// Same as [`MetadataIndex::upsert`].
    pub async fn remove(&self, capture_id: &str) -> Result<bool, StoreError> {
        let _writer = self.writer.lock().await;
        let mut mapping = self.load().await?;
        if mapping.remove(capture_id).is_none() {
            return Ok(false);
        }
        self.write_locked(&mapping).await?;
        debug!(capture_id, "capture name removed");
        Ok(true)
    }

    /// Moves an unparseable index aside to `metadata.json.corrupt-<unixMillis>`.
    ///
    /// # Returns
    /// The backup path, or `None` when the index is absent or healthy.
    ///
    /// # Errors
    /// Returns [`StoreError::PersistFailed`] when the rename fails.
    pub async fn quarantine_corrupt(&self) -> Result<Option<PathBuf>, StoreError> {
        let _writer = self.writer.lock().await;
        match self.load().await {
            Err(StoreError::MetadataCorrupt { .. }) => {}
            Ok(_) => return Ok(None),
            Err(other) => return Err(other),
        }

        let mut backup = self.path.clone().into_os_string();
        backup.push(format!(".corrupt-{}", SystemClock.now_ms()));
        let backup = PathBuf::from(backup);

        fs::rename(&self.path, &backup)
            .await
            .map_err(|source| StoreError::PersistFailed {
                path: backup.clone(),
                source,
            })?;

        error!(backup = %backup.display(), "corrupt metadata index moved aside");
        Ok(Some(backup))
    }

    async fn write_locked(&self, mapping: &NameMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::PersistFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let encoded = serde_json::to_vec_pretty(mapping).map_err(|error| {
            StoreError::PersistFailed {
                path: self.path.clone(),
                source: io::Error::new(io::ErrorKind::InvalidData, error),
            }
        })?;

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        if let Err(source) = write_synced(&temp, &encoded).await {
            discard(&temp).await;
            return Err(StoreError::PersistFailed { path: temp, source });
        }

        if let Err(source) = fs::rename(&temp, &self.path).await {
            discard(&temp).await;
            return Err(StoreError::PersistFailed {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }
}
