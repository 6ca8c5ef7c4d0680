#![warn(missing_docs)]
//! # microcap-mirror
//!
//! ## Purpose
//! Mirrors saved captures into the platform's shared photo library and hands
//! captures to the platform share sheet.
//!
//! ## Responsibilities
//! - Abstract the media library behind the injectable [`MediaLibrary`] trait.
//! - Request library permission exactly once per process and cache the answer.
//! - Copy captures into a named album without ever failing the capture.
//! - Report which captures are already in the album after a restart.
//! - Gate sharing on [`ShareFacility::is_available`].
//!
//! ## Data flow
//! Startup -> [`MediaMirror::initialize`] -> capture saved locally ->
//! [`MediaMirror::mirror`] -> optional gallery uri on the capture.
//! Reconciliation -> [`MediaMirror::snapshot`] -> [`MirrorSnapshot`].
//!
//! ## Ownership and lifetimes
//! Handles returned by the library are owned values; the mirror keeps only the
//! cached permission.
//!
//! ## Error model
//! Library failures are [`MirrorError`] values that never escape
//! [`MediaMirror::mirror`]; they are logged and the capture stays local-only.
//! Sharing failures are [`ShareError`] values returned to the caller.

mod fakes;
mod share;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use microcap_core::{
    Capture, CaptureFileName, MirrorLookup, capture_id, parse_capture_file_name,
};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub use fakes::{InMemoryMediaLibrary, RecordingShareFacility};
pub use share::{JPEG_MIME_TYPE, ShareError, ShareFacility, ShareRequest, share_capture};

/// Album captures are mirrored into unless configured otherwise.
pub const DEFAULT_ALBUM_NAME: &str = "Microscope";

/// Media-library permission answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Library writes are allowed.
    Granted,
    /// Library writes are refused.
    Denied,
}

/// Asset stored in the shared library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    /// Library-assigned identifier.
    pub id: String,
    /// Original file name of the asset.
    pub file_name: String,
}

/// Album in the shared library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumHandle {
    /// Library-assigned identifier.
    pub id: String,
    /// Album title.
    pub name: String,
}

/// Platform media-library capability consumed by the mirror.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Asks the user for library access.
    async fn request_permission(&self) -> Result<Permission, MirrorError>;

    /// Imports a local file as a library asset.
    async fn create_asset(&self, file: &Path) -> Result<AssetHandle, MirrorError>;

    /// Looks up an album by name without creating it.
    async fn find_album(&self, name: &str) -> Result<Option<AlbumHandle>, MirrorError>;

    /// Looks up an album by name, creating it when missing.
    async fn get_or_create_album(&self, name: &str) -> Result<AlbumHandle, MirrorError>;

    /// Adds an existing asset to an album.
    async fn add_asset_to_album(
        &self,
        asset: &AssetHandle,
        album: &AlbumHandle,
    ) -> Result<(), MirrorError>;

    /// Lists the assets in an album.
    async fn list_album_assets(&self, album: &AlbumHandle)
    -> Result<Vec<AssetHandle>, MirrorError>;
}

/// Best-effort copier of captures into one named album.
pub struct MediaMirror {
    library: Arc<dyn MediaLibrary>,
    album_name: String,
    permission: OnceCell<Permission>,
}

impl MediaMirror {
    /// Creates a mirror targeting `album_name`; permission is not yet asked.
    pub fn new(library: Arc<dyn MediaLibrary>, album_name: impl Into<String>) -> Self {
        Self {
            library,
            album_name: album_name.into(),
            permission: OnceCell::new(),
        }
    }

    /// Returns the target album name.
    pub fn album_name(&self) -> &str {
        &self.album_name
    }

    /// Requests permission on first call and returns the cached answer after.
    ///
    /// A failing permission request counts as [`Permission::Denied`].
    pub async fn initialize(&self) -> Permission {
        *self
            .permission
            .get_or_init(|| async {
                match self.library.request_permission().await {
                    Ok(permission) => {
                        info!(?permission, "media library permission resolved");
                        permission
                    }
                    Err(error) => {
                        warn!(%error, "media library permission request failed");
                        Permission::Denied
                    }
                }
            })
            .await
    }

    /// Returns the cached permission, or `None` before [`MediaMirror::initialize`].
    pub fn permission(&self) -> Option<Permission> {
        self.permission.get().copied()
    }

    fn granted(&self) -> bool {
        self.permission() == Some(Permission::Granted)
    }

    /// Copies a saved capture into the album.
    ///
    /// # Returns
    /// The library asset id, or `None` when permission is missing or any
    /// library call fails. Failures are logged, never returned.
    pub async fn mirror(&self, capture: &Capture) -> Option<String> {
        if !self.granted() {
            debug!(capture_id = %capture.id, "mirror skipped without library permission");
            return None;
        }

        match self.try_mirror(capture).await {
            Ok(asset_id) => {
                info!(capture_id = %capture.id, album = %self.album_name, "capture mirrored");
                Some(asset_id)
            }
            Err(error) => {
                warn!(capture_id = %capture.id, %error, "mirror failed; capture kept locally");
                None
            }
        }
    }

    async fn try_mirror(&self, capture: &Capture) -> Result<String, MirrorError> {
        let asset = self.library.create_asset(&capture.uri).await?;
        let album = self.library.get_or_create_album(&self.album_name).await?;
        self.library.add_asset_to_album(&asset, &album).await?;
        Ok(asset.id)
    }

    /// Lists captures already present in the album, keyed by capture id.
    ///
    /// Returns an empty snapshot without permission, without an album, or on
    /// any library failure.
    pub async fn snapshot(&self) -> MirrorSnapshot {
        if !self.granted() {
            return MirrorSnapshot::default();
        }

        match self.try_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, "album listing failed; gallery flags unavailable");
                MirrorSnapshot::default()
            }
        }
    }

    async fn try_snapshot(&self) -> Result<MirrorSnapshot, MirrorError> {
        let Some(album) = self.library.find_album(&self.album_name).await? else {
            return Ok(MirrorSnapshot::default());
        };

        let mut assets = HashMap::new();
        for asset in self.library.list_album_assets(&album).await? {
            if let CaptureFileName::Valid(timestamp_ms) = parse_capture_file_name(&asset.file_name)
            {
                assets.insert(capture_id(timestamp_ms), asset.id);
            }
        }
        Ok(MirrorSnapshot { assets })
    }
}

/// Album contents keyed by capture id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorSnapshot {
    assets: HashMap<String, String>,
}

impl MirrorSnapshot {
    /// Number of mirrored captures found.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns `true` when no mirrored capture was found.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl MirrorLookup for MirrorSnapshot {
    fn gallery_uri(&self, capture_id: &str) -> Option<String> {
        self.assets.get(capture_id).cloned()
    }
}

/// Shared media-library failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MirrorError {
    /// Library refused the operation for lack of permission.
    #[error("media library permission denied")]
    PermissionDenied,
    /// Library call failed.
    #[error("media library failure: {0}")]
    Library(String),
}
