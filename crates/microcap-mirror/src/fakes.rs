//! In-memory platform doubles for tests and headless runs.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    AlbumHandle, AssetHandle, MediaLibrary, MirrorError, Permission, ShareError, ShareFacility,
    ShareRequest,
};

#[derive(Debug, Default)]
struct LibraryState {
    assets: Vec<AssetHandle>,
    albums: Vec<(AlbumHandle, Vec<String>)>,
}

/// Media library that keeps assets and albums in memory.
#[derive(Debug)]
pub struct InMemoryMediaLibrary {
    answer: Permission,
    permission_requests: AtomicU64,
    fail_writes: AtomicBool,
    next_id: AtomicU64,
    state: Mutex<LibraryState>,
}

impl InMemoryMediaLibrary {
    /// Creates a library that answers permission requests with `answer`.
    pub fn new(answer: Permission) -> Self {
        Self {
            answer,
            permission_requests: AtomicU64::new(0),
            fail_writes: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            state: Mutex::new(LibraryState::default()),
        }
    }

    /// Makes asset creation fail from now on.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of permission prompts shown.
    pub fn permission_requests(&self) -> u64 {
        self.permission_requests.load(Ordering::SeqCst)
    }

    /// File names of the assets in album `name`.
    pub async fn album_file_names(&self, name: &str) -> Vec<String> {
        let state = self.state.lock().await;
        let Some((_, members)) = state.albums.iter().find(|(album, _)| album.name == name) else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|id| state.assets.iter().find(|asset| &asset.id == id))
            .map(|asset| asset.file_name.clone())
            .collect()
    }

    fn allocate_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl MediaLibrary for InMemoryMediaLibrary {
    async fn request_permission(&self) -> Result<Permission, MirrorError> {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer)
    }

    async fn create_asset(&self, file: &Path) -> Result<AssetHandle, MirrorError> {
        if self.answer != Permission::Granted {
            return Err(MirrorError::PermissionDenied);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MirrorError::Library("disk full".to_string()));
        }

        let file_name = file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| MirrorError::Library(format!("no file name in {}", file.display())))?
            .to_string();

        let asset = AssetHandle {
            id: self.allocate_id("asset"),
            file_name,
        };
        self.state.lock().await.assets.push(asset.clone());
        Ok(asset)
    }

    async fn find_album(&self, name: &str) -> Result<Option<AlbumHandle>, MirrorError> {
        let state = self.state.lock().await;
        Ok(state
            .albums
            .iter()
            .find(|(album, _)| album.name == name)
            .map(|(album, _)| album.clone()))
    }

    async fn get_or_create_album(&self, name: &str) -> Result<AlbumHandle, MirrorError> {
        let mut state = self.state.lock().await;
        if let Some((album, _)) = state.albums.iter().find(|(album, _)| album.name == name) {
            return Ok(album.clone());
        }

        let album = AlbumHandle {
            id: self.allocate_id("album"),
            name: name.to_string(),
        };
        state.albums.push((album.clone(), Vec::new()));
        Ok(album)
    }

    async fn add_asset_to_album(
        &self,
        asset: &AssetHandle,
        album: &AlbumHandle,
    ) -> Result<(), MirrorError> {
        let mut state = self.state.lock().await;
        let (_, members) = state
            .albums
            .iter_mut()
            .find(|(existing, _)| existing.id == album.id)
            .ok_or_else(|| MirrorError::Library(format!("unknown album {}", album.id)))?;
        if !members.contains(&asset.id) {
            members.push(asset.id.clone());
        }
        Ok(())
    }

    async fn list_album_assets(
        &self,
        album: &AlbumHandle,
    ) -> Result<Vec<AssetHandle>, MirrorError> {
        let state = self.state.lock().await;
        let (_, members) = state
            .albums
            .iter()
            .find(|(existing, _)| existing.id == album.id)
            .ok_or_else(|| MirrorError::Library(format!("unknown album {}", album.id)))?;
        Ok(members
            .iter()
            .filter_map(|id| state.assets.iter().find(|asset| &asset.id == id))
            .cloned()
            .collect())
    }
}

/// Share facility that records requests instead of opening a dialog.
#[derive(Debug)]
pub struct RecordingShareFacility {
    available: bool,
    requests: Mutex<Vec<ShareRequest>>,
}

impl RecordingShareFacility {
    /// Creates a facility reporting `available`.
    pub fn new(available: bool) -> Self {
        Self {
            available,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<ShareRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ShareFacility for RecordingShareFacility {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn share(&self, request: &ShareRequest) -> Result<(), ShareError> {
        self.requests.lock().await.push(request.clone());
        Ok(())
    }
}
