//! Shared fixtures for app integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use microcap_app::{AppConfig, CaptureSession, SessionParts};
use microcap_core::ManualClock;
use microcap_mirror::{InMemoryMediaLibrary, Permission};
use microcap_source::{SourceKind, SyntheticFrameSource};
use tempfile::TempDir;

/// First capture stamp handed out by fixture clocks.
#[allow(dead_code)]
pub const START_MS: u64 = 1_700_000_000_000;

/// Documents root in a temp directory removed on drop.
pub struct ScratchDir {
    root: TempDir,
}

impl ScratchDir {
    /// Creates a fresh documents root; its captures directory does not exist yet.
    pub fn new(label: &str) -> Self {
        let root = tempfile::Builder::new()
            .prefix(&format!("microcap-app-{label}-"))
            .tempdir()
            .expect("temp dir should be created");
        Self { root }
    }

    /// Root path.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Captures directory under the root.
    #[allow(dead_code)]
    pub fn captures(&self) -> PathBuf {
        self.root.path().join("captures")
    }
}

/// Session wired to in-memory collaborators.
#[allow(dead_code)]
pub struct Harness {
    pub dir: ScratchDir,
    pub config: AppConfig,
    pub source: Arc<SyntheticFrameSource>,
    pub library: Arc<InMemoryMediaLibrary>,
    pub clock: Arc<ManualClock>,
    pub session: CaptureSession,
}

impl Harness {
    /// Builds a session over a fresh directory.
    #[allow(dead_code)]
    pub fn new(label: &str, permission: Permission) -> Self {
        let dir = ScratchDir::new(label);
        Self::in_dir(dir, permission)
    }

    /// Builds a session over an existing directory, as after a restart.
    #[allow(dead_code)]
    pub fn in_dir(dir: ScratchDir, permission: Permission) -> Self {
        let config = fixture_config(dir.path());
        let library = Arc::new(InMemoryMediaLibrary::new(permission));
        Self::with_library(dir, config, library)
    }

    /// Builds a session with a caller-supplied config and library.
    #[allow(dead_code)]
    pub fn with_library(
        dir: ScratchDir,
        config: AppConfig,
        library: Arc<InMemoryMediaLibrary>,
    ) -> Self {
        let source = Arc::new(SyntheticFrameSource::default());
        let clock = Arc::new(ManualClock::new(START_MS));
        let session = CaptureSession::new(
            &config,
            SessionParts {
                source: source.clone(),
                library: library.clone(),
                clock: clock.clone(),
            },
        );

        Self {
            dir,
            config,
            source,
            library,
            clock,
            session,
        }
    }

    /// Runs startup and brings the source online.
    #[allow(dead_code)]
    pub async fn ready(&self) {
        self.session.startup().await;
        assert!(self.session.probe_now().await.live);
    }

    /// Restarts on the same directory and library, dropping this session.
    #[allow(dead_code)]
    pub fn restart(self) -> Self {
        let Harness {
            dir,
            config,
            library,
            ..
        } = self;
        Self::with_library(dir, config, library)
    }
}

/// Synthetic-source config rooted at `root`.
#[allow(dead_code)]
pub fn fixture_config(root: &Path) -> AppConfig {
    AppConfig {
        documents_root: root.to_path_buf(),
        source_kind: SourceKind::Synthetic,
        ..AppConfig::default()
    }
}
