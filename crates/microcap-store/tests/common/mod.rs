//! Shared fixtures for store integration tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Documents root in a temp directory removed on drop.
pub struct ScratchDir {
    root: TempDir,
}

impl ScratchDir {
    /// Creates a fresh documents root; its captures directory does not exist yet.
    pub fn new(label: &str) -> Self {
        let root = tempfile::Builder::new()
            .prefix(&format!("microcap-{label}-"))
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

/// Deterministic JPEG-shaped frame of `len` bytes.
#[allow(dead_code)]
pub fn fixture_frame(len: usize) -> Vec<u8> {
    let mut frame = vec![0x5A; len];
    frame[0] = 0xFF;
    frame[1] = 0xD8;
    frame
}
