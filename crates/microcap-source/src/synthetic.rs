//! Deterministic in-memory source for tests and CI.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::{FrameSource, SourceError, SourceKind};

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Synthetic source with switchable liveness and failure injection.
#[derive(Debug)]
pub struct SyntheticFrameSource {
    reachable: AtomicBool,
    frame_len: AtomicUsize,
    fail_transfers: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
    sequence: AtomicU64,
    probes: AtomicU64,
}

impl SyntheticFrameSource {
    /// Creates a reachable source emitting `frame_len`-byte JPEG-shaped frames.
    pub fn new(frame_len: usize) -> Self {
        Self {
            reachable: AtomicBool::new(true),
            frame_len: AtomicUsize::new(frame_len),
            fail_transfers: AtomicBool::new(false),
            fetch_delay: Mutex::new(None),
            sequence: AtomicU64::new(0),
            probes: AtomicU64::new(0),
        }
    }

    /// Toggles whether probes succeed.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Changes the size of subsequent frames.
    pub fn set_frame_len(&self, frame_len: usize) {
        self.frame_len.store(frame_len, Ordering::SeqCst);
    }

    /// Makes subsequent transfers fail.
    pub fn set_fail_transfers(&self, fail: bool) {
        self.fail_transfers.store(fail, Ordering::SeqCst);
    }

    /// Delays each transfer, simulating a slow camera.
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        if let Ok(mut slot) = self.fetch_delay.lock() {
            *slot = delay;
        }
    }

    /// Number of frames served so far.
    pub fn frames_served(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Number of probes answered so far.
    pub fn probe_count(&self) -> u64 {
        self.probes.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticFrameSource {
    fn default() -> Self {
        Self::new(4_096)
    }
}

#[async_trait]
impl FrameSource for SyntheticFrameSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Synthetic
    }

    async fn probe(&self) -> Result<(), SourceError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SourceError::Unavailable(
                "synthetic source switched off".to_string(),
            ))
        }
    }

    async fn fetch_frame(&self) -> Result<Vec<u8>, SourceError> {
        let delay = self.fetch_delay.lock().ok().and_then(|slot| *slot);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_transfers.load(Ordering::SeqCst) {
            return Err(SourceError::TransferFailed(
                "synthetic transfer failure".to_string(),
            ));
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let len = self.frame_len.load(Ordering::SeqCst);
        let fill = (sequence % 255) as u8;

        let mut frame = vec![fill; len];
        if len >= JPEG_SOI.len() + JPEG_EOI.len() {
            frame[..2].copy_from_slice(&JPEG_SOI);
            frame[len - 2..].copy_from_slice(&JPEG_EOI);
        }
        Ok(frame)
    }
}
