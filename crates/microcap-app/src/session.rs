//! Capture orchestration: source, store, index, mirror and gallery state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use microcap_core::{Capture, Clock, validate_display_name};
use microcap_mirror::{MediaLibrary, MediaMirror, Permission, ShareFacility, share_capture};
use microcap_source::{
    FrameSource, FrameSourceAdapter, Liveness, LivenessGuard, LivenessMonitor, SourceError,
};
use microcap_store::{CaptureStore, MetadataIndex, ReconcileReport, load_all_report};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::state::{GalleryState, NoticeKind, Screen};
use crate::{APP_VERSION, capture_enabled_from_env};

/// Title of the share dialog.
pub const SHARE_DIALOG_TITLE: &str = "Share microscope image";

/// Result of one capture request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Frame persisted and added to the gallery.
    Saved(Capture),
    /// Another capture was already in flight; nothing happened.
    Dropped,
}

/// Collaborators a session is assembled from.
pub struct SessionParts {
    /// Live-video transport.
    pub source: Arc<dyn FrameSource>,
    /// Shared photo library.
    pub library: Arc<dyn MediaLibrary>,
    /// Timestamp source for new captures.
    pub clock: Arc<dyn Clock>,
}

struct SessionInner {
    adapter: Arc<FrameSourceAdapter>,
    store: CaptureStore,
    index: MetadataIndex,
    mirror: MediaMirror,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<GalleryState>>,
    capturing: AtomicBool,
    capture_enabled: bool,
    probe_interval: Duration,
}

/// Cheaply cloneable handle to one running client.
#[derive(Clone)]
pub struct CaptureSession {
    inner: Arc<SessionInner>,
}

impl CaptureSession {
    /// Wires a session for `config`; nothing touches disk or network yet.
    pub fn new(config: &AppConfig, parts: SessionParts) -> Self {
        let store = CaptureStore::in_documents_root(&config.documents_root);
        let index = MetadataIndex::in_dir(store.captures_dir());
        let adapter = Arc::new(FrameSourceAdapter::new(
            parts.source,
            config.adapter_config(),
        ));

        Self {
            inner: Arc::new(SessionInner {
                adapter,
                store,
                index,
                mirror: MediaMirror::new(parts.library, config.album_name.clone()),
                clock: parts.clock,
                state: Arc::new(Mutex::new(GalleryState::new(APP_VERSION))),
                capturing: AtomicBool::new(false),
                capture_enabled: config.capture_enabled,
                probe_interval: config.probe_interval,
            }),
        }
    }

    /// Returns the frame source adapter.
    pub fn adapter(&self) -> &Arc<FrameSourceAdapter> {
        &self.inner.adapter
    }

    /// Returns the capture store.
    pub fn store(&self) -> &CaptureStore {
        &self.inner.store
    }

    /// Returns the name index.
    pub fn index(&self) -> &MetadataIndex {
        &self.inner.index
    }

    /// Clones the current gallery state for rendering.
    pub fn snapshot_state(&self) -> GalleryState {
        lock(&self.inner.state).clone()
    }

    /// Applies a synchronous transition to the gallery state.
    pub fn update<R>(&self, transition: impl FnOnce(&mut GalleryState) -> R) -> R {
        transition(&mut lock(&self.inner.state))
    }

    /// Asks for library permission once, reconciles disk with the index and
    /// lands on the home screen.
    pub async fn startup(&self) -> ReconcileReport {
        let permission = self.inner.mirror.initialize().await;
        let mirrored = self.inner.mirror.snapshot().await;
        let report = load_all_report(&self.inner.store, &self.inner.index, &mirrored).await;

        if !report.stale_ids.is_empty() {
            debug!(stale = ?report.stale_ids, "index names without a capture file");
        }
        info!(
            captures = report.captures.len(),
            mirrored = mirrored.len(),
            library = ?permission,
            "startup complete"
        );

        let captures = report.captures.clone();
        self.update(|state| {
            state.captures_loaded(captures);
            state.navigate(Screen::Home);
        });
        report
    }

    /// Returns the cached library permission.
    pub fn library_permission(&self) -> Option<Permission> {
        self.inner.mirror.permission()
    }

    /// Opens the live view and starts periodic liveness probing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enter_live_view(&self) -> LiveViewHandle {
        self.update(|state| state.navigate(Screen::LiveView));

        let state = Arc::clone(&self.inner.state);
        let guard = LivenessMonitor::start_with(
            Arc::clone(&self.inner.adapter),
            self.inner.probe_interval,
            move |liveness: Liveness| {
                let mut state = lock(&state);
                if state.screen == Screen::LiveView {
                    state.source_status_changed(liveness.live);
                }
            },
        );

        LiveViewHandle {
            guard: Some(guard),
            state: Arc::clone(&self.inner.state),
        }
    }

    /// Probes the source once outside the periodic monitor.
    pub async fn probe_now(&self) -> Liveness {
        let liveness = self.inner.adapter.probe().await;
        self.update(|state| state.source_status_changed(liveness.live));
        liveness
    }

    /// Captures, persists and mirrors one frame.
    ///
    /// A second request while one is in flight is dropped, not queued.
    ///
    /// # Errors
    /// - [`AppError::CaptureDisabled`] when the kill switch is off.
    /// - [`AppError::Source`] when the source is offline, the transfer fails,
    ///   or the payload is a placeholder.
    /// - [`AppError::Store`] when the file cannot be written.
    ///
    /// Every error also leaves a notice in the gallery state.
    pub async fn capture(&self) -> Result<CaptureOutcome, AppError> {
        if !self.inner.capture_enabled || !capture_enabled_from_env() {
            let error = AppError::CaptureDisabled;
            self.update(|state| state.show_notice(NoticeKind::Error, error.user_notice()));
            return Err(error);
        }

        let Some(_in_flight) = InFlight::acquire(&self.inner) else {
            debug!("capture already in flight; request dropped");
            return Ok(CaptureOutcome::Dropped);
        };

        match self.persist_frame().await {
            Ok(capture) => {
                info!(capture_id = %capture.id, in_gallery = capture.in_gallery(), "capture added to gallery");
                let saved = capture.clone();
                self.update(|state| {
                    state.capture_added(saved);
                    state.show_notice(NoticeKind::Info, "Image saved.");
                });
                Ok(CaptureOutcome::Saved(capture))
            }
            Err(error) => {
                match &error {
                    AppError::Source(SourceError::FrameTooSmall { actual, minimum }) => {
                        warn!(actual, minimum, "capture rejected: placeholder frame");
                    }
                    other => warn!(error = %other, "capture failed"),
                }
                self.update(|state| state.show_notice(NoticeKind::Error, error.user_notice()));
                Err(error)
            }
        }
    }

    async fn persist_frame(&self) -> Result<Capture, AppError> {
        let frame = self.inner.adapter.capture_frame().await?;
        let timestamp_ms = self.inner.clock.now_ms();
        let mut capture = self.inner.store.save(&frame, timestamp_ms).await?;
        debug!(path = %capture.uri.display(), bytes = frame.len(), "capture file written");

        if let Some(gallery_uri) = self.inner.mirror.mirror(&capture).await {
            capture.gallery_uri = Some(gallery_uri);
        }
        Ok(capture)
    }

    /// Names a capture and persists the name.
    ///
    /// # Returns
    /// The stored (trimmed) name.
    ///
    /// # Errors
    /// - [`AppError::Core`] when the name is empty or too long.
    /// - [`AppError::UnknownCapture`] when no capture has this id.
    /// - [`AppError::Store`] when the index cannot be written.
    pub async fn rename(&self, capture_id: &str, raw_name: &str) -> Result<String, AppError> {
        let result = self.try_rename(capture_id, raw_name).await;
        if let Err(error) = &result {
            self.update(|state| state.show_notice(NoticeKind::Error, error.user_notice()));
        }
        result
    }

    async fn try_rename(&self, capture_id: &str, raw_name: &str) -> Result<String, AppError> {
        let name = validate_display_name(raw_name)?;
        if self.update(|state| state.capture(capture_id).is_none()) {
            return Err(AppError::UnknownCapture(capture_id.to_string()));
        }

        self.inner.index.upsert(capture_id, &name).await?;
        self.update(|state| state.capture_renamed(capture_id, name.clone()));
        info!(capture_id, "capture renamed");
        Ok(name)
    }

    /// Deletes a capture file and its name; repeating it is harmless.
    ///
    /// Index cleanup failures are logged and do not fail the delete.
    ///
    /// # Errors
    /// Returns [`AppError::Store`] when the file exists but cannot be removed.
    pub async fn delete(&self, capture_id: &str) -> Result<(), AppError> {
        let capture = self.update(|state| state.capture(capture_id).cloned());

        if let Some(capture) = &capture {
            if let Err(error) = self.inner.store.delete(capture).await {
                let error = AppError::from(error);
                self.update(|state| state.show_notice(NoticeKind::Error, error.user_notice()));
                return Err(error);
            }
        }

        if let Err(error) = self.inner.index.remove(capture_id).await {
            warn!(capture_id, %error, "capture name could not be removed");
        }

        self.update(|state| state.capture_removed(capture_id));
        if capture.is_some() {
            info!(capture_id, "capture deleted");
        }
        Ok(())
    }

    /// Hands a capture to the platform share sheet.
    ///
    /// # Errors
    /// - [`AppError::UnknownCapture`] when no capture has this id.
    /// - [`AppError::Share`] when sharing is unavailable or fails.
    pub async fn share(
        &self,
        capture_id: &str,
        facility: &dyn ShareFacility,
    ) -> Result<(), AppError> {
        let result = match self.update(|state| state.capture(capture_id).cloned()) {
            Some(capture) => share_capture(facility, &capture, SHARE_DIALOG_TITLE)
                .await
                .map_err(AppError::from),
            None => Err(AppError::UnknownCapture(capture_id.to_string())),
        };

        if let Err(error) = &result {
            self.update(|state| state.show_notice(NoticeKind::Error, error.user_notice()));
        }
        result
    }
}

/// Mounted live view; closing or dropping it stops probing.
pub struct LiveViewHandle {
    guard: Option<LivenessGuard>,
    state: Arc<Mutex<GalleryState>>,
}

impl LiveViewHandle {
    /// Stops probing, waits for the probe task, and returns to the gallery.
    pub async fn close(mut self) {
        if let Some(guard) = self.guard.take() {
            guard.stop().await;
        }
        lock(&self.state).navigate(Screen::Gallery);
    }

    /// Returns `true` while the probe task is scheduled.
    pub fn is_probing(&self) -> bool {
        self.guard.as_ref().is_some_and(LivenessGuard::is_running)
    }
}

impl Drop for LiveViewHandle {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            drop(guard);
            lock(&self.state).navigate(Screen::Gallery);
        }
    }
}

/// Holds the single capture slot until dropped.
struct InFlight<'a> {
    inner: &'a SessionInner,
}

impl<'a> InFlight<'a> {
    fn acquire(inner: &'a SessionInner) -> Option<Self> {
        inner
            .capturing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        lock(&inner.state).capture_started();
        Some(Self { inner })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(&self.inner.state).capture_finished();
        self.inner.capturing.store(false, Ordering::Release);
    }
}

fn lock(state: &Mutex<GalleryState>) -> MutexGuard<'_, GalleryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
