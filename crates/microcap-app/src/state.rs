//! Render-facing gallery state and its named transitions.
//!
//! Every mutation goes through a method here so the rendering layer only ever
//! reads a consistent snapshot.

use microcap_core::Capture;

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Startup while captures are reconciled.
    Splash,
    /// Landing screen.
    Home,
    /// Live feed with the capture control.
    LiveView,
    /// Saved captures.
    Gallery,
}

/// Last known liveness of the frame source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// No probe has completed yet.
    Unknown,
    /// Last probe succeeded.
    Online,
    /// Last probe failed.
    Offline,
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Operation completed.
    Info,
    /// Operation failed.
    Error,
}

/// Dismissable message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Display text.
    pub message: String,
}

/// Aggregate gallery runtime state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryState {
    /// App version string sourced from root `VERSION`.
    pub version: String,
    /// Visible screen.
    pub screen: Screen,
    /// Captures ordered newest first.
    pub captures: Vec<Capture>,
    /// Frame source liveness.
    pub source: SourceStatus,
    /// Whether a capture is in flight.
    pub is_capturing: bool,
    /// Pending notice, if any.
    pub notice: Option<Notice>,
    /// Capture opened in the detail view.
    pub selected: Option<String>,
}

impl GalleryState {
    /// Creates the splash-screen state.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            screen: Screen::Splash,
            captures: Vec::new(),
            source: SourceStatus::Unknown,
            is_capturing: false,
            notice: None,
            selected: None,
        }
    }

    /// Replaces the gallery with a reconciled list.
    pub fn captures_loaded(&mut self, captures: Vec<Capture>) {
        self.captures = captures;
        let still_loaded = self
            .selected
            .as_deref()
            .is_some_and(|selected| self.capture(selected).is_some());
        if !still_loaded {
            self.selected = None;
        }
    }

    /// Prepends a freshly saved capture.
    pub fn capture_added(&mut self, capture: Capture) {
        self.captures.retain(|existing| existing.id != capture.id);
        self.captures.insert(0, capture);
    }

    /// Drops a capture from the gallery and from the selection.
    pub fn capture_removed(&mut self, capture_id: &str) {
        self.captures.retain(|capture| capture.id != capture_id);
        if self.selected.as_deref() == Some(capture_id) {
            self.selected = None;
        }
    }

    /// Applies a new display name; returns `false` for an unknown id.
    pub fn capture_renamed(&mut self, capture_id: &str, name: impl Into<String>) -> bool {
        match self.find_mut(capture_id) {
            Some(capture) => {
                capture.name = Some(name.into());
                true
            }
            None => false,
        }
    }

    /// Records the library asset a capture was mirrored to.
    pub fn capture_mirrored(&mut self, capture_id: &str, gallery_uri: impl Into<String>) -> bool {
        match self.find_mut(capture_id) {
            Some(capture) => {
                capture.gallery_uri = Some(gallery_uri.into());
                true
            }
            None => false,
        }
    }

    /// Switches screens; leaving the live view forgets the source status.
    pub fn navigate(&mut self, screen: Screen) {
        if self.screen == Screen::LiveView && screen != Screen::LiveView {
            self.source = SourceStatus::Unknown;
        }
        self.screen = screen;
    }

    /// Records a liveness probe result.
    pub fn source_status_changed(&mut self, live: bool) {
        self.source = if live {
            SourceStatus::Online
        } else {
            SourceStatus::Offline
        };
    }

    /// Marks a capture as in flight.
    pub fn capture_started(&mut self) {
        self.is_capturing = true;
    }

    /// Clears the in-flight marker.
    pub fn capture_finished(&mut self) {
        self.is_capturing = false;
    }

    /// Replaces the pending notice.
    pub fn show_notice(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            message: message.into(),
        });
    }

    /// Clears the pending notice.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Opens a capture in the detail view; returns `false` for an unknown id.
    pub fn select(&mut self, capture_id: &str) -> bool {
        if self.capture(capture_id).is_none() {
            return false;
        }
        self.selected = Some(capture_id.to_string());
        true
    }

    /// Closes the detail view.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Looks up a capture by id.
    pub fn capture(&self, capture_id: &str) -> Option<&Capture> {
        self.captures.iter().find(|capture| capture.id == capture_id)
    }

    /// Returns `true` when the capture control should be enabled.
    pub fn can_start_capture(&self) -> bool {
        self.screen == Screen::LiveView && self.source == SourceStatus::Online && !self.is_capturing
    }

    fn find_mut(&mut self, capture_id: &str) -> Option<&mut Capture> {
        self.captures
            .iter_mut()
            .find(|capture| capture.id == capture_id)
    }
}
