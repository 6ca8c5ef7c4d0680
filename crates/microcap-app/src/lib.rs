#![warn(missing_docs)]
//! # microcap-app
//!
//! ## Purpose
//! Orchestrates the frame source, local store, name index, and shared-library
//! mirror for the `microcap` microscope client.
//!
//! ## Responsibilities
//! - Load runtime configuration from `MICROCAP_*` environment variables.
//! - Reconcile saved captures into the gallery on startup.
//! - Run at most one capture at a time and honor the capture kill switch.
//! - Keep render-facing [`GalleryState`] consistent through named transitions.
//! - Project failures into dismissable user notices.
//!
//! ## Data flow
//! Live view -> liveness monitor -> capture -> store save -> mirror (best
//! effort) -> gallery state prepend. Startup -> mirror snapshot ->
//! reconciliation -> gallery state.
//!
//! ## Ownership and lifetimes
//! [`CaptureSession`] is an `Arc` handle; gallery state sits behind a std
//! mutex that is never held across an await point.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]; each one also leaves a
//! notice in [`GalleryState`]. Mirror failures never surface.
//!
//! ## Security and privacy notes
//! - Captures stay in the application documents root unless library
//!   permission is granted.
//! - Frame sizes and file paths are logged only at `debug`.
//! - Kill-switch env var can stop capture safely at runtime.

pub mod config;
mod error;
pub mod session;
pub mod state;
mod telemetry;

pub use config::{AppConfig, BuiltSource, ConfigError};
pub use error::AppError;
pub use session::{CaptureOutcome, CaptureSession, LiveViewHandle, SessionParts};
pub use state::{GalleryState, Notice, NoticeKind, Screen, SourceStatus};
pub use telemetry::init_tracing;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("MICROCAP_VERSION");

/// Flat status snapshot for a status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStatus {
    /// Whether the capture control should be enabled.
    pub capture_allowed: bool,
    /// Source liveness as human-readable string.
    pub source: String,
    /// Number of captures in the gallery.
    pub captures: usize,
    /// Number of captures mirrored to the shared library.
    pub mirrored: usize,
}

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Checks runtime kill-switch env var.
///
/// Semantics:
/// - Unset => capture enabled.
/// - `0`, `false`, `off` (case-insensitive) => capture disabled.
/// - Any other value => capture enabled.
pub fn capture_enabled_from_env() -> bool {
    std::env::var("MICROCAP_CAPTURE_ENABLED")
        .map(|value| config::switch_enabled(&value))
        .unwrap_or(true)
}

/// Projects gallery state into flat status snapshot.
pub fn project_runtime_status(state: &GalleryState) -> RuntimeStatus {
    RuntimeStatus {
        capture_allowed: state.can_start_capture() && capture_enabled_from_env(),
        source: format!("{:?}", state.source),
        captures: state.captures.len(),
        mirrored: state
            .captures
            .iter()
            .filter(|capture| capture.in_gallery())
            .count(),
    }
}
