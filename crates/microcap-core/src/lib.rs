#![warn(missing_docs)]
//! # microcap-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `microcap` workspace.
//!
//! ## Responsibilities
//! - Represent one saved still frame as a [`Capture`].
//! - Derive capture ids and file names from millisecond timestamps, and parse
//!   them back from directory listings.
//! - Validate human-assigned display names and build the default name.
//! - Provide the [`Clock`] and [`MirrorLookup`] seams used by the pipeline.
//!
//! ## Data flow
//! The store stamps frames with [`Clock::now_ms`] and names files with
//! [`capture_file_name`]. On startup the loader feeds directory entries through
//! [`parse_capture_file_name`] and joins the result with the metadata index.
//!
//! ## Ownership and lifetimes
//! [`Capture`] owns its path and strings so records can move freely between
//! async pipeline stages and the application state.
//!
//! ## Error model
//! Name validation failures return [`CoreError`] variants.
//!
//! ## Example
//! ```rust
//! use microcap_core::{capture_file_name, parse_capture_file_name, CaptureFileName};
//!
//! let name = capture_file_name(1_700_000_000_123);
//! assert_eq!(name, "capture_1700000000123.jpg");
//! assert_eq!(
//!     parse_capture_file_name(&name),
//!     CaptureFileName::Valid(1_700_000_000_123)
//! );
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Directory (under the documents root) holding capture files.
pub const CAPTURES_DIR_NAME: &str = "captures";

/// Metadata sidecar file name inside the captures directory.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// File name prefix shared by every capture.
pub const CAPTURE_FILE_PREFIX: &str = "capture_";

/// File name extension shared by every capture.
pub const CAPTURE_FILE_EXTENSION: &str = ".jpg";

/// Maximum display-name length in characters.
pub const MAX_NAME_CHARS: usize = 50;

/// Payloads below this many bytes are treated as placeholders, not frames.
pub const DEFAULT_MIN_FRAME_BYTES: usize = 1_000;

/// One saved still frame plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    /// Decimal millisecond timestamp; join key with the metadata index.
    pub id: String,
    /// Local file path, immutable once written.
    pub uri: PathBuf,
    /// External media-library identifier when mirrored.
    pub gallery_uri: Option<String>,
    /// Capture time in Unix epoch milliseconds.
    pub timestamp_ms: u64,
    /// Human-assigned name, absent until explicitly set.
    pub name: Option<String>,
}

impl Capture {
    /// Creates an unnamed, unmirrored capture stamped at `timestamp_ms`.
    pub fn new(timestamp_ms: u64, uri: impl Into<PathBuf>) -> Self {
        Self {
            id: capture_id(timestamp_ms),
            uri: uri.into(),
            gallery_uri: None,
            timestamp_ms,
            name: None,
        }
    }

    /// Returns `true` iff the capture was mirrored into the shared library.
    pub fn in_gallery(&self) -> bool {
        self.gallery_uri.is_some()
    }

    /// Returns the assigned name or the dated default.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => default_display_name(self.timestamp_ms),
        }
    }

    /// Returns the file name component of [`Capture::uri`], if any.
    pub fn file_name(&self) -> Option<&str> {
        self.uri.file_name().and_then(|name| name.to_str())
    }
}

/// Derives the capture id for a timestamp.
pub fn capture_id(timestamp_ms: u64) -> String {
    timestamp_ms.to_string()
}

/// Builds the on-disk file name for a timestamp.
pub fn capture_file_name(timestamp_ms: u64) -> String {
    format!("{CAPTURE_FILE_PREFIX}{timestamp_ms}{CAPTURE_FILE_EXTENSION}")
}

/// Classification of one directory entry name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFileName {
    /// `capture_<digits>.jpg` with canonical digits (no leading zero) that fit
    /// a millisecond timestamp.
    Valid(u64),
    /// Matches the capture pattern but the digits do not parse; callers fall
    /// back to the file modification time.
    Malformed,
    /// Not a capture file.
    Foreign,
}

/// Classifies a directory entry name against `capture_<digits>.jpg`.
///
/// Digit strings with a leading zero are not capture names; ids must
/// round-trip through [`capture_file_name`].
pub fn parse_capture_file_name(file_name: &str) -> CaptureFileName {
    let Some(digits) = file_name
        .strip_prefix(CAPTURE_FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(CAPTURE_FILE_EXTENSION))
    else {
        return CaptureFileName::Foreign;
    };

    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return CaptureFileName::Foreign;
    }

    // Ids are the canonical decimal form, so `capture_01000.jpg` cannot alias `capture_1000.jpg`.
    if digits.len() > 1 && digits.starts_with('0') {
        return CaptureFileName::Foreign;
    }

    match digits.parse::<u64>() {
        Ok(timestamp_ms) => CaptureFileName::Valid(timestamp_ms),
        Err(_) => CaptureFileName::Malformed,
    }
}

/// Validates and normalizes a human-assigned display name.
///
/// # Errors
/// Returns [`CoreError::EmptyName`] for blank input and
/// [`CoreError::NameTooLong`] above [`MAX_NAME_CHARS`] characters.
pub fn validate_display_name(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::EmptyName);
    }

    let chars = trimmed.chars().count();
    if chars > MAX_NAME_CHARS {
        return Err(CoreError::NameTooLong {
            max: MAX_NAME_CHARS,
            actual: chars,
        });
    }

    Ok(trimmed.to_string())
}

/// Default display name in the local UTC offset.
///
/// Falls back to UTC when the local offset cannot be determined.
pub fn default_display_name(timestamp_ms: u64) -> String {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    default_display_name_at_offset(timestamp_ms, offset)
}

/// Default display name rendered at an explicit offset.
pub fn default_display_name_at_offset(timestamp_ms: u64, offset: UtcOffset) -> String {
    let format = format_description!("[day]/[month]/[year] [hour]:[minute]:[second]");
    let nanos = i128::from(timestamp_ms) * 1_000_000;

    let formatted = OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|instant| instant.to_offset(offset).format(&format).ok());

    match formatted {
        Some(date) => format!("Capture {date}"),
        None => format!("Capture {timestamp_ms}"),
    }
}

/// Millisecond clock used to stamp captures.
pub trait Clock: Send + Sync {
    /// Returns current Unix epoch milliseconds.
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Deterministic clock for tests; only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    /// Creates a clock frozen at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    /// Moves the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Jumps the clock to `now_ms`.
    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Read-only view of shared-library mirror state keyed by capture id.
pub trait MirrorLookup: Send + Sync {
    /// Returns the external identifier for a mirrored capture.
    fn gallery_uri(&self, capture_id: &str) -> Option<String>;
}

/// Lookup used when no mirror state is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMirror;

impl MirrorLookup for NoMirror {
    fn gallery_uri(&self, _capture_id: &str) -> Option<String> {
        None
    }
}

/// Error type for core domain validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Name is blank after trimming.
    #[error("capture name is empty")]
    EmptyName,
    /// Name exceeds the character limit.
    #[error("capture name too long: {actual} characters, limit is {max}")]
    NameTooLong {
        /// Character limit.
        max: usize,
        /// Submitted length in characters.
        actual: usize,
    },
}
