#![warn(missing_docs)]
//! # microcap-store
//!
//! ## Purpose
//! Persists captures on the local filesystem and rebuilds the gallery from it.
//!
//! ## Responsibilities
//! - Write frames to `captures/capture_<unixMillis>.jpg` without ever exposing
//!   a partial file ([`CaptureStore`]).
//! - Keep the `captures/metadata.json` name index behind a single-writer queue
//!   ([`MetadataIndex`]).
//! - Reconcile the directory listing with the index and mirror state into the
//!   ordered capture list ([`load_all`], [`load_all_report`]).
//!
//! ## Data flow
//! Frame bytes -> [`CaptureStore::save`] -> [`microcap_core::Capture`].
//! Rename/delete -> [`MetadataIndex::upsert`] / [`MetadataIndex::remove`].
//! Startup -> [`load_all`] -> newest-first `Vec<Capture>`.
//!
//! ## Ownership and lifetimes
//! The store exclusively owns the captures directory and the index exclusively
//! owns its JSON file. Both hand out owned values only.
//!
//! ## Error model
//! Write/delete failures are [`StoreError::PersistFailed`]; an unparseable
//! index is [`StoreError::MetadataCorrupt`]. Reconciliation never fails: it
//! logs and degrades to an empty gallery.
//!
//! ## Security and privacy notes
//! Frame bytes are never logged; file paths are logged at debug level only.

mod capture_store;
mod metadata_index;
mod reconcile;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use capture_store::CaptureStore;
pub use metadata_index::{MetadataIndex, NameMap};
pub use reconcile::{ReconcileReport, load_all, load_all_report};

/// Store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Local write, rename or delete failed.
    #[error("failed to persist {}: {source}", .path.display())]
    PersistFailed {
        /// File being written or removed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// Index file exists but does not hold a JSON object of strings.
    #[error("metadata index {} is corrupt: {source}", .path.display())]
    MetadataCorrupt {
        /// Index file path.
        path: PathBuf,
        /// Parse failure.
        source: serde_json::Error,
    },
    /// Reading the directory or index failed.
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
}
