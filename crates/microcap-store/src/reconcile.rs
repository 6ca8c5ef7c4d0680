//! Startup reconciliation of the captures directory with the name index.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use microcap_core::{
    Capture, CaptureFileName, METADATA_FILE_NAME, MirrorLookup, capture_id,
    parse_capture_file_name,
};
use tokio::fs::{self, DirEntry};
use tracing::{debug, error, info, warn};

use crate::{CaptureStore, MetadataIndex, NameMap, StoreError};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Captures ordered newest first.
    pub captures: Vec<Capture>,
    /// Directory entries that were not capture files or repeated a loaded id.
    pub ignored_entries: usize,
    /// Index ids without a backing file.
    pub stale_ids: Vec<String>,
    /// Where a corrupt index was moved, if one was found.
    pub quarantined_index: Option<PathBuf>,
}

/// Builds the newest-first capture list; never fails.
///
/// Any listing or read error is logged and yields an empty list.
pub async fn load_all(
    store: &CaptureStore,
    index: &MetadataIndex,
    mirror: &dyn MirrorLookup,
) -> Vec<Capture> {
    load_all_report(store, index, mirror).await.captures
}

/// Same as [`load_all`] but keeps the bookkeeping counts.
pub async fn load_all_report(
    store: &CaptureStore,
    index: &MetadataIndex,
    mirror: &dyn MirrorLookup,
) -> ReconcileReport {
    match reconcile(store, index, mirror).await {
        Ok(report) => {
            info!(
                loaded = report.captures.len(),
                ignored = report.ignored_entries,
                stale_names = report.stale_ids.len(),
                "captures reconciled"
            );
            report
        }
        Err(error) => {
            warn!(%error, "capture listing failed; starting with an empty gallery");
            ReconcileReport::default()
        }
    }
}

async fn reconcile(
    store: &CaptureStore,
    index: &MetadataIndex,
    mirror: &dyn MirrorLookup,
) -> Result<ReconcileReport, StoreError> {
    let dir = store.captures_dir();
    let present = fs::try_exists(dir)
        .await
        .map_err(|source| StoreError::ReadFailed {
            path: dir.to_path_buf(),
            source,
        })?;
    if !present {
        return Ok(ReconcileReport::default());
    }

    let (names, quarantined_index) = load_names(index).await?;

    let mut entries = Vec::new();
    let mut listing = fs::read_dir(dir)
        .await
        .map_err(|source| StoreError::ReadFailed {
            path: dir.to_path_buf(),
            source,
        })?;
    while let Some(entry) = listing
        .next_entry()
        .await
        .map_err(|source| StoreError::ReadFailed {
            path: dir.to_path_buf(),
            source,
        })?
    {
        entries.push(entry);
    }
    // Listing order is platform-defined; sort so timestamp ties break the same way everywhere.
    entries.sort_by_key(DirEntry::file_name);

    let mut report = ReconcileReport {
        quarantined_index,
        ..ReconcileReport::default()
    };

    let mut found = Vec::new();
    for entry in entries {
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            report.ignored_entries += 1;
            continue;
        };
        if file_name == METADATA_FILE_NAME {
            continue;
        }

        let (timestamp_ms, canonical) = match parse_capture_file_name(file_name) {
            CaptureFileName::Valid(timestamp_ms) => (timestamp_ms, true),
            CaptureFileName::Malformed => (modified_ms(&entry).await?, false),
            CaptureFileName::Foreign => {
                report.ignored_entries += 1;
                continue;
            }
        };

        let is_file = entry
            .file_type()
            .await
            .map_err(|source| StoreError::ReadFailed {
                path: entry.path(),
                source,
            })?
            .is_file();
        if !is_file {
            report.ignored_entries += 1;
            continue;
        }

        found.push((entry.path(), timestamp_ms, canonical));
    }

    // A file named for its id owns that id; an mtime-derived id never displaces it.
    found.sort_by_key(|(_, _, canonical)| !canonical);
    let mut taken = BTreeSet::new();
    for (uri, timestamp_ms, _) in found {
        let id = capture_id(timestamp_ms);
        if !taken.insert(id.clone()) {
            debug!(path = %uri.display(), capture_id = %id, "capture id already loaded; entry ignored");
            report.ignored_entries += 1;
            continue;
        }
        report.captures.push(Capture {
            gallery_uri: mirror.gallery_uri(&id),
            name: names.get(&id).cloned(),
            id,
            uri,
            timestamp_ms,
        });
    }

    report
        .captures
        .sort_by(|left, right| right.timestamp_ms.cmp(&left.timestamp_ms));

    let known: BTreeSet<&str> = report
        .captures
        .iter()
        .map(|capture| capture.id.as_str())
        .collect();
    report.stale_ids = names
        .keys()
        .filter(|id| !known.contains(id.as_str()))
        .cloned()
        .collect();

    Ok(report)
}

async fn load_names(index: &MetadataIndex) -> Result<(NameMap, Option<PathBuf>), StoreError> {
    match index.load().await {
        Ok(names) => Ok((names, None)),
        Err(corrupt @ StoreError::MetadataCorrupt { .. }) => {
            error!(error = %corrupt, "metadata index unreadable; capture names unavailable");
            let backup = match index.quarantine_corrupt().await {
                Ok(backup) => backup,
                Err(error) => {
                    error!(%error, "could not move corrupt metadata index aside");
                    None
                }
            };
            Ok((NameMap::new(), backup))
        }
        Err(other) => Err(other),
    }
}

async fn modified_ms(entry: &DirEntry) -> Result<u64, StoreError> {
    let metadata = entry
        .metadata()
        .await
        .map_err(|source| StoreError::ReadFailed {
            path: entry.path(),
            source,
        })?;
    let modified = metadata.modified().map_err(|source| StoreError::ReadFailed {
        path: entry.path(),
        source,
    })?;

    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0))
}
