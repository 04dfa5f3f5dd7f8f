//! # Index Snapshots
//!
//! JSON snapshots of a reference store. Writes go to a temporary file in the
//! destination directory and are renamed into place, so a crash never
//! leaves a half-written snapshot behind.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use super::item::ReferenceItem;
use super::store::{InMemoryReferenceStore, ReferenceStore};
use crate::errors::{error_logging, AppError, AppResult};

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct IndexSnapshot {
    version: u32,
    saved_at: DateTime<Utc>,
    items: Vec<ReferenceItem>,
}

/// Write every item of `store` to `path`
///
/// # Arguments
///
/// * `store` - Any reference store; items are written in insertion order
/// * `path` - Destination file; parent directories are created as needed
///
/// # Returns
///
/// Returns the number of items written
pub fn save_snapshot(store: &dyn ReferenceStore, path: &Path) -> AppResult<usize> {
    let items = store.get_all()?;
    let count = items.len();
    let snapshot = IndexSnapshot {
        version: SNAPSHOT_VERSION,
        saved_at: Utc::now(),
        items,
    };

    let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir).inspect_err(|e| {
        error_logging::log_filesystem_error(e, "create_snapshot_dir", parent_dir.to_str())
    })?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        serde_json::to_writer(&mut writer, &snapshot)?;
        writer.flush()?;
    }

    temp_file.persist(path).map_err(|e| {
        error_logging::log_filesystem_error(&e, "persist_snapshot", path.to_str());
        AppError::FileSystem(format!("Failed to persist snapshot: {}", e))
    })?;

    debug!(target: "visual_index", path = %path.display(), items = count, "Saved index snapshot");
    Ok(count)
}

/// Load a snapshot written by [`save_snapshot`] into a fresh in-memory store
pub fn load_snapshot(path: &Path) -> AppResult<InMemoryReferenceStore> {
    let file = File::open(path).inspect_err(|e| {
        error_logging::log_filesystem_error(e, "open_snapshot", path.to_str())
    })?;
    let snapshot: IndexSnapshot = serde_json::from_reader(BufReader::new(file))?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(AppError::Serialization(format!(
            "Unsupported snapshot version {} (expected {})",
            snapshot.version, SNAPSHOT_VERSION
        )));
    }

    debug!(
        target: "visual_index",
        path = %path.display(),
        items = snapshot.items.len(),
        saved_at = %snapshot.saved_at,
        "Loaded index snapshot"
    );
    InMemoryReferenceStore::from_items(snapshot.items)
}
