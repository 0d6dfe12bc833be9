use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use super::{Snapshot, SnapshotStore, StorageError};

/// Adapter that keeps the snapshot in a single JSON file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let data = serde_json::to_string_pretty(snapshot)
            .map_err(|e| StorageError::Malformed(e.to_string()))?;
        std::fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), invoices = snapshot.invoices.len(), "Saved snapshot");
        Ok(())
    }

    fn load(&self) -> Result<Snapshot, StorageError> {
        if !self.path.exists() {
            return Ok(Snapshot::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        let snapshot =
            serde_json::from_str(&data).map_err(|e| StorageError::Malformed(e.to_string()))?;
        Ok(snapshot)
    }
}

/// Writes the snapshot verbatim to a date-stamped backup file in `dir` and
/// returns the file's path.
pub fn export_backup(
    snapshot: &Snapshot,
    dir: &Path,
    today: NaiveDate,
) -> Result<PathBuf, StorageError> {
    let path = dir.join(format!("debtbook_backup_{today}.json"));
    let data = serde_json::to_string_pretty(snapshot)
        .map_err(|e| StorageError::Malformed(e.to_string()))?;
    std::fs::write(&path, data)?;
    info!(path = %path.display(), "Exported backup");
    Ok(path)
}

/// Parses a snapshot file for a full-replace import. Malformed input is
/// rejected here so the caller's prior state stays untouched.
pub fn import_snapshot(path: &Path) -> Result<Snapshot, StorageError> {
    let data = std::fs::read_to_string(path)?;
    let snapshot: Snapshot =
        serde_json::from_str(&data).map_err(|e| StorageError::Malformed(e.to_string()))?;
    info!(
        path = %path.display(),
        customers = snapshot.customers.len(),
        products = snapshot.products.len(),
        invoices = snapshot.invoices.len(),
        "Imported snapshot"
    );
    Ok(snapshot)
}
