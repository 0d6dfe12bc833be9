use super::{Snapshot, SnapshotStore, StorageError};

/// In-memory adapter used by tests.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Option<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<Snapshot, StorageError> {
        Ok(self.snapshot.clone().unwrap_or_default())
    }
}
