use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::snapshot::Snapshot;

/// Most recent snapshot of each watched document.
///
/// Populated when watching starts, replaced wholesale after each processed
/// change, cleared on teardown. Only the orchestrator holds one.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    snapshots: HashMap<PathBuf, Snapshot>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&Snapshot> {
        self.snapshots.get(path)
    }

    /// Store `snapshot` under its own path, returning the one it replaces
    pub fn replace(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        self.snapshots
            .insert(snapshot.path().to_path_buf(), snapshot)
    }

    pub fn remove(&mut self, path: &Path) -> Option<Snapshot> {
        self.snapshots.remove(path)
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
