//! Best-effort persistence of the last resolution result.
//!
//! The caller persists explicitly after a resolution pass. Write failures are
//! logged and swallowed; read failures are treated as "no snapshot".

use crate::db::Database;
use crate::models::{ResolutionResult, ResolutionSnapshot};

/// Last-result cache bound to one key.
pub struct SnapshotStore<'a> {
    db: &'a Database,
    key: &'a str,
}

impl<'a> SnapshotStore<'a> {
    pub fn new(db: &'a Database, key: &'a str) -> Self {
        Self { db, key }
    }

    /// Overwrite the cached snapshot with `result`, stamped now.
    ///
    /// Returns whether the write succeeded. Failures never propagate.
    pub fn persist(&self, result: &ResolutionResult) -> bool {
        let snapshot = ResolutionSnapshot::now(result.clone());
        match self.db.write_snapshot(self.key, &snapshot) {
            Ok(()) => {
                tracing::debug!(key = self.key, groups = result.len(), "cached resolution snapshot");
                true
            }
            Err(e) => {
                tracing::warn!(key = self.key, error = %e, "failed to cache resolution snapshot");
                false
            }
        }
    }

    /// The last cached snapshot, if one can be read.
    pub fn load_last(&self) -> Option<ResolutionSnapshot> {
        match self.db.read_snapshot(self.key) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(key = self.key, error = %e, "ignoring unreadable resolution snapshot");
                None
            }
        }
    }
}
