use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;

use super::{FileStamp, ScanOutcome, ScannedFile, StampStore};
use crate::config::ErrorPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub path: String,
    pub error: String,
}

/// Files grouped by how they differ from the store
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: Vec<String>,
    /// Files that could not be hashed; also listed as added or modified
    pub failed: Vec<FailedFile>,
}

impl ChangeSet {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.modified.is_empty() || !self.removed.is_empty()
    }

    pub fn changed_count(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    fn sort(&mut self) {
        self.added.sort();
        self.modified.sort();
        self.removed.sort();
        self.unchanged.sort();
        self.failed.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

/// A change set plus the store edits that would record it
#[derive(Debug, Default)]
pub struct ScanDiff {
    pub changes: ChangeSet,
    fresh: Vec<(u64, FileStamp)>,
    dropped: Vec<u64>,
}

impl ScanDiff {
    /// Record the scan in `store`: new stamps are written, removed and
    /// unhashable files are forgotten
    pub fn apply(self, store: &mut StampStore) {
        for key in self.dropped {
            store.remove(key);
        }
        for (key, stamp) in self.fresh {
            store.record(key, stamp);
        }
    }
}

/// Compare a scan against the stored stamps.
///
/// Every stored key that was not scanned counts as removed. With
/// [`ErrorPolicy::Fail`] the first hashing failure is returned as the error.
pub fn diff(
    store: &StampStore,
    scanned: Vec<ScannedFile>,
    on_error: ErrorPolicy,
) -> Result<ScanDiff> {
    let mut result = ScanDiff::default();
    let mut seen = HashSet::with_capacity(scanned.len());

    for file in scanned {
        seen.insert(file.key);
        let previous = store.get(file.key);

        match file.outcome {
            ScanOutcome::Hashed(stamp) | ScanOutcome::Reused(stamp) => {
                match previous {
                    None => result.changes.added.push(file.path),
                    Some(prev) if prev.content_hash != stamp.content_hash => {
                        result.changes.modified.push(file.path)
                    }
                    Some(_) => result.changes.unchanged.push(file.path),
                }
                result.fresh.push((file.key, stamp));
            }
            ScanOutcome::Failed(err) => {
                if on_error == ErrorPolicy::Fail {
                    return Err(err.into());
                }
                match previous {
                    None => result.changes.added.push(file.path.clone()),
                    Some(_) => result.changes.modified.push(file.path.clone()),
                }
                result.changes.failed.push(FailedFile {
                    path: file.path,
                    error: err.to_string(),
                });
                result.dropped.push(file.key);
            }
        }
    }

    for (key, stamp) in &store.entries {
        if !seen.contains(key) {
            result.changes.removed.push(stamp.path.clone());
            result.dropped.push(*key);
        }
    }

    result.changes.sort();

    tracing::debug!(
        "Diff: {} added, {} modified, {} removed, {} unchanged",
        result.changes.added.len(),
        result.changes.modified.len(),
        result.changes.removed.len(),
        result.changes.unchanged.len()
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::{HashError, PathPolicy};
    use std::path::PathBuf;

    fn stamp(path: &str, content_hash: u64) -> FileStamp {
        FileStamp {
            path: path.to_string(),
            content_hash,
            length: 1,
            mtime: 1,
        }
    }

    fn hashed(key: u64, path: &str, content_hash: u64) -> ScannedFile {
        ScannedFile {
            key,
            path: path.to_string(),
            outcome: ScanOutcome::Hashed(stamp(path, content_hash)),
        }
    }

    fn failed(key: u64, path: &str) -> ScannedFile {
        ScannedFile {
            key,
            path: path.to_string(),
            outcome: ScanOutcome::Failed(HashError::Open {
                path: PathBuf::from(path),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            }),
        }
    }

    fn store_with(entries: &[(u64, &str, u64)]) -> StampStore {
        let mut store = StampStore::new(PathPolicy::new(false, true));
        for (key, path, hash) in entries {
            store.record(*key, stamp(path, *hash));
        }
        store
    }

    #[test]
    fn test_classifies_all_kinds() {
        let store = store_with(&[(1, "/a", 10), (2, "/b", 20), (3, "/c", 30)]);
        let scanned = vec![hashed(1, "/a", 10), hashed(2, "/b", 21), hashed(4, "/d", 40)];

        let result = diff(&store, scanned, ErrorPolicy::Changed).unwrap();
        let changes = &result.changes;

        assert_eq!(changes.unchanged, vec!["/a"]);
        assert_eq!(changes.modified, vec!["/b"]);
        assert_eq!(changes.removed, vec!["/c"]);
        assert_eq!(changes.added, vec!["/d"]);
        assert_eq!(changes.changed_count(), 3);
        assert!(changes.has_changes());
    }

    #[test]
    fn test_apply_updates_store() {
        let mut store = store_with(&[(1, "/a", 10), (3, "/c", 30)]);
        let scanned = vec![hashed(1, "/a", 11), hashed(2, "/b", 20)];

        diff(&store, scanned, ErrorPolicy::Changed)
            .unwrap()
            .apply(&mut store);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().content_hash, 11);
        assert_eq!(store.get(2).unwrap().content_hash, 20);
        assert!(store.get(3).is_none());
    }

    #[test]
    fn test_failure_counts_as_change_and_drops_stamp() {
        let mut store = store_with(&[(1, "/a", 10)]);
        let scanned = vec![failed(1, "/a"), failed(2, "/b")];

        let result = diff(&store, scanned, ErrorPolicy::Changed).unwrap();
        assert_eq!(result.changes.modified, vec!["/a"]);
        assert_eq!(result.changes.added, vec!["/b"]);
        assert_eq!(result.changes.failed.len(), 2);
        assert!(result.changes.failed[0].error.contains("denied"));

        result.apply(&mut store);
        assert!(store.is_empty());
    }

    #[test]
    fn test_failure_aborts_with_fail_policy() {
        let store = store_with(&[]);
        let err = diff(&store, vec![failed(1, "/a")], ErrorPolicy::Fail).unwrap_err();
        assert!(err.to_string().contains("/a"));
    }

    #[test]
    fn test_identical_scan_has_no_changes() {
        let store = store_with(&[(1, "/a", 10)]);
        let result = diff(&store, vec![hashed(1, "/a", 10)], ErrorPolicy::Changed).unwrap();
        assert!(!result.changes.has_changes());
    }
}
