use anyhow::{Context, Result};
use globset::GlobSet;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{FileStamp, StampStore};
use crate::config::Config;
use crate::hashing::{hash_file_with, Accumulator, HashError, HashOptions, PathPolicy};
use crate::utils::{mtime_millis, normalize_path};

/// Result of stamping one file
#[derive(Debug)]
pub enum ScanOutcome {
    /// Content was read and fingerprinted
    Hashed(FileStamp),
    /// Size and mtime matched the store, previous fingerprint kept
    Reused(FileStamp),
    /// The file could not be fingerprinted
    Failed(HashError),
}

#[derive(Debug)]
pub struct ScannedFile {
    pub key: u64,
    pub path: String,
    pub outcome: ScanOutcome,
}

impl ScannedFile {
    pub fn stamp(&self) -> Option<&FileStamp> {
        match &self.outcome {
            ScanOutcome::Hashed(stamp) | ScanOutcome::Reused(stamp) => Some(stamp),
            ScanOutcome::Failed(_) => None,
        }
    }
}

/// Finds tracked files under a root and stamps them
pub struct Scanner {
    root: PathBuf,
    store_dir: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    options: HashOptions,
    policy: PathPolicy,
    trust_mtime: bool,
}

impl Scanner {
    pub fn new(root: &Path, config: &Config, policy: PathPolicy) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve root: {}", root.display()))?;
        let store_dir = root.join(&config.project.store);

        Ok(Self {
            store_dir,
            include: config.tracking.include_set()?,
            exclude: config.tracking.exclude_set()?,
            options: config.hash_options(),
            policy,
            trust_mtime: config.tracking.trust_mtime,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    pub fn policy(&self) -> PathPolicy {
        self.policy
    }

    /// Whether `path` (absolute, under the root) is tracked
    pub fn is_tracked(&self, path: &Path) -> bool {
        if path.starts_with(&self.store_dir) {
            return false;
        }
        match path.strip_prefix(&self.root) {
            Ok(relative) => self.include.is_match(relative) && !self.exclude.is_match(relative),
            Err(_) => false,
        }
    }

    /// All tracked files, sorted by path. Symlinks are followed.
    pub fn collect(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.path() != self.store_dir)
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry: {}", err);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| self.is_tracked(p))
            .filter(|p| {
                if p.to_str().is_none() {
                    tracing::warn!("Skipping non UTF-8 path: {}", p.display());
                    return false;
                }
                true
            })
            .collect()
    }

    /// Normalized path and its fingerprint key, `None` for non UTF-8 paths
    pub fn key_for(&self, path: &Path) -> Option<(String, u64)> {
        let normalized = normalize_path(&self.root, path, self.policy.portable)?;
        let key = self.policy.fingerprint(&normalized);
        Some((normalized, key))
    }

    /// Stamp one file, consulting `store` only when mtimes are trusted.
    /// Returns `None` when the path has no UTF-8 form.
    pub fn stamp_file(&self, path: &Path, store: &StampStore) -> Option<ScannedFile> {
        let (normalized, key) = self.key_for(path)?;

        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(source) => {
                return Some(ScannedFile {
                    key,
                    path: normalized,
                    outcome: ScanOutcome::Failed(HashError::Open {
                        path: path.to_path_buf(),
                        source,
                    }),
                });
            }
        };
        let length = metadata.len();
        let mtime = mtime_millis(&metadata);

        if self.trust_mtime {
            if let Some(previous) = store.get(key) {
                if previous.length == length && previous.mtime == mtime {
                    let stamp = FileStamp {
                        path: normalized.clone(),
                        ..previous.clone()
                    };
                    return Some(ScannedFile {
                        key,
                        path: normalized,
                        outcome: ScanOutcome::Reused(stamp),
                    });
                }
            }
        }

        let mut acc = Accumulator::new();
        let outcome = match hash_file_with(path, &mut acc, &self.options) {
            Ok(content_hash) => ScanOutcome::Hashed(FileStamp {
                path: normalized.clone(),
                content_hash,
                length,
                mtime,
            }),
            Err(err) => {
                tracing::warn!("{}", err);
                ScanOutcome::Failed(err)
            }
        };

        Some(ScannedFile {
            key,
            path: normalized,
            outcome,
        })
    }

    /// Stamp `files` in parallel on the current rayon pool.
    /// `on_done` is called once per file.
    pub fn scan<F>(&self, files: &[PathBuf], store: &StampStore, on_done: F) -> Vec<ScannedFile>
    where
        F: Fn() + Sync + Send,
    {
        files
            .par_iter()
            .filter_map(|file| {
                let scanned = self.stamp_file(file, store);
                on_done();
                scanned
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join("target/debug")).unwrap();
        std::fs::create_dir_all(root.join(".hashstamp")).unwrap();
        std::fs::write(root.join("src/Main.java"), "class Main {}").unwrap();
        std::fs::write(root.join("src/Util.java"), "class Util {}").unwrap();
        std::fs::write(root.join("target/debug/out.bin"), "binary").unwrap();
        std::fs::write(root.join(".hashstamp/stamps.json.lz4"), "store").unwrap();
        temp_dir
    }

    fn scanner(root: &Path, config: &Config) -> Scanner {
        Scanner::new(root, config, PathPolicy::new(false, true)).unwrap()
    }

    #[test]
    fn test_collect_skips_excluded_and_store() {
        let temp_dir = setup();
        let scanner = scanner(temp_dir.path(), &Config::default());

        let files: Vec<String> = scanner
            .collect()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(files, vec!["Main.java", "Util.java"]);
    }

    #[test]
    fn test_include_patterns_limit_tracking() {
        let temp_dir = setup();
        std::fs::write(temp_dir.path().join("README.md"), "docs").unwrap();

        let mut config = Config::default();
        config.tracking.include = vec!["**/*.md".to_string()];
        let scanner = scanner(temp_dir.path(), &config);

        let files = scanner.collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("README.md"));
    }

    #[test]
    fn test_scan_hashes_every_file() {
        let temp_dir = setup();
        let scanner = scanner(temp_dir.path(), &Config::default());
        let store = StampStore::new(scanner.policy());

        let files = scanner.collect();
        let counter = std::sync::atomic::AtomicUsize::new(0);
        let scanned = scanner.scan(&files, &store, || {
            counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        });

        assert_eq!(scanned.len(), 2);
        assert_eq!(counter.into_inner(), 2);
        for file in &scanned {
            assert!(matches!(file.outcome, ScanOutcome::Hashed(_)));
            assert!(file.path.ends_with(".java"));
        }
    }

    #[test]
    fn test_trusted_mtime_reuses_stamp() {
        let temp_dir = setup();
        let mut config = Config::default();
        config.tracking.trust_mtime = true;
        let scanner = scanner(temp_dir.path(), &config);
        let file = scanner.root().join("src/Main.java");

        let mut store = StampStore::new(scanner.policy());
        let first = scanner.stamp_file(&file, &store).unwrap();
        let mut stamp = first.stamp().unwrap().clone();
        stamp.content_hash = 42;
        store.record(first.key, stamp);

        let second = scanner.stamp_file(&file, &store).unwrap();
        match second.outcome {
            ScanOutcome::Reused(stamp) => assert_eq!(stamp.content_hash, 42),
            other => panic!("expected reuse, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_fails() {
        let temp_dir = setup();
        let scanner = scanner(temp_dir.path(), &Config::default());
        let store = StampStore::new(scanner.policy());

        let scanned = scanner
            .stamp_file(&scanner.root().join("src/Gone.java"), &store)
            .unwrap();
        assert!(matches!(scanned.outcome, ScanOutcome::Failed(HashError::Open { .. })));
    }

    #[test]
    fn test_case_folding_merges_keys() {
        let temp_dir = setup();
        let config = Config::default();
        let policy = PathPolicy::new(false, false);
        let scanner = Scanner::new(temp_dir.path(), &config, policy).unwrap();
        let root = scanner.root();

        let (_, upper) = scanner.key_for(&root.join("src/MAIN.java")).unwrap();
        let (_, lower) = scanner.key_for(&root.join("src/main.java")).unwrap();
        assert_eq!(upper, lower);
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_name_keeps_its_own_key() {
        let temp_dir = setup();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("a")).unwrap();
        std::fs::write(root.join("a\\b"), "flat").unwrap();
        std::fs::write(root.join("a/b"), "nested").unwrap();

        let scanner = scanner(root, &Config::default());
        let store = StampStore::new(scanner.policy());
        let files = scanner.collect();
        let scanned = scanner.scan(&files, &store, || {});

        let mut keys: Vec<u64> = scanned.iter().map(|f| f.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 4);
        assert!(scanned.iter().any(|f| f.path.ends_with("/a\\b")));
        assert!(scanned.iter().any(|f| f.path.ends_with("/a/b")));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_is_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = setup();
        let bad = temp_dir.path().join(OsStr::from_bytes(b"src/bad\xff.java"));
        // Some filesystems reject invalid UTF-8 names outright
        if std::fs::write(&bad, "bad").is_err() {
            return;
        }

        let scanner = scanner(temp_dir.path(), &Config::default());
        let store = StampStore::new(scanner.policy());

        assert_eq!(scanner.collect().len(), 2);
        assert!(scanner.key_for(&bad).is_none());
        assert!(scanner.stamp_file(&bad, &store).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_is_collected() {
        let temp_dir = setup();
        let root = temp_dir.path();
        let target = root.join("src/Main.java");
        std::os::unix::fs::symlink(&target, root.join("src/Link.java")).unwrap();

        let scanner = scanner(root, &Config::default());
        let files: Vec<String> = scanner
            .collect()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(files, vec!["Link.java", "Main.java", "Util.java"]);
    }
}
