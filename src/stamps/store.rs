use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::hashing::PathPolicy;

/// Recorded state of one tracked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStamp {
    /// Normalized path the key was computed from
    pub path: String,
    /// Fingerprint of the file content and length
    pub content_hash: u64,
    /// File size in bytes
    pub length: u64,
    /// Modification time (Unix epoch milliseconds)
    pub mtime: u64,
}

/// Persisted fingerprints from the last recorded build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampStore {
    /// Store version for invalidation on format changes
    pub version: u32,
    /// Path policy the keys were computed with
    pub portable: bool,
    pub case_sensitive_fs: bool,
    /// Stamps keyed by path fingerprint
    pub entries: BTreeMap<u64, FileStamp>,
}

const STORE_VERSION: u32 = 1;
pub const STORE_FILE_NAME: &str = "stamps.json.lz4";

impl StampStore {
    /// Create a new empty store
    pub fn new(policy: PathPolicy) -> Self {
        Self {
            version: STORE_VERSION,
            portable: policy.portable,
            case_sensitive_fs: policy.case_sensitive_fs,
            entries: BTreeMap::new(),
        }
    }

    /// Load the store from `store_dir`.
    ///
    /// A missing store, an older format or one written under a different path
    /// policy all yield an empty store, since none of its keys could be trusted.
    pub fn load(store_dir: &Path, policy: PathPolicy) -> Result<Self> {
        let store_file = store_dir.join(STORE_FILE_NAME);

        if !store_file.exists() {
            tracing::debug!("No stamp store at {}", store_file.display());
            return Ok(Self::new(policy));
        }

        let compressed = std::fs::read(&store_file)
            .with_context(|| format!("Failed to read stamp store: {}", store_file.display()))?;

        let content = lz4_flex::decompress_size_prepended(&compressed).with_context(|| {
            format!("Failed to decompress stamp store: {}", store_file.display())
        })?;

        let store: StampStore = serde_json::from_slice(&content)
            .with_context(|| format!("Failed to parse stamp store: {}", store_file.display()))?;

        if store.version != STORE_VERSION {
            tracing::info!("Stamp store version mismatch, starting from an empty store");
            return Ok(Self::new(policy));
        }

        if store.policy() != policy {
            tracing::info!(
                "Stamp store policy {:?} differs from {:?}, starting from an empty store",
                store.policy(),
                policy
            );
            return Ok(Self::new(policy));
        }

        tracing::debug!("Loaded {} stamps from {}", store.len(), store_file.display());

        Ok(store)
    }

    /// Save the store to `store_dir`
    pub fn save(&self, store_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(store_dir).with_context(|| {
            format!("Failed to create store directory: {}", store_dir.display())
        })?;

        let store_file = store_dir.join(STORE_FILE_NAME);
        let temp_file = store_dir.join(format!("{}.tmp", STORE_FILE_NAME));

        let content = serde_json::to_vec(self)?;
        let compressed = lz4_flex::compress_prepend_size(&content);

        std::fs::write(&temp_file, compressed)
            .with_context(|| format!("Failed to write stamp store: {}", temp_file.display()))?;
        std::fs::rename(&temp_file, &store_file)
            .with_context(|| format!("Failed to replace stamp store: {}", store_file.display()))?;

        tracing::debug!("Saved {} stamps to {}", self.len(), store_file.display());

        Ok(())
    }

    pub fn policy(&self) -> PathPolicy {
        PathPolicy::new(self.portable, self.case_sensitive_fs)
    }

    pub fn get(&self, key: u64) -> Option<&FileStamp> {
        self.entries.get(&key)
    }

    /// Record a stamp, returning the one it replaced
    pub fn record(&mut self, key: u64, stamp: FileStamp) -> Option<FileStamp> {
        self.entries.insert(key, stamp)
    }

    pub fn remove(&mut self, key: u64) -> Option<FileStamp> {
        self.entries.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
