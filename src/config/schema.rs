use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::hashing::{
    host_is_case_sensitive, HashOptions, PathPolicy, ShortReadPolicy, DEFAULT_CHUNK_SIZE,
};

pub const CONFIG_FILE_NAME: &str = "hashstamp.toml";

/// Root configuration structure for hashstamp.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Project metadata
    #[serde(default)]
    pub project: ProjectConfig,

    /// Fingerprint settings
    #[serde(default)]
    pub hashing: HashingConfig,

    /// Which files are tracked and how changes are decided
    #[serde(default)]
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    #[serde(default = "default_project_name")]
    pub name: String,

    /// Stamp store directory, relative to the tracked root
    #[serde(default = "default_store_dir")]
    pub store: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            store: default_store_dir(),
        }
    }
}

fn default_project_name() -> String {
    "my-project".to_string()
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".hashstamp")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashingConfig {
    /// Keep path case so stores can move between machines
    #[serde(default)]
    pub portable_caches: bool,

    /// Filesystem case sensitivity (default: platform convention)
    #[serde(default)]
    pub case_sensitive: Option<bool>,

    /// Read size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Behaviour when a file ends before its recorded size
    #[serde(default)]
    pub short_read: ShortReadPolicy,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            portable_caches: false,
            case_sensitive: None,
            chunk_size: default_chunk_size(),
            short_read: ShortReadPolicy::default(),
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

/// How a file that cannot be hashed is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Report the file as changed
    #[default]
    Changed,
    /// Abort the command
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Glob patterns of tracked files, relative to the root
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Glob patterns excluded from tracking
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Skip hashing when size and modification time are unchanged
    #[serde(default)]
    pub trust_mtime: bool,

    /// What to do with files that fail to hash
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            trust_mtime: false,
            on_error: ErrorPolicy::default(),
        }
    }
}

fn default_include() -> Vec<String> {
    vec!["**/*".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec![
        ".git/**".to_string(),
        "target/**".to_string(),
        "build/**".to_string(),
    ]
}

impl Config {
    /// Reject settings that would make hashing meaningless
    pub fn validate(&self) -> Result<()> {
        if self.hashing.chunk_size == 0 {
            anyhow::bail!("hashing.chunk_size must be greater than zero");
        }
        self.tracking.include_set()?;
        self.tracking.exclude_set()?;
        Ok(())
    }

    pub fn hash_options(&self) -> HashOptions {
        HashOptions {
            chunk_size: self.hashing.chunk_size,
            short_read: self.hashing.short_read,
        }
    }

    /// Path policy, with `portable` forcing portable caches on
    pub fn path_policy(&self, portable: bool) -> PathPolicy {
        PathPolicy::new(
            portable || self.hashing.portable_caches,
            self.hashing
                .case_sensitive
                .unwrap_or_else(host_is_case_sensitive),
        )
    }

    /// Generate default TOML content
    pub fn default_toml() -> String {
        r#"[project]
name = "my-project"
store = ".hashstamp"

[hashing]
# Keep path case in the store so it can be shared between machines
portable_caches = false
# Filesystem case sensitivity; defaults to the platform convention
# case_sensitive = true
chunk_size = 262144
# "fail" or "truncate" when a file shrinks while being hashed
short_read = "fail"

[tracking]
include = ["**/*"]
exclude = [".git/**", "target/**", "build/**"]
trust_mtime = false
# "changed" or "fail" when a file cannot be hashed
on_error = "changed"
"#
        .to_string()
    }
}

impl TrackingConfig {
    pub fn include_set(&self) -> Result<GlobSet> {
        build_glob_set(&self.include)
    }

    pub fn exclude_set(&self) -> Result<GlobSet> {
        build_glob_set(&self.exclude)
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?;
        builder.add(glob);
    }
    builder.build().context("Failed to build glob set")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_toml_matches_defaults() {
        let parsed: Config = toml::from_str(&Config::default_toml()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
[hashing]
portable_caches = true
short_read = "truncate"
"#,
        )
        .unwrap();

        assert!(parsed.hashing.portable_caches);
        assert_eq!(parsed.hashing.short_read, ShortReadPolicy::Truncate);
        assert_eq!(parsed.hashing.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(parsed.tracking, TrackingConfig::default());
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let mut config = Config::default();
        config.hashing.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_glob_is_rejected() {
        let mut config = Config::default();
        config.tracking.exclude.push("src/[".to_string());
        let err = config.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("src/["));
    }

    #[test]
    fn test_path_policy_overrides() {
        let mut config = Config::default();
        config.hashing.case_sensitive = Some(false);

        assert!(config.path_policy(false).folds_case());
        assert!(!config.path_policy(true).folds_case());

        config.hashing.portable_caches = true;
        assert!(config.path_policy(false).portable);
    }
}
