use anyhow::{Context, Result};
use std::path::Path;

use super::{Config, CONFIG_FILE_NAME};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    tracing::debug!("Loaded config from {}", path.display());

    Ok(config)
}

/// Find and load configuration file.
/// Searches `start` and its parent directories for hashstamp.toml
pub fn find_and_load_config_from(start: &Path) -> Result<Option<Config>> {
    let config_names = [CONFIG_FILE_NAME, ".hashstamp.toml"];

    let mut current_dir = start.to_path_buf();

    loop {
        for name in &config_names {
            let config_path = current_dir.join(name);
            if config_path.exists() {
                let config = load_config(&config_path)?;
                return Ok(Some(config));
            }
        }

        if !current_dir.pop() {
            break;
        }
    }

    Ok(None)
}

/// Explicit config file if given, otherwise the nearest one above `start`,
/// otherwise defaults
pub fn resolve_config(explicit: Option<&Path>, start: &Path) -> Result<Config> {
    let config = match explicit {
        Some(path) => Some(load_config(path)?),
        None => find_and_load_config_from(start)?,
    };
    Ok(config.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_finds_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "[project]\nname = \"nested\"\n",
        )
        .unwrap();

        let config = find_and_load_config_from(&nested).unwrap().unwrap();
        assert_eq!(config.project.name, "nested");
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[hashing]\nchunk_size = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("chunk_size"));
    }
}
