use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};

use crate::cli::CleanOptions;
use hashstamp::config::resolve_config;
use hashstamp::utils::format_size;

pub fn run(root: PathBuf, options: CleanOptions) -> Result<()> {
    let store_path = match options.store {
        Some(path) => path,
        None => {
            // Config and store are resolved from the root
            let config = resolve_config(options.config.as_deref(), &root)?;
            root.join(config.project.store)
        }
    };

    println!("{} Cleaning stamp store", style("🧹").blue().bold());

    if store_path.exists() {
        let store_size = dir_size(&store_path).unwrap_or(0);
        std::fs::remove_dir_all(&store_path)
            .with_context(|| format!("Failed to remove store: {}", store_path.display()))?;
        println!(
            "  {} Removed store: {} ({})",
            style("✓").green(),
            store_path.display(),
            format_size(store_size)
        );
    } else {
        println!(
            "  {} Store not found: {}",
            style("-").dim(),
            store_path.display()
        );
    }

    println!();
    println!("{} Clean complete!", style("✓").green().bold());

    Ok(())
}

fn dir_size(path: &Path) -> Result<u64> {
    let mut size = 0;

    if path.is_file() {
        return Ok(std::fs::metadata(path)?.len());
    }

    for entry in walkdir::WalkDir::new(path) {
        let entry = entry?;
        if entry.file_type().is_file() {
            size += entry.metadata()?.len();
        }
    }

    Ok(size)
}
