use anyhow::Result;
use console::style;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::HashArgs;
use hashstamp::hashing::{hash_file_with, Accumulator, HashOptions};
use hashstamp::utils::{format_hash, format_size};

#[derive(Serialize)]
struct HashReport {
    path: PathBuf,
    hash: String,
    size: u64,
}

pub fn run(files: Vec<PathBuf>, options: HashArgs) -> Result<()> {
    let mut hash_options = HashOptions::default();
    if let Some(chunk_size) = options.chunk_size {
        if chunk_size == 0 {
            anyhow::bail!("--chunk-size must be greater than zero");
        }
        hash_options.chunk_size = chunk_size;
    }

    let mut acc = Accumulator::new();
    let mut reports = Vec::with_capacity(files.len());

    for file in files {
        acc.reset();
        let hash = hash_file_with(&file, &mut acc, &hash_options)?;
        let size = std::fs::metadata(&file)?.len();
        reports.push(HashReport {
            path: file,
            hash: format_hash(hash),
            size,
        });
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!(
            "{}  {} {}",
            report.hash,
            report.path.display(),
            style(format!("({})", format_size(report.size))).dim()
        );
    }

    Ok(())
}
