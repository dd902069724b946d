use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::PathBuf;

use crate::cli::StatusOptions;
use hashstamp::config::resolve_config;
use hashstamp::stamps::{diff, ChangeSet, Scanner, StampStore};

pub fn run(root: PathBuf, options: StatusOptions) -> Result<()> {
    if !root.exists() {
        anyhow::bail!("Root directory does not exist: {}", root.display());
    }

    if !root.is_dir() {
        anyhow::bail!("Root path is not a directory: {}", root.display());
    }

    // Load configuration
    let config = resolve_config(options.config.as_deref(), &root)?;
    let policy = config.path_policy(options.portable);
    let scanner = Scanner::new(&root, &config, policy)?;

    tracing::debug!(
        "Tracking {} with {:?}, store at {}",
        scanner.root().display(),
        policy,
        scanner.store_dir().display()
    );

    let store = StampStore::load(scanner.store_dir(), policy)?;
    let files = scanner.collect();

    // Create progress bar
    let pb = if options.json {
        ProgressBar::with_draw_target(Some(files.len() as u64), ProgressDrawTarget::hidden())
    } else {
        ProgressBar::new(files.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    // Configure parallelism
    let num_jobs = options.jobs.unwrap_or_else(num_cpus::get).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_jobs)
        .build()?;

    let scanned = pool.install(|| scanner.scan(&files, &store, || pb.inc(1)));
    pb.finish_and_clear();

    let result = diff(&store, scanned, config.tracking.on_error)?;
    let changes = result.changes.clone();

    if options.update {
        let mut store = store;
        result.apply(&mut store);
        store.save(scanner.store_dir())?;
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
    } else {
        print_changes(&changes, files.len(), options.all);
        if options.update {
            println!(
                "  Stamps recorded: {}",
                style(scanner.store_dir().display()).cyan()
            );
        }
    }

    if options.check && changes.has_changes() {
        anyhow::bail!("{} tracked files changed", changes.changed_count());
    }

    Ok(())
}

fn print_changes(changes: &ChangeSet, tracked: usize, all: bool) {
    for path in &changes.added {
        println!("  {} {}", style("A").green().bold(), path);
    }
    for path in &changes.modified {
        println!("  {} {}", style("M").yellow().bold(), path);
    }
    for path in &changes.removed {
        println!("  {} {}", style("D").red().bold(), path);
    }
    if all {
        for path in &changes.unchanged {
            println!("  {} {}", style("=").dim(), style(path).dim());
        }
    }

    if !changes.failed.is_empty() {
        println!();
        println!("  Errors: {}", style(changes.failed.len()).red());
        for failed in changes.failed.iter().take(10) {
            println!("    {} {}: {}", style("✗").red(), failed.path, failed.error);
        }
        if changes.failed.len() > 10 {
            println!("    ... and {} more errors", changes.failed.len() - 10);
        }
    }

    println!();
    if changes.has_changes() {
        println!(
            "{} {} of {} tracked files changed",
            style("→").blue().bold(),
            style(changes.changed_count()).yellow(),
            tracked
        );
    } else {
        println!(
            "{} Up to date ({} tracked files)",
            style("✓").green().bold(),
            tracked
        );
    }
    if !changes.added.is_empty() {
        println!("  Added: {}", style(changes.added.len()).green());
    }
    if !changes.modified.is_empty() {
        println!("  Modified: {}", style(changes.modified.len()).yellow());
    }
    if !changes.removed.is_empty() {
        println!("  Removed: {}", style(changes.removed.len()).red());
    }
}
