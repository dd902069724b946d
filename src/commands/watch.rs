use anyhow::Result;
use console::style;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::cli::WatchOptions;
use hashstamp::config::resolve_config;
use hashstamp::stamps::{ScanOutcome, Scanner, StampStore};
use hashstamp::utils::format_hash;

/// Watch statistics
struct WatchStats {
    changed: u64,
    untouched: u64,
    errors: u64,
    start_time: Instant,
}

impl WatchStats {
    fn new() -> Self {
        Self {
            changed: 0,
            untouched: 0,
            errors: 0,
            start_time: Instant::now(),
        }
    }

    fn print_summary(&self) {
        let elapsed = self.start_time.elapsed();
        println!();
        println!("{} Watch session summary:", style("📊").blue().bold());
        println!("  Duration: {:.1}s", elapsed.as_secs_f64());
        println!("  Content changes: {}", style(self.changed).green());
        if self.untouched > 0 {
            println!("  Touched without changes: {}", style(self.untouched).dim());
        }
        if self.errors > 0 {
            println!("  Errors: {}", style(self.errors).red());
        }
    }
}

/// Trailing-edge debouncer: a path is handled once its events have been
/// quiet for the whole window, so the last write of a burst always wins.
struct Debouncer {
    pending: HashMap<PathBuf, Instant>,
    window: Duration,
}

impl Debouncer {
    fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            window: Duration::from_millis(debounce_ms),
        }
    }

    /// Record an event for `path`, restarting its quiet period
    fn note(&mut self, path: PathBuf, now: Instant) {
        self.pending.insert(path, now);
    }

    /// Take the paths whose last event is at least one window old
    fn due(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, last)| now.duration_since(**last) >= self.window)
            .map(|(path, _)| path.clone())
            .collect();
        ready.sort();

        for path in &ready {
            self.pending.remove(path);
        }
        ready
    }

    /// Take every pending path regardless of age
    fn drain(&mut self) -> Vec<PathBuf> {
        let mut all: Vec<PathBuf> = self.pending.drain().map(|(path, _)| path).collect();
        all.sort();
        all
    }

    /// How often the event loop should look for due paths
    fn tick(&self) -> Duration {
        self.window.clamp(Duration::from_millis(50), Duration::from_millis(500))
    }
}

/// What a single filesystem event meant for a tracked file
#[derive(Debug, PartialEq, Eq)]
enum Change {
    Added(u64),
    Modified { before: u64, after: u64 },
    Removed,
    Untouched,
}

/// Re-stamp `path` and fold the result into `store`
fn observe(scanner: &Scanner, store: &mut StampStore, path: &Path) -> Result<Change> {
    let Some((_, key)) = scanner.key_for(path) else {
        anyhow::bail!("Path is not valid UTF-8");
    };

    if !path.exists() {
        return Ok(match store.remove(key) {
            Some(_) => Change::Removed,
            None => Change::Untouched,
        });
    }

    let Some(scanned) = scanner.stamp_file(path, store) else {
        anyhow::bail!("Path is not valid UTF-8");
    };
    let stamp = match scanned.outcome {
        ScanOutcome::Hashed(stamp) | ScanOutcome::Reused(stamp) => stamp,
        ScanOutcome::Failed(err) => {
            store.remove(key);
            return Err(err.into());
        }
    };

    let after = stamp.content_hash;
    Ok(match store.record(key, stamp) {
        None => Change::Added(after),
        Some(previous) if previous.content_hash != after => Change::Modified {
            before: previous.content_hash,
            after,
        },
        Some(_) => Change::Untouched,
    })
}

pub fn run(root: PathBuf, options: WatchOptions) -> Result<()> {
    if !root.exists() {
        anyhow::bail!("Watch directory does not exist: {}", root.display());
    }

    if !root.is_dir() {
        anyhow::bail!("Watch path is not a directory: {}", root.display());
    }

    // Load configuration
    let config = resolve_config(options.config.as_deref(), &root)?;
    let policy = config.path_policy(options.portable);
    let scanner = Scanner::new(&root, &config, policy)?;

    // Seed the baseline so the first edit of each file is compared properly
    let mut store = StampStore::load(scanner.store_dir(), policy)?;
    for file in scanner.collect() {
        let Some((_, key)) = scanner.key_for(&file) else {
            continue;
        };
        if store.get(key).is_some() {
            continue;
        }
        if let Some(scanned) = scanner.stamp_file(&file, &store) {
            if let Some(stamp) = scanned.stamp().cloned() {
                store.record(key, stamp);
            }
        }
    }

    println!("{} Watch mode started", style("👁").blue().bold());
    println!("  Watching: {}", style(scanner.root().display()).cyan());
    println!("  Tracked files: {}", store.len());
    println!("  Debounce: {}ms", options.debounce);
    println!();
    println!("  Press {} to stop", style("Ctrl+C").yellow());
    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!();

    // Create a channel to receive the events
    let (tx, rx) = channel();

    let watcher_config = Config::default().with_poll_interval(Duration::from_millis(100));
    let mut watcher = RecommendedWatcher::new(tx, watcher_config)?;
    watcher.watch(scanner.root(), RecursiveMode::Recursive)?;

    let mut debouncer = Debouncer::new(options.debounce);
    let mut stats = WatchStats::new();
    let tick = debouncer.tick();

    // Set up Ctrl+C handler
    let running = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, std::sync::atomic::Ordering::SeqCst);
    })
    .ok(); // Ignore if already set

    while running.load(std::sync::atomic::Ordering::SeqCst) {
        // Use recv_timeout to allow checking the running flag
        match rx.recv_timeout(tick) {
            Ok(Ok(event)) => {
                queue_event(&event, &scanner, &mut debouncer, Instant::now());
            }
            Ok(Err(e)) => {
                tracing::warn!("Watch error: {}", e);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                eprintln!("{} Watcher disconnected", style("✗").red());
                break;
            }
        }

        let due = debouncer.due(Instant::now());
        flush(&due, &scanner, &mut store, &mut stats);
    }

    // Settle whatever was still inside its window
    let remaining = debouncer.drain();
    flush(&remaining, &scanner, &mut store, &mut stats);

    stats.print_summary();

    if options.update {
        store.save(scanner.store_dir())?;
        println!(
            "  Stamps recorded: {}",
            style(scanner.store_dir().display()).cyan()
        );
    }

    Ok(())
}

/// Queue the tracked paths touched by `event`
fn queue_event(event: &Event, scanner: &Scanner, debouncer: &mut Debouncer, now: Instant) {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
        _ => return,
    }

    for path in &event.paths {
        if path.is_dir() || !scanner.is_tracked(path) {
            continue;
        }
        debouncer.note(path.clone(), now);
    }
}

/// Re-stamp settled paths and report what changed
fn flush(paths: &[PathBuf], scanner: &Scanner, store: &mut StampStore, stats: &mut WatchStats) {
    for path in paths {
        let relative = path.strip_prefix(scanner.root()).unwrap_or(path);

        match observe(scanner, store, path) {
            Ok(Change::Added(hash)) => {
                stats.changed += 1;
                println!(
                    "  {} {} {}",
                    style("A").green().bold(),
                    relative.display(),
                    style(format_hash(hash)).dim()
                );
            }
            Ok(Change::Modified { before, after }) => {
                stats.changed += 1;
                println!(
                    "  {} {} {} → {}",
                    style("M").yellow().bold(),
                    relative.display(),
                    style(format_hash(before)).dim(),
                    style(format_hash(after)).dim()
                );
            }
            Ok(Change::Removed) => {
                stats.changed += 1;
                println!("  {} {}", style("D").red().bold(), relative.display());
            }
            Ok(Change::Untouched) => {
                stats.untouched += 1;
                tracing::debug!("{} touched, content unchanged", relative.display());
            }
            Err(e) => {
                stats.errors += 1;
                eprintln!("  {} {}: {:#}", style("✗").red(), relative.display(), e);
            }
        }
    }
}
