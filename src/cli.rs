use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "hashstamp",
    author = "esengine",
    version,
    about = "Content fingerprints for incremental build change detection",
    long_about = "hashstamp - tells an incremental build which source files really changed.\n\n\
                  Files are fingerprinted by content and size, never by timestamps alone,\n\
                  and compared against the stamps recorded by the previous build."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new hashstamp.toml configuration file
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Print the content fingerprint of files
    Hash {
        /// Files to fingerprint
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: HashArgs,
    },

    /// Print the fingerprint of normalized paths
    Path {
        /// Normalized absolute paths, hashed exactly as given
        #[arg(required = true)]
        paths: Vec<String>,

        #[command(flatten)]
        options: PathArgs,
    },

    /// Compare a directory against the recorded stamps
    Status {
        /// Root directory to track
        root: PathBuf,

        #[command(flatten)]
        options: StatusOptions,
    },

    /// Watch a directory and report content changes as they happen
    Watch {
        /// Directory to watch
        root: PathBuf,

        #[command(flatten)]
        options: WatchOptions,
    },

    /// Remove the stamp store
    Clean {
        /// Root directory whose store is removed
        #[arg(default_value = ".")]
        root: PathBuf,

        #[command(flatten)]
        options: CleanOptions,
    },
}

#[derive(Args, Clone)]
pub struct HashArgs {
    /// Read size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct PathArgs {
    /// Keep path case regardless of the filesystem
    #[arg(long, env = "HASHSTAMP_PORTABLE_CACHES")]
    pub portable: bool,

    /// Filesystem case sensitivity (default: platform convention)
    #[arg(long)]
    pub case_sensitive: Option<bool>,
}

#[derive(Args, Clone)]
pub struct StatusOptions {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Record the current stamps after comparing
    #[arg(short, long)]
    pub update: bool,

    /// Exit with an error when anything changed
    #[arg(long)]
    pub check: bool,

    /// Keep path case regardless of the filesystem
    #[arg(long, env = "HASHSTAMP_PORTABLE_CACHES")]
    pub portable: bool,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Print the change set as JSON
    #[arg(long)]
    pub json: bool,

    /// Also list unchanged files
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Clone)]
pub struct CleanOptions {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Store directory (default: from config, under the root)
    #[arg(short, long)]
    pub store: Option<PathBuf>,
}

#[derive(Args, Clone)]
pub struct WatchOptions {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Keep path case regardless of the filesystem
    #[arg(long, env = "HASHSTAMP_PORTABLE_CACHES")]
    pub portable: bool,

    /// Save the stamps seen during the session on exit
    #[arg(short, long)]
    pub update: bool,

    /// Debounce delay in milliseconds
    #[arg(long, default_value = "300")]
    pub debounce: u64,
}
