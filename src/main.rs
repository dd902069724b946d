mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "hashstamp=debug"
    } else if cli.quiet {
        "hashstamp=error"
    } else {
        "hashstamp=info"
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Init { force } => commands::init::run(force),
        Commands::Hash { files, options } => commands::hash::run(files, options),
        Commands::Path { paths, options } => commands::path::run(paths, options),
        Commands::Status { root, options } => commands::status::run(root, options),
        Commands::Watch { root, options } => commands::watch::run(root, options),
        Commands::Clean { root, options } => commands::clean::run(root, options),
    }
}
