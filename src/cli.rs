use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repostat")]
#[command(author, version, about = "Enrich bookmarked GitHub repositories with live metadata")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the SQLite database (overrides REPOSTAT_DB and the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch GitHub metadata for stored repositories
    Enrich {
        /// Maximum repositories to process in this batch
        #[arg(short, long)]
        limit: Option<usize>,

        /// Re-enrich repositories that already succeeded
        #[arg(long)]
        force: bool,

        /// Number of concurrent workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// GitHub token (overrides GITHUB_TOKEN and the config file)
        #[arg(long)]
        token: Option<String>,
    },

    /// Add repositories to the database as pending
    Add {
        /// Repositories in owner/name form
        #[arg(required = true)]
        repos: Vec<String>,
    },

    /// Show how many repositories are in each enrichment state
    Status,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
