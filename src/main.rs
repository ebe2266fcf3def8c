mod cli;

use repostat::config::{self, Config};
use repostat::enrich::{EnrichError, Enricher, SqliteRepoStore};
use repostat::metadata::GithubProvider;
use repostat::reporter::TracingReporter;
use repostat_common::RepoId;
use repostat_db::models::ExtractedRepo;
use repostat_db::pool::{get_conn, init_pool, DbPool};
use repostat_db::queries::repos;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn open_database(db_override: Option<&Path>, config: &Config) -> Result<DbPool> {
    let db_path =
        config::resolve_db_path(db_override, std::env::var(config::DB_PATH_ENV).ok(), config);

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
    }

    tracing::debug!("Opening database at {:?}", db_path);
    let pool = init_pool(&db_path.to_string_lossy())
        .with_context(|| format!("Failed to open database: {:?}", db_path))?;
    Ok(pool)
}

struct EnrichArgs {
    limit: Option<usize>,
    force: bool,
    workers: Option<usize>,
    token: Option<String>,
}

async fn enrich(args: EnrichArgs, config_path: Option<&Path>, db: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_database(db, &config)?;

    let token = config::resolve_token(
        args.token.as_deref(),
        std::env::var(config::TOKEN_ENV).ok(),
        &config,
    );
    if token.is_empty() {
        tracing::warn!("No GitHub token configured; unauthenticated requests are heavily rate limited");
    }

    let provider = GithubProvider::from_config(&config.github, &token)
        .context("Failed to build GitHub client")?;
    let enricher = Enricher::new(
        Arc::new(SqliteRepoStore::new(pool)),
        Arc::new(provider),
    );

    let mut options = config.enrich.batch_options(args.force);
    if let Some(limit) = args.limit {
        options.limit = limit;
    }
    if let Some(workers) = args.workers {
        options.workers = workers;
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight repositories");
            interrupt.cancel();
        }
    });

    let reporter = Arc::new(TracingReporter::new());
    match enricher.enrich_batch(&options, reporter, &cancel).await {
        Ok(summary) if summary.total == 0 => {
            println!("No repositories need enrichment");
            Ok(())
        }
        Ok(summary) => {
            println!("Enrichment complete: {summary}");
            Ok(())
        }
        Err(EnrichError::RateLimitExceeded { summary }) => {
            println!("Stopped early: {summary}");
            anyhow::bail!("GitHub rate limit exceeded; run again once the quota resets")
        }
        Err(EnrichError::Cancelled { summary }) => {
            println!("Interrupted: {summary}");
            anyhow::bail!("Enrichment cancelled")
        }
        Err(e) => Err(e.into()),
    }
}

fn add_repos(ids: &[String], config_path: Option<&Path>, db: Option<&Path>) -> Result<()> {
    let parsed = ids
        .iter()
        .map(|raw| raw.parse::<RepoId>().with_context(|| format!("Invalid repository: {raw}")))
        .collect::<Result<Vec<_>>>()?;

    let config = config::load_config_or_default(config_path)?;
    let pool = open_database(db, &config)?;
    let conn = get_conn(&pool)?;

    let mut added = 0;
    for id in &parsed {
        let repo = ExtractedRepo::new(id.to_string(), format!("https://github.com/{id}"));
        if repos::insert_repo(&conn, &repo)? {
            added += 1;
        } else {
            tracing::debug!(repo_id = %id, "Repository already stored");
        }
    }

    println!(
        "Added {} repositories ({} already present)",
        added,
        parsed.len() - added
    );
    Ok(())
}

fn show_status(config_path: Option<&Path>, db: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pool = open_database(db, &config)?;
    let conn = get_conn(&pool)?;

    let counts = repos::count_by_status(&conn)?;
    let total: i64 = counts.iter().map(|(_, n)| n).sum();
    for (status, count) in counts {
        println!("{:<10} {}", status.as_str(), count);
    }
    println!("{:<10} {}", "TOTAL", total);
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            print_config(&Config::default());
        }
    }

    Ok(())
}

fn print_config(config: &Config) {
    println!("  GitHub API: {}", config.github.base_url);
    println!(
        "  Token configured: {}",
        config.github.token.as_deref().is_some_and(|t| !t.is_empty())
    );
    println!(
        "  Retries: {} attempts, {}ms initial backoff",
        config.github.max_attempts, config.github.initial_backoff_ms
    );
    println!(
        "  Halt on throttle exhaustion: {}",
        config.github.halt_on_throttle_exhaustion
    );
    println!(
        "  Batch: {} repositories, {} workers",
        config.enrich.limit, config.enrich.workers
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "repostat=trace,repostat_db=debug,repostat_common=debug".to_string()
        } else {
            "repostat=info,repostat_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Enrich {
            limit,
            force,
            workers,
            token,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            let args = EnrichArgs {
                limit,
                force,
                workers,
                token,
            };
            rt.block_on(enrich(args, cli.config.as_deref(), cli.db.as_deref()))
        }
        Commands::Add { repos } => add_repos(&repos, cli.config.as_deref(), cli.db.as_deref()),
        Commands::Status => show_status(cli.config.as_deref(), cli.db.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("repostat {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
