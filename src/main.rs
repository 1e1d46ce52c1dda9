//! gitmeta-cache - inspect and reset the git history metadata cache

use clap::Parser;
use gitmeta_cache::cli::{Cli, Command};
use gitmeta_cache::report::StatusReport;
use gitmeta_cache::{CacheStore, Config, GitRepository, HeadSource};
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let cli = Cli::parse();

    // Convert to config
    let (config, command) = match cli.into_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    init_logging(config.verbose);

    match command {
        Command::Status { .. } => run_status(&config).await,
        Command::Clear => run_clear(&config).await,
        Command::Head => run_head(&config).await,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run_status(config: &Config) -> ExitCode {
    let repo = match GitRepository::discover(&config.repo_dir).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let mut store = CacheStore::from_config(config, repo.root());
    let storage = match store.load(repo).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_corruption() {
                eprintln!("Run 'gitmeta-cache clear' to discard the cache and rebuild it.");
            }
            return ExitCode::from(2);
        }
    };

    let repository_head = storage.repo.head_hash().await.ok();
    let report = StatusReport::new(
        store.cache_dir(),
        &storage,
        store.last_head(),
        repository_head,
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let written = if config.json {
        report.write_json(&mut out)
    } else {
        report.write_text(&mut out)
    };

    if let Err(e) = written.and_then(|()| out.flush()) {
        eprintln!("Error writing output: {}", e);
        return ExitCode::from(2);
    }
    ExitCode::SUCCESS
}

async fn run_clear(config: &Config) -> ExitCode {
    // Clearing works without a repository when the cache dir is explicit.
    let root = match GitRepository::discover(&config.repo_dir).await {
        Ok(repo) => repo.root().to_path_buf(),
        Err(_) => config.repo_dir.clone(),
    };

    let mut store = CacheStore::from_config(config, &root);
    store.clear().await;
    eprintln!("Cleared cache in '{}'", store.cache_dir().display());
    ExitCode::SUCCESS
}

async fn run_head(config: &Config) -> ExitCode {
    let repo = match GitRepository::discover(&config.repo_dir).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let hash = match repo.head_hash().await {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    // The date is informational; the hash alone is enough for scripts.
    match repo.head_time().await {
        Ok(time) => println!("{} {}", hash, time),
        Err(e) => {
            tracing::debug!("No commit date for {}: {}", hash, e);
            println!("{}", hash);
        }
    }
    ExitCode::SUCCESS
}
