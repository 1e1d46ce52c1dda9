//! CLI argument parsing using clap

use crate::config::Config;
use crate::error::{CacheError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect and reset the git history metadata cache
#[derive(Parser, Debug)]
#[command(name = "gitmeta-cache")]
#[command(version)]
#[command(about = "Inspect and reset the git history metadata cache", long_about = None)]
pub struct Cli {
    /// Directory inside the git repository
    #[arg(short = 'C', long = "repo", value_name = "DIR", default_value = ".")]
    pub repo: PathBuf,

    /// Cache directory (default: .gitmeta-cache in the repository root)
    #[arg(long = "cache-dir", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Warn when a snapshot grows beyond this many MiB
    #[arg(long = "size-warning-mb", value_name = "N", default_value = "64")]
    pub size_warning_mb: u64,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load the cache and report what it contains
    Status {
        /// Output in JSON format
        #[arg(long = "json")]
        json: bool,
    },
    /// Delete both cache snapshots
    Clear,
    /// Print the commit HEAD points at
    Head,
}

impl Cli {
    /// Parse command line arguments into a Config and the command to run
    pub fn into_config(self) -> Result<(Config, Command)> {
        if self.size_warning_mb == 0 {
            return Err(CacheError::InvalidConfig(
                "--size-warning-mb must be greater than 0".to_string(),
            ));
        }

        let json = matches!(self.command, Command::Status { json: true });
        let config = Config {
            repo_dir: self.repo,
            cache_dir: self.cache_dir,
            size_warning_bytes: self.size_warning_mb.saturating_mul(1024 * 1024),
            verbose: self.verbose,
            json,
        };
        Ok((config, self.command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["gitmeta-cache", "status"]);
        let (config, command) = cli.into_config().unwrap();

        assert_eq!(config.repo_dir, PathBuf::from("."));
        assert_eq!(config.cache_dir, None);
        assert_eq!(config.size_warning_bytes, 64 * 1024 * 1024);
        assert!(!config.verbose);
        assert!(!config.json);
        assert_eq!(command, Command::Status { json: false });
    }

    #[test]
    fn test_cli_status_json() {
        let cli = Cli::parse_from(["gitmeta-cache", "status", "--json"]);
        let (config, _) = cli.into_config().unwrap();
        assert!(config.json);
    }

    #[test]
    fn test_cli_all_options() {
        let cli = Cli::parse_from([
            "gitmeta-cache",
            "-C",
            "/work/repo",
            "--cache-dir",
            "/tmp/meta",
            "--size-warning-mb",
            "2",
            "-v",
            "clear",
        ]);
        let (config, command) = cli.into_config().unwrap();

        assert_eq!(config.repo_dir, PathBuf::from("/work/repo"));
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/meta")));
        assert_eq!(config.size_warning_bytes, 2 * 1024 * 1024);
        assert!(config.verbose);
        assert_eq!(command, Command::Clear);
    }

    #[test]
    fn test_cli_rejects_zero_size_warning() {
        let cli = Cli::parse_from(["gitmeta-cache", "--size-warning-mb", "0", "head"]);
        assert!(matches!(
            cli.into_config(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["gitmeta-cache"]).is_err());
    }
}
