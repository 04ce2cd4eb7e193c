//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod init;
mod inspect;
mod scrape;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "part335")]
#[command(about = "Harvests FDIC Part 335 insider-trading disclosures")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing part335.db or a .db file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Database URL (overrides target and config file)
    #[arg(long, global = true, env = "PART335_DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory, config file and database
    Init,

    /// Harvest the roster, institution listings and new disclosure pages
    Scrape {
        /// Only fetch the listing of this institution certificate number
        #[arg(long)]
        cert: Option<i64>,
        /// Limit number of detail pages to fetch (0 = unlimited)
        #[arg(short, long, default_value = "0")]
        limit: usize,
        /// Number of detail pages fetched concurrently (default: from config)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Fetch one disclosure page and print its sections (nothing is stored)
    Inspect {
        /// Detail page URL
        #[arg(required_unless_present = "disclosure")]
        url: Option<String>,
        /// Institution certificate number, used with --disclosure
        #[arg(long, requires = "disclosure")]
        cert: Option<i64>,
        /// Disclosure id to compose the detail URL from
        #[arg(long, conflicts_with = "url")]
        disclosure: Option<i64>,
        /// Print extracted records as JSON instead of sections
        #[arg(long)]
        json: bool,
    },

    /// Show row counts per table
    Status,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        target: cli.target,
        database_url: cli.database_url,
    };
    let (settings, config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings, &config).await,
        Commands::Scrape {
            cert,
            limit,
            workers,
        } => {
            let limit = if limit > 0 { Some(limit) } else { None };
            scrape::cmd_scrape(&settings, cert, limit, workers).await
        }
        Commands::Inspect {
            url,
            cert,
            disclosure,
            json,
        } => {
            let url = match (url, disclosure) {
                (Some(url), _) => url,
                (None, Some(disclosure)) => crate::scrapers::compose_detail_url(
                    &settings.detail_url_template,
                    cert.unwrap_or_default(),
                    disclosure,
                ),
                (None, None) => anyhow::bail!("Either a URL or --disclosure is required"),
            };
            inspect::cmd_inspect(&settings, &url, json).await
        }
        Commands::Status => status::cmd_status(&settings).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scrape() {
        let cli = Cli::try_parse_from(["part335", "scrape", "--cert", "12345", "-l", "5"]).unwrap();
        match cli.command {
            Commands::Scrape {
                cert,
                limit,
                workers,
            } => {
                assert_eq!(cert, Some(12345));
                assert_eq!(limit, 5);
                assert_eq!(workers, None);
            }
            _ => panic!("expected scrape"),
        }
    }

    #[test]
    fn test_parse_inspect_requires_target() {
        assert!(Cli::try_parse_from(["part335", "inspect"]).is_err());
        assert!(Cli::try_parse_from(["part335", "inspect", "--disclosure", "9"]).is_ok());
        assert!(Cli::try_parse_from(["part335", "inspect", "--cert", "1"]).is_err());
    }
}
