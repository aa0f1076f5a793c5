// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! crosspost - republishes a Telegram channel to X.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod report;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// crosspost - republishes a Telegram channel to X.
#[derive(Parser, Debug)]
#[command(name = "crosspost", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bridge until interrupted (default).
    Serve,
    /// List recent entries from the error log.
    Errors {
        /// Look-back window in hours.
        #[arg(long)]
        hours: Option<u32>,
        /// Maximum number of entries to list.
        #[arg(long)]
        limit: Option<u32>,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Show per-day posting statistics.
    Stats {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => crosspost_config::load_and_validate_path(path),
        None => crosspost_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            crosspost_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(errors) = crosspost_config::validate_credentials(&config) {
                crosspost_config::render_errors(&errors);
                std::process::exit(1);
            }
            serve::run_serve(config).await
        }
        Commands::Errors {
            hours,
            limit,
            plain,
        } => report::run_errors(&config, hours, limit, plain).await,
        Commands::Stats { plain } => report::run_stats(&config, plain).await,
    };

    if let Err(e) = result {
        eprintln!("crosspost: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["crosspost"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn errors_accepts_hours_and_limit() {
        let cli =
            Cli::try_parse_from(["crosspost", "errors", "--hours", "6", "--limit", "5"]).unwrap();
        match cli.command {
            Some(Commands::Errors { hours, limit, plain }) => {
                assert_eq!(hours, Some(6));
                assert_eq!(limit, Some(5));
                assert!(!plain);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_works_after_subcommand() {
        let cli = Cli::try_parse_from(["crosspost", "stats", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }
}
