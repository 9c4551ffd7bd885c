//! # HN Digest CLI (`hnd`)
//!
//! The `hnd` binary is the primary interface for HN Digest. It provides
//! commands for fetching stories, one-shot digest generation, inspecting
//! the digest store, and starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! hnd --config ./hnd.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hnd fetch` | Print ranked stories from a feed (no summarization) |
//! | `hnd digest` | Generate and print a one-shot digest |
//! | `hnd test` | Check Hacker News API connectivity |
//! | `hnd serve` | Start the HTTP server |
//! | `hnd list` | List stored digest dates |
//! | `hnd show <date>` | Print the stored digest for a date |
//! | `hnd stats` | Show storage statistics |
//!
//! ## Examples
//!
//! ```bash
//! # Print the 10 highest-ranked top stories
//! hnd fetch -n 10
//!
//! # Read the Show HN feed instead
//! hnd fetch --feed show
//!
//! # Generate a digest as Markdown (requires ANTHROPIC_API_KEY)
//! hnd digest -n 10 --format md
//!
//! # Start the server on the configured bind address
//! hnd serve --config ./hnd.toml
//!
//! # Inspect what's stored
//! hnd list
//! hnd show 2024-06-01 --format telegram
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use hn_digest::{config, digest_cmd, fetch_cmd, server, store_cmd};

/// Top-level argument parser for the `hnd` binary.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file falls back to built-in defaults, so every command
/// works with zero setup.
#[derive(Parser)]
#[command(
    name = "hnd",
    about = "HN Digest — an AI-powered daily Hacker News digest in Chinese",
    version,
    long_about = "HN Digest fetches trending Hacker News stories, summarizes and classifies \
    them in Chinese with Claude, and serves the result as a daily digest via a CLI and an \
    HTTP API with Markdown, Telegram, and JSON renderings."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./hnd.toml`. Server, storage, fetch, and digest
    /// settings are read from this file; a missing file means defaults.
    #[arg(long, global = true, default_value = "./hnd.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Print ranked stories from a feed.
    ///
    /// Reads the ranked ID list, fetches each item, and prints titles,
    /// scores, and links. No summarization and no storage involved.
    Fetch {
        /// Number of stories to fetch.
        #[arg(short = 'n', long, default_value_t = 10)]
        num: usize,

        /// Feed to read: `top`, `best`, or `show`.
        #[arg(long, default_value = "top")]
        feed: String,
    },

    /// Generate and print a one-shot digest.
    ///
    /// Fetches the configured number of top stories, summarizes them in
    /// Chinese via the Anthropic API, and prints the digest to stdout.
    /// Requires `ANTHROPIC_API_KEY`. The digest is not stored.
    Digest {
        /// Maximum number of stories in the digest.
        #[arg(short = 'n', long, default_value_t = 10)]
        num: usize,

        /// Output format: `md`, `telegram`, or `json`.
        #[arg(short, long, default_value = "md")]
        format: String,
    },

    /// Check Hacker News API connectivity.
    ///
    /// Fetches a handful of top stories and prints them. Useful for
    /// verifying network access before running the server.
    Test,

    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind`, generates today's digest in the
    /// background, and serves the digest API. Requires `ANTHROPIC_API_KEY`.
    Serve,

    /// List stored digest dates, most recent first.
    List {
        /// Maximum number of dates to list.
        #[arg(long, default_value_t = 30)]
        limit: usize,
    },

    /// Print the stored digest for a date.
    Show {
        /// Digest date (YYYY-MM-DD).
        date: String,

        /// Output format: `md`, `telegram`, or `json`.
        #[arg(short, long, default_value = "md")]
        format: String,
    },

    /// Show storage statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hn_digest=info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Fetch { num, feed } => {
            fetch_cmd::run_fetch(&cfg, &feed, num).await?;
        }
        Commands::Digest { num, format } => {
            digest_cmd::run_digest(&cfg, num, &format).await?;
        }
        Commands::Test => {
            fetch_cmd::run_test(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::List { limit } => {
            store_cmd::run_list(&cfg, limit).await?;
        }
        Commands::Show { date, format } => {
            store_cmd::run_show(&cfg, &date, &format).await?;
        }
        Commands::Stats => {
            store_cmd::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
