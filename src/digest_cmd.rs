//! `hnd digest` command: one-shot digest generation.
//!
//! Fetches the configured number of top stories, summarizes them, and
//! prints the digest to stdout in the requested format. Progress goes to
//! stderr so the output stays pipeable. Nothing is written to the store;
//! use the server (or `POST /digest/refresh`) for persisted digests.

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::config::Config;
use crate::hn::{Feed, HnClient, StoryFetcher};
use crate::render::{format_digest_markdown, format_digest_telegram, DigestView};
use crate::summarizer::{AnthropicClient, DigestBuilder};

/// Run the digest command.
pub async fn run_digest(config: &Config, num: usize, format: &str) -> Result<()> {
    eprintln!("Fetching stories...");
    let client = HnClient::new(&config.fetch)?;
    let stories = client.fetch_ranked(Feed::Top, config.fetch.limit).await?;
    if stories.is_empty() {
        bail!("Failed to fetch stories");
    }
    eprintln!("Got {} stories", stories.len());

    eprintln!("Generating digest...");
    let completion = Arc::new(AnthropicClient::new(&config.digest, None)?);
    let builder = DigestBuilder::new(completion);
    let digest = builder.build_digest(stories, num).await?;
    eprintln!("Generated digest with {} stories", digest.stories.len());

    match format {
        "md" | "markdown" => println!("{}", format_digest_markdown(&digest)),
        "telegram" => println!("{}", format_digest_telegram(&digest)),
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&DigestView::from(&digest))?
        ),
        other => bail!("Unknown format: '{}'. Must be md, telegram, or json.", other),
    }
    Ok(())
}
