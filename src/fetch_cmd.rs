//! `hnd fetch` and `hnd test` commands.
//!
//! Read a ranked feed and print the stories, without touching the
//! summarizer or the store. `test` is a connectivity check.

use anyhow::Result;

use crate::config::Config;
use crate::hn::{Feed, HnClient, StoryFetcher};

/// Run the fetch command: print the top of a ranked feed.
pub async fn run_fetch(config: &Config, feed: &str, num: usize) -> Result<()> {
    let feed: Feed = feed.parse()?;
    let client = HnClient::new(&config.fetch)?;
    let stories = client.fetch_ranked(feed, num).await?;

    for story in &stories {
        println!("[{:>4}] {}", story.score, story.title);
        println!("       {}", story.resolved_url());
        println!();
    }
    Ok(())
}

/// Run the test command: fetch a handful of top stories to verify that the
/// Hacker News API is reachable.
pub async fn run_test(config: &Config) -> Result<()> {
    println!("Testing HN API connection...");
    let client = HnClient::new(&config.fetch)?;
    let stories = client.fetch_ranked(Feed::Top, 5).await?;
    println!("Successfully fetched {} stories", stories.len());
    println!();
    println!("Top 5:");
    for story in &stories {
        println!("  - {} ({} points)", story.title, story.score);
    }
    Ok(())
}
