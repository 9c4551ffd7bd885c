//! Digest orchestration.
//!
//! [`DigestService`] ties the fetcher, the builder, and the store together:
//! it serves stored digests when they exist and runs the full
//! fetch-summarize-save pipeline when they do not. Generation for a given
//! date is mutually exclusive, so concurrent requests for a missing digest
//! produce exactly one pipeline run.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::Config;
use crate::hn::{Feed, HnClient, StoryFetcher};
use crate::models::DailyDigest;
use crate::store::{create_store, DigestStore, StoreStats};
use crate::summarizer::{AnthropicClient, DigestBuilder};

pub struct DigestService {
    fetcher: Arc<dyn StoryFetcher>,
    builder: DigestBuilder,
    store: Arc<dyn DigestStore>,
    fetch_limit: usize,
    max_stories: usize,
    /// One lock per date; the map itself is never pruned.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DigestService {
    pub fn new(
        fetcher: Arc<dyn StoryFetcher>,
        builder: DigestBuilder,
        store: Arc<dyn DigestStore>,
        fetch_limit: usize,
        max_stories: usize,
    ) -> Self {
        Self {
            fetcher,
            builder,
            store,
            fetch_limit,
            max_stories,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wire up the real pipeline from configuration: HN fetcher, Anthropic
    /// summarizer (requires `ANTHROPIC_API_KEY`), and the configured store.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = Arc::new(HnClient::new(&config.fetch)?);
        let completion = Arc::new(AnthropicClient::new(&config.digest, None)?);
        let store = create_store(&config.storage)?;
        Ok(Self::new(
            fetcher,
            DigestBuilder::new(completion),
            store,
            config.fetch.limit,
            config.digest.max_stories,
        ))
    }

    /// Today's date by the local clock; digests are keyed by it.
    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Return the digest for `date`, generating and storing it first if
    /// absent. Only today's digest can be generated; other missing dates
    /// are an error. With `force`, the pipeline always runs and the stored
    /// record is replaced.
    pub async fn get_or_generate(&self, date: NaiveDate, force: bool) -> Result<DailyDigest> {
        let key = date.to_string();
        if !force {
            if let Some(digest) = self.store.load(&key).await? {
                debug!("Serving stored digest for {}", key);
                return Ok(digest);
            }
        }
        if date != Self::today() {
            bail!("No digest stored for {}", key);
        }

        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(key.clone()).or_default().clone()
        };
        let _guard = lock.lock().await;

        // Another caller may have generated the digest while we waited.
        if !force {
            if let Some(digest) = self.store.load(&key).await? {
                debug!("Digest for {} appeared while waiting", key);
                return Ok(digest);
            }
        }

        info!("Fetching top stories");
        let stories = self.fetcher.fetch_ranked(Feed::Top, self.fetch_limit).await?;
        if stories.is_empty() {
            bail!("Failed to fetch stories");
        }
        info!("Got {} stories, generating digest", stories.len());
        let digest = self.builder.build_digest(stories, self.max_stories).await?;
        self.store.save(&digest).await?;
        info!("Digest saved for {}", digest.date);
        Ok(digest)
    }

    /// Load the digest stored for an ISO date, if any. Never generates.
    pub async fn lookup(&self, date: &str) -> Result<Option<DailyDigest>> {
        self.store.load(date).await
    }

    /// Stored digest dates, most recent first.
    pub async fn list_dates(&self, limit: usize) -> Result<Vec<String>> {
        self.store.list_dates(limit).await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.stats().await
    }
}
