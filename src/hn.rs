//! Hacker News story fetching.
//!
//! Talks to the public Firebase API: one ranked-ID-list request per feed,
//! then one item-detail request per ID. Detail fetches run through a fixed
//! concurrency window and come back in rank order; items that fail to fetch
//! or are not live stories are dropped rather than failing the batch.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::config::FetchConfig;
use crate::models::Story;

/// Which ranked story list to pull from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Top,
    Best,
    Show,
}

impl Feed {
    fn endpoint(self) -> &'static str {
        match self {
            Feed::Top => "topstories.json",
            Feed::Best => "beststories.json",
            Feed::Show => "showstories.json",
        }
    }
}

impl FromStr for Feed {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "top" => Ok(Feed::Top),
            "best" => Ok(Feed::Best),
            "show" => Ok(Feed::Show),
            other => anyhow::bail!("Unknown feed: '{}'. Must be top, best, or show.", other),
        }
    }
}

/// Source of ranked stories.
///
/// The service depends on this seam rather than on [`HnClient`] directly so
/// generation can be driven by test doubles.
#[async_trait]
pub trait StoryFetcher: Send + Sync {
    /// Fetch up to `limit` stories from `feed`, in rank order.
    ///
    /// A partial result is success: items that cannot be fetched or are not
    /// live stories are silently dropped. Only a failure to retrieve the
    /// ranked ID list itself is an error.
    async fn fetch_ranked(&self, feed: Feed, limit: usize) -> Result<Vec<Story>>;
}

/// HTTP client for the Hacker News Firebase API.
pub struct HnClient {
    client: reqwest::Client,
    base_url: String,
    concurrency: usize,
}

impl HnClient {
    /// Build a client with the configured base URL, per-request timeout,
    /// and fan-out window.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            concurrency: config.concurrency,
        })
    }

    async fn fetch_ids(&self, feed: Feed, limit: usize) -> Result<Vec<u64>> {
        let url = format!("{}/{}", self.base_url, feed.endpoint());
        let ids: Vec<u64> = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Ranked list request failed: {}", url))?
            .error_for_status()
            .with_context(|| "Ranked list request returned an error status")?
            .json()
            .await
            .with_context(|| "Ranked list response was not a JSON array of IDs")?;

        Ok(ids.into_iter().take(limit).collect())
    }

    /// Fetch a single item. Any failure (network, status, parse, wrong
    /// kind, dead/deleted) collapses to `None`.
    async fn fetch_story(&self, id: u64) -> Option<Story> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        let resp = self.client.get(&url).send().await.ok()?;
        if !resp.status().is_success() {
            return None;
        }
        // The API returns `null` for unknown IDs; that fails the parse and
        // drops the item, same as any other malformed body.
        let raw: RawItem = resp.json().await.ok()?;
        raw.into_story()
    }
}

#[async_trait]
impl StoryFetcher for HnClient {
    async fn fetch_ranked(&self, feed: Feed, limit: usize) -> Result<Vec<Story>> {
        let ids = self.fetch_ids(feed, limit).await?;
        debug!(
            "Fetching {} item details from {} ({} in flight)",
            ids.len(),
            feed.endpoint(),
            self.concurrency
        );

        // `buffered` keeps at most `concurrency` requests in flight and
        // yields results in rank order regardless of completion order.
        let stories: Vec<Story> = stream::iter(ids)
            .map(|id| self.fetch_story(id))
            .buffered(self.concurrency)
            .filter_map(|story| async move { story })
            .collect()
            .await;

        Ok(stories)
    }
}

/// Wire shape of `item/{id}.json`. Everything is optional on the wire;
/// conversion decides what is required.
#[derive(Debug, Deserialize)]
struct RawItem {
    id: Option<u64>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    dead: bool,
    #[serde(default)]
    deleted: bool,
    title: Option<String>,
    url: Option<String>,
    score: Option<u32>,
    by: Option<String>,
    time: Option<i64>,
    descendants: Option<u32>,
    text: Option<String>,
}

impl RawItem {
    /// Returns `None` unless the item is a live story with an ID.
    fn into_story(self) -> Option<Story> {
        if self.kind.as_deref() != Some("story") || self.dead || self.deleted {
            return None;
        }
        Some(Story {
            id: self.id?,
            title: self.title.unwrap_or_default(),
            url: self.url,
            score: self.score.unwrap_or(0),
            by: self.by.unwrap_or_else(|| "unknown".to_string()),
            time: DateTime::from_timestamp(self.time.unwrap_or(0), 0).unwrap_or_default(),
            descendants: self.descendants.unwrap_or(0),
            text: self.text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(kind: &str) -> RawItem {
        RawItem {
            id: Some(1),
            kind: Some(kind.to_string()),
            dead: false,
            deleted: false,
            title: Some("Title".to_string()),
            url: None,
            score: Some(10),
            by: Some("alice".to_string()),
            time: Some(1_700_000_000),
            descendants: Some(3),
            text: None,
        }
    }

    #[test]
    fn test_feed_parses_known_names() {
        assert_eq!("top".parse::<Feed>().unwrap(), Feed::Top);
        assert_eq!("best".parse::<Feed>().unwrap(), Feed::Best);
        assert_eq!("show".parse::<Feed>().unwrap(), Feed::Show);
        assert!("newest".parse::<Feed>().is_err());
    }

    #[test]
    fn test_into_story_requires_live_story() {
        assert!(raw("story").into_story().is_some());
        assert!(raw("comment").into_story().is_none());
        assert!(raw("job").into_story().is_none());

        let mut dead = raw("story");
        dead.dead = true;
        assert!(dead.into_story().is_none());

        let mut deleted = raw("story");
        deleted.deleted = true;
        assert!(deleted.into_story().is_none());

        let mut missing_id = raw("story");
        missing_id.id = None;
        assert!(missing_id.into_story().is_none());
    }

    #[test]
    fn test_into_story_applies_field_defaults() {
        let mut sparse = raw("story");
        sparse.title = None;
        sparse.score = None;
        sparse.by = None;
        sparse.descendants = None;
        sparse.time = None;

        let story = sparse.into_story().unwrap();
        assert_eq!(story.title, "");
        assert_eq!(story.score, 0);
        assert_eq!(story.by, "unknown");
        assert_eq!(story.descendants, 0);
        assert_eq!(story.time.timestamp(), 0);
    }
}
