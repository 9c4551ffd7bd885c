//! Storage abstraction for digests.
//!
//! The [`DigestStore`] trait defines the persistence operations used by the
//! service layer and the CLI, enabling pluggable backends (JSON files on
//! disk, in-memory for tests and ephemeral deployments).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod file;
pub mod memory;

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::models::{DailyDigest, DigestedStory, Story};

/// Storage statistics, as reported by `hnd stats` and `GET /stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    /// Number of digests in the store.
    pub digest_count: usize,
    /// Total size of the stored records in bytes.
    pub total_size_bytes: u64,
    /// Human-readable location of the store (directory path or "memory").
    pub location: String,
}

/// Persisted form of a digest: one record per calendar date.
///
/// The record keeps every field a renderer needs but does not carry the
/// upstream item identifier, so a digest loaded from the store has a zero
/// ID on each story and permalinks derived from it are placeholders (the
/// stored `hn_url` keeps the real link in the record itself). Timestamps
/// are stored as RFC 3339 strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestRecord {
    pub date: String,
    pub intro: String,
    pub generated_at: DateTime<Utc>,
    pub stories: Vec<StoryRecord>,
}

/// One annotated story inside a [`DigestRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRecord {
    pub title: String,
    pub url: Option<String>,
    pub hn_url: String,
    pub score: u32,
    pub by: String,
    pub time: DateTime<Utc>,
    pub descendants: u32,
    pub text: Option<String>,
    pub summary_zh: String,
    pub category: String,
    pub importance: i32,
}

impl DigestRecord {
    /// Build a record from a digest, stamping `generated_at` with the
    /// current time.
    pub fn from_digest(digest: &DailyDigest) -> Self {
        Self {
            date: digest.date.clone(),
            intro: digest.intro.clone(),
            generated_at: Utc::now(),
            stories: digest.stories.iter().map(StoryRecord::from_story).collect(),
        }
    }

    /// Reconstruct the digest. Story IDs are not persisted and come back
    /// as zero.
    pub fn into_digest(self) -> DailyDigest {
        DailyDigest {
            date: self.date,
            intro: self.intro,
            stories: self.stories.into_iter().map(StoryRecord::into_story).collect(),
        }
    }
}

impl StoryRecord {
    fn from_story(digested: &DigestedStory) -> Self {
        Self {
            title: digested.story.title.clone(),
            url: digested.story.url.clone(),
            hn_url: digested.story.hn_url(),
            score: digested.story.score,
            by: digested.story.by.clone(),
            time: digested.story.time,
            descendants: digested.story.descendants,
            text: digested.story.text.clone(),
            summary_zh: digested.summary_zh.clone(),
            category: digested.category.clone(),
            importance: digested.importance,
        }
    }

    fn into_story(self) -> DigestedStory {
        DigestedStory {
            story: Story {
                id: 0,
                title: self.title,
                url: self.url,
                score: self.score,
                by: self.by,
                time: self.time,
                descendants: self.descendants,
                text: self.text,
            },
            summary_zh: self.summary_zh,
            category: self.category,
            importance: self.importance,
        }
    }
}

/// Abstract digest storage backend.
///
/// All operations are async (via `async-trait`); the in-memory
/// implementation returns immediately-ready futures.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`save`](DigestStore::save) | Persist a digest, replacing any record for the same date |
/// | [`load`](DigestStore::load) | Retrieve the digest for a date, if present |
/// | [`list_dates`](DigestStore::list_dates) | List stored dates, most recent first |
/// | [`stats`](DigestStore::stats) | Report record count and total size |
#[async_trait]
pub trait DigestStore: Send + Sync {
    /// Persist a digest under its date, overwriting an existing record.
    async fn save(&self, digest: &DailyDigest) -> Result<()>;

    /// Load the digest stored for `date` (ISO `YYYY-MM-DD`), if any.
    async fn load(&self, date: &str) -> Result<Option<DailyDigest>>;

    /// List stored dates in descending order, up to `limit`.
    async fn list_dates(&self, limit: usize) -> Result<Vec<String>>;

    /// Report statistics about the store.
    async fn stats(&self) -> Result<StoreStats>;
}

/// Create a store backend from configuration.
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn DigestStore>> {
    match config.backend.as_str() {
        "file" => Ok(Arc::new(file::FileStore::new(&config.data_dir))),
        "memory" => Ok(Arc::new(memory::MemoryStore::new())),
        other => bail!("Unknown storage backend: '{}'. Must be 'file' or 'memory'.", other),
    }
}
