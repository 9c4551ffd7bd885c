//! File-backed digest store: one pretty-printed JSON record per date.
//!
//! Records live at `<data_dir>/digests/<YYYY-MM-DD>.json`. The directory is
//! created lazily on the first write, so read operations against a store
//! that has never been written to return empty results rather than errors.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{DigestRecord, DigestStore, StoreStats};
use crate::models::DailyDigest;

/// Digest store persisting each record as a JSON file on disk.
pub struct FileStore {
    data_dir: PathBuf,
    digests_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            digests_dir: data_dir.join("digests"),
        }
    }

    fn record_path(&self, date: &str) -> PathBuf {
        self.digests_dir.join(format!("{date}.json"))
    }

    /// Iterate the `.json` record paths in the digests directory.
    /// A missing directory yields nothing.
    fn record_paths(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.digests_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .collect()
    }
}

#[async_trait]
impl DigestStore for FileStore {
    async fn save(&self, digest: &DailyDigest) -> Result<()> {
        fs::create_dir_all(&self.digests_dir).with_context(|| {
            format!("Failed to create digest directory {}", self.digests_dir.display())
        })?;
        let record = DigestRecord::from_digest(digest);
        let json = serde_json::to_string_pretty(&record).context("Failed to serialize digest")?;
        let path = self.record_path(&digest.date);
        fs::write(&path, json)
            .with_context(|| format!("Failed to write digest to {}", path.display()))?;
        Ok(())
    }

    async fn load(&self, date: &str) -> Result<Option<DailyDigest>> {
        let path = self.record_path(date);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read digest from {}", path.display()))?;
        let record: DigestRecord = serde_json::from_str(&content)
            .with_context(|| format!("Invalid digest record at {}", path.display()))?;
        Ok(Some(record.into_digest()))
    }

    async fn list_dates(&self, limit: usize) -> Result<Vec<String>> {
        let mut dates: Vec<String> = self
            .record_paths()
            .into_iter()
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect();
        // ISO dates sort lexicographically, so a reverse sort is
        // most-recent-first.
        dates.sort_by(|a, b| b.cmp(a));
        dates.truncate(limit);
        Ok(dates)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let paths = self.record_paths();
        let total_size_bytes = paths
            .iter()
            .filter_map(|path| fs::metadata(path).ok())
            .map(|meta| meta.len())
            .sum();
        Ok(StoreStats {
            digest_count: paths.len(),
            total_size_bytes,
            location: self.data_dir.display().to_string(),
        })
    }
}
