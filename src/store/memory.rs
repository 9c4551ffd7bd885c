//! In-memory digest store.
//!
//! Keeps records in a `RwLock<HashMap>`, keyed by date. Used by tests and
//! by deployments that do not need digests to survive a restart. Records
//! pass through the same [`DigestRecord`] schema as the file backend, so
//! load behavior (including the zeroed story IDs) is identical.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use super::{DigestRecord, DigestStore, StoreStats};
use crate::models::DailyDigest;

/// Digest store backed by a process-local hash map.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, DigestRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DigestStore for MemoryStore {
    async fn save(&self, digest: &DailyDigest) -> Result<()> {
        let record = DigestRecord::from_digest(digest);
        self.records
            .write()
            .unwrap()
            .insert(digest.date.clone(), record);
        Ok(())
    }

    async fn load(&self, date: &str) -> Result<Option<DailyDigest>> {
        let records = self.records.read().unwrap();
        Ok(records.get(date).cloned().map(DigestRecord::into_digest))
    }

    async fn list_dates(&self, limit: usize) -> Result<Vec<String>> {
        let records = self.records.read().unwrap();
        let mut dates: Vec<String> = records.keys().cloned().collect();
        dates.sort_by(|a, b| b.cmp(a));
        dates.truncate(limit);
        Ok(dates)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let records = self.records.read().unwrap();
        let total_size_bytes = records
            .values()
            .filter_map(|record| serde_json::to_vec(record).ok())
            .map(|bytes| bytes.len() as u64)
            .sum();
        Ok(StoreStats {
            digest_count: records.len(),
            total_size_bytes,
            location: "memory".to_string(),
        })
    }
}
