//! Core data models used throughout HN Digest.
//!
//! These types represent the stories, annotations, and digests that flow
//! through the fetch → summarize → store pipeline.

use chrono::{DateTime, Utc};

/// A Hacker News story as fetched from the item API.
///
/// Immutable once constructed. `id` is the source-assigned item number;
/// stories reconstructed from a stored digest carry the `0` placeholder
/// (the persisted record does not retain identifiers), so permalinks
/// derived from them are dummy values.
#[derive(Debug, Clone)]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub url: Option<String>,
    pub score: u32,
    pub by: String,
    pub time: DateTime<Utc>,
    /// Comment count.
    pub descendants: u32,
    /// Body text for text-only posts (Ask HN / Show HN).
    pub text: Option<String>,
}

impl Story {
    /// Permalink to the story's HN comment page.
    pub fn hn_url(&self) -> String {
        format!("https://news.ycombinator.com/item?id={}", self.id)
    }

    /// The external URL if the story has one, otherwise the HN permalink.
    pub fn resolved_url(&self) -> String {
        self.url.clone().unwrap_or_else(|| self.hn_url())
    }

    pub fn is_ask_hn(&self) -> bool {
        self.title.starts_with("Ask HN:")
    }

    pub fn is_show_hn(&self) -> bool {
        self.title.starts_with("Show HN:")
    }
}

/// A story plus the model-generated annotations for it.
#[derive(Debug, Clone)]
pub struct DigestedStory {
    pub story: Story,
    /// Chinese-language summary explaining why the story matters.
    pub summary_zh: String,
    /// Open-text category label (e.g. tech/ai/startup/programming/career/other).
    pub category: String,
    /// Importance on a 1–5 scale; taken from the model as-is.
    pub importance: i32,
}

/// One day's curated selection: intro paragraph plus annotated stories.
///
/// `date` is the ISO 8601 calendar date and serves as the natural key in
/// the store: at most one digest exists per date, last write wins.
#[derive(Debug, Clone)]
pub struct DailyDigest {
    pub date: String,
    pub intro: String,
    pub stories: Vec<DigestedStory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(title: &str) -> Story {
        Story {
            id: 42,
            title: title.to_string(),
            url: None,
            score: 100,
            by: "pg".to_string(),
            time: Utc::now(),
            descendants: 10,
            text: None,
        }
    }

    #[test]
    fn test_hn_url_uses_id() {
        assert_eq!(
            story("A title").hn_url(),
            "https://news.ycombinator.com/item?id=42"
        );
    }

    #[test]
    fn test_resolved_url_prefers_external() {
        let mut s = story("A title");
        s.url = Some("https://example.com/post".to_string());
        assert_eq!(s.resolved_url(), "https://example.com/post");
        s.url = None;
        assert_eq!(s.resolved_url(), s.hn_url());
    }

    #[test]
    fn test_title_prefix_flags_are_exact() {
        assert!(story("Ask HN: How do you test?").is_ask_hn());
        assert!(story("Show HN: My side project").is_show_hn());
        // Prefix matching is case-sensitive and position-sensitive.
        assert!(!story("ask hn: lowercase").is_ask_hn());
        assert!(!story("Re: Ask HN: nested").is_ask_hn());
        assert!(!story("Show HN: thing").is_ask_hn());
    }
}
