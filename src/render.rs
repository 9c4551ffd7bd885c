//! Digest presentation.
//!
//! Pure renderers over [`DailyDigest`]: a Markdown page grouped by
//! importance, a compact HTML snippet for Telegram, and a serializable
//! JSON view used by the HTTP API and `--format json`.

use serde::Serialize;

use crate::models::{DailyDigest, DigestedStory};

/// Stories with importance at or above this render in the must-read group.
const MUST_READ_IMPORTANCE: i32 = 4;

/// Telegram messages carry at most this many stories.
const TELEGRAM_STORY_LIMIT: usize = 5;

/// JSON view of a digest.
#[derive(Debug, Serialize)]
pub struct DigestView {
    pub date: String,
    pub intro: String,
    pub story_count: usize,
    pub stories: Vec<StoryView>,
}

/// JSON view of one annotated story.
#[derive(Debug, Serialize)]
pub struct StoryView {
    pub title: String,
    pub url: String,
    pub hn_url: String,
    pub score: u32,
    pub comments: u32,
    pub summary_zh: String,
    pub category: String,
    pub importance: i32,
}

impl From<&DailyDigest> for DigestView {
    fn from(digest: &DailyDigest) -> Self {
        Self {
            date: digest.date.clone(),
            intro: digest.intro.clone(),
            story_count: digest.stories.len(),
            stories: digest.stories.iter().map(StoryView::from).collect(),
        }
    }
}

impl From<&DigestedStory> for StoryView {
    fn from(digested: &DigestedStory) -> Self {
        Self {
            title: digested.story.title.clone(),
            url: digested.story.resolved_url(),
            hn_url: digested.story.hn_url(),
            score: digested.story.score,
            comments: digested.story.descendants,
            summary_zh: digested.summary_zh.clone(),
            category: digested.category.clone(),
            importance: digested.importance,
        }
    }
}

/// Render a digest as a Markdown page.
///
/// Stories are partitioned into a must-read section and a shorter list for
/// the rest; within each section the digest order is preserved. Empty
/// sections are omitted entirely.
pub fn format_digest_markdown(digest: &DailyDigest) -> String {
    let mut lines = vec![
        format!("# 🍊 HN 每日精选 | {}", digest.date),
        String::new(),
        digest.intro.clone(),
        String::new(),
        "---".to_string(),
        String::new(),
    ];

    let (important, others): (Vec<&DigestedStory>, Vec<&DigestedStory>) = digest
        .stories
        .iter()
        .partition(|ds| ds.importance >= MUST_READ_IMPORTANCE);

    if !important.is_empty() {
        lines.push("## 🔥 今日必读".to_string());
        lines.push(String::new());
        for ds in important {
            lines.push(format!("### {}", ds.story.title));
            lines.push(format!(
                "📊 {} 分 | 💬 {} 评论 | 🏷️ {}",
                ds.story.score, ds.story.descendants, ds.category
            ));
            lines.push(String::new());
            lines.push(ds.summary_zh.clone());
            lines.push(String::new());
            lines.push(format!(
                "🔗 [原文]({}) | [HN 讨论]({})",
                ds.story.resolved_url(),
                ds.story.hn_url()
            ));
            lines.push(String::new());
        }
    }

    if !others.is_empty() {
        lines.push("## 📰 其他值得一看".to_string());
        lines.push(String::new());
        for ds in others {
            lines.push(format!("- **{}** ({}分)", ds.story.title, ds.story.score));
            lines.push(format!("  {}", ds.summary_zh));
            lines.push(format!("  [链接]({})", ds.story.resolved_url()));
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

/// Render a digest as HTML-flavored text for Telegram.
///
/// Only the first five stories appear; a trailing note points at the full
/// version when more were digested.
pub fn format_digest_telegram(digest: &DailyDigest) -> String {
    let mut lines = vec![
        format!("🍊 <b>HN 每日精选 | {}</b>", digest.date),
        String::new(),
        digest.intro.clone(),
        String::new(),
    ];

    for (i, ds) in digest.stories.iter().take(TELEGRAM_STORY_LIMIT).enumerate() {
        let emoji = if ds.importance >= MUST_READ_IMPORTANCE {
            "🔥"
        } else {
            "📰"
        };
        lines.push(format!("{} <b>{}. {}</b>", emoji, i + 1, ds.story.title));
        lines.push(format!(
            "   📊 {} | 💬 {} | 🏷️ {}",
            ds.story.score, ds.story.descendants, ds.category
        ));
        lines.push(format!("   {}", ds.summary_zh));
        lines.push(format!(
            r#"   <a href="{}">原文</a> | <a href="{}">讨论</a>"#,
            ds.story.resolved_url(),
            ds.story.hn_url()
        ));
        lines.push(String::new());
    }

    if digest.stories.len() > TELEGRAM_STORY_LIMIT {
        lines.push(format!(
            "...还有 {} 篇，完整版见网页",
            digest.stories.len() - TELEGRAM_STORY_LIMIT
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Story;
    use chrono::{TimeZone, Utc};

    fn digested(title: &str, importance: i32, score: u32) -> DigestedStory {
        DigestedStory {
            story: Story {
                id: 1000 + score as u64,
                title: title.to_string(),
                url: Some(format!("https://example.com/{score}")),
                score,
                by: "author".to_string(),
                time: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
                descendants: 7,
                text: None,
            },
            summary_zh: format!("{title} 的摘要"),
            category: "tech".to_string(),
            importance,
        }
    }

    fn digest_with(stories: Vec<DigestedStory>) -> DailyDigest {
        DailyDigest {
            date: "2024-06-01".to_string(),
            intro: "今日开场白".to_string(),
            stories,
        }
    }

    #[test]
    fn markdown_partitions_by_importance_and_keeps_order() {
        let digest = digest_with(vec![
            digested("hot-1", 5, 100),
            digested("cold-1", 2, 90),
            digested("hot-2", 4, 80),
            digested("cold-2", 1, 70),
            digested("hot-3", 4, 60),
            digested("cold-3", 3, 50),
            digested("cold-4", 2, 40),
        ]);

        let md = format_digest_markdown(&digest);
        assert!(md.starts_with("# 🍊 HN 每日精选 | 2024-06-01"));
        assert!(md.contains("## 🔥 今日必读"));
        assert!(md.contains("## 📰 其他值得一看"));

        // The three must-reads render as headings, in digest order.
        let hot_1 = md.find("### hot-1").unwrap();
        let hot_2 = md.find("### hot-2").unwrap();
        let hot_3 = md.find("### hot-3").unwrap();
        assert!(hot_1 < hot_2 && hot_2 < hot_3);
        assert!(!md.contains("### cold-1"));

        // The rest render as list items, in digest order.
        let cold_1 = md.find("- **cold-1** (90分)").unwrap();
        let cold_4 = md.find("- **cold-4** (40分)").unwrap();
        assert!(cold_1 < cold_4);

        // All must-reads sit above the others section.
        assert!(hot_3 < md.find("## 📰").unwrap());
    }

    #[test]
    fn markdown_omits_empty_sections() {
        let all_hot = format_digest_markdown(&digest_with(vec![digested("hot", 5, 10)]));
        assert!(all_hot.contains("## 🔥 今日必读"));
        assert!(!all_hot.contains("## 📰"));

        let all_cold = format_digest_markdown(&digest_with(vec![digested("cold", 1, 10)]));
        assert!(!all_cold.contains("## 🔥"));
        assert!(all_cold.contains("## 📰 其他值得一看"));
    }

    #[test]
    fn markdown_links_fall_back_to_hn_permalink() {
        let mut ds = digested("Ask HN: something", 5, 10);
        ds.story.url = None;
        ds.story.id = 42;
        let md = format_digest_markdown(&digest_with(vec![ds]));
        assert!(md.contains(
            "🔗 [原文](https://news.ycombinator.com/item?id=42) | [HN 讨论](https://news.ycombinator.com/item?id=42)"
        ));
    }

    #[test]
    fn telegram_caps_at_five_stories_with_overflow_note() {
        let stories: Vec<DigestedStory> = (1..=8)
            .map(|i| digested(&format!("story-{i}"), if i == 1 { 5 } else { 2 }, 10 * i))
            .collect();
        let tg = format_digest_telegram(&digest_with(stories));

        assert!(tg.starts_with("🍊 <b>HN 每日精选 | 2024-06-01</b>"));
        assert!(tg.contains("🔥 <b>1. story-1</b>"));
        assert!(tg.contains("📰 <b>5. story-5</b>"));
        assert!(!tg.contains("story-6"));
        assert!(tg.contains("...还有 3 篇，完整版见网页"));
    }

    #[test]
    fn telegram_has_no_overflow_note_at_five_or_fewer() {
        let stories: Vec<DigestedStory> = (1..=5)
            .map(|i| digested(&format!("story-{i}"), 3, 10 * i))
            .collect();
        let tg = format_digest_telegram(&digest_with(stories));
        assert!(tg.contains("<b>5. story-5</b>"));
        assert!(!tg.contains("还有"));
    }

    #[test]
    fn json_view_resolves_urls_and_counts_stories() {
        let mut ask = digested("Ask HN: advice", 3, 5);
        ask.story.url = None;
        ask.story.id = 7;
        let digest = digest_with(vec![digested("Linked", 5, 10), ask]);

        let view = DigestView::from(&digest);
        assert_eq!(view.story_count, 2);
        assert_eq!(view.stories[0].url, "https://example.com/10");
        assert_eq!(view.stories[1].url, "https://news.ycombinator.com/item?id=7");
        assert_eq!(view.stories[1].hn_url, "https://news.ycombinator.com/item?id=7");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["stories"][0]["comments"], 7);
        assert!(json["stories"][0].get("descendants").is_none());
    }
}
