//! Digest generation.
//!
//! Selects the top-scored stories, sends one Chinese editorial prompt to the
//! Anthropic Messages API, and parses the model's JSON annotations into a
//! [`DailyDigest`]. Parsing is strict: a response that is not valid JSON or
//! does not match the expected schema fails the build rather than producing
//! a partial digest.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DigestConfig;
use crate::models::{DailyDigest, DigestedStory, Story};

/// Anthropic API endpoint
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A text completion backend.
///
/// The digest builder only needs "prompt in, text out"; tests substitute a
/// canned implementation so no network access is involved.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Send a single user prompt and return the model's text output.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Create a client using the given API key, falling back to the
    /// `ANTHROPIC_API_KEY` environment variable.
    pub fn new(config: &DigestConfig, api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .unwrap_or_default();
        if api_key.is_empty() {
            bail!("ANTHROPIC_API_KEY required");
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: ANTHROPIC_API_URL.to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl TextCompletion for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Anthropic API request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Anthropic API response")?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<ApiErrorBody>(&body) {
                bail!(
                    "Anthropic API error: {} - {}",
                    err.error.kind,
                    err.error.message
                );
            }
            bail!("Anthropic API error ({status}): {body}");
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&body).context("Failed to parse Anthropic API response")?;
        Ok(parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join(""))
    }
}

/// The JSON document the model is instructed to produce.
#[derive(Debug, Deserialize)]
struct DigestPayload {
    intro: String,
    stories: Vec<StoryAnnotation>,
}

/// Per-story annotation keyed by 1-based position in the prompt.
#[derive(Debug, Deserialize)]
struct StoryAnnotation {
    index: i64,
    summary_zh: String,
    category: String,
    importance: i32,
}

/// Builds daily digests from ranked stories via a [`TextCompletion`] backend.
pub struct DigestBuilder {
    completion: Arc<dyn TextCompletion>,
}

impl DigestBuilder {
    pub fn new(completion: Arc<dyn TextCompletion>) -> Self {
        Self { completion }
    }

    /// Select the highest-scored stories, ask the model for Chinese
    /// annotations, and assemble a digest dated by the local clock.
    pub async fn build_digest(
        &self,
        stories: Vec<Story>,
        max_stories: usize,
    ) -> Result<DailyDigest> {
        let selected = select_top(stories, max_stories);
        let prompt = build_prompt(&selected);
        debug!("Requesting annotations for {} stories", selected.len());
        let raw = self.completion.complete(&prompt).await?;
        let payload = parse_payload(&raw)?;
        Ok(assemble(selected, payload))
    }
}

/// Sort by score descending and keep the first `max_stories`.
/// `Vec::sort_by` is stable, so equal scores keep their upstream rank order.
fn select_top(mut stories: Vec<Story>, max_stories: usize) -> Vec<Story> {
    stories.sort_by(|a, b| b.score.cmp(&a.score));
    stories.truncate(max_stories);
    stories
}

/// Render the editorial prompt. Each story block is numbered from 1; bodies
/// of text posts are excerpted to 500 characters.
fn build_prompt(stories: &[Story]) -> String {
    let blocks: Vec<String> = stories
        .iter()
        .enumerate()
        .map(|(i, story)| {
            let excerpt = match &story.text {
                Some(text) => {
                    let head: String = text.chars().take(500).collect();
                    format!("Text: {head}...")
                }
                None => String::new(),
            };
            format!(
                "### {}. {}\nScore: {} | Comments: {} | By: {}\nURL: {}\n{}",
                i + 1,
                story.title,
                story.score,
                story.descendants,
                story.by,
                story.resolved_url(),
                excerpt
            )
        })
        .collect();
    let stories_text = blocks.join("\n\n");

    format!(
        r#"你是一位资深科技编辑，负责为中国开发者编写每日 Hacker News 精选。

今日 Top Stories:
{stories_text}

请完成以下任务：

1. 为每篇文章写一个简洁的中文摘要（2-3句话），解释为什么这篇文章值得关注
2. 给每篇文章分类：tech/ai/startup/programming/career/other
3. 给每篇文章打重要性分数 1-5（5最重要）
4. 写一段今日科技圈总结作为开场白（3-4句话）

输出格式（JSON）：
{{
  "intro": "今日开场白...",
  "stories": [
    {{
      "index": 1,
      "summary_zh": "中文摘要...",
      "category": "ai",
      "importance": 5
    }}
  ]
}}

只输出 JSON，不要其他内容。"#
    )
}

/// Strip a wrapping triple-backtick fence, accepting an optional language
/// tag on the opening fence. Unfenced text is returned trimmed.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Take what sits between the first pair of fences; an unclosed fence
    // runs to the end of the response.
    let inner = rest.split("```").next().unwrap_or(rest);
    let inner = match inner.split_once('\n') {
        Some((tag, body)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => body,
        _ => inner,
    };
    inner.trim()
}

fn parse_payload(raw: &str) -> Result<DigestPayload> {
    let json = strip_code_fence(raw);
    serde_json::from_str(json).context("Model response did not match the expected digest schema")
}

/// Join annotations back to the selected stories by 1-based index.
/// Out-of-range indices are skipped; a repeated index overwrites in place,
/// so the last annotation wins but the earliest position is kept.
fn assemble(selected: Vec<Story>, payload: DigestPayload) -> DailyDigest {
    let mut entries: Vec<(i64, DigestedStory)> = Vec::new();
    for annotation in payload.stories {
        let index = annotation.index;
        if index < 1 || index as usize > selected.len() {
            continue;
        }
        let digested = DigestedStory {
            story: selected[(index - 1) as usize].clone(),
            summary_zh: annotation.summary_zh,
            category: annotation.category,
            importance: annotation.importance,
        };
        match entries.iter().position(|(seen, _)| *seen == index) {
            Some(pos) => entries[pos].1 = digested,
            None => entries.push((index, digested)),
        }
    }
    DailyDigest {
        date: Local::now().date_naive().to_string(),
        intro: payload.intro,
        stories: entries.into_iter().map(|(_, digested)| digested).collect(),
    }
}
