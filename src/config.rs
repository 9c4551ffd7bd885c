use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub digest: DigestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Store backend: `file` (JSON file per date) or `memory`.
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_backend() -> String {
    "file".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// How many ranked story IDs to fetch per generation (larger than the
    /// digest selection so dead/deleted items can be dropped).
    #[serde(default = "default_fetch_limit")]
    pub limit: usize,
    /// Maximum number of item requests in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-request timeout for item fetches.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            limit: default_fetch_limit(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://hacker-news.firebaseio.com/v0".to_string()
}
fn default_fetch_limit() -> usize {
    30
}
fn default_concurrency() -> usize {
    8
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct DigestConfig {
    /// Cap on stories included in a digest.
    #[serde(default = "default_max_stories")]
    pub max_stories: usize,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            max_stories: default_max_stories(),
            model: default_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_max_stories() -> usize {
    10
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}
fn default_max_tokens() -> u32 {
    2000
}

/// Load configuration from a TOML file.
///
/// A missing file is not an error; the defaults above apply, so the binary
/// runs with zero setup. `HN_DIGEST_DATA_DIR` overrides `storage.data_dir`
/// when set (the Anthropic credential is read separately, at summarizer
/// construction).
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config: Config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        Config::default()
    };

    if let Ok(dir) = std::env::var("HN_DIGEST_DATA_DIR") {
        if !dir.is_empty() {
            config.storage.data_dir = PathBuf::from(dir);
        }
    }

    // Validate storage
    match config.storage.backend.as_str() {
        "file" | "memory" => {}
        other => anyhow::bail!(
            "Unknown storage backend: '{}'. Must be file or memory.",
            other
        ),
    }

    // Validate fetch
    if config.fetch.limit == 0 {
        anyhow::bail!("fetch.limit must be > 0");
    }
    if config.fetch.concurrency == 0 {
        anyhow::bail!("fetch.concurrency must be > 0");
    }
    if config.fetch.timeout_secs == 0 {
        anyhow::bail!("fetch.timeout_secs must be > 0");
    }

    // Validate digest
    if config.digest.max_stories == 0 {
        anyhow::bail!("digest.max_stories must be > 0");
    }
    if config.digest.max_tokens == 0 {
        anyhow::bail!("digest.max_tokens must be > 0");
    }

    Ok(config)
}
