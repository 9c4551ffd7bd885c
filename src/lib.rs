//! # HN Digest
//!
//! An AI-powered daily Hacker News digest in Chinese.
//!
//! HN Digest fetches the current top stories from the Hacker News API,
//! asks Claude to summarize and classify them for Chinese-speaking
//! developers, and serves the result as a daily digest over HTTP and a CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │  HN API     │──▶│  Summarizer │──▶│  Store   │
//! │ top/best/   │   │  (Claude)   │   │ file/mem │
//! │ show feeds  │   └─────────────┘   └────┬─────┘
//! └─────────────┘                          │
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │  (hnd)   │       │  server  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! hnd test                      # check HN API connectivity
//! hnd fetch -n 10               # print today's top stories
//! hnd digest --format md        # one-shot digest (needs ANTHROPIC_API_KEY)
//! hnd serve                     # start the HTTP server
//! hnd list                      # stored digest dates
//! hnd show 2024-06-01           # print a stored digest
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`hn`] | Hacker News API client |
//! | [`summarizer`] | Story selection and Claude summarization |
//! | [`store`] | Digest persistence (file and memory backends) |
//! | [`render`] | Markdown, Telegram, and JSON renderings |
//! | [`service`] | Pipeline orchestration and caching |
//! | [`server`] | HTTP API server |
//! | [`fetch_cmd`], [`digest_cmd`], [`store_cmd`] | CLI command bodies |

pub mod config;
pub mod digest_cmd;
pub mod fetch_cmd;
pub mod hn;
pub mod models;
pub mod render;
pub mod server;
pub mod service;
pub mod store;
pub mod store_cmd;
pub mod summarizer;
