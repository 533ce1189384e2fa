//! Source registry: the endpoints to fetch, grouped by source kind.
//!
//! The registry file is YAML. JSON is valid YAML, so an existing
//! `sources.json` loads unchanged:
//!
//! ```yaml
//! reddit:
//!   - https://www.reddit.com/r/technology/top.json?t=day&limit=5
//! hackernews:
//!   - https://hacker-news.firebaseio.com/v0/topstories.json
//! stackoverflow:
//!   - https://stackoverflow.com/feeds/tag/rust
//! quora: []
//! rss:
//!   - https://blog.rust-lang.org/feed.xml
//! ```

use crate::error::DigestResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

pub const HN_ITEM_BASE: &str = "https://hacker-news.firebaseio.com/v0/item";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SourceRegistry {
    #[serde(default)]
    pub reddit: Vec<String>,
    #[serde(default)]
    pub hackernews: Vec<String>,
    #[serde(default)]
    pub stackoverflow: Vec<String>,
    #[serde(default)]
    pub quora: Vec<String>,
    #[serde(default)]
    pub rss: Vec<String>,
    /// Base URL that story IDs are appended to (`{base}/{id}.json`).
    #[serde(default = "default_item_base")]
    pub hackernews_item_base: String,
}

fn default_item_base() -> String {
    HN_ITEM_BASE.to_string()
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self {
            reddit: ["technology", "science", "worldnews"]
                .iter()
                .map(|sub| format!("https://www.reddit.com/r/{sub}/top.json?t=day&limit=5"))
                .collect(),
            hackernews: vec!["https://hacker-news.firebaseio.com/v0/topstories.json".to_string()],
            stackoverflow: vec!["https://stackoverflow.com/feeds/week".to_string()],
            quora: vec![
                "https://www.quora.com/topic/Technology/rss".to_string(),
                "https://www.quora.com/topic/Science/rss".to_string(),
            ],
            rss: Vec::new(),
            hackernews_item_base: default_item_base(),
        }
    }
}

impl SourceRegistry {
    /// Load the registry from `path`, or the built-in defaults when `None`.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> DigestResult<Self> {
        let Some(path) = path else {
            info!("Using built-in source registry");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        let registry = Self::parse(&raw)?;
        info!(endpoints = registry.endpoint_count(), "Loaded source registry");
        Ok(registry)
    }

    pub fn parse(raw: &str) -> DigestResult<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Feed URLs in fetch order: Stack Overflow, Quora, then generic RSS.
    pub fn feeds(&self) -> impl Iterator<Item = &String> {
        self.stackoverflow.iter().chain(&self.quora).chain(&self.rss)
    }

    pub fn endpoint_count(&self) -> usize {
        self.reddit.len() + self.hackernews.len() + self.feeds().count()
    }
}
