//! Data models for digest items, the archive index and the status record.
//!
//! - [`NormalizedItem`]: one post reduced to the cross-source shape
//! - [`SourceKind`]: the provider an item came from
//! - [`ArchiveEntry`]: one dated line of `archives.json`
//! - [`StatusRecord`]: the health summary in `status.json`
//!
//! Field names follow the JSON files the front-end reads, hence the
//! occasional `rename`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Category assigned when a record carries none.
pub const DEFAULT_CATEGORY: &str = "General";

/// The provider category an item was fetched from.
///
/// Serialized as its display label (`"Hacker News"`, `"Stack Overflow"`, ...).
/// Labels that are not recognised deserialize as [`SourceKind::Web`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceKind {
    Reddit,
    HackerNews,
    StackOverflow,
    Quora,
    Rss,
    #[default]
    Web,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Reddit => "Reddit",
            SourceKind::HackerNews => "Hacker News",
            SourceKind::StackOverflow => "Stack Overflow",
            SourceKind::Quora => "Quora",
            SourceKind::Rss => "RSS",
            SourceKind::Web => "Web",
        }
    }

    /// Tag a feed by substring-matching its URL.
    pub fn from_feed_url(url: &str) -> Self {
        if url.contains("stackoverflow") {
            SourceKind::StackOverflow
        } else if url.contains("quora") {
            SourceKind::Quora
        } else {
            SourceKind::Rss
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for SourceKind {
    fn from(label: &str) -> Self {
        match label {
            "Reddit" => SourceKind::Reddit,
            "Hacker News" => SourceKind::HackerNews,
            "Stack Overflow" => SourceKind::StackOverflow,
            "Quora" => SourceKind::Quora,
            "RSS" => SourceKind::Rss,
            _ => SourceKind::Web,
        }
    }
}

impl Serialize for SourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for SourceKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map(SourceKind::from).unwrap_or_default())
    }
}

/// A post reduced to the common shape used for rendering.
///
/// `summary` is only set once the item survived summarization; items that
/// fail summarization never reach a persisted digest.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NormalizedItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: SourceKind,
    /// Upvotes or score. Feeds carry none.
    #[serde(
        default,
        deserialize_with = "deserialize_votes",
        skip_serializing_if = "Option::is_none"
    )]
    pub votes: Option<i64>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Plain-text context handed to the summarizer; never persisted.
    #[serde(skip)]
    pub snippet: Option<String>,
}

impl NormalizedItem {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source: SourceKind,
        votes: Option<i64>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source,
            votes,
            category: category.into(),
            summary: None,
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        let snippet = snippet.into();
        if !snippet.trim().is_empty() {
            self.snippet = Some(snippet);
        }
        self
    }

    /// Only items with both a title and a URL may be written to a digest.
    pub fn is_publishable(&self) -> bool {
        !self.title.trim().is_empty() && !self.url.trim().is_empty()
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Older digests store a missing vote count as `""`.
fn deserialize_votes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Votes {
        Count(i64),
        Text(String),
        Float(f64),
    }

    Ok(match Option::<Votes>::deserialize(deserializer)? {
        Some(Votes::Count(n)) => Some(n),
        Some(Votes::Text(s)) => s.trim().parse().ok(),
        Some(Votes::Float(f)) => Some(f as i64),
        None => None,
    })
}

/// One line of the archive index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArchiveEntry {
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Health summary consumed by the status page.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub date: String,
    pub sources: Vec<String>,
    pub summary_count: usize,
    pub last_updated: String,
}
