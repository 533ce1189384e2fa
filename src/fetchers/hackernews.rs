//! Hacker News fetcher.
//!
//! Two phases: read the story ID list, then fetch each story from
//! `{item_base}/{id}.json`. Story lookups fan out through a bounded
//! `buffered` stream so at most `concurrency` requests are in flight and the
//! ID order is kept. A story that fails to load, or has no title or URL, is
//! skipped without failing the batch.

use super::get_checked;
use crate::error::DigestResult;
use crate::models::{NormalizedItem, SourceKind};
use crate::utils::strip_html;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
struct HnItem {
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    score: i64,
    text: Option<String>,
}

impl HnItem {
    fn into_normalized(self) -> Option<NormalizedItem> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let url = self.url.filter(|u| !u.trim().is_empty())?;
        let snippet = self.text.as_deref().map(strip_html).unwrap_or_default();
        Some(
            NormalizedItem::new(title, url, SourceKind::HackerNews, Some(self.score), "Tech")
                .with_snippet(snippet),
        )
    }
}

/// Fetch the top Hacker News stories.
///
/// # Arguments
///
/// * `ids_url` - Story ID list endpoint (e.g. `topstories.json`)
/// * `item_base` - Base URL for `{id}.json` lookups
/// * `cap` - Number of candidate IDs looked up
/// * `concurrency` - Maximum story lookups in flight
///
/// # Returns
///
/// Stories in ID order. Only a failure of the ID list itself is an error;
/// individual story failures and timeouts are skipped.
#[instrument(level = "info", skip(client))]
pub async fn fetch(
    client: &Client,
    ids_url: &str,
    item_base: &str,
    cap: usize,
    concurrency: usize,
) -> DigestResult<Vec<NormalizedItem>> {
    let ids: Vec<u64> = get_checked(client, ids_url).await?.json().await?;
    let ids: Vec<u64> = ids.into_iter().take(cap).collect();
    info!(count = ids.len(), "Fetched Hacker News story IDs");

    let base = item_base.trim_end_matches('/');
    let items: Vec<NormalizedItem> = stream::iter(ids)
        .map(|id| async move {
            match fetch_story(client, base, id).await {
                Ok(Some(item)) => item.into_normalized().or_else(|| {
                    debug!(id, "Story has no title or url; skipping");
                    None
                }),
                Ok(None) => {
                    debug!(id, "Story is null; skipping");
                    None
                }
                Err(e) => {
                    warn!(id, error = %e, "Story fetch failed; skipping");
                    None
                }
            }
        })
        .buffered(concurrency.max(1))
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(count = items.len(), "Fetched Hacker News stories");
    Ok(items)
}

/// Deleted stories come back as JSON `null`.
async fn fetch_story(client: &Client, base: &str, id: u64) -> DigestResult<Option<HnItem>> {
    let url = format!("{base}/{id}.json");
    Ok(get_checked(client, &url).await?.json().await?)
}
