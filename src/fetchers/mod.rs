//! Source fetchers that pull raw posts and normalize them.
//!
//! Each fetcher takes one endpoint and returns [`NormalizedItem`]s:
//!
//! | Source | Module | Method | Cap |
//! |--------|--------|--------|-----|
//! | Reddit | [`reddit`] | Listing JSON | 5 posts |
//! | Hacker News | [`hackernews`] | ID list, then one call per story | 10 IDs |
//! | Stack Overflow / Quora / RSS | [`rss`] | RSS or Atom XML | 5 entries |
//!
//! [`fetch_all`] runs every configured endpoint in turn. A failing endpoint
//! is logged and contributes nothing; the run carries on with the rest.

pub mod hackernews;
pub mod reddit;
pub mod rss;

use crate::error::{DigestError, DigestResult};
use crate::models::NormalizedItem;
use crate::sources::SourceRegistry;
use itertools::Itertools;
use reqwest::{Client, Response};
use tracing::{info, instrument, warn};

/// Per-source caps and the HN fan-out width.
#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    pub per_source: usize,
    pub hn_candidates: usize,
    pub concurrency: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            per_source: 5,
            hn_candidates: 10,
            concurrency: 4,
        }
    }
}

/// GET `url`, failing on a non-success status.
pub(crate) async fn get_checked(client: &Client, url: &str) -> DigestResult<Response> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(DigestError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp)
}

/// Fetch every endpoint in the registry and merge the results.
///
/// Sources run one after another in registry order (Reddit, Hacker News,
/// then feeds). Items missing a title or URL are dropped.
#[instrument(level = "info", skip_all, fields(endpoints = registry.endpoint_count()))]
pub async fn fetch_all(
    client: &Client,
    registry: &SourceRegistry,
    limits: FetchLimits,
) -> Vec<NormalizedItem> {
    let mut items = Vec::new();

    for url in &registry.reddit {
        let result = reddit::fetch(client, url, limits.per_source).await;
        collect(&mut items, "reddit", url, result);
    }

    for url in &registry.hackernews {
        let result = hackernews::fetch(
            client,
            url,
            &registry.hackernews_item_base,
            limits.hn_candidates,
            limits.concurrency,
        )
        .await;
        collect(&mut items, "hackernews", url, result);
    }

    for url in registry.feeds() {
        let result = rss::fetch(client, url, limits.per_source).await;
        collect(&mut items, "feed", url, result);
    }

    info!(count = items.len(), "Fetched items from all sources");
    items
}

fn collect(
    items: &mut Vec<NormalizedItem>,
    kind: &str,
    url: &str,
    result: DigestResult<Vec<NormalizedItem>>,
) {
    match result {
        Ok(fetched) => {
            let before = fetched.len();
            let publishable: Vec<_> = fetched.into_iter().filter(|i| i.is_publishable()).collect();
            info!(kind, %url, count = publishable.len(), dropped = before - publishable.len(), "Fetched source");
            items.extend(publishable);
        }
        Err(e) => {
            warn!(kind, %url, error = %e, "Source fetch failed; contributing no items");
        }
    }
}

/// Drop repeated posts (same URL, or same title when the URL is blank) and
/// keep at most `max_items`, preserving first-seen order.
pub fn dedupe_and_cap(items: Vec<NormalizedItem>, max_items: usize) -> Vec<NormalizedItem> {
    items
        .into_iter()
        .unique_by(|item| {
            let url = item.url.trim();
            if url.is_empty() {
                item.title.trim().to_string()
            } else {
                url.to_string()
            }
        })
        .take(max_items)
        .collect()
}
