//! Reddit listing fetcher.
//!
//! Reads a listing endpoint such as
//! `https://www.reddit.com/r/technology/top.json?t=day&limit=5` and keeps the
//! first `cap` posts.

use super::get_checked;
use crate::error::DigestResult;
use crate::models::{NormalizedItem, SourceKind};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

const REDDIT_BASE: &str = "https://reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    selftext: String,
}

impl From<Post> for NormalizedItem {
    fn from(post: Post) -> Self {
        NormalizedItem::new(
            post.title,
            format!("{REDDIT_BASE}{}", post.permalink),
            SourceKind::Reddit,
            Some(post.ups),
            "Tech",
        )
        .with_snippet(post.selftext)
    }
}

/// Fetch one Reddit listing and normalize its first `cap` posts.
///
/// # Arguments
///
/// * `client` - Shared HTTP client (its timeout applies)
/// * `url` - Listing endpoint, e.g. `.../r/technology/top.json?t=day`
/// * `cap` - Maximum number of posts kept
///
/// # Returns
///
/// Items with `https://reddit.com{permalink}` URLs, `ups` as votes and the
/// `Tech` category. A non-success status or a body that is not a listing is
/// an error.
#[instrument(level = "info", skip(client))]
pub async fn fetch(client: &Client, url: &str, cap: usize) -> DigestResult<Vec<NormalizedItem>> {
    let listing: Listing = get_checked(client, url).await?.json().await?;
    let items: Vec<NormalizedItem> = listing
        .data
        .children
        .into_iter()
        .take(cap)
        .map(|child| NormalizedItem::from(child.data))
        .collect();
    debug!(count = items.len(), "Parsed Reddit listing");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_maps_listing_children() {
        let server = MockServer::start().await;
        let children: Vec<_> = (0..7)
            .map(|i| {
                serde_json::json!({
                    "data": {
                        "title": format!("Post {i}"),
                        "permalink": format!("/r/rust/comments/{i}/post/"),
                        "ups": 100 + i,
                        "selftext": ""
                    }
                })
            })
            .collect();
        let body = serde_json::json!({ "data": { "children": children } });

        Mock::given(method("GET"))
            .and(path("/r/rust/top.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let url = format!("{}/r/rust/top.json", server.uri());
        let items = fetch(&Client::new(), &url, 5).await.unwrap();

        assert_eq!(items.len(), 5);
        assert_eq!(items[0].title, "Post 0");
        assert_eq!(items[0].url, "https://reddit.com/r/rust/comments/0/post/");
        assert_eq!(items[0].source, SourceKind::Reddit);
        assert_eq!(items[0].votes, Some(100));
        assert_eq!(items[0].category, "Tech");
        assert_eq!(items[0].snippet, None);
    }

    #[tokio::test]
    async fn test_fetch_errors_on_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let url = format!("{}/r/rust/top.json", server.uri());
        assert!(fetch(&Client::new(), &url, 5).await.is_err());
    }
}
