//! RSS and Atom feed fetcher, used for Stack Overflow, Quora and generic feeds.
//!
//! The feed's source kind comes from its URL (see
//! [`SourceKind::from_feed_url`]). Feed entries carry no vote count.

use super::get_checked;
use crate::error::DigestResult;
use crate::models::{NormalizedItem, SourceKind};
use crate::utils::{collapse_whitespace, strip_html};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use reqwest::Client;
use tracing::{debug, instrument};

/// One `<item>` (RSS) or `<entry>` (Atom) as read from the feed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// Fetch one RSS or Atom feed and normalize up to `cap` entries.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `url` - Feed URL; also decides the [`SourceKind`]
/// * `cap` - Maximum number of entries kept
///
/// # Returns
///
/// Items in feed order with no votes and the `General` category, or an
/// error if the request fails or the XML is malformed.
#[instrument(level = "info", skip(client))]
pub async fn fetch(client: &Client, url: &str, cap: usize) -> DigestResult<Vec<NormalizedItem>> {
    let xml = get_checked(client, url).await?.text().await?;
    let source = SourceKind::from_feed_url(url);
    let items: Vec<NormalizedItem> = parse_feed(&xml, cap)?
        .into_iter()
        .map(|entry| {
            NormalizedItem::new(entry.title, entry.link, source, None, "General")
                .with_snippet(entry.description)
        })
        .collect();
    debug!(count = items.len(), %source, "Parsed feed");
    Ok(items)
}

/// Parse up to `cap` entries from an RSS or Atom document.
///
/// Titles and links are whitespace-collapsed; descriptions (`description`,
/// `summary`, `content` or `content:encoded`) are reduced to plain text.
pub fn parse_feed(xml: &str, cap: usize) -> DigestResult<Vec<FeedEntry>> {
    if cap == 0 {
        return Ok(Vec::new());
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current = FeedEntry::default();
    let mut in_entry = false;
    let mut current_tag = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(&e);
                if is_entry_tag(&name) {
                    in_entry = true;
                    current = FeedEntry::default();
                } else if in_entry && name == "link" && current.link.is_empty() {
                    current.link = href(&e).unwrap_or_default();
                }
                current_tag = name;
            }
            Event::Empty(e) => {
                if in_entry && local_name(&e) == "link" && current.link.is_empty() {
                    current.link = href(&e).unwrap_or_default();
                }
            }
            Event::Text(e) => {
                if in_entry {
                    let text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                    append_field(&mut current, &current_tag, &text);
                }
            }
            Event::CData(e) => {
                if in_entry {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    append_field(&mut current, &current_tag, &text);
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if in_entry && is_entry_tag(&name) {
                    in_entry = false;
                    entries.push(finish(std::mem::take(&mut current)));
                    if entries.len() >= cap {
                        break;
                    }
                }
                current_tag.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

fn is_entry_tag(name: &str) -> bool {
    name == "item" || name == "entry"
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Atom links carry the target in `href`; prefer it over element text.
fn href(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"href")
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn append_field(entry: &mut FeedEntry, tag: &str, text: &str) {
    let field = match tag {
        "title" => &mut entry.title,
        "link" => &mut entry.link,
        "description" | "summary" | "content" | "encoded" => &mut entry.description,
        _ => return,
    };
    if !field.is_empty() {
        field.push(' ');
    }
    field.push_str(text);
}

fn finish(entry: FeedEntry) -> FeedEntry {
    FeedEntry {
        title: collapse_whitespace(&entry.title),
        link: entry.link.trim().to_string(),
        description: strip_html(&entry.description),
    }
}
