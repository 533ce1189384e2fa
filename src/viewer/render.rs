//! Plain-text rendering of digest cards and the status record.

use crate::models::{NormalizedItem, StatusRecord};
use std::fmt::Write;

/// Render one card per item:
///
/// ```text
/// [Hacker News] Tech ▲ 120
/// Title of the post
/// Two or three lines of summary.
/// View Source → https://example.com/post
/// ```
pub fn cards<'a>(items: impl IntoIterator<Item = &'a NormalizedItem>) -> String {
    let mut out = String::new();
    for item in items {
        if !out.is_empty() {
            out.push('\n');
        }
        card(&mut out, item);
    }
    out
}

fn card(out: &mut String, item: &NormalizedItem) {
    let _ = writeln!(
        out,
        "[{}] {} ▲ {}",
        item.source,
        item.category,
        item.votes.unwrap_or(0)
    );
    let _ = writeln!(out, "{}", item.title);
    if let Some(summary) = item.summary.as_deref() {
        let _ = writeln!(out, "{}", summary.trim());
    }
    let link = if item.url.is_empty() { "#" } else { item.url.as_str() };
    let _ = writeln!(out, "View Source → {link}");
}

pub fn status(record: &StatusRecord) -> String {
    format!(
        "Date:          {}\nSources:       {}\nSummaries:     {}\nLast updated:  {}\n",
        record.date,
        record.sources.join(", "),
        record.summary_count,
        record.last_updated
    )
}
