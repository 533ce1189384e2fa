//! Archive index and status record maintenance.
//!
//! - **`archives.json`**: every date with a digest, newest first. Updating
//!   replaces the entry for the same date instead of appending a duplicate.
//! - **`status.json`**: a small health summary of the latest run.

use super::write_replacing;
use crate::models::{ArchiveEntry, NormalizedItem, StatusRecord};
use chrono::{SecondsFormat, Utc};
use itertools::Itertools;
use std::collections::HashMap;
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

pub const ARCHIVE_FILE: &str = "archives.json";
pub const STATUS_FILE: &str = "status.json";

/// The up-to-three most frequent categories, most frequent first.
///
/// Ties keep the order in which categories first appear.
pub fn trending_label(items: &[NormalizedItem]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        *counts.entry(item.category.as_str()).or_default() += 1;
    }

    let label = items
        .iter()
        .map(|item| item.category.as_str())
        .unique()
        .sorted_by_key(|category| std::cmp::Reverse(counts[category]))
        .take(3)
        .join(", ");

    (!label.is_empty()).then_some(label)
}

/// Insert or replace `entry` in the archive index, keeping it newest first.
///
/// # Arguments
///
/// * `data_dir` - Directory holding `archives.json`
/// * `entry` - The date (and trending label) just published
///
/// # Returns
///
/// The index as written, newest first.
///
/// # Errors
///
/// A missing index starts fresh and an index that is not valid JSON is
/// logged and rebuilt from `entry`. Any other read failure is returned
/// without touching the file, so earlier dates are never dropped.
#[instrument(level = "info", skip_all, fields(%data_dir, date = %entry.date))]
pub async fn update_archive(
    data_dir: &str,
    entry: ArchiveEntry,
) -> Result<Vec<ArchiveEntry>, Box<dyn Error>> {
    let path = Path::new(data_dir).join(ARCHIVE_FILE);

    let mut entries: Vec<ArchiveEntry> = match fs::read_to_string(&path).await {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Archive index is not valid JSON; rebuilding");
            Vec::new()
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Archive index could not be read; leaving it alone");
            return Err(e.into());
        }
    };

    entries.retain(|existing| existing.date != entry.date);
    entries.push(entry);
    entries.sort_by(|a, b| b.date.cmp(&a.date));

    let json = serde_json::to_string_pretty(&entries)?;
    write_replacing(&path, json.as_bytes()).await?;
    info!(path = %path.display(), dates = entries.len(), "Updated archive index");
    Ok(entries)
}

/// Build the status record for a finished run.
pub fn status_for(date: &str, items: &[NormalizedItem]) -> StatusRecord {
    StatusRecord {
        date: date.to_string(),
        sources: items
            .iter()
            .map(|item| item.source.label().to_string())
            .unique()
            .collect(),
        summary_count: items.len(),
        last_updated: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

#[instrument(level = "info", skip_all, fields(%data_dir, date = %record.date))]
pub async fn write_status(data_dir: &str, record: &StatusRecord) -> Result<(), Box<dyn Error>> {
    let path = Path::new(data_dir).join(STATUS_FILE);
    let json = serde_json::to_string_pretty(record)?;
    write_replacing(&path, json.as_bytes()).await?;
    info!(path = %path.display(), summary_count = record.summary_count, "Wrote status record");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;

    fn item(category: &str, source: SourceKind) -> NormalizedItem {
        NormalizedItem::new("t", "u", source, None, category)
    }

    fn entry(date: &str, label: Option<&str>) -> ArchiveEntry {
        ArchiveEntry {
            date: date.to_string(),
            label: label.map(str::to_string),
        }
    }

    #[test]
    fn test_trending_label_orders_by_frequency() {
        let items = vec![
            item("General", SourceKind::Rss),
            item("Tech", SourceKind::Reddit),
            item("Tech", SourceKind::Reddit),
            item("Science", SourceKind::Rss),
            item("AI", SourceKind::Rss),
        ];
        assert_eq!(trending_label(&items).as_deref(), Some("Tech, General, Science"));
        assert_eq!(trending_label(&[]), None);
    }

    #[test]
    fn test_status_for_lists_distinct_sources() {
        let items = vec![
            item("Tech", SourceKind::Reddit),
            item("Tech", SourceKind::HackerNews),
            item("Tech", SourceKind::Reddit),
        ];
        let record = status_for("2025-05-06", &items);
        assert_eq!(record.sources, vec!["Reddit", "Hacker News"]);
        assert_eq!(record.summary_count, 3);
        assert!(record.last_updated.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_update_archive_replaces_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_str().unwrap();

        update_archive(dir, entry("2025-05-05", None)).await.unwrap();
        update_archive(dir, entry("2025-05-07", Some("Tech"))).await.unwrap();
        update_archive(dir, entry("2025-05-06", None)).await.unwrap();
        let entries = update_archive(dir, entry("2025-05-07", Some("General"))).await.unwrap();

        let dates: Vec<_> = entries.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-05-07", "2025-05-06", "2025-05-05"]);
        assert_eq!(entries[0].label.as_deref(), Some("General"));

        let raw = std::fs::read_to_string(tmp.path().join(ARCHIVE_FILE)).unwrap();
        let on_disk: Vec<ArchiveEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk, entries);
    }

    #[tokio::test]
    async fn test_update_archive_rebuilds_corrupt_index() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(ARCHIVE_FILE), "{not json").unwrap();

        let entries = update_archive(tmp.path().to_str().unwrap(), entry("2025-05-06", None))
            .await
            .unwrap();
        assert_eq!(entries, vec![entry("2025-05-06", None)]);
    }

    #[tokio::test]
    async fn test_write_status() {
        let tmp = tempfile::tempdir().unwrap();
        let record = status_for("2025-05-06", &[item("Tech", SourceKind::Quora)]);
        write_status(tmp.path().to_str().unwrap(), &record).await.unwrap();

        let raw = std::fs::read_to_string(tmp.path().join(STATUS_FILE)).unwrap();
        let back: StatusRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, record);
    }

    #[tokio::test]
    async fn test_update_archive_keeps_unreadable_index() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(ARCHIVE_FILE);
        let seeded = [b'[', 0xff, 0xfe, b']'];
        std::fs::write(&path, seeded).unwrap();

        let result = update_archive(tmp.path().to_str().unwrap(), entry("2025-05-06", None)).await;
        assert!(result.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), seeded);
    }
}
