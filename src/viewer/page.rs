//! Paginated digest reader.
//!
//! [`DigestPage`] owns everything one reading session needs: the sorted
//! archive, the current position, and a per-date cache. It moves through
//! these states:
//!
//! ```text
//! Uninitialized ──init──> ArchiveLoaded ──load──> PageLoaded(date) <──older/newer──> PageLoaded(date')
//!       │                       ^                        │
//!       └──archive missing──> LoadFailed                 └──digest missing──> ArchiveLoaded + message
//! ```
//!
//! Index 0 is the newest date. By default "next" moves to an older date.
//!
//! Every load takes a [`LoadTicket`]; only the ticket issued last may update
//! what is shown, so a slow response for a date the reader already moved
//! away from is cached but not displayed.

use super::store::DigestStore;
use crate::error::DigestResult;
use crate::models::{ArchiveEntry, NormalizedItem};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub const NO_DATA_MESSAGE: &str = "No digests have been published yet.";
pub const ARCHIVE_FAILED_MESSAGE: &str = "Failed to load the archive.";
pub const NO_POSTS_MESSAGE: &str = "No posts found for this date.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Uninitialized,
    ArchiveLoaded,
    PageLoaded { date: String },
    /// Terminal: there is no archive to page through.
    LoadFailed { message: String },
}

/// Which way the "next" control moves through the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PagerDirection {
    #[default]
    NextIsOlder,
    NextIsNewer,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PagerConfig {
    pub direction: PagerDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    token: u64,
    date: String,
}

impl LoadTicket {
    pub fn date(&self) -> &str {
        &self.date
    }
}

#[derive(Debug)]
pub struct DigestPage<S> {
    store: S,
    config: PagerConfig,
    archives: Vec<ArchiveEntry>,
    current_index: usize,
    cache: HashMap<String, Vec<NormalizedItem>>,
    state: PageState,
    message: Option<String>,
    latest_token: u64,
}

impl<S: DigestStore> DigestPage<S> {
    pub fn new(store: S, config: PagerConfig) -> Self {
        Self {
            store,
            config,
            archives: Vec::new(),
            current_index: 0,
            cache: HashMap::new(),
            state: PageState::Uninitialized,
            message: None,
            latest_token: 0,
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn archives(&self) -> &[ArchiveEntry] {
        &self.archives
    }

    /// The inline message shown instead of posts, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[cfg(test)]
    pub fn is_cached(&self, date: &str) -> bool {
        self.cache.contains_key(date)
    }

    /// Load the archive index and show the newest date.
    ///
    /// Only acts from [`PageState::Uninitialized`].
    pub async fn init(&mut self) -> &PageState {
        if self.state != PageState::Uninitialized {
            return &self.state;
        }

        match self.store.load_archive().await {
            Ok(entries) if entries.is_empty() => {
                info!("Archive index is empty");
                self.fail(NO_DATA_MESSAGE);
            }
            Ok(mut entries) => {
                entries.sort_by(|a, b| b.date.cmp(&a.date));
                info!(dates = entries.len(), newest = %entries[0].date, "Loaded archive index");
                self.archives = entries;
                self.current_index = 0;
                self.state = PageState::ArchiveLoaded;
                self.load_current().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load archive index");
                self.fail(ARCHIVE_FAILED_MESSAGE);
            }
        }
        &self.state
    }

    fn fail(&mut self, message: &str) {
        self.state = PageState::LoadFailed {
            message: message.to_string(),
        };
        self.message = Some(message.to_string());
    }

    /// Issue a ticket for the date at the current index. Any earlier ticket
    /// becomes stale.
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        let entry = self.archives.get(self.current_index)?;
        self.latest_token += 1;
        Some(LoadTicket {
            token: self.latest_token,
            date: entry.date.clone(),
        })
    }

    /// Apply a load result. Successful results are always cached; the view
    /// only changes for the latest ticket. Returns whether it was applied.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: DigestResult<Vec<NormalizedItem>>) -> bool {
        let current = ticket.token == self.latest_token;

        match result {
            Ok(items) => {
                self.cache.entry(ticket.date.clone()).or_insert(items);
                if !current {
                    debug!(date = %ticket.date, "Discarding stale digest response");
                    return false;
                }
                self.message = None;
                self.state = PageState::PageLoaded { date: ticket.date };
            }
            Err(e) => {
                if !current {
                    debug!(date = %ticket.date, error = %e, "Ignoring stale digest failure");
                    return false;
                }
                warn!(date = %ticket.date, error = %e, "Failed to load digest");
                self.message = Some(NO_POSTS_MESSAGE.to_string());
                self.state = PageState::ArchiveLoaded;
            }
        }
        true
    }

    /// Show the date at the current index, from cache when possible.
    pub async fn load_current(&mut self) {
        let Some(ticket) = self.begin_load() else {
            return;
        };

        let result = match self.cache.get(ticket.date()) {
            Some(items) => {
                debug!(date = %ticket.date, "Digest cache hit");
                Ok(items.clone())
            }
            None => self.store.load_digest(ticket.date()).await,
        };
        self.finish_load(ticket, result);
    }

    /// Step to the next older date. No-op at the oldest date.
    pub async fn older(&mut self) -> bool {
        if self.current_index + 1 >= self.archives.len() {
            return false;
        }
        self.current_index += 1;
        self.load_current().await;
        true
    }

    /// Step to the next newer date. No-op at the newest date.
    pub async fn newer(&mut self) -> bool {
        if self.current_index == 0 || self.archives.is_empty() {
            return false;
        }
        self.current_index -= 1;
        self.load_current().await;
        true
    }

    pub async fn next(&mut self) -> bool {
        match self.config.direction {
            PagerDirection::NextIsOlder => self.older().await,
            PagerDirection::NextIsNewer => self.newer().await,
        }
    }

    pub async fn prev(&mut self) -> bool {
        match self.config.direction {
            PagerDirection::NextIsOlder => self.newer().await,
            PagerDirection::NextIsNewer => self.older().await,
        }
    }

    /// Jump to `date` if the archive lists it.
    pub async fn select_date(&mut self, date: &str) -> bool {
        let Some(index) = self.archives.iter().position(|e| e.date == date) else {
            return false;
        };
        self.current_index = index;
        self.load_current().await;
        true
    }

    /// Items of the shown date whose category matches, case-insensitively.
    /// `"all"` keeps everything in order. Never touches the store.
    pub fn filter(&self, category: &str) -> Vec<&NormalizedItem> {
        let PageState::PageLoaded { date } = &self.state else {
            return Vec::new();
        };
        let Some(items) = self.cache.get(date) else {
            return Vec::new();
        };
        if category.eq_ignore_ascii_case("all") {
            return items.iter().collect();
        }
        let wanted = category.to_lowercase();
        items
            .iter()
            .filter(|item| item.category.to_lowercase() == wanted)
            .collect()
    }

    /// Human-readable label for the current date, e.g. `Tue May 06 2025 · Tech`.
    pub fn date_label(&self) -> Option<String> {
        let entry = self.archives.get(self.current_index)?;
        let date = NaiveDate::parse_from_str(&entry.date, "%Y-%m-%d")
            .map(|d| d.format("%a %b %d %Y").to_string())
            .unwrap_or_else(|_| entry.date.clone());
        Some(match &entry.label {
            Some(label) => format!("{date} · {label}"),
            None => date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DigestError;
    use crate::models::{SourceKind, StatusRecord};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        archive: Option<Vec<ArchiveEntry>>,
        digests: HashMap<String, Vec<NormalizedItem>>,
        fetches: Mutex<Vec<String>>,
    }

    impl MemoryStore {
        fn with_dates(dates: &[&str]) -> Self {
            let archive = dates
                .iter()
                .map(|d| ArchiveEntry {
                    date: d.to_string(),
                    label: None,
                })
                .collect();
            let digests = dates
                .iter()
                .map(|d| (d.to_string(), vec![item(&format!("post {d}"), "Tech")]))
                .collect();
            Self {
                archive: Some(archive),
                digests,
                fetches: Mutex::new(Vec::new()),
            }
        }

        fn fetch_count(&self, date: &str) -> usize {
            self.fetches.lock().unwrap().iter().filter(|d| *d == date).count()
        }
    }

    impl DigestStore for MemoryStore {
        async fn load_archive(&self) -> DigestResult<Vec<ArchiveEntry>> {
            self.archive
                .clone()
                .ok_or_else(|| DigestError::Config("no archive".to_string()))
        }

        async fn load_digest(&self, date: &str) -> DigestResult<Vec<NormalizedItem>> {
            self.fetches.lock().unwrap().push(date.to_string());
            self.digests
                .get(date)
                .cloned()
                .ok_or_else(|| DigestError::Config(format!("no digest for {date}")))
        }

        async fn load_status(&self) -> DigestResult<StatusRecord> {
            Err(DigestError::Config("no status".to_string()))
        }
    }

    fn item(title: &str, category: &str) -> NormalizedItem {
        NormalizedItem::new(title, format!("https://x/{title}"), SourceKind::Reddit, Some(1), category)
    }

    async fn loaded(dates: &[&str]) -> DigestPage<MemoryStore> {
        let mut page = DigestPage::new(MemoryStore::with_dates(dates), PagerConfig::default());
        page.init().await;
        page
    }

    #[tokio::test]
    async fn test_init_shows_newest_date_regardless_of_stored_order() {
        let page = loaded(&["2025-05-04", "2025-05-06", "2025-05-05"]).await;
        assert_eq!(page.current_index(), 0);
        assert_eq!(
            page.state(),
            &PageState::PageLoaded {
                date: "2025-05-06".to_string()
            }
        );
        assert_eq!(page.date_label().as_deref(), Some("Tue May 06 2025"));
    }

    #[tokio::test]
    async fn test_empty_archive_is_no_data() {
        let mut page = DigestPage::new(MemoryStore::with_dates(&[]), PagerConfig::default());
        let state = page.init().await.clone();
        assert!(matches!(state, PageState::LoadFailed { .. }));
        assert_eq!(page.message(), Some(NO_DATA_MESSAGE));
        assert!(!page.older().await);
    }

    #[tokio::test]
    async fn test_archive_failure_is_reported_without_panicking() {
        let mut page = DigestPage::new(MemoryStore::default(), PagerConfig::default());
        page.init().await;
        assert_eq!(
            page.state(),
            &PageState::LoadFailed {
                message: ARCHIVE_FAILED_MESSAGE.to_string()
            }
        );
        assert_eq!(page.current_index(), 0);
        assert_eq!(page.date_label(), None);
        assert!(page.filter("all").is_empty());
    }

    #[tokio::test]
    async fn test_navigation_is_bounded() {
        let mut page = loaded(&["2025-05-06", "2025-05-05"]).await;

        assert!(!page.newer().await);
        assert_eq!(page.current_index(), 0);

        assert!(page.older().await);
        assert_eq!(page.current_index(), 1);
        assert!(!page.older().await);
        assert_eq!(page.current_index(), 1);
        assert_eq!(
            page.state(),
            &PageState::PageLoaded {
                date: "2025-05-05".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_next_moves_older_by_default() {
        let mut page = loaded(&["2025-05-06", "2025-05-05"]).await;
        assert!(page.next().await);
        assert_eq!(page.current_index(), 1);
        assert!(page.prev().await);
        assert_eq!(page.current_index(), 0);
    }

    #[tokio::test]
    async fn test_next_can_move_newer() {
        let store = MemoryStore::with_dates(&["2025-05-06", "2025-05-05"]);
        let mut page = DigestPage::new(
            store,
            PagerConfig {
                direction: PagerDirection::NextIsNewer,
            },
        );
        page.init().await;
        assert!(!page.next().await);
        assert!(page.prev().await);
        assert_eq!(page.current_index(), 1);
    }

    #[tokio::test]
    async fn test_same_date_fetched_once() {
        let mut page = loaded(&["2025-05-06", "2025-05-05"]).await;
        page.older().await;
        page.newer().await;
        page.older().await;

        assert_eq!(page.store.fetch_count("2025-05-06"), 1);
        assert_eq!(page.store.fetch_count("2025-05-05"), 1);
        assert!(page.is_cached("2025-05-05"));
    }

    #[tokio::test]
    async fn test_missing_digest_shows_message_and_keeps_index() {
        let mut store = MemoryStore::with_dates(&["2025-05-06", "2025-05-05"]);
        store.digests.remove("2025-05-05");
        let mut page = DigestPage::new(store, PagerConfig::default());
        page.init().await;

        assert!(page.older().await);
        assert_eq!(page.current_index(), 1);
        assert_eq!(page.state(), &PageState::ArchiveLoaded);
        assert_eq!(page.message(), Some(NO_POSTS_MESSAGE));
        assert!(page.filter("all").is_empty());

        assert!(page.newer().await);
        assert_eq!(page.message(), None);
    }

    #[tokio::test]
    async fn test_filter_by_category() {
        let mut store = MemoryStore::with_dates(&["2025-05-06"]);
        store.digests.insert(
            "2025-05-06".to_string(),
            vec![item("A", "Tech"), item("B", "General"), item("C", "tech")],
        );
        let mut page = DigestPage::new(store, PagerConfig::default());
        page.init().await;

        let all: Vec<_> = page.filter("all").iter().map(|i| i.title.as_str()).collect();
        assert_eq!(all, vec!["A", "B", "C"]);

        let tech: Vec<_> = page.filter("tech").iter().map(|i| i.title.as_str()).collect();
        assert_eq!(tech, vec!["A", "C"]);

        assert!(page.filter("Science").is_empty());
        assert_eq!(page.store.fetch_count("2025-05-06"), 1);
    }

    #[tokio::test]
    async fn test_stale_response_is_cached_but_not_shown() {
        let mut page = loaded(&["2025-05-06", "2025-05-05"]).await;

        page.current_index = 1;
        let slow = page.begin_load().unwrap();
        page.current_index = 0;
        let fast = page.begin_load().unwrap();

        assert!(page.finish_load(fast, Ok(vec![item("newest", "Tech")])));
        assert!(!page.finish_load(slow, Ok(vec![item("older", "Tech")])));

        assert_eq!(
            page.state(),
            &PageState::PageLoaded {
                date: "2025-05-06".to_string()
            }
        );
        assert!(page.is_cached("2025-05-05"));
    }

    #[tokio::test]
    async fn test_select_date_and_label() {
        let mut store = MemoryStore::with_dates(&["2025-05-06", "2025-05-05"]);
        store.archive.as_mut().unwrap()[1].label = Some("Tech, General".to_string());
        let mut page = DigestPage::new(store, PagerConfig::default());
        page.init().await;

        assert!(page.select_date("2025-05-05").await);
        assert_eq!(page.current_index(), 1);
        assert_eq!(page.date_label().as_deref(), Some("Mon May 05 2025 · Tech, General"));
        assert!(!page.select_date("1999-01-01").await);
    }
}
