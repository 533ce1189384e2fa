//! Where the viewer reads published files from.
//!
//! [`FsStore`] reads a local data directory; [`HttpStore`] reads the same
//! layout from a published site (`{base}/archives.json`, `{base}/{date}.json`).

use crate::error::DigestResult;
use crate::fetchers::get_checked;
use crate::models::{ArchiveEntry, NormalizedItem, StatusRecord};
use crate::outputs::indexes::{ARCHIVE_FILE, STATUS_FILE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tracing::{debug, instrument};
use url::Url;

pub trait DigestStore {
    async fn load_archive(&self) -> DigestResult<Vec<ArchiveEntry>>;
    async fn load_digest(&self, date: &str) -> DigestResult<Vec<NormalizedItem>>;
    async fn load_status(&self) -> DigestResult<StatusRecord>;
}

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read<T: DeserializeOwned>(&self, name: &str) -> DigestResult<T> {
        let path = self.root.join(name);
        debug!(path = %path.display(), "Reading");
        let raw = tokio::fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl DigestStore for FsStore {
    async fn load_archive(&self) -> DigestResult<Vec<ArchiveEntry>> {
        self.read(ARCHIVE_FILE).await
    }

    async fn load_digest(&self, date: &str) -> DigestResult<Vec<NormalizedItem>> {
        self.read(&format!("{date}.json")).await
    }

    async fn load_status(&self) -> DigestResult<StatusRecord> {
        self.read(STATUS_FILE).await
    }
}

#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base: Url,
}

impl HttpStore {
    /// `base` is the URL of the data directory, e.g. `https://site.example/data/`.
    pub fn new(client: Client, base: &str) -> DigestResult<Self> {
        let base = if base.ends_with('/') {
            Url::parse(base)?
        } else {
            Url::parse(&format!("{base}/"))?
        };
        Ok(Self { client, base })
    }

    #[instrument(level = "debug", skip(self))]
    async fn get<T: DeserializeOwned>(&self, name: &str) -> DigestResult<T> {
        let url = self.base.join(name)?;
        Ok(get_checked(&self.client, url.as_str()).await?.json().await?)
    }
}

impl DigestStore for HttpStore {
    async fn load_archive(&self) -> DigestResult<Vec<ArchiveEntry>> {
        self.get(ARCHIVE_FILE).await
    }

    async fn load_digest(&self, date: &str) -> DigestResult<Vec<NormalizedItem>> {
        self.get(&format!("{date}.json")).await
    }

    async fn load_status(&self) -> DigestResult<StatusRecord> {
        self.get(STATUS_FILE).await
    }
}
