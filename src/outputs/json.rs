//! Digest file output.
//!
//! One pretty-printed JSON array of summarized items per UTC date, named
//! `{date}.json`. A rerun on the same day replaces that day's file; other
//! days are never touched.

use super::write_replacing;
use crate::models::NormalizedItem;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

pub fn digest_path(data_dir: &str, date: &str) -> PathBuf {
    Path::new(data_dir).join(format!("{date}.json"))
}

/// Write the day's digest and return the path written.
///
/// # Errors
///
/// Returns an error if serialization, directory creation or the write fails.
#[instrument(level = "info", skip_all, fields(%data_dir, %date, count = items.len()))]
pub async fn write_digest(
    data_dir: &str,
    date: &str,
    items: &[NormalizedItem],
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(items)?;

    if let Err(e) = fs::create_dir_all(data_dir).await {
        error!(%data_dir, error = %e, "Failed to create data dir");
        return Err(e.into());
    }

    let path = digest_path(data_dir, date);
    info!(path = %path.display(), "Writing digest");
    write_replacing(&path, json.as_bytes()).await?;
    info!(path = %path.display(), "Wrote digest");

    Ok(path)
}
