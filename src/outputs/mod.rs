//! Output generation for the digest, the archive index and the status record.
//!
//! # Submodules
//!
//! - [`json`]: writes the day's digest as `{date}.json`
//! - [`indexes`]: maintains `archives.json` and `status.json`
//!
//! # Output Structure
//!
//! ```text
//! data_dir/
//! ├── 2025-05-05.json
//! ├── 2025-05-06.json
//! ├── archives.json   # [{date, label?}], newest first
//! └── status.json     # {date, sources, summaryCount, lastUpdated}
//! ```

pub mod indexes;
pub mod json;

use std::error::Error;
use std::path::Path;
use tokio::fs;

/// Write `bytes` next to `path` and rename over it, so readers never see a
/// half-written file.
pub(crate) async fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), Box<dyn Error>> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
