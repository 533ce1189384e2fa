//! Command-line interface definitions.
//!
//! Running without a subcommand performs the nightly aggregation run. Every
//! option can also come from the environment.
//!
//! ```sh
//! # Nightly run into ./data
//! GEMINI_API_KEY=... answeree_digest --sources scripts/sources.json
//!
//! # Read the newest digest, tech posts only
//! answeree_digest show --category tech
//!
//! # Read a published site instead of the local data dir
//! answeree_digest show --remote https://digest.example/data --next 2
//! ```

use crate::api::GeminiConfig;
use crate::error::DigestError;
use crate::viewer::PagerDirection;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the digest files, archive index and status record
    #[arg(short, long, env = "DIGEST_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: String,

    #[command(flatten)]
    pub fetch: FetchArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Source registry file (YAML or JSON); built-in sources when omitted
    #[arg(short, long, env = "DIGEST_SOURCES")]
    pub sources: Option<PathBuf>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.5-flash-lite")]
    pub gemini_model: String,

    #[arg(long, env = "GEMINI_ENDPOINT", default_value = "https://generativelanguage.googleapis.com")]
    pub gemini_endpoint: String,

    /// Per-request timeout in seconds, for sources, Gemini and `--remote` reads
    #[arg(long, env = "DIGEST_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,

    /// Maximum concurrent story lookups and summarization calls
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Maximum items kept after de-duplication
    #[arg(long, default_value_t = 30)]
    pub max_items: usize,
}

impl FetchArgs {
    /// Validate the summarizer settings before any network call is made.
    pub fn gemini_config(&self) -> Result<GeminiConfig, DigestError> {
        let api_key = self
            .gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                DigestError::Config("GEMINI_API_KEY must be set (or pass --gemini-api-key)".to_string())
            })?;
        url::Url::parse(&self.gemini_endpoint)?;
        Ok(GeminiConfig {
            api_key: api_key.to_string(),
            model: self.gemini_model.clone(),
            endpoint: self.gemini_endpoint.clone(),
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a published digest
    Show(ShowArgs),
    /// Print the status record of the latest run
    Status {
        /// Base URL of a published data directory
        #[arg(long)]
        remote: Option<String>,
    },
    /// Add an email address to the local subscriber list
    Subscribe { email: String },
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Base URL of a published data directory; reads --data-dir when omitted
    #[arg(long)]
    pub remote: Option<String>,

    /// Open this date (YYYY-MM-DD) instead of the newest
    #[arg(long)]
    pub date: Option<String>,

    /// Press "next" this many times
    #[arg(long, default_value_t = 0)]
    pub next: usize,

    /// Press "previous" this many times (after --next)
    #[arg(long, default_value_t = 0)]
    pub prev: usize,

    /// Which way "next" moves through the archive
    #[arg(long, value_enum, default_value_t = Direction::Older)]
    pub next_goes: Direction,

    /// Category filter; "all" shows everything
    #[arg(short, long, default_value = "all")]
    pub category: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Older,
    Newer,
}

impl From<Direction> for PagerDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Older => PagerDirection::NextIsOlder,
            Direction::Newer => PagerDirection::NextIsNewer,
        }
    }
}
