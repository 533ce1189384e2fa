//! # Answeree Digest
//!
//! Builds a static daily digest from public sources (Reddit, Hacker News,
//! Stack Overflow, Quora and generic RSS feeds) and reads it back.
//!
//! ## Usage
//!
//! ```sh
//! answeree_digest -d ./data            # nightly aggregation run
//! answeree_digest show --category tech # read the newest digest
//! answeree_digest status               # last run's health summary
//! answeree_digest subscribe me@example.com
//! ```
//!
//! ## Architecture
//!
//! The aggregation run is a straight pipeline:
//! 1. **Fetching**: every source endpoint in turn; a failing source adds nothing
//! 2. **Normalizing**: one record shape, de-duplicated by URL and capped
//! 3. **Summarizing**: one Gemini call per item (bounded concurrency); failures are dropped
//! 4. **Output**: `{date}.json`, then `archives.json` and `status.json`

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod error;
mod fetchers;
mod models;
mod outputs;
mod sources;
mod subscribe;
mod utils;
mod viewer;

use api::{GeminiClient, summarize_all};
use cli::{Cli, Command, FetchArgs, ShowArgs};
use fetchers::{FetchLimits, dedupe_and_cap};
use models::ArchiveEntry;
use outputs::{indexes, json};
use sources::SourceRegistry;
use subscribe::{SUBSCRIBED_MESSAGE, SubscriberList};
use utils::{ensure_writable_dir, utc_today};
use viewer::{DigestPage, DigestStore, FsStore, HttpStore, PageState, PagerConfig, render};

const USER_AGENT: &str = concat!("AnswereeDigestBot/", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(data_dir = %args.data_dir, command = ?args.command, "Parsed CLI arguments");

    match args.command {
        None => run_digest(&args.data_dir, &args.fetch).await,
        Some(Command::Show(show)) => run_show(&args.data_dir, &show, args.fetch.timeout_secs).await,
        Some(Command::Status { remote }) => {
            run_status(&args.data_dir, remote.as_deref(), args.fetch.timeout_secs).await
        }
        Some(Command::Subscribe { email }) => run_subscribe(&args.data_dir, &email).await,
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

/// Fetch, summarize and publish today's digest.
#[instrument(level = "info", skip(fetch))]
async fn run_digest(data_dir: &str, fetch: &FetchArgs) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    info!("Digest run starting up");

    let gemini = fetch.gemini_config().map_err(|e| {
        error!(error = %e, "Summarizer is not configured");
        e
    })?;

    if let Err(e) = ensure_writable_dir(data_dir).await {
        error!(path = %data_dir, error = %e, "Data directory is not writable (fix perms or choose a different path)");
        return Err(e);
    }

    let registry = SourceRegistry::load(fetch.sources.as_deref())?;
    let client = http_client(fetch.timeout_secs)?;

    // ---- Fetch and normalize ----
    let limits = FetchLimits {
        concurrency: fetch.concurrency,
        ..FetchLimits::default()
    };
    let fetched = fetchers::fetch_all(&client, &registry, limits).await;
    let fetched_count = fetched.len();
    let items = dedupe_and_cap(fetched, fetch.max_items);
    info!(
        fetched = fetched_count,
        kept = items.len(),
        max_items = fetch.max_items,
        "Total items to summarize"
    );

    // ---- Summarize ----
    let summarizer = GeminiClient::new(client, gemini);
    let digest = summarize_all(&summarizer, items, fetch.concurrency).await;
    if digest.is_empty() {
        warn!("No items survived summarization; writing an empty digest");
    }

    // ---- Output ----
    let date = utc_today();
    json::write_digest(data_dir, &date, &digest).await?;

    let entry = ArchiveEntry {
        date: date.clone(),
        label: indexes::trending_label(&digest),
    };
    if let Err(e) = indexes::update_archive(data_dir, entry).await {
        error!(error = %e, "Failed to update archive index");
    }

    let status = indexes::status_for(&date, &digest);
    if let Err(e) = indexes::write_status(data_dir, &status).await {
        error!(error = %e, "Failed to write status record");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        %date,
        items = digest.len(),
        "Digest created"
    );
    Ok(())
}

async fn run_show(data_dir: &str, show: &ShowArgs, timeout_secs: u64) -> Result<(), Box<dyn Error>> {
    match show.remote.as_deref() {
        Some(base) => {
            let store = HttpStore::new(http_client(timeout_secs)?, base)?;
            show_from(store, show).await
        }
        None => show_from(FsStore::new(data_dir), show).await,
    }
}

async fn show_from<S: DigestStore>(store: S, show: &ShowArgs) -> Result<(), Box<dyn Error>> {
    let config = PagerConfig {
        direction: show.next_goes.into(),
    };
    let mut page = DigestPage::new(store, config);

    if let PageState::LoadFailed { message } = page.init().await {
        println!("{message}");
        return Ok(());
    }

    if let Some(date) = show.date.as_deref() {
        if !page.select_date(date).await {
            println!("No digest published for {date}.");
            return Ok(());
        }
    }
    for _ in 0..show.next {
        if !page.next().await {
            break;
        }
    }
    for _ in 0..show.prev {
        if !page.prev().await {
            break;
        }
    }

    if let Some(label) = page.date_label() {
        println!(
            "{label}  ({} of {})\n",
            page.current_index() + 1,
            page.archives().len()
        );
    }

    if !matches!(page.state(), PageState::PageLoaded { .. }) {
        println!("{}", page.message().unwrap_or(viewer::page::NO_POSTS_MESSAGE));
        return Ok(());
    }

    let visible = page.filter(&show.category);
    if visible.is_empty() {
        println!("No posts in category \"{}\".", show.category);
    } else {
        print!("{}", render::cards(visible));
    }
    Ok(())
}

async fn run_status(
    data_dir: &str,
    remote: Option<&str>,
    timeout_secs: u64,
) -> Result<(), Box<dyn Error>> {
    let result = match remote {
        Some(base) => HttpStore::new(http_client(timeout_secs)?, base)?.load_status().await,
        None => FsStore::new(data_dir).load_status().await,
    };
    match result {
        Ok(record) => print!("{}", render::status(&record)),
        Err(e) => {
            warn!(error = %e, "Failed to load status record");
            println!("Failed to load status data.");
        }
    }
    Ok(())
}

async fn run_subscribe(data_dir: &str, email: &str) -> Result<(), Box<dyn Error>> {
    let mut list = match SubscriberList::load(data_dir).await {
        Ok(list) => list,
        Err(e) => {
            error!(%data_dir, error = %e, "Subscriber list could not be read; not saving");
            return Err(e.into());
        }
    };
    if list.add(email) {
        list.save().await?;
    } else {
        debug!(%email, "Already subscribed or blank");
    }
    info!(subscribers = list.emails().len(), "Subscriber list up to date");
    println!("{SUBSCRIBED_MESSAGE}");
    Ok(())
}
