//! Summarization through the Gemini `generateContent` REST API.
//!
//! - [`Summarize`]: the seam the pipeline depends on
//! - [`GeminiClient`]: the production implementation
//! - [`summarize_all`]: runs every item through a summarizer
//!
//! Each item gets exactly one attempt. An item whose call fails (network,
//! timeout, quota, empty or malformed response) is logged and left out of
//! the digest; it is never retried and never kept with a placeholder.

use crate::error::{DigestError, DigestResult};
use crate::models::NormalizedItem;
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Summaries longer than this are cut at a char boundary.
const MAX_SUMMARY_CHARS: usize = 400;

/// Something that can produce a short synopsis of an item.
pub trait Summarize {
    async fn summarize(&self, item: &NormalizedItem) -> DigestResult<String>;
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Scheme and host, e.g. `https://generativelanguage.googleapis.com`.
    pub endpoint: String,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Build the digest prompt for one item.
///
/// Falls back to the item URL when no text snippet is available.
pub fn build_prompt(item: &NormalizedItem) -> String {
    let text = item.snippet.as_deref().unwrap_or(&item.url);
    format!(
        "Summarize briefly in 2-3 lines for a daily digest.\n\
         Keep it factual and easy to read.\n\
         Title: {}\n\
         Source: {}\n\
         Text: {}",
        item.title, item.source, text
    )
}

impl GeminiClient {
    /// The client's request timeout applies to every summarization call.
    pub fn new(client: Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            urlencoding::encode(&self.config.model)
        )
    }
}

impl Summarize for GeminiClient {
    #[instrument(level = "info", skip_all, fields(title = %item.title))]
    async fn summarize(&self, item: &NormalizedItem) -> DigestResult<String> {
        let t0 = Instant::now();
        let prompt = build_prompt(item);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: 240,
            },
        };

        let url = self.generate_url();
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %truncate_for_log(&detail, 300), "Gemini call rejected");
            return Err(DigestError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text = parsed.text().ok_or(DigestError::EmptyResponse)?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            response_preview = %truncate_for_log(&text, 120),
            "Gemini call succeeded"
        );
        Ok(clip_summary(&text))
    }
}

fn clip_summary(text: &str) -> String {
    match text.char_indices().nth(MAX_SUMMARY_CHARS) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Summarize every item, at most `concurrency` calls in flight.
///
/// # Arguments
///
/// * `summarizer` - Any [`Summarize`] implementation
/// * `items` - Normalized items, already de-duplicated and capped
/// * `concurrency` - Maximum calls in flight (at least one)
///
/// # Returns
///
/// The items that got a summary, in input order. An item whose call fails
/// for any reason, a client timeout included, is logged and left out.
#[instrument(level = "info", skip_all, fields(total = items.len(), concurrency = concurrency))]
pub async fn summarize_all<S: Summarize>(
    summarizer: &S,
    items: Vec<NormalizedItem>,
    concurrency: usize,
) -> Vec<NormalizedItem> {
    let total = items.len();
    let summarized: Vec<NormalizedItem> = stream::iter(items.into_iter().enumerate())
        .map(|(index, mut item)| async move {
            match summarizer.summarize(&item).await {
                Ok(summary) => {
                    item.summary = Some(summary);
                    Some(item)
                }
                Err(e) => {
                    warn!(index, source = %item.source, url = %item.url, error = %e, "Summarization failed; dropping item");
                    None
                }
            }
        })
        .buffered(concurrency.max(1))
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(
        total,
        successful = summarized.len(),
        failed = total - summarized.len(),
        "Completed summarization"
    );
    summarized
}
