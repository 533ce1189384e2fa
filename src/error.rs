//! Error type shared by the fetchers, the summarizer and the digest viewer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("XML parsing failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type DigestResult<T> = Result<T, DigestError>;
