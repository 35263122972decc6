/// Summarizer client — the single point of entry for calls to the hosted
/// summarization model.
///
/// Non-2xx answers are not errors here: they come back as
/// `SummaryResult::Failure` and end up in the report in place of a summary.
/// Transport failures and malformed success bodies are `SummarizerError`s,
/// left for the caller to handle.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Hosted BART-large-CNN summarization endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-cnn";
const MAX_LENGTH: u32 = 150;
const MIN_LENGTH: u32 = 30;

#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("summarizer returned no summary")]
    EmptyResponse,
}

/// Outcome of one summarization request. Exactly one of summary or error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryResult {
    Summary(String),
    Failure(String),
}

impl SummaryResult {
    /// The string written into the report's summary column.
    pub fn into_cell(self) -> String {
        match self {
            SummaryResult::Summary(s) | SummaryResult::Failure(s) => s,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SummaryResult::Failure(_))
    }
}

/// Anything that can turn a document's full text into a `SummaryResult`.
///
/// Carried as `Arc<dyn Summarizer>` so tests can swap in a fake.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<SummaryResult, SummarizerError>;
}

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    inputs: &'a str,
    parameters: SummarizeParameters,
    options: SummarizeOptions,
}

#[derive(Debug, Serialize)]
struct SummarizeParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Debug, Serialize)]
struct SummarizeOptions {
    use_cache: bool,
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
struct SummaryItem {
    summary_text: String,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    error: String,
}

/// Production summarizer backed by the hosted inference API.
#[derive(Clone)]
pub struct SummarizerClient {
    client: Client,
    endpoint: String,
    api_token: String,
}

impl SummarizerClient {
    pub fn new(endpoint: String, api_token: String, timeout: Duration) -> Result<Self, SummarizerError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint,
            api_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Summarizer for SummarizerClient {
    async fn summarize(&self, text: &str) -> Result<SummaryResult, SummarizerError> {
        let body = SummarizeRequest {
            inputs: text,
            parameters: SummarizeParameters {
                max_length: MAX_LENGTH,
                min_length: MIN_LENGTH,
                do_sample: false,
            },
            options: SummarizeOptions {
                use_cache: false,
                wait_for_model: true,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ServiceError>(&raw)
                .map(|e| e.error)
                .unwrap_or(raw);
            warn!("Summarizer returned {}: {}", status.as_u16(), message);
            return Ok(SummaryResult::Failure(format!(
                "Error: {} - {}",
                status.as_u16(),
                message
            )));
        }

        let items: Vec<SummaryItem> = serde_json::from_str(&raw)?;
        let summary = items
            .into_iter()
            .next()
            .ok_or(SummarizerError::EmptyResponse)?
            .summary_text;

        debug!(
            "Summarized {} chars into {} chars",
            text.len(),
            summary.len()
        );
        Ok(SummaryResult::Summary(summary.trim().to_string()))
    }
}
