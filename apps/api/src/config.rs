use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::batch::{BatchOptions, CleanupPolicy};
use crate::summarizer::DEFAULT_ENDPOINT;

const DEFAULT_MAX_ENTRY_BYTES: u64 = 100_000_000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Clone)]
pub struct Config {
    pub hf_api_token: String,
    pub summarizer_url: String,
    pub summarizer_timeout: Duration,
    pub summary_concurrency: usize,
    pub staging_root: PathBuf,
    pub staging_cleanup: CleanupPolicy,
    pub max_entry_bytes: u64,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs: u64 = parse_or(&lookup, "SUMMARIZER_TIMEOUT_SECS", 120)?;
        let summary_concurrency: usize = parse_or(&lookup, "SUMMARY_CONCURRENCY", 4)?;
        if summary_concurrency == 0 {
            return Err(anyhow!("SUMMARY_CONCURRENCY must be at least 1"));
        }

        Ok(Config {
            hf_api_token: lookup("HF_API_TOKEN")
                .filter(|v| !v.trim().is_empty())
                .context("Required environment variable 'HF_API_TOKEN' is not set")?,
            summarizer_url: lookup("SUMMARIZER_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            summarizer_timeout: Duration::from_secs(timeout_secs),
            summary_concurrency,
            staging_root: lookup("STAGING_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("cv_extractor")),
            staging_cleanup: parse_or(&lookup, "STAGING_CLEANUP", CleanupPolicy::IfEmpty)?,
            max_entry_bytes: parse_or(&lookup, "MAX_ENTRY_BYTES", DEFAULT_MAX_ENTRY_BYTES)?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            staging_root: self.staging_root.clone(),
            cleanup: self.staging_cleanup,
            concurrency: self.summary_concurrency,
            max_entry_bytes: self.max_entry_bytes,
        }
    }
}

// Keeps the API token out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("hf_api_token", &"<redacted>")
            .field("summarizer_url", &self.summarizer_url)
            .field("summarizer_timeout", &self.summarizer_timeout)
            .field("summary_concurrency", &self.summary_concurrency)
            .field("staging_root", &self.staging_root)
            .field("staging_cleanup", &self.staging_cleanup)
            .field("max_entry_bytes", &self.max_entry_bytes)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{key} has an invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}
