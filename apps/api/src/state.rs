use std::sync::Arc;

use crate::config::Config;
use crate::summarizer::Summarizer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable summarizer. Default: `SummarizerClient` against the hosted model.
    pub summarizer: Arc<dyn Summarizer>,
}
