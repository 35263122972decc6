mod batch;
mod config;
mod errors;
mod extraction;
mod report;
mod routes;
mod state;
mod summarizer;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::batch::process_batch;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::summarizer::{Summarizer, SummarizerClient};

#[derive(Debug, Parser)]
#[command(
    name = "cv_extractor",
    version,
    about = "Extracts contact details and summaries from a ZIP of CVs into an XLSX report"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Process one archive and write the report.
    Run {
        /// ZIP archive of .docx / .pdf CVs.
        archive: PathBuf,
        /// Where to write the XLSX report.
        #[arg(short, long, default_value = "output.xlsx")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Extractor v{}", env!("CARGO_PKG_VERSION"));

    let client = SummarizerClient::new(
        config.summarizer_url.clone(),
        config.hf_api_token.clone(),
        config.summarizer_timeout,
    )?;
    info!("Summarizer client initialized (endpoint: {})", client.endpoint());
    let summarizer: Arc<dyn Summarizer> = Arc::new(client);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, summarizer).await,
        Command::Run { archive, output } => run_once(&config, summarizer, archive, output).await,
    }
}

async fn serve(config: Config, summarizer: Arc<dyn Summarizer>) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let state = AppState {
        config,
        summarizer,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_once(
    config: &Config,
    summarizer: Arc<dyn Summarizer>,
    archive: PathBuf,
    output: PathBuf,
) -> Result<()> {
    let run = process_batch(&archive, &output, &config.batch_options(), summarizer).await?;

    for failure in &run.failures {
        warn!("Not in report: {} ({})", failure.path.display(), failure.reason);
    }
    println!(
        "Wrote {} rows to {} ({} unreadable, {} unsupported files skipped)",
        run.report.len(),
        output.display(),
        run.failures.len(),
        run.unsupported
    );
    Ok(())
}
