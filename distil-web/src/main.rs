//! Web front end for schema-guided extraction.
//!
//! Serves a single page where the user pastes free-form text and a JSON
//! Schema, and a JSON API that runs the extraction and returns the result.

mod handlers;
mod page;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use clap::Parser;
use distil::chat::ChatProvider;
use distil::extract::Extractor;
use distil::llms::OpenAiClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "distil-web", version, about = "Structured extraction web UI")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "DISTIL_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The configured chat provider.
    pub provider: Arc<dyn ChatProvider>,
    /// Extractor with the default instruction.
    pub extractor: Arc<Extractor<Arc<dyn ChatProvider>>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Build state over any chat provider.
    #[must_use]
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            extractor: Arc::new(Extractor::new(Arc::clone(&provider))),
            provider,
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/extract", post(handlers::extract))
        .with_state(state)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let client = OpenAiClient::from_env()?;
    info!(model = client.model(), "provider configured");

    let provider: Arc<dyn ChatProvider> = Arc::new(client);
    let app = router(AppState::new(provider));

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!("listening on {}", args.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
