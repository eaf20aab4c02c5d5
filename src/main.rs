//! Issuetracker - per-project issue tracking API
//!
//! Opens the SQLite database, then serves `/api/issues/{project}` until
//! Ctrl-C is received.

mod cli;

use clap::Parser;
use cli::{Cli, LogFormat};
use issue_service::{AppState, Database};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .log_internal_errors(true)
                    .with_target(false)
                    .flatten_event(true)
                    .with_span_list(false),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = cli.config();

    info!(
        database = config.database_url.as_str(),
        bind_address = config.bind_address.as_str(),
        "Starting issue tracker"
    );

    let db = Database::new(&config.database_url).await.inspect_err(|e| {
        tracing::error!(database = config.database_url.as_str(), error = %e, "Could not open database");
    })?;
    let app = issue_service::app(AppState::new(db));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .inspect_err(|e| {
            tracing::error!(bind_address = config.bind_address.as_str(), error = %e, "Could not bind listener");
        })?;
    info!(bind_address = config.bind_address.as_str(), "Listening");

    axum::serve(listener, app).with_graceful_shutdown(signal()).await?;

    Ok(())
}

async fn signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, terminating...");
}
