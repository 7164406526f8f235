//! poh Slack webhook server.
//!
//! Loads configuration, checks the bot token, and serves the Events API
//! webhook until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use poh_core::{Dispatcher, RequestVerifier, ResponseMatcher, SystemClock};
use tracing::info;

use poh_server::cli::Cli;
use poh_server::config::ServerConfig;
use poh_server::router::{create_router, EVENTS_PATH};
use poh_server::slack_client::SlackClient;
use poh_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "poh_server=info,poh_core=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::resolve(cli.config.as_deref(), cli.overrides())
        .context("Failed to load configuration")?;

    info!(
        listen_addr = config.listen_addr,
        send_timeout_secs = config.send_timeout_secs,
        "Configuration loaded successfully"
    );

    let slack =
        SlackClient::with_api_base(config.slack.bot_token.clone(), config.slack.api_base.clone())
            .with_timeout(config.send_timeout())
            .context("Failed to build Slack client")?;

    if cli.skip_auth_check {
        info!("Skipping auth.test token check");
    } else {
        let bot_user = slack
            .auth_test()
            .await
            .context("Bot token rejected by Slack")?;
        info!(bot_user, "Bot token verified");
    }

    let dispatcher = Dispatcher::new(
        RequestVerifier::new(config.slack.verification_token.clone()),
        Arc::new(slack),
        ResponseMatcher::new(SystemClock),
        config.send_timeout(),
    );
    let app = create_router(Arc::new(AppState::new(dispatcher)));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    info!(
        addr = %listener.local_addr()?,
        path = EVENTS_PATH,
        "Listening for Slack events"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shut down cleanly");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
