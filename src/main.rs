// SPDX-License-Identifier: AGPL-3.0-or-later

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use ledger_webauth::api::router;
use ledger_webauth::config::{Config, LOG_FORMAT_ENV};
use ledger_webauth::ledger::LedgerClient;
use ledger_webauth::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    // Configuration and key errors are fatal at startup, never per-request.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let ledger = match LedgerClient::new(&config.ledger_url, config.ledger_timeout) {
        Ok(ledger) => ledger,
        Err(err) => {
            tracing::error!(error = %err, "failed to build ledger client");
            std::process::exit(1);
        }
    };

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!(error = %err, "invalid bind address");
            std::process::exit(1);
        }
    };

    tracing::info!(
        server_account = %config.server_account_id(),
        home_domain = %config.home_domain,
        "starting web authentication server"
    );

    let state = AppState::new(config, ledger);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    tracing::info!("listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v == "json");
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install signal handler");
    tracing::info!("shutdown signal received");
}
