//! # questline-server
//!
//! HTTP API for Questline: catalog reads, mission progression, accounts,
//! and leaderboards over a single SQLite database.

pub mod config;
pub mod demo;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod mail;
pub mod routes;
pub mod snapshot;
pub mod state;
pub mod views;

use std::sync::Arc;

use axum::extract::Request;
use axum::ServiceExt;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::mail::LogMailer;
use crate::state::AppState;

/// Open storage, build the state and serve until a shutdown signal.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let db_path = config.db_path();
    let mut conn = questline_db::open(&db_path)?;
    info!("Database opened at {:?}", db_path);

    if config.demo_seed_enabled() {
        demo::seed(&mut conn, &demo::DemoAdmin::from_env())?;
    }

    let mailer = Arc::new(LogMailer::new(config.mail.from_address.clone()));
    let addr = config.listen_addr();
    let state = Arc::new(AppState::new(conn, config, mailer));

    let snapshotter = snapshot::spawn(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    let app = routes::app(state);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = snapshotter {
        handle.abort();
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, shutting down"),
            Err(e) => {
                warn!("Ctrl-C handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("SIGTERM received, shutting down");
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
